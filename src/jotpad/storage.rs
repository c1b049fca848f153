use std::cell::RefCell;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind as IoErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::NamedTempFile;

use crate::errors::Result;
use crate::specific_fail_str;

/// A single durable key holding the serialized note collection
pub trait Storage {
    /// raw stored value, `None` when nothing was ever written
    fn read(&self) -> Result<Option<Vec<u8>>>;

    /// replace the stored value; either the old or the new value survives a crash
    fn write(&mut self, value: &[u8]) -> Result<()>;

    /// set an unreadable value aside so a later write cannot destroy it
    fn backup(&mut self, value: &[u8]) -> Result<()>;

    fn describe(&self) -> String;
}

/// One file per key: `<folder>/<key>.json`
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(folder: &Path, key: &str) -> FileStorage {
        FileStorage {
            path: folder.join(format!("{}.json", key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn folder(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

impl Storage for FileStorage {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(ref e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !self.path.is_file() {
            return specific_fail_str!(format!("{} is not a file.", self.path.display()));
        }
        let mut buf = vec![];
        file.read_to_end(&mut buf)?;
        Ok(Some(buf))
    }

    fn write(&mut self, value: &[u8]) -> Result<()> {
        let folder = self.folder().to_path_buf();
        if !folder.exists() {
            log::info!("creating data folder {}", folder.display());
            fs::create_dir_all(&folder)?;
        }
        let mut tmp = NamedTempFile::new_in(&folder)?;
        tmp.write_all(value)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        Ok(())
    }

    fn backup(&mut self, value: &[u8]) -> Result<()> {
        // earlier backups are never replaced: `.corrupt`, then `.corrupt.1`, `.corrupt.2`, ...
        for n in 0u32.. {
            let mut backup_path = self.path.clone().into_os_string();
            backup_path.push(".corrupt");
            if n > 0 {
                backup_path.push(format!(".{}", n));
            }
            let backup_path = PathBuf::from(backup_path);
            match OpenOptions::new().write(true).create_new(true).open(&backup_path) {
                Ok(mut file) => {
                    file.write_all(value)?;
                    file.sync_all()?;
                    log::warn!("unreadable notes saved to {}", backup_path.display());
                    return Ok(());
                }
                Err(ref e) if e.kind() == IoErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        specific_fail_str!("no free backup name for unreadable notes")
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Default)]
struct Slot {
    value: Option<Vec<u8>>,
    backups: Vec<Vec<u8>>,
    fail_writes: bool,
    writes: usize,
}

/// In-memory key; clones share the same slot so a caller can watch what a store wrote
#[derive(Clone, Default)]
pub struct MemoryStorage {
    slot: Rc<RefCell<Slot>>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    pub fn with_value(value: &[u8]) -> MemoryStorage {
        let storage = MemoryStorage::default();
        storage.slot.borrow_mut().value = Some(value.to_vec());
        storage
    }

    pub fn value(&self) -> Option<Vec<u8>> {
        self.slot.borrow().value.clone()
    }

    /// the oldest backup taken
    pub fn backup_value(&self) -> Option<Vec<u8>> {
        self.slot.borrow().backups.first().cloned()
    }

    pub fn backups(&self) -> Vec<Vec<u8>> {
        self.slot.borrow().backups.clone()
    }

    pub fn writes(&self) -> usize {
        self.slot.borrow().writes
    }

    /// make every following write fail, as a full disk would
    pub fn fail_writes(&self, fail: bool) {
        self.slot.borrow_mut().fail_writes = fail;
    }
}

impl Storage for MemoryStorage {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.slot.borrow().value.clone())
    }

    fn write(&mut self, value: &[u8]) -> Result<()> {
        let mut slot = self.slot.borrow_mut();
        if slot.fail_writes {
            return specific_fail_str!("storage quota exceeded");
        }
        slot.value = Some(value.to_vec());
        slot.writes += 1;
        Ok(())
    }

    fn backup(&mut self, value: &[u8]) -> Result<()> {
        self.slot.borrow_mut().backups.push(value.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), "notes");
        assert!(storage.read().unwrap().is_none());
    }

    #[test]
    fn write_creates_folder_and_replaces_value() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("nested");
        let mut storage = FileStorage::new(&folder, "notes");
        storage.write(b"first").unwrap();
        storage.write(b"second").unwrap();
        assert_eq!(storage.read().unwrap().unwrap(), b"second");
        assert_eq!(storage.path(), folder.join("notes.json"));
        // no temp files left behind
        assert_eq!(fs::read_dir(&folder).unwrap().count(), 1);
    }

    #[test]
    fn backup_lands_next_to_the_key() {
        let dir = tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path(), "notes");
        storage.backup(b"garbage").unwrap();
        let saved = fs::read(dir.path().join("notes.json.corrupt")).unwrap();
        assert_eq!(saved, b"garbage");
    }

    #[test]
    fn backups_never_replace_each_other() {
        let dir = tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path(), "notes");
        storage.backup(b"first").unwrap();
        storage.backup(b"second").unwrap();
        storage.backup(b"third").unwrap();
        assert_eq!(fs::read(dir.path().join("notes.json.corrupt")).unwrap(), b"first");
        assert_eq!(fs::read(dir.path().join("notes.json.corrupt.1")).unwrap(), b"second");
        assert_eq!(fs::read(dir.path().join("notes.json.corrupt.2")).unwrap(), b"third");
    }

    #[test]
    fn memory_clones_share_the_slot() {
        let watcher = MemoryStorage::new();
        let mut writer = watcher.clone();
        writer.write(b"x").unwrap();
        assert_eq!(watcher.value().unwrap(), b"x");
        assert_eq!(watcher.writes(), 1);

        watcher.fail_writes(true);
        assert!(writer.write(b"y").is_err());
        assert_eq!(watcher.value().unwrap(), b"x");
    }
}
