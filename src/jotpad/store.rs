use chrono::Utc;
use regex::Regex;

// jotpad imports
use crate::codec;
use crate::errors::Result;
use crate::note::{Draft, Note, NoteId};
use crate::storage::Storage;
use crate::specific_fail;

/// Owns every note and keeps the storage key in step with memory.
///
/// The collection is ordered most-recent first: new notes are prepended and
/// updates leave a note where it is.
pub struct NoteStore<S: Storage> {
    notes: Vec<Note>,
    storage: S,
    passphrase: Option<String>,
    warning: Option<String>,
}

impl<S: Storage> NoteStore<S> {
    /// Read the collection kept in `storage`. Never fails: a missing value is an
    /// empty store, an unreadable one is backed up and also yields an empty store.
    pub fn load(mut storage: S, passphrase: Option<String>) -> NoteStore<S> {
        let mut warning = None;
        let notes = match storage.read() {
            Ok(None) => {
                log::info!("no notes stored at {}", storage.describe());
                vec![]
            }
            Ok(Some(raw)) => match codec::decode(&raw, passphrase.as_deref()) {
                Ok(notes) => {
                    log::info!("loaded {} notes from {}", notes.len(), storage.describe());
                    notes
                }
                Err(e) => {
                    log::warn!("could not read notes from {}: {}", storage.describe(), e);
                    if let Err(be) = storage.backup(&raw) {
                        log::warn!("could not back up unreadable notes: {}", be);
                    }
                    warning = Some(format!("stored notes were unreadable ({}), starting empty", e));
                    vec![]
                }
            },
            Err(e) => {
                log::warn!("could not open {}: {}", storage.describe(), e);
                warning = Some(format!("could not open stored notes ({}), starting empty", e));
                vec![]
            }
        };
        NoteStore {
            notes,
            storage,
            passphrase,
            warning,
        }
    }

    /// Write the whole collection to the storage key.
    pub fn persist(&mut self) -> Result<()> {
        let raw = codec::encode(&self.notes, self.passphrase.as_deref())?;
        self.storage.write(&raw)?;
        log::debug!("persisted {} notes to {}", self.notes.len(), self.storage.describe());
        Ok(())
    }

    // memory stays authoritative when a write fails; the failure is kept for the caller
    fn sync(&mut self) {
        match self.persist() {
            Ok(()) => {}
            Err(e) => {
                log::warn!("notes not saved: {}", e);
                self.warning = Some(format!("notes not saved: {}", e));
            }
        }
    }

    /// the last load or persist problem, cleared on read
    pub fn take_warning(&mut self) -> Option<String> {
        self.warning.take()
    }

    /// Create a note from `draft` and return its id, or `None` when the draft is blank.
    pub fn add(&mut self, draft: &Draft) -> Option<NoteId> {
        if draft.is_blank() {
            log::debug!("rejected blank note");
            return None;
        }
        let mut id = NoteId::generate();
        while self.contains(&id) {
            id = NoteId::generate();
        }
        self.notes.insert(
            0,
            Note {
                id: id.clone(),
                title: draft.normalized_title(),
                content: draft.normalized_content(),
                last_edited: Utc::now(),
            },
        );
        log::debug!("added note {}", id);
        self.sync();
        Some(id)
    }

    /// Replace the title and content of note `id`. Returns `false` and changes
    /// nothing when the note is gone or the draft is blank.
    pub fn update(&mut self, id: &NoteId, draft: &Draft) -> bool {
        if draft.is_blank() {
            log::debug!("rejected blank edit of note {}", id);
            return false;
        }
        let note = match self.notes.iter_mut().find(|n| &n.id == id) {
            Some(n) => n,
            None => {
                log::debug!("update of missing note {} ignored", id);
                return false;
            }
        };
        note.title = draft.normalized_title();
        note.content = draft.normalized_content();
        note.last_edited = Utc::now().max(note.last_edited);
        self.sync();
        true
    }

    /// Remove note `id` if present. Returns whether anything was removed.
    pub fn remove(&mut self, id: &NoteId) -> bool {
        let removed = match self.notes.iter().position(|n| &n.id == id) {
            Some(pos) => {
                self.notes.remove(pos);
                true
            }
            None => {
                log::debug!("remove of missing note {} ignored", id);
                false
            }
        };
        self.sync();
        removed
    }

    /// remove all notes
    pub fn clear(&mut self) {
        self.notes.clear();
        self.sync();
    }

    /// Case-insensitive substring search over title and content, order preserved.
    pub fn filter(&self, query: &str) -> Vec<&Note> {
        if query.is_empty() {
            return self.notes.iter().collect();
        }
        let needle = query.to_lowercase();
        self.notes.iter().filter(|n| n.matches(&needle)).collect()
    }

    pub fn filter_regex(&self, re: &Regex) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|n| re.is_match(&n.title) || re.is_match(&n.content))
            .collect()
    }

    /// Resolve a full id or a unique id prefix.
    pub fn find_by_prefix(&self, prefix: &str) -> Result<&Note> {
        if let Some(n) = self.get(&NoteId::from(prefix)) {
            return Ok(n);
        }
        let mut hits = self.notes.iter().filter(|n| n.id.as_str().starts_with(prefix));
        match (hits.next(), hits.next()) {
            (Some(n), None) if !prefix.is_empty() => Ok(n),
            (Some(_), Some(_)) => specific_fail!(format!("note id '{}' is ambiguous", prefix)),
            _ => specific_fail!(format!("note {} doesn't exist", prefix)),
        }
    }

    /// Change the passphrase used from the next persist on; `None` stores plain JSON.
    pub fn set_passphrase(&mut self, passphrase: Option<String>) -> Result<()> {
        self.passphrase = passphrase;
        self.persist()
    }

    pub fn is_encrypted(&self) -> bool {
        self.passphrase.is_some()
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| &n.id == id)
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.get(id).is_some()
    }

    pub fn most_recent(&self) -> Option<&Note> {
        self.notes.first()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::UNTITLED;
    use crate::storage::{FileStorage, MemoryStorage};
    use std::collections::HashSet;
    use std::fs;
    use tempfile::tempdir;

    fn empty() -> (NoteStore<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        (NoteStore::load(storage.clone(), None), storage)
    }

    fn draft(t: &str, c: &str) -> Draft {
        Draft::new(t, c)
    }

    #[test]
    fn add_counts_and_ids_are_distinct() {
        let (mut store, _) = empty();
        let inputs = [("a", ""), ("", ""), ("", "body"), ("   ", " "), ("b", "c")];
        let accepted = inputs
            .iter()
            .filter_map(|(t, c)| store.add(&draft(t, c)))
            .count();
        assert_eq!(accepted, 3);
        assert_eq!(store.len(), 3);
        let ids: HashSet<_> = store.notes().iter().map(|n| &n.id).collect();
        assert_eq!(ids.len(), store.len());
    }

    #[test]
    fn blank_add_is_rejected_without_persisting() {
        let (mut store, storage) = empty();
        store.add(&draft("Groceries", ""));
        let before = storage.value();
        let writes = storage.writes();

        assert_eq!(store.add(&draft("", "")), None);
        assert_eq!(store.add(&draft("   ", "")), None);
        assert_eq!(store.len(), 1);
        assert_eq!(storage.value(), before);
        assert_eq!(storage.writes(), writes);
    }

    #[test]
    fn add_prepends_and_defaults_title() {
        let (mut store, _) = empty();
        let older = store.add(&draft("older", "")).unwrap();
        let newer = store.add(&draft("", "just a body")).unwrap();
        assert_eq!(store.notes()[0].id, newer);
        assert_eq!(store.notes()[1].id, older);
        assert_eq!(store.notes()[0].title, UNTITLED);
        assert_eq!(store.most_recent().unwrap().id, newer);
    }

    #[test]
    fn update_keeps_order_and_refreshes_timestamp() {
        let (mut store, _) = empty();
        let a = store.add(&draft("a", "")).unwrap();
        let b = store.add(&draft("b", "")).unwrap();
        let stamp = store.get(&a).unwrap().last_edited;

        assert!(store.update(&a, &draft("", "changed")));
        let note = store.get(&a).unwrap();
        assert_eq!(note.title, UNTITLED);
        assert_eq!(note.content, "changed");
        assert!(note.last_edited >= stamp);
        assert_eq!(store.notes()[0].id, b);
        assert_eq!(store.notes()[1].id, a);
    }

    #[test]
    fn update_of_missing_or_blank_is_a_noop() {
        let (mut store, storage) = empty();
        let a = store.add(&draft("a", "x")).unwrap();
        let snapshot = store.notes().to_vec();
        let writes = storage.writes();

        assert!(!store.update(&NoteId::from("missing"), &draft("t", "c")));
        assert!(!store.update(&a, &draft(" ", "")));
        assert_eq!(store.notes(), &snapshot[..]);
        assert_eq!(storage.writes(), writes);
    }

    #[test]
    fn remove_twice_is_idempotent() {
        let (mut store, _) = empty();
        let a = store.add(&draft("a", "")).unwrap();
        let b = store.add(&draft("b", "")).unwrap();
        assert!(store.remove(&a));
        let after_first = store.notes().to_vec();
        assert!(!store.remove(&a));
        assert_eq!(store.notes(), &after_first[..]);
        assert_eq!(store.notes()[0].id, b);
    }

    #[test]
    fn persist_then_load_reproduces_collection() {
        let (mut store, storage) = empty();
        store.add(&draft("one", "1"));
        let two = store.add(&draft("two", "2")).unwrap();
        store.add(&draft("three", "3"));
        store.update(&two, &draft("two!", "22"));

        let reloaded = NoteStore::load(storage.clone(), None);
        assert_eq!(reloaded.notes(), store.notes());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = NoteStore::load(FileStorage::new(dir.path(), "notes"), None);
        store.add(&draft("Groceries", "Milk, eggs"));
        let again = NoteStore::load(FileStorage::new(dir.path(), "notes"), None);
        assert_eq!(again.notes(), store.notes());
    }

    #[test]
    fn encrypted_round_trip_and_wrong_key() {
        let storage = MemoryStorage::new();
        let mut store = NoteStore::load(storage.clone(), Some("pw".to_string()));
        store.add(&draft("secret", ""));
        assert!(store.is_encrypted());

        let ok = NoteStore::load(storage.clone(), Some("pw".to_string()));
        assert_eq!(ok.len(), 1);

        let mut wrong = NoteStore::load(storage.clone(), Some("bad".to_string()));
        assert!(wrong.is_empty());
        assert!(wrong.take_warning().is_some());
        assert_eq!(storage.backup_value(), storage.value());
    }

    #[test]
    fn wrong_key_session_cannot_destroy_the_real_notes() {
        let dir = tempdir().unwrap();
        let open = |key: &str| NoteStore::load(FileStorage::new(dir.path(), "notes"), Some(key.to_string()));

        let mut right = open("right");
        right.add(&draft("keep me", "important"));

        let mut wrong = open("wrong");
        assert!(wrong.is_empty());
        wrong.add(&draft("written with the wrong key", ""));

        let mut again = open("right");
        assert!(again.is_empty());
        assert!(again.take_warning().is_some());

        let first_backup = fs::read(dir.path().join("notes.json.corrupt")).unwrap();
        let recovered = codec::decode(&first_backup, Some("right")).unwrap();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].title, "keep me");
        assert!(dir.path().join("notes.json.corrupt.1").exists());
    }

    #[test]
    fn corrupt_value_fails_soft_and_is_backed_up() {
        let storage = MemoryStorage::with_value(b"definitely not json");
        let mut store = NoteStore::load(storage.clone(), None);
        assert!(store.is_empty());
        assert!(store.take_warning().is_some());
        assert!(store.take_warning().is_none());
        assert_eq!(storage.backup_value().unwrap(), b"definitely not json");
    }

    #[test]
    fn failed_persist_keeps_memory_and_warns() {
        let (mut store, storage) = empty();
        store.add(&draft("saved", ""));
        storage.fail_writes(true);

        let id = store.add(&draft("only in memory", "")).unwrap();
        assert!(store.contains(&id));
        assert_eq!(store.len(), 2);
        assert!(store.take_warning().unwrap().contains("quota"));

        storage.fail_writes(false);
        store.persist().unwrap();
        assert_eq!(NoteStore::load(storage, None).len(), 2);
    }

    #[test]
    fn filter_is_case_insensitive_and_ordered() {
        let (mut store, _) = empty();
        store.add(&draft("Groceries", "Milk, eggs"));
        store.add(&draft("Work", "call the GROCER"));
        store.add(&draft("Misc", "nothing"));

        let all: Vec<_> = store.filter("").iter().map(|n| n.id.clone()).collect();
        let expected: Vec<_> = store.notes().iter().map(|n| n.id.clone()).collect();
        assert_eq!(all, expected);

        let hits = store.filter("gRoCeR");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Work");
        assert_eq!(hits[1].title, "Groceries");
        assert!(hits.iter().all(|n| n.matches("grocer")));
        assert!(store.filter("absent").is_empty());
    }

    #[test]
    fn regex_filter() {
        let (mut store, _) = empty();
        store.add(&draft("todo 1", ""));
        store.add(&draft("notes", "todo 22"));
        store.add(&draft("other", ""));
        let re = Regex::new(r"todo \d{2}").unwrap();
        assert_eq!(store.filter_regex(&re).len(), 1);
    }

    #[test]
    fn prefix_lookup() {
        let (mut store, _) = empty();
        let id = store.add(&draft("a", "")).unwrap();
        assert_eq!(store.find_by_prefix(id.as_str()).unwrap().id, id);
        assert_eq!(store.find_by_prefix(id.short()).unwrap().id, id);
        assert!(store.find_by_prefix("zzzz-not-there").is_err());
        assert!(store.find_by_prefix("").is_err());
    }

    #[test]
    fn clear_empties_storage() {
        let (mut store, storage) = empty();
        store.add(&draft("a", ""));
        store.clear();
        assert!(store.is_empty());
        assert!(NoteStore::load(storage, None).is_empty());
    }
}
