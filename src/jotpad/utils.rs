use std::env::var;
use std::fs::{self, File};
use std::io::{stdin, stdout, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use chrono::{DateTime, Local, Utc};
use crossterm::{
    execute,
    style::{Attribute, SetAttribute},
    tty::IsTty,
};
use tempfile::Builder;

use crate::errors::{Error, ErrorKind, Result};
use crate::note::Note;
use crate::specific_fail_str;

/// datetime formatting string for printing
pub static DATEFMT_SHORT: &str = "%F %T";

pub fn stdout_is_tty() -> bool {
    stdout().is_tty()
}

pub fn stdin_is_tty() -> bool {
    stdin().is_tty()
}

pub fn termsize() -> usize {
    if let Ok((cols, _rows)) = crossterm::terminal::size() {
        cols as usize
    } else {
        0
    }
}

pub fn localize(t: &DateTime<Utc>) -> String {
    t.with_timezone(&Local).format(DATEFMT_SHORT).to_string()
}

/// Resolve the data folder: an explicit path wins, then `~/.jotpad`. When
/// `~/.jotpad` is a file its contents name the folder to use.
pub fn find_data_folder(data_dir: &Option<String>) -> Result<PathBuf> {
    if let Some(d) = data_dir {
        return Ok(PathBuf::from(d));
    }
    match dirs::home_dir() {
        Some(p) => {
            let default_path = p.join(".jotpad");
            if default_path.is_file() {
                let contents = fs::read_to_string(&default_path)?;
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    return specific_fail_str!(
                        "~/.jotpad is a file but is empty. It should contain a path to the data directory."
                    );
                }
                Ok(PathBuf::from(trimmed))
            } else {
                Ok(default_path)
            }
        }
        None => specific_fail_str!("failed to find your home directory"),
    }
}

pub fn drop_to_editor(contents: &str) -> Result<String> {
    let tmpfile = Builder::new()
        .prefix("jotpad")
        .suffix(".txt")
        .rand_bytes(5)
        .tempfile()?;
    let tmppath = tmpfile.path().to_owned();
    {
        let mut file = File::create(&tmppath)?;
        file.write_all(contents.as_bytes())?;
    }

    let editor = var("VISUAL")
        .or_else(|_| var("EDITOR"))
        .unwrap_or_else(|_| "nano".to_string());
    log::debug!("opening {} in {}", tmppath.display(), editor);

    let status = Command::new(&editor)
        .arg(&tmppath)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| Error {
            kind: ErrorKind::Generic,
            desc: format!("Failed to start editor '{}': {}", editor, e),
            detail: None,
        })?;

    if status.success() {
        let mut content = String::new();
        File::open(&tmppath)?.read_to_string(&mut content)?;
        Ok(content.trim_end_matches('\n').to_string())
    } else {
        specific_fail_str!("The editor process failed.")
    }
}

fn read_password() -> Result<String> {
    rpassword::read_password().map_err(|e| Error {
        kind: ErrorKind::Generic,
        desc: format!("Failed to read key: {}", e),
        detail: None,
    })
}

pub fn get_password() -> Result<String> {
    print!("Key: ");
    stdout().flush()?;
    read_password()
}

pub fn get_new_password() -> Result<String> {
    loop {
        print!("New Key: ");
        stdout().flush()?;
        let p1 = read_password()?;
        print!("Confirm Key: ");
        stdout().flush()?;
        let p2 = read_password()?;

        if p1 == p2 {
            if p1.is_empty() {
                println!("Key cannot be empty.");
                continue;
            }
            return Ok(p1);
        }
        println!("Keys do not match. Please try again.");
    }
}

pub fn get_yn_input(message: &str) -> Result<bool> {
    print!("{}", message);
    let yes = ["y", "Y", "yes", "YES", "Yes"];
    let no = ["n", "N", "no", "NO", "No"];
    loop {
        print!("[y/n]# ");
        stdout().flush()?;
        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            return Ok(false);
        }
        let input = input.trim();
        if yes.contains(&input) {
            return Ok(true);
        } else if no.contains(&input) {
            return Ok(false);
        }
        println!("invalid input.");
    }
}

pub fn pretty_line(bold: &str, plain: &str, tty: bool) -> Result<()> {
    let mut stdout = stdout();
    if tty {
        execute!(stdout, SetAttribute(Attribute::Bold))?;
    }
    print!("{}", bold);
    if tty {
        execute!(stdout, SetAttribute(Attribute::Reset))?;
    }
    print!("{}", plain);
    Ok(())
}

pub fn format_field(value: &str, width: usize, truncate: bool) -> String {
    if value.chars().count() > width && width > 3 && truncate {
        format!("{: <1$.1$}...", value, width - 3)
    } else {
        format!("{: <1$.1$}", value, width)
    }
}

/// Column widths for listing notes
pub struct LineFormat {
    pub colsep: usize,
    pub id_width: usize,
    pub title_width: usize,
    pub touched_width: usize,
}

impl LineFormat {
    pub fn new(notes: &[&Note], condensed: bool, columns: usize) -> LineFormat {
        let colsep = if condensed { 1 } else { 2 };
        let id_width = 8;
        let touched_width = 19;
        let widest_title = notes
            .iter()
            .map(|n| n.title.chars().count())
            .max()
            .unwrap_or(5)
            .max(5);
        let room = columns.saturating_sub(id_width + touched_width + 2 * colsep);
        let title_width = if columns == 0 || room == 0 {
            widest_title
        } else {
            widest_title.min(room)
        };
        LineFormat {
            colsep,
            id_width,
            title_width,
            touched_width,
        }
    }

    pub fn line_width(&self) -> usize {
        self.id_width + self.title_width + self.touched_width + 2 * self.colsep
    }

    pub fn write_note<T: Write>(&self, output: &mut T, note: &Note, marker: &str) -> Result<()> {
        let sep = " ".repeat(self.colsep);
        writeln!(
            output,
            "{}{}{}{}{}{}",
            marker,
            format_field(note.id.short(), self.id_width, false),
            sep,
            format_field(&note.title, self.title_width, true),
            sep,
            format_field(&localize(&note.last_edited), self.touched_width, false)
        )?;
        Ok(())
    }

    pub fn header(&self) -> String {
        let sep = " ".repeat(self.colsep);
        format!(
            "{}{}{}{}{}\n{}\n",
            format_field("id", self.id_width, false),
            sep,
            format_field("title", self.title_width, false),
            sep,
            format_field("last edited", self.touched_width, false),
            "-".repeat(self.line_width())
        )
    }
}

/// print notes as a table (or YAML), at most `limit` of them when `limit` > 0
pub fn print_notes(notes: &[&Note], limit: usize, yaml: bool, condensed: bool) -> Result<()> {
    let limit = if limit != 0 && limit < notes.len() {
        limit
    } else {
        notes.len()
    };
    let shown = &notes[..limit];
    if yaml {
        print!("{}", serde_yaml::to_string(shown)?);
        return Ok(());
    }
    let line_format = LineFormat::new(shown, condensed, termsize());
    if !condensed {
        pretty_line(&line_format.header(), "", stdout_is_tty())?;
    }
    let mut out = stdout();
    for n in shown {
        line_format.write_note(&mut out, n, "")?;
    }
    Ok(())
}

pub fn print_note(note: &Note, yaml: bool, condensed: bool) -> Result<()> {
    if yaml {
        print!("{}", serde_yaml::to_string(note)?);
        return Ok(());
    }
    let tty = stdout_is_tty();
    if condensed {
        pretty_line("id: ", &format!("{}\n", note.id), tty)?;
        pretty_line("title: ", &format!("{}\n", note.title), tty)?;
        pretty_line("last edited: ", &format!("{}\n", localize(&note.last_edited)), tty)?;
        if !note.content.is_empty() {
            pretty_line("content: ", &format!("{}\n", note.content), tty)?;
        }
    } else {
        pretty_line("id\n--\n", &format!("{}\n\n", note.id), tty)?;
        pretty_line("title\n-----\n", &format!("{}\n\n", note.title), tty)?;
        pretty_line(
            "last edited\n-----------\n",
            &format!("{}\n\n", localize(&note.last_edited)),
            tty,
        )?;
        if !note.content.is_empty() {
            pretty_line("content\n-------\n", &format!("{}\n\n", note.content), tty)?;
        }
    }
    Ok(())
}
