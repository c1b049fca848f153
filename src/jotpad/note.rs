use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// label stored in place of a blank title
pub static UNTITLED: &str = "(Untitled)";
pub const MAX_TITLE_CHARS: usize = 128;
pub const MAX_CONTENT_CHARS: usize = 4096;

/// Opaque note identifier, the only lookup key of the store
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn generate() -> NoteId {
        NoteId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// first eight characters, enough to tell notes apart on screen
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((i, _)) => &self.0[..i],
            None => &self.0,
        }
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> NoteId {
        NoteId(s.to_string())
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single persisted note
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub last_edited: DateTime<Utc>,
}

impl Note {
    /// content folded onto one line and cut to `width` characters
    pub fn preview(&self, width: usize) -> String {
        let flat = self.content.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.chars().count() > width && width > 3 {
            let cut: String = flat.chars().take(width - 3).collect();
            format!("{}...", cut)
        } else {
            flat
        }
    }

    pub fn matches(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self.content.to_lowercase().contains(needle_lower)
    }

    /// bring a deserialized note back within the field limits
    pub(crate) fn clamp(&mut self) {
        self.title = truncate_chars(&self.title, MAX_TITLE_CHARS);
        self.content = truncate_chars(&self.content, MAX_CONTENT_CHARS);
    }
}

/// Edit buffer: an independent title/content pair, uncommitted until save
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Draft {
    pub title: String,
    pub content: String,
}

impl Draft {
    pub fn new(title: &str, content: &str) -> Draft {
        Draft {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    pub fn from_note(note: &Note) -> Draft {
        Draft::new(&note.title, &note.content)
    }

    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.title.clear();
        self.content.clear();
    }

    /// title as it will be stored: one line, capped, placeholder when blank
    pub fn normalized_title(&self) -> String {
        let title = self.title.replace(['\n', '\r'], "");
        if title.trim().is_empty() {
            UNTITLED.to_string()
        } else {
            truncate_chars(&title, MAX_TITLE_CHARS)
        }
    }

    pub fn normalized_content(&self) -> String {
        truncate_chars(&self.content, MAX_CONTENT_CHARS)
    }
}

pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((i, _)) => s[..i].to_string(),
        None => s.to_string(),
    }
}
