//! Turns the note collection into the bytes kept under the storage key and back.
//!
//! Plain values are a JSON array of `{id, title, content, lastEdited}` records.
//! With a passphrase the JSON is sealed by [`crate::crypt`] and base64 encoded.

use std::collections::HashSet;

use base64::{engine::general_purpose, Engine as _};

use crate::crypt::{decrypt, encrypt};
use crate::errors::Result;
use crate::note::Note;

pub fn encode(notes: &[Note], passphrase: Option<&str>) -> Result<Vec<u8>> {
    let json = serde_json::to_vec_pretty(notes)?;
    match passphrase {
        Some(k) => {
            let sealed = encrypt(&json, k)?;
            Ok(general_purpose::STANDARD.encode(sealed).into_bytes())
        }
        None => Ok(json),
    }
}

pub fn decode(raw: &[u8], passphrase: Option<&str>) -> Result<Vec<Note>> {
    let json = match passphrase {
        Some(k) => {
            let text = String::from_utf8(raw.to_vec())?;
            let sealed = general_purpose::STANDARD.decode(text.trim())?;
            decrypt(&sealed, k)?
        }
        None => raw.to_vec(),
    };
    let decoded: Vec<Note> = serde_json::from_slice(&json)?;

    let mut seen = HashSet::new();
    let mut notes = Vec::with_capacity(decoded.len());
    for mut note in decoded {
        if !seen.insert(note.id.clone()) {
            log::warn!("dropping duplicate note id {}", note.id);
            continue;
        }
        note.clamp();
        notes.push(note);
    }
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::note::{NoteId, MAX_TITLE_CHARS};

    fn note(id: &str, title: &str) -> Note {
        Note {
            id: NoteId::from(id),
            title: title.to_string(),
            content: String::new(),
            last_edited: "2024-01-02T03:04:05Z".parse().unwrap(),
        }
    }

    #[test]
    fn reads_the_browser_record_shape() {
        let raw = br#"[{"id":"1","title":"Groceries","content":"Milk, eggs","lastEdited":"2024-05-01T12:30:00.000Z"}]"#;
        let notes = decode(raw, None).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Groceries");
        assert_eq!(notes[0].content, "Milk, eggs");
        assert_eq!(notes[0].last_edited.to_rfc3339(), "2024-05-01T12:30:00+00:00");
    }

    #[test]
    fn preserves_order() {
        let notes = vec![note("b", "newer"), note("a", "older")];
        let raw = encode(&notes, None).unwrap();
        assert_eq!(decode(&raw, None).unwrap(), notes);
    }

    #[test]
    fn sealed_value_needs_the_passphrase() {
        let notes = vec![note("a", "secret plans")];
        let raw = encode(&notes, Some("pw")).unwrap();
        assert!(!String::from_utf8_lossy(&raw).contains("secret plans"));
        assert_eq!(decode(&raw, Some("pw")).unwrap(), notes);

        let err = decode(&raw, Some("nope")).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Crypt));
        assert!(decode(&raw, None).is_err());
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(matches!(decode(b"{not json", None).unwrap_err().kind, ErrorKind::Json));
        assert!(decode(b"{\"id\":\"1\"}", None).is_err());
    }

    #[test]
    fn duplicate_ids_keep_first_and_fields_are_capped() {
        let long = "t".repeat(MAX_TITLE_CHARS * 2);
        let raw = encode(&[note("a", &long), note("a", "dup"), note("b", "ok")], None).unwrap();
        let notes = decode(&raw, None).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].title.len(), MAX_TITLE_CHARS);
        assert_eq!(notes[1].id.as_str(), "b");
    }
}
