//! Selection and editing state machine sitting between the store and a front end.
//!
//! Every command runs to completion and then reconciles the state with the
//! store, so a selection can never point at a deleted note and an empty store
//! always shows [`ViewState::Empty`].

use chrono::{DateTime, Utc};

use crate::note::{truncate_chars, Draft, Note, NoteId, MAX_CONTENT_CHARS, MAX_TITLE_CHARS};
use crate::storage::Storage;
use crate::store::NoteStore;

/// sidebar starts hidden on terminals narrower than this
pub const SIDEBAR_MIN_COLUMNS: usize = 80;
pub const PREVIEW_CHARS: usize = 40;

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState {
    Empty,
    Viewing(NoteId),
    /// composing a new note; `previous` is the selection to return to on cancel
    Creating { previous: Option<NoteId> },
    Editing(NoteId),
}

/// One sidebar row
#[derive(Clone, Debug, PartialEq)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    pub preview: String,
    pub last_edited: DateTime<Utc>,
    pub selected: bool,
}

pub struct Controller<S: Storage> {
    store: NoteStore<S>,
    state: ViewState,
    buffer: Draft,
    search_query: String,
    sidebar_visible: bool,
}

impl<S: Storage> Controller<S> {
    pub fn new(store: NoteStore<S>, sidebar_visible: bool) -> Controller<S> {
        let state = match store.most_recent() {
            Some(n) => ViewState::Viewing(n.id.clone()),
            None => ViewState::Empty,
        };
        Controller {
            store,
            state,
            buffer: Draft::default(),
            search_query: String::new(),
            sidebar_visible,
        }
    }

    /// start composing a new note
    pub fn add(&mut self) {
        // a second `add` keeps the selection remembered by the first
        let previous = match self.state {
            ViewState::Creating { ref previous } => previous.clone(),
            _ => self.selected_id().cloned(),
        };
        self.buffer.clear();
        self.state = ViewState::Creating { previous };
        log::debug!("creating a new note");
    }

    /// Show note `id`, discarding any unsaved draft. Unknown ids are ignored.
    pub fn select(&mut self, id: &NoteId) {
        if !self.store.contains(id) {
            log::debug!("select of missing note {} ignored", id);
            return;
        }
        self.buffer.clear();
        self.state = ViewState::Viewing(id.clone());
    }

    /// Start editing the note being viewed; a no-op in any other state.
    pub fn edit(&mut self) {
        let id = match self.state {
            ViewState::Viewing(ref id) => id.clone(),
            _ => return,
        };
        if let Some(note) = self.store.get(&id) {
            self.buffer = Draft::from_note(note);
            self.state = ViewState::Editing(id);
        }
    }

    pub fn set_title(&mut self, title: &str) {
        if self.is_composing() {
            self.buffer.title = truncate_chars(title, MAX_TITLE_CHARS);
        }
    }

    pub fn set_content(&mut self, content: &str) {
        if self.is_composing() {
            self.buffer.content = truncate_chars(content, MAX_CONTENT_CHARS);
        }
    }

    /// Commit the edit buffer. Returns `false` when a new note was rejected as
    /// blank; the controller then stays in creating mode.
    pub fn save(&mut self) -> bool {
        match self.state.clone() {
            ViewState::Creating { .. } => match self.store.add(&self.buffer) {
                Some(id) => {
                    self.buffer.clear();
                    self.state = ViewState::Viewing(id);
                }
                None => return false,
            },
            ViewState::Editing(id) => {
                self.store.update(&id, &self.buffer);
                self.buffer.clear();
                self.state = ViewState::Viewing(id);
            }
            ViewState::Viewing(_) | ViewState::Empty => {}
        }
        self.reconcile();
        true
    }

    /// Drop the edit buffer and go back to what was shown before.
    pub fn cancel(&mut self) {
        let back_to = match self.state.clone() {
            ViewState::Creating { previous } => previous,
            ViewState::Editing(id) => Some(id),
            _ => return,
        };
        self.buffer.clear();
        self.state = match back_to {
            Some(id) => ViewState::Viewing(id),
            None => ViewState::Empty,
        };
        self.reconcile();
    }

    /// Delete note `id` from the store. Any draft in progress is abandoned.
    pub fn delete(&mut self, id: &NoteId) {
        self.cancel();
        self.store.remove(id);
        if self.selected_id() == Some(id) {
            self.state = match self.store.most_recent() {
                Some(n) => ViewState::Viewing(n.id.clone()),
                None => ViewState::Empty,
            };
        }
        self.reconcile();
    }

    pub fn search(&mut self, query: &str) {
        self.search_query = query.to_string();
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_visible = !self.sidebar_visible;
    }

    // keep the state honest with the store after every command
    fn reconcile(&mut self) {
        if self.store.is_empty() {
            if !matches!(self.state, ViewState::Creating { .. }) {
                self.state = ViewState::Empty;
                self.buffer.clear();
            }
            return;
        }
        let stale = match self.state {
            ViewState::Viewing(ref id) | ViewState::Editing(ref id) => !self.store.contains(id),
            ViewState::Empty => true,
            ViewState::Creating { .. } => false,
        };
        if stale {
            if let Some(n) = self.store.most_recent() {
                log::debug!("selecting most recent note {}", n.id);
                self.state = ViewState::Viewing(n.id.clone());
                self.buffer.clear();
            }
        }
    }

    fn is_composing(&self) -> bool {
        matches!(self.state, ViewState::Creating { .. } | ViewState::Editing(_))
    }

    fn selected_id(&self) -> Option<&NoteId> {
        match self.state {
            ViewState::Viewing(ref id) | ViewState::Editing(ref id) => Some(id),
            _ => None,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// the selected note, looked up fresh from the store
    pub fn current_note(&self) -> Option<&Note> {
        self.selected_id().and_then(|id| self.store.get(id))
    }

    pub fn edit_buffer(&self) -> Option<&Draft> {
        if self.is_composing() {
            Some(&self.buffer)
        } else {
            None
        }
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn sidebar_visible(&self) -> bool {
        self.sidebar_visible
    }

    /// notes matching the search query, in display order
    pub fn sidebar(&self) -> Vec<NoteSummary> {
        let selected = self.selected_id();
        self.store
            .filter(&self.search_query)
            .into_iter()
            .map(|n| NoteSummary {
                id: n.id.clone(),
                title: n.title.clone(),
                preview: n.preview(PREVIEW_CHARS),
                last_edited: n.last_edited,
                selected: selected == Some(&n.id),
            })
            .collect()
    }

    pub fn store(&self) -> &NoteStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NoteStore<S> {
        &mut self.store
    }
}

/// initial sidebar visibility for a terminal `columns` wide
pub fn sidebar_fits(columns: usize) -> bool {
    columns >= SIDEBAR_MIN_COLUMNS
}
