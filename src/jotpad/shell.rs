//! Interactive front end: reads one command per line, drives the
//! [`Controller`] and redraws the sidebar and main panel after every command.

use std::io::{stdout, BufRead, Write};

use crate::errors::Result;
use crate::note::NoteId;
use crate::storage::Storage;
use crate::utils::{drop_to_editor, localize, pretty_line, stdout_is_tty, termsize, format_field};
use crate::view::{Controller, ViewState};

static HELP: &str = "\
commands:
  add                  start a new note
  select <id|#n>       show a note (#n = n-th row of the list)
  edit                 edit the shown note
  title <text>         set the draft title
  content <text>       set the draft content
  append <text>        add a line to the draft content
  editor               write the draft content in $EDITOR
  save                 commit the draft
  cancel               discard the draft
  delete [id|#n]       delete a note (default: the shown one)
  search [text]        filter the list (no text clears the filter)
  sidebar              show/hide the list
  show                 redraw
  help                 this text
  quit                 leave
";

static NOT_EDITING: &str = "not editing, use 'add' or 'edit' first";

/// A reference to a note typed by the user
#[derive(Debug, Clone, PartialEq)]
pub enum NoteRef {
    /// 1-based row of the visible list
    Row(usize),
    Id(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Add,
    Select(NoteRef),
    Edit,
    Title(String),
    Content(String),
    Append(String),
    Editor,
    Save,
    Cancel,
    Delete(Option<NoteRef>),
    Search(String),
    Sidebar,
    Show,
    Help,
    Quit,
}

fn parse_ref(arg: &str) -> std::result::Result<NoteRef, String> {
    match arg.strip_prefix('#') {
        Some(n) => match n.parse::<usize>() {
            Ok(i) if i > 0 => Ok(NoteRef::Row(i)),
            _ => Err(format!("'{}' is not a list row", arg)),
        },
        None => Ok(NoteRef::Id(arg.to_string())),
    }
}

/// Parse one input line. Blank lines parse to `Ok(None)`.
pub fn parse(line: &str) -> std::result::Result<Option<ShellCommand>, String> {
    let line = line.trim_end_matches(['\n', '\r']);
    let trimmed = line.trim_start();
    if trimmed.trim().is_empty() {
        return Ok(None);
    }
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r),
        None => (trimmed, ""),
    };
    let arg = rest.trim();
    let cmd = match word.to_lowercase().as_str() {
        "add" | "new" => ShellCommand::Add,
        "select" | "s" => {
            if arg.is_empty() {
                return Err("select needs an id or #row".to_string());
            }
            ShellCommand::Select(parse_ref(arg)?)
        }
        "edit" | "e" => ShellCommand::Edit,
        // free text keeps its inner spacing
        "title" => ShellCommand::Title(rest.to_string()),
        "content" => ShellCommand::Content(rest.replace("\\n", "\n")),
        "append" => ShellCommand::Append(rest.replace("\\n", "\n")),
        "editor" => ShellCommand::Editor,
        "save" | "w" => ShellCommand::Save,
        "cancel" => ShellCommand::Cancel,
        "delete" | "del" | "rm" => {
            if arg.is_empty() {
                ShellCommand::Delete(None)
            } else {
                ShellCommand::Delete(Some(parse_ref(arg)?))
            }
        }
        "search" | "/" => ShellCommand::Search(arg.to_string()),
        "sidebar" => ShellCommand::Sidebar,
        "show" | "ls" => ShellCommand::Show,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Some(cmd))
}

/// What the loop should do after a command ran
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Redraw,
    Message(String),
    Help,
    Quit,
}

fn resolve<S: Storage>(controller: &Controller<S>, r: &NoteRef) -> std::result::Result<NoteId, String> {
    match r {
        NoteRef::Row(n) => n
            .checked_sub(1)
            .and_then(|i| controller.sidebar().get(i).map(|row| row.id.clone()))
            .ok_or_else(|| format!("there is no row #{}", n)),
        NoteRef::Id(prefix) => controller
            .store()
            .find_by_prefix(prefix)
            .map(|n| n.id.clone())
            .map_err(|e| e.to_string()),
    }
}

/// Run one command against the controller.
pub fn apply<S: Storage>(controller: &mut Controller<S>, cmd: ShellCommand) -> Result<Outcome> {
    let outcome = match cmd {
        ShellCommand::Add => {
            controller.add();
            Outcome::Redraw
        }
        ShellCommand::Select(r) => match resolve(controller, &r) {
            Ok(id) => {
                controller.select(&id);
                Outcome::Redraw
            }
            Err(e) => Outcome::Message(e),
        },
        ShellCommand::Edit => {
            if matches!(controller.state(), ViewState::Viewing(_)) {
                controller.edit();
                Outcome::Redraw
            } else {
                Outcome::Message("nothing to edit".to_string())
            }
        }
        ShellCommand::Title(_) | ShellCommand::Content(_) | ShellCommand::Append(_)
            if controller.edit_buffer().is_none() =>
        {
            Outcome::Message(NOT_EDITING.to_string())
        }
        ShellCommand::Title(t) => {
            controller.set_title(&t);
            Outcome::Redraw
        }
        ShellCommand::Content(c) => {
            controller.set_content(&c);
            Outcome::Redraw
        }
        ShellCommand::Append(line) => {
            let mut content = controller
                .edit_buffer()
                .map(|d| d.content.clone())
                .unwrap_or_default();
            if !content.is_empty() {
                content.push('\n');
            }
            content.push_str(&line);
            controller.set_content(&content);
            Outcome::Redraw
        }
        ShellCommand::Editor => match controller.edit_buffer().map(|d| d.content.clone()) {
            Some(current) => {
                let edited = drop_to_editor(&current)?;
                controller.set_content(&edited);
                Outcome::Redraw
            }
            None => Outcome::Message(NOT_EDITING.to_string()),
        },
        ShellCommand::Save => {
            if controller.save() {
                Outcome::Redraw
            } else {
                Outcome::Message("nothing to save, the note is empty".to_string())
            }
        }
        ShellCommand::Cancel => {
            controller.cancel();
            Outcome::Redraw
        }
        ShellCommand::Delete(r) => {
            let target = match r {
                Some(r) => resolve(controller, &r),
                None => controller
                    .current_note()
                    .map(|n| n.id.clone())
                    .ok_or_else(|| "no note selected".to_string()),
            };
            match target {
                Ok(id) => {
                    controller.delete(&id);
                    Outcome::Redraw
                }
                Err(e) => Outcome::Message(e),
            }
        }
        ShellCommand::Search(q) => {
            controller.search(&q);
            Outcome::Redraw
        }
        ShellCommand::Sidebar => {
            controller.toggle_sidebar();
            Outcome::Redraw
        }
        ShellCommand::Show => Outcome::Redraw,
        ShellCommand::Help => Outcome::Help,
        ShellCommand::Quit => Outcome::Quit,
    };
    Ok(outcome)
}

fn render<S: Storage>(controller: &Controller<S>) -> Result<()> {
    let tty = stdout_is_tty();
    let width = termsize().max(40);

    if controller.sidebar_visible() {
        let heading = if controller.search_query().is_empty() {
            "notes\n".to_string()
        } else {
            format!("notes matching '{}'\n", controller.search_query())
        };
        pretty_line(&heading, "", tty)?;
        let rows = controller.sidebar();
        if rows.is_empty() {
            println!("  (none)");
        }
        for (i, row) in rows.iter().enumerate() {
            let marker = if row.selected { ">" } else { " " };
            let line = format!(
                "{}{:>3}  {}  {}  {}",
                marker,
                format!("#{}", i + 1),
                row.id.short(),
                localize(&row.last_edited),
                row.title
            );
            println!("{}", format_field(&line, width, true).trim_end());
            if !row.preview.is_empty() {
                println!("{}", format_field(&format!("        {}", row.preview), width, true).trim_end());
            }
        }
        println!();
    }

    match controller.state() {
        ViewState::Empty => println!("no notes yet, type 'add' to write one"),
        ViewState::Viewing(_) => {
            if let Some(note) = controller.current_note() {
                pretty_line(&format!("{}\n", note.title), "", tty)?;
                println!("{}  edited {}", note.id.short(), localize(&note.last_edited));
                println!();
                println!("{}", note.content);
            }
        }
        ViewState::Creating { .. } | ViewState::Editing(_) => {
            let header = if matches!(controller.state(), ViewState::Creating { .. }) {
                "new note"
            } else {
                "editing"
            };
            pretty_line(&format!("[{}]\n", header), "", tty)?;
            if let Some(draft) = controller.edit_buffer() {
                pretty_line("title: ", &format!("{}\n", draft.title), tty)?;
                pretty_line("content:\n", &format!("{}\n", draft.content), tty)?;
            }
            println!("('save' to keep, 'cancel' to discard)");
        }
    }
    Ok(())
}

fn report_warning<S: Storage>(controller: &mut Controller<S>) {
    if let Some(w) = controller.store_mut().take_warning() {
        eprintln!("warning: {}", w);
    }
}

/// Read commands from `input` until it ends or the user quits.
pub fn run<S: Storage, R: BufRead>(controller: &mut Controller<S>, mut input: R, prompt: bool) -> Result<()> {
    report_warning(controller);
    render(controller)?;
    loop {
        if prompt {
            print!("jotpad> ");
            stdout().flush()?;
        }
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let cmd = match parse(&line) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        log::debug!("shell command {:?}", cmd);
        let outcome = apply(controller, cmd);
        report_warning(controller);
        match outcome {
            Ok(Outcome::Redraw) => render(controller)?,
            Ok(Outcome::Message(m)) => println!("{}", m),
            Ok(Outcome::Help) => print!("{}", HELP),
            Ok(Outcome::Quit) => break,
            // an editor failure should not end the session
            Err(e) => println!("error: {}", e),
        }
    }
    Ok(())
}
