pub mod args;
pub mod codec;
pub mod crypt;
pub mod errors;
pub mod note;
pub mod shell;
pub mod storage;
pub mod store;
pub mod utils;
pub mod view;

use std::io::stdin;

use clap::Parser;

use args::{Cli, Commands};
use errors::Result;
use note::Draft;
use storage::{FileStorage, Storage};
use store::NoteStore;
use view::{sidebar_fits, Controller};

/// Pick the passphrase for the store: `--key`, else a prompt when `--encrypted`.
fn passphrase(cli: &Cli) -> Result<Option<String>> {
    match (&cli.key, cli.encrypted) {
        (Some(k), _) => Ok(Some(k.clone())),
        (None, true) => Ok(Some(utils::get_password()?)),
        (None, false) => Ok(None),
    }
}

/// One-shot commands treat an unsaved change as a failure.
fn saved<S: Storage>(store: &mut NoteStore<S>) -> Result<()> {
    match store.take_warning() {
        Some(w) => crate::specific_fail!(w),
        None => Ok(()),
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let folder = utils::find_data_folder(&cli.data_dir)?;
    let storage = FileStorage::new(&folder, &cli.store);
    log::debug!("using {}", storage.path().display());
    let mut store = NoteStore::load(storage, passphrase(&cli)?);

    // anything other than the interactive shell must not write over an unreadable value
    if !matches!(cli.command, Some(Commands::Shell)) {
        if let Some(w) = store.take_warning() {
            return crate::specific_fail!(w);
        }
    }

    match &cli.command {
        Some(Commands::Add { title, content, editor }) => {
            let content = if *editor && utils::stdin_is_tty() && utils::stdout_is_tty() {
                utils::drop_to_editor(content)?
            } else {
                content.clone()
            };
            match store.add(&Draft::new(title, &content)) {
                Some(id) => {
                    saved(&mut store)?;
                    println!("note {} added", id.short());
                }
                None => return crate::specific_fail_str!("nothing to add, title and content are empty"),
            }
        }
        Some(Commands::Edit { id, title, content, editor }) => {
            let note = store.find_by_prefix(id)?.clone();
            let mut draft = Draft::from_note(&note);
            if let Some(t) = title {
                draft.title = t.clone();
            }
            if let Some(c) = content {
                draft.content = c.clone();
            } else if *editor && utils::stdin_is_tty() && utils::stdout_is_tty() {
                if store.is_encrypted() && !cli.yes {
                    let message = format!(
                        "{0}\n\n{1}\n{2}\n\n{0}\n{3}\n",
                        "## [WARNING] ##",
                        "continuing will write the decrypted note to a temporary",
                        "file, increasing the possibility it could be recovered later.",
                        "Are you sure you want to continue?"
                    );
                    if !utils::get_yn_input(&message)? {
                        return crate::specific_fail_str!("ok bye");
                    }
                }
                draft.content = utils::drop_to_editor(&note.content)?;
            }
            if store.update(&note.id, &draft) {
                saved(&mut store)?;
                println!("edited note {}", note.id.short());
            } else {
                return crate::specific_fail_str!("a note needs a title or some content");
            }
        }
        Some(Commands::Del { id }) => {
            for prefix in id {
                match store.find_by_prefix(prefix).map(|n| n.id.clone()) {
                    Ok(nid) => {
                        store.remove(&nid);
                        saved(&mut store)?;
                        println!("deleted note {}", nid.short());
                    }
                    Err(e) => println!("{}", e),
                }
            }
        }
        Some(Commands::View { id, yaml, condensed }) => {
            utils::print_note(store.find_by_prefix(id)?, *yaml, *condensed)?;
        }
        Some(Commands::Search { query, regex, limit }) => {
            let compiled;
            let hits = if *regex {
                compiled = regex::RegexBuilder::new(query).case_insensitive(true).build()?;
                store.filter_regex(&compiled)
            } else {
                store.filter(query)
            };
            if hits.is_empty() {
                println!("nothing found");
            } else {
                utils::print_notes(&hits, limit.unwrap_or(0), false, false)?;
            }
        }
        Some(Commands::Shell) => {
            let mut controller = Controller::new(store, sidebar_fits(utils::termsize()));
            let prompt = utils::stdin_is_tty();
            shell::run(&mut controller, stdin().lock(), prompt)?;
        }
        Some(Commands::Info) => {
            let tty = utils::stdout_is_tty();
            utils::pretty_line("store: ", &format!("{}\n", cli.store), tty)?;
            utils::pretty_line("location: ", &format!("{}\n", store.storage().describe()), tty)?;
            utils::pretty_line("encrypted: ", &format!("{}\n", store.is_encrypted()), tty)?;
            utils::pretty_line("notes: ", &format!("{}\n", store.len()), tty)?;
            let oldest = store.notes().iter().map(|n| n.last_edited).min();
            let newest = store.notes().iter().map(|n| n.last_edited).max();
            if let (Some(o), Some(n)) = (oldest, newest) {
                utils::pretty_line(
                    "last edits: ",
                    &format!("oldest: {}, newest: {}\n", utils::localize(&o), utils::localize(&n)),
                    tty,
                )?;
            }
        }
        Some(Commands::Clear) => {
            if !cli.yes
                && !utils::get_yn_input("are you sure you want to delete all the notes in this store?\n")?
            {
                return crate::specific_fail_str!("ok bye");
            }
            store.clear();
            saved(&mut store)?;
        }
        Some(Commands::Encrypt { new_key }) => {
            if store.is_encrypted() {
                println!("store '{}' is already encrypted.", cli.store);
            } else {
                let key = match new_key {
                    Some(k) => k.clone(),
                    None => utils::get_new_password()?,
                };
                store.set_passphrase(Some(key))?;
                println!("encrypted '{}'", cli.store);
            }
        }
        Some(Commands::Decrypt) => {
            if store.is_encrypted() {
                store.set_passphrase(None)?;
                println!("decrypted '{}'", cli.store);
            } else {
                println!("store '{}' is not encrypted.", cli.store);
            }
        }
        Some(Commands::List { limit, yaml, condensed }) => {
            list(&store, limit.unwrap_or(0), *yaml, *condensed)?;
        }
        None => list(&store, 0, false, false)?,
    }

    Ok(())
}

fn list<S: Storage>(store: &NoteStore<S>, limit: usize, yaml: bool, condensed: bool) -> Result<()> {
    if store.is_empty() {
        if yaml {
            println!("[]");
        } else {
            println!("no notes yet");
        }
        return Ok(());
    }
    utils::print_notes(&store.filter(""), limit, yaml, condensed)
}
