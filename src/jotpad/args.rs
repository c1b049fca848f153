use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "jotpad")]
#[command(version)]
#[command(about = "a small local note keeper", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Storage key the notes live under
    #[arg(short, long, default_value = "notes")]
    pub store: String,

    /// Data folder to use
    #[arg(long, env = "JOTPAD_DIR")]
    pub data_dir: Option<String>,

    /// Encryption key
    #[arg(short, long, env = "JOTPAD_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// The store is encrypted (prompts for the key if none was given)
    #[arg(long)]
    pub encrypted: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a new note
    Add {
        /// Title of the note
        title: String,

        /// Content of the note
        #[arg(default_value = "")]
        content: String,

        /// Use editor to write the content
        #[arg(short, long)]
        editor: bool,
    },

    /// Edit an existing note
    Edit {
        /// ID (or unique prefix) of the note to edit
        id: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New content
        #[arg(short, long)]
        content: Option<String>,

        /// Use editor for the content
        #[arg(short, long)]
        editor: bool,
    },

    /// Delete notes
    Del {
        /// ID(s) of the notes to delete
        #[arg(required = true)]
        id: Vec<String>,
    },

    /// Show a single note
    View {
        id: String,

        /// Output as YAML
        #[arg(long)]
        yaml: bool,

        /// Condensed output
        #[arg(short, long)]
        condensed: bool,
    },

    /// List notes, most recent first (default if no command)
    List {
        /// Limit results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output as YAML
        #[arg(long)]
        yaml: bool,

        /// Condensed output
        #[arg(short, long)]
        condensed: bool,
    },

    /// Search titles and contents
    Search {
        /// Text to look for, case-insensitive
        query: String,

        /// Treat the query as a regular expression
        #[arg(short, long)]
        regex: bool,

        /// Limit results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Interactive session
    Shell,

    /// Show store info
    Info,

    /// Delete all notes
    Clear,

    /// Encrypt the store
    Encrypt {
        /// New key (optional, will prompt if missing)
        #[arg(long)]
        new_key: Option<String>,
    },

    /// Decrypt the store
    Decrypt,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_edit_with_flags() {
        let cli = Cli::try_parse_from(["jotpad", "--store", "work", "edit", "ab12", "-t", "New"]).unwrap();
        assert_eq!(cli.store, "work");
        match cli.command {
            Some(Commands::Edit { id, title, content, editor }) => {
                assert_eq!(id, "ab12");
                assert_eq!(title.as_deref(), Some("New"));
                assert!(content.is_none());
                assert!(!editor);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["jotpad"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.store, "notes");
    }
}
