//! Command-line surface and runtime settings. Running without a subcommand
//! launches the TUI; the subcommands run one action headlessly and print the
//! result, which is handy for scripting exports.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use directories::BaseDirs;

use crate::actions::{Action, DEFAULT_EXPORT_FILE};
use crate::error::LibraryResult;
use crate::models::NewBook;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".personal-library-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.sqlite";
/// Log folder inside the application data directory.
const LOG_DIR_NAME: &str = "logs";

#[derive(Parser, Debug)]
#[command(name = "personal-library-manager")]
#[command(about = "Track the books you own and the ones you have read")]
pub struct Cli {
    /// Path to the SQLite library file
    #[arg(long, env = "LIBRARY_DB", value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Directory for rolling log files
    #[arg(long, env = "LIBRARY_LOG_DIR", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. `debug`)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Add one book
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        /// Publication year (digits only)
        #[arg(long)]
        year: String,
        #[arg(long, default_value = "")]
        genre: String,
        /// Mark the book as already read
        #[arg(long)]
        read: bool,
    },
    /// Delete the book with ID (missing ids are ignored)
    Delete {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Print the book with ID
    Show {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Print every book
    List,
    /// Print books whose title or author contains QUERY
    Search {
        #[arg(value_name = "QUERY", default_value = "")]
        query: String,
    },
    /// Print total, read count and read percentage
    Stats,
    /// Write the whole library to a CSV file
    Export {
        #[arg(value_name = "FILE", default_value = DEFAULT_EXPORT_FILE)]
        file: PathBuf,
    },
    /// Add every row of a CSV file to the library
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Command {
    /// Validate the raw arguments and turn them into a dispatchable action.
    pub fn into_action(self) -> LibraryResult<Action> {
        let action = match self {
            Command::Add {
                title,
                author,
                year,
                genre,
                read,
            } => Action::Add(NewBook::parse(&title, &author, &year, &genre, read)?),
            Command::Delete { id } => Action::Delete(id),
            Command::Show { id } => Action::Fetch(id),
            Command::List => Action::List,
            Command::Search { query } => Action::Search(query),
            Command::Stats => Action::Stats,
            Command::Export { file } => Action::Export(file),
            Command::Import { file } => Action::Import(file),
        };
        Ok(action)
    }
}

/// Resolved locations used by `main`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl Settings {
    /// Fill in anything the user did not pass explicitly with paths under the
    /// home directory.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let database = match &cli.database {
            Some(path) => path.clone(),
            None => data_dir()?.join(DB_FILE_NAME),
        };
        let log_dir = match &cli.log_dir {
            Some(path) => path.clone(),
            None => data_dir()?.join(LOG_DIR_NAME),
        };

        Ok(Self {
            database,
            log_dir,
            log_level: cli.log_level.clone(),
        })
    }
}

/// Resolve the application data directory inside the user's home.
fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_paths_win() {
        let cli = Cli::parse_from([
            "personal-library-manager",
            "--database",
            "/tmp/books.sqlite",
            "--log-dir",
            "/tmp/logs",
        ]);
        let settings = Settings::resolve(&cli).unwrap();
        assert_eq!(settings.database, PathBuf::from("/tmp/books.sqlite"));
        assert_eq!(settings.log_dir, PathBuf::from("/tmp/logs"));
        assert_eq!(settings.log_level, "info");
        assert!(cli.command.is_none());
    }

    #[test]
    fn add_validates_before_dispatch() {
        let cli = Cli::parse_from([
            "personal-library-manager",
            "add",
            "--title",
            "Dune",
            "--author",
            "Herbert",
            "--year",
            "+1965",
        ]);
        let err = cli.command.unwrap().into_action().unwrap_err();
        assert!(matches!(err, crate::error::LibraryError::Validation(_)));

        let cli = Cli::parse_from(["personal-library-manager", "show", "3"]);
        assert!(matches!(
            cli.command.unwrap().into_action().unwrap(),
            Action::Fetch(3)
        ));
    }

    #[test]
    fn export_defaults_to_library_csv() {
        let cli = Cli::parse_from(["personal-library-manager", "export"]);
        assert_eq!(
            cli.command,
            Some(Command::Export {
                file: PathBuf::from("library.csv")
            })
        );
    }

    #[test]
    fn add_collects_raw_fields() {
        let cli = Cli::parse_from([
            "personal-library-manager",
            "add",
            "--title",
            "Dune",
            "--author",
            "Herbert",
            "--year",
            "1965",
            "--read",
        ]);
        assert_eq!(
            cli.command,
            Some(Command::Add {
                title: "Dune".to_string(),
                author: "Herbert".to_string(),
                year: "1965".to_string(),
                genre: String::new(),
                read: true,
            })
        );
    }

    #[test]
    fn search_accepts_query() {
        let cli = Cli::parse_from(["personal-library-manager", "search", "en"]);
        assert_eq!(
            cli.command,
            Some(Command::Search {
                query: "en".to_string()
            })
        );
    }
}
