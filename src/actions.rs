//! Dispatch table between whatever front-end is driving the library (the TUI or
//! the headless subcommands) and the store. Each `Action` maps onto exactly one
//! core operation, so front-ends never touch SQL or the CSV codec directly.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::db::Library;
use crate::error::{LibraryError, LibraryResult};
use crate::models::{Book, NewBook, Statistics};
use crate::transfer::{export_csv, parse_csv};

/// File name suggested for exports when the user does not pick one.
pub const DEFAULT_EXPORT_FILE: &str = "library.csv";

#[derive(Debug, Clone)]
pub enum Action {
    Add(NewBook),
    Update { id: i64, book: NewBook },
    Delete(i64),
    Fetch(i64),
    List,
    Search(String),
    Stats,
    Export(PathBuf),
    Import(PathBuf),
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Created(i64),
    Updated(i64),
    Deleted(i64),
    /// `None` when the id is no longer in the store.
    Found { id: i64, book: Option<Book> },
    Books(Vec<Book>),
    Stats(Statistics),
    Exported { path: PathBuf, count: usize },
    Imported { path: PathBuf, count: usize },
}

/// Run a single action to completion against the library.
pub fn dispatch(library: &Library, action: Action) -> LibraryResult<Outcome> {
    match action {
        Action::Add(book) => library.create(&book).map(Outcome::Created),
        Action::Update { id, book } => {
            library.update(id, &book)?;
            Ok(Outcome::Updated(id))
        }
        Action::Delete(id) => {
            library.delete(id)?;
            Ok(Outcome::Deleted(id))
        }
        Action::Fetch(id) => {
            let book = library.fetch_one(id)?;
            Ok(Outcome::Found { id, book })
        }
        Action::List => library.fetch_all().map(Outcome::Books),
        Action::Search(query) => library.search(&query).map(Outcome::Books),
        Action::Stats => library.statistics().map(Outcome::Stats),
        Action::Export(path) => {
            let books = library.fetch_all()?;
            fs::write(&path, export_csv(&books)).map_err(|source| LibraryError::Io {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), count = books.len(), "library exported");
            Ok(Outcome::Exported {
                path,
                count: books.len(),
            })
        }
        Action::Import(path) => {
            let blob = fs::read_to_string(&path).map_err(|source| LibraryError::Io {
                path: path.clone(),
                source,
            })?;
            let books = parse_csv(&blob)?;
            let ids = library.create_many(&books)?;
            info!(path = %path.display(), count = ids.len(), "library imported");
            Ok(Outcome::Imported {
                path,
                count: ids.len(),
            })
        }
    }
}

fn write_book(f: &mut fmt::Formatter<'_>, book: &Book) -> fmt::Result {
    write!(
        f,
        "{:>4}  {} by {} ({}) [{}] {}",
        book.id,
        book.title,
        book.author,
        book.year,
        book.genre,
        book.status()
    )
}

/// Plain-text report used by the headless subcommands.
impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created(id) => write!(f, "Added book ID {id}"),
            Outcome::Updated(id) => write!(f, "Updated book ID {id}"),
            Outcome::Deleted(id) => write!(f, "Deleted book ID {id}"),
            Outcome::Found { book: Some(book), .. } => write_book(f, book),
            Outcome::Found { id, book: None } => write!(f, "Book ID {id} not found."),
            Outcome::Books(books) if books.is_empty() => f.write_str("No books found."),
            Outcome::Books(books) => {
                for (idx, book) in books.iter().enumerate() {
                    if idx > 0 {
                        writeln!(f)?;
                    }
                    write_book(f, book)?;
                }
                Ok(())
            }
            Outcome::Stats(stats) => write!(
                f,
                "Total books: {}\nRead books: {}\nRead percentage: {:.2}%",
                stats.total, stats.read, stats.read_percentage
            ),
            Outcome::Exported { path, count } => {
                write!(f, "Exported {count} books to {}", path.display())
            }
            Outcome::Imported { path, count } => {
                write!(f, "Imported {count} books from {}", path.display())
            }
        }
    }
}
