//! Domain models that mirror the `books` table and get passed throughout the
//! TUI. `Book` is what the store hands back; `NewBook` is the typed,
//! already-validated payload that create/update accept, so raw form text never
//! reaches a SQL statement.

use std::fmt;

use crate::error::{LibraryError, LibraryResult};

#[derive(Debug, Clone, PartialEq)]
/// One persisted row of the `books` table.
pub struct Book {
    /// Primary key assigned by SQLite. Never reused after deletion because the
    /// table uses `AUTOINCREMENT`.
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year: i64,
    /// Free text; empty when the user left it blank.
    pub genre: String,
    pub read: bool,
}

impl Book {
    /// Strip the id so the record can be written back through `update` or
    /// compared against freshly imported rows.
    pub fn to_new_book(&self) -> NewBook {
        NewBook {
            title: self.title.clone(),
            author: self.author.clone(),
            year: self.year,
            genre: self.genre.clone(),
            read: self.read,
        }
    }

    pub fn status(&self) -> ReadStatus {
        ReadStatus::from(self.read)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Field values for a book that has not been assigned an id yet.
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub year: i64,
    pub genre: String,
    pub read: bool,
}

impl NewBook {
    /// Parse loosely typed input (form fields, command-line arguments) into a
    /// record the store can accept.
    ///
    /// Title and author must be non-empty after trimming. The year must be made
    /// of ASCII digits only; signs, spaces inside the number, and decimals are
    /// rejected.
    pub fn parse(
        title: &str,
        author: &str,
        year: &str,
        genre: &str,
        read: bool,
    ) -> LibraryResult<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LibraryError::validation("Title is required."));
        }
        let author = author.trim();
        if author.is_empty() {
            return Err(LibraryError::validation("Author is required."));
        }
        let year = parse_year(year)?;

        Ok(Self {
            title: title.to_string(),
            author: author.to_string(),
            year,
            genre: genre.trim().to_string(),
            read,
        })
    }
}

/// Year rule shared by the form, the command line and CSV import: ASCII digits
/// only, surrounding whitespace ignored.
pub(crate) fn parse_year(raw: &str) -> LibraryResult<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(LibraryError::validation("Publication year is required."));
    }
    if !raw.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(LibraryError::validation(
            "Please enter a valid year (only numbers).",
        ));
    }
    raw.parse::<i64>()
        .map_err(|_| LibraryError::validation("Publication year is too large."))
}

/// Human label for the boolean read flag.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReadStatus {
    Read,
    Unread,
}

impl From<bool> for ReadStatus {
    fn from(read: bool) -> Self {
        if read {
            ReadStatus::Read
        } else {
            ReadStatus::Unread
        }
    }
}

impl fmt::Display for ReadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadStatus::Read => f.write_str("Read"),
            ReadStatus::Unread => f.write_str("Unread"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Summary counts shown on the statistics popup.
pub struct Statistics {
    pub total: i64,
    pub read: i64,
    /// `read / total * 100`, or exactly `0.0` for an empty library.
    pub read_percentage: f64,
}

impl Statistics {
    pub fn from_counts(total: i64, read: i64) -> Self {
        let read_percentage = if total > 0 {
            read as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total,
            read,
            read_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_types_fields() {
        let book = NewBook::parse("  Dune ", "Herbert", " 1965 ", " Sci-Fi ", false).unwrap();
        assert_eq!(
            book,
            NewBook {
                title: "Dune".to_string(),
                author: "Herbert".to_string(),
                year: 1965,
                genre: "Sci-Fi".to_string(),
                read: false,
            }
        );
    }

    #[test]
    fn parse_allows_empty_genre() {
        let book = NewBook::parse("Emma", "Austen", "1815", "", true).unwrap();
        assert!(book.genre.is_empty());
        assert!(book.read);
    }

    #[test]
    fn parse_rejects_missing_title_or_author() {
        assert!(matches!(
            NewBook::parse("   ", "Austen", "1815", "", true),
            Err(LibraryError::Validation(_))
        ));
        assert!(matches!(
            NewBook::parse("Emma", "", "1815", "", true),
            Err(LibraryError::Validation(_))
        ));
    }

    #[test]
    fn parse_rejects_non_numeric_year() {
        for year in ["", "19x5", "-12", "1965.0", "nineteen"] {
            let err = NewBook::parse("Dune", "Herbert", year, "", false).unwrap_err();
            assert!(matches!(err, LibraryError::Validation(_)), "year {year:?}");
        }
    }

    #[test]
    fn parse_rejects_year_overflow() {
        let err = NewBook::parse("Dune", "Herbert", "99999999999999999999", "", false);
        assert!(matches!(err, Err(LibraryError::Validation(_))));
    }

    #[test]
    fn statistics_guard_against_empty_library() {
        let stats = Statistics::from_counts(0, 0);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.read, 0);
        assert_eq!(stats.read_percentage, 0.0);
    }

    #[test]
    fn statistics_percentage() {
        assert_eq!(Statistics::from_counts(4, 1).read_percentage, 25.0);
        assert_eq!(Statistics::from_counts(2, 1).read_percentage, 50.0);
        assert_eq!(Statistics::from_counts(3, 3).read_percentage, 100.0);
    }

    #[test]
    fn read_status_labels() {
        assert_eq!(ReadStatus::from(true).to_string(), "Read");
        assert_eq!(ReadStatus::from(false).to_string(), "Unread");
    }
}
