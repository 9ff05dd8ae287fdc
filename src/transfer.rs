//! CSV import/export for the whole library.
//!
//! Export always writes `ID,Title,Author,Year,Genre,Read Status`. Import wants
//! the same column set, with `ID` optional and ignored, in any order. Parsing
//! is all-or-nothing: the first bad row rejects the file before anything is
//! written to the store.

use std::collections::HashMap;

use crate::error::{LibraryError, LibraryResult};
use crate::models::{parse_year, Book, NewBook};

const DELIMITER: char = ',';

const ID: &str = "ID";
const TITLE: &str = "Title";
const AUTHOR: &str = "Author";
const YEAR: &str = "Year";
const GENRE: &str = "Genre";
const READ_STATUS: &str = "Read Status";

const REQUIRED_COLUMNS: [&str; 5] = [TITLE, AUTHOR, YEAR, GENRE, READ_STATUS];

/// Render the books as CSV text, header first.
pub fn export_csv(books: &[Book]) -> String {
    let mut out = String::new();
    let header = [ID, TITLE, AUTHOR, YEAR, GENRE, READ_STATUS];
    out.push_str(&header.join(&DELIMITER.to_string()));
    out.push('\n');

    for book in books {
        let fields = [
            book.id.to_string(),
            escape_field(&book.title),
            escape_field(&book.author),
            book.year.to_string(),
            escape_field(&book.genre),
            if book.read { "1" } else { "0" }.to_string(),
        ];
        out.push_str(&fields.join(&DELIMITER.to_string()));
        out.push('\n');
    }

    out
}

/// Quote a field when it contains the delimiter, a quote, or a line break.
fn escape_field(field: &str) -> String {
    if field.contains(DELIMITER)
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r')
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Parse a CSV blob into records ready for insertion.
pub fn parse_csv(blob: &str) -> LibraryResult<Vec<NewBook>> {
    let blob = blob.strip_prefix('\u{feff}').unwrap_or(blob);
    let mut records = split_records(blob)?.into_iter();

    let (header_line, header) = records
        .next()
        .ok_or_else(|| LibraryError::malformed(1, "file is empty"))?;
    let columns = Columns::from_header(header_line, &header)?;

    records
        .map(|(line, fields)| columns.book_from_fields(line, &fields))
        .collect()
}

/// Positions of each known column inside a row.
struct Columns {
    width: usize,
    title: usize,
    author: usize,
    year: usize,
    genre: usize,
    read_status: usize,
}

impl Columns {
    fn from_header(line: usize, header: &[String]) -> LibraryResult<Self> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (idx, name) in header.iter().enumerate() {
            let name = name.trim();
            if name != ID && !REQUIRED_COLUMNS.contains(&name) {
                return Err(LibraryError::malformed(
                    line,
                    format!("unexpected column `{name}`"),
                ));
            }
            if positions.insert(name, idx).is_some() {
                return Err(LibraryError::malformed(
                    line,
                    format!("duplicate column `{name}`"),
                ));
            }
        }

        let position = |name: &str| {
            positions
                .get(name)
                .copied()
                .ok_or_else(|| LibraryError::malformed(line, format!("missing column `{name}`")))
        };

        Ok(Self {
            width: header.len(),
            title: position(TITLE)?,
            author: position(AUTHOR)?,
            year: position(YEAR)?,
            genre: position(GENRE)?,
            read_status: position(READ_STATUS)?,
        })
    }

    fn book_from_fields(&self, line: usize, fields: &[String]) -> LibraryResult<NewBook> {
        if fields.len() != self.width {
            return Err(LibraryError::malformed(
                line,
                format!("expected {} fields, found {}", self.width, fields.len()),
            ));
        }

        // Whitespace only counts for the empty check; values are kept verbatim.
        let required = |idx: usize, name: &str| {
            let value = &fields[idx];
            if value.trim().is_empty() {
                Err(LibraryError::malformed(line, format!("missing {name}")))
            } else {
                Ok(value.clone())
            }
        };

        let title = required(self.title, TITLE)?;
        let author = required(self.author, AUTHOR)?;
        let year_raw = required(self.year, YEAR)?;
        let year = parse_year(&year_raw).map_err(|err| {
            LibraryError::malformed(line, format!("year `{}`: {err}", year_raw.trim()))
        })?;
        let read = parse_read_status(&fields[self.read_status]).ok_or_else(|| {
            LibraryError::malformed(
                line,
                format!("unrecognised read status `{}`", fields[self.read_status].trim()),
            )
        })?;

        Ok(NewBook {
            title,
            author,
            year,
            genre: fields[self.genre].clone(),
            read,
        })
    }
}

fn parse_read_status(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "unread" => Some(false),
        "1" | "true" | "yes" | "read" => Some(true),
        _ => None,
    }
}

/// Split the blob into records of fields, tagging each record with the line it
/// starts on. Quoted fields may span lines. Blank lines are dropped.
fn split_records(blob: &str) -> LibraryResult<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = blob.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' if field.is_empty() => in_quotes = true,
            DELIMITER => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, record_line, std::mem::take(&mut fields));
                line += 1;
                record_line = line;
            }
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return Err(LibraryError::malformed(record_line, "unterminated quoted field"));
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        push_record(&mut records, record_line, fields);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, line: usize, fields: Vec<String>) {
    let blank = fields.len() == 1 && fields[0].trim().is_empty();
    if !blank {
        records.push((line, fields));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64, title: &str, author: &str, year: i64, genre: &str, read: bool) -> Book {
        Book {
            id,
            title: title.to_string(),
            author: author.to_string(),
            year,
            genre: genre.to_string(),
            read,
        }
    }

    #[test]
    fn export_writes_header_and_rows() {
        let csv = export_csv(&[
            book(1, "Dune", "Herbert", 1965, "Sci-Fi", false),
            book(2, "Emma", "Austen", 1815, "Romance", true),
        ]);
        assert_eq!(
            csv,
            "ID,Title,Author,Year,Genre,Read Status\n\
             1,Dune,Herbert,1965,Sci-Fi,0\n\
             2,Emma,Austen,1815,Romance,1\n"
        );
    }

    #[test]
    fn export_of_empty_library_is_header_only() {
        assert_eq!(export_csv(&[]), "ID,Title,Author,Year,Genre,Read Status\n");
    }

    #[test]
    fn export_quotes_awkward_fields() {
        let csv = export_csv(&[book(
            7,
            "Crime, and \"Punishment\"",
            "Dostoevsky",
            1866,
            "Novel\nRussian",
            true,
        )]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "7,\"Crime, and \"\"Punishment\"\"\",Dostoevsky,1866,\"Novel");
    }

    #[test]
    fn parse_reads_exported_text_back() {
        let books = vec![
            book(3, "Crime, and \"Punishment\"", "Dostoevsky", 1866, "Novel\nRussian", true),
            book(9, "Dune", "Herbert", 1965, "", false),
        ];
        let parsed = parse_csv(&export_csv(&books)).unwrap();
        let expected: Vec<NewBook> = books.iter().map(Book::to_new_book).collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn parse_keeps_surrounding_whitespace() {
        let books = vec![book(4, " Dune", "Herbert ", 1965, " Sci-Fi ", false)];
        let parsed = parse_csv(&export_csv(&books)).unwrap();
        assert_eq!(parsed, vec![books[0].to_new_book()]);
    }

    #[test]
    fn parse_applies_form_year_rules() {
        let header = "Title,Author,Year,Genre,Read Status\n";
        for year in ["-12", "+1965", "19.65", "99999999999999999999"] {
            let blob = format!("{header}Dune,Herbert,{year},,0\n");
            assert!(
                matches!(parse_csv(&blob), Err(LibraryError::MalformedRow { line: 2, .. })),
                "year {year:?}"
            );
        }
        let parsed = parse_csv(&format!("{header}Dune,Herbert, 1965 ,,0\n")).unwrap();
        assert_eq!(parsed[0].year, 1965);
    }

    #[test]
    fn parse_accepts_missing_id_reordered_columns_and_crlf() {
        let blob = "\u{feff}Author,Title,Read Status,Genre,Year\r\nAusten,Emma,yes,Romance,1815\r\n\r\n";
        let parsed = parse_csv(blob).unwrap();
        assert_eq!(
            parsed,
            vec![NewBook {
                title: "Emma".to_string(),
                author: "Austen".to_string(),
                year: 1815,
                genre: "Romance".to_string(),
                read: true,
            }]
        );
    }

    #[test]
    fn parse_handles_last_row_without_newline() {
        let parsed = parse_csv("Title,Author,Year,Genre,Read Status\nDune,Herbert,1965,,").unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(!parsed[0].read);
        assert!(parsed[0].genre.is_empty());
    }

    #[test]
    fn parse_rejects_missing_author_column() {
        let err = parse_csv("ID,Title,Year,Genre,Read Status\n1,Dune,1965,Sci-Fi,0\n").unwrap_err();
        match err {
            LibraryError::MalformedRow { line, reason } => {
                assert_eq!(line, 1);
                assert!(reason.contains("Author"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_unknown_and_duplicate_columns() {
        assert!(matches!(
            parse_csv("Title,Author,Year,Genre,Read Status,Rating\n"),
            Err(LibraryError::MalformedRow { line: 1, .. })
        ));
        assert!(matches!(
            parse_csv("Title,Title,Author,Year,Genre,Read Status\n"),
            Err(LibraryError::MalformedRow { line: 1, .. })
        ));
    }

    #[test]
    fn parse_rejects_empty_blob() {
        assert!(matches!(
            parse_csv(""),
            Err(LibraryError::MalformedRow { line: 1, .. })
        ));
    }

    #[test]
    fn parse_rejects_rows_with_missing_required_fields() {
        let blob = "Title,Author,Year,Genre,Read Status\n\
                    Dune,Herbert,1965,Sci-Fi,0\n\
                    Emma,,1815,Romance,1\n";
        match parse_csv(blob).unwrap_err() {
            LibraryError::MalformedRow { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("Author"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_bad_year_short_row_and_bad_status() {
        let header = "Title,Author,Year,Genre,Read Status\n";
        for row in [
            "Dune,Herbert,nineteen,Sci-Fi,0\n",
            "Dune,Herbert,1965\n",
            "Dune,Herbert,1965,Sci-Fi,maybe\n",
        ] {
            let blob = format!("{header}{row}");
            assert!(
                matches!(parse_csv(&blob), Err(LibraryError::MalformedRow { line: 2, .. })),
                "row {row:?}"
            );
        }
    }

    #[test]
    fn parse_rejects_unterminated_quote() {
        let blob = "Title,Author,Year,Genre,Read Status\n\"Dune,Herbert,1965,,0\n";
        assert!(matches!(
            parse_csv(blob),
            Err(LibraryError::MalformedRow { line: 2, .. })
        ));
    }

    #[test]
    fn multiline_field_reports_following_row_line() {
        let blob = "Title,Author,Year,Genre,Read Status\n\
                    \"Two\nLines\",Someone,2000,,0\n\
                    Broken,,2001,,0\n";
        assert!(matches!(
            parse_csv(blob),
            Err(LibraryError::MalformedRow { line: 4, .. })
        ));
    }
}
