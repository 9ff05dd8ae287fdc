use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};

use super::Library;
use crate::error::LibraryResult;
use crate::models::{Book, NewBook};

const BOOK_COLUMNS: &str = "id, title, author, year, genre, read_status";

/// Map a `books` row onto the struct. Rows written by other tools may carry
/// NULLs in the optional columns, so those fall back to neutral values.
fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        year: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
        genre: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        read: row.get::<_, Option<bool>>(5)?.unwrap_or(false),
    })
}

/// Escape `LIKE` wildcards so the query is matched as a literal substring.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

impl Library {
    /// Retrieve every book in insertion order.
    pub fn fetch_all(&self) -> LibraryResult<Vec<Book>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id"))?;

        let books = stmt
            .query_map([], book_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(books)
    }

    /// Look up a single book. The edit and delete flows use it to confirm the
    /// id still exists.
    pub fn fetch_one(&self, id: i64) -> LibraryResult<Option<Book>> {
        let conn = self.connect()?;
        let book = conn
            .query_row(
                &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
                params![id],
                book_from_row,
            )
            .optional()?;
        Ok(book)
    }

    /// Books whose title or author contains `query`. Matching follows SQLite's
    /// `LIKE`, which folds ASCII case only. An empty query returns everything.
    pub fn search(&self, query: &str) -> LibraryResult<Vec<Book>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOK_COLUMNS} FROM books
             WHERE title LIKE ?1 ESCAPE '\\' OR author LIKE ?1 ESCAPE '\\'
             ORDER BY id"
        ))?;

        let books = stmt
            .query_map(params![like_pattern(query)], book_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(query, matches = books.len(), "search finished");
        Ok(books)
    }

    /// Insert a new book and return its freshly assigned id.
    pub fn create(&self, book: &NewBook) -> LibraryResult<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO books (title, author, year, genre, read_status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![book.title, book.author, book.year, book.genre, book.read as i64],
        )?;

        let id = conn.last_insert_rowid();
        info!(id, title = %book.title, "book added");
        Ok(id)
    }

    /// Insert a batch on a single connection. Either every row lands or none
    /// does.
    pub fn create_many(&self, books: &[NewBook]) -> LibraryResult<Vec<i64>> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(books.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO books (title, author, year, genre, read_status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for book in books {
                stmt.execute(params![
                    book.title,
                    book.author,
                    book.year,
                    book.genre,
                    book.read as i64
                ])?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit()?;

        info!(count = ids.len(), "books imported");
        Ok(ids)
    }

    /// Replace every field except the id. Updating an id that does not exist
    /// is a silent no-op; the return value is the number of rows touched.
    pub fn update(&self, id: i64, book: &NewBook) -> LibraryResult<usize> {
        let conn = self.connect()?;
        let updated = conn.execute(
            "UPDATE books SET title = ?1, author = ?2, year = ?3, genre = ?4, read_status = ?5
             WHERE id = ?6",
            params![
                book.title,
                book.author,
                book.year,
                book.genre,
                book.read as i64,
                id
            ],
        )?;

        info!(id, updated, "book updated");
        Ok(updated)
    }

    /// Remove a book. Deleting a missing id succeeds without touching anything.
    pub fn delete(&self, id: i64) -> LibraryResult<usize> {
        let conn = self.connect()?;
        let deleted = conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;

        info!(id, deleted, "book removed");
        Ok(deleted)
    }
}
