use super::Library;
use crate::error::LibraryResult;
use crate::models::Statistics;

impl Library {
    /// Count all books and the ones marked read.
    pub fn statistics(&self) -> LibraryResult<Statistics> {
        let conn = self.connect()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        let read: i64 = conn.query_row(
            "SELECT COUNT(*) FROM books WHERE read_status = 1",
            [],
            |row| row.get(0),
        )?;

        Ok(Statistics::from_counts(total, read))
    }
}
