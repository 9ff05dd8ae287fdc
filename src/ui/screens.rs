use crate::models::{Book, Statistics};

/// Book table state. `books` always holds the last result fetched from the
/// store: the full list, or the matches for `query` while a search is active.
pub(crate) struct BooksScreen {
    pub(crate) books: Vec<Book>,
    pub(crate) query: Option<String>,
    pub(crate) selected: usize,
}

impl BooksScreen {
    pub(crate) fn new(books: Vec<Book>) -> Self {
        Self {
            books,
            query: None,
            selected: 0,
        }
    }

    pub(crate) fn current_book(&self) -> Option<&Book> {
        self.books.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.books.is_empty() {
            return;
        }
        let len = self.books.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.books.len().saturating_sub(1);
    }

    /// Swap in a fresh result set, keeping the cursor on `focus_id` when it is
    /// still present.
    pub(crate) fn set_books(&mut self, books: Vec<Book>, focus_id: Option<i64>) {
        self.books = books;
        if let Some(idx) = focus_id.and_then(|id| self.books.iter().position(|b| b.id == id)) {
            self.selected = idx;
        }
        self.ensure_in_bounds();
    }

    pub(crate) fn ensure_in_bounds(&mut self) {
        if self.books.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.books.len() {
            self.selected = self.books.len() - 1;
        }
    }
}

/// Snapshot shown by the statistics popup.
pub(crate) struct StatsView {
    pub(crate) stats: Statistics,
}

impl StatsView {
    pub(crate) fn lines(&self) -> [String; 3] {
        [
            format!("Total books: {}", self.stats.total),
            format!("Read books: {}", self.stats.read),
            format!("Read percentage: {:.2}%", self.stats.read_percentage),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64) -> Book {
        Book {
            id,
            title: format!("Book {id}"),
            author: "Someone".to_string(),
            year: 2000,
            genre: String::new(),
            read: false,
        }
    }

    #[test]
    fn selection_is_clamped() {
        let mut screen = BooksScreen::new(vec![book(1), book(2), book(3)]);
        screen.move_selection(10);
        assert_eq!(screen.selected, 2);
        screen.move_selection(-10);
        assert_eq!(screen.selected, 0);
        screen.select_last();
        assert_eq!(screen.current_book().map(|b| b.id), Some(3));
    }

    #[test]
    fn set_books_follows_focus_and_shrinks() {
        let mut screen = BooksScreen::new(vec![book(1), book(2), book(3)]);
        screen.set_books(vec![book(1), book(2), book(3), book(4)], Some(4));
        assert_eq!(screen.selected, 3);
        screen.set_books(vec![book(1)], None);
        assert_eq!(screen.selected, 0);
        screen.set_books(Vec::new(), None);
        assert!(screen.current_book().is_none());
    }

    #[test]
    fn stats_lines_use_two_decimals() {
        let view = StatsView {
            stats: Statistics::from_counts(3, 1),
        };
        assert_eq!(view.lines()[2], "Read percentage: 33.33%");
    }
}
