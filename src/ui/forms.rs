use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::error::LibraryResult;
use crate::models::{Book, NewBook};

/// Internal representation of the add/edit book form fields. Everything is
/// kept as raw text until `parse_inputs` turns it into a typed `NewBook`.
#[derive(Default, Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) year: String,
    pub(crate) genre: String,
    pub(crate) read: bool,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

/// Fields available within the book form, in tab order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Year,
    Genre,
    Read,
}

impl BookField {
    pub(crate) const ALL: [BookField; 5] = [
        BookField::Title,
        BookField::Author,
        BookField::Year,
        BookField::Genre,
        BookField::Read,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Year => "Publication Year",
            BookField::Genre => "Genre",
            BookField::Read => "Have you read it?",
        }
    }

    fn next(self) -> Self {
        match self {
            BookField::Title => BookField::Author,
            BookField::Author => BookField::Year,
            BookField::Year => BookField::Genre,
            BookField::Genre => BookField::Read,
            BookField::Read => BookField::Title,
        }
    }

    fn previous(self) -> Self {
        match self {
            BookField::Title => BookField::Read,
            BookField::Author => BookField::Title,
            BookField::Year => BookField::Author,
            BookField::Genre => BookField::Year,
            BookField::Read => BookField::Genre,
        }
    }
}

impl BookForm {
    /// Populate the form from an existing book when editing.
    pub(crate) fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year.to_string(),
            genre: book.genre.clone(),
            read: book.read,
            active: BookField::Title,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.next();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.previous();
    }

    /// Append a character to the active field. The year only takes digits and
    /// the read checkbox toggles on space.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BookField::Title => self.title.push(ch),
            BookField::Author => self.author.push(ch),
            BookField::Year => {
                if !ch.is_ascii_digit() {
                    return false;
                }
                self.year.push(ch);
            }
            BookField::Genre => self.genre.push(ch),
            BookField::Read => {
                if ch != ' ' {
                    return false;
                }
                self.read = !self.read;
            }
        }
        true
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            BookField::Title => {
                self.title.pop();
            }
            BookField::Author => {
                self.author.pop();
            }
            BookField::Year => {
                self.year.pop();
            }
            BookField::Genre => {
                self.genre.pop();
            }
            BookField::Read => {}
        }
    }

    /// Validate the inputs and return a typed record ready for persistence.
    pub(crate) fn parse_inputs(&self) -> LibraryResult<NewBook> {
        NewBook::parse(&self.title, &self.author, &self.year, &self.genre, self.read)
    }

    fn value(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Year => &self.year,
            BookField::Genre => &self.genre,
            BookField::Read => "",
        }
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: BookField) -> Line<'static> {
        let is_active = self.active == field;
        let prefix = format!("{}: ", field.label());

        if field == BookField::Read {
            let mark = if self.read { "[x]" } else { "[ ]" };
            let style = if is_active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            return Line::from(vec![Span::raw(prefix), Span::styled(mark, style)]);
        }

        let value = self.value(field);
        let placeholder = if field == BookField::Genre {
            "<optional>"
        } else {
            "<required>"
        };
        let display = if value.is_empty() {
            placeholder.to_string()
        } else {
            value.to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![Span::raw(prefix), Span::styled(display, style)])
    }

    /// Cursor column offset for the active field, counted from the start of
    /// its line.
    pub(crate) fn cursor_offset(&self) -> usize {
        let prefix = self.active.label().chars().count() + 2;
        match self.active {
            BookField::Read => prefix + 1,
            field => prefix + self.value(field).chars().count(),
        }
    }
}

/// Details of the book awaiting a delete confirmation.
#[derive(Clone)]
pub(crate) struct ConfirmBookDelete {
    pub(crate) id: i64,
    pub(crate) title: String,
}

impl ConfirmBookDelete {
    pub(crate) fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
        }
    }
}

/// Which way a transfer prompt moves data.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum TransferDirection {
    Export,
    Import,
}

/// File path prompt shown before exporting or importing CSV.
#[derive(Clone)]
pub(crate) struct TransferPrompt {
    pub(crate) direction: TransferDirection,
    pub(crate) path: String,
    pub(crate) error: Option<String>,
}

impl TransferPrompt {
    pub(crate) fn new(direction: TransferDirection, default_path: &str) -> Self {
        Self {
            direction,
            path: default_path.to_string(),
            error: None,
        }
    }

    pub(crate) fn title(&self) -> &'static str {
        match self.direction {
            TransferDirection::Export => "Export Library",
            TransferDirection::Import => "Import Library",
        }
    }
}
