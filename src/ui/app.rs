use std::mem;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use tracing::warn;

use crate::actions::{dispatch, Action, Outcome, DEFAULT_EXPORT_FILE};
use crate::db::Library;
use crate::models::{Book, NewBook, ReadStatus};

use super::forms::{BookField, BookForm, ConfirmBookDelete, TransferDirection, TransferPrompt};
use super::helpers::{centered_rect, cursor_column, status_span, surface_error};
use super::screens::{BooksScreen, StatsView};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the search bar shown above the table.
const SEARCH_BAR_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 5;

/// Fine-grained modes layered on top of the book table.
enum Mode {
    Normal,
    AddingBook(BookForm),
    EditingBook { id: i64, form: BookForm },
    ConfirmDelete(ConfirmBookDelete),
    Searching,
    Stats(StatsView),
    Transfer(TransferPrompt),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    library: Library,
    screen: BooksScreen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(library: Library, books: Vec<Book>) -> Self {
        Self {
            library,
            screen: BooksScreen::new(books),
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Feed one key press through the current mode. Returns `true` when the
    /// user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBook(form) => self.handle_book_form(code, None, form),
            Mode::EditingBook { id, form } => self.handle_book_form(code, Some(id), form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::Searching => self.handle_search(code),
            Mode::Stats(_) => Mode::Normal,
            Mode::Transfer(prompt) => self.handle_transfer(code, prompt),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if self.screen.query.is_some() {
                    self.clear_search();
                } else {
                    *exit = true;
                }
            }
            KeyCode::Up => self.screen.move_selection(-1),
            KeyCode::Down => self.screen.move_selection(1),
            KeyCode::PageUp => self.screen.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.screen.move_selection(PAGE_STEP),
            KeyCode::Home => self.screen.select_first(),
            KeyCode::End => self.screen.select_last(),
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Ok(Mode::AddingBook(BookForm::default()));
            }
            KeyCode::Char('e') | KeyCode::Enter => match self.selected_id() {
                Some(id) => {
                    if let Some(book) = self.stored_book(id) {
                        self.clear_status();
                        let form = BookForm::from_book(&book);
                        return Ok(Mode::EditingBook { id, form });
                    }
                }
                None => self.set_status("No book selected to edit.", StatusKind::Error),
            },
            KeyCode::Char('-') | KeyCode::Char('d') => match self.selected_id() {
                Some(id) => {
                    if let Some(book) = self.stored_book(id) {
                        self.clear_status();
                        return Ok(Mode::ConfirmDelete(ConfirmBookDelete::from(&book)));
                    }
                }
                None => self.set_status("No book selected to delete.", StatusKind::Error),
            },
            KeyCode::Char(' ') => {
                if let Some(book) = self.screen.current_book().cloned() {
                    self.toggle_read(&book);
                }
            }
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.clear_status();
                if self.screen.query.is_none() {
                    self.screen.query = Some(String::new());
                }
                return Ok(Mode::Searching);
            }
            KeyCode::Char('t') => {
                let outcome = self.run(Action::Stats).context("Statistics failed");
                match outcome {
                    Ok(Outcome::Stats(stats)) => return Ok(Mode::Stats(StatsView { stats })),
                    Ok(_) => {}
                    Err(err) => self.report_error(&err),
                }
            }
            KeyCode::Char('x') => {
                self.clear_status();
                return Ok(Mode::Transfer(TransferPrompt::new(
                    TransferDirection::Export,
                    DEFAULT_EXPORT_FILE,
                )));
            }
            KeyCode::Char('i') => {
                self.clear_status();
                return Ok(Mode::Transfer(TransferPrompt::new(
                    TransferDirection::Import,
                    DEFAULT_EXPORT_FILE,
                )));
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_book_form(&mut self, code: KeyCode, id: Option<i64>, mut form: BookForm) -> Mode {
        match code {
            KeyCode::Esc => {
                let text = if id.is_some() {
                    "Edit cancelled."
                } else {
                    "Add book cancelled."
                };
                self.set_status(text, StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_book(id, &form) {
                Ok(()) => return Mode::Normal,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        match id {
            Some(id) => Mode::EditingBook { id, form },
            None => Mode::AddingBook(form),
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmBookDelete) -> Mode {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                match self.run(Action::Delete(confirm.id)) {
                    Ok(_) => {
                        self.refresh(None);
                        self.set_status(
                            format!("Book ID {} deleted successfully!", confirm.id),
                            StatusKind::Info,
                        );
                    }
                    Err(err) => self.report_error(&err.context("Delete failed")),
                }
                Mode::Normal
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status("Delete cancelled.", StatusKind::Info);
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn handle_search(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Esc => {
                self.clear_search();
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Up => {
                self.screen.move_selection(-1);
                return Mode::Searching;
            }
            KeyCode::Down => {
                self.screen.move_selection(1);
                return Mode::Searching;
            }
            KeyCode::Backspace => {
                if let Some(query) = self.screen.query.as_mut() {
                    query.pop();
                }
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                self.screen.query.get_or_insert_with(String::new).push(ch);
            }
            _ => return Mode::Searching,
        }

        self.refresh(None);
        if self.screen.books.is_empty() {
            self.set_status("No books found.", StatusKind::Error);
        } else {
            self.clear_status();
        }
        Mode::Searching
    }

    fn handle_transfer(&mut self, code: KeyCode, mut prompt: TransferPrompt) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status(format!("{} cancelled.", prompt.title()), StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Backspace => {
                prompt.path.pop();
            }
            KeyCode::Enter => match self.run_transfer(&prompt) {
                Ok(()) => return Mode::Normal,
                Err(err) => {
                    let message = surface_error(&err);
                    prompt.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) if !ch.is_control() => {
                prompt.path.push(ch);
                prompt.error = None;
            }
            _ => {}
        }
        Mode::Transfer(prompt)
    }

    fn save_book(&mut self, id: Option<i64>, form: &BookForm) -> Result<()> {
        let book: NewBook = form.parse_inputs()?;
        if let Some(id) = id {
            if let Outcome::Found { book: None, .. } = self.run(Action::Fetch(id))? {
                self.refresh(None);
                bail!("Book ID {id} not found.");
            }
        }
        let title = book.title.clone();
        let action = match id {
            Some(id) => Action::Update { id, book },
            None => Action::Add(book),
        };

        match self.run(action)? {
            Outcome::Created(id) => {
                self.refresh(Some(id));
                self.set_status(format!("'{title}' added to your library!"), StatusKind::Info);
            }
            Outcome::Updated(id) => {
                self.refresh(Some(id));
                self.set_status(
                    format!("Book ID {id} updated successfully!"),
                    StatusKind::Info,
                );
            }
            _ => {}
        }
        Ok(())
    }

    fn toggle_read(&mut self, book: &Book) {
        let mut updated = book.to_new_book();
        updated.read = !updated.read;
        let status = ReadStatus::from(updated.read);

        match self.run(Action::Update {
            id: book.id,
            book: updated,
        }) {
            Ok(_) => {
                self.refresh(Some(book.id));
                self.set_status(
                    format!("Marked '{}' as {status}.", book.title),
                    StatusKind::Info,
                );
            }
            Err(err) => self.report_error(&err.context("Update failed")),
        }
    }

    fn run_transfer(&mut self, prompt: &TransferPrompt) -> Result<()> {
        let path = PathBuf::from(prompt.path.trim());
        let action = match prompt.direction {
            TransferDirection::Export => Action::Export(path),
            TransferDirection::Import => Action::Import(path),
        };

        match self.run(action).context(format!("{} failed", prompt.title()))? {
            Outcome::Exported { path, count } => {
                self.set_status(
                    format!("Exported {count} books to {}.", path.display()),
                    StatusKind::Info,
                );
            }
            Outcome::Imported { path, count } => {
                self.refresh(None);
                self.set_status(
                    format!("Imported {count} books from {}.", path.display()),
                    StatusKind::Info,
                );
            }
            _ => {}
        }
        Ok(())
    }

    fn selected_id(&self) -> Option<i64> {
        self.screen.current_book().map(|book| book.id)
    }

    /// Re-read the record before acting on it. A row that is gone from the
    /// store is reported and the table is reloaded.
    fn stored_book(&mut self, id: i64) -> Option<Book> {
        match self.run(Action::Fetch(id)) {
            Ok(Outcome::Found { book: Some(book), .. }) => Some(book),
            Ok(_) => {
                self.refresh(None);
                self.set_status(format!("Book ID {id} not found."), StatusKind::Error);
                None
            }
            Err(err) => {
                self.report_error(&err.context("Failed to load book"));
                None
            }
        }
    }

    /// Dispatch through the action table, converting the typed error into
    /// `anyhow` for the UI.
    fn run(&self, action: Action) -> Result<Outcome> {
        Ok(dispatch(&self.library, action)?)
    }

    /// Re-query the store for the table contents: the active search or the full
    /// list.
    fn refresh(&mut self, focus_id: Option<i64>) {
        let action = match &self.screen.query {
            Some(query) => Action::Search(query.clone()),
            None => Action::List,
        };
        match self.run(action) {
            Ok(Outcome::Books(books)) => self.screen.set_books(books, focus_id),
            Ok(_) => {}
            Err(err) => self.report_error(&err.context("Failed to load books")),
        }
    }

    fn clear_search(&mut self) {
        self.screen.query = None;
        self.refresh(None);
        self.clear_status();
    }

    fn report_error(&mut self, err: &anyhow::Error) {
        warn!(error = %surface_error(err), "operation failed");
        self.set_status(surface_error(err), StatusKind::Error);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);
        let show_search = self.screen.query.is_some();

        let mut constraints = Vec::with_capacity(3);
        if show_search {
            constraints.push(Constraint::Length(SEARCH_BAR_HEIGHT));
        }
        constraints.push(Constraint::Min(0));
        constraints.push(Constraint::Length(footer_height));
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let (search_area, table_area, footer_area) = if show_search {
            (Some(chunks[0]), chunks[1], chunks[2])
        } else {
            (None, chunks[0], chunks[1])
        };

        if let Some(search_area) = search_area {
            self.draw_search_bar(frame, search_area);
        }
        self.draw_book_table(frame, table_area);
        self.draw_footer(frame, footer_area);

        match &self.mode {
            Mode::AddingBook(form) => self.draw_book_form(frame, area, "Add a New Book", form),
            Mode::EditingBook { id, form } => {
                self.draw_book_form(frame, area, &format!("Edit Book ID {id}"), form)
            }
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Stats(view) => self.draw_stats(frame, area, view),
            Mode::Transfer(prompt) => self.draw_transfer(frame, area, prompt),
            Mode::Searching | Mode::Normal => {}
        }
    }

    fn draw_book_table(&self, frame: &mut Frame, area: Rect) {
        let title = match &self.screen.query {
            Some(query) if !query.is_empty() => format!("Search results for \"{query}\""),
            _ => "Your Book Collection".to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);

        if self.screen.books.is_empty() {
            let message = if self.screen.query.is_some() {
                "No books found."
            } else {
                "No books in the library yet. Press + to add one."
            };
            let paragraph = Paragraph::new(Line::from(Span::styled(
                message,
                Style::default().fg(Color::DarkGray),
            )))
            .block(block)
            .alignment(Alignment::Center);
            frame.render_widget(paragraph, area);
            return;
        }

        let header = Row::new(["ID", "Title", "Author", "Year", "Genre", "Read Status"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = self.screen.books.iter().map(|book| {
            Row::new(vec![
                Cell::from(book.id.to_string()),
                Cell::from(book.title.clone()),
                Cell::from(book.author.clone()),
                Cell::from(book.year.to_string()),
                Cell::from(book.genre.clone()),
                Cell::from(status_span(book.status())),
            ])
        });
        let widths = [
            Constraint::Length(6),
            Constraint::Percentage(35),
            Constraint::Percentage(25),
            Constraint::Length(6),
            Constraint::Percentage(20),
            Constraint::Length(11),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> ");

        let mut state = TableState::default();
        state.select(Some(self.screen.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect) {
        let query = self.screen.query.as_deref().unwrap_or_default();
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Search by title or author");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {query}")))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);

        if matches!(self.mode, Mode::Searching) {
            let inner = block.inner(area);
            let cursor_x = cursor_column(inner.x, "Search: ".len() + query.chars().count());
            frame.set_cursor_position((cursor_x, inner.y));
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match &self.mode {
            Mode::Normal => &[
                ("[+]", " Add   "),
                ("[e]", " Edit   "),
                ("[-]", " Delete   "),
                ("[Space]", " Read/Unread   "),
                ("[f]", " Search   "),
                ("[t]", " Stats   "),
                ("[x]", " Export   "),
                ("[i]", " Import   "),
                ("[q]", " Quit"),
            ],
            Mode::Searching => &[
                ("[Type]", " Filter   "),
                ("[Enter]", " Keep results   "),
                ("[Esc]", " Clear search"),
            ],
            Mode::AddingBook(_) | Mode::EditingBook { .. } => &[
                ("[Tab]", " Next field   "),
                ("[Space]", " Toggle read   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::ConfirmDelete(_) => &[("[y]", " Delete   "), ("[n]", " Keep")],
            Mode::Stats(_) => &[("[Any key]", " Close")],
            Mode::Transfer(_) => &[("[Enter]", " Run   "), ("[Esc]", " Cancel")],
        };

        Line::from(
            keys.iter()
                .flat_map(|(key, label)| [Span::styled(*key, key_style), Span::raw(*label)])
                .collect::<Vec<_>>(),
        )
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = BookField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);

        let row = BookField::ALL
            .iter()
            .position(|field| *field == form.active)
            .unwrap_or_default();
        frame.set_cursor_position((
            cursor_column(inner.x, form.cursor_offset()),
            cursor_column(inner.y, row),
        ));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmBookDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Confirm Delete").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete Book ID {} ({})?", confirm.id, confirm.title)),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_stats(&self, frame: &mut Frame, area: Rect, view: &StatsView) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Library Statistics")
            .borders(Borders::ALL);
        let lines: Vec<Line> = view.lines().into_iter().map(Line::from).collect();
        frame.render_widget(Paragraph::new(lines).block(block), popup_area);
    }

    fn draw_transfer(&self, frame: &mut Frame, area: Rect, prompt: &TransferPrompt) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(prompt.title()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let hint = match prompt.direction {
            TransferDirection::Export => "Writes ID, Title, Author, Year, Genre, Read Status.",
            TransferDirection::Import => "Every row must have Title, Author and Year.",
        };
        let footer = match &prompt.error {
            Some(error) => Span::styled(error.clone(), Style::default().fg(Color::Red)),
            None => Span::styled(hint, Style::default().fg(Color::Gray)),
        };
        let lines = vec![
            Line::from(format!("CSV file: {}", prompt.path)),
            Line::from(""),
            Line::from(footer),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let cursor_x = cursor_column(inner.x, "CSV file: ".len() + prompt.path.chars().count());
        frame.set_cursor_position((cursor_x, inner.y));
    }
}
