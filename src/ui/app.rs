use std::collections::HashMap;
use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;

use crate::db::{add_cookbook, add_tags, fetch_cookbook_tag_names, list_cookbooks, record_borrow};
use crate::models::Cookbook;

use super::forms::{BorrowField, BorrowForm, CookbookField, CookbookForm, RatingForm, TagForm};
use super::helpers::{
    borrow_record_line, centered_rect, cookbook_detail_lines, cookbook_list_label, cursor_position,
    surface_error,
};
use super::screens::{step_selection, HistoryScreen, PhotogenicScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Share of the shelf screen given to the cookbook list; the rest is the
/// detail pane.
const LIST_PERCENT: u16 = 45;
/// Rating prefilled in the photogenic prompt.
const DEFAULT_MINIMUM_RATING: i64 = 4;

/// High-level navigation states.
enum Screen {
    Shelf,
    Photogenic(PhotogenicScreen),
    History(HistoryScreen),
}

/// Modal overlays scoped to the current screen.
enum Mode {
    Normal,
    AddingCookbook(CookbookForm),
    AddingTags(TagForm),
    RecordingBorrow(BorrowForm),
    PickingRating(RatingForm),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
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

/// Central application state shared across the TUI. It owns the only
/// database connection, which closes when the app is dropped.
pub struct App {
    conn: Connection,
    cookbooks: Vec<Cookbook>,
    tags: HashMap<i64, Vec<String>>,
    selected: usize,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Build the app and load the shelf from `conn`.
    pub fn load(conn: Connection) -> Result<Self> {
        let mut app = Self {
            conn,
            cookbooks: Vec::new(),
            tags: HashMap::new(),
            selected: 0,
            screen: Screen::Shelf,
            mode: Mode::Normal,
            status: None,
        };
        app.reload_shelf(None)?;
        Ok(app)
    }

    /// Dispatch a key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingCookbook(form) => self.handle_add_cookbook(code, form)?,
            Mode::AddingTags(form) => self.handle_add_tags(code, form)?,
            Mode::RecordingBorrow(form) => self.handle_record_borrow(code, form)?,
            Mode::PickingRating(form) => self.handle_pick_rating(code, form)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.screen {
            Screen::Shelf => match code {
                KeyCode::Char('q') | KeyCode::Esc => *exit = true,
                KeyCode::Up => self.move_selection(-1),
                KeyCode::Down => self.move_selection(1),
                KeyCode::PageUp => self.move_selection(-5),
                KeyCode::PageDown => self.move_selection(5),
                KeyCode::Home => self.selected = 0,
                KeyCode::End => self.selected = self.cookbooks.len().saturating_sub(1),
                KeyCode::Char('+') => {
                    self.clear_status();
                    return Ok(Mode::AddingCookbook(CookbookForm::default()));
                }
                KeyCode::Char('t') | KeyCode::Char('T') => {
                    if let Some(cookbook) = self.current_cookbook() {
                        let form = TagForm::for_cookbook(cookbook);
                        self.clear_status();
                        return Ok(Mode::AddingTags(form));
                    }
                    self.set_status("No cookbook selected to tag.", StatusKind::Error);
                }
                KeyCode::Char('b') | KeyCode::Char('B') => {
                    if let Some(cookbook) = self.current_cookbook() {
                        let form = BorrowForm::for_cookbook(cookbook);
                        self.clear_status();
                        return Ok(Mode::RecordingBorrow(form));
                    }
                    self.set_status("No cookbook selected to lend.", StatusKind::Error);
                }
                KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Enter => {
                    if let Some(cookbook) = self.current_cookbook().cloned() {
                        self.clear_status();
                        self.screen = Screen::History(HistoryScreen::load(&self.conn, cookbook)?);
                    } else {
                        self.set_status("No cookbook selected.", StatusKind::Error);
                    }
                }
                KeyCode::Char('a') | KeyCode::Char('A') => {
                    self.clear_status();
                    return Ok(Mode::PickingRating(RatingForm::with_default(
                        DEFAULT_MINIMUM_RATING,
                    )));
                }
                KeyCode::Char('r') | KeyCode::Char('R') => {
                    let focus = self.current_cookbook().map(|cookbook| cookbook.id);
                    self.reload_shelf(focus)?;
                    self.set_status(
                        format!("Reloaded {} cookbook(s).", self.cookbooks.len()),
                        StatusKind::Info,
                    );
                }
                _ => {}
            },
            Screen::Photogenic(ref mut results) => {
                let mut back_to_shelf = false;
                let mut focus: Option<i64> = None;
                match code {
                    KeyCode::Char('q') => *exit = true,
                    KeyCode::Esc | KeyCode::Char('a') | KeyCode::Char('A') => back_to_shelf = true,
                    KeyCode::Up => results.move_selection(-1),
                    KeyCode::Down => results.move_selection(1),
                    KeyCode::PageUp => results.move_selection(-5),
                    KeyCode::PageDown => results.move_selection(5),
                    KeyCode::Enter => {
                        focus = results.current().map(|cookbook| cookbook.id);
                        back_to_shelf = true;
                    }
                    _ => {}
                }

                if back_to_shelf {
                    self.clear_status();
                    self.screen = Screen::Shelf;
                    if let Some(id) = focus {
                        self.focus_cookbook(id);
                    }
                }
            }
            Screen::History(ref mut history) => match code {
                KeyCode::Char('q') => *exit = true,
                KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H') => {
                    self.clear_status();
                    self.screen = Screen::Shelf;
                }
                KeyCode::Up => history.move_selection(-1),
                KeyCode::Down => history.move_selection(1),
                KeyCode::Char('b') | KeyCode::Char('B') => {
                    let form = BorrowForm::for_cookbook(&history.cookbook);
                    self.clear_status();
                    return Ok(Mode::RecordingBorrow(form));
                }
                _ => {}
            },
        }
        Ok(Mode::Normal)
    }

    fn handle_add_cookbook(&mut self, code: KeyCode, mut form: CookbookForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Add cookbook cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_cookbook(&form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => form.error = Some(self.report_error(&err)),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::AddingCookbook(form))
    }

    fn handle_add_tags(&mut self, code: KeyCode, mut form: TagForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Tagging cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_tags(&form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => form.error = Some(self.report_error(&err)),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::AddingTags(form))
    }

    fn handle_record_borrow(&mut self, code: KeyCode, mut form: BorrowForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Borrow not recorded.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_borrow(&form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => form.error = Some(self.report_error(&err)),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::RecordingBorrow(form))
    }

    fn handle_pick_rating(&mut self, code: KeyCode, mut form: RatingForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.clear_status();
                return Ok(Mode::Normal);
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.open_photogenic(&form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => form.error = Some(self.report_error(&err)),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::PickingRating(form))
    }

    fn save_new_cookbook(&mut self, form: &CookbookForm) -> Result<()> {
        let cookbook = form.parse_inputs()?;
        let id = add_cookbook(&self.conn, &cookbook)?;
        self.reload_shelf(Some(id))?;
        self.set_status(
            format!("Successfully curated cookbook with id: {id}"),
            StatusKind::Info,
        );
        Ok(())
    }

    fn save_tags(&mut self, form: &TagForm) -> Result<()> {
        let names = form.parse_inputs()?;
        let outcome = add_tags(&self.conn, form.cookbook_id, &names);
        // Tags saved before a failure stay committed, so refresh either way.
        self.reload_shelf(Some(form.cookbook_id))?;
        let report = outcome?;
        self.set_status(report.summary(), StatusKind::Info);
        Ok(())
    }

    fn save_borrow(&mut self, form: &BorrowForm) -> Result<()> {
        let (friend, date) = form.parse_inputs()?;
        record_borrow(&self.conn, form.cookbook_id, &friend, &date)?;
        if let Screen::History(ref mut history) = self.screen {
            if history.cookbook.id == form.cookbook_id {
                history.reload(&self.conn)?;
            }
        }
        self.set_status(
            format!(
                "Cookbook ID {} borrowed by {friend} on {date}.",
                form.cookbook_id
            ),
            StatusKind::Info,
        );
        Ok(())
    }

    fn open_photogenic(&mut self, form: &RatingForm) -> Result<()> {
        let minimum_rating = form.parse_inputs()?;
        let results = PhotogenicScreen::load(&self.conn, minimum_rating)?;
        self.set_status(
            format!(
                "{} photogenic cookbook(s) rated {minimum_rating} or higher.",
                results.cookbooks.len()
            ),
            StatusKind::Info,
        );
        self.screen = Screen::Photogenic(results);
        Ok(())
    }

    /// Re-read cookbooks and tags, keeping the cursor on `focus_id` when it
    /// is still present.
    fn reload_shelf(&mut self, focus_id: Option<i64>) -> Result<()> {
        self.cookbooks = list_cookbooks(&self.conn)?;

        let mut tags: HashMap<i64, Vec<String>> = HashMap::new();
        for (cookbook_id, name) in fetch_cookbook_tag_names(&self.conn)? {
            tags.entry(cookbook_id).or_default().push(name);
        }
        self.tags = tags;

        match focus_id {
            Some(id) => self.focus_cookbook(id),
            None => self.move_selection(0),
        }
        Ok(())
    }

    fn focus_cookbook(&mut self, id: i64) {
        if let Some(index) = self.cookbooks.iter().position(|cookbook| cookbook.id == id) {
            self.selected = index;
        } else {
            self.move_selection(0);
        }
    }

    fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.cookbooks.len(), offset);
    }

    fn current_cookbook(&self) -> Option<&Cookbook> {
        self.cookbooks.get(self.selected)
    }

    fn tags_for(&self, cookbook_id: i64) -> &[String] {
        self.tags
            .get(&cookbook_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Log a failed action and show its root cause in the footer. Returns
    /// the message so forms can repeat it inline.
    fn report_error(&mut self, err: &anyhow::Error) -> String {
        tracing::warn!("{err:#}");
        let message = surface_error(err);
        self.set_status(message.clone(), StatusKind::Error);
        message
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

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Shelf => self.draw_shelf(frame, content_area),
            Screen::Photogenic(results) => self.draw_photogenic(frame, content_area, results),
            Screen::History(history) => self.draw_history(frame, content_area, history),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingCookbook(form) => self.draw_cookbook_form(frame, area, form),
            Mode::AddingTags(form) => self.draw_tag_form(frame, area, form),
            Mode::RecordingBorrow(form) => self.draw_borrow_form(frame, area, form),
            Mode::PickingRating(form) => self.draw_rating_form(frame, area, form),
            Mode::Normal => {}
        }
    }

    fn draw_shelf(&self, frame: &mut Frame, area: Rect) {
        if self.cookbooks.is_empty() {
            let message = Paragraph::new("Your shelf is empty. Press '+' to add a cookbook.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Cookbooks"));
            frame.render_widget(message, area);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(LIST_PERCENT),
                Constraint::Percentage(100 - LIST_PERCENT),
            ])
            .split(area);

        let items: Vec<ListItem> = self
            .cookbooks
            .iter()
            .map(|cookbook| ListItem::new(cookbook_list_label(cookbook)))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Cookbooks ({})", self.cookbooks.len())),
            )
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut list_state = ListState::default();
        list_state.select(Some(self.selected));
        frame.render_stateful_widget(list, chunks[0], &mut list_state);

        if let Some(cookbook) = self.current_cookbook() {
            let detail = Paragraph::new(cookbook_detail_lines(cookbook, self.tags_for(cookbook.id)))
                .block(Block::default().borders(Borders::ALL).title("Details"))
                .wrap(Wrap { trim: true });
            frame.render_widget(detail, chunks[1]);
        }
    }

    fn draw_photogenic(&self, frame: &mut Frame, area: Rect, results: &PhotogenicScreen) {
        let title = format!(
            "Most Photogenic Cookbooks • rating ≥ {}",
            results.minimum_rating
        );
        let block = Block::default().borders(Borders::ALL).title(title);

        if results.cookbooks.is_empty() {
            let message = Paragraph::new("Nothing photogenic enough yet.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = results
            .cookbooks
            .iter()
            .map(|cookbook| {
                ListItem::new(Line::from(vec![
                    Span::raw(cookbook_list_label(cookbook)),
                    Span::styled(
                        format!("  {}", cookbook.cover_color_label()),
                        Style::default().fg(Color::Cyan),
                    ),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut list_state = ListState::default();
        list_state.select(Some(results.selected));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn draw_history(&self, frame: &mut Frame, area: Rect, history: &HistoryScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(1)])
            .split(area);

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                history.cookbook.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::raw(format!(
                "{} loan(s), {} still out",
                history.records.len(),
                history.open_loans()
            ))),
        ])
        .block(Block::default().borders(Borders::ALL).title("Borrow History"));
        frame.render_widget(header, chunks[0]);

        if history.records.is_empty() {
            let message = Paragraph::new("Never lent out. Press 'b' to record a borrow.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, chunks[1]);
            return;
        }

        let items: Vec<ListItem> = history
            .records
            .iter()
            .map(|record| ListItem::new(borrow_record_line(record)))
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL))
            .highlight_symbol("▶ ");
        let mut list_state = ListState::default();
        list_state.select(Some(history.selected));
        frame.render_stateful_widget(list, chunks[1], &mut list_state);
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

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key = |label: &'static str| {
            Span::styled(
                label,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        };

        match (&self.mode, &self.screen) {
            (Mode::Normal, Screen::Shelf) => Line::from(vec![
                key("[+]"),
                Span::raw(" Add  "),
                key("[t]"),
                Span::raw(" Tag  "),
                key("[b]"),
                Span::raw(" Lend  "),
                key("[h]"),
                Span::raw(" History  "),
                key("[a]"),
                Span::raw(" Photogenic  "),
                key("[r]"),
                Span::raw(" Reload  "),
                key("[q]"),
                Span::raw(" Quit"),
            ]),
            (Mode::Normal, Screen::Photogenic(_)) => Line::from(vec![
                key("[Enter]"),
                Span::raw(" Show on shelf  "),
                key("[Esc]"),
                Span::raw(" Back  "),
                key("[q]"),
                Span::raw(" Quit"),
            ]),
            (Mode::Normal, Screen::History(_)) => Line::from(vec![
                key("[b]"),
                Span::raw(" Lend again  "),
                key("[Esc]"),
                Span::raw(" Back  "),
                key("[q]"),
                Span::raw(" Quit"),
            ]),
            _ => Line::from(vec![
                key("[Enter]"),
                Span::raw(" Save  "),
                key("[Tab]"),
                Span::raw(" Next field  "),
                key("[Esc]"),
                Span::raw(" Cancel"),
            ]),
        }
    }

    /// Shared frame for modal forms: clears the popup, draws the border and
    /// appends either the form error or the key hint.
    fn draw_form_popup(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: String,
        mut lines: Vec<Line<'static>>,
        error: Option<&String>,
        size: (u16, u16),
    ) -> Rect {
        let popup_area = centered_rect(size.0, size.1, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        lines.push(Line::from(""));
        if let Some(error) = error {
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

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
        inner
    }

    fn draw_cookbook_form(&self, frame: &mut Frame, area: Rect, form: &CookbookForm) {
        let lines = CookbookField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        let inner = self.draw_form_popup(
            frame,
            area,
            "Add Cookbook".to_string(),
            lines,
            form.error.as_ref(),
            (70, 60),
        );

        let row = CookbookField::ALL
            .iter()
            .position(|field| *field == form.active)
            .unwrap_or(0);
        let prefix = format!("{}: ", form.active.label()).chars().count();
        let column = prefix + form.value_len(form.active);
        frame.set_cursor_position(cursor_position(inner, column, row));
    }

    fn draw_tag_form(&self, frame: &mut Frame, area: Rect, form: &TagForm) {
        let inner = self.draw_form_popup(
            frame,
            area,
            format!("Tag {} (#{})", form.cookbook_title, form.cookbook_id),
            vec![form.build_line()],
            form.error.as_ref(),
            (70, 30),
        );
        let column = "Tags: ".len() + form.input.chars().count();
        frame.set_cursor_position(cursor_position(inner, column, 0));
    }

    fn draw_borrow_form(&self, frame: &mut Frame, area: Rect, form: &BorrowForm) {
        let inner = self.draw_form_popup(
            frame,
            area,
            format!("Lend {} (#{})", form.cookbook_title, form.cookbook_id),
            vec![
                form.build_line(BorrowField::Friend),
                form.build_line(BorrowField::Date),
            ],
            form.error.as_ref(),
            (60, 35),
        );

        let (prefix, row) = match form.active {
            BorrowField::Friend => ("Friend: ".len(), 0),
            BorrowField::Date => ("Date borrowed: ".len(), 1),
        };
        let column = prefix + form.value_len(form.active);
        frame.set_cursor_position(cursor_position(inner, column, row));
    }

    fn draw_rating_form(&self, frame: &mut Frame, area: Rect, form: &RatingForm) {
        let inner = self.draw_form_popup(
            frame,
            area,
            "Photogenic Search".to_string(),
            vec![form.build_line()],
            form.error.as_ref(),
            (50, 30),
        );
        let column = "Minimum rating: ".len() + form.input.chars().count();
        frame.set_cursor_position(cursor_position(inner, column, 0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::db::{fetch_borrow_history, open_in_memory_store};
    use crate::models::NewCookbook;

    fn app_with_books(titles: &[&str]) -> App {
        let conn = open_in_memory_store().unwrap();
        for title in titles {
            let book = NewCookbook::new(*title, "Author")
                .aesthetic_rating(5)
                .instagram_worthy(true);
            add_cookbook(&conn, &book).unwrap();
        }
        App::load(conn).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn rendered(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn status_text(app: &App) -> Option<&str> {
        app.status.as_ref().map(|status| status.text.as_str())
    }

    #[test]
    fn quit_keys_exit_from_the_shelf() {
        let mut app = app_with_books(&[]);
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
        assert!(app.handle_key(KeyCode::Esc).unwrap());
    }

    #[test]
    fn adding_a_cookbook_through_the_form() {
        let mut app = app_with_books(&[]);

        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "Foraged & Found");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "R. Thistle");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.cookbooks.len(), 1);
        assert_eq!(app.cookbooks[0].title, "Foraged & Found");
        assert_eq!(
            status_text(&app),
            Some("Successfully curated cookbook with id: 1")
        );
    }

    #[test]
    fn invalid_cookbook_form_stays_open_with_error() {
        let mut app = app_with_books(&[]);

        app.handle_key(KeyCode::Char('+')).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.mode {
            Mode::AddingCookbook(form) => {
                assert_eq!(form.error.as_deref(), Some("Title is required."))
            }
            _ => panic!("form should remain open"),
        }
        assert!(app.cookbooks.is_empty());
    }

    #[test]
    fn tagging_the_selected_cookbook() {
        let mut app = app_with_books(&["One", "Two"]);
        app.handle_key(KeyCode::Down).unwrap();

        app.handle_key(KeyCode::Char('t')).unwrap();
        type_text(&mut app, "Plant-Based, artisanal, ,PLANT-BASED");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        let second = app.cookbooks[1].id;
        assert_eq!(app.tags_for(second), ["artisanal", "plant-based"]);
        assert!(app.tags_for(app.cookbooks[0].id).is_empty());
        assert_eq!(
            status_text(&app),
            Some("Cookbook 2: 2 tag(s) linked, 1 already present, 2 new tag(s) created.")
        );
    }

    #[test]
    fn lending_from_history_refreshes_the_list() {
        let mut app = app_with_books(&["One"]);

        app.handle_key(KeyCode::Char('h')).unwrap();
        app.handle_key(KeyCode::Char('b')).unwrap();
        type_text(&mut app, "Ava");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "2024-03-01");
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.screen {
            Screen::History(history) => assert_eq!(history.records.len(), 1),
            _ => panic!("should stay on the history screen"),
        }
        assert_eq!(
            status_text(&app),
            Some("Cookbook ID 1 borrowed by Ava on 2024-03-01.")
        );
        let records = fetch_borrow_history(&app.conn, 1).unwrap();
        assert_eq!(records[0].date_returned, None);
    }

    #[test]
    fn photogenic_search_and_jump_back_to_shelf() {
        let mut app = app_with_books(&["One", "Two"]);

        app.handle_key(KeyCode::Char('a')).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();
        match &app.screen {
            Screen::Photogenic(results) => {
                assert_eq!(results.minimum_rating, DEFAULT_MINIMUM_RATING);
                assert_eq!(results.cookbooks.len(), 2);
            }
            _ => panic!("expected photogenic results"),
        }

        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.screen, Screen::Shelf));
        assert_eq!(app.selected, 1);
    }

    #[test]
    fn empty_shelf_actions_report_errors() {
        let mut app = app_with_books(&[]);

        app.handle_key(KeyCode::Char('t')).unwrap();
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status_text(&app), Some("No cookbook selected to tag."));
        assert_eq!(app.status.as_ref().map(|s| s.kind), Some(StatusKind::Error));
    }

    #[test]
    fn shelf_renders_details_of_selected_book() {
        let app = app_with_books(&["Foraged & Found"]);
        let screen = rendered(&app);

        assert!(screen.contains("Cookbooks (1)"));
        assert!(screen.contains("Foraged & Found"));
        assert!(screen.contains("No tags yet"));
    }

    #[test]
    fn failed_tag_keeps_earlier_tags_visible() {
        let mut app = app_with_books(&["One"]);
        app.conn
            .execute_batch(
                "CREATE TRIGGER refuse_bad BEFORE INSERT ON tags WHEN NEW.name = 'bad'
                 BEGIN SELECT RAISE(ABORT, 'boom'); END;",
            )
            .unwrap();

        app.handle_key(KeyCode::Char('t')).unwrap();
        type_text(&mut app, "first, bad, third");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::AddingTags(_)));
        assert_eq!(app.tags_for(app.cookbooks[0].id), ["first"]);
        assert_eq!(app.status.as_ref().map(|s| s.kind), Some(StatusKind::Error));
    }

    #[test]
    fn huge_rating_renders_without_panicking() {
        let conn = open_in_memory_store().unwrap();
        let book = NewCookbook::new("Big", "Rater").aesthetic_rating(i64::MAX);
        add_cookbook(&conn, &book).unwrap();
        let app = App::load(conn).unwrap();

        let screen = rendered(&app);
        assert!(screen.contains("Cookbooks (1)"));
        assert!(screen.contains("Big"));
    }

    #[test]
    fn long_form_input_keeps_cursor_inside_popup() {
        let mut app = app_with_books(&["One"]);
        app.handle_key(KeyCode::Char('t')).unwrap();
        type_text(&mut app, &"x".repeat(70_000));

        assert!(rendered(&app).contains("Tag One"));
    }

    #[test]
    fn empty_shelf_renders_hint() {
        let app = app_with_books(&[]);
        assert!(rendered(&app).contains("Your shelf is empty"));
    }
}
