use std::mem;
use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use crossterm::event::KeyCode;
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use tracing::error;

use crate::controller::{Controller, FormField};
use crate::error::AppError;
use crate::export::{ExportKind, HEADERS};

use super::forms::{ConfirmDelete, ExportPrompt, Focus, Notice};
use super::helpers::{centered_rect, cursor_column, stripe_style};

/// Footer space reserved for the status line and key hints.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the input row (one line of text plus borders).
const INPUT_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown in the table.
const PAGE_STEP: isize = 10;
const TABLE_WIDTHS: [Constraint; 6] = [
    Constraint::Length(6),
    Constraint::Min(20),
    Constraint::Length(5),
    Constraint::Length(12),
    Constraint::Length(8),
    Constraint::Length(20),
];

/// Fine-grained modes layered over the main screen.
enum Mode {
    Normal,
    ConfirmDelete(ConfirmDelete),
    ExportPath(ExportPrompt),
    Notice(Notice),
}

/// Terminal front-end state. All data handling goes through the controller;
/// this type only tracks focus and dialogs.
pub struct App {
    controller: Controller,
    export_dir: PathBuf,
    focus: Focus,
    mode: Mode,
}

impl App {
    pub fn new(controller: Controller, export_dir: PathBuf) -> Self {
        Self {
            controller,
            export_dir,
            focus: Focus::default(),
            mode: Mode::Normal,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Initial load of the table. Failures are shown as a notice rather than
    /// aborting startup.
    pub fn load(&mut self) {
        if let Err(err) = self.controller.refresh() {
            self.report(err);
        }
    }

    /// Close the underlying store.
    pub fn shutdown(&mut self) -> Result<()> {
        self.controller.shutdown()?;
        Ok(())
    }

    /// Route a plain key press to the active dialog or the focused widget.
    pub fn handle_key(&mut self, code: KeyCode) {
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::ExportPath(prompt) => self.handle_export_path(code, prompt),
            Mode::Notice(notice) => self.handle_notice(code, notice),
        };
    }

    /// Handle a Ctrl+key command. Returns `true` when the app should exit.
    /// Commands are only accepted while no dialog is open.
    pub fn handle_ctrl(&mut self, ch: char) -> bool {
        if !matches!(self.mode, Mode::Normal) {
            return false;
        }

        let outcome = match ch.to_ascii_lowercase() {
            'q' => return true,
            'a' => self.controller.add().map(|_| ()),
            'u' => self.controller.update_selected().map(|_| ()),
            'd' => self.request_delete(),
            'f' => self.controller.search(),
            'r' => self.controller.show_all(),
            'e' => {
                self.open_export(ExportKind::Csv);
                Ok(())
            }
            'p' => {
                self.open_export(ExportKind::Report);
                Ok(())
            }
            'l' => {
                self.controller.clear_inputs();
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(err) = outcome {
            self.report(err);
        }
        false
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> Mode {
        let outcome = match (self.focus, code) {
            (_, KeyCode::Tab) => {
                self.focus = self.focus.next();
                Ok(())
            }
            (_, KeyCode::BackTab) => {
                self.focus = self.focus.previous();
                Ok(())
            }
            (Focus::Field(field), code) => {
                self.handle_field_key(field, code);
                Ok(())
            }
            (Focus::Search, KeyCode::Enter) => self.controller.search(),
            (Focus::Search, KeyCode::Esc) => {
                self.focus = Focus::Table;
                Ok(())
            }
            (Focus::Search, KeyCode::Backspace) => {
                self.controller.search_text_mut().pop();
                Ok(())
            }
            (Focus::Search, KeyCode::Char(ch)) => {
                if !ch.is_control() {
                    self.controller.search_text_mut().push(ch);
                }
                Ok(())
            }
            (Focus::Table, code) => self.handle_table_key(code),
            _ => Ok(()),
        };

        if let Err(err) = outcome {
            self.report(err);
        }

        mem::replace(&mut self.mode, Mode::Normal)
    }

    fn handle_field_key(&mut self, field: FormField, code: KeyCode) {
        match code {
            KeyCode::Char(ch) => {
                self.controller.form_mut().push_char(field, ch);
            }
            KeyCode::Backspace => self.controller.form_mut().backspace(field),
            KeyCode::Enter => self.focus = self.focus.next(),
            KeyCode::Esc => self.focus = Focus::Table,
            _ => {}
        }
    }

    fn handle_table_key(&mut self, code: KeyCode) -> Result<(), AppError> {
        match code {
            KeyCode::Up => self.controller.select_offset(-1),
            KeyCode::Down => self.controller.select_offset(1),
            KeyCode::PageUp => self.controller.select_offset(-PAGE_STEP),
            KeyCode::PageDown => self.controller.select_offset(PAGE_STEP),
            KeyCode::Home => self.controller.select_first(),
            KeyCode::End => self.controller.select_last(),
            KeyCode::Enter => {
                let id = self.controller.require_selection("edit")?.id;
                self.controller.load_for_edit(id)?;
                self.focus = Focus::Field(FormField::Name);
            }
            KeyCode::Delete => self.request_delete()?,
            KeyCode::Esc => self.controller.select(None),
            _ => {}
        }
        Ok(())
    }

    fn request_delete(&mut self) -> Result<(), AppError> {
        let student = self.controller.require_selection("delete")?;
        self.mode = Mode::ConfirmDelete(ConfirmDelete {
            id: student.id,
            label: student.to_string(),
        });
        Ok(())
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.controller.set_status("Deletion cancelled.");
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.controller.delete_selected() {
                    Ok(_) => Mode::Normal,
                    Err(err) => self.notice_for(err),
                }
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn open_export(&mut self, kind: ExportKind) {
        let suggested = kind.suggested_path(&self.export_dir, Local::now());
        self.mode = Mode::ExportPath(ExportPrompt::new(kind, suggested));
    }

    fn handle_export_path(&mut self, code: KeyCode, mut prompt: ExportPrompt) -> Mode {
        match code {
            KeyCode::Esc => {
                self.controller.set_status("Export cancelled.");
                Mode::Normal
            }
            KeyCode::Enter => {
                let Some(path) = prompt.destination() else {
                    self.controller.set_status("Export cancelled.");
                    return Mode::Normal;
                };
                match self.controller.export(prompt.kind, &path) {
                    Ok(_) => Mode::Notice(Notice::exported(prompt.kind, path)),
                    Err(err) => self.notice_for(err),
                }
            }
            KeyCode::Backspace => {
                prompt.backspace();
                Mode::ExportPath(prompt)
            }
            KeyCode::Char(ch) => {
                prompt.push_char(ch);
                Mode::ExportPath(prompt)
            }
            _ => Mode::ExportPath(prompt),
        }
    }

    fn handle_notice(&mut self, code: KeyCode, notice: Notice) -> Mode {
        match code {
            KeyCode::Enter | KeyCode::Esc => Mode::Normal,
            KeyCode::Char('o') | KeyCode::Char('O') => match notice.open_path {
                Some(path) => {
                    if let Err(err) = open_path(&path) {
                        error!(path = %path.display(), error = %err, "failed to open exported file");
                        self.controller
                            .set_status(format!("Failed to open {}: {err}", path.display()));
                    }
                    Mode::Normal
                }
                None => Mode::Notice(notice),
            },
            _ => Mode::Notice(notice),
        }
    }

    fn report(&mut self, err: AppError) {
        self.mode = self.notice_for(err);
    }

    fn notice_for(&self, err: AppError) -> Mode {
        if !err.is_warning() {
            error!(error = %err, "command failed");
        }
        Mode::Notice(Notice::from_error(&err))
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(INPUT_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_inputs(frame, chunks[0]);
        self.draw_table(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Normal => {}
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::ExportPath(prompt) => self.draw_export_prompt(frame, area, prompt),
            Mode::Notice(notice) => self.draw_notice(frame, area, notice),
        }
    }

    fn draw_inputs(&self, frame: &mut Frame, area: Rect) {
        let boxes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(10),
                Constraint::Percentage(15),
                Constraint::Percentage(12),
                Constraint::Percentage(33),
            ])
            .split(area);

        let form = self.controller.form();
        for (field, rect) in FormField::ALL.into_iter().zip(boxes.iter()) {
            self.draw_input_box(
                frame,
                *rect,
                field.label(),
                form.value(field),
                Focus::Field(field),
            );
        }
        self.draw_input_box(
            frame,
            boxes[4],
            "Search",
            self.controller.search_text(),
            Focus::Search,
        );
    }

    fn draw_input_box(&self, frame: &mut Frame, area: Rect, title: &str, value: &str, focus: Focus) {
        let focused = self.focus == focus;
        let border_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title.to_string());
        let inner = block.inner(area);
        frame.render_widget(Paragraph::new(value.to_string()).block(block), area);

        if focused && matches!(self.mode, Mode::Normal) && inner.width > 0 {
            let len = value.chars().count();
            frame.set_cursor_position((cursor_column(inner.x, inner.width, len), inner.y));
        }
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let header_style = Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD);
        let header = Row::new(HEADERS.iter().map(|caption| Cell::from(*caption))).style(header_style);

        let rows = self.controller.rows().iter().enumerate().map(|(index, student)| {
            Row::new(vec![
                Cell::from(student.id.to_string()),
                Cell::from(student.name.clone()),
                Cell::from(student.age.to_string()),
                Cell::from(student.class_name.clone()),
                Cell::from(student.score_display()),
                Cell::from(student.date_added_display().to_string()),
            ])
            .style(stripe_style(index))
        });

        let title = match self.controller.active_filter() {
            Some(filter) => format!(
                "Students ({} matching '{filter}')",
                self.controller.rows().len()
            ),
            None => format!("Students ({})", self.controller.rows().len()),
        };
        let border_style = if self.focus == Focus::Table {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        let table = Table::new(rows, TABLE_WIDTHS)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(title),
            )
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let mut state = TableState::default().with_selected(self.controller.selected_index());
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = Line::from(vec![Span::styled(
            self.controller.status().to_string(),
            Style::default().fg(Color::Green),
        )]);
        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&str, &str)] = match (&self.mode, self.focus) {
            (Mode::ConfirmDelete(_), _) => &[("[Y]", " Delete   "), ("[N/Esc]", " Cancel")],
            (Mode::ExportPath(_), _) => &[("[Enter]", " Export   "), ("[Esc]", " Cancel")],
            (Mode::Notice(notice), _) if notice.open_path.is_some() => {
                &[("[Enter]", " Close   "), ("[O]", " Open file")]
            }
            (Mode::Notice(_), _) => &[("[Enter]", " Close")],
            (Mode::Normal, Focus::Table) => &[
                ("[↑↓]", " Select   "),
                ("[Enter]", " Edit   "),
                ("[Del]", " Delete   "),
                ("[Tab]", " Inputs   "),
                ("[^A]", " Add  "),
                ("[^U]", " Update  "),
                ("[^F]", " Search  "),
                ("[^R]", " All  "),
                ("[^E]", " CSV  "),
                ("[^P]", " PDF  "),
                ("[^Q]", " Quit"),
            ],
            (Mode::Normal, _) => &[
                ("[Tab]", " Next field   "),
                ("[^A]", " Add  "),
                ("[^U]", " Update  "),
                ("[^D]", " Delete  "),
                ("[^F]", " Search  "),
                ("[^R]", " All  "),
                ("[^E]", " CSV  "),
                ("[^P]", " PDF  "),
                ("[^L]", " Clear  "),
                ("[^Q]", " Quit"),
            ],
        };

        let spans: Vec<Span<'static>> = hints
            .iter()
            .flat_map(|(key, text)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(text.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Delete")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Delete student ID {} ({})?",
                confirm.id, confirm.label
            )),
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

    fn draw_export_prompt(&self, frame: &mut Frame, area: Rect, prompt: &ExportPrompt) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!("Export {}", prompt.kind.label()))
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from("Save to:"),
            Line::from(Span::styled(
                prompt.path.clone(),
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to export • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        frame.render_widget(Paragraph::new(lines), inner);

        if inner.height > 1 && inner.width > 0 {
            let len = prompt.path.chars().count();
            frame.set_cursor_position((cursor_column(inner.x, inner.width, len), inner.y + 1));
        }
    }

    fn draw_notice(&self, frame: &mut Frame, area: Rect, notice: &Notice) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(Span::styled(notice.title.clone(), notice.kind.style()))
            .borders(Borders::ALL)
            .border_style(notice.kind.style());
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = notice
            .message
            .lines()
            .map(|line| Line::from(line.to_string()))
            .collect();
        lines.push(Line::from(""));
        let hint = if notice.open_path.is_some() {
            "Enter to close • O to open the file"
        } else {
            "Press Enter to close."
        };
        lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::Gray))));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }

    #[cfg(test)]
    fn notice(&self) -> Option<&Notice> {
        match &self.mode {
            Mode::Notice(notice) => Some(notice),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tempfile::TempDir;

    use super::*;
    use crate::db::StudentStore;
    use crate::ui::forms::NoticeKind;

    fn app(export_dir: PathBuf) -> App {
        let controller = Controller::new(StudentStore::open_in_memory().unwrap());
        let mut app = App::new(controller, export_dir);
        app.load();
        app
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch));
        }
    }

    fn add_student(app: &mut App, name: &str, age: &str, class_name: &str, score: &str) {
        app.focus = Focus::Field(FormField::Name);
        for value in [name, age, class_name, score] {
            type_text(app, value);
            app.handle_key(KeyCode::Tab);
        }
        app.handle_ctrl('a');
    }

    #[test]
    fn typing_and_ctrl_a_adds_a_student() {
        let mut app = app(PathBuf::from("."));
        add_student(&mut app, "Ada", "20", "CS1", "95.5");

        assert_eq!(app.controller().rows().len(), 1);
        assert_eq!(app.controller().status(), "Added student 'Ada'");
        assert!(app.notice().is_none());
    }

    #[test]
    fn validation_failure_opens_warning() {
        let mut app = app(PathBuf::from("."));
        add_student(&mut app, "Ada", "old", "CS1", "95.5");

        let notice = app.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Warning);
        assert_eq!(notice.title, "Input Error");

        app.handle_key(KeyCode::Enter);
        assert!(app.notice().is_none());
    }

    #[test]
    fn delete_asks_for_confirmation() {
        let mut app = app(PathBuf::from("."));
        add_student(&mut app, "Ada", "20", "CS1", "95.5");
        app.focus = Focus::Table;
        app.handle_key(KeyCode::Down);

        app.handle_key(KeyCode::Delete);
        assert!(matches!(app.mode, Mode::ConfirmDelete(_)));
        app.handle_key(KeyCode::Char('n'));
        assert_eq!(app.controller().rows().len(), 1);

        app.handle_ctrl('d');
        app.handle_key(KeyCode::Char('y'));
        assert!(app.controller().rows().is_empty());
    }

    #[test]
    fn delete_without_selection_warns() {
        let mut app = app(PathBuf::from("."));
        add_student(&mut app, "Ada", "20", "CS1", "95.5");

        app.handle_ctrl('d');

        assert_eq!(app.notice().unwrap().title, "Selection Error");
    }

    #[test]
    fn enter_on_table_loads_row_for_editing() {
        let mut app = app(PathBuf::from("."));
        add_student(&mut app, "Ada", "20", "CS1", "95.5");
        app.focus = Focus::Table;
        app.handle_key(KeyCode::Down);

        app.handle_key(KeyCode::Enter);

        assert_eq!(app.controller().form().name, "Ada");
        assert_eq!(app.focus, Focus::Field(FormField::Name));
    }

    #[test]
    fn export_prompt_writes_suggested_file() {
        let dir = TempDir::new().unwrap();
        let mut app = app(dir.path().to_path_buf());
        add_student(&mut app, "Ada", "20", "CS1", "95.5");

        app.handle_ctrl('e');
        let path = match &app.mode {
            Mode::ExportPath(prompt) => prompt.destination().unwrap(),
            _ => panic!("expected export prompt"),
        };
        app.handle_key(KeyCode::Enter);

        assert!(path.exists());
        let notice = app.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Info);
        assert_eq!(notice.open_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn ctrl_q_exits_only_from_main_screen() {
        let mut app = app(PathBuf::from("."));
        assert!(app.handle_ctrl('q'));

        app.handle_ctrl('p');
        assert!(!app.handle_ctrl('q'));
    }

    #[test]
    fn draws_rows_and_status() {
        let mut app = app(PathBuf::from("."));
        add_student(&mut app, "Ada", "20", "CS1", "88");
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();

        terminal.draw(|frame| app.draw(frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content.iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Ada"));
        assert!(text.contains("Date Added"));
        assert!(text.contains("88.00"));
        assert!(text.contains("Added student 'Ada'"));
    }
}
