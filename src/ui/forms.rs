use std::path::PathBuf;

use ratatui::style::{Color, Style};

use crate::controller::FormField;
use crate::error::AppError;
use crate::export::ExportKind;

/// Which widget receives typed characters.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum Focus {
    Field(FormField),
    Search,
    Table,
}

impl Default for Focus {
    fn default() -> Self {
        Focus::Field(FormField::Name)
    }
}

impl Focus {
    const ORDER: [Focus; 6] = [
        Focus::Field(FormField::Name),
        Focus::Field(FormField::Age),
        Focus::Field(FormField::Class),
        Focus::Field(FormField::Score),
        Focus::Search,
        Focus::Table,
    ];

    fn position(self) -> usize {
        Self::ORDER
            .iter()
            .position(|focus| *focus == self)
            .unwrap_or(0)
    }

    /// Cycle forward (Tab).
    pub(crate) fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    /// Cycle backward (Shift+Tab).
    pub(crate) fn previous(self) -> Self {
        let len = Self::ORDER.len();
        Self::ORDER[(self.position() + len - 1) % len]
    }
}

/// Delete confirmation for the selected student.
pub(crate) struct ConfirmDelete {
    pub(crate) id: i64,
    /// `Name (Class)` shown in the dialog.
    pub(crate) label: String,
}

/// Destination prompt shown before an export. Pre-filled with a suggested
/// path that the user may edit.
pub(crate) struct ExportPrompt {
    pub(crate) kind: ExportKind,
    pub(crate) path: String,
}

impl ExportPrompt {
    pub(crate) fn new(kind: ExportKind, suggested: PathBuf) -> Self {
        Self {
            kind,
            path: suggested.display().to_string(),
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) {
        if !ch.is_control() {
            self.path.push(ch);
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.path.pop();
    }

    /// Trimmed destination, or `None` if the user blanked it out.
    pub(crate) fn destination(&self) -> Option<PathBuf> {
        let trimmed = self.path.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum NoticeKind {
    Info,
    Warning,
    Error,
}

impl NoticeKind {
    pub(crate) fn style(self) -> Style {
        match self {
            NoticeKind::Info => Style::default().fg(Color::Green),
            NoticeKind::Warning => Style::default().fg(Color::Yellow),
            NoticeKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Modal message that blocks input until dismissed.
pub(crate) struct Notice {
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) kind: NoticeKind,
    /// A freshly exported file the user can open from the dialog.
    pub(crate) open_path: Option<PathBuf>,
}

impl Notice {
    pub(crate) fn exported(kind: ExportKind, path: PathBuf) -> Self {
        Self {
            title: format!("Export {}", kind.label()),
            message: format!("{} exported to:\n{}", kind.label(), path.display()),
            kind: NoticeKind::Info,
            open_path: Some(path),
        }
    }

    pub(crate) fn from_error(err: &AppError) -> Self {
        Self {
            title: err.title().to_string(),
            message: err.to_string(),
            kind: if err.is_warning() {
                NoticeKind::Warning
            } else {
                NoticeKind::Error
            },
            open_path: None,
        }
    }
}
