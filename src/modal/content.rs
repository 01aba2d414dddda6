//! Renderable modal content
//!
//! The registry treats content as opaque: it only asks it to draw itself into
//! the frame it computed and offers it the keys and clicks that reach the
//! topmost entry.

use crate::tui::{styles::Theme, Frame};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

/// Request a content surface hands back to its host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalAction {
    /// Close the entry that produced the action
    Close,
    ChainNext,
    ChainPrevious,
    ChainClose,
    /// Application-defined action, dispatched by the host
    Custom(String),
}

/// Anything that can be drawn inside a modal frame
pub trait ModalContent: Send + Sync {
    /// Draw into the inner area of the frame (border excluded)
    fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Rows the content would like, border excluded
    fn preferred_height(&self) -> u16 {
        6
    }

    fn handle_key(&self, key: KeyEvent) -> Option<ModalAction> {
        let _ = key;
        None
    }

    /// Click inside the content frame; coordinates are absolute
    fn handle_click(&self, column: u16, row: u16, area: Rect) -> Option<ModalAction> {
        let _ = (column, row, area);
        None
    }
}

/// A key that triggers an action, shown as a hint under the body text
#[derive(Debug, Clone)]
pub struct KeyHint {
    pub key: KeyCode,
    pub label: String,
    pub action: ModalAction,
}

/// Plain text body with a row of key hints
#[derive(Debug, Clone, Default)]
pub struct TextContent {
    lines: Vec<String>,
    hints: Vec<KeyHint>,
}

impl TextContent {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            lines: body.into().lines().map(str::to_string).collect(),
            hints: Vec::new(),
        }
    }

    pub fn with_hint(mut self, key: KeyCode, label: impl Into<String>, action: ModalAction) -> Self {
        self.hints.push(KeyHint {
            key,
            label: label.into(),
            action,
        });
        self
    }

    pub fn hints(&self) -> &[KeyHint] {
        &self.hints
    }

    fn hint_line(&self, theme: &Theme) -> Line<'static> {
        let mut spans = Vec::new();
        for (index, hint) in self.hints.iter().enumerate() {
            if index > 0 {
                spans.push(Span::styled("  ", theme.text_style()));
            }
            spans.push(Span::styled(
                format!("[{}]", key_label(hint.key)),
                theme.focused_border_style(),
            ));
            spans.push(Span::styled(format!(" {}", hint.label), theme.text_style()));
        }
        Line::from(spans)
    }
}

impl ModalContent for TextContent {
    fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);

        let body: Vec<Line> = self.lines.iter().map(|l| Line::from(l.clone())).collect();
        frame.render_widget(
            Paragraph::new(body)
                .style(theme.text_style())
                .wrap(Wrap { trim: false }),
            chunks[0],
        );

        if !self.hints.is_empty() {
            frame.render_widget(
                Paragraph::new(self.hint_line(theme)).style(theme.text_style().add_modifier(Modifier::BOLD)),
                chunks[1],
            );
        }
    }

    fn preferred_height(&self) -> u16 {
        let hint_rows = if self.hints.is_empty() { 0 } else { 2 };
        (self.lines.len() as u16).saturating_add(hint_rows).max(1)
    }

    fn handle_key(&self, key: KeyEvent) -> Option<ModalAction> {
        if !(key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT) {
            return None;
        }
        self.hints
            .iter()
            .find(|hint| hint.key == key.code)
            .map(|hint| hint.action.clone())
    }
}

fn key_label(key: KeyCode) -> String {
    match key {
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Char(c) => c.to_string(),
        other => format!("{:?}", other),
    }
}
