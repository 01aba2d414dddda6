use super::{DemoDialog, Page, PageAction, PageId};
use crate::router::Location;
use crate::tui::{styles::Theme, Frame};
use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Home/Welcome page
pub struct HomePage {
    id: PageId,
    title: String,
}

impl HomePage {
    pub fn new() -> Self {
        Self {
            id: "/".to_string(),
            title: "Home".to_string(),
        }
    }
}

#[async_trait]
impl Page for HomePage {
    fn id(&self) -> &PageId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    async fn handle_key_event(&mut self, event: KeyEvent) -> Result<Option<PageAction>> {
        if !event.modifiers.is_empty() {
            return Ok(None);
        }

        let action = match event.code {
            KeyCode::Char('m') => Some(PageAction::OpenDialog(DemoDialog::Info)),
            KeyCode::Char('l') => Some(PageAction::OpenDialog(DemoDialog::ScrollLocked)),
            KeyCode::Char('s') => Some(PageAction::OpenDialog(DemoDialog::Stack)),
            KeyCode::Char('p') => Some(PageAction::OpenDialog(DemoDialog::Pinned)),
            KeyCode::Char('o') => Some(PageAction::StartOnboarding),
            KeyCode::Enter => Some(PageAction::Navigate(Location::new("/settings/profile"))),
            _ => None,
        };
        Ok(action)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let mut lines = vec![
            Line::styled("Modal playground", theme.title_style()),
            Line::from(""),
        ];
        for (key, description) in self.help_text() {
            lines.push(Line::from(format!("  {:<6} {}", key, description)));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Welcome"))
            .style(theme.text_style())
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, area);
    }

    fn help_text(&self) -> Vec<(&str, &str)> {
        vec![
            ("m", "Open a dialog"),
            ("l", "Open a dialog that locks page scrolling"),
            ("s", "Stack three dialogs (Esc closes the top one)"),
            ("p", "Open a pinned dialog (no Esc, no backdrop click)"),
            ("o", "Start the onboarding chain"),
            ("Enter", "Edit your profile"),
        ]
    }
}

impl Default for HomePage {
    fn default() -> Self {
        Self::new()
    }
}
