use super::{Page, PageAction, PageId};
use crate::tui::{styles::Theme, Frame};
use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::KeyEvent;
use ratatui::{
    layout::Rect,
    text::Line,
    widgets::{Block, Borders, Paragraph},
};

/// Read-only page of text lines that scrolls vertically
pub struct InfoPage {
    id: PageId,
    title: String,
    lines: Vec<String>,
    scroll: u16,
}

impl InfoPage {
    pub fn new(id: &str, title: &str, lines: Vec<String>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            lines,
            scroll: 0,
        }
    }

    /// Billing summary under the guarded settings subtree
    pub fn billing() -> Self {
        Self::new(
            "/settings/billing",
            "Billing",
            vec![
                "Plan: Team".to_string(),
                "Seats: 12".to_string(),
                "Next invoice: 1st of the month".to_string(),
            ],
        )
    }

    /// Long report used to show the scroll lock in action
    pub fn reports() -> Self {
        let lines = (1..=120)
            .map(|n| format!("{:>3}  weekly report row {}", n, n))
            .collect();
        Self::new("/reports", "Reports", lines)
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }
}

#[async_trait]
impl Page for InfoPage {
    fn id(&self) -> &PageId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    async fn handle_key_event(&mut self, _event: KeyEvent) -> Result<Option<PageAction>> {
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let lines: Vec<Line> = self.lines.iter().map(|l| Line::from(l.as_str())).collect();
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.border_style())
                    .title(format!("{} ({}/{})", self.title, self.scroll + 1, self.lines.len().max(1))),
            )
            .style(theme.text_style())
            .scroll((self.scroll, 0));

        frame.render_widget(paragraph, area);
    }

    fn scroll_by(&mut self, delta: i32) {
        let max = self.lines.len().saturating_sub(1) as i32;
        self.scroll = (self.scroll as i32 + delta).clamp(0, max) as u16;
    }

    async fn on_enter(&mut self) -> Result<()> {
        self.scroll = 0;
        Ok(())
    }

    fn help_text(&self) -> Vec<(&str, &str)> {
        vec![("↑/↓", "Scroll"), ("PgUp/PgDn", "Scroll faster")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_is_clamped() {
        let mut page = InfoPage::new("/x", "X", vec!["a".into(), "b".into(), "c".into()]);
        page.scroll_by(-5);
        assert_eq!(page.scroll(), 0);
        page.scroll_by(10);
        assert_eq!(page.scroll(), 2);
        page.scroll_by(-1);
        assert_eq!(page.scroll(), 1);
    }
}
