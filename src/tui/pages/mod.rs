pub mod home;
pub mod info;
pub mod settings;

use crate::router::Location;
use crate::tui::{styles::Theme, Frame};
use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::layout::Rect;
use std::collections::HashMap;

/// Page identifier type (the route path the page is mounted at)
pub type PageId = String;

/// Demo dialogs a page can ask the application to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoDialog {
    /// Plain dismissible dialog
    Info,
    /// Dialog that locks page scrolling
    ScrollLocked,
    /// Three dialogs stacked on top of each other
    Stack,
    /// Dialog that ignores Escape and backdrop clicks
    Pinned,
}

/// Requests a page hands to the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    OpenDialog(DemoDialog),
    StartOnboarding,
    Navigate(Location),
    Status(String),
}

/// Base trait for all pages
#[async_trait]
pub trait Page: Send + Sync {
    /// Get the page ID
    fn id(&self) -> &PageId;

    /// Get the page title
    fn title(&self) -> &str;

    /// Handle keyboard input
    async fn handle_key_event(&mut self, event: KeyEvent) -> Result<Option<PageAction>>;

    /// Handle mouse input
    async fn handle_mouse_event(&mut self, _event: MouseEvent) -> Result<Option<PageAction>> {
        Ok(None)
    }

    /// Handle periodic updates
    async fn tick(&mut self) -> Result<()> {
        Ok(())
    }

    /// Render the page
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Scroll the page content by `delta` lines
    fn scroll_by(&mut self, _delta: i32) {}

    /// Called when the page becomes active
    async fn on_enter(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called when the page becomes inactive
    async fn on_exit(&mut self) -> Result<()> {
        Ok(())
    }

    /// Get page-specific help text
    fn help_text(&self) -> Vec<(&str, &str)> {
        vec![]
    }
}

/// Pages keyed by the route they are mounted at
#[derive(Default)]
pub struct PageSet {
    pages: HashMap<PageId, Box<dyn Page>>,
}

impl PageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page under its id
    pub fn register(&mut self, page: Box<dyn Page>) {
        let id = page.id().clone();
        self.pages.insert(id, page);
    }

    pub fn routes(&self) -> impl Iterator<Item = &PageId> {
        self.pages.keys()
    }

    pub fn get_mut(&mut self, location: &Location) -> Option<&mut (dyn Page + 'static)> {
        self.pages.get_mut(location.path()).map(|page| page.as_mut())
    }

    pub fn title_of(&self, location: &Location) -> Option<&str> {
        self.pages.get(location.path()).map(|page| page.title())
    }
}
