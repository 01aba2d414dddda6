use super::{Page, PageAction, PageId};
use crate::guard::{DirtyFlag, SaveHandler};
use crate::tui::{styles::Theme, Frame};
use anyhow::{bail, Result};
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

/// Editable profile fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub email: String,
}

impl Profile {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("name must not be empty");
        }
        if !self.email.contains('@') {
            bail!("'{}' is not an email address", self.email);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ProfileState {
    saved: Profile,
    draft: Profile,
}

/// Saved profile plus the draft being edited
///
/// Every edit recomputes the dirty flag from `draft != saved`, so typing a
/// change and then undoing it leaves the form clean again.
#[derive(Clone)]
pub struct ProfileStore {
    state: Arc<Mutex<ProfileState>>,
    dirty: DirtyFlag,
    save_delay: Duration,
}

impl ProfileStore {
    pub fn new(initial: Profile, dirty: DirtyFlag) -> Self {
        Self {
            state: Arc::new(Mutex::new(ProfileState {
                saved: initial.clone(),
                draft: initial,
            })),
            dirty,
            save_delay: Duration::from_millis(150),
        }
    }

    /// Simulated persistence latency
    pub fn with_save_delay(mut self, delay: Duration) -> Self {
        self.save_delay = delay;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ProfileState> {
        // A poisoned lock only means a panic elsewhere; the data is plain strings
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn draft(&self) -> Profile {
        self.lock().draft.clone()
    }

    pub fn saved(&self) -> Profile {
        self.lock().saved.clone()
    }

    pub fn dirty(&self) -> &DirtyFlag {
        &self.dirty
    }

    pub fn edit(&self, f: impl FnOnce(&mut Profile)) {
        let mut state = self.lock();
        f(&mut state.draft);
        self.dirty.set(state.draft != state.saved);
    }

    /// Throw the draft away
    pub fn revert(&self) {
        let mut state = self.lock();
        state.draft = state.saved.clone();
        self.dirty.set(false);
    }

    /// Validate and persist the draft
    pub fn commit(&self) -> Result<()> {
        let mut state = self.lock();
        state.draft.validate()?;
        state.saved = state.draft.clone();
        self.dirty.set(false);
        info!(name = %state.saved.name, "profile saved");
        Ok(())
    }
}

#[async_trait]
impl SaveHandler for ProfileStore {
    async fn save(&self) -> Result<()> {
        if !self.save_delay.is_zero() {
            tokio::time::sleep(self.save_delay).await;
        }
        self.commit()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Email,
}

impl Field {
    fn toggle(self) -> Self {
        match self {
            Field::Name => Field::Email,
            Field::Email => Field::Name,
        }
    }
}

/// Profile form at /settings/profile
pub struct SettingsPage {
    id: PageId,
    title: String,
    store: ProfileStore,
    focus: Field,
}

impl SettingsPage {
    pub fn new(store: ProfileStore) -> Self {
        Self {
            id: "/settings/profile".to_string(),
            title: "Profile".to_string(),
            store,
            focus: Field::Name,
        }
    }

    fn field_line(&self, label: &str, value: &str, field: Field, theme: &Theme) -> Line<'static> {
        let (marker, style) = if self.focus == field {
            ("> ", theme.focused_border_style())
        } else {
            ("  ", theme.text_style())
        };
        let value = if value.is_empty() {
            Span::styled("(empty)", theme.placeholder_style())
        } else {
            Span::styled(value.to_string(), theme.text_style())
        };
        Line::from(vec![
            Span::styled(format!("{}{:<7}", marker, label), style),
            value,
        ])
    }
}

#[async_trait]
impl Page for SettingsPage {
    fn id(&self) -> &PageId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    async fn handle_key_event(&mut self, event: KeyEvent) -> Result<Option<PageAction>> {
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return match event.code {
                KeyCode::Char('s') => match self.store.save().await {
                    Ok(()) => Ok(Some(PageAction::Status("Profile saved".to_string()))),
                    Err(e) => Ok(Some(PageAction::Status(format!("Save failed: {}", e)))),
                },
                KeyCode::Char('r') => {
                    self.store.revert();
                    Ok(Some(PageAction::Status("Changes reverted".to_string())))
                }
                _ => Ok(None),
            };
        }

        let focus = self.focus;
        match event.code {
            KeyCode::Tab | KeyCode::BackTab => self.focus = focus.toggle(),
            KeyCode::Char(c) => self.store.edit(|profile| match focus {
                Field::Name => profile.name.push(c),
                Field::Email => profile.email.push(c),
            }),
            KeyCode::Backspace => self.store.edit(|profile| {
                match focus {
                    Field::Name => profile.name.pop(),
                    Field::Email => profile.email.pop(),
                };
            }),
            _ => return Ok(None),
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let draft = self.store.draft();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(1)])
            .split(area);

        let form = vec![
            self.field_line("Name", &draft.name, Field::Name, theme),
            self.field_line("Email", &draft.email, Field::Email, theme),
        ];
        frame.render_widget(
            Paragraph::new(form).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.border_style())
                    .title("Profile"),
            ),
            chunks[0],
        );

        let status = if self.store.dirty().is_dirty() {
            Line::styled("Unsaved changes. Leaving settings will ask first.", theme.warning_style())
        } else {
            Line::styled("All changes saved.", theme.success_style())
        };
        frame.render_widget(Paragraph::new(vec![Line::from(""), status]), chunks[1]);
    }

    async fn on_exit(&mut self) -> Result<()> {
        // Leaving through the guard means the user already chose to discard
        if self.store.dirty().is_dirty() {
            debug!("dropping unsaved profile draft");
        }
        self.store.revert();
        Ok(())
    }

    fn help_text(&self) -> Vec<(&str, &str)> {
        vec![
            ("Tab", "Switch field"),
            ("Ctrl+S", "Save"),
            ("Ctrl+R", "Revert"),
        ]
    }
}
