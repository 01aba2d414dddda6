//! Dialogs the dashboard opens through the modal registry

use crate::config::ModalConfig;
use crate::modal::{ChainStep, ModalAction, ModalId, ModalOptions, ModalPosition, ModalSize, TextContent};
use crate::router::Location;
use crossterm::event::KeyCode;
use std::sync::Arc;

pub const CONFIRM_LEAVE_ID: &str = "unsaved-changes";

pub const ACTION_DISCARD: &str = "discard";
pub const ACTION_SAVE: &str = "save";
pub const ACTION_CANCEL: &str = "cancel";

/// One dialog ready to be opened
pub struct Dialog {
    pub id: ModalId,
    pub content: Arc<TextContent>,
    pub options: ModalOptions,
}

impl Dialog {
    fn new(id: &str, content: TextContent, options: ModalOptions) -> Self {
        Self {
            id: ModalId::new(id),
            content: Arc::new(content),
            options,
        }
    }
}

/// Asks whether to leave the settings screen with unsaved changes
pub fn confirm_leave(destination: &Location) -> Dialog {
    let body = format!(
        "You have unsaved changes.\nLeave for {} anyway?",
        destination
    );
    let content = TextContent::new(body)
        .with_hint(KeyCode::Char('s'), "Save and leave", ModalAction::Custom(ACTION_SAVE.to_string()))
        .with_hint(KeyCode::Char('d'), "Discard", ModalAction::Custom(ACTION_DISCARD.to_string()))
        .with_hint(KeyCode::Char('c'), "Stay", ModalAction::Custom(ACTION_CANCEL.to_string()));

    let options = ModalOptions::new()
        .with_title("Unsaved changes")
        .with_size(ModalSize::Sm)
        .with_class_name("danger")
        .close_on_click_outside(false);

    Dialog::new(CONFIRM_LEAVE_ID, content, options)
}

/// Plain dialog using the configured default size and position
pub fn info(defaults: &ModalConfig) -> Dialog {
    let content = TextContent::new(
        "Modals stack above the page.\nClick outside or press Esc to close this one.",
    )
    .with_hint(KeyCode::Enter, "Close", ModalAction::Close);

    let options = ModalOptions::new()
        .with_title("About modals")
        .with_size(defaults.default_size)
        .with_position(defaults.default_position);

    Dialog::new("info", content, options)
}

pub fn scroll_locked() -> Dialog {
    let content = TextContent::new(
        "The page behind cannot scroll while this is open.\nTry the arrow keys or the mouse wheel.",
    )
    .with_hint(KeyCode::Enter, "Close", ModalAction::Close);

    let options = ModalOptions::new()
        .with_title("Scroll locked")
        .with_position(ModalPosition::Bottom)
        .with_size(ModalSize::Lg)
        .prevent_scroll(true);

    Dialog::new("scroll-locked", content, options)
}

pub fn pinned() -> Dialog {
    let content = TextContent::new("Esc and backdrop clicks are ignored here.")
        .with_hint(KeyCode::Enter, "Close", ModalAction::Close);

    let options = ModalOptions::new()
        .with_title("Pinned")
        .with_size(ModalSize::Xs)
        .close_on_esc(false)
        .close_on_click_outside(false);

    Dialog::new("pinned", content, options)
}

/// Three overlapping dialogs; the first one locks scrolling
pub fn stack() -> Vec<Dialog> {
    let layers = [
        ("stack-a", ModalPosition::Left, ModalSize::Md, true),
        ("stack-b", ModalPosition::Right, ModalSize::Sm, false),
        ("stack-c", ModalPosition::Center, ModalSize::Xs, false),
    ];

    layers
        .into_iter()
        .enumerate()
        .map(|(depth, (id, position, size, prevent_scroll))| {
            let content = TextContent::new(format!("Layer {} of 3", depth + 1))
                .with_hint(KeyCode::Enter, "Close", ModalAction::Close);
            let options = ModalOptions::new()
                .with_title(id)
                .with_position(position)
                .with_size(size)
                .prevent_scroll(prevent_scroll);
            Dialog::new(id, content, options)
        })
        .collect()
}

/// Steps of the onboarding chain
pub fn onboarding() -> Vec<ChainStep> {
    let pages = [
        ("onboarding-welcome", "Welcome", "This tour has three steps."),
        ("onboarding-stack", "Stacking", "Modals stack; Esc only ever closes the top one."),
        ("onboarding-guard", "Unsaved work", "Edit your profile, then try to leave settings."),
    ];
    let last = pages.len() - 1;

    pages
        .into_iter()
        .enumerate()
        .map(|(index, (id, title, body))| {
            let mut content = TextContent::new(body);
            if index > 0 {
                content = content.with_hint(KeyCode::Char('b'), "Back", ModalAction::ChainPrevious);
            }
            content = if index == last {
                content.with_hint(KeyCode::Enter, "Finish", ModalAction::ChainClose)
            } else {
                content.with_hint(KeyCode::Enter, "Next", ModalAction::ChainNext)
            };

            let options = ModalOptions::new()
                .with_title(format!("{} ({}/{})", title, index + 1, pages.len()))
                .with_size(ModalSize::Md);
            ChainStep::new(id, Arc::new(content)).with_options(options)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::ModalContent;
    use crossterm::event::{KeyEvent, KeyModifiers};

    #[test]
    fn test_confirm_leave_actions() {
        let dialog = confirm_leave(&Location::new("/reports"));
        assert!(dialog.options.is_danger());
        assert!(!dialog.options.close_on_click_outside);

        let save = dialog
            .content
            .handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE));
        assert_eq!(save, Some(ModalAction::Custom(ACTION_SAVE.to_string())));
    }

    #[test]
    fn test_onboarding_navigation_hints() {
        let steps = onboarding();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].id, ModalId::new("onboarding-welcome"));

        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(steps[0].content.handle_key(enter), Some(ModalAction::ChainNext));
        assert_eq!(steps[2].content.handle_key(enter), Some(ModalAction::ChainClose));

        let back = KeyEvent::new(KeyCode::Char('b'), KeyModifiers::NONE);
        assert_eq!(steps[0].content.handle_key(back), None);
        assert_eq!(steps[1].content.handle_key(back), Some(ModalAction::ChainPrevious));
    }

    #[test]
    fn test_stack_locks_once() {
        let dialogs = stack();
        assert_eq!(dialogs.iter().filter(|d| d.options.prevent_scroll).count(), 1);
    }
}
