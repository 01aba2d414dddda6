use crate::router::Location;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key binding configuration
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub description: String,
}

impl KeyBinding {
    pub fn new(key: KeyCode, modifiers: KeyModifiers, description: &str) -> Self {
        Self {
            key,
            modifiers,
            description: description.to_string(),
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.key == event.code && self.modifiers == event.modifiers
    }

    pub fn label(&self) -> String {
        let key = match self.key {
            KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::PageUp => "PgUp".to_string(),
            KeyCode::PageDown => "PgDn".to_string(),
            KeyCode::F(n) => format!("F{}", n),
            other => format!("{:?}", other),
        };
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", key)
        } else {
            key
        }
    }
}

/// Application key mappings
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Quit application
    pub quit: KeyBinding,

    /// Show help
    pub help: KeyBinding,

    /// Go back in route history
    pub back: KeyBinding,

    /// Direct route shortcuts
    pub routes: Vec<(KeyBinding, Location)>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            quit: KeyBinding::new(KeyCode::Char('c'), KeyModifiers::CONTROL, "Quit application"),
            help: KeyBinding::new(KeyCode::Char('g'), KeyModifiers::CONTROL, "Show/hide help"),
            back: KeyBinding::new(KeyCode::Char('b'), KeyModifiers::CONTROL, "Go back"),
            routes: vec![
                (KeyBinding::new(KeyCode::F(1), KeyModifiers::NONE, "Home"), Location::root()),
                (
                    KeyBinding::new(KeyCode::F(2), KeyModifiers::NONE, "Profile settings"),
                    Location::new("/settings/profile"),
                ),
                (
                    KeyBinding::new(KeyCode::F(3), KeyModifiers::NONE, "Billing settings"),
                    Location::new("/settings/billing"),
                ),
                (KeyBinding::new(KeyCode::F(4), KeyModifiers::NONE, "Reports"), Location::new("/reports")),
            ],
        }
    }
}

impl KeyMap {
    /// Check if the event should quit the application
    pub fn should_quit(&self, event: &KeyEvent) -> bool {
        self.quit.matches(event)
    }

    /// Check if the event should show help
    pub fn should_show_help(&self, event: &KeyEvent) -> bool {
        self.help.matches(event)
    }

    pub fn should_go_back(&self, event: &KeyEvent) -> bool {
        self.back.matches(event)
    }

    /// Route bound to the event, if any
    pub fn route_for(&self, event: &KeyEvent) -> Option<&Location> {
        self.routes
            .iter()
            .find(|(binding, _)| binding.matches(event))
            .map(|(_, location)| location)
    }

    /// Scroll delta for page scrolling keys
    pub fn scroll_delta(&self, event: &KeyEvent) -> Option<i32> {
        if !event.modifiers.is_empty() {
            return None;
        }
        match event.code {
            KeyCode::Up => Some(-1),
            KeyCode::Down => Some(1),
            KeyCode::PageUp => Some(-10),
            KeyCode::PageDown => Some(10),
            _ => None,
        }
    }

    /// Get help text for all key bindings
    pub fn help_text(&self) -> String {
        let mut lines = vec![
            format!("{:<8} {}", self.quit.label(), self.quit.description),
            format!("{:<8} {}", self.help.label(), self.help.description),
            format!("{:<8} {}", self.back.label(), self.back.description),
        ];
        for (binding, location) in &self.routes {
            lines.push(format!("{:<8} {} ({})", binding.label(), binding.description, location));
        }
        lines.push(format!("{:<8} {}", "↑/↓", "Scroll page (unless a modal locks scrolling)"));
        lines.push(format!("{:<8} {}", "Esc", "Close the topmost modal"));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_shortcuts() {
        let keys = KeyMap::default();
        let event = KeyEvent::new(KeyCode::F(3), KeyModifiers::NONE);
        assert_eq!(keys.route_for(&event), Some(&Location::new("/settings/billing")));
        assert_eq!(keys.route_for(&KeyEvent::new(KeyCode::F(9), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_quit_and_scroll() {
        let keys = KeyMap::default();
        assert!(keys.should_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!keys.should_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert_eq!(keys.scroll_delta(&KeyEvent::new(KeyCode::PageDown, KeyModifiers::NONE)), Some(10));
        assert_eq!(keys.scroll_delta(&KeyEvent::new(KeyCode::Down, KeyModifiers::SHIFT)), None);
    }

    #[test]
    fn test_help_lists_routes() {
        let help = KeyMap::default().help_text();
        assert!(help.contains("Ctrl+C"));
        assert!(help.contains("/settings/profile"));
    }
}
