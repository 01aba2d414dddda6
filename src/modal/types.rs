//! Core modal types
//!
//! Identifiers and presentation options shared by the registry, the overlay
//! layer and the chain controller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Caller-chosen modal identifier
///
/// Ids are not required to be unique: opening the same id twice produces two
/// independent entries. Use [`EntryKey`] when an exact entry must be addressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModalId(pub String);

impl ModalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModalId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ModalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&ModalId> for ModalId {
    fn from(id: &ModalId) -> Self {
        id.clone()
    }
}

impl fmt::Display for ModalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique handle for a single registry entry, handed out by `open`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey(pub(crate) u64);

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Width classes for the content frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalSize {
    Xs,
    Sm,
    #[default]
    Md,
    Lg,
    Xl,
    /// Covers the whole overlay area
    Full,
}

impl ModalSize {
    /// Share of the available width, in percent
    pub fn width_percent(self) -> u16 {
        match self {
            Self::Xs => 30,
            Self::Sm => 40,
            Self::Md => 55,
            Self::Lg => 70,
            Self::Xl => 85,
            Self::Full => 100,
        }
    }
}

/// Where the content frame is anchored inside the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalPosition {
    #[default]
    Center,
    Top,
    Right,
    Bottom,
    Left,
}

/// Callback fired once when an entry leaves the registry, whatever the reason
pub type OnClose = Arc<dyn Fn() + Send + Sync>;

/// Presentation and dismissal options for a modal entry
#[derive(Clone)]
pub struct ModalOptions {
    /// Clicking the backdrop closes the entry
    pub close_on_click_outside: bool,
    /// Escape closes the entry while it is topmost
    pub close_on_esc: bool,
    /// Hold the page scroll lock while the entry is open
    pub prevent_scroll: bool,
    pub size: ModalSize,
    pub position: ModalPosition,
    pub on_close: Option<OnClose>,
    /// Free-form styling hook, e.g. `"danger"`
    pub class_name: Option<String>,
    /// Title drawn in the frame border
    pub title: Option<String>,
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self {
            close_on_click_outside: true,
            close_on_esc: true,
            prevent_scroll: false,
            size: ModalSize::default(),
            position: ModalPosition::default(),
            on_close: None,
            class_name: None,
            title: None,
        }
    }
}

impl ModalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_size(mut self, size: ModalSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_position(mut self, position: ModalPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn close_on_click_outside(mut self, enabled: bool) -> Self {
        self.close_on_click_outside = enabled;
        self
    }

    pub fn close_on_esc(mut self, enabled: bool) -> Self {
        self.close_on_esc = enabled;
        self
    }

    pub fn prevent_scroll(mut self, enabled: bool) -> Self {
        self.prevent_scroll = enabled;
        self
    }

    pub fn on_close(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(callback));
        self
    }

    /// Whether the styling hook asks for the danger accent
    pub fn is_danger(&self) -> bool {
        self.class_name
            .as_deref()
            .map(|class| class.split_whitespace().any(|c| c == "danger"))
            .unwrap_or(false)
    }
}

impl fmt::Debug for ModalOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalOptions")
            .field("close_on_click_outside", &self.close_on_click_outside)
            .field("close_on_esc", &self.close_on_esc)
            .field("prevent_scroll", &self.prevent_scroll)
            .field("size", &self.size)
            .field("position", &self.position)
            .field("on_close", &self.on_close.is_some())
            .field("class_name", &self.class_name)
            .field("title", &self.title)
            .finish()
    }
}
