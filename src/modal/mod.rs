//! Modal system for transient overlay surfaces
//!
//! This module provides the modal registry that stacks overlay entries above
//! the page, the chain controller that walks users through multi-step modal
//! flows, and the supporting layout, scroll-lock and exit-transition pieces.

pub mod chain;
pub mod content;
pub mod exit;
pub mod layer;
pub mod registry;
pub mod scroll;
pub mod types;

pub use chain::{ChainController, ChainStep};
pub use content::{KeyHint, ModalAction, ModalContent, TextContent};
pub use exit::ExitSignal;
pub use layer::{ModalLayer, ModalLayout};
pub use registry::{Dispatch, ModalEntry, ModalRegistry};
pub use scroll::{ScrollLock, ScrollLockPolicy};
pub use types::*;
