//! Stacked modals, multi-step modal chains and an unsaved-changes navigation
//! guard for ratatui applications.

pub mod cli;
pub mod config;
pub mod guard;
pub mod logging;
pub mod modal;
pub mod router;
pub mod tui;
