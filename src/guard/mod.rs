//! Unsaved-changes navigation guard
//!
//! The guard installs a predicate on the router. While the screen's dirty
//! flag is set, a transition that changes path (or leaves the guarded
//! subtree) is held. The guard remembers the destination and asks its host
//! to show a confirmation. The host resolves it in one of three ways:
//!
//! - discard: release the held transition, then navigate once the
//!   confirmation has finished its exit transition
//! - save: run the save handler first and only leave if it succeeds
//! - cancel: drop the held transition and stay

pub mod predicate;

pub use predicate::{leaves_subtree, should_block};

use crate::modal::ExitSignal;
use crate::router::{BlockerState, Location, Navigator, RouteBlocker, RoutePredicate};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Caller-owned "unsaved changes" flag, shared with the guard
#[derive(Debug, Clone, Default)]
pub struct DirtyFlag(Arc<AtomicBool>);

impl DirtyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, dirty: bool) {
        self.0.store(dirty, Ordering::SeqCst);
    }

    pub fn is_dirty(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Persists the screen's pending changes
#[async_trait]
pub trait SaveHandler: Send + Sync {
    async fn save(&self) -> anyhow::Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("Saving before leaving for {location} failed: {source}")]
    SaveFailed {
        location: Location,
        #[source]
        source: anyhow::Error,
    },
}

pub struct GuardOptions {
    pub dirty: DirtyFlag,
    pub on_save: Arc<dyn SaveHandler>,
    /// Subtree the guarded screen lives in
    pub base_path: String,
}

/// What the host needs to drive its confirmation UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardView {
    pub show_modal: bool,
    pub pending_location: Option<Location>,
}

/// Navigation issued once the confirmation surface is gone
#[derive(Debug)]
pub struct DeferredNavigation {
    location: Location,
    exit: ExitSignal,
}

impl DeferredNavigation {
    pub fn new(location: Location, exit: ExitSignal) -> Self {
        Self { location, exit }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Wait for the exit transition, then navigate
    pub async fn run<N: Navigator>(self, navigator: N) {
        self.exit.wait().await;
        debug!(to = %self.location, "deferred navigation");
        navigator.navigate(&self.location);
    }
}

#[derive(Debug)]
pub enum SaveOutcome {
    /// Saved; the transition was released
    Saved(DeferredNavigation),
    /// The handler failed; the transition is still held
    Failed(GuardError),
    /// Nothing was blocked
    NothingPending,
}

pub struct NavigationGuard {
    dirty: DirtyFlag,
    on_save: Arc<dyn SaveHandler>,
    base_path: String,
    pending_location: Option<Location>,
    show_modal: bool,
}

impl NavigationGuard {
    pub fn new(options: GuardOptions) -> Self {
        Self {
            dirty: options.dirty,
            on_save: options.on_save,
            base_path: options.base_path,
            pending_location: None,
            show_modal: false,
        }
    }

    /// Predicate for the router, reading the dirty flag at call time
    pub fn predicate(&self) -> RoutePredicate {
        let dirty = self.dirty.clone();
        let base_path = self.base_path.clone();
        Box::new(move |current, next| should_block(current, next, dirty.is_dirty(), &base_path))
    }

    pub fn should_block(&self, current: &Location, next: &Location) -> bool {
        should_block(current, next, self.dirty.is_dirty(), &self.base_path)
    }

    /// Record a transition the router just held and ask for confirmation
    pub fn on_blocked(&mut self, blocker: &dyn RouteBlocker) {
        if blocker.state() != BlockerState::Blocked {
            return;
        }
        if let Some(location) = blocker.location() {
            info!(to = %location, "unsaved changes, confirmation required");
            self.pending_location = Some(location.clone());
            self.show_modal = true;
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.pending_location.is_some()
    }

    pub fn pending_location(&self) -> Option<&Location> {
        self.pending_location.as_ref()
    }

    pub fn show_modal(&self) -> bool {
        self.show_modal
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn dirty(&self) -> &DirtyFlag {
        &self.dirty
    }

    pub fn view(&self) -> GuardView {
        GuardView {
            show_modal: self.show_modal,
            pending_location: self.pending_location.clone(),
        }
    }

    /// Leave without saving
    pub fn discard(&mut self, blocker: &mut dyn RouteBlocker, exit: ExitSignal) -> Option<DeferredNavigation> {
        let location = self.pending_location.take();
        self.show_modal = false;
        blocker.proceed();

        if let Some(location) = &location {
            info!(to = %location, "changes discarded");
        }
        location.map(|location| DeferredNavigation::new(location, exit))
    }

    /// Save, then leave
    ///
    /// A failing handler leaves everything as it was: the transition stays
    /// held, the destination is kept and the confirmation stays up, so the
    /// host can report the error and let the user retry or cancel. `exit` is
    /// only asked for a signal once the save has succeeded.
    pub async fn save(
        &mut self,
        blocker: &mut (dyn RouteBlocker + Send),
        exit: impl FnOnce() -> ExitSignal + Send,
    ) -> SaveOutcome {
        let Some(location) = self.pending_location.clone() else {
            return SaveOutcome::NothingPending;
        };

        let handler = Arc::clone(&self.on_save);
        match handler.save().await {
            Ok(()) => {
                info!(to = %location, "changes saved, leaving");
                self.pending_location = None;
                self.show_modal = false;
                blocker.proceed();
                SaveOutcome::Saved(DeferredNavigation::new(location, exit()))
            }
            Err(source) => {
                warn!(to = %location, error = %source, "save failed, staying");
                SaveOutcome::Failed(GuardError::SaveFailed { location, source })
            }
        }
    }

    /// Stay on the current screen
    pub fn cancel(&mut self, blocker: &mut dyn RouteBlocker) {
        blocker.reset();
        if let Some(location) = self.pending_location.take() {
            debug!(abandoned = %location, "navigation cancelled");
        }
        self.show_modal = false;
    }
}
