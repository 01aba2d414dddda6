//! In-app routing
//!
//! Routes are plain paths (`/settings/profile`). The router tracks the
//! current location and a bounded back history, and runs an optional
//! predicate before every transition. When the predicate objects, the
//! transition is held (one at a time) until it is released with `proceed` or
//! dropped with `reset`.

pub mod blocker;

pub use blocker::{BlockerState, Navigator, RouteBlocker};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

/// A normalized route path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    path: String,
}

impl Location {
    /// Normalize to a leading `/` and no trailing `/` (except the root)
    pub fn new(path: impl AsRef<str>) -> Self {
        let trimmed = path.as_ref().trim().trim_matches('/');
        Self {
            path: format!("/{}", trimmed),
        }
    }

    pub fn root() -> Self {
        Self::new("/")
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// True if this path is `base` or sits below it
    pub fn is_within(&self, base: &str) -> bool {
        let base = Location::new(base);
        if base.path == "/" {
            return true;
        }
        self.path == base.path
            || self
                .path
                .strip_prefix(base.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl From<&str> for Location {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Predicate consulted before each transition: `(current, next) -> block?`
pub type RoutePredicate = Box<dyn Fn(&Location, &Location) -> bool + Send + Sync>;

/// Result of a navigation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Committed,
    /// Already there
    Unchanged,
    /// Held by the predicate, or by an earlier transition still pending
    Blocked,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransitionKind {
    Push,
    Back,
}

pub struct Router {
    routes: BTreeSet<String>,
    current: Location,
    history: Vec<Location>,
    max_history: usize,
    predicate: Option<RoutePredicate>,
    held: Option<(Location, TransitionKind)>,
}

impl Router {
    pub fn new(start: Location) -> Self {
        let mut routes = BTreeSet::new();
        routes.insert(start.path().to_string());
        Self {
            routes,
            current: start,
            history: Vec::new(),
            max_history: 10,
            predicate: None,
            held: None,
        }
    }

    pub fn register(&mut self, route: impl AsRef<str>) {
        self.routes.insert(Location::new(route).path().to_string());
    }

    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(String::as_str)
    }

    pub fn set_predicate(&mut self, predicate: RoutePredicate) {
        self.predicate = Some(predicate);
    }

    pub fn clear_predicate(&mut self) {
        self.predicate = None;
    }

    pub fn current(&self) -> &Location {
        &self.current
    }

    pub fn history(&self) -> &[Location] {
        &self.history
    }

    /// Navigate to a registered route
    pub fn navigate(&mut self, to: Location) -> NavigationOutcome {
        self.attempt(to, TransitionKind::Push)
    }

    /// Return to the previous location, subject to the same predicate
    pub fn back(&mut self) -> NavigationOutcome {
        match self.history.last().cloned() {
            Some(previous) => self.attempt(previous, TransitionKind::Back),
            None => NavigationOutcome::Unchanged,
        }
    }

    fn attempt(&mut self, to: Location, kind: TransitionKind) -> NavigationOutcome {
        if !self.routes.contains(to.path()) {
            warn!(path = %to, "navigation to unknown route");
            return NavigationOutcome::NotFound;
        }

        if let Some((held, _)) = &self.held {
            debug!(held = %held, attempted = %to, "transition already pending");
            return NavigationOutcome::Blocked;
        }

        if to == self.current {
            return NavigationOutcome::Unchanged;
        }

        if let Some(predicate) = &self.predicate {
            if predicate(&self.current, &to) {
                info!(from = %self.current, to = %to, "navigation blocked");
                self.held = Some((to, kind));
                return NavigationOutcome::Blocked;
            }
        }

        self.commit(to, kind);
        NavigationOutcome::Committed
    }

    fn commit(&mut self, to: Location, kind: TransitionKind) {
        debug!(from = %self.current, to = %to, "navigation committed");
        let previous = std::mem::replace(&mut self.current, to);
        match kind {
            TransitionKind::Push => {
                self.history.push(previous);
                if self.history.len() > self.max_history {
                    self.history.remove(0);
                }
            }
            TransitionKind::Back => {
                self.history.pop();
            }
        }
    }
}

impl RouteBlocker for Router {
    fn state(&self) -> BlockerState {
        if self.held.is_some() {
            BlockerState::Blocked
        } else {
            BlockerState::Unblocked
        }
    }

    fn location(&self) -> Option<&Location> {
        self.held.as_ref().map(|(location, _)| location)
    }

    fn proceed(&mut self) {
        if let Some((to, kind)) = self.held.take() {
            self.commit(to, kind);
        }
    }

    fn reset(&mut self) {
        if let Some((to, _)) = self.held.take() {
            debug!(dropped = %to, "held transition reset");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        let mut router = Router::new(Location::root());
        router.register("/settings/profile");
        router.register("/settings/billing");
        router.register("/reports");
        router
    }

    #[test]
    fn test_location_normalization() {
        assert_eq!(Location::new("settings/profile/").path(), "/settings/profile");
        assert_eq!(Location::new("").path(), "/");
        assert_eq!(Location::new("/").path(), "/");
    }

    #[test]
    fn test_is_within() {
        let billing = Location::new("/settings/billing");
        assert!(billing.is_within("/settings"));
        assert!(billing.is_within("/settings/"));
        assert!(billing.is_within("/"));
        assert!(Location::new("/settings").is_within("/settings"));
        assert!(!Location::new("/settingsx").is_within("/settings"));
        assert!(!Location::new("/reports").is_within("/settings"));
    }

    #[test]
    fn test_navigate_and_back() {
        let mut router = router();
        assert_eq!(router.navigate("/reports".into()), NavigationOutcome::Committed);
        assert_eq!(router.navigate("/reports".into()), NavigationOutcome::Unchanged);
        assert_eq!(router.navigate("/missing".into()), NavigationOutcome::NotFound);

        assert_eq!(router.back(), NavigationOutcome::Committed);
        assert_eq!(router.current(), &Location::root());
        assert!(router.history().is_empty());
        assert_eq!(router.back(), NavigationOutcome::Unchanged);
    }

    #[test]
    fn test_predicate_holds_transition() {
        let mut router = router();
        router.set_predicate(Box::new(|_, next| next.path() == "/reports"));

        assert_eq!(router.navigate("/reports".into()), NavigationOutcome::Blocked);
        assert_eq!(router.state(), BlockerState::Blocked);
        assert_eq!(router.location(), Some(&Location::new("/reports")));
        assert_eq!(router.current(), &Location::root());

        // One pending transition at a time
        assert_eq!(router.navigate("/settings/profile".into()), NavigationOutcome::Blocked);
        assert_eq!(router.location(), Some(&Location::new("/reports")));

        router.proceed();
        assert_eq!(router.state(), BlockerState::Unblocked);
        assert_eq!(router.current(), &Location::new("/reports"));
    }

    #[test]
    fn test_reset_drops_transition() {
        let mut router = router();
        router.set_predicate(Box::new(|_, _| true));

        router.navigate("/settings/billing".into());
        router.reset();
        assert_eq!(router.state(), BlockerState::Unblocked);
        assert_eq!(router.current(), &Location::root());

        router.clear_predicate();
        assert_eq!(router.navigate("/settings/billing".into()), NavigationOutcome::Committed);
    }

    #[test]
    fn test_held_back_navigation_pops_history() {
        let mut router = router();
        router.navigate("/reports".into());
        router.set_predicate(Box::new(|_, _| true));

        assert_eq!(router.back(), NavigationOutcome::Blocked);
        router.proceed();
        assert_eq!(router.current(), &Location::root());
        assert!(router.history().is_empty());
    }
}
