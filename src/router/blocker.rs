//! Seams between the navigation guard and whatever performs routing

use super::Location;

/// Whether a transition is currently held back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockerState {
    Unblocked,
    Blocked,
}

/// A routing primitive that can hold one transition pending a decision
pub trait RouteBlocker {
    fn state(&self) -> BlockerState;

    /// Destination of the held transition
    fn location(&self) -> Option<&Location>;

    /// Release the held transition and let it complete
    fn proceed(&mut self);

    /// Drop the held transition and stay put
    fn reset(&mut self);
}

/// Programmatic route changes
pub trait Navigator {
    fn navigate(&self, to: &Location);
}

impl<N: Navigator + ?Sized> Navigator for &N {
    fn navigate(&self, to: &Location) {
        (**self).navigate(to)
    }
}
