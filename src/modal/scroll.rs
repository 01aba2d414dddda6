//! Page scroll lock held by `prevent_scroll` entries

use serde::{Deserialize, Serialize};
use tracing::trace;

/// How overlapping `prevent_scroll` entries share the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollLockPolicy {
    /// One claim per open entry; the page unlocks when the last claim goes
    #[default]
    Counted,
    /// A single flag: any release unlocks the page, even with other
    /// `prevent_scroll` entries still open
    Latched,
}

#[derive(Debug, Default)]
pub struct ScrollLock {
    policy: ScrollLockPolicy,
    holders: usize,
    locked: bool,
}

impl ScrollLock {
    pub fn new(policy: ScrollLockPolicy) -> Self {
        Self {
            policy,
            holders: 0,
            locked: false,
        }
    }

    pub fn policy(&self) -> ScrollLockPolicy {
        self.policy
    }

    pub fn acquire(&mut self) {
        self.holders += 1;
        self.locked = true;
        trace!(holders = self.holders, "scroll lock acquired");
    }

    pub fn release(&mut self) {
        self.holders = self.holders.saturating_sub(1);
        self.locked = match self.policy {
            ScrollLockPolicy::Counted => self.holders > 0,
            ScrollLockPolicy::Latched => false,
        };
        trace!(holders = self.holders, locked = self.locked, "scroll lock released");
    }

    /// Drop every claim at once
    pub fn release_all(&mut self) {
        self.holders = 0;
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn holders(&self) -> usize {
        self.holders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counted_lock() {
        let mut lock = ScrollLock::new(ScrollLockPolicy::Counted);
        lock.acquire();
        lock.acquire();
        lock.release();
        assert!(lock.is_locked());
        lock.release();
        assert!(!lock.is_locked());

        // Extra releases never underflow
        lock.release();
        assert_eq!(lock.holders(), 0);
    }

    #[test]
    fn test_latched_lock() {
        let mut lock = ScrollLock::new(ScrollLockPolicy::Latched);
        lock.acquire();
        lock.acquire();
        lock.release();
        assert!(!lock.is_locked());
    }
}
