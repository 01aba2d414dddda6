//! Multi-step modal chains
//!
//! A chain shows an ordered list of steps through the registry, one at a
//! time. Moving forward or back fully closes the current step before the next
//! one opens, so two steps of a chain never render together.
//!
//! Each opened step gets a wrapped `on_close`. If the step is dismissed
//! directly (Escape, backdrop, `close_all`) the chain resets itself. The
//! wrapper carries the generation it was opened under. Every
//! start/next/previous/close bumps the generation, so callbacks fired by the
//! chain's own transitions are recognised as stale and ignored.

use super::{
    content::ModalContent,
    registry::ModalRegistry,
    types::{EntryKey, ModalId, ModalOptions},
};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, trace};

/// One step of a chain
#[derive(Clone)]
pub struct ChainStep {
    pub id: ModalId,
    pub content: Arc<dyn ModalContent>,
    pub options: ModalOptions,
}

impl ChainStep {
    pub fn new(id: impl Into<ModalId>, content: Arc<dyn ModalContent>) -> Self {
        Self {
            id: id.into(),
            content,
            options: ModalOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ModalOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for ChainStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainStep")
            .field("id", &self.id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct ChainState {
    steps: Vec<ChainStep>,
    /// `None` while idle
    current: Option<usize>,
    /// Registry entry of the visible step
    entry: Option<EntryKey>,
    generation: u64,
}

impl ChainState {
    fn reset(&mut self) {
        self.steps.clear();
        self.current = None;
        self.entry = None;
        self.generation += 1;
    }
}

/// Drives one chain at a time through a borrowed registry
#[derive(Default)]
pub struct ChainController {
    state: Arc<Mutex<ChainState>>,
}

impl ChainController {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a chain at its first step
    ///
    /// An empty list does nothing. A chain that is already running is closed
    /// first.
    pub fn start(&mut self, registry: &mut ModalRegistry, steps: Vec<ChainStep>) {
        if steps.is_empty() {
            debug!("ignoring empty chain");
            return;
        }

        if self.is_active() {
            debug!("replacing active chain");
            self.close(registry);
        }

        let (first, generation) = {
            let mut state = self.lock();
            state.generation += 1;
            state.current = Some(0);
            state.entry = None;
            let first = steps[0].clone();
            state.steps = steps;
            (first, state.generation)
        };

        debug!(length = self.chain_length(), "chain started");
        self.open_step(registry, first, generation);
    }

    /// Advance one step; does nothing on the last step or while idle
    pub fn next(&mut self, registry: &mut ModalRegistry) {
        self.step_by(registry, true);
    }

    /// Go back one step; does nothing on the first step or while idle
    pub fn previous(&mut self, registry: &mut ModalRegistry) {
        self.step_by(registry, false);
    }

    fn step_by(&mut self, registry: &mut ModalRegistry, forward: bool) {
        let (outgoing, step, generation) = {
            let mut state = self.lock();
            let Some(index) = state.current else {
                trace!("chain idle, nothing to move");
                return;
            };

            let target = if forward {
                index + 1
            } else if index > 0 {
                index - 1
            } else {
                trace!("already at the first step");
                return;
            };
            if target >= state.steps.len() {
                trace!("already at the last step");
                return;
            }

            state.generation += 1;
            state.current = Some(target);
            let step = state.steps[target].clone();
            (state.entry.take(), step, state.generation)
        };

        debug!(step = %step.id, forward, "chain moved");

        // Lock released: the outgoing step's callback sees a newer generation
        if let Some(key) = outgoing {
            registry.close_entry(key);
        }
        self.open_step(registry, step, generation);
    }

    /// Close the visible step and return to idle
    pub fn close(&mut self, registry: &mut ModalRegistry) {
        let outgoing = {
            let mut state = self.lock();
            if state.current.is_none() {
                return;
            }
            let key = state.entry.take();
            state.reset();
            key
        };

        debug!("chain closed");
        if let Some(key) = outgoing {
            registry.close_entry(key);
        }
    }

    fn open_step(&self, registry: &mut ModalRegistry, step: ChainStep, generation: u64) {
        let options = guard_on_close(Arc::downgrade(&self.state), step.options, generation);
        let key = registry.open(step.id, step.content, options);

        let mut state = self.lock();
        if state.generation == generation {
            state.entry = Some(key);
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().current.is_some()
    }

    /// Index of the visible step, `None` while idle
    pub fn current_index(&self) -> Option<usize> {
        self.lock().current
    }

    pub fn current_step(&self) -> Option<ChainStep> {
        let state = self.lock();
        state.current.and_then(|index| state.steps.get(index).cloned())
    }

    /// Registry entry owned by the chain, if a step is visible
    pub fn current_entry(&self) -> Option<EntryKey> {
        self.lock().entry
    }

    pub fn is_first(&self) -> bool {
        self.lock().current == Some(0)
    }

    pub fn is_last(&self) -> bool {
        let state = self.lock();
        state.current.is_some() && state.current == state.steps.len().checked_sub(1)
    }

    pub fn chain_length(&self) -> usize {
        self.lock().steps.len()
    }
}

/// Wrap a step's `on_close` so a direct dismissal resets the chain
fn guard_on_close(state: Weak<Mutex<ChainState>>, mut options: ModalOptions, generation: u64) -> ModalOptions {
    let inner = options.on_close.take();

    options.on_close = Some(Arc::new(move || {
        if let Some(state) = state.upgrade() {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.generation == generation {
                debug!("chain step dismissed, resetting chain");
                state.reset();
            } else {
                trace!(generation, current = state.generation, "stale chain close callback ignored");
            }
        }

        if let Some(callback) = &inner {
            callback();
        }
    }));

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::content::TextContent;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn steps(count: usize) -> Vec<ChainStep> {
        (0..count)
            .map(|i| ChainStep::new(format!("step-{}", i), Arc::new(TextContent::new(format!("Step {}", i)))))
            .collect()
    }

    fn visible(registry: &ModalRegistry) -> Vec<&str> {
        registry.modals().iter().map(|entry| entry.id().as_str()).collect()
    }

    #[test]
    fn test_start_opens_first_step() {
        let mut registry = ModalRegistry::default();
        let mut chain = ChainController::new();

        chain.start(&mut registry, steps(3));
        assert_eq!(chain.current_index(), Some(0));
        assert!(chain.is_first());
        assert!(!chain.is_last());
        assert_eq!(chain.chain_length(), 3);
        assert_eq!(visible(&registry), vec!["step-0"]);
        assert_eq!(chain.current_step().map(|s| s.id), Some(ModalId::from("step-0")));
    }

    #[test]
    fn test_empty_chain_is_noop() {
        let mut registry = ModalRegistry::default();
        let mut chain = ChainController::new();

        chain.start(&mut registry, Vec::new());
        assert_eq!(chain.current_index(), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_next_reaches_last_and_stops() {
        let mut registry = ModalRegistry::default();
        let mut chain = ChainController::new();
        let length = 4;

        chain.start(&mut registry, steps(length));
        for _ in 0..length - 1 {
            chain.next(&mut registry);
        }
        assert!(chain.is_last());
        assert_eq!(chain.current_index(), Some(length - 1));

        chain.next(&mut registry);
        assert!(chain.is_last());
        assert_eq!(chain.current_index(), Some(length - 1));
        assert_eq!(visible(&registry), vec!["step-3"]);
    }

    #[test]
    fn test_single_step_chain_is_first_and_last() {
        let mut registry = ModalRegistry::default();
        let mut chain = ChainController::new();

        chain.start(&mut registry, steps(1));
        assert!(chain.is_first());
        assert!(chain.is_last());
        chain.next(&mut registry);
        assert_eq!(chain.current_index(), Some(0));
    }

    #[test]
    fn test_previous_at_first_is_noop() {
        let mut registry = ModalRegistry::default();
        let mut chain = ChainController::new();

        chain.start(&mut registry, steps(3));
        let key = chain.current_entry();
        chain.previous(&mut registry);
        assert_eq!(chain.current_index(), Some(0));
        assert_eq!(chain.current_entry(), key);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_only_one_step_visible() {
        let mut registry = ModalRegistry::default();
        let mut chain = ChainController::new();

        chain.start(&mut registry, steps(3));
        chain.next(&mut registry);
        assert_eq!(visible(&registry), vec!["step-1"]);
        chain.next(&mut registry);
        assert_eq!(visible(&registry), vec!["step-2"]);
        chain.previous(&mut registry);
        assert_eq!(visible(&registry), vec!["step-1"]);
        assert_eq!(chain.current_index(), Some(1));
    }

    #[test]
    fn test_close_chain_resets() {
        let mut registry = ModalRegistry::default();
        let mut chain = ChainController::new();

        chain.start(&mut registry, steps(3));
        chain.next(&mut registry);
        chain.close(&mut registry);

        assert_eq!(chain.current_index(), None);
        assert_eq!(chain.chain_length(), 0);
        assert!(!chain.is_first());
        assert!(!chain.is_last());
        assert!(registry.is_empty());

        // Closing an idle chain is harmless
        chain.close(&mut registry);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_direct_dismissal_resets_chain() {
        let mut registry = ModalRegistry::default();
        let mut chain = ChainController::new();

        chain.start(&mut registry, steps(3));
        chain.next(&mut registry);
        registry.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));

        assert_eq!(chain.current_index(), None);
        assert_eq!(chain.chain_length(), 0);
    }

    #[test]
    fn test_close_all_resets_chain() {
        let mut registry = ModalRegistry::default();
        let mut chain = ChainController::new();

        chain.start(&mut registry, steps(2));
        registry.close_all();
        assert!(!chain.is_active());
    }

    #[test]
    fn test_stale_callbacks_do_not_reset() {
        let mut registry = ModalRegistry::default();
        let mut chain = ChainController::new();

        // Fast forward/back: every transition closes a step whose callback
        // fires with an outdated generation.
        chain.start(&mut registry, steps(3));
        chain.next(&mut registry);
        chain.previous(&mut registry);
        chain.next(&mut registry);
        chain.next(&mut registry);
        chain.previous(&mut registry);

        assert_eq!(chain.current_index(), Some(1));
        assert_eq!(chain.chain_length(), 3);
        assert_eq!(visible(&registry), vec!["step-1"]);
    }

    #[test]
    fn test_step_callbacks_still_run() {
        let mut registry = ModalRegistry::default();
        let mut chain = ChainController::new();
        let closed = Arc::new(AtomicUsize::new(0));

        let counted: Vec<ChainStep> = steps(2)
            .into_iter()
            .map(|step| {
                let closed = closed.clone();
                step.with_options(ModalOptions::new().on_close(move || {
                    closed.fetch_add(1, Ordering::SeqCst);
                }))
            })
            .collect();

        chain.start(&mut registry, counted);
        chain.next(&mut registry);
        chain.close(&mut registry);
        assert_eq!(closed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_chain_ignores_unrelated_duplicate_id() {
        let mut registry = ModalRegistry::default();
        let mut chain = ChainController::new();

        registry.open("step-0", Arc::new(TextContent::new("unrelated")), ModalOptions::default());
        chain.start(&mut registry, steps(2));
        chain.next(&mut registry);

        assert_eq!(visible(&registry), vec!["step-0", "step-1"]);
        assert_eq!(chain.current_index(), Some(1));
    }

    #[test]
    fn test_restart_replaces_active_chain() {
        let mut registry = ModalRegistry::default();
        let mut chain = ChainController::new();

        chain.start(&mut registry, steps(3));
        chain.next(&mut registry);
        chain.start(&mut registry, steps(2));

        assert_eq!(chain.current_index(), Some(0));
        assert_eq!(chain.chain_length(), 2);
        assert_eq!(registry.len(), 1);
    }
}
