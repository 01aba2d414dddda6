//! Modal registry for open overlay entries
//!
//! The registry is responsible for:
//! - Keeping the open entries in insertion order (last = topmost)
//! - Holding the page scroll lock on behalf of `prevent_scroll` entries
//! - Giving keys and clicks to the topmost entry before the page sees them
//! - Rendering the overlay layer after everything else in the frame
//!
//! It is a plain value owned by the application root and lent out by `&mut`
//! to whoever needs to open or close entries.

use super::{
    content::{ModalAction, ModalContent},
    exit::{ExitNotifier, ExitSignal},
    layer::{ModalLayer, ModalLayout},
    scroll::{ScrollLock, ScrollLockPolicy},
    types::{EntryKey, ModalId, ModalOptions},
};
use crate::config::ModalConfig;
use crate::tui::{styles::Theme, Frame};
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear},
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// One open overlay surface
pub struct ModalEntry {
    key: EntryKey,
    id: ModalId,
    content: Arc<dyn ModalContent>,
    options: ModalOptions,
    exit_waiters: Vec<ExitNotifier>,
}

impl ModalEntry {
    pub fn key(&self) -> EntryKey {
        self.key
    }

    pub fn id(&self) -> &ModalId {
        &self.id
    }

    pub fn content(&self) -> &Arc<dyn ModalContent> {
        &self.content
    }

    pub fn options(&self) -> &ModalOptions {
        &self.options
    }

    fn layout(&self, area: Rect) -> ModalLayout {
        ModalLayout::calculate(&self.options, area, self.content.preferred_height())
    }

    fn finish_exit(&mut self) {
        for waiter in self.exit_waiters.drain(..) {
            waiter.notify();
        }
    }
}

impl fmt::Debug for ModalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalEntry")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A closed entry still fading out
struct LeavingEntry {
    entry: ModalEntry,
    remaining_ticks: u32,
}

/// Outcome of offering an input event to the overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing is open; the event belongs to the page
    Ignored,
    /// The overlay swallowed the event
    Consumed,
    /// The event closed the topmost entry
    Closed(ModalId),
    /// The topmost content asked its host to act
    Action(ModalAction),
}

pub struct ModalRegistry {
    /// Open entries, last = topmost
    entries: Vec<ModalEntry>,

    /// Closed entries still running their exit transition
    leaving: Vec<LeavingEntry>,

    scroll_lock: ScrollLock,

    /// Ticks a closed entry keeps drawing before its exit completes
    exit_ticks: u32,

    next_key: u64,

    /// Overlay area from the last render, used for hit testing
    area: Rect,
}

impl ModalRegistry {
    pub fn new(policy: ScrollLockPolicy, exit_ticks: u32) -> Self {
        Self {
            entries: Vec::new(),
            leaving: Vec::new(),
            scroll_lock: ScrollLock::new(policy),
            exit_ticks,
            next_key: 0,
            area: Rect::default(),
        }
    }

    pub fn from_config(config: &ModalConfig) -> Self {
        Self::new(config.scroll_lock, config.exit_transition_ticks)
    }

    /// Open a new entry on top of the others
    ///
    /// Opening an id that is already present adds a second, independent entry.
    pub fn open(
        &mut self,
        id: impl Into<ModalId>,
        content: Arc<dyn ModalContent>,
        options: ModalOptions,
    ) -> EntryKey {
        let id = id.into();
        self.next_key += 1;
        let key = EntryKey(self.next_key);

        if self.contains(&id) {
            debug!(%id, "modal id already open, stacking a duplicate entry");
        }

        if options.prevent_scroll {
            self.scroll_lock.acquire();
        }

        debug!(%id, %key, depth = self.entries.len() + 1, "modal opened");

        self.entries.push(ModalEntry {
            key,
            id,
            content,
            options,
            exit_waiters: Vec::new(),
        });

        key
    }

    /// Close the first (oldest) entry with the given id
    ///
    /// Returns false, and changes nothing, when the id is not open.
    pub fn close(&mut self, id: &ModalId) -> bool {
        match self.entries.iter().position(|entry| &entry.id == id) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => {
                trace!(%id, "close ignored, modal not open");
                false
            }
        }
    }

    /// Close exactly the entry behind `key`
    pub fn close_entry(&mut self, key: EntryKey) -> bool {
        match self.entries.iter().position(|entry| entry.key == key) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => {
                trace!(%key, "close ignored, entry not open");
                false
            }
        }
    }

    pub fn close_topmost(&mut self) -> Option<ModalId> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.remove_at(self.entries.len() - 1))
    }

    /// Close every entry, oldest first, and drop the scroll lock
    pub fn close_all(&mut self) {
        let entries = std::mem::take(&mut self.entries);
        if !entries.is_empty() {
            debug!(count = entries.len(), "closing all modals");
        }

        for entry in entries {
            self.retire(entry);
        }

        self.scroll_lock.release_all();
    }

    fn remove_at(&mut self, index: usize) -> ModalId {
        let entry = self.entries.remove(index);
        if entry.options.prevent_scroll {
            self.scroll_lock.release();
        }

        let id = entry.id.clone();
        self.retire(entry);
        id
    }

    /// Start the exit transition and fire `on_close`
    fn retire(&mut self, mut entry: ModalEntry) {
        debug!(id = %entry.id, key = %entry.key, "modal closed");
        let on_close = entry.options.on_close.clone();

        if self.exit_ticks == 0 {
            entry.finish_exit();
        } else {
            self.leaving.push(LeavingEntry {
                entry,
                remaining_ticks: self.exit_ticks,
            });
        }

        if let Some(callback) = on_close {
            callback();
        }
    }

    /// Subscribe to the end of an entry's exit transition
    ///
    /// Works for open entries (the signal fires after they close and fade) and
    /// for entries already fading. Unknown keys get a completed signal.
    pub fn exit_signal(&mut self, key: EntryKey) -> ExitSignal {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.key == key)
            .or_else(|| {
                self.leaving
                    .iter_mut()
                    .map(|leaving| &mut leaving.entry)
                    .find(|entry| entry.key == key)
            });

        match entry {
            Some(entry) => {
                let (notifier, signal) = ExitSignal::pair();
                entry.exit_waiters.retain(|waiter| !waiter.is_closed());
                entry.exit_waiters.push(notifier);
                signal
            }
            None => ExitSignal::ready(),
        }
    }

    /// Advance exit transitions by one tick
    pub fn tick(&mut self) {
        if self.leaving.is_empty() {
            return;
        }

        for leaving in &mut self.leaving {
            leaving.remaining_ticks = leaving.remaining_ticks.saturating_sub(1);
        }

        let (finished, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.leaving)
            .into_iter()
            .partition(|leaving| leaving.remaining_ticks == 0);
        self.leaving = pending;

        for mut leaving in finished {
            trace!(id = %leaving.entry.id, "exit transition finished");
            leaving.entry.finish_exit();
        }
    }

    /// Read-only view of the open entries in insertion order
    pub fn modals(&self) -> &[ModalEntry] {
        &self.entries
    }

    pub fn topmost(&self) -> Option<&ModalEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &ModalId) -> bool {
        self.entries.iter().any(|entry| &entry.id == id)
    }

    pub fn contains_entry(&self, key: EntryKey) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    /// Whether entries are still fading out
    pub fn is_transitioning(&self) -> bool {
        !self.leaving.is_empty()
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll_lock.is_locked()
    }

    pub fn scroll_lock(&self) -> &ScrollLock {
        &self.scroll_lock
    }

    /// Overlay area used for hit testing until the next render
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    /// Placement of every open entry, bottom to top
    pub fn layers(&self) -> Vec<ModalLayer> {
        self.entries
            .iter()
            .map(|entry| ModalLayer::new(entry.key, entry.layout(self.area)))
            .collect()
    }

    /// Offer a key to the overlay before the page sees it
    ///
    /// Escape closes only the topmost entry, and only if it allows it. Every
    /// other key goes to the topmost content. While anything is open the page
    /// never receives keys.
    pub fn handle_key(&mut self, key: KeyEvent) -> Dispatch {
        let Some(top) = self.entries.last() else {
            return Dispatch::Ignored;
        };

        if key.code == KeyCode::Esc && key.modifiers.is_empty() {
            if !top.options.close_on_esc {
                trace!(id = %top.id, "escape ignored, modal is not escapable");
                return Dispatch::Consumed;
            }
            return self.close_topmost().map_or(Dispatch::Consumed, Dispatch::Closed);
        }

        match top.content.handle_key(key) {
            Some(ModalAction::Close) => self.close_topmost().map_or(Dispatch::Consumed, Dispatch::Closed),
            Some(action) => Dispatch::Action(action),
            None => Dispatch::Consumed,
        }
    }

    /// Offer a mouse event to the overlay
    ///
    /// Only the topmost entry is hit tested. Clicks inside its frame go to
    /// its content and stop there; clicks outside land on its backdrop. Wheel
    /// events are left to the page, which checks the scroll lock.
    pub fn handle_mouse(&mut self, event: MouseEvent) -> Dispatch {
        let Some(top) = self.entries.last() else {
            return Dispatch::Ignored;
        };

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {}
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => return Dispatch::Ignored,
            _ => return Dispatch::Consumed,
        }

        let layer = ModalLayer::new(top.key, top.layout(self.area));
        if layer.frame_contains(event.column, event.row) {
            return match top
                .content
                .handle_click(event.column, event.row, layer.layout().content)
            {
                Some(ModalAction::Close) => self.close_topmost().map_or(Dispatch::Consumed, Dispatch::Closed),
                Some(action) => Dispatch::Action(action),
                None => Dispatch::Consumed,
            };
        }

        if !top.options.close_on_click_outside {
            trace!(id = %top.id, "backdrop click ignored");
            return Dispatch::Consumed;
        }

        self.close_topmost().map_or(Dispatch::Consumed, Dispatch::Closed)
    }

    /// Render the overlay layer; call after the page has been drawn
    pub fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.area = area;

        for leaving in &self.leaving {
            render_entry(frame, &leaving.entry, area, theme, true);
        }

        for entry in &self.entries {
            render_entry(frame, entry, area, theme, false);
        }
    }
}

impl Default for ModalRegistry {
    fn default() -> Self {
        Self::new(ScrollLockPolicy::default(), 0)
    }
}

fn render_entry(frame: &mut Frame, entry: &ModalEntry, area: Rect, theme: &Theme, leaving: bool) {
    let layout = entry.layout(area);

    if !leaving {
        frame.render_widget(Block::default().style(theme.backdrop_style()), layout.backdrop);
    }

    frame.render_widget(Clear, layout.frame);

    let border_style = if entry.options.is_danger() {
        Style::default().fg(theme.error).add_modifier(Modifier::BOLD)
    } else {
        theme.focused_border_style()
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .style(theme.base_style());
    if let Some(title) = &entry.options.title {
        block = block.title(format!(" {} ", title));
    }
    frame.render_widget(block, layout.frame);

    entry.content.render(frame, layout.content, theme);

    if leaving {
        frame.render_widget(
            Block::default().style(Style::default().add_modifier(Modifier::DIM)),
            layout.frame,
        );
    }
}
