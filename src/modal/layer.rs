//! Overlay layout and hit testing
//!
//! Every entry renders as a backdrop covering the whole overlay area plus a
//! content frame sized and anchored by its options. The layout is recomputed
//! from the last overlay area each time it is needed.

use super::types::{EntryKey, ModalOptions, ModalPosition, ModalSize};
use ratatui::layout::Rect;

/// Where an entry's pieces land on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalLayout {
    /// Backdrop area (the whole overlay)
    pub backdrop: Rect,
    /// Content frame including its border
    pub frame: Rect,
    /// Content area inside the border
    pub content: Rect,
}

impl ModalLayout {
    pub fn calculate(options: &ModalOptions, area: Rect, content_height: u16) -> Self {
        let (width, height) = Self::calculate_size(options.size, area, content_height);
        let (x, y) = Self::calculate_position(options.position, area, width, height);

        let frame = Rect {
            x,
            y,
            width,
            height,
        };

        let content = Rect {
            x: frame.x.saturating_add(1),
            y: frame.y.saturating_add(1),
            width: frame.width.saturating_sub(2),
            height: frame.height.saturating_sub(2),
        };

        Self {
            backdrop: area,
            frame,
            content,
        }
    }

    fn calculate_size(size: ModalSize, area: Rect, content_height: u16) -> (u16, u16) {
        if size == ModalSize::Full {
            return (area.width, area.height);
        }

        let width = (area.width as u32 * size.width_percent() as u32 / 100) as u16;
        // Border rows on top of what the content asked for
        let height = content_height.saturating_add(2).min(area.height);
        (width.max(area.width.min(20)), height)
    }

    fn calculate_position(position: ModalPosition, area: Rect, width: u16, height: u16) -> (u16, u16) {
        let centered_x = area.x + area.width.saturating_sub(width) / 2;
        let centered_y = area.y + area.height.saturating_sub(height) / 2;

        match position {
            ModalPosition::Center => (centered_x, centered_y),
            ModalPosition::Top => (centered_x, area.y),
            ModalPosition::Bottom => (centered_x, area.y + area.height.saturating_sub(height)),
            ModalPosition::Left => (area.x, centered_y),
            ModalPosition::Right => (area.x + area.width.saturating_sub(width), centered_y),
        }
    }
}

/// One entry as placed in the overlay for the current frame
#[derive(Debug, Clone, Copy)]
pub struct ModalLayer {
    key: EntryKey,
    layout: ModalLayout,
}

impl ModalLayer {
    pub fn new(key: EntryKey, layout: ModalLayout) -> Self {
        Self { key, layout }
    }

    pub fn key(&self) -> EntryKey {
        self.key
    }

    pub fn layout(&self) -> &ModalLayout {
        &self.layout
    }

    /// Check if a point is within the content frame
    pub fn frame_contains(&self, x: u16, y: u16) -> bool {
        contains(self.layout.frame, x, y)
    }

    /// Check if a point hits the backdrop rather than the frame
    pub fn backdrop_contains(&self, x: u16, y: u16) -> bool {
        contains(self.layout.backdrop, x, y) && !self.frame_contains(x, y)
    }
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x
        && (x as u32) < area.x as u32 + area.width as u32
        && y >= area.y
        && (y as u32) < area.y as u32 + area.height as u32
}
