/// Viewport: the visible window onto the rendered document.
///
/// Document coordinates and screen coordinates are separate:
///   - `(left, top)` is the document column/row shown at the top-left
///   - `(view_w, view_h)` is set by the renderer from the terminal size
///   - `(content_w, content_h)` is set by the renderer after layout
///
/// Offsets are clamped whenever either size changes, so a shrinking
/// document never leaves the view scrolled past its end. Auto-scroll is a
/// request resolved at the next `set_content`, once the new size is known.

use crate::ui::input::Scroll;

/// Rows from the bottom within which typing progress keeps following the tail.
pub const FOLLOW_MARGIN: usize = 3;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Follow {
    /// Stick to the bottom only if already within `FOLLOW_MARGIN` of it.
    Tail,
    /// Always jump to the bottom.
    Bottom,
}

#[derive(Clone, Debug, Default)]
pub struct Viewport {
    pub top: usize,
    pub left: usize,
    view_w: usize,
    view_h: usize,
    content_w: usize,
    content_h: usize,
    /// The user has scrolled horizontally at least once.
    h_scrolled: bool,
    pending: Option<Follow>,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_view(&mut self, w: usize, h: usize) {
        self.view_w = w;
        self.view_h = h;
        self.clamp();
    }

    pub fn set_content(&mut self, w: usize, h: usize) {
        self.content_w = w;
        self.content_h = h;
        self.clamp();
        match self.pending.take() {
            Some(Follow::Bottom) => self.scroll_to_bottom(),
            Some(Follow::Tail) if self.at_bottom(FOLLOW_MARGIN) => self.scroll_to_bottom(),
            _ => {}
        }
    }

    /// Queue an auto-scroll. `Bottom` wins over `Tail`.
    pub fn request(&mut self, follow: Follow) {
        if self.pending != Some(Follow::Bottom) {
            self.pending = Some(follow);
        }
    }

    pub fn view_size(&self) -> (usize, usize) {
        (self.view_w, self.view_h)
    }

    fn max_top(&self) -> usize {
        self.content_h.saturating_sub(self.view_h)
    }

    fn max_left(&self) -> usize {
        self.content_w.saturating_sub(self.view_w)
    }

    fn clamp(&mut self) {
        self.top = self.top.min(self.max_top());
        self.left = self.left.min(self.max_left());
    }

    /// Apply one manual scroll step.
    pub fn scroll(&mut self, s: Scroll) {
        let page = self.view_h.saturating_sub(1).max(1);
        match s {
            Scroll::Up => self.top = self.top.saturating_sub(1),
            Scroll::Down => self.top += 1,
            Scroll::PageUp => self.top = self.top.saturating_sub(page),
            Scroll::PageDown => self.top += page,
            Scroll::Top => self.top = 0,
            Scroll::Bottom => self.top = self.max_top(),
            Scroll::Left => {
                self.h_scrolled = true;
                self.left = self.left.saturating_sub(4);
            }
            Scroll::Right => {
                self.h_scrolled = true;
                self.left += 4;
            }
        }
        self.clamp();
    }

    pub fn at_bottom(&self, margin: usize) -> bool {
        self.top + margin >= self.max_top()
    }

    pub fn scroll_to_bottom(&mut self) {
        self.top = self.max_top();
    }

    /// More content below the visible window.
    pub fn overflows_below(&self) -> bool {
        self.top < self.max_top()
    }

    /// Content is wider than the view and the user hasn't tried scrolling sideways.
    pub fn show_h_hint(&self) -> bool {
        !self.h_scrolled && self.content_w > self.view_w
    }
}
