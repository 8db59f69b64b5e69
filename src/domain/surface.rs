//! Display surface abstraction.
//!
//! The animation core only ever replaces a surface's text wholesale and
//! reads it back. Cursor and opacity are presentation hints a surface may
//! ignore.

pub trait Surface {
    fn set_text(&mut self, text: String);
    fn text(&self) -> &str;

    fn set_cursor(&mut self, _visible: bool) {}
    fn set_opacity(&mut self, _opacity: f32) {}
}

/// In-memory surface the terminal renderer draws from.
#[derive(Clone, Debug)]
pub struct Pane {
    text: String,
    pub cursor: bool,
    /// 0.0 = invisible, 1.0 = fully drawn.
    pub opacity: f32,
}

impl Pane {
    pub fn new() -> Self {
        Pane { text: String::new(), cursor: false, opacity: 1.0 }
    }
}

impl Default for Pane {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for Pane {
    fn set_text(&mut self, text: String) {
        self.text = text;
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn set_cursor(&mut self, visible: bool) {
        self.cursor = visible;
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }
}

/// Everything the animation can draw into.
#[derive(Clone, Debug)]
pub struct Screen {
    /// The scrambled / decrypted message.
    pub main: Pane,
    /// Typed epilogue lines, `\n`-separated.
    pub epilogue: Pane,
    /// Closing paragraph, revealed at once then faded in.
    pub closing: Pane,
}

impl Screen {
    pub fn new() -> Self {
        let mut closing = Pane::new();
        closing.opacity = 0.0;
        Screen { main: Pane::new(), epilogue: Pane::new(), closing }
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pane_replaces_wholesale() {
        let mut p = Pane::new();
        p.set_text("abc".into());
        p.set_text("x".into());
        assert_eq!(p.text(), "x");
    }

    #[test]
    fn opacity_is_clamped() {
        let mut p = Pane::new();
        p.set_opacity(3.0);
        assert_eq!(p.opacity, 1.0);
        p.set_opacity(-1.0);
        assert_eq!(p.opacity, 0.0);
    }

    #[test]
    fn closing_starts_hidden() {
        assert_eq!(Screen::new().closing.opacity, 0.0);
    }
}
