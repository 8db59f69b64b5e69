//! Scramble engine: layout-preserving random substitution.
//!
//! Plain spaces and newlines survive; every other char (including Braille
//! art) is replaced with a fresh draw from the glyph pool. Nothing is
//! cached, so two calls on the same text give different noise.

use rand::Rng;

use super::glyph::GlyphPool;

#[inline]
pub fn is_layout(c: char) -> bool {
    c == ' ' || c == '\n'
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScrambleEngine {
    pool: GlyphPool,
}

impl ScrambleEngine {
    pub fn scramble<R: Rng + ?Sized>(&self, text: &[char], rng: &mut R) -> Vec<char> {
        text.iter()
            .map(|&c| if is_layout(c) { c } else { self.pool.pick(rng) })
            .collect()
    }

    pub fn scramble_str<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> String {
        text.chars()
            .map(|c| if is_layout(c) { c } else { self.pool.pick(rng) })
            .collect()
    }
}
