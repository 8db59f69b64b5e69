//! Glyph pool: the fixed noise alphabet used for scrambling.
//!
//! Every entry is a single renderable, non-whitespace `char`. The mix of
//! punctuation, Latin letters, code-page 437 accents/Greek and box-drawing
//! blocks gives the "terminal static" look.

use rand::Rng;

const GLYPHS: &[char] = &[
    // ASCII punctuation
    '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '~',
    '.', '/', ':', ';', '<', '=', '>', '?', '[', '\\', ']', '_', '{', '}',
    // Latin
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M',
    'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    // CP437 accents, currency, Greek, math
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï',
    'î', 'ì', 'Ä', 'Å', 'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù',
    'ÿ', 'Ö', 'Ü', '¢', '£', '¥', 'ƒ', 'á', 'í', 'ó', 'ú', 'ñ',
    'Ñ', 'ª', 'º', '¿', '¬', '½', '¼', '¡', '«', '»', 'α', 'ß',
    'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', 'φ', 'ε',
    '±', '÷', '°', '·', '²', '¶', '⌐', '₧', '▒', '▓',
    // CP437 box drawing and blocks
    '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛',
    '┐', '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩',
    '╦', '╠', '═', '╬', '╧', '╨', '╤', '╥', '╙', '╘', '╒', '╓',
    '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
];

/// Immutable ordered set of scramble candidates.
#[derive(Clone, Copy, Debug)]
pub struct GlyphPool {
    glyphs: &'static [char],
}

impl GlyphPool {
    /// The built-in pool.
    pub const fn standard() -> Self {
        GlyphPool { glyphs: GLYPHS }
    }

    /// Uniform draw from the pool.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        self.glyphs[rng.gen_range(0..self.glyphs.len())]
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[cfg(test)]
    pub fn contains(&self, c: char) -> bool {
        self.glyphs.contains(&c)
    }
}

impl Default for GlyphPool {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pool_is_non_empty_and_sized() {
        let pool = GlyphPool::standard();
        assert!(pool.len() > 180);
    }

    #[test]
    fn pool_has_no_whitespace() {
        assert!(GLYPHS.iter().all(|c| !c.is_whitespace()));
    }

    #[test]
    fn pool_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for c in GLYPHS {
            assert!(seen.insert(*c), "duplicate glyph {c:?}");
        }
    }

    #[test]
    fn pick_draws_from_pool() {
        let pool = GlyphPool::standard();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            assert!(pool.contains(pool.pick(&mut rng)));
        }
    }

    #[test]
    fn pick_covers_the_pool() {
        // 200k draws over ~190 glyphs: every glyph shows up.
        let pool = GlyphPool::standard();
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200_000 {
            seen.insert(pool.pick(&mut rng));
        }
        assert_eq!(seen.len(), pool.len());
    }
}
