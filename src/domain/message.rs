//! The ground-truth message and its split into a text region and an art region.
//!
//! The art region starts at the first line containing the Braille blank
//! (U+2800). Everything before it is the message proper; convergence
//! resolves that part before it starts forcing art characters.

use std::ops::Range;

/// Braille pattern blank: marks the first line of the art block.
pub const SENTINEL: char = '\u{2800}';

/// Result of splitting a raw message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    /// Lines before the art, trimmed.
    pub message_region: String,
    /// The sentinel line and everything after it, verbatim.
    pub art_region: String,
    /// Char index where the art line starts, or the text's char length.
    pub boundary: usize,
}

/// Split `text` at the first line containing [`SENTINEL`].
pub fn partition(text: &str) -> Partition {
    let mut boundary = 0;
    let lines: Vec<&str> = text.split('\n').collect();

    for (idx, line) in lines.iter().enumerate() {
        if line.contains(SENTINEL) {
            return Partition {
                message_region: lines[..idx].join("\n").trim().to_string(),
                art_region: lines[idx..].join("\n"),
                boundary,
            };
        }
        boundary += line.chars().count() + 1; // + '\n'
    }

    Partition {
        message_region: text.to_string(),
        art_region: String::new(),
        boundary: text.chars().count(),
    }
}

/// Immutable original text, created once at startup.
#[derive(Clone, Debug)]
pub struct Message {
    text: String,
    chars: Vec<char>,
    partition: Partition,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let chars = text.chars().collect();
        let partition = partition(&text);
        Message { text, chars, partition }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Length in chars (the unit every index in this crate uses).
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn boundary(&self) -> usize {
        self.partition.boundary
    }

    pub fn message_region(&self) -> &str {
        &self.partition.message_region
    }

    pub fn art_region(&self) -> &str {
        &self.partition.art_region
    }

    pub fn has_art(&self) -> bool {
        !self.partition.art_region.is_empty()
    }

    /// Line indices covered by the art block, if there is one.
    pub fn art_lines(&self) -> Option<Range<usize>> {
        let newlines = |chars: &[char]| chars.iter().filter(|&&c| c == '\n').count();
        self.has_art().then(|| {
            newlines(&self.chars[..self.boundary()])..newlines(&self.chars) + 1
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn no_sentinel_is_all_message() {
        let p = partition("AB\nCD");
        assert_eq!(p.message_region, "AB\nCD");
        assert_eq!(p.art_region, "");
        assert_eq!(p.boundary, 5);
    }

    #[test]
    fn art_lines_span_boundary_to_end() {
        assert_eq!(Message::new("Hi\n\n\u{2800}a\n\u{28ff}b").art_lines(), Some(2..4));
        assert_eq!(Message::new("\u{2800}art").art_lines(), Some(0..1));
        assert_eq!(Message::new("no art\nhere").art_lines(), None);
    }

    #[test]
    fn sentinel_on_second_line() {
        let p = partition("Hi\n\u{2800}art");
        assert_eq!(p.message_region, "Hi");
        assert_eq!(p.art_region, "\u{2800}art");
        assert_eq!(p.boundary, 3);
    }

    #[test]
    fn message_region_is_trimmed_art_is_not() {
        let p = partition("  hello  \n\n \u{2800} x \n  y  ");
        assert_eq!(p.message_region, "hello");
        assert_eq!(p.art_region, " \u{2800} x \n  y  ");
        assert_eq!(p.boundary, 11);
    }

    #[test]
    fn sentinel_on_first_line() {
        let p = partition("\u{2800}\u{2800}\nabc");
        assert_eq!(p.message_region, "");
        assert_eq!(p.art_region, "\u{2800}\u{2800}\nabc");
        assert_eq!(p.boundary, 0);
    }

    #[test]
    fn boundary_counts_chars_not_bytes() {
        // 'é' is two bytes but one char
        let p = partition("été\n\u{2800}");
        assert_eq!(p.boundary, 4);
    }

    #[test]
    fn message_exposes_partition() {
        let m = Message::new("Hi\n\u{2800}art");
        assert_eq!(m.len(), 7);
        assert_eq!(m.boundary(), 3);
        assert!(m.has_art());
        assert_eq!(m.chars()[m.boundary()], SENTINEL);
    }

    proptest! {
        #[test]
        fn split_is_total(lines in proptest::collection::vec("[a-c \u{2800}]{0,6}", 0..6)) {
            let text = lines.join("\n");
            let p = partition(&text);
            let chars: Vec<char> = text.chars().collect();

            match lines.iter().position(|l| l.contains(SENTINEL)) {
                Some(idx) => {
                    let expected: usize = lines[..idx].iter().map(|l| l.chars().count() + 1).sum();
                    prop_assert_eq!(p.boundary, expected);
                    prop_assert_eq!(&p.art_region, &lines[idx..].join("\n"));
                    let head = lines[..idx].join("\n");
                    prop_assert_eq!(p.message_region.as_str(), head.trim());
                    let tail: String = chars[p.boundary..].iter().collect();
                    prop_assert_eq!(&tail, &p.art_region);
                }
                None => {
                    prop_assert_eq!(p.boundary, chars.len());
                    prop_assert_eq!(&p.message_region, &text);
                    prop_assert!(p.art_region.is_empty());
                }
            }
        }
    }
}
