//! Region-aware random fixup from a scrambled buffer to the target text.
//!
//! Each tick corrects exactly one mismatched position, chosen uniformly from
//! the active region. The message region `[0, boundary)` is active first;
//! once it fully matches, the art region `[boundary, len)` takes over.
//! Only mismatched positions are candidates, so a correct char is never
//! reverted and the buffer reaches the target in at most `len` ticks.

use rand::Rng;

use super::message::Message;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Buffer already equals the target; nothing changed.
    Done,
    /// `index` was corrected. `art_revealed` is set on the tick where the
    /// active region switched to the art block.
    Fixed { index: usize, art_revealed: bool },
}

#[derive(Clone, Debug, Default)]
pub struct Convergence {
    art_revealed: bool,
    ticks: u32,
}

impl Convergence {
    pub fn new() -> Self {
        Convergence { art_revealed: false, ticks: 0 }
    }

    pub fn art_revealed(&self) -> bool {
        self.art_revealed
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// One convergence tick. Returns the next buffer and what happened.
    ///
    /// A buffer whose length differs from the target is padded or cut to
    /// the target length first; padded cells count as mismatches.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        buffer: &[char],
        target: &Message,
        rng: &mut R,
    ) -> (Vec<char>, Advance) {
        let goal = target.chars();
        let mut next = buffer.to_vec();
        if next.len() != goal.len() {
            next.resize(goal.len(), '\0');
        }

        if next == goal {
            return (next, Advance::Done);
        }
        self.ticks += 1;

        let boundary = target.boundary().min(goal.len());
        let mut revealed_now = false;
        let mut candidates = Vec::new();

        if !self.art_revealed {
            candidates = mismatches(&next, goal, 0..boundary);
            if candidates.is_empty() {
                self.art_revealed = true;
                revealed_now = true;
            }
        }
        if self.art_revealed {
            candidates = mismatches(&next, goal, boundary..goal.len());
            if candidates.is_empty() {
                // Message region was disturbed after the art pass began.
                candidates = mismatches(&next, goal, 0..boundary);
            }
        }

        // Non-empty: next != goal and every index is in one of the regions.
        let index = candidates[rng.gen_range(0..candidates.len())];
        next[index] = goal[index];

        (next, Advance::Fixed { index, art_revealed: revealed_now })
    }
}

fn mismatches(buffer: &[char], goal: &[char], range: std::ops::Range<usize>) -> Vec<usize> {
    range.filter(|&i| buffer[i] != goal[i]).collect()
}
