//! Timer scheduler: deferred continuations on a virtual clock.
//!
//! Every outstanding timer is tracked by handle, so teardown can drop all of
//! them at once. The frame loop feeds real elapsed time through `advance()`;
//! each call moves the clock by at most `max_step`, so a stalled host delays
//! the animation instead of replaying a burst of missed ticks.
//!
//! A fired timer sets the clock to its own deadline. Anything scheduled from
//! inside that continuation is relative to when the timer was due, not to
//! when the frame loop happened to notice it.

use std::time::Duration;

/// Default cap on how far one `advance()` may move the clock.
pub const MAX_CATCH_UP: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Clone, Debug)]
struct Pending<W> {
    id: TimerId,
    due: Duration,
    wake: W,
}

#[derive(Debug)]
pub struct Scheduler<W> {
    clock: Duration,
    horizon: Duration,
    max_step: Duration,
    next_id: u64,
    pending: Vec<Pending<W>>,
}

impl<W: Copy> Scheduler<W> {
    pub fn new() -> Self {
        Self::with_max_step(MAX_CATCH_UP)
    }

    pub fn with_max_step(max_step: Duration) -> Self {
        Scheduler {
            clock: Duration::ZERO,
            horizon: Duration::ZERO,
            max_step,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.clock
    }

    pub fn schedule(&mut self, after: Duration, wake: W) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending { id, due: self.clock + after, wake });
        id
    }

    #[cfg(test)]
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Drop every outstanding timer. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Let up to `elapsed` (capped at `max_step`) of virtual time pass.
    /// Timers that fall due are collected with `pop_due()`.
    pub fn advance(&mut self, elapsed: Duration) {
        self.horizon = self.clock.max(self.horizon) + elapsed.min(self.max_step);
    }

    /// Next timer due within the current horizon, earliest first; ties fire
    /// in scheduling order. Moves the clock to that timer's deadline.
    pub fn pop_due(&mut self) -> Option<(TimerId, W)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= self.horizon)
            .min_by_key(|(_, p)| (p.due, p.id))
            .map(|(i, _)| i);

        match idx {
            Some(i) => {
                let p = self.pending.swap_remove(i);
                self.clock = self.clock.max(p.due);
                Some((p.id, p.wake))
            }
            None => {
                self.clock = self.clock.max(self.horizon);
                None
            }
        }
    }
}

impl<W: Copy> Default for Scheduler<W> {
    fn default() -> Self {
        Self::new()
    }
}
