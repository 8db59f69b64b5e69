//! Stage: the adapter between the sequencer and the host.
//!
//! Owns the display panes, the timer scheduler and the random source.
//! This is the only place that arms or cancels timers; the sequencer just
//! says which continuations it wants. `teardown()` drops every pending timer
//! so nothing can touch the screen afterwards.

use std::ops::Range;
use std::time::Duration;

use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::domain::message::Message;
use crate::domain::surface::Screen;
use crate::sim::event::Lifecycle;
use crate::sim::scheduler::Scheduler;
use crate::sim::sequencer::{Phase, Sequencer, Step, Wake};

pub struct Stage {
    pub screen: Screen,
    sequencer: Sequencer,
    scheduler: Scheduler<Wake>,
    rng: StdRng,
    art_lines: Option<Range<usize>>,
    intro_fade: Duration,
    intro_started: Option<Duration>,
    loading: bool,
    scroll_locked: bool,
    torn_down: bool,
}

impl Stage {
    pub fn new(message: Message, config: &AppConfig, rng: StdRng) -> Self {
        info!(
            chars = message.len(),
            boundary = message.boundary(),
            message_lines = message.message_region().lines().count(),
            art_lines = message.art_region().lines().count(),
            art = message.has_art(),
            "stage ready"
        );
        let art_lines = message.art_lines();
        Stage {
            screen: Screen::new(),
            sequencer: Sequencer::new(message, &config.script, &config.timing),
            scheduler: Scheduler::new(),
            rng,
            art_lines,
            intro_fade: config.timing.intro_fade,
            intro_started: None,
            loading: false,
            scroll_locked: false,
            torn_down: false,
        }
    }

    // ── Host triggers ──

    pub fn start(&mut self) -> Vec<Lifecycle> {
        if self.torn_down {
            return Vec::new();
        }
        let step = self.sequencer.start();
        if !step.events.is_empty() {
            self.intro_started = Some(self.scheduler.now());
        }
        self.apply(step)
    }

    pub fn activate(&mut self) -> Vec<Lifecycle> {
        if self.torn_down {
            return Vec::new();
        }
        let step = self.sequencer.activate(&mut self.screen);
        self.apply(step)
    }

    /// Let `elapsed` of host time pass and run every continuation that
    /// fell due, in order.
    pub fn pump(&mut self, elapsed: Duration) -> Vec<Lifecycle> {
        let mut events = Vec::new();
        if self.torn_down {
            return events;
        }
        self.scheduler.advance(elapsed);
        while let Some((_, wake)) = self.scheduler.pop_due() {
            let step = self.sequencer.wake(wake, &mut self.screen, &mut self.rng);
            events.extend(self.apply(step));
        }
        events
    }

    /// Cancel every pending continuation. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let dropped = self.scheduler.cancel_all();
        self.torn_down = true;
        info!(dropped, "stage torn down");
    }

    fn apply(&mut self, step: Step) -> Vec<Lifecycle> {
        if step.cancel_pending {
            let dropped = self.scheduler.cancel_all();
            debug!(dropped, "cancelled pending timers");
        }
        for (wake, after) in step.timers {
            self.scheduler.schedule(after, wake);
        }
        for event in &step.events {
            match event {
                Lifecycle::DecryptionStarted => {
                    self.loading = true;
                    self.scroll_locked = true;
                }
                Lifecycle::DecryptionComplete => self.loading = false,
                Lifecycle::EpilogueComplete => self.scroll_locked = false,
                _ => {}
            }
        }
        step.events
    }

    // ── Queries ──

    pub fn phase(&self) -> Phase {
        self.sequencer.phase()
    }

    pub fn is_listening(&self) -> bool {
        self.sequencer.is_listening()
    }

    pub fn is_finished(&self) -> bool {
        self.sequencer.phase() == Phase::Done
    }

    #[cfg(test)]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    #[cfg(test)]
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// Main-pane lines that belong to the art block.
    pub fn art_lines(&self) -> Option<Range<usize>> {
        self.art_lines.clone()
    }

    /// Loading affordance visible (decryption in progress).
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Manual scrolling is suspended while decrypting.
    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// Opacity of the intro card: 1.0 until acknowledged, fading to 0.0
    /// over the intro fade.
    pub fn intro_opacity(&self) -> f32 {
        if self.sequencer.phase() != Phase::Idle {
            return 0.0;
        }
        match self.intro_started {
            None => 1.0,
            Some(t0) if self.sequencer.is_starting() && !self.intro_fade.is_zero() => {
                let t = (self.scheduler.now() - t0).as_secs_f32() / self.intro_fade.as_secs_f32();
                (1.0 - t).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::surface::Surface;
    use rand::SeedableRng;

    fn stage(text: &str) -> Stage {
        let mut config = AppConfig::parse("").unwrap();
        config.script.prompt = ">".into();
        config.script.epilogue = vec!["ok".into()];
        Stage::new(Message::new(text), &config, StdRng::seed_from_u64(3))
    }

    /// Feed `total` of host time in 50ms frames.
    fn run_for(stage: &mut Stage, total: Duration) -> Vec<Lifecycle> {
        let frame = Duration::from_millis(50);
        let mut events = Vec::new();
        let mut left = total;
        while !left.is_zero() {
            let dt = left.min(frame);
            events.extend(stage.pump(dt));
            left -= dt;
        }
        events
    }

    fn pump_until(stage: &mut Stage, frame: Duration, mut done: impl FnMut(&Stage) -> bool) {
        for _ in 0..1_000_000 {
            if done(stage) {
                return;
            }
            stage.pump(frame);
        }
        panic!("condition never reached in {:?}", stage.phase());
    }

    #[test]
    fn nothing_happens_before_start() {
        let mut s = stage("abc");
        assert!(s.pump(Duration::from_secs(5)).is_empty());
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.intro_opacity(), 1.0);
    }

    #[test]
    fn intro_fades_then_typing_begins() {
        let mut s = stage("abc");
        assert_eq!(s.start(), vec![Lifecycle::IntroFinished]);
        run_for(&mut s, Duration::from_millis(250));
        let o = s.intro_opacity();
        assert!(o > 0.4 && o < 0.6, "opacity {o}");
        run_for(&mut s, Duration::from_millis(250));
        assert_eq!(s.phase(), Phase::TypingIn);
        assert_eq!(s.intro_opacity(), 0.0);
    }

    #[test]
    fn frame_catch_up_runs_many_short_ticks() {
        let mut s = stage(&"x".repeat(40));
        s.start();
        run_for(&mut s, Duration::from_millis(500));
        // A 100ms frame lets ten 10ms typing ticks through.
        s.pump(Duration::from_millis(100));
        assert_eq!(s.screen.main.text().chars().count(), 10);
    }

    #[test]
    fn long_stall_delays_instead_of_skipping() {
        let mut s = stage(&"x".repeat(40));
        s.start();
        run_for(&mut s, Duration::from_millis(500));
        s.pump(Duration::from_secs(30));
        assert_eq!(s.screen.main.text().chars().count(), 10);
    }

    #[test]
    fn activation_coalesces_and_locks_scrolling() {
        let mut s = stage("abc");
        s.start();
        pump_until(&mut s, Duration::from_millis(16), |s| s.is_listening());
        let first = s.activate();
        let second = s.activate();
        assert_eq!(first, vec![Lifecycle::DecryptionStarted]);
        assert!(second.is_empty());
        assert!(s.loading());
        assert!(s.scroll_locked());
        assert_eq!(s.pending_timers(), 2);
    }

    #[test]
    fn full_run_unlocks_scrolling_at_the_end() {
        let text = "Hello\n\u{2800}\u{2800}";
        let mut s = stage(text);
        s.start();
        pump_until(&mut s, Duration::from_millis(16), |s| s.is_listening());
        s.activate();

        let mut seen = Vec::new();
        for _ in 0..100_000 {
            if s.is_finished() {
                break;
            }
            seen.extend(s.pump(Duration::from_millis(16)));
            if seen.contains(&Lifecycle::DecryptionComplete) {
                assert!(!s.loading());
            }
        }
        assert!(s.is_finished());
        assert!(!s.scroll_locked());
        assert_eq!(s.screen.main.text(), text);
        assert_eq!(s.screen.epilogue.text(), "ok");
        assert_eq!(s.pending_timers(), 0);
        assert_eq!(seen.last(), Some(&Lifecycle::EpilogueComplete));
    }

    #[test]
    fn teardown_freezes_the_screen() {
        let mut s = stage(&"y".repeat(30));
        s.start();
        run_for(&mut s, Duration::from_millis(550));
        let frozen = s.screen.main.text().to_string();
        assert!(s.pending_timers() > 0);

        s.teardown();
        assert_eq!(s.pending_timers(), 0);
        assert!(s.pump(Duration::from_secs(10)).is_empty());
        assert!(s.activate().is_empty());
        assert_eq!(s.screen.main.text(), frozen);
        s.teardown();
        assert!(s.is_torn_down());
    }
}
