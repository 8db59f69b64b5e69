//! Animation sequencer: the phase state machine.
//!
//! ```text
//! Idle ──start──▶ TypingIn ──▶ AwaitingInput ──activate──▶ Scrambling
//!                                                              │
//!        Done ◀── EpilogueTyping ◀── (pause) ◀── Converging ◀──┘
//! ```
//!
//! The sequencer never owns a timer. Each entry point returns a [`Step`]
//! naming the continuations to arm; the stage adapter schedules them and
//! calls [`Sequencer::wake`] when they fire. Every tick reads the current
//! surface text rather than assuming what an earlier tick wrote.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, trace};

use crate::config::{ScriptConfig, TimingConfig};
use crate::domain::converge::{Advance, Convergence};
use crate::domain::message::Message;
use crate::domain::scramble::ScrambleEngine;
use crate::domain::surface::{Screen, Surface};
use crate::sim::event::{Lifecycle, TYPING_PROGRESS_STRIDE};
use crate::sim::typewriter::Typewriter;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Idle,
    TypingIn,
    AwaitingInput,
    Scrambling,
    Converging,
    EpilogueTyping,
    Done,
}

/// Continuation kinds the sequencer asks to be woken for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Wake {
    /// The active phase's regular tick.
    Tick,
    /// Wall-clock cap on the scrambling phase.
    ScrambleBudget,
}

/// What the adapter must do after an entry point returns.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Step {
    pub events: Vec<Lifecycle>,
    /// Drop every outstanding timer before arming `timers`.
    pub cancel_pending: bool,
    pub timers: Vec<(Wake, Duration)>,
}

impl Step {
    fn tick(after: Duration) -> Self {
        Step { timers: vec![(Wake::Tick, after)], ..Step::default() }
    }

    fn with_event(mut self, event: Lifecycle) -> Self {
        self.events.push(event);
        self
    }
}

pub struct Sequencer {
    phase: Phase,
    message: Message,
    timing: TimingConfig,
    prompt: Vec<char>,
    engine: ScrambleEngine,

    // ── Idle ──
    starting: bool,

    // ── TypingIn / AwaitingInput ──
    typed: Vec<char>,
    revealed: usize,
    prompt_revealed: usize,
    listening: bool,

    // ── Scrambling ──
    decrypting: bool,
    scramble_ticks: u32,

    // ── Converging ──
    convergence: Convergence,
    resolved: bool,

    // ── EpilogueTyping ──
    typewriter: Typewriter,
}

impl Sequencer {
    pub fn new(message: Message, script: &ScriptConfig, timing: &TimingConfig) -> Self {
        Sequencer {
            phase: Phase::Idle,
            message,
            timing: timing.clone(),
            prompt: script.prompt.chars().collect(),
            engine: ScrambleEngine::default(),
            starting: false,
            typed: Vec::new(),
            revealed: 0,
            prompt_revealed: 0,
            listening: false,
            decrypting: false,
            scramble_ticks: 0,
            convergence: Convergence::new(),
            resolved: false,
            typewriter: Typewriter::new(script, timing),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Intro acknowledged and its fade is running.
    pub fn is_starting(&self) -> bool {
        self.starting
    }

    /// True once the prompt is fully typed and activation is accepted.
    pub fn is_listening(&self) -> bool {
        self.phase == Phase::AwaitingInput && self.listening && !self.decrypting
    }

    // ── External triggers ──

    /// The user acknowledged the intro. The typing-in phase begins once
    /// the intro fade elapses. Repeated calls are ignored.
    pub fn start(&mut self) -> Step {
        if self.phase != Phase::Idle || self.starting {
            return Step::default();
        }
        self.starting = true;
        info!("intro acknowledged");
        Step::tick(self.timing.intro_fade).with_event(Lifecycle::IntroFinished)
    }

    /// The confirmation input. Honored once, and only after the prompt is
    /// fully typed; everything else is a no-op.
    pub fn activate(&mut self, screen: &mut Screen) -> Step {
        if !self.is_listening() {
            trace!(phase = ?self.phase, "activation ignored");
            return Step::default();
        }
        self.decrypting = true;
        self.phase = Phase::Scrambling;
        info!("decryption started");

        screen.main.set_cursor(false);
        screen.main.set_text(self.typed.iter().collect());

        Step {
            events: vec![Lifecycle::DecryptionStarted],
            cancel_pending: true,
            timers: vec![
                (Wake::Tick, self.timing.scramble_tick),
                (Wake::ScrambleBudget, self.timing.scramble_budget),
            ],
        }
    }

    // ── Timer continuations ──

    pub fn wake<R: Rng + ?Sized>(&mut self, wake: Wake, screen: &mut Screen, rng: &mut R) -> Step {
        match (self.phase, wake) {
            (Phase::Idle, Wake::Tick) if self.starting => self.begin_typing(screen, rng),
            (Phase::TypingIn, Wake::Tick) => self.tick_typing(screen),
            (Phase::AwaitingInput, Wake::Tick) => self.tick_prompt(screen),
            (Phase::Scrambling, Wake::Tick) => self.tick_scramble(screen, rng),
            (Phase::Scrambling, Wake::ScrambleBudget) => {
                debug!(ticks = self.scramble_ticks, "scramble budget elapsed");
                self.begin_converging(screen, rng)
            }
            (Phase::Converging, Wake::Tick) => self.tick_converge(screen, rng),
            (Phase::EpilogueTyping, Wake::Tick) => self.tick_epilogue(screen),
            (phase, wake) => {
                trace!(?phase, ?wake, "stale wake ignored");
                Step::default()
            }
        }
    }

    // ── TypingIn ──

    fn begin_typing<R: Rng + ?Sized>(&mut self, screen: &mut Screen, rng: &mut R) -> Step {
        self.starting = false;
        self.phase = Phase::TypingIn;
        self.typed = self.engine.scramble(self.message.chars(), rng);
        self.revealed = 0;
        info!(chars = self.typed.len(), "typing in");

        screen.main.set_cursor(true);
        screen.main.set_text(String::new());
        Step::tick(self.timing.type_in)
    }

    fn tick_typing(&mut self, screen: &mut Screen) -> Step {
        self.revealed = (self.revealed + 1).min(self.typed.len());
        screen.main.set_text(self.typed[..self.revealed].iter().collect());

        let mut step = if self.revealed >= self.typed.len() {
            self.begin_prompt(screen)
        } else {
            Step::tick(self.timing.type_in)
        };
        if self.revealed % TYPING_PROGRESS_STRIDE == 0 {
            step.events.insert(
                0,
                Lifecycle::TypingProgress { revealed: self.revealed, total: self.typed.len() },
            );
        }
        step
    }

    // ── AwaitingInput ──

    fn begin_prompt(&mut self, screen: &mut Screen) -> Step {
        self.phase = Phase::AwaitingInput;
        self.prompt_revealed = 0;
        debug!("typing prompt");
        if self.prompt.is_empty() {
            return self.prompt_ready(screen);
        }
        Step::tick(self.timing.prompt)
    }

    fn tick_prompt(&mut self, screen: &mut Screen) -> Step {
        self.prompt_revealed = (self.prompt_revealed + 1).min(self.prompt.len());
        let text: String = self.typed.iter()
            .chain(&self.prompt[..self.prompt_revealed])
            .collect();
        screen.main.set_text(text);

        if self.prompt_revealed >= self.prompt.len() {
            self.prompt_ready(screen)
        } else {
            Step::tick(self.timing.prompt)
        }
    }

    fn prompt_ready(&mut self, screen: &mut Screen) -> Step {
        self.listening = true;
        screen.main.set_cursor(true);
        info!("awaiting activation");
        Step::default().with_event(Lifecycle::PromptReady)
    }

    // ── Scrambling ──

    fn tick_scramble<R: Rng + ?Sized>(&mut self, screen: &mut Screen, rng: &mut R) -> Step {
        if self.scramble_ticks >= self.timing.scramble_max_ticks {
            debug!(ticks = self.scramble_ticks, "scramble tick cap reached");
            return self.begin_converging(screen, rng);
        }
        screen.main.set_text(self.engine.scramble_str(self.message.text(), rng));
        self.scramble_ticks += 1;
        Step::tick(self.timing.scramble_tick)
    }

    // ── Converging ──

    fn begin_converging<R: Rng + ?Sized>(&mut self, screen: &mut Screen, rng: &mut R) -> Step {
        self.phase = Phase::Converging;
        self.convergence = Convergence::new();
        self.resolved = false;
        info!(boundary = self.message.boundary(), "converging");

        let mut step = self.tick_converge(screen, rng);
        step.cancel_pending = true;
        step
    }

    fn tick_converge<R: Rng + ?Sized>(&mut self, screen: &mut Screen, rng: &mut R) -> Step {
        if self.resolved {
            return self.begin_epilogue(screen);
        }

        let current: Vec<char> = screen.main.text().chars().collect();
        let (next, advance) = self.convergence.advance(&current, &self.message, rng);
        screen.main.set_text(next.into_iter().collect());

        match advance {
            Advance::Fixed { index, art_revealed } => {
                trace!(index, "fixed");
                let interval = if self.convergence.art_revealed() {
                    self.timing.art_converge
                } else {
                    self.timing.message_converge
                };
                let step = Step::tick(interval);
                if art_revealed {
                    debug!("message region resolved");
                    step.with_event(Lifecycle::ArtRevealed)
                } else {
                    step
                }
            }
            Advance::Done => {
                self.resolved = true;
                info!(ticks = self.convergence.ticks(), "decryption complete");
                Step::tick(self.timing.converge_pause).with_event(Lifecycle::DecryptionComplete)
            }
        }
    }

    // ── EpilogueTyping ──

    fn begin_epilogue(&mut self, screen: &mut Screen) -> Step {
        self.phase = Phase::EpilogueTyping;
        info!("epilogue");
        self.tick_epilogue(screen)
    }

    fn tick_epilogue(&mut self, screen: &mut Screen) -> Step {
        let tick = self.typewriter.tick(&mut screen.epilogue, &mut screen.closing);
        let mut step = match tick.next {
            Some(after) => Step::tick(after),
            None => {
                self.phase = Phase::Done;
                info!("done");
                Step::default()
            }
        };
        step.events.extend(tick.event);
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scramble::is_layout;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn script(prompt: &str, lines: &[&str]) -> ScriptConfig {
        ScriptConfig {
            prompt: prompt.into(),
            epilogue: lines.iter().map(|s| s.to_string()).collect(),
            closing: "end".into(),
        }
    }

    /// Drive the sequencer by always firing the earliest timer.
    struct Harness {
        seq: Sequencer,
        screen: Screen,
        rng: StdRng,
        timers: Vec<(Duration, Wake)>,
        now: Duration,
        events: Vec<Lifecycle>,
    }

    impl Harness {
        fn new(text: &str, script: ScriptConfig) -> Self {
            Harness {
                seq: Sequencer::new(Message::new(text), &script, &TimingConfig::default()),
                screen: Screen::new(),
                rng: StdRng::seed_from_u64(17),
                timers: Vec::new(),
                now: Duration::ZERO,
                events: Vec::new(),
            }
        }

        fn apply(&mut self, step: Step) {
            if step.cancel_pending {
                self.timers.clear();
            }
            for (wake, after) in step.timers {
                self.timers.push((self.now + after, wake));
            }
            self.events.extend(step.events);
        }

        fn fire(&mut self) -> bool {
            let Some(i) = (0..self.timers.len()).min_by_key(|&i| self.timers[i].0) else {
                return false;
            };
            let (due, wake) = self.timers.remove(i);
            self.now = due;
            let step = self.seq.wake(wake, &mut self.screen, &mut self.rng);
            self.apply(step);
            true
        }

        fn run_until(&mut self, phase: Phase) {
            while self.seq.phase() != phase {
                assert!(self.fire(), "stalled in {:?}", self.seq.phase());
            }
        }

        fn start(&mut self) {
            let step = self.seq.start();
            self.apply(step);
        }

        fn activate(&mut self) {
            let step = self.seq.activate(&mut self.screen);
            self.apply(step);
        }
    }

    #[test]
    fn types_scrambled_text_one_char_per_tick() {
        let mut h = Harness::new("AB\nCD", script(">", &[]));
        h.start();
        assert_eq!(h.events, vec![Lifecycle::IntroFinished]);
        h.run_until(Phase::TypingIn);
        assert_eq!(h.screen.main.text(), "");
        assert!(h.screen.main.cursor);

        let mut lens = Vec::new();
        while h.seq.phase() == Phase::TypingIn {
            h.fire();
            lens.push(h.screen.main.text().chars().count());
        }
        assert_eq!(lens, vec![1, 2, 3, 4, 5]);
        let shown: Vec<char> = h.screen.main.text().chars().collect();
        assert_eq!(shown[2], '\n');
        assert!(shown.iter().enumerate().all(|(i, c)| i == 2 || !c.is_whitespace()));
    }

    #[test]
    fn prompt_is_typed_after_scrambled_text() {
        let mut h = Harness::new("abc", script("\n>>", &[]));
        h.start();
        h.run_until(Phase::AwaitingInput);
        let base = h.screen.main.text().to_string();
        assert!(!h.seq.is_listening());

        while !h.seq.is_listening() {
            assert!(h.fire());
        }
        assert_eq!(h.screen.main.text(), format!("{base}\n>>"));
        assert_eq!(h.events.last(), Some(&Lifecycle::PromptReady));
        assert!(h.timers.is_empty());
    }

    #[test]
    fn activation_before_prompt_finishes_is_ignored() {
        let mut h = Harness::new("abc", script("...", &[]));
        h.start();
        h.run_until(Phase::AwaitingInput);
        h.activate();
        assert_eq!(h.seq.phase(), Phase::AwaitingInput);
        assert!(!h.events.contains(&Lifecycle::DecryptionStarted));
    }

    #[test]
    fn double_activation_transitions_once() {
        let mut h = Harness::new("abc", script("", &[]));
        h.start();
        h.run_until(Phase::AwaitingInput);
        assert!(h.seq.is_listening());

        h.activate();
        h.activate();
        let started = h.events.iter().filter(|e| **e == Lifecycle::DecryptionStarted).count();
        assert_eq!(started, 1);
        assert_eq!(h.seq.phase(), Phase::Scrambling);
        // One tick + one budget timer, not two of each.
        assert_eq!(h.timers.len(), 2);
    }

    #[test]
    fn start_is_idempotent() {
        let mut h = Harness::new("abc", script("", &[]));
        h.start();
        h.start();
        assert_eq!(h.events, vec![Lifecycle::IntroFinished]);
        assert_eq!(h.timers.len(), 1);
    }

    #[test]
    fn scramble_ends_at_budget_and_seeds_convergence() {
        let mut h = Harness::new("hello there", script("", &[]));
        h.start();
        h.run_until(Phase::AwaitingInput);
        h.activate();
        let activated_at = h.now;

        let mut frames = 0;
        while h.seq.phase() == Phase::Scrambling {
            h.fire();
            frames += 1;
        }
        // 100 ticks at 10ms reach the 1000ms budget together; the budget
        // (or the cap check) ends it, never later.
        assert!(h.now - activated_at <= Duration::from_millis(1010));
        assert!(frames >= 100);
        assert_eq!(h.seq.phase(), Phase::Converging);
        // No scramble tick survives the transition.
        assert_eq!(h.timers.len(), 1);
    }

    #[test]
    fn each_scramble_tick_redraws_and_convergence_starts_from_the_last() {
        let text = "decode this line\nand then the next";
        let target: Vec<char> = text.chars().collect();
        let mut h = Harness::new(text, script("", &[]));
        h.start();
        h.run_until(Phase::AwaitingInput);
        h.activate();

        let mut frames: Vec<Vec<char>> = Vec::new();
        while h.seq.phase() == Phase::Scrambling {
            h.fire();
            if h.seq.phase() == Phase::Scrambling {
                frames.push(h.screen.main.text().chars().collect());
            }
        }
        assert!(frames.len() >= 2);
        for frame in &frames {
            assert_eq!(frame.len(), target.len());
            for (got, want) in frame.iter().zip(&target) {
                if is_layout(*want) {
                    assert_eq!(got, want);
                } else {
                    assert!(!is_layout(*got));
                }
            }
        }
        assert!(frames.windows(2).all(|w| w[0] != w[1]));

        let first_converged: Vec<char> = h.screen.main.text().chars().collect();
        let last = frames.last().unwrap();
        let changed: Vec<usize> =
            (0..target.len()).filter(|&i| first_converged[i] != last[i]).collect();
        assert_eq!(changed.len(), 1);
        assert_eq!(first_converged[changed[0]], target[changed[0]]);
    }

    #[test]
    fn tick_cap_ends_scramble_before_budget() {
        let mut timing = TimingConfig::default();
        timing.scramble_max_ticks = 3;
        let sc = script("", &[]);
        let mut h = Harness::new("abcdef", sc.clone());
        h.seq = Sequencer::new(Message::new("abcdef"), &sc, &timing);
        h.start();
        h.run_until(Phase::AwaitingInput);
        h.activate();
        let activated_at = h.now;
        h.run_until(Phase::Converging);
        assert_eq!(h.now - activated_at, Duration::from_millis(40));
        assert!(h.timers.iter().all(|(_, w)| *w == Wake::Tick));
    }

    #[test]
    fn full_run_reaches_done_with_ordered_events() {
        let text = "Hi there\n\u{2800}\u{2800}art\n \u{2800}x";
        let mut h = Harness::new(text, script(">", &["x", "yz"]));
        h.start();
        h.run_until(Phase::AwaitingInput);
        while !h.seq.is_listening() {
            h.fire();
        }
        h.activate();
        h.run_until(Phase::Done);

        assert_eq!(h.screen.main.text(), text);
        assert_eq!(h.screen.epilogue.text(), "x\nyz");
        assert_eq!(h.screen.closing.text(), "end");
        assert_eq!(h.screen.closing.opacity, 1.0);
        assert!(h.timers.is_empty());

        let order = [
            Lifecycle::IntroFinished,
            Lifecycle::PromptReady,
            Lifecycle::DecryptionStarted,
            Lifecycle::ArtRevealed,
            Lifecycle::DecryptionComplete,
            Lifecycle::EpilogueLine { index: 0 },
            Lifecycle::EpilogueLine { index: 1 },
            Lifecycle::ClosingRevealed,
            Lifecycle::EpilogueComplete,
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|e| h.events.iter().position(|x| x == e).expect("missing event"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", h.events);
    }

    #[test]
    fn convergence_reads_back_the_surface() {
        let mut h = Harness::new("abcd", script("", &[]));
        h.start();
        h.run_until(Phase::AwaitingInput);
        h.activate();
        h.run_until(Phase::Converging);
        // Someone else fixes the whole buffer: the next tick notices.
        h.screen.main.set_text("abcd".into());
        h.fire();
        assert!(h.events.contains(&Lifecycle::DecryptionComplete));
    }

    #[test]
    fn epilogue_waits_for_pause_after_convergence() {
        let mut h = Harness::new("ab", script("", &["q"]));
        h.start();
        h.run_until(Phase::AwaitingInput);
        h.activate();
        while !h.events.contains(&Lifecycle::DecryptionComplete) {
            h.fire();
        }
        let done_at = h.now;
        assert_eq!(h.seq.phase(), Phase::Converging);
        h.run_until(Phase::EpilogueTyping);
        assert_eq!(h.now - done_at, Duration::from_millis(1000));
        assert_eq!(h.screen.epilogue.text(), "q");
    }

    #[test]
    fn typing_progress_every_fifty_chars() {
        let text = "x".repeat(120);
        let mut h = Harness::new(&text, script("", &[]));
        h.start();
        h.run_until(Phase::AwaitingInput);
        let progress: Vec<usize> = h
            .events
            .iter()
            .filter_map(|e| match e {
                Lifecycle::TypingProgress { revealed, .. } => Some(*revealed),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![50, 100]);
    }
}
