//! Epilogue typewriter: types a fixed script line by line, then reveals a
//! closing paragraph at once and fades it in.
//!
//! Timeline per line: one char per `char_tick`, then `line_pause` before the
//! next line starts. After the last line: `closing_pause`, reveal,
//! `fade_delay`, `fade_steps` opacity steps, `settle`, done.

use std::time::Duration;

use crate::config::{ScriptConfig, TimingConfig};
use crate::domain::surface::Surface;
use crate::sim::event::Lifecycle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Typing { line: usize, col: usize },
    Closing,
    FadeIn { step: u32 },
    Settle,
    Finished,
}

/// Result of one typewriter tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeTick {
    /// Delay before the next tick; `None` once the epilogue has finished.
    pub next: Option<Duration>,
    pub event: Option<Lifecycle>,
}

#[derive(Clone, Debug)]
pub struct Typewriter {
    lines: Vec<Vec<char>>,
    closing: String,
    typed: Vec<String>,
    state: State,
    char_tick: Duration,
    line_pause: Duration,
    closing_pause: Duration,
    fade_delay: Duration,
    fade_steps: u32,
    fade_step: Duration,
    settle: Duration,
}

impl Typewriter {
    pub fn new(script: &ScriptConfig, timing: &TimingConfig) -> Self {
        Typewriter {
            lines: script.epilogue.iter().map(|l| l.chars().collect()).collect(),
            closing: script.closing.clone(),
            typed: Vec::with_capacity(script.epilogue.len()),
            state: State::Typing { line: 0, col: 0 },
            char_tick: timing.epilogue_char,
            line_pause: timing.epilogue_line_pause,
            closing_pause: timing.closing_pause,
            fade_delay: timing.fade_delay,
            fade_steps: timing.fade_steps,
            fade_step: timing.fade_step,
            settle: timing.settle,
        }
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    pub fn tick(&mut self, lines: &mut dyn Surface, closing: &mut dyn Surface) -> TypeTick {
        match self.state {
            State::Typing { line, .. } if line >= self.lines.len() => {
                self.state = State::Closing;
                wait(self.closing_pause, None)
            }
            State::Typing { line, col } => {
                let mut event = None;
                if col == 0 {
                    self.typed.push(String::new());
                    event = Some(Lifecycle::EpilogueLine { index: line });
                }
                match self.lines[line].get(col) {
                    Some(&c) => {
                        if let Some(current) = self.typed.last_mut() {
                            current.push(c);
                        }
                        lines.set_text(self.typed.join("\n"));
                        self.state = State::Typing { line, col: col + 1 };
                        wait(self.char_tick, event)
                    }
                    None => {
                        // Empty lines still occupy a row.
                        if col == 0 {
                            lines.set_text(self.typed.join("\n"));
                        }
                        self.state = State::Typing { line: line + 1, col: 0 };
                        wait(self.line_pause, event)
                    }
                }
            }
            State::Closing => {
                closing.set_opacity(0.0);
                closing.set_text(self.closing.trim().lines().map(str::trim).collect::<Vec<_>>().join("\n"));
                self.state = State::FadeIn { step: 0 };
                wait(self.fade_delay, Some(Lifecycle::ClosingRevealed))
            }
            State::FadeIn { step } => {
                let step = step + 1;
                if step >= self.fade_steps {
                    closing.set_opacity(1.0);
                    self.state = State::Settle;
                    wait(self.settle, None)
                } else {
                    closing.set_opacity(step as f32 / self.fade_steps as f32);
                    self.state = State::FadeIn { step };
                    wait(self.fade_step, None)
                }
            }
            State::Settle => {
                self.state = State::Finished;
                TypeTick { next: None, event: Some(Lifecycle::EpilogueComplete) }
            }
            State::Finished => TypeTick { next: None, event: None },
        }
    }
}

fn wait(after: Duration, event: Option<Lifecycle>) -> TypeTick {
    TypeTick { next: Some(after), event }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::surface::Pane;

    fn writer(lines: &[&str], closing: &str) -> Typewriter {
        let script = ScriptConfig {
            prompt: String::new(),
            epilogue: lines.iter().map(|s| s.to_string()).collect(),
            closing: closing.into(),
        };
        Typewriter::new(&script, &TimingConfig::default())
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn line_is_finished_and_paused_before_next_starts() {
        let mut tw = writer(&["x", "yz"], "done");
        let mut lines = Pane::new();
        let mut closing = Pane::new();
        let mut frames = Vec::new();
        let mut delays = Vec::new();
        for _ in 0..5 {
            let t = tw.tick(&mut lines, &mut closing);
            frames.push(lines.text().to_string());
            delays.push(t.next.unwrap());
        }
        assert_eq!(frames, vec!["x", "x", "x\ny", "x\nyz", "x\nyz"]);
        assert_eq!(delays, vec![ms(50), ms(800), ms(50), ms(50), ms(800)]);
    }

    #[test]
    fn announces_each_line_start() {
        let mut tw = writer(&["ab", "c"], "");
        let mut lines = Pane::new();
        let mut closing = Pane::new();
        let events: Vec<_> = (0..6)
            .filter_map(|_| tw.tick(&mut lines, &mut closing).event)
            .collect();
        assert_eq!(
            events,
            vec![Lifecycle::EpilogueLine { index: 0 }, Lifecycle::EpilogueLine { index: 1 }]
        );
    }

    #[test]
    fn closing_revealed_at_once_then_faded_in() {
        let mut tw = writer(&["a"], "  one\n   two  ");
        let mut lines = Pane::new();
        let mut closing = Pane::new();
        tw.tick(&mut lines, &mut closing); // 'a'
        tw.tick(&mut lines, &mut closing); // line pause
        let t = tw.tick(&mut lines, &mut closing); // closing pause
        assert_eq!(t.next, Some(ms(1500)));
        assert_eq!(closing.text(), "");

        let t = tw.tick(&mut lines, &mut closing);
        assert_eq!(t.event, Some(Lifecycle::ClosingRevealed));
        assert_eq!(closing.text(), "one\ntwo");
        assert_eq!(closing.opacity, 0.0);

        let mut last = 0.0;
        let mut events = Vec::new();
        while !tw.is_finished() {
            let t = tw.tick(&mut lines, &mut closing);
            assert!(closing.opacity >= last);
            last = closing.opacity;
            events.extend(t.event);
        }
        assert_eq!(closing.opacity, 1.0);
        assert_eq!(events, vec![Lifecycle::EpilogueComplete]);
    }

    #[test]
    fn empty_script_goes_straight_to_closing() {
        let mut tw = writer(&[], "bye");
        let mut lines = Pane::new();
        let mut closing = Pane::new();
        let t = tw.tick(&mut lines, &mut closing);
        assert_eq!(t.next, Some(ms(1500)));
        assert_eq!(lines.text(), "");
        let t = tw.tick(&mut lines, &mut closing);
        assert_eq!(t.event, Some(Lifecycle::ClosingRevealed));
    }

    #[test]
    fn empty_line_keeps_its_row() {
        let mut tw = writer(&["a", "", "b"], "");
        let mut lines = Pane::new();
        let mut closing = Pane::new();
        for _ in 0..5 {
            tw.tick(&mut lines, &mut closing);
        }
        assert_eq!(lines.text(), "a\n\nb");
    }

    #[test]
    fn finished_writer_is_inert() {
        let mut tw = writer(&[], "");
        let mut lines = Pane::new();
        let mut closing = Pane::new();
        while !tw.is_finished() {
            tw.tick(&mut lines, &mut closing);
        }
        assert_eq!(tw.tick(&mut lines, &mut closing), TypeTick { next: None, event: None });
    }
}
