/// Keyboard input tracker.
///
/// Drains crossterm events once per frame and turns them into [`Command`]s:
///   - Confirm is edge-triggered (holding Enter fires once)
///   - Scroll keys fire on every Press/Repeat, so holding a key keeps scrolling
///
/// Falls back to timeout-based release detection on terminals that don't
/// report Release events.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// After this duration without a Press/Repeat event, consider the key released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Scroll {
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Confirm,
    Quit,
    Scroll(Scroll),
}

/// Map one key event to a command. `None` for keys we don't use.
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
    {
        return Some(Command::Quit);
    }
    let cmd = match key.code {
        KeyCode::Enter | KeyCode::Char(' ') => Command::Confirm,
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Command::Quit,
        KeyCode::Up | KeyCode::Char('k') => Command::Scroll(Scroll::Up),
        KeyCode::Down | KeyCode::Char('j') => Command::Scroll(Scroll::Down),
        KeyCode::PageUp => Command::Scroll(Scroll::PageUp),
        KeyCode::PageDown => Command::Scroll(Scroll::PageDown),
        KeyCode::Home => Command::Scroll(Scroll::Top),
        KeyCode::End => Command::Scroll(Scroll::Bottom),
        KeyCode::Left | KeyCode::Char('h') => Command::Scroll(Scroll::Left),
        KeyCode::Right | KeyCode::Char('l') => Command::Scroll(Scroll::Right),
        _ => return None,
    };
    Some(cmd)
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Commands produced by the most recent drain_events() call.
    commands: Vec<Command>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            commands: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.commands.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind == KeyEventKind::Release {
            if self.honor_release {
                self.last_active.remove(&key.code);
            }
            return;
        }

        let was_held = self.last_active.get(&key.code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false);
        self.last_active.insert(key.code, now);

        match command_for(&key) {
            Some(Command::Confirm) if was_held => {}
            Some(cmd) => self.commands.push(cmd),
            None => {}
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn quit_requested(&self) -> bool {
        self.commands.contains(&Command::Quit)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.commands.contains(&Command::Confirm)
    }
}
