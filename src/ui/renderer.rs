/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Lay the screen panes out as a document of lines
///   2. Compose the visible window into the `front` buffer
///   3. Compare each cell with `back` (previous frame) and only emit
///      terminal commands for cells that changed, batched with `queue!`
///   4. Swap front/back
///
/// Lines are never wrapped; wide content scrolls horizontally.

use std::io::{self, BufWriter, Write};
use std::ops::Range;
use std::time::Duration;

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::domain::surface::{Pane, Screen, Surface};
use crate::sim::stage::Stage;
use crate::ui::viewport::Viewport;

// ── Palette ──

type Rgb = (u8, u8, u8);

const BASE_BG: Rgb = (22, 22, 35);
const MAIN_FG: Rgb = (80, 255, 80);
const ART_FG: Rgb = (255, 120, 160);
const EPILOGUE_FG: Rgb = (200, 200, 215);
const CLOSING_FG: Rgb = (255, 200, 50);
const TITLE_FG: Rgb = (255, 200, 50);
const HINT_FG: Rgb = (110, 110, 130);

const CURSOR_MARK: char = '▌';
const CURSOR_BLINK: Duration = Duration::from_millis(530);
const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const SPINNER_FRAME: Duration = Duration::from_millis(80);

/// Columns left blank at the left edge of the document.
const MARGIN_X: usize = 2;

fn rgb(c: Rgb) -> Color {
    Color::Rgb { r: c.0, g: c.1, b: c.2 }
}

/// Linear blend from `from` to `to`; `t` is clamped to 0..=1.
fn blend(from: Rgb, to: Rgb, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Color::Rgb { r: mix(from.0, to.0), g: mix(from.1, to.1), b: mix(from.2, to.2) }
}

/// Terminal columns taken by `c`. Control chars and combining or
/// zero-width marks take none.
fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

fn str_width(chars: &[char]) -> usize {
    chars.iter().map(|&c| char_width(c)).sum()
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
    wide: bool, // occupies 2 terminal columns
    cont: bool, // right half of a wide char (skip render)
}

impl Cell {
    /// Explicit background for every cell. Using the same RGB for
    /// `Clear(ClearType::All)` and each cell keeps VTE row gaps invisible.
    const BG: Color = Color::Rgb { r: BASE_BG.0, g: BASE_BG.1, b: BASE_BG.2 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BG, wide: false, cont: false };

    const WIDE_CONT: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BG, wide: false, cont: true };

    /// Differs from any real cell, so every position is diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta, wide: false, cont: false };

    fn new(ch: char, fg: Color) -> Self {
        Cell { ch, fg, wide: char_width(ch) == 2, ..Cell::BLANK }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Draw `chars` on row `y` starting at screen column `x0`, skipping the
    /// first `skip` document columns and stopping after `max_w` columns.
    /// A wide char cut by either edge is left blank.
    fn put_clipped(&mut self, x0: usize, y: usize, chars: &[char], skip: usize, max_w: usize, fg: Color) {
        let end = (x0 + max_w).min(self.width);
        let mut col = 0;
        let mut x = x0;
        for &c in chars {
            let w = char_width(c);
            if w == 0 {
                continue;
            }
            if col + w <= skip {
                col += w;
                continue;
            }
            if col < skip {
                x += col + w - skip;
                col += w;
                continue;
            }
            if x + w > end {
                break;
            }
            self.set(x, y, Cell::new(c, fg));
            if w == 2 {
                self.set(x + 1, y, Cell::WIDE_CONT);
            }
            x += w;
            col += w;
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        let chars: Vec<char> = s.chars().collect();
        let w = self.width.saturating_sub(x);
        self.put_clipped(x, y, &chars, 0, w, fg);
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color) {
        let w = UnicodeWidthStr::width(s);
        let x = self.width.saturating_sub(w) / 2;
        self.put_str(x, y, s, fg);
    }
}

// ── Document layout ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Kind {
    Main,
    Art,
    Epilogue,
    Closing,
    Blank,
}

#[derive(Debug)]
struct Line {
    chars: Vec<char>,
    kind: Kind,
}

fn pane_lines(pane: &Pane, kind: Kind, out: &mut Vec<Line>) {
    for l in pane.text().split('\n') {
        out.push(Line { chars: l.chars().collect(), kind });
    }
}

/// Flatten the three panes into one scrollable document. Main-pane lines
/// in `art` are the art block.
fn layout(screen: &Screen, art: Option<Range<usize>>, cursor_on: bool) -> Vec<Line> {
    let mut doc = Vec::new();

    if !screen.main.text().is_empty() || screen.main.cursor {
        for (i, l) in screen.main.text().split('\n').enumerate() {
            let kind = if art.as_ref().is_some_and(|a| a.contains(&i)) { Kind::Art } else { Kind::Main };
            doc.push(Line { chars: l.chars().collect(), kind });
        }
        if screen.main.cursor && cursor_on {
            if let Some(last) = doc.last_mut() {
                last.chars.push(CURSOR_MARK);
            }
        }
    }

    if !screen.epilogue.text().is_empty() {
        doc.push(Line { chars: Vec::new(), kind: Kind::Blank });
        pane_lines(&screen.epilogue, Kind::Epilogue, &mut doc);
    }

    if !screen.closing.text().is_empty() {
        doc.push(Line { chars: Vec::new(), kind: Kind::Blank });
        pane_lines(&screen.closing, Kind::Closing, &mut doc);
    }

    doc
}

/// What the bottom row should say this frame.
struct Status {
    loading: bool,
    listening: bool,
    finished: bool,
    spinner: char,
}

// ── Compose ──

fn compose_intro(buf: &mut FrameBuffer, opacity: f32) {
    let title = "C I P H E R S C R O L L";
    let lines = [
        (title, TITLE_FG),
        ("", HINT_FG),
        ("An encrypted message is waiting for you.", EPILOGUE_FG),
        ("", HINT_FG),
        ("press Enter / Start to view the message", MAIN_FG),
    ];
    let top = buf.height.saturating_sub(lines.len()) / 2;
    for (i, (text, fg)) in lines.iter().enumerate() {
        buf.put_centered(top + i, text, blend(BASE_BG, *fg, opacity));
    }
}

fn compose_document(buf: &mut FrameBuffer, doc: &[Line], view: &Viewport, closing_opacity: f32, status: &Status) {
    let (view_w, view_h) = view.view_size();

    for row in 0..view_h {
        let Some(line) = doc.get(view.top + row) else { break };
        let fg = match line.kind {
            Kind::Main => rgb(MAIN_FG),
            Kind::Art => rgb(ART_FG),
            Kind::Epilogue => rgb(EPILOGUE_FG),
            Kind::Closing => blend(BASE_BG, CLOSING_FG, closing_opacity),
            Kind::Blank => continue,
        };
        buf.put_clipped(MARGIN_X, row, &line.chars, view.left, view_w, fg);
    }

    if view.overflows_below() && view_h > 0 {
        buf.set(buf.width.saturating_sub(1), view_h - 1, Cell::new('▼', rgb(TITLE_FG)));
    }

    let status_row = buf.height.saturating_sub(1);
    if status.loading {
        let msg = format!("{} decrypting", status.spinner);
        buf.put_str(MARGIN_X, status_row, &msg, rgb(MAIN_FG));
    } else if status.listening {
        buf.put_str(MARGIN_X, status_row, "Enter / Start  decrypt", rgb(HINT_FG));
    } else if status.finished {
        buf.put_str(MARGIN_X, status_row, "Esc / q  quit", rgb(HINT_FG));
    }
    if view.show_h_hint() {
        let hint = "← → scroll";
        let x = buf.width.saturating_sub(hint.chars().count() + 1);
        buf.put_str(x, status_row, hint, rgb(HINT_FG));
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_intro: Option<bool>,
    /// Terminal reports key Release events.
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_intro: None,
            enhanced_keys: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn key_release_supported(&self) -> bool {
        self.enhanced_keys
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.enhanced_keys = false;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Draw one frame. `clock` drives the cursor blink and the spinner.
    pub fn render(&mut self, stage: &Stage, view: &mut Viewport, clock: Duration) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BG), Clear(ClearType::All))?;
        }

        // Bottom row is the status line.
        view.set_view(self.term_w.saturating_sub(MARGIN_X + 1), self.term_h.saturating_sub(1));

        let intro = stage.intro_opacity() > 0.0;
        if self.last_intro != Some(intro) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BG), Clear(ClearType::All))?;
            self.last_intro = Some(intro);
        }

        self.front.clear();

        if intro {
            compose_intro(&mut self.front, stage.intro_opacity());
        } else {
            let cursor_on = (clock.as_millis() / CURSOR_BLINK.as_millis()) % 2 == 0;
            let doc = layout(&stage.screen, stage.art_lines(), cursor_on);
            // Width excludes the blinking cursor so the hint doesn't flicker.
            let content_w = doc.iter()
                .map(|l| str_width(&l.chars) - usize::from(l.chars.last() == Some(&CURSOR_MARK)))
                .max()
                .unwrap_or(0);
            view.set_content(content_w, doc.len());

            let frame = (clock.as_millis() / SPINNER_FRAME.as_millis()) as usize;
            let status = Status {
                loading: stage.loading(),
                listening: stage.is_listening(),
                finished: stage.is_finished(),
                spinner: SPINNER[frame % SPINNER.len()],
            };
            compose_document(&mut self.front, &doc, view, stage.screen.closing.opacity, &status);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Never ResetColor here: the terminal default may differ from BG.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BG))?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }
}
