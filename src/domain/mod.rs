//! Pure text algorithms: no timers, no terminal.

pub mod converge;
pub mod glyph;
pub mod message;
pub mod scramble;
pub mod surface;
