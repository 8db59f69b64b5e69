//! Terminal front end: drawing, input and audio.

pub mod gamepad;
pub mod input;
pub mod renderer;
pub mod sound;
pub mod viewport;
