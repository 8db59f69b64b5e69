//! Animation timeline: the phase machine and what drives it.

pub mod event;
pub mod scheduler;
pub mod sequencer;
pub mod source;
pub mod stage;
pub mod typewriter;
