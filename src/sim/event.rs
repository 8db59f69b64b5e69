//! Lifecycle notifications emitted by the sequencer.
//! The frame loop consumes these for audio, scrolling and indicators.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Intro acknowledged; the intro card starts fading.
    IntroFinished,
    /// Emitted every `TYPING_PROGRESS_STRIDE` characters while typing in.
    TypingProgress { revealed: usize, total: usize },
    /// Prompt fully typed; activation is now honored.
    PromptReady,
    DecryptionStarted,
    /// Message region resolved; art is being forced now.
    ArtRevealed,
    DecryptionComplete,
    /// A new epilogue line started.
    EpilogueLine { index: usize },
    ClosingRevealed,
    EpilogueComplete,
}

/// How often typing-in reports progress.
pub const TYPING_PROGRESS_STRIDE: usize = 50;
