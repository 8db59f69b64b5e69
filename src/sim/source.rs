//! Source-text providers.
//!
//! ## Sources (priority order):
//!   1. `[general].message_file` from config.toml
//!   2. The message embedded in the binary (`assets/message.txt`)
//!
//! The text is trimmed once here; everything downstream treats it as
//! immutable ground truth.

use std::path::PathBuf;

use crate::error::SetupError;

const EMBEDDED_MESSAGE: &str = include_str!("../../assets/message.txt");

pub trait SourceText {
    fn load(&self) -> Result<String, SetupError>;
}

pub struct FileSource {
    pub path: PathBuf,
}

impl SourceText for FileSource {
    fn load(&self) -> Result<String, SetupError> {
        if !self.path.is_file() {
            return Err(SetupError::SourceMissing { path: self.path.clone() });
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|source| SetupError::SourceRead {
            path: self.path.clone(),
            source,
        })?;
        normalize(&raw)
    }
}

pub struct EmbeddedSource;

impl SourceText for EmbeddedSource {
    fn load(&self) -> Result<String, SetupError> {
        normalize(EMBEDDED_MESSAGE)
    }
}

/// Pick the provider for the configured message file.
pub fn from_config(message_file: Option<&PathBuf>) -> Box<dyn SourceText> {
    match message_file {
        Some(path) => Box::new(FileSource { path: path.clone() }),
        None => Box::new(EmbeddedSource),
    }
}

/// CRLF to LF, then trim. Empty text is a setup failure.
fn normalize(raw: &str) -> Result<String, SetupError> {
    let text = raw.replace("\r\n", "\n");
    let text = text.trim();
    if text.is_empty() {
        return Err(SetupError::SourceEmpty);
    }
    Ok(text.to_string())
}
