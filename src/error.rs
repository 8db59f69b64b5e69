//! Setup failures. Anything here aborts before the first phase starts;
//! once running, the animation has nothing that can fail.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("message file not found: {}", path.display())]
    SourceMissing { path: PathBuf },

    #[error("could not read message file {}: {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("message text is empty")]
    SourceEmpty,

    #[error("terminal unavailable: {0}")]
    Terminal(#[source] io::Error),
}
