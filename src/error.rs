//! Error types for githelp
//!
//! Only terminal I/O is fatal. Overlay problems collapse into "no tips",
//! backend problems into an [`crate::explain::Explanation`] variant, and git
//! failures into a failed [`crate::runner::CommandResult`].

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read from terminal: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
