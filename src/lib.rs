//! githelp - a friendlier front door to git
//!
//! Tip pages for common subcommands, a guarded add/commit/push, and
//! optional explanations from a local language model.
//!
//! # Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`overlay`] | Loads tip pages from a YAML catalog |
//! | [`render`] | Formats tip pages and the command menu |
//! | [`explain`] | Asks a local backend (`ollama`) to explain text |
//! | [`runner`] | Runs git, repairs a missing push upstream |
//! | [`save`] | The add → commit → push sequence |
//! | [`process`] | The seam every external process goes through |
//! | [`config`] | `.githelp/config.toml` and environment overrides |
//!
//! # Quick Start
//!
//! ```no_run
//! use githelp::{render, OverlayStore};
//!
//! let store = OverlayStore::builtin();
//! match store.load("push") {
//!     Some(record) => print!("{}", render(&record)),
//!     None => println!("{}", githelp::render_not_found("push")),
//! }
//! ```
//!
//! Every external call blocks until the child process exits; there is no
//! timeout on git or on the explanation backend.

pub mod config;
pub mod error;
pub mod explain;
pub mod overlay;
pub mod process;
pub mod render;
pub mod runner;
pub mod save;

pub use config::Config;
pub use error::{Error, Result};
pub use explain::{ExplainMode, Explainer, Explanation, OllamaGateway};
pub use overlay::{OverlayCatalog, OverlayExample, OverlayRecord, OverlayStore};
pub use process::{ProcessLauncher, ProcessOutput, SystemLauncher};
pub use render::{render, render_menu, render_not_found};
pub use runner::{CommandResult, GitRunner};
pub use save::{SaveOptions, SaveOrchestrator, SaveOutcome, SaveStep, TerminalPrompter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify core types are re-exported from crate root
        let store = OverlayStore::builtin();
        assert!(store.load("status").is_some());
        assert_eq!(render_not_found("x"), "githelp tips\n\nNo tips found for 'x'.");
    }
}
