//! Full-screen live tree viewer for livetree.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, stdout};

use anyhow::Result;
pub use features::{statusline, tree};
use livetree_core::config::Config;
pub use runtime::TuiRuntime;

/// Runs the interactive viewer until the user quits.
pub async fn run_viewer(config: Config) -> Result<()> {
    if !stdout().is_terminal() {
        anyhow::bail!(
            "The viewer requires a terminal.\n\
             Use `livetree get [PATH]` for non-interactive output."
        );
    }

    let mut runtime = TuiRuntime::new(config)?;
    runtime.run()
}
