//! Viewer command handler.

use anyhow::Result;
use livetree_core::config::Config;
#[cfg(feature = "tui")]
use livetree_core::logging;

#[cfg(feature = "tui")]
pub async fn run(config: Config) -> Result<()> {
    let _guard = logging::init_file(&config)?;
    tracing::info!(feed_url = %config.feed_url, layout = ?config.layout, "starting viewer");
    livetree_tui::run_viewer(config).await
}

#[cfg(not(feature = "tui"))]
pub async fn run(_config: Config) -> Result<()> {
    anyhow::bail!("This build has no viewer. Use `livetree get [PATH]` instead.")
}
