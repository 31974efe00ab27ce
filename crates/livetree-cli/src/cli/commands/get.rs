//! One-shot fetch: print the value at a path and exit.

use std::fmt;

use anyhow::{Context, Result};
use livetree_core::config::Config;
use livetree_core::feed::FeedClient;
use livetree_core::logging;
use livetree_core::path::{NodePath, Resolved, resolve};
use livetree_core::snapshot::{CopyFormat, format_copy};
use tracing::debug;

/// The requested path does not exist in the fetched snapshot.
#[derive(Debug)]
pub struct AbsentPathError {
    pub path: NodePath,
}

impl fmt::Display for AbsentPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path {} is absent from the snapshot", self.path.label())
    }
}

impl std::error::Error for AbsentPathError {}

pub async fn run(mut config: Config, url: Option<&str>, yaml: bool, path: &str) -> Result<()> {
    logging::init_stderr(&config)?;
    if let Some(url) = url {
        config.feed_url = url.to_string();
    }

    let path: NodePath = path
        .parse()
        .with_context(|| format!("Invalid path '{path}'"))?;
    let client = FeedClient::from_config(&config)?;
    debug!(url = %client.feed_url(), path = %path.label(), "fetching snapshot");

    let snapshot = client
        .fetch_snapshot()
        .await
        .with_context(|| format!("Failed to fetch {}", client.feed_url()))?;

    let format = if yaml {
        CopyFormat::Yaml
    } else {
        config.copy_format
    };
    match resolve(snapshot.value(), &path) {
        Resolved::Found(value) => {
            let text = format_copy(value, format);
            println!("{}", text.trim_end());
            Ok(())
        }
        Resolved::Absent => Err(AbsentPathError { path }.into()),
    }
}
