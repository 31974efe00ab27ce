//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use livetree_core::config::{self, Layout};

pub mod commands;

#[derive(Parser)]
#[command(name = "livetree")]
#[command(version)]
#[command(about = "Live JSON/YAML tree viewer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    view: ViewArgs,
}

/// Overrides for the viewer; flags win over the config file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Feed URL to poll
    #[arg(long, env = "LIVETREE_URL", value_name = "URL")]
    url: Option<String>,

    /// Address descriptor URL (default: <feed origin>/getServerIp)
    #[arg(long, value_name = "URL")]
    address_url: Option<String>,

    /// Poll interval after a successful fetch, in milliseconds
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Object layout: rows or columns
    #[arg(long)]
    layout: Option<Layout>,

    /// Start with every container collapsed
    #[arg(long)]
    collapsed: bool,
}

impl ViewArgs {
    fn apply(&self, config: &mut config::Config) {
        if let Some(url) = &self.url {
            config.feed_url.clone_from(url);
        }
        if let Some(address_url) = &self.address_url {
            config.address_url = Some(address_url.clone());
        }
        if let Some(interval_ms) = self.interval_ms {
            config.poll_interval_ms = interval_ms;
        }
        if let Some(layout) = self.layout {
            config.layout = layout;
        }
        if self.collapsed {
            config.collapsed = true;
        }
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Open the live viewer (default)
    View {
        #[command(flatten)]
        args: ViewArgs,
    },

    /// Fetch one snapshot and print the value at PATH
    Get {
        /// Feed URL to fetch
        #[arg(long, env = "LIVETREE_URL", value_name = "URL")]
        url: Option<String>,

        /// Print YAML instead of the configured copy format
        #[arg(long)]
        yaml: bool,

        /// Path such as $['a'][0] (default: the whole snapshot)
        #[arg(default_value = "$")]
        path: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Print the config file path
    Path,
    /// Write a commented default config
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
        Some(Commands::Get { url, yaml, path }) => {
            let config = config::Config::load().context("load config")?;
            commands::get::run(config, url.as_deref(), yaml, &path).await
        }
        Some(Commands::View { args }) => view(&args).await,
        None => view(&cli.view).await,
    }
}

async fn view(args: &ViewArgs) -> Result<()> {
    let mut config = config::Config::load().context("load config")?;
    args.apply(&mut config);
    commands::view::run(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_flags_override_config() {
        let cli = Cli::parse_from([
            "livetree",
            "view",
            "--url",
            "http://10.1.1.1:9000/state",
            "--interval-ms",
            "250",
            "--layout",
            "columns",
            "--collapsed",
        ]);
        let Some(Commands::View { args }) = cli.command else {
            panic!("expected view command");
        };

        let mut config = config::Config::default();
        args.apply(&mut config);
        assert_eq!(config.feed_url, "http://10.1.1.1:9000/state");
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.layout, Layout::Columns);
        assert!(config.collapsed);
        assert_eq!(config.retry_interval_ms, 5000);
    }

    #[test]
    fn test_bare_invocation_takes_view_flags() {
        let cli = Cli::parse_from(["livetree", "--layout", "rows"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.view.layout, Some(Layout::Rows));
    }
}
