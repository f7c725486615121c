pub mod config;
pub mod core;

use crate::config::{ConfigError, ReaderConfig};
use crate::core::command::FeedReaderCommand;
use crate::core::host::{SystemBrowser, TerminalHost};
use tracing_subscriber::EnvFilter;

pub use crate::core::command::{ItemAction, ReaderState, UiEvent};
pub use crate::core::connectivity::{probe, ConnectivityResult};
pub use crate::core::feed::{fetch_feed, parse_feed_bytes, FeedItem, FetchError};
pub use crate::core::host::{BrowserOpener, Host, PanelReply, PanelRow, ScratchDocument};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Installs the stderr log subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Runs one invocation of the reader against the terminal host.
pub async fn run() -> Result<(), AppError> {
    let config = ReaderConfig::from_env()?;
    tracing::info!(feed_url = %config.feed_url, "starting feed reader");
    let command = FeedReaderCommand::new(config)?;
    let mut host = TerminalHost;
    command.run(&mut host, &SystemBrowser).await;
    Ok(())
}
