//! # Dustin-Chain Node
//!
//! Binary entrypoint: install tracing, boot the node, run the slot driver
//! until ctrl-c.

use anyhow::Result;
use node_runtime::{Node, NodeConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = NodeConfig::default();
    if let Ok(data_dir) = std::env::var("DC_DATA_DIR") {
        config.data_dir = data_dir;
    }

    info!("[node] booting dustin-node, data dir {}", config.data_dir);
    let node = Node::boot(&config)?;
    node.driver.start()?;

    tokio::signal::ctrl_c().await?;
    info!("[node] shutdown requested");
    node.driver.stop().await;
    info!("[node] bye");
    Ok(())
}
