//! Trellis Node binary
//!
//! Serves the triangle referral engine over HTTP with a local admin socket.

use trellis_node::{NodeConfig, TrellisNode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trellis_node=info,trellis_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Trellis Node");

    let config = NodeConfig::from_env()?;

    // Create and run node
    let node = TrellisNode::new(config)?;
    node.run().await?;

    Ok(())
}
