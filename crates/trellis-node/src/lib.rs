//! Trellis Node - persistent home for the triangle referral engine.
//!
//! # Architecture
//!
//! - **Storage**: RocksDB-backed [`trellis_core::Store`]
//! - **Node**: configuration and startup
//! - **API**: HTTP endpoints for registration, placement and triangle views
//! - **Admin Socket**: Unix socket for local admin commands (trellis-admin CLI)
//!
//! # Example
//!
//! ```no_run
//! use trellis_node::{NodeConfig, TrellisNode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NodeConfig::from_env()?;
//!     let node = TrellisNode::new(config)?;
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod admin_socket;
pub mod api;
pub mod error;
pub mod node;
pub mod storage;

pub use error::{Error, Result};
pub use node::{NodeConfig, NodeState, TrellisNode};
pub use storage::RocksStore;
