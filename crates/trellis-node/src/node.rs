//! Trellis Node - the main application entry point.
//!
//! Architecture:
//! - Single daemon process with one shared RocksDB store behind the engine
//! - HTTP API for clients (registration, placement, triangle info)
//! - Unix admin socket for local admin ops (trellis-admin CLI)

use crate::admin_socket::AdminSocket;
use crate::api;
use crate::error::{Error, Result};
use crate::storage::RocksStore;
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use trellis_core::{Engine, PlanType};

/// Configuration for a Trellis node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Data directory for storage
    pub data_dir: PathBuf,

    /// HTTP API listen address
    pub api_addr: SocketAddr,

    /// Admin socket path (for trellis-admin CLI)
    pub admin_socket: PathBuf,

    /// Plans written at startup
    pub plans: Vec<(PlanType, Decimal)>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("./trellis-data");
        Self {
            admin_socket: data_dir.join("admin.sock"),
            data_dir,
            api_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            plans: Vec::new(),
        }
    }
}

impl NodeConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = lookup("TRELLIS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let api_addr = match lookup("TRELLIS_API_ADDR") {
            Some(addr) => addr
                .parse()
                .map_err(|e| Error::Config(format!("TRELLIS_API_ADDR {addr:?}: {e}")))?,
            None => defaults.api_addr,
        };

        let admin_socket = lookup("TRELLIS_ADMIN_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("admin.sock"));

        let plans = match lookup("TRELLIS_PLANS") {
            Some(list) => parse_plans(&list)?,
            None => Vec::new(),
        };

        Ok(Self {
            data_dir,
            api_addr,
            admin_socket,
            plans,
        })
    }
}

/// Parse `name=payout,name=payout`.
fn parse_plans(list: &str) -> Result<Vec<(PlanType, Decimal)>> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, payout) = entry
                .split_once('=')
                .ok_or_else(|| Error::Config(format!("plan entry {entry:?} is not name=payout")))?;
            let payout: Decimal = payout
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("plan {name:?} payout: {e}")))?;
            Ok((PlanType::from(name.trim()), payout))
        })
        .collect()
}

/// Shared state for the node - one engine over one store, shared by all components.
pub struct NodeState {
    pub engine: Engine<RocksStore>,
    pub config: NodeConfig,
}

/// A Trellis node instance.
pub struct TrellisNode {
    state: Arc<NodeState>,
}

impl TrellisNode {
    /// Create a new node, opening storage and seeding configured plans.
    pub fn new(config: NodeConfig) -> Result<Self> {
        // Ensure data directory exists
        std::fs::create_dir_all(&config.data_dir)?;

        let store = RocksStore::open(config.data_dir.join("db"))?;
        let engine = Engine::new(store);

        for (plan, payout) in &config.plans {
            engine.put_plan(plan, *payout)?;
        }

        Ok(Self {
            state: Arc::new(NodeState { engine, config }),
        })
    }

    /// Get the shared state (for API handlers and the admin socket).
    pub fn state(&self) -> Arc<NodeState> {
        Arc::clone(&self.state)
    }

    /// Run the node (starts HTTP server and admin socket).
    pub async fn run(self) -> Result<()> {
        let config = &self.state.config;
        tracing::info!("Trellis node starting");
        tracing::info!("  API: http://{}", config.api_addr);
        tracing::info!("  Admin: {:?}", config.admin_socket);
        tracing::info!("  Data: {:?}", config.data_dir);

        // Start admin socket server in background
        let admin_socket = AdminSocket::new(self.state(), config.admin_socket.clone());
        tokio::spawn(async move {
            if let Err(e) = admin_socket.run().await {
                tracing::error!("Admin socket error: {}", e);
            }
        });

        let app = api::build_router(self.state());

        let listener = tokio::net::TcpListener::bind(config.api_addr).await?;
        tracing::info!("HTTP server listening on {}", config.api_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
