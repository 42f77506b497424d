//! Unix socket server for admin commands.
//!
//! Provides a local IPC interface for managing plans and seeding triangles.

use crate::error::Result;
use crate::node::NodeState;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use trellis_core::{PlanType, Stats, TriangleQuery};

/// Admin command sent over the socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Create or update a plan
    PutPlan { plan: String, payout: Decimal },
    /// Create an empty triangle for a plan
    CreateTriangle { plan: String },
    /// List open triangles, oldest first
    ListOpen { plan: Option<String> },
    /// Store-wide counters
    Stats,
    /// Ping (health check)
    Ping,
}

/// Response from admin command.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdminResponse {
    Ok { message: String },
    Error { error: String },
    List { items: Vec<String> },
    Stats { stats: Stats },
    Pong,
}

/// Admin socket server.
pub struct AdminSocket {
    state: Arc<NodeState>,
    socket_path: PathBuf,
}

impl AdminSocket {
    /// Create a new admin socket server.
    pub fn new(state: Arc<NodeState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the admin socket server.
    pub async fn run(&self) -> Result<()> {
        // Remove existing socket file if present
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("Admin socket listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, state).await {
                            tracing::error!("Admin connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept admin connection: {}", e);
                }
            }
        }
    }

    /// Get the socket path.
    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }
}

async fn handle_connection(stream: UnixStream, state: Arc<NodeState>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        let response = match serde_json::from_str::<AdminCommand>(&line) {
            Ok(cmd) => {
                let state = Arc::clone(&state);
                tokio::task::spawn_blocking(move || execute_command(cmd, &state))
                    .await
                    .unwrap_or_else(|e| AdminResponse::Error {
                        error: format!("command task failed: {}", e),
                    })
            }
            Err(e) => AdminResponse::Error {
                error: format!("Invalid command: {}", e),
            },
        };

        let response_json = serde_json::to_string(&response)? + "\n";
        writer.write_all(response_json.as_bytes()).await?;
        line.clear();
    }

    Ok(())
}

fn execute_command(cmd: AdminCommand, state: &NodeState) -> AdminResponse {
    let engine = &state.engine;
    match cmd {
        AdminCommand::PutPlan { plan, payout } => {
            match engine.put_plan(&PlanType::from(plan), payout) {
                Ok(plan) => AdminResponse::Ok {
                    message: format!("Plan {} pays {}", plan.plan_type, plan.payout),
                },
                Err(e) => AdminResponse::Error {
                    error: e.to_string(),
                },
            }
        }

        AdminCommand::CreateTriangle { plan } => {
            match engine.create_triangle(&PlanType::from(plan)) {
                Ok(triangle) => AdminResponse::Ok {
                    message: format!("Created triangle {}", triangle.id),
                },
                Err(e) => AdminResponse::Error {
                    error: e.to_string(),
                },
            }
        }

        AdminCommand::ListOpen { plan } => {
            let mut query = TriangleQuery::new().complete(false);
            if let Some(plan) = plan {
                query = query.plan(plan);
            }
            match engine.triangles(&query) {
                Ok(triangles) => AdminResponse::List {
                    items: triangles
                        .into_iter()
                        .map(|t| format!("{} {}", t.id, t.plan_type))
                        .collect(),
                },
                Err(e) => AdminResponse::Error {
                    error: e.to_string(),
                },
            }
        }

        AdminCommand::Stats => match engine.stats() {
            Ok(stats) => AdminResponse::Stats { stats },
            Err(e) => AdminResponse::Error {
                error: e.to_string(),
            },
        },

        AdminCommand::Ping => AdminResponse::Pong,
    }
}

/// Default socket path.
pub fn default_socket_path() -> PathBuf {
    let data_dir = std::env::var("TRELLIS_DATA_DIR").unwrap_or_else(|_| "./trellis-data".to_string());
    PathBuf::from(data_dir).join("admin.sock")
}
