//! trellis-admin CLI tool
//!
//! Manages plans and triangles on a running Trellis node.
//!
//! Usage:
//!   trellis-admin put-plan <plan> <payout>
//!   trellis-admin create-triangle <plan>
//!   trellis-admin list-open [plan]
//!   trellis-admin stats
//!   trellis-admin ping

use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use trellis_node::admin_socket::default_socket_path;

/// Admin command sent over the socket.
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum AdminCommand {
    PutPlan { plan: String, payout: String },
    CreateTriangle { plan: String },
    ListOpen { plan: Option<String> },
    Stats,
    Ping,
}

/// Response from admin command.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum AdminResponse {
    Ok { message: String },
    Error { error: String },
    List { items: Vec<String> },
    Stats { stats: serde_json::Value },
    Pong,
}

fn print_usage() {
    eprintln!("trellis-admin - Manage Trellis plans and triangles");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  trellis-admin put-plan <plan> <payout>   Create or update a plan");
    eprintln!("  trellis-admin create-triangle <plan>     Seed an empty triangle");
    eprintln!("  trellis-admin list-open [plan]           List open triangles");
    eprintln!("  trellis-admin stats                      Show store counters");
    eprintln!("  trellis-admin ping                       Check if daemon is running");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TRELLIS_SOCKET  Path to admin socket (default: ./trellis-data/admin.sock)");
}

fn get_socket_path() -> PathBuf {
    std::env::var("TRELLIS_SOCKET")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_socket_path())
}

fn send_command(cmd: AdminCommand) -> Result<AdminResponse, String> {
    let socket_path = get_socket_path();

    let mut stream = UnixStream::connect(&socket_path).map_err(|e| {
        format!(
            "Failed to connect to trellis-node at {:?}: {}\n\
             Is the trellis-node running?",
            socket_path, e
        )
    })?;

    // Send command
    let cmd_json = serde_json::to_string(&cmd).map_err(|e| e.to_string())?;
    writeln!(stream, "{}", cmd_json).map_err(|e| e.to_string())?;

    // Read response
    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader
        .read_line(&mut response_line)
        .map_err(|e| e.to_string())?;

    serde_json::from_str(&response_line).map_err(|e| format!("Invalid response: {}", e))
}

fn require(args: &[String], index: usize, what: &str) -> String {
    match args.get(index) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Error: {} requires a {} argument", args[1], what);
            std::process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let cmd = match args[1].as_str() {
        "put-plan" => AdminCommand::PutPlan {
            plan: require(&args, 2, "plan"),
            payout: require(&args, 3, "payout"),
        },
        "create-triangle" => AdminCommand::CreateTriangle {
            plan: require(&args, 2, "plan"),
        },
        "list-open" => AdminCommand::ListOpen {
            plan: args.get(2).cloned(),
        },
        "stats" => AdminCommand::Stats,
        "ping" => AdminCommand::Ping,
        "-h" | "--help" | "help" => {
            print_usage();
            std::process::exit(0);
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    };

    match send_command(cmd) {
        Ok(response) => match response {
            AdminResponse::Ok { message } => {
                println!("{}", message);
            }
            AdminResponse::Error { error } => {
                eprintln!("Error: {}", error);
                std::process::exit(1);
            }
            AdminResponse::List { items } => {
                if items.is_empty() {
                    println!("(none)");
                } else {
                    for item in items {
                        println!("{}", item);
                    }
                }
            }
            AdminResponse::Stats { stats } => {
                match serde_json::to_string_pretty(&stats) {
                    Ok(text) => println!("{}", text),
                    Err(_) => println!("{}", stats),
                }
            }
            AdminResponse::Pong => {
                println!("pong - trellis-node is running");
            }
        },
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
