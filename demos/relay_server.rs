//! Standalone signaling relay with an in-memory room store
//!
//! Run with: cargo run --example relay_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example relay_server                    # binds to 0.0.0.0:5000
//!   cargo run --example relay_server localhost          # binds to 127.0.0.1:5000
//!   cargo run --example relay_server 127.0.0.1:5001     # binds to 127.0.0.1:5001
//!
//! On startup one room is created and its code printed; clients join by
//! connecting a WebSocket and sending:
//!
//!   {"event":"join","data":{"code":"<CODE>","displayName":"alice"}}
//!
//! Environment:
//!   HUDDLE_BIND             overrides the bind address
//!   HUDDLE_ALLOWED_ORIGINS  comma-separated Origin allowlist (default: any)
//!   RUST_LOG                tracing filter, e.g. huddle=debug

use std::net::SocketAddr;
use std::sync::Arc;

use huddle::api::RoomService;
use huddle::registry::RoomRegistry;
use huddle::server::{RelayConfig, RelayServer};
use huddle::store::MemoryStore;

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:5000
/// - "localhost:5001" -> 127.0.0.1:5001
/// - "127.0.0.1" -> 127.0.0.1:5000
/// - "0.0.0.0:5000" -> 0.0.0.0:5000
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 5000;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: relay_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:5000)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  relay_server                     # binds to 0.0.0.0:5000");
    eprintln!("  relay_server localhost           # binds to 127.0.0.1:5000");
    eprintln!("  relay_server 127.0.0.1:5001     # binds to 127.0.0.1:5001");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("huddle=debug".parse()?)
                .add_directive("relay_server=debug".parse()?),
        )
        .init();

    let mut config = RelayConfig::from_env();
    if let Some(addr_str) = args.get(1) {
        config = match parse_bind_addr(addr_str) {
            Ok(addr) => config.bind(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        };
    }

    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(RoomRegistry::new(store.clone()));
    let rooms = RoomService::new(store, registry.clone());

    let code = rooms.create().await?;

    println!("Starting signaling relay on {}", config.bind_addr);
    println!();
    println!("=== Join the demo room ===");
    println!("code: {}", code);
    println!("websocat ws://127.0.0.1:{}/", config.bind_addr.port());
    println!(
        "  {{\"event\":\"join\",\"data\":{{\"code\":\"{}\",\"displayName\":\"alice\"}}}}",
        code
    );
    println!();

    let server = RelayServer::new(config, registry);

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    Ok(())
}
