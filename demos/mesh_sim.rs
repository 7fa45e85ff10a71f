//! In-process mesh simulation over a real relay
//!
//! Run with: cargo run --example mesh_sim [PARTICIPANTS]
//!
//! Starts a relay on an ephemeral port, creates a room, then joins the
//! requested number of simulated participants (default 3). Each participant
//! speaks the real wire protocol over a real WebSocket; only the media layer
//! is mocked, so the full offer/answer/candidate dance runs without any
//! capture devices. Watch the event log to see the mesh form: with N
//! participants every pair negotiates exactly once, N*(N-1)/2 connections.
//!
//! Environment:
//!   RUST_LOG    tracing filter, e.g. huddle=debug

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use huddle::api::RoomService;
use huddle::client::{MockConnector, Orchestrator, RoomEvent, SignalingClient, TrackKind};
use huddle::registry::RoomRegistry;
use huddle::server::{RelayConfig, RelayServer};
use huddle::store::MemoryStore;

async fn run_participant(name: String, url: String, code: String) {
    let mut signaling = match SignalingClient::connect(&url).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("[{}] connect failed: {}", name, e);
            return;
        }
    };

    let (mut orchestrator, mut events) =
        Orchestrator::new(MockConnector::new(), signaling.sender());
    if let Err(e) = signaling.join(&code, &name).await {
        eprintln!("[{}] join failed: {}", name, e);
        return;
    }

    let reporter_name = name.clone();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                RoomEvent::PeerJoined {
                    remote,
                    display_name,
                } => println!("[{}] sees {} ({})", reporter_name, display_name, remote),
                RoomEvent::PeerConnected { remote } => {
                    println!("[{}] connected to {}", reporter_name, remote)
                }
                RoomEvent::PeerFailed { remote } => {
                    println!("[{}] negotiation failed with {}", reporter_name, remote)
                }
                RoomEvent::PeerLeft { remote } => {
                    println!("[{}] {} left", reporter_name, remote)
                }
                RoomEvent::TrackState { remote, is_sharing } => println!(
                    "[{}] {} {} sharing",
                    reporter_name,
                    remote,
                    if is_sharing { "started" } else { "stopped" }
                ),
                RoomEvent::Chat {
                    display_name,
                    message,
                    ..
                } => println!("[{}] <{}> {}", reporter_name, display_name, message),
                RoomEvent::ServerError { kind, message } => {
                    println!("[{}] relay error {}: {}", reporter_name, kind, message)
                }
            }
        }
    });

    // Let the mesh settle, then demonstrate a track swap and a chat line.
    // `run` only returns when the socket closes, so each phase is bounded
    // by a timeout.
    let settle = Duration::from_millis(500);
    let _ = tokio::time::timeout(settle, orchestrator.run(&mut signaling)).await;

    orchestrator
        .replace_outgoing_track(TrackKind::Video, format!("{}-screen", name))
        .await;
    orchestrator.announce_track_state(true).await;
    let _ = signaling
        .send(huddle::ClientMessage::Chat {
            message: format!("hello from {}", name),
        })
        .await;
    let _ = tokio::time::timeout(Duration::from_secs(2), orchestrator.run(&mut signaling)).await;

    let _ = signaling.leave().await;
    let _ = tokio::time::timeout(settle, orchestrator.run(&mut signaling)).await;
    orchestrator.teardown_all().await;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let participants: usize = std::env::args()
        .nth(1)
        .map(|arg| arg.parse())
        .transpose()?
        .unwrap_or(3);

    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(RoomRegistry::new(store.clone()));
    let rooms = RoomService::new(store, registry.clone());
    let code = rooms.create().await?;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server = Arc::new(RelayServer::new(RelayConfig::default(), registry));
    let server_task = {
        let server = server.clone();
        tokio::spawn(async move {
            if let Err(e) = server.run_on(listener).await {
                eprintln!("relay error: {}", e);
            }
        })
    };

    println!("relay on {}, room {}", addr, code);
    let url = format!("ws://{}/", addr);

    let mut tasks = Vec::new();
    for n in 0..participants {
        let name = format!("sim-{}", n);
        tasks.push(tokio::spawn(run_participant(
            name,
            url.clone(),
            code.clone(),
        )));
        // Stagger joins so the membership events are easy to follow
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    for task in tasks {
        let _ = task.await;
    }
    server_task.abort();
    Ok(())
}
