//! Session over a persistent relay channel.
//!
//! Demonstrates:
//! - Connecting a duplex channel to a relay endpoint
//! - Explicit channel lifecycle through the registry
//! - Running the same session operations over a non-HTTP transport
//!
//! Usage:
//!   cargo run --example 002_channel_relay -- --endpoint ws://localhost:9222/relay

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use anyhow::Result;
use common::Args;
use remote_webdriver::{
    By, CapabilitySet, Channel, ChannelExecutor, ChannelId, ChannelRegistry, Session,
};

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_ENDPOINT: &str = "ws://localhost:9222/relay";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== 002: Channel Relay ===\n");

    let endpoint = args.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);

    println!("[Channel] Connecting to {endpoint}...");
    let channel = Channel::connect(endpoint).await?;
    println!("          ✓ Connected\n");

    let registry = Arc::new(ChannelRegistry::new());
    let tab = ChannelId::new(1);
    registry.register(tab, channel);

    let executor = ChannelExecutor::new(Arc::clone(&registry));
    executor.set_active(tab);

    println!("[Session] Negotiating over the relay...");
    let session = Session::builder()
        .executor(Arc::new(executor))
        .capabilities(CapabilitySet::firefox())
        .connect()
        .await?;
    println!("          ✓ Session {} created\n", session.id());

    session.navigate("https://example.com").await?;
    let link = session.find_element(By::css("a")).await?;
    println!("[Page] First link text: {}", session.element_text(&link).await?);

    session.quit().await?;
    registry.unregister(tab);
    println!("\n[Done] Session ended, channel unregistered");
    Ok(())
}
