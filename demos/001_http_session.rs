//! Session lifecycle against an HTTP driver server.
//!
//! Demonstrates:
//! - Probing endpoint health before creating a session
//! - Capability negotiation
//! - Navigation, element lookup, and inspection
//! - Best-effort teardown
//!
//! Usage:
//!   cargo run --example 001_http_session -- --endpoint http://localhost:4444/wd/hub
//!   cargo run --example 001_http_session -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use anyhow::Result;
use common::Args;
use remote_webdriver::{By, CapabilitySet, HttpExecutor, Session, server_status};

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_ENDPOINT: &str = "http://localhost:4444/wd/hub";

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
    println!("=== 001: HTTP Session ===\n");

    let endpoint = args.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
    let executor = Arc::new(HttpExecutor::new(endpoint)?);

    println!("[Status] Probing {endpoint}...");
    let status = server_status(executor.as_ref()).await?;
    println!("         ✓ Server reachable: {status}\n");

    println!("[Session] Negotiating...");
    let session = Session::builder()
        .executor(executor)
        .capabilities(CapabilitySet::firefox())
        .connect()
        .await?;
    println!("          ✓ Session {} created\n", session.id());

    println!("[Navigate] Loading page...");
    session.navigate("https://example.com").await?;
    println!("           ✓ URL: {}", session.current_url().await?);
    println!("           ✓ Title: {}\n", session.title().await?);

    println!("[Elements] Looking up headings...");
    let headings = session.find_elements(By::css("h1, h2")).await?;
    for heading in &headings {
        println!("           - {}", session.element_text(heading).await?);
    }

    session.quit().await?;
    println!("\n[Done] Session ended");
    Ok(())
}
