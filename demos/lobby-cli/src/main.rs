//! Minimal lobby walkthrough: connect, authenticate, queue for a small
//! table, and print everything the server tells us.
//!
//! ```text
//! cargo run -p lobby-cli -- [address]
//! ```
//!
//! Environment:
//! - `FELTWIRE_HOST` / `FELTWIRE_PORT` — server to dial (default
//!   localhost:3000)
//! - `RUST_LOG` — log filter, e.g. `RUST_LOG=feltwire=debug`

use std::time::Duration;

use feltwire::{
    ClientConfig, ClientEvent, StaticIdentity, TableClient, TableType,
};
use feltwire_transport::WebSocketConnector;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let address = std::env::args().nth(1).unwrap_or_else(|| "ADDR1".into());
    let host =
        std::env::var("FELTWIRE_HOST").unwrap_or_else(|_| "localhost".into());
    let port = std::env::var("FELTWIRE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let config = ClientConfig::new().with_host(host).with_port(port);
    tracing::info!(url = %config.url(), %address, "starting lobby client");

    let connector = WebSocketConnector::new(&config.host, config.port);
    let (mut client, mut events) = TableClient::start(connector, config);

    client.connect();
    let wallet = StaticIdentity::new(address);
    client
        .authenticate_via(&wallet, Duration::from_secs(10))
        .await?;
    client
        .wait_until(Duration::from_secs(10), |s| s.is_authenticated())
        .await?;
    client.request_match(TableType::Small);

    while let Some(event) = events.recv().await {
        match &event {
            ClientEvent::MatchFound { game } => {
                println!(
                    "matched against {} at the {} table for {}",
                    game.opponent, game.table_type, game.play_in_amount
                );
            }
            ClientEvent::GameStateUpdate { state, data, .. } => {
                println!("game state: {state} {data}");
            }
            ClientEvent::Disconnected { reason } => {
                println!(
                    "disconnected: {}",
                    reason.as_deref().unwrap_or("requested")
                );
            }
            other => println!("{other:?}"),
        }
        if matches!(event, ClientEvent::Disconnected { .. }) {
            break;
        }
    }

    client.shutdown().await;
    Ok(())
}
