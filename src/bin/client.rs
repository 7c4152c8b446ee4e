//! Parley Chat Client - Entry Point

use std::env;
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parley::client::{Client, ClientConfig};
use parley::protocol::Language;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_target(false))
        .init();

    let mut args = env::args().skip(1);
    let (server_addr, nickname) = match (args.next(), args.next()) {
        (Some(addr), Some(nickname)) => (addr, nickname),
        _ => {
            eprintln!("Usage: parley-client <host:port> <nickname>");
            return ExitCode::from(2);
        }
    };

    let language = Language::from_str(&env::var("CHAT_LANG").unwrap_or_default());
    let client = Client::new(ClientConfig {
        server_addr,
        nickname,
        language,
    });

    match client.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error connecting to server: {}", e);
            ExitCode::FAILURE
        }
    }
}
