use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::coordinator::Coordinator;
use server::network;
use tokio::net::TcpListener;

/// Main-method of the application.
/// Parses command-line arguments, binds the listener and serves until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::parse();
    let coordinator = Coordinator::new(config.max_players);

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Rooms hold at most {} players", config.max_players);

    let server_handle = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            if let Err(e) = network::serve(listener, coordinator).await {
                error!("Server stopped: {}", e);
            }
        })
    };

    {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            coordinator
                .broadcast_server_log("Server started; waiting for players...")
                .await;
        });
    }

    tokio::select! {
        result = server_handle => {
            if let Err(e) = result {
                error!("Server task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
