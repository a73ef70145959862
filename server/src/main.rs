use clap::Parser;
use log::{error, info};
use server::engine::{spawn_tick_loop, Engine};
use server::network::Server;
use shared::TICK_INTERVAL;
use std::sync::Arc;

/// Main-method of the application.
/// Parses command-line arguments, then starts the tick loop and the WebSocket listener.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "8000")]
        port: u16,
        /// Maximum number of simultaneous players
        #[clap(short, long, default_value = "64")]
        max_players: usize,
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let engine = Arc::new(Engine::new(args.max_players));
    let address = format!("{}:{}", args.host, args.port);
    let server = Server::bind(&address, Arc::clone(&engine)).await?;

    let game_handle = spawn_tick_loop(Arc::clone(&engine), TICK_INTERVAL);
    let server_handle = tokio::spawn(server.run());

    info!(
        "Snake arena running: {} ms ticks, up to {} players",
        TICK_INTERVAL.as_millis(),
        args.max_players
    );

    // Handle shutdown gracefully
    tokio::select! {
        result = server_handle => {
            match result {
                Ok(Err(e)) => error!("Network task failed: {}", e),
                Err(e) => error!("Network task panicked: {}", e),
                Ok(Ok(())) => {}
            }
        }
        result = game_handle => {
            if let Err(e) = result {
                error!("Game loop task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
