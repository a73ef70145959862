use clap::Parser;
use client::network::{run_bot, BotConfig};
use log::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the server
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:8000/")]
    server: String,

    /// Nickname shown on the scoreboard
    #[arg(short = 'n', long, default_value = "bot")]
    nickname: String,

    /// Number of bots to run concurrently
    #[arg(short = 'b', long, default_value = "1")]
    bots: usize,

    /// Disconnect after this many frames
    #[arg(short = 'f', long)]
    frames: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("Starting {} bot(s) against {}", args.bots, args.server);

    let handles: Vec<_> = (0..args.bots)
        .map(|i| {
            let nickname = if args.bots > 1 {
                format!("{}-{}", args.nickname, i + 1)
            } else {
                args.nickname.clone()
            };
            tokio::spawn(run_bot(BotConfig {
                server_url: args.server.clone(),
                nickname,
                max_frames: args.frames,
            }))
        })
        .collect();

    for handle in handles {
        match handle.await {
            Ok(Ok(stats)) => info!("Bot finished: {:?}", stats),
            Ok(Err(e)) => error!("Bot failed: {}", e),
            Err(e) => error!("Bot task panicked: {}", e),
        }
    }

    Ok(())
}
