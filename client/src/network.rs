use crate::game::{choose_direction, own_state};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::{decode_frame, encode_client_message, ClientMessage, Direction};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

pub type BotError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct BotConfig {
    /// WebSocket URL of the server, e.g. `ws://127.0.0.1:8000/`
    pub server_url: String,
    pub nickname: String,
    /// Stop after this many frames. Runs until the server hangs up otherwise.
    pub max_frames: Option<u64>,
}

/// Summary of one bot session
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BotStats {
    pub frames: u64,
    pub best_score: u32,
    pub longest: usize,
    pub turns: u64,
}

/// Connects one bot and plays until the frame limit or disconnect.
pub async fn run_bot(config: BotConfig) -> Result<BotStats, BotError> {
    let (ws_stream, _) = connect_async(config.server_url.as_str()).await?;
    info!("{} connected to {}", config.nickname, config.server_url);

    let (mut sender, mut receiver) = ws_stream.split();
    let hello = encode_client_message(&ClientMessage::nickname(config.nickname.clone()))?;
    sender.send(Message::Text(hello)).await?;

    let mut stats = BotStats::default();
    let mut direction = Direction::default();

    while let Some(message) = receiver.next().await {
        let text = match message? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let frame = match decode_frame(&text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("{} received an unreadable frame: {}", config.nickname, e);
                continue;
            }
        };
        stats.frames += 1;

        let own = own_state(&frame);
        stats.longest = stats.longest.max(own.length);
        if let Some(score) = own.score {
            if score > stats.best_score {
                info!("{} scored, now at {}", config.nickname, score);
                stats.best_score = score;
            }
        }

        let next = choose_direction(&frame, direction);
        if next != direction {
            debug!("{} turning {}", config.nickname, next.as_str());
            let turn = encode_client_message(&ClientMessage::direction(next))?;
            sender.send(Message::Text(turn)).await?;
            direction = next;
            stats.turns += 1;
        }

        if config.max_frames.is_some_and(|limit| stats.frames >= limit) {
            break;
        }
    }

    let _ = sender.close().await;
    info!(
        "{} done after {} frames: best score {}, longest snake {}",
        config.nickname, stats.frames, stats.best_score, stats.longest
    );
    Ok(stats)
}
