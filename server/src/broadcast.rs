//! Snapshot encoding and fan-out
//!
//! A snapshot is built once per broadcast from a detached copy of the
//! registry. Each recipient then gets the same snapshot serialized with its
//! own `head`. Frames are queued with `try_send`, so one slow or vanished
//! client costs the broadcaster nothing but a log line.

use crate::player::SendError;
use crate::registry::PlayerView;
use log::{error, warn};
use serde::Serialize;
use shared::{Coord, ProtocolError};

/// Recipient-independent part of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub snakes: Vec<Vec<Coord>>,
    pub apples: Vec<Coord>,
    pub scores: Vec<(String, u32)>,
}

/// Borrowing twin of `shared::GameFrame`, serialized once per recipient.
#[derive(Serialize)]
struct FrameRef<'a> {
    snakes: &'a [Vec<Coord>],
    apples: &'a [Coord],
    scores: &'a [(String, u32)],
    head: Coord,
}

impl Snapshot {
    pub fn encode_for(&self, head: Coord) -> Result<String, ProtocolError> {
        let frame = FrameRef {
            snakes: &self.snakes,
            apples: &self.apples,
            scores: &self.scores,
            head,
        };
        Ok(serde_json::to_string(&frame)?)
    }
}

/// Outcome of one fan-out
#[derive(Debug, Default)]
pub struct Delivery {
    pub delivered: usize,
    pub failures: Vec<SendError>,
}

pub fn build_snapshot(players: &[PlayerView], apples: &[Coord]) -> Snapshot {
    Snapshot {
        snakes: players.iter().map(|player| player.snake.clone()).collect(),
        apples: apples.to_vec(),
        scores: players
            .iter()
            .map(|player| (player.nickname.clone(), player.score))
            .collect(),
    }
}

/// Sends the current state to every player in `players`.
pub fn broadcast(players: &[PlayerView], apples: &[Coord]) -> Delivery {
    let snapshot = build_snapshot(players, apples);
    let mut delivery = Delivery::default();

    for recipient in players {
        let Some(head) = recipient.head() else {
            continue;
        };

        let frame = match snapshot.encode_for(head) {
            Ok(frame) => frame,
            Err(err) => {
                error!("Failed to encode frame for player {}: {}", recipient.id, err);
                continue;
            }
        };

        match recipient.connection.try_send(recipient.id, frame) {
            Ok(()) => delivery.delivered += 1,
            Err(err) => {
                warn!("Error sending state to {}: {}", recipient.connection.source, err);
                delivery.failures.push(err);
            }
        }
    }

    delivery
}
