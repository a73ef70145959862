//! Inbound client messages
//!
//! Decodes a raw text frame and applies its fields to the sender's player.
//! Nothing here broadcasts; changes become visible with the next tick.

use crate::game::GameState;
use crate::player::PlayerId;
use log::{debug, warn};
use shared::{decode_client_message, ClientMessage, Direction, ProtocolError};

/// Which fields of a message took effect
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub direction: bool,
    pub nickname: bool,
}

/// Parses a raw frame. Malformed payloads are logged and reported as `Err`.
pub fn decode(player_id: PlayerId, raw: &str) -> Result<ClientMessage, ProtocolError> {
    decode_client_message(raw).map_err(|err| {
        warn!("Discarding message from player {}: {}", player_id, err);
        err
    })
}

/// Applies a decoded message to `player_id`.
///
/// A direction outside the allowed set is ignored without complaint.
pub fn apply(state: &mut GameState, player_id: PlayerId, message: &ClientMessage) -> Applied {
    debug!("Got message from player {}: {:?}", player_id, message);
    let mut applied = Applied::default();

    if let Some(direction) = message.direction.as_deref().and_then(Direction::parse) {
        applied.direction = state.set_direction(player_id, direction);
    }

    if let Some(nickname) = message.nickname.as_deref() {
        applied.nickname = state.set_nickname(player_id, nickname);
    }

    applied
}
