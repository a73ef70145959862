use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const GRID_WIDTH: i32 = 100;
pub const GRID_HEIGHT: i32 = 60;
pub const APPLE_COUNT: usize = 20;
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_NICKNAME: &str = "Anonymous";

/// A grid cell. Serialized as a two element `[x, y]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn in_bounds(&self) -> bool {
        (0..GRID_WIDTH).contains(&self.x) && (0..GRID_HEIGHT).contains(&self.y)
    }

    /// The neighbouring cell one step in `direction`. May lie outside the grid.
    pub fn step(&self, direction: Direction) -> Coord {
        let (dx, dy) = direction.delta();
        Coord::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(&self, other: &Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Coord::new(x, y)
    }
}

impl From<Coord> for (i32, i32) {
    fn from(coord: Coord) -> Self {
        (coord.x, coord.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Parses the wire name of a direction. Anything else yields `None`.
    pub fn parse(name: &str) -> Option<Direction> {
        match name {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Inbound message from a client.
///
/// Both fields are optional and unknown fields are ignored. `direction` is
/// kept as a raw string so that an unrecognized value is dropped by the
/// server instead of failing the whole message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, alias = "nick", skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl ClientMessage {
    pub fn direction(direction: Direction) -> Self {
        Self {
            direction: Some(direction.as_str().to_string()),
            nickname: None,
        }
    }

    pub fn nickname(nickname: impl Into<String>) -> Self {
        Self {
            direction: None,
            nickname: Some(nickname.into()),
        }
    }
}

/// Full game state as seen by one recipient.
///
/// `snakes` and `scores` share registry order. `head` is the recipient's own
/// head and is the only field that differs between recipients of one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameFrame {
    pub snakes: Vec<Vec<Coord>>,
    pub apples: Vec<Coord>,
    pub scores: Vec<(String, u32)>,
    pub head: Coord,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub fn decode_client_message(raw: &str) -> Result<ClientMessage, ProtocolError> {
    Ok(serde_json::from_str(raw)?)
}

pub fn encode_client_message(message: &ClientMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

pub fn decode_frame(raw: &str) -> Result<GameFrame, ProtocolError> {
    Ok(serde_json::from_str(raw)?)
}

/// Strips the characters a browser could interpret as markup.
pub fn sanitize_nickname(raw: &str) -> String {
    raw.chars().filter(|c| *c != '<' && *c != '>').collect()
}
