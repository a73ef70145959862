//! Server-side player entity
//!
//! A player couples the gameplay attributes of one snake with the outbound
//! half of the connection that controls it. The connection handle is owned
//! by the player for its whole lifetime and dropped together with it, which
//! closes the outbound queue and lets the connection's writer task finish.

use shared::{Coord, Direction, DEFAULT_NICKNAME};
use std::collections::VecDeque;
use thiserror::Error;
use tokio::sync::mpsc;

pub type PlayerId = u32;

/// Why a frame could not be queued for a recipient
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("outbound queue for player {0} is full")]
    QueueFull(PlayerId),
    #[error("connection of player {0} is closed")]
    Closed(PlayerId),
}

/// Outbound capability and diagnostic source of a connection
#[derive(Debug, Clone)]
pub struct Connection {
    /// Remote identifier, either a proxy header value or the peer address
    pub source: String,
    outbound: mpsc::Sender<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, outbound: mpsc::Sender<String>) -> Self {
        Self {
            source: source.into(),
            outbound,
        }
    }

    /// Queues an encoded frame without waiting.
    ///
    /// A full queue means the client is not draining its socket fast enough;
    /// the frame is dropped instead of stalling the broadcaster.
    pub fn try_send(&self, id: PlayerId, frame: String) -> Result<(), SendError> {
        self.outbound.try_send(frame).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SendError::QueueFull(id),
            mpsc::error::TrySendError::Closed(_) => SendError::Closed(id),
        })
    }
}

#[derive(Debug)]
pub struct Player {
    pub id: PlayerId,
    /// Body cells from tail to head. Never empty.
    pub(crate) snake: VecDeque<Coord>,
    pub direction: Direction,
    pub score: u32,
    pub nickname: String,
    pub connection: Connection,
}

impl Player {
    /// Creates a player occupying the single cell `spawn`.
    pub fn new(id: PlayerId, spawn: Coord, connection: Connection) -> Self {
        Self {
            id,
            snake: VecDeque::from([spawn]),
            direction: Direction::default(),
            score: 0,
            nickname: DEFAULT_NICKNAME.to_string(),
            connection,
        }
    }

    pub fn head(&self) -> Coord {
        // The body is never empty, every mutation below preserves that.
        self.snake[self.snake.len() - 1]
    }

    pub fn body(&self) -> &VecDeque<Coord> {
        &self.snake
    }

    pub fn length(&self) -> usize {
        self.snake.len()
    }

    pub fn occupies(&self, cell: &Coord) -> bool {
        self.snake.contains(cell)
    }

    /// Appends the next head in the current direction and returns it.
    pub fn advance(&mut self) -> Coord {
        let next = self.head().step(self.direction);
        self.snake.push_back(next);
        next
    }

    /// Drops the tail cell and returns it. Keeps at least the head.
    pub fn shrink_tail(&mut self) -> Option<Coord> {
        if self.snake.len() > 1 {
            self.snake.pop_front()
        } else {
            None
        }
    }

    /// Replaces the whole body with a single cell. Score is untouched.
    pub fn respawn(&mut self, cell: Coord) {
        self.snake.clear();
        self.snake.push_back(cell);
    }

    /// Undoes the last `advance`, re-attaching the tail it dropped, if any.
    pub(crate) fn retreat(&mut self, dropped_tail: Option<Coord>) {
        if let Some(tail) = dropped_tail {
            self.snake.push_front(tail);
        }
        if self.snake.len() > 1 {
            self.snake.pop_back();
        }
    }
}

#[cfg(test)]
pub(crate) fn test_connection() -> (Connection, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(4);
    (Connection::new("127.0.0.1:9000", tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let (connection, _rx) = test_connection();
        let player = Player::new(1, Coord::new(5, 5), connection);

        assert_eq!(player.id, 1);
        assert_eq!(player.direction, Direction::Up);
        assert_eq!(player.score, 0);
        assert_eq!(player.nickname, "Anonymous");
        assert_eq!(player.length(), 1);
        assert_eq!(player.head(), Coord::new(5, 5));
    }

    #[test]
    fn test_advance_and_shrink() {
        let (connection, _rx) = test_connection();
        let mut player = Player::new(1, Coord::new(5, 5), connection);
        player.direction = Direction::Right;

        let head = player.advance();
        assert_eq!(head, Coord::new(6, 5));
        assert_eq!(player.length(), 2);

        assert_eq!(player.shrink_tail(), Some(Coord::new(5, 5)));
        assert_eq!(player.body().iter().copied().collect::<Vec<_>>(), vec![Coord::new(6, 5)]);

        assert_eq!(player.shrink_tail(), None);
        assert_eq!(player.length(), 1);
    }

    #[test]
    fn test_retreat_undoes_advance() {
        let (connection, _rx) = test_connection();
        let mut player = Player::new(1, Coord::new(5, 5), connection);
        player.direction = Direction::Down;

        player.advance();
        let tail = player.shrink_tail();
        player.retreat(tail);
        assert_eq!(player.body().iter().copied().collect::<Vec<_>>(), vec![Coord::new(5, 5)]);

        player.advance();
        player.retreat(None);
        assert_eq!(player.body().iter().copied().collect::<Vec<_>>(), vec![Coord::new(5, 5)]);
    }

    #[test]
    fn test_respawn_keeps_score() {
        let (connection, _rx) = test_connection();
        let mut player = Player::new(1, Coord::new(5, 5), connection);
        player.score = 7;
        player.advance();
        player.advance();

        player.respawn(Coord::new(40, 40));

        assert_eq!(player.length(), 1);
        assert_eq!(player.head(), Coord::new(40, 40));
        assert_eq!(player.score, 7);
    }

    #[test]
    fn test_try_send_reports_full_and_closed() {
        let (tx, rx) = mpsc::channel(1);
        let connection = Connection::new("peer", tx);

        assert_eq!(connection.try_send(3, "a".into()), Ok(()));
        assert_eq!(connection.try_send(3, "b".into()), Err(SendError::QueueFull(3)));

        drop(rx);
        assert_eq!(connection.try_send(3, "c".into()), Err(SendError::Closed(3)));
    }
}
