//! Membership of the players currently connected to the arena
//!
//! The registry tracks which players take part in the simulation and in what
//! order. Iteration order is join order, which makes ticks and snapshots
//! deterministic for a given sequence of connections.
//!
//! The registry itself is not synchronized. It lives inside the game state,
//! behind the engine's mutex, so every `add`/`remove` is serialized against
//! a running tick and against snapshot creation for a broadcast.

use crate::player::{Connection, Player, PlayerId};
use log::info;
use shared::Coord;
use std::collections::BTreeMap;

/// Point-in-time copy of one player, usable after the lock is released
#[derive(Debug, Clone)]
pub struct PlayerView {
    pub id: PlayerId,
    pub snake: Vec<Coord>,
    pub nickname: String,
    pub score: u32,
    pub connection: Connection,
}

impl PlayerView {
    pub fn head(&self) -> Option<Coord> {
        self.snake.last().copied()
    }
}

pub struct SessionRegistry {
    /// Players keyed by id. Ids only increase, so key order is join order.
    players: BTreeMap<PlayerId, Player>,
    next_player_id: PlayerId,
    max_players: usize,
}

impl SessionRegistry {
    pub fn new(max_players: usize) -> Self {
        Self {
            players: BTreeMap::new(),
            next_player_id: 1,
            max_players,
        }
    }

    /// Reserves the id for the next player to join.
    pub fn next_id(&mut self) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id = self.next_player_id.wrapping_add(1).max(1);
        id
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    /// Registers a player. Returns false if the arena is full or the id is taken.
    pub fn add(&mut self, player: Player) -> bool {
        if self.is_full() || self.players.contains_key(&player.id) {
            return false;
        }

        info!(
            "Player {} joined from {}",
            player.id, player.connection.source
        );
        self.players.insert(player.id, player);
        true
    }

    /// Unregisters a player, handing back its state.
    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        let player = self.players.remove(&id)?;
        info!(
            "Player {} ({}) left with score {}",
            player.id, player.nickname, player.score
        );
        Some(player)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Ids in iteration order.
    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&Player),
    {
        self.players.values().for_each(f);
    }

    /// True if any body cell of any player covers `cell`.
    pub fn is_occupied(&self, cell: &Coord) -> bool {
        self.players.values().any(|player| player.occupies(cell))
    }

    /// Copies every player so the copy can be used outside the lock.
    pub fn snapshot(&self) -> Vec<PlayerView> {
        self.players
            .values()
            .map(|player| PlayerView {
                id: player.id,
                snake: player.body().iter().copied().collect(),
                nickname: player.nickname.clone(),
                score: player.score,
                connection: player.connection.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::test_connection;

    fn player_at(registry: &mut SessionRegistry, x: i32, y: i32) -> Player {
        let (connection, _rx) = test_connection();
        Player::new(registry.next_id(), Coord::new(x, y), connection)
    }

    #[test]
    fn test_registry_creation() {
        let registry = SessionRegistry::new(5);
        assert_eq!(registry.max_players, 5);
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_ids_increase() {
        let mut registry = SessionRegistry::new(5);
        assert_eq!(registry.next_id(), 1);
        assert_eq!(registry.next_id(), 2);
        assert_eq!(registry.next_id(), 3);
    }

    #[test]
    fn test_add_and_remove() {
        let mut registry = SessionRegistry::new(2);
        let player = player_at(&mut registry, 1, 1);
        let id = player.id;

        assert!(registry.add(player));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(id).is_some());

        let removed = registry.remove(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(registry.is_empty());
        assert!(registry.remove(id).is_none());
    }

    #[test]
    fn test_add_respects_capacity() {
        let mut registry = SessionRegistry::new(1);
        let first = player_at(&mut registry, 1, 1);
        let second = player_at(&mut registry, 2, 2);

        assert!(registry.add(first));
        assert!(registry.is_full());
        assert!(!registry.add(second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut registry = SessionRegistry::new(4);
        let first = player_at(&mut registry, 1, 1);
        let (connection, _rx) = test_connection();
        let clash = Player::new(first.id, Coord::new(3, 3), connection);

        assert!(registry.add(first));
        assert!(!registry.add(clash));
        assert_eq!(registry.get(1).unwrap().head(), Coord::new(1, 1));
    }

    #[test]
    fn test_iteration_follows_join_order() {
        let mut registry = SessionRegistry::new(8);
        for x in 0..5 {
            let player = player_at(&mut registry, x, 0);
            registry.add(player);
        }
        registry.remove(2);

        assert_eq!(registry.ids(), vec![1, 3, 4, 5]);

        let mut heads = Vec::new();
        registry.for_each(|player| heads.push(player.head().x));
        assert_eq!(heads, vec![0, 2, 3, 4]);
    }

    #[test]
    fn test_is_occupied() {
        let mut registry = SessionRegistry::new(4);
        let player = player_at(&mut registry, 10, 10);
        registry.add(player);

        assert!(registry.is_occupied(&Coord::new(10, 10)));
        assert!(!registry.is_occupied(&Coord::new(10, 11)));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut registry = SessionRegistry::new(4);
        let player = player_at(&mut registry, 10, 10);
        let id = player.id;
        registry.add(player);

        let snapshot = registry.snapshot();
        registry.get_mut(id).unwrap().respawn(Coord::new(20, 20));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].head(), Some(Coord::new(10, 10)));
        assert_eq!(snapshot[0].nickname, "Anonymous");
    }
}
