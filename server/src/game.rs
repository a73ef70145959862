use crate::player::{Connection, Player, PlayerId};
use crate::registry::SessionRegistry;
use crate::resolver::{self, DeathCause, PlacementError};
use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{sanitize_nickname, Coord, Direction, APPLE_COUNT};

/// What happened during one simulation step
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub apples_eaten: usize,
    pub deaths: Vec<(PlayerId, DeathCause)>,
}

/// Authoritative arena: every player and every apple.
pub struct GameState {
    pub tick: u64,
    registry: SessionRegistry,
    apples: Vec<Coord>,
    rng: StdRng,
}

impl GameState {
    pub fn new(max_players: usize) -> Self {
        Self::with_rng(max_players, StdRng::from_entropy())
    }

    /// Creates an arena with `APPLE_COUNT` apples placed using `rng`.
    pub fn with_rng(max_players: usize, rng: StdRng) -> Self {
        let mut state = Self::with_apples(max_players, Vec::new(), rng);
        for _ in 0..APPLE_COUNT {
            state.replenish_apple();
        }
        state
    }

    /// Creates an arena with exactly the given apples.
    pub fn with_apples(max_players: usize, apples: Vec<Coord>, rng: StdRng) -> Self {
        Self {
            tick: 0,
            registry: SessionRegistry::new(max_players),
            apples,
            rng,
        }
    }

    pub fn players(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.registry.get(id)
    }

    pub fn apples(&self) -> &[Coord] {
        &self.apples
    }

    /// Places a fresh player on a free cell and registers it.
    ///
    /// Returns `None` if the arena is full or no free cell is left.
    pub fn spawn_player(&mut self, connection: Connection) -> Option<PlayerId> {
        if self.registry.is_full() {
            return None;
        }

        let spawn = match resolver::find_free_cell(&self.registry, &self.apples, &mut self.rng) {
            Ok(cell) => cell,
            Err(err) => {
                error!("Cannot spawn player from {}: {}", connection.source, err);
                return None;
            }
        };

        let id = self.registry.next_id();
        let player = Player::new(id, spawn, connection);
        info!("Spawned player {} at ({}, {})", id, spawn.x, spawn.y);
        self.registry.add(player).then_some(id)
    }

    /// Registers a player with a predetermined body, tail first.
    ///
    /// Used to set up arenas in a known configuration. Returns `None` for an
    /// empty body or a full arena.
    pub fn insert_player(
        &mut self,
        body: &[Coord],
        direction: Direction,
        connection: Connection,
    ) -> Option<PlayerId> {
        let (&first, _) = body.split_first()?;
        if self.registry.is_full() {
            return None;
        }

        let id = self.registry.next_id();
        let mut player = Player::new(id, first, connection);
        player.snake = body.iter().copied().collect();
        player.direction = direction;
        self.registry.add(player).then_some(id)
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        self.registry.remove(id)
    }

    pub fn set_direction(&mut self, id: PlayerId, direction: Direction) -> bool {
        match self.registry.get_mut(id) {
            Some(player) => {
                player.direction = direction;
                true
            }
            None => false,
        }
    }

    pub fn set_nickname(&mut self, id: PlayerId, raw: &str) -> bool {
        match self.registry.get_mut(id) {
            Some(player) => {
                player.nickname = sanitize_nickname(raw);
                info!("Player {} is now known as {:?}", id, player.nickname);
                true
            }
            None => false,
        }
    }

    /// Advances the arena by one tick.
    ///
    /// Every snake moves first, in registry order, eating any apple its new
    /// head lands on. Deaths are then decided against the moved bodies of
    /// everyone, so two heads entering the same cell kill both snakes. Dead
    /// snakes respawn on a single free cell and keep their score.
    pub fn step(&mut self) -> TickReport {
        self.tick += 1;
        let mut report = TickReport::default();
        let ids = self.registry.ids();
        let mut dropped_tails = Vec::with_capacity(ids.len());

        for &id in &ids {
            let Some(player) = self.registry.get_mut(id) else {
                continue;
            };
            let head = player.advance();

            match resolver::apple_at(&self.apples, &head) {
                Some(index) => {
                    self.apples.remove(index);
                    player.score += 1;
                    report.apples_eaten += 1;
                    dropped_tails.push((id, None));
                    debug!("Player {} ate apple at ({}, {})", id, head.x, head.y);
                    self.replenish_apple();
                }
                None => {
                    let tail = player.shrink_tail();
                    dropped_tails.push((id, tail));
                }
            }
        }

        report.deaths = ids
            .iter()
            .filter_map(|&id| {
                let player = self.registry.get(id)?;
                resolver::death_cause(player, &self.registry).map(|cause| (id, cause))
            })
            .collect();

        for &(id, cause) in &report.deaths {
            debug!("Player {} died: {:?}", id, cause);
            let dropped_tail = dropped_tails
                .iter()
                .find(|(tail_owner, _)| *tail_owner == id)
                .and_then(|(_, tail)| *tail);
            self.respawn(id, dropped_tail);
        }

        report
    }

    fn respawn(&mut self, id: PlayerId, dropped_tail: Option<Coord>) {
        let placement = resolver::find_free_cell(&self.registry, &self.apples, &mut self.rng);
        let Some(player) = self.registry.get_mut(id) else {
            return;
        };

        match placement {
            Ok(cell) => player.respawn(cell),
            Err(PlacementError::GridFull) => {
                error!("No room to respawn player {}, keeping previous body", id);
                player.retreat(dropped_tail);
            }
        }
    }

    fn replenish_apple(&mut self) {
        match resolver::find_free_cell(&self.registry, &self.apples, &mut self.rng) {
            Ok(cell) => self.apples.push(cell),
            Err(err) => error!("Cannot place apple: {}", err),
        }
    }
}
