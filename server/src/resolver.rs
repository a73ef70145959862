//! Collision and placement rules
//!
//! Pure functions over the current game state: where a new apple or a
//! respawning snake may go, whether a head landed on an apple, and whether a
//! snake has died. None of these mutate anything; the simulation step in
//! `game` decides what to do with the answers.

use crate::player::{Player, PlayerId};
use crate::registry::SessionRegistry;
use rand::Rng;
use shared::{Coord, GRID_HEIGHT, GRID_WIDTH};
use thiserror::Error;

/// Random samples tried before falling back to an exhaustive scan
pub const MAX_PLACEMENT_ATTEMPTS: usize = 4096;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("no free cell left on the grid")]
    GridFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    OutOfBounds,
    Enemy(PlayerId),
    SelfCollision,
}

/// Finds a cell that is neither part of any snake nor an apple.
pub fn find_free_cell<R: Rng + ?Sized>(
    players: &SessionRegistry,
    apples: &[Coord],
    rng: &mut R,
) -> Result<Coord, PlacementError> {
    find_cell_where(|cell| !apples.contains(cell) && !players.is_occupied(cell), rng)
}

/// Samples cells uniformly until `is_free` accepts one.
///
/// After `MAX_PLACEMENT_ATTEMPTS` misses the grid is scanned row by row, so
/// a nearly saturated grid still yields a cell and only a completely full
/// one fails.
pub fn find_cell_where<F, R>(is_free: F, rng: &mut R) -> Result<Coord, PlacementError>
where
    F: Fn(&Coord) -> bool,
    R: Rng + ?Sized,
{
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let cell = Coord::new(rng.gen_range(0..GRID_WIDTH), rng.gen_range(0..GRID_HEIGHT));
        if is_free(&cell) {
            return Ok(cell);
        }
    }

    (0..GRID_HEIGHT)
        .flat_map(|y| (0..GRID_WIDTH).map(move |x| Coord::new(x, y)))
        .find(|cell| is_free(cell))
        .ok_or(PlacementError::GridFull)
}

/// Index of the apple lying on `cell`, if any.
pub fn apple_at(apples: &[Coord], cell: &Coord) -> Option<usize> {
    apples.iter().position(|apple| apple == cell)
}

/// Decides whether `player` dies given everyone's current bodies.
///
/// Checks run in order: leaving the grid, running into another snake, then
/// running into its own body (the head cell itself excluded).
pub fn death_cause(player: &Player, players: &SessionRegistry) -> Option<DeathCause> {
    let head = player.head();

    if !head.in_bounds() {
        return Some(DeathCause::OutOfBounds);
    }

    if let Some(enemy) = players
        .iter()
        .find(|enemy| enemy.id != player.id && enemy.occupies(&head))
    {
        return Some(DeathCause::Enemy(enemy.id));
    }

    if player.body().iter().rev().skip(1).any(|cell| *cell == head) {
        return Some(DeathCause::SelfCollision);
    }

    None
}
