//! Simulation engine and its entry points
//!
//! The engine owns the one `GameState` of the process behind a mutex and
//! exposes the four hooks the transport drives: connection opened, message
//! received, connection closed, and tick. Frames are queued while the lock
//! is still held. Queuing is a `try_send` and never waits, and holding the
//! lock keeps every recipient's frames in the order the state changed.

use crate::broadcast::{self, Delivery};
use crate::game::{GameState, TickReport};
use crate::input;
use crate::player::{Connection, PlayerId};
use log::{debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Ticks between periodic statistics log lines
const STATS_EVERY: u64 = 50;

pub struct Engine {
    state: Mutex<GameState>,
}

impl Engine {
    pub fn new(max_players: usize) -> Self {
        Self::from_state(GameState::new(max_players))
    }

    pub fn from_state(state: GameState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Admits a new connection as a player and broadcasts right away.
    ///
    /// Returns `None` when the arena cannot take another player.
    pub async fn on_open(&self, source: String, outbound: mpsc::Sender<String>) -> Option<PlayerId> {
        let mut state = self.state.lock().await;
        let id = state.spawn_player(Connection::new(source, outbound))?;
        broadcast::broadcast(&state.players().snapshot(), state.apples());
        Some(id)
    }

    /// Decodes and applies one inbound text frame. Never fails the caller.
    pub async fn on_message(&self, id: PlayerId, raw: &str) {
        let Ok(message) = input::decode(id, raw) else {
            return;
        };

        let mut state = self.state.lock().await;
        input::apply(&mut state, id, &message);
    }

    pub async fn on_close(&self, id: PlayerId) {
        let mut state = self.state.lock().await;
        state.remove_player(id);
    }

    /// Runs one simulation step and broadcasts the result.
    pub async fn tick(&self) -> (TickReport, Delivery) {
        let mut state = self.state.lock().await;
        let report = state.step();
        let delivery = broadcast::broadcast(&state.players().snapshot(), state.apples());
        (report, delivery)
    }

    pub async fn player_count(&self) -> usize {
        self.state.lock().await.players().len()
    }
}

/// Starts the periodic tick.
///
/// A single task owns the timer, so a tick never overlaps the previous one;
/// ticks missed while one ran long are skipped rather than replayed.
pub fn spawn_tick_loop(engine: Arc<Engine>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval_timer = interval(period);
        interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip the first tick since it fires immediately
        interval_timer.tick().await;

        let mut ticks: u64 = 0;
        loop {
            interval_timer.tick().await;

            let started = Instant::now();
            let (report, delivery) = engine.tick().await;
            let elapsed = started.elapsed();
            ticks += 1;

            if elapsed > period {
                warn!(
                    "Tick {} took {:.1}ms, longer than the {}ms interval",
                    ticks,
                    elapsed.as_secs_f64() * 1000.0,
                    period.as_millis()
                );
            }

            if ticks % STATS_EVERY == 0 {
                debug!(
                    "Tick {}: {} recipients, {} send failures, {} apples eaten, {} deaths, {:.2}ms",
                    ticks,
                    delivery.delivered + delivery.failures.len(),
                    delivery.failures.len(),
                    report.apples_eaten,
                    report.deaths.len(),
                    elapsed.as_secs_f64() * 1000.0
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::{decode_frame, Coord, Direction, APPLE_COUNT};

    fn engine() -> Engine {
        Engine::from_state(GameState::with_rng(8, StdRng::seed_from_u64(21)))
    }

    #[tokio::test]
    async fn test_open_broadcasts_to_everyone() {
        let engine = engine();
        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);

        let first = engine.on_open("10.0.0.1".into(), tx1).await.unwrap();
        let first_frame = decode_frame(&rx1.try_recv().unwrap()).unwrap();
        assert_eq!(first_frame.snakes.len(), 1);
        assert_eq!(first_frame.apples.len(), APPLE_COUNT);

        let second = engine.on_open("10.0.0.2".into(), tx2).await.unwrap();
        assert_ne!(first, second);

        let seen_by_first = decode_frame(&rx1.try_recv().unwrap()).unwrap();
        let seen_by_second = decode_frame(&rx2.try_recv().unwrap()).unwrap();
        assert_eq!(seen_by_first.snakes.len(), 2);
        assert_eq!(seen_by_first.snakes, seen_by_second.snakes);
        assert_eq!(seen_by_second.head, seen_by_second.snakes[1][0]);
        assert_eq!(
            seen_by_second.scores,
            vec![("Anonymous".to_string(), 0), ("Anonymous".to_string(), 0)]
        );
    }

    #[tokio::test]
    async fn test_message_takes_effect_on_next_tick() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut state = GameState::with_apples(8, Vec::new(), StdRng::seed_from_u64(21));
        let id = state
            .insert_player(&[Coord::new(10, 10)], Direction::Up, Connection::new("peer", tx))
            .unwrap();
        let engine = Engine::from_state(state);

        engine.on_message(id, r#"{"direction": "right"}"#).await;
        engine.on_message(id, r#"{"nickname": "<eve>"}"#).await;
        engine.on_message(id, "garbage").await;
        assert!(rx.try_recv().is_err());

        engine.tick().await;
        let frame = decode_frame(&rx.try_recv().unwrap()).unwrap();

        assert_eq!(frame.scores, vec![("eve".to_string(), 0)]);
        assert_eq!(frame.head, Coord::new(11, 10));
        assert_eq!(frame.snakes, vec![vec![Coord::new(11, 10)]]);
    }

    /// Joins racing with ticks on a multi-threaded runtime must not reorder
    /// frames: with no one leaving, the snake count a client sees never drops.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_frames_arrive_in_state_order() {
        let engine = Arc::new(Engine::from_state(GameState::with_rng(
            64,
            StdRng::seed_from_u64(5),
        )));
        let (observer_tx, mut observer_rx) = mpsc::channel(1024);
        engine.on_open("observer".into(), observer_tx).await.unwrap();

        let ticker = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                for _ in 0..100 {
                    engine.tick().await;
                    tokio::task::yield_now().await;
                }
            })
        };
        let joiners: Vec<_> = (0..30)
            .map(|i| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    let (tx, rx) = mpsc::channel(1024);
                    engine.on_open(format!("joiner-{}", i), tx).await.unwrap();
                    rx
                })
            })
            .collect();

        ticker.await.unwrap();
        let mut receivers = Vec::new();
        for joiner in joiners {
            receivers.push(joiner.await.unwrap());
        }

        let mut last_count = 0;
        let mut frames = 0;
        while let Ok(raw) = observer_rx.try_recv() {
            let count = decode_frame(&raw).unwrap().snakes.len();
            assert!(count >= last_count, "saw {} snakes after {}", count, last_count);
            last_count = count;
            frames += 1;
        }
        assert_eq!(last_count, 31);
        assert_eq!(frames, 1 + 100 + 30);
        drop(receivers);
    }

    #[tokio::test]
    async fn test_close_removes_player() {
        let engine = engine();
        let (tx, _rx) = mpsc::channel(8);
        let id = engine.on_open("peer".into(), tx).await.unwrap();
        assert_eq!(engine.player_count().await, 1);

        engine.on_close(id).await;
        assert_eq!(engine.player_count().await, 0);

        let (_, delivery) = engine.tick().await;
        assert_eq!(delivery.delivered, 0);
    }

    #[tokio::test]
    async fn test_dead_connection_does_not_break_tick() {
        let engine = engine();
        let (gone_tx, gone_rx) = mpsc::channel(8);
        let (live_tx, mut live_rx) = mpsc::channel(8);
        engine.on_open("gone".into(), gone_tx).await.unwrap();
        engine.on_open("live".into(), live_tx).await.unwrap();
        drop(gone_rx);
        while live_rx.try_recv().is_ok() {}

        let (_, delivery) = engine.tick().await;

        assert_eq!(delivery.delivered, 1);
        assert_eq!(delivery.failures.len(), 1);
        assert!(live_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_arena_capacity() {
        let engine = Engine::from_state(GameState::with_rng(1, StdRng::seed_from_u64(2)));
        let (tx1, _rx1) = mpsc::channel(8);
        let (tx2, _rx2) = mpsc::channel(8);

        assert!(engine.on_open("a".into(), tx1).await.is_some());
        assert!(engine.on_open("b".into(), tx2).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_loop_runs_periodically() {
        let engine = Arc::new(engine());
        let (tx, mut rx) = mpsc::channel(64);
        engine.on_open("peer".into(), tx).await.unwrap();
        rx.try_recv().unwrap();

        let handle = spawn_tick_loop(Arc::clone(&engine), Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(350)).await;
        handle.abort();

        let mut frames = 0;
        while rx.try_recv().is_ok() {
            frames += 1;
        }
        assert_eq!(frames, 3);
    }
}
