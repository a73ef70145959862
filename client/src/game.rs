use shared::{Coord, Direction, GameFrame};
use std::collections::HashSet;

/// What the bot knows about itself from one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnState {
    pub head: Coord,
    pub length: usize,
    pub score: Option<u32>,
}

/// Locates the bot's own snake in a frame by matching `head`.
///
/// `snakes` and `scores` share order, so the matching index also yields the
/// score. Two snakes never share a head cell after a tick, so the first
/// match is the right one.
pub fn own_state(frame: &GameFrame) -> OwnState {
    let index = frame
        .snakes
        .iter()
        .position(|snake| snake.last() == Some(&frame.head));

    OwnState {
        head: frame.head,
        length: index.map(|i| frame.snakes[i].len()).unwrap_or(1),
        score: index.and_then(|i| frame.scores.get(i)).map(|(_, score)| *score),
    }
}

/// Greedy steering: move toward the nearest apple without leaving the grid
/// or entering an occupied cell.
///
/// Ties keep the current direction. If every move is fatal the current
/// direction is kept as well.
pub fn choose_direction(frame: &GameFrame, current: Direction) -> Direction {
    let occupied: HashSet<Coord> = frame.snakes.iter().flatten().copied().collect();

    let distance_to_food = |cell: &Coord| {
        frame
            .apples
            .iter()
            .map(|apple| cell.manhattan(apple))
            .min()
            .unwrap_or(0)
    };

    let mut candidates: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|direction| {
            let next = frame.head.step(*direction);
            next.in_bounds() && !occupied.contains(&next)
        })
        .collect();

    // Stable sort, so putting the current direction first makes it win ties.
    candidates.sort_by_key(|direction| *direction != current);
    candidates
        .into_iter()
        .min_by_key(|direction| distance_to_food(&frame.head.step(*direction)))
        .unwrap_or(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{GRID_HEIGHT, GRID_WIDTH};

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    fn frame(snakes: Vec<Vec<Coord>>, apples: Vec<Coord>, head: Coord) -> GameFrame {
        let scores = (0..snakes.len() as u32)
            .map(|i| (format!("p{}", i), i * 10))
            .collect();
        GameFrame {
            snakes,
            apples,
            scores,
            head,
        }
    }

    #[test]
    fn test_own_state_matches_head() {
        let f = frame(vec![vec![c(1, 1)], vec![c(5, 5), c(5, 6)]], vec![], c(5, 6));
        let own = own_state(&f);
        assert_eq!(own.length, 2);
        assert_eq!(own.score, Some(10));
    }

    #[test]
    fn test_own_state_without_match() {
        let f = frame(vec![vec![c(1, 1)]], vec![], c(9, 9));
        let own = own_state(&f);
        assert_eq!(own.length, 1);
        assert_eq!(own.score, None);
    }

    #[test]
    fn test_heads_toward_apple() {
        let f = frame(vec![vec![c(10, 10)]], vec![c(20, 10)], c(10, 10));
        assert_eq!(choose_direction(&f, Direction::Up), Direction::Right);

        let f = frame(vec![vec![c(10, 10)]], vec![c(10, 2)], c(10, 10));
        assert_eq!(choose_direction(&f, Direction::Left), Direction::Up);
    }

    #[test]
    fn test_keeps_direction_on_tie() {
        let f = frame(vec![vec![c(10, 10)]], vec![c(15, 15)], c(10, 10));
        assert_eq!(choose_direction(&f, Direction::Down), Direction::Down);
        assert_eq!(choose_direction(&f, Direction::Right), Direction::Right);
    }

    #[test]
    fn test_avoids_walls() {
        let corner = c(GRID_WIDTH - 1, 0);
        let f = frame(vec![vec![corner]], vec![c(GRID_WIDTH + 5, -5)], corner);
        let chosen = choose_direction(&f, Direction::Up);
        assert!(corner.step(chosen).in_bounds());

        let bottom = c(0, GRID_HEIGHT - 1);
        let f = frame(vec![vec![bottom]], vec![], bottom);
        assert_eq!(choose_direction(&f, Direction::Down), Direction::Up);
    }

    #[test]
    fn test_avoids_bodies() {
        // Apple straight ahead, but another snake is in the way.
        let f = frame(
            vec![vec![c(9, 10), c(10, 10)], vec![c(11, 9), c(11, 10), c(11, 11)]],
            vec![c(15, 10)],
            c(10, 10),
        );
        let chosen = choose_direction(&f, Direction::Right);
        assert_ne!(chosen, Direction::Right);
        assert_ne!(chosen, Direction::Left);
    }

    #[test]
    fn test_trapped_keeps_course() {
        let f = frame(
            vec![vec![c(0, 1), c(0, 0)], vec![c(1, 0), c(1, 1)]],
            vec![c(50, 50)],
            c(0, 0),
        );
        assert_eq!(choose_direction(&f, Direction::Up), Direction::Up);
    }
}
