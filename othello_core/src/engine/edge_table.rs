use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

use thiserror::Error;

use crate::engine::edge::{
    corner_for, edge_index, is_corner, is_x_square, x_square_for, EDGE_TABLE_SIZE, TOP_EDGE,
};
use crate::logic::board::{Board, Cell, Player};

/// Fixed number of refinement passes; the values are not iterated to
/// convergence.
pub const DEFAULT_REFINE_PASSES: u32 = 5;

const EDGE_ROW_START: usize = 11;
const EDGE_ROW_END: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stability {
    Stable = 0,
    SemiStable = 1,
    Unstable = 2,
}

/// Static score per descriptor position and stability class
/// [stable, semi-stable, unstable]. Corners are always stable and
/// X-squares never are; those slots cannot be reached.
const STATIC_EDGE_SCORES: [[i32; 3]; 10] = [
    [0, 0, -2000],    // X
    [700, 0, 0],      // corner
    [1200, 200, -25], // C
    [1000, 200, 75],  // A
    [1000, 200, 50],  // B
    [1000, 200, 50],  // B
    [1000, 200, 75],  // A
    [1200, 200, -25], // C
    [700, 0, 0],      // corner
    [0, 0, -2000],    // X
];

/// Chance that a non-corner, non-X edge move becomes playable, by
/// (own, opponent) neighbour counts along the edge. A square has two edge
/// neighbours, so counts summing past two cannot occur.
const NEIGHBOR_PROBABILITY: [[f64; 3]; 3] = [
    [0.10, 0.40, 0.70],
    [0.05, 0.30, 0.00],
    [0.01, 0.00, 0.00],
];

#[derive(Debug, Error)]
pub enum TableError {
    #[error("edge table io: {0}")]
    Io(#[from] io::Error),
    #[error("edge table entry {index} is not an integer")]
    Parse { index: usize },
    #[error("edge table holds {found} entries, expected {expected}")]
    Length { found: usize, expected: usize },
}

/// Stability values for all 3^10 occupancies of one edge descriptor.
/// Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeTable {
    values: Box<[i32]>,
}

impl EdgeTable {
    #[must_use]
    pub fn build() -> Self {
        Self::build_with_passes(DEFAULT_REFINE_PASSES)
    }

    #[must_use]
    pub fn build_with_passes(passes: u32) -> Self {
        let mut values = vec![0i32; EDGE_TABLE_SIZE].into_boxed_slice();
        let mut board = Board::new();

        // Seed every configuration with its static stability score.
        for pieces in 0..=TOP_EDGE.len() {
            map_edge_configs(&mut board, &TOP_EDGE, pieces, 0, &mut |board, index| {
                values[index] = static_edge_stability(Player::Black, board);
            });
        }

        // Refine towards long-range estimates, fullest configurations
        // first so later lookups see already-refined values. Full and
        // empty edges keep their static score.
        for pass in 1..=passes {
            for pieces in (1..TOP_EDGE.len()).rev() {
                map_edge_configs(&mut board, &TOP_EDGE, pieces, 0, &mut |board, index| {
                    values[index] =
                        possible_edge_moves_value(&values, Player::Black, board, index);
                });
            }
            log::debug!("edge table refinement pass {pass}/{passes} done");
        }

        Self { values }
    }

    #[must_use]
    pub fn entry(&self, index: usize) -> i32 {
        self.values[index]
    }

    /// Write the table as one whitespace-separated line.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut line = String::with_capacity(EDGE_TABLE_SIZE * 6);
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            line.push_str(&value.to_string());
        }
        line.push('\n');
        fs::write(path, line)
    }

    pub fn load(path: &Path) -> Result<Self, TableError> {
        let text = fs::read_to_string(path)?;
        let mut values = Vec::with_capacity(EDGE_TABLE_SIZE);
        for (index, token) in text.split_whitespace().enumerate() {
            let value = token
                .parse::<i32>()
                .map_err(|_| TableError::Parse { index })?;
            values.push(value);
        }
        if values.len() != EDGE_TABLE_SIZE {
            return Err(TableError::Length {
                found: values.len(),
                expected: EDGE_TABLE_SIZE,
            });
        }
        Ok(Self {
            values: values.into_boxed_slice(),
        })
    }

    /// Load the cached table, or rebuild and cache it. A missing or
    /// corrupt cache is never fatal.
    #[must_use]
    pub fn load_or_build(path: &Path) -> Self {
        match Self::load(path) {
            Ok(table) => {
                log::info!("loaded edge table from {}", path.display());
                table
            }
            Err(TableError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                log::info!("no edge table at {}, building it", path.display());
                Self::rebuild_at(path)
            }
            Err(err) => {
                log::warn!("rebuilding edge table, {} is unusable: {err}", path.display());
                Self::rebuild_at(path)
            }
        }
    }

    fn rebuild_at(path: &Path) -> Self {
        let start = Instant::now();
        let table = Self::build();
        log::info!("edge table built in {:?}", start.elapsed());
        if let Err(err) = table.save(path) {
            log::warn!("could not cache edge table at {}: {err}", path.display());
        }
        table
    }
}

/// Visit every assignment of exactly `pieces` pieces to the remaining
/// descriptor squares, threading the base-3 index along. The board is
/// restored on the way back up, so the caller's board is untouched when
/// this returns.
fn map_edge_configs<F>(board: &mut Board, edge: &[usize], pieces: usize, index: usize, visit: &mut F)
where
    F: FnMut(&Board, usize),
{
    if edge.len() < pieces {
        return;
    }
    let Some((&sq, rest)) = edge.split_first() else {
        visit(board, index);
        return;
    };
    let index3 = index * 3;
    map_edge_configs(board, rest, pieces, index3, visit);
    if pieces > 0 && board.cell(sq) == Cell::Empty {
        board.set_cell(sq, Cell::Black);
        map_edge_configs(board, rest, pieces - 1, index3 + 1, visit);
        board.set_cell(sq, Cell::White);
        map_edge_configs(board, rest, pieces - 1, index3 + 2, visit);
        board.set_cell(sq, Cell::Empty);
    }
}

/// Sum of signed per-piece stability scores over the canonical edge.
fn static_edge_stability(player: Player, board: &Board) -> i32 {
    let mut total = 0;
    for (pos, &sq) in TOP_EDGE.iter().enumerate() {
        let cell = board.cell(sq);
        if cell == Cell::Empty {
            continue;
        }
        let score = STATIC_EDGE_SCORES[pos][piece_stability(board, sq) as usize];
        if cell == player.cell() {
            total += score;
        } else {
            total -= score;
        }
    }
    total
}

fn piece_stability(board: &Board, sq: usize) -> Stability {
    if is_corner(sq) {
        return Stability::Stable;
    }
    if let Some(corner) = corner_for(sq) {
        // An X-square holds as long as its corner is taken.
        return if board.cell(corner) == Cell::Empty {
            Stability::Unstable
        } else {
            Stability::SemiStable
        };
    }

    let own = board.cell(sq);
    let opp = match own {
        Cell::Black => Cell::White,
        Cell::White => Cell::Black,
        Cell::Empty | Cell::Outer => unreachable!("stability of an unoccupied square"),
    };

    // First cell that is not ours, scanning outward each way along the
    // edge row.
    let ahead = (sq + 1..=EDGE_ROW_END)
        .map(|s| board.cell(s))
        .find(|&cell| cell != own);
    let behind = (EDGE_ROW_START..sq)
        .rev()
        .map(|s| board.cell(s))
        .find(|&cell| cell != own);
    let row_has_empty =
        (EDGE_ROW_START..=EDGE_ROW_END).any(|s| board.cell(s) == Cell::Empty);

    match (ahead, behind) {
        // An opponent flank behind an adjacent empty cell captures at once.
        (Some(Cell::Empty), Some(b)) if b == opp => Stability::Unstable,
        (Some(a), Some(Cell::Empty)) if a == opp => Stability::Unstable,
        (Some(a), Some(b)) if a == opp && b == opp && row_has_empty => Stability::SemiStable,
        (Some(Cell::Empty), Some(Cell::Empty)) => Stability::SemiStable,
        _ => Stability::Stable,
    }
}

/// Estimated chance that `player` gets to play `sq` on this edge.
fn edge_move_probability(player: Player, board: &Board, sq: usize) -> f64 {
    if is_x_square(sq) {
        return 0.5;
    }
    if board.is_legal(sq, player) {
        return 1.0;
    }
    if let Some(x_sq) = x_square_for(sq) {
        // A corner falls by way of its X-square.
        return match board.cell(x_sq) {
            Cell::Empty => 0.1,
            cell if cell == player.cell() => 0.001,
            _ => 0.9,
        };
    }
    let own = count_edge_neighbors(player, board, sq);
    let opp = count_edge_neighbors(player.opponent(), board, sq);
    let probability = NEIGHBOR_PROBABILITY[own][opp];
    if board.is_legal(sq, player.opponent()) {
        probability / 2.0
    } else {
        probability
    }
}

fn count_edge_neighbors(player: Player, board: &Board, sq: usize) -> usize {
    [sq - 1, sq + 1]
        .iter()
        .filter(|&&neighbor| board.cell(neighbor) == player.cell())
        .count()
}

/// Fold the current entry and every hypothetical edge move into one value:
/// the mover takes the best option still open, with diminishing odds that
/// a better one remains available.
fn possible_edge_moves_value(values: &[i32], player: Player, board: &Board, index: usize) -> i32 {
    let mut possibilities = vec![(1.0, values[index])];
    for &sq in &TOP_EDGE {
        if board.cell(sq) == Cell::Empty {
            let mut next = board.clone();
            next.apply_move(sq, player);
            let value = -values[edge_index(player.opponent(), &next, &TOP_EDGE)];
            possibilities.push((edge_move_probability(player, board, sq), value));
        }
    }
    combine_edge_moves(possibilities)
}

fn combine_edge_moves(mut possibilities: Vec<(f64, i32)>) -> i32 {
    possibilities.sort_by(|a, b| b.1.cmp(&a.1));
    let mut remaining = 1.0;
    let mut value = 0.0;
    for (probability, pair_value) in possibilities {
        if remaining < 0.0 {
            break;
        }
        value += remaining * probability * f64::from(pair_value);
        remaining -= remaining * probability;
    }
    value.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::board::squares;

    fn edge_board(pieces: &[(usize, Cell)]) -> Board {
        let mut board = Board::new();
        for &sq in squares() {
            board.set_cell(sq, Cell::Empty);
        }
        for &(sq, cell) in pieces {
            board.set_cell(sq, cell);
        }
        board
    }

    #[test]
    fn test_static_corner_is_stable() {
        let board = edge_board(&[(11, Cell::Black)]);
        assert_eq!(static_edge_stability(Player::Black, &board), 700);
        assert_eq!(static_edge_stability(Player::White, &board), -700);
    }

    #[test]
    fn test_static_x_square() {
        // Exposed X-square: unstable.
        let board = edge_board(&[(22, Cell::Black)]);
        assert_eq!(static_edge_stability(Player::Black, &board), -2000);
        // Backed by its corner: semi-stable, worth nothing either way.
        let board = edge_board(&[(22, Cell::Black), (11, Cell::Black)]);
        assert_eq!(static_edge_stability(Player::Black, &board), 700);
    }

    #[test]
    fn test_static_inner_classification() {
        // Black A-square at 13 with an empty cell ahead and a White flank
        // behind is unstable (75); the White C-piece at 12 is itself
        // unstable (-25) and counts against Black with flipped sign.
        let board = edge_board(&[(12, Cell::White), (13, Cell::Black)]);
        assert_eq!(static_edge_stability(Player::Black, &board), 75 + 25);
    }

    #[test]
    fn test_static_full_edge() {
        let own: Vec<(usize, Cell)> = TOP_EDGE.iter().map(|&sq| (sq, Cell::Black)).collect();
        let board = edge_board(&own);
        // 2 corners + 2 C + 2 A + 2 B, all stable; X-squares semi, worth 0.
        assert_eq!(static_edge_stability(Player::Black, &board), 7800);
        assert_eq!(static_edge_stability(Player::White, &board), -7800);
    }

    #[test]
    fn test_move_probabilities() {
        let board = edge_board(&[]);
        // Corner behind an empty X-square.
        assert!((edge_move_probability(Player::Black, &board, 11) - 0.1).abs() < 1e-9);
        // X-squares are a coin flip.
        assert!((edge_move_probability(Player::Black, &board, 22) - 0.5).abs() < 1e-9);
        // Lone interior square, no neighbours.
        assert!((edge_move_probability(Player::Black, &board, 14) - 0.1).abs() < 1e-9);

        let board = edge_board(&[(13, Cell::White)]);
        // One opponent neighbour, not legal for either side.
        assert!((edge_move_probability(Player::Black, &board, 14) - 0.4).abs() < 1e-9);

        let board = edge_board(&[(11, Cell::White)]);
        // The X-square stays a coin flip whatever its corner holds.
        assert!((edge_move_probability(Player::Black, &board, 22) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_combine_edge_moves() {
        assert_eq!(combine_edge_moves(vec![(1.0, 100)]), 100);
        // Best option first: half the time the 200 lands, the rest decays
        // into the certain 0.
        assert_eq!(combine_edge_moves(vec![(0.5, 200), (1.0, 0)]), 100);
        assert_eq!(combine_edge_moves(vec![(1.0, -40), (0.5, -200)]), -40);
    }

    #[test]
    fn test_static_seed_pass() {
        let table = EdgeTable::build_with_passes(0);
        assert_eq!(table.entry(0), 0);
        assert_eq!(table.entry((EDGE_TABLE_SIZE - 1) / 2), 7800);
        assert_eq!(table.entry(EDGE_TABLE_SIZE - 1), -7800);
    }
}
