use std::sync::Arc;

use crate::engine::config::EngineConfig;
use crate::engine::edge::{edge_index, EDGES};
use crate::engine::edge_table::EdgeTable;
use crate::engine::Evaluator;
use crate::logic::board::{offset, squares, Board, Cell, Player, DIRECTIONS, SQUARE_WEIGHTS};

/// Edge stability plus current and potential mobility, with coefficients
/// that shift over the course of the game.
pub struct IagoEvaluator {
    config: Arc<EngineConfig>,
    edge_table: Arc<EdgeTable>,
}

impl IagoEvaluator {
    #[must_use]
    pub const fn new(config: Arc<EngineConfig>, edge_table: Arc<EdgeTable>) -> Self {
        Self { config, edge_table }
    }

    /// Current mobility is the number of legal moves; potential mobility
    /// adds the empty squares next to an opponent piece that are not legal
    /// yet. Returns (current, current + potential).
    #[must_use]
    pub fn mobility(player: Player, board: &Board) -> (i32, i32) {
        let opp = player.opponent().cell();
        let mut current = 0;
        let mut potential = 0;
        for &sq in squares() {
            if board.cell(sq) != Cell::Empty {
                continue;
            }
            if board.is_legal(sq, player) {
                current += 1;
            } else if DIRECTIONS.iter().any(|&dir| board.cell(offset(sq, dir)) == opp) {
                potential += 1;
            }
        }
        (current, current + potential)
    }

    /// Table value of all four edges from `player`'s side.
    fn edge_stability(&self, player: Player, board: &Board) -> i32 {
        EDGES
            .iter()
            .map(|edge| self.edge_table.entry(edge_index(player, board, edge)))
            .sum()
    }
}

impl Evaluator for IagoEvaluator {
    fn evaluate(&self, player: Player, board: &Board, move_number: u32) -> i32 {
        let m = i64::from(move_number);
        let c_edge = 312_000 + 6_240 * m;
        let c_current = if move_number < 25 {
            50_000 + 2_000 * m
        } else {
            75_000 + 1_000 * m
        };
        let c_potential = i64::from(self.config.c_potential);

        let (p_current, p_potential) = Self::mobility(player, board);
        let (o_current, o_potential) = Self::mobility(player.opponent(), board);

        let edge = i64::from(self.edge_stability(player, board));

        round_div(c_edge * edge, 32_000)
            + round_div(
                c_current * i64::from(p_current - o_current),
                i64::from(p_current + o_current + 2),
            )
            + round_div(
                c_potential * i64::from(p_potential - o_potential),
                i64::from(p_potential + o_potential + 2),
            )
    }
}

/// Signed sum of the positional weight table. Cheap table-free baseline.
pub struct WeightedEvaluator;

impl Evaluator for WeightedEvaluator {
    fn evaluate(&self, player: Player, board: &Board, _move_number: u32) -> i32 {
        let opp = player.opponent().cell();
        let mut total = 0;
        for &sq in squares() {
            let cell = board.cell(sq);
            if cell == player.cell() {
                total += SQUARE_WEIGHTS[sq];
            } else if cell == opp {
                total -= SQUARE_WEIGHTS[sq];
            }
        }
        total
    }
}

/// Rounding division, halves away from zero.
fn round_div(num: i64, den: i64) -> i32 {
    ((num as f64) / (den as f64)).round() as i32
}
