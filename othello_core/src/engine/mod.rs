use crate::logic::board::{Board, Player};
use crate::logic::game::Strategy;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

pub mod config;
pub mod edge;
pub mod edge_table;
pub mod eval;
pub mod search;

/// Proven-win and proven-loss sentinels for search values.
pub const WIN_VALUE: i32 = i32::MAX;
pub const LOSS_VALUE: i32 = -i32::MAX;

/// Square 0 is border, never legal. Strategies return it when they have
/// nothing to play; the driver never asks in that situation, and the
/// boundary validation rejects it if one does anyway.
pub const NO_MOVE: usize = 0;

/// Position scoring from the side to move, at a given ply of the game.
pub trait Evaluator {
    fn evaluate(&self, player: Player, board: &Board, move_number: u32) -> i32;
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SearchStats {
    pub depth: u8,
    pub nodes: u64,
    pub time_ms: u64,
}

/// Uniform choice among the legal moves. Baseline opponent.
pub struct RandomStrategy {
    rng: rand::rngs::ThreadRng,
}

impl RandomStrategy {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for RandomStrategy {
    fn choose_move(&mut self, player: Player, board: &Board, _move_number: u32) -> usize {
        board
            .legal_moves(player)
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(NO_MOVE)
    }
}
