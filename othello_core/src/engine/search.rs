use std::sync::Arc;
use std::time::Instant;

use crate::engine::config::EngineConfig;
use crate::engine::edge_table::EdgeTable;
use crate::engine::eval::IagoEvaluator;
use crate::engine::{Evaluator, SearchStats, LOSS_VALUE, NO_MOVE, WIN_VALUE};
use crate::logic::board::{Board, Player};
use crate::logic::game::Strategy;

/// Value of a finished game from `player`'s side: proven win, proven
/// loss, or a dead draw.
fn final_value(player: Player, board: &Board) -> i32 {
    match board.score(player).signum() {
        1 => WIN_VALUE,
        -1 => LOSS_VALUE,
        _ => 0,
    }
}

/// Move the killer to the front when it is among the legal moves;
/// otherwise the weight-sorted order stands.
fn put_first(killer: Option<usize>, moves: &mut Vec<usize>) {
    let Some(killer) = killer else { return };
    if let Some(pos) = moves.iter().position(|&mv| mv == killer) {
        moves.remove(pos);
        moves.insert(0, killer);
    }
}

struct SearchContext<'a, E: Evaluator> {
    evaluator: &'a E,
    use_killer: bool,
    move_number: u32,
    nodes: u64,
}

impl<E: Evaluator> SearchContext<'_, E> {
    /// Depth-limited alpha-beta from `player`'s side. `arena` holds one
    /// scratch board per remaining ply; each level claims the last slot,
    /// so sibling branches overwrite the same board sequentially and
    /// never alias.
    fn alpha_beta(
        &mut self,
        player: Player,
        board: &Board,
        mut alpha: i32,
        beta: i32,
        depth: u8,
        killer: Option<usize>,
        arena: &mut [Board],
    ) -> (i32, Option<usize>) {
        self.nodes += 1;
        if depth == 0 {
            return (
                self.evaluator.evaluate(player, board, self.move_number),
                None,
            );
        }

        let mut moves = board.legal_moves(player);
        if self.use_killer {
            put_first(killer, &mut moves);
        }

        if moves.is_empty() {
            if !board.any_legal_move(player.opponent()) {
                return (final_value(player, board), None);
            }
            // The turn passes: same board, other side, bounds negated.
            let (rest, _) = split_arena(arena);
            let (value, _) = self.alpha_beta(
                player.opponent(),
                board,
                -beta,
                -alpha,
                depth - 1,
                None,
                rest,
            );
            return (-value, None);
        }

        let mut best_move = moves[0];
        let (rest, scratch) = split_arena(arena);
        // The reply that refuted the weakest sibling so far, handed down
        // to seed pruning in the next branch.
        let mut killer2: Option<usize> = None;
        let mut killer2_value = WIN_VALUE;

        for &mv in &moves {
            if alpha >= beta {
                // The opponent will never let this branch be reached.
                break;
            }
            scratch.clone_from(board);
            scratch.apply_move(mv, player);
            let (child_value, reply) = self.alpha_beta(
                player.opponent(),
                scratch,
                -beta,
                -alpha,
                depth - 1,
                killer2,
                rest,
            );
            let value = -child_value;
            if value > alpha {
                alpha = value;
                best_move = mv;
            }
            if let Some(reply) = reply {
                if value < killer2_value {
                    killer2 = Some(reply);
                    killer2_value = value;
                }
            }
        }

        (alpha, Some(best_move))
    }
}

/// One scratch slot for the current level plus the pool for the levels
/// below. Running out is a programming error: the root sizes the arena to
/// the search depth.
fn split_arena(arena: &mut [Board]) -> (&mut [Board], &mut Board) {
    let (scratch, rest) = arena
        .split_last_mut()
        .expect("scratch board pool exhausted");
    (rest, scratch)
}

/// Alpha-beta searcher over any evaluator. Owns its scratch-board pool,
/// so a single value must not be shared between concurrent searches;
/// separate games get separate strategy values.
pub struct AlphaBetaStrategy<E: Evaluator> {
    config: Arc<EngineConfig>,
    evaluator: E,
    ply_boards: Vec<Board>,
    last_stats: SearchStats,
}

impl<E: Evaluator> AlphaBetaStrategy<E> {
    #[must_use]
    pub fn new(config: Arc<EngineConfig>, evaluator: E) -> Self {
        let depth = config.search_depth.max(1) as usize;
        Self {
            evaluator,
            ply_boards: vec![Board::new(); depth],
            last_stats: SearchStats::default(),
            config,
        }
    }

    #[must_use]
    pub const fn last_stats(&self) -> SearchStats {
        self.last_stats
    }

    /// Full search result: the achievable value and the move that gets
    /// there (`None` only when `player` cannot move at all).
    pub fn search(
        &mut self,
        player: Player,
        board: &Board,
        move_number: u32,
    ) -> (i32, Option<usize>) {
        let depth = self.config.search_depth.max(1);
        let wanted = depth as usize;
        if self.ply_boards.len() < wanted {
            self.ply_boards.resize(wanted, Board::new());
        }
        let start = Instant::now();
        let mut ctx = SearchContext {
            evaluator: &self.evaluator,
            use_killer: self.config.use_killer,
            move_number,
            nodes: 0,
        };
        let (value, best) = ctx.alpha_beta(
            player,
            board,
            LOSS_VALUE,
            WIN_VALUE,
            depth,
            None,
            &mut self.ply_boards[..wanted],
        );
        self.last_stats = SearchStats {
            depth,
            nodes: ctx.nodes,
            time_ms: start.elapsed().as_millis() as u64,
        };
        (value, best)
    }
}

impl AlphaBetaStrategy<IagoEvaluator> {
    /// The full engine: alpha-beta over the Iago evaluation.
    #[must_use]
    pub fn iago(config: Arc<EngineConfig>, edge_table: Arc<EdgeTable>) -> Self {
        Self::new(config.clone(), IagoEvaluator::new(config, edge_table))
    }
}

impl<E: Evaluator> Strategy for AlphaBetaStrategy<E> {
    fn choose_move(&mut self, player: Player, board: &Board, move_number: u32) -> usize {
        let (_, best) = self.search(player, board, move_number);
        best.unwrap_or(NO_MOVE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::eval::WeightedEvaluator;
    use crate::logic::board::{squares, Cell};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn config(depth: u8, use_killer: bool) -> Arc<EngineConfig> {
        Arc::new(EngineConfig {
            search_depth: depth,
            use_killer,
            ..EngineConfig::default()
        })
    }

    /// Plain negamax without pruning or ordering, as the reference.
    fn negamax<E: Evaluator>(
        evaluator: &E,
        player: Player,
        board: &Board,
        depth: u8,
        move_number: u32,
    ) -> i32 {
        if depth == 0 {
            return evaluator.evaluate(player, board, move_number);
        }
        let moves = board.legal_moves(player);
        if moves.is_empty() {
            if !board.any_legal_move(player.opponent()) {
                return final_value(player, board);
            }
            return -negamax(evaluator, player.opponent(), board, depth - 1, move_number);
        }
        let mut best = LOSS_VALUE;
        for mv in moves {
            let mut next = board.clone();
            next.apply_move(mv, player);
            let value = -negamax(evaluator, player.opponent(), &next, depth - 1, move_number);
            best = best.max(value);
        }
        best
    }

    fn random_position(plies: usize, seed: u64) -> (Board, Player) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = Board::new();
        let mut player = Player::Black;
        for _ in 0..plies {
            let moves = board.legal_moves(player);
            let Some(&mv) = moves.choose(&mut rng) else { break };
            board.apply_move(mv, player);
            match board.next_player(player) {
                Some(next) => player = next,
                None => break,
            }
        }
        (board, player)
    }

    #[test]
    fn test_search_finds_legal_opening_move() {
        let mut engine = AlphaBetaStrategy::new(config(3, true), WeightedEvaluator);
        let board = Board::new();
        let (_, best) = engine.search(Player::Black, &board, 1);
        let mv = best.unwrap();
        assert!(board.is_legal(mv, Player::Black));
        assert!(engine.last_stats().nodes > 0);
        assert_eq!(engine.last_stats().depth, 3);
    }

    #[test]
    fn test_alpha_beta_matches_plain_negamax() {
        for seed in 0..6 {
            let (board, player) = random_position(8, seed);
            for depth in 1..=3 {
                let mut engine = AlphaBetaStrategy::new(config(depth, true), WeightedEvaluator);
                let (value, _) = engine.search(player, &board, 9);
                let reference = negamax(&WeightedEvaluator, player, &board, depth, 9);
                assert_eq!(value, reference, "seed {seed} depth {depth}");
            }
        }
    }

    #[test]
    fn test_killer_ordering_preserves_value() {
        for seed in 0..6 {
            let (board, player) = random_position(12, seed);
            let mut with_killer = AlphaBetaStrategy::new(config(4, true), WeightedEvaluator);
            let mut without = AlphaBetaStrategy::new(config(4, false), WeightedEvaluator);
            let (value_k, _) = with_killer.search(player, &board, 13);
            let (value_p, _) = without.search(player, &board, 13);
            assert_eq!(value_k, value_p, "seed {seed}");
        }
    }

    #[test]
    fn test_terminal_positions() {
        // Every square Black: a proven win for Black, loss for White.
        let mut board = Board::new();
        for &sq in squares() {
            board.set_cell(sq, Cell::Black);
        }
        let mut engine = AlphaBetaStrategy::new(config(2, true), WeightedEvaluator);
        assert_eq!(engine.search(Player::Black, &board, 30).0, WIN_VALUE);
        assert_eq!(engine.search(Player::White, &board, 30).0, LOSS_VALUE);

        // An even split with no moves left is a draw.
        let mut board = Board::new();
        for &sq in squares() {
            let cell = if sq % 10 <= 4 { Cell::Black } else { Cell::White };
            board.set_cell(sq, cell);
        }
        assert_eq!(engine.search(Player::Black, &board, 30).0, 0);
    }

    #[test]
    fn test_pass_is_searched_through() {
        // Black to move with no move of his own but White still alive:
        // the search recurses for White and negates.
        let mut board = Board::new();
        for &sq in squares() {
            board.set_cell(sq, Cell::Empty);
        }
        board.set_cell(11, Cell::White);
        board.set_cell(12, Cell::Black);
        // White can bracket at 13; Black has nothing.
        assert!(board.legal_moves(Player::Black).is_empty());
        assert!(!board.legal_moves(Player::White).is_empty());
        let mut engine = AlphaBetaStrategy::new(config(2, true), WeightedEvaluator);
        let (value, best) = engine.search(Player::Black, &board, 10);
        assert_eq!(best, None);
        let reference = negamax(&WeightedEvaluator, Player::Black, &board, 2, 10);
        assert_eq!(value, reference);
    }
}
