use crate::logic::board::{is_playable, Board, Player};
use thiserror::Error;

/// A move supplier for one side. Strategies see a copy of the live board
/// through a shared reference and can never mutate real game state; they
/// are only consulted when `player` has at least one legal move.
pub trait Strategy {
    fn choose_move(&mut self, player: Player, board: &Board, move_number: u32) -> usize;
}

/// A strategy proposed a square that is out of range or not legal on the
/// true board. The only recoverable, caller-facing error: the caller
/// decides whether to re-prompt or abort.
#[derive(Debug, Clone, Error)]
#[error("{player} cannot move to square {mv}")]
pub struct IllegalMoveError {
    pub player: Player,
    pub mv: usize,
    /// The board that was shown to the strategy.
    pub board: Board,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub player: Player,
    pub mv: usize,
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub board: Board,
    pub to_move: Option<Player>,
    /// 1-indexed ply count, reset at the start of each game.
    pub move_number: u32,
    pub history: Vec<MoveRecord>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            to_move: Some(Player::Black),
            move_number: 1,
            history: Vec::new(),
        }
    }

    /// Checked move application for the external boundary. Internal search
    /// only ever plays moves it generated and goes through
    /// `Board::apply_move` directly.
    pub fn make_move(&mut self, player: Player, mv: usize) -> Result<(), IllegalMoveError> {
        if !is_playable(mv) || !self.board.is_legal(mv, player) {
            return Err(IllegalMoveError {
                player,
                mv,
                board: self.board.clone(),
            });
        }
        self.board.apply_move(mv, player);
        self.history.push(MoveRecord { player, mv });
        self.to_move = self.board.next_player(player);
        self.move_number += 1;
        Ok(())
    }
}

/// Ask `strategy` for a move and validate it against the true board.
pub fn get_move(
    strategy: &mut dyn Strategy,
    player: Player,
    board: &Board,
    move_number: u32,
) -> Result<usize, IllegalMoveError> {
    let shown = board.clone();
    let mv = strategy.choose_move(player, &shown, move_number);
    if !is_playable(mv) || !board.is_legal(mv, player) {
        return Err(IllegalMoveError {
            player,
            mv,
            board: shown,
        });
    }
    Ok(mv)
}

#[derive(Debug, Clone)]
pub struct GameOutcome {
    pub board: Board,
    pub history: Vec<MoveRecord>,
    /// Black's piece differential on the final board.
    pub score: i32,
}

/// Play one game to completion, alternating turns per `Board::next_player`.
pub fn play(
    black: &mut dyn Strategy,
    white: &mut dyn Strategy,
) -> Result<GameOutcome, IllegalMoveError> {
    let mut state = GameState::new();
    while let Some(player) = state.to_move {
        let strategy: &mut dyn Strategy = match player {
            Player::Black => &mut *black,
            Player::White => &mut *white,
        };
        let mv = get_move(strategy, player, &state.board, state.move_number)?;
        state.make_move(player, mv)?;
    }
    let score = state.board.score(Player::Black);
    Ok(GameOutcome {
        score,
        history: state.history,
        board: state.board,
    })
}
