use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shakmaty::{Color, Piece, Square};

use crate::{
    catalog::{Catalog, Puzzle},
    config::SessionConfig,
    error::SessionError,
    notation::{encode, CoordinateMove},
    rules::{Destination, RulesEngine, ShakmatyRules},
    schedule::{ReplySlot, ReplyTicket, Scheduler},
};

/// Which side is drawn at the bottom of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    White,
    Black,
}

impl From<Color> for Orientation {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Orientation::White,
            Color::Black => Orientation::Black,
        }
    }
}

/// Where the session stands. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The player is to move and moves are being evaluated.
    AwaitingPlayer,
    /// The next ply belongs to the automated side.
    AwaitingReply,
    /// The last puzzle has been passed. No more moves are accepted.
    Exhausted,
}

/// What happened to a move the player tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The move was the expected one and stays on the board.
    Accepted,
    /// Legal, but not the move of the solution line. It was taken back.
    WrongMove,
    /// The rules engine refused the move. Nothing changed.
    IllegalMove,
    /// The session was not waiting for a player move. Nothing changed.
    OutOfTurn,
}

/// The puzzle progression state machine.
///
/// A session walks through a [`Catalog`] one puzzle at a time. The player's
/// moves go through [`Session::attempt_move`]; the automated side's moves are
/// played when the scheduler hands a ticket back to [`Session::fire`].
///
/// The rules engine instance is owned here and never shared. Everything the
/// outside sees of it is a copy: the serialized position, the side to move,
/// single pieces, legal destinations.
pub struct Session<S: Scheduler, R: RulesEngine = ShakmatyRules> {
    catalog: Arc<Catalog>,
    config: SessionConfig,
    active: usize,
    expected: usize,
    board: R,
    orientation: Orientation,
    phase: Phase,
    reply: ReplySlot<S>,
    solved: usize,
}

impl<S: Scheduler, R: RulesEngine> Session<S, R> {
    /// Start at the first puzzle of `catalog`.
    pub fn new(
        catalog: Arc<Catalog>,
        config: SessionConfig,
        scheduler: S,
    ) -> Result<Self, SessionError> {
        let first = catalog.get(0).map_err(|_| out_of_range(&catalog, 0))?;
        let board = R::from_position(first.start_position())?;
        let orientation = first.orientation();

        let mut session = Session {
            catalog,
            config,
            active: 0,
            expected: 0,
            board,
            orientation,
            phase: Phase::AwaitingPlayer,
            reply: ReplySlot::new(scheduler),
            solved: 0,
        };
        session.load_puzzle(0)?;
        Ok(session)
    }

    /// Replace the current puzzle with puzzle `index`, from its starting position.
    ///
    /// Any pending reply is cancelled. When the automated side opens the line,
    /// its first move is armed with the opening delay.
    /// An invalid index is an error and leaves the session untouched.
    pub fn load_puzzle(&mut self, index: usize) -> Result<(), SessionError> {
        let catalog = Arc::clone(&self.catalog);
        let puzzle = catalog
            .get(index)
            .map_err(|_| out_of_range(&catalog, index))?;
        let board = R::from_position(puzzle.start_position())?;

        self.reply.cancel();
        self.board = board;
        self.active = index;
        self.expected = 0;
        self.orientation = puzzle.orientation();

        if puzzle.opens_with_reply() {
            self.reply.arm(self.config.opening_delay());
            self.phase = Phase::AwaitingReply;
        } else {
            self.phase = Phase::AwaitingPlayer;
        }

        tracing::debug!(
            puzzle = index,
            orientation = ?self.orientation,
            phase = ?self.phase,
            "puzzle loaded"
        );
        Ok(())
    }

    /// Try the player's move against the next move of the solution line.
    pub fn attempt_move(&mut self, candidate: CoordinateMove) -> Result<Verdict, SessionError> {
        if self.phase != Phase::AwaitingPlayer {
            return Ok(Verdict::OutOfTurn);
        }

        let catalog = Arc::clone(&self.catalog);
        let puzzle = &catalog[self.active];
        let Some(expected) = puzzle.line().get(self.expected) else {
            return Ok(Verdict::OutOfTurn);
        };

        let Some(played) = self.board.attempt(&candidate) else {
            tracing::debug!(%candidate, "illegal move");
            return Ok(Verdict::IllegalMove);
        };

        if encode(&played, puzzle.notation()) != *expected {
            self.board.undo();
            tracing::debug!(%candidate, %expected, "wrong move taken back");
            return Ok(Verdict::WrongMove);
        }

        self.expected += 1;
        tracing::debug!(%candidate, ply = self.expected, "move accepted");

        if self.expected == puzzle.line().len() {
            self.complete()?;
        } else {
            self.reply.arm(self.config.reply_delay());
            self.phase = Phase::AwaitingReply;
        }
        Ok(Verdict::Accepted)
    }

    /// Called when a reply timer goes off.
    ///
    /// Returns `Ok(false)` and does nothing if `ticket` is no longer the pending
    /// reply (it was cancelled by a reset, an undo or a puzzle change).
    pub fn fire(&mut self, ticket: ReplyTicket) -> Result<bool, SessionError> {
        if !self.reply.claim(ticket) {
            return Ok(false);
        }
        self.play_automated_reply()?;
        Ok(true)
    }

    fn play_automated_reply(&mut self) -> Result<(), SessionError> {
        let catalog = Arc::clone(&self.catalog);
        let puzzle = &catalog[self.active];

        let Some(token) = puzzle.line().get(self.expected) else {
            return self.complete();
        };

        if self.board.play_token(token).is_none() {
            tracing::error!(puzzle = self.active, ply = self.expected, %token, "automated move refused");
            self.phase = Phase::AwaitingPlayer;
            return Err(SessionError::UnplayableToken {
                puzzle: self.active,
                ply: self.expected,
                token: token.to_string(),
            });
        }

        self.expected += 1;
        tracing::debug!(%token, ply = self.expected, "automated reply played");

        if self.expected == puzzle.line().len() {
            self.complete()
        } else {
            self.phase = Phase::AwaitingPlayer;
            Ok(())
        }
    }

    fn complete(&mut self) -> Result<(), SessionError> {
        self.solved += 1;
        tracing::info!(puzzle = self.active, solved = self.solved, "puzzle solved");
        self.advance()
    }

    /// Take back the last half-move on the board.
    ///
    /// Cancels the pending reply. The expectation pointer stays where it is, so
    /// the session only waits for the player again if the next ply is theirs.
    /// Otherwise it stays in [`Phase::AwaitingReply`] with nothing scheduled
    /// until [`Session::reset`].
    ///
    /// Returns `false`, changing nothing, when the session is exhausted or
    /// there was nothing to undo.
    pub fn undo_last_half_move(&mut self) -> bool {
        if self.phase == Phase::Exhausted || !self.board.undo() {
            return false;
        }
        self.reply.cancel();
        self.phase = if self.puzzle().is_player_ply(self.expected) {
            Phase::AwaitingPlayer
        } else {
            Phase::AwaitingReply
        };
        tracing::debug!(ply = self.expected, phase = ?self.phase, "half-move taken back");
        true
    }

    /// Start the active puzzle again. No-op once the catalog is exhausted.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.phase == Phase::Exhausted {
            return Ok(());
        }
        self.load_puzzle(self.active)
    }

    /// Move on to the next puzzle, or to [`Phase::Exhausted`] after the last one.
    pub fn advance(&mut self) -> Result<(), SessionError> {
        if self.phase == Phase::Exhausted {
            return Ok(());
        }
        let next = self.active + 1;
        if next >= self.catalog.len() {
            self.reply.cancel();
            self.phase = Phase::Exhausted;
            tracing::info!(solved = self.solved, "no more puzzles");
            return Ok(());
        }
        self.load_puzzle(next)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_exhausted(&self) -> bool {
        self.phase == Phase::Exhausted
    }

    pub fn puzzle_index(&self) -> usize {
        self.active
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.catalog[self.active]
    }

    /// Index into the solution line of the next half-move to be played, by either side.
    ///
    /// A freshly loaded puzzle whose line opens with the automated side reads
    /// `0` until that opening reply fires, then `1`.
    pub fn expected_move_index(&self) -> usize {
        self.expected
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The current position as a FEN string.
    pub fn position(&self) -> String {
        self.board.position()
    }

    pub fn turn(&self) -> Color {
        self.board.turn()
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board.piece_at(square)
    }

    pub fn legal_destinations(&self, square: Square) -> Vec<Destination> {
        self.board.legal_destinations(square)
    }

    pub fn pending_reply(&self) -> Option<ReplyTicket> {
        self.reply.pending()
    }

    /// Puzzles completed since the session started.
    pub fn solved(&self) -> usize {
        self.solved
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        self.reply.scheduler()
    }
}

fn out_of_range(catalog: &Catalog, index: usize) -> SessionError {
    SessionError::IndexOutOfRange {
        index,
        len: catalog.len(),
    }
}
