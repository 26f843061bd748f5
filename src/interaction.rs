use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shakmaty::{Role, Square};

use crate::{
    error::SessionError,
    notation::CoordinateMove,
    rules::{RulesEngine, ShakmatyRules},
    schedule::{ReplyTicket, Scheduler},
    session::{Orientation, Phase, Session, Verdict},
};

/// Something the user did on the board view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    Click {
        #[serde(with = "crate::chess_serde::square_serde")]
        square: Square,
    },
    /// A piece dragged from one square to another.
    /// `piece` is the view's label of the piece, such as `wP` or `bQ`.
    Drop {
        #[serde(with = "crate::chess_serde::square_serde")]
        from: Square,
        #[serde(with = "crate::chess_serde::square_serde")]
        to: Square,
        piece: String,
    },
    Reset,
    Undo,
    /// Give up on the current puzzle and go to the next one.
    Skip,
}

/// How a square is highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquareStyle {
    Selected,
    Capture,
    Quiet,
}

impl SquareStyle {
    /// CSS background for web boards.
    pub fn background(self) -> &'static str {
        match self {
            SquareStyle::Selected => "rgba(255, 255, 0, 0.4)",
            SquareStyle::Capture => "radial-gradient(circle, rgba(0,0,0,.1) 85%, transparent 85%)",
            SquareStyle::Quiet => "radial-gradient(circle, rgba(0,0,0,.1) 25%, transparent 25%)",
        }
    }
}

/// Everything the board view needs to draw the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub position: String,
    pub orientation: Orientation,
    #[serde(with = "crate::chess_serde::square_map_serde")]
    pub highlights: BTreeMap<Square, SquareStyle>,
    /// Outcome of the last move the user tried, until the next event.
    pub feedback: Option<Verdict>,
    pub puzzle: usize,
    pub puzzles: usize,
    pub solved: usize,
    pub phase: Phase,
}

/// A session plus the transient input state of the view driving it.
pub struct Interaction<S: Scheduler, R: RulesEngine = ShakmatyRules> {
    session: Session<S, R>,
    selection: Option<Square>,
    feedback: Option<Verdict>,
}

impl<S: Scheduler, R: RulesEngine> Interaction<S, R> {
    pub fn new(session: Session<S, R>) -> Self {
        Interaction {
            session,
            selection: None,
            feedback: None,
        }
    }

    pub fn handle(&mut self, event: ViewEvent) -> Result<Option<Verdict>, SessionError> {
        match event {
            ViewEvent::Click { square } => self.click(square),
            ViewEvent::Drop { from, to, piece } => self.drop_piece(from, to, &piece).map(Some),
            ViewEvent::Reset => {
                self.clear();
                self.session.reset().map(|_| None)
            }
            ViewEvent::Undo => {
                self.clear();
                self.session.undo_last_half_move();
                Ok(None)
            }
            ViewEvent::Skip => {
                self.clear();
                self.session.advance().map(|_| None)
            }
        }
    }

    /// Click-to-move.
    ///
    /// The first click selects a piece of the side to move. The second click
    /// tries the move from the selected square, promoting to a queen, and drops
    /// the selection whatever the outcome.
    pub fn click(&mut self, square: Square) -> Result<Option<Verdict>, SessionError> {
        self.feedback = None;
        match self.selection.take() {
            Some(from) => {
                let candidate = CoordinateMove::new(from, square).with_promotion(Role::Queen);
                self.attempt(candidate).map(Some)
            }
            None => {
                if self.selectable(square) {
                    self.selection = Some(square);
                }
                Ok(None)
            }
        }
    }

    /// Drag-and-drop. The promotion piece is read from the dropped piece's label.
    pub fn drop_piece(
        &mut self,
        from: Square,
        to: Square,
        piece: &str,
    ) -> Result<Verdict, SessionError> {
        self.selection = None;
        let candidate = CoordinateMove::new(from, to).with_promotion(promotion_from_label(piece));
        self.attempt(candidate)
    }

    /// Forward a fired reply timer to the session.
    pub fn fire(&mut self, ticket: ReplyTicket) -> Result<bool, SessionError> {
        let played = self.session.fire(ticket)?;
        if played {
            // Destinations computed before the reply may no longer be legal.
            self.selection = None;
        }
        Ok(played)
    }

    fn attempt(&mut self, candidate: CoordinateMove) -> Result<Verdict, SessionError> {
        let verdict = self.session.attempt_move(candidate)?;
        self.feedback = Some(verdict);
        Ok(verdict)
    }

    fn selectable(&self, square: Square) -> bool {
        !self.session.is_exhausted()
            && self
                .session
                .piece_at(square)
                .is_some_and(|piece| piece.color == self.session.turn())
    }

    fn clear(&mut self) {
        self.selection = None;
        self.feedback = None;
    }

    pub fn frame(&self) -> Frame {
        Frame {
            position: self.session.position(),
            orientation: self.session.orientation(),
            highlights: self.highlights(),
            feedback: self.feedback,
            puzzle: self.session.puzzle_index(),
            puzzles: self.session.catalog().len(),
            solved: self.session.solved(),
            phase: self.session.phase(),
        }
    }

    /// Selected square plus its legal destinations, captures told apart.
    pub fn highlights(&self) -> BTreeMap<Square, SquareStyle> {
        let mut highlights = BTreeMap::new();
        let Some(selected) = self.selection else {
            return highlights;
        };
        for destination in self.session.legal_destinations(selected) {
            let style = if destination.is_capture {
                SquareStyle::Capture
            } else {
                SquareStyle::Quiet
            };
            highlights.insert(destination.to, style);
        }
        highlights.insert(selected, SquareStyle::Selected);
        highlights
    }

    pub fn selection(&self) -> Option<Square> {
        self.selection
    }

    pub fn feedback(&self) -> Option<Verdict> {
        self.feedback
    }

    pub fn session(&self) -> &Session<S, R> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<S, R> {
        &mut self.session
    }

    pub fn into_session(self) -> Session<S, R> {
        self.session
    }
}

/// `wQ` promotes to a queen, `bN` to a knight. Anything else promotes to a queen.
fn promotion_from_label(piece: &str) -> Role {
    match piece.chars().nth(1).map(|ch| ch.to_ascii_lowercase()) {
        Some(ch) => match Role::from_char(ch) {
            Some(Role::Pawn) | Some(Role::King) | None => Role::Queen,
            Some(role) => role,
        },
        None => Role::Queen,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{catalog::Catalog, config::SessionConfig, schedule::ManualScheduler};

    fn interaction() -> Interaction<ManualScheduler> {
        let catalog = Arc::new(Catalog::builtin().unwrap());
        let session =
            Session::new(catalog, SessionConfig::default(), ManualScheduler::new()).unwrap();
        let mut interaction = Interaction::new(session);
        let ticket = interaction.session().pending_reply().unwrap();
        assert!(interaction.fire(ticket).unwrap());
        interaction
    }

    #[test]
    fn test_first_click_selects_own_piece() {
        let mut ui = interaction();

        // White rook; black is to move.
        assert_eq!(ui.click(Square::F7).unwrap(), None);
        assert_eq!(ui.selection(), None);

        // Empty square.
        assert_eq!(ui.click(Square::D4).unwrap(), None);
        assert_eq!(ui.selection(), None);

        assert_eq!(ui.click(Square::F5).unwrap(), None);
        assert_eq!(ui.selection(), Some(Square::F5));
    }

    #[test]
    fn test_second_click_attempts_and_clears() {
        let mut ui = interaction();
        ui.click(Square::F5).unwrap();
        assert_eq!(ui.click(Square::F6).unwrap(), Some(Verdict::WrongMove));
        assert_eq!(ui.selection(), None);
        assert_eq!(ui.feedback(), Some(Verdict::WrongMove));

        ui.click(Square::F5).unwrap();
        assert_eq!(ui.click(Square::E6).unwrap(), Some(Verdict::IllegalMove));
        assert_eq!(ui.selection(), None);

        ui.click(Square::F5).unwrap();
        assert_eq!(ui.click(Square::E5).unwrap(), Some(Verdict::Accepted));
        assert_eq!(ui.selection(), None);
        assert_eq!(ui.session().expected_move_index(), 2);
    }

    #[test]
    fn test_highlights_for_selection() {
        let mut ui = interaction();
        assert!(ui.frame().highlights.is_empty());

        ui.click(Square::F5).unwrap();
        let highlights = ui.frame().highlights;
        assert_eq!(highlights.len(), 11);
        assert_eq!(highlights[&Square::F5], SquareStyle::Selected);
        assert_eq!(highlights[&Square::F7], SquareStyle::Capture);
        assert_eq!(highlights[&Square::F3], SquareStyle::Capture);
        assert_eq!(highlights[&Square::E5], SquareStyle::Quiet);
        assert_eq!(highlights[&Square::H5], SquareStyle::Quiet);
        assert!(!highlights.contains_key(&Square::A5));
    }

    #[test]
    fn test_drop_passes_straight_to_session() {
        let mut ui = interaction();
        assert_eq!(
            ui.drop_piece(Square::F5, Square::E5, "bR").unwrap(),
            Verdict::Accepted
        );
        // Reply pending: the player has to wait.
        assert_eq!(
            ui.drop_piece(Square::E5, Square::E6, "bR").unwrap(),
            Verdict::OutOfTurn
        );
    }

    #[test]
    fn test_promotion_from_label() {
        assert_eq!(promotion_from_label("wQ"), Role::Queen);
        assert_eq!(promotion_from_label("bN"), Role::Knight);
        assert_eq!(promotion_from_label("wR"), Role::Rook);
        assert_eq!(promotion_from_label("bB"), Role::Bishop);
        assert_eq!(promotion_from_label("wP"), Role::Queen);
        assert_eq!(promotion_from_label("wK"), Role::Queen);
        assert_eq!(promotion_from_label(""), Role::Queen);
    }

    #[test]
    fn test_control_events() {
        let mut ui = interaction();
        let start = ui.session().catalog().get(0).unwrap().start_position().to_owned();

        ui.handle(ViewEvent::Click { square: Square::F5 }).unwrap();
        ui.handle(ViewEvent::Reset).unwrap();
        assert_eq!(ui.selection(), None);
        assert_eq!(ui.frame().position, start);
        assert_eq!(ui.frame().phase, Phase::AwaitingReply);

        ui.handle(ViewEvent::Skip).unwrap();
        assert_eq!(ui.frame().puzzle, 1);
        assert_eq!(ui.frame().orientation, Orientation::White);

        // Nothing played yet: undo leaves the opening move queued.
        let opening = ui.session().pending_reply();
        ui.handle(ViewEvent::Undo).unwrap();
        assert_eq!(ui.frame().phase, Phase::AwaitingReply);
        assert_eq!(ui.session().pending_reply(), opening);
        assert_eq!(
            ui.handle(ViewEvent::Drop {
                from: Square::F2,
                to: Square::G3,
                piece: "bB".to_owned(),
            })
            .unwrap(),
            Some(Verdict::OutOfTurn)
        );
    }

    #[test]
    fn test_frame_serializes_for_the_view() {
        let mut ui = interaction();
        ui.click(Square::F5).unwrap();
        ui.click(Square::F6).unwrap();

        let json = serde_json::to_value(ui.frame()).unwrap();
        assert_eq!(json["orientation"], "black");
        assert_eq!(json["feedback"], "wrong_move");
        assert_eq!(json["phase"], "awaiting_player");
        assert_eq!(json["puzzles"], 3);
        assert!(json["highlights"].as_object().unwrap().is_empty());

        let event: ViewEvent =
            serde_json::from_str(r#"{"type":"drop","from":"f5","to":"e5","piece":"bR"}"#).unwrap();
        assert_eq!(
            event,
            ViewEvent::Drop {
                from: Square::F5,
                to: Square::E5,
                piece: "bR".to_owned()
            }
        );
    }
}
