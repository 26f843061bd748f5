use shakmaty::{
    fen::Fen, CastlingMode, Chess, Color, EnPassantMode, Move, Piece, Position, Role, Square,
};

use crate::{
    error::RulesError,
    notation::{CoordinateMove, MoveToken, PlayedMove},
};

/// A legal destination of the piece on some square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub to: Square,
    pub is_capture: bool,
}

/// The chess rules a puzzle session relies on.
///
/// The session never looks at a board directly:
/// everything it knows about the position comes through this trait,
/// and the only thing that leaves it is the serialized position string.
///
/// Implementations own an undo history.
/// [`RulesEngine::undo`] restores the exact position that preceded the last
/// successful [`RulesEngine::attempt`] or [`RulesEngine::play_token`].
pub trait RulesEngine: Sized {
    /// Build an engine from a position string (FEN).
    fn from_position(position: &str) -> Result<Self, RulesError>;

    /// Play the candidate if it is legal in the current position.
    ///
    /// A promotion without an explicit piece promotes to a queen.
    /// A promotion piece on a move that is not a promotion is ignored.
    /// Returns `None`, leaving the position untouched, if the move is illegal.
    fn attempt(&mut self, candidate: &CoordinateMove) -> Option<PlayedMove>;

    /// Play a solution-line token of either notation.
    fn play_token(&mut self, token: &MoveToken) -> Option<PlayedMove>;

    /// Take back the last played move. Returns `false` if there was none.
    fn undo(&mut self) -> bool;

    /// The current position as a FEN string.
    fn position(&self) -> String;

    fn turn(&self) -> Color;

    fn piece_at(&self, square: Square) -> Option<Piece>;

    /// Legal destinations of the piece on `square`, one entry per target square.
    fn legal_destinations(&self, square: Square) -> Vec<Destination>;
}

/// [`RulesEngine`] backed by a [`shakmaty::Chess`] position and a stack of
/// the positions it replaced.
#[derive(Debug, Clone)]
pub struct ShakmatyRules {
    current: Chess,
    history: Vec<Chess>,
}

impl ShakmatyRules {
    fn find_move(&self, candidate: &CoordinateMove) -> Option<Move> {
        let promotion = candidate.promotion.unwrap_or(Role::Queen);
        self.current.legal_moves().into_iter().find(|m| {
            CoordinateMove::from_uci(&m.to_uci(CastlingMode::Standard)).is_some_and(|c| {
                c.from == candidate.from
                    && c.to == candidate.to
                    && c.promotion.map_or(true, |role| role == promotion)
            })
        })
    }

    fn play(&mut self, m: &Move) -> Option<PlayedMove> {
        let played = PlayedMove::new(&self.current, m)?;
        self.history.push(self.current.clone());
        self.current.play_unchecked(m);
        Some(played)
    }
}

impl RulesEngine for ShakmatyRules {
    fn from_position(position: &str) -> Result<Self, RulesError> {
        let invalid = |reason: String| RulesError::InvalidPosition {
            position: position.to_owned(),
            reason,
        };
        let fen: Fen = position.parse().map_err(|e| invalid(format!("{e}")))?;
        let current: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{e}")))?;

        Ok(ShakmatyRules {
            current,
            history: Vec::new(),
        })
    }

    fn attempt(&mut self, candidate: &CoordinateMove) -> Option<PlayedMove> {
        let m = self.find_move(candidate)?;
        self.play(&m)
    }

    fn play_token(&mut self, token: &MoveToken) -> Option<PlayedMove> {
        let m = match token {
            MoveToken::Coordinate(coordinate) => {
                // An explicit promotion in the line has to match exactly.
                let m = self.find_move(coordinate)?;
                if m.promotion() != coordinate.promotion {
                    return None;
                }
                m
            }
            MoveToken::Algebraic(san) => san.to_move(&self.current).ok()?,
        };
        self.play(&m)
    }

    fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.current = previous;
                true
            }
            None => false,
        }
    }

    fn position(&self) -> String {
        Fen::from_position(self.current.clone(), EnPassantMode::Legal).to_string()
    }

    fn turn(&self) -> Color {
        self.current.turn()
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.current.board().piece_at(square)
    }

    fn legal_destinations(&self, square: Square) -> Vec<Destination> {
        let mut destinations: Vec<Destination> = Vec::new();
        for m in self.current.legal_moves() {
            if m.from() != Some(square) {
                continue;
            }
            let Some(c) = CoordinateMove::from_uci(&m.to_uci(CastlingMode::Standard)) else {
                continue;
            };
            // Promotions put four moves on the same square.
            if destinations.iter().any(|d| d.to == c.to) {
                continue;
            }
            destinations.push(Destination {
                to: c.to,
                is_capture: m.is_capture(),
            });
        }
        destinations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::{decode, Notation};

    const PUZZLE_ONE: &str = "8/4R3/1p2P3/p4r2/P6p/1P3Pk1/4K3/8 w - - 1 64";

    fn mv(token: &str) -> CoordinateMove {
        token.parse().unwrap()
    }

    #[test]
    fn test_position_round_trips() {
        let rules = ShakmatyRules::from_position(PUZZLE_ONE).unwrap();
        assert_eq!(rules.position(), PUZZLE_ONE);
        assert_eq!(rules.turn(), Color::White);
        assert_eq!(
            rules.piece_at(Square::E7),
            Some(Piece {
                color: Color::White,
                role: Role::Rook
            })
        );
    }

    #[test]
    fn test_invalid_position() {
        assert!(matches!(
            ShakmatyRules::from_position("not a fen"),
            Err(RulesError::InvalidPosition { .. })
        ));
        // Both kings missing.
        assert!(ShakmatyRules::from_position("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
    }

    #[test]
    fn test_attempt_and_undo() {
        let mut rules = ShakmatyRules::from_position(PUZZLE_ONE).unwrap();

        let played = rules.attempt(&mv("e7f7")).unwrap();
        assert_eq!(played.coordinate, mv("e7f7"));
        assert_eq!(played.san.to_string(), "Rf7");
        assert_eq!(rules.turn(), Color::Black);

        assert!(rules.undo());
        assert_eq!(rules.position(), PUZZLE_ONE);
        assert!(!rules.undo());
    }

    #[test]
    fn test_illegal_attempt_leaves_position() {
        let mut rules = ShakmatyRules::from_position(PUZZLE_ONE).unwrap();
        assert!(rules.attempt(&mv("e7d6")).is_none());
        // Black's rook, but white to move.
        assert!(rules.attempt(&mv("f5f4")).is_none());
        assert_eq!(rules.position(), PUZZLE_ONE);
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let fen = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";

        let mut rules = ShakmatyRules::from_position(fen).unwrap();
        let played = rules.attempt(&mv("e7e8")).unwrap();
        assert_eq!(played.coordinate.promotion, Some(Role::Queen));
        assert_eq!(rules.piece_at(Square::E8).map(|p| p.role), Some(Role::Queen));

        let mut rules = ShakmatyRules::from_position(fen).unwrap();
        rules.attempt(&mv("e7e8n")).unwrap();
        assert_eq!(rules.piece_at(Square::E8).map(|p| p.role), Some(Role::Knight));
    }

    #[test]
    fn test_play_token_requires_exact_promotion() {
        let fen = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";
        let mut rules = ShakmatyRules::from_position(fen).unwrap();
        let token = decode("e7e8", Notation::Coordinate).unwrap();
        assert!(rules.play_token(&token).is_none());

        let token = decode("e7e8r", Notation::Coordinate).unwrap();
        assert!(rules.play_token(&token).is_some());
    }

    #[test]
    fn test_play_algebraic_token() {
        let mut rules = ShakmatyRules::from_position(PUZZLE_ONE).unwrap();
        let token = decode("Rf7", Notation::Algebraic).unwrap();
        let played = rules.play_token(&token).unwrap();
        assert_eq!(played.coordinate, mv("e7f7"));

        let token = decode("Rf8", Notation::Algebraic).unwrap();
        assert!(rules.play_token(&token).is_none());
    }

    #[test]
    fn test_legal_destinations_split_captures() {
        let mut rules = ShakmatyRules::from_position(PUZZLE_ONE).unwrap();
        rules.attempt(&mv("e7f7")).unwrap();

        let destinations = rules.legal_destinations(Square::F5);
        let captures: Vec<Square> = destinations
            .iter()
            .filter(|d| d.is_capture)
            .map(|d| d.to)
            .collect();
        assert_eq!(destinations.len(), 10);
        assert_eq!(captures.len(), 2);
        assert!(captures.contains(&Square::F7));
        assert!(captures.contains(&Square::F3));

        assert!(rules.legal_destinations(Square::A1).is_empty());
    }

    #[test]
    fn test_castling_destination_is_king_target() {
        let rules =
            ShakmatyRules::from_position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let targets: Vec<Square> = rules
            .legal_destinations(Square::E1)
            .into_iter()
            .map(|d| d.to)
            .collect();
        assert!(targets.contains(&Square::G1));
        assert!(targets.contains(&Square::C1));

        let mut rules = rules;
        let played = rules.attempt(&mv("e1g1")).unwrap();
        assert_eq!(played.san.to_string(), "O-O");
        assert_eq!(rules.piece_at(Square::F1).map(|p| p.role), Some(Role::Rook));
    }

    #[test]
    fn test_promotion_destinations_deduplicated() {
        let rules = ShakmatyRules::from_position("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        let destinations = rules.legal_destinations(Square::E7);
        assert_eq!(
            destinations,
            vec![Destination {
                to: Square::E8,
                is_capture: false
            }]
        );
    }
}
