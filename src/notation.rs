use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use shakmaty::{
    san::{San, SanPlus},
    uci::Uci,
    CastlingMode, Move, Position, Role, Square,
};

use crate::error::CodecError;

/// The token shape used by one puzzle's solution line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    /// Origin square, destination square, optional promotion letter.
    Coordinate,
    /// Standard algebraic notation.
    Algebraic,
}

impl Notation {
    /// Coordinate if every token decodes as a coordinate move, algebraic otherwise.
    pub fn detect<S: AsRef<str>>(tokens: &[S]) -> Notation {
        if tokens
            .iter()
            .all(|t| t.as_ref().parse::<CoordinateMove>().is_ok())
        {
            Notation::Coordinate
        } else {
            Notation::Algebraic
        }
    }
}

/// A coordinate move identifier: `from`, `to` and an optional promotion piece.
///
/// This is also the shape of a candidate move coming from the board view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl CoordinateMove {
    pub fn new(from: Square, to: Square) -> CoordinateMove {
        CoordinateMove {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, promotion: Role) -> CoordinateMove {
        self.promotion = Some(promotion);
        self
    }

    /// Castling comes out king-to-destination (`e1g1`), like the board view reports it.
    pub fn from_uci(uci: &Uci) -> Option<CoordinateMove> {
        match *uci {
            Uci::Normal {
                from,
                to,
                promotion,
            } => Some(CoordinateMove {
                from,
                to,
                promotion,
            }),
            _ => None,
        }
    }
}

impl FromStr for CoordinateMove {
    type Err = CodecError;

    fn from_str(token: &str) -> Result<CoordinateMove, CodecError> {
        let malformed = || CodecError::MalformedToken(token.to_owned());

        if !token.is_ascii() || !(4..=5).contains(&token.len()) {
            return Err(malformed());
        }

        let from = token[0..2].parse::<Square>().map_err(|_| malformed())?;
        let to = token[2..4].parse::<Square>().map_err(|_| malformed())?;
        let promotion = match token[4..].chars().next() {
            None => None,
            Some(ch) => match Role::from_char(ch.to_ascii_lowercase()) {
                Some(Role::Pawn) | Some(Role::King) | None => return Err(malformed()),
                role => role,
            },
        };

        Ok(CoordinateMove {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for CoordinateMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

/// One half-move of a solution line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveToken {
    Coordinate(CoordinateMove),
    /// Check and mate suffixes are not part of the identity of the move.
    Algebraic(San),
}

impl MoveToken {
    pub fn notation(&self) -> Notation {
        match self {
            MoveToken::Coordinate(_) => Notation::Coordinate,
            MoveToken::Algebraic(_) => Notation::Algebraic,
        }
    }
}

impl fmt::Display for MoveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveToken::Coordinate(m) => m.fmt(f),
            MoveToken::Algebraic(san) => san.fmt(f),
        }
    }
}

/// A move the rules engine actually played, in both notations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub coordinate: CoordinateMove,
    pub san: San,
}

impl PlayedMove {
    /// `pos` is the position *before* `m` is played.
    pub fn new<P: Position>(pos: &P, m: &Move) -> Option<PlayedMove> {
        let coordinate = CoordinateMove::from_uci(&m.to_uci(CastlingMode::Standard))?;
        Some(PlayedMove {
            coordinate,
            san: San::from_move(pos, m),
        })
    }
}

/// Parse a solution-line token of the given shape.
pub fn decode(token: &str, notation: Notation) -> Result<MoveToken, CodecError> {
    match notation {
        Notation::Coordinate => token.parse().map(MoveToken::Coordinate),
        Notation::Algebraic => token
            .parse::<SanPlus>()
            .map(|san_plus| MoveToken::Algebraic(san_plus.san))
            .map_err(|_| CodecError::MalformedToken(token.to_owned())),
    }
}

/// Express a played move in the same shape as the line it is compared against.
pub fn encode(played: &PlayedMove, notation: Notation) -> MoveToken {
    match notation {
        Notation::Coordinate => MoveToken::Coordinate(played.coordinate),
        Notation::Algebraic => MoveToken::Algebraic(played.san.clone()),
    }
}
