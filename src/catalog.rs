use std::ops::Index;

use serde::{Deserialize, Serialize};
use shakmaty::Color;

use crate::{
    error::CatalogError,
    notation::{decode, encode, MoveToken, Notation},
    rules::{RulesEngine, ShakmatyRules},
    session::Orientation,
};

const BUILTIN: &str = include_str!("../puzzles/default.json");

/// One catalog entry as it is written by a puzzle author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleDefinition {
    /// Starting position (FEN).
    #[serde(rename = "fen", alias = "startingPosition")]
    pub starting_position: String,

    /// The full line, alternating sides, starting with the side to move.
    #[serde(rename = "solution", alias = "solutionLine")]
    pub solution_line: Vec<String>,

    /// Token shape of `solution_line`. Detected from the tokens when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notation: Option<Notation>,

    /// By default the side to move in `fen` is the automated side,
    /// and the first move of the line is played for the player.
    #[serde(default)]
    pub player_moves_first: bool,
}

/// A validated puzzle.
#[derive(Debug, Clone)]
pub struct Puzzle {
    start: String,
    notation: Notation,
    line: Vec<MoveToken>,
    first_to_move: Color,
    player_moves_first: bool,
}

impl Puzzle {
    /// The starting position, as the rules engine serializes it.
    pub fn start_position(&self) -> &str {
        &self.start
    }

    pub fn notation(&self) -> Notation {
        self.notation
    }

    pub fn line(&self) -> &[MoveToken] {
        &self.line
    }

    pub fn player_side(&self) -> Color {
        if self.player_moves_first {
            self.first_to_move
        } else {
            !self.first_to_move
        }
    }

    /// Whether the first ply of the line is played by the automated side.
    pub fn opens_with_reply(&self) -> bool {
        !self.player_moves_first
    }

    /// Whether ply `index` of the line belongs to the player.
    pub fn is_player_ply(&self, index: usize) -> bool {
        (index % 2 == 0) == self.player_moves_first
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::from(self.player_side())
    }

    fn validate(index: usize, def: &PuzzleDefinition) -> Result<Puzzle, CatalogError> {
        let mut rules = ShakmatyRules::from_position(&def.starting_position).map_err(|source| {
            CatalogError::InvalidPosition {
                puzzle: index,
                source,
            }
        })?;

        if def.solution_line.is_empty() {
            return Err(CatalogError::EmptyLine { puzzle: index });
        }
        if !def.player_moves_first && def.solution_line.len() < 2 {
            return Err(CatalogError::NoPlayerMove { puzzle: index });
        }

        let notation = def
            .notation
            .unwrap_or_else(|| Notation::detect(&def.solution_line));
        let start = rules.position();
        let first_to_move = rules.turn();

        let mut line = Vec::with_capacity(def.solution_line.len());
        for (ply, raw) in def.solution_line.iter().enumerate() {
            let token = decode(raw, notation).map_err(|source| CatalogError::Token {
                puzzle: index,
                ply,
                source,
            })?;
            let position = rules.position();
            let played = rules
                .play_token(&token)
                .ok_or_else(|| CatalogError::IllegalLine {
                    puzzle: index,
                    ply,
                    token: raw.clone(),
                    position,
                })?;
            // Store the engine's own spelling so comparisons during play are exact.
            line.push(encode(&played, notation));
        }

        Ok(Puzzle {
            start,
            notation,
            line,
            first_to_move,
            player_moves_first: def.player_moves_first,
        })
    }
}

/// An ordered, immutable, non-empty sequence of validated puzzles.
///
/// [`Catalog::new`] replays every solution line once, so a bad token is
/// reported when the pack is loaded and not in the middle of a puzzle.
#[derive(Debug, Clone)]
pub struct Catalog {
    puzzles: Vec<Puzzle>,
}

impl Catalog {
    pub fn new(definitions: &[PuzzleDefinition]) -> Result<Catalog, CatalogError> {
        if definitions.is_empty() {
            return Err(CatalogError::Empty);
        }
        let puzzles = definitions
            .iter()
            .enumerate()
            .map(|(index, def)| Puzzle::validate(index, def))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(puzzles = puzzles.len(), "catalog loaded");
        Ok(Catalog { puzzles })
    }

    /// Parse and validate a JSON array of [`PuzzleDefinition`]s.
    pub fn from_json(json: &str) -> Result<Catalog, CatalogError> {
        let definitions: Vec<PuzzleDefinition> = serde_json::from_str(json)?;
        Catalog::new(&definitions)
    }

    /// The pack that ships with the crate.
    pub fn builtin() -> Result<Catalog, CatalogError> {
        Catalog::from_json(BUILTIN)
    }

    pub fn get(&self, index: usize) -> Result<&Puzzle, CatalogError> {
        self.puzzles
            .get(index)
            .ok_or(CatalogError::IndexOutOfRange {
                index,
                len: self.puzzles.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Puzzle> {
        self.puzzles.iter()
    }
}

/// `active` indices held by a session are always in range.
impl Index<usize> for Catalog {
    type Output = Puzzle;

    fn index(&self, index: usize) -> &Puzzle {
        &self.puzzles[index]
    }
}
