use thiserror::Error;

/// A solution-line token that cannot be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed move token `{0}`")]
    MalformedToken(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("invalid position `{position}`: {reason}")]
    InvalidPosition { position: String, reason: String },
}

/// Reasons a puzzle catalog is refused at load time.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("the catalog contains no puzzles")]
    Empty,

    #[error("puzzle {puzzle}: {source}")]
    InvalidPosition {
        puzzle: usize,
        #[source]
        source: RulesError,
    },

    #[error("puzzle {puzzle}: the solution line is empty")]
    EmptyLine { puzzle: usize },

    #[error("puzzle {puzzle}: the solution line leaves no move to the player")]
    NoPlayerMove { puzzle: usize },

    #[error("puzzle {puzzle}, ply {ply}: {source}")]
    Token {
        puzzle: usize,
        ply: usize,
        #[source]
        source: CodecError,
    },

    #[error("puzzle {puzzle}, ply {ply}: `{token}` is not legal in `{position}`")]
    IllegalLine {
        puzzle: usize,
        ply: usize,
        token: String,
        position: String,
    },

    #[error("puzzle index {index} is out of range for a catalog of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("puzzle index {index} is out of range for a catalog of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Rules(#[from] RulesError),

    #[error("puzzle {puzzle}, ply {ply}: automated move `{token}` could not be played")]
    UnplayableToken {
        puzzle: usize,
        ply: usize,
        token: String,
    },
}
