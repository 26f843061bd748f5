#[cfg(feature = "server")]
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::{
    catalog::Catalog,
    error::SessionError,
    interaction::Frame,
    notation::Notation,
    session::{Orientation, Verdict},
};

/// Reply to a posted [`crate::interaction::ViewEvent`].
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventResponse {
    /// What happened to the attempted move, if the event attempted one.
    pub verdict: Option<Verdict>,

    /// The board after the event.
    pub frame: Frame,
}

/// One catalog entry as listed to the view.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PuzzleSummary {
    pub index: usize,

    /// Starting position (FEN).
    pub position: String,

    pub notation: Notation,

    /// Length of the solution line, in half-moves.
    pub plies: usize,

    /// Side the player solves for, which is also the side at the bottom.
    pub orientation: Orientation,
}

impl PuzzleSummary {
    pub fn list(catalog: &Catalog) -> Vec<PuzzleSummary> {
        catalog
            .iter()
            .enumerate()
            .map(|(index, puzzle)| PuzzleSummary {
                index,
                position: puzzle.start_position().to_owned(),
                notation: puzzle.notation(),
                plies: puzzle.line().len(),
                orientation: puzzle.orientation(),
            })
            .collect()
    }
}

/// Body of every error response.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Errors of the HTTP surface.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(feature = "server")]
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::Session(SessionError::IndexOutOfRange { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Session(err) => {
                tracing::error!("session error: {err}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(ErrorDetail {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
