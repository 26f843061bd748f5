use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use tokio::sync::Mutex;

use crate::{
    catalog::Catalog,
    config::SessionConfig,
    error::SessionError,
    interaction::{Frame, Interaction, ViewEvent},
    schedule::TokioScheduler,
    server_types::{ApiError, EventResponse, PuzzleSummary},
    session::Session,
};

pub type SharedDesk = Arc<Mutex<Interaction<TokioScheduler>>>;

/// Serve a puzzle session to a web board.
///
/// `GET /` returns the current [`Frame`], `POST /` takes a [`ViewEvent`],
/// `GET /puzzles` lists the catalog. Must be called from within a tokio runtime:
/// it spawns the task that plays automated replies when their timers fire.
pub async fn serve_puzzles(catalog: Catalog, config: SessionConfig) -> Result<Router, SessionError> {
    let (scheduler, mut replies) = TokioScheduler::new();
    let session = Session::new(Arc::new(catalog), config, scheduler)?;
    let desk: SharedDesk = Arc::new(Mutex::new(Interaction::new(session)));

    tokio::spawn({
        let desk = Arc::clone(&desk);
        async move {
            while let Some(ticket) = replies.recv().await {
                let mut desk = desk.lock().await;
                if let Err(err) = desk.fire(ticket) {
                    tracing::error!("automated reply failed: {err}");
                }
            }
        }
    });

    Ok(Router::new()
        .route("/", get(get_frame).post(handle_event))
        .route("/puzzles", get(list_puzzles))
        .with_state(desk))
}

async fn get_frame(State(desk): State<SharedDesk>) -> Json<Frame> {
    Json(desk.lock().await.frame())
}

async fn handle_event(
    State(desk): State<SharedDesk>,
    Json(event): Json<ViewEvent>,
) -> Result<Json<EventResponse>, ApiError> {
    let mut desk = desk.lock().await;
    let verdict = desk.handle(event)?;
    Ok(Json(EventResponse {
        verdict,
        frame: desk.frame(),
    }))
}

async fn list_puzzles(State(desk): State<SharedDesk>) -> Json<Vec<PuzzleSummary>> {
    let desk = desk.lock().await;
    Json(PuzzleSummary::list(desk.session().catalog()))
}
