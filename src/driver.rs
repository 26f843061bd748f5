use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::{Receiver, UnboundedReceiver};

use crate::{
    error::SessionError,
    interaction::{Frame, Interaction, ViewEvent},
    rules::RulesEngine,
    schedule::{ReplyTicket, TokioScheduler},
};

/// The board view: something that can draw a [`Frame`].
///
/// Events travel the other way, through the channel handed to [`drive`].
#[async_trait]
pub trait BoardView: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn present(&mut self, frame: Frame) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum DriveError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("board view failed: {0}")]
    View(#[source] E),
}

/// Run an interaction until the view stops sending events.
///
/// View events and fired reply timers are handled one at a time on the
/// calling task, and the view is sent a fresh frame after each of them.
/// Returns the interaction once `events` is closed.
pub async fn drive<V, R>(
    mut desk: Interaction<TokioScheduler, R>,
    mut replies: UnboundedReceiver<ReplyTicket>,
    mut events: Receiver<ViewEvent>,
    view: &mut V,
) -> Result<Interaction<TokioScheduler, R>, DriveError<V::Error>>
where
    V: BoardView,
    R: RulesEngine,
{
    view.present(desk.frame()).await.map_err(DriveError::View)?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    tracing::trace!(?event, "view event");
                    desk.handle(event)?;
                }
                None => break,
            },
            Some(ticket) = replies.recv() => {
                if !desk.fire(ticket)? {
                    continue;
                }
            }
        }
        view.present(desk.frame()).await.map_err(DriveError::View)?;
    }

    tracing::debug!("view closed");
    Ok(desk)
}
