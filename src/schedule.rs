use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::{
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

/// Identifies one armed automated reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReplyTicket(u64);

/// Delay-then-notify timers.
///
/// When the delay elapses the implementation must hand `ticket` back to the
/// session (see `Session::fire`). Cancelling a handle whose timer already
/// fired must be harmless.
pub trait Scheduler {
    type Handle;

    fn schedule(&mut self, delay: Duration, ticket: ReplyTicket) -> Self::Handle;

    fn cancel(&mut self, handle: Self::Handle);
}

/// Single-slot cancellable reply timer.
///
/// Arming a new reply cancels the old one, and every armed reply carries a
/// fresh [`ReplyTicket`]. A timer that fires after its cancellation presents
/// a ticket that no longer [`claim`](ReplySlot::claim)s anything.
pub struct ReplySlot<S: Scheduler> {
    scheduler: S,
    pending: Option<(ReplyTicket, S::Handle)>,
    issued: u64,
}

impl<S: Scheduler> ReplySlot<S> {
    pub fn new(scheduler: S) -> ReplySlot<S> {
        ReplySlot {
            scheduler,
            pending: None,
            issued: 0,
        }
    }

    /// Cancel whatever is pending and schedule a new reply.
    pub fn arm(&mut self, delay: Duration) -> ReplyTicket {
        self.cancel();
        self.issued += 1;
        let ticket = ReplyTicket(self.issued);
        let handle = self.scheduler.schedule(delay, ticket);
        self.pending = Some((ticket, handle));
        tracing::debug!(?ticket, ?delay, "automated reply armed");
        ticket
    }

    /// Idempotent. Returns whether a reply was actually pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some((ticket, handle)) => {
                self.scheduler.cancel(handle);
                tracing::debug!(?ticket, "automated reply cancelled");
                true
            }
            None => false,
        }
    }

    /// Take the pending reply if `ticket` is it. Stale tickets return `false`.
    pub fn claim(&mut self, ticket: ReplyTicket) -> bool {
        if self.pending() == Some(ticket) {
            self.pending = None;
            true
        } else {
            tracing::debug!(?ticket, "stale reply ticket ignored");
            false
        }
    }

    pub fn pending(&self) -> Option<ReplyTicket> {
        self.pending.as_ref().map(|(ticket, _)| *ticket)
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

impl<S: Scheduler> fmt::Debug for ReplySlot<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplySlot")
            .field("pending", &self.pending())
            .field("issued", &self.issued)
            .finish()
    }
}

/// A reply the [`ManualScheduler`] was asked to time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledReply {
    pub ticket: ReplyTicket,
    pub delay: Duration,
}

/// Records requests instead of keeping time.
///
/// For hosts that run their own clock (a frame loop, a test) and call
/// `Session::fire` themselves once the recorded delay has elapsed.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    scheduled: Vec<ScheduledReply>,
    cancelled: Vec<ReplyTicket>,
}

impl ManualScheduler {
    pub fn new() -> ManualScheduler {
        ManualScheduler::default()
    }

    /// Every reply ever scheduled, oldest first.
    pub fn scheduled(&self) -> &[ScheduledReply] {
        &self.scheduled
    }

    pub fn cancelled(&self) -> &[ReplyTicket] {
        &self.cancelled
    }

    pub fn last(&self) -> Option<ScheduledReply> {
        self.scheduled.last().copied()
    }
}

impl Scheduler for ManualScheduler {
    type Handle = ReplyTicket;

    fn schedule(&mut self, delay: Duration, ticket: ReplyTicket) -> ReplyTicket {
        self.scheduled.push(ScheduledReply { ticket, delay });
        ticket
    }

    fn cancel(&mut self, handle: ReplyTicket) {
        self.cancelled.push(handle);
    }
}

/// Tokio timers. Fired tickets arrive on the receiver returned by [`TokioScheduler::new`].
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    fired: UnboundedSender<ReplyTicket>,
}

impl TokioScheduler {
    pub fn new() -> (TokioScheduler, UnboundedReceiver<ReplyTicket>) {
        let (fired, receiver) = unbounded_channel();
        (TokioScheduler { fired }, receiver)
    }
}

impl Scheduler for TokioScheduler {
    type Handle = JoinHandle<()>;

    fn schedule(&mut self, delay: Duration, ticket: ReplyTicket) -> JoinHandle<()> {
        let fired = self.fired.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone once the session's host shut down.
            let _ = fired.send(ticket);
        })
    }

    fn cancel(&mut self, handle: JoinHandle<()>) {
        handle.abort();
    }
}
