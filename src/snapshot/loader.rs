//! Refresh bookkeeping for change-notification driven reloading.
//!
//! Any insert/update/delete on the tracked relations triggers a full
//! refetch. The loader coalesces rapid-fire notifications into at most one
//! in-flight fetch plus a single pending slot, and stamps each fetch with a
//! generation so a response that was superseded while in flight is
//! discarded instead of overwriting newer data.
//!
//! The loader performs no I/O. The embedding application asks for a
//! [`FetchTicket`], runs the fetch however it likes, and reports the result
//! back; everything here is synchronous state-machine bookkeeping.

use tracing::{debug, warn};

use super::{FetchContext, Snapshot, SnapshotSource};
use crate::error::FetchError;

/// Permission to run one fetch. Only the ticket of the newest generation is
/// accepted back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

/// Coarse loader state for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No fetch has been requested yet.
    Idle,
    /// A fetch is in flight and no snapshot has ever been applied.
    Loading,
    /// A snapshot is available (a newer fetch may still be in flight).
    Ready,
    /// The most recent fetch failed and no snapshot is available.
    Failed,
}

/// Snapshot holder with refresh coalescing and stale-fetch rejection.
#[derive(Debug, Default)]
pub struct SnapshotLoader {
    generation: u64,
    in_flight: Option<u64>,
    pending: bool,
    snapshot: Option<Snapshot>,
    error: Option<FetchError>,
}

impl SnapshotLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// A change notification (or the initial load request).
    ///
    /// Returns a ticket when a fetch should start now. While a fetch is in
    /// flight, further notifications collapse into the single pending slot
    /// and return `None`; [`Self::complete`] hands out the follow-up ticket.
    pub fn notify(&mut self) -> Option<FetchTicket> {
        if self.in_flight.is_some() {
            self.pending = true;
            debug!("refresh already in flight; coalescing notification");
            return None;
        }
        Some(self.begin())
    }

    /// Report the outcome of the fetch authorized by `ticket`.
    ///
    /// A ticket that is no longer the current generation is discarded: its
    /// result was superseded while in flight. On failure the previous
    /// snapshot (if any) is kept and the error recorded alongside it.
    ///
    /// Returns the follow-up ticket when a notification arrived mid-flight.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Snapshot, FetchError>,
    ) -> Option<FetchTicket> {
        if self.in_flight != Some(ticket.generation) {
            warn!(
                generation = ticket.generation,
                "discarding superseded snapshot fetch"
            );
            return None;
        }
        self.in_flight = None;
        match result {
            Ok(snapshot) => {
                debug!(
                    generation = ticket.generation,
                    tasks = snapshot.tasks.len(),
                    milestones = snapshot.milestones.len(),
                    "snapshot applied"
                );
                self.snapshot = Some(snapshot);
                self.error = None;
            }
            Err(err) => {
                warn!(generation = ticket.generation, error = %err, "snapshot fetch failed");
                self.error = Some(err);
            }
        }
        if self.pending {
            self.pending = false;
            return Some(self.begin());
        }
        None
    }

    /// Drive a full notify/fetch/complete cycle synchronously against a
    /// source, including any refresh that was pending when the fetch
    /// finished.
    pub fn refresh_blocking<S: SnapshotSource>(&mut self, source: &S, ctx: &FetchContext) {
        let mut next = self.notify();
        while let Some(ticket) = next {
            next = self.complete(ticket, source.fetch(ctx));
        }
    }

    pub fn state(&self) -> LoadState {
        match (&self.snapshot, &self.error, self.in_flight) {
            (Some(_), _, _) => LoadState::Ready,
            (None, _, Some(_)) => LoadState::Loading,
            (None, Some(_), None) => LoadState::Failed,
            (None, None, None) => LoadState::Idle,
        }
    }

    /// The most recently applied snapshot, surviving later failed fetches.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// The error from the most recent fetch, cleared by the next success.
    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    fn begin(&mut self) -> FetchTicket {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        debug!(generation = self.generation, "snapshot fetch started");
        FetchTicket {
            generation: self.generation,
        }
    }
}
