//! Change detector
//!
//! The single background loop of the appliance:
//!
//! ```text
//! IDLE -> POLL -> {NO_CHANGE, REMOTE_COMMAND, NEW_TICKET} -> RECONCILE -> IDLE
//! ```
//!
//! Every iteration sleeps the interval supplied by the schedule
//! cadence, polls the single-record endpoint once, and acts on the
//! outcome. No branch may stop the loop permanently: transport
//! failures flip the connectivity signal and wait for the next tick,
//! which is the retry.

use crate::core::state::{StationEvent, StationState};
use crate::ledger::{Ledger, PollOutcome, RemoteCommand, StatusReport};
use crate::model::Ticket;
use crate::print_job::PrintJobRunner;
use crate::repository::TicketRepository;
use crate::schedule::PollCadence;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Bounded-retry settings for the post-print reconciliation
#[derive(Debug, Clone)]
pub struct ReconcilePolicy {
    /// Bulk-fetch attempts before giving up for this cycle
    pub attempts: u32,
    /// Fixed backoff between attempts
    pub backoff: Duration,
    /// Delay before the first attempt, letting the export catch up
    pub settle: Duration,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff: Duration::from_secs(3),
            settle: Duration::from_secs(2),
        }
    }
}

/// The background poll/print/reconcile loop
pub struct ChangeDetector {
    ledger: Arc<dyn Ledger>,
    runner: Arc<PrintJobRunner>,
    state: Arc<StationState>,
    repository: TicketRepository,
    policy: ReconcilePolicy,
}

impl ChangeDetector {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        runner: Arc<PrintJobRunner>,
        state: Arc<StationState>,
        repository: TicketRepository,
        policy: ReconcilePolicy,
    ) -> Self {
        Self {
            ledger,
            runner,
            state,
            repository,
            policy,
        }
    }

    /// Run until the token is cancelled
    ///
    /// Never busy-spins: each iteration waits out the scheduled
    /// interval before polling, so during closed hours the device
    /// touches the ledger roughly once an hour.
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Change detector started");
        loop {
            let interval = PollCadence::now().interval();
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Change detector received shutdown signal");
                    break;
                }
                _ = sleep(interval) => {}
            }
            self.tick().await;
        }
    }

    /// One POLL iteration; public so tests can drive it without the clock
    #[instrument(skip(self))]
    pub async fn tick(&self) {
        match self.ledger.poll(self.state.marker()).await {
            Err(e) => {
                warn!(error = %e, "Poll failed");
                self.state.set_online(false);
            }
            Ok(PollOutcome::NoChange { marker }) => {
                self.state.set_online(true);
                self.state.set_marker(marker);
            }
            Ok(PollOutcome::Command(cmd)) => {
                // Marker deliberately untouched: the command replaced it
                self.state.set_online(true);
                self.handle_command(cmd).await;
            }
            Ok(PollOutcome::NewTicket { marker, ticket }) => {
                self.state.set_online(true);
                self.state.set_marker(marker);

                if self.state.was_printed(&ticket.id) {
                    // The remote side changed an already-printed record
                    debug!(id = %ticket.id, "Change concerns a printed ticket, ignoring");
                    return;
                }

                self.print_ticket(&ticket).await;
                self.reconcile(&ticket.id).await;
            }
        }
    }

    /// Acquire the print guard, print all labels, record the id
    async fn print_ticket(&self, ticket: &Ticket) {
        // A manual reprint from the foreground may hold the guard for
        // a few seconds; wait it out rather than dropping the ticket
        while !self.state.try_begin_print() {
            sleep(Duration::from_millis(200)).await;
        }
        info!(id = %ticket.id, labels = PrintJobRunner::label_count(ticket), "Printing new ticket");
        self.runner.execute(&self.state, ticket).await;
        self.state.end_print();
    }

    /// Confirm the bulk export reflects the just-printed identifier
    ///
    /// Bounded retries with fixed backoff; an exhausted budget leaves
    /// the discrepancy for the next poll cycle. Exactly one redraw
    /// signal is raised regardless of outcome.
    async fn reconcile(&self, id: &str) {
        sleep(self.policy.settle).await;

        for attempt in 1..=self.policy.attempts {
            match self.ledger.fetch_bulk().await {
                Ok(raw) => {
                    let snapshot = self.repository.refresh(&raw);
                    let found = snapshot.iter().any(|t| t.id == id);
                    self.state.replace_snapshot(snapshot);

                    if found {
                        debug!(id, attempt, "Reconciled against bulk export");
                        self.state.emit(StationEvent::DataRefreshed);
                        return;
                    }
                    debug!(id, attempt, "Bulk export does not show the ticket yet");
                }
                Err(e) => {
                    warn!(id, attempt, error = %e, "Bulk fetch failed during reconciliation");
                }
            }
            if attempt < self.policy.attempts {
                sleep(self.policy.backoff).await;
            }
        }

        warn!(id, "Reconciliation budget exhausted, leaving it to the next cycle");
        self.state.emit(StationEvent::DataRefreshed);
    }

    /// Dispatch a remote command token
    async fn handle_command(&self, cmd: RemoteCommand) {
        info!(?cmd, "Remote command received");
        match cmd {
            RemoteCommand::Reboot => {
                self.state.emit(StationEvent::RebootRequested);
            }
            RemoteCommand::Update => {
                self.state.emit(StationEvent::UpdateRequested);
            }
            RemoteCommand::Status => {
                let report = StatusReport {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    marker: self.state.marker(),
                    history_len: self.state.with_history(|h| h.len()),
                    uptime_secs: self.state.uptime_secs(),
                };
                if let Err(e) = self.ledger.report_status(&report).await {
                    warn!(error = %e, "Status report failed");
                }
            }
            RemoteCommand::Reprint(id) => self.forced_reprint(&id).await,
        }
    }

    /// Forced reprint: bypasses the history check, still records the id
    async fn forced_reprint(&self, id: &str) {
        let ticket = match self.state.find_ticket(id) {
            Some(t) => Some(t),
            None => {
                // Not in the window: try a fresh export first
                match self.ledger.fetch_bulk().await {
                    Ok(raw) => {
                        let snapshot = self.repository.refresh(&raw);
                        self.state.replace_snapshot(snapshot);
                        self.state.emit(StationEvent::DataRefreshed);
                        self.state.find_ticket(id)
                    }
                    Err(e) => {
                        warn!(id, error = %e, "Bulk fetch failed for forced reprint");
                        None
                    }
                }
            }
        };

        match ticket {
            Some(t) => self.print_ticket(&t).await,
            None => warn!(id, "Forced reprint: identifier not in the ledger window"),
        }
    }
}
