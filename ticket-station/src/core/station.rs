//! Station orchestration
//!
//! Wires the components together at boot, owns the background change
//! detector, and exposes the small facade the UI collaborator talks
//! to: snapshot access, history membership, the event channels and
//! the manual reprint entry point.

use crate::core::config::Config;
use crate::core::state::{StationEvent, StationState};
use crate::history::HistoryStore;
use crate::ledger::Ledger;
use crate::poller::{ChangeDetector, ReconcilePolicy};
use crate::print_job::PrintJobRunner;
use crate::render::LabelRenderer;
use crate::repository::TicketRepository;
use station_printer::Printer;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Errors surfaced to the UI collaborator
#[derive(Debug, Error)]
pub enum StationError {
    /// Identifier not present in the current snapshot
    #[error("Ticket not found: {0}")]
    NotFound(String),

    /// Another print job is in flight; manual prints are suppressed
    #[error("A print job is already in flight")]
    Busy,
}

/// The assembled appliance core
pub struct Station {
    config: Arc<Config>,
    state: Arc<StationState>,
    ledger: Arc<dyn Ledger>,
    runner: Arc<PrintJobRunner>,
    repository: TicketRepository,
}

impl Station {
    /// Boot the station: load history, do the initial bulk refresh,
    /// and suppress the backlog on a fresh device
    pub async fn initialize(
        config: Arc<Config>,
        ledger: Arc<dyn Ledger>,
        printer: Arc<dyn Printer>,
    ) -> Self {
        let mut history = HistoryStore::new(config.history_path(), config.history_capacity);
        let loaded = history.load();
        let seed_history = !loaded || history.is_empty();

        let state = Arc::new(StationState::new(history));
        let repository = TicketRepository::new(config.snapshot_capacity);
        let runner = Arc::new(PrintJobRunner::new(
            printer,
            LabelRenderer::new(config.label_width),
            Duration::from_secs(config.label_cooldown_secs),
            state.events_sender(),
        ));

        let station = Self {
            config,
            state,
            ledger,
            runner,
            repository,
        };

        match station.ledger.fetch_bulk().await {
            Ok(raw) => {
                let snapshot = station.repository.refresh(&raw);
                if seed_history {
                    // First boot (or lost history): everything already in
                    // the ledger counts as printed, so the device does not
                    // reprint the whole backlog
                    let ids: Vec<String> = snapshot.iter().map(|t| t.id.clone()).collect();
                    info!(count = ids.len(), "Seeding print history from the current snapshot");
                    station.state.with_history(|h| {
                        h.reset_to(ids);
                        h.persist();
                    });
                }
                station.state.replace_snapshot(snapshot);
                station.state.emit(StationEvent::DataRefreshed);
            }
            Err(e) => {
                warn!(error = %e, "Initial bulk fetch failed, starting offline");
                station.state.set_online(false);
            }
        }

        station
    }

    /// Shared state handle for the UI collaborator
    pub fn state(&self) -> Arc<StationState> {
        self.state.clone()
    }

    /// Manual reprint from the foreground context
    ///
    /// Fails fast while an automatic print is in flight instead of
    /// queueing; the operator simply tries again.
    pub async fn manual_print(&self, id: &str) -> Result<(), StationError> {
        let ticket = self
            .state
            .find_ticket(id)
            .ok_or_else(|| StationError::NotFound(id.to_string()))?;

        if !self.state.try_begin_print() {
            return Err(StationError::Busy);
        }
        info!(id, "Manual reprint requested");
        self.runner.execute(&self.state, &ticket).await;
        self.state.end_print();
        Ok(())
    }

    /// Spawn the background change detector
    pub fn spawn_detector(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let detector = ChangeDetector::new(
            self.ledger.clone(),
            self.runner.clone(),
            self.state.clone(),
            self.repository.clone(),
            ReconcilePolicy {
                attempts: self.config.reconcile_attempts,
                backoff: Duration::from_secs(self.config.reconcile_backoff_secs),
                settle: Duration::from_secs(self.config.reconcile_settle_secs),
            },
        );
        tokio::spawn(detector.run(shutdown))
    }

    /// Run until ctrl-c, then shut the detector down gracefully
    pub async fn run(self) -> anyhow::Result<()> {
        let shutdown = CancellationToken::new();
        let detector = self.spawn_detector(shutdown.clone());

        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");

        shutdown.cancel();
        if let Err(e) = detector.await {
            warn!(error = ?e, "Change detector did not stop cleanly");
        }
        info!("Station stopped");
        Ok(())
    }
}
