//! Shared station state
//!
//! Two execution contexts touch this state: the background change
//! detector (writer) and the foreground UI (reader, plus the manual
//! reprint path). Instead of raw shared booleans, every signal has a
//! single owner and an explicit primitive:
//!
//! - repository snapshot: `RwLock`, replaced wholesale by the poller
//! - print history: `Mutex<HistoryStore>`
//! - change marker: `AtomicI64`
//! - print-in-flight: `AtomicBool` acquired with compare-exchange
//! - connectivity: `watch` channel (edge-triggered for the UI)
//! - station events: `broadcast` channel (redraw, print progress)

use crate::history::HistoryStore;
use crate::model::Ticket;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Instant;
use tokio::sync::{broadcast, watch};
use tracing::info;

/// Events pushed to the (external) UI collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationEvent {
    /// The repository snapshot was replaced; redraw against it
    DataRefreshed,
    /// Label output started for an identifier
    PrintStarted(String),
    /// Seconds remaining in the inter-label cool-down
    PrintCountdown(u64),
    /// All labels for an identifier were transmitted
    PrintFinished(String),
    /// The ledger asked for a reboot; an external supervisor acts on it
    RebootRequested,
    /// The ledger asked for a firmware update (handled outside this core)
    UpdateRequested,
}

/// Shared state of the appliance
pub struct StationState {
    snapshot: RwLock<Vec<Ticket>>,
    history: Mutex<HistoryStore>,
    marker: AtomicI64,
    printing: AtomicBool,
    started_at: Instant,
    events: broadcast::Sender<StationEvent>,
    online_tx: watch::Sender<bool>,
}

impl StationState {
    pub fn new(history: HistoryStore) -> Self {
        let (events, _) = broadcast::channel(32);
        let (online_tx, _) = watch::channel(true);
        Self {
            snapshot: RwLock::new(Vec::new()),
            history: Mutex::new(history),
            marker: AtomicI64::new(0),
            printing: AtomicBool::new(false),
            started_at: Instant::now(),
            events,
            online_tx,
        }
    }

    // === Repository snapshot ===

    /// Current snapshot (cloned; tickets are small value types)
    pub fn snapshot(&self) -> Vec<Ticket> {
        self.snapshot.read().expect("snapshot lock poisoned").clone()
    }

    /// Replace the snapshot wholesale
    pub fn replace_snapshot(&self, tickets: Vec<Ticket>) {
        *self.snapshot.write().expect("snapshot lock poisoned") = tickets;
    }

    /// Look up one ticket by identifier in the current snapshot
    pub fn find_ticket(&self, id: &str) -> Option<Ticket> {
        self.snapshot
            .read()
            .expect("snapshot lock poisoned")
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    // === Print history ===

    /// Has a physical label ever been produced for this identifier
    pub fn was_printed(&self, id: &str) -> bool {
        self.history.lock().expect("history lock poisoned").contains(id)
    }

    /// Run a closure against the history store under its lock
    pub fn with_history<R>(&self, f: impl FnOnce(&mut HistoryStore) -> R) -> R {
        f(&mut self.history.lock().expect("history lock poisoned"))
    }

    // === Change marker ===

    pub fn marker(&self) -> i64 {
        self.marker.load(Ordering::Acquire)
    }

    pub fn set_marker(&self, marker: i64) {
        self.marker.store(marker, Ordering::Release);
    }

    // === Print-in-flight guard ===

    /// Try to acquire the print guard; `false` when a job is in flight
    pub fn try_begin_print(&self) -> bool {
        self.printing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn end_print(&self) {
        self.printing.store(false, Ordering::Release);
    }

    /// Whether a print job is currently in flight
    pub fn is_printing(&self) -> bool {
        self.printing.load(Ordering::Acquire)
    }

    // === Signals ===

    /// Sender half for components that emit events (print runner)
    pub fn events_sender(&self) -> broadcast::Sender<StationEvent> {
        self.events.clone()
    }

    /// Subscribe to station events (UI collaborator)
    pub fn subscribe_events(&self) -> broadcast::Receiver<StationEvent> {
        self.events.subscribe()
    }

    /// Emit an event; a missing receiver is not an error
    pub fn emit(&self, event: StationEvent) {
        let _ = self.events.send(event);
    }

    /// Record connectivity, logging and signalling only on edges
    pub fn set_online(&self, online: bool) {
        let changed = self.online_tx.send_if_modified(|current| {
            if *current != online {
                *current = online;
                true
            } else {
                false
            }
        });
        if changed {
            if online {
                info!("Ledger connectivity restored");
            } else {
                info!("Ledger unreachable, will retry on next scheduled poll");
            }
        }
    }

    /// Watch half of the connectivity signal (UI collaborator)
    pub fn connectivity(&self) -> watch::Receiver<bool> {
        self.online_tx.subscribe()
    }

    /// Seconds since the state was constructed
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
