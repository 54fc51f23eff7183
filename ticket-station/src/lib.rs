//! Ticket Station - repair-ticket label appliance
//!
//! Drives the service counter's label printer: continuously
//! synchronizes against the remote repair-ticket ledger, prints a
//! label set for every new ticket exactly once, and reconciles the
//! on-device snapshot against the bulk export.
//!
//! # Module structure
//!
//! ```text
//! ticket-station/src/
//! ├── core/          # config, shared state, station orchestration
//! ├── common/        # logging setup
//! ├── model.rs       # Ticket / ToolEntry value types
//! ├── schedule.rs    # polling cadence (busy / transition / idle)
//! ├── repository.rs  # bulk-export parser, 50-entry snapshot
//! ├── history.rs     # printed-id ledger, 200-entry FIFO set
//! ├── ledger.rs      # remote ledger client (poll + bulk + status)
//! ├── render.rs      # label layout on the escape protocol
//! ├── print_job.rs   # per-tool label sequencing, cool-downs
//! └── poller.rs      # change detector state machine
//! ```

pub mod common;
pub mod core;
pub mod history;
pub mod ledger;
pub mod model;
pub mod poller;
pub mod print_job;
pub mod render;
pub mod repository;
pub mod schedule;

// Re-export public types
pub use crate::core::{Config, Station, StationError, StationEvent, StationState};
pub use history::HistoryStore;
pub use ledger::{HttpLedger, Ledger, PollOutcome, RemoteCommand, StatusReport};
pub use model::{Ticket, ToolEntry};
pub use poller::{ChangeDetector, ReconcilePolicy};
pub use print_job::PrintJobRunner;
pub use render::LabelRenderer;
pub use repository::TicketRepository;
pub use schedule::PollCadence;

// Re-export logger setup
pub use common::logger::init_logger;

/// Load `.env` before the configuration is read
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
  ______ _      __        __
 /_  __/(_)____/ /_____  / /_
  / /  / // ___/ //_/ _ \/ __/
 / /  / // /__/ ,< /  __/ /_
/_/  /_/ \___/_/|_|\___/\__/
   _____ __        __  _
  / ___// /_____ _/ /_(_)___  ____
  \__ \/ __/ __ `/ __/ / __ \/ __ \
 ___/ / /_/ /_/ / /_/ / /_/ / / / /
/____/\__/\__,_/\__/_/\____/_/ /_/
    "#
    );
}
