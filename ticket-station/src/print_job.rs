//! Print job sequencing
//!
//! One ticket produces `max(1, tool count)` physical labels. Between
//! labels the runner holds a fixed cool-down so the operator can tear
//! the paper, surfacing a per-second countdown to the display
//! collaborator. Transmission is fire-and-forget: the serial channel
//! has no acknowledgement path, so a completed write counts as
//! printed and there is no retry.

use crate::core::state::{StationEvent, StationState};
use crate::model::Ticket;
use crate::render::LabelRenderer;
use station_printer::{PrintResult, Printer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, instrument};

/// Sequences label output for whole tickets
pub struct PrintJobRunner {
    printer: Arc<dyn Printer>,
    renderer: LabelRenderer,
    cooldown: Duration,
    events: broadcast::Sender<StationEvent>,
}

impl PrintJobRunner {
    pub fn new(
        printer: Arc<dyn Printer>,
        renderer: LabelRenderer,
        cooldown: Duration,
        events: broadcast::Sender<StationEvent>,
    ) -> Self {
        Self {
            printer,
            renderer,
            cooldown,
            events,
        }
    }

    /// Number of physical labels a ticket produces
    pub fn label_count(ticket: &Ticket) -> usize {
        ticket.tools.len().max(1)
    }

    /// Print every label of a ticket
    ///
    /// Blocks the calling task until the last label (and cool-downs)
    /// are done. An error aborts the remaining labels; it is reported,
    /// never retried.
    #[instrument(skip(self, ticket), fields(id = %ticket.id))]
    pub async fn print_all(&self, ticket: &Ticket) -> PrintResult<()> {
        let count = Self::label_count(ticket);
        let _ = self.events.send(StationEvent::PrintStarted(ticket.id.clone()));

        for index in 0..count {
            let data = self.renderer.render(ticket, index, count);
            self.printer.print(&data).await?;
            info!(label = index + 1, of = count, "Label transmitted");

            if index + 1 < count {
                self.hold_cooldown().await;
            }
        }

        let _ = self
            .events
            .send(StationEvent::PrintFinished(ticket.id.clone()));
        Ok(())
    }

    /// Let the mechanism advance and the operator tear the paper,
    /// counting down once per second for the display
    async fn hold_cooldown(&self) {
        let mut remaining = self.cooldown.as_secs();
        while remaining > 0 {
            let _ = self.events.send(StationEvent::PrintCountdown(remaining));
            tokio::time::sleep(Duration::from_secs(1)).await;
            remaining -= 1;
        }
    }

    /// Print a ticket and record it in the history ledger
    ///
    /// The caller must already hold the print-in-flight guard. The
    /// identifier is recorded even when transmission fails: the
    /// channel gives no delivery signal either way, and recording
    /// preserves the at-most-once invariant.
    pub async fn execute(&self, state: &StationState, ticket: &Ticket) {
        if let Err(e) = self.print_all(ticket).await {
            error!(id = %ticket.id, error = %e, "Label transmission failed, not retrying");
        }
        state.with_history(|h| {
            h.add(&ticket.id);
            h.persist();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryStore;
    use crate::model::ToolEntry;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Printer fake that records every transmitted buffer
    struct SinkPrinter {
        jobs: Mutex<Vec<Vec<u8>>>,
        fail: bool,
    }

    impl SinkPrinter {
        fn new() -> Self {
            Self {
                jobs: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                jobs: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn job_count(&self) -> usize {
            self.jobs.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Printer for SinkPrinter {
        async fn print(&self, data: &[u8]) -> PrintResult<()> {
            if self.fail {
                return Err(station_printer::PrintError::Offline("fake".into()));
            }
            self.jobs.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        async fn is_online(&self) -> bool {
            !self.fail
        }
    }

    fn runner(printer: Arc<SinkPrinter>) -> PrintJobRunner {
        let (events, _) = broadcast::channel(64);
        PrintJobRunner::new(printer, LabelRenderer::default(), Duration::ZERO, events)
    }

    fn ticket_with_tools(n: usize) -> Ticket {
        Ticket {
            id: "26/0010".into(),
            customer: "Rossi Mario".into(),
            tools: (0..n)
                .map(|i| ToolEntry {
                    brand: format!("Attrezzo {i}"),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_zero_tools_prints_exactly_one_label() {
        let printer = Arc::new(SinkPrinter::new());
        runner(printer.clone())
            .print_all(&ticket_with_tools(0))
            .await
            .unwrap();
        assert_eq!(printer.job_count(), 1);
    }

    #[tokio::test]
    async fn test_one_label_per_tool() {
        let printer = Arc::new(SinkPrinter::new());
        runner(printer.clone())
            .print_all(&ticket_with_tools(3))
            .await
            .unwrap();
        assert_eq!(printer.job_count(), 3);
    }

    #[tokio::test]
    async fn test_transmission_failure_is_not_retried() {
        let printer = Arc::new(SinkPrinter::failing());
        let r = runner(printer.clone());
        assert!(r.print_all(&ticket_with_tools(2)).await.is_err());
        // No buffered retries, nothing transmitted
        assert_eq!(printer.job_count(), 0);
    }

    #[tokio::test]
    async fn test_execute_records_history_even_on_failure() {
        let printer = Arc::new(SinkPrinter::failing());
        let state = StationState::new(HistoryStore::in_memory(10));
        runner(printer).execute(&state, &ticket_with_tools(1)).await;
        assert!(state.was_printed("26/0010"));
    }

    #[tokio::test]
    async fn test_print_events_emitted() {
        let printer = Arc::new(SinkPrinter::new());
        let (events, mut rx) = broadcast::channel(64);
        let r = PrintJobRunner::new(
            printer,
            LabelRenderer::default(),
            Duration::ZERO,
            events,
        );
        r.print_all(&ticket_with_tools(1)).await.unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            StationEvent::PrintStarted("26/0010".into())
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            StationEvent::PrintFinished("26/0010".into())
        );
    }
}
