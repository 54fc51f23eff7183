//! Remote ledger client
//!
//! Two collaborators live behind one trait: the fast single-record
//! poll endpoint and the slow bulk export. The poll response's `ts`
//! field is overloaded by the ledger - a number is the change marker,
//! a string is a remote command token - so the decoded result is the
//! tagged [`PollOutcome`] union rather than a marker plus flags.

use crate::model::{flag_from_value, Ticket};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Ledger error types
#[derive(Debug, Error)]
pub enum LedgerError {
    /// HTTP request failed (transport, timeout, non-2xx)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// A command pushed through the poll channel instead of a marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Restart the appliance
    Reboot,
    /// Trigger the firmware update path (handled outside this core)
    Update,
    /// Report device status back to the ledger
    Status,
    /// Force a reprint of one identifier, bypassing the history check
    Reprint(String),
}

impl RemoteCommand {
    /// Parse a wire token; `None` for unknown tokens
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if let Some(id) = token.strip_prefix("print:") {
            let id = id.trim();
            if id.is_empty() {
                return None;
            }
            return Some(RemoteCommand::Reprint(id.to_string()));
        }
        match token {
            "reboot" => Some(RemoteCommand::Reboot),
            "update" => Some(RemoteCommand::Update),
            "status" => Some(RemoteCommand::Status),
            _ => None,
        }
    }
}

/// Decoded result of one poll request
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Marker updated, nothing new to print
    NoChange { marker: i64 },
    /// The ledger pushed a command; the marker is left untouched
    Command(RemoteCommand),
    /// A changed record arrived with the new marker
    NewTicket { marker: i64, ticket: Ticket },
}

/// Device status posted back on the `status` command
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub version: String,
    pub marker: i64,
    pub history_len: usize,
    pub uptime_secs: u64,
}

/// Raw wire shape of the poll response
#[derive(Debug, Deserialize)]
struct PollPayload {
    ts: serde_json::Value,
    #[serde(default)]
    changed: serde_json::Value,
    #[serde(default)]
    riparazione: Option<Ticket>,
}

/// Classify a raw poll payload into a [`PollOutcome`]
fn classify(payload: PollPayload) -> LedgerResult<PollOutcome> {
    match &payload.ts {
        serde_json::Value::String(token) => match RemoteCommand::parse(token) {
            Some(cmd) => Ok(PollOutcome::Command(cmd)),
            None => Err(LedgerError::InvalidResponse(format!(
                "unknown command token: {token:?}"
            ))),
        },
        serde_json::Value::Number(n) => {
            let marker = n.as_i64().ok_or_else(|| {
                LedgerError::InvalidResponse(format!("non-integer marker: {n}"))
            })?;

            if !flag_from_value(&payload.changed) {
                return Ok(PollOutcome::NoChange { marker });
            }

            match payload.riparazione {
                Some(ticket) if !ticket.id.is_empty() => {
                    Ok(PollOutcome::NewTicket { marker, ticket })
                }
                _ => {
                    // Changed flag without a record: nothing printable
                    debug!(marker, "Changed flag set but no record attached");
                    Ok(PollOutcome::NoChange { marker })
                }
            }
        }
        other => Err(LedgerError::InvalidResponse(format!(
            "unexpected ts value: {other}"
        ))),
    }
}

/// Remote ledger collaborator
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Query the single-record endpoint with the last-known marker
    async fn poll(&self, last_marker: i64) -> LedgerResult<PollOutcome>;

    /// Fetch a fresh bulk export (delimited text)
    async fn fetch_bulk(&self) -> LedgerResult<String>;

    /// Post a device status report
    async fn report_status(&self, report: &StatusReport) -> LedgerResult<()>;
}

/// HTTP implementation of the ledger collaborator
#[derive(Debug, Clone)]
pub struct HttpLedger {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLedger {
    /// Create a client with a bounded request timeout
    ///
    /// There is no cancellation: a stuck request consumes the full
    /// timeout before the poll loop continues.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> LedgerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, action: &str) -> String {
        format!("{}?action={}", self.base_url.trim_end_matches('/'), action)
    }
}

#[async_trait]
impl Ledger for HttpLedger {
    #[instrument(skip(self))]
    async fn poll(&self, last_marker: i64) -> LedgerResult<PollOutcome> {
        let url = format!("{}&ts={}", self.url("check"), last_marker);
        let payload: PollPayload = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        classify(payload)
    }

    #[instrument(skip(self))]
    async fn fetch_bulk(&self) -> LedgerResult<String> {
        let text = self
            .client
            .get(self.url("export"))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    #[instrument(skip(self, report))]
    async fn report_status(&self, report: &StatusReport) -> LedgerResult<()> {
        self.client
            .post(self.url("status"))
            .json(report)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_str(json: &str) -> LedgerResult<PollOutcome> {
        classify(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_no_change() {
        let out = classify_str(r#"{"ts": 1700000000, "changed": false, "riparazione": null}"#)
            .unwrap();
        assert_eq!(out, PollOutcome::NoChange { marker: 1700000000 });
    }

    #[test]
    fn test_new_ticket() {
        let out = classify_str(
            r#"{"ts": 1700000000, "changed": true, "riparazione": {"Numero": "26/0011"}}"#,
        )
        .unwrap();
        match out {
            PollOutcome::NewTicket { marker, ticket } => {
                assert_eq!(marker, 1700000000);
                assert_eq!(ticket.id, "26/0011");
            }
            other => panic!("expected NewTicket, got {other:?}"),
        }
    }

    #[test]
    fn test_changed_without_record_degrades_to_no_change() {
        let out = classify_str(r#"{"ts": 5, "changed": true, "riparazione": null}"#).unwrap();
        assert_eq!(out, PollOutcome::NoChange { marker: 5 });
    }

    #[test]
    fn test_command_tokens() {
        let out = classify_str(r#"{"ts": "reboot"}"#).unwrap();
        assert_eq!(out, PollOutcome::Command(RemoteCommand::Reboot));

        let out = classify_str(r#"{"ts": "print:26/0012"}"#).unwrap();
        assert_eq!(
            out,
            PollOutcome::Command(RemoteCommand::Reprint("26/0012".into()))
        );
    }

    #[test]
    fn test_unknown_token_is_invalid() {
        assert!(classify_str(r#"{"ts": "explode"}"#).is_err());
        assert!(classify_str(r#"{"ts": "print:"}"#).is_err());
    }

    #[test]
    fn test_remote_command_parse() {
        assert_eq!(RemoteCommand::parse("status"), Some(RemoteCommand::Status));
        assert_eq!(RemoteCommand::parse("update"), Some(RemoteCommand::Update));
        assert_eq!(
            RemoteCommand::parse("print: 26/7 "),
            Some(RemoteCommand::Reprint("26/7".into()))
        );
        assert_eq!(RemoteCommand::parse("rm -rf"), None);
    }
}
