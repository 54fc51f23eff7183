//! Station configuration
//!
//! All knobs come from the environment with sane appliance defaults.
//! The value is built once in `main` and passed by reference into the
//! components that need it - there are no free-standing globals.
//!
//! | Environment variable | Default | Meaning |
//! |----------------------|---------|---------|
//! | WORK_DIR | /var/lib/ticket-station | history file, logs |
//! | LEDGER_URL | http://localhost:8080/ledger | remote ledger endpoint |
//! | REQUEST_TIMEOUT_SECS | 15 | HTTP request timeout |
//! | PRINTER_DEVICE | /dev/ttyS1 | serial device node |
//! | PRINTER_ADDR | (unset) | TCP printer override, bench use |
//! | LABEL_WIDTH | 32 | printable columns |
//! | LABEL_COOLDOWN_SECS | 6 | pause between physical labels |
//! | HISTORY_CAPACITY | 200 | printed-id ledger size |
//! | SNAPSHOT_CAPACITY | 50 | repository snapshot size |
//! | RECONCILE_ATTEMPTS | 5 | bulk refresh retry budget |
//! | RECONCILE_BACKOFF_SECS | 3 | fixed backoff between retries |
//! | RECONCILE_SETTLE_SECS | 2 | delay before the first retry |
//! | LOG_TO_FILE | false | daily-rotating file log in WORK_DIR/logs |

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the history file and logs
    pub work_dir: String,
    /// Remote ledger base URL
    pub ledger_url: String,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// Serial device node of the thermal printer
    pub printer_device: String,
    /// Optional TCP printer address (overrides the serial device)
    pub printer_addr: Option<String>,
    /// Printable label width in columns
    pub label_width: usize,
    /// Cool-down between physical labels in seconds
    pub label_cooldown_secs: u64,
    /// Print-history capacity
    pub history_capacity: usize,
    /// Repository snapshot capacity
    pub snapshot_capacity: usize,
    /// Reconciliation retry budget
    pub reconcile_attempts: u32,
    /// Fixed backoff between reconciliation retries, seconds
    pub reconcile_backoff_secs: u64,
    /// Settle delay before the first reconciliation attempt, seconds
    pub reconcile_settle_secs: u64,
    /// Whether to also log to a daily-rotating file
    pub log_to_file: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR")
                .unwrap_or_else(|_| "/var/lib/ticket-station".into()),
            ledger_url: std::env::var("LEDGER_URL")
                .unwrap_or_else(|_| "http://localhost:8080/ledger".into()),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 15),
            printer_device: std::env::var("PRINTER_DEVICE").unwrap_or_else(|_| "/dev/ttyS1".into()),
            printer_addr: std::env::var("PRINTER_ADDR").ok().filter(|s| !s.is_empty()),
            label_width: env_or("LABEL_WIDTH", crate::render::LABEL_WIDTH),
            label_cooldown_secs: env_or("LABEL_COOLDOWN_SECS", 6),
            history_capacity: env_or("HISTORY_CAPACITY", crate::history::HISTORY_CAPACITY),
            snapshot_capacity: env_or("SNAPSHOT_CAPACITY", crate::repository::SNAPSHOT_CAPACITY),
            reconcile_attempts: env_or("RECONCILE_ATTEMPTS", 5),
            reconcile_backoff_secs: env_or("RECONCILE_BACKOFF_SECS", 3),
            reconcile_settle_secs: env_or("RECONCILE_SETTLE_SECS", 2),
            log_to_file: env_or("LOG_TO_FILE", false),
        }
    }

    /// Override the paths that matter in tests
    pub fn with_overrides(work_dir: impl Into<String>, ledger_url: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.ledger_url = ledger_url.into();
        config
    }

    /// Path of the persisted print-history file
    pub fn history_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("printed.txt")
    }

    /// Path of the log directory
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::with_overrides("/tmp/ts-test", "http://example.invalid");
        assert_eq!(c.label_width, 32);
        assert_eq!(c.history_capacity, 200);
        assert_eq!(c.snapshot_capacity, 50);
        assert_eq!(c.history_path(), PathBuf::from("/tmp/ts-test/printed.txt"));
    }
}
