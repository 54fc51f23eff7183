//! Printer transport adapters
//!
//! Supports:
//! - Serial device node (the station's TTL printer, fixed baud)
//! - Network printers (raw TCP port 9100, bench use)
//!
//! Both transports are fire-and-forget: the mechanism has no
//! acknowledgement path, so a successful write means the bytes were
//! handed to the channel, nothing more.

use crate::error::{PrintError, PrintResult};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

/// Trait for printer transports
#[async_trait]
pub trait Printer: Send + Sync {
    /// Send raw escape-sequence data to the printer
    async fn print(&self, data: &[u8]) -> PrintResult<()>;

    /// Check if the printer is online/reachable
    async fn is_online(&self) -> bool;
}

/// Serial printer behind a device node (e.g. `/dev/ttyS1`)
///
/// The line discipline and baud rate are configured by the system
/// (udev); this adapter only writes bytes. The mechanism has a small
/// receive buffer and no flow control, so writes are paced in chunks
/// sized to stay under the buffer at the configured baud. The pacing
/// also gives style transitions time to settle before more data
/// arrives.
#[derive(Debug, Clone)]
pub struct SerialPrinter {
    path: PathBuf,
    chunk_size: usize,
    chunk_delay: Duration,
    open_timeout: Duration,
}

impl SerialPrinter {
    /// Create a serial printer for the given device node
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            // 64 bytes every 30ms keeps well under 9600 baud
            chunk_size: 64,
            chunk_delay: Duration::from_millis(30),
            open_timeout: Duration::from_secs(2),
        }
    }

    /// Override the write pacing (chunk size in bytes, delay between chunks)
    pub fn with_pacing(mut self, chunk_size: usize, chunk_delay: Duration) -> Self {
        self.chunk_size = chunk_size.max(1);
        self.chunk_delay = chunk_delay;
        self
    }

    /// Get the device node path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Printer for SerialPrinter {
    #[instrument(skip(data), fields(path = %self.path.display(), data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        debug!("Opening printer device");

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true);
        let open = options.open(&self.path);
        let mut device = tokio::time::timeout(self.open_timeout, open)
            .await
            .map_err(|_| PrintError::Timeout(format!("Open timeout: {}", self.path.display())))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.path.display(), e)))?;

        for chunk in data.chunks(self.chunk_size) {
            device.write_all(chunk).await?;
            device.flush().await?;
            tokio::time::sleep(self.chunk_delay).await;
        }

        info!("Print job sent, {} bytes", data.len());
        Ok(())
    }

    async fn is_online(&self) -> bool {
        match tokio::fs::metadata(&self.path).await {
            Ok(_) => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Printer device missing");
                false
            }
        }
    }
}

/// Network printer (raw TCP port 9100)
///
/// Used on the bench where the label stream is captured by a listener
/// instead of the real mechanism.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    addr: SocketAddr,
    timeout: Duration,
}

impl NetworkPrinter {
    /// Create a network printer from a socket address string
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr)))?;

        Ok(Self {
            addr,
            timeout: Duration::from_secs(5),
        })
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the printer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

#[async_trait]
impl Printer for NetworkPrinter {
    #[instrument(skip(data), fields(addr = %self.addr, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        let mut stream = tokio::time::timeout(self.timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr)))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.addr, e)))?;

        stream.write_all(data).await?;
        stream.flush().await?;

        info!("Print job sent, {} bytes", data.len());
        Ok(())
    }

    async fn is_online(&self) -> bool {
        let check_timeout = Duration::from_millis(500);

        match tokio::time::timeout(check_timeout, TcpStream::connect(self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "Printer offline");
                false
            }
            Err(_) => {
                warn!("Printer check timeout");
                false
            }
        }
    }
}
