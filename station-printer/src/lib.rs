//! # station-printer
//!
//! Escape-sequence protocol library for the ticket station's thermal
//! printer - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - Escape-sequence command building (emphasis, reverse video,
//!   condensed pitch, paper feed)
//! - Windows-1252 encoding for the Italian character set
//! - Serial device-node transport (fixed baud, paced writes)
//! - Network transport (raw TCP port 9100, bench use)
//!
//! Business logic (WHAT to print) stays in application code:
//! - Repair-ticket label rendering → ticket-station
//!
//! ## Example
//!
//! ```ignore
//! use station_printer::{EscPosBuilder, Printer, SerialPrinter};
//!
//! // Build label content
//! let mut builder = EscPosBuilder::new(32);
//! builder.invert_on();
//! builder.emphasis_on();
//! builder.line("         26/0010          ");
//! builder.reset_styles();
//! builder.line("Rossi Mario");
//! builder.feed(3);
//!
//! // Send to the printer on the serial line
//! let printer = SerialPrinter::new("/dev/ttyS1");
//! printer.print(&builder.build()).await?;
//! ```

mod encoding;
mod error;
mod escpos;
mod printer;

// Re-exports
pub use encoding::{convert_to_latin1, latin1_width, pad_latin1, truncate_latin1};
pub use error::{PrintError, PrintResult};
pub use escpos::EscPosBuilder;
pub use printer::{NetworkPrinter, Printer, SerialPrinter};
