//! Bulk-export parser and ticket snapshot
//!
//! The remote ledger is exported as delimited text: one header line,
//! then one row per ticket. Fields may be quoted (doubled quote
//! escapes an embedded quote) and the tool column embeds a JSON array.
//! The export is externally authored, so nothing here ever errors:
//! malformed rows degrade to empty fields, a malformed tool array
//! degrades to a single tool whose brand is the raw field text.

use crate::model::{flag_from_str, Ticket, ToolEntry, MAX_TOOLS};
use tracing::{debug, warn};

/// Default snapshot capacity
pub const SNAPSHOT_CAPACITY: usize = 50;

const DELIMITER: char = ',';

/// Parser for the bulk ledger export
///
/// Produces a capacity-bounded snapshot, sorted descending by
/// `(year, sequence)`. The snapshot is always replaced wholesale,
/// never patched.
#[derive(Debug, Clone)]
pub struct TicketRepository {
    capacity: usize,
}

impl TicketRepository {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Parse a bulk export into a fresh snapshot
    ///
    /// Rows beyond the capacity bound are dropped from the oldest end
    /// (only the tail of the input is kept). Never fails.
    pub fn refresh(&self, raw: &str) -> Vec<Ticket> {
        let mut rows: Vec<&str> = raw
            .lines()
            .skip(1) // header
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect();

        if rows.len() > self.capacity {
            rows.drain(..rows.len() - self.capacity);
        }

        let mut tickets: Vec<Ticket> = rows
            .into_iter()
            .filter_map(parse_row)
            .collect();

        tickets.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));

        debug!(count = tickets.len(), "Bulk snapshot refreshed");
        tickets
    }
}

impl Default for TicketRepository {
    fn default() -> Self {
        Self::new(SNAPSHOT_CAPACITY)
    }
}

/// Parse one export row; rows without an identifier are dropped
fn parse_row(line: &str) -> Option<Ticket> {
    let fields = split_row(line, DELIMITER);

    let id = fields.first().map(|s| s.trim()).unwrap_or_default();
    if id.is_empty() {
        warn!(line, "Dropping export row without identifier");
        return None;
    }

    let get = |i: usize| fields.get(i).map(|s| s.trim().to_string()).unwrap_or_default();

    Some(Ticket {
        id: id.to_string(),
        delivery_date: get(1),
        customer: get(2),
        address: get(3),
        phone: get(4),
        documentation: flag_from_str(&get(5)),
        tools: parse_tools(&get(6)),
        completed: flag_from_str(&get(7)),
        // trailing columns ignored
    })
}

/// Parse the embedded tool array
///
/// A field that is not a well-formed array is kept as a single tool's
/// brand rather than discarded.
fn parse_tools(field: &str) -> Vec<ToolEntry> {
    if field.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<ToolEntry>>(field) {
        Ok(mut tools) => {
            tools.truncate(MAX_TOOLS);
            tools
        }
        Err(e) => {
            debug!(error = %e, "Tool field is not an array, using raw text as brand");
            vec![ToolEntry {
                brand: field.to_string(),
                ..Default::default()
            }]
        }
    }
}

/// Split one row on the delimiter, quote- and bracket-aware
///
/// Quotes delimit fields CSV-style (a doubled quote is a literal
/// quote). Inside a bracketed region the content is the embedded JSON
/// array, so quotes there are preserved verbatim and the delimiter
/// does not split.
fn split_row(line: &str, delim: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut depth: u32 = 0;

    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                    if depth > 0 {
                        current.push('"');
                    }
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
            if depth > 0 {
                current.push('"');
            }
        } else if c == '[' {
            depth += 1;
            current.push(c);
        } else if c == ']' {
            depth = depth.saturating_sub(1);
            current.push(c);
        } else if c == delim && depth == 0 {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Numero,DataConsegna,Cliente,Indirizzo,Telefono,DDT,Attrezzi,Completata";

    fn with_header(rows: &[&str]) -> String {
        let mut s = String::from(HEADER);
        for r in rows {
            s.push('\n');
            s.push_str(r);
        }
        s
    }

    #[test]
    fn test_scenario_row() {
        let raw = with_header(&[
            r#"26/0010,2025-03-01,Rossi Mario,Via Roma 1,333111222,1,[{"marca":"Trapano","dotazione":"valigetta","note":""}],0"#,
        ]);
        let snap = TicketRepository::default().refresh(&raw);
        assert_eq!(snap.len(), 1);
        let t = &snap[0];
        assert_eq!(t.id, "26/0010");
        assert_eq!(t.delivery_date, "2025-03-01");
        assert_eq!(t.customer, "Rossi Mario");
        assert_eq!(t.address, "Via Roma 1");
        assert_eq!(t.phone, "333111222");
        assert!(t.documentation);
        assert!(!t.completed);
        assert_eq!(t.tools.len(), 1);
        assert_eq!(t.tools[0].brand, "Trapano");
        assert_eq!(t.tools[0].accessory, "valigetta");
        assert!(t.tools[0].note.is_empty());
    }

    #[test]
    fn test_sorted_descending() {
        let raw = with_header(&[
            "25/0100,,,,,0,,0",
            "26/0002,,,,,0,,0",
            "26/0010,,,,,0,,0",
        ]);
        let snap = TicketRepository::default().refresh(&raw);
        let ids: Vec<&str> = snap.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["26/0010", "26/0002", "25/0100"]);
    }

    #[test]
    fn test_capacity_keeps_input_tail() {
        let rows: Vec<String> = (1..=60).map(|i| format!("26/{:04},,,,,0,,0", i)).collect();
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let raw = with_header(&refs);

        let snap = TicketRepository::default().refresh(&raw);
        assert_eq!(snap.len(), 50);
        // The oldest ten rows (head of the input) were dropped
        assert_eq!(snap[0].id, "26/0060");
        assert_eq!(snap.last().unwrap().id, "26/0011");
    }

    #[test]
    fn test_quoted_field_with_delimiter() {
        let raw = with_header(&[r#"26/0001,2025-01-01,"Rossi, Mario",,333,0,,0"#]);
        let snap = TicketRepository::default().refresh(&raw);
        assert_eq!(snap[0].customer, "Rossi, Mario");
    }

    #[test]
    fn test_doubled_quote_escape() {
        let raw = with_header(&[r#"26/0001,,"Bar ""Da Gino""",,333,0,,0"#]);
        let snap = TicketRepository::default().refresh(&raw);
        assert_eq!(snap[0].customer, r#"Bar "Da Gino""#);
    }

    #[test]
    fn test_malformed_tool_field_falls_back_to_brand() {
        let raw = with_header(&["26/0001,,,,,0,Trapano Bosch,0"]);
        let snap = TicketRepository::default().refresh(&raw);
        assert_eq!(snap[0].tools.len(), 1);
        assert_eq!(snap[0].tools[0].brand, "Trapano Bosch");
    }

    #[test]
    fn test_short_row_degrades_to_empty_fields() {
        let raw = with_header(&["26/0001,2025-01-01"]);
        let snap = TicketRepository::default().refresh(&raw);
        assert_eq!(snap[0].id, "26/0001");
        assert!(snap[0].customer.is_empty());
        assert!(snap[0].tools.is_empty());
    }

    #[test]
    fn test_row_without_id_dropped() {
        let raw = with_header(&[",2025-01-01,Someone,,,0,,0", "26/0001,,,,,0,,0"]);
        let snap = TicketRepository::default().refresh(&raw);
        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn test_empty_export() {
        let snap = TicketRepository::default().refresh("");
        assert!(snap.is_empty());
        let snap = TicketRepository::default().refresh(HEADER);
        assert!(snap.is_empty());
    }
}
