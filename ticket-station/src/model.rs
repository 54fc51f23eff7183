//! Ticket data model
//!
//! A `Ticket` is one repair ticket to be labeled. The identifier
//! (`YY/NNNN`) is the sole identity; every other field may be empty.
//! Tickets are value types: constructed from a bulk-export row or a
//! poll response, never mutated afterwards.
//!
//! The serde field names follow the remote ledger's record format
//! (Italian column names).

use serde::{Deserialize, Deserializer};

/// A ticket carries at most this many tool line items
pub const MAX_TOOLS: usize = 5;

/// One tool/accessory line item within a ticket
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ToolEntry {
    /// Brand / model text
    #[serde(default, rename = "marca")]
    pub brand: String,
    /// Accessory description (case, charger, ...)
    #[serde(default, rename = "dotazione")]
    pub accessory: String,
    /// Free-text note (defect description)
    #[serde(default, rename = "note")]
    pub note: String,
}

/// One repair ticket
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ticket {
    /// Identifier in `YY/NNNN` format, unique key
    #[serde(rename = "Numero")]
    pub id: String,

    /// Promised delivery date, ISO `YYYY-MM-DD`
    #[serde(default, rename = "DataConsegna")]
    pub delivery_date: String,

    /// Customer name
    #[serde(default, rename = "Cliente")]
    pub customer: String,

    /// Customer phone
    #[serde(default, rename = "Telefono")]
    pub phone: String,

    /// Customer address
    #[serde(default, rename = "Indirizzo")]
    pub address: String,

    /// Tool line items, at most [`MAX_TOOLS`]
    #[serde(default, rename = "Attrezzi", deserialize_with = "de_tools")]
    pub tools: Vec<ToolEntry>,

    /// Repair completed flag
    #[serde(default, rename = "Completata", deserialize_with = "de_flag")]
    pub completed: bool,

    /// Transport document (DDT) attached flag
    #[serde(default, rename = "DDT", deserialize_with = "de_flag")]
    pub documentation: bool,
}

impl Ticket {
    /// Sort key `(year, sequence)` extracted from the identifier
    ///
    /// Malformed identifiers sort as `(0, 0)`, i.e. oldest.
    pub fn sort_key(&self) -> (u32, u32) {
        parse_id(&self.id)
    }
}

/// Parse a `YY/NNNN` identifier into `(year, sequence)`
pub fn parse_id(id: &str) -> (u32, u32) {
    let mut parts = id.splitn(2, '/');
    let year = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(0);
    let seq = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(0);
    (year, seq)
}

/// The ledger is loose about boolean columns: accepts true/false,
/// 0/1 (number or string) and the Italian yes
fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(flag_from_value(&value))
}

pub(crate) fn flag_from_value(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        serde_json::Value::String(s) => flag_from_str(s),
        _ => false,
    }
}

pub(crate) fn flag_from_str(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "si" | "sì"
    )
}

fn de_tools<'de, D>(deserializer: D) -> Result<Vec<ToolEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut tools = Vec::<ToolEntry>::deserialize(deserializer)?;
    tools.truncate(MAX_TOOLS);
    Ok(tools)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("26/0010"), (26, 10));
        assert_eq!(parse_id("25/1234"), (25, 1234));
        assert_eq!(parse_id("garbage"), (0, 0));
        assert_eq!(parse_id(""), (0, 0));
    }

    #[test]
    fn test_ticket_from_poll_record() {
        let json = r#"{
            "Numero": "26/0011",
            "DataConsegna": "2026-03-02",
            "Cliente": "Bianchi Anna",
            "Telefono": "3334455",
            "Indirizzo": "Via Po 2",
            "DDT": 1,
            "Attrezzi": [{"marca": "Flex", "dotazione": "", "note": "non parte"}],
            "Completata": "0"
        }"#;
        let t: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(t.id, "26/0011");
        assert_eq!(t.customer, "Bianchi Anna");
        assert!(t.documentation);
        assert!(!t.completed);
        assert_eq!(t.tools.len(), 1);
        assert_eq!(t.tools[0].brand, "Flex");
        assert_eq!(t.tools[0].note, "non parte");
    }

    #[test]
    fn test_ticket_all_fields_optional_but_id() {
        let t: Ticket = serde_json::from_str(r#"{"Numero": "26/0001"}"#).unwrap();
        assert_eq!(t.id, "26/0001");
        assert!(t.customer.is_empty());
        assert!(t.tools.is_empty());
    }

    #[test]
    fn test_tools_capped() {
        let tools: Vec<String> = (0..8)
            .map(|i| format!(r#"{{"marca": "m{}"}}"#, i))
            .collect();
        let json = format!(r#"{{"Numero": "26/1", "Attrezzi": [{}]}}"#, tools.join(","));
        let t: Ticket = serde_json::from_str(&json).unwrap();
        assert_eq!(t.tools.len(), MAX_TOOLS);
    }

    #[test]
    fn test_flag_variants() {
        for v in ["1", "true", "si", "Sì"] {
            assert!(flag_from_str(v), "{v} should be true");
        }
        for v in ["0", "false", "", "no"] {
            assert!(!flag_from_str(v), "{v} should be false");
        }
    }
}
