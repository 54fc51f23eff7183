//! Label rendering
//!
//! Converts one ticket (plus tool index) into the exact byte stream
//! for a single physical label. Deterministic 32-column layout:
//!
//! 1. inverted + emphasized header with the identifier, padded to the
//!    full row so the reverse video spans the paper width
//! 2. protocol feed spacer
//! 3. customer line, `" - DDT"` suffix when documentation is attached
//! 4. condensed date / phone / address line
//! 5. tool line (brand - accessory), brand truncated first
//! 6. optional condensed note line, never truncated
//! 7. trailing feed to the tear-off point
//!
//! The escape command bytes come from `station-printer`; they are an
//! external contract with the mechanism.

use crate::model::Ticket;
use station_printer::{latin1_width, truncate_latin1, EscPosBuilder};

/// Printable columns in the normal pitch
pub const LABEL_WIDTH: usize = 32;

/// Suffix appended to the customer line when a transport document is attached
const DDT_SUFFIX: &str = " - DDT";

/// Marker appended where text had to be cut
const TRUNCATION_MARK: &str = ".";

/// Renders repair tickets into printable labels
#[derive(Debug, Clone)]
pub struct LabelRenderer {
    width: usize,
}

impl LabelRenderer {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    /// Render one physical label
    ///
    /// `tool_index` selects which tool line to print; an out-of-range
    /// index (the zero-tool ticket) omits the tool section.
    /// `tool_count` drives the `(i/n)` header suffix and is always
    /// `max(1, tools.len())` on the caller's side.
    pub fn render(&self, ticket: &Ticket, tool_index: usize, tool_count: usize) -> Vec<u8> {
        let mut b = EscPosBuilder::new(self.width);

        // Header: style resets on both sides so interrupted jobs never
        // leak reverse video into later output
        b.reset_styles();
        b.invert_on().emphasis_on();
        b.line(&self.header_text(&ticket.id, tool_index, tool_count));
        b.reset_styles();

        // Spacer (vertical feed, not a printed line)
        b.feed(1);

        b.line(&self.customer_line(ticket));

        let info = self.info_line(ticket);
        if !info.is_empty() {
            b.condensed_on();
            b.line(&info);
            b.condensed_off();
        }

        if let Some(tool) = ticket.tools.get(tool_index) {
            b.line(&self.tool_line(&tool.brand, &tool.accessory));

            if !tool.note.is_empty() {
                b.condensed_on();
                b.line(&tool.note);
                b.condensed_off();
            }
        }

        // Park the label at the tear-off point
        b.feed(3);

        b.build()
    }

    /// Header row: identifier plus `(i/n)` when the ticket spans
    /// several labels, centered and padded to exactly the row width
    fn header_text(&self, id: &str, tool_index: usize, tool_count: usize) -> String {
        let text = if tool_count > 1 {
            format!("{} ({}/{})", id, tool_index + 1, tool_count)
        } else {
            id.to_string()
        };
        let text = truncate_latin1(&text, self.width);

        let pad = self.width - latin1_width(&text);
        let left = pad / 2;
        format!(
            "{}{}{}",
            " ".repeat(left),
            text,
            " ".repeat(pad - left)
        )
    }

    /// Customer line with the documentation suffix
    ///
    /// The suffix must always fit, so the name is truncated first and
    /// the suffix appended after truncation, never before.
    fn customer_line(&self, ticket: &Ticket) -> String {
        if ticket.documentation {
            let budget = self.width.saturating_sub(latin1_width(DDT_SUFFIX));
            format!("{}{}", truncate_marked(&ticket.customer, budget), DDT_SUFFIX)
        } else {
            truncate_marked(&ticket.customer, self.width)
        }
    }

    /// Condensed line: `DD.MM.YY - phone - address`, empty parts skipped
    ///
    /// No wrapping is performed here; the condensed pitch gives the
    /// line more columns and overflow is the printer's problem.
    fn info_line(&self, ticket: &Ticket) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if !ticket.delivery_date.is_empty() {
            parts.push(format_date(&ticket.delivery_date));
        }
        if !ticket.phone.is_empty() {
            parts.push(ticket.phone.clone());
        }
        if !ticket.address.is_empty() {
            parts.push(ticket.address.clone());
        }
        parts.join(" - ")
    }

    /// Tool line: `brand - accessory`, jointly truncated
    ///
    /// When the pair does not fit, the brand gives way first (with the
    /// truncation marker); an absent accessory leaves the whole row to
    /// the brand.
    fn tool_line(&self, brand: &str, accessory: &str) -> String {
        if accessory.is_empty() {
            return truncate_marked(brand, self.width);
        }

        let joined = format!("{} - {}", brand, accessory);
        if latin1_width(&joined) <= self.width {
            return joined;
        }

        let brand_budget = self
            .width
            .saturating_sub(3 + latin1_width(accessory));
        if brand_budget >= 2 {
            format!("{} - {}", truncate_marked(brand, brand_budget), accessory)
        } else {
            // Accessory alone overflows the row: cut the joined pair
            truncate_marked(&joined, self.width)
        }
    }
}

impl Default for LabelRenderer {
    fn default() -> Self {
        Self::new(LABEL_WIDTH)
    }
}

/// Truncate to `max` columns, reserving room for the trailing marker
fn truncate_marked(s: &str, max: usize) -> String {
    if latin1_width(s) <= max {
        return s.to_string();
    }
    let cut = max.saturating_sub(latin1_width(TRUNCATION_MARK));
    format!("{}{}", truncate_latin1(s, cut), TRUNCATION_MARK)
}

/// `YYYY-MM-DD` → `DD.MM.YY`; anything unparsable passes through
fn format_date(iso: &str) -> String {
    match chrono::NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
        Ok(d) => d.format("%d.%m.%y").to_string(),
        Err(_) => iso.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolEntry;

    fn ticket() -> Ticket {
        Ticket {
            id: "26/0010".into(),
            delivery_date: "2025-03-01".into(),
            customer: "Rossi Mario".into(),
            phone: "333111222".into(),
            address: "Via Roma 1".into(),
            documentation: false,
            completed: false,
            tools: vec![ToolEntry {
                brand: "Trapano".into(),
                accessory: "valigetta".into(),
                note: String::new(),
            }],
        }
    }

    fn r() -> LabelRenderer {
        LabelRenderer::default()
    }

    #[test]
    fn test_header_single_label_has_no_counter() {
        let h = r().header_text("26/0010", 0, 1);
        assert_eq!(latin1_width(&h), LABEL_WIDTH);
        assert!(h.contains("26/0010"));
        assert!(!h.contains('('));
    }

    #[test]
    fn test_header_multi_label_counter() {
        let h = r().header_text("26/0010", 1, 3);
        assert_eq!(latin1_width(&h), LABEL_WIDTH);
        assert!(h.contains("26/0010 (2/3)"));
        // Centered: padding on both sides
        assert!(h.starts_with(' ') && h.ends_with(' '));
    }

    #[test]
    fn test_customer_line_plain() {
        let line = r().customer_line(&ticket());
        assert_eq!(line, "Rossi Mario");
    }

    #[test]
    fn test_customer_overflow_keeps_ddt_suffix() {
        let mut t = ticket();
        t.customer = "Societa Agricola Fratelli Esposito e Figli".into();
        t.documentation = true;
        let line = r().customer_line(&t);

        assert!(latin1_width(&line) <= LABEL_WIDTH);
        assert!(line.ends_with(" - DDT"));
        // Truncation marker sits right before the suffix
        let name = line.strip_suffix(" - DDT").unwrap();
        assert!(name.ends_with('.'));
    }

    #[test]
    fn test_customer_overflow_without_suffix() {
        let mut t = ticket();
        t.customer = "X".repeat(40);
        let line = r().customer_line(&t);
        assert_eq!(latin1_width(&line), LABEL_WIDTH);
        assert!(line.ends_with('.'));
    }

    #[test]
    fn test_info_line_skips_empty_parts() {
        let mut t = ticket();
        t.address.clear();
        assert_eq!(r().info_line(&t), "01.03.25 - 333111222");

        t.phone.clear();
        assert_eq!(r().info_line(&t), "01.03.25");
    }

    #[test]
    fn test_info_line_bad_date_passes_through() {
        let mut t = ticket();
        t.delivery_date = "domani".into();
        t.phone.clear();
        t.address.clear();
        assert_eq!(r().info_line(&t), "domani");
    }

    #[test]
    fn test_tool_line_fits() {
        assert_eq!(r().tool_line("Trapano", "valigetta"), "Trapano - valigetta");
    }

    #[test]
    fn test_tool_line_brand_truncated_first() {
        let line = r().tool_line("Smerigliatrice angolare Bosch GWS", "valigetta");
        assert!(latin1_width(&line) <= LABEL_WIDTH);
        assert!(line.ends_with(" - valigetta"));
        assert!(line.strip_suffix(" - valigetta").unwrap().ends_with('.'));
    }

    #[test]
    fn test_tool_line_no_accessory() {
        let line = r().tool_line(&"B".repeat(40), "");
        assert_eq!(latin1_width(&line), LABEL_WIDTH);
        assert!(line.ends_with('.'));
    }

    #[test]
    fn test_tool_line_huge_accessory() {
        let line = r().tool_line("Flex", &"a".repeat(40));
        assert!(latin1_width(&line) <= LABEL_WIDTH);
        assert!(line.ends_with('.'));
    }

    #[test]
    fn test_render_zero_tools_omits_tool_section() {
        let mut t = ticket();
        t.tools.clear();
        let bytes = r().render(&t, 0, 1);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("26/0010"));
        assert!(!text.contains("Trapano"));
    }

    #[test]
    fn test_render_ends_with_tear_off_feed() {
        let bytes = r().render(&ticket(), 0, 1);
        // ESC d 3
        assert_eq!(&bytes[bytes.len() - 3..], &[0x1B, 0x64, 3]);
    }

    #[test]
    fn test_render_note_printed_condensed() {
        let mut t = ticket();
        t.tools[0].note = "cavo danneggiato".into();
        let bytes = r().render(&t, 0, 1);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("cavo danneggiato"));
    }
}
