//! Escape-sequence command builder
//!
//! Provides a fluent API for building the print data understood by
//! the station's serial thermal printer. The command set is the small
//! ESC/POS subset the mechanism implements: emphasis, reverse video,
//! condensed pitch and paper feed. There is no cutter and no cash
//! drawer on this hardware.

use crate::encoding::convert_to_latin1;

/// Escape-sequence command builder
///
/// Builds byte sequences for the thermal printer. All text is
/// converted to Windows-1252 by [`EscPosBuilder::build`]; the numeric
/// command bytes are part of the printer's external contract and must
/// not change.
pub struct EscPosBuilder {
    buf: Vec<u8>,
    width: usize,
}

impl EscPosBuilder {
    /// Create a new builder with the specified paper width in columns
    ///
    /// The station's 58mm paper prints 32 columns in the normal pitch.
    pub fn new(width: usize) -> Self {
        let mut buf = Vec::with_capacity(1024);
        // Initialize printer (ESC @)
        buf.extend_from_slice(&[0x1B, 0x40]);
        Self { buf, width }
    }

    /// Get the configured paper width
    pub fn width(&self) -> usize {
        self.width
    }

    // === Text Output ===

    /// Write raw text (will be Windows-1252 encoded)
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    /// Write empty line
    pub fn newline(&mut self) -> &mut Self {
        self.buf.push(b'\n');
        self
    }

    /// Feed paper by n lines without printing
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        // ESC d n - Print and feed n lines
        self.buf.extend_from_slice(&[0x1B, 0x64, lines]);
        self
    }

    // === Text Style ===

    /// Enable emphasized (bold) printing
    pub fn emphasis_on(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x01]);
        self
    }

    /// Disable emphasized printing
    pub fn emphasis_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x00]);
        self
    }

    /// Enable reverse video (white on black)
    pub fn invert_on(&mut self) -> &mut Self {
        // GS B 1
        self.buf.extend_from_slice(&[0x1D, 0x42, 0x01]);
        self
    }

    /// Disable reverse video
    pub fn invert_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x42, 0x00]);
        self
    }

    /// Switch to the condensed pitch (font B)
    pub fn condensed_on(&mut self) -> &mut Self {
        // ESC ! 1 - master select, font B bit
        self.buf.extend_from_slice(&[0x1B, 0x21, 0x01]);
        self
    }

    /// Back to the normal pitch
    pub fn condensed_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x21, 0x00]);
        self
    }

    /// Reset every style attribute to its default
    ///
    /// Emitted around styled blocks so that style state never bleeds
    /// into later output if a job is interrupted mid-label.
    pub fn reset_styles(&mut self) -> &mut Self {
        self.condensed_off();
        self.emphasis_off();
        self.invert_off();
        self
    }

    // === Raw Commands ===

    /// Write raw bytes directly
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Reset printer to default state (ESC @)
    pub fn reset(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x40]);
        self
    }

    // === Build ===

    /// Build the final byte buffer with Windows-1252 encoding
    ///
    /// Converts all UTF-8 text while preserving the escape commands.
    pub fn build(self) -> Vec<u8> {
        convert_to_latin1(&self.buf)
    }

    /// Build without encoding conversion (for tests and ASCII content)
    pub fn build_raw(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new(32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let mut b = EscPosBuilder::new(32);
        b.invert_on()
            .emphasis_on()
            .line("26/0010")
            .reset_styles()
            .line("Rossi Mario");

        let data = b.build_raw();
        assert!(!data.is_empty());
        // Starts with INIT
        assert_eq!(&data[..2], &[0x1B, 0x40]);
    }

    #[test]
    fn test_reset_styles_clears_everything() {
        let mut b = EscPosBuilder::new(32);
        b.reset_styles();
        let data = b.build_raw();
        // INIT, then condensed off, emphasis off, invert off
        assert_eq!(
            data,
            vec![0x1B, 0x40, 0x1B, 0x21, 0x00, 0x1B, 0x45, 0x00, 0x1D, 0x42, 0x00]
        );
    }

    #[test]
    fn test_feed() {
        let mut b = EscPosBuilder::new(32);
        b.feed(3);
        let data = b.build_raw();
        assert_eq!(&data[2..], &[0x1B, 0x64, 3]);
    }

    #[test]
    fn test_build_encodes_text() {
        let mut b = EscPosBuilder::new(32);
        b.line("caffè");
        let data = b.build();
        // 0xE8 is è in Windows-1252
        assert!(data.contains(&0xE8));
    }
}
