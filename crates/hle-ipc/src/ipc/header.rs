//! Command header word layout.

use std::fmt;

use serde::{Deserialize, Serialize};

const PARAM_MASK: u32 = 0x3F;
const NORMAL_SHIFT: u32 = 6;
const COMMAND_SHIFT: u32 = 16;

/// First word of every command buffer.
///
/// The upper half carries the command number; the lower half carries the
/// number of normal and translate parameter words that follow, so the raw
/// value doubles as the parameter-shape signature of the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandHeader(u32);

impl CommandHeader {
    /// Builds a header from its fields. Word counts wider than six bits are
    /// masked.
    #[must_use]
    pub const fn new(command: u16, normal_words: u8, translate_words: u8) -> Self {
        let id = (command as u32) << COMMAND_SHIFT;
        let normal = ((normal_words as u32) & PARAM_MASK) << NORMAL_SHIFT;
        let translate = (translate_words as u32) & PARAM_MASK;
        Self(id | normal | translate)
    }

    /// Wraps a raw header word.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw header word.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Command number.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the shift leaves exactly sixteen significant bits"
    )]
    pub const fn command(self) -> u16 {
        (self.0 >> COMMAND_SHIFT) as u16
    }

    /// Number of normal parameter words following the header.
    #[must_use]
    pub const fn normal_words(self) -> usize {
        ((self.0 >> NORMAL_SHIFT) & PARAM_MASK) as usize
    }

    /// Number of translate parameter words following the normal words.
    #[must_use]
    pub const fn translate_words(self) -> usize {
        (self.0 & PARAM_MASK) as usize
    }

    /// Total parameter words announced by the header.
    #[must_use]
    pub const fn payload_words(self) -> usize {
        self.normal_words() + self.translate_words()
    }

    /// Returns `true` when both headers announce the same word counts.
    #[must_use]
    pub const fn signature_matches(self, other: Self) -> bool {
        (self.0 & 0xFFFF) == (other.0 & 0xFFFF)
    }
}

impl From<u32> for CommandHeader {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CommandHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0x0001_0040, 0x0001, 1, 0)]
    #[case(0x000C_0104, 0x000C, 4, 4)]
    #[case(0x0037_0042, 0x0037, 1, 2)]
    #[case(0x0102_0000, 0x0102, 0, 0)]
    fn decodes_header_fields(
        #[case] raw: u32,
        #[case] command: u16,
        #[case] normal: usize,
        #[case] translate: usize,
    ) {
        let header = CommandHeader::from_raw(raw);
        assert_eq!(header.command(), command);
        assert_eq!(header.normal_words(), normal);
        assert_eq!(header.translate_words(), translate);
    }

    #[test]
    fn new_encodes_the_same_layout() {
        assert_eq!(CommandHeader::new(0x000C, 4, 4).raw(), 0x000C_0104);
        assert_eq!(CommandHeader::new(0x0046, 4, 4).raw(), 0x0046_0104);
    }

    #[test]
    fn signature_compares_word_counts_only() {
        let sent = CommandHeader::from_raw(0x0001_0040);
        assert!(sent.signature_matches(CommandHeader::from_raw(0x0002_0040)));
        assert!(!sent.signature_matches(CommandHeader::from_raw(0x0001_0080)));
    }

    #[test]
    fn displays_as_padded_hex() {
        assert_eq!(CommandHeader::from_raw(0x0001_0040).to_string(), "0x00010040");
    }
}
