//! Wire format codes.

use std::fmt;

/// Data format code used on the wire. Every value travels in exactly one of
/// these two encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i16)]
pub enum Format {
    /// Text format (human-readable).
    #[default]
    Text = 0,
    /// Binary format (type-specific packed representation).
    Binary = 1,
}

impl Format {
    /// The raw format code as it crosses the wire.
    pub fn code(self) -> i16 {
        self as i16
    }

    /// Create a Format from a raw wire code.
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Format::Text),
            1 => Some(Format::Binary),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Text => write!(f, "text"),
            Format::Binary => write!(f, "binary"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        assert_eq!(Format::Text.code(), 0);
        assert_eq!(Format::Binary.code(), 1);
        assert_eq!(Format::from_code(0), Some(Format::Text));
        assert_eq!(Format::from_code(1), Some(Format::Binary));
        assert_eq!(Format::from_code(2), None);
    }
}
