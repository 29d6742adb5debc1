//! Error types for registry, codec, and plan operations.

use thiserror::Error;

use crate::format::Format;

/// The main error type for encode and scan operations.
#[derive(Debug, Error)]
pub enum TypeError {
    /// No data type is registered for this OID (or for the native type of
    /// the value when the OID was zero).
    #[error("no data type registered for oid {0}")]
    UnknownOid(u32),

    /// A data type was found but no path produces an encode plan.
    #[error("cannot encode into oid {oid} with {format} format")]
    NoEncodePlan { oid: u32, format: Format },

    /// A data type was found but no path produces a scan plan.
    #[error("cannot scan oid {oid} with {format} format into destination")]
    NoScanPlan { oid: u32, format: Format },

    /// A fixed-width wire value had the wrong byte count.
    #[error("invalid wire length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// SQL NULL was scanned into a destination that cannot hold it.
    #[error("cannot scan NULL into {target}")]
    NullIntoNonNullable { target: &'static str },

    /// SQL NULL was written through a Value into a destination that cannot
    /// hold it.
    #[error("cannot assign NULL to {target}")]
    NullAssignment { target: &'static str },

    /// Codec-specific parse failure.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// A checked numeric narrowing failed.
    #[error("{value} is out of range for {target}")]
    OutOfRange {
        value: String,
        target: &'static str,
    },

    /// The destination or value no longer matches the type a plan was built
    /// for. Adapter plans translate this into a fresh plan request instead
    /// of surfacing it.
    #[error("plan target type changed")]
    TargetTypeChanged,

    /// A required capability is missing, e.g. a Value type without a binary
    /// decoder was asked to scan binary data.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl TypeError {
    /// Create a malformed-input error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

/// Result type alias for registry, codec, and plan operations.
pub type TypeResult<T> = Result<T, TypeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TypeError::InvalidLength {
            expected: 8,
            got: 7,
        };
        assert_eq!(
            err.to_string(),
            "invalid wire length: expected 8 bytes, got 7"
        );

        let err = TypeError::NullIntoNonNullable { target: "i64" };
        assert_eq!(err.to_string(), "cannot scan NULL into i64");
    }
}
