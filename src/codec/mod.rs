//! Wire codecs for the built-in types.
//!
//! A codec is a stateless strategy that knows how to encode and decode one
//! logical wire type. Codecs do not act on values directly: the planner asks
//! them for a precompiled plan for a specific `(oid, format, native type)`
//! triple, and a codec that cannot handle the native type returns `None` so
//! adapter plans can bridge the gap.

pub mod array;
pub mod bits;
pub mod boolean;
pub mod bytea;
pub mod float;
pub mod int;
pub mod json;
pub mod text;
pub mod uuid;

pub use array::ArrayCodec;
pub use bits::{Bits, BitsCodec};
pub use boolean::BoolCodec;
pub use bytea::ByteaCodec;
pub use float::{Float4Codec, Float8Codec};
pub use int::{Int2Codec, Int4Codec, Int8Codec};
pub use json::{JsonCodec, JsonbCodec};
pub use text::TextCodec;
pub use uuid::UuidCodec;

use std::any::Any;

use bytes::Bytes;

use crate::error::{TypeError, TypeResult};
use crate::format::Format;
use crate::plan::{EncodePlan, ScanPlan};
use crate::registry::TypeRegistry;
use crate::value::SqlValue;

/// A stateless encode/decode strategy for one logical wire type.
pub trait Codec: Send + Sync {
    /// Whether the format is usable with this codec.
    fn format_supported(&self, format: Format) -> bool;

    /// The format the server should be asked to use for results.
    fn preferred_format(&self) -> Format;

    /// A plan for encoding `value` for `oid` in `format`, or `None` when the
    /// native type of `value` is not handled directly.
    fn plan_encode(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        value: &dyn Any,
    ) -> Option<Box<dyn EncodePlan>>;

    /// A plan for scanning a wire value into a destination with the type of
    /// `dst`, or `None` when that type is not handled directly. When
    /// `actual_dst` is true the returned plan may inline dst-specific fast
    /// paths; when false, adapters may be inserted around it.
    fn plan_scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        dst: &dyn Any,
        actual_dst: bool,
    ) -> Option<Box<dyn ScanPlan>>;

    /// Decode `src` into the simple database-facing value sum.
    fn decode_sql_value(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
    ) -> TypeResult<SqlValue>;

    /// Decode `src` into the codec's natural native representation, `None`
    /// for SQL NULL.
    fn decode_value(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
    ) -> TypeResult<Option<Box<dyn Any>>>;
}

/// Restricts an inner codec to the text format. Used for types the server
/// only ships as text, e.g. aclitem.
pub struct TextFormatOnlyCodec<C>(pub C);

impl<C: Codec> Codec for TextFormatOnlyCodec<C> {
    fn format_supported(&self, format: Format) -> bool {
        format == Format::Text && self.0.format_supported(format)
    }

    fn preferred_format(&self) -> Format {
        Format::Text
    }

    fn plan_encode(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        value: &dyn Any,
    ) -> Option<Box<dyn EncodePlan>> {
        if format != Format::Text {
            return None;
        }
        self.0.plan_encode(registry, oid, format, value)
    }

    fn plan_scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        dst: &dyn Any,
        actual_dst: bool,
    ) -> Option<Box<dyn ScanPlan>> {
        if format != Format::Text {
            return None;
        }
        self.0.plan_scan(registry, oid, format, dst, actual_dst)
    }

    fn decode_sql_value(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
    ) -> TypeResult<SqlValue> {
        if format != Format::Text {
            return Err(TypeError::Unsupported("binary format not supported"));
        }
        self.0.decode_sql_value(registry, oid, format, src)
    }

    fn decode_value(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
    ) -> TypeResult<Option<Box<dyn Any>>> {
        if format != Format::Text {
            return Err(TypeError::Unsupported("binary format not supported"));
        }
        self.0.decode_value(registry, oid, format, src)
    }
}

/// Reject NULL for a destination that cannot hold it.
pub(crate) fn non_null(src: Option<Bytes>, target: &'static str) -> TypeResult<Bytes> {
    src.ok_or(TypeError::NullIntoNonNullable { target })
}

/// Check the byte count of a fixed-width wire value.
pub(crate) fn require_len(src: &[u8], expected: usize) -> TypeResult<()> {
    if src.len() != expected {
        return Err(TypeError::InvalidLength {
            expected,
            got: src.len(),
        });
    }
    Ok(())
}

/// View wire bytes as UTF-8 text.
pub(crate) fn utf8(src: &[u8]) -> TypeResult<&str> {
    std::str::from_utf8(src).map_err(|e| TypeError::malformed(format!("invalid UTF-8: {e}")))
}
