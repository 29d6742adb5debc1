//! uuid codec.
//!
//! Binary format is the 16 raw bytes. Text format is the hyphenated
//! lowercase hex form.

use std::any::{Any, TypeId};

use bytes::{Bytes, BytesMut};

use super::{non_null, require_len, utf8, Codec};
use crate::error::{TypeError, TypeResult};
use crate::format::Format;
use crate::plan::{replan_scan, EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::value::SqlValue;

/// Parse a hyphenated (or bare) UUID string into its 16 bytes.
pub fn parse_uuid(text: &str) -> TypeResult<[u8; 16]> {
    let hex: String = text.chars().filter(|c| *c != '-').collect();
    if hex.len() != 32 {
        return Err(TypeError::malformed(format!(
            "invalid UUID length: expected 32 hex chars, got {}",
            hex.len()
        )));
    }
    let mut bytes = [0u8; 16];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|e| TypeError::malformed(format!("invalid hex in UUID: {e}")))?;
    }
    Ok(bytes)
}

/// Format 16 UUID bytes in the hyphenated form.
pub fn format_uuid(bytes: &[u8; 16]) -> String {
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        bytes[6], bytes[7],
        bytes[8], bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
    )
}

fn decode_uuid_bytes(format: Format, src: &[u8]) -> TypeResult<[u8; 16]> {
    match format {
        Format::Binary => {
            require_len(src, 16)?;
            let mut bytes = [0u8; 16];
            bytes.copy_from_slice(src);
            Ok(bytes)
        }
        Format::Text => parse_uuid(utf8(src)?),
    }
}

pub struct UuidCodec;

impl Codec for UuidCodec {
    fn format_supported(&self, _format: Format) -> bool {
        true
    }

    fn preferred_format(&self) -> Format {
        Format::Binary
    }

    fn plan_encode(
        &self,
        _registry: &TypeRegistry,
        _oid: u32,
        format: Format,
        value: &dyn Any,
    ) -> Option<Box<dyn EncodePlan>> {
        let vt = (*value).type_id();
        if vt == TypeId::of::<[u8; 16]>() || vt == TypeId::of::<String>() {
            Some(Box::new(UuidEncode(format)))
        } else {
            None
        }
    }

    fn plan_scan(
        &self,
        _registry: &TypeRegistry,
        _oid: u32,
        format: Format,
        dst: &dyn Any,
        _actual_dst: bool,
    ) -> Option<Box<dyn ScanPlan>> {
        let dt = (*dst).type_id();
        if dt == TypeId::of::<[u8; 16]>() || dt == TypeId::of::<String>() {
            Some(Box::new(UuidScan(format)))
        } else {
            None
        }
    }

    fn decode_sql_value(
        &self,
        _registry: &TypeRegistry,
        _oid: u32,
        format: Format,
        src: Option<Bytes>,
    ) -> TypeResult<SqlValue> {
        let Some(src) = src else {
            return Ok(SqlValue::Null);
        };
        decode_uuid_bytes(format, &src).map(|b| SqlValue::Text(format_uuid(&b)))
    }

    fn decode_value(
        &self,
        _registry: &TypeRegistry,
        _oid: u32,
        format: Format,
        src: Option<Bytes>,
    ) -> TypeResult<Option<Box<dyn Any>>> {
        let Some(src) = src else {
            return Ok(None);
        };
        decode_uuid_bytes(format, &src).map(|b| Some(Box::new(format_uuid(&b)) as Box<dyn Any>))
    }
}

struct UuidEncode(Format);

impl EncodePlan for UuidEncode {
    fn encode(
        &self,
        _registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let bytes = if let Some(v) = value.downcast_ref::<[u8; 16]>() {
            *v
        } else if let Some(v) = value.downcast_ref::<String>() {
            parse_uuid(v)?
        } else {
            return Err(TypeError::TargetTypeChanged);
        };
        match self.0 {
            Format::Binary => buf.extend_from_slice(&bytes),
            Format::Text => buf.extend_from_slice(format_uuid(&bytes).as_bytes()),
        }
        Ok(IsNull::No)
    }
}

struct UuidScan(Format);

impl ScanPlan for UuidScan {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        let dt = (*dst).type_id();
        if dt != TypeId::of::<[u8; 16]>() && dt != TypeId::of::<String>() {
            return replan_scan(registry, oid, format, src, dst);
        }
        let src = non_null(src, "uuid")?;
        let bytes = decode_uuid_bytes(self.0, &src)?;
        if let Some(slot) = dst.downcast_mut::<[u8; 16]>() {
            *slot = bytes;
        } else if let Some(slot) = dst.downcast_mut::<String>() {
            *slot = format_uuid(&bytes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_round_trip() {
        let text = "550e8400-e29b-41d4-a716-446655440000";
        let bytes = parse_uuid(text).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(format_uuid(&bytes), text);
    }

    #[test]
    fn test_parse_uuid_rejects_bad_input() {
        assert!(parse_uuid("too-short").is_err());
        assert!(parse_uuid("zz0e8400-e29b-41d4-a716-446655440000").is_err());
    }
}
