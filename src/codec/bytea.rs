//! bytea codec.
//!
//! Binary format is the raw bytes. Text format is the server's hex output
//! form, `\x` followed by two hex digits per byte.

use std::any::{Any, TypeId};

use bytes::{Bytes, BytesMut};

use super::{non_null, utf8, Codec};
use crate::error::{TypeError, TypeResult};
use crate::format::Format;
use crate::plan::{replan_scan, EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::value::SqlValue;

pub struct ByteaCodec;

impl Codec for ByteaCodec {
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
        if vt == TypeId::of::<Vec<u8>>() || vt == TypeId::of::<Bytes>() {
            Some(Box::new(ByteaEncode(format)))
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
        if dt == TypeId::of::<Vec<u8>>() || dt == TypeId::of::<Bytes>() {
            Some(Box::new(ByteaScan(format)))
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
        decode_bytea(format, src).map(|b| SqlValue::Bytes(b.to_vec()))
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
        decode_bytea(format, src).map(|b| Some(Box::new(b.to_vec()) as Box<dyn Any>))
    }
}

/// Resolve wire bytes to the raw byte content. Binary is passed through
/// untouched so installs into `Bytes` destinations stay shallow.
fn decode_bytea(format: Format, src: Bytes) -> TypeResult<Bytes> {
    match format {
        Format::Binary => Ok(src),
        Format::Text => {
            let text = utf8(&src)?;
            let hex = text
                .strip_prefix("\\x")
                .ok_or_else(|| TypeError::malformed(format!("invalid bytea: {text:?}")))?;
            if hex.len() % 2 != 0 {
                return Err(TypeError::malformed("odd number of hex digits in bytea"));
            }
            let mut out = Vec::with_capacity(hex.len() / 2);
            for i in (0..hex.len()).step_by(2) {
                let byte = u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|e| TypeError::malformed(format!("invalid hex in bytea: {e}")))?;
                out.push(byte);
            }
            Ok(Bytes::from(out))
        }
    }
}

fn encode_hex(bytes: &[u8], buf: &mut BytesMut) {
    buf.extend_from_slice(b"\\x");
    for b in bytes {
        buf.extend_from_slice(format!("{b:02x}").as_bytes());
    }
}

struct ByteaEncode(Format);

impl EncodePlan for ByteaEncode {
    fn encode(
        &self,
        _registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let bytes: &[u8] = if let Some(v) = value.downcast_ref::<Vec<u8>>() {
            v
        } else if let Some(v) = value.downcast_ref::<Bytes>() {
            v
        } else {
            return Err(TypeError::TargetTypeChanged);
        };
        match self.0 {
            Format::Binary => buf.extend_from_slice(bytes),
            Format::Text => encode_hex(bytes, buf),
        }
        Ok(IsNull::No)
    }
}

struct ByteaScan(Format);

impl ScanPlan for ByteaScan {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        let dt = (*dst).type_id();
        if dt != TypeId::of::<Vec<u8>>() && dt != TypeId::of::<Bytes>() {
            return replan_scan(registry, oid, format, src, dst);
        }
        let src = non_null(src, "byte buffer")?;
        let decoded = decode_bytea(self.0, src)?;
        if let Some(slot) = dst.downcast_mut::<Bytes>() {
            *slot = decoded;
        } else if let Some(slot) = dst.downcast_mut::<Vec<u8>>() {
            *slot = decoded.to_vec();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bytea_text() {
        let decoded = decode_bytea(Format::Text, Bytes::from_static(b"\\xdeadbeef")).unwrap();
        assert_eq!(&decoded[..], &[0xde, 0xad, 0xbe, 0xef]);
        assert!(decode_bytea(Format::Text, Bytes::from_static(b"deadbeef")).is_err());
        assert!(decode_bytea(Format::Text, Bytes::from_static(b"\\xabc")).is_err());
    }

    #[test]
    fn test_encode_hex() {
        let mut buf = BytesMut::new();
        encode_hex(&[0x01, 0xff], &mut buf);
        assert_eq!(&buf[..], b"\\x01ff");
    }
}
