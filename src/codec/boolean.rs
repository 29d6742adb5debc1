//! bool codec.

use std::any::{Any, TypeId};

use bytes::{BufMut, Bytes, BytesMut};

use super::{non_null, require_len, utf8, Codec};
use crate::error::{TypeError, TypeResult};
use crate::format::Format;
use crate::plan::{replan_scan, EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::value::SqlValue;

pub struct BoolCodec;

impl Codec for BoolCodec {
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
        if (*value).type_id() != TypeId::of::<bool>() {
            return None;
        }
        match format {
            Format::Binary => Some(Box::new(BoolEncodeBinary)),
            Format::Text => Some(Box::new(BoolEncodeText)),
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
        if (*dst).type_id() != TypeId::of::<bool>() {
            return None;
        }
        match format {
            Format::Binary => Some(Box::new(BoolScanBinary)),
            Format::Text => Some(Box::new(BoolScanText)),
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
        decode_bool(format, &src).map(SqlValue::Bool)
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
        decode_bool(format, &src).map(|v| Some(Box::new(v) as Box<dyn Any>))
    }
}

fn decode_bool(format: Format, src: &[u8]) -> TypeResult<bool> {
    match format {
        Format::Binary => {
            require_len(src, 1)?;
            Ok(src[0] != 0)
        }
        Format::Text => match utf8(src)? {
            "t" | "true" | "1" => Ok(true),
            "f" | "false" | "0" => Ok(false),
            other => Err(TypeError::malformed(format!("invalid bool: {other:?}"))),
        },
    }
}

struct BoolEncodeBinary;

impl EncodePlan for BoolEncodeBinary {
    fn encode(
        &self,
        _registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let v = value
            .downcast_ref::<bool>()
            .ok_or(TypeError::TargetTypeChanged)?;
        buf.put_u8(u8::from(*v));
        Ok(IsNull::No)
    }
}

struct BoolEncodeText;

impl EncodePlan for BoolEncodeText {
    fn encode(
        &self,
        _registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let v = value
            .downcast_ref::<bool>()
            .ok_or(TypeError::TargetTypeChanged)?;
        buf.put_u8(if *v { b't' } else { b'f' });
        Ok(IsNull::No)
    }
}

struct BoolScanBinary;

impl ScanPlan for BoolScanBinary {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(slot) = dst.downcast_mut::<bool>() {
            let src = non_null(src, "bool")?;
            require_len(&src, 1)?;
            *slot = src[0] != 0;
            return Ok(());
        }
        replan_scan(registry, oid, format, src, dst)
    }
}

struct BoolScanText;

impl ScanPlan for BoolScanText {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(slot) = dst.downcast_mut::<bool>() {
            let src = non_null(src, "bool")?;
            *slot = decode_bool(Format::Text, &src)?;
            return Ok(());
        }
        replan_scan(registry, oid, format, src, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bool_text() {
        assert!(decode_bool(Format::Text, b"t").unwrap());
        assert!(decode_bool(Format::Text, b"true").unwrap());
        assert!(!decode_bool(Format::Text, b"f").unwrap());
        assert!(!decode_bool(Format::Text, b"false").unwrap());
        assert!(decode_bool(Format::Text, b"x").is_err());
    }

    #[test]
    fn test_decode_bool_binary() {
        assert!(decode_bool(Format::Binary, &[1]).unwrap());
        assert!(!decode_bool(Format::Binary, &[0]).unwrap());
        assert!(matches!(
            decode_bool(Format::Binary, &[0, 1]),
            Err(TypeError::InvalidLength {
                expected: 1,
                got: 2
            })
        ));
    }
}
