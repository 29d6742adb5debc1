//! float4/float8 codecs.
//!
//! Binary format is big-endian IEEE 754.

use std::any::{Any, TypeId};

use bytes::{BufMut, Bytes, BytesMut};

use super::{non_null, require_len, utf8, Codec};
use crate::error::{TypeError, TypeResult};
use crate::format::Format;
use crate::plan::{replan_scan, EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::value::SqlValue;

fn decode_f32(format: Format, src: &[u8]) -> TypeResult<f32> {
    match format {
        Format::Binary => {
            require_len(src, 4)?;
            let mut raw = [0u8; 4];
            raw.copy_from_slice(src);
            Ok(f32::from_bits(u32::from_be_bytes(raw)))
        }
        Format::Text => parse_float(utf8(src)?),
    }
}

fn decode_f64(format: Format, src: &[u8]) -> TypeResult<f64> {
    match format {
        Format::Binary => {
            require_len(src, 8)?;
            let mut raw = [0u8; 8];
            raw.copy_from_slice(src);
            Ok(f64::from_bits(u64::from_be_bytes(raw)))
        }
        Format::Text => parse_float(utf8(src)?),
    }
}

/// Parse the server's text float forms, including the spellings NaN,
/// Infinity, and -Infinity.
fn parse_float<T: std::str::FromStr>(text: &str) -> TypeResult<T> {
    text.trim()
        .parse::<T>()
        .map_err(|_| TypeError::malformed(format!("invalid float: {text:?}")))
}

fn format_float<T: std::fmt::Display>(v: T, buf: &mut BytesMut) {
    buf.extend_from_slice(v.to_string().as_bytes());
}

pub struct Float4Codec;

impl Codec for Float4Codec {
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
        if vt == TypeId::of::<f32>() {
            Some(Box::new(Float4EncodeF32(format)))
        } else if vt == TypeId::of::<f64>() {
            Some(Box::new(Float4EncodeF64(format)))
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
        if dt == TypeId::of::<f32>() {
            Some(Box::new(Float4ScanF32(format)))
        } else if dt == TypeId::of::<f64>() {
            Some(Box::new(Float4ScanF64(format)))
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
        decode_f32(format, &src).map(|v| SqlValue::Float(f64::from(v)))
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
        decode_f32(format, &src).map(|v| Some(Box::new(v) as Box<dyn Any>))
    }
}

struct Float4EncodeF32(Format);

impl EncodePlan for Float4EncodeF32 {
    fn encode(
        &self,
        _registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let v = value
            .downcast_ref::<f32>()
            .ok_or(TypeError::TargetTypeChanged)?;
        match self.0 {
            Format::Binary => buf.put_u32(v.to_bits()),
            Format::Text => format_float(v, buf),
        }
        Ok(IsNull::No)
    }
}

struct Float4EncodeF64(Format);

impl EncodePlan for Float4EncodeF64 {
    fn encode(
        &self,
        _registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let v = value
            .downcast_ref::<f64>()
            .ok_or(TypeError::TargetTypeChanged)?;
        match self.0 {
            Format::Binary => buf.put_u32((*v as f32).to_bits()),
            Format::Text => format_float(*v as f32, buf),
        }
        Ok(IsNull::No)
    }
}

struct Float4ScanF32(Format);

impl ScanPlan for Float4ScanF32 {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(slot) = dst.downcast_mut::<f32>() {
            let src = non_null(src, "f32")?;
            *slot = decode_f32(self.0, &src)?;
            return Ok(());
        }
        replan_scan(registry, oid, format, src, dst)
    }
}

struct Float4ScanF64(Format);

impl ScanPlan for Float4ScanF64 {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(slot) = dst.downcast_mut::<f64>() {
            let src = non_null(src, "f64")?;
            *slot = f64::from(decode_f32(self.0, &src)?);
            return Ok(());
        }
        replan_scan(registry, oid, format, src, dst)
    }
}

pub struct Float8Codec;

impl Codec for Float8Codec {
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
        if (*value).type_id() == TypeId::of::<f64>() {
            Some(Box::new(Float8EncodeF64(format)))
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
        if (*dst).type_id() == TypeId::of::<f64>() {
            Some(Box::new(Float8ScanF64(format)))
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
        decode_f64(format, &src).map(SqlValue::Float)
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
        decode_f64(format, &src).map(|v| Some(Box::new(v) as Box<dyn Any>))
    }
}

struct Float8EncodeF64(Format);

impl EncodePlan for Float8EncodeF64 {
    fn encode(
        &self,
        _registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let v = value
            .downcast_ref::<f64>()
            .ok_or(TypeError::TargetTypeChanged)?;
        match self.0 {
            Format::Binary => buf.put_u64(v.to_bits()),
            Format::Text => format_float(v, buf),
        }
        Ok(IsNull::No)
    }
}

struct Float8ScanF64(Format);

impl ScanPlan for Float8ScanF64 {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(slot) = dst.downcast_mut::<f64>() {
            let src = non_null(src, "f64")?;
            *slot = decode_f64(self.0, &src)?;
            return Ok(());
        }
        replan_scan(registry, oid, format, src, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_f32_binary() {
        let bits = 0x4049_0FDBu32;
        let v = decode_f32(Format::Binary, &bits.to_be_bytes()).unwrap();
        assert_eq!(v, f32::from_bits(bits));
    }

    #[test]
    fn test_decode_f64_text() {
        assert_eq!(decode_f64(Format::Text, b"3.5").unwrap(), 3.5);
        assert!(decode_f64(Format::Text, b"NaN").unwrap().is_nan());
        assert!(decode_f64(Format::Text, b"nope").is_err());
    }

    #[test]
    fn test_invalid_length() {
        assert!(matches!(
            decode_f32(Format::Binary, &[0; 3]),
            Err(TypeError::InvalidLength {
                expected: 4,
                got: 3
            })
        ));
    }
}
