//! json and jsonb codecs.
//!
//! json travels as the raw JSON text in both formats. jsonb binary format
//! prefixes a version byte (currently 1); the codec adds and strips it so
//! native values never see it.

use std::any::{Any, TypeId};

use bytes::{BufMut, Bytes, BytesMut};

use super::{non_null, utf8, Codec};
use crate::error::{TypeError, TypeResult};
use crate::format::Format;
use crate::plan::{replan_scan, EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::value::SqlValue;

const JSONB_VERSION: u8 = 1;

pub struct JsonCodec;

impl Codec for JsonCodec {
    fn format_supported(&self, _format: Format) -> bool {
        true
    }

    fn preferred_format(&self) -> Format {
        Format::Text
    }

    fn plan_encode(
        &self,
        _registry: &TypeRegistry,
        _oid: u32,
        _format: Format,
        value: &dyn Any,
    ) -> Option<Box<dyn EncodePlan>> {
        if (*value).type_id() == TypeId::of::<String>() {
            Some(Box::new(JsonEncodeString))
        } else {
            None
        }
    }

    fn plan_scan(
        &self,
        _registry: &TypeRegistry,
        _oid: u32,
        _format: Format,
        dst: &dyn Any,
        _actual_dst: bool,
    ) -> Option<Box<dyn ScanPlan>> {
        if (*dst).type_id() == TypeId::of::<String>() {
            Some(Box::new(JsonScanString))
        } else {
            None
        }
    }

    fn decode_sql_value(
        &self,
        _registry: &TypeRegistry,
        _oid: u32,
        _format: Format,
        src: Option<Bytes>,
    ) -> TypeResult<SqlValue> {
        let Some(src) = src else {
            return Ok(SqlValue::Null);
        };
        Ok(SqlValue::Text(utf8(&src)?.to_string()))
    }

    fn decode_value(
        &self,
        _registry: &TypeRegistry,
        _oid: u32,
        _format: Format,
        src: Option<Bytes>,
    ) -> TypeResult<Option<Box<dyn Any>>> {
        let Some(src) = src else {
            return Ok(None);
        };
        Ok(Some(Box::new(utf8(&src)?.to_string()) as Box<dyn Any>))
    }
}

struct JsonEncodeString;

impl EncodePlan for JsonEncodeString {
    fn encode(
        &self,
        _registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let v = value
            .downcast_ref::<String>()
            .ok_or(TypeError::TargetTypeChanged)?;
        buf.extend_from_slice(v.as_bytes());
        Ok(IsNull::No)
    }
}

struct JsonScanString;

impl ScanPlan for JsonScanString {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(slot) = dst.downcast_mut::<String>() {
            let src = non_null(src, "String")?;
            *slot = utf8(&src)?.to_string();
            return Ok(());
        }
        replan_scan(registry, oid, format, src, dst)
    }
}

/// Strip the jsonb version byte from binary wire data.
fn strip_jsonb_version(src: Bytes) -> TypeResult<Bytes> {
    match src.first() {
        Some(&JSONB_VERSION) => Ok(src.slice(1..)),
        Some(other) => Err(TypeError::malformed(format!(
            "unsupported JSONB version: {other}"
        ))),
        None => Err(TypeError::malformed("empty JSONB value")),
    }
}

pub struct JsonbCodec;

impl Codec for JsonbCodec {
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
        if (*value).type_id() == TypeId::of::<String>() {
            Some(Box::new(JsonbEncodeString(format)))
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
        if dt == TypeId::of::<String>() || dt == TypeId::of::<Vec<u8>>() || dt == TypeId::of::<Bytes>()
        {
            Some(Box::new(JsonbScan(format)))
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
        let payload = match format {
            Format::Binary => strip_jsonb_version(src)?,
            Format::Text => src,
        };
        Ok(SqlValue::Text(utf8(&payload)?.to_string()))
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
        let payload = match format {
            Format::Binary => strip_jsonb_version(src)?,
            Format::Text => src,
        };
        Ok(Some(Box::new(utf8(&payload)?.to_string()) as Box<dyn Any>))
    }
}

struct JsonbEncodeString(Format);

impl EncodePlan for JsonbEncodeString {
    fn encode(
        &self,
        _registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let v = value
            .downcast_ref::<String>()
            .ok_or(TypeError::TargetTypeChanged)?;
        if self.0 == Format::Binary {
            buf.put_u8(JSONB_VERSION);
        }
        buf.extend_from_slice(v.as_bytes());
        Ok(IsNull::No)
    }
}

struct JsonbScan(Format);

impl ScanPlan for JsonbScan {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        let dt = (*dst).type_id();
        if dt != TypeId::of::<String>() && dt != TypeId::of::<Vec<u8>>() && dt != TypeId::of::<Bytes>()
        {
            return replan_scan(registry, oid, format, src, dst);
        }
        let src = non_null(src, "jsonb")?;
        let payload = match self.0 {
            Format::Binary => strip_jsonb_version(src)?,
            Format::Text => src,
        };
        if let Some(slot) = dst.downcast_mut::<String>() {
            *slot = utf8(&payload)?.to_string();
        } else if let Some(slot) = dst.downcast_mut::<Vec<u8>>() {
            *slot = payload.to_vec();
        } else if let Some(slot) = dst.downcast_mut::<Bytes>() {
            *slot = payload;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_jsonb_version() {
        let src = Bytes::from_static(b"\x01{\"k\":1}");
        assert_eq!(&strip_jsonb_version(src).unwrap()[..], b"{\"k\":1}");
        assert!(strip_jsonb_version(Bytes::from_static(b"\x02{}")).is_err());
        assert!(strip_jsonb_version(Bytes::new()).is_err());
    }
}
