//! text codec, shared by text, varchar, bpchar, name, and unknown.
//!
//! Both wire formats are the raw UTF-8 bytes of the string.

use std::any::{Any, TypeId};

use bytes::{Bytes, BytesMut};

use super::{non_null, utf8, Codec};
use crate::error::{TypeError, TypeResult};
use crate::format::Format;
use crate::plan::{replan_scan, EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::value::SqlValue;

pub struct TextCodec;

impl Codec for TextCodec {
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
            Some(Box::new(TextEncodeString))
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
            Some(Box::new(TextScanString))
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

struct TextEncodeString;

impl EncodePlan for TextEncodeString {
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

struct TextScanString;

impl ScanPlan for TextScanString {
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
