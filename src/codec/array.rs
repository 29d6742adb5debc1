//! Array codec.
//!
//! One codec instance handles one element type, delegating element bytes to
//! the element codec's plans. Binary format is the server's array layout:
//! dimension count, flags, element OID, per-dimension length and lower
//! bound, then length-prefixed elements. Text format is the brace form,
//! `{a,"b c",NULL}`.
//!
//! Only one-dimensional arrays are supported, and element NULLs are rejected
//! when scanning into `Vec<T>`.

use std::any::{Any, TypeId};
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};

use super::{non_null, utf8, Codec};
use crate::error::{TypeError, TypeResult};
use crate::format::Format;
use crate::plan::{replan_scan, EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::value::SqlValue;

pub struct ArrayCodec {
    element_codec: Arc<dyn Codec>,
    element_oid: u32,
}

impl ArrayCodec {
    pub fn new(element_codec: Arc<dyn Codec>, element_oid: u32) -> Self {
        Self {
            element_codec,
            element_oid,
        }
    }
}

impl Codec for ArrayCodec {
    fn format_supported(&self, format: Format) -> bool {
        self.element_codec.format_supported(format)
    }

    fn preferred_format(&self) -> Format {
        self.element_codec.preferred_format()
    }

    fn plan_encode(
        &self,
        registry: &TypeRegistry,
        _oid: u32,
        format: Format,
        value: &dyn Any,
    ) -> Option<Box<dyn EncodePlan>> {
        let value_type = (*value).type_id();
        let kind = registry.array_kind(value_type)?;
        let sample = (kind.new_elem)();
        let element_plan = registry.plan_encode(self.element_oid, format, sample.as_ref())?;
        Some(Box::new(ArrayEncodePlan {
            value_type,
            element_oid: self.element_oid,
            format,
            element_plan,
        }))
    }

    fn plan_scan(
        &self,
        registry: &TypeRegistry,
        _oid: u32,
        format: Format,
        dst: &dyn Any,
        _actual_dst: bool,
    ) -> Option<Box<dyn ScanPlan>> {
        let dst_type = (*dst).type_id();
        let kind = registry.array_kind(dst_type)?;
        let sample = (kind.new_elem)();
        let element_plan = registry.plan_scan(self.element_oid, format, sample.as_ref());
        Some(Box::new(ArrayScanPlan {
            dst_type,
            element_oid: self.element_oid,
            format,
            element_plan,
        }))
    }

    fn decode_sql_value(
        &self,
        registry: &TypeRegistry,
        _oid: u32,
        format: Format,
        src: Option<Bytes>,
    ) -> TypeResult<SqlValue> {
        let Some(src) = src else {
            return Ok(SqlValue::Null);
        };
        match format {
            Format::Text => Ok(SqlValue::Text(utf8(&src)?.to_string())),
            Format::Binary => {
                let mut out = String::from("{");
                let mut first = true;
                for element in BinaryElements::new(&src)? {
                    let (start, end) = element?;
                    if !first {
                        out.push(',');
                    }
                    first = false;
                    let sql_value = self.element_codec.decode_sql_value(
                        registry,
                        self.element_oid,
                        format,
                        Some(src.slice(start..end)),
                    )?;
                    match sql_value_text(&sql_value) {
                        Some(text) => out.push_str(&quote_array_element(&text)),
                        None => out.push_str("NULL"),
                    }
                }
                out.push('}');
                Ok(SqlValue::Text(out))
            }
        }
    }

    fn decode_value(
        &self,
        registry: &TypeRegistry,
        _oid: u32,
        format: Format,
        src: Option<Bytes>,
    ) -> TypeResult<Option<Box<dyn Any>>> {
        let Some(src) = src else {
            return Ok(None);
        };
        let mut elements: Vec<Box<dyn Any>> = Vec::new();
        match format {
            Format::Binary => {
                for element in BinaryElements::new(&src)? {
                    let (start, end) = element?;
                    let value = self.element_codec.decode_value(
                        registry,
                        self.element_oid,
                        format,
                        Some(src.slice(start..end)),
                    )?;
                    elements.push(value.ok_or(TypeError::NullIntoNonNullable {
                        target: "array element",
                    })?);
                }
            }
            Format::Text => {
                for item in parse_text_array(utf8(&src)?)? {
                    let item = item.ok_or(TypeError::NullIntoNonNullable {
                        target: "array element",
                    })?;
                    let value = self.element_codec.decode_value(
                        registry,
                        self.element_oid,
                        format,
                        Some(Bytes::from(item.into_bytes())),
                    )?;
                    elements.push(value.ok_or(TypeError::NullIntoNonNullable {
                        target: "array element",
                    })?);
                }
            }
        }
        Ok(Some(Box::new(elements) as Box<dyn Any>))
    }
}

struct ArrayEncodePlan {
    value_type: TypeId,
    element_oid: u32,
    format: Format,
    element_plan: Box<dyn EncodePlan>,
}

impl EncodePlan for ArrayEncodePlan {
    fn encode(
        &self,
        registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        if (*value).type_id() != self.value_type {
            return Err(TypeError::TargetTypeChanged);
        }
        let kind = *registry
            .array_kind(self.value_type)
            .ok_or(TypeError::TargetTypeChanged)?;
        let len = (kind.len)(value).ok_or(TypeError::TargetTypeChanged)?;

        match self.format {
            Format::Binary => {
                if len == 0 {
                    buf.put_i32(0); // dimensions
                    buf.put_i32(0); // no NULLs
                    buf.put_u32(self.element_oid);
                    return Ok(IsNull::No);
                }
                buf.put_i32(1);
                buf.put_i32(0);
                buf.put_u32(self.element_oid);
                buf.put_i32(len as i32);
                buf.put_i32(1); // lower bound
                for i in 0..len {
                    let element = (kind.get)(value, i).ok_or(TypeError::TargetTypeChanged)?;
                    let mut element_buf = BytesMut::new();
                    match self.element_plan.encode(registry, element, &mut element_buf)? {
                        IsNull::Yes => buf.put_i32(-1),
                        IsNull::No => {
                            buf.put_i32(element_buf.len() as i32);
                            buf.extend_from_slice(&element_buf);
                        }
                    }
                }
            }
            Format::Text => {
                buf.put_u8(b'{');
                for i in 0..len {
                    if i > 0 {
                        buf.put_u8(b',');
                    }
                    let element = (kind.get)(value, i).ok_or(TypeError::TargetTypeChanged)?;
                    let mut element_buf = BytesMut::new();
                    match self.element_plan.encode(registry, element, &mut element_buf)? {
                        IsNull::Yes => buf.extend_from_slice(b"NULL"),
                        IsNull::No => {
                            let text = utf8(&element_buf)?;
                            buf.extend_from_slice(quote_array_element(text).as_bytes());
                        }
                    }
                }
                buf.put_u8(b'}');
            }
        }
        Ok(IsNull::No)
    }
}

struct ArrayScanPlan {
    dst_type: TypeId,
    element_oid: u32,
    format: Format,
    element_plan: Box<dyn ScanPlan>,
}

impl ScanPlan for ArrayScanPlan {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if (*dst).type_id() != self.dst_type {
            return replan_scan(registry, oid, format, src, dst);
        }
        let kind = *registry
            .array_kind(self.dst_type)
            .ok_or(TypeError::TargetTypeChanged)?;
        let src = non_null(src, "array")?;
        if !(kind.clear)(dst) {
            return Err(TypeError::TargetTypeChanged);
        }

        match self.format {
            Format::Binary => {
                for element in BinaryElements::new(&src)? {
                    let (start, end) = element?;
                    let mut element_value = (kind.new_elem)();
                    self.element_plan.scan(
                        registry,
                        self.element_oid,
                        self.format,
                        Some(src.slice(start..end)),
                        element_value.as_mut(),
                    )?;
                    if !(kind.push)(dst, element_value) {
                        return Err(TypeError::TargetTypeChanged);
                    }
                }
            }
            Format::Text => {
                for item in parse_text_array(utf8(&src)?)? {
                    let item = item.ok_or(TypeError::NullIntoNonNullable {
                        target: "array element",
                    })?;
                    let mut element_value = (kind.new_elem)();
                    self.element_plan.scan(
                        registry,
                        self.element_oid,
                        self.format,
                        Some(Bytes::from(item.into_bytes())),
                        element_value.as_mut(),
                    )?;
                    if !(kind.push)(dst, element_value) {
                        return Err(TypeError::TargetTypeChanged);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Iterator over the `(start, end)` byte ranges of the elements of a binary
/// array value. Rejects element NULLs and anything but zero or one
/// dimensions.
struct BinaryElements<'a> {
    src: &'a [u8],
    pos: usize,
    remaining: usize,
}

impl<'a> BinaryElements<'a> {
    fn new(src: &'a [u8]) -> TypeResult<Self> {
        if src.len() < 12 {
            return Err(TypeError::malformed("array header truncated"));
        }
        let ndim = i32::from_be_bytes([src[0], src[1], src[2], src[3]]);
        match ndim {
            0 => Ok(Self {
                src,
                pos: 12,
                remaining: 0,
            }),
            1 => {
                if src.len() < 20 {
                    return Err(TypeError::malformed("array dimension truncated"));
                }
                let len = i32::from_be_bytes([src[12], src[13], src[14], src[15]]);
                if len < 0 {
                    return Err(TypeError::malformed("negative array length"));
                }
                Ok(Self {
                    src,
                    pos: 20,
                    remaining: len as usize,
                })
            }
            _ => Err(TypeError::malformed(format!(
                "only one-dimensional arrays are supported, got {ndim} dimensions"
            ))),
        }
    }
}

impl Iterator for BinaryElements<'_> {
    type Item = TypeResult<(usize, usize)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if self.pos + 4 > self.src.len() {
            return Some(Err(TypeError::malformed("array element truncated")));
        }
        let len = i32::from_be_bytes([
            self.src[self.pos],
            self.src[self.pos + 1],
            self.src[self.pos + 2],
            self.src[self.pos + 3],
        ]);
        self.pos += 4;
        if len < 0 {
            return Some(Err(TypeError::NullIntoNonNullable {
                target: "array element",
            }));
        }
        let start = self.pos;
        let end = start + len as usize;
        if end > self.src.len() {
            return Some(Err(TypeError::malformed("array element truncated")));
        }
        self.pos = end;
        Some(Ok((start, end)))
    }
}

/// Split the text-format brace form into elements. A quoted element is
/// unescaped; an unquoted `NULL` becomes `None`.
fn parse_text_array(text: &str) -> TypeResult<Vec<Option<String>>> {
    let text = text.trim();
    let inner = text
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .ok_or_else(|| TypeError::malformed(format!("invalid array literal: {text:?}")))?;
    if inner.is_empty() {
        return Ok(Vec::new());
    }

    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut was_quoted = false;
    let mut escape_next = false;

    for c in inner.chars() {
        if escape_next {
            current.push(c);
            escape_next = false;
            continue;
        }
        match c {
            '\\' => escape_next = true,
            '"' => {
                in_quotes = !in_quotes;
                was_quoted = true;
            }
            ',' if !in_quotes => {
                result.push(take_element(&mut current, &mut was_quoted));
            }
            _ => current.push(c),
        }
    }
    if in_quotes || escape_next {
        return Err(TypeError::malformed("unterminated array element"));
    }
    result.push(take_element(&mut current, &mut was_quoted));
    Ok(result)
}

fn take_element(current: &mut String, was_quoted: &mut bool) -> Option<String> {
    let item = std::mem::take(current);
    let quoted = std::mem::replace(was_quoted, false);
    if !quoted && item == "NULL" {
        None
    } else {
        Some(item)
    }
}

/// Quote an element of the text form when it contains metacharacters.
fn quote_array_element(item: &str) -> String {
    let needs_quoting = item.is_empty()
        || item == "NULL"
        || item
            .chars()
            .any(|c| matches!(c, ',' | '"' | '\\' | '{' | '}') || c.is_whitespace());
    if needs_quoting {
        format!("\"{}\"", item.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        item.to_string()
    }
}

fn sql_value_text(value: &SqlValue) -> Option<String> {
    match value {
        SqlValue::Null => None,
        SqlValue::Bool(v) => Some(if *v { "t" } else { "f" }.to_string()),
        SqlValue::Int(v) => Some(v.to_string()),
        SqlValue::Float(v) => Some(v.to_string()),
        SqlValue::Text(v) => Some(v.clone()),
        SqlValue::Bytes(v) => {
            let mut out = String::from("\\x");
            for b in v {
                out.push_str(&format!("{b:02x}"));
            }
            Some(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_array() {
        assert_eq!(parse_text_array("{}").unwrap(), Vec::<Option<String>>::new());
        assert_eq!(
            parse_text_array("{a,b,c}").unwrap(),
            vec![
                Some("a".to_string()),
                Some("b".to_string()),
                Some("c".to_string())
            ]
        );
        assert_eq!(
            parse_text_array("{\"hello, world\",foo}").unwrap(),
            vec![Some("hello, world".to_string()), Some("foo".to_string())]
        );
        assert_eq!(
            parse_text_array("{NULL,\"NULL\"}").unwrap(),
            vec![None, Some("NULL".to_string())]
        );
        assert!(parse_text_array("1,2,3").is_err());
    }

    #[test]
    fn test_quote_array_element() {
        assert_eq!(quote_array_element("abc"), "abc");
        assert_eq!(quote_array_element("a b"), "\"a b\"");
        assert_eq!(quote_array_element(""), "\"\"");
        assert_eq!(quote_array_element("NULL"), "\"NULL\"");
        assert_eq!(quote_array_element("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn test_binary_elements_rejects_matrix() {
        let mut src = Vec::new();
        src.extend_from_slice(&2i32.to_be_bytes());
        src.extend_from_slice(&0i32.to_be_bytes());
        src.extend_from_slice(&23u32.to_be_bytes());
        assert!(BinaryElements::new(&src).is_err());
    }
}
