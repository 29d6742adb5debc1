//! int2/int4/int8 codecs.
//!
//! Binary format is a fixed-width big-endian two's complement integer. Each
//! codec plans directly for its exact-width native type plus i64 and u64;
//! the widening adapter funnels every other integer width through those.

use std::any::{Any, TypeId};
use std::fmt::Display;
use std::marker::PhantomData;

use bytes::{Bytes, BytesMut};

use super::{non_null, require_len, utf8, Codec};
use crate::error::{TypeError, TypeResult};
use crate::format::Format;
use crate::plan::{replan_scan, EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::value::SqlValue;

/// Fixed-width wire integer. Implemented by the exact-width native types of
/// the three integer codecs.
pub(crate) trait PgInt: Copy + Display + Send + Sync + 'static {
    const WIDTH: usize;
    const NAME: &'static str;

    /// Read from exactly `WIDTH` big-endian bytes.
    fn from_be(src: &[u8]) -> Self;
    fn to_i64(self) -> i64;
    fn try_from_i64(v: i64) -> Option<Self>;
    fn try_from_u64(v: u64) -> Option<Self>;
    fn put_be(self, buf: &mut BytesMut);
}

macro_rules! pg_int {
    ($ty:ty, $width:expr, $name:expr) => {
        impl PgInt for $ty {
            const WIDTH: usize = $width;
            const NAME: &'static str = $name;

            fn from_be(src: &[u8]) -> Self {
                let mut raw = [0u8; $width];
                raw.copy_from_slice(src);
                <$ty>::from_be_bytes(raw)
            }

            fn to_i64(self) -> i64 {
                self as i64
            }

            fn try_from_i64(v: i64) -> Option<Self> {
                <$ty>::try_from(v).ok()
            }

            fn try_from_u64(v: u64) -> Option<Self> {
                <$ty>::try_from(v).ok()
            }

            fn put_be(self, buf: &mut BytesMut) {
                buf.extend_from_slice(&self.to_be_bytes());
            }
        }
    };
}

pg_int!(i16, 2, "int2");
pg_int!(i32, 4, "int4");
pg_int!(i64, 8, "int8");

fn decode_int<T: PgInt>(format: Format, src: &[u8]) -> TypeResult<T> {
    match format {
        Format::Binary => {
            require_len(src, T::WIDTH)?;
            Ok(T::from_be(src))
        }
        Format::Text => {
            let text = utf8(src)?;
            text.trim()
                .parse::<i64>()
                .ok()
                .and_then(T::try_from_i64)
                .ok_or_else(|| TypeError::malformed(format!("invalid {}: {text:?}", T::NAME)))
        }
    }
}

fn plan_int_encode<T: PgInt>(format: Format, value: &dyn Any) -> Option<Box<dyn EncodePlan>> {
    let vt = (*value).type_id();
    match format {
        Format::Binary => {
            if vt == TypeId::of::<T>() {
                Some(Box::new(IntEncodeBinary::<T>(PhantomData)))
            } else if vt == TypeId::of::<i64>() {
                Some(Box::new(IntEncodeBinaryFromI64::<T>(PhantomData)))
            } else if vt == TypeId::of::<u64>() {
                Some(Box::new(IntEncodeBinaryFromU64::<T>(PhantomData)))
            } else {
                None
            }
        }
        Format::Text => {
            if vt == TypeId::of::<T>() {
                Some(Box::new(IntEncodeText::<T>(PhantomData)))
            } else if vt == TypeId::of::<i64>() {
                Some(Box::new(IntEncodeText::<i64>(PhantomData)))
            } else if vt == TypeId::of::<u64>() {
                Some(Box::new(IntEncodeText::<u64>(PhantomData)))
            } else {
                None
            }
        }
    }
}

fn plan_int_scan<T: PgInt>(format: Format, dst: &dyn Any) -> Option<Box<dyn ScanPlan>> {
    let dt = (*dst).type_id();
    if dt == TypeId::of::<T>() {
        return Some(Box::new(IntScanExact::<T>(PhantomData, format)));
    }
    if dt == TypeId::of::<i64>() {
        return Some(Box::new(IntScanIntoI64::<T>(PhantomData, format)));
    }
    None
}

struct IntEncodeBinary<T>(PhantomData<T>);

impl<T: PgInt> EncodePlan for IntEncodeBinary<T> {
    fn encode(
        &self,
        _registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let v = value
            .downcast_ref::<T>()
            .ok_or(TypeError::TargetTypeChanged)?;
        v.put_be(buf);
        Ok(IsNull::No)
    }
}

struct IntEncodeBinaryFromI64<T>(PhantomData<T>);

impl<T: PgInt> EncodePlan for IntEncodeBinaryFromI64<T> {
    fn encode(
        &self,
        _registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let v = value
            .downcast_ref::<i64>()
            .ok_or(TypeError::TargetTypeChanged)?;
        let narrowed = T::try_from_i64(*v).ok_or_else(|| TypeError::OutOfRange {
            value: v.to_string(),
            target: T::NAME,
        })?;
        narrowed.put_be(buf);
        Ok(IsNull::No)
    }
}

struct IntEncodeBinaryFromU64<T>(PhantomData<T>);

impl<T: PgInt> EncodePlan for IntEncodeBinaryFromU64<T> {
    fn encode(
        &self,
        _registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let v = value
            .downcast_ref::<u64>()
            .ok_or(TypeError::TargetTypeChanged)?;
        let narrowed = T::try_from_u64(*v).ok_or_else(|| TypeError::OutOfRange {
            value: v.to_string(),
            target: T::NAME,
        })?;
        narrowed.put_be(buf);
        Ok(IsNull::No)
    }
}

struct IntEncodeText<V>(PhantomData<V>);

impl<V: Display + Send + Sync + 'static> EncodePlan for IntEncodeText<V> {
    fn encode(
        &self,
        _registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let v = value
            .downcast_ref::<V>()
            .ok_or(TypeError::TargetTypeChanged)?;
        buf.extend_from_slice(v.to_string().as_bytes());
        Ok(IsNull::No)
    }
}

struct IntScanExact<T>(PhantomData<T>, Format);

impl<T: PgInt> ScanPlan for IntScanExact<T> {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(slot) = dst.downcast_mut::<T>() {
            let src = non_null(src, T::NAME)?;
            *slot = decode_int::<T>(self.1, &src)?;
            return Ok(());
        }
        replan_scan(registry, oid, format, src, dst)
    }
}

struct IntScanIntoI64<T>(PhantomData<T>, Format);

impl<T: PgInt> ScanPlan for IntScanIntoI64<T> {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(slot) = dst.downcast_mut::<i64>() {
            let src = non_null(src, "i64")?;
            *slot = decode_int::<T>(self.1, &src)?.to_i64();
            return Ok(());
        }
        replan_scan(registry, oid, format, src, dst)
    }
}

macro_rules! int_codec {
    ($codec:ident, $ty:ty) => {
        pub struct $codec;

        impl Codec for $codec {
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
                plan_int_encode::<$ty>(format, value)
            }

            fn plan_scan(
                &self,
                _registry: &TypeRegistry,
                _oid: u32,
                format: Format,
                dst: &dyn Any,
                _actual_dst: bool,
            ) -> Option<Box<dyn ScanPlan>> {
                plan_int_scan::<$ty>(format, dst)
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
                decode_int::<$ty>(format, &src).map(|v| SqlValue::Int(v.to_i64()))
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
                decode_int::<$ty>(format, &src).map(|v| Some(Box::new(v) as Box<dyn Any>))
            }
        }
    };
}

int_codec!(Int2Codec, i16);
int_codec!(Int4Codec, i32);
int_codec!(Int8Codec, i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_int_binary() {
        assert_eq!(
            decode_int::<i64>(Format::Binary, &42i64.to_be_bytes()).unwrap(),
            42
        );
        assert_eq!(
            decode_int::<i32>(Format::Binary, &(-1i32).to_be_bytes()).unwrap(),
            -1
        );
        assert!(matches!(
            decode_int::<i64>(Format::Binary, &[0; 7]),
            Err(TypeError::InvalidLength {
                expected: 8,
                got: 7
            })
        ));
    }

    #[test]
    fn test_decode_int_text() {
        assert_eq!(decode_int::<i32>(Format::Text, b"42").unwrap(), 42);
        assert_eq!(decode_int::<i16>(Format::Text, b"-7").unwrap(), -7);
        assert!(decode_int::<i16>(Format::Text, b"70000").is_err());
        assert!(decode_int::<i32>(Format::Text, b"abc").is_err());
    }
}
