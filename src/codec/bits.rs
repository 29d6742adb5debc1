//! bit/varbit codec.
//!
//! Binary format is a big-endian i32 bit count followed by the bits packed
//! most-significant-first. Text format is a string of `0` and `1` characters.

use std::any::{Any, TypeId};

use bytes::{BufMut, Bytes, BytesMut};

use super::{utf8, Codec};
use crate::error::{TypeError, TypeResult};
use crate::format::Format;
use crate::plan::{replan_scan, EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::value::SqlValue;

/// A bit string. `len` is the number of significant bits; `bytes` packs them
/// most-significant-first with zero padding in the final byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bits {
    pub bytes: Bytes,
    pub len: i32,
    pub valid: bool,
}

impl Bits {
    pub fn new(bytes: impl Into<Bytes>, len: i32) -> Self {
        Self {
            bytes: bytes.into(),
            len,
            valid: true,
        }
    }

    /// Render as a string of `0` and `1` characters.
    pub fn to_bit_string(&self) -> String {
        let mut out = String::with_capacity(self.len as usize);
        for i in 0..self.len as usize {
            let bit = (self.bytes[i / 8] >> (7 - i % 8)) & 1;
            out.push(if bit == 1 { '1' } else { '0' });
        }
        out
    }
}

fn decode_bits(format: Format, src: Bytes) -> TypeResult<Bits> {
    match format {
        Format::Binary => {
            if src.len() < 4 {
                return Err(TypeError::InvalidLength {
                    expected: 4,
                    got: src.len(),
                });
            }
            let len = i32::from_be_bytes([src[0], src[1], src[2], src[3]]);
            if len < 0 {
                return Err(TypeError::malformed("negative bit count"));
            }
            let expected = 4 + (len as usize + 7) / 8;
            if src.len() != expected {
                return Err(TypeError::InvalidLength {
                    expected,
                    got: src.len(),
                });
            }
            Ok(Bits {
                bytes: src.slice(4..),
                len,
                valid: true,
            })
        }
        Format::Text => {
            let text = utf8(&src)?;
            let mut bytes = vec![0u8; (text.len() + 7) / 8];
            for (i, c) in text.chars().enumerate() {
                match c {
                    '1' => bytes[i / 8] |= 1 << (7 - i % 8),
                    '0' => {}
                    other => {
                        return Err(TypeError::malformed(format!(
                            "invalid character in bit string: {other:?}"
                        )))
                    }
                }
            }
            Ok(Bits {
                bytes: Bytes::from(bytes),
                len: text.len() as i32,
                valid: true,
            })
        }
    }
}

fn encode_bits(bits: &Bits, format: Format, buf: &mut BytesMut) -> TypeResult<IsNull> {
    if !bits.valid {
        return Ok(IsNull::Yes);
    }
    match format {
        Format::Binary => {
            buf.put_i32(bits.len);
            buf.extend_from_slice(&bits.bytes);
        }
        Format::Text => buf.extend_from_slice(bits.to_bit_string().as_bytes()),
    }
    Ok(IsNull::No)
}

pub struct BitsCodec;

impl Codec for BitsCodec {
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
        if (*value).type_id() == TypeId::of::<Bits>() {
            Some(Box::new(BitsEncode(format)))
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
        if (*dst).type_id() == TypeId::of::<Bits>() {
            Some(Box::new(BitsScan(format)))
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
        decode_bits(format, src).map(|b| SqlValue::Text(b.to_bit_string()))
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
        decode_bits(format, src).map(|b| Some(Box::new(b) as Box<dyn Any>))
    }
}

struct BitsEncode(Format);

impl EncodePlan for BitsEncode {
    fn encode(
        &self,
        _registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let bits = value
            .downcast_ref::<Bits>()
            .ok_or(TypeError::TargetTypeChanged)?;
        encode_bits(bits, self.0, buf)
    }
}

struct BitsScan(Format);

impl ScanPlan for BitsScan {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(slot) = dst.downcast_mut::<Bits>() {
            *slot = match src {
                None => Bits::default(),
                Some(src) => decode_bits(self.0, src)?,
            };
            return Ok(());
        }
        replan_scan(registry, oid, format, src, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bits_binary() {
        // 9-bit value 111111111
        let src = Bytes::from_static(&[0, 0, 0, 9, 0xff, 0x80]);
        let bits = decode_bits(Format::Binary, src).unwrap();
        assert_eq!(&bits.bytes[..], &[0xff, 0x80]);
        assert_eq!(bits.len, 9);
        assert!(bits.valid);
    }

    #[test]
    fn test_decode_bits_length_mismatch() {
        let src = Bytes::from_static(&[0, 0, 0, 9, 0xff]);
        assert!(matches!(
            decode_bits(Format::Binary, src),
            Err(TypeError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_bit_string_round_trip() {
        let bits = decode_bits(Format::Text, Bytes::from_static(b"101100111")).unwrap();
        assert_eq!(bits.len, 9);
        assert_eq!(bits.to_bit_string(), "101100111");
    }
}
