//! numeric value type.
//!
//! The wire's variable-precision decimal is held as its canonical decimal
//! string so no precision is lost; callers convert on demand. Binary format
//! is the packed base-10000 layout (ndigits, weight, sign, dscale, digits).

use std::any::Any;

use bytes::{Bytes, BytesMut};

use super::{store, store_none_for, BinaryDecode, TextDecode, TextEncode, Value};
use crate::error::{TypeError, TypeResult};
use crate::plan::IsNull;
use crate::registry::TypeRegistry;

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;

/// An arbitrary-precision decimal held as its canonical string form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Numeric {
    pub repr: String,
    pub valid: bool,
}

impl Numeric {
    pub fn new(repr: impl Into<String>) -> Self {
        Self {
            repr: repr.into(),
            valid: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.repr
    }

    /// Parse as f64. May lose precision for very large values.
    pub fn to_f64(&self) -> TypeResult<f64> {
        self.repr
            .parse()
            .map_err(|e| TypeError::malformed(format!("invalid numeric: {e}")))
    }

    /// Parse as i64, truncating any fractional part.
    pub fn to_i64(&self) -> TypeResult<i64> {
        let int_part = self.repr.split('.').next().unwrap_or("0");
        int_part
            .parse()
            .map_err(|e| TypeError::malformed(format!("invalid numeric: {e}")))
    }
}

impl Value for Numeric {
    fn set(&mut self, src: Option<Box<dyn Any>>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        if let Some(v) = src.downcast_ref::<Numeric>() {
            *self = v.clone();
            return Ok(());
        }
        if let Some(v) = src.downcast_ref::<String>() {
            *self = Self::new(v.clone());
            return Ok(());
        }
        if let Some(v) = src.downcast_ref::<i64>() {
            *self = Self::new(v.to_string());
            return Ok(());
        }
        if let Some(v) = src.downcast_ref::<f64>() {
            *self = Self::new(v.to_string());
            return Ok(());
        }
        Err(TypeError::Unsupported("cannot convert source to numeric"))
    }

    fn get(&self) -> Option<Box<dyn Any>> {
        if self.valid {
            Some(Box::new(self.repr.clone()))
        } else {
            None
        }
    }

    fn assign_to(&self, dst: &mut dyn Any) -> TypeResult<()> {
        if !self.valid {
            if store_none_for::<f64>(dst)
                || store_none_for::<i64>(dst)
                || store_none_for::<String>(dst)
                || store_none_for::<Numeric>(dst)
            {
                return Ok(());
            }
            return Err(TypeError::NullAssignment {
                target: "destination",
            });
        }
        if let Some(slot) = dst.downcast_mut::<Numeric>() {
            *slot = self.clone();
            return Ok(());
        }
        if store(dst, self.repr.clone()) {
            return Ok(());
        }
        if dst.downcast_ref::<f64>().is_some() || dst.downcast_ref::<Option<f64>>().is_some() {
            let v = self.to_f64()?;
            store(dst, v);
            return Ok(());
        }
        if dst.downcast_ref::<i64>().is_some() || dst.downcast_ref::<Option<i64>>().is_some() {
            let v = self.to_i64()?;
            store(dst, v);
            return Ok(());
        }
        if let Some(slot) = dst.downcast_mut::<Option<Numeric>>() {
            *slot = Some(self.clone());
            return Ok(());
        }
        Err(TypeError::Unsupported(
            "unsupported numeric assignment target",
        ))
    }

    fn new_value(&self) -> Box<dyn Value> {
        Box::new(Self::default())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn text_decoder(&mut self) -> Option<&mut dyn TextDecode> {
        Some(self)
    }

    fn binary_decoder(&mut self) -> Option<&mut dyn BinaryDecode> {
        Some(self)
    }

    fn text_encoder(&self) -> Option<&dyn TextEncode> {
        Some(self)
    }
}

impl TextDecode for Numeric {
    fn decode_text(&mut self, _registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        let text = std::str::from_utf8(&src)
            .map_err(|e| TypeError::malformed(format!("invalid UTF-8 in numeric: {e}")))?;
        *self = Self::new(text);
        Ok(())
    }
}

impl BinaryDecode for Numeric {
    fn decode_binary(&mut self, _registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        *self = decode_numeric_binary(&src)?;
        Ok(())
    }
}

impl TextEncode for Numeric {
    fn encode_text(&self, _registry: &TypeRegistry, buf: &mut BytesMut) -> TypeResult<IsNull> {
        if !self.valid {
            return Ok(IsNull::Yes);
        }
        buf.extend_from_slice(self.repr.as_bytes());
        Ok(IsNull::No)
    }
}

/// Unpack the binary numeric layout into a decimal string.
fn decode_numeric_binary(src: &[u8]) -> TypeResult<Numeric> {
    if src.len() < 8 {
        return Err(TypeError::malformed("numeric header truncated"));
    }

    let ndigits = u16::from_be_bytes([src[0], src[1]]) as usize;
    let weight = i16::from_be_bytes([src[2], src[3]]);
    let sign = u16::from_be_bytes([src[4], src[5]]);
    let dscale = u16::from_be_bytes([src[6], src[7]]) as usize;

    if src.len() < 8 + ndigits * 2 {
        return Err(TypeError::malformed("numeric digits truncated"));
    }

    if sign == NUMERIC_NAN {
        return Ok(Numeric::new("NaN"));
    }

    if ndigits == 0 {
        let mut out = String::from("0");
        if dscale > 0 {
            out.push('.');
            out.push_str(&"0".repeat(dscale));
        }
        return Ok(Numeric::new(out));
    }

    let mut digits = Vec::with_capacity(ndigits);
    for i in 0..ndigits {
        digits.push(u16::from_be_bytes([src[8 + i * 2], src[9 + i * 2]]));
    }

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }

    // Digits are base-10000, weight is the position of the first digit
    // relative to the decimal point.
    if weight < 0 {
        out.push('0');
    } else {
        let int_digits = weight as usize + 1;
        for (i, digit) in digits.iter().enumerate().take(int_digits) {
            if i == 0 {
                out.push_str(&digit.to_string());
            } else {
                out.push_str(&format!("{digit:04}"));
            }
        }
        for _ in digits.len()..int_digits {
            out.push_str("0000");
        }
    }

    if dscale > 0 {
        out.push('.');
        let mut fraction = String::new();
        // Positions before the first stored digit are zero.
        let mut position = weight as i64 + 1;
        let mut index = position.max(0) as usize;
        while position < 0 {
            fraction.push_str("0000");
            position += 1;
        }
        while index < digits.len() {
            fraction.push_str(&format!("{:04}", digits[index]));
            index += 1;
        }
        while fraction.len() < dscale {
            fraction.push('0');
        }
        fraction.truncate(dscale);
        out.push_str(&fraction);
    }

    Ok(Numeric::new(out))
}
