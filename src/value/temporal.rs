//! date, time, timestamp, and timestamptz value types.
//!
//! Binary formats count from the PostgreSQL epoch, 2000-01-01: days for
//! date, microseconds for timestamp and timestamptz, microseconds since
//! midnight for time. The extreme sentinel values encode infinity and
//! negative infinity for date and the timestamp types.

use std::any::Any;
use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use once_cell::sync::Lazy;

use super::{store, store_none_for, BinaryDecode, BinaryEncode, TextDecode, TextEncode, Value};
use crate::error::{TypeError, TypeResult};
use crate::plan::IsNull;
use crate::registry::TypeRegistry;

const INFINITY_MICROS: i64 = i64::MAX;
const NEG_INFINITY_MICROS: i64 = i64::MIN;
const INFINITY_DAYS: i32 = i32::MAX;
const NEG_INFINITY_DAYS: i32 = i32::MIN;

static PG_EPOCH: Lazy<NaiveDateTime> = Lazy::new(|| {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("2000-01-01 00:00:00 is a valid datetime")
});

static PG_EPOCH_DATE: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(2000, 1, 1).expect("2000-01-01 is a valid date"));

/// Marks a date or timestamp as infinitely far in the past or future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i8)]
pub enum InfinityModifier {
    Infinity = 1,
    #[default]
    None = 0,
    NegativeInfinity = -1,
}

impl fmt::Display for InfinityModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfinityModifier::Infinity => write!(f, "infinity"),
            InfinityModifier::None => write!(f, "none"),
            InfinityModifier::NegativeInfinity => write!(f, "-infinity"),
        }
    }
}

fn read_i64(src: &[u8]) -> TypeResult<i64> {
    if src.len() != 8 {
        return Err(TypeError::InvalidLength {
            expected: 8,
            got: src.len(),
        });
    }
    let mut raw = [0u8; 8];
    raw.copy_from_slice(src);
    Ok(i64::from_be_bytes(raw))
}

fn read_i32(src: &[u8]) -> TypeResult<i32> {
    if src.len() != 4 {
        return Err(TypeError::InvalidLength {
            expected: 4,
            got: src.len(),
        });
    }
    let mut raw = [0u8; 4];
    raw.copy_from_slice(src);
    Ok(i32::from_be_bytes(raw))
}

fn micros_to_datetime(micros: i64) -> TypeResult<NaiveDateTime> {
    PG_EPOCH
        .checked_add_signed(Duration::microseconds(micros))
        .ok_or_else(|| TypeError::malformed(format!("timestamp out of range: {micros}")))
}

fn datetime_to_micros(time: NaiveDateTime) -> TypeResult<i64> {
    time.signed_duration_since(*PG_EPOCH)
        .num_microseconds()
        .ok_or_else(|| TypeError::malformed("timestamp out of range"))
}

// ==================== timestamp ====================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timestamp {
    pub time: NaiveDateTime,
    pub infinity: InfinityModifier,
    pub valid: bool,
}

impl Timestamp {
    pub fn new(time: NaiveDateTime) -> Self {
        Self {
            time,
            infinity: InfinityModifier::None,
            valid: true,
        }
    }
}

impl Value for Timestamp {
    fn set(&mut self, src: Option<Box<dyn Any>>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        if let Some(v) = src.downcast_ref::<Timestamp>() {
            *self = *v;
            return Ok(());
        }
        if let Some(v) = src.downcast_ref::<NaiveDateTime>() {
            *self = Self::new(*v);
            return Ok(());
        }
        if let Some(v) = src.downcast_ref::<DateTime<Utc>>() {
            *self = Self::new(v.naive_utc());
            return Ok(());
        }
        if let Some(v) = src.downcast_ref::<String>() {
            *self = parse_timestamp(v)?;
            return Ok(());
        }
        Err(TypeError::Unsupported("cannot convert source to timestamp"))
    }

    fn get(&self) -> Option<Box<dyn Any>> {
        if !self.valid {
            return None;
        }
        if self.infinity != InfinityModifier::None {
            return Some(Box::new(self.infinity));
        }
        Some(Box::new(self.time))
    }

    fn assign_to(&self, dst: &mut dyn Any) -> TypeResult<()> {
        if !self.valid {
            if store_none_for::<NaiveDateTime>(dst)
                || store_none_for::<DateTime<Utc>>(dst)
                || store_none_for::<String>(dst)
                || store_none_for::<Timestamp>(dst)
            {
                return Ok(());
            }
            return Err(TypeError::NullAssignment {
                target: "destination",
            });
        }
        if store(dst, *self) {
            return Ok(());
        }
        if self.infinity != InfinityModifier::None {
            if store(dst, self.infinity.to_string()) {
                return Ok(());
            }
            return Err(TypeError::Unsupported(
                "infinite timestamp has no finite representation",
            ));
        }
        if store(dst, self.time) {
            return Ok(());
        }
        if store(dst, self.time.and_utc()) {
            return Ok(());
        }
        if store(dst, format_timestamp(self.time)) {
            return Ok(());
        }
        Err(TypeError::Unsupported(
            "unsupported timestamp assignment target",
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

    fn binary_encoder(&self) -> Option<&dyn BinaryEncode> {
        Some(self)
    }
}

fn parse_timestamp(text: &str) -> TypeResult<Timestamp> {
    match text {
        "infinity" => Ok(Timestamp {
            infinity: InfinityModifier::Infinity,
            valid: true,
            ..Default::default()
        }),
        "-infinity" => Ok(Timestamp {
            infinity: InfinityModifier::NegativeInfinity,
            valid: true,
            ..Default::default()
        }),
        _ => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
            .map(Timestamp::new)
            .map_err(|e| TypeError::malformed(format!("invalid timestamp {text:?}: {e}"))),
    }
}

fn format_timestamp(time: NaiveDateTime) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

impl TextDecode for Timestamp {
    fn decode_text(&mut self, _registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        let text = std::str::from_utf8(&src)
            .map_err(|e| TypeError::malformed(format!("invalid UTF-8 in timestamp: {e}")))?;
        *self = parse_timestamp(text)?;
        Ok(())
    }
}

impl BinaryDecode for Timestamp {
    fn decode_binary(&mut self, _registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        let micros = read_i64(&src)?;
        *self = match micros {
            INFINITY_MICROS => Timestamp {
                infinity: InfinityModifier::Infinity,
                valid: true,
                ..Default::default()
            },
            NEG_INFINITY_MICROS => Timestamp {
                infinity: InfinityModifier::NegativeInfinity,
                valid: true,
                ..Default::default()
            },
            _ => Timestamp::new(micros_to_datetime(micros)?),
        };
        Ok(())
    }
}

impl TextEncode for Timestamp {
    fn encode_text(&self, _registry: &TypeRegistry, buf: &mut BytesMut) -> TypeResult<IsNull> {
        if !self.valid {
            return Ok(IsNull::Yes);
        }
        match self.infinity {
            InfinityModifier::None => {
                buf.extend_from_slice(format_timestamp(self.time).as_bytes())
            }
            modifier => buf.extend_from_slice(modifier.to_string().as_bytes()),
        }
        Ok(IsNull::No)
    }
}

impl BinaryEncode for Timestamp {
    fn encode_binary(&self, _registry: &TypeRegistry, buf: &mut BytesMut) -> TypeResult<IsNull> {
        if !self.valid {
            return Ok(IsNull::Yes);
        }
        let micros = match self.infinity {
            InfinityModifier::Infinity => INFINITY_MICROS,
            InfinityModifier::NegativeInfinity => NEG_INFINITY_MICROS,
            InfinityModifier::None => datetime_to_micros(self.time)?,
        };
        buf.put_i64(micros);
        Ok(IsNull::No)
    }
}

// ==================== timestamptz ====================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timestamptz {
    pub time: DateTime<Utc>,
    pub infinity: InfinityModifier,
    pub valid: bool,
}

impl Timestamptz {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time,
            infinity: InfinityModifier::None,
            valid: true,
        }
    }
}

impl Value for Timestamptz {
    fn set(&mut self, src: Option<Box<dyn Any>>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        if let Some(v) = src.downcast_ref::<Timestamptz>() {
            *self = *v;
            return Ok(());
        }
        if let Some(v) = src.downcast_ref::<DateTime<Utc>>() {
            *self = Self::new(*v);
            return Ok(());
        }
        if let Some(v) = src.downcast_ref::<NaiveDateTime>() {
            *self = Self::new(v.and_utc());
            return Ok(());
        }
        if let Some(v) = src.downcast_ref::<String>() {
            *self = parse_timestamptz(v)?;
            return Ok(());
        }
        Err(TypeError::Unsupported(
            "cannot convert source to timestamptz",
        ))
    }

    fn get(&self) -> Option<Box<dyn Any>> {
        if !self.valid {
            return None;
        }
        if self.infinity != InfinityModifier::None {
            return Some(Box::new(self.infinity));
        }
        Some(Box::new(self.time))
    }

    fn assign_to(&self, dst: &mut dyn Any) -> TypeResult<()> {
        if !self.valid {
            if store_none_for::<DateTime<Utc>>(dst)
                || store_none_for::<NaiveDateTime>(dst)
                || store_none_for::<String>(dst)
                || store_none_for::<Timestamptz>(dst)
            {
                return Ok(());
            }
            return Err(TypeError::NullAssignment {
                target: "destination",
            });
        }
        if store(dst, *self) {
            return Ok(());
        }
        if self.infinity != InfinityModifier::None {
            if store(dst, self.infinity.to_string()) {
                return Ok(());
            }
            return Err(TypeError::Unsupported(
                "infinite timestamptz has no finite representation",
            ));
        }
        if store(dst, self.time) {
            return Ok(());
        }
        if store(dst, self.time.naive_utc()) {
            return Ok(());
        }
        if store(dst, format_timestamptz(self.time)) {
            return Ok(());
        }
        Err(TypeError::Unsupported(
            "unsupported timestamptz assignment target",
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

    fn binary_encoder(&self) -> Option<&dyn BinaryEncode> {
        Some(self)
    }
}

fn parse_timestamptz(text: &str) -> TypeResult<Timestamptz> {
    match text {
        "infinity" => Ok(Timestamptz {
            infinity: InfinityModifier::Infinity,
            valid: true,
            ..Default::default()
        }),
        "-infinity" => Ok(Timestamptz {
            infinity: InfinityModifier::NegativeInfinity,
            valid: true,
            ..Default::default()
        }),
        _ => DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z")
            .map(|t| Timestamptz::new(t.with_timezone(&Utc)))
            .map_err(|e| TypeError::malformed(format!("invalid timestamptz {text:?}: {e}"))),
    }
}

fn format_timestamptz(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.6f+00").to_string()
}

impl TextDecode for Timestamptz {
    fn decode_text(&mut self, _registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        let text = std::str::from_utf8(&src)
            .map_err(|e| TypeError::malformed(format!("invalid UTF-8 in timestamptz: {e}")))?;
        *self = parse_timestamptz(text)?;
        Ok(())
    }
}

impl BinaryDecode for Timestamptz {
    fn decode_binary(&mut self, _registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        let micros = read_i64(&src)?;
        *self = match micros {
            INFINITY_MICROS => Timestamptz {
                infinity: InfinityModifier::Infinity,
                valid: true,
                ..Default::default()
            },
            NEG_INFINITY_MICROS => Timestamptz {
                infinity: InfinityModifier::NegativeInfinity,
                valid: true,
                ..Default::default()
            },
            _ => Timestamptz::new(micros_to_datetime(micros)?.and_utc()),
        };
        Ok(())
    }
}

impl TextEncode for Timestamptz {
    fn encode_text(&self, _registry: &TypeRegistry, buf: &mut BytesMut) -> TypeResult<IsNull> {
        if !self.valid {
            return Ok(IsNull::Yes);
        }
        match self.infinity {
            InfinityModifier::None => {
                buf.extend_from_slice(format_timestamptz(self.time).as_bytes())
            }
            modifier => buf.extend_from_slice(modifier.to_string().as_bytes()),
        }
        Ok(IsNull::No)
    }
}

impl BinaryEncode for Timestamptz {
    fn encode_binary(&self, _registry: &TypeRegistry, buf: &mut BytesMut) -> TypeResult<IsNull> {
        if !self.valid {
            return Ok(IsNull::Yes);
        }
        let micros = match self.infinity {
            InfinityModifier::Infinity => INFINITY_MICROS,
            InfinityModifier::NegativeInfinity => NEG_INFINITY_MICROS,
            InfinityModifier::None => datetime_to_micros(self.time.naive_utc())?,
        };
        buf.put_i64(micros);
        Ok(IsNull::No)
    }
}

// ==================== date ====================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Date {
    pub date: NaiveDate,
    pub infinity: InfinityModifier,
    pub valid: bool,
}

impl Date {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            infinity: InfinityModifier::None,
            valid: true,
        }
    }
}

impl Value for Date {
    fn set(&mut self, src: Option<Box<dyn Any>>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        if let Some(v) = src.downcast_ref::<Date>() {
            *self = *v;
            return Ok(());
        }
        if let Some(v) = src.downcast_ref::<NaiveDate>() {
            *self = Self::new(*v);
            return Ok(());
        }
        if let Some(v) = src.downcast_ref::<String>() {
            *self = parse_date(v)?;
            return Ok(());
        }
        Err(TypeError::Unsupported("cannot convert source to date"))
    }

    fn get(&self) -> Option<Box<dyn Any>> {
        if !self.valid {
            return None;
        }
        if self.infinity != InfinityModifier::None {
            return Some(Box::new(self.infinity));
        }
        Some(Box::new(self.date))
    }

    fn assign_to(&self, dst: &mut dyn Any) -> TypeResult<()> {
        if !self.valid {
            if store_none_for::<NaiveDate>(dst)
                || store_none_for::<String>(dst)
                || store_none_for::<Date>(dst)
            {
                return Ok(());
            }
            return Err(TypeError::NullAssignment {
                target: "destination",
            });
        }
        if store(dst, *self) {
            return Ok(());
        }
        if self.infinity != InfinityModifier::None {
            if store(dst, self.infinity.to_string()) {
                return Ok(());
            }
            return Err(TypeError::Unsupported(
                "infinite date has no finite representation",
            ));
        }
        if store(dst, self.date) {
            return Ok(());
        }
        if store(dst, self.date.format("%Y-%m-%d").to_string()) {
            return Ok(());
        }
        Err(TypeError::Unsupported("unsupported date assignment target"))
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

    fn binary_encoder(&self) -> Option<&dyn BinaryEncode> {
        Some(self)
    }
}

fn parse_date(text: &str) -> TypeResult<Date> {
    match text {
        "infinity" => Ok(Date {
            infinity: InfinityModifier::Infinity,
            valid: true,
            ..Default::default()
        }),
        "-infinity" => Ok(Date {
            infinity: InfinityModifier::NegativeInfinity,
            valid: true,
            ..Default::default()
        }),
        _ => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Date::new)
            .map_err(|e| TypeError::malformed(format!("invalid date {text:?}: {e}"))),
    }
}

impl TextDecode for Date {
    fn decode_text(&mut self, _registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        let text = std::str::from_utf8(&src)
            .map_err(|e| TypeError::malformed(format!("invalid UTF-8 in date: {e}")))?;
        *self = parse_date(text)?;
        Ok(())
    }
}

impl BinaryDecode for Date {
    fn decode_binary(&mut self, _registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        let days = read_i32(&src)?;
        *self = match days {
            INFINITY_DAYS => Date {
                infinity: InfinityModifier::Infinity,
                valid: true,
                ..Default::default()
            },
            NEG_INFINITY_DAYS => Date {
                infinity: InfinityModifier::NegativeInfinity,
                valid: true,
                ..Default::default()
            },
            _ => Date::new(
                PG_EPOCH_DATE
                    .checked_add_signed(Duration::days(i64::from(days)))
                    .ok_or_else(|| TypeError::malformed(format!("date out of range: {days}")))?,
            ),
        };
        Ok(())
    }
}

impl TextEncode for Date {
    fn encode_text(&self, _registry: &TypeRegistry, buf: &mut BytesMut) -> TypeResult<IsNull> {
        if !self.valid {
            return Ok(IsNull::Yes);
        }
        match self.infinity {
            InfinityModifier::None => {
                buf.extend_from_slice(self.date.format("%Y-%m-%d").to_string().as_bytes())
            }
            modifier => buf.extend_from_slice(modifier.to_string().as_bytes()),
        }
        Ok(IsNull::No)
    }
}

impl BinaryEncode for Date {
    fn encode_binary(&self, _registry: &TypeRegistry, buf: &mut BytesMut) -> TypeResult<IsNull> {
        if !self.valid {
            return Ok(IsNull::Yes);
        }
        let days = match self.infinity {
            InfinityModifier::Infinity => INFINITY_DAYS,
            InfinityModifier::NegativeInfinity => NEG_INFINITY_DAYS,
            InfinityModifier::None => {
                let days = self.date.signed_duration_since(*PG_EPOCH_DATE).num_days();
                i32::try_from(days).map_err(|_| TypeError::malformed("date out of range"))?
            }
        };
        buf.put_i32(days);
        Ok(IsNull::No)
    }
}

// ==================== time ====================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Time {
    pub time: NaiveTime,
    pub valid: bool,
}

impl Time {
    pub fn new(time: NaiveTime) -> Self {
        Self { time, valid: true }
    }
}

impl Value for Time {
    fn set(&mut self, src: Option<Box<dyn Any>>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        if let Some(v) = src.downcast_ref::<Time>() {
            *self = *v;
            return Ok(());
        }
        if let Some(v) = src.downcast_ref::<NaiveTime>() {
            *self = Self::new(*v);
            return Ok(());
        }
        if let Some(v) = src.downcast_ref::<String>() {
            *self = parse_time(v)?;
            return Ok(());
        }
        Err(TypeError::Unsupported("cannot convert source to time"))
    }

    fn get(&self) -> Option<Box<dyn Any>> {
        if self.valid {
            Some(Box::new(self.time))
        } else {
            None
        }
    }

    fn assign_to(&self, dst: &mut dyn Any) -> TypeResult<()> {
        if !self.valid {
            if store_none_for::<NaiveTime>(dst)
                || store_none_for::<String>(dst)
                || store_none_for::<Time>(dst)
            {
                return Ok(());
            }
            return Err(TypeError::NullAssignment {
                target: "destination",
            });
        }
        if store(dst, *self) {
            return Ok(());
        }
        if store(dst, self.time) {
            return Ok(());
        }
        if store(dst, self.time.format("%H:%M:%S%.6f").to_string()) {
            return Ok(());
        }
        Err(TypeError::Unsupported("unsupported time assignment target"))
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

    fn binary_encoder(&self) -> Option<&dyn BinaryEncode> {
        Some(self)
    }
}

fn parse_time(text: &str) -> TypeResult<Time> {
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .map(Time::new)
        .map_err(|e| TypeError::malformed(format!("invalid time {text:?}: {e}")))
}

impl TextDecode for Time {
    fn decode_text(&mut self, _registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        let text = std::str::from_utf8(&src)
            .map_err(|e| TypeError::malformed(format!("invalid UTF-8 in time: {e}")))?;
        *self = parse_time(text)?;
        Ok(())
    }
}

impl BinaryDecode for Time {
    fn decode_binary(&mut self, _registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        let micros = read_i64(&src)?;
        if micros < 0 {
            return Err(TypeError::malformed(format!("negative time: {micros}")));
        }
        let seconds = (micros / 1_000_000) as u32;
        let nanos = ((micros % 1_000_000) * 1_000) as u32;
        let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos)
            .ok_or_else(|| TypeError::malformed(format!("time out of range: {micros}")))?;
        *self = Time::new(time);
        Ok(())
    }
}

impl TextEncode for Time {
    fn encode_text(&self, _registry: &TypeRegistry, buf: &mut BytesMut) -> TypeResult<IsNull> {
        if !self.valid {
            return Ok(IsNull::Yes);
        }
        buf.extend_from_slice(self.time.format("%H:%M:%S%.6f").to_string().as_bytes());
        Ok(IsNull::No)
    }
}

impl BinaryEncode for Time {
    fn encode_binary(&self, _registry: &TypeRegistry, buf: &mut BytesMut) -> TypeResult<IsNull> {
        if !self.valid {
            return Ok(IsNull::Yes);
        }
        let micros = i64::from(self.time.num_seconds_from_midnight()) * 1_000_000
            + i64::from(self.time.nanosecond() / 1_000);
        buf.put_i64(micros);
        Ok(IsNull::No)
    }
}
