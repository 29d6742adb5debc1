//! Value traits and conversion capabilities.
//!
//! A [`Value`] translates between native values and an internal canonical
//! representation for one type. To be usable on the wire a Value also
//! implements some combination of [`TextDecode`], [`BinaryDecode`],
//! [`TextEncode`], and [`BinaryEncode`].
//!
//! Operations that update a Value (`set`, `decode_text`, `decode_binary`)
//! entirely replace its contents. This lets `get` and `assign_to` hand out
//! internal data without a defensive copy; callers must never write through
//! what they receive.

pub mod enum_type;
pub mod numeric;
pub mod temporal;

pub use enum_type::EnumType;
pub use numeric::Numeric;
pub use temporal::{Date, InfinityModifier, Time, Timestamp, Timestamptz};

use std::any::Any;

use bytes::{Bytes, BytesMut};

use crate::error::{TypeError, TypeResult};
use crate::plan::IsNull;
use crate::registry::TypeRegistry;

/// Decodes the text wire format into self. A `src` of `None` is SQL NULL.
/// The decoder takes ownership of `src`; the caller must not reuse it.
pub trait TextDecode {
    fn decode_text(&mut self, registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()>;
}

/// Decodes the binary wire format into self. A `src` of `None` is SQL NULL.
/// The decoder takes ownership of `src`; the caller must not reuse it.
pub trait BinaryDecode {
    fn decode_binary(&mut self, registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()>;
}

/// Encodes self into the text wire format.
///
/// Appends nothing and returns [`IsNull::Yes`] for SQL NULL; the caller is
/// responsible for writing the NULL sentinel or the length of the data.
pub trait TextEncode {
    fn encode_text(&self, registry: &TypeRegistry, buf: &mut BytesMut) -> TypeResult<IsNull>;
}

/// Encodes self into the binary wire format. Same NULL contract as
/// [`TextEncode`].
pub trait BinaryEncode {
    fn encode_binary(&self, registry: &TypeRegistry, buf: &mut BytesMut) -> TypeResult<IsNull>;
}

/// A mutable holder for a single SQL value, possibly NULL.
///
/// The capability probes return `None` by default; concrete types override
/// the ones they implement with `Some(self)`. The registry probes a fresh
/// instance once at registration and caches the answers.
pub trait Value: Any + Send + Sync {
    /// Convert `src` and store it, taking ownership. `None` stores SQL NULL.
    fn set(&mut self, src: Option<Box<dyn Any>>) -> TypeResult<()>;

    /// The simplest native projection of the held value, `None` when NULL.
    /// Callers must not mutate through the returned value.
    fn get(&self) -> Option<Box<dyn Any>>;

    /// Convert the held value and write it into `dst`. Fails with
    /// [`TypeError::NullAssignment`] when NULL would be written into a
    /// destination that cannot hold it.
    fn assign_to(&self, dst: &mut dyn Any) -> TypeResult<()>;

    /// A fresh instance of the same concrete type with zero state.
    fn new_value(&self) -> Box<dyn Value>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn text_decoder(&mut self) -> Option<&mut dyn TextDecode> {
        None
    }
    fn binary_decoder(&mut self) -> Option<&mut dyn BinaryDecode> {
        None
    }
    fn text_encoder(&self) -> Option<&dyn TextEncode> {
        None
    }
    fn binary_encoder(&self) -> Option<&dyn BinaryEncode> {
        None
    }
    fn as_type_value(&self) -> Option<&dyn TypeValue> {
        None
    }
}

/// A [`Value`] whose instances are parameterized by type information learned
/// at registration time, e.g. the member list of an enum. One native carrier
/// type can represent many registered database types, so TypeValues never
/// enter the native-type index; they are looked up through [`type_name`].
///
/// [`type_name`]: TypeValue::type_name
pub trait TypeValue: Value {
    /// A fresh, fully parameterized empty instance, sharing the internal
    /// type information.
    fn new_type_value(&self) -> Box<dyn Value>;

    /// The registered database name of this type.
    fn type_name(&self) -> &str;
}

/// Return a new empty instance of the same type as `prototype`, delegating to
/// [`TypeValue::new_type_value`] where applicable.
pub fn new_value(prototype: &dyn Value) -> Box<dyn Value> {
    match prototype.as_type_value() {
        Some(tv) => tv.new_type_value(),
        None => prototype.new_value(),
    }
}

/// The simple database-facing value sum handed to external scanners.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

/// External scanner capability. Third-party types implement this to receive
/// decoded values without being registered as a [`Value`].
pub trait SqlScanner {
    fn scan(&mut self, value: SqlValue) -> TypeResult<()>;
}

/// Capability for destinations that consume the decoded text form directly.
/// `None` is SQL NULL.
pub trait TextScanner {
    fn scan_text(&mut self, src: Option<&str>) -> TypeResult<()>;
}

/// Convert a Value into the simple database-facing sum, preferring the text
/// encoding when the type provides one.
pub fn database_sql_value(registry: &TypeRegistry, value: &dyn Value) -> TypeResult<SqlValue> {
    if let Some(encoder) = value.text_encoder() {
        let mut buf = BytesMut::new();
        return match encoder.encode_text(registry, &mut buf)? {
            IsNull::Yes => Ok(SqlValue::Null),
            IsNull::No => {
                let text = String::from_utf8(buf.to_vec())
                    .map_err(|e| TypeError::malformed(format!("invalid UTF-8: {e}")))?;
                Ok(SqlValue::Text(text))
            }
        };
    }

    let Some(simple) = value.get() else {
        return Ok(SqlValue::Null);
    };
    if let Some(v) = simple.downcast_ref::<bool>() {
        return Ok(SqlValue::Bool(*v));
    }
    if let Some(v) = simple.downcast_ref::<i64>() {
        return Ok(SqlValue::Int(*v));
    }
    if let Some(v) = simple.downcast_ref::<f64>() {
        return Ok(SqlValue::Float(*v));
    }
    if let Some(v) = simple.downcast_ref::<String>() {
        return Ok(SqlValue::Text(v.clone()));
    }
    if let Some(v) = simple.downcast_ref::<Vec<u8>>() {
        return Ok(SqlValue::Bytes(v.clone()));
    }
    Err(TypeError::Unsupported(
        "value has no database-facing representation",
    ))
}

/// Store `v` into a destination of type `T` or `Option<T>`.
pub(crate) fn store<T: 'static>(dst: &mut dyn Any, v: T) -> bool {
    if let Some(slot) = dst.downcast_mut::<T>() {
        *slot = v;
        return true;
    }
    if let Some(slot) = dst.downcast_mut::<Option<T>>() {
        *slot = Some(v);
        return true;
    }
    false
}

/// Store NULL into a destination of type `Option<T>`.
pub(crate) fn store_none_for<T: 'static>(dst: &mut dyn Any) -> bool {
    if let Some(slot) = dst.downcast_mut::<Option<T>>() {
        *slot = None;
        return true;
    }
    false
}
