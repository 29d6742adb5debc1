//! Data type records and the type registry.
//!
//! The registry owns every registered [`DataType`] and the indices the
//! planner dispatches through: by OID, by name, and by native type. Because
//! destinations and values cross the API as `dyn Any`, anything the planner
//! must discover about a concrete type (is it a Value, an external scanner,
//! an option slot, a vector) is captured here as a monomorphized vtable at
//! registration time.
//!
//! The registry is a plain mutable structure: perform all registrations
//! before planning, then share it freely. Planning and scanning on a frozen
//! registry are safe from multiple threads; only the lazily derived
//! native-type index mutates afterwards, and it sits behind a lock.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use parking_lot::RwLock;

use crate::codec::{
    ArrayCodec, Bits, BitsCodec, BoolCodec, ByteaCodec, Codec, Float4Codec, Float8Codec,
    Int2Codec, Int4Codec, Int8Codec, JsonCodec, JsonbCodec, TextCodec, TextFormatOnlyCodec,
    UuidCodec,
};
use crate::error::{TypeError, TypeResult};
use crate::format::Format;
use crate::oid;
use crate::plan::IsNull;
use crate::value::{
    new_value, Date, Numeric, SqlScanner, TextScanner, Time, Timestamp, Timestamptz, Value,
};

/// Casts an erased destination or value to its [`Value`] trait object, with
/// the decode capabilities of the concrete type cached alongside.
#[derive(Clone, Copy)]
pub(crate) struct ValueCaster {
    pub(crate) as_value_mut: fn(&mut dyn Any) -> Option<&mut dyn Value>,
    pub(crate) as_value_ref: fn(&dyn Any) -> Option<&dyn Value>,
    pub(crate) has_text_decoder: bool,
    pub(crate) has_binary_decoder: bool,
}

pub(crate) type SqlScannerCaster = fn(&mut dyn Any) -> Option<&mut dyn SqlScanner>;
pub(crate) type TextScannerCaster = fn(&mut dyn Any) -> Option<&mut dyn TextScanner>;

/// What an erased `&dyn Any` turned out to hold when viewed as `Option<T>`.
pub(crate) enum OptionRef<'a> {
    NotOption,
    Null,
    Value(&'a dyn Any),
}

/// Monomorphized operations on `Option<T>` destinations and values. This is
/// how SQL NULL reaches a typed native slot: `None` for NULL, allocate the
/// inner value and delegate otherwise.
#[derive(Clone, Copy)]
pub(crate) struct OptionSlot {
    pub(crate) set_none: fn(&mut dyn Any) -> bool,
    pub(crate) install: fn(&mut dyn Any) -> Option<&mut dyn Any>,
    pub(crate) inner_default: fn() -> Box<dyn Any>,
    pub(crate) unwrap_ref: for<'a> fn(&'a dyn Any) -> OptionRef<'a>,
}

fn option_slot<T: Default + 'static>() -> OptionSlot {
    OptionSlot {
        set_none: |any| match any.downcast_mut::<Option<T>>() {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        },
        install: |any| {
            let slot = any.downcast_mut::<Option<T>>()?;
            *slot = Some(T::default());
            slot.as_mut().map(|v| v as &mut dyn Any)
        },
        inner_default: || Box::new(T::default()),
        unwrap_ref: |any| match any.downcast_ref::<Option<T>>() {
            None => OptionRef::NotOption,
            Some(None) => OptionRef::Null,
            Some(Some(v)) => OptionRef::Value(v),
        },
    }
}

/// Monomorphized operations on `Vec<T>` destinations and values, used by the
/// array codec to build and walk vectors it only knows as `dyn Any`.
#[derive(Clone, Copy)]
pub(crate) struct ArrayKind {
    pub(crate) new_elem: fn() -> Box<dyn Any>,
    pub(crate) clear: fn(&mut dyn Any) -> bool,
    pub(crate) push: fn(&mut dyn Any, Box<dyn Any>) -> bool,
    pub(crate) len: fn(&dyn Any) -> Option<usize>,
    pub(crate) get: for<'a> fn(&'a dyn Any, usize) -> Option<&'a dyn Any>,
}

fn array_kind<T: Default + 'static>() -> ArrayKind {
    ArrayKind {
        new_elem: || Box::new(T::default()),
        clear: |any| match any.downcast_mut::<Vec<T>>() {
            Some(vec) => {
                vec.clear();
                true
            }
            None => false,
        },
        push: |any, elem| {
            let Some(vec) = any.downcast_mut::<Vec<T>>() else {
                return false;
            };
            let Ok(elem) = elem.downcast::<T>() else {
                return false;
            };
            vec.push(*elem);
            true
        },
        len: |any| any.downcast_ref::<Vec<T>>().map(Vec::len),
        get: |any, i| {
            any.downcast_ref::<Vec<T>>()
                .and_then(|v| v.get(i))
                .map(|e| e as &dyn Any)
        },
    }
}

/// Binds a name and OID to a [`Value`] prototype, a [`Codec`], or both.
/// Either one is sufficient to make the type usable.
pub struct DataType {
    name: String,
    oid: u32,
    value: Option<Box<dyn Value>>,
    codec: Option<Arc<dyn Codec>>,
    value_type: Option<TypeId>,
    value_is_type_value: bool,
    has_text_decoder: bool,
    has_binary_decoder: bool,
    caster: Option<ValueCaster>,
}

impl DataType {
    /// A codec-backed data type.
    pub fn with_codec(name: impl Into<String>, oid: u32, codec: Arc<dyn Codec>) -> Self {
        Self {
            name: name.into(),
            oid,
            value: None,
            codec: Some(codec),
            value_type: None,
            value_is_type_value: false,
            has_text_decoder: false,
            has_binary_decoder: false,
            caster: None,
        }
    }

    /// A data type backed by a [`Value`] prototype. The concrete type is
    /// captured here so the planner can recognize destinations of type `V`
    /// later.
    pub fn with_value<V: Value>(name: impl Into<String>, oid: u32, prototype: V) -> Self {
        Self {
            name: name.into(),
            oid,
            value: Some(Box::new(prototype)),
            codec: None,
            value_type: Some(TypeId::of::<V>()),
            value_is_type_value: false,
            has_text_decoder: false,
            has_binary_decoder: false,
            caster: Some(ValueCaster {
                as_value_mut: |any| any.downcast_mut::<V>().map(|v| v as &mut dyn Value),
                as_value_ref: |any| any.downcast_ref::<V>().map(|v| v as &dyn Value),
                has_text_decoder: false,
                has_binary_decoder: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn oid(&self) -> u32 {
        self.oid
    }

    pub fn codec(&self) -> Option<&Arc<dyn Codec>> {
        self.codec.as_ref()
    }

    pub fn value(&self) -> Option<&dyn Value> {
        self.value.as_deref()
    }
}

/// The registry of data types for one connection-equivalent scope.
pub struct TypeRegistry {
    oid_to_data_type: HashMap<u32, Arc<DataType>>,
    name_to_data_type: HashMap<String, Arc<DataType>>,
    type_to_name: HashMap<TypeId, String>,
    oid_to_format: HashMap<u32, Format>,
    derived: RwLock<Option<HashMap<TypeId, Arc<DataType>>>>,
    prefer_assign_to: HashSet<TypeId>,
    value_casters: HashMap<TypeId, ValueCaster>,
    sql_scanner_casters: HashMap<TypeId, SqlScannerCaster>,
    text_scanner_casters: HashMap<TypeId, TextScannerCaster>,
    option_slots: HashMap<TypeId, OptionSlot>,
    array_kinds: HashMap<TypeId, ArrayKind>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    fn empty() -> Self {
        Self {
            oid_to_data_type: HashMap::new(),
            name_to_data_type: HashMap::new(),
            type_to_name: HashMap::new(),
            oid_to_format: HashMap::new(),
            derived: RwLock::new(None),
            prefer_assign_to: HashSet::new(),
            value_casters: HashMap::new(),
            sql_scanner_casters: HashMap::new(),
            text_scanner_casters: HashMap::new(),
            option_slots: HashMap::new(),
            array_kinds: HashMap::new(),
        }
    }

    /// A registry seeded with the built-in types and default native-type
    /// mappings.
    pub fn new() -> Self {
        let mut reg = Self::empty();

        let bool_codec: Arc<dyn Codec> = Arc::new(BoolCodec);
        let int2_codec: Arc<dyn Codec> = Arc::new(Int2Codec);
        let int4_codec: Arc<dyn Codec> = Arc::new(Int4Codec);
        let int8_codec: Arc<dyn Codec> = Arc::new(Int8Codec);
        let float4_codec: Arc<dyn Codec> = Arc::new(Float4Codec);
        let float8_codec: Arc<dyn Codec> = Arc::new(Float8Codec);
        let text_codec: Arc<dyn Codec> = Arc::new(TextCodec);
        let bytea_codec: Arc<dyn Codec> = Arc::new(ByteaCodec);
        let uuid_codec: Arc<dyn Codec> = Arc::new(UuidCodec);
        let jsonb_codec: Arc<dyn Codec> = Arc::new(JsonbCodec);
        let bits_codec: Arc<dyn Codec> = Arc::new(BitsCodec);
        let aclitem_codec: Arc<dyn Codec> = Arc::new(TextFormatOnlyCodec(TextCodec));

        reg.register_data_type(DataType::with_codec("bool", oid::BOOL, bool_codec.clone()));
        reg.register_data_type(DataType::with_codec("int2", oid::INT2, int2_codec.clone()));
        reg.register_data_type(DataType::with_codec("int4", oid::INT4, int4_codec.clone()));
        reg.register_data_type(DataType::with_codec("int8", oid::INT8, int8_codec.clone()));
        reg.register_data_type(DataType::with_codec(
            "float4",
            oid::FLOAT4,
            float4_codec.clone(),
        ));
        reg.register_data_type(DataType::with_codec(
            "float8",
            oid::FLOAT8,
            float8_codec.clone(),
        ));
        reg.register_data_type(DataType::with_codec("text", oid::TEXT, text_codec.clone()));
        reg.register_data_type(DataType::with_codec(
            "varchar",
            oid::VARCHAR,
            text_codec.clone(),
        ));
        reg.register_data_type(DataType::with_codec(
            "bpchar",
            oid::BPCHAR,
            text_codec.clone(),
        ));
        reg.register_data_type(DataType::with_codec("name", oid::NAME, text_codec.clone()));
        reg.register_data_type(DataType::with_codec(
            "unknown",
            oid::UNKNOWN,
            text_codec.clone(),
        ));
        reg.register_data_type(DataType::with_codec("bytea", oid::BYTEA, bytea_codec.clone()));
        reg.register_data_type(DataType::with_codec("uuid", oid::UUID, uuid_codec.clone()));
        reg.register_data_type(DataType::with_codec("json", oid::JSON, Arc::new(JsonCodec)));
        reg.register_data_type(DataType::with_codec("jsonb", oid::JSONB, jsonb_codec.clone()));
        reg.register_data_type(DataType::with_codec("bit", oid::BIT, bits_codec.clone()));
        reg.register_data_type(DataType::with_codec("varbit", oid::VARBIT, bits_codec));
        reg.register_data_type(DataType::with_codec(
            "aclitem",
            oid::ACLITEM,
            aclitem_codec.clone(),
        ));

        reg.register_data_type(DataType::with_codec(
            "_bool",
            oid::BOOL_ARRAY,
            Arc::new(ArrayCodec::new(bool_codec, oid::BOOL)),
        ));
        reg.register_data_type(DataType::with_codec(
            "_int2",
            oid::INT2_ARRAY,
            Arc::new(ArrayCodec::new(int2_codec, oid::INT2)),
        ));
        reg.register_data_type(DataType::with_codec(
            "_int4",
            oid::INT4_ARRAY,
            Arc::new(ArrayCodec::new(int4_codec, oid::INT4)),
        ));
        reg.register_data_type(DataType::with_codec(
            "_int8",
            oid::INT8_ARRAY,
            Arc::new(ArrayCodec::new(int8_codec, oid::INT8)),
        ));
        reg.register_data_type(DataType::with_codec(
            "_float4",
            oid::FLOAT4_ARRAY,
            Arc::new(ArrayCodec::new(float4_codec, oid::FLOAT4)),
        ));
        reg.register_data_type(DataType::with_codec(
            "_float8",
            oid::FLOAT8_ARRAY,
            Arc::new(ArrayCodec::new(float8_codec, oid::FLOAT8)),
        ));
        reg.register_data_type(DataType::with_codec(
            "_text",
            oid::TEXT_ARRAY,
            Arc::new(ArrayCodec::new(text_codec.clone(), oid::TEXT)),
        ));
        reg.register_data_type(DataType::with_codec(
            "_varchar",
            oid::VARCHAR_ARRAY,
            Arc::new(ArrayCodec::new(text_codec.clone(), oid::VARCHAR)),
        ));
        reg.register_data_type(DataType::with_codec(
            "_bpchar",
            oid::BPCHAR_ARRAY,
            Arc::new(ArrayCodec::new(text_codec.clone(), oid::BPCHAR)),
        ));
        reg.register_data_type(DataType::with_codec(
            "_name",
            oid::NAME_ARRAY,
            Arc::new(ArrayCodec::new(text_codec, oid::NAME)),
        ));
        reg.register_data_type(DataType::with_codec(
            "_bytea",
            oid::BYTEA_ARRAY,
            Arc::new(ArrayCodec::new(bytea_codec, oid::BYTEA)),
        ));
        reg.register_data_type(DataType::with_codec(
            "_uuid",
            oid::UUID_ARRAY,
            Arc::new(ArrayCodec::new(uuid_codec, oid::UUID)),
        ));
        reg.register_data_type(DataType::with_codec(
            "_jsonb",
            oid::JSONB_ARRAY,
            Arc::new(ArrayCodec::new(jsonb_codec, oid::JSONB)),
        ));
        reg.register_data_type(DataType::with_codec(
            "_aclitem",
            oid::ACLITEM_ARRAY,
            Arc::new(ArrayCodec::new(aclitem_codec, oid::ACLITEM)),
        ));

        reg.register_data_type(DataType::with_value(
            "numeric",
            oid::NUMERIC,
            Numeric::default(),
        ));
        reg.register_data_type(DataType::with_value("date", oid::DATE, Date::default()));
        reg.register_data_type(DataType::with_value("time", oid::TIME, Time::default()));
        reg.register_data_type(DataType::with_value(
            "timestamp",
            oid::TIMESTAMP,
            Timestamp::default(),
        ));
        reg.register_data_type(DataType::with_value(
            "timestamptz",
            oid::TIMESTAMPTZ,
            Timestamptz::default(),
        ));

        // Integer types that directly map to a wire type.
        reg.register_default_type_variants::<i16>("int2", "_int2");
        reg.register_default_type_variants::<i32>("int4", "_int4");
        reg.register_default_type_variants::<i64>("int8", "_int8");

        // Integer types without a direct match.
        reg.register_default_type_variants::<u16>("int8", "_int8");
        reg.register_default_type_variants::<u32>("int8", "_int8");
        reg.register_default_type_variants::<u64>("int8", "_int8");
        reg.register_default_type_variants::<isize>("int8", "_int8");
        reg.register_default_type_variants::<usize>("int8", "_int8");

        reg.register_default_type_variants::<f32>("float4", "_float4");
        reg.register_default_type_variants::<f64>("float8", "_float8");
        reg.register_default_type_variants::<bool>("bool", "_bool");
        reg.register_default_type_variants::<String>("text", "_text");

        reg.register_default_type::<Vec<u8>>("bytea");
        reg.register_default_type::<Option<Vec<u8>>>("bytea");
        reg.register_default_type::<Bytes>("bytea");
        reg.register_default_type::<Option<Bytes>>("bytea");
        reg.register_default_type::<[u8; 16]>("uuid");
        reg.register_default_type::<Option<[u8; 16]>>("uuid");
        reg.register_default_type::<Bits>("varbit");
        reg.register_default_type::<Option<Bits>>("varbit");
        reg.register_default_type::<NaiveDateTime>("timestamp");
        reg.register_default_type::<DateTime<Utc>>("timestamptz");
        reg.register_default_type::<NaiveDate>("date");
        reg.register_default_type::<NaiveTime>("time");

        reg.register_option_slot::<bool>();
        reg.register_option_slot::<i16>();
        reg.register_option_slot::<i32>();
        reg.register_option_slot::<i64>();
        reg.register_option_slot::<u16>();
        reg.register_option_slot::<u32>();
        reg.register_option_slot::<u64>();
        reg.register_option_slot::<f32>();
        reg.register_option_slot::<f64>();
        reg.register_option_slot::<String>();
        reg.register_option_slot::<Vec<u8>>();
        reg.register_option_slot::<Bytes>();
        reg.register_option_slot::<[u8; 16]>();
        reg.register_option_slot::<Bits>();
        reg.register_option_slot::<Numeric>();

        reg.register_array_kind::<bool>();
        reg.register_array_kind::<i16>();
        reg.register_array_kind::<i32>();
        reg.register_array_kind::<i64>();
        reg.register_array_kind::<f32>();
        reg.register_array_kind::<f64>();
        reg.register_array_kind::<String>();

        reg
    }

    /// Register a data type. Re-registering an OID or name overwrites the
    /// previous entry.
    pub fn register_data_type(&mut self, mut dt: DataType) {
        if let Some(prototype) = dt.value.take() {
            // Own a fresh clone so caller-held prototypes cannot alias
            // registry state.
            let mut fresh = new_value(prototype.as_ref());
            dt.has_text_decoder = fresh.text_decoder().is_some();
            dt.has_binary_decoder = fresh.binary_decoder().is_some();
            dt.value_is_type_value = fresh.as_type_value().is_some();
            dt.value = Some(fresh);
        }

        let format = if let Some(codec) = &dt.codec {
            codec.preferred_format()
        } else if dt
            .value
            .as_ref()
            .is_some_and(|v| v.binary_encoder().is_some())
        {
            Format::Binary
        } else {
            Format::Text
        };
        self.oid_to_format.insert(dt.oid, format);

        if let (Some(type_id), Some(mut caster)) = (dt.value_type, dt.caster) {
            caster.has_text_decoder = dt.has_text_decoder;
            caster.has_binary_decoder = dt.has_binary_decoder;
            self.value_casters.insert(type_id, caster);
        }

        tracing::debug!(name = %dt.name, oid = dt.oid, "registered data type");

        let dt = Arc::new(dt);
        self.oid_to_data_type.insert(dt.oid, dt.clone());
        self.name_to_data_type.insert(dt.name.clone(), dt);
        *self.derived.get_mut() = None;
    }

    /// Map a native type to a type name, used to pick a data type when the
    /// OID of a value is unknown.
    pub fn register_default_type<T: 'static>(&mut self, name: impl Into<String>) {
        self.type_to_name.insert(TypeId::of::<T>(), name.into());
        *self.derived.get_mut() = None;
    }

    /// Map `T`, `Option<T>`, `Vec<T>`, and `Option<Vec<T>>` to a scalar and
    /// array type name in one call.
    pub fn register_default_type_variants<T: 'static>(
        &mut self,
        name: &str,
        array_name: &str,
    ) {
        self.register_default_type::<T>(name);
        self.register_default_type::<Option<T>>(name);
        self.register_default_type::<Vec<T>>(array_name);
        self.register_default_type::<Option<Vec<T>>>(array_name);
    }

    /// Teach the planner to treat `Option<T>` as a nullable slot around `T`.
    pub fn register_option_slot<T: Default + 'static>(&mut self) {
        self.option_slots
            .insert(TypeId::of::<Option<T>>(), option_slot::<T>());
    }

    /// Teach the array codec to build and walk `Vec<T>`.
    pub fn register_array_kind<T: Default + 'static>(&mut self) {
        self.array_kinds
            .insert(TypeId::of::<Vec<T>>(), array_kind::<T>());
    }

    /// Register an external scanner type so the planner can dispatch to it.
    pub fn register_sql_scanner<T: SqlScanner + 'static>(&mut self) {
        self.sql_scanner_casters.insert(TypeId::of::<T>(), |any| {
            any.downcast_mut::<T>().map(|v| v as &mut dyn SqlScanner)
        });
    }

    /// Register a text scanner type so the planner can dispatch to it.
    pub fn register_text_scanner<T: TextScanner + 'static>(&mut self) {
        self.text_scanner_casters.insert(TypeId::of::<T>(), |any| {
            any.downcast_mut::<T>().map(|v| v as &mut dyn TextScanner)
        });
    }

    /// Make a type that implements the external scanner capability use the
    /// assign-to scan path instead.
    pub fn prefer_assign_to_over_sql_scanner<T: 'static>(&mut self) {
        self.prefer_assign_to.insert(TypeId::of::<T>());
    }

    pub fn data_type_for_oid(&self, oid: u32) -> Option<Arc<DataType>> {
        self.oid_to_data_type.get(&oid).cloned()
    }

    pub fn data_type_for_name(&self, name: &str) -> Option<Arc<DataType>> {
        self.name_to_data_type.get(name).cloned()
    }

    /// Find a data type suitable for the native type of `v`. TypeValues are
    /// resolved through their declared type name; everything else goes
    /// through the derived native-type index.
    pub fn data_type_for_value(&self, v: &dyn Any) -> Option<Arc<DataType>> {
        self.ensure_derived();

        let type_id = (*v).type_id();
        if let Some(caster) = self.value_casters.get(&type_id) {
            if let Some(value) = (caster.as_value_ref)(v) {
                if let Some(tv) = value.as_type_value() {
                    return self.name_to_data_type.get(tv.type_name()).cloned();
                }
            }
        }

        let derived = self.derived.read();
        derived.as_ref()?.get(&type_id).cloned()
    }

    /// The registered format preference for an OID, text when unknown.
    pub fn format_code_for_oid(&self, oid: u32) -> Format {
        self.oid_to_format.get(&oid).copied().unwrap_or(Format::Text)
    }

    fn ensure_derived(&self) {
        if self.derived.read().is_some() {
            return;
        }
        let mut guard = self.derived.write();
        if guard.is_some() {
            return;
        }

        let mut map = HashMap::new();
        for dt in self.oid_to_data_type.values() {
            if dt.value.is_some() && !dt.value_is_type_value {
                if let Some(type_id) = dt.value_type {
                    map.insert(type_id, dt.clone());
                }
            }
        }
        for (type_id, name) in &self.type_to_name {
            if let Some(dt) = self.name_to_data_type.get(name) {
                map.insert(*type_id, dt.clone());
            }
        }
        tracing::debug!(entries = map.len(), "rebuilt native type index");
        *guard = Some(map);
    }

    /// Encode `value` for `oid` in `format`, appending to `buf`. A `value`
    /// of `None` is SQL NULL: nothing is appended and the caller writes the
    /// NULL sentinel on the wire.
    pub fn encode(
        &self,
        oid: u32,
        format: Format,
        value: Option<&dyn Any>,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        let Some(value) = value else {
            return Ok(IsNull::Yes);
        };
        match self.plan_encode(oid, format, value) {
            Some(plan) => plan.encode(self, value, buf),
            None => {
                let dt = if oid == 0 {
                    self.data_type_for_value(value)
                } else {
                    self.data_type_for_oid(oid)
                };
                if dt.is_none() {
                    Err(TypeError::UnknownOid(oid))
                } else {
                    Err(TypeError::NoEncodePlan { oid, format })
                }
            }
        }
    }

    /// Scan `src` into `dst`. A `src` of `None` is SQL NULL.
    pub fn scan(
        &self,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        let plan = self.plan_scan(oid, format, &*dst);
        plan.scan(self, oid, format, src, dst)
    }

    pub(crate) fn value_caster(&self, type_id: TypeId) -> Option<&ValueCaster> {
        self.value_casters.get(&type_id)
    }

    pub(crate) fn sql_scanner_caster(&self, type_id: TypeId) -> Option<&SqlScannerCaster> {
        self.sql_scanner_casters.get(&type_id)
    }

    pub(crate) fn text_scanner_caster(&self, type_id: TypeId) -> Option<&TextScannerCaster> {
        self.text_scanner_casters.get(&type_id)
    }

    pub(crate) fn option_slot(&self, type_id: TypeId) -> Option<&OptionSlot> {
        self.option_slots.get(&type_id)
    }

    pub(crate) fn array_kind(&self, type_id: TypeId) -> Option<&ArrayKind> {
        self.array_kinds.get(&type_id)
    }

    pub(crate) fn prefers_assign_to(&self, type_id: TypeId) -> bool {
        self.prefer_assign_to.contains(&type_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_oid_and_name() {
        let reg = TypeRegistry::new();
        let by_oid = reg.data_type_for_oid(oid::INT8).unwrap();
        let by_name = reg.data_type_for_name("int8").unwrap();
        assert!(Arc::ptr_eq(&by_oid, &by_name));
        assert_eq!(by_oid.name(), "int8");
        assert_eq!(by_oid.oid(), oid::INT8);
    }

    #[test]
    fn test_format_code_for_oid() {
        let reg = TypeRegistry::new();
        assert_eq!(reg.format_code_for_oid(oid::INT8), Format::Binary);
        assert_eq!(reg.format_code_for_oid(oid::TEXT), Format::Text);
        assert_eq!(reg.format_code_for_oid(oid::NUMERIC), Format::Text);
        assert_eq!(reg.format_code_for_oid(oid::TIMESTAMP), Format::Binary);
        // Unregistered oids default to text.
        assert_eq!(reg.format_code_for_oid(99999), Format::Text);
    }

    #[test]
    fn test_data_type_for_value() {
        let reg = TypeRegistry::new();
        let dt = reg.data_type_for_value(&42i64).unwrap();
        assert_eq!(dt.name(), "int8");
        let dt = reg.data_type_for_value(&Vec::<i32>::new()).unwrap();
        assert_eq!(dt.name(), "_int4");
        let dt = reg.data_type_for_value(&Numeric::default()).unwrap();
        assert_eq!(dt.name(), "numeric");
    }
}
