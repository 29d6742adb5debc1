//! Scan planning.
//!
//! Plan resolution runs in order: zero-allocation fast paths keyed by
//! destination type and wire format, the resolved data type's codec, adapter
//! plans (option slot, widening), the untyped any-slot, the Value-backed
//! decode paths, and finally the external-scanner and reflective fallbacks.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use once_cell::sync::Lazy;

use super::ScanPlan;
use crate::codec::Codec;
use crate::error::{TypeError, TypeResult};
use crate::format::Format;
use crate::oid;
use crate::registry::{DataType, TypeRegistry};
use crate::value::{database_sql_value, new_value, SqlValue, Value};

/// Request a fresh plan for the actual destination and run it. Plans call
/// this when the destination no longer matches what they were built for.
pub(crate) fn replan_scan(
    registry: &TypeRegistry,
    oid_value: u32,
    format: Format,
    src: Option<Bytes>,
    dst: &mut dyn Any,
) -> TypeResult<()> {
    let plan = registry.plan_scan(oid_value, format, &*dst);
    plan.scan(registry, oid_value, format, src, dst)
}

/// A primitive destination kind the widening adapter can bridge: scan into
/// the canonical type for the kind, then store with a checked conversion.
pub(crate) struct BaseKindScan {
    new_canonical: fn() -> Box<dyn Any>,
    store: fn(&mut dyn Any, &dyn Any) -> TypeResult<()>,
}

fn int_store<T: TryFrom<i64> + 'static>() -> fn(&mut dyn Any, &dyn Any) -> TypeResult<()> {
    |dst, canonical| {
        let v = *canonical
            .downcast_ref::<i64>()
            .ok_or(TypeError::TargetTypeChanged)?;
        let narrowed = T::try_from(v).map_err(|_| TypeError::OutOfRange {
            value: v.to_string(),
            target: std::any::type_name::<T>(),
        })?;
        *dst.downcast_mut::<T>().ok_or(TypeError::TargetTypeChanged)? = narrowed;
        Ok(())
    }
}

fn int_kind<T: TryFrom<i64> + 'static>() -> BaseKindScan {
    BaseKindScan {
        new_canonical: || Box::new(0i64),
        store: int_store::<T>(),
    }
}

static SCAN_BASE_KINDS: Lazy<HashMap<TypeId, BaseKindScan>> = Lazy::new(|| {
    let mut kinds = HashMap::new();
    kinds.insert(TypeId::of::<i8>(), int_kind::<i8>());
    kinds.insert(TypeId::of::<i16>(), int_kind::<i16>());
    kinds.insert(TypeId::of::<i32>(), int_kind::<i32>());
    kinds.insert(TypeId::of::<isize>(), int_kind::<isize>());
    kinds.insert(TypeId::of::<u8>(), int_kind::<u8>());
    kinds.insert(TypeId::of::<u16>(), int_kind::<u16>());
    kinds.insert(TypeId::of::<u32>(), int_kind::<u32>());
    kinds.insert(TypeId::of::<u64>(), int_kind::<u64>());
    kinds.insert(TypeId::of::<usize>(), int_kind::<usize>());
    kinds.insert(
        TypeId::of::<f32>(),
        BaseKindScan {
            new_canonical: || Box::new(0f64),
            store: |dst, canonical| {
                let v = *canonical
                    .downcast_ref::<f64>()
                    .ok_or(TypeError::TargetTypeChanged)?;
                *dst.downcast_mut::<f32>()
                    .ok_or(TypeError::TargetTypeChanged)? = v as f32;
                Ok(())
            },
        },
    );
    kinds
});

pub(crate) fn scan_base_kind(type_id: TypeId) -> Option<&'static BaseKindScan> {
    SCAN_BASE_KINDS.get(&type_id)
}

impl TypeRegistry {
    /// Prepare a plan to scan a wire value into a destination with the type
    /// of `dst`. Always returns a plan; an unplannable combination yields a
    /// plan whose `scan` reports the typed error.
    pub fn plan_scan(&self, oid_value: u32, format: Format, dst: &dyn Any) -> Box<dyn ScanPlan> {
        let dst_type = (*dst).type_id();

        match format {
            Format::Binary => {
                if dst_type == TypeId::of::<String>()
                    && matches!(oid_value, oid::TEXT | oid::VARCHAR)
                {
                    return Box::new(ScanPlanString);
                }
                if dst_type == TypeId::of::<i64>() && oid_value == oid::INT8 {
                    return Box::new(ScanPlanBinaryInt64);
                }
                if dst_type == TypeId::of::<f32>() && oid_value == oid::FLOAT4 {
                    return Box::new(ScanPlanBinaryFloat32);
                }
                if dst_type == TypeId::of::<f64>() && oid_value == oid::FLOAT8 {
                    return Box::new(ScanPlanBinaryFloat64);
                }
                if (dst_type == TypeId::of::<Vec<u8>>() || dst_type == TypeId::of::<Bytes>())
                    && matches!(oid_value, oid::BYTEA | oid::TEXT | oid::VARCHAR | oid::JSON)
                {
                    return Box::new(ScanPlanBufferInstall);
                }
                if let Some(caster) = self.value_caster(dst_type) {
                    if caster.has_binary_decoder {
                        return Box::new(ScanPlanValueBinaryDecoder);
                    }
                }
            }
            Format::Text => {
                if dst_type == TypeId::of::<String>() {
                    return Box::new(ScanPlanString);
                }
                if (dst_type == TypeId::of::<Vec<u8>>() || dst_type == TypeId::of::<Bytes>())
                    && oid_value != oid::BYTEA
                {
                    return Box::new(ScanPlanBufferInstall);
                }
                if let Some(caster) = self.value_caster(dst_type) {
                    if caster.has_text_decoder {
                        return Box::new(ScanPlanValueTextDecoder);
                    }
                }
                if self.text_scanner_caster(dst_type).is_some() {
                    return Box::new(ScanPlanTextScanner);
                }
            }
        }

        let dt = if oid_value == 0 {
            self.data_type_for_value(dst)
        } else {
            self.data_type_for_oid(oid_value)
        };

        if let Some(dt) = &dt {
            if let Some(codec) = dt.codec() {
                if let Some(plan) = codec.plan_scan(self, oid_value, format, dst, false) {
                    return plan;
                }

                if let Some(slot) = self.option_slot(dst_type) {
                    let next_dst = (slot.inner_default)();
                    let next = self.plan_scan(oid_value, format, next_dst.as_ref());
                    return Box::new(OptionScanPlan { dst_type, next });
                }

                if let Some(kind) = scan_base_kind(dst_type) {
                    let next_dst = (kind.new_canonical)();
                    let next = self.plan_scan(oid_value, format, next_dst.as_ref());
                    return Box::new(WideningScanPlan {
                        dst_type,
                        kind,
                        next,
                    });
                }

                if dst_type == TypeId::of::<Option<Box<dyn Any>>>() {
                    return Box::new(AnySlotScanPlan {
                        codec: codec.clone(),
                    });
                }
            }
        }

        if let Some(dt) = dt {
            if self.sql_scanner_caster(dst_type).is_some() && !self.prefers_assign_to(dst_type) {
                return Box::new(ValueSqlScannerPlan { data_type: dt });
            }
            return Box::new(ValueAssignPlan { data_type: dt });
        }

        if self.sql_scanner_caster(dst_type).is_some() {
            return Box::new(SqlScannerFallbackPlan);
        }

        tracing::trace!(oid = oid_value, %format, "falling back to reflective scan plan");
        Box::new(ReflectFallbackPlan)
    }
}

fn utf8_owned(src: Bytes) -> TypeResult<String> {
    String::from_utf8(src.to_vec())
        .map_err(|e| TypeError::malformed(format!("invalid UTF-8: {e}")))
}

struct ScanPlanString;

impl ScanPlan for ScanPlanString {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(slot) = dst.downcast_mut::<String>() {
            let src = src.ok_or(TypeError::NullIntoNonNullable { target: "String" })?;
            *slot = utf8_owned(src)?;
            return Ok(());
        }
        replan_scan(registry, oid_value, format, src, dst)
    }
}

struct ScanPlanBinaryInt64;

impl ScanPlan for ScanPlanBinaryInt64 {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(slot) = dst.downcast_mut::<i64>() {
            let src = src.ok_or(TypeError::NullIntoNonNullable { target: "i64" })?;
            if src.len() != 8 {
                return Err(TypeError::InvalidLength {
                    expected: 8,
                    got: src.len(),
                });
            }
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&src);
            *slot = i64::from_be_bytes(raw);
            return Ok(());
        }
        replan_scan(registry, oid_value, format, src, dst)
    }
}

struct ScanPlanBinaryFloat32;

impl ScanPlan for ScanPlanBinaryFloat32 {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(slot) = dst.downcast_mut::<f32>() {
            let src = src.ok_or(TypeError::NullIntoNonNullable { target: "f32" })?;
            if src.len() != 4 {
                return Err(TypeError::InvalidLength {
                    expected: 4,
                    got: src.len(),
                });
            }
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&src);
            *slot = f32::from_bits(u32::from_be_bytes(raw));
            return Ok(());
        }
        replan_scan(registry, oid_value, format, src, dst)
    }
}

struct ScanPlanBinaryFloat64;

impl ScanPlan for ScanPlanBinaryFloat64 {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(slot) = dst.downcast_mut::<f64>() {
            let src = src.ok_or(TypeError::NullIntoNonNullable { target: "f64" })?;
            if src.len() != 8 {
                return Err(TypeError::InvalidLength {
                    expected: 8,
                    got: src.len(),
                });
            }
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&src);
            *slot = f64::from_bits(u64::from_be_bytes(raw));
            return Ok(());
        }
        replan_scan(registry, oid_value, format, src, dst)
    }
}

/// Installs the wire bytes into a byte-buffer destination. For a `Bytes`
/// destination this is a shallow install of the source buffer.
struct ScanPlanBufferInstall;

impl ScanPlan for ScanPlanBufferInstall {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        let dst_type = (*dst).type_id();
        if dst_type != TypeId::of::<Vec<u8>>() && dst_type != TypeId::of::<Bytes>() {
            return replan_scan(registry, oid_value, format, src, dst);
        }
        let src = src.ok_or(TypeError::NullIntoNonNullable {
            target: "byte buffer",
        })?;
        if let Some(slot) = dst.downcast_mut::<Bytes>() {
            *slot = src;
        } else if let Some(slot) = dst.downcast_mut::<Vec<u8>>() {
            *slot = src.to_vec();
        }
        Ok(())
    }
}

/// Dispatches to the destination's own binary decoder.
struct ScanPlanValueBinaryDecoder;

impl ScanPlan for ScanPlanValueBinaryDecoder {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(caster) = registry.value_caster((*dst).type_id()) {
            if let Some(value) = (caster.as_value_mut)(dst) {
                if let Some(decoder) = value.binary_decoder() {
                    return decoder.decode_binary(registry, src);
                }
            }
        }
        replan_scan(registry, oid_value, format, src, dst)
    }
}

/// Dispatches to the destination's own text decoder.
struct ScanPlanValueTextDecoder;

impl ScanPlan for ScanPlanValueTextDecoder {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(caster) = registry.value_caster((*dst).type_id()) {
            if let Some(value) = (caster.as_value_mut)(dst) {
                if let Some(decoder) = value.text_decoder() {
                    return decoder.decode_text(registry, src);
                }
            }
        }
        replan_scan(registry, oid_value, format, src, dst)
    }
}

struct ScanPlanTextScanner;

impl ScanPlan for ScanPlanTextScanner {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        let Some(caster) = registry.text_scanner_caster((*dst).type_id()).copied() else {
            return replan_scan(registry, oid_value, format, src, dst);
        };
        let scanner = caster(dst).ok_or(TypeError::TargetTypeChanged)?;
        match src {
            None => scanner.scan_text(None),
            Some(src) => {
                let text = std::str::from_utf8(&src)
                    .map_err(|e| TypeError::malformed(format!("invalid UTF-8: {e}")))?;
                scanner.scan_text(Some(text))
            }
        }
    }
}

/// Materializes SQL NULL in an `Option` destination: `None` on NULL,
/// allocate the inner value and delegate otherwise.
struct OptionScanPlan {
    dst_type: TypeId,
    next: Box<dyn ScanPlan>,
}

impl ScanPlan for OptionScanPlan {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if (*dst).type_id() != self.dst_type {
            return replan_scan(registry, oid_value, format, src, dst);
        }
        let slot = *registry
            .option_slot(self.dst_type)
            .ok_or(TypeError::TargetTypeChanged)?;
        match src {
            None => {
                if (slot.set_none)(dst) {
                    Ok(())
                } else {
                    Err(TypeError::TargetTypeChanged)
                }
            }
            Some(src) => {
                let inner = (slot.install)(dst).ok_or(TypeError::TargetTypeChanged)?;
                self.next.scan(registry, oid_value, format, Some(src), inner)
            }
        }
    }
}

/// Scans into the canonical type for the destination's base kind, then
/// stores the checked conversion.
struct WideningScanPlan {
    dst_type: TypeId,
    kind: &'static BaseKindScan,
    next: Box<dyn ScanPlan>,
}

impl ScanPlan for WideningScanPlan {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if (*dst).type_id() != self.dst_type {
            return replan_scan(registry, oid_value, format, src, dst);
        }
        let mut canonical = (self.kind.new_canonical)();
        self.next
            .scan(registry, oid_value, format, src, canonical.as_mut())?;
        (self.kind.store)(dst, canonical.as_ref())
    }
}

/// Stores the codec's natural decoding into an untyped any-slot.
struct AnySlotScanPlan {
    codec: Arc<dyn Codec>,
}

impl ScanPlan for AnySlotScanPlan {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        if let Some(slot) = dst.downcast_mut::<Option<Box<dyn Any>>>() {
            *slot = self.codec.decode_value(registry, oid_value, format, src)?;
            return Ok(());
        }
        replan_scan(registry, oid_value, format, src, dst)
    }
}

fn decode_into_value(
    registry: &TypeRegistry,
    value: &mut dyn Value,
    format: Format,
    src: Option<Bytes>,
) -> TypeResult<()> {
    match format {
        Format::Binary => value
            .binary_decoder()
            .ok_or(TypeError::Unsupported("data type has no binary decoder"))?
            .decode_binary(registry, src),
        Format::Text => value
            .text_decoder()
            .ok_or(TypeError::Unsupported("data type has no text decoder"))?
            .decode_text(registry, src),
    }
}

/// Decodes through the data type and hands the simple database-facing value
/// to the destination's external scanner.
struct ValueSqlScannerPlan {
    data_type: Arc<DataType>,
}

impl ScanPlan for ValueSqlScannerPlan {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        let dst_type = (*dst).type_id();
        if registry.sql_scanner_caster(dst_type).is_none() {
            return replan_scan(registry, oid_value, format, src, dst);
        }

        let sql_value = if let Some(codec) = self.data_type.codec() {
            codec.decode_sql_value(registry, oid_value, format, src)?
        } else {
            let prototype = self
                .data_type
                .value()
                .ok_or(TypeError::Unsupported("data type has no decoder"))?;
            let mut value = new_value(prototype);
            decode_into_value(registry, value.as_mut(), format, src)?;
            database_sql_value(registry, value.as_ref())?
        };

        let caster = registry
            .sql_scanner_caster(dst_type)
            .copied()
            .ok_or(TypeError::TargetTypeChanged)?;
        let scanner = caster(dst).ok_or(TypeError::TargetTypeChanged)?;
        scanner.scan(sql_value)
    }
}

/// Decodes through the data type's Value and assigns the result into the
/// destination.
struct ValueAssignPlan {
    data_type: Arc<DataType>,
}

impl ScanPlan for ValueAssignPlan {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        let prototype = self
            .data_type
            .value()
            .ok_or(TypeError::Unsupported("data type has no decoder"))?;
        let mut value = new_value(prototype);
        decode_into_value(registry, value.as_mut(), format, src.clone())?;

        let assign_err = match value.assign_to(dst) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        if let Some(slot) = dst.downcast_mut::<Option<Box<dyn Any>>>() {
            *slot = value.get();
            return Ok(());
        }

        // The assignment may have failed because the destination type
        // changed. Re-plan once; if the fresh plan would take this same
        // route again, surface the original error instead of looping.
        let fresh = registry.plan_scan(oid_value, format, &*dst);
        if !fresh.is_value_assign_plan() {
            return fresh.scan(registry, oid_value, format, src, dst);
        }
        Err(assign_err)
    }

    fn is_value_assign_plan(&self) -> bool {
        true
    }
}

/// Last-resort dispatch to an external scanner: NULL, raw bytes for binary,
/// or the decoded string for text.
struct SqlScannerFallbackPlan;

impl ScanPlan for SqlScannerFallbackPlan {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        let Some(caster) = registry.sql_scanner_caster((*dst).type_id()).copied() else {
            return replan_scan(registry, oid_value, format, src, dst);
        };
        let scanner = caster(dst).ok_or(TypeError::TargetTypeChanged)?;
        match src {
            None => scanner.scan(SqlValue::Null),
            Some(src) => match format {
                Format::Binary => scanner.scan(SqlValue::Bytes(src.to_vec())),
                Format::Text => scanner.scan(SqlValue::Text(utf8_owned(src)?)),
            },
        }
    }
}

/// Reflective fallback: option destinations allocate and recurse, primitive
/// string and byte-buffer destinations store directly, everything else is an
/// unknown type.
struct ReflectFallbackPlan;

impl ScanPlan for ReflectFallbackPlan {
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid_value: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()> {
        let dst_type = (*dst).type_id();
        if let Some(slot) = registry.option_slot(dst_type).copied() {
            return match src {
                None => {
                    if (slot.set_none)(dst) {
                        Ok(())
                    } else {
                        Err(TypeError::TargetTypeChanged)
                    }
                }
                Some(src) => {
                    let inner = (slot.install)(dst).ok_or(TypeError::TargetTypeChanged)?;
                    let plan = registry.plan_scan(oid_value, format, &*inner);
                    plan.scan(registry, oid_value, format, Some(src), inner)
                }
            };
        }
        scan_unknown_type(oid_value, format, src, dst)
    }
}

fn scan_unknown_type(
    oid_value: u32,
    format: Format,
    src: Option<Bytes>,
    dst: &mut dyn Any,
) -> TypeResult<()> {
    if let Some(slot) = dst.downcast_mut::<String>() {
        if format == Format::Binary {
            return Err(TypeError::NoScanPlan {
                oid: oid_value,
                format,
            });
        }
        let src = src.ok_or(TypeError::NullIntoNonNullable { target: "String" })?;
        *slot = utf8_owned(src)?;
        return Ok(());
    }
    if let Some(slot) = dst.downcast_mut::<Vec<u8>>() {
        let src = src.ok_or(TypeError::NullIntoNonNullable {
            target: "byte buffer",
        })?;
        *slot = src.to_vec();
        return Ok(());
    }
    if let Some(slot) = dst.downcast_mut::<Bytes>() {
        let src = src.ok_or(TypeError::NullIntoNonNullable {
            target: "byte buffer",
        })?;
        *slot = src;
        return Ok(());
    }
    Err(TypeError::UnknownOid(oid_value))
}
