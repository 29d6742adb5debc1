//! Encode planning.
//!
//! Plan resolution runs in order: the resolved data type's codec, the
//! value's own wire encoders, then the adapter plans (option deref,
//! widening). No path yields no plan, which the registry surfaces as a
//! typed error.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use bytes::BytesMut;
use once_cell::sync::Lazy;

use super::{EncodePlan, IsNull};
use crate::error::{TypeError, TypeResult};
use crate::format::Format;
use crate::registry::{OptionRef, TypeRegistry};
use crate::value::Value;

fn replan_encode(
    registry: &TypeRegistry,
    oid_value: u32,
    format: Format,
    value: &dyn Any,
    buf: &mut BytesMut,
) -> TypeResult<IsNull> {
    match registry.plan_encode(oid_value, format, value) {
        Some(plan) => plan.encode(registry, value, buf),
        None => Err(TypeError::NoEncodePlan {
            oid: oid_value,
            format,
        }),
    }
}

/// A primitive value kind the widening adapter can bridge: convert to the
/// canonical value for the kind and plan against that.
pub(crate) struct BaseKindEncode {
    to_canonical: fn(&dyn Any) -> Option<Box<dyn Any>>,
}

static ENCODE_BASE_KINDS: Lazy<HashMap<TypeId, BaseKindEncode>> = Lazy::new(|| {
    let mut kinds = HashMap::new();
    kinds.insert(
        TypeId::of::<i8>(),
        BaseKindEncode {
            to_canonical: |any| {
                any.downcast_ref::<i8>()
                    .map(|v| Box::new(i64::from(*v)) as Box<dyn Any>)
            },
        },
    );
    kinds.insert(
        TypeId::of::<i16>(),
        BaseKindEncode {
            to_canonical: |any| {
                any.downcast_ref::<i16>()
                    .map(|v| Box::new(i64::from(*v)) as Box<dyn Any>)
            },
        },
    );
    kinds.insert(
        TypeId::of::<i32>(),
        BaseKindEncode {
            to_canonical: |any| {
                any.downcast_ref::<i32>()
                    .map(|v| Box::new(i64::from(*v)) as Box<dyn Any>)
            },
        },
    );
    kinds.insert(
        TypeId::of::<isize>(),
        BaseKindEncode {
            to_canonical: |any| {
                any.downcast_ref::<isize>()
                    .map(|v| Box::new(*v as i64) as Box<dyn Any>)
            },
        },
    );
    kinds.insert(
        TypeId::of::<u8>(),
        BaseKindEncode {
            to_canonical: |any| {
                any.downcast_ref::<u8>()
                    .map(|v| Box::new(i64::from(*v)) as Box<dyn Any>)
            },
        },
    );
    kinds.insert(
        TypeId::of::<u16>(),
        BaseKindEncode {
            to_canonical: |any| {
                any.downcast_ref::<u16>()
                    .map(|v| Box::new(i64::from(*v)) as Box<dyn Any>)
            },
        },
    );
    kinds.insert(
        TypeId::of::<u32>(),
        BaseKindEncode {
            to_canonical: |any| {
                any.downcast_ref::<u32>()
                    .map(|v| Box::new(i64::from(*v)) as Box<dyn Any>)
            },
        },
    );
    kinds.insert(
        TypeId::of::<usize>(),
        BaseKindEncode {
            to_canonical: |any| {
                any.downcast_ref::<usize>()
                    .map(|v| Box::new(*v as u64) as Box<dyn Any>)
            },
        },
    );
    kinds.insert(
        TypeId::of::<f32>(),
        BaseKindEncode {
            to_canonical: |any| {
                any.downcast_ref::<f32>()
                    .map(|v| Box::new(f64::from(*v)) as Box<dyn Any>)
            },
        },
    );
    kinds.insert(
        TypeId::of::<&'static str>(),
        BaseKindEncode {
            to_canonical: |any| {
                any.downcast_ref::<&'static str>()
                    .map(|v| Box::new((*v).to_string()) as Box<dyn Any>)
            },
        },
    );
    kinds
});

pub(crate) fn encode_base_kind(type_id: TypeId) -> Option<&'static BaseKindEncode> {
    ENCODE_BASE_KINDS.get(&type_id)
}

impl TypeRegistry {
    /// Prepare a plan to encode `value` for `oid_value` in `format`, or
    /// `None` when no path applies.
    pub fn plan_encode(
        &self,
        oid_value: u32,
        format: Format,
        value: &dyn Any,
    ) -> Option<Box<dyn EncodePlan>> {
        let value_type = (*value).type_id();

        let dt = if oid_value == 0 {
            self.data_type_for_value(value)
        } else {
            self.data_type_for_oid(oid_value)
        }?;

        if let Some(codec) = dt.codec() {
            if let Some(plan) = codec.plan_encode(self, oid_value, format, value) {
                return Some(plan);
            }
        }

        if dt.value().is_some() {
            if let Some(caster) = self.value_caster(value_type) {
                if let Some(v) = (caster.as_value_ref)(value) {
                    let supported = match format {
                        Format::Binary => v.binary_encoder().is_some(),
                        Format::Text => v.text_encoder().is_some(),
                    };
                    if supported {
                        return Some(Box::new(ValueEncodePlan {
                            oid_value,
                            value_type,
                            format,
                            as_value_ref: caster.as_value_ref,
                        }));
                    }
                }
            }
        }

        if let Some(slot) = self.option_slot(value_type) {
            let next_value = (slot.inner_default)();
            if let Some(next) = self.plan_encode(oid_value, format, next_value.as_ref()) {
                return Some(Box::new(OptionDerefEncodePlan {
                    oid_value,
                    format,
                    value_type,
                    next,
                }));
            }
        }

        if let Some(kind) = encode_base_kind(value_type) {
            if let Some(canonical) = (kind.to_canonical)(value) {
                if let Some(next) = self.plan_encode(oid_value, format, canonical.as_ref()) {
                    return Some(Box::new(WideningEncodePlan {
                        oid_value,
                        format,
                        value_type,
                        to_canonical: kind.to_canonical,
                        next,
                    }));
                }
            }
        }

        None
    }
}

/// Encodes through the value's own wire encoder for the planned format.
struct ValueEncodePlan {
    oid_value: u32,
    value_type: TypeId,
    format: Format,
    as_value_ref: fn(&dyn Any) -> Option<&dyn Value>,
}

impl EncodePlan for ValueEncodePlan {
    fn encode(
        &self,
        registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        if (*value).type_id() != self.value_type {
            return replan_encode(registry, self.oid_value, self.format, value, buf);
        }
        let v = (self.as_value_ref)(value).ok_or(TypeError::TargetTypeChanged)?;
        match self.format {
            Format::Binary => v
                .binary_encoder()
                .ok_or(TypeError::Unsupported("value has no binary encoder"))?
                .encode_binary(registry, buf),
            Format::Text => v
                .text_encoder()
                .ok_or(TypeError::Unsupported("value has no text encoder"))?
                .encode_text(registry, buf),
        }
    }
}

/// Unwraps an `Option` value: NULL encoding for `None`, delegate on the
/// inner value otherwise.
struct OptionDerefEncodePlan {
    oid_value: u32,
    format: Format,
    value_type: TypeId,
    next: Box<dyn EncodePlan>,
}

impl EncodePlan for OptionDerefEncodePlan {
    fn encode(
        &self,
        registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        if (*value).type_id() != self.value_type {
            return replan_encode(registry, self.oid_value, self.format, value, buf);
        }
        let slot = *registry
            .option_slot(self.value_type)
            .ok_or(TypeError::TargetTypeChanged)?;
        match (slot.unwrap_ref)(value) {
            OptionRef::NotOption => Err(TypeError::TargetTypeChanged),
            OptionRef::Null => Ok(IsNull::Yes),
            OptionRef::Value(inner) => self.next.encode(registry, inner, buf),
        }
    }
}

/// Converts a primitive value to its canonical kind and delegates.
struct WideningEncodePlan {
    oid_value: u32,
    format: Format,
    value_type: TypeId,
    to_canonical: fn(&dyn Any) -> Option<Box<dyn Any>>,
    next: Box<dyn EncodePlan>,
}

impl EncodePlan for WideningEncodePlan {
    fn encode(
        &self,
        registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull> {
        if (*value).type_id() != self.value_type {
            return replan_encode(registry, self.oid_value, self.format, value, buf);
        }
        let canonical = (self.to_canonical)(value).ok_or(TypeError::TargetTypeChanged)?;
        self.next.encode(registry, canonical.as_ref(), buf)
    }
}
