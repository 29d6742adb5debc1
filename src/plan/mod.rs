//! Precompiled encode and scan plans.
//!
//! A plan is the unit of work the planner hands back: a cheap, immutable
//! strategy object with a single behavior method. Plans built through an
//! adapter capture the native type they were planned for and request a fresh
//! plan when invoked with a different one, so a plan reference can be reused
//! across heterogeneously typed rows.

mod encode;
mod scan;

pub(crate) use scan::replan_scan;

use std::any::Any;

use bytes::{Bytes, BytesMut};

use crate::error::TypeResult;
use crate::format::Format;
use crate::registry::TypeRegistry;

/// Whether an encoded value turned out to be SQL NULL.
///
/// An encode appends nothing for NULL; the caller writes the NULL sentinel
/// (length -1) on the wire itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsNull {
    Yes,
    No,
}

/// A precompiled plan to encode one native type into one (oid, format) pair.
pub trait EncodePlan: Send + Sync {
    /// Append the wire bytes of `value` to `buf`. Returns [`IsNull::Yes`]
    /// without touching `buf` when the value represents SQL NULL.
    fn encode(
        &self,
        registry: &TypeRegistry,
        value: &dyn Any,
        buf: &mut BytesMut,
    ) -> TypeResult<IsNull>;
}

/// A precompiled plan to scan wire bytes into one destination type.
pub trait ScanPlan: Send + Sync {
    /// Scan `src` into `dst`. A `src` of `None` is SQL NULL. The plan takes
    /// ownership of `src`; the caller must not reuse the bytes.
    fn scan(
        &self,
        registry: &TypeRegistry,
        oid: u32,
        format: Format,
        src: Option<Bytes>,
        dst: &mut dyn Any,
    ) -> TypeResult<()>;

    /// True for the plan that decodes through a registered Value and assigns
    /// the result. The assign failure path uses this to stop re-planning once
    /// a fresh plan would take the same route again.
    fn is_value_assign_plan(&self) -> bool {
        false
    }
}
