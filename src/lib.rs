//! # pgcodec — PostgreSQL type registry and plan engine
//!
//! Mediates between PostgreSQL's on-the-wire value representations and
//! native Rust values. The registry holds per-type codecs keyed by both wire
//! OID and native type; the planner precompiles a *plan* for each
//! `(oid, format, native type)` combination so the per-row work is a single
//! cheap dispatch.
//!
//! ## Architecture
//!
//! ```text
//! encode:  (value, oid, format) → plan_encode → [adapters] → codec plan → bytes
//! scan:    (bytes, oid, format) → plan_scan   → fast path | codec plan | adapters → dst
//! ```
//!
//! Adapters bridge the gap between the application's native type and a codec
//! that understands the wire format: `Option` slots materialize SQL NULL,
//! widening plans funnel every primitive integer and float width through the
//! canonical types, and plans that find themselves invoked with a different
//! destination type than they were built for quietly request a fresh plan.
//!
//! ## Example
//!
//! ```
//! use bytes::Bytes;
//! use pgcodec::{oid, Format, TypeRegistry};
//!
//! let registry = TypeRegistry::new();
//!
//! // int8, binary format, 42
//! let src = Bytes::from(42i64.to_be_bytes().to_vec());
//! let mut out = 0i64;
//! registry
//!     .scan(oid::INT8, Format::Binary, Some(src), &mut out)
//!     .unwrap();
//! assert_eq!(out, 42);
//!
//! // NULL into a nullable slot
//! let mut name: Option<String> = Some("x".into());
//! registry
//!     .scan(oid::TEXT, Format::Text, None, &mut name)
//!     .unwrap();
//! assert_eq!(name, None);
//! ```

pub mod codec;
pub mod error;
pub mod format;
pub mod oid;
pub mod plan;
pub mod registry;
pub mod value;

pub use codec::{ArrayCodec, Bits, Codec};
pub use error::{TypeError, TypeResult};
pub use format::Format;
pub use plan::{EncodePlan, IsNull, ScanPlan};
pub use registry::{DataType, TypeRegistry};
pub use value::{
    BinaryDecode, BinaryEncode, Date, EnumType, InfinityModifier, Numeric, SqlScanner, SqlValue,
    TextDecode, TextEncode, TextScanner, Time, Timestamp, Timestamptz, TypeValue, Value,
};
