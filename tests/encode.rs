//! Encode paths: codec plans, the adapter chain, NULL handling, arrays, and
//! round trips back through scan.

use bytes::{Bytes, BytesMut};
use pgcodec::{oid, Format, IsNull, Numeric, TypeError, TypeRegistry};

fn encode_bytes(
    reg: &TypeRegistry,
    oid_value: u32,
    format: Format,
    value: &dyn std::any::Any,
) -> Bytes {
    let mut buf = BytesMut::new();
    let is_null = reg.encode(oid_value, format, Some(value), &mut buf).unwrap();
    assert_eq!(is_null, IsNull::No);
    buf.freeze()
}

#[test]
fn widened_i16_encodes_as_int4() {
    let reg = TypeRegistry::new();
    let wire = encode_bytes(&reg, oid::INT4, Format::Binary, &(-1i16));
    assert_eq!(&wire[..], &[0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn widened_u8_encodes_as_int8() {
    let reg = TypeRegistry::new();
    let wire = encode_bytes(&reg, oid::INT8, Format::Binary, &200u8);
    assert_eq!(&wire[..], &200i64.to_be_bytes());
}

#[test]
fn out_of_range_narrowing_fails() {
    let reg = TypeRegistry::new();
    let mut buf = BytesMut::new();
    let err = reg
        .encode(oid::INT4, Format::Binary, Some(&u64::MAX), &mut buf)
        .unwrap_err();
    assert!(matches!(err, TypeError::OutOfRange { .. }));
}

#[test]
fn null_value_appends_nothing() {
    let reg = TypeRegistry::new();
    let mut buf = BytesMut::new();
    let is_null = reg
        .encode(oid::INT8, Format::Binary, None, &mut buf)
        .unwrap();
    assert_eq!(is_null, IsNull::Yes);
    assert!(buf.is_empty());
}

#[test]
fn option_values_unwrap_or_encode_null() {
    let reg = TypeRegistry::new();

    let mut buf = BytesMut::new();
    let value: Option<i64> = None;
    let is_null = reg
        .encode(oid::INT8, Format::Binary, Some(&value), &mut buf)
        .unwrap();
    assert_eq!(is_null, IsNull::Yes);
    assert!(buf.is_empty());

    let value: Option<i64> = Some(77);
    let wire = encode_bytes(&reg, oid::INT8, Format::Binary, &value);
    assert_eq!(&wire[..], &77i64.to_be_bytes());
}

#[test]
fn oid_zero_resolves_by_native_type() {
    let reg = TypeRegistry::new();
    let wire = encode_bytes(&reg, 0, Format::Binary, &42i64);
    assert_eq!(&wire[..], &42i64.to_be_bytes());
}

#[test]
fn unknown_oid_is_reported() {
    let reg = TypeRegistry::new();
    let mut buf = BytesMut::new();
    let err = reg
        .encode(424242, Format::Binary, Some(&1i64), &mut buf)
        .unwrap_err();
    assert!(matches!(err, TypeError::UnknownOid(424242)));
}

#[test]
fn unencodable_value_for_known_type_is_reported() {
    struct Widget;

    let reg = TypeRegistry::new();
    let mut buf = BytesMut::new();
    let err = reg
        .encode(oid::INT8, Format::Binary, Some(&Widget), &mut buf)
        .unwrap_err();
    assert!(matches!(
        err,
        TypeError::NoEncodePlan {
            oid: oid::INT8,
            format: Format::Binary
        }
    ));
}

#[test]
fn numeric_has_no_binary_encoding() {
    let reg = TypeRegistry::new();
    let mut buf = BytesMut::new();
    let err = reg
        .encode(
            oid::NUMERIC,
            Format::Binary,
            Some(&Numeric::new("1.5")),
            &mut buf,
        )
        .unwrap_err();
    assert!(matches!(err, TypeError::NoEncodePlan { .. }));

    // Text works through the value's own encoder.
    let wire = encode_bytes(&reg, oid::NUMERIC, Format::Text, &Numeric::new("1.5"));
    assert_eq!(&wire[..], b"1.5");
}

#[test]
fn static_str_widens_to_string() {
    let reg = TypeRegistry::new();
    let wire = encode_bytes(&reg, oid::TEXT, Format::Text, &"hello");
    assert_eq!(&wire[..], b"hello");
}

#[test]
fn scalar_round_trips() {
    let reg = TypeRegistry::new();

    let wire = encode_bytes(&reg, oid::INT8, Format::Binary, &123_456_789i64);
    let mut out = 0i64;
    reg.scan(oid::INT8, Format::Binary, Some(wire), &mut out).unwrap();
    assert_eq!(out, 123_456_789);

    let wire = encode_bytes(&reg, oid::FLOAT8, Format::Binary, &-0.125f64);
    let mut out = 0f64;
    reg.scan(oid::FLOAT8, Format::Binary, Some(wire), &mut out)
        .unwrap();
    assert_eq!(out, -0.125);

    let wire = encode_bytes(&reg, oid::BOOL, Format::Binary, &true);
    let mut out = false;
    reg.scan(oid::BOOL, Format::Binary, Some(wire), &mut out).unwrap();
    assert!(out);

    let wire = encode_bytes(&reg, oid::TEXT, Format::Text, &"grüß".to_string());
    let mut out = String::new();
    reg.scan(oid::TEXT, Format::Text, Some(wire), &mut out).unwrap();
    assert_eq!(out, "grüß");

    let payload = vec![0u8, 1, 2, 255];
    let wire = encode_bytes(&reg, oid::BYTEA, Format::Binary, &payload);
    let mut out: Vec<u8> = Vec::new();
    reg.scan(oid::BYTEA, Format::Binary, Some(wire), &mut out).unwrap();
    assert_eq!(out, payload);

    let uuid = "550e8400-e29b-41d4-a716-446655440000".to_string();
    for format in [Format::Binary, Format::Text] {
        let wire = encode_bytes(&reg, oid::UUID, format, &uuid);
        let mut out = String::new();
        reg.scan(oid::UUID, format, Some(wire), &mut out).unwrap();
        assert_eq!(out, uuid);
    }
}

#[test]
fn int4_array_round_trips_binary() {
    let reg = TypeRegistry::new();
    let values = vec![1i32, -2, 30_000];

    let wire = encode_bytes(&reg, oid::INT4_ARRAY, Format::Binary, &values);
    // Header: 1 dimension, no NULLs, element oid, length 3, lower bound 1.
    assert_eq!(&wire[..4], &1i32.to_be_bytes());
    assert_eq!(&wire[8..12], &oid::INT4.to_be_bytes());

    let mut out: Vec<i32> = Vec::new();
    reg.scan(oid::INT4_ARRAY, Format::Binary, Some(wire), &mut out)
        .unwrap();
    assert_eq!(out, values);
}

#[test]
fn empty_array_round_trips_binary() {
    let reg = TypeRegistry::new();
    let values: Vec<i64> = Vec::new();
    let wire = encode_bytes(&reg, oid::INT8_ARRAY, Format::Binary, &values);
    assert_eq!(wire.len(), 12);

    let mut out = vec![9i64];
    reg.scan(oid::INT8_ARRAY, Format::Binary, Some(wire), &mut out)
        .unwrap();
    assert!(out.is_empty());
}

#[test]
fn text_array_round_trips() {
    let reg = TypeRegistry::new();
    let values = vec!["plain".to_string(), "needs quoting".to_string()];

    let wire = encode_bytes(&reg, oid::TEXT_ARRAY, Format::Text, &values);
    assert_eq!(&wire[..], b"{plain,\"needs quoting\"}");

    let mut out: Vec<String> = Vec::new();
    reg.scan(oid::TEXT_ARRAY, Format::Text, Some(wire), &mut out)
        .unwrap();
    assert_eq!(out, values);
}

#[test]
fn array_element_null_is_rejected_for_vec() {
    let reg = TypeRegistry::new();
    let mut out: Vec<String> = Vec::new();
    let err = reg
        .scan(
            oid::TEXT_ARRAY,
            Format::Text,
            Some(Bytes::from_static(b"{a,NULL}")),
            &mut out,
        )
        .unwrap_err();
    assert!(matches!(err, TypeError::NullIntoNonNullable { .. }));
}

#[test]
fn jsonb_binary_round_trips() {
    let reg = TypeRegistry::new();
    let doc = "{\"k\":[1,2]}".to_string();
    let wire = encode_bytes(&reg, oid::JSONB, Format::Binary, &doc);
    assert_eq!(wire[0], 1); // version byte

    let mut out = String::new();
    reg.scan(oid::JSONB, Format::Binary, Some(wire), &mut out).unwrap();
    assert_eq!(out, doc);
}

#[test]
fn aclitem_only_supports_text() {
    let reg = TypeRegistry::new();
    let grant = "user=arwdDxt/owner".to_string();

    let mut buf = BytesMut::new();
    let err = reg
        .encode(oid::ACLITEM, Format::Binary, Some(&grant), &mut buf)
        .unwrap_err();
    assert!(matches!(err, TypeError::NoEncodePlan { .. }));

    let wire = encode_bytes(&reg, oid::ACLITEM, Format::Text, &grant);
    assert_eq!(&wire[..], grant.as_bytes());
}
