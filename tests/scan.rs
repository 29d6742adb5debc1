//! Scan paths: fast paths, codec plans, adapters, Value-backed decoding,
//! external scanners, and the typed failure modes.

use std::any::Any;

use bytes::{Bytes, BytesMut};
use chrono::NaiveDateTime;
use pgcodec::value::{database_sql_value, TextDecode, TextEncode, Value};
use pgcodec::{
    oid, Bits, DataType, EnumType, Format, IsNull, Numeric, SqlScanner, SqlValue, TextScanner,
    Timestamp, TypeError, TypeRegistry, TypeResult,
};

fn be(bytes: &[u8]) -> Option<Bytes> {
    Some(Bytes::from(bytes.to_vec()))
}

#[test]
fn binary_int8_into_i64() {
    let reg = TypeRegistry::new();
    let mut out = 0i64;
    reg.scan(
        oid::INT8,
        Format::Binary,
        be(&[0, 0, 0, 0, 0, 0, 0, 0x2A]),
        &mut out,
    )
    .unwrap();
    assert_eq!(out, 42);
}

#[test]
fn binary_float4_into_f32() {
    let reg = TypeRegistry::new();
    let mut out = 0f32;
    reg.scan(
        oid::FLOAT4,
        Format::Binary,
        be(&[0x40, 0x49, 0x0F, 0xDB]),
        &mut out,
    )
    .unwrap();
    assert_eq!(out, f32::from_bits(0x4049_0FDB));
    assert!((out - 3.14159).abs() < 1e-5);
}

#[test]
fn text_into_string() {
    let reg = TypeRegistry::new();
    let mut out = String::new();
    reg.scan(oid::TEXT, Format::Text, be(b"hello"), &mut out)
        .unwrap();
    assert_eq!(out, "hello");
}

#[test]
fn binary_bool() {
    let reg = TypeRegistry::new();
    let mut out = false;
    reg.scan(oid::BOOL, Format::Binary, be(&[1]), &mut out)
        .unwrap();
    assert!(out);
}

#[test]
fn null_into_nullable_string() {
    let reg = TypeRegistry::new();
    let mut out: Option<String> = Some("stale".to_string());
    reg.scan(oid::TEXT, Format::Text, None, &mut out).unwrap();
    assert_eq!(out, None);
}

#[test]
fn present_into_nullable_string() {
    let reg = TypeRegistry::new();
    let mut out: Option<String> = None;
    reg.scan(oid::TEXT, Format::Text, be(b"abc"), &mut out)
        .unwrap();
    assert_eq!(out.as_deref(), Some("abc"));
}

#[test]
fn varbit_into_bits() {
    let reg = TypeRegistry::new();
    let mut out = Bits::default();
    // 9-bit value 111111111
    reg.scan(
        oid::VARBIT,
        Format::Binary,
        be(&[0, 0, 0, 9, 0xFF, 0x80]),
        &mut out,
    )
    .unwrap();
    assert_eq!(&out.bytes[..], &[0xFF, 0x80]);
    assert_eq!(out.len, 9);
    assert!(out.valid);
}

#[test]
fn varbit_vectors_round_trip() {
    let reg = TypeRegistry::new();
    let cases = [
        Bits::new(Bytes::new(), 0),
        Bits::new(vec![0, 1, 128, 254, 255], 40),
        Bits::new(vec![0, 1, 128, 254, 128], 33),
    ];
    for case in cases {
        let mut buf = BytesMut::new();
        let is_null = reg
            .encode(oid::VARBIT, Format::Binary, Some(&case), &mut buf)
            .unwrap();
        assert_eq!(is_null, IsNull::No);

        let mut out = Bits::default();
        reg.scan(oid::VARBIT, Format::Binary, Some(buf.freeze()), &mut out)
            .unwrap();
        assert_eq!(out, case);
    }

    // NULL scans to the zero value.
    let mut out = Bits::new(vec![0xFF], 8);
    reg.scan(oid::VARBIT, Format::Binary, None, &mut out).unwrap();
    assert_eq!(out, Bits::default());
}

#[test]
fn invalid_length_is_reported() {
    let reg = TypeRegistry::new();
    let mut out = 0i64;
    let err = reg
        .scan(oid::INT8, Format::Binary, be(&[0; 7]), &mut out)
        .unwrap_err();
    assert!(matches!(
        err,
        TypeError::InvalidLength {
            expected: 8,
            got: 7
        }
    ));

    let mut out = 0f32;
    let err = reg
        .scan(oid::FLOAT4, Format::Binary, be(&[0; 3]), &mut out)
        .unwrap_err();
    assert!(matches!(err, TypeError::InvalidLength { expected: 4, .. }));
}

#[test]
fn null_into_non_nullable_is_reported() {
    let reg = TypeRegistry::new();

    let mut out = 0i64;
    let err = reg
        .scan(oid::INT8, Format::Binary, None, &mut out)
        .unwrap_err();
    assert!(matches!(err, TypeError::NullIntoNonNullable { .. }));

    let mut out = String::new();
    let err = reg.scan(oid::TEXT, Format::Text, None, &mut out).unwrap_err();
    assert!(matches!(err, TypeError::NullIntoNonNullable { .. }));

    // NULL into a nullable slot succeeds for every registered scalar.
    let mut out: Option<i64> = Some(1);
    reg.scan(oid::INT8, Format::Binary, None, &mut out).unwrap();
    assert_eq!(out, None);
}

#[test]
fn widening_scan_into_narrow_integers() {
    let reg = TypeRegistry::new();

    let mut out = 0i32;
    reg.scan(oid::INT8, Format::Binary, be(&42i64.to_be_bytes()), &mut out)
        .unwrap();
    assert_eq!(out, 42);

    let mut out = 0u16;
    reg.scan(oid::INT8, Format::Binary, be(&300i64.to_be_bytes()), &mut out)
        .unwrap();
    assert_eq!(out, 300);

    // int2 wire value into a wider destination goes through the i64 plan.
    let mut out = 0i32;
    reg.scan(oid::INT2, Format::Binary, be(&(-7i16).to_be_bytes()), &mut out)
        .unwrap();
    assert_eq!(out, -7);

    let mut out = 0u8;
    let err = reg
        .scan(oid::INT8, Format::Binary, be(&300i64.to_be_bytes()), &mut out)
        .unwrap_err();
    assert!(matches!(err, TypeError::OutOfRange { .. }));
}

#[test]
fn widening_scan_into_f32() {
    let reg = TypeRegistry::new();
    let mut out = 0f32;
    reg.scan(
        oid::FLOAT8,
        Format::Binary,
        be(&2.5f64.to_be_bytes()),
        &mut out,
    )
    .unwrap();
    assert_eq!(out, 2.5);
}

#[test]
fn nested_option_goes_through_the_slot() {
    let reg = TypeRegistry::new();
    let mut out: Option<i64> = None;
    reg.scan(oid::INT8, Format::Binary, be(&9i64.to_be_bytes()), &mut out)
        .unwrap();
    assert_eq!(out, Some(9));
}

#[test]
fn any_slot_receives_the_natural_decoding() {
    let reg = TypeRegistry::new();

    let mut slot: Option<Box<dyn Any>> = None;
    reg.scan(oid::INT8, Format::Binary, be(&5i64.to_be_bytes()), &mut slot)
        .unwrap();
    assert_eq!(slot.unwrap().downcast_ref::<i64>(), Some(&5));

    let mut slot: Option<Box<dyn Any>> = Some(Box::new(0u8));
    reg.scan(oid::INT8, Format::Binary, None, &mut slot).unwrap();
    assert!(slot.is_none());
}

#[test]
fn oid_zero_resolves_by_destination_type() {
    let reg = TypeRegistry::new();
    let mut out = 0i64;
    reg.scan(0, Format::Binary, be(&11i64.to_be_bytes()), &mut out)
        .unwrap();
    assert_eq!(out, 11);
}

#[test]
fn unknown_oid_text_still_reaches_string_and_bytes() {
    let reg = TypeRegistry::new();

    let mut out = String::new();
    reg.scan(424242, Format::Text, be(b"raw"), &mut out).unwrap();
    assert_eq!(out, "raw");

    let mut out: Vec<u8> = Vec::new();
    reg.scan(424242, Format::Text, be(b"raw"), &mut out).unwrap();
    assert_eq!(out, b"raw");
}

#[test]
fn unknown_destination_fails_with_unknown_oid() {
    struct Widget;

    let reg = TypeRegistry::new();
    let mut out = Widget;
    let err = reg
        .scan(424242, Format::Binary, be(&[1]), &mut out)
        .unwrap_err();
    assert!(matches!(err, TypeError::UnknownOid(424242)));
}

#[test]
fn bytea_text_format_decodes_hex() {
    let reg = TypeRegistry::new();
    let mut out: Vec<u8> = Vec::new();
    reg.scan(oid::BYTEA, Format::Text, be(b"\\xdeadbeef"), &mut out)
        .unwrap();
    assert_eq!(out, vec![0xDE, 0xAD, 0xBE, 0xEF]);
}

#[test]
fn bytes_destination_installs_shallowly() {
    let reg = TypeRegistry::new();
    let src = Bytes::from_static(b"payload");
    let mut out = Bytes::new();
    reg.scan(oid::BYTEA, Format::Binary, Some(src.clone()), &mut out)
        .unwrap();
    assert_eq!(out, src);
}

#[test]
fn jsonb_binary_strips_version_byte() {
    let reg = TypeRegistry::new();
    let mut out = String::new();
    reg.scan(oid::JSONB, Format::Binary, be(b"\x01{\"k\":1}"), &mut out)
        .unwrap();
    assert_eq!(out, "{\"k\":1}");
}

#[test]
fn uuid_binary_into_string() {
    let reg = TypeRegistry::new();
    let mut out = String::new();
    reg.scan(
        oid::UUID,
        Format::Binary,
        be(&[
            0x55, 0x0E, 0x84, 0x00, 0xE2, 0x9B, 0x41, 0xD4, 0xA7, 0x16, 0x44, 0x66, 0x55, 0x44,
            0x00, 0x00,
        ]),
        &mut out,
    )
    .unwrap();
    assert_eq!(out, "550e8400-e29b-41d4-a716-446655440000");
}

#[test]
fn numeric_value_paths() {
    let reg = TypeRegistry::new();

    let mut out = Numeric::default();
    reg.scan(oid::NUMERIC, Format::Text, be(b"123.456"), &mut out)
        .unwrap();
    assert_eq!(out.as_str(), "123.456");

    // Assignment through the Value into a primitive destination.
    let mut out = 0f64;
    reg.scan(oid::NUMERIC, Format::Text, be(b"-2.5"), &mut out)
        .unwrap();
    assert_eq!(out, -2.5);

    let mut out: Option<i64> = Some(0);
    reg.scan(oid::NUMERIC, Format::Text, None, &mut out).unwrap();
    assert_eq!(out, None);
}

#[test]
fn timestamp_value_paths() {
    let reg = TypeRegistry::new();
    let ts = Timestamp::new(
        NaiveDateTime::parse_from_str("2004-10-19 10:23:54", "%Y-%m-%d %H:%M:%S").unwrap(),
    );
    let mut buf = BytesMut::new();
    reg.encode(oid::TIMESTAMP, Format::Binary, Some(&ts), &mut buf)
        .unwrap();
    assert_eq!(buf.len(), 8);
    let wire = buf.freeze();

    // Direct decode into the value type through the fast path.
    let mut out = Timestamp::default();
    reg.scan(oid::TIMESTAMP, Format::Binary, Some(wire.clone()), &mut out)
        .unwrap();
    assert_eq!(out, ts);

    // Assignment into a chrono destination.
    let mut out = NaiveDateTime::default();
    reg.scan(oid::TIMESTAMP, Format::Binary, Some(wire.clone()), &mut out)
        .unwrap();
    assert_eq!(out, ts.time);

    let mut out: Option<NaiveDateTime> = None;
    reg.scan(oid::TIMESTAMP, Format::Binary, Some(wire), &mut out)
        .unwrap();
    assert_eq!(out, Some(ts.time));
}

#[test]
fn enum_type_scan_validates_members() {
    let mut reg = TypeRegistry::new();
    let members = vec!["sad".to_string(), "happy".to_string()];
    reg.register_data_type(DataType::with_value(
        "mood",
        60010,
        EnumType::new("mood", members.clone()),
    ));

    let mut out = EnumType::new("mood", members.clone());
    reg.scan(60010, Format::Text, be(b"happy"), &mut out).unwrap();
    assert_eq!(out.label(), Some("happy"));

    let mut out = EnumType::new("mood", members);
    let err = reg
        .scan(60010, Format::Text, be(b"angry"), &mut out)
        .unwrap_err();
    assert!(matches!(err, TypeError::Malformed(_)));

    // The label assigns into a plain string destination too.
    let mut out = String::new();
    reg.scan(60010, Format::Binary, be(b"sad"), &mut out).unwrap();
    assert_eq!(out, "sad");
}

#[derive(Debug, Default)]
struct ScannedInt {
    value: Option<i64>,
}

impl SqlScanner for ScannedInt {
    fn scan(&mut self, value: SqlValue) -> TypeResult<()> {
        match value {
            SqlValue::Null => {
                self.value = None;
                Ok(())
            }
            SqlValue::Int(v) => {
                self.value = Some(v);
                Ok(())
            }
            other => Err(TypeError::Malformed(format!("expected int, got {other:?}"))),
        }
    }
}

#[test]
fn sql_scanner_receives_decoded_values() {
    let mut reg = TypeRegistry::new();
    reg.register_sql_scanner::<ScannedInt>();

    let mut out = ScannedInt::default();
    reg.scan(oid::INT8, Format::Binary, be(&7i64.to_be_bytes()), &mut out)
        .unwrap();
    assert_eq!(out.value, Some(7));

    reg.scan(oid::INT8, Format::Binary, None, &mut out).unwrap();
    assert_eq!(out.value, None);
}

#[test]
fn sql_scanner_fallback_for_unknown_oid() {
    #[derive(Debug, Default)]
    struct RawCapture {
        text: Option<String>,
        bytes: Option<Vec<u8>>,
    }

    impl SqlScanner for RawCapture {
        fn scan(&mut self, value: SqlValue) -> TypeResult<()> {
            match value {
                SqlValue::Null => Ok(()),
                SqlValue::Text(v) => {
                    self.text = Some(v);
                    Ok(())
                }
                SqlValue::Bytes(v) => {
                    self.bytes = Some(v);
                    Ok(())
                }
                other => Err(TypeError::Malformed(format!("unexpected {other:?}"))),
            }
        }
    }

    let mut reg = TypeRegistry::new();
    reg.register_sql_scanner::<RawCapture>();

    let mut out = RawCapture::default();
    reg.scan(424242, Format::Text, be(b"opaque"), &mut out).unwrap();
    assert_eq!(out.text.as_deref(), Some("opaque"));

    let mut out = RawCapture::default();
    reg.scan(424242, Format::Binary, be(&[1, 2, 3]), &mut out)
        .unwrap();
    assert_eq!(out.bytes.as_deref(), Some(&[1u8, 2, 3][..]));
}

#[derive(Debug, Default)]
struct Label {
    text: Option<String>,
}

impl TextScanner for Label {
    fn scan_text(&mut self, src: Option<&str>) -> TypeResult<()> {
        self.text = src.map(String::from);
        Ok(())
    }
}

#[test]
fn text_scanner_fast_path() {
    let mut reg = TypeRegistry::new();
    reg.register_text_scanner::<Label>();

    let mut out = Label::default();
    reg.scan(oid::TEXT, Format::Text, be(b"hi"), &mut out).unwrap();
    assert_eq!(out.text.as_deref(), Some("hi"));

    reg.scan(oid::TEXT, Format::Text, None, &mut out).unwrap();
    assert_eq!(out.text, None);
}

// A third-party temperature reading that both implements the external
// scanner capability and is assignable from the registered value type.
#[derive(Debug, Clone, Default, PartialEq)]
struct Celsius {
    degrees: f64,
    via_scanner: bool,
}

impl SqlScanner for Celsius {
    fn scan(&mut self, value: SqlValue) -> TypeResult<()> {
        match value {
            SqlValue::Text(v) => {
                self.degrees = v
                    .parse()
                    .map_err(|e| TypeError::Malformed(format!("bad reading: {e}")))?;
                self.via_scanner = true;
                Ok(())
            }
            other => Err(TypeError::Malformed(format!("unexpected {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct TemperatureValue {
    degrees: f64,
    valid: bool,
}

impl Value for TemperatureValue {
    fn set(&mut self, src: Option<Box<dyn Any>>) -> TypeResult<()> {
        match src {
            None => {
                *self = Self::default();
                Ok(())
            }
            Some(src) => {
                let degrees = src
                    .downcast_ref::<f64>()
                    .copied()
                    .ok_or(TypeError::Unsupported("expected f64"))?;
                *self = Self {
                    degrees,
                    valid: true,
                };
                Ok(())
            }
        }
    }

    fn get(&self) -> Option<Box<dyn Any>> {
        self.valid.then(|| Box::new(self.degrees) as Box<dyn Any>)
    }

    fn assign_to(&self, dst: &mut dyn Any) -> TypeResult<()> {
        if !self.valid {
            return Err(TypeError::NullAssignment {
                target: "destination",
            });
        }
        if let Some(slot) = dst.downcast_mut::<Celsius>() {
            *slot = Celsius {
                degrees: self.degrees,
                via_scanner: false,
            };
            return Ok(());
        }
        if let Some(slot) = dst.downcast_mut::<f64>() {
            *slot = self.degrees;
            return Ok(());
        }
        Err(TypeError::Unsupported("unsupported temperature target"))
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

    fn text_encoder(&self) -> Option<&dyn TextEncode> {
        Some(self)
    }
}

impl TextDecode for TemperatureValue {
    fn decode_text(&mut self, _registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()> {
        let Some(src) = src else {
            *self = Self::default();
            return Ok(());
        };
        let degrees = std::str::from_utf8(&src)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| TypeError::Malformed("invalid temperature".to_string()))?;
        *self = Self {
            degrees,
            valid: true,
        };
        Ok(())
    }
}

impl TextEncode for TemperatureValue {
    fn encode_text(&self, _registry: &TypeRegistry, buf: &mut BytesMut) -> TypeResult<IsNull> {
        if !self.valid {
            return Ok(IsNull::Yes);
        }
        buf.extend_from_slice(self.degrees.to_string().as_bytes());
        Ok(IsNull::No)
    }
}

#[test]
fn prefer_assign_to_flips_the_scanner_path() {
    let mut reg = TypeRegistry::new();
    reg.register_data_type(DataType::with_value(
        "temperature",
        60100,
        TemperatureValue::default(),
    ));
    reg.register_sql_scanner::<Celsius>();

    // Default: the external scanner wins.
    let mut out = Celsius::default();
    reg.scan(60100, Format::Text, be(b"36.6"), &mut out).unwrap();
    assert_eq!(out.degrees, 36.6);
    assert!(out.via_scanner);

    // After preferring assign-to, the Value's assignment path wins.
    reg.prefer_assign_to_over_sql_scanner::<Celsius>();
    let mut out = Celsius::default();
    reg.scan(60100, Format::Text, be(b"36.6"), &mut out).unwrap();
    assert_eq!(out.degrees, 36.6);
    assert!(!out.via_scanner);
}

#[test]
fn assign_fallback_stops_after_one_replan() {
    struct Widget;

    let reg = TypeRegistry::new();
    let mut out = Widget;
    // numeric has no codec and Widget is no assignment target, so the plan
    // re-plans once, lands on the same route, and surfaces the original
    // assignment error instead of looping.
    let err = reg
        .scan(oid::NUMERIC, Format::Text, be(b"1.5"), &mut out)
        .unwrap_err();
    assert!(matches!(err, TypeError::Unsupported(_)));
}

#[test]
fn plans_replan_when_the_destination_type_changes() {
    let reg = TypeRegistry::new();
    // Built for i64, invoked with i32: the plan requests a fresh plan and
    // the widening adapter takes over.
    let plan = reg.plan_scan(oid::INT8, Format::Binary, &0i64);
    let mut out = 0i32;
    plan.scan(
        &reg,
        oid::INT8,
        Format::Binary,
        be(&5i64.to_be_bytes()),
        &mut out,
    )
    .unwrap();
    assert_eq!(out, 5);
}

#[test]
fn database_sql_value_prefers_text_encoding() {
    let reg = TypeRegistry::new();
    let n = Numeric::new("42.5");
    assert_eq!(
        database_sql_value(&reg, &n).unwrap(),
        SqlValue::Text("42.5".to_string())
    );
    assert_eq!(
        database_sql_value(&reg, &Numeric::default()).unwrap(),
        SqlValue::Null
    );
}
