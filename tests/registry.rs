//! Registry invariants: index consistency, default native-type mappings,
//! idempotent registration, and TypeValue resolution.

use std::sync::Arc;

use pgcodec::codec::TextCodec;
use pgcodec::{oid, DataType, EnumType, Format, TypeRegistry};

#[test]
fn oid_and_name_lookups_agree() {
    let reg = TypeRegistry::new();
    for name in [
        "bool", "int2", "int4", "int8", "float4", "float8", "text", "varchar", "bytea", "uuid",
        "json", "jsonb", "numeric", "date", "time", "timestamp", "timestamptz", "varbit",
        "_int4", "_text",
    ] {
        let by_name = reg.data_type_for_name(name).unwrap();
        let by_oid = reg.data_type_for_oid(by_name.oid()).unwrap();
        assert!(Arc::ptr_eq(&by_name, &by_oid), "mismatch for {name}");
    }
}

#[test]
fn default_type_mappings_resolve() {
    let reg = TypeRegistry::new();
    assert_eq!(reg.data_type_for_value(&7i16).unwrap().name(), "int2");
    assert_eq!(reg.data_type_for_value(&7i32).unwrap().name(), "int4");
    assert_eq!(reg.data_type_for_value(&7i64).unwrap().name(), "int8");
    assert_eq!(reg.data_type_for_value(&7u32).unwrap().name(), "int8");
    assert_eq!(reg.data_type_for_value(&1.5f32).unwrap().name(), "float4");
    assert_eq!(reg.data_type_for_value(&true).unwrap().name(), "bool");
    assert_eq!(
        reg.data_type_for_value(&String::new()).unwrap().name(),
        "text"
    );
    assert_eq!(
        reg.data_type_for_value(&Some(5i64)).unwrap().name(),
        "int8"
    );
    assert_eq!(
        reg.data_type_for_value(&vec![1i64, 2]).unwrap().name(),
        "_int8"
    );
}

#[test]
fn user_default_mapping_overrides() {
    struct Handle(#[allow(dead_code)] u32);

    let mut reg = TypeRegistry::new();
    assert!(reg.data_type_for_value(&Handle(1)).is_none());

    reg.register_default_type::<Handle>("int8");
    assert_eq!(reg.data_type_for_value(&Handle(1)).unwrap().name(), "int8");
}

#[test]
fn registration_is_idempotent() {
    let mut reg = TypeRegistry::new();
    let before = reg.data_type_for_oid(oid::TEXT).unwrap().name().to_string();

    reg.register_data_type(DataType::with_codec("text", oid::TEXT, Arc::new(TextCodec)));
    let dt = reg.data_type_for_oid(oid::TEXT).unwrap();
    assert_eq!(dt.name(), before);
    assert!(Arc::ptr_eq(
        &reg.data_type_for_name("text").unwrap(),
        &dt
    ));
    assert_eq!(reg.format_code_for_oid(oid::TEXT), Format::Text);

    // Lookups by native type still work after the derived index was
    // invalidated by the re-registration.
    assert_eq!(
        reg.data_type_for_value(&String::new()).unwrap().name(),
        "text"
    );
}

#[test]
fn registration_overwrites() {
    let mut reg = TypeRegistry::new();
    reg.register_data_type(DataType::with_codec("mytext", 60000, Arc::new(TextCodec)));
    reg.register_data_type(DataType::with_codec("mytext", 60001, Arc::new(TextCodec)));
    assert_eq!(reg.data_type_for_name("mytext").unwrap().oid(), 60001);
}

#[test]
fn type_values_resolve_by_name_not_native_type() {
    let mut reg = TypeRegistry::new();
    let mood_members = vec!["sad".to_string(), "happy".to_string()];
    let color_members = vec!["red".to_string(), "blue".to_string()];
    reg.register_data_type(DataType::with_value(
        "mood",
        60010,
        EnumType::new("mood", mood_members.clone()),
    ));
    reg.register_data_type(DataType::with_value(
        "color",
        60011,
        EnumType::new("color", color_members.clone()),
    ));

    // Both registered types share the EnumType carrier; resolution goes
    // through each instance's declared type name.
    let mood = EnumType::new("mood", mood_members);
    let color = EnumType::new("color", color_members);
    assert_eq!(reg.data_type_for_value(&mood).unwrap().name(), "mood");
    assert_eq!(reg.data_type_for_value(&color).unwrap().name(), "color");
    assert_eq!(reg.data_type_for_value(&mood).unwrap().oid(), 60010);
}

#[test]
fn format_preferences() {
    let reg = TypeRegistry::new();
    // Codec-backed types report the codec preference.
    assert_eq!(reg.format_code_for_oid(oid::INT8), Format::Binary);
    assert_eq!(reg.format_code_for_oid(oid::TEXT), Format::Text);
    // Value-backed types prefer binary exactly when they can encode it.
    assert_eq!(reg.format_code_for_oid(oid::TIMESTAMP), Format::Binary);
    assert_eq!(reg.format_code_for_oid(oid::NUMERIC), Format::Text);
    // Unknown oids fall back to text.
    assert_eq!(reg.format_code_for_oid(424242), Format::Text);
}
