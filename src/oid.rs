//! PostgreSQL type OID constants.
//!
//! Reference: https://github.com/postgres/postgres/blob/master/src/include/catalog/pg_type.dat

/// Object identifier assigned by the server to each type.
///
/// `0` is reserved and means "unknown"; planning falls back to inferring the
/// type from the native value.
pub type Oid = u32;

// Boolean
pub const BOOL: Oid = 16;

// Bytes
pub const BYTEA: Oid = 17;

// Characters
pub const QCHAR: Oid = 18;
pub const NAME: Oid = 19;

// Integers
pub const INT8: Oid = 20; // bigint
pub const INT2: Oid = 21; // smallint
pub const INT4: Oid = 23; // integer

// Text
pub const TEXT: Oid = 25;
pub const BPCHAR: Oid = 1042; // blank-padded char
pub const VARCHAR: Oid = 1043;

// System identifiers
pub const OID: Oid = 26;
pub const TID: Oid = 27;
pub const XID: Oid = 28;
pub const CID: Oid = 29;

// JSON
pub const JSON: Oid = 114;
pub const JSONB: Oid = 3802;

// Geometry
pub const POINT: Oid = 600;
pub const LSEG: Oid = 601;
pub const PATH: Oid = 602;
pub const BOX: Oid = 603;
pub const POLYGON: Oid = 604;
pub const LINE: Oid = 628;
pub const CIRCLE: Oid = 718;

// Network addresses
pub const CIDR: Oid = 650;
pub const MACADDR: Oid = 829;
pub const INET: Oid = 869;

// Float
pub const FLOAT4: Oid = 700;
pub const FLOAT8: Oid = 701;

pub const UNKNOWN: Oid = 705;

// Numeric
pub const NUMERIC: Oid = 1700;

// Date/Time
pub const DATE: Oid = 1082;
pub const TIME: Oid = 1083;
pub const TIMESTAMP: Oid = 1114;
pub const TIMESTAMPTZ: Oid = 1184;
pub const INTERVAL: Oid = 1186;

// Bit strings
pub const BIT: Oid = 1560;
pub const VARBIT: Oid = 1562;

// Access control
pub const ACLITEM: Oid = 1033;

// UUID
pub const UUID: Oid = 2950;

pub const RECORD: Oid = 2249;

// Ranges
pub const INT4RANGE: Oid = 3904;
pub const NUMRANGE: Oid = 3906;
pub const TSRANGE: Oid = 3908;
pub const TSTZRANGE: Oid = 3910;
pub const DATERANGE: Oid = 3912;
pub const INT8RANGE: Oid = 3926;

// Arrays
pub const BOOL_ARRAY: Oid = 1000;
pub const BYTEA_ARRAY: Oid = 1001;
pub const NAME_ARRAY: Oid = 1003;
pub const INT2_ARRAY: Oid = 1005;
pub const INT4_ARRAY: Oid = 1007;
pub const TEXT_ARRAY: Oid = 1009;
pub const BPCHAR_ARRAY: Oid = 1014;
pub const VARCHAR_ARRAY: Oid = 1015;
pub const INT8_ARRAY: Oid = 1016;
pub const POINT_ARRAY: Oid = 1017;
pub const BOX_ARRAY: Oid = 1020;
pub const FLOAT4_ARRAY: Oid = 1021;
pub const FLOAT8_ARRAY: Oid = 1022;
pub const ACLITEM_ARRAY: Oid = 1034;
pub const INET_ARRAY: Oid = 1041;
pub const CIDR_ARRAY: Oid = 651;
pub const CIRCLE_ARRAY: Oid = 719;
pub const TIMESTAMP_ARRAY: Oid = 1115;
pub const DATE_ARRAY: Oid = 1182;
pub const TIMESTAMPTZ_ARRAY: Oid = 1185;
pub const NUMERIC_ARRAY: Oid = 1231;
pub const UUID_ARRAY: Oid = 2951;
pub const JSONB_ARRAY: Oid = 3807;
pub const TSRANGE_ARRAY: Oid = 3909;
pub const TSTZRANGE_ARRAY: Oid = 3911;

/// Map an OID to a human-readable type name.
pub fn oid_to_name(oid: Oid) -> &'static str {
    match oid {
        BOOL => "bool",
        BYTEA => "bytea",
        QCHAR => "char",
        NAME => "name",
        INT8 => "int8",
        INT2 => "int2",
        INT4 => "int4",
        TEXT => "text",
        VARCHAR => "varchar",
        BPCHAR => "bpchar",
        OID => "oid",
        TID => "tid",
        XID => "xid",
        CID => "cid",
        JSON => "json",
        JSONB => "jsonb",
        FLOAT4 => "float4",
        FLOAT8 => "float8",
        NUMERIC => "numeric",
        DATE => "date",
        TIME => "time",
        TIMESTAMP => "timestamp",
        TIMESTAMPTZ => "timestamptz",
        INTERVAL => "interval",
        BIT => "bit",
        VARBIT => "varbit",
        ACLITEM => "aclitem",
        UUID => "uuid",
        UNKNOWN => "unknown",
        BOOL_ARRAY => "_bool",
        BYTEA_ARRAY => "_bytea",
        NAME_ARRAY => "_name",
        INT2_ARRAY => "_int2",
        INT4_ARRAY => "_int4",
        INT8_ARRAY => "_int8",
        TEXT_ARRAY => "_text",
        BPCHAR_ARRAY => "_bpchar",
        VARCHAR_ARRAY => "_varchar",
        FLOAT4_ARRAY => "_float4",
        FLOAT8_ARRAY => "_float8",
        ACLITEM_ARRAY => "_aclitem",
        TIMESTAMP_ARRAY => "_timestamp",
        DATE_ARRAY => "_date",
        TIMESTAMPTZ_ARRAY => "_timestamptz",
        NUMERIC_ARRAY => "_numeric",
        UUID_ARRAY => "_uuid",
        JSONB_ARRAY => "_jsonb",
        _ => "unknown",
    }
}

/// Check if an OID is one of the built-in array types.
pub fn is_array_oid(oid: Oid) -> bool {
    matches!(
        oid,
        BOOL_ARRAY
            | BYTEA_ARRAY
            | NAME_ARRAY
            | INT2_ARRAY
            | INT4_ARRAY
            | INT8_ARRAY
            | TEXT_ARRAY
            | BPCHAR_ARRAY
            | VARCHAR_ARRAY
            | FLOAT4_ARRAY
            | FLOAT8_ARRAY
            | ACLITEM_ARRAY
            | INET_ARRAY
            | CIDR_ARRAY
            | POINT_ARRAY
            | BOX_ARRAY
            | CIRCLE_ARRAY
            | TIMESTAMP_ARRAY
            | DATE_ARRAY
            | TIMESTAMPTZ_ARRAY
            | NUMERIC_ARRAY
            | UUID_ARRAY
            | JSONB_ARRAY
            | TSRANGE_ARRAY
            | TSTZRANGE_ARRAY
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oid_to_name() {
        assert_eq!(oid_to_name(INT4), "int4");
        assert_eq!(oid_to_name(UUID), "uuid");
        assert_eq!(oid_to_name(JSONB), "jsonb");
        assert_eq!(oid_to_name(VARBIT), "varbit");
        assert_eq!(oid_to_name(12345), "unknown");
    }

    #[test]
    fn test_is_array_oid() {
        assert!(is_array_oid(INT4_ARRAY));
        assert!(is_array_oid(UUID_ARRAY));
        assert!(!is_array_oid(INT4));
        assert!(!is_array_oid(UUID));
    }
}
