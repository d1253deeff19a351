use serde::{Deserialize, Serialize};

/// Scalar tag carried in the schema section of a change event. This is how
/// the source runner tells us the on-wire encoding of each column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DbzType {
    #[default]
    Undef,
    Float32,
    Float64,
    Float,
    Double,
    Bytes,
    Int8,
    Int16,
    Int32,
    Int64,
    Struct,
    String,
}

impl DbzType {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "float32" => DbzType::Float32,
            "float64" => DbzType::Float64,
            "float" => DbzType::Float,
            "double" => DbzType::Double,
            "bytes" => DbzType::Bytes,
            "int8" => DbzType::Int8,
            "int16" => DbzType::Int16,
            "int32" => DbzType::Int32,
            "int64" => DbzType::Int64,
            "struct" => DbzType::Struct,
            "string" => DbzType::String,
            other => {
                tracing::debug!("unexpected wire type {other}");
                DbzType::Undef
            }
        }
    }
}

/// Sub-classification on top of a wire type describing the epoch unit of a
/// temporal value, or the variable-scale / enum markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimeRep {
    #[default]
    Undef,
    /// number of days since epoch
    Date,
    /// number of milliseconds since epoch/midnight
    Time,
    /// number of microseconds since midnight
    MicroTime,
    /// number of nanoseconds since midnight
    NanoTime,
    /// number of milliseconds since epoch
    Timestamp,
    /// number of microseconds since epoch
    MicroTimestamp,
    /// number of nanoseconds since epoch
    NanoTimestamp,
    /// string representation of timestamp with timezone
    ZonedTimestamp,
    /// duration expressed in microseconds
    MicroDuration,
    /// scale is variable and carried next to the value (oracle)
    VariableScale,
    Enum,
}

impl TimeRep {
    /// Classify the semantic type name found in a schema field, e.g.
    /// `io.debezium.time.MicroTimestamp`. Matching is exact-word so that
    /// `Time` does not shadow `MicroTime`.
    pub fn from_semantic_name(name: &str) -> Self {
        if word_match(name, "io.debezium.time.Date") {
            TimeRep::Date
        } else if word_match(name, "io.debezium.time.Time") {
            TimeRep::Time
        } else if word_match(name, "io.debezium.time.MicroTime") {
            TimeRep::MicroTime
        } else if word_match(name, "io.debezium.time.NanoTime") {
            TimeRep::NanoTime
        } else if word_match(name, "io.debezium.time.Timestamp") {
            TimeRep::Timestamp
        } else if word_match(name, "io.debezium.time.MicroTimestamp") {
            TimeRep::MicroTimestamp
        } else if word_match(name, "io.debezium.time.NanoTimestamp") {
            TimeRep::NanoTimestamp
        } else if word_match(name, "io.debezium.time.ZonedTimestamp") {
            TimeRep::ZonedTimestamp
        } else if word_match(name, "io.debezium.time.MicroDuration") {
            TimeRep::MicroDuration
        } else if word_match(name, "io.debezium.data.VariableScaleDecimal")
            || word_match(name, "io.debezium.data.geometry.Geometry")
        {
            TimeRep::VariableScale
        } else if word_match(name, "io.debezium.data.Enum") {
            TimeRep::Enum
        } else {
            tracing::debug!("unhandled semantic type {name}");
            TimeRep::Undef
        }
    }
}

/// Exact word match: `needle` appears in `hay` and is not surrounded by
/// ASCII alphanumerics. Identifier matching stays ASCII on purpose.
pub fn word_match(hay: &str, needle: &str) -> bool {
    let hay_b = hay.as_bytes();
    let mut from = 0;
    while let Some(rel) = hay[from..].find(needle) {
        let start = from + rel;
        let end = start + needle.len();
        let head_ok = start == 0 || !hay_b[start - 1].is_ascii_alphanumeric();
        let tail_ok = end == hay_b.len() || !hay_b[end].is_ascii_alphanumeric();
        if head_ok && tail_ok {
            return true;
        }
        from = start + 1;
    }
    false
}

/// Destination type category as reported by the destination catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TypeCategory {
    Array,
    Boolean,
    Composite,
    DateTime,
    Enum,
    Geometric,
    Numeric,
    String,
    TimeSpan,
    BitString,
    User,
    #[default]
    Unknown,
}

impl TypeCategory {
    /// Map the destination catalog's single-letter category code.
    pub fn from_code(code: char) -> Self {
        match code {
            'A' => TypeCategory::Array,
            'B' => TypeCategory::Boolean,
            'C' => TypeCategory::Composite,
            'D' => TypeCategory::DateTime,
            'E' => TypeCategory::Enum,
            'G' => TypeCategory::Geometric,
            'N' => TypeCategory::Numeric,
            'S' => TypeCategory::String,
            'T' => TypeCategory::TimeSpan,
            'V' => TypeCategory::BitString,
            'U' => TypeCategory::User,
            _ => TypeCategory::Unknown,
        }
    }
}

/// Interval range masks, laid out the way the destination packs them into
/// the high bits of an interval typmod.
pub mod interval {
    pub const MONTH: i32 = 1 << 1;
    pub const YEAR: i32 = 1 << 2;
    pub const DAY: i32 = 1 << 3;
    pub const HOUR: i32 = 1 << 10;
    pub const MINUTE: i32 = 1 << 11;
    pub const SECOND: i32 = 1 << 12;
    pub const FULL_RANGE: i32 = 0x7FFF;

    pub fn range_of(typmod: i32) -> i32 {
        (typmod >> 16) & FULL_RANGE
    }
}
