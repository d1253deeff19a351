use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as Json;
use tracing::{debug, warn};

use common::types::{interval, ColumnValue, ConnectorKind, DbzType, TimeRep, TypeCategory};
use common::utils::{
    be_signed_decimal, escape_single_quote, pad_zeros, to_binary_string, to_escaped_hex,
    trim_leading_zeros,
};
use rules::RuleStore;

use crate::error::ConvertError;

const SECS_PER_YEAR: i64 = 31_557_600;
const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_MINUTE: i64 = 60;
const DAYS_PER_MONTH: i64 = 30;
const MONTHS_PER_YEAR: i64 = 12;
const HOURS_PER_DAY: i64 = 24;
const MINS_PER_HOUR: i64 = 60;

/// Evaluates a user transform expression against a decoded value. The
/// returned string replaces the decoded value verbatim, without additional
/// quoting.
pub trait TransformEvaluator: Send + Sync {
    fn eval(
        &self,
        data: &str,
        wkb: Option<&str>,
        srid: Option<&str>,
        expression: &str,
    ) -> Result<String, String>;
}

/// Default evaluator: pure placeholder substitution. `%d`/`%w`/`%s` are
/// replaced with the data, wkb and srid; expressions using positional `?`
/// consume wkb then srid when present, the data otherwise.
pub struct ExpressionSubstituter;

impl TransformEvaluator for ExpressionSubstituter {
    fn eval(
        &self,
        data: &str,
        wkb: Option<&str>,
        srid: Option<&str>,
        expression: &str,
    ) -> Result<String, String> {
        let mut out = expression.to_string();
        if out.contains("%d") || out.contains("%w") || out.contains("%s") {
            out = out.replace("%d", data);
            if let Some(wkb) = wkb {
                out = out.replace("%w", wkb);
            }
            if let Some(srid) = srid {
                out = out.replace("%s", srid);
            }
            return Ok(out);
        }
        if out.contains('?') {
            match (wkb, srid) {
                (Some(wkb), Some(srid)) => {
                    out = out.replacen('?', &format!("'{wkb}'"), 1);
                    out = out.replacen('?', srid, 1);
                }
                _ => {
                    out = out.replacen('?', &format!("'{data}'"), 1);
                }
            }
            return Ok(out);
        }
        Err(format!("expression '{expression}' has no placeholder"))
    }
}

/// Convert one column value from its on-the-wire encoding to a destination
/// literal. `add_quote` selects text-SQL form (quoted/escaped) over the
/// bare tuple form. Returns `None` for SQL NULL.
pub fn process_value(
    colval: &ColumnValue,
    add_quote: bool,
    remote_object_id: &str,
    store: &RuleStore,
    evaluator: Option<&dyn TransformEvaluator>,
) -> Result<Option<String>, ConvertError> {
    let Some(raw) = colval.value.as_deref() else {
        return Ok(None);
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return Ok(None);
    }

    debug!(
        "decode col {} category {:?} wire {:?} timerep {:?} type {}",
        colval.name, colval.category, colval.wire_type, colval.time_rep, colval.type_name
    );

    // Struct values carry the scalar one level down. Oracle's variable
    // scale form is expanded here; other struct shapes are left as JSON
    // text for the transform hook / string fallback.
    let mut wire = colval.wire_type;
    let mut scale = colval.scale;
    let mut value = raw.to_string();
    if wire == DbzType::Struct {
        match expand_struct_value(raw, store.kind(), colval.time_rep) {
            Some((inner, inner_scale)) => {
                value = inner;
                if let Some(s) = inner_scale {
                    scale = s;
                }
                wire = DbzType::Bytes;
            }
            None => wire = DbzType::String,
        }
    }

    // transform hook: keyed by the original remote column name since the
    // mapped name may differ. When an expression is attached, the value is
    // decoded unquoted and the evaluator's result is used verbatim.
    let expression = store.transform_expression(remote_object_id, &colval.remote_name);
    let effective_quote = if expression.is_some() { false } else { add_quote };

    let decoded = decode_by_category(colval, &value, wire, scale, effective_quote, store)?;
    let Some(mut out) = decoded else {
        return Ok(None);
    };
    if let Some(expression) = expression {
        let result = match evaluator {
            None => Err("no evaluator available".to_string()),
            Some(evaluator) => {
                if out.starts_with('{') && out.ends_with('}') && out.contains("\"wkb\"") {
                    let (wkb, srid) = extract_geometry(&out);
                    let escaped = escape_single_quote(&out, false);
                    evaluator.eval(&escaped, Some(&wkb), Some(&srid), expression)
                } else {
                    let escaped = escape_single_quote(&out, false);
                    evaluator.eval(&escaped, None, None, expression)
                }
            }
        };
        match result {
            Ok(transformed) => {
                debug!(
                    "transformed {}.{} with '{}'",
                    remote_object_id, colval.remote_name, expression
                );
                out = transformed;
            }
            Err(e) => {
                warn!(
                    "transform expression '{}' failed on {}.{}: {}",
                    expression, remote_object_id, colval.remote_name, e
                );
                // restore the quoting the caller asked for
                if add_quote {
                    out = escape_single_quote(&out, true);
                }
            }
        }
    }
    Ok(Some(out))
}

fn decode_by_category(
    colval: &ColumnValue,
    value: &str,
    wire: DbzType,
    scale: i32,
    add_quote: bool,
    store: &RuleStore,
) -> Result<Option<String>, ConvertError> {
    let out = match colval.category {
        TypeCategory::Boolean | TypeCategory::Numeric => {
            // money always carries cents, force scale 4
            let scale = if colval.type_name.contains("money") {
                4
            } else {
                scale
            };
            match wire {
                DbzType::Bytes => decimal_from_base64(value, scale)?,
                DbzType::String => {
                    warn!(
                        "no special handling to convert string ('{value}') to numeric type. \
                         May fail to apply if it contains non-numeric characters"
                    );
                    quote_passthrough(value, add_quote)
                }
                _ => value.to_string(),
            }
        }
        TypeCategory::DateTime => {
            return decode_datetime(colval, value, wire, add_quote, store).map(Some);
        }
        TypeCategory::BitString => match wire {
            DbzType::Bytes => bit_from_base64(value, add_quote, colval.typmod)?,
            _ => {
                warn!(
                    "no special handling to convert {:?} value ('{value}') to bit type. \
                     May fail to apply if it contains non-bit characters",
                    wire
                );
                quote_passthrough(value, add_quote)
            }
        },
        TypeCategory::TimeSpan => match wire {
            DbzType::Bytes => {
                let total = int_from_base64(value)?;
                interval_string(total, colval, add_quote, store)?
            }
            DbzType::String => quote_passthrough(value, add_quote),
            _ => {
                let total = parse_int(value);
                interval_string(total, colval, add_quote, store)?
            }
        },
        TypeCategory::User if colval.type_name.contains("bytea") => match wire {
            DbzType::Bytes => {
                let bytes = decode_base64(value)?;
                to_escaped_hex(&bytes, add_quote)
            }
            _ => {
                warn!(
                    "no special handling to convert {:?} value ('{value}') to byte type. \
                     May fail to apply if it contains non-byte characters",
                    wire
                );
                quote_passthrough(value, add_quote)
            }
        },
        _ => {
            // string, enum, geometric, user and everything else
            debug!("no special handling for category {:?}", colval.category);
            quote_passthrough(value, add_quote)
        }
    };
    Ok(Some(out))
}

fn decode_datetime(
    colval: &ColumnValue,
    value: &str,
    wire: DbzType,
    add_quote: bool,
    store: &RuleStore,
) -> Result<String, ConvertError> {
    enum Temporal {
        Date,
        Timestamp,
        Time,
    }
    // the catalog type name is descriptive enough to pick the flavour
    let flavour = if colval.type_name.contains("date") {
        Temporal::Date
    } else if colval.type_name.contains("timestamp") {
        Temporal::Timestamp
    } else {
        Temporal::Time
    };

    if wire == DbzType::String {
        return Ok(
            if colval.type_name.contains("timestamp") || colval.type_name.contains("timetz") {
                timestamp_from_string(value, add_quote)
            } else {
                quote_passthrough(value, add_quote)
            },
        );
    }

    let input = match wire {
        DbzType::Bytes => int_from_base64(value)?,
        _ => parse_int(value),
    };
    match flavour {
        Temporal::Date => date_string(input, colval, add_quote, store),
        Temporal::Timestamp => timestamp_string(input, colval, add_quote, store),
        Temporal::Time => time_string(input, colval, add_quote, store),
    }
}

/// Expand `{scale, value}` one level for sources that wrap variable-scale
/// scalars. Returns `None` when the struct shape is not understood.
fn expand_struct_value(
    raw: &str,
    kind: ConnectorKind,
    time_rep: TimeRep,
) -> Option<(String, Option<i32>)> {
    match kind {
        ConnectorKind::Oracle | ConnectorKind::Olr if time_rep == TimeRep::VariableScale => {
            let json: Json = serde_json::from_str(raw).ok()?;
            let scale = match &json["scale"] {
                Json::Number(n) => n.as_i64().map(|v| v as i32),
                _ => Some(0),
            };
            match &json["value"] {
                Json::String(s) => Some((s.clone(), scale)),
                _ => {
                    warn!("struct value has scale but no value");
                    None
                }
            }
        }
        _ => {
            warn!("struct parsing for this source is only supported through transform rules");
            None
        }
    }
}

fn extract_geometry(out: &str) -> (String, String) {
    let json: Json = match serde_json::from_str(out) {
        Ok(v) => v,
        Err(_) => return ("0".into(), "0".into()),
    };
    let wkb = match &json["wkb"] {
        Json::String(s) => s.clone(),
        _ => "0".to_string(),
    };
    let srid = match &json["srid"] {
        Json::Number(n) => n.to_string(),
        Json::String(s) => s.clone(),
        _ => "0".to_string(),
    };
    (wkb, srid)
}

fn quote_passthrough(value: &str, add_quote: bool) -> String {
    if add_quote {
        escape_single_quote(value, true)
    } else {
        value.to_string()
    }
}

fn decode_base64(value: &str) -> Result<Vec<u8>, ConvertError> {
    B64.decode(value)
        .map_err(|e| ConvertError::MalformedEventSchema(format!("bad base64 value: {e}")))
}

fn int_from_base64(value: &str) -> Result<i64, ConvertError> {
    let bytes = decode_base64(value)?;
    Ok(common::utils::be_signed_i128(&bytes).unwrap_or(0) as i64)
}

fn parse_int(value: &str) -> i64 {
    value.trim().parse::<i64>().unwrap_or(0)
}

/// Base64-packed big-endian signed integer with a decimal point inserted
/// `scale` digits from the right.
fn decimal_from_base64(value: &str, scale: i32) -> Result<String, ConvertError> {
    let bytes = decode_base64(value)?;
    let decimal = be_signed_decimal(&bytes);
    Ok(apply_scale(&decimal, scale))
}

fn apply_scale(decimal: &str, scale: i32) -> String {
    if scale <= 0 {
        return decimal.to_string();
    }
    let scale = scale as usize;
    let (sign, digits) = match decimal.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", decimal),
    };
    let scaled = if digits.len() > scale {
        let split = digits.len() - scale;
        format!("{}.{}", &digits[..split], &digits[split..])
    } else {
        let mut out = String::from("0.");
        for _ in 0..(scale - digits.len()) {
            out.push('0');
        }
        out.push_str(digits);
        out
    };
    format!("{sign}{scaled}")
}

fn quoted(text: String, add_quote: bool) -> String {
    if add_quote {
        format!("'{text}'")
    } else {
        text
    }
}

/// Pick the epoch unit. The OLR wire carries no time representation at
/// all, so for that source the unit is inferred from the destination type.
fn effective_timerep(
    colval: &ColumnValue,
    store: &RuleStore,
    inferred: TimeRep,
    what: &'static str,
) -> Result<TimeRep, ConvertError> {
    match colval.time_rep {
        TimeRep::Undef if store.kind() == ConnectorKind::Olr => Ok(inferred),
        TimeRep::Undef => Err(ConvertError::UnknownTimeRepresentation(what)),
        other => Ok(other),
    }
}

fn date_string(
    input: i64,
    colval: &ColumnValue,
    add_quote: bool,
    store: &RuleStore,
) -> Result<String, ConvertError> {
    let rep = effective_timerep(colval, store, TimeRep::Date, "date")?;
    let days = match rep {
        TimeRep::Date => input,
        TimeRep::Timestamp => input / (SECS_PER_DAY * 1_000),
        TimeRep::MicroTimestamp => input / (SECS_PER_DAY * 1_000_000),
        TimeRep::NanoTimestamp => input / (SECS_PER_DAY * 1_000_000_000),
        _ => return Err(ConvertError::UnknownTimeRepresentation("date")),
    };
    let date = NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch")
        + chrono::Duration::days(days);
    Ok(quoted(date.format("%Y-%m-%d").to_string(), add_quote))
}

fn timestamp_string(
    input: i64,
    colval: &ColumnValue,
    add_quote: bool,
    store: &RuleStore,
) -> Result<String, ConvertError> {
    let rep = effective_timerep(colval, store, TimeRep::MicroTimestamp, "timestamp")?;
    let (secs, micros) = match rep {
        TimeRep::Timestamp => (input / 1_000, (input % 1_000) * 1_000),
        TimeRep::MicroTimestamp => (input / 1_000_000, input % 1_000_000),
        TimeRep::NanoTimestamp => (input / 1_000_000_000, (input % 1_000_000_000) / 1_000),
        _ => return Err(ConvertError::UnknownTimeRepresentation("timestamp")),
    };
    let dt = DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or(ConvertError::UnknownTimeRepresentation("timestamp"))?;
    let text = if colval.typmod > 0 {
        format!("{}.{:06}", dt.format("%Y-%m-%d %H:%M:%S"), micros)
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    };
    Ok(quoted(text, add_quote))
}

fn time_string(
    input: i64,
    colval: &ColumnValue,
    add_quote: bool,
    store: &RuleStore,
) -> Result<String, ConvertError> {
    let rep = effective_timerep(colval, store, TimeRep::MicroTime, "time")?;
    let (secs, micros) = match rep {
        TimeRep::Time => (input / 1_000, (input % 1_000) * 1_000),
        TimeRep::MicroTime => (input / 1_000_000, input % 1_000_000),
        TimeRep::NanoTime => (input / 1_000_000_000, (input % 1_000_000_000) / 1_000),
        _ => return Err(ConvertError::UnknownTimeRepresentation("time")),
    };
    let text = if colval.typmod > 0 {
        format!(
            "{:02}:{:02}:{:02}.{:06}",
            (secs / SECS_PER_HOUR) % HOURS_PER_DAY,
            (secs / SECS_PER_MINUTE) % MINS_PER_HOUR,
            secs % SECS_PER_MINUTE,
            micros
        )
    } else {
        format!(
            "{:02}:{:02}:{:02}",
            (secs / SECS_PER_HOUR) % HOURS_PER_DAY,
            (secs / SECS_PER_MINUTE) % MINS_PER_HOUR,
            secs % SECS_PER_MINUTE
        )
    };
    Ok(quoted(text, add_quote))
}

fn interval_string(
    input: i64,
    colval: &ColumnValue,
    add_quote: bool,
    store: &RuleStore,
) -> Result<String, ConvertError> {
    let rep = effective_timerep(colval, store, TimeRep::MicroDuration, "interval")?;
    if rep != TimeRep::MicroDuration {
        return Err(ConvertError::UnknownTimeRepresentation("interval"));
    }
    let secs = input / 1_000_000;
    let micros = input % 1_000_000;

    use interval::{DAY, FULL_RANGE, HOUR, MINUTE, MONTH, SECOND, YEAR};
    let fields = interval::range_of(colval.typmod);
    let text = match fields {
        f if f == YEAR => format!("{} years", secs / SECS_PER_YEAR),
        f if f == MONTH => format!("{} months", secs / (SECS_PER_DAY * DAYS_PER_MONTH)),
        f if f == DAY => format!("{} days", secs / SECS_PER_DAY),
        f if f == HOUR => format!("{} hours", secs / SECS_PER_HOUR),
        f if f == MINUTE => format!("{} minutes", secs / SECS_PER_MINUTE),
        f if f == SECOND => format!("{} seconds", secs),
        f if f == YEAR | MONTH => format!(
            "{} years {} months",
            secs / SECS_PER_YEAR,
            (secs / (SECS_PER_DAY * DAYS_PER_MONTH)) % MONTHS_PER_YEAR
        ),
        f if f == DAY | HOUR => format!(
            "{} days {} hours",
            secs / SECS_PER_DAY,
            (secs / SECS_PER_HOUR) % HOURS_PER_DAY
        ),
        f if f == DAY | HOUR | MINUTE => format!(
            "{} days {:02}:{:02}",
            secs / SECS_PER_DAY,
            (secs / SECS_PER_HOUR) % HOURS_PER_DAY,
            (secs / SECS_PER_MINUTE) % MINS_PER_HOUR
        ),
        f if f == DAY | HOUR | MINUTE | SECOND => format!(
            "{} days {:02}:{:02}:{:02}.{:06}",
            secs / SECS_PER_DAY,
            (secs / SECS_PER_HOUR) % HOURS_PER_DAY,
            (secs / SECS_PER_MINUTE) % MINS_PER_HOUR,
            secs % SECS_PER_MINUTE,
            micros
        ),
        f if f == HOUR | MINUTE => format!(
            "{:02}:{:02}",
            secs / SECS_PER_HOUR,
            (secs / SECS_PER_MINUTE) % MINS_PER_HOUR
        ),
        f if f == HOUR | MINUTE | SECOND => format!(
            "{:02}:{:02}:{:02}.{:06}",
            secs / SECS_PER_HOUR,
            (secs / SECS_PER_MINUTE) % MINS_PER_HOUR,
            secs % SECS_PER_MINUTE,
            micros
        ),
        f if f == MINUTE | SECOND => format!(
            "{:02}:{:02}.{:06}",
            secs / SECS_PER_MINUTE,
            secs % SECS_PER_MINUTE,
            micros
        ),
        f if f == FULL_RANGE => format!(
            "{} years {} months {} days {:02}:{:02}:{:02}.{:06}",
            secs / SECS_PER_YEAR,
            (secs / (SECS_PER_DAY * DAYS_PER_MONTH)) % MONTHS_PER_YEAR,
            (secs / SECS_PER_DAY) % DAYS_PER_MONTH,
            (secs / SECS_PER_HOUR) % HOURS_PER_DAY,
            (secs / SECS_PER_MINUTE) % MINS_PER_HOUR,
            secs % SECS_PER_MINUTE,
            micros
        ),
        other => return Err(ConvertError::InvalidIntervalTypmod(other)),
    };
    Ok(if add_quote {
        escape_single_quote(&text, true)
    } else {
        text
    })
}

fn bit_from_base64(value: &str, add_quote: bool, typmod: i32) -> Result<String, ConvertError> {
    let mut bytes = decode_base64(value)?;
    // bit values arrive least-significant byte first
    bytes.reverse();
    let binary = to_binary_string(&bytes);
    let trimmed = trim_leading_zeros(&binary);
    let padded = if typmod > 0 {
        pad_zeros(trimmed, typmod as usize)
    } else {
        trimmed.to_string()
    };
    Ok(if add_quote {
        format!("b'{padded}'")
    } else {
        padded
    })
}

fn timestamp_from_string(value: &str, add_quote: bool) -> String {
    let mut text = value.replacen('T', " ", 1);
    if text.ends_with('Z') {
        text.truncate(text.len() - 1);
        text.push_str("+00:00");
    }
    quoted(text, add_quote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::ColumnValue;

    fn store() -> RuleStore {
        RuleStore::new(ConnectorKind::Mysql)
    }

    fn colval(category: TypeCategory, type_name: &str) -> ColumnValue {
        ColumnValue {
            name: "c".into(),
            remote_name: "c".into(),
            value: None,
            type_oid: 0,
            category,
            type_name: type_name.into(),
            typmod: -1,
            wire_type: DbzType::Bytes,
            time_rep: TimeRep::Undef,
            scale: 0,
            is_pk: false,
            position: 1,
        }
    }

    fn b64(bytes: &[u8]) -> String {
        B64.encode(bytes)
    }

    #[test]
    fn numeric_scale_insertion() {
        assert_eq!(apply_scale("123456", 2), "1234.56");
        assert_eq!(apply_scale("123", 3), "0.123");
        assert_eq!(apply_scale("1", 3), "0.001");
        assert_eq!(apply_scale("-123", 2), "-1.23");
        assert_eq!(apply_scale("42", 0), "42");
    }

    #[test]
    fn base64_numeric_with_scale() {
        let mut cv = colval(TypeCategory::Numeric, "numeric(10,2)");
        cv.value = Some(b64(&[0x01, 0xE2, 0x40]));
        cv.scale = 2;
        let out = process_value(&cv, true, "db.t", &store(), None)
            .unwrap()
            .unwrap();
        assert_eq!(out, "1234.56");
    }

    #[test]
    fn empty_bytes_decode_to_zero() {
        let mut cv = colval(TypeCategory::Numeric, "numeric");
        cv.value = Some(B64.encode([]));
        let out = process_value(&cv, true, "db.t", &store(), None)
            .unwrap()
            .unwrap();
        assert_eq!(out, "0");
    }

    #[test]
    fn money_forces_scale_four() {
        let mut cv = colval(TypeCategory::Numeric, "money");
        cv.value = Some(b64(&[0x01, 0xE2, 0x40])); // 123456
        cv.scale = 0;
        let out = process_value(&cv, true, "db.t", &store(), None)
            .unwrap()
            .unwrap();
        assert_eq!(out, "12.3456");
    }

    #[test]
    fn date_from_days_since_epoch() {
        let mut cv = colval(TypeCategory::DateTime, "date");
        // 19000 days = 0x4A38
        cv.value = Some(b64(&[0x4A, 0x38]));
        cv.time_rep = TimeRep::Date;
        let out = process_value(&cv, true, "db.t", &store(), None)
            .unwrap()
            .unwrap();
        assert_eq!(out, "'2022-01-08'");
    }

    #[test]
    fn timestamp_from_micros() {
        let mut cv = colval(TypeCategory::DateTime, "timestamp(6)");
        cv.value = Some("1640995200123456".into());
        cv.wire_type = DbzType::Int64;
        cv.time_rep = TimeRep::MicroTimestamp;
        cv.typmod = 6;
        let out = process_value(&cv, false, "db.t", &store(), None)
            .unwrap()
            .unwrap();
        assert_eq!(out, "2022-01-01 00:00:00.123456");
    }

    #[test]
    fn time_from_millis_since_midnight() {
        let mut cv = colval(TypeCategory::DateTime, "time");
        cv.value = Some("45296000".into()); // 12:34:56
        cv.wire_type = DbzType::Int64;
        cv.time_rep = TimeRep::Time;
        let out = process_value(&cv, false, "db.t", &store(), None)
            .unwrap()
            .unwrap();
        assert_eq!(out, "12:34:56");
    }

    #[test]
    fn undef_timerep_fails_for_datetime() {
        let mut cv = colval(TypeCategory::DateTime, "date");
        cv.value = Some("19000".into());
        cv.wire_type = DbzType::Int32;
        let err = process_value(&cv, true, "db.t", &store(), None).unwrap_err();
        assert!(matches!(err, ConvertError::UnknownTimeRepresentation(_)));
    }

    #[test]
    fn olr_infers_timerep_from_destination_type() {
        let olr_store = RuleStore::new(ConnectorKind::Olr);
        let mut cv = colval(TypeCategory::DateTime, "date");
        cv.value = Some("19000".into());
        cv.wire_type = DbzType::Int32;
        let out = process_value(&cv, true, "hr.emp", &olr_store, None)
            .unwrap()
            .unwrap();
        assert_eq!(out, "'2022-01-08'");
    }

    #[test]
    fn zoned_timestamp_string_normalisation() {
        let mut cv = colval(TypeCategory::DateTime, "timestamptz");
        cv.value = Some("2022-01-01T10:20:30Z".into());
        cv.wire_type = DbzType::String;
        cv.time_rep = TimeRep::ZonedTimestamp;
        let out = process_value(&cv, true, "db.t", &store(), None)
            .unwrap()
            .unwrap();
        assert_eq!(out, "'2022-01-01 10:20:30+00:00'");
    }

    #[test]
    fn bit_decode_reverses_trims_and_pads() {
        let mut cv = colval(TypeCategory::BitString, "bit(10)");
        cv.typmod = 10;
        // little-endian on the wire: 0b0000_0101, 0b0000_0010 -> 10 0000 0101
        cv.value = Some(b64(&[0x05, 0x02]));
        let out = process_value(&cv, true, "db.t", &store(), None)
            .unwrap()
            .unwrap();
        assert_eq!(out, "b'1000000101'");
    }

    #[test]
    fn bytea_decodes_to_escaped_hex() {
        let mut cv = colval(TypeCategory::User, "bytea");
        cv.value = Some(b64(&[0xDE, 0xAD, 0x01]));
        let out = process_value(&cv, true, "db.t", &store(), None)
            .unwrap()
            .unwrap();
        assert_eq!(out, "'\\xDEAD01'");
    }

    #[test]
    fn interval_day_to_second() {
        let mut cv = colval(TypeCategory::TimeSpan, "interval");
        // 2 days 03:04:05.000006
        let micros: i64 =
            ((2 * SECS_PER_DAY + 3 * SECS_PER_HOUR + 4 * 60 + 5) * 1_000_000) + 6;
        cv.value = Some(micros.to_string());
        cv.wire_type = DbzType::Int64;
        cv.time_rep = TimeRep::MicroDuration;
        cv.typmod = (interval::DAY | interval::HOUR | interval::MINUTE | interval::SECOND) << 16;
        let out = process_value(&cv, false, "db.t", &store(), None)
            .unwrap()
            .unwrap();
        assert_eq!(out, "2 days 03:04:05.000006");
    }

    #[test]
    fn string_values_are_escaped() {
        let mut cv = colval(TypeCategory::String, "text");
        cv.value = Some("it's".into());
        cv.wire_type = DbzType::String;
        let out = process_value(&cv, true, "db.t", &store(), None)
            .unwrap()
            .unwrap();
        assert_eq!(out, "'it''s'");
    }

    #[test]
    fn oracle_variable_scale_struct() {
        let olr_store = RuleStore::new(ConnectorKind::Oracle);
        let mut cv = colval(TypeCategory::Numeric, "numeric");
        cv.wire_type = DbzType::Struct;
        cv.time_rep = TimeRep::VariableScale;
        cv.value = Some(format!(
            "{{\"scale\":3,\"value\":\"{}\"}}",
            b64(&[0x05, 0x39])
        ));
        let out = process_value(&cv, true, "hr.emp", &olr_store, None)
            .unwrap()
            .unwrap();
        assert_eq!(out, "1.337");
    }

    #[test]
    fn geometry_transform_hook_receives_wkb_and_srid() {
        let mut store = store();
        store.insert_transform_rule("inventory.geom.g", "st_geomfromwkb(?,?)");
        let mut cv = colval(TypeCategory::String, "text");
        cv.name = "g".into();
        cv.remote_name = "g".into();
        cv.wire_type = DbzType::String;
        cv.value = Some("{\"wkb\":\"AQIA\",\"srid\":4326}".into());
        let out = process_value(
            &cv,
            true,
            "inventory.geom",
            &store,
            Some(&ExpressionSubstituter),
        )
        .unwrap()
        .unwrap();
        assert_eq!(out, "st_geomfromwkb('AQIA',4326)");
    }

    #[test]
    fn failed_transform_keeps_original() {
        struct Failing;
        impl TransformEvaluator for Failing {
            fn eval(&self, _: &str, _: Option<&str>, _: Option<&str>, _: &str) -> Result<String, String> {
                Err("boom".into())
            }
        }
        let mut store = store();
        store.insert_transform_rule("db.t.c", "upper(?)");
        let mut cv = colval(TypeCategory::String, "text");
        cv.wire_type = DbzType::String;
        cv.value = Some("keepme".into());
        let out = process_value(&cv, true, "db.t", &store, Some(&Failing))
            .unwrap()
            .unwrap();
        assert_eq!(out, "'keepme'");
    }

    #[test]
    fn null_and_empty_values_decode_to_none() {
        let mut cv = colval(TypeCategory::String, "text");
        cv.value = None;
        assert!(process_value(&cv, true, "db.t", &store(), None)
            .unwrap()
            .is_none());
        cv.value = Some(String::new());
        assert!(process_value(&cv, true, "db.t", &store(), None)
            .unwrap()
            .is_none());
    }
}
