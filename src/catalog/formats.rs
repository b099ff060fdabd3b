//! Datetime format languages
//!
//! Two languages meet here:
//!
//! - **Legacy tokens** as found in statistical-package dictionaries
//!   (`DDMMYY8.`, `DATETIME18.`, `TIME8.`, ...), translated one-to-one to
//! - **Canonical formats** (`dd/MM/yy`, `yyyy-MM-dd HH:mm:ss.0`, ...), the
//!   language catalogs store. Canonical formats are compiled to `chrono`
//!   patterns for parsing.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::types::VariableType;
use crate::models::Value;

/// Canonical format for database dates
pub const DATABASE_DATE_FORMAT: &str = "yyyy-MM-dd";
/// Canonical format for database times
pub const DATABASE_TIME_FORMAT: &str = "HH:mm:ss";
/// Canonical format for database timestamps
pub const DATABASE_TIMESTAMP_FORMAT: &str = "yyyy-MM-dd HH:mm:ss.0";

/// Legacy tokens grouped by the canonical format they translate to
static LEGACY_FORMATS: &[(VariableType, &[&str], &str)] = &[
    // DD/MM/YY(YY)
    (VariableType::Date, &["DDMMYY8.", "DDMMYYS8.", "DD/MM/YY"], "dd/MM/yy"),
    (VariableType::Date, &["DDMMYY10.", "DDMMYYS10.", "DD/MM/YYYY"], "dd/MM/yyyy"),
    // DD.MM.YY(YY)
    (VariableType::Date, &["DDMMYYP8.", "DD.MM.YY", "EURDFDD8."], "dd.MM.yy"),
    (VariableType::Date, &["DDMMYYP10.", "DD.MM.YYYY", "EURDFDD10."], "dd.MM.yyyy"),
    // YY(YY)-MM-DD
    (VariableType::Date, &["YYMMDD8.", "YYMMDDD8.", "YY-MM-DD"], "yy-MM-dd"),
    (VariableType::Date, &["YYMMDD10.", "YYMMDDD10.", "YYYY-MM-DD"], "yyyy-MM-dd"),
    (VariableType::Date, &["YYMMDD"], "yyMMdd"),
    (VariableType::Date, &["DDMMYY"], "ddMMyy"),
    // MMMYY(YY)
    (VariableType::Date, &["MONYY5.", "MMMYY"], "MMMyy"),
    (VariableType::Date, &["MONYY7.", "MMMYYYY"], "MMMyyyy"),
    (VariableType::Date, &["YYYYMM", "YYMMN6."], "YYYYMM"),
    // DDMMMYY(YY):HH:MM:SS
    (VariableType::Timestamp, &["DATETIME18.", "DDMMYY:HH:MM:SS"], "ddMMMyy:HH:mm:ss"),
    (VariableType::Timestamp, &["DATETIME20.", "DDMMYYYY:HH:MM:SS"], "ddMMMyyyy:HH:mm:ss"),
    // ISO 8601
    (
        VariableType::Timestamp,
        &["IS8601DT.", "E8601DT.", "ISO-8601", "YYYY-MM-DDTHH:MM:SS"],
        "yyyy-MM-ddTHH:mm:ss",
    ),
    (VariableType::Time, &["TIME8.", "TIME8.2", "HH:MM:SS"], "hh:mm:ss"),
    (VariableType::Time, &["TIME5.", "HH:MM"], "hh:mm"),
];

// Token families that denote a date, time or timestamp even when the exact
// width is not one we translate
static TEMPORAL_FAMILY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(DDMMYY|MMDDYY|YYMMDD|YYMM|MONYY|DATETIME|DATE|DTDATE|TIME|TOD|HHMM|EURDF|IS8601|E8601|B8601|WEEKDATE|WORDDATE|NLDATE|JULIAN)",
    )
    .unwrap()
});

/// Temporal type a legacy token denotes, if it is one we translate
pub fn legacy_temporal_type(token: &str) -> Option<VariableType> {
    let token = token.trim().to_uppercase();
    LEGACY_FORMATS
        .iter()
        .find(|(_, tokens, _)| tokens.contains(&token.as_str()))
        .map(|(t, _, _)| *t)
}

/// Canonical format for a legacy token
pub fn canonical_format(token: &str) -> Option<&'static str> {
    let token = token.trim().to_uppercase();
    LEGACY_FORMATS
        .iter()
        .find(|(_, tokens, _)| tokens.contains(&token.as_str()))
        .map(|(_, _, canonical)| *canonical)
}

/// Check if a token belongs to a datetime family, translated or not
pub fn looks_temporal(token: &str) -> bool {
    let token = token.trim().to_uppercase();
    legacy_temporal_type(&token).is_some() || TEMPORAL_FAMILY_REGEX.is_match(&token)
}

/// A canonical format compiled to a `chrono` pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChronoPattern {
    /// `strftime`-style pattern
    pub pattern: String,
    /// Pattern contains a day-of-month field
    pub has_day: bool,
    /// Pattern contains a year or month field
    pub has_date: bool,
    /// Pattern contains an hour field
    pub has_time: bool,
}

/// Compile a canonical format to a `chrono` pattern
///
/// Recognized fields: `yyyy`/`YYYY`, `yy`, `MMM`, `MM`, `dd`, `HH`/`hh`, `mm`,
/// `ss`. Text between single quotes, and any other character, is literal.
pub fn compile_format(format: &str) -> ChronoPattern {
    const FIELDS: [(&str, &str); 10] = [
        ("yyyy", "%Y"),
        ("YYYY", "%Y"),
        ("MMM", "%b"),
        ("yy", "%y"),
        ("MM", "%m"),
        ("dd", "%d"),
        ("HH", "%H"),
        ("hh", "%H"),
        ("mm", "%M"),
        ("ss", "%S"),
    ];

    let mut compiled = ChronoPattern {
        pattern: String::new(),
        has_day: false,
        has_date: false,
        has_time: false,
    };
    let mut rest = format;
    let mut quoted = false;

    'outer: while let Some(c) = rest.chars().next() {
        if c == '\'' {
            if rest.starts_with("''") {
                compiled.pattern.push('\'');
                rest = &rest[2..];
            } else {
                quoted = !quoted;
                rest = &rest[1..];
            }
            continue;
        }
        if !quoted {
            for (field, spec) in FIELDS {
                if rest.starts_with(field) {
                    compiled.pattern.push_str(spec);
                    match field {
                        "dd" => compiled.has_day = true,
                        "HH" | "hh" => compiled.has_time = true,
                        "mm" | "ss" => {}
                        _ => compiled.has_date = true,
                    }
                    rest = &rest[field.len()..];
                    continue 'outer;
                }
            }
        }
        if c == '%' {
            compiled.pattern.push_str("%%");
        } else {
            compiled.pattern.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }

    compiled
}

/// Parse a raw text value as `variable_type` using a canonical format
///
/// Returns `None` when the text does not match the format.
pub fn parse_temporal(raw: &str, variable_type: VariableType, format: &str) -> Option<Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let compiled = compile_format(format);
    let mut patterns = vec![compiled.pattern.clone()];
    // Timestamps rendered without the trailing fraction still match
    if let Some(stripped) = compiled.pattern.strip_suffix(".0") {
        patterns.push(stripped.to_string());
    }

    patterns.iter().find_map(|pattern| match variable_type {
        VariableType::Date => parse_date(raw, pattern, &compiled).map(Value::Date),
        VariableType::Time => NaiveTime::parse_from_str(raw, pattern)
            .ok()
            .map(Value::Time),
        VariableType::Timestamp => parse_timestamp(raw, pattern, &compiled).map(Value::Timestamp),
        _ => None,
    })
}

fn parse_date(raw: &str, pattern: &str, compiled: &ChronoPattern) -> Option<NaiveDate> {
    if compiled.has_time {
        return NaiveDateTime::parse_from_str(raw, pattern)
            .ok()
            .map(|ts| ts.date());
    }
    if compiled.has_day {
        NaiveDate::parse_from_str(raw, pattern).ok()
    } else {
        // Month-level formats resolve to the first day of the month
        NaiveDate::parse_from_str(&format!("{}|01", raw), &format!("{}|%d", pattern)).ok()
    }
}

fn parse_timestamp(raw: &str, pattern: &str, compiled: &ChronoPattern) -> Option<NaiveDateTime> {
    if compiled.has_time {
        NaiveDateTime::parse_from_str(raw, pattern).ok()
    } else {
        parse_date(raw, pattern, compiled).and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}

/// Render a temporal value in a canonical format
///
/// Returns `None` for non-temporal values.
pub fn format_temporal(value: &Value, format: &str) -> Option<String> {
    let pattern = compile_format(format).pattern;
    match value {
        Value::Date(d) => Some(d.format(&pattern).to_string()),
        Value::Time(t) => Some(t.format(&pattern).to_string()),
        Value::Timestamp(ts) => Some(ts.format(&pattern).to_string()),
        _ => None,
    }
}

/// Bring one value to the canonical representation of `variable_type`
///
/// Values that cannot be represented become `Value::Null`.
pub fn canonicalize_value(value: Value, variable_type: VariableType, format: &str) -> Value {
    match (value, variable_type) {
        (Value::Null, _) => Value::Null,
        (Value::Text(s), t) => parse_temporal(&s, t, format).unwrap_or(Value::Null),
        (Value::Date(d), VariableType::Date) => Value::Date(d),
        (Value::Time(t), VariableType::Time) => Value::Time(t),
        (Value::Timestamp(ts), VariableType::Timestamp) => Value::Timestamp(ts),
        (Value::Timestamp(ts), VariableType::Date) => Value::Date(ts.date()),
        (Value::Timestamp(ts), VariableType::Time) => Value::Time(ts.time()),
        (Value::Date(d), VariableType::Timestamp) => d
            .and_hms_opt(0, 0, 0)
            .map(Value::Timestamp)
            .unwrap_or(Value::Null),
        (Value::Integer(n), t) => parse_temporal(&n.to_string(), t, format).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
