use super::DataType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::cmp::Ordering;

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// A value the query engine parses out of item text and orders.
pub trait Scalar: Sized + Clone + Send + Sync + 'static {
    fn parse(raw: &str) -> Option<Self>;
    fn compare(&self, other: &Self) -> Ordering;

    fn equals(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Scalar for bool {
    fn parse(raw: &str) -> Option<Self> {
        parse_bool(raw)
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

macro_rules! integer_scalar {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                fn parse(raw: &str) -> Option<Self> {
                    raw.trim().parse().ok()
                }

                fn compare(&self, other: &Self) -> Ordering {
                    self.cmp(other)
                }
            }
        )*
    };
}

macro_rules! float_scalar {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                fn parse(raw: &str) -> Option<Self> {
                    raw.trim().parse().ok()
                }

                fn compare(&self, other: &Self) -> Ordering {
                    self.total_cmp(other)
                }
            }
        )*
    };
}

integer_scalar!(i32, i64);
float_scalar!(f32, f64);

impl Scalar for NaiveDate {
    fn parse(raw: &str) -> Option<Self> {
        parse_date(raw)
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl Scalar for NaiveDateTime {
    fn parse(raw: &str) -> Option<Self> {
        parse_datetime(raw)
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

/// Parse a boolean from `true/false`, `yes/no` or `1/0`, ignoring case.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Parse a calendar date. Date-time strings are truncated to their date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(raw).map(|dt| dt.date()))
}

/// Parse a date-time from RFC 3339, ISO-8601 without offset, or a bare date (midnight).
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Whether `raw` is a valid literal for the given type.
pub fn parses_as(data_type: DataType, raw: &str) -> bool {
    match data_type {
        DataType::Boolean => parse_bool(raw).is_some(),
        DataType::Integer => i32::parse(raw).is_some(),
        DataType::Long => i64::parse(raw).is_some(),
        DataType::Float => f32::parse(raw).is_some(),
        DataType::Double => f64::parse(raw).is_some(),
        DataType::Date => parse_date(raw).is_some(),
        DataType::DateTime => parse_datetime(raw).is_some(),
        DataType::Text => true,
    }
}

/// Numeric view of a value, used by statistics and key assignment.
pub fn parse_number(data_type: DataType, raw: &str) -> Option<f64> {
    match data_type {
        DataType::Integer => i32::parse(raw).map(f64::from),
        DataType::Long => i64::parse(raw).map(|v| v as f64),
        DataType::Float => f32::parse(raw).map(f64::from),
        DataType::Double => f64::parse(raw),
        _ => None,
    }
}

/// Equality under the given type; falls back to exact text when either side fails to parse
pub fn same_value(data_type: DataType, a: &str, b: &str) -> bool {
    fn typed<T: Scalar>(a: &str, b: &str) -> Option<bool> {
        Some(T::parse(a)?.equals(&T::parse(b)?))
    }

    let typed_eq = match data_type {
        DataType::Boolean => typed::<bool>(a, b),
        DataType::Integer => typed::<i32>(a, b),
        DataType::Long => typed::<i64>(a, b),
        DataType::Float => typed::<f32>(a, b),
        DataType::Double => typed::<f64>(a, b),
        DataType::Date => typed::<NaiveDate>(a, b),
        DataType::DateTime => typed::<NaiveDateTime>(a, b),
        DataType::Text => None,
    };
    typed_eq.unwrap_or_else(|| a == b)
}
