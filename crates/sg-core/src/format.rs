//! Typed value formatting
//!
//! Maps a raw value and its declared column type to a display string, a
//! sort key and a filter bucket. Each concern has its own accessor.

use std::cmp::Ordering;

use chrono::{Datelike, NaiveDateTime, Timelike};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::order::SortKey;
use crate::schema::ValueConstraints;
use crate::value::{CellValue, DataType, Sentinel, BLANK_INT_FLAG};

/// Horizontal alignment of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Filter grouping key of a raw value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterBucket {
    Blank,
    Unknown,
    Invalid,
    Day { year: i32, month: u32, day: u32 },
    Moment { year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32 },
    Value(CellValue),
}

/// Stateless formatter for typed cell values
pub struct TypedValueFormatter;

impl TypedValueFormatter {
    /// Canonical display string
    pub fn display(value: &CellValue, dtype: DataType, constraints: &ValueConstraints) -> String {
        if dtype.is_temporal() {
            return Self::display_temporal(value, dtype, constraints);
        }
        if value.is_null() {
            return String::new();
        }
        match Self::check_bounds(value, dtype, constraints) {
            Some(BoundsOutcome::Invalid) => return Sentinel::Invalid.token().to_string(),
            Some(BoundsOutcome::Blank) => return String::new(),
            None => {}
        }

        match (dtype, value) {
            (DataType::Text, CellValue::Text(s)) => s.clone(),
            (DataType::Int, CellValue::Int(v)) if *v == BLANK_INT_FLAG => String::new(),
            (DataType::Int, CellValue::Int(v)) => format_grouped_int(*v),
            (DataType::Float, v) if v.as_f64().is_some() => {
                format_grouped_fixed(v.as_f64().unwrap_or_default(), 2)
            }
            (DataType::Currency, v) if v.as_f64().is_some() => {
                format!("$ {}", format_grouped_fixed(v.as_f64().unwrap_or_default(), 2))
            }
            (DataType::Bool, CellValue::Bool(b)) => {
                if *b { "TRUE".to_string() } else { "FALSE".to_string() }
            }
            (DataType::Status | DataType::Object, other) => {
                info!("No dedicated formatter for {} columns, using generic conversion", dtype);
                other.to_string()
            }
            (_, other) => {
                warn!("A {} value in a {} column is shown with generic conversion", other.kind(), dtype);
                other.to_string()
            }
        }
    }

    fn display_temporal(value: &CellValue, dtype: DataType, constraints: &ValueConstraints) -> String {
        if value.is_null() {
            return if constraints.required {
                Sentinel::Unknown.token().to_string()
            } else {
                String::new()
            };
        }
        if let Some(sentinel) = Sentinel::classify(value) {
            return sentinel.token().to_string();
        }
        let Some(moment) = as_moment(value) else {
            warn!("Unable to format {} value '{}' as a {}", value.kind(), value, dtype);
            return Sentinel::Unknown.token().to_string();
        };
        match Self::check_bounds(value, dtype, constraints) {
            Some(BoundsOutcome::Invalid) => Sentinel::Invalid.token().to_string(),
            Some(BoundsOutcome::Blank) => String::new(),
            None if dtype == DataType::Date => moment.format("%Y-%m-%d").to_string(),
            None => moment.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    fn check_bounds(value: &CellValue, dtype: DataType, constraints: &ValueConstraints) -> Option<BoundsOutcome> {
        if constraints.is_empty() {
            return None;
        }
        let key = Self::sort_key(value, dtype)?;
        let cmp = |bound: &Option<CellValue>| {
            bound
                .as_ref()
                .and_then(|b| Self::sort_key(b, dtype))
                .map(|b| key.cmp(&b))
        };
        if cmp(&constraints.min_valid) == Some(Ordering::Less) {
            return Some(BoundsOutcome::Invalid);
        }
        if cmp(&constraints.max_valid) == Some(Ordering::Greater) {
            return Some(BoundsOutcome::Invalid);
        }
        if cmp(&constraints.max_expected) == Some(Ordering::Greater) {
            return Some(BoundsOutcome::Blank);
        }
        None
    }

    /// Comparable key; `None` for missing values
    pub fn sort_key(value: &CellValue, dtype: DataType) -> Option<SortKey> {
        match value {
            CellValue::Null => None,
            CellValue::Int(v) if matches!(dtype, DataType::Float | DataType::Currency) => {
                Some(SortKey::Number(OrderedFloat(*v as f64)))
            }
            CellValue::Int(v) => Some(SortKey::Integer(*v)),
            CellValue::Float(v) => Some(SortKey::Number(*v)),
            CellValue::Bool(b) => Some(SortKey::Integer(i64::from(*b))),
            CellValue::Date(_) | CellValue::DateTime(_) => as_moment(value).map(SortKey::Moment),
            CellValue::Text(s) => Some(SortKey::Text(s.clone())),
        }
    }

    /// Grouping key used by the filter tree
    pub fn filter_bucket(value: &CellValue, dtype: DataType, time_resolution: bool) -> FilterBucket {
        if value.is_null() {
            return FilterBucket::Blank;
        }
        if !dtype.is_temporal() {
            return FilterBucket::Value(value.clone());
        }
        match Sentinel::classify(value) {
            Some(Sentinel::Unknown) => return FilterBucket::Unknown,
            Some(Sentinel::Invalid) => return FilterBucket::Invalid,
            None => {}
        }
        match as_moment(value) {
            Some(m) if dtype == DataType::DateTime && time_resolution => FilterBucket::Moment {
                year: m.year(),
                month: m.month(),
                day: m.day(),
                hour: m.hour(),
                minute: m.minute(),
                second: m.second(),
            },
            Some(m) => FilterBucket::Day {
                year: m.year(),
                month: m.month(),
                day: m.day(),
            },
            None => FilterBucket::Value(value.clone()),
        }
    }

    /// Upper-cased text that search patterns are matched against
    pub fn search_text(value: &CellValue, dtype: DataType, time_resolution: bool) -> String {
        match Self::filter_bucket(value, dtype, time_resolution) {
            FilterBucket::Blank => crate::consts::BLANKS_TEXT.to_uppercase(),
            FilterBucket::Unknown => crate::consts::UNKNOWN_TEXT.to_uppercase(),
            FilterBucket::Invalid => crate::consts::INVALID_TEXT.to_uppercase(),
            FilterBucket::Day { .. } => as_moment(value)
                .map(|m| m.format("%Y-%B-%d").to_string().to_uppercase())
                .unwrap_or_default(),
            FilterBucket::Moment { .. } => as_moment(value)
                .map(|m| m.format("%Y-%B-%d %H:%M:%S").to_string().to_uppercase())
                .unwrap_or_default(),
            FilterBucket::Value(v) => v.to_string().to_uppercase(),
        }
    }

    /// Cell alignment; every type is centred
    pub fn alignment(_dtype: DataType) -> Alignment {
        Alignment::Center
    }
}

enum BoundsOutcome {
    Invalid,
    Blank,
}

fn as_moment(value: &CellValue) -> Option<NaiveDateTime> {
    match value {
        CellValue::Date(d) => d.and_hms_opt(0, 0, 0),
        CellValue::DateTime(dt) => Some(*dt),
        _ => None,
    }
}

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234567` -> `1,234,567`
pub fn format_grouped_int(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    if value < 0 {
        format!("-{}", group_digits(&digits))
    } else {
        group_digits(&digits)
    }
}

/// `1234.5` with 2 decimals -> `1,234.50`
pub fn format_grouped_fixed(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    // values that round to zero print unsigned
    let rounds_to_zero = fixed.bytes().all(|b| b == b'0' || b == b'.');
    let sign = if value.is_sign_negative() && !rounds_to_zero { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, group_digits(int_part), frac),
        None => format!("{}{}", sign, group_digits(int_part)),
    }
}

/// Upper-case the first letter of every word and lower-case the rest
///
/// A word starts at any letter that follows a non-letter, so `"o'neil"`
/// becomes `"O'Neil"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}
