//! Sort direction and comparable sort keys

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Sort direction for one column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(&self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Comparable key derived from a raw value
///
/// Numbers compare numerically, moments chronologically, booleans as 0/1.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SortKey {
    Integer(i64),
    Number(OrderedFloat<f64>),
    Moment(NaiveDateTime),
    Text(String),
}

/// Compare two optional keys in the given direction
///
/// Missing keys sort last in both directions.
pub fn compare_keys(a: Option<&SortKey>, b: Option<&SortKey>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match direction {
            SortDirection::Ascending => a.cmp(b),
            SortDirection::Descending => b.cmp(a),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_sort_last_both_ways() {
        let one = SortKey::Integer(1);
        assert_eq!(compare_keys(None, Some(&one), SortDirection::Ascending), Ordering::Greater);
        assert_eq!(compare_keys(None, Some(&one), SortDirection::Descending), Ordering::Greater);
        assert_eq!(compare_keys(None, None, SortDirection::Descending), Ordering::Equal);
    }

    #[test]
    fn test_direction_reverses_order() {
        let a = SortKey::Text("a".into());
        let b = SortKey::Text("b".into());
        assert_eq!(compare_keys(Some(&a), Some(&b), SortDirection::Ascending), Ordering::Less);
        assert_eq!(compare_keys(Some(&a), Some(&b), SortDirection::Descending), Ordering::Greater);
        assert_eq!(SortDirection::Ascending.reversed(), SortDirection::Descending);
    }
}
