//! Decoding helpers shared by loaders that read textual columns.

use crate::error::SourceError;
use crate::relation::Relation;
use chrono::{NaiveDate, NaiveDateTime};

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse an optional timestamp column value.
///
/// Empty strings are treated as null. Date-only values map to midnight.
pub fn parse_timestamp(
    relation: Relation,
    column: &str,
    value: Option<&str>,
) -> Result<Option<NaiveDateTime>, SourceError> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(ts));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(Some)
        .ok_or_else(|| {
            SourceError::invalid_value(relation, column, format!("not a timestamp: '{}'", raw))
        })
}

/// Parse a timestamp column that must be present.
pub fn require_timestamp(
    relation: Relation,
    column: &str,
    value: Option<&str>,
) -> Result<NaiveDateTime, SourceError> {
    parse_timestamp(relation, column, value)?
        .ok_or_else(|| SourceError::invalid_value(relation, column, "missing timestamp"))
}

/// Check a review score is within 1-5.
pub fn review_score(value: Option<i64>) -> Result<Option<u8>, SourceError> {
    match value {
        None => Ok(None),
        Some(score @ 1..=5) => Ok(Some(score as u8)),
        Some(other) => Err(SourceError::invalid_value(
            Relation::Reviews,
            "review_score",
            format!("score {} outside 1-5", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_timestamp() {
        let ts = parse_timestamp(Relation::Orders, "ts", Some("2018-03-10 14:22:05"))
            .unwrap()
            .unwrap();
        assert_eq!(ts.to_string(), "2018-03-10 14:22:05");
    }

    #[test]
    fn test_parse_date_only() {
        let ts = parse_timestamp(Relation::Orders, "ts", Some("2018-03-10"))
            .unwrap()
            .unwrap();
        assert_eq!(ts.to_string(), "2018-03-10 00:00:00");
    }

    #[test]
    fn test_empty_is_null() {
        assert!(parse_timestamp(Relation::Orders, "ts", Some(""))
            .unwrap()
            .is_none());
        assert!(parse_timestamp(Relation::Orders, "ts", None).unwrap().is_none());
    }

    #[test]
    fn test_garbage_is_invalid() {
        let err = parse_timestamp(Relation::Orders, "order_purchase_timestamp", Some("soon"))
            .unwrap_err();
        assert!(err.to_string().contains("orders.order_purchase_timestamp"));
    }

    #[test]
    fn test_require_timestamp_missing() {
        assert!(require_timestamp(Relation::Orders, "ts", None).is_err());
    }

    #[test]
    fn test_review_score_bounds() {
        assert_eq!(review_score(Some(5)).unwrap(), Some(5));
        assert_eq!(review_score(None).unwrap(), None);
        assert!(review_score(Some(0)).is_err());
        assert!(review_score(Some(6)).is_err());
    }
}
