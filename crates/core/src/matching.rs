//! Candidate matching: date-order gate, duration tolerance, resolution ranking.
//!
//! Everything here is pure and deterministic.

use std::cmp::Reverse;

use crate::metadata::DateParts;
use crate::searcher::decode::{extract_duration, extract_resolution, title_token};
use crate::searcher::RawResultRow;

/// Maximum allowed difference between a row's duration and the expected one.
pub const DURATION_TOLERANCE_SECS: u32 = 5;

/// True iff all three tokens occur in `text` and their first occurrences are
/// in strictly increasing position (year, then month, then day).
pub fn validate_date_order(text: &str, year: &str, month: &str, day: &str) -> bool {
    let (Some(y), Some(m), Some(d)) = (text.find(year), text.find(month), text.find(day)) else {
        return false;
    };
    y < m && m < d
}

/// Within tolerance, or no duration to compare.
fn duration_matches(actual: Option<u32>, expected: u32) -> bool {
    match actual {
        Some(actual) => actual.abs_diff(expected) <= DURATION_TOLERANCE_SECS,
        None => true,
    }
}

/// Keep rows whose title encodes the release date in order and, when a
/// duration hint is given, whose duration (if known) is within tolerance.
pub fn filter_candidates(
    rows: Vec<RawResultRow>,
    date: &DateParts,
    expected_duration_secs: Option<u32>,
) -> Vec<RawResultRow> {
    rows.into_iter()
        .filter(|row| validate_date_order(&title_token(row), &date.yy, &date.mm, &date.dd))
        .filter(|row| match expected_duration_secs {
            Some(expected) => duration_matches(extract_duration(row), expected),
            None => true,
        })
        .collect()
}

/// Stable sort, highest resolution class first. Unknown (0) sorts last.
pub fn rank_by_resolution(mut rows: Vec<RawResultRow>) -> Vec<RawResultRow> {
    rows.sort_by_cached_key(|row| Reverse(extract_resolution(row)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> RawResultRow {
        serde_json::from_value(value).unwrap()
    }

    fn date() -> DateParts {
        DateParts {
            yy: "24".to_string(),
            mm: "03".to_string(),
            dd: "15".to_string(),
        }
    }

    #[test]
    fn test_validate_date_order() {
        assert!(validate_date_order("ABC.24.03.15.mkv", "24", "03", "15"));
        assert!(!validate_date_order("ABC.03.24.15.mkv", "24", "03", "15"));
        assert!(!validate_date_order("ABC.24.03.mkv", "24", "03", "15"));
    }

    #[test]
    fn test_validate_date_order_uses_first_occurrence() {
        // "15" first appears before "24", so the order check fails.
        assert!(!validate_date_order("X15.24.03.15", "24", "03", "15"));
        // Equal tokens share a position and cannot be strictly increasing.
        assert!(!validate_date_order("A.11.11.11", "11", "11", "11"));
    }

    #[test]
    fn test_filter_candidates_duration_tolerance() {
        let rows = vec![
            row(json!({ "10": "S.24.03.15.A", "runtime": 1203 })),
            row(json!({ "10": "S.24.03.15.B", "runtime": 1210 })),
            row(json!({ "10": "S.24.03.15.C" })),
            row(json!({ "10": "S.24.03.15.D", "runtime": 1195 })),
        ];

        let kept = filter_candidates(rows, &date(), Some(1200));
        let titles: Vec<_> = kept.iter().map(title_token).collect();
        assert_eq!(titles, vec!["S.24.03.15.A", "S.24.03.15.C", "S.24.03.15.D"]);
    }

    #[test]
    fn test_filter_candidates_keeps_zero_duration_text() {
        let rows = vec![row(json!({ "10": "S.24.03.15.A", "14": "0m:0s" }))];

        let kept = filter_candidates(rows, &date(), Some(1200));
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_filter_candidates_without_duration_hint() {
        let rows = vec![
            row(json!({ "10": "S.24.03.15.A", "runtime": 9999 })),
            row(json!({ "10": "S.15.03.24.B" })),
            row(json!({})),
        ];

        let kept = filter_candidates(rows, &date(), None);
        assert_eq!(kept.len(), 1);
        assert_eq!(title_token(&kept[0]), "S.24.03.15.A");
    }

    #[test]
    fn test_rank_by_resolution_is_stable() {
        let rows = vec![
            row(json!({ "10": "a", "yres": 720 })),
            row(json!({ "10": "b", "yres": 1080 })),
            row(json!({ "10": "c" })),
            row(json!({ "10": "d", "yres": 1080 })),
        ];

        let ranked = rank_by_resolution(rows);
        let order: Vec<_> = ranked
            .iter()
            .map(|r| (extract_resolution(r), title_token(r)))
            .collect();
        assert_eq!(
            order,
            vec![
                (1080, "b".to_string()),
                (1080, "d".to_string()),
                (720, "a".to_string()),
                (0, "c".to_string()),
            ]
        );
    }
}
