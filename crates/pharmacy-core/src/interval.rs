//! Interval tests shared by every scheduling rule.
//!
//! All ranges are half-open: `[from, to)`. A slot ending at 12:30 and one
//! starting at 12:30 do not overlap. Closed date ranges (`[from, to]`, as
//! used by leave requests and contract validity) are converted with
//! [`day_span`] before comparison.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// `true` when `[a_from, a_to)` and `[b_from, b_to)` share at least one instant.
pub fn overlaps<T: PartialOrd>(a_from: T, a_to: T, b_from: T, b_to: T) -> bool {
    a_from < b_to && b_from < a_to
}

/// `true` when `point` lies in `[from, to)`.
pub fn contains<T: PartialOrd>(from: T, to: T, point: T) -> bool {
    from <= point && point < to
}

/// Half-open instant range covering the closed day range `[from, to]`.
pub fn day_span(from: NaiveDate, to: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    (start_of(from), end_of(Some(to)))
}

/// Like [`day_span`] but `to = None` means "open ended".
pub fn open_day_span(from: NaiveDate, to: Option<NaiveDate>) -> (NaiveDateTime, NaiveDateTime) {
    (start_of(from), end_of(to))
}

fn start_of(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

fn end_of(day: Option<NaiveDate>) -> NaiveDateTime {
    day.and_then(|d| d.succ_opt())
        .map(start_of)
        .unwrap_or(NaiveDateTime::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 6, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_abutting_slots_do_not_overlap() {
        assert!(!overlaps(at(9, 0), at(9, 15), at(9, 15), at(10, 0)));
        assert!(!overlaps(at(9, 15), at(10, 0), at(9, 0), at(9, 15)));
        assert!(!overlaps(at(12, 0), at(12, 30), at(12, 30), at(13, 0)));
    }

    #[test]
    fn test_partial_overlap() {
        assert!(overlaps(at(9, 0), at(9, 45), at(9, 15), at(10, 0)));
    }

    #[test]
    fn test_nested_overlap() {
        assert!(overlaps(at(9, 0), at(12, 0), at(10, 0), at(10, 30)));
        assert!(overlaps(at(10, 0), at(10, 30), at(9, 0), at(12, 0)));
    }

    #[test]
    fn test_contains_is_half_open() {
        assert!(contains(at(9, 0), at(10, 0), at(9, 0)));
        assert!(contains(at(9, 0), at(10, 0), at(9, 59)));
        assert!(!contains(at(9, 0), at(10, 0), at(10, 0)));
    }

    #[test]
    fn test_day_span_includes_last_day() {
        let from = NaiveDate::from_ymd_opt(2021, 6, 10).unwrap();
        let to = NaiveDate::from_ymd_opt(2021, 6, 24).unwrap();
        let (start, end) = day_span(from, to);

        let last_evening = NaiveDate::from_ymd_opt(2021, 6, 24)
            .unwrap()
            .and_hms_opt(23, 30, 0)
            .unwrap();
        let next_morning = NaiveDate::from_ymd_opt(2021, 6, 25)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        assert!(contains(start, end, last_evening));
        assert!(!contains(start, end, next_morning));
    }

    #[test]
    fn test_open_day_span_has_no_end() {
        let from = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let (_, end) = open_day_span(from, None);
        assert_eq!(end, NaiveDateTime::MAX);
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(a in 0i64..1000, alen in 1i64..200, b in 0i64..1000, blen in 1i64..200) {
            prop_assert_eq!(
                overlaps(a, a + alen, b, b + blen),
                overlaps(b, b + blen, a, a + alen)
            );
        }

        #[test]
        fn abutting_never_overlaps(a in 0i64..1000, alen in 1i64..200, blen in 1i64..200) {
            let b = a + alen;
            prop_assert!(!overlaps(a, b, b, b + blen));
        }

        #[test]
        fn interval_overlaps_itself(a in 0i64..1000, alen in 1i64..200) {
            prop_assert!(overlaps(a, a + alen, a, a + alen));
        }
    }
}
