//! Interval arithmetic shared by every conflict check.

use chrono::NaiveDate;

/// Whether the half-open intervals `[start_a, end_a)` and `[start_b, end_b)`
/// share any instant. Empty intervals never overlap anything, themselves
/// included, and back-to-back intervals do not overlap.
pub fn overlaps<T: PartialOrd>(start_a: T, end_a: T, start_b: T, end_b: T) -> bool {
    if start_a >= end_a || start_b >= end_b {
        return false;
    }
    start_a < end_b && start_b < end_a
}

/// Inclusive date ranges `[a_start, a_end]` and `[b_start, b_end]` share a day.
pub fn date_ranges_intersect(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}
