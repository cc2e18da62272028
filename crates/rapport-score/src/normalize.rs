//! Depth rebasing.
//!
//! Raw depths from the two extraction passes straddle zero. Rebasing shifts
//! every record by the same amount so the lowest depth becomes 1:
//!
//! ```text
//! depth' = depth - floor + 1
//! ```

use crate::neighborhood::SubgraphRecord;

/// Highest depth in `records`, or 0 when empty.
///
/// Applied to outgoing-pass records this is the baseline of the incoming pass.
#[must_use]
pub fn peak_depth(records: &[SubgraphRecord]) -> i64 {
    records.iter().map(|r| r.depth).max().unwrap_or(0)
}

/// Lowest depth in `records`, or 0 when empty.
#[must_use]
pub fn floor_depth(records: &[SubgraphRecord]) -> i64 {
    records.iter().map(|r| r.depth).min().unwrap_or(0)
}

/// Shift every record so that `floor` maps onto depth 1.
pub fn rebase(records: &mut [SubgraphRecord], floor: i64) {
    let shift = 1 - floor;
    for record in records {
        record.depth += shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapport_core::RatingScore;

    fn at(depth: i64) -> SubgraphRecord {
        SubgraphRecord {
            from_id: 1,
            to_id: 2,
            depth,
            score: RatingScore::new(3).expect("score"),
        }
    }

    #[test]
    fn empty_slices_default_to_zero() {
        assert_eq!(peak_depth(&[]), 0);
        assert_eq!(floor_depth(&[]), 0);
        let mut none: Vec<SubgraphRecord> = Vec::new();
        rebase(&mut none, 0);
        assert!(none.is_empty());
    }

    #[test]
    fn peak_and_floor() {
        let records = [at(-3), at(-1), at(0), at(2)];
        assert_eq!(peak_depth(&records), 2);
        assert_eq!(floor_depth(&records), -3);
    }

    #[test]
    fn rebase_moves_floor_to_one() {
        let mut records = vec![at(-2), at(-1), at(0), at(1)];
        let floor = floor_depth(&records);
        rebase(&mut records, floor);
        let depths: Vec<i64> = records.iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![1, 2, 3, 4]);
    }

    #[test]
    fn rebase_of_positive_floor_shifts_down() {
        let mut records = vec![at(3), at(5)];
        rebase(&mut records, 3);
        assert_eq!(records[0].depth, 1);
        assert_eq!(records[1].depth, 3);
    }
}
