//! MergePolicy - How a new value combines with the stored one

use serde::{Deserialize, Serialize};

/// Pure combination of an old stored value and an incoming value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// old + new (saturating)
    #[default]
    Sum,
    /// Larger of the two
    Max,
    /// Smaller of the two
    Min,
    /// Arithmetic mean of the two operands, truncated toward zero
    Average,
    /// New replaces old
    Overwrite,
}

impl MergePolicy {
    /// Combine `old` with `new`
    pub fn apply(self, old: i64, new: i64) -> i64 {
        match self {
            MergePolicy::Sum => old.saturating_add(new),
            MergePolicy::Max => old.max(new),
            MergePolicy::Min => old.min(new),
            // i128 keeps the intermediate sum from overflowing
            MergePolicy::Average => ((old as i128 + new as i128) / 2) as i64,
            MergePolicy::Overwrite => new,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MergePolicy::Sum => "sum",
            MergePolicy::Max => "max",
            MergePolicy::Min => "min",
            MergePolicy::Average => "average",
            MergePolicy::Overwrite => "overwrite",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_policies() {
        assert_eq!(MergePolicy::Sum.apply(4, 3), 7);
        assert_eq!(MergePolicy::Max.apply(4, 3), 4);
        assert_eq!(MergePolicy::Min.apply(4, 3), 3);
        assert_eq!(MergePolicy::Average.apply(4, 3), 3);
        assert_eq!(MergePolicy::Average.apply(-4, 1), -1);
        assert_eq!(MergePolicy::Overwrite.apply(4, 3), 3);
    }

    #[test]
    fn test_extremes_do_not_overflow() {
        assert_eq!(MergePolicy::Sum.apply(i64::MAX, 1), i64::MAX);
        assert_eq!(MergePolicy::Average.apply(i64::MAX, i64::MAX), i64::MAX);
    }

    #[test]
    fn test_policy_parses_snake_case() {
        let policy: MergePolicy = serde_json::from_str("\"overwrite\"").unwrap();
        assert_eq!(policy, MergePolicy::Overwrite);
    }

    proptest! {
        #[test]
        fn sum_is_associative_for_split_deltas(start in -1_000_000i64..1_000_000, a in -10_000i64..10_000, b in -10_000i64..10_000) {
            let split = MergePolicy::Sum.apply(MergePolicy::Sum.apply(start, a), b);
            let joined = MergePolicy::Sum.apply(start, a + b);
            prop_assert_eq!(split, joined);
        }

        #[test]
        fn average_lies_between_operands(a in any::<i64>(), b in any::<i64>()) {
            let avg = MergePolicy::Average.apply(a, b);
            prop_assert!(avg >= a.min(b) && avg <= a.max(b));
        }
    }
}
