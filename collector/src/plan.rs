use masp_api::consts::DEFAULT_FIRST_RUN_EPOCHS;
use masp_api::types::MaspEpoch;

/// Which epochs a run may collect besides those above the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPolicy {
    /// Epochs collected when the dataset is empty, counting back from the
    /// tip. Zero collects the whole history.
    pub first_run_epochs: u64,
    /// Epochs below the floor are never collected.
    pub floor_epoch: Option<MaspEpoch>,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            first_run_epochs: DEFAULT_FIRST_RUN_EPOCHS,
            floor_epoch: None,
        }
    }
}

/// Lists the epochs to collect, newest first.
///
/// Every epoch returned is strictly greater than `cursor`, at most
/// `tip_epoch`, and at least the policy floor. Without a cursor the
/// first-run policy bounds the backfill, unless a floor is set, which then
/// takes its place.
pub fn plan_epochs(tip_epoch: MaspEpoch, cursor: Option<MaspEpoch>, policy: &ScanPolicy) -> Vec<MaspEpoch> {
    let lowest = match cursor {
        Some(cursor) if cursor >= tip_epoch => return Vec::new(),
        Some(cursor) => cursor + 1,
        None => match (policy.floor_epoch, policy.first_run_epochs) {
            (Some(floor), _) => floor,
            (None, 0) => 0,
            (None, n) => tip_epoch.saturating_sub(n - 1),
        },
    };

    let lowest = lowest.max(policy.floor_epoch.unwrap_or(0));

    if lowest > tip_epoch {
        return Vec::new();
    }

    (lowest..=tip_epoch).rev().collect()
}

/// The first epoch a run would fetch given the cursor, or `None` when the
/// cursor is the largest representable epoch.
pub fn next_epoch(cursor: Option<MaspEpoch>) -> Option<MaspEpoch> {
    match cursor {
        Some(epoch) => epoch.checked_add(1),
        None => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resumes_after_cursor() {
        let policy = ScanPolicy::default();

        assert_eq!(plan_epochs(13, Some(10), &policy), vec![13, 12, 11]);
        assert_eq!(plan_epochs(11, Some(10), &policy), vec![11]);

        for cursor in 0..20 {
            let plan = plan_epochs(20, Some(cursor), &policy);
            let expected: Vec<_> = (cursor + 1..=20).rev().collect();
            assert_eq!(plan, expected);
        }
    }

    #[test]
    fn test_cursor_at_or_past_tip_is_empty() {
        let policy = ScanPolicy::default();

        assert!(plan_epochs(13, Some(13), &policy).is_empty());
        assert!(plan_epochs(13, Some(14), &policy).is_empty());
    }

    #[test]
    fn test_first_run_collects_latest_only() {
        assert_eq!(plan_epochs(5, None, &ScanPolicy::default()), vec![5]);
    }

    #[test]
    fn test_first_run_backfill() {
        let three = ScanPolicy { first_run_epochs: 3, floor_epoch: None };
        assert_eq!(plan_epochs(5, None, &three), vec![5, 4, 3]);

        let everything = ScanPolicy { first_run_epochs: 0, floor_epoch: None };
        assert_eq!(plan_epochs(2, None, &everything), vec![2, 1, 0]);

        let more_than_exists = ScanPolicy { first_run_epochs: 50, floor_epoch: None };
        assert_eq!(plan_epochs(1, None, &more_than_exists), vec![1, 0]);
    }

    #[test]
    fn test_floor_bounds_both_modes() {
        let floor = ScanPolicy { first_run_epochs: 1, floor_epoch: Some(8) };

        // Without a cursor the floor replaces the first-run policy
        assert_eq!(plan_epochs(10, None, &floor), vec![10, 9, 8]);

        // With a cursor the floor only ever raises the lower bound
        assert_eq!(plan_epochs(10, Some(3), &floor), vec![10, 9, 8]);
        assert_eq!(plan_epochs(10, Some(9), &floor), vec![10]);

        // A floor above the tip collects nothing
        let high = ScanPolicy { first_run_epochs: 1, floor_epoch: Some(12) };
        assert!(plan_epochs(10, None, &high).is_empty());
    }

    #[test]
    fn test_next_epoch() {
        assert_eq!(next_epoch(None), Some(0));
        assert_eq!(next_epoch(Some(41)), Some(42));
        assert_eq!(next_epoch(Some(u64::MAX)), None);
    }
}
