//! Expiration policy for log points.
//!
//! User-supplied limits are relative (seconds until expiry, hits until
//! expiry) and may be absent or non-positive; stored limits are normalized
//! with `None` as the canonical "unlimited" value, and the time limit is
//! materialized as an absolute instant so agents never need the creation
//! time to evaluate it.

use chrono::{DateTime, Duration, Utc};

/// Normalize a raw time limit: absent or non-positive means unlimited.
pub fn normalize_expire_secs(raw: Option<i64>) -> Option<i64> {
    raw.filter(|secs| *secs > 0)
}

/// Normalize a raw hit-count limit: absent or non-positive means unlimited.
pub fn normalize_expire_count(raw: Option<i64>) -> Option<i64> {
    raw.filter(|count| *count > 0)
}

/// Compute the absolute expiry instant for a time limit.
///
/// Recomputed from the invocation instant on every operation that sets
/// `expire_secs`; an earlier expiry never survives an update that removes or
/// extends the limit.
pub fn compute_expire_timestamp(raw: Option<i64>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    normalize_expire_secs(raw).map(|secs| now + Duration::seconds(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_limits_pass_through() {
        assert_eq!(normalize_expire_secs(Some(60)), Some(60));
        assert_eq!(normalize_expire_count(Some(50)), Some(50));
    }

    #[test]
    fn test_non_positive_limits_are_unlimited() {
        assert_eq!(normalize_expire_secs(Some(0)), None);
        assert_eq!(normalize_expire_secs(Some(-1)), None);
        assert_eq!(normalize_expire_secs(None), None);
        assert_eq!(normalize_expire_count(Some(0)), None);
        assert_eq!(normalize_expire_count(Some(-30)), None);
        assert_eq!(normalize_expire_count(None), None);
    }

    #[test]
    fn test_expire_timestamp_is_now_plus_secs() {
        let now = Utc::now();
        assert_eq!(
            compute_expire_timestamp(Some(600), now),
            Some(now + Duration::seconds(600))
        );
    }

    #[test]
    fn test_expire_timestamp_absent_without_time_limit() {
        let now = Utc::now();
        assert_eq!(compute_expire_timestamp(None, now), None);
        assert_eq!(compute_expire_timestamp(Some(0), now), None);
        assert_eq!(compute_expire_timestamp(Some(-600), now), None);
    }
}
