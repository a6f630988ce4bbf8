//! Time and timestamp utilities

use chrono::Utc;

/// Default server-local to canonical correction (10 hours)
pub const DEFAULT_TZ_OFFSET_SECS: i64 = 10 * 3600;

/// Converts raw server-local epochs into the canonical epoch used for
/// match identity and duration math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeNormalizer {
    offset_secs: i64,
}

impl TimeNormalizer {
    /// Create a normalizer subtracting `offset_secs` from every raw epoch
    pub fn new(offset_secs: i64) -> Self {
        Self { offset_secs }
    }

    pub fn offset_secs(&self) -> i64 {
        self.offset_secs
    }

    /// Adjust a raw event epoch
    pub fn normalize(&self, raw_epoch: i64) -> i64 {
        raw_epoch - self.offset_secs
    }
}

impl Default for TimeNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TZ_OFFSET_SECS)
    }
}

/// Seconds from `start` to `end`, clamped to the `u32` range.
///
/// Both arguments must already be normalized.
pub fn elapsed_secs(start: i64, end: i64) -> u32 {
    u32::try_from(end.saturating_sub(start).max(0)).unwrap_or(u32::MAX)
}

/// Get current Unix timestamp in seconds
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_offset_is_ten_hours() {
        let normalizer = TimeNormalizer::default();
        assert_eq!(normalizer.offset_secs(), 36_000);
        assert_eq!(normalizer.normalize(100_000), 64_000);
    }

    #[test]
    fn test_configured_offset() {
        let normalizer = TimeNormalizer::new(-3600);
        assert_eq!(normalizer.normalize(0), 3600);
        assert_eq!(TimeNormalizer::new(0).normalize(42), 42);
    }

    #[test]
    fn test_elapsed_is_offset_independent() {
        let a = TimeNormalizer::new(0);
        let b = TimeNormalizer::new(36_000);
        assert_eq!(
            elapsed_secs(a.normalize(1_000), a.normalize(1_600)),
            elapsed_secs(b.normalize(1_000), b.normalize(1_600))
        );
    }

    #[test]
    fn test_elapsed_clamps() {
        assert_eq!(elapsed_secs(100, 50), 0);
        assert_eq!(elapsed_secs(0, i64::MAX), u32::MAX);
        assert_eq!(elapsed_secs(10, 70), 60);
    }
}
