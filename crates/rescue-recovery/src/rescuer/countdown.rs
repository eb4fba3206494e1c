//! Local countdown until the attempt's delay period elapses.
//!
//! The countdown is anchored on remaining blocks times the block time and
//! decremented by local ticks between chain reads. It never drives a chain
//! read itself; a fresh block height re-anchors it, discarding any drift.

use rescue_core::BlockNumber;

/// What the countdown was last anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownAnchor {
    /// Block the attempt was created at
    pub created: BlockNumber,
    /// Delay period of the config
    pub delay_period: BlockNumber,
    /// Block height the remaining time was computed from
    pub height: BlockNumber,
}

impl CountdownAnchor {
    /// Blocks left at anchor time.
    pub fn remaining_blocks(&self) -> i64 {
        super::phase::remaining_blocks(self.created, self.delay_period, self.height)
    }
}

/// Seconds-resolution countdown kept in milliseconds.
#[derive(Debug, Clone)]
pub struct Countdown {
    block_time_ms: i64,
    anchor: Option<CountdownAnchor>,
    remaining_ms: Option<i64>,
}

impl Countdown {
    /// Countdown for a chain producing a block every `block_time_secs`.
    pub fn new(block_time_secs: u64) -> Self {
        let block_time_ms = i64::try_from(block_time_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
        Self {
            block_time_ms,
            anchor: None,
            remaining_ms: None,
        }
    }

    /// Current anchor.
    pub fn anchor(&self) -> Option<CountdownAnchor> {
        self.anchor
    }

    /// Re-anchor when `anchor` differs from the current one, or
    /// unconditionally when `fresh_height` is set.
    ///
    /// Returns whether the countdown was reset.
    pub fn sync(&mut self, anchor: Option<CountdownAnchor>, fresh_height: bool) -> bool {
        if anchor == self.anchor && !fresh_height {
            return false;
        }
        self.anchor = anchor;
        self.remaining_ms = anchor.map(|anchor| {
            anchor
                .remaining_blocks()
                .max(0)
                .saturating_mul(self.block_time_ms)
        });
        true
    }

    /// Advance local time by `elapsed_ms`.
    pub fn tick(&mut self, elapsed_ms: u64) {
        let elapsed = i64::try_from(elapsed_ms).unwrap_or(i64::MAX);
        if let Some(remaining) = self.remaining_ms.as_mut() {
            *remaining = remaining.saturating_sub(elapsed).max(0);
        }
    }

    /// Whole seconds left, rounded up. `None` until anchored.
    pub fn seconds(&self) -> Option<u64> {
        self.remaining_ms
            .map(|ms| u64::try_from(ms).unwrap_or(0).div_ceil(1000))
    }

    /// Forget the anchor.
    pub fn clear(&mut self) {
        self.anchor = None;
        self.remaining_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(created: BlockNumber, delay: BlockNumber, height: BlockNumber) -> CountdownAnchor {
        CountdownAnchor {
            created,
            delay_period: delay,
            height,
        }
    }

    #[test]
    fn test_unanchored_has_no_seconds() {
        let mut countdown = Countdown::new(6);
        countdown.tick(1000);
        assert_eq!(countdown.seconds(), None);
    }

    #[test]
    fn test_ticks_decrement_and_floor_at_zero() {
        let mut countdown = Countdown::new(6);
        assert!(countdown.sync(Some(anchor(100, 10, 108)), false));
        assert_eq!(countdown.seconds(), Some(12));

        countdown.tick(1000);
        assert_eq!(countdown.seconds(), Some(11));

        for _ in 0..20 {
            countdown.tick(1000);
        }
        assert_eq!(countdown.seconds(), Some(0));
    }

    #[test]
    fn test_fresh_height_discards_drift() {
        let mut countdown = Countdown::new(6);
        countdown.sync(Some(anchor(100, 10, 100)), false);
        for _ in 0..5 {
            countdown.tick(1000);
        }
        assert_eq!(countdown.seconds(), Some(55));

        // Same height read again: local drift is corrected back to the chain view.
        assert!(countdown.sync(Some(anchor(100, 10, 100)), true));
        assert_eq!(countdown.seconds(), Some(60));
    }

    #[test]
    fn test_unchanged_anchor_keeps_local_progress() {
        let mut countdown = Countdown::new(6);
        countdown.sync(Some(anchor(100, 10, 100)), false);
        countdown.tick(2000);
        assert!(!countdown.sync(Some(anchor(100, 10, 100)), false));
        assert_eq!(countdown.seconds(), Some(58));
    }

    #[test]
    fn test_expired_delay_is_zero() {
        let mut countdown = Countdown::new(6);
        countdown.sync(Some(anchor(100, 10, 500)), false);
        assert_eq!(countdown.seconds(), Some(0));
    }

    #[test]
    fn test_partial_seconds_round_up() {
        let mut countdown = Countdown::new(6);
        countdown.sync(Some(anchor(0, 1, 0)), false);
        countdown.tick(500);
        assert_eq!(countdown.seconds(), Some(6));
    }
}
