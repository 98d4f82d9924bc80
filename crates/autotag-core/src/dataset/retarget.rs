//! Debouncing of batch retarget passes.
//!
//! Editing the target width and height fires one change per keystroke. Each
//! change would re-derive every crop in the dataset, so changes are held
//! until the input has been quiet for a while and only the latest target is
//! applied. Timestamps are supplied by the caller from a monotonic clock,
//! which keeps the debouncer deterministic and usable without a timer.

use std::time::Duration;

use crate::crop::TargetSize;

/// Quiet period before a pending target is released.
pub const DEFAULT_RETARGET_DELAY: Duration = Duration::from_millis(300);

/// Coalesces rapid target changes into a single retarget pass.
///
/// Latest value wins: pushing a new target replaces the pending one and
/// restarts the quiet period.
#[derive(Debug, Clone)]
pub struct RetargetDebouncer {
    delay: Duration,
    pending: Option<Pending>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    target: TargetSize,
    last_change: Duration,
}

impl Default for RetargetDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_RETARGET_DELAY)
    }
}

impl RetargetDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a target change observed at `now`.
    pub fn push(&mut self, target: TargetSize, now: Duration) {
        self.pending = Some(Pending {
            target,
            last_change: now,
        });
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time at which the pending target becomes due, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.pending.map(|p| p.last_change.saturating_add(self.delay))
    }

    /// Release the pending target if the quiet period has elapsed by `now`.
    pub fn poll(&mut self, now: Duration) -> Option<TargetSize> {
        let due = self.deadline()?;
        if now >= due {
            self.pending.take().map(|p| p.target)
        } else {
            None
        }
    }

    /// Release the pending target immediately.
    pub fn flush(&mut self) -> Option<TargetSize> {
        self.pending.take().map(|p| p.target)
    }

    /// Drop the pending target without applying it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_nothing_pending() {
        let mut debouncer = RetargetDebouncer::default();
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(ms(10_000)), None);
        assert_eq!(debouncer.flush(), None);
    }

    #[test]
    fn test_releases_after_quiet_period() {
        let mut debouncer = RetargetDebouncer::default();
        debouncer.push(TargetSize::exact(512, 512), ms(1000));

        assert_eq!(debouncer.poll(ms(1299)), None);
        assert_eq!(debouncer.poll(ms(1300)), Some(TargetSize::exact(512, 512)));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(ms(2000)), None);
    }

    #[test]
    fn test_rapid_edits_coalesce_latest_wins() {
        let mut debouncer = RetargetDebouncer::default();
        // Typing "1024" into the width field
        for (i, width) in [1u32, 10, 102, 1024].into_iter().enumerate() {
            debouncer.push(TargetSize::new(Some(width), Some(1024)), ms(i as u64 * 100));
            assert_eq!(debouncer.poll(ms(i as u64 * 100 + 50)), None);
        }

        assert_eq!(debouncer.deadline(), Some(ms(600)));
        assert_eq!(debouncer.poll(ms(600)), Some(TargetSize::exact(1024, 1024)));
    }

    #[test]
    fn test_flush_and_cancel() {
        let mut debouncer = RetargetDebouncer::new(ms(50));
        debouncer.push(TargetSize::default(), ms(0));
        assert_eq!(debouncer.flush(), Some(TargetSize::default()));

        debouncer.push(TargetSize::exact(1, 1), ms(0));
        debouncer.cancel();
        assert_eq!(debouncer.poll(ms(1000)), None);
    }
}
