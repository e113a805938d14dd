//! Sliding-window rate limiter over a log of admitted events.
//!
//! Every admitted event leaves its timestamp in the log. An event counts
//! against the quota while its age is strictly less than the window, and a
//! new event is admitted while the in-window count is at most the quantity
//! limit. The inclusive comparison lets `quantity_limit + 1` events through
//! one window before denial starts.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default number of events counted against the quota.
pub const DEFAULT_QUANTITY_LIMIT: usize = 3;
/// Default length of the trailing window.
pub const DEFAULT_TIME_WINDOW: Duration = Duration::from_secs(30);

/// Outcome of an atomic admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The event was admitted and recorded.
    Allowed,
    /// The quota is exhausted; `retry_after` is how long until it frees up.
    Denied { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// A single, process-wide sliding-window limiter.
///
/// The log sits behind a mutex so one instance can be shared across tasks.
/// `allow` and `record` are the split check/act pair; `try_acquire` does both
/// under one lock and prunes expired entries on the way.
pub struct RateLimiter {
    quantity_limit: usize,
    time_window: Duration,
    events: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(quantity_limit: usize, time_window: Duration) -> Self {
        Self {
            quantity_limit,
            time_window,
            events: Mutex::new(VecDeque::new()),
        }
    }

    pub fn quantity_limit(&self) -> usize {
        self.quantity_limit
    }

    pub fn time_window(&self) -> Duration {
        self.time_window
    }

    /// Whether a new event would be admitted at `now`. Does not touch the log.
    pub fn allow(&self, now: Instant) -> bool {
        let events = self.events.lock();
        self.count_in_window(&events, now) <= self.quantity_limit
    }

    /// Append `now` to the log unconditionally.
    pub fn record(&self, now: Instant) {
        self.events.lock().push_back(now);
    }

    /// Number of logged events still inside the window at `now`.
    pub fn in_window(&self, now: Instant) -> usize {
        let events = self.events.lock();
        self.count_in_window(&events, now)
    }

    /// Total number of entries in the log, expired or not.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Check and record in one step.
    ///
    /// Expired entries are dropped first, so a log fed only through this
    /// method never holds more than `quantity_limit + 1` entries. Callers
    /// should pass non-decreasing `now` values; an entry pruned at one instant
    /// is not restored for an earlier one.
    pub fn try_acquire(&self, now: Instant) -> Admission {
        let mut events = self.events.lock();
        let pruned = self.prune_locked(&mut events, now);
        if pruned > 0 {
            trace!(pruned, remaining = events.len(), "Pruned expired events");
        }

        let count = self.count_in_window(&events, now);
        if count <= self.quantity_limit {
            events.push_back(now);
            trace!(count = count + 1, limit = self.quantity_limit, "Event admitted");
            Admission::Allowed
        } else {
            let retry_after = self.retry_after_locked(&events, now, count);
            debug!(
                count,
                limit = self.quantity_limit,
                retry_after_secs = retry_after.as_secs_f64(),
                "Event denied"
            );
            Admission::Denied { retry_after }
        }
    }

    /// Drop every entry whose age at `now` is at least the window.
    /// Returns the number of entries removed.
    pub fn prune(&self, now: Instant) -> usize {
        let mut events = self.events.lock();
        self.prune_locked(&mut events, now)
    }

    /// Time until `allow(now + result)` turns true, zero if it already is.
    pub fn retry_after(&self, now: Instant) -> Duration {
        let events = self.events.lock();
        let count = self.count_in_window(&events, now);
        self.retry_after_locked(&events, now, count)
    }

    fn is_live(&self, entry: Instant, now: Instant) -> bool {
        now.saturating_duration_since(entry) < self.time_window
    }

    fn count_in_window(&self, events: &VecDeque<Instant>, now: Instant) -> usize {
        events.iter().rev().filter(|&&t| self.is_live(t, now)).count()
    }

    fn prune_locked(&self, events: &mut VecDeque<Instant>, now: Instant) -> usize {
        let before = events.len();
        events.retain(|&t| self.is_live(t, now));
        before - events.len()
    }

    fn retry_after_locked(&self, events: &VecDeque<Instant>, now: Instant, count: usize) -> Duration {
        if count <= self.quantity_limit {
            return Duration::ZERO;
        }

        // the excess-th earliest live entry has to age out before the count
        // drops back to the limit
        let excess = count - self.quantity_limit;
        let mut live: Vec<Instant> = events
            .iter()
            .copied()
            .filter(|&t| self.is_live(t, now))
            .collect();
        live.sort_unstable();

        let expiring = live[excess - 1];
        match expiring.checked_add(self.time_window) {
            Some(expires_at) => expires_at.saturating_duration_since(now),
            // window too long to represent as an instant
            None => self.time_window.saturating_sub(now.saturating_duration_since(expiring)),
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_QUANTITY_LIMIT, DEFAULT_TIME_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn at(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    #[test]
    fn test_empty_log_allows() {
        let limiter = RateLimiter::default();
        assert!(limiter.allow(Instant::now()));
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let base = Instant::now();
        let limiter = RateLimiter::new(3, Duration::from_secs(30));

        for i in 0..3 {
            limiter.record(at(base, i));
        }
        // 3 in window, 3 <= 3
        assert!(limiter.allow(at(base, 3)));

        limiter.record(at(base, 3));
        assert!(!limiter.allow(at(base, 4)));
    }

    #[test]
    fn test_allow_then_record_sequence() {
        let base = Instant::now();
        let limiter = RateLimiter::new(3, Duration::from_secs(30));

        for i in 0..4 {
            assert!(limiter.allow(at(base, i)), "call at t={} should pass", i);
            limiter.record(at(base, i));
        }
        assert!(!limiter.allow(at(base, 4)));
    }

    #[test]
    fn test_window_expiry_is_strict() {
        let base = Instant::now();
        let limiter = RateLimiter::new(0, Duration::from_secs(30));
        limiter.record(base);

        // age 29 still counts, age 30 does not
        assert_eq!(limiter.in_window(at(base, 29)), 1);
        assert_eq!(limiter.in_window(at(base, 30)), 0);

        limiter.record(base);
        assert!(!limiter.allow(at(base, 29)));
        assert!(limiter.allow(at(base, 30)));
    }

    #[test]
    fn test_expiry_scenario() {
        let base = Instant::now();
        let limiter = RateLimiter::new(3, Duration::from_secs(30));
        for i in 0..4 {
            limiter.record(at(base, i));
        }

        assert_eq!(limiter.in_window(at(base, 31)), 2);
        assert!(limiter.allow(at(base, 31)));

        assert_eq!(limiter.in_window(at(base, 35)), 0);
        assert!(limiter.allow(at(base, 35)));
    }

    #[test]
    fn test_record_always_grows_log() {
        let base = Instant::now();
        let limiter = RateLimiter::new(1, Duration::from_secs(30));

        for i in 0..10 {
            let before = limiter.len();
            let _ = limiter.allow(at(base, i));
            limiter.record(at(base, i));
            assert_eq!(limiter.len(), before + 1);
        }
        // record never prunes, even long after everything expired
        limiter.record(at(base, 1000));
        assert_eq!(limiter.len(), 11);
    }

    #[test]
    fn test_read_is_order_independent() {
        let base = Instant::now();
        let now = at(base, 40);

        let forward = RateLimiter::new(2, Duration::from_secs(30));
        let backward = RateLimiter::new(2, Duration::from_secs(30));
        let times = [5, 12, 20, 33, 39];

        for &t in &times {
            forward.record(at(base, t));
        }
        for &t in times.iter().rev() {
            backward.record(at(base, t));
        }

        assert_eq!(forward.in_window(now), backward.in_window(now));
        assert_eq!(forward.allow(now), backward.allow(now));
        assert_eq!(forward.retry_after(now), backward.retry_after(now));
    }

    #[test]
    fn test_try_acquire_admits_limit_plus_one() {
        let base = Instant::now();
        let limiter = RateLimiter::new(3, Duration::from_secs(30));

        for i in 0..4 {
            assert_eq!(limiter.try_acquire(at(base, i)), Admission::Allowed);
        }
        match limiter.try_acquire(at(base, 4)) {
            Admission::Denied { retry_after } => {
                // oldest entry (t=0) leaves the window at t=30
                assert_eq!(retry_after, Duration::from_secs(26));
            }
            Admission::Allowed => panic!("Expected denial"),
        }
        // a denial records nothing
        assert_eq!(limiter.len(), 4);

        assert!(limiter.try_acquire(at(base, 30)).is_allowed());
    }

    #[test]
    fn test_try_acquire_keeps_log_bounded() {
        let base = Instant::now();
        let limiter = RateLimiter::new(3, Duration::from_secs(10));

        for i in 0..1000 {
            let _ = limiter.try_acquire(at(base, i));
            assert!(limiter.len() <= 4);
        }
    }

    #[test]
    fn test_prune_drops_only_expired() {
        let base = Instant::now();
        let limiter = RateLimiter::new(3, Duration::from_secs(30));
        for i in [0, 1, 2, 25] {
            limiter.record(at(base, i));
        }

        assert_eq!(limiter.prune(at(base, 31)), 2);
        assert_eq!(limiter.len(), 2);
        assert_eq!(limiter.prune(at(base, 31)), 0);
    }

    #[test]
    fn test_retry_after_counts_excess() {
        let base = Instant::now();
        let limiter = RateLimiter::new(1, Duration::from_secs(30));
        for i in [0, 5, 10, 15] {
            limiter.record(at(base, i));
        }

        // 4 live, limit 1: the third entry (t=10) must expire, at t=40
        assert_eq!(limiter.retry_after(at(base, 16)), Duration::from_secs(24));
        assert!(limiter.allow(at(base, 40)));
        assert!(!limiter.allow(at(base, 39)));
    }

    #[test]
    fn test_retry_after_zero_when_allowed() {
        let base = Instant::now();
        let limiter = RateLimiter::new(3, Duration::from_secs(30));
        limiter.record(base);
        assert_eq!(limiter.retry_after(at(base, 1)), Duration::ZERO);
    }

    #[test]
    fn test_unrepresentable_window_denies_without_panic() {
        let now = Instant::now();
        let limiter = RateLimiter::new(0, Duration::MAX);

        assert!(limiter.try_acquire(now).is_allowed());
        assert_eq!(
            limiter.try_acquire(now),
            Admission::Denied { retry_after: Duration::MAX }
        );
        assert_eq!(limiter.retry_after(now + Duration::from_secs(5)), Duration::MAX - Duration::from_secs(5));
    }

    #[test]
    fn test_concurrent_try_acquire_never_overadmits() {
        let now = Instant::now();
        let limiter = Arc::new(RateLimiter::new(3, Duration::from_secs(30)));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || {
                    (0..10).filter(|_| limiter.try_acquire(now).is_allowed()).count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 4);
        assert_eq!(limiter.len(), 4);
    }
}
