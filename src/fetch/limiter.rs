// src/fetch/limiter.rs
// =============================================================================
// Dispatch throttling for the snapshot fetches.
//
// The Wayback Machine blocks clients that send more than roughly 28 requests
// in a 4 second window. We hand out dispatch permits in fixed windows:
//
//   permits 0..R     -> dispatched right away (window 1 starts)
//   permit  R        -> wait until window 1 is I old, then start window 2
//   permit  2R       -> wait until window 2 is I old, then start window 3
//   ...
//
// Only dispatch waits. Fetches already in flight keep running while the
// limiter sleeps, so a slow snapshot never holds up the next window.
//
// The limiter counts the permits it has granted, not positions in some outer
// loop, so callers that skip items cannot shift the window boundaries.
// =============================================================================

use std::num::NonZeroUsize;
use std::time::Duration;

use log::debug;
use tokio::time::{sleep_until, Instant};

/// Requests per window observed to be tolerated by web.archive.org
pub const DEFAULT_MAX_REQUESTS: usize = 28;

/// Window length paired with DEFAULT_MAX_REQUESTS
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(4);

/// How many requests may be dispatched per interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    max_requests: NonZeroUsize,
    interval: Duration,
}

impl RatePolicy {
    pub fn new(max_requests: NonZeroUsize, interval: Duration) -> Self {
        Self {
            max_requests,
            interval,
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests.get()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when dispatch must wait before granting the permit at `position`.
    pub fn is_batch_boundary(&self, position: usize) -> bool {
        position > 0 && position % self.max_requests() == 0
    }

    /// Lower bound on how long dispatching `requests` fetches takes.
    ///
    /// Every batch boundary costs at most one interval; the first batch is free.
    pub fn estimate(&self, requests: usize) -> Duration {
        if requests == 0 {
            return Duration::ZERO;
        }
        let boundaries = (requests - 1) / self.max_requests();
        self.interval
            .saturating_mul(u32::try_from(boundaries).unwrap_or(u32::MAX))
    }
}

impl Default for RatePolicy {
    fn default() -> Self {
        Self {
            max_requests: NonZeroUsize::new(DEFAULT_MAX_REQUESTS).unwrap_or(NonZeroUsize::MIN),
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Grants dispatch permits according to a RatePolicy.
#[derive(Debug)]
pub struct RateLimiter {
    policy: RatePolicy,
    granted: usize,
    window_start: Option<Instant>,
}

impl RateLimiter {
    pub fn new(policy: RatePolicy) -> Self {
        Self {
            policy,
            granted: 0,
            window_start: None,
        }
    }

    /// Number of permits handed out so far.
    pub fn granted(&self) -> usize {
        self.granted
    }

    /// Waits until one more dispatch is allowed and returns its position.
    pub async fn acquire(&mut self) -> usize {
        let position = self.granted;

        if self.policy.is_batch_boundary(position) {
            if let Some(start) = self.window_start {
                let resume_at = start + self.policy.interval();
                debug!(
                    "Dispatched {} request(s), pausing {:?} before the next batch",
                    position,
                    resume_at.saturating_duration_since(Instant::now())
                );
                sleep_until(resume_at).await;
            }
            self.window_start = Some(Instant::now());
        } else if self.window_start.is_none() {
            self.window_start = Some(Instant::now());
        }

        self.granted += 1;
        position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_requests: usize, interval: Duration) -> RatePolicy {
        RatePolicy::new(NonZeroUsize::new(max_requests).unwrap(), interval)
    }

    #[test]
    fn test_batch_boundaries() {
        let policy = policy(3, Duration::from_secs(1));
        let boundaries: Vec<usize> = (0..7).filter(|&i| policy.is_batch_boundary(i)).collect();
        assert_eq!(boundaries, vec![3, 6]);
    }

    #[test]
    fn test_default_policy_matches_wayback_ceiling() {
        let policy = RatePolicy::default();
        assert_eq!(policy.max_requests(), 28);
        assert_eq!(policy.interval(), Duration::from_secs(4));
    }

    #[test]
    fn test_estimate() {
        let policy = policy(28, Duration::from_secs(4));
        assert_eq!(policy.estimate(0), Duration::ZERO);
        assert_eq!(policy.estimate(28), Duration::ZERO);
        assert_eq!(policy.estimate(29), Duration::from_secs(4));
        assert_eq!(policy.estimate(280), Duration::from_secs(36));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_pauses_only_at_boundaries() {
        let interval = Duration::from_secs(4);
        let mut limiter = RateLimiter::new(policy(3, interval));
        let start = Instant::now();

        let mut offsets = Vec::new();
        for expected in 0..7 {
            let position = limiter.acquire().await;
            assert_eq!(position, expected);
            offsets.push(Instant::now() - start);
        }

        assert_eq!(
            offsets,
            vec![
                Duration::ZERO,
                Duration::ZERO,
                Duration::ZERO,
                interval,
                interval,
                interval,
                interval * 2,
            ]
        );
        assert_eq!(limiter.granted(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_batch_does_not_add_extra_pause() {
        let interval = Duration::from_secs(4);
        let mut limiter = RateLimiter::new(policy(2, interval));
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        // The caller spent longer than a whole window between permits
        tokio::time::sleep(Duration::from_secs(10)).await;
        limiter.acquire().await;

        assert_eq!(Instant::now() - start, Duration::from_secs(10));
    }
}
