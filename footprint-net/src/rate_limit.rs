//! Per-domain rate limiting
//!
//! Each domain owns its own sliding window behind its own lock, so
//! unrelated domains never contend. Windows are pruned to the trailing hour
//! on every access.

use dashmap::DashMap;
use footprint_core::PolitenessConfig;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

#[derive(Debug, Default)]
struct RateWindow {
    /// Reserved send times, oldest first
    requests: VecDeque<Instant>,
    /// Latest reserved send slot
    last_slot: Option<Instant>,
}

impl RateWindow {
    fn prune(&mut self, now: Instant) {
        while let Some(front) = self.requests.front() {
            if now.saturating_duration_since(*front) >= HOUR {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }

    fn counts(&self, now: Instant) -> (usize, usize) {
        let minute = self
            .requests
            .iter()
            .rev()
            .take_while(|t| now.saturating_duration_since(**t) < MINUTE)
            .count();
        (minute, self.requests.len())
    }
}

/// A claimed send slot. Dropping it before [`Reservation::wait`] completes
/// releases the slot and its window entry.
#[derive(Debug)]
pub struct Reservation {
    window: Arc<Mutex<RateWindow>>,
    domain: String,
    slot: Instant,
    previous_slot: Option<Instant>,
    sent: bool,
}

impl Reservation {
    pub fn slot(&self) -> Instant {
        self.slot
    }

    /// Wait until the slot is due
    pub async fn wait(mut self) {
        let now = Instant::now();
        if self.slot > now {
            debug!("Waiting {:?} before next request to {}", self.slot - now, self.domain);
            tokio::time::sleep_until(self.slot).await;
        }
        self.sent = true;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.sent {
            return;
        }

        let mut window = self.window.lock();
        if let Some(pos) = window.requests.iter().rposition(|t| *t == self.slot) {
            window.requests.remove(pos);
        }
        if window.last_slot == Some(self.slot) {
            window.last_slot = self.previous_slot;
        }
        debug!("Released unused slot for {}", self.domain);
    }
}

/// Sliding-window rate limiter keyed by domain
#[derive(Debug)]
pub struct RateLimiter {
    max_per_minute: usize,
    max_per_hour: usize,
    min_delay: Duration,
    windows: DashMap<String, Arc<Mutex<RateWindow>>>,
}

impl RateLimiter {
    pub fn new(max_per_minute: usize, max_per_hour: usize, min_delay: Duration) -> Self {
        Self {
            max_per_minute,
            max_per_hour,
            min_delay,
            windows: DashMap::new(),
        }
    }

    pub fn from_config(config: &PolitenessConfig) -> Self {
        Self::new(
            config.max_requests_per_minute,
            config.max_requests_per_hour,
            Duration::from_secs_f64(config.min_request_delay_secs.max(0.0)),
        )
    }

    fn window(&self, domain: &str) -> Arc<Mutex<RateWindow>> {
        if let Some(window) = self.windows.get(domain) {
            return Arc::clone(&window);
        }
        Arc::clone(&self.windows.entry(domain.to_string()).or_default())
    }

    /// Whether another request to `domain` fits in both windows.
    ///
    /// Denial means "retry later", never an error. This is a read-only check;
    /// only [`RateLimiter::try_reserve`] claims a slot.
    pub fn allow(&self, domain: &str) -> bool {
        let window = self.window(domain);
        let mut window = window.lock();
        let now = Instant::now();
        window.prune(now);

        let (minute, hour) = window.counts(now);
        minute < self.max_per_minute && hour < self.max_per_hour
    }

    /// Check both windows and claim a send slot under one lock.
    ///
    /// The slot is spaced at least `spacing` after the previous one and counts
    /// toward the windows immediately, so concurrent callers can never push a
    /// window past its ceiling. Returns `None` when either window is full.
    pub fn try_reserve(&self, domain: &str, spacing: Duration) -> Option<Reservation> {
        let handle = self.window(domain);
        let mut window = handle.lock();
        let now = Instant::now();
        window.prune(now);

        let (minute, hour) = window.counts(now);
        if minute >= self.max_per_minute || hour >= self.max_per_hour {
            return None;
        }

        let previous_slot = window.last_slot;
        let slot = match previous_slot {
            Some(last) if last + spacing > now => last + spacing,
            _ => now,
        };
        window.last_slot = Some(slot);
        window.requests.push_back(slot);
        drop(window);

        Some(Reservation {
            window: handle,
            domain: domain.to_string(),
            slot,
            previous_slot,
            sent: false,
        })
    }

    /// Reserve a slot at the configured minimum delay and wait for it
    pub async fn record(&self, domain: &str) -> bool {
        self.record_with_spacing(domain, self.min_delay).await
    }

    /// Reserve a slot spaced at least `spacing` after the previous one and
    /// wait for it. Returns false when the windows are full.
    pub async fn record_with_spacing(&self, domain: &str, spacing: Duration) -> bool {
        match self.try_reserve(domain, spacing) {
            Some(reservation) => {
                reservation.wait().await;
                true
            }
            None => false,
        }
    }

    /// Requests recorded for `domain` in the trailing minute and hour
    pub fn request_counts(&self, domain: &str) -> (usize, usize) {
        let window = self.window(domain);
        let mut window = window.lock();
        let now = Instant::now();
        window.prune(now);
        window.counts(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_minute_window_denies_then_recovers() {
        let limiter = RateLimiter::new(3, 100, Duration::ZERO);

        for _ in 0..3 {
            assert!(limiter.allow("example.com"));
            limiter.record("example.com").await;
        }
        assert!(!limiter.allow("example.com"));
        assert!(limiter.allow("other.example"));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.allow("example.com"));
        assert_eq!(limiter.request_counts("example.com"), (0, 3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hour_window() {
        let limiter = RateLimiter::new(2, 3, Duration::ZERO);

        limiter.record("example.com").await;
        limiter.record("example.com").await;
        tokio::time::advance(Duration::from_secs(120)).await;
        limiter.record("example.com").await;

        assert!(!limiter.allow("example.com"));

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(limiter.allow("example.com"));
        assert_eq!(limiter.request_counts("example.com"), (0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_enforces_spacing() {
        let limiter = RateLimiter::new(30, 500, Duration::from_secs(2));
        let start = Instant::now();

        limiter.record("example.com").await;
        limiter.record("example.com").await;
        limiter.record("example.com").await;

        assert!(start.elapsed() >= Duration::from_secs(4));
        assert_eq!(limiter.request_counts("example.com").0, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spacing_is_per_domain() {
        let limiter = RateLimiter::new(30, 500, Duration::from_secs(5));
        let start = Instant::now();

        limiter.record("a.example").await;
        limiter.record("b.example").await;

        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_leaves_no_timestamp() {
        let limiter = Arc::new(RateLimiter::new(30, 500, Duration::from_secs(10)));
        limiter.record("example.com").await;

        let pending = tokio::time::timeout(
            Duration::from_secs(1),
            limiter.record_with_spacing("example.com", Duration::from_secs(10)),
        )
        .await;

        assert!(pending.is_err());
        assert_eq!(limiter.request_counts("example.com"), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_releases_spacing() {
        let limiter = RateLimiter::new(30, 500, Duration::from_secs(10));
        let start = Instant::now();
        limiter.record("example.com").await;

        let pending = tokio::time::timeout(
            Duration::from_secs(1),
            limiter.record_with_spacing("example.com", Duration::from_secs(10)),
        )
        .await;
        assert!(pending.is_err());

        // Next slot follows the first request, not the abandoned one
        assert!(limiter.record("example.com").await);
        assert!(start.elapsed() < Duration::from_secs(11));
        assert_eq!(limiter.request_counts("example.com"), (2, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reservations_never_exceed_ceiling() {
        let limiter = Arc::new(RateLimiter::new(2, 100, Duration::ZERO));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.record_with_spacing("example.com", Duration::ZERO).await
            }));
        }

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }

        assert_eq!(granted, 2);
        assert_eq!(limiter.request_counts("example.com"), (2, 2));
        assert!(!limiter.allow("example.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_reservation_counts_toward_window() {
        let limiter = RateLimiter::new(2, 100, Duration::from_secs(5));

        let first = limiter.try_reserve("example.com", Duration::from_secs(5)).unwrap();
        let second = limiter.try_reserve("example.com", Duration::from_secs(5)).unwrap();
        assert!(second.slot() >= first.slot() + Duration::from_secs(5));
        assert!(limiter.try_reserve("example.com", Duration::from_secs(5)).is_none());

        drop(second);
        assert!(limiter.allow("example.com"));
        assert_eq!(limiter.request_counts("example.com"), (1, 1));

        first.wait().await;
        assert_eq!(limiter.request_counts("example.com"), (1, 1));
    }
}
