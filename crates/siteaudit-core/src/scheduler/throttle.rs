//! Global rate throttle for API call starts.
//!
//! Sliding window: at most `capacity` starts within any `window`. Capacity is
//! `max(1, floor(rps))` and the window `capacity / rps` seconds, so integral
//! rates get exactly a one-second window and fractional rates below one
//! spread single calls further apart.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::{MAX_REQUESTS_PER_SECOND, MIN_REQUESTS_PER_SECOND};

#[derive(Debug)]
pub struct RateThrottle {
    capacity: usize,
    window: Duration,
    starts: Mutex<VecDeque<Instant>>,
}

impl RateThrottle {
    /// `BatchConfig::validate` keeps the rate within
    /// `MIN_REQUESTS_PER_SECOND..=MAX_REQUESTS_PER_SECOND`; out-of-range
    /// values are clamped and NaN falls back to 1/s.
    pub fn new(requests_per_second: f64) -> Self {
        let rps = if requests_per_second.is_nan() {
            1.0
        } else {
            requests_per_second.clamp(MIN_REQUESTS_PER_SECOND, MAX_REQUESTS_PER_SECOND)
        };
        let capacity = (rps.floor() as usize).max(1);
        let window = Duration::try_from_secs_f64(capacity as f64 / rps)
            .unwrap_or(Duration::from_secs(1));
        Self {
            capacity,
            window,
            starts: Mutex::new(VecDeque::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait for a free slot in the window and claim it.
    ///
    /// Waiters are served in arrival order: the lock is held across the
    /// sleep and tokio's mutex is fair.
    pub async fn acquire(&self) {
        let mut starts = self.starts.lock().await;
        loop {
            let now = Instant::now();
            while let Some(&front) = starts.front() {
                if now.duration_since(front) >= self.window {
                    starts.pop_front();
                } else {
                    break;
                }
            }
            if starts.len() < self.capacity {
                starts.push_back(now);
                return;
            }
            if let Some(&front) = starts.front() {
                tokio::time::sleep_until(front + self.window).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn start_times(throttle: Arc<RateThrottle>, n: usize) -> Vec<Instant> {
        let mut set = tokio::task::JoinSet::new();
        for _ in 0..n {
            let t = Arc::clone(&throttle);
            set.spawn(async move {
                t.acquire().await;
                Instant::now()
            });
        }
        let mut out = Vec::with_capacity(n);
        while let Some(res) = set.join_next().await {
            out.push(res.unwrap());
        }
        out.sort();
        out
    }

    fn max_in_any_window(starts: &[Instant], window: Duration) -> usize {
        starts
            .iter()
            .map(|&s| starts.iter().filter(|&&t| t >= s && t < s + window).count())
            .max()
            .unwrap_or(0)
    }

    #[tokio::test(start_paused = true)]
    async fn integral_rate_ceiling() {
        let throttle = Arc::new(RateThrottle::new(10.0));
        assert_eq!(throttle.capacity(), 10);
        assert_eq!(throttle.window(), Duration::from_secs(1));
        let base = Instant::now();
        let starts = start_times(throttle, 35).await;
        assert!(max_in_any_window(&starts, Duration::from_secs(1)) <= 10);
        // 35 starts need three full windows after the first burst.
        assert!(starts[34] - base >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn fractional_rate_spaces_single_calls() {
        let throttle = Arc::new(RateThrottle::new(0.5));
        assert_eq!(throttle.capacity(), 1);
        assert_eq!(throttle.window(), Duration::from_secs(2));
        let starts = start_times(throttle, 4).await;
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(2));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn idle_throttle_does_not_wait() {
        let throttle = RateThrottle::new(2.0);
        let base = Instant::now();
        throttle.acquire().await;
        throttle.acquire().await;
        assert_eq!(Instant::now(), base);
        throttle.acquire().await;
        assert_eq!(Instant::now() - base, Duration::from_secs(1));
    }

    #[test]
    fn invalid_rate_falls_back() {
        let t = RateThrottle::new(f64::NAN);
        assert_eq!(t.capacity(), 1);
        assert_eq!(t.window(), Duration::from_secs(1));
    }

    #[test]
    fn extreme_rates_are_clamped() {
        let fast = RateThrottle::new(1e30);
        assert_eq!(fast.capacity(), 1000);
        assert_eq!(fast.window(), Duration::from_secs(1));

        let slow = RateThrottle::new(1e-20);
        assert_eq!(slow.capacity(), 1);
        assert!((slow.window().as_secs_f64() - 1000.0).abs() < 1e-6);

        let negative = RateThrottle::new(-3.0);
        assert_eq!(negative.capacity(), 1);
        assert_eq!(negative.window(), slow.window());
    }
}
