//! Jittered backoff between retry attempts

use rand::Rng;
use std::time::Duration;

/// Uniform delay window drawn before every retry.
///
/// Concurrent items that fail together would otherwise retry together; a
/// random draw from a short window spreads them out while keeping the time a
/// retrying item holds its concurrency slot small.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterWindow {
    min: Duration,
    max: Duration,
}

impl JitterWindow {
    /// Create a window; bounds are swapped if given in the wrong order
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Window that never sleeps
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draw one delay uniformly from `[min, max]`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let low = self.min.as_micros() as u64;
        let high = self.max.as_micros() as u64;
        Duration::from_micros(rng.gen_range(low..=high))
    }
}

impl Default for JitterWindow {
    fn default() -> Self {
        Self::new(Duration::from_millis(25), Duration::from_millis(75))
    }
}
