//! Backoff policy for provider retries. The shape mirrors a widely used
//! distributed-systems retry crate: a strategy enum plus a single
//! `calculate_delay` function, rather than a trait per strategy.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    Exponential,
    Linear,
    Constant,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub strategy: BackoffStrategy,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Exponential,
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            jitter: 0.3,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self { max_attempts, ..Self::default() }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = match self.strategy {
            BackoffStrategy::Exponential => {
                let pow = attempt.saturating_sub(1).min(16);
                self.base_delay.saturating_mul(2u32.saturating_pow(pow))
            }
            BackoffStrategy::Linear => self.base_delay.saturating_mul(attempt.max(1)),
            BackoffStrategy::Constant => self.base_delay,
        };
        let capped = delay.min(self.max_delay);
        if self.jitter > 0.0 {
            apply_jitter(capped, self.jitter)
        } else {
            capped
        }
    }
}

fn apply_jitter(delay: Duration, jitter: f64) -> Duration {
    let mut rng = rand::thread_rng();
    let factor = 1.0 - jitter + rng.gen::<f64>() * (2.0 * jitter);
    Duration::from_secs_f64((delay.as_secs_f64() * factor).max(0.0))
}
