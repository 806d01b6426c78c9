use rand::Rng;
use std::time::Duration;

use crate::config::RailConfig;

pub mod bank;
pub mod card;
pub mod crypto;
pub mod rates;

pub use bank::BankRail;
pub use card::{CardDetails, CardRail};
pub use crypto::CryptoRail;
pub use rates::{spawn_market_drift, CryptoRateFeed};

/// Result of one rail verification. Declines are normal, expected outcomes
/// carrying a human-readable reason; they are not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RailOutcome {
    Approved { reference: String },
    Declined { reason: String },
}

impl RailOutcome {
    pub fn approved(reference: impl Into<String>) -> Self {
        RailOutcome::Approved { reference: reference.into() }
    }

    pub fn declined(reason: impl Into<String>) -> Self {
        RailOutcome::Declined { reason: reason.into() }
    }
}

/// Simulated gateway latency. Zeroing both bounds disables the delay,
/// which is how tests run the rails.
#[derive(Debug, Clone)]
pub struct RailTiming {
    min_delay_ms: u64,
    max_delay_ms: u64,
}

impl RailTiming {
    pub fn new(min_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self { min_delay_ms, max_delay_ms }
    }

    pub fn from_config(config: &RailConfig) -> Self {
        Self::new(config.min_delay_ms, config.max_delay_ms)
    }

    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub async fn simulate(&self) {
        if self.max_delay_ms == 0 {
            return;
        }
        let delay = rand::thread_rng().gen_range(self.min_delay_ms..=self.max_delay_ms);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

pub(crate) fn random_reference_suffix(len: usize) -> String {
    use rand::distributions::Alphanumeric;
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
