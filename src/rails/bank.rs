use rand::Rng;

use crate::{
    config::RailConfig,
    domain::Payment,
    rails::{RailOutcome, RailTiming},
};

const DECLINE_REASONS: [&str; 3] = [
    "Bank transfer rejected: Amount did not match invoice.",
    "Bank transfer rejected: Reference number not found.",
    "Unable to confirm deposit from provided proof.",
];

/// Asynchronous bank-transfer rail. Slower and flakier than the inline
/// rails; invoked from the reconciliation loop rather than request
/// handling, so its outcome is applied through the same settlement
/// primitive as every other rail.
pub struct BankRail {
    timing: RailTiming,
    decline_rate: f64,
}

impl BankRail {
    pub fn new(timing: RailTiming, decline_rate: f64) -> Self {
        Self { timing, decline_rate }
    }

    pub fn from_config(config: &RailConfig) -> Self {
        Self::new(RailTiming::from_config(config), config.decline_rate)
    }

    pub async fn verify(&self, payment: &Payment) -> RailOutcome {
        self.timing.simulate().await;

        if payment.proof.file_name.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return RailOutcome::declined(
                "Verification failed: No proof of payment was uploaded.",
            );
        }

        if rand::thread_rng().gen::<f64>() < self.decline_rate {
            let reason = DECLINE_REASONS[rand::thread_rng().gen_range(0..DECLINE_REASONS.len())];
            return RailOutcome::declined(reason);
        }

        RailOutcome::approved(format!("BANK_TXN_{}", chrono::Utc::now().timestamp_millis()))
    }
}
