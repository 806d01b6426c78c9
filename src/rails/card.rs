use chrono::{Datelike, Utc};
use rand::Rng;
use serde::Deserialize;
use validator::Validate;

use crate::{
    config::RailConfig,
    error::{AppError, Result},
    rails::{random_reference_suffix, RailOutcome, RailTiming},
};

/// Card numbers ending in this suffix always approve, mirroring the usual
/// gateway test card.
const TEST_CARD_SUFFIX: &str = "4242";

const DECLINE_REASONS: [&str; 3] = [
    "Card declined by the bank.",
    "Insufficient funds.",
    "Transaction blocked for suspected fraud.",
];

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CardDetails {
    #[validate(length(min = 1, message = "Cardholder name is required"))]
    pub cardholder_name: String,
    #[validate(length(min = 1, message = "Card number is required"))]
    pub card_number: String,
    /// `MM/YY`
    #[validate(length(min = 1, message = "Expiration date is required"))]
    pub expiry_date: String,
    #[validate(length(min = 1, message = "CVC is required"))]
    pub cvc: String,
}

impl CardDetails {
    pub fn normalized_number(&self) -> String {
        self.card_number.chars().filter(|c| !c.is_whitespace()).collect()
    }

    pub fn masked_number(&self) -> String {
        let digits = self.normalized_number();
        let last4 = if digits.len() >= 4 { &digits[digits.len() - 4..] } else { digits.as_str() };
        format!("**** **** **** {}", last4)
    }
}

/// Synchronous card gateway simulation. Structural problems with the input
/// are validation errors raised before any payment record exists; declines
/// are rail outcomes recorded on the payment.
pub struct CardRail {
    timing: RailTiming,
    decline_rate: f64,
}

impl CardRail {
    pub fn new(timing: RailTiming, decline_rate: f64) -> Self {
        Self { timing, decline_rate }
    }

    pub fn from_config(config: &RailConfig) -> Self {
        Self::new(RailTiming::from_config(config), config.decline_rate)
    }

    /// Field checks performed before a payment record is created. None of
    /// these mutate anything.
    pub fn validate_details(&self, details: &CardDetails) -> Result<()> {
        if details.cardholder_name.trim().is_empty()
            || details.card_number.trim().is_empty()
            || details.expiry_date.trim().is_empty()
            || details.cvc.trim().is_empty()
        {
            return Err(AppError::Validation("Incomplete card details provided.".to_string()));
        }

        let (month, year) = Self::parse_expiry(&details.expiry_date)?;
        let now = Utc::now();
        let current_month = now.month();
        let current_year = now.year() % 100;
        if year < current_year || (year == current_year && month < current_month) {
            return Err(AppError::Validation("Card has expired.".to_string()));
        }

        let cvc = details.cvc.trim();
        if cvc.len() < 3 || cvc.len() > 4 {
            return Err(AppError::Validation("Invalid CVC.".to_string()));
        }

        let number = details.normalized_number();
        if number.len() < 13 || number.len() > 16 || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::Validation("Invalid card number format.".to_string()));
        }

        Ok(())
    }

    fn parse_expiry(expiry: &str) -> Result<(u32, i32)> {
        let invalid = || AppError::Validation("Invalid expiration date format.".to_string());
        let mut parts = expiry.split('/');
        let month: u32 = parts
            .next()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(invalid)?;
        let year: i32 = parts
            .next()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(invalid)?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok((month, year))
    }

    /// Simulated gateway decision. Blocks the caller for the configured
    /// latency, exactly like a real synchronous charge call.
    pub async fn verify(&self, amount_paid_cents: i64, details: &CardDetails) -> RailOutcome {
        self.timing.simulate().await;

        let number = details.normalized_number();
        if !number.ends_with(TEST_CARD_SUFFIX)
            && rand::thread_rng().gen::<f64>() < self.decline_rate
        {
            let reason = DECLINE_REASONS[rand::thread_rng().gen_range(0..DECLINE_REASONS.len())];
            return RailOutcome::declined(reason);
        }

        if amount_paid_cents <= 0 {
            return RailOutcome::declined("Payment amount must be greater than zero.");
        }

        RailOutcome::approved(format!("ch_{}", random_reference_suffix(16)))
    }
}
