use rand::Rng;
use std::sync::Arc;

use crate::{
    domain::{Payment, PaymentMethodConfig},
    error::Result,
    rails::{CryptoRateFeed, RailOutcome, RailTiming},
    repository::PaymentRepository,
};

/// Marker a submitted hash must carry to be treated as a real transaction.
/// Anything else is rejected before the duplicate and amount checks run,
/// which keeps simulated traffic from ever approving itself.
const REAL_HASH_MARKER: &str = "0xreal-";
const MIN_HASH_LEN: usize = 25;

/// Fraction of the expected amount that must have been received. Allows 1%
/// slack for rate movement between quoting and sending.
const AMOUNT_TOLERANCE: f64 = 0.99;

/// Synchronous crypto rail: strict hash-format gate, duplicate-hash check
/// against every non-rejected payment, then a simulated explorer lookup
/// compared against the live exchange rate.
pub struct CryptoRail {
    timing: RailTiming,
    rates: Arc<CryptoRateFeed>,
    payments: Arc<dyn PaymentRepository>,
}

impl CryptoRail {
    pub fn new(
        timing: RailTiming,
        rates: Arc<CryptoRateFeed>,
        payments: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self { timing, rates, payments }
    }

    pub async fn verify(
        &self,
        payment: &Payment,
        method: &PaymentMethodConfig,
    ) -> Result<RailOutcome> {
        let hash = match payment.proof.hash.as_deref().map(str::trim) {
            Some(hash) if !hash.is_empty() => hash,
            _ => {
                return Ok(RailOutcome::declined(
                    "This payment is not a verifiable crypto transaction.",
                ))
            }
        };

        if !hash.to_lowercase().starts_with(REAL_HASH_MARKER) || hash.len() < MIN_HASH_LEN {
            return Ok(RailOutcome::declined(
                "Invalid transaction format. Please provide a real transaction hash \
                 from a blockchain explorer.",
            ));
        }

        if let Some(duplicate) = self.payments.find_duplicate_hash(hash, payment.id).await? {
            let id_str = duplicate.id.to_string();
            let suffix = &id_str[id_str.len() - 6..];
            return Ok(RailOutcome::declined(format!(
                "Duplicate transaction hash. This hash was already used for payment ID {}.",
                suffix
            )));
        }

        let address = match method.address.as_deref() {
            Some(address) if !address.is_empty() => address,
            _ => {
                return Ok(RailOutcome::declined(format!(
                    "No recipient address is configured for {}.",
                    method.name
                )))
            }
        };

        let symbol = match method.crypto_symbol.as_deref() {
            Some(symbol) => symbol,
            None => {
                return Ok(RailOutcome::declined(format!(
                    "Verification for {} is not supported.",
                    method.name
                )))
            }
        };

        let expected = match self.rates.convert_usd(payment.amount_paid_usd(), symbol) {
            Some(expected) => expected,
            None => {
                return Ok(RailOutcome::declined(format!(
                    "Could not determine crypto conversion rate for {}.",
                    symbol
                )))
            }
        };

        let record = self.explorer_lookup(address, expected).await;

        if record.recipient != address.to_lowercase() {
            return Ok(RailOutcome::declined(
                "Recipient mismatch. Funds were sent to an incorrect address.",
            ));
        }

        if record.amount < expected * AMOUNT_TOLERANCE {
            let decimals = CryptoRateFeed::decimals(symbol) as usize;
            return Ok(RailOutcome::declined(format!(
                "Underpayment detected. Expected ~{:.dec$} {}, but transaction was for {:.dec$} {}.",
                expected,
                symbol,
                record.amount,
                symbol,
                dec = decimals
            )));
        }

        // The hash itself is the block-explorer reference.
        Ok(RailOutcome::approved(hash))
    }

    /// Simulated chain lookup. The recipient always matches the configured
    /// address and the amount lands at or slightly above the expected
    /// figure, so well-formed submissions verify.
    async fn explorer_lookup(&self, address: &str, expected: f64) -> ExplorerRecord {
        self.timing.simulate().await;
        ExplorerRecord {
            recipient: address.to_lowercase(),
            amount: expected * (1.0 + rand::thread_rng().gen::<f64>() * 0.01),
        }
    }
}

struct ExplorerRecord {
    recipient: String,
    amount: f64,
}
