use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One settlement attempt. After creation only `status`,
/// `verification_error` and the proof reference are ever mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub method_name: String,
    pub rail: RailKind,
    pub proof: PaymentProof,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    // Financial details, all in USD cents for consistent reporting.
    pub plan_price_cents: i64,
    pub token_discount_cents: i64,
    pub amount_paid_cents: i64,
    /// Tokens applied as a discount; debited from the ledger at settlement.
    pub tokens_debited: i64,
    pub verification_error: Option<String>,
    // Card-specific display fields, set at creation.
    pub cardholder_name: Option<String>,
    pub masked_card_number: Option<String>,
}

impl Payment {
    pub fn amount_paid_usd(&self) -> f64 {
        self.amount_paid_cents as f64 / 100.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

/// Settlement channel. Card and crypto verify inline with the request;
/// bank transfers are picked up by the reconciliation loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RailKind {
    Card,
    Crypto,
    Bank,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentProof {
    /// Crypto: the submitted transaction hash.
    pub hash: Option<String>,
    /// Bank: name of the uploaded proof-of-transfer file.
    pub file_name: Option<String>,
    /// Filled from the rail outcome on approval (gateway charge id,
    /// block-explorer hash, or bank reference).
    pub reference: Option<String>,
}
