use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One immutable fact in the token ledger. A user's balance is always the
/// sum of `amount` over their transactions; there is no stored balance
/// anywhere. Corrections are made by appending a compensating transaction,
/// never by editing history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TransactionKind,
    /// Signed token amount; spends are negative.
    pub amount: i64,
    pub description: String,
    /// Structured reference to the payment that caused this transaction.
    /// Bonus and reversal idempotency checks query this field directly.
    pub related_payment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    ReferralSignupEarn,
    ReferralUpgradeEarn,
    /// Compensating entry that undoes a `ReferralUpgradeEarn` when an
    /// approved payment is reverted. At most one may exist per payment.
    ReferralUpgradeReversal,
    GoalBonusEarn,
    AdminGrant,
    SpendOnImage,
    SpendOnVideo,
    SpendOnUpgradeDiscount,
}

/// Input for `LedgerRepository::append`; id and timestamp are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewTokenTransaction {
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub amount: i64,
    pub description: String,
    pub related_payment_id: Option<Uuid>,
}
