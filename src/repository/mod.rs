use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::*;
use crate::error::Result;

pub mod credits_repository;
pub mod ledger_repository;
pub mod payment_method_repository;
pub mod payment_repository;
pub mod user_repository;

pub use credits_repository::SqliteCreditsRepository;
pub use ledger_repository::SqliteLedgerRepository;
pub use payment_method_repository::SqlitePaymentMethodRepository;
pub use payment_repository::SqlitePaymentRepository;
pub use user_repository::SqliteUserRepository;

/// Append-only store of token transactions. There are deliberately no
/// update or delete operations: balances are derived by summation and
/// corrections are compensating appends.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn append(&self, transaction: NewTokenTransaction) -> Result<TokenTransaction>;
    async fn balance_of(&self, user_id: Uuid) -> Result<i64>;
    /// Newest first.
    async fn transactions_of(&self, user_id: Uuid) -> Result<Vec<TokenTransaction>>;
    /// Looks up the transaction of a given kind tied to a payment, used for
    /// idempotent bonus issuance and reversal.
    async fn find_by_related_payment(
        &self,
        payment_id: Uuid,
        kind: TransactionKind,
    ) -> Result<Option<TokenTransaction>>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: Payment) -> Result<Payment>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>>;
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>>;
    async fn list(&self) -> Result<Vec<Payment>>;
    async fn list_pending_bank(&self) -> Result<Vec<Payment>>;
    /// Finds a different payment that already used this crypto hash and is
    /// not rejected. A hash from a rejected payment may be re-submitted.
    async fn find_duplicate_hash(&self, hash: &str, exclude_id: Uuid) -> Result<Option<Payment>>;
    async fn mark_approved(&self, id: Uuid, reference: &str) -> Result<Payment>;
    async fn mark_rejected(&self, id: Uuid, reason: &str) -> Result<Payment>;
    /// Returns the payment to `pending`, optionally recording an
    /// explanatory note in `verification_error`.
    async fn mark_pending(&self, id: Uuid, note: Option<&str>) -> Result<Payment>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, request: CreateUserRequest) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>>;
    async fn referrals_of(&self, user_id: Uuid) -> Result<Vec<User>>;
    /// The only mutation users support: plan and subscription window,
    /// written exclusively by the settlement coordinator and the passive
    /// expiration check.
    async fn set_plan(
        &self,
        id: Uuid,
        plan: Plan,
        subscription_start_date: Option<chrono::DateTime<chrono::Utc>>,
        plan_expiration_date: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<User>;
}

#[async_trait]
pub trait CreditsRepository: Send + Sync {
    /// Missing rows read as the free-tier allotment.
    async fn get(&self, user_id: Uuid) -> Result<Credits>;
    async fn set(&self, user_id: Uuid, credits: Credits) -> Result<Credits>;
}

#[async_trait]
pub trait PaymentMethodRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<PaymentMethodConfig>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentMethodConfig>>;
    async fn update(&self, id: Uuid, request: UpdatePaymentMethodRequest)
        -> Result<PaymentMethodConfig>;
    /// Seeds the default card/crypto/bank methods when the table is empty.
    async fn ensure_defaults(&self) -> Result<()>;
}
