use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    notify::{ChangeBus, ChangeEvent},
    rails::{random_reference_suffix, RailOutcome},
    repository::{LedgerRepository, PaymentRepository, UserRepository},
    service::{Reconciler, SettlementService},
};

const DEFAULT_REVERT_REASON: &str = "Payment reverted by administrator.";
const DEFAULT_REJECT_REASON: &str = "Manually rejected by admin.";
const REQUEUE_NOTE: &str = "Marked as pending for re-validation by admin.";

/// Manual override actions. Approve and reject re-enter the same
/// settlement primitives the rails use; requeue and revalidate only move a
/// record back to pending; delete is restricted to pending records to
/// preserve the audit trail.
pub struct AdminService {
    payments: Arc<dyn PaymentRepository>,
    users: Arc<dyn UserRepository>,
    ledger: Arc<dyn LedgerRepository>,
    settlement: Arc<SettlementService>,
    reconciler: Arc<Reconciler>,
    bus: ChangeBus,
}

impl AdminService {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        users: Arc<dyn UserRepository>,
        ledger: Arc<dyn LedgerRepository>,
        settlement: Arc<SettlementService>,
        reconciler: Arc<Reconciler>,
        bus: ChangeBus,
    ) -> Self {
        Self { payments, users, ledger, settlement, reconciler, bus }
    }

    async fn require_payment(&self, id: Uuid) -> Result<Payment> {
        self.payments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))
    }

    /// Trusted manual approval of a pending payment, bypassing rail
    /// verification.
    pub async fn approve(&self, payment_id: Uuid) -> Result<Payment> {
        let payment = self.require_payment(payment_id).await?;
        if payment.status != PaymentStatus::Pending {
            return Err(AppError::Conflict(
                "Only pending payments can be approved".to_string(),
            ));
        }

        let reference = format!("MANUAL_{}", random_reference_suffix(10));
        self.settlement
            .settle(&payment, RailOutcome::approved(reference))
            .await
    }

    /// Rejects a payment. Rejecting an approved payment on a Pro user is a
    /// full reversal: downgrade, token refund and referral-bonus reversal
    /// before the status change.
    pub async fn reject(&self, payment_id: Uuid, reason: Option<String>) -> Result<Payment> {
        let payment = self.require_payment(payment_id).await?;
        if payment.status == PaymentStatus::Rejected {
            return Err(AppError::Conflict("Payment is already rejected".to_string()));
        }

        let user = self
            .users
            .find_by_id(payment.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if payment.status == PaymentStatus::Approved && user.plan == Plan::Pro {
            let reason = reason.unwrap_or_else(|| DEFAULT_REVERT_REASON.to_string());
            return self.settlement.reverse_approval(&payment, &user, &reason).await;
        }

        let reason = reason.unwrap_or_else(|| DEFAULT_REJECT_REASON.to_string());
        self.settlement
            .settle(&payment, RailOutcome::declined(reason))
            .await
    }

    /// Flags an approved payment for re-review. Does not touch the ledger
    /// or the user's plan.
    pub async fn requeue(&self, payment_id: Uuid) -> Result<Payment> {
        let payment = self.require_payment(payment_id).await?;
        if payment.status != PaymentStatus::Approved {
            return Err(AppError::Conflict(
                "Only approved payments can be re-queued".to_string(),
            ));
        }

        let updated = self.payments.mark_pending(payment_id, Some(REQUEUE_NOTE)).await?;
        self.bus.publish(ChangeEvent::PaymentChanged { payment_id });
        Ok(updated)
    }

    /// Clears a rejection and returns the payment to pending. Bank
    /// payments are handed straight to the reconciliation loop's manual
    /// trigger, which shares the in-flight guard with the periodic scan.
    pub async fn revalidate(&self, payment_id: Uuid) -> Result<Payment> {
        let payment = self.require_payment(payment_id).await?;
        if payment.status != PaymentStatus::Rejected {
            return Err(AppError::Conflict(
                "Only rejected payments can be re-validated".to_string(),
            ));
        }

        let updated = self.payments.mark_pending(payment_id, None).await?;
        self.bus.publish(ChangeEvent::PaymentChanged { payment_id });

        if updated.rail == RailKind::Bank {
            self.reconciler.verify_now(payment_id);
        }

        Ok(updated)
    }

    /// Permanently removes a pending payment. Approved and rejected
    /// records cannot be deleted.
    pub async fn delete(&self, payment_id: Uuid) -> Result<()> {
        let payment = self.require_payment(payment_id).await?;
        if payment.status != PaymentStatus::Pending {
            return Err(AppError::Conflict(
                "Only pending payments can be deleted".to_string(),
            ));
        }

        self.payments.delete(payment_id).await?;
        self.bus.publish(ChangeEvent::PaymentChanged { payment_id });
        Ok(())
    }

    /// Manual token adjustment, recorded like any other ledger fact.
    pub async fn grant_tokens(
        &self,
        user_id: Uuid,
        amount: i64,
        note: Option<String>,
    ) -> Result<TokenTransaction> {
        if amount == 0 {
            return Err(AppError::BadRequest("Grant amount cannot be zero".to_string()));
        }
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let description =
            note.unwrap_or_else(|| format!("Admin grant of {} tokens", amount));
        let transaction = self
            .ledger
            .append(NewTokenTransaction {
                user_id,
                kind: TransactionKind::AdminGrant,
                amount,
                description,
                related_payment_id: None,
            })
            .await?;
        self.bus.publish(ChangeEvent::LedgerAppended { user_id });
        Ok(transaction)
    }
}
