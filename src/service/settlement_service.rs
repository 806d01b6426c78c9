use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::{
    config::BillingConfig,
    domain::*,
    error::{AppError, Result},
    notify::{ChangeBus, ChangeEvent, Notifier},
    rails::RailOutcome,
    repository::{CreditsRepository, LedgerRepository, PaymentRepository, UserRepository},
};

/// Turns a verification outcome into payment, plan, quota and ledger
/// mutations. Every rail and every administrative override funnels through
/// `settle`, so the side effects of an approval are identical no matter
/// where the outcome came from.
pub struct SettlementService {
    users: Arc<dyn UserRepository>,
    payments: Arc<dyn PaymentRepository>,
    ledger: Arc<dyn LedgerRepository>,
    credits: Arc<dyn CreditsRepository>,
    notifier: Arc<dyn Notifier>,
    bus: ChangeBus,
    pro_duration_days: i64,
    referral_upgrade_bonus: i64,
}

impl SettlementService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        payments: Arc<dyn PaymentRepository>,
        ledger: Arc<dyn LedgerRepository>,
        credits: Arc<dyn CreditsRepository>,
        notifier: Arc<dyn Notifier>,
        bus: ChangeBus,
        billing: &BillingConfig,
    ) -> Self {
        Self {
            users,
            payments,
            ledger,
            credits,
            notifier,
            bus,
            pro_duration_days: billing.pro_duration_days,
            referral_upgrade_bonus: billing.referral_upgrade_bonus,
        }
    }

    async fn require_user(&self, user_id: uuid::Uuid) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Applies a rail outcome to a payment. Idempotent with respect to
    /// referral-bonus issuance: the bonus is only appended when no
    /// `referral-upgrade-earn` transaction references this payment yet.
    pub async fn settle(&self, payment: &Payment, outcome: RailOutcome) -> Result<Payment> {
        match outcome {
            RailOutcome::Approved { reference } => self.settle_approved(payment, &reference).await,
            RailOutcome::Declined { reason } => self.settle_declined(payment, &reason).await,
        }
    }

    async fn settle_approved(&self, payment: &Payment, reference: &str) -> Result<Payment> {
        let updated = self.payments.mark_approved(payment.id, reference).await?;
        self.bus.publish(ChangeEvent::PaymentChanged { payment_id: payment.id });

        let user = self.require_user(payment.user_id).await?;

        if user.plan != Plan::Pro {
            let now = Utc::now();
            let expires = now + Duration::days(self.pro_duration_days);
            self.users.set_plan(user.id, Plan::Pro, Some(now), Some(expires)).await?;
            self.credits.set(user.id, Credits::PRO_TIER).await?;
            self.bus.publish(ChangeEvent::UserChanged { user_id: user.id });
            self.bus.publish(ChangeEvent::CreditsChanged { user_id: user.id });

            if payment.tokens_debited > 0 {
                self.ledger
                    .append(NewTokenTransaction {
                        user_id: user.id,
                        kind: TransactionKind::SpendOnUpgradeDiscount,
                        amount: -payment.tokens_debited,
                        description: "Discount on Pro plan upgrade".to_string(),
                        related_payment_id: Some(payment.id),
                    })
                    .await?;
                self.bus.publish(ChangeEvent::LedgerAppended { user_id: user.id });
            }

            tracing::info!("User {} upgraded to Pro via payment {}", user.email, payment.id);
        }

        if let Some(referrer_id) = user.referred_by {
            let existing = self
                .ledger
                .find_by_related_payment(payment.id, TransactionKind::ReferralUpgradeEarn)
                .await?;
            if existing.is_none() {
                self.ledger
                    .append(NewTokenTransaction {
                        user_id: referrer_id,
                        kind: TransactionKind::ReferralUpgradeEarn,
                        amount: self.referral_upgrade_bonus,
                        description: format!(
                            "Referral upgrade bonus for payment {}",
                            payment.id
                        ),
                        related_payment_id: Some(payment.id),
                    })
                    .await?;
                self.bus.publish(ChangeEvent::LedgerAppended { user_id: referrer_id });
            }
        }

        let user = self.require_user(payment.user_id).await?;
        self.notifier.payment_success(&user, &updated);

        Ok(updated)
    }

    async fn settle_declined(&self, payment: &Payment, reason: &str) -> Result<Payment> {
        let updated = self.payments.mark_rejected(payment.id, reason).await?;
        self.bus.publish(ChangeEvent::PaymentChanged { payment_id: payment.id });

        match self.users.find_by_id(payment.user_id).await? {
            Some(user) => self.notifier.payment_rejected(&user, &updated, reason),
            None => tracing::warn!("User {} missing for rejected payment {}", payment.user_id, payment.id),
        }

        Ok(updated)
    }

    /// Full reversal of a previously approved payment on a Pro user. Steps,
    /// in order: downgrade, token refund, referral-bonus reversal, then the
    /// rejection itself. Each compensating append is keyed on the payment
    /// id so re-running the reversal is a no-op rather than a double
    /// refund.
    pub async fn reverse_approval(
        &self,
        payment: &Payment,
        user: &User,
        reason: &str,
    ) -> Result<Payment> {
        self.users.set_plan(user.id, Plan::Free, None, None).await?;
        let credits = self.credits.get(user.id).await?;
        self.credits.set(user.id, credits.clamped_to_free_tier()).await?;
        self.bus.publish(ChangeEvent::UserChanged { user_id: user.id });
        self.bus.publish(ChangeEvent::CreditsChanged { user_id: user.id });

        if payment.tokens_debited > 0 {
            let refunded = self
                .ledger
                .find_by_related_payment(payment.id, TransactionKind::AdminGrant)
                .await?;
            if refunded.is_none() {
                self.ledger
                    .append(NewTokenTransaction {
                        user_id: user.id,
                        kind: TransactionKind::AdminGrant,
                        amount: payment.tokens_debited,
                        description: format!(
                            "Refund for reverted Pro upgrade (payment {})",
                            payment.id
                        ),
                        related_payment_id: Some(payment.id),
                    })
                    .await?;
                self.bus.publish(ChangeEvent::LedgerAppended { user_id: user.id });
            }
        }

        let bonus = self
            .ledger
            .find_by_related_payment(payment.id, TransactionKind::ReferralUpgradeEarn)
            .await?;
        if let Some(bonus) = bonus {
            let reversed = self
                .ledger
                .find_by_related_payment(payment.id, TransactionKind::ReferralUpgradeReversal)
                .await?;
            if reversed.is_none() {
                self.ledger
                    .append(NewTokenTransaction {
                        user_id: bonus.user_id,
                        kind: TransactionKind::ReferralUpgradeReversal,
                        amount: -bonus.amount,
                        description: format!(
                            "Referral upgrade bonus reverted (payment {})",
                            payment.id
                        ),
                        related_payment_id: Some(payment.id),
                    })
                    .await?;
                self.bus.publish(ChangeEvent::LedgerAppended { user_id: bonus.user_id });
            }
        }

        let updated = self.payments.mark_rejected(payment.id, reason).await?;
        self.bus.publish(ChangeEvent::PaymentChanged { payment_id: payment.id });
        self.notifier.payment_rejected(user, &updated, reason);

        tracing::info!(
            "Payment {} reverted; user {} downgraded to Free",
            payment.id,
            user.email
        );

        Ok(updated)
    }

    /// Passive expiration check, applied on read. A lapsed Pro plan is
    /// downgraded to Free, its subscription dates cleared and credits
    /// clamped to the free tier.
    pub async fn refresh_plan(&self, user: User) -> Result<User> {
        if !user.plan_is_lapsed(Utc::now()) {
            return Ok(user);
        }

        let updated = self.users.set_plan(user.id, Plan::Free, None, None).await?;
        let credits = self.credits.get(user.id).await?;
        self.credits.set(user.id, credits.clamped_to_free_tier()).await?;
        self.bus.publish(ChangeEvent::UserChanged { user_id: user.id });
        self.bus.publish(ChangeEvent::CreditsChanged { user_id: user.id });

        tracing::info!("Pro plan for {} expired, downgraded to Free", updated.email);
        Ok(updated)
    }
}
