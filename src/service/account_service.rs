use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::BillingConfig,
    domain::*,
    error::{AppError, Result},
    notify::{ChangeBus, ChangeEvent},
    repository::{CreditsRepository, LedgerRepository, UserRepository},
    service::SettlementService,
};

/// Account creation and reads. Signup is where the one-time referral
/// signup bonus is earned; plan reads apply the passive expiration check.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    ledger: Arc<dyn LedgerRepository>,
    credits: Arc<dyn CreditsRepository>,
    settlement: Arc<SettlementService>,
    bus: ChangeBus,
    referral_signup_bonus: i64,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        ledger: Arc<dyn LedgerRepository>,
        credits: Arc<dyn CreditsRepository>,
        settlement: Arc<SettlementService>,
        bus: ChangeBus,
        billing: &BillingConfig,
    ) -> Self {
        Self {
            users,
            ledger,
            credits,
            settlement,
            bus,
            referral_signup_bonus: billing.referral_signup_bonus,
        }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        if let Some(referrer_id) = request.referred_by {
            if self.users.find_by_id(referrer_id).await?.is_none() {
                return Err(AppError::BadRequest("Referrer does not exist".to_string()));
            }
        }

        let user = self.users.create(request).await?;
        self.credits.set(user.id, Credits::FREE_TIER).await?;
        self.bus.publish(ChangeEvent::UserChanged { user_id: user.id });
        self.bus.publish(ChangeEvent::CreditsChanged { user_id: user.id });

        if let Some(referrer_id) = user.referred_by {
            self.ledger
                .append(NewTokenTransaction {
                    user_id: referrer_id,
                    kind: TransactionKind::ReferralSignupEarn,
                    amount: self.referral_signup_bonus,
                    description: format!("Referred new user {}", user.email),
                    related_payment_id: None,
                })
                .await?;
            self.bus.publish(ChangeEvent::LedgerAppended { user_id: referrer_id });
        }

        Ok(user)
    }

    /// Reads a user with the passive plan-expiration check applied.
    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        self.settlement.refresh_plan(user).await
    }
}
