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

/// Gates and records generation actions. Credits are consumed first; only
/// when the relevant counter is exhausted does a generation spend tokens,
/// as a ledger append.
pub struct QuotaService {
    users: Arc<dyn UserRepository>,
    credits: Arc<dyn CreditsRepository>,
    ledger: Arc<dyn LedgerRepository>,
    settlement: Arc<SettlementService>,
    bus: ChangeBus,
    image_token_cost: i64,
    video_token_cost: i64,
}

impl QuotaService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        credits: Arc<dyn CreditsRepository>,
        ledger: Arc<dyn LedgerRepository>,
        settlement: Arc<SettlementService>,
        bus: ChangeBus,
        billing: &BillingConfig,
    ) -> Self {
        Self {
            users,
            credits,
            ledger,
            settlement,
            bus,
            image_token_cost: billing.image_token_cost,
            video_token_cost: billing.video_token_cost,
        }
    }

    fn token_cost(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Image => self.image_token_cost,
            ResourceKind::Video => self.video_token_cost,
        }
    }

    /// Loads the user with the passive expiration check applied.
    async fn current_user(&self, user_id: Uuid) -> Result<User> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        self.settlement.refresh_plan(user).await
    }

    /// Same decision as `consume_on_generate`, without any mutation. Used
    /// to gate actions before committing to a generation.
    pub async fn can_generate(
        &self,
        user_id: Uuid,
        kind: ResourceKind,
        without_watermark: bool,
    ) -> Result<bool> {
        let user = self.current_user(user_id).await?;
        if user.plan == Plan::Pro {
            return Ok(true);
        }

        let credits = self.credits.get(user_id).await?;
        if without_watermark && credits.no_watermark <= 0 {
            return Ok(false);
        }

        let has_credit = match kind {
            ResourceKind::Image => credits.image > 0,
            ResourceKind::Video => credits.video > 0,
        };
        if has_credit {
            return Ok(true);
        }

        let balance = self.ledger.balance_of(user_id).await?;
        Ok(balance >= self.token_cost(kind))
    }

    /// Records one generation. The watermark-free counter is consumed
    /// independently and never gates the rest of the call; the primary
    /// resource comes from the credit counter when available, otherwise
    /// from the token ledger. Returns false when neither covers it.
    pub async fn consume_on_generate(
        &self,
        user_id: Uuid,
        kind: ResourceKind,
        without_watermark: bool,
    ) -> Result<bool> {
        let user = self.current_user(user_id).await?;
        if user.plan == Plan::Pro {
            return Ok(true);
        }

        let credits = self.credits.get(user_id).await?;
        let mut updated = credits;

        if without_watermark && updated.no_watermark > 0 {
            updated.no_watermark -= 1;
        }

        let used_credit = match kind {
            ResourceKind::Image if updated.image > 0 => {
                updated.image -= 1;
                true
            }
            ResourceKind::Video if updated.video > 0 => {
                updated.video -= 1;
                true
            }
            _ => false,
        };

        let mut spent_tokens = false;
        if !used_credit {
            let cost = self.token_cost(kind);
            if self.ledger.balance_of(user_id).await? >= cost {
                spent_tokens = true;
            }
        }

        if updated != credits {
            self.credits.set(user_id, updated).await?;
            self.bus.publish(ChangeEvent::CreditsChanged { user_id });
        }

        if spent_tokens {
            let (txn_kind, description) = match kind {
                ResourceKind::Image => (TransactionKind::SpendOnImage, "Generated an image"),
                ResourceKind::Video => (TransactionKind::SpendOnVideo, "Generated a video"),
            };
            self.ledger
                .append(NewTokenTransaction {
                    user_id,
                    kind: txn_kind,
                    amount: -self.token_cost(kind),
                    description: description.to_string(),
                    related_payment_id: None,
                })
                .await?;
            self.bus.publish(ChangeEvent::LedgerAppended { user_id });
        }

        Ok(used_credit || spent_tokens)
    }
}
