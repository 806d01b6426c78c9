use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    notify::{ChangeBus, ChangeEvent, Notifier},
    rails::{CardDetails, CardRail, CryptoRail},
    repository::{LedgerRepository, PaymentMethodRepository, PaymentRepository, UserRepository},
    service::{SettingsService, SettlementService},
};

/// Tokens are worth one cent each when applied as an upgrade discount.
const CENTS_PER_TOKEN: i64 = 1;

/// UI-facing payment submission. Card and crypto settle inline before the
/// call returns; bank submissions stay pending for the reconciliation loop.
pub struct PaymentService {
    users: Arc<dyn UserRepository>,
    payments: Arc<dyn PaymentRepository>,
    methods: Arc<dyn PaymentMethodRepository>,
    ledger: Arc<dyn LedgerRepository>,
    settlement: Arc<SettlementService>,
    settings: Arc<SettingsService>,
    notifier: Arc<dyn Notifier>,
    bus: ChangeBus,
    card: CardRail,
    crypto: CryptoRail,
}

impl PaymentService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserRepository>,
        payments: Arc<dyn PaymentRepository>,
        methods: Arc<dyn PaymentMethodRepository>,
        ledger: Arc<dyn LedgerRepository>,
        settlement: Arc<SettlementService>,
        settings: Arc<SettingsService>,
        notifier: Arc<dyn Notifier>,
        bus: ChangeBus,
        card: CardRail,
        crypto: CryptoRail,
    ) -> Self {
        Self {
            users,
            payments,
            methods,
            ledger,
            settlement,
            settings,
            notifier,
            bus,
            card,
            crypto,
        }
    }

    async fn require_user(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn require_method(&self, method_id: Uuid, rail: RailKind) -> Result<PaymentMethodConfig> {
        let method = self
            .methods
            .find_by_id(method_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment method not found".to_string()))?;
        if method.rail != rail {
            return Err(AppError::BadRequest(format!(
                "Payment method {} does not support this rail",
                method.name
            )));
        }
        if !method.is_enabled {
            return Err(AppError::BadRequest(format!(
                "Payment method {} is currently disabled",
                method.name
            )));
        }
        Ok(method)
    }

    /// Prices the upgrade and the token discount. The discount is capped by
    /// both the plan price and the user's current ledger balance.
    async fn quote(&self, user_id: Uuid, tokens_to_apply: i64) -> Result<PaymentQuote> {
        if tokens_to_apply < 0 {
            return Err(AppError::Validation("Token discount cannot be negative".to_string()));
        }

        let plan_price_cents = self.settings.plan_price_cents().await?;
        let balance = self.ledger.balance_of(user_id).await?;
        if tokens_to_apply > balance {
            return Err(AppError::Validation(
                "Insufficient token balance for the requested discount".to_string(),
            ));
        }

        let tokens_debited = tokens_to_apply.min(plan_price_cents / CENTS_PER_TOKEN);
        let token_discount_cents = tokens_debited * CENTS_PER_TOKEN;

        Ok(PaymentQuote {
            plan_price_cents,
            token_discount_cents,
            amount_paid_cents: plan_price_cents - token_discount_cents,
            tokens_debited,
        })
    }

    fn build_payment(
        user: &User,
        method: &PaymentMethodConfig,
        quote: &PaymentQuote,
        proof: PaymentProof,
    ) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            user_id: user.id,
            user_email: user.email.clone(),
            method_name: method.name.clone(),
            rail: method.rail,
            proof,
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
            plan_price_cents: quote.plan_price_cents,
            token_discount_cents: quote.token_discount_cents,
            amount_paid_cents: quote.amount_paid_cents,
            tokens_debited: quote.tokens_debited,
            verification_error: None,
            cardholder_name: None,
            masked_card_number: None,
        }
    }

    /// Instant card settlement: validate, create the pending record, verify
    /// through the card rail and settle, all before returning.
    pub async fn submit_card(
        &self,
        user_id: Uuid,
        method_id: Uuid,
        details: CardDetails,
        tokens_to_apply: i64,
    ) -> Result<Payment> {
        let user = self.require_user(user_id).await?;
        let method = self.require_method(method_id, RailKind::Card).await?;

        details
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.card.validate_details(&details)?;

        let quote = self.quote(user_id, tokens_to_apply).await?;
        let mut payment = Self::build_payment(&user, &method, &quote, PaymentProof::default());
        payment.cardholder_name = Some(details.cardholder_name.trim().to_string());
        payment.masked_card_number = Some(details.masked_number());

        let payment = self.payments.create(payment).await?;
        self.bus.publish(ChangeEvent::PaymentChanged { payment_id: payment.id });

        let outcome = self.card.verify(payment.amount_paid_cents, &details).await;
        self.settlement.settle(&payment, outcome).await
    }

    /// Instant crypto settlement against the simulated chain explorer.
    pub async fn submit_crypto(
        &self,
        user_id: Uuid,
        method_id: Uuid,
        hash: String,
        tokens_to_apply: i64,
    ) -> Result<Payment> {
        let user = self.require_user(user_id).await?;
        let method = self.require_method(method_id, RailKind::Crypto).await?;

        if hash.trim().is_empty() {
            return Err(AppError::Validation("A transaction hash is required".to_string()));
        }

        let quote = self.quote(user_id, tokens_to_apply).await?;
        let proof = PaymentProof { hash: Some(hash.trim().to_string()), ..Default::default() };
        let payment = self.payments.create(Self::build_payment(&user, &method, &quote, proof)).await?;
        self.bus.publish(ChangeEvent::PaymentChanged { payment_id: payment.id });

        let outcome = self.crypto.verify(&payment, &method).await?;
        self.settlement.settle(&payment, outcome).await
    }

    /// Bank submissions are not verified inline; the record stays pending
    /// until the reconciliation loop picks it up.
    pub async fn submit_bank(
        &self,
        user_id: Uuid,
        method_id: Uuid,
        proof_file_name: String,
        tokens_to_apply: i64,
    ) -> Result<Payment> {
        let user = self.require_user(user_id).await?;
        let method = self.require_method(method_id, RailKind::Bank).await?;

        if proof_file_name.trim().is_empty() {
            return Err(AppError::Validation("Please upload proof of payment".to_string()));
        }

        let quote = self.quote(user_id, tokens_to_apply).await?;
        let proof = PaymentProof {
            file_name: Some(proof_file_name.trim().to_string()),
            ..Default::default()
        };
        let payment = self.payments.create(Self::build_payment(&user, &method, &quote, proof)).await?;
        self.bus.publish(ChangeEvent::PaymentChanged { payment_id: payment.id });

        self.notifier.payment_pending(&user, &payment);
        Ok(payment)
    }
}

#[derive(Debug, Clone, Copy)]
struct PaymentQuote {
    plan_price_cents: i64,
    token_discount_cents: i64,
    amount_paid_cents: i64,
    tokens_debited: i64,
}
