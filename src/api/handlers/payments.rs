use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{Payment, PaymentStatus, RailKind},
    error::Result,
    rails::CardDetails,
};

#[derive(Debug, Serialize)]
pub struct PaymentDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub method_name: String,
    pub rail: RailKind,
    pub status: PaymentStatus,
    pub created_at: String,
    pub plan_price_cents: i64,
    pub token_discount_cents: i64,
    pub amount_paid_cents: i64,
    pub amount_paid_usd: f64,
    pub tokens_debited: i64,
    pub proof_hash: Option<String>,
    pub proof_file_name: Option<String>,
    pub proof_reference: Option<String>,
    pub verification_error: Option<String>,
    pub cardholder_name: Option<String>,
    pub masked_card_number: Option<String>,
}

impl From<Payment> for PaymentDto {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            user_id: payment.user_id,
            user_email: payment.user_email.clone(),
            method_name: payment.method_name.clone(),
            rail: payment.rail,
            status: payment.status,
            created_at: payment.created_at.to_rfc3339(),
            plan_price_cents: payment.plan_price_cents,
            token_discount_cents: payment.token_discount_cents,
            amount_paid_cents: payment.amount_paid_cents,
            amount_paid_usd: payment.amount_paid_usd(),
            tokens_debited: payment.tokens_debited,
            proof_hash: payment.proof.hash,
            proof_file_name: payment.proof.file_name,
            proof_reference: payment.proof.reference,
            verification_error: payment.verification_error,
            cardholder_name: payment.cardholder_name,
            masked_card_number: payment.masked_card_number,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CardPaymentDto {
    pub user_id: Uuid,
    pub method_id: Uuid,
    #[serde(flatten)]
    pub card: CardDetails,
    #[serde(default)]
    pub tokens_to_apply: i64,
}

pub async fn submit_card(
    State(state): State<AppState>,
    Json(dto): Json<CardPaymentDto>,
) -> Result<(StatusCode, Json<PaymentDto>)> {
    let payment = state
        .service_context
        .payment_service
        .submit_card(dto.user_id, dto.method_id, dto.card, dto.tokens_to_apply)
        .await?;

    Ok((StatusCode::CREATED, Json(payment.into())))
}

#[derive(Debug, Deserialize)]
pub struct CryptoPaymentDto {
    pub user_id: Uuid,
    pub method_id: Uuid,
    pub transaction_hash: String,
    #[serde(default)]
    pub tokens_to_apply: i64,
}

pub async fn submit_crypto(
    State(state): State<AppState>,
    Json(dto): Json<CryptoPaymentDto>,
) -> Result<(StatusCode, Json<PaymentDto>)> {
    let payment = state
        .service_context
        .payment_service
        .submit_crypto(dto.user_id, dto.method_id, dto.transaction_hash, dto.tokens_to_apply)
        .await?;

    Ok((StatusCode::CREATED, Json(payment.into())))
}

#[derive(Debug, Deserialize)]
pub struct BankPaymentDto {
    pub user_id: Uuid,
    pub method_id: Uuid,
    pub proof_file_name: String,
    #[serde(default)]
    pub tokens_to_apply: i64,
}

pub async fn submit_bank(
    State(state): State<AppState>,
    Json(dto): Json<BankPaymentDto>,
) -> Result<(StatusCode, Json<PaymentDto>)> {
    let payment = state
        .service_context
        .payment_service
        .submit_bank(dto.user_id, dto.method_id, dto.proof_file_name, dto.tokens_to_apply)
        .await?;

    Ok((StatusCode::CREATED, Json(payment.into())))
}
