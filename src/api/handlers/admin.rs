use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{
        handlers::{payments::PaymentDto, users::{TransactionDto, UserDto}},
        state::AppState,
    },
    error::Result,
    repository::{PaymentRepository, UserRepository},
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    50
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<UserDto>>> {
    let users = state.service_context.user_repo.list(params.limit, params.offset).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

#[derive(Debug, Deserialize)]
pub struct GrantTokensDto {
    pub amount: i64,
    pub note: Option<String>,
}

pub async fn grant_tokens(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(dto): Json<GrantTokensDto>,
) -> Result<(StatusCode, Json<TransactionDto>)> {
    let transaction = state
        .service_context
        .admin_service
        .grant_tokens(id, dto.amount, dto.note)
        .await?;
    Ok((StatusCode::CREATED, Json(transaction.into())))
}

pub async fn list_payments(State(state): State<AppState>) -> Result<Json<Vec<PaymentDto>>> {
    let payments = state.service_context.payment_repo.list().await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

pub async fn approve_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentDto>> {
    let payment = state.service_context.admin_service.approve(id).await?;
    Ok(Json(payment.into()))
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectPaymentDto {
    pub reason: Option<String>,
}

pub async fn reject_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<RejectPaymentDto>>,
) -> Result<Json<PaymentDto>> {
    let reason = body.and_then(|Json(dto)| dto.reason);
    let payment = state.service_context.admin_service.reject(id, reason).await?;
    Ok(Json(payment.into()))
}

pub async fn requeue_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentDto>> {
    let payment = state.service_context.admin_service.requeue(id).await?;
    Ok(Json(payment.into()))
}

pub async fn revalidate_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentDto>> {
    let payment = state.service_context.admin_service.revalidate(id).await?;
    Ok(Json(payment.into()))
}

pub async fn delete_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.admin_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct PlanPriceResponse {
    pub plan_price_cents: i64,
}

pub async fn get_plan_price(State(state): State<AppState>) -> Result<Json<PlanPriceResponse>> {
    let plan_price_cents = state.service_context.settings_service.plan_price_cents().await?;
    Ok(Json(PlanPriceResponse { plan_price_cents }))
}

#[derive(Debug, Deserialize)]
pub struct SetPlanPriceDto {
    pub plan_price_cents: i64,
}

pub async fn set_plan_price(
    State(state): State<AppState>,
    Json(dto): Json<SetPlanPriceDto>,
) -> Result<Json<PlanPriceResponse>> {
    state
        .service_context
        .settings_service
        .set_plan_price_cents(dto.plan_price_cents)
        .await?;
    Ok(Json(PlanPriceResponse { plan_price_cents: dto.plan_price_cents }))
}
