use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    api::{handlers::payments::PaymentDto, state::AppState},
    domain::{CreateUserRequest, Credits, Plan, TokenTransaction, TransactionKind, User},
    error::Result,
    repository::{CreditsRepository, LedgerRepository, PaymentRepository, UserRepository},
};

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub plan: Plan,
    pub created_at: String,
    pub subscription_start_date: Option<String>,
    pub plan_expiration_date: Option<String>,
    pub referred_by: Option<Uuid>,
    pub country: String,
    pub phone: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            plan: user.plan,
            created_at: user.created_at.to_rfc3339(),
            subscription_start_date: user.subscription_start_date.map(|dt| dt.to_rfc3339()),
            plan_expiration_date: user.plan_expiration_date.map(|dt| dt.to_rfc3339()),
            referred_by: user.referred_by,
            country: user.country,
            phone: user.phone,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionDto {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: i64,
    pub description: String,
    pub related_payment_id: Option<Uuid>,
    pub created_at: String,
}

impl From<TokenTransaction> for TransactionDto {
    fn from(txn: TokenTransaction) -> Self {
        Self {
            id: txn.id,
            kind: txn.kind,
            amount: txn.amount,
            description: txn.description,
            related_payment_id: txn.related_payment_id,
            created_at: txn.created_at.to_rfc3339(),
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDto>)> {
    let user = state.service_context.account_service.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDto>> {
    let user = state.service_context.account_service.get_user(id).await?;
    Ok(Json(user.into()))
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub user_id: Uuid,
    pub balance: i64,
}

pub async fn balance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BalanceResponse>> {
    // get_user doubles as the existence check.
    state.service_context.account_service.get_user(id).await?;
    let balance = state.service_context.ledger_repo.balance_of(id).await?;
    Ok(Json(BalanceResponse { user_id: id, balance }))
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub transactions: Vec<TransactionDto>,
    pub balance: i64,
}

pub async fn ledger(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LedgerResponse>> {
    state.service_context.account_service.get_user(id).await?;
    let transactions = state.service_context.ledger_repo.transactions_of(id).await?;
    let balance = state.service_context.ledger_repo.balance_of(id).await?;
    let transactions: Vec<TransactionDto> = transactions.into_iter().map(Into::into).collect();
    Ok(Json(LedgerResponse { transactions, balance }))
}

pub async fn credits(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Credits>> {
    state.service_context.account_service.get_user(id).await?;
    let credits = state.service_context.credits_repo.get(id).await?;
    Ok(Json(credits))
}

pub async fn payments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PaymentDto>>> {
    state.service_context.account_service.get_user(id).await?;
    let payments = state.service_context.payment_repo.find_by_user(id).await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

pub async fn referrals(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<UserDto>>> {
    state.service_context.account_service.get_user(id).await?;
    let referred = state.service_context.user_repo.referrals_of(id).await?;
    Ok(Json(referred.into_iter().map(Into::into).collect()))
}
