use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{api::state::AppState, domain::ResourceKind, error::Result};

#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    pub kind: ResourceKind,
    #[serde(default)]
    pub without_watermark: bool,
}

#[derive(Debug, Serialize)]
pub struct CanGenerateResponse {
    pub allowed: bool,
}

pub async fn can_generate(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<GenerateParams>,
) -> Result<Json<CanGenerateResponse>> {
    let allowed = state
        .service_context
        .quota_service
        .can_generate(user_id, params.kind, params.without_watermark)
        .await?;
    Ok(Json(CanGenerateResponse { allowed }))
}

#[derive(Debug, Deserialize)]
pub struct ConsumeDto {
    pub kind: ResourceKind,
    #[serde(default)]
    pub without_watermark: bool,
}

#[derive(Debug, Serialize)]
pub struct ConsumeResponse {
    pub consumed: bool,
}

pub async fn consume(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(dto): Json<ConsumeDto>,
) -> Result<Json<ConsumeResponse>> {
    let consumed = state
        .service_context
        .quota_service
        .consume_on_generate(user_id, dto.kind, dto.without_watermark)
        .await?;
    Ok(Json(ConsumeResponse { consumed }))
}
