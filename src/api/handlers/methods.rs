use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{PaymentMethodConfig, UpdatePaymentMethodRequest},
    error::Result,
    notify::ChangeEvent,
    repository::PaymentMethodRepository,
};

/// Enabled methods only, for the payment page.
pub async fn list_enabled(
    State(state): State<AppState>,
) -> Result<Json<Vec<PaymentMethodConfig>>> {
    let methods = state.service_context.method_repo.list().await?;
    Ok(Json(methods.into_iter().filter(|m| m.is_enabled).collect()))
}

pub async fn list_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<PaymentMethodConfig>>> {
    let methods = state.service_context.method_repo.list().await?;
    Ok(Json(methods))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePaymentMethodRequest>,
) -> Result<Json<PaymentMethodConfig>> {
    let method = state.service_context.method_repo.update(id, request).await?;
    state.service_context.bus.publish(ChangeEvent::MethodsChanged);
    Ok(Json(method))
}
