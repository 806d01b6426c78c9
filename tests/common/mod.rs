#![allow(dead_code)]

use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use uuid::Uuid;

use lumina::{
    config::Settings,
    domain::{CreateUserRequest, PaymentMethodConfig, RailKind, User},
    notify::{ChangeBus, LogNotifier},
    rails::CryptoRateFeed,
    repository::PaymentMethodRepository,
    service::ServiceContext,
};

/// Settings with rail latency zeroed and random declines disabled, so
/// verification outcomes are deterministic.
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    for rail in [
        &mut settings.rails.card,
        &mut settings.rails.crypto,
        &mut settings.rails.bank,
    ] {
        rail.min_delay_ms = 0;
        rail.max_delay_ms = 0;
        rail.decline_rate = 0.0;
    }
    settings
}

/// Full service wiring over an in-memory database with default payment
/// methods seeded.
pub async fn test_context(settings: &Settings) -> anyhow::Result<Arc<ServiceContext>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let ctx = Arc::new(ServiceContext::new(
        pool,
        settings,
        Arc::new(LogNotifier),
        Arc::new(CryptoRateFeed::new()),
        ChangeBus::default(),
    ));
    ctx.method_repo.ensure_defaults().await?;

    Ok(ctx)
}

pub async fn create_user(
    ctx: &ServiceContext,
    email: &str,
    referred_by: Option<Uuid>,
) -> anyhow::Result<User> {
    let user = ctx
        .account_service
        .create_user(CreateUserRequest {
            email: email.to_string(),
            referred_by,
            country: "US".to_string(),
            phone: "+1 555 0100".to_string(),
        })
        .await?;
    Ok(user)
}

pub async fn method_for(
    ctx: &ServiceContext,
    rail: RailKind,
) -> anyhow::Result<PaymentMethodConfig> {
    let methods = ctx.method_repo.list().await?;
    methods
        .into_iter()
        .find(|m| m.rail == rail)
        .ok_or_else(|| anyhow::anyhow!("no default method for rail {:?}", rail))
}
