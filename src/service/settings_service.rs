use sqlx::SqlitePool;

use crate::{
    error::{AppError, Result},
    notify::{ChangeBus, ChangeEvent},
};

const PLAN_PRICE_KEY: &str = "plan_price_cents";

/// Administratively adjustable billing settings, stored as key/value rows.
/// Falls back to the configured default until a value is written.
pub struct SettingsService {
    pool: SqlitePool,
    bus: ChangeBus,
    default_plan_price_cents: i64,
}

impl SettingsService {
    pub fn new(pool: SqlitePool, bus: ChangeBus, default_plan_price_cents: i64) -> Self {
        Self { pool, bus, default_plan_price_cents }
    }

    pub async fn plan_price_cents(&self) -> Result<i64> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM billing_settings WHERE key = ?")
                .bind(PLAN_PRICE_KEY)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some((value,)) => value
                .parse()
                .map_err(|_| AppError::Database(format!("Invalid plan price: {}", value))),
            None => Ok(self.default_plan_price_cents),
        }
    }

    pub async fn set_plan_price_cents(&self, cents: i64) -> Result<()> {
        if cents <= 0 {
            return Err(AppError::BadRequest("Plan price must be greater than zero".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO billing_settings (key, value) VALUES (?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(PLAN_PRICE_KEY)
        .bind(cents.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.bus.publish(ChangeEvent::SettingsChanged);
        Ok(())
    }
}
