use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{PaymentMethodConfig, RailKind, UpdatePaymentMethodRequest},
    error::{AppError, Result},
    repository::PaymentMethodRepository,
};

#[derive(FromRow)]
struct MethodRow {
    id: String,
    name: String,
    rail: String,
    description: String,
    is_enabled: bool,
    account_holder: Option<String>,
    account_number: Option<String>,
    iban: Option<String>,
    swift: Option<String>,
    address: Option<String>,
    network: Option<String>,
    crypto_symbol: Option<String>,
}

pub struct SqlitePaymentMethodRepository {
    pool: SqlitePool,
}

impl SqlitePaymentMethodRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_method(row: MethodRow) -> Result<PaymentMethodConfig> {
        Ok(PaymentMethodConfig {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            name: row.name,
            rail: match row.rail.as_str() {
                "card" => RailKind::Card,
                "crypto" => RailKind::Crypto,
                "bank" => RailKind::Bank,
                other => {
                    return Err(AppError::Database(format!("Invalid payment rail: {}", other)))
                }
            },
            description: row.description,
            is_enabled: row.is_enabled,
            account_holder: row.account_holder,
            account_number: row.account_number,
            iban: row.iban,
            swift: row.swift,
            address: row.address,
            network: row.network,
            crypto_symbol: row.crypto_symbol,
        })
    }

    async fn insert(&self, method: &PaymentMethodConfig) -> Result<()> {
        let rail = match method.rail {
            RailKind::Card => "card",
            RailKind::Crypto => "crypto",
            RailKind::Bank => "bank",
        };
        sqlx::query(
            r#"
            INSERT INTO payment_methods (
                id, name, rail, description, is_enabled,
                account_holder, account_number, iban, swift,
                address, network, crypto_symbol
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(method.id.to_string())
        .bind(&method.name)
        .bind(rail)
        .bind(&method.description)
        .bind(method.is_enabled)
        .bind(&method.account_holder)
        .bind(&method.account_number)
        .bind(&method.iban)
        .bind(&method.swift)
        .bind(&method.address)
        .bind(&method.network)
        .bind(&method.crypto_symbol)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, rail, description, is_enabled,
           account_holder, account_number, iban, swift,
           address, network, crypto_symbol
    FROM payment_methods
"#;

#[async_trait]
impl PaymentMethodRepository for SqlitePaymentMethodRepository {
    async fn list(&self) -> Result<Vec<PaymentMethodConfig>> {
        let rows = sqlx::query_as::<_, MethodRow>(&format!("{} ORDER BY name", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_method).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentMethodConfig>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, MethodRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id_str)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_method(r)?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        id: Uuid,
        request: UpdatePaymentMethodRequest,
    ) -> Result<PaymentMethodConfig> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment method not found".to_string()))?;

        let updated = PaymentMethodConfig {
            description: request.description.unwrap_or(existing.description),
            is_enabled: request.is_enabled.unwrap_or(existing.is_enabled),
            account_holder: request.account_holder.or(existing.account_holder),
            account_number: request.account_number.or(existing.account_number),
            iban: request.iban.or(existing.iban),
            swift: request.swift.or(existing.swift),
            address: request.address.or(existing.address),
            network: request.network.or(existing.network),
            crypto_symbol: request.crypto_symbol.or(existing.crypto_symbol),
            ..existing
        };

        sqlx::query(
            r#"
            UPDATE payment_methods
            SET description = ?, is_enabled = ?,
                account_holder = ?, account_number = ?, iban = ?, swift = ?,
                address = ?, network = ?, crypto_symbol = ?
            WHERE id = ?
            "#,
        )
        .bind(&updated.description)
        .bind(updated.is_enabled)
        .bind(&updated.account_holder)
        .bind(&updated.account_number)
        .bind(&updated.iban)
        .bind(&updated.swift)
        .bind(&updated.address)
        .bind(&updated.network)
        .bind(&updated.crypto_symbol)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(updated)
    }

    async fn ensure_defaults(&self) -> Result<()> {
        let existing = self.list().await?;
        if !existing.is_empty() {
            return Ok(());
        }

        let defaults = vec![
            PaymentMethodConfig {
                id: Uuid::new_v4(),
                name: "Credit / Debit Card".to_string(),
                rail: RailKind::Card,
                description: "Instant approval via the card gateway".to_string(),
                is_enabled: true,
                account_holder: None,
                account_number: None,
                iban: None,
                swift: None,
                address: None,
                network: None,
                crypto_symbol: None,
            },
            PaymentMethodConfig {
                id: Uuid::new_v4(),
                name: "Bitcoin".to_string(),
                rail: RailKind::Crypto,
                description: "On-chain transfer, verified against the explorer".to_string(),
                is_enabled: true,
                account_holder: None,
                account_number: None,
                iban: None,
                swift: None,
                address: Some("bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh".to_string()),
                network: Some("Bitcoin".to_string()),
                crypto_symbol: Some("BTC".to_string()),
            },
            PaymentMethodConfig {
                id: Uuid::new_v4(),
                name: "Ethereum".to_string(),
                rail: RailKind::Crypto,
                description: "On-chain transfer, verified against the explorer".to_string(),
                is_enabled: true,
                account_holder: None,
                account_number: None,
                iban: None,
                swift: None,
                address: Some("0x71C7656EC7ab88b098defB751B7401B5f6d8976F".to_string()),
                network: Some("Ethereum Mainnet".to_string()),
                crypto_symbol: Some("ETH".to_string()),
            },
            PaymentMethodConfig {
                id: Uuid::new_v4(),
                name: "Bank Transfer".to_string(),
                rail: RailKind::Bank,
                description: "Manual transfer, reviewed within a business day".to_string(),
                is_enabled: true,
                account_holder: Some("Lumina Media Ltd".to_string()),
                account_number: Some("00012345678".to_string()),
                iban: Some("GB33BUKB20201555555555".to_string()),
                swift: Some("BUKBGB22".to_string()),
                address: None,
                network: None,
                crypto_symbol: None,
            },
        ];

        for method in &defaults {
            self.insert(method).await?;
        }

        tracing::info!("Seeded {} default payment methods", defaults.len());
        Ok(())
    }
}
