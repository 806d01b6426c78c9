use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{NewTokenTransaction, TokenTransaction, TransactionKind},
    error::{AppError, Result},
    repository::LedgerRepository,
};

#[derive(FromRow)]
struct TransactionRow {
    id: String,
    user_id: String,
    kind: String,
    amount: i64,
    description: String,
    related_payment_id: Option<String>,
    created_at: NaiveDateTime,
}

pub struct SqliteLedgerRepository {
    pool: SqlitePool,
}

impl SqliteLedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_transaction(row: TransactionRow) -> Result<TokenTransaction> {
        Ok(TokenTransaction {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            user_id: Uuid::parse_str(&row.user_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            kind: Self::parse_kind(&row.kind)?,
            amount: row.amount,
            description: row.description,
            related_payment_id: row
                .related_payment_id
                .map(|id| Uuid::parse_str(&id).map_err(|e| AppError::Database(e.to_string())))
                .transpose()?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }

    fn parse_kind(s: &str) -> Result<TransactionKind> {
        match s {
            "referral-signup-earn" => Ok(TransactionKind::ReferralSignupEarn),
            "referral-upgrade-earn" => Ok(TransactionKind::ReferralUpgradeEarn),
            "referral-upgrade-reversal" => Ok(TransactionKind::ReferralUpgradeReversal),
            "goal-bonus-earn" => Ok(TransactionKind::GoalBonusEarn),
            "admin-grant" => Ok(TransactionKind::AdminGrant),
            "spend-on-image" => Ok(TransactionKind::SpendOnImage),
            "spend-on-video" => Ok(TransactionKind::SpendOnVideo),
            "spend-on-upgrade-discount" => Ok(TransactionKind::SpendOnUpgradeDiscount),
            _ => Err(AppError::Database(format!("Invalid transaction kind: {}", s))),
        }
    }

    fn kind_to_str(kind: TransactionKind) -> &'static str {
        match kind {
            TransactionKind::ReferralSignupEarn => "referral-signup-earn",
            TransactionKind::ReferralUpgradeEarn => "referral-upgrade-earn",
            TransactionKind::ReferralUpgradeReversal => "referral-upgrade-reversal",
            TransactionKind::GoalBonusEarn => "goal-bonus-earn",
            TransactionKind::AdminGrant => "admin-grant",
            TransactionKind::SpendOnImage => "spend-on-image",
            TransactionKind::SpendOnVideo => "spend-on-video",
            TransactionKind::SpendOnUpgradeDiscount => "spend-on-upgrade-discount",
        }
    }
}

#[async_trait]
impl LedgerRepository for SqliteLedgerRepository {
    async fn append(&self, transaction: NewTokenTransaction) -> Result<TokenTransaction> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let user_id_str = transaction.user_id.to_string();
        let kind_str = Self::kind_to_str(transaction.kind);
        let related_str = transaction.related_payment_id.map(|p| p.to_string());
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO token_transactions (
                id, user_id, kind, amount, description,
                related_payment_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&user_id_str)
        .bind(kind_str)
        .bind(transaction.amount)
        .bind(&transaction.description)
        .bind(&related_str)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(TokenTransaction {
            id,
            user_id: transaction.user_id,
            kind: transaction.kind,
            amount: transaction.amount,
            description: transaction.description,
            related_payment_id: transaction.related_payment_id,
            created_at: DateTime::from_naive_utc_and_offset(now, Utc),
        })
    }

    async fn balance_of(&self, user_id: Uuid) -> Result<i64> {
        let user_id_str = user_id.to_string();
        let balance: (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM token_transactions
            WHERE user_id = ?
            "#,
        )
        .bind(user_id_str)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(balance.0)
    }

    async fn transactions_of(&self, user_id: Uuid) -> Result<Vec<TokenTransaction>> {
        let user_id_str = user_id.to_string();
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, user_id, kind, amount, description,
                   related_payment_id, created_at
            FROM token_transactions
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_transaction).collect()
    }

    async fn find_by_related_payment(
        &self,
        payment_id: Uuid,
        kind: TransactionKind,
    ) -> Result<Option<TokenTransaction>> {
        let payment_id_str = payment_id.to_string();
        let kind_str = Self::kind_to_str(kind);
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, user_id, kind, amount, description,
                   related_payment_id, created_at
            FROM token_transactions
            WHERE related_payment_id = ? AND kind = ?
            "#,
        )
        .bind(payment_id_str)
        .bind(kind_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_transaction(r)?)),
            None => Ok(None),
        }
    }
}
