use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Payment, PaymentProof, PaymentStatus, RailKind},
    error::{AppError, Result},
    repository::PaymentRepository,
};

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    user_id: String,
    user_email: String,
    method_name: String,
    rail: String,
    proof_hash: Option<String>,
    proof_file_name: Option<String>,
    proof_reference: Option<String>,
    status: String,
    created_at: NaiveDateTime,
    plan_price_cents: i64,
    token_discount_cents: i64,
    amount_paid_cents: i64,
    tokens_debited: i64,
    verification_error: Option<String>,
    cardholder_name: Option<String>,
    masked_card_number: Option<String>,
}

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        Ok(Payment {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            user_id: Uuid::parse_str(&row.user_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            user_email: row.user_email,
            method_name: row.method_name,
            rail: Self::parse_rail(&row.rail)?,
            proof: PaymentProof {
                hash: row.proof_hash,
                file_name: row.proof_file_name,
                reference: row.proof_reference,
            },
            status: Self::parse_status(&row.status)?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            plan_price_cents: row.plan_price_cents,
            token_discount_cents: row.token_discount_cents,
            amount_paid_cents: row.amount_paid_cents,
            tokens_debited: row.tokens_debited,
            verification_error: row.verification_error,
            cardholder_name: row.cardholder_name,
            masked_card_number: row.masked_card_number,
        })
    }

    fn parse_status(s: &str) -> Result<PaymentStatus> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "approved" => Ok(PaymentStatus::Approved),
            "rejected" => Ok(PaymentStatus::Rejected),
            _ => Err(AppError::Database(format!("Invalid payment status: {}", s))),
        }
    }

    fn status_to_str(status: PaymentStatus) -> &'static str {
        match status {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
        }
    }

    fn parse_rail(s: &str) -> Result<RailKind> {
        match s {
            "card" => Ok(RailKind::Card),
            "crypto" => Ok(RailKind::Crypto),
            "bank" => Ok(RailKind::Bank),
            _ => Err(AppError::Database(format!("Invalid payment rail: {}", s))),
        }
    }

    pub(crate) fn rail_to_str(rail: RailKind) -> &'static str {
        match rail {
            RailKind::Card => "card",
            RailKind::Crypto => "crypto",
            RailKind::Bank => "bank",
        }
    }

    async fn fetch_required(&self, id: Uuid) -> Result<Payment> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated payment".to_string()))
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, user_email, method_name, rail,
           proof_hash, proof_file_name, proof_reference, status, created_at,
           plan_price_cents, token_discount_cents, amount_paid_cents,
           tokens_debited, verification_error, cardholder_name, masked_card_number
    FROM payments
"#;

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn create(&self, payment: Payment) -> Result<Payment> {
        let id_str = payment.id.to_string();
        let user_id_str = payment.user_id.to_string();
        let rail_str = Self::rail_to_str(payment.rail);
        let status_str = Self::status_to_str(payment.status);
        let created_at = payment.created_at.naive_utc();

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, user_email, method_name, rail,
                proof_hash, proof_file_name, proof_reference, status, created_at,
                plan_price_cents, token_discount_cents, amount_paid_cents,
                tokens_debited, verification_error, cardholder_name, masked_card_number
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&user_id_str)
        .bind(&payment.user_email)
        .bind(&payment.method_name)
        .bind(rail_str)
        .bind(&payment.proof.hash)
        .bind(&payment.proof.file_name)
        .bind(&payment.proof.reference)
        .bind(status_str)
        .bind(created_at)
        .bind(payment.plan_price_cents)
        .bind(payment.token_discount_cents)
        .bind(payment.amount_paid_cents)
        .bind(payment.tokens_debited)
        .bind(&payment.verification_error)
        .bind(&payment.cardholder_name)
        .bind(&payment.masked_card_number)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.fetch_required(payment.id).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, PaymentRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id_str)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_payment(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>> {
        let user_id_str = user_id.to_string();
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "{} WHERE user_id = ? ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(user_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn list(&self) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "{} ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn list_pending_bank(&self) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "{} WHERE status = 'pending' AND rail = 'bank' ORDER BY created_at ASC",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn find_duplicate_hash(&self, hash: &str, exclude_id: Uuid) -> Result<Option<Payment>> {
        let exclude_str = exclude_id.to_string();
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "{} WHERE LOWER(TRIM(proof_hash)) = LOWER(TRIM(?)) AND id != ? AND status != 'rejected'",
            SELECT_COLUMNS
        ))
        .bind(hash)
        .bind(exclude_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_payment(r)?)),
            None => Ok(None),
        }
    }

    async fn mark_approved(&self, id: Uuid, reference: &str) -> Result<Payment> {
        let id_str = id.to_string();
        sqlx::query(
            r#"
            UPDATE payments
            SET status = 'approved',
                proof_reference = ?,
                verification_error = NULL
            WHERE id = ?
            "#,
        )
        .bind(reference)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.fetch_required(id).await
    }

    async fn mark_rejected(&self, id: Uuid, reason: &str) -> Result<Payment> {
        let id_str = id.to_string();
        sqlx::query(
            r#"
            UPDATE payments
            SET status = 'rejected',
                verification_error = ?
            WHERE id = ?
            "#,
        )
        .bind(reason)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.fetch_required(id).await
    }

    async fn mark_pending(&self, id: Uuid, note: Option<&str>) -> Result<Payment> {
        let id_str = id.to_string();
        sqlx::query(
            r#"
            UPDATE payments
            SET status = 'pending',
                verification_error = ?
            WHERE id = ?
            "#,
        )
        .bind(note)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.fetch_required(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        sqlx::query("DELETE FROM payments WHERE id = ?")
            .bind(id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
