use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CreateUserRequest, Plan, User},
    error::{AppError, Result},
    repository::UserRepository,
};

#[derive(FromRow)]
struct UserRow {
    id: String,
    email: String,
    plan: String,
    created_at: NaiveDateTime,
    subscription_start_date: Option<NaiveDateTime>,
    plan_expiration_date: Option<NaiveDateTime>,
    referred_by: Option<String>,
    country: String,
    phone: String,
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: UserRow) -> Result<User> {
        Ok(User {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            email: row.email,
            plan: Self::parse_plan(&row.plan)?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            subscription_start_date: row
                .subscription_start_date
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            plan_expiration_date: row
                .plan_expiration_date
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            referred_by: row
                .referred_by
                .map(|id| Uuid::parse_str(&id).map_err(|e| AppError::Database(e.to_string())))
                .transpose()?,
            country: row.country,
            phone: row.phone,
        })
    }

    fn parse_plan(s: &str) -> Result<Plan> {
        match s {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            _ => Err(AppError::Database(format!("Invalid plan: {}", s))),
        }
    }

    fn plan_to_str(plan: Plan) -> &'static str {
        match plan {
            Plan::Free => "free",
            Plan::Pro => "pro",
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, email, plan, created_at, subscription_start_date,
           plan_expiration_date, referred_by, country, phone
    FROM users
"#;

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, request: CreateUserRequest) -> Result<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let referred_by_str = request.referred_by.map(|r| r.to_string());
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, plan, created_at, subscription_start_date,
                plan_expiration_date, referred_by, country, phone
            ) VALUES (?, ?, 'free', ?, NULL, NULL, ?, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&request.email)
        .bind(now)
        .bind(&referred_by_str)
        .bind(&request.country)
        .bind(&request.phone)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created user".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id_str)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_user(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE email = ?", SELECT_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_user(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_user).collect()
    }

    async fn referrals_of(&self, user_id: Uuid) -> Result<Vec<User>> {
        let user_id_str = user_id.to_string();
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{} WHERE referred_by = ? ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(user_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_user).collect()
    }

    async fn set_plan(
        &self,
        id: Uuid,
        plan: Plan,
        subscription_start_date: Option<DateTime<Utc>>,
        plan_expiration_date: Option<DateTime<Utc>>,
    ) -> Result<User> {
        let id_str = id.to_string();
        let plan_str = Self::plan_to_str(plan);
        let start_naive = subscription_start_date.map(|dt| dt.naive_utc());
        let expiration_naive = plan_expiration_date.map(|dt| dt.naive_utc());

        sqlx::query(
            r#"
            UPDATE users
            SET plan = ?,
                subscription_start_date = ?,
                plan_expiration_date = ?
            WHERE id = ?
            "#,
        )
        .bind(plan_str)
        .bind(start_naive)
        .bind(expiration_naive)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated user".to_string()))
    }
}
