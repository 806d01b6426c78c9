use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::Credits,
    error::{AppError, Result},
    repository::CreditsRepository,
};

#[derive(FromRow)]
struct CreditsRow {
    image: i64,
    video: i64,
    no_watermark: i64,
}

pub struct SqliteCreditsRepository {
    pool: SqlitePool,
}

impl SqliteCreditsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreditsRepository for SqliteCreditsRepository {
    async fn get(&self, user_id: Uuid) -> Result<Credits> {
        let user_id_str = user_id.to_string();
        let row = sqlx::query_as::<_, CreditsRow>(
            r#"
            SELECT image, video, no_watermark
            FROM credits
            WHERE user_id = ?
            "#,
        )
        .bind(user_id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row
            .map(|r| Credits {
                image: r.image,
                video: r.video,
                no_watermark: r.no_watermark,
            })
            .unwrap_or(Credits::FREE_TIER))
    }

    async fn set(&self, user_id: Uuid, credits: Credits) -> Result<Credits> {
        let user_id_str = user_id.to_string();
        sqlx::query(
            r#"
            INSERT INTO credits (user_id, image, video, no_watermark)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE
            SET image = excluded.image,
                video = excluded.video,
                no_watermark = excluded.no_watermark
            "#,
        )
        .bind(&user_id_str)
        .bind(credits.image)
        .bind(credits.video)
        .bind(credits.no_watermark)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(credits)
    }
}
