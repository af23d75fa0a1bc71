use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub spring_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub body: String,
    pub visit_date: Option<Date>,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReviewPhoto {
    pub id: Uuid,
    pub review_id: Uuid,
    pub storage_path: String,
    pub created_at: OffsetDateTime,
}

const REVIEW_COLUMNS: &str =
    "id, spring_id, user_id, rating, body, visit_date, created_at, updated_at";

pub async fn list_for_spring(db: &PgPool, spring_id: Uuid) -> anyhow::Result<Vec<Review>> {
    let rows = sqlx::query_as::<_, Review>(&format!(
        r#"
        SELECT {REVIEW_COLUMNS}
        FROM spring_reviews
        WHERE spring_id = $1
        ORDER BY created_at DESC
        "#,
    ))
    .bind(spring_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Review looked up by id and owner in one query; the owner check is the
/// server-side counterpart of only exposing edit controls on own reviews.
pub async fn get_owned(db: &PgPool, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Review>> {
    let review = sqlx::query_as::<_, Review>(&format!(
        r#"
        SELECT {REVIEW_COLUMNS}
        FROM spring_reviews
        WHERE id = $1 AND user_id = $2
        "#,
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(review)
}

pub async fn insert(
    db: &PgPool,
    spring_id: Uuid,
    user_id: Uuid,
    rating: i32,
    body: &str,
    visit_date: Option<Date>,
) -> anyhow::Result<Review> {
    let review = sqlx::query_as::<_, Review>(&format!(
        r#"
        INSERT INTO spring_reviews (spring_id, user_id, rating, body, visit_date)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {REVIEW_COLUMNS}
        "#,
    ))
    .bind(spring_id)
    .bind(user_id)
    .bind(rating)
    .bind(body)
    .bind(visit_date)
    .fetch_one(db)
    .await
    .context("insert review")?;
    Ok(review)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    rating: i32,
    body: &str,
    visit_date: Option<Date>,
) -> anyhow::Result<Review> {
    let review = sqlx::query_as::<_, Review>(&format!(
        r#"
        UPDATE spring_reviews
        SET rating = $2, body = $3, visit_date = $4, updated_at = now()
        WHERE id = $1
        RETURNING {REVIEW_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(rating)
    .bind(body)
    .bind(visit_date)
    .fetch_one(db)
    .await
    .context("update review")?;
    Ok(review)
}

/// Delete photo metadata rows, scoped to the owning review so a caller
/// cannot detach another review's photos. The stored objects are left in
/// place (known gap carried over from the product behavior).
pub async fn delete_photos(db: &PgPool, review_id: Uuid, ids: &[Uuid]) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM review_photos
        WHERE review_id = $1 AND id = ANY($2)
        "#,
    )
    .bind(review_id)
    .bind(ids)
    .execute(db)
    .await
    .context("delete review photos")?;
    Ok(result.rows_affected())
}

pub async fn insert_photo(
    db: &PgPool,
    id: Uuid,
    review_id: Uuid,
    storage_path: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO review_photos (id, review_id, storage_path)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(id)
    .bind(review_id)
    .bind(storage_path)
    .execute(db)
    .await
    .context("insert review photo")?;
    Ok(())
}

pub async fn photos_for_reviews(
    db: &PgPool,
    review_ids: &[Uuid],
) -> anyhow::Result<Vec<ReviewPhoto>> {
    if review_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, ReviewPhoto>(
        r#"
        SELECT id, review_id, storage_path, created_at
        FROM review_photos
        WHERE review_id = ANY($1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(review_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
