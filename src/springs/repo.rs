use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Hot spring record. Latitude and longitude are always present; the
/// nullable numeric columns mean "unknown", never zero.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HotSpring {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: Option<f64>,
    pub description: Option<String>,
    pub state: Option<String>,
    pub access_notes: Option<String>,
    pub permit_required: bool,
    pub drive_distance_km: Option<f64>,
    pub hike_distance_km: Option<f64>,
    pub water_temperature_c: Option<f64>,
    pub last_verified_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
    pub hero_image_url: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RatingRow {
    pub spring_id: Uuid,
    pub rating: i32,
}

const COLUMNS: &str = "id, name, slug, latitude, longitude, elevation_m, description, state, \
                       access_notes, permit_required, drive_distance_km, hike_distance_km, \
                       water_temperature_c, last_verified_at, created_at, updated_at, \
                       hero_image_url";

pub async fn list_page(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<HotSpring>> {
    let rows = sqlx::query_as::<_, HotSpring>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM hot_springs
        ORDER BY id
        LIMIT $1 OFFSET $2
        "#,
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<HotSpring>> {
    let spring = sqlx::query_as::<_, HotSpring>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM hot_springs
        WHERE id = $1
        "#,
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(spring)
}

/// Landing-page fetch: case-insensitive substring match over name OR
/// state, or an unfiltered featured batch when no query is given.
pub async fn search(
    db: &PgPool,
    query: Option<&str>,
    featured_limit: i64,
) -> anyhow::Result<Vec<HotSpring>> {
    let rows = match query {
        Some(q) if !q.is_empty() => {
            let pattern = format!("%{}%", q);
            sqlx::query_as::<_, HotSpring>(&format!(
                r#"
                SELECT {COLUMNS}
                FROM hot_springs
                WHERE name ILIKE $1 OR state ILIKE $1
                "#,
            ))
            .bind(pattern)
            .fetch_all(db)
            .await?
        }
        _ => {
            sqlx::query_as::<_, HotSpring>(&format!(
                r#"
                SELECT {COLUMNS}
                FROM hot_springs
                LIMIT $1
                "#,
            ))
            .bind(featured_limit)
            .fetch_all(db)
            .await?
        }
    };
    Ok(rows)
}

/// Ratings of all reviews attached to the given springs, used to derive
/// the non-persisted average rating.
pub async fn ratings_for(db: &PgPool, spring_ids: &[Uuid]) -> anyhow::Result<Vec<RatingRow>> {
    let rows = sqlx::query_as::<_, RatingRow>(
        r#"
        SELECT spring_id, rating
        FROM spring_reviews
        WHERE spring_id = ANY($1)
        "#,
    )
    .bind(spring_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
