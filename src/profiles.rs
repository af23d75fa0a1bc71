use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Profile row, one per user. Created by the onboarding flow; read-only
/// from this service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<UserProfile>> {
    let profile = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT user_id, display_name, avatar_url, bio
        FROM user_profiles
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(profile)
}

/// Display names for a batch of users, used to attach authors to reviews.
pub async fn display_names(
    db: &PgPool,
    user_ids: &[Uuid],
) -> anyhow::Result<Vec<(Uuid, Option<String>)>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, (Uuid, Option<String>)>(
        r#"
        SELECT user_id, display_name
        FROM user_profiles
        WHERE user_id = ANY($1)
        "#,
    )
    .bind(user_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
