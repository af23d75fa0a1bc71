use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Review;

/// Review joined with its photos and the author's display name.
#[derive(Debug, Serialize)]
pub struct AuthoredReview {
    #[serde(flatten)]
    pub review: Review,
    pub photos: Vec<PhotoView>,
    pub author_display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PhotoView {
    pub id: Uuid,
    pub review_id: Uuid,
    pub storage_path: String,
    pub created_at: OffsetDateTime,
    pub public_url: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewWriteResponse {
    pub id: Uuid,
    pub created_at: OffsetDateTime,
}
