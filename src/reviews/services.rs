//! Review submission workflow: validation, storage keys, and the
//! delete-then-upload photo reconciliation pass.

use bytes::Bytes;
use tracing::{debug, error};
use uuid::Uuid;

use super::dto::{AuthoredReview, PhotoView};
use super::repo::{self, Review, ReviewPhoto};
use crate::state::AppState;
use crate::storage::StorageClient;

/// Ratings are whole stars, 1 through 5. Zero means "not selected" and is
/// rejected before anything touches the database.
pub fn validate_rating(rating: i32) -> Result<(), String> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(format!("rating must be between 1 and 5, got {}", rating))
    }
}

/// A newly attached file, as pulled out of the multipart form.
#[derive(Debug)]
pub struct NewPhoto {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// One upload+insert pair of the reconciliation pass.
#[derive(Debug)]
pub struct PlannedUpload {
    pub photo_id: Uuid,
    pub key: String,
    pub content_type: String,
    pub body: Bytes,
}

/// Reconciliation plan for one submission: which metadata rows get
/// deleted, and which files get uploaded and linked.
#[derive(Debug)]
pub struct PhotoPlan {
    pub delete_ids: Vec<Uuid>,
    pub uploads: Vec<PlannedUpload>,
}

impl PhotoPlan {
    pub fn build(review_id: Uuid, remove_ids: &[Uuid], new_files: Vec<NewPhoto>) -> Self {
        let uploads = new_files
            .into_iter()
            .map(|file| {
                let photo_id = Uuid::new_v4();
                let key = photo_storage_key(
                    review_id,
                    photo_id,
                    file.file_name.as_deref(),
                    file.content_type.as_deref(),
                );
                PlannedUpload {
                    photo_id,
                    key,
                    content_type: file
                        .content_type
                        .unwrap_or_else(|| "application/octet-stream".into()),
                    body: file.body,
                }
            })
            .collect();
        Self {
            delete_ids: remove_ids.to_vec(),
            uploads,
        }
    }
}

/// Storage key for an uploaded photo: namespaced by the owning review,
/// randomized filename, original extension preserved where possible.
pub fn photo_storage_key(
    review_id: Uuid,
    photo_id: Uuid,
    file_name: Option<&str>,
    content_type: Option<&str>,
) -> String {
    let ext = file_name
        .and_then(ext_from_file_name)
        .or_else(|| content_type.and_then(ext_from_mime))
        .unwrap_or("bin");
    format!("{}/{}.{}", review_id, photo_id, ext)
}

fn ext_from_file_name(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Execute the reconciliation plan after the review write has succeeded:
/// first delete the metadata rows marked for removal, then upload each
/// new file and insert its metadata row, sequentially. Errors here are
/// logged and neither roll back the review nor cancel later files, so a
/// partial success is possible. A failure between upload and insert
/// leaves the stored object orphaned.
pub async fn reconcile_photos(state: &AppState, review_id: Uuid, plan: PhotoPlan) {
    if !plan.delete_ids.is_empty() {
        match repo::delete_photos(&state.db, review_id, &plan.delete_ids).await {
            Ok(deleted) => {
                debug!(%review_id, deleted, "removed review photo metadata");
            }
            Err(e) => {
                error!(error = %e, %review_id, "photo metadata delete failed");
            }
        }
    }

    for upload in plan.uploads {
        if let Err(e) = state
            .storage
            .put_object(&upload.key, upload.body, &upload.content_type)
            .await
        {
            error!(error = %e, %review_id, key = upload.key, "photo upload failed, skipping file");
            continue;
        }
        if let Err(e) = repo::insert_photo(&state.db, upload.photo_id, review_id, &upload.key).await
        {
            error!(error = %e, %review_id, key = upload.key,
                   "photo metadata insert failed, stored object left orphaned");
        }
    }
}

/// Join reviews with their photos (public URLs derived from storage) and
/// author display names. A missing profile leaves the author unset.
pub fn assemble_reviews(
    reviews: Vec<Review>,
    photos: Vec<ReviewPhoto>,
    authors: &[(Uuid, Option<String>)],
    storage: &dyn StorageClient,
) -> Vec<AuthoredReview> {
    reviews
        .into_iter()
        .map(|review| {
            let photos = photos
                .iter()
                .filter(|p| p.review_id == review.id)
                .map(|p| PhotoView {
                    id: p.id,
                    review_id: p.review_id,
                    storage_path: p.storage_path.clone(),
                    created_at: p.created_at,
                    public_url: storage.public_url(&p.storage_path),
                })
                .collect();
            let author_display_name = authors
                .iter()
                .find(|(user_id, _)| *user_id == review.user_id)
                .and_then(|(_, name)| name.clone());
            AuthoredReview {
                review,
                photos,
                author_display_name,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use time::OffsetDateTime;

    #[test]
    fn rating_zero_is_rejected_before_any_backend_call() {
        assert!(validate_rating(0).is_err());
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(-1).is_err());
    }

    #[test]
    fn storage_key_preserves_original_extension() {
        let review_id = Uuid::new_v4();
        let photo_id = Uuid::new_v4();
        let key = photo_storage_key(review_id, photo_id, Some("pool.JPG"), None);
        assert_eq!(key, format!("{}/{}.JPG", review_id, photo_id));
    }

    #[test]
    fn storage_key_falls_back_to_mime_then_bin() {
        let review_id = Uuid::new_v4();
        let photo_id = Uuid::new_v4();
        let from_mime = photo_storage_key(review_id, photo_id, Some("noext"), Some("image/png"));
        assert!(from_mime.ends_with(".png"));
        let fallback = photo_storage_key(review_id, photo_id, None, Some("application/zip"));
        assert!(fallback.ends_with(".bin"));
    }

    #[test]
    fn ext_from_mime_covers_image_types() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("text/plain"), None);
    }

    #[test]
    fn edit_with_one_removal_and_one_new_file_plans_one_delete_and_one_upload() {
        let review_id = Uuid::new_v4();
        let removed = Uuid::new_v4();
        let new_files = vec![NewPhoto {
            file_name: Some("soak.jpg".into()),
            content_type: Some("image/jpeg".into()),
            body: Bytes::from_static(b"jpegdata"),
        }];
        let plan = PhotoPlan::build(review_id, &[removed], new_files);
        assert_eq!(plan.delete_ids, vec![removed]);
        assert_eq!(plan.uploads.len(), 1);
        assert!(plan.uploads[0].key.starts_with(&review_id.to_string()));
        assert!(plan.uploads[0].key.ends_with(".jpg"));
        assert_eq!(plan.uploads[0].content_type, "image/jpeg");
    }

    #[test]
    fn plan_keys_are_randomized_per_file() {
        let review_id = Uuid::new_v4();
        let file = |n: &str| NewPhoto {
            file_name: Some(n.into()),
            content_type: Some("image/jpeg".into()),
            body: Bytes::from_static(b"x"),
        };
        let plan = PhotoPlan::build(review_id, &[], vec![file("a.jpg"), file("a.jpg")]);
        assert_ne!(plan.uploads[0].key, plan.uploads[1].key);
    }

    #[tokio::test]
    async fn assemble_attaches_photos_and_author_names() {
        let state = AppState::fake();
        let review = Review {
            id: Uuid::new_v4(),
            spring_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            rating: 5,
            body: "Perfect soak.".into(),
            visit_date: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: None,
        };
        let photo = ReviewPhoto {
            id: Uuid::new_v4(),
            review_id: review.id,
            storage_path: format!("{}/abc.jpg", review.id),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let authors = vec![(review.user_id, Some("Riley".to_string()))];

        let assembled = assemble_reviews(
            vec![review.clone()],
            vec![photo.clone()],
            &authors,
            state.storage.as_ref(),
        );
        assert_eq!(assembled.len(), 1);
        assert_eq!(assembled[0].author_display_name.as_deref(), Some("Riley"));
        assert_eq!(assembled[0].photos.len(), 1);
        assert_eq!(
            assembled[0].photos[0].public_url,
            format!("https://fake.local/review-photos/{}", photo.storage_path)
        );
    }

    #[tokio::test]
    async fn assemble_leaves_author_unset_without_profile() {
        let state = AppState::fake();
        let review = Review {
            id: Uuid::new_v4(),
            spring_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            rating: 3,
            body: "Crowded.".into(),
            visit_date: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: None,
        };
        let assembled = assemble_reviews(vec![review], Vec::new(), &[], state.storage.as_ref());
        assert!(assembled[0].author_display_name.is_none());
        assert!(assembled[0].photos.is_empty());
    }
}
