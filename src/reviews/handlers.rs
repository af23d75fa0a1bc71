use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use time::{macros::format_description, Date};
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::dto::{AuthoredReview, ReviewWriteResponse};
use super::repo;
use super::services::{self, NewPhoto, PhotoPlan};
use crate::auth::jwt::AuthUser;
use crate::profiles;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/springs/:id/reviews", get(list_reviews))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/springs/:id/reviews", post(create_review))
        .route("/reviews/:id", put(update_review))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(spring_id): Path<Uuid>,
) -> Result<Json<Vec<AuthoredReview>>, (StatusCode, String)> {
    let reviews = repo::list_for_spring(&state.db, spring_id)
        .await
        .map_err(internal)?;

    let review_ids: Vec<Uuid> = reviews.iter().map(|r| r.id).collect();
    let photos = repo::photos_for_reviews(&state.db, &review_ids)
        .await
        .map_err(internal)?;

    let mut user_ids: Vec<Uuid> = reviews.iter().map(|r| r.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    // An author lookup failure degrades to anonymous reviews.
    let authors = match profiles::display_names(&state.db, &user_ids).await {
        Ok(rows) => rows,
        Err(e) => {
            error!(error = %e, %spring_id, "author lookup failed");
            Vec::new()
        }
    };

    Ok(Json(services::assemble_reviews(
        reviews,
        photos,
        &authors,
        state.storage.as_ref(),
    )))
}

/// Fields of the multipart review form. `rating` and `body` are text
/// parts; `photos` parts carry new files; `remove_photo_ids` (edit only)
/// is a comma-separated list of photo ids to detach.
#[derive(Debug, Default)]
struct ReviewForm {
    rating: Option<i32>,
    body: Option<String>,
    visit_date: Option<Date>,
    remove_photo_ids: Vec<Uuid>,
    photos: Vec<NewPhoto>,
}

async fn read_form(mut mp: Multipart) -> Result<ReviewForm, (StatusCode, String)> {
    let date_format = format_description!("[year]-[month]-[day]");
    let mut form = ReviewForm::default();
    while let Ok(Some(field)) = mp.next_field().await {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("rating") => {
                let text = field.text().await.map_err(bad_request)?;
                form.rating =
                    Some(text.trim().parse::<i32>().map_err(|_| {
                        (StatusCode::BAD_REQUEST, "rating must be an integer".into())
                    })?);
            }
            Some("body") => {
                form.body = Some(field.text().await.map_err(bad_request)?);
            }
            Some("visit_date") => {
                let text = field.text().await.map_err(bad_request)?;
                if !text.trim().is_empty() {
                    let date = Date::parse(text.trim(), &date_format).map_err(|_| {
                        (
                            StatusCode::BAD_REQUEST,
                            "visit_date must be YYYY-MM-DD".into(),
                        )
                    })?;
                    form.visit_date = Some(date);
                }
            }
            Some("remove_photo_ids") => {
                let text = field.text().await.map_err(bad_request)?;
                for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    let id = part.parse::<Uuid>().map_err(|_| {
                        (
                            StatusCode::BAD_REQUEST,
                            format!("invalid photo id: {}", part),
                        )
                    })?;
                    form.remove_photo_ids.push(id);
                }
            }
            Some("photos") | Some("photos[]") => {
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let body = field.bytes().await.map_err(bad_request)?;
                form.photos.push(NewPhoto {
                    file_name,
                    content_type,
                    body,
                });
            }
            _ => {}
        }
    }
    Ok(form)
}

fn validate(form: &ReviewForm) -> Result<(i32, &str), (StatusCode, String)> {
    let rating = form
        .rating
        .ok_or((StatusCode::BAD_REQUEST, "rating is required".into()))?;
    services::validate_rating(rating).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    let body = form
        .body
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .ok_or((StatusCode::BAD_REQUEST, "body is required".into()))?;
    Ok((rating, body))
}

#[instrument(skip(state, mp))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(spring_id): Path<Uuid>,
    mp: Multipart,
) -> Result<(StatusCode, HeaderMap, Json<ReviewWriteResponse>), (StatusCode, String)> {
    let form = read_form(mp).await?;
    let (rating, body) = validate(&form)?;

    let review = match repo::insert(&state.db, spring_id, user_id, rating, body, form.visit_date)
        .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, %spring_id, %user_id, "create review failed");
            return Err(internal(e));
        }
    };

    let plan = PhotoPlan::build(review.id, &form.remove_photo_ids, form.photos);
    services::reconcile_photos(&state, review.id, plan).await;

    info!(review_id = %review.id, %spring_id, %user_id, "review posted");
    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/reviews/{}", review.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }
    Ok((
        StatusCode::CREATED,
        headers,
        Json(ReviewWriteResponse {
            id: review.id,
            created_at: review.created_at,
        }),
    ))
}

#[instrument(skip(state, mp))]
pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(review_id): Path<Uuid>,
    mp: Multipart,
) -> Result<Json<ReviewWriteResponse>, (StatusCode, String)> {
    let form = read_form(mp).await?;
    let (rating, body) = validate(&form)?;

    // Ownership gate: editing someone else's review looks like a miss.
    let existing = match repo::get_owned(&state.db, review_id, user_id).await {
        Ok(Some(r)) => r,
        Ok(None) => return Err((StatusCode::NOT_FOUND, "Review not found".into())),
        Err(e) => {
            error!(error = %e, %review_id, %user_id, "review lookup failed");
            return Err(internal(e));
        }
    };

    let updated = match repo::update(&state.db, existing.id, rating, body, form.visit_date).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, %review_id, "update review failed");
            return Err(internal(e));
        }
    };

    let plan = PhotoPlan::build(updated.id, &form.remove_photo_ids, form.photos);
    services::reconcile_photos(&state, updated.id, plan).await;

    info!(%review_id, %user_id, "review updated");
    Ok(Json(ReviewWriteResponse {
        id: updated.id,
        created_at: updated.created_at,
    }))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn bad_request<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, e.to_string())
}
