use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, instrument};
use uuid::Uuid;

use super::catalog;
use super::dto::{ListQuery, MapQuery, MapResponse, RatedSpring, SpringDetails};
use super::filter;
use crate::richtext;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/springs", get(list_springs))
        .route("/springs/map", get(map_springs))
        .route("/springs/:id", get(get_spring))
}

/// Landing list: rating-ranked springs, optionally narrowed by a
/// name/state search query.
#[instrument(skip(state))]
pub async fn list_springs(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<RatedSpring>>, (StatusCode, String)> {
    let springs = catalog::popular(&state.db, q.q.as_deref())
        .await
        .map_err(internal)?;
    Ok(Json(springs))
}

/// Map view: the full catalog run through the text/band filter pipeline,
/// with viewport fit bounds when the result narrows the catalog.
#[instrument(skip(state))]
pub async fn map_springs(
    State(state): State<AppState>,
    Query(q): Query<MapQuery>,
) -> Result<Json<MapResponse>, (StatusCode, String)> {
    let bands = match q.bands.as_deref() {
        Some(raw) => filter::parse_bands(raw).map_err(|e| (StatusCode::BAD_REQUEST, e))?,
        None => Vec::new(),
    };

    let all = catalog::fetch_full_catalog(&state.db).await;
    let total = all.len();
    let springs = filter::apply(all, q.q.as_deref().unwrap_or(""), &bands);
    let fit_bounds = filter::fit_bounds(&springs, total);

    Ok(Json(MapResponse {
        springs,
        fit_bounds,
        total,
    }))
}

#[instrument(skip(state))]
pub async fn get_spring(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SpringDetails>, (StatusCode, String)> {
    let spring = match super::repo::get(&state.db, id).await {
        Ok(Some(s)) => s,
        Ok(None) => return Err((StatusCode::NOT_FOUND, "Spring not found".into())),
        Err(e) => {
            error!(error = %e, %id, "get_spring failed");
            return Err(internal(e));
        }
    };

    let description_blocks = richtext::render(spring.description.as_deref());
    Ok(Json(SpringDetails {
        spring,
        description_blocks,
    }))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
