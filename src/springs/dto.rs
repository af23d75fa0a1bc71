use serde::{Deserialize, Serialize};

use super::filter::FitBounds;
use super::repo::HotSpring;
use crate::richtext::Block;

/// Spring with its derived, non-persisted average rating.
#[derive(Debug, Clone, Serialize)]
pub struct RatedSpring {
    #[serde(flatten)]
    pub spring: HotSpring,
    pub average_rating: f64,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MapQuery {
    #[serde(default)]
    pub q: Option<String>,
    /// Comma-separated temperature bands, e.g. `hot,cool`.
    #[serde(default)]
    pub bands: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MapResponse {
    pub springs: Vec<HotSpring>,
    /// Present only when the filtered set is a strict, non-empty subset
    /// of the catalog; the client fits its viewport to these bounds.
    pub fit_bounds: Option<FitBounds>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct SpringDetails {
    #[serde(flatten)]
    pub spring: HotSpring,
    /// Description rendered into display nodes.
    pub description_blocks: Vec<Block>,
}
