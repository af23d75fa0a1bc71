//! In-memory search/filter pipeline for the map view. Pure functions over
//! the fetched catalog; the handler recomputes the result on every request.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::repo::HotSpring;

/// Mutually exclusive temperature bands. Classification is total over
/// nullable input: every spring falls in exactly one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempBand {
    Hot,
    Warm,
    Cool,
    Unknown,
}

impl TempBand {
    pub fn classify(temp_c: Option<f64>) -> Self {
        match temp_c {
            None => TempBand::Unknown,
            Some(t) if t >= 40.0 => TempBand::Hot,
            Some(t) if t >= 30.0 => TempBand::Warm,
            Some(_) => TempBand::Cool,
        }
    }
}

impl FromStr for TempBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hot" => Ok(TempBand::Hot),
            "warm" => Ok(TempBand::Warm),
            "cool" => Ok(TempBand::Cool),
            "unknown" => Ok(TempBand::Unknown),
            other => Err(format!("unknown temperature band: {}", other)),
        }
    }
}

/// Parse a comma-separated band list as used in the `bands` query param.
pub fn parse_bands(raw: &str) -> Result<Vec<TempBand>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(TempBand::from_str)
        .collect()
}

/// Apply the text and band filters conjunctively. An empty query and an
/// empty band set are both identity, not "match nothing".
pub fn apply(mut springs: Vec<HotSpring>, query: &str, bands: &[TempBand]) -> Vec<HotSpring> {
    if !query.is_empty() {
        let needle = query.to_lowercase();
        springs.retain(|s| {
            s.name.to_lowercase().contains(&needle)
                || s.state
                    .as_deref()
                    .is_some_and(|state| state.to_lowercase().contains(&needle))
        });
    }
    if !bands.is_empty() {
        springs.retain(|s| bands.contains(&TempBand::classify(s.water_temperature_c)));
    }
    springs
}

pub const FIT_PADDING: u32 = 100;
pub const FIT_DURATION_MS: u32 = 1000;

/// Viewport fit instruction for the map client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitBounds {
    pub min_longitude: f64,
    pub min_latitude: f64,
    pub max_longitude: f64,
    pub max_latitude: f64,
    pub padding: u32,
    pub duration_ms: u32,
}

/// Bounding box of the filtered set, produced only when the result is a
/// strict, non-empty subset of the full catalog. When filters are cleared
/// (or match nothing) the viewport stays where it is.
pub fn fit_bounds(filtered: &[HotSpring], total: usize) -> Option<FitBounds> {
    if filtered.is_empty() || filtered.len() >= total {
        return None;
    }
    let mut bounds = FitBounds {
        min_longitude: 180.0,
        min_latitude: 90.0,
        max_longitude: -180.0,
        max_latitude: -90.0,
        padding: FIT_PADDING,
        duration_ms: FIT_DURATION_MS,
    };
    for s in filtered {
        bounds.min_longitude = bounds.min_longitude.min(s.longitude);
        bounds.max_longitude = bounds.max_longitude.max(s.longitude);
        bounds.min_latitude = bounds.min_latitude.min(s.latitude);
        bounds.max_latitude = bounds.max_latitude.max(s.latitude);
    }
    Some(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn spring(name: &str, state: Option<&str>, temp_c: Option<f64>) -> HotSpring {
        HotSpring {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            latitude: 44.0,
            longitude: -115.5,
            elevation_m: None,
            description: None,
            state: state.map(str::to_string),
            access_notes: None,
            permit_required: false,
            drive_distance_km: None,
            hike_distance_km: None,
            water_temperature_c: temp_c,
            last_verified_at: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: None,
            hero_image_url: None,
        }
    }

    fn names(springs: &[HotSpring]) -> Vec<&str> {
        springs.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn classification_is_total_and_exhaustive() {
        assert_eq!(TempBand::classify(Some(40.0)), TempBand::Hot);
        assert_eq!(TempBand::classify(Some(39.999)), TempBand::Warm);
        assert_eq!(TempBand::classify(Some(30.0)), TempBand::Warm);
        assert_eq!(TempBand::classify(Some(29.999)), TempBand::Cool);
        assert_eq!(TempBand::classify(Some(-3.0)), TempBand::Cool);
        assert_eq!(TempBand::classify(None), TempBand::Unknown);
    }

    #[test]
    fn text_filter_matches_name_or_state_case_insensitively() {
        let all = vec![
            spring("Umpqua", Some("OR"), None),
            spring("Goldmyer", Some("WA"), None),
            spring("Oregon Trail Soak", Some("ID"), None),
        ];
        let out = apply(all, "or", &[]);
        assert_eq!(names(&out), vec!["Umpqua", "Oregon Trail Soak"]);
    }

    #[test]
    fn state_code_query_includes_state_matches_and_excludes_others() {
        // "OR" should match the state code, not require "Oregon" in the name.
        let all = vec![
            spring("Bagby", Some("OR"), None),
            spring("Trail Creek", Some("OR"), None),
            spring("Chena", Some("AK"), None),
        ];
        let out = apply(all, "OR", &[]);
        assert_eq!(names(&out), vec!["Bagby", "Trail Creek"]);
    }

    #[test]
    fn empty_query_and_empty_band_set_are_identity() {
        let all = vec![
            spring("A", Some("OR"), Some(45.0)),
            spring("B", None, None),
        ];
        let out = apply(all.clone(), "", &[]);
        assert_eq!(out.len(), all.len());
    }

    #[test]
    fn band_filter_keeps_union_of_selected_bands() {
        let all = vec![
            spring("Hot One", None, Some(45.0)),
            spring("Warm One", None, Some(35.0)),
            spring("Cool One", None, Some(20.0)),
            spring("Mystery", None, None),
        ];
        let out = apply(all, "", &[TempBand::Hot, TempBand::Cool]);
        assert_eq!(names(&out), vec!["Hot One", "Cool One"]);
    }

    #[test]
    fn filters_compose_conjunctively_and_commute() {
        let all = vec![
            spring("Bagby", Some("OR"), Some(42.0)),
            spring("Bagby Lower", Some("OR"), Some(25.0)),
            spring("Goldmyer", Some("WA"), Some(41.0)),
        ];
        let text_then_band = apply(
            apply(all.clone(), "OR", &[]),
            "",
            &[TempBand::Hot],
        );
        let band_then_text = apply(
            apply(all.clone(), "", &[TempBand::Hot]),
            "OR",
            &[],
        );
        let combined = apply(all, "OR", &[TempBand::Hot]);
        assert_eq!(names(&text_then_band), vec!["Bagby"]);
        assert_eq!(names(&band_then_text), names(&text_then_band));
        assert_eq!(names(&combined), names(&text_then_band));
    }

    #[test]
    fn reapplying_a_filter_is_a_no_op() {
        let all = vec![
            spring("Hot One", None, Some(45.0)),
            spring("Cool One", None, Some(20.0)),
        ];
        let once = apply(all, "hot", &[TempBand::Hot]);
        let twice = apply(once.clone(), "hot", &[TempBand::Hot]);
        assert_eq!(names(&once), names(&twice));
    }

    #[test]
    fn parse_bands_accepts_comma_list_and_rejects_junk() {
        assert_eq!(
            parse_bands("hot,cool").unwrap(),
            vec![TempBand::Hot, TempBand::Cool]
        );
        assert_eq!(parse_bands("").unwrap(), Vec::<TempBand>::new());
        assert_eq!(
            parse_bands(" warm , unknown ").unwrap(),
            vec![TempBand::Warm, TempBand::Unknown]
        );
        assert!(parse_bands("hot,tepid").is_err());
    }

    #[test]
    fn fit_bounds_only_for_strict_non_empty_subset() {
        let mut a = spring("A", None, None);
        a.latitude = 44.0;
        a.longitude = -116.0;
        let mut b = spring("B", None, None);
        b.latitude = 46.5;
        b.longitude = -121.0;
        let all = vec![a.clone(), b.clone()];

        // Filters cleared: same size, no viewport change.
        assert_eq!(fit_bounds(&all, all.len()), None);
        // Nothing matched: no viewport change either.
        assert_eq!(fit_bounds(&[], all.len()), None);

        let bounds = fit_bounds(&all[..1], 2).expect("strict subset has bounds");
        assert_eq!(bounds.min_latitude, 44.0);
        assert_eq!(bounds.max_latitude, 44.0);
        assert_eq!(bounds.min_longitude, -116.0);
        assert_eq!(bounds.max_longitude, -116.0);
        assert_eq!(bounds.padding, FIT_PADDING);
        assert_eq!(bounds.duration_ms, FIT_DURATION_MS);
    }

    #[test]
    fn fit_bounds_spans_the_filtered_set() {
        let mut a = spring("A", None, None);
        a.latitude = 44.0;
        a.longitude = -116.0;
        let mut b = spring("B", None, None);
        b.latitude = 46.5;
        b.longitude = -121.0;
        let filtered = vec![a, b];

        let bounds = fit_bounds(&filtered, 3).unwrap();
        assert_eq!(bounds.min_latitude, 44.0);
        assert_eq!(bounds.max_latitude, 46.5);
        assert_eq!(bounds.min_longitude, -121.0);
        assert_eq!(bounds.max_longitude, -116.0);
    }
}
