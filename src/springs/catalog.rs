//! Catalog fetch and rating normalization.

use std::cmp::Ordering;
use std::collections::HashMap;

use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::dto::RatedSpring;
use super::repo::{self, HotSpring, RatingRow};

/// Fixed page size for the full-catalog fetch.
pub const CATALOG_PAGE_SIZE: i64 = 1000;

/// Featured batch size on the landing list when no query is given.
pub const FEATURED_LIMIT: usize = 6;
/// Result cap on the landing list when searching.
pub const SEARCH_LIMIT: usize = 50;
/// How many rows to fetch for the featured batch before ranking.
const FEATURED_FETCH_LIMIT: i64 = 20;

/// Fetch the complete catalog with successive fixed-size pages. A failed
/// page aborts further paging and yields whatever was accumulated so far;
/// a transient mid-fetch failure therefore produces an incomplete result
/// set rather than an empty one.
pub async fn fetch_full_catalog(db: &PgPool) -> Vec<HotSpring> {
    let mut all = Vec::new();
    let mut page: i64 = 0;
    loop {
        match repo::list_page(db, CATALOG_PAGE_SIZE, page * CATALOG_PAGE_SIZE).await {
            Ok(rows) => {
                let fetched = rows.len();
                all.extend(rows);
                if fetched < CATALOG_PAGE_SIZE as usize {
                    break;
                }
                page += 1;
            }
            Err(e) => {
                warn!(error = %e, page, accumulated = all.len(),
                      "catalog page fetch failed, returning partial catalog");
                break;
            }
        }
    }
    all
}

/// Attach the derived average rating to each spring: mean of its review
/// ratings, or 0.0 when it has none.
pub fn attach_average_ratings(springs: Vec<HotSpring>, ratings: &[RatingRow]) -> Vec<RatedSpring> {
    let mut by_spring: HashMap<Uuid, (i64, i64)> = HashMap::new();
    for r in ratings {
        let entry = by_spring.entry(r.spring_id).or_insert((0, 0));
        entry.0 += r.rating as i64;
        entry.1 += 1;
    }
    springs
        .into_iter()
        .map(|spring| {
            let average_rating = match by_spring.get(&spring.id) {
                Some((sum, count)) if *count > 0 => *sum as f64 / *count as f64,
                _ => 0.0,
            };
            RatedSpring {
                spring,
                average_rating,
            }
        })
        .collect()
}

/// Rank by average rating descending, ties broken by name ascending
/// case-insensitively.
pub fn sort_by_rating(rated: &mut [RatedSpring]) {
    rated.sort_by(|a, b| {
        b.average_rating
            .partial_cmp(&a.average_rating)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                a.spring
                    .name
                    .to_lowercase()
                    .cmp(&b.spring.name.to_lowercase())
            })
    });
}

/// Landing-page list: search (or featured batch), derived ratings,
/// rating-ranked and truncated.
pub async fn popular(db: &PgPool, query: Option<&str>) -> anyhow::Result<Vec<RatedSpring>> {
    let searching = query.is_some_and(|q| !q.is_empty());
    let springs = repo::search(db, query, FEATURED_FETCH_LIMIT).await?;
    let ids: Vec<Uuid> = springs.iter().map(|s| s.id).collect();
    let ratings = repo::ratings_for(db, &ids).await?;

    let mut rated = attach_average_ratings(springs, &ratings);
    sort_by_rating(&mut rated);
    rated.truncate(if searching { SEARCH_LIMIT } else { FEATURED_LIMIT });
    Ok(rated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn spring(name: &str) -> HotSpring {
        HotSpring {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            latitude: 44.0,
            longitude: -115.5,
            elevation_m: None,
            description: None,
            state: None,
            access_notes: None,
            permit_required: false,
            drive_distance_km: None,
            hike_distance_km: None,
            water_temperature_c: None,
            last_verified_at: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: None,
            hero_image_url: None,
        }
    }

    fn rating(spring_id: Uuid, value: i32) -> RatingRow {
        RatingRow {
            spring_id,
            rating: value,
        }
    }

    #[test]
    fn average_is_mean_of_attached_ratings() {
        let s = spring("Bagby");
        let ratings = vec![rating(s.id, 5), rating(s.id, 3), rating(s.id, 4)];
        let rated = attach_average_ratings(vec![s], &ratings);
        assert_eq!(rated[0].average_rating, 4.0);
    }

    #[test]
    fn average_is_zero_without_reviews() {
        let rated = attach_average_ratings(vec![spring("Lonely")], &[]);
        assert_eq!(rated[0].average_rating, 0.0);
    }

    #[test]
    fn ranking_is_rating_desc_then_name_asc_case_insensitive() {
        let a = spring("umpqua");
        let b = spring("Bagby");
        let c = spring("Chena");
        let ratings = vec![rating(c.id, 5), rating(a.id, 3), rating(b.id, 3)];
        let mut rated = attach_average_ratings(vec![a, b, c], &ratings);
        sort_by_rating(&mut rated);
        let names: Vec<&str> = rated.iter().map(|r| r.spring.name.as_str()).collect();
        assert_eq!(names, vec!["Chena", "Bagby", "umpqua"]);
    }

    #[test]
    fn unrated_springs_rank_below_rated_ones() {
        let rated_spring = spring("Rated");
        let unrated = spring("Aardvark");
        let ratings = vec![rating(rated_spring.id, 1)];
        let mut rated = attach_average_ratings(vec![unrated, rated_spring], &ratings);
        sort_by_rating(&mut rated);
        assert_eq!(rated[0].spring.name, "Rated");
        assert_eq!(rated[1].average_rating, 0.0);
    }
}
