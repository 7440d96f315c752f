//! Plate candidate scoring.
//!
//! `total = 0.7 * ratio_score + 0.3 * area_score`, where the ratio score
//! peaks at the 3.3:1 Korean plate ratio and the area score saturates at
//! 10,000 pixels. Scores at or below [`MIN_TOTAL_SCORE`] are not trusted.

use crate::preprocessing::raster::Region;
use serde::Serialize;

/// Ideal plate `width / height`
pub const IDEAL_ASPECT_RATIO: f64 = 3.3;
/// Area at which the area score saturates
pub const AREA_SATURATION: f64 = 10_000.0;
pub const RATIO_WEIGHT: f64 = 0.7;
pub const AREA_WEIGHT: f64 = 0.3;
/// Best score must be strictly greater than this to be accepted
pub const MIN_TOTAL_SCORE: f64 = 0.3;

/// A candidate region with its score breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub region: Region,
    pub aspect_ratio: f64,
    pub ratio_score: f64,
    pub area_score: f64,
    pub total_score: f64,
}

pub fn score(region: &Region) -> ScoredCandidate {
    let aspect_ratio = region.aspect_ratio();
    let ratio_score = 1.0 - (aspect_ratio - IDEAL_ASPECT_RATIO).abs() / IDEAL_ASPECT_RATIO;
    let area_score = (region.area() as f64 / AREA_SATURATION).min(1.0);
    ScoredCandidate {
        region: *region,
        aspect_ratio,
        ratio_score,
        area_score,
        total_score: RATIO_WEIGHT * ratio_score + AREA_WEIGHT * area_score,
    }
}

/// Score every candidate, keeping discovery order
pub fn score_all(candidates: &[Region]) -> Vec<ScoredCandidate> {
    candidates.iter().map(score).collect()
}

/// Pick the highest-scoring candidate; the first one wins ties.
///
/// Returns `None` for an empty list or when the best score is `<= 0.3`.
pub fn select_best(scored: &[ScoredCandidate]) -> Option<ScoredCandidate> {
    let mut best: Option<&ScoredCandidate> = None;
    for candidate in scored {
        match best {
            Some(current) if candidate.total_score <= current.total_score => {}
            _ => best = Some(candidate),
        }
    }

    best.filter(|c| c.total_score > MIN_TOTAL_SCORE).copied()
}
