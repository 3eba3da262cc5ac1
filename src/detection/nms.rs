use crate::models::Detection;

/// Greedy non-maximum suppression.
///
/// Detections are visited by descending score, ties in discovery order. Each
/// kept detection discards the remaining ones whose overlap with it, measured
/// against the smaller box, is above `overlap_threshold`. Survivors come back
/// in discovery order.
pub fn non_max_suppression(detections: &[Detection], overlap_threshold: f64) -> Vec<Detection> {
    let mut remaining: Vec<Detection> = detections.to_vec();
    remaining.sort_by_key(|d| d.index);
    // Stable, so equal scores stay in discovery order
    remaining.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept = Vec::new();
    while !remaining.is_empty() {
        let best = remaining.remove(0);
        remaining.retain(|d| best.bbox.overlap_fraction(&d.bbox) <= overlap_threshold);
        kept.push(best);
    }

    kept.sort_by_key(|d| d.index);
    kept
}
