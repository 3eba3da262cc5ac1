//! Staff-line detection from a binary edge map.
//!
//! A row's projection is the number of interior pixels brighter than the
//! "on" threshold. Rows above a fraction of the strongest row are candidates;
//! adjacent candidates collapse into one line, and a page with too many lines
//! keeps every other one because the edge filter reports both sides of each
//! physical line.

use crate::config::StaffParams;
use image::GrayImage;
use tracing::debug;

/// Per-row count of "on" pixels, skipping the outermost rows and columns
pub fn horizontal_projection(edges: &GrayImage, on_threshold: u8) -> Vec<u32> {
    let (width, height) = edges.dimensions();
    let mut profile = vec![0u32; height as usize];

    if width < 3 || height < 3 {
        return profile;
    }

    for y in 1..height - 1 {
        profile[y as usize] = (1..width - 1)
            .filter(|&x| edges.get_pixel(x, y)[0] > on_threshold)
            .count() as u32;
    }

    profile
}

/// Rows whose projection exceeds `peak_fraction` of the maximum
pub fn candidate_rows(profile: &[u32], peak_fraction: f64) -> Vec<u32> {
    let max = profile.iter().copied().max().unwrap_or(0);
    let threshold = max as f64 * peak_fraction;

    profile
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count as f64 > threshold)
        .map(|(y, _)| y as u32)
        .collect()
}

/// Greedily keep candidates at least `min_distance` rows after the last kept one
pub fn collapse_adjacent(candidates: &[u32], min_distance: u32) -> Vec<u32> {
    let mut lines: Vec<u32> = Vec::new();
    for &row in candidates {
        match lines.last() {
            Some(&last) if row < last + min_distance => {}
            _ => lines.push(row),
        }
    }
    lines
}

/// Keep even positions when more than `limit` lines survived
pub fn remove_doubled_lines(lines: &[u32], limit: usize) -> Vec<u32> {
    if lines.len() > limit {
        lines.iter().step_by(2).copied().collect()
    } else {
        lines.to_vec()
    }
}

/// Detect staff-line rows, ascending, no two closer than `min_line_distance`
pub fn detect_staff_lines(edges: &GrayImage, params: &StaffParams) -> Vec<u32> {
    let profile = horizontal_projection(edges, params.on_threshold);
    let candidates = candidate_rows(&profile, params.peak_fraction);
    let collapsed = collapse_adjacent(&candidates, params.min_line_distance);
    let lines = remove_doubled_lines(&collapsed, params.doubling_limit);

    debug!(
        candidates = candidates.len(),
        collapsed = collapsed.len(),
        lines = lines.len(),
        "staff line detection"
    );

    lines
}
