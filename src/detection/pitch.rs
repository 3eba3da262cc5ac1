//! Pitch labels from a note's vertical position relative to its staff.
//!
//! Staff lines are grouped into consecutive chunks of five. Each chunk owns a
//! band of rows ending `band_margin` rows below its lowest line; a note's band
//! picks the staff, and the staff's parity picks one of two fixed ladders.
//! A short final chunk still closes its band but has no ladder, so notes in
//! it stay unclassified.

use crate::config::PitchParams;
use crate::models::{ClassifiedNote, Detection, PitchLabel, Staff};
use tracing::debug;

/// One chunk of up to five lines and the band it closes
#[derive(Debug, Clone, PartialEq)]
pub struct StaffBand {
    pub index: usize,
    /// None for a chunk with fewer than five lines
    pub staff: Option<Staff>,
    /// Exclusive lower edge of the band
    pub cutoff: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaffLayout {
    pub bands: Vec<StaffBand>,
}

impl StaffLayout {
    pub fn from_lines(lines: &[u32], params: &PitchParams) -> Self {
        let bands = lines
            .chunks(5)
            .enumerate()
            .map(|(index, chunk)| {
                let lowest = chunk.iter().copied().max().unwrap_or(0);
                StaffBand {
                    index,
                    staff: Staff::from_chunk(chunk),
                    cutoff: lowest as i64 + params.band_margin as i64,
                }
            })
            .collect();
        Self { bands }
    }

    pub fn staves(&self) -> impl Iterator<Item = &Staff> {
        self.bands.iter().filter_map(|b| b.staff.as_ref())
    }

    /// Band containing row `y`; rows exactly on a cutoff belong to none
    pub fn band_for(&self, y: i64) -> Option<&StaffBand> {
        let mut lower: Option<i64> = None;
        for band in &self.bands {
            let above_lower = lower.is_none_or(|l| y > l);
            if above_lower && y < band.cutoff {
                return Some(band);
            }
            lower = Some(band.cutoff);
        }
        None
    }
}

const EVEN_TOP_MARGIN: i64 = 5;
const EVEN_A_LOW: i64 = 2;
const EVEN_A_HIGH: i64 = 8;
const EVEN_BOTTOM_MARGIN: i64 = 5;
const ODD_TOP_MARGIN: i64 = 15;

/// Ladder for staves at even positions (0, 2, ...)
fn even_ladder(staff: &Staff, v: i64) -> PitchLabel {
    let [l0, l1, l2, l3, l4] = staff.lines.map(|l| l as i64);

    if v < l0 - EVEN_TOP_MARGIN {
        PitchLabel::B
    } else if v < l1 {
        PitchLabel::D
    } else if v < l2 {
        PitchLabel::B
    } else if l2 - EVEN_A_LOW <= v && v < l3 - EVEN_A_HIGH {
        PitchLabel::A
    } else if l2 <= v && v < l3 {
        PitchLabel::G
    } else if l3 <= v && v < l4 {
        PitchLabel::G
    } else if l4 - EVEN_BOTTOM_MARGIN <= v && v <= l4 {
        PitchLabel::D
    } else {
        // Both remaining rungs (v < l4 + 5 and beyond) read B
        PitchLabel::B
    }
}

/// Ladder for staves at odd positions (1, 3, ...)
fn odd_ladder(staff: &Staff, v: i64) -> PitchLabel {
    let [l0, l1, l2, l3, l4] = staff.lines.map(|l| l as i64);

    if v < l0 - ODD_TOP_MARGIN {
        PitchLabel::C
    } else if v < l0 {
        PitchLabel::B
    } else if v < l1 {
        PitchLabel::G
    } else if v < l2 {
        PitchLabel::D
    } else if v < l3 {
        PitchLabel::A
    } else if v < l4 {
        PitchLabel::G
    } else {
        PitchLabel::Unclassified
    }
}

/// Label for row `v` against the staff at position `staff_index`
pub fn classify_row(staff: &Staff, staff_index: usize, v: i64) -> PitchLabel {
    if staff_index % 2 == 0 {
        even_ladder(staff, v)
    } else {
        odd_ladder(staff, v)
    }
}

/// Assign a label to every note, keyed by the note's top edge.
///
/// The output has one entry per input detection, in input order.
pub fn classify_notes(lines: &[u32], notes: &[Detection], params: &PitchParams) -> Vec<ClassifiedNote> {
    let layout = StaffLayout::from_lines(lines, params);
    if layout.bands.iter().any(|b| b.staff.is_none()) {
        debug!(lines = lines.len(), "partial staff chunk, its notes stay unclassified");
    }

    notes
        .iter()
        .map(|detection| {
            let v = detection.y() as i64;
            let band = layout.band_for(v);
            let label = band
                .and_then(|b| b.staff.as_ref().map(|staff| classify_row(staff, b.index, v)))
                .unwrap_or(PitchLabel::Unclassified);
            ClassifiedNote {
                detection: *detection,
                label,
                staff_index: band.map(|b| b.index),
            }
        })
        .collect()
}
