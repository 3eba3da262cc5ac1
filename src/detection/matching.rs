//! Brute-force template search scored by zero-normalized cross-correlation.
//!
//! Every placement where the template fits inside the page is scored. Windows
//! are visited column by column (x outer, y inner), which fixes the discovery
//! order carried by each [`Detection::index`].

use crate::config::MatchParams;
use crate::detection::preprocessing::to_grayscale;
use crate::error::{OmrError, OmrResult};
use crate::models::{BoundingBox, Detection, SymbolKind};
use image::{GrayImage, ImageReader};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A fixed query pattern
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub kind: SymbolKind,
    pub image: GrayImage,
}

impl Template {
    pub fn new(name: impl Into<String>, kind: SymbolKind, image: GrayImage) -> OmrResult<Self> {
        let name = name.into();
        if image.width() == 0 || image.height() == 0 {
            return Err(OmrError::EmptyTemplate { name });
        }
        Ok(Self { name, kind, image })
    }

    /// Decode a template file and convert it to grayscale
    pub fn load(path: impl AsRef<Path>, kind: SymbolKind) -> OmrResult<Self> {
        let path = path.as_ref();
        let image = ImageReader::open(path)
            .map_err(image::ImageError::IoError)
            .and_then(|reader| reader.decode())
            .map_err(|source| OmrError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(path.display().to_string(), kind, to_grayscale(&image))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// The note template plus the two auxiliary shapes
#[derive(Debug, Clone)]
pub struct TemplateSet {
    pub note: Template,
    pub shape_a: Template,
    pub shape_b: Template,
}

impl TemplateSet {
    pub fn load(note: impl AsRef<Path>, shape_a: impl AsRef<Path>, shape_b: impl AsRef<Path>) -> OmrResult<Self> {
        Ok(Self {
            note: Template::load(note, SymbolKind::Note)?,
            shape_a: Template::load(shape_a, SymbolKind::ShapeA)?,
            shape_b: Template::load(shape_b, SymbolKind::ShapeB)?,
        })
    }

    pub fn get(&self, kind: SymbolKind) -> &Template {
        match kind {
            SymbolKind::Note => &self.note,
            SymbolKind::ShapeA => &self.shape_a,
            SymbolKind::ShapeB => &self.shape_b,
        }
    }
}

/// Cancellation token with an optional deadline.
///
/// Clones share the cancel flag, so any clone can stop a running search.
#[derive(Debug, Clone)]
pub struct SearchBudget {
    started: Instant,
    deadline: Option<Duration>,
    cancelled: Arc<AtomicBool>,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        Self {
            started: Instant::now(),
            deadline: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_deadline(deadline: Option<Duration>) -> Self {
        Self {
            deadline,
            ..Self::unlimited()
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Err once cancelled or past the deadline
    pub fn check(&self) -> OmrResult<()> {
        if self.is_cancelled() {
            return Err(OmrError::SearchCancelled);
        }
        if let Some(deadline) = self.deadline {
            let elapsed = self.started.elapsed();
            if elapsed > deadline {
                return Err(OmrError::DeadlineExceeded { elapsed });
            }
        }
        Ok(())
    }
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Intensity sums of one buffer, reused across every window
#[derive(Debug, Clone, Copy)]
struct Moments {
    n: i128,
    sum: i128,
    sum_sq: i128,
}

impl Moments {
    fn of(pixels: &[u8]) -> Self {
        let (sum, sum_sq) = pixels.iter().fold((0u64, 0u64), |(s, sq), &p| {
            let p = p as u64;
            (s + p, sq + p * p)
        });
        Self {
            n: pixels.len() as i128,
            sum: sum as i128,
            sum_sq: sum_sq as i128,
        }
    }

    /// n·Σx² − (Σx)², zero exactly when the buffer is flat
    fn spread(&self) -> i128 {
        self.n * self.sum_sq - self.sum * self.sum
    }
}

fn correlation_from(template: &Moments, region: &Moments, sum_xy: u64) -> f64 {
    let numerator = template.n * sum_xy as i128 - template.sum * region.sum;
    let denominator_sq = template.spread() as f64 * region.spread() as f64;
    if denominator_sq == 0.0 {
        return 0.0;
    }
    (numerator as f64 / denominator_sq.sqrt()).clamp(-1.0, 1.0)
}

/// Pearson correlation of two equal-sized intensity buffers.
///
/// A flat buffer on either side gives 0.
pub fn zncc(template: &[u8], region: &[u8]) -> OmrResult<f64> {
    if template.len() != region.len() {
        return Err(OmrError::LengthMismatch {
            template: template.len(),
            region: region.len(),
        });
    }
    let sum_xy = template
        .iter()
        .zip(region)
        .map(|(&a, &b)| a as u64 * b as u64)
        .sum();
    Ok(correlation_from(&Moments::of(template), &Moments::of(region), sum_xy))
}

/// Score the window whose top-left corner is (x, y)
fn window_correlation(page: &GrayImage, template: &GrayImage, moments: &Moments, x: u32, y: u32) -> f64 {
    let (tw, th) = template.dimensions();
    let mut sum = 0u64;
    let mut sum_sq = 0u64;
    let mut sum_xy = 0u64;

    for ty in 0..th {
        for tx in 0..tw {
            let a = template.get_pixel(tx, ty)[0] as u64;
            let b = page.get_pixel(x + tx, y + ty)[0] as u64;
            sum += b;
            sum_sq += b * b;
            sum_xy += a * b;
        }
    }

    let region = Moments {
        n: moments.n,
        sum: sum as i128,
        sum_sq: sum_sq as i128,
    };
    correlation_from(moments, &region, sum_xy)
}

fn scan_column(
    page: &GrayImage,
    template: &GrayImage,
    moments: &Moments,
    x: u32,
    max_y: u32,
    threshold: f64,
    budget: &SearchBudget,
) -> OmrResult<Vec<(u32, u32, f64)>> {
    budget.check()?;
    Ok((0..=max_y)
        .filter_map(|y| {
            let score = window_correlation(page, template, moments, x, y);
            (score >= threshold).then_some((x, y, score))
        })
        .collect())
}

/// Every placement of `template` inside `page` scoring at least the threshold
pub fn match_template(
    page: &GrayImage,
    template: &Template,
    params: &MatchParams,
    budget: &SearchBudget,
) -> OmrResult<Vec<Detection>> {
    let (pw, ph) = page.dimensions();
    if pw == 0 || ph == 0 {
        return Err(OmrError::EmptyImage { width: pw, height: ph });
    }

    let (tw, th) = template.image.dimensions();
    if tw > pw || th > ph {
        warn!(
            template = %template.name,
            "template {}x{} does not fit page {}x{}", tw, th, pw, ph
        );
        return Ok(Vec::new());
    }

    let moments = Moments::of(template.image.as_raw());
    let max_x = pw - tw;
    let max_y = ph - th;
    let started = Instant::now();

    let scan = |x: u32| scan_column(page, &template.image, &moments, x, max_y, params.threshold, budget);

    #[cfg(feature = "rayon")]
    let columns: Vec<Vec<(u32, u32, f64)>> = if params.use_parallel() {
        use rayon::prelude::*;
        (0..=max_x).into_par_iter().map(scan).collect::<OmrResult<_>>()?
    } else {
        (0..=max_x).map(scan).collect::<OmrResult<_>>()?
    };
    #[cfg(not(feature = "rayon"))]
    let columns: Vec<Vec<(u32, u32, f64)>> = (0..=max_x).map(scan).collect::<OmrResult<_>>()?;

    let detections: Vec<Detection> = columns
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(index, (x, y, score))| Detection {
            index,
            bbox: BoundingBox::new(x, y, tw, th),
            score,
        })
        .collect();

    debug!(
        template = %template.name,
        windows = (max_x as u64 + 1) * (max_y as u64 + 1),
        detections = detections.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "template search"
    );

    Ok(detections)
}
