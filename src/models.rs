use serde::{Deserialize, Serialize};

/// Axis-aligned box in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn intersection_area(&self, other: &BoundingBox) -> u64 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return 0;
        }

        (right - left) as u64 * (bottom - top) as u64
    }

    /// Intersection divided by the smaller of the two areas
    pub fn overlap_fraction(&self, other: &BoundingBox) -> f64 {
        let smaller = self.area().min(other.area());
        if smaller == 0 {
            return 0.0;
        }
        self.intersection_area(other) as f64 / smaller as f64
    }
}

/// What a template depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Note,
    ShapeA,
    ShapeB,
}

impl SymbolKind {
    /// Label written to the results file for unclassified symbol kinds
    pub fn record_label(&self) -> &'static str {
        match self {
            SymbolKind::Note => "Note",
            SymbolKind::ShapeA => "Green",
            SymbolKind::ShapeB => "Blue",
        }
    }
}

/// One window whose correlation with a template reached the threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Position in the matcher's column-major scan order
    pub index: usize,
    pub bbox: BoundingBox,
    pub score: f64,
}

impl Detection {
    pub fn x(&self) -> u32 {
        self.bbox.x
    }

    pub fn y(&self) -> u32 {
        self.bbox.y
    }
}

/// Five staff-line rows of one staff, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub lines: [u32; 5],
}

impl Staff {
    /// Build a staff from exactly five ascending rows
    pub fn from_chunk(chunk: &[u32]) -> Option<Self> {
        let lines: [u32; 5] = chunk.try_into().ok()?;
        lines.windows(2).all(|w| w[0] < w[1]).then_some(Self { lines })
    }

    pub fn top(&self) -> u32 {
        self.lines[0]
    }

    pub fn bottom(&self) -> u32 {
        self.lines[4]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchLabel {
    A,
    B,
    C,
    D,
    G,
    Unclassified,
}

impl PitchLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PitchLabel::A => "A",
            PitchLabel::B => "B",
            PitchLabel::C => "C",
            PitchLabel::D => "D",
            PitchLabel::G => "G",
            PitchLabel::Unclassified => " ",
        }
    }

    pub fn is_classified(&self) -> bool {
        !matches!(self, PitchLabel::Unclassified)
    }
}

impl std::fmt::Display for PitchLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedNote {
    pub detection: Detection,
    pub label: PitchLabel,
    /// Index of the staff band the note fell into, if any
    pub staff_index: Option<usize>,
}
