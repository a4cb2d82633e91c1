use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const MIN_GRID_DIMENSION: u32 = 1;
pub const MAX_GRID_DIMENSION: u32 = 20;
pub const DEFAULT_ROWS: u32 = 5;
pub const DEFAULT_COLS: u32 = 6;

pub const NEW_STUDENT_NAME: &str = "New Student";

/// Zero-based, row-major position in the rows x cols grid.
pub type SeatIndex = u32;

/// Seat index -> student id. A seat missing from the map is empty.
pub type SeatingMap = BTreeMap<SeatIndex, String>;

pub type DisabledSeats = BTreeSet<SeatIndex>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassConfig {
    pub rows: u32,
    pub cols: u32,
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
        }
    }
}

impl ClassConfig {
    pub fn clamped(rows: f64, cols: f64) -> Self {
        Self {
            rows: clamp_dimension(rows),
            cols: clamp_dimension(cols),
        }
    }

    /// Same config with both fields forced into the legal range.
    pub fn sanitized(self) -> Self {
        Self {
            rows: self.rows.clamp(MIN_GRID_DIMENSION, MAX_GRID_DIMENSION),
            cols: self.cols.clamp(MIN_GRID_DIMENSION, MAX_GRID_DIMENSION),
        }
    }

    pub fn seat_count(&self) -> u32 {
        self.rows * self.cols
    }

    pub fn contains(&self, seat: SeatIndex) -> bool {
        seat < self.seat_count()
    }

    /// (row, col) of a seat in the current grid.
    pub fn position(&self, seat: SeatIndex) -> (u32, u32) {
        (seat / self.cols, seat % self.cols)
    }
}

/// Floors and clamps a grid dimension into [1, 20]. Zero and NaN count as 1.
pub fn clamp_dimension(value: f64) -> u32 {
    let v = if value.is_nan() || value == 0.0 { 1.0 } else { value };
    v.floor()
        .clamp(MIN_GRID_DIMENSION as f64, MAX_GRID_DIMENSION as f64) as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl Student {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            photo_url: None,
        }
    }

    pub fn with_generated_id(name: impl Into<String>) -> Self {
        Self::new(format!("s-{}", uuid::Uuid::new_v4()), name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassInfo {
    pub id: &'static str,
    pub name: &'static str,
}

pub const DEFAULT_CLASSES: &[ClassInfo] = &[
    ClassInfo {
        id: "block-2-algebra-ii",
        name: "Block 2 - Algebra II",
    },
    ClassInfo {
        id: "block-6-htcs",
        name: "Block 6 - Honors Topics in Computer Science",
    },
];

const ALGEBRA_ROSTER: &[(&str, &str)] = &[
    ("s-alg-1", "Alice Johnson"),
    ("s-alg-2", "Ben Carter"),
    ("s-alg-3", "Chris Lee"),
    ("s-alg-4", "Diana Smith"),
    ("s-alg-5", "Evan Torres"),
    ("s-alg-6", "Fatima Khan"),
    ("s-alg-7", "Grace Park"),
    ("s-alg-8", "Hector Ruiz"),
    ("s-alg-9", "Isla Chen"),
    ("s-alg-10", "Jack Brown"),
];

const HTCS_ROSTER: &[(&str, &str)] = &[
    ("s-htcs-1", "Ava Patel"),
    ("s-htcs-2", "Logan Wright"),
    ("s-htcs-3", "Mia Nguyen"),
    ("s-htcs-4", "Noah Kim"),
    ("s-htcs-5", "Olivia Davis"),
    ("s-htcs-6", "Ryan Scott"),
    ("s-htcs-7", "Sophia Martinez"),
    ("s-htcs-8", "Theo Murphy"),
];

const GENERIC_ROSTER: &[(&str, &str)] = &[
    ("s-g-1", "Student One"),
    ("s-g-2", "Student Two"),
    ("s-g-3", "Student Three"),
];

/// Canned roster handed out the first time a class is opened.
pub fn default_roster_for(class_id: &str) -> Vec<Student> {
    let entries = match class_id {
        "block-2-algebra-ii" => ALGEBRA_ROSTER,
        "block-6-htcs" => HTCS_ROSTER,
        _ => GENERIC_ROSTER,
    };
    entries
        .iter()
        .map(|(id, name)| Student::new(*id, *name))
        .collect()
}
