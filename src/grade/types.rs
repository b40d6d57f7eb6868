use serde::{Deserialize, Serialize};

use crate::catalog::Part;
use crate::scoring::deserialize_grade;

/// Scored answer tree as persisted inside a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreData {
    pub parts: Vec<Part>,
    #[serde(default, deserialize_with = "deserialize_grade")]
    pub final_grade: f64,
}

/// One graded training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    /// Free-text note identifying the run
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duatz_count: u32,
    pub score_data: ScoreData,
}

/// The two grade slots of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeSlot {
    First,
    Second,
}

impl GradeSlot {
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(GradeSlot::First),
            2 => Some(GradeSlot::Second),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GradeSlot::First => "grade1",
            GradeSlot::Second => "grade2",
        }
    }
}
