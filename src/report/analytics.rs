use serde::Serialize;
use serde_json::Value;

use super::types::Report;
use crate::grade::GradeSlot;
use crate::scoring::{parse_grade, score_of_part, ScoringConfig};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl SlotStats {
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        Some(Self {
            count: values.len(),
            mean: sum / values.len() as f64,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Cross-report statistics for the summary view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub reports: usize,
    pub grade1: Option<SlotStats>,
    pub grade2: Option<SlotStats>,
    /// Reports carrying both grades
    pub compared: usize,
    /// Mean of grade2 minus grade1 over compared reports
    pub mean_improvement: Option<f64>,
}

fn slot_grade(document: &Value, slot: GradeSlot) -> Option<f64> {
    let grade = document.get(slot.label())?;
    if !grade.is_object() {
        return None;
    }
    Some(parse_grade(grade.pointer("/scoreData/finalGrade"), 0.0))
}

/// Summarize raw report documents.
///
/// Grades are read through [`parse_grade`], so documents written by older
/// tools with string or extended-JSON numbers aggregate like any other.
pub fn summarize(documents: &[Value]) -> Summary {
    let mut first = Vec::new();
    let mut second = Vec::new();
    let mut deltas = Vec::new();

    for doc in documents {
        let a = slot_grade(doc, GradeSlot::First);
        let b = slot_grade(doc, GradeSlot::Second);
        if let Some(a) = a {
            first.push(a);
        }
        if let Some(b) = b {
            second.push(b);
        }
        if let (Some(a), Some(b)) = (a, b) {
            deltas.push(b - a);
        }
    }

    let mean_improvement = if deltas.is_empty() {
        None
    } else {
        Some(deltas.iter().sum::<f64>() / deltas.len() as f64)
    };

    Summary {
        reports: documents.len(),
        grade1: SlotStats::from_values(&first),
        grade2: SlotStats::from_values(&second),
        compared: deltas.len(),
        mean_improvement,
    }
}

/// Mean part score per part over the reports graded in `slot`, recomputed
/// from the stored answers. Empty when no report carries that grade.
pub fn part_means(reports: &[&Report], slot: GradeSlot, config: &ScoringConfig) -> Vec<f64> {
    let mut sums: Vec<f64> = Vec::new();
    let mut count = 0usize;

    for grade in reports.iter().filter_map(|r| r.grade(slot)) {
        let parts = &grade.score_data.parts;
        if sums.len() < parts.len() {
            sums.resize(parts.len(), 0.0);
        }
        for (i, part) in parts.iter().enumerate() {
            sums[i] += score_of_part(part, config);
        }
        count += 1;
    }

    if count == 0 {
        return Vec::new();
    }
    sums.into_iter().map(|s| s / count as f64).collect()
}
