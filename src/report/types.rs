use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::grade::{Grade, GradeSlot};

pub const STORE_VERSION: u32 = 1;

/// One exercise evaluation report with up to two graded runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub location: String,
    pub exercise_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub grade1: Option<Grade>,
    #[serde(default)]
    pub grade2: Option<Grade>,
}

impl Report {
    pub fn grade(&self, slot: GradeSlot) -> Option<&Grade> {
        match slot {
            GradeSlot::First => self.grade1.as_ref(),
            GradeSlot::Second => self.grade2.as_ref(),
        }
    }

    /// Store a grade in `slot` and bump `updated_at`.
    pub fn set_grade(&mut self, slot: GradeSlot, grade: Grade) {
        match slot {
            GradeSlot::First => self.grade1 = Some(grade),
            GradeSlot::Second => self.grade2 = Some(grade),
        }
        self.updated_at = Utc::now();
    }

    pub fn final_grade(&self, slot: GradeSlot) -> Option<f64> {
        self.grade(slot).map(|g| g.score_data.final_grade)
    }

    /// Second run minus first run, when both are graded.
    pub fn improvement(&self) -> Option<f64> {
        Some(self.final_grade(GradeSlot::Second)? - self.final_grade(GradeSlot::First)?)
    }
}

/// Fields supplied when a report is created.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub name: String,
    pub unit: String,
    pub location: String,
    pub exercise_date: NaiveDate,
    pub notes: String,
}

/// All reports, as persisted in the store file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStore {
    pub version: u32,
    #[serde(default = "first_id")]
    pub next_id: u64,
    #[serde(default)]
    pub reports: Vec<Report>,
}

fn first_id() -> u64 {
    1
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportStore {
    /// Create a new empty store with version 1
    pub fn new() -> Self {
        Self {
            version: STORE_VERSION,
            next_id: first_id(),
            reports: Vec::new(),
        }
    }

    /// Add a report and return its id
    pub fn insert(&mut self, new: NewReport) -> u64 {
        let id = self.next_id.max(self.max_id() + 1);
        let now = Utc::now();
        self.reports.push(Report {
            id,
            name: new.name,
            unit: new.unit,
            location: new.location,
            exercise_date: new.exercise_date,
            notes: new.notes,
            created_at: now,
            updated_at: now,
            grade1: None,
            grade2: None,
        });
        self.next_id = id + 1;
        id
    }

    pub fn get(&self, id: u64) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Report> {
        self.reports.iter_mut().find(|r| r.id == id)
    }

    /// Remove a report
    /// Returns true if the report existed, false otherwise
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.reports.len();
        self.reports.retain(|r| r.id != id);
        self.reports.len() != before
    }

    fn max_id(&self) -> u64 {
        self.reports.iter().map(|r| r.id).max().unwrap_or(0)
    }
}
