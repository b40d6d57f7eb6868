use super::types::Report;
use crate::grade::GradeSlot;
use anyhow::{Context, Result};
use chrono::{Days, NaiveDate, Utc};
use glob::Pattern;
use std::time::Duration;

/// Criteria for narrowing the report list. Empty criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    /// Unit name, compared case-insensitively
    pub unit: Option<String>,
    /// Glob over the report name, e.g. "Night*"
    pub name: Option<Pattern>,
    /// Only exercises held within this long before today
    pub since: Option<Duration>,
    /// Minimum final grade in `slot`; reports without that grade never match
    pub min_grade: Option<f64>,
    pub slot: Option<GradeSlot>,
}

impl ReportFilter {
    pub fn with_name_glob(mut self, pattern: &str) -> Result<Self> {
        self.name = Some(
            Pattern::new(pattern).with_context(|| format!("Invalid name pattern '{}'", pattern))?,
        );
        Ok(self)
    }

    /// Parse a humantime duration such as "30d" or "2w".
    pub fn with_since(mut self, since: &str) -> Result<Self> {
        self.since = Some(
            humantime::parse_duration(since)
                .with_context(|| format!("Invalid duration '{}'", since))?,
        );
        Ok(self)
    }

    pub fn matches(&self, report: &Report, today: NaiveDate) -> bool {
        if let Some(ref unit) = self.unit {
            if !report.unit.eq_ignore_ascii_case(unit) {
                return false;
            }
        }

        if let Some(ref pattern) = self.name {
            if !pattern.matches(&report.name) {
                return false;
            }
        }

        if let Some(since) = self.since {
            let days = Days::new(since.as_secs() / 86_400);
            if let Some(earliest) = today.checked_sub_days(days) {
                if report.exercise_date < earliest {
                    return false;
                }
            }
        }

        if let Some(min) = self.min_grade {
            let slot = self.slot.unwrap_or(GradeSlot::First);
            match report.final_grade(slot) {
                Some(grade) if grade >= min => {}
                _ => return false,
            }
        }

        true
    }
}

/// Keep the reports matching `filter`, newest exercise first.
pub fn filter_reports<'a>(reports: &'a [Report], filter: &ReportFilter) -> Vec<&'a Report> {
    let today = Utc::now().date_naive();
    let mut matched: Vec<&Report> = reports
        .iter()
        .filter(|r| filter.matches(r, today))
        .collect();
    matched.sort_by(|a, b| {
        b.exercise_date
            .cmp(&a.exercise_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grade::{Grade, ScoreData};

    fn create_test_report(id: u64, name: &str, unit: &str, date: NaiveDate) -> Report {
        Report {
            id,
            name: name.to_string(),
            unit: unit.to_string(),
            location: String::new(),
            exercise_date: date,
            notes: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            grade1: None,
            grade2: None,
        }
    }

    fn graded(mut report: Report, final_grade: f64) -> Report {
        report.grade1 = Some(Grade {
            name: String::new(),
            duatz_count: 0,
            score_data: ScoreData {
                parts: vec![],
                final_grade,
            },
        });
        report
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_filter_keeps_all_newest_first() {
        let reports = vec![
            create_test_report(1, "A", "Alpha", date(2026, 1, 1)),
            create_test_report(2, "B", "Bravo", date(2026, 2, 1)),
        ];
        let result = filter_reports(&reports, &ReportFilter::default());
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, 2);
    }

    #[test]
    fn test_unit_filter_case_insensitive() {
        let reports = vec![
            create_test_report(1, "A", "Alpha", date(2026, 1, 1)),
            create_test_report(2, "B", "Bravo", date(2026, 1, 1)),
        ];
        let filter = ReportFilter {
            unit: Some("alpha".to_string()),
            ..ReportFilter::default()
        };
        let result = filter_reports(&reports, &filter);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 1);
    }

    #[test]
    fn test_name_glob() {
        let reports = vec![
            create_test_report(1, "Night raid", "A", date(2026, 1, 1)),
            create_test_report(2, "Day patrol", "A", date(2026, 1, 1)),
        ];
        let filter = ReportFilter::default().with_name_glob("Night*").unwrap();
        let result = filter_reports(&reports, &filter);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Night raid");

        assert!(ReportFilter::default().with_name_glob("[").is_err());
    }

    #[test]
    fn test_since_window() {
        let today = date(2026, 6, 30);
        let filter = ReportFilter::default().with_since("30days").unwrap();
        let recent = create_test_report(1, "A", "A", date(2026, 6, 15));
        let edge = create_test_report(2, "B", "A", date(2026, 5, 31));
        let old = create_test_report(3, "C", "A", date(2026, 5, 1));
        assert!(filter.matches(&recent, today));
        assert!(filter.matches(&edge, today));
        assert!(!filter.matches(&old, today));

        assert!(ReportFilter::default().with_since("soon").is_err());
    }

    #[test]
    fn test_min_grade_requires_grade() {
        let today = date(2026, 6, 30);
        let filter = ReportFilter {
            min_grade: Some(60.0),
            ..ReportFilter::default()
        };
        let ungraded = create_test_report(1, "A", "A", today);
        let low = graded(create_test_report(2, "B", "A", today), 59.9);
        let high = graded(create_test_report(3, "C", "A", today), 60.0);
        assert!(!filter.matches(&ungraded, today));
        assert!(!filter.matches(&low, today));
        assert!(filter.matches(&high, today));

        let second_slot = ReportFilter {
            slot: Some(GradeSlot::Second),
            ..filter
        };
        assert!(!second_slot.matches(&high, today));
    }
}
