//! Weighted internal-mark aggregation.
//!
//! Combines assessments of the form "obtained out of total, worth
//! `weightage` percent" into one mark. Problems are reported as data
//! next to the totals instead of aborting the calculation.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub name: String,
    pub obtained: f64,
    pub total: f64,
    /// Percentage of the final mark, `0..=100`.
    pub weightage: f64,
}

impl Assessment {
    pub fn new(name: impl Into<String>, obtained: f64, total: f64, weightage: f64) -> Self {
        Self {
            name: name.into(),
            obtained,
            total,
            weightage,
        }
    }

    /// Starter rows for a fresh form.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Assignment 1", 85.0, 100.0, 20.0),
            Self::new("Mid-Term Exam", 75.0, 100.0, 50.0),
            Self::new("Project", 90.0, 100.0, 30.0),
        ]
    }

    /// This assessment's share of the final mark; zero when `total` is zero.
    pub fn contribution(&self) -> f64 {
        if self.total == 0.0 {
            return 0.0;
        }
        (self.obtained / self.total) * self.weightage
    }

    fn issues(&self, index: usize) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let mut push = |problem| issues.push(ValidationIssue::Entry { index, problem });

        if self.name.trim().is_empty() {
            push(EntryProblem::MissingName);
        }
        if self.obtained < 0.0 {
            push(EntryProblem::NegativeObtained);
        }
        if self.total < 1.0 {
            push(EntryProblem::TotalTooSmall);
        }
        if !(0.0..=100.0).contains(&self.weightage) {
            push(EntryProblem::WeightageOutOfRange);
        }
        if self.obtained > self.total {
            push(EntryProblem::ObtainedExceedsTotal);
        }

        issues
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryProblem {
    MissingName,
    NegativeObtained,
    TotalTooSmall,
    WeightageOutOfRange,
    ObtainedExceedsTotal,
}

impl fmt::Display for EntryProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingName => "Name is required",
            Self::NegativeObtained => "Cannot be negative",
            Self::TotalTooSmall => "Must be at least 1",
            Self::WeightageOutOfRange => "Weightage must be between 0 and 100",
            Self::ObtainedExceedsTotal => "Obtained marks cannot exceed total marks",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValidationIssue {
    /// A problem with the assessment at `index`.
    Entry { index: usize, problem: EntryProblem },
    /// Weightages add up to more than 100.
    WeightageExceeded { total: f64 },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry { index, problem } => write!(f, "Assessment {}: {}", index + 1, problem),
            Self::WeightageExceeded { .. } => f.write_str("Total weightage cannot exceed 100%"),
        }
    }
}

/// Aggregated mark plus anything that makes it untrustworthy.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkSummary {
    /// Sum of weightages, rounded to 2 places.
    pub total_weightage: f64,
    /// Weighted mark, rounded to 2 places.
    pub total_mark: f64,
    pub issues: Vec<ValidationIssue>,
}

impl MarkSummary {
    /// Whether the mark can be presented as final.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for MarkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} / {:.2}",
            self.total_mark, self.total_weightage
        )
    }
}

/// Validate and combine `assessments`.
pub fn aggregate(assessments: &[Assessment]) -> MarkSummary {
    let mut issues: Vec<ValidationIssue> = assessments
        .iter()
        .enumerate()
        .flat_map(|(index, a)| a.issues(index))
        .collect();

    let total_weightage: f64 = assessments.iter().map(|a| a.weightage).sum();
    let total_mark: f64 = assessments.iter().map(Assessment::contribution).sum();

    if total_weightage > 100.0 {
        issues.push(ValidationIssue::WeightageExceeded {
            total: total_weightage,
        });
    }

    MarkSummary {
        total_weightage: round2(total_weightage),
        total_mark: round2(total_mark),
        issues,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_total() {
        let summary = aggregate(&[
            Assessment::new("Quiz", 8.0, 10.0, 20.0),
            Assessment::new("Test", 12.0, 15.0, 30.0),
        ]);
        assert_eq!(summary.total_weightage, 50.0);
        assert_eq!(summary.total_mark, 40.0);
        assert!(summary.is_valid());
        assert_eq!(summary.to_string(), "40.00 / 50.00");
    }

    #[test]
    fn test_defaults() {
        let summary = aggregate(&Assessment::defaults());
        assert_eq!(summary.total_weightage, 100.0);
        assert_eq!(summary.total_mark, 81.5);
        assert!(summary.is_valid());
    }

    #[test]
    fn test_weightage_over_100_flagged() {
        let summary = aggregate(&[
            Assessment::new("A", 50.0, 100.0, 60.0),
            Assessment::new("B", 50.0, 100.0, 60.0),
        ]);
        assert!(!summary.is_valid());
        assert_eq!(summary.total_weightage, 120.0);
        // Raw numbers still available for a warning display.
        assert_eq!(summary.total_mark, 60.0);
        assert_eq!(
            summary.issues,
            vec![ValidationIssue::WeightageExceeded { total: 120.0 }]
        );
        assert_eq!(
            summary.issues[0].to_string(),
            "Total weightage cannot exceed 100%"
        );
    }

    #[test]
    fn test_zero_total_skipped() {
        let summary = aggregate(&[
            Assessment::new("Empty", 0.0, 0.0, 40.0),
            Assessment::new("Exam", 30.0, 60.0, 60.0),
        ]);
        assert_eq!(summary.total_mark, 30.0);
        assert_eq!(summary.total_weightage, 100.0);
        assert!(summary.issues.contains(&ValidationIssue::Entry {
            index: 0,
            problem: EntryProblem::TotalTooSmall,
        }));
    }

    #[test]
    fn test_obtained_exceeds_total() {
        let summary = aggregate(&[Assessment::new("Lab", 12.0, 10.0, 10.0)]);
        assert_eq!(
            summary.issues,
            vec![ValidationIssue::Entry {
                index: 0,
                problem: EntryProblem::ObtainedExceedsTotal,
            }]
        );
        assert_eq!(
            summary.issues[0].to_string(),
            "Assessment 1: Obtained marks cannot exceed total marks"
        );
    }

    #[test]
    fn test_rounding() {
        let summary = aggregate(&[Assessment::new("Third", 1.0, 3.0, 10.0)]);
        assert_eq!(summary.total_mark, 3.33);
    }
}
