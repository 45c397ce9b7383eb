//! Event aggregation.
//!
//! Grades are folded into a `{count, sum, min, max}` accumulator. The sum saturates at the
//! `i64` bounds while the average is tracked as a running mean, so extreme grades never
//! overflow and still average correctly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::Event;

/// Running grade aggregate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradeAccumulator {
    pub count: usize,
    pub sum: i64,
    pub min: Option<i64>,
    pub max: Option<i64>,
    mean: f64,
}

impl GradeAccumulator {
    pub fn observe(self, grade: i64) -> Self {
        let count = self.count + 1;
        Self {
            count,
            sum: self.sum.saturating_add(grade),
            min: Some(self.min.map_or(grade, |m| m.min(grade))),
            max: Some(self.max.map_or(grade, |m| m.max(grade))),
            mean: self.mean + (grade as f64 - self.mean) / count as f64,
        }
    }

    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.mean)
        }
    }

    pub fn summary(&self) -> GradeSummary {
        GradeSummary {
            count: self.count,
            sum: self.sum,
            avg: self.average().unwrap_or(0.0),
            min: self.min,
            max: self.max,
        }
    }
}

impl FromIterator<i64> for GradeAccumulator {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        iter.into_iter()
            .fold(GradeAccumulator::default(), GradeAccumulator::observe)
    }
}

/// Serialized view of a grade aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeSummary {
    pub count: usize,
    pub sum: i64,
    pub avg: f64,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// Counts and grade aggregates per event type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
    pub total_events: usize,
    pub event_counts: BTreeMap<String, usize>,
    pub grade_stats: BTreeMap<String, GradeSummary>,
}

impl EventStats {
    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut total_events = 0;
        let mut event_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut grades: BTreeMap<String, GradeAccumulator> = BTreeMap::new();

        for event in events {
            total_events += 1;
            let kind = event.kind_or_unknown().to_string();
            *event_counts.entry(kind.clone()).or_insert(0) += 1;

            if let Some(grade) = event.grade() {
                let acc = grades.entry(kind).or_default();
                *acc = acc.observe(grade);
            }
        }

        Self {
            total_events,
            event_counts,
            grade_stats: grades
                .into_iter()
                .map(|(kind, acc)| (kind, acc.summary()))
                .collect(),
        }
    }
}

/// Per-player tally used when ranking performers
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformerTally {
    pub count: usize,
    pub grades: GradeAccumulator,
}

impl PerformerTally {
    pub fn record(&mut self, grade: Option<i64>) {
        self.count += 1;
        if let Some(grade) = grade {
            self.grades = self.grades.observe(grade);
        }
    }

    /// Average grade, zero when the player has no graded events.
    pub fn avg_grade_or_zero(&self) -> f64 {
        self.grades.average().unwrap_or(0.0)
    }

    /// Count dominates; average grade breaks ties.
    pub fn outranks(&self, other: &PerformerTally) -> bool {
        self.count > other.count
            || (self.count == other.count && self.avg_grade_or_zero() > other.avg_grade_or_zero())
    }
}
