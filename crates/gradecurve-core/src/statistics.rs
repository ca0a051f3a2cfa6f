//! Class-level statistics and student standing.
//!
//! These figures are informational. Letter grades and curve ranks come only
//! from the curve assigner; the standing here is a plain position by
//! percentage across the whole class, failing students included.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::StudentGradeRecord;
use crate::scoring::round2;

/// Descriptive statistics over the percentages of a class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub highest: f64,
    pub lowest: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

/// Compute class statistics. An empty class yields all zeros.
pub fn class_statistics(records: &[StudentGradeRecord]) -> ClassStatistics {
    let mut values: Vec<f64> = records
        .iter()
        .map(|r| r.percentage)
        .filter(|p| p.is_finite())
        .collect();
    if values.is_empty() {
        return ClassStatistics::default();
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    };
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;

    ClassStatistics {
        count: n,
        mean: round2(mean),
        median: round2(median),
        highest: values[n - 1],
        lowest: values[0],
        std_dev: round2(variance.sqrt()),
    }
}

/// A student's position in the class by percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based; students with an equal percentage share a position.
    pub position: usize,
    pub class_size: usize,
    pub class_average: f64,
}

/// Position of one student among the whole class, or `None` if absent.
pub fn standing(records: &[StudentGradeRecord], student_id: &str) -> Option<Standing> {
    let target = records.iter().find(|r| r.student_id == student_id)?;
    let ahead = records
        .iter()
        .filter(|r| r.percentage > target.percentage)
        .count();
    let class_average = if records.is_empty() {
        0.0
    } else {
        records.iter().map(|r| r.percentage).sum::<f64>() / records.len() as f64
    };

    Some(Standing {
        position: ahead + 1,
        class_size: records.len(),
        class_average: round2(class_average),
    })
}

/// Share of the class at or below `rank`, from the top, as a percentage.
///
/// Rank 1 of 10 is the top 10%. Returns 0 for an empty class or rank 0.
pub fn rank_percentile(rank: u32, total: usize) -> f64 {
    if total == 0 || rank == 0 {
        return 0.0;
    }
    round2(rank as f64 / total as f64 * 100.0)
}

/// Field a grade list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Percentage,
    StudentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "studentId" | "student_id" | "id" => Ok(Self::StudentId),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Copy of the records ordered by `key`.
///
/// Percentage ties are broken by student id ascending, whatever the order.
pub fn sorted_grade_list(
    records: &[StudentGradeRecord],
    key: SortKey,
    order: SortOrder,
) -> Vec<StudentGradeRecord> {
    let mut list = records.to_vec();
    list.sort_by(|x, y| {
        let primary = match key {
            SortKey::Percentage => x
                .percentage
                .partial_cmp(&y.percentage)
                .unwrap_or(Ordering::Equal),
            SortKey::StudentId => x.student_id.cmp(&y.student_id),
        };
        let primary = match order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| x.student_id.cmp(&y.student_id))
    });
    list
}
