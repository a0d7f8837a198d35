//! Weighted GPA over a student's recorded grades.

use gradepal_types::snapshot::GpaSummary;

/// One recorded grade joined with its assessment's scoring metadata.
///
/// A grade whose assessment could not be found carries `max_score` and
/// `weight` of zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradedItem {
    pub score: f64,
    pub max_score: f64,
    pub weight: f64,
}

/// Compute the GPA summary for a set of grades.
///
/// Each grade contributes `score / max_score` (0 when `max_score <= 0`).
/// The percentage is the weight-averaged ratio over grades with a positive
/// weight; when no grade has one, it is the plain mean of all ratios.
/// GPA is `percentage / 20` (a 0-5 scale).
pub fn compute_gpa(items: &[GradedItem]) -> GpaSummary {
    if items.is_empty() {
        return GpaSummary::default();
    }

    let mut total_weight = 0.0;
    let mut weighted_score = 0.0;
    let mut ratio_sum = 0.0;

    for item in items {
        let ratio = if item.max_score > 0.0 {
            item.score / item.max_score
        } else {
            0.0
        };
        ratio_sum += ratio;
        if item.weight > 0.0 {
            total_weight += item.weight;
            weighted_score += ratio * item.weight;
        }
    }

    let percentage = if total_weight > 0.0 {
        weighted_score / total_weight * 100.0
    } else {
        ratio_sum / items.len() as f64 * 100.0
    };

    GpaSummary {
        gpa: percentage / 20.0,
        percentage,
        recorded_weight: total_weight,
        graded_assessments: items.len(),
    }
}
