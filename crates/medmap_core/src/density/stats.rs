//! Aggregate statistics over selected schools.

use crate::model::school::SchoolInfo;
use serde::Serialize;

/// Summary scalars for the sidebar and proportion bar.
///
/// Every field is 0 for an empty selection; no field is ever NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    /// Mean of present entrance scores; schools without a score are excluded
    /// from both numerator and denominator.
    pub mean_score: f64,
    pub total_primary: f64,
    pub total_specialty: f64,
    /// `total_primary / (total_primary + total_specialty)`, or 0.
    pub primary_proportion: f64,
}

/// Folds the selected schools into `AggregateStats`.
pub fn compute_aggregate_stats<'a>(
    selected: impl IntoIterator<Item = &'a SchoolInfo>,
) -> AggregateStats {
    let mut score_sum = 0.0;
    let mut score_count = 0_u32;
    let mut total_primary = 0.0;
    let mut total_specialty = 0.0;

    for info in selected {
        if let Some(score) = info.entrance_score.filter(|score| score.is_finite()) {
            score_sum += score;
            score_count += 1;
        }
        total_primary += info.primary_or_zero();
        total_specialty += info.specialty_or_zero();
    }

    let mean_score = if score_count == 0 {
        0.0
    } else {
        score_sum / f64::from(score_count)
    };
    let denominator = total_primary + total_specialty;
    let primary_proportion = if denominator > 0.0 {
        total_primary / denominator
    } else {
        0.0
    };

    AggregateStats {
        mean_score,
        total_primary,
        total_specialty,
        primary_proportion,
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_aggregate_stats, AggregateStats};
    use crate::model::school::{PlanarPoint, SchoolInfo};

    fn school(score: Option<f64>, primary: Option<f64>, specialty: Option<f64>) -> SchoolInfo {
        let mut info = SchoolInfo::new("s", PlanarPoint::new(0.0, 0.0));
        info.entrance_score = score;
        info.primary_care_count = primary;
        info.specialty_count = specialty;
        info
    }

    #[test]
    fn empty_selection_is_all_zero() {
        let none: Vec<SchoolInfo> = Vec::new();
        assert_eq!(compute_aggregate_stats(&none), AggregateStats::default());
    }

    #[test]
    fn mean_ignores_missing_scores() {
        let schools = vec![
            school(Some(80.0), None, None),
            school(None, None, None),
            school(Some(90.0), None, None),
        ];
        assert_eq!(compute_aggregate_stats(&schools).mean_score, 85.0);
    }

    #[test]
    fn missing_counts_are_zero_and_zero_denominator_is_zero() {
        let schools = vec![school(None, None, None), school(Some(70.0), Some(0.0), None)];
        let stats = compute_aggregate_stats(&schools);
        assert_eq!(stats.total_primary, 0.0);
        assert_eq!(stats.total_specialty, 0.0);
        assert_eq!(stats.primary_proportion, 0.0);
    }

    #[test]
    fn proportion_uses_totals() {
        let schools = vec![
            school(None, Some(30.0), Some(10.0)),
            school(None, Some(10.0), Some(50.0)),
        ];
        let stats = compute_aggregate_stats(&schools);
        assert_eq!(stats.total_primary, 40.0);
        assert_eq!(stats.total_specialty, 60.0);
        assert_eq!(stats.primary_proportion, 0.4);
    }
}
