//! Score and progress arithmetic for the student views.
//!
//! Progress blends four components with fixed weights:
//!
//! | component  | weight |
//! |------------|--------|
//! | sections   | 0.30   |
//! | activities | 0.20   |
//! | quizzes    | 0.25   |
//! | exams      | 0.25   |
//!
//! Components with nothing to complete drop out and the remaining weights are
//! renormalized, so a course without exams can still reach 100%.

use std::collections::BTreeMap;

use serde::Serialize;

const SECTION_WEIGHT: f64 = 0.3;
const ACTIVITY_WEIGHT: f64 = 0.2;
const QUIZ_WEIGHT: f64 = 0.25;
const EXAM_WEIGHT: f64 = 0.25;

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `done / total` as a percentage; zero when there is nothing to do.
pub fn percentage(done: i64, total: i64) -> f64 {
    if total > 0 {
        done as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// Counts matching answers. Keys are item ids as strings, letters compare
/// case-insensitively.
pub fn count_correct(answer_key: &[(i64, String)], answers: &BTreeMap<String, String>) -> i32 {
    answer_key
        .iter()
        .filter(|(item_id, correct)| {
            answers
                .get(&item_id.to_string())
                .is_some_and(|given| given.trim().eq_ignore_ascii_case(correct.trim()))
        })
        .count() as i32
}

/// Percentage score against the assessment's item count, two decimals.
///
/// `correct` is capped at `total_items` so answering extra items cannot push
/// the score past 100.
pub fn assessment_score(correct: i32, total_items: i32) -> f64 {
    if total_items <= 0 {
        return 0.0;
    }
    round_to(percentage(correct.min(total_items) as i64, total_items as i64), 2)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Component {
    pub completed: i64,
    pub total: i64,
}

impl Component {
    pub fn new(completed: i64, total: i64) -> Self {
        Self { completed, total }
    }

    pub fn percentage(self) -> f64 {
        percentage(self.completed, self.total)
    }

    pub fn ratio(self) -> String {
        format!("{}/{}", self.completed, self.total)
    }
}

/// Weighted progress over the components that have something to complete,
/// one decimal.
pub fn weighted_progress(
    sections: Component,
    activities: Component,
    quizzes: Component,
    exams: Component,
) -> f64 {
    let (sum, weight) = [
        (sections, SECTION_WEIGHT),
        (activities, ACTIVITY_WEIGHT),
        (quizzes, QUIZ_WEIGHT),
        (exams, EXAM_WEIGHT),
    ]
    .into_iter()
    .filter(|(component, _)| component.total > 0)
    .fold((0.0, 0.0), |(sum, weight), (component, w)| {
        (sum + component.percentage() * w, weight + w)
    });

    if weight > 0.0 {
        round_to(sum / weight, 1)
    } else {
        0.0
    }
}

/// Course grade from quiz and exam results, one decimal.
///
/// Each category averages over all of its assessments (untaken ones count
/// as 0) and is weighted by its share of all assessments.
pub fn blended_grade(quiz_score_sum: f64, total_quizzes: i64, exam_score_sum: f64, total_exams: i64) -> f64 {
    let total = total_quizzes + total_exams;
    if total == 0 {
        return 0.0;
    }

    let average = |sum: f64, count: i64| if count > 0 { sum / count as f64 } else { 0.0 };
    let quiz_avg = average(quiz_score_sum, total_quizzes);
    let exam_avg = average(exam_score_sum, total_exams);

    let grade = quiz_avg * (total_quizzes as f64 / total as f64)
        + exam_avg * (total_exams as f64 / total as f64);
    round_to(grade, 1)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GradeSummary {
    pub count: usize,
    pub graded_count: usize,
    pub average: f64,
    pub highest: f64,
    pub lowest: f64,
}

impl GradeSummary {
    /// Summary over `count` records, of which `scores` carry a grade.
    pub fn new(count: usize, scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self {
                count,
                ..Self::default()
            };
        }

        Self {
            count,
            graded_count: scores.len(),
            average: round_to(mean(scores), 2),
            highest: scores.iter().copied().fold(f64::MIN, f64::max),
            lowest: scores.iter().copied().fold(f64::MAX, f64::min),
        }
    }
}

pub fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_correct_matches_by_item_id() {
        let key = vec![(1, "A".to_string()), (2, "C".to_string()), (3, "D".to_string())];
        let answers = BTreeMap::from([
            ("1".to_string(), "a".to_string()),
            ("2".to_string(), "B".to_string()),
            ("9".to_string(), "D".to_string()),
        ]);
        assert_eq!(count_correct(&key, &answers), 1);
    }

    #[test]
    fn test_assessment_score_uses_total_items() {
        assert_eq!(assessment_score(2, 3), 66.67);
        assert_eq!(assessment_score(5, 5), 100.0);
        assert_eq!(assessment_score(7, 5), 100.0);
        assert_eq!(assessment_score(0, 10), 0.0);
        assert_eq!(assessment_score(1, 0), 0.0);
    }

    #[test]
    fn test_weighted_progress_all_components() {
        let progress = weighted_progress(
            Component::new(5, 10),
            Component::new(1, 1),
            Component::new(0, 2),
            Component::new(1, 1),
        );
        // 50*0.3 + 100*0.2 + 0*0.25 + 100*0.25 = 60
        assert_eq!(progress, 60.0);
    }

    #[test]
    fn test_weighted_progress_renormalizes_missing_components() {
        let progress = weighted_progress(
            Component::new(1, 2),
            Component::default(),
            Component::new(1, 1),
            Component::default(),
        );
        // (50*0.3 + 100*0.25) / 0.55
        assert_eq!(progress, 72.7);
        assert_eq!(
            weighted_progress(
                Component::default(),
                Component::default(),
                Component::default(),
                Component::default()
            ),
            0.0
        );
    }

    #[test]
    fn test_blended_grade_counts_untaken_as_zero() {
        // two quizzes, one taken at 80; one exam taken at 90
        // quiz avg 40 weighted 2/3, exam avg 90 weighted 1/3
        assert_eq!(blended_grade(80.0, 2, 90.0, 1), 56.7);
        assert_eq!(blended_grade(0.0, 0, 0.0, 0), 0.0);
        assert_eq!(blended_grade(100.0, 1, 0.0, 0), 100.0);
    }

    #[test]
    fn test_grade_summary() {
        let summary = GradeSummary::new(3, &[70.0, 95.5]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.graded_count, 2);
        assert_eq!(summary.average, 82.75);
        assert_eq!(summary.highest, 95.5);
        assert_eq!(summary.lowest, 70.0);

        let empty = GradeSummary::new(2, &[]);
        assert_eq!(empty.count, 2);
        assert_eq!(empty.average, 0.0);
    }

    #[test]
    fn test_component_ratio() {
        assert_eq!(Component::new(2, 7).ratio(), "2/7");
        assert_eq!(Component::new(0, 0).percentage(), 0.0);
    }
}
