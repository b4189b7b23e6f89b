//! Pure scoring rules: the speed bonus formula and per-kind answer checking.
//!
//! Everything here is deterministic and side-effect free; the grader owns all
//! persistence.

use crate::dao::models::QuestionKind;

/// Compute the points for a correct answer submitted `elapsed_secs` into the
/// question's answering window.
///
/// Answers inside the window earn a linear speed bonus on top of the base
/// points, up to double for an instantaneous answer. Late or oddly-timestamped
/// answers fall back to the base points alone, so the result is always in
/// `[base_points, 2 * base_points]`.
pub fn score(base_points: u32, time_limit_secs: u32, elapsed_secs: i64) -> u32 {
    if time_limit_secs == 0 {
        return base_points;
    }
    if elapsed_secs <= 0 || elapsed_secs > i64::from(time_limit_secs) {
        return base_points;
    }

    let remaining = f64::from(time_limit_secs) - elapsed_secs as f64;
    let bonus = remaining / f64::from(time_limit_secs);
    (f64::from(base_points) + f64::from(base_points) * bonus).round() as u32
}

/// Decide whether a submission matches the answer key for its question kind.
pub fn check_answer(kind: QuestionKind, submitted: &[String], correct: &[String]) -> bool {
    if submitted.is_empty() || correct.is_empty() {
        return false;
    }

    match kind {
        QuestionKind::Text => normalize(&submitted[0]) == normalize(&correct[0]),
        QuestionKind::MultipleChoice => {
            // Set equality: same cardinality, same members, any order.
            if submitted.len() != correct.len() {
                return false;
            }
            let mut submitted_sorted = submitted.to_vec();
            let mut correct_sorted = correct.to_vec();
            submitted_sorted.sort_unstable();
            correct_sorted.sort_unstable();
            submitted_sorted == correct_sorted
        }
        QuestionKind::SingleChoice => submitted[0] == correct[0],
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
