// src/results/stats.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    config::{HISTORY_MOVING_AVERAGE_WINDOW, HISTORY_RECENT_ATTEMPTS},
    models::exam_result::AttemptResult,
};

/// Best percentage among the attempts of `exam_id`, ignoring attempt `exclude_id`.
/// 0 when there is no other attempt.
pub fn best_score_excluding(
    results: &[AttemptResult],
    exam_id: &str,
    exclude_id: Option<i64>,
) -> f64 {
    results
        .iter()
        .filter(|r| r.exam_id == exam_id && Some(r.id) != exclude_id)
        .map(AttemptResult::percentage)
        .fold(0.0, f64::max)
}

/// One point of the recent-attempts chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptPoint {
    /// 1-based, counted over all considered attempts, oldest first.
    pub attempt_number: usize,
    pub percentage: f64,
    pub moving_average: f64,
    pub time: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Attempt history of one exam, as shown next to the exam.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub exam_id: String,
    pub attempts: usize,
    pub average: f64,
    pub best: f64,
    /// Oldest first.
    pub recent: Vec<AttemptPoint>,
}

/// Summarizes the attempts of `exam_id`. Attempts with no answers at all are left out.
pub fn history_summary(results: &[AttemptResult], exam_id: &str) -> HistorySummary {
    let mut considered: Vec<&AttemptResult> = results
        .iter()
        .filter(|r| r.exam_id == exam_id && !r.exam_result.answers.is_empty())
        .collect();
    considered.sort_by(|a, b| {
        a.exam_result
            .timestamp
            .cmp(&b.exam_result.timestamp)
            .then(a.id.cmp(&b.id))
    });

    let percentages: Vec<f64> = considered.iter().map(|r| r.percentage()).collect();
    let attempts = percentages.len();
    let average = if attempts == 0 {
        0.0
    } else {
        percentages.iter().sum::<f64>() / attempts as f64
    };
    let best = percentages.iter().copied().fold(0.0, f64::max);

    let skip = attempts.saturating_sub(HISTORY_RECENT_ATTEMPTS);
    let recent_scores = &percentages[skip..];
    let averages = moving_average(recent_scores, HISTORY_MOVING_AVERAGE_WINDOW);

    let recent = considered[skip..]
        .iter()
        .zip(recent_scores.iter().zip(averages))
        .enumerate()
        .map(|(offset, (result, (&percentage, moving_average)))| AttemptPoint {
            attempt_number: skip + offset + 1,
            percentage,
            moving_average,
            time: result.exam_result.time,
            timestamp: result.exam_result.timestamp,
        })
        .collect();

    HistorySummary {
        exam_id: exam_id.to_string(),
        attempts,
        average,
        best,
        recent,
    }
}

/// Trailing average over at most `window` values ending at each position.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}
