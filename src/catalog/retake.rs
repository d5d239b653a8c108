// src/catalog/retake.rs

use std::collections::HashSet;

use crate::{config::RETAKE_SUFFIX, models::exam::ExamRecord};

/// Builds a retake exam holding only the questions listed in `question_ids`.
///
/// * Questions keep their positional ids from the original record.
/// * Domains left without questions are dropped.
/// * `totalQuestions` is the number of ids supplied, even ids the exam does not contain.
/// * A declared `totalTime` is scaled by supplied / original question count, rounded up.
pub fn derive_retake(original: &ExamRecord, question_ids: &[String]) -> ExamRecord {
    let mut exam = original.clone();
    exam.assign_question_ids();

    let original_count = match exam.exam_info.total_questions {
        0 => exam.question_count() as u64,
        declared => declared as u64,
    };
    let supplied = question_ids.len() as u64;
    let wanted: HashSet<&str> = question_ids.iter().map(String::as_str).collect();

    exam.domains = std::mem::take(&mut exam.domains)
        .into_iter()
        .filter_map(|mut domain| {
            domain
                .questions
                .retain(|q| q.id.as_deref().is_some_and(|id| wanted.contains(id)));
            (!domain.questions.is_empty()).then_some(domain)
        })
        .collect();

    let info = &mut exam.exam_info;
    info.total_questions = u32::try_from(supplied).unwrap_or(u32::MAX);

    if let Some(minutes) = info.total_time {
        if original_count > 0 {
            let scaled = (minutes as u64 * supplied).div_ceil(original_count);
            info.total_time = Some(u32::try_from(scaled).unwrap_or(u32::MAX));
        }
    }

    info.is_retake = true;
    if !info.name.ends_with(RETAKE_SUFFIX) {
        info.name.push_str(RETAKE_SUFFIX);
    }

    exam
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Ten questions over three domains (4 + 3 + 3), 60 minutes.
    fn ten_question_exam() -> ExamRecord {
        let question = |n: usize| {
            json!({"question": format!("q{}", n), "choices": {"A": "a", "B": "b"}, "correct_choice": "A"})
        };
        serde_json::from_value(json!({
            "examInfo": {"id": "ten", "name": "Ten Questions", "totalQuestions": 10, "totalTime": 60},
            "domains": [
                {"domain": "Alpha", "questions": (1..=4).map(question).collect::<Vec<_>>()},
                {"domain": "Beta", "questions": (5..=7).map(question).collect::<Vec<_>>()},
                {"domain": "Gamma", "questions": (8..=10).map(question).collect::<Vec<_>>()}
            ]
        }))
        .unwrap()
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_retake_scales_time_and_counts() {
        let retake = derive_retake(&ten_question_exam(), &ids(&["Q1", "Q5", "Q6"]));
        assert_eq!(retake.exam_info.total_questions, 3);
        assert_eq!(retake.exam_info.total_time, Some(18));
        assert!(retake.exam_info.is_retake);
        assert_eq!(retake.exam_info.name, "Ten Questions (Retake)");
    }

    #[test]
    fn test_retake_time_rounds_up() {
        let retake = derive_retake(&ten_question_exam(), &ids(&["Q1"]));
        assert_eq!(retake.exam_info.total_time, Some(6));

        let mut exam = ten_question_exam();
        exam.exam_info.total_time = Some(25);
        let retake = derive_retake(&exam, &ids(&["Q1"]));
        // 25 * 1 / 10 = 2.5
        assert_eq!(retake.exam_info.total_time, Some(3));
    }

    #[test]
    fn test_retake_drops_empty_domains() {
        let retake = derive_retake(&ten_question_exam(), &ids(&["Q2", "Q9"]));
        let domains: Vec<&str> = retake.domains.iter().map(|d| d.domain.as_str()).collect();
        assert_eq!(domains, vec!["Alpha", "Gamma"]);
        let kept: Vec<&str> = retake.questions().map(|q| q.id.as_deref().unwrap()).collect();
        assert_eq!(kept, vec!["Q2", "Q9"]);
    }

    #[test]
    fn test_unknown_ids_still_count_toward_total() {
        let retake = derive_retake(&ten_question_exam(), &ids(&["Q1", "Q99"]));
        assert_eq!(retake.question_count(), 1);
        assert_eq!(retake.exam_info.total_questions, 2);
        assert_eq!(retake.exam_info.total_time, Some(12));
    }

    #[test]
    fn test_untimed_exam_stays_untimed() {
        let mut exam = ten_question_exam();
        exam.exam_info.total_time = None;
        let retake = derive_retake(&exam, &ids(&["Q1"]));
        assert_eq!(retake.exam_info.total_time, None);
    }

    #[test]
    fn test_counted_questions_used_when_undeclared() {
        let mut exam = ten_question_exam();
        exam.exam_info.total_questions = 0;
        let retake = derive_retake(&exam, &ids(&["Q1", "Q2", "Q3", "Q4", "Q5"]));
        assert_eq!(retake.exam_info.total_time, Some(30));
    }

    #[test]
    fn test_retake_of_retake_keeps_single_suffix() {
        let first = derive_retake(&ten_question_exam(), &ids(&["Q1", "Q2"]));
        let second = derive_retake(&first, &ids(&["Q1"]));
        assert_eq!(second.exam_info.name, "Ten Questions (Retake)");
        assert_eq!(second.exam_info.total_questions, 1);
    }
}
