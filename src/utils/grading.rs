use serde::Serialize;

use crate::models::{exam::ExamRecord, exam_result::Answers};

/// Outcome of grading one submission against an exam record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    pub score: i64,
    pub total: i64,
    pub percentage: f64,
    /// Questions whose submitted keys exactly match the correct keys.
    pub correct_count: usize,
    /// Answered but wrong, in question order.
    pub incorrect_questions: Vec<String>,
    pub unanswered_questions: Vec<String>,
    /// Scored per choice key rather than per question.
    pub multi_answer_mode: bool,
}

/// Grades `answers` against `exam`. Question ids must already be assigned.
///
/// Exams without multi-answer questions score one point per correct question.
/// Otherwise each question is worth its number of correct keys, and earns the
/// correct keys selected provided no wrong key was selected.
pub fn grade(exam: &ExamRecord, answers: &Answers) -> GradeReport {
    let multi_answer_mode = exam.has_multi_answer_questions();

    let mut score = 0i64;
    let mut total = 0i64;
    let mut correct_count = 0usize;
    let mut incorrect_questions = Vec::new();
    let mut unanswered_questions = Vec::new();

    for question in exam.questions() {
        let id = question.id.clone().unwrap_or_default();
        let correct = question.correct_choice.keys();
        let worth = if multi_answer_mode {
            question.correct_choice.len() as i64
        } else {
            1
        };
        total += worth;

        let Some(submitted) = answers.get(&id).filter(|s| !s.is_empty()) else {
            unanswered_questions.push(id);
            continue;
        };
        let submitted = submitted.keys();

        if submitted == correct {
            correct_count += 1;
            score += worth;
            continue;
        }

        incorrect_questions.push(id);
        if multi_answer_mode && submitted.is_subset(&correct) {
            score += submitted.len() as i64;
        }
    }

    let percentage = if total > 0 {
        score as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    GradeReport {
        score,
        total,
        percentage,
        correct_count,
        incorrect_questions,
        unanswered_questions,
        multi_answer_mode,
    }
}
