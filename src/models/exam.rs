// src/models/exam.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::models::exam_result::Answers;

/// One exam file from the exam bank: metadata plus grouped questions.
///
/// Fields this crate does not interpret are kept in `extra` so a record
/// can be served back to the front end unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamRecord {
    pub exam_info: ExamInfo,

    /// Domain order is significant: it drives question numbering.
    #[serde(default)]
    pub domains: Vec<Domain>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamInfo {
    /// Catalog identifier. Exam banks written by hand sometimes use a number here.
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,

    #[serde(default, deserialize_with = "whole_number")]
    pub total_questions: u32,

    /// Minutes; absent means untimed.
    #[serde(
        default,
        deserialize_with = "optional_whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_time: Option<u32>,

    /// Domain name to fraction of the exam. Fractions are not required to sum to 1.
    #[serde(default)]
    pub domain_distribution: Map<String, Value>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_retake: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub domain: String,

    #[serde(default)]
    pub questions: Vec<Question>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    pub question: String,

    /// Choice key to choice text, in file order.
    #[serde(default)]
    pub choices: Map<String, Value>,

    pub correct_choice: Selection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A set of choice keys: either one key (single-answer) or several (multi-answer).
///
/// Used both for the correct answer of a question and for what a candidate submitted.
/// The two shapes are told apart structurally: a JSON string or a JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    Single(String),
    Multiple(Vec<String>),
}

impl Selection {
    pub fn is_multi(&self) -> bool {
        matches!(self, Selection::Multiple(_))
    }

    /// The selected keys as a set; duplicates collapse.
    pub fn keys(&self) -> BTreeSet<&str> {
        match self {
            Selection::Single(key) => BTreeSet::from([key.as_str()]),
            Selection::Multiple(keys) => keys.iter().map(String::as_str).collect(),
        }
    }

    /// Number of distinct keys in the selection.
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Selection::Single(key) => key.is_empty(),
            Selection::Multiple(keys) => keys.is_empty(),
        }
    }
}

impl ExamRecord {
    /// Parses an exam record from raw file bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Gives every question without an id the positional id `Q<n>`,
    /// where `n` counts questions across all domains in file order starting at 1.
    pub fn assign_question_ids(&mut self) {
        let mut number = 0usize;
        for domain in &mut self.domains {
            for question in &mut domain.questions {
                number += 1;
                if question.id.as_deref().is_none_or(str::is_empty) {
                    question.id = Some(format!("Q{}", number));
                }
            }
        }
    }

    /// Iterates over all questions in file order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.domains.iter().flat_map(|d| d.questions.iter())
    }

    /// Number of questions actually present in the record.
    pub fn question_count(&self) -> usize {
        self.domains.iter().map(|d| d.questions.len()).sum()
    }

    /// True when at least one question expects several keys.
    pub fn has_multi_answer_questions(&self) -> bool {
        self.questions().any(|q| q.correct_choice.is_multi())
    }
}

/// DTO for deriving a retake exam.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RetakeRequest {
    /// Matched against the catalog id first, then the display name.
    #[validate(length(min = 1, max = 500))]
    pub exam_id: String,

    #[validate(length(min = 1))]
    pub incorrect_question_ids: Vec<String>,
}

/// DTO for grading a submission on the server.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GradeRequest {
    #[validate(length(min = 1, max = 500))]
    pub exam_id: String,

    #[serde(default)]
    pub answers: Answers,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_string_or_number(deserializer)?.unwrap_or_default())
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number id, found {}",
            other
        ))),
    }
}

fn whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_whole_number(deserializer)?.unwrap_or_default())
}

/// Accepts `90` as well as `90.0`; fractional or negative values are rejected.
fn optional_whole_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| {
                serde::de::Error::custom(format!("expected a whole number, found {}", n))
            }),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a whole number, found {}",
            other
        ))),
    }
}
