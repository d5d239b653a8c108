// src/catalog/cluster_key.rs

//! Derives the cluster an exam belongs to from its display name.
//!
//! Exam variants such as "CompTIA Security+ SY0-701 Practice Exam 3" and
//! "CompTIA Security+ Practice Test" should land in one cluster. The name is
//! run through an ordered list of removal rules; whatever is left becomes the
//! cluster key (lower snake case) and the cluster title (capitalized words).

use std::sync::LazyLock;

use regex::Regex;

/// Key used when every token of a name is stripped.
/// Derived keys only contain word characters, so the parentheses keep this
/// apart from a real exam named "Uncategorized".
pub const FALLBACK_CLUSTER_KEY: &str = "(uncategorized)";
pub const FALLBACK_CLUSTER_TITLE: &str = "Uncategorized";

/// A named regex whose matches are deleted from an exam name.
pub struct RemovalRule {
    pub name: &'static str,
    pub pattern: Regex,
}

impl RemovalRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("invalid removal rule pattern"),
        }
    }

    pub fn apply(&self, input: &str) -> String {
        self.pattern.replace_all(input, " ").into_owned()
    }
}

/// Removal rules, applied in order.
pub static REMOVAL_RULES: LazyLock<Vec<RemovalRule>> = LazyLock::new(|| {
    vec![
        RemovalRule::new(
            "noise_words",
            r"(?i)\b(?:practice|exam|test|mock|simulation|simulator)\b",
        ),
        // SY0-701, AZ-900, SAA-C03 style codes.
        RemovalRule::new("certification_codes", r"(?i)\b[a-z0-9]{2,4}-[a-z]?\d+\b"),
        RemovalRule::new(
            "versions",
            r"(?i)\b(?:(?:version|exam)\s*\d+(?:\.\d+)?|v?\d+(?:\.\d+)?)\b",
        ),
    ]
});

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W+").expect("invalid non-word pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace pattern"));

/// Cluster identity and display title derived from one exam name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterKey {
    pub key: String,
    pub title: String,
}

impl ClusterKey {
    pub fn from_name(name: &str) -> Self {
        let base = strip_noise(name);
        if base.is_empty() {
            return Self {
                key: FALLBACK_CLUSTER_KEY.to_string(),
                title: FALLBACK_CLUSTER_TITLE.to_string(),
            };
        }
        Self {
            key: key_from_base(&base),
            title: title_case(&base),
        }
    }
}

/// Applies every removal rule, turns punctuation into spaces and collapses whitespace.
/// Case is preserved. Returns an empty string when nothing survives.
pub fn strip_noise(name: &str) -> String {
    let stripped = REMOVAL_RULES
        .iter()
        .fold(name.to_string(), |acc, rule| rule.apply(&acc));
    let spaced = NON_WORD.replace_all(&stripped, " ");
    WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}

fn key_from_base(base: &str) -> String {
    base.to_lowercase().replace(' ', "_")
}

/// Lower snake case cluster key, or the empty string when the name is all noise.
pub fn cluster_key(name: &str) -> String {
    key_from_base(&strip_noise(name))
}

/// Capitalized-words title of the stripped name.
pub fn cluster_title(name: &str) -> String {
    title_case(&strip_noise(name))
}

/// Upper-cases the first letter of each space-separated word and lower-cases the rest.
pub fn title_case(input: &str) -> String {
    input
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
