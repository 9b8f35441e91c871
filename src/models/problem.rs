// src/models/problem.rs

//! Problem catalog and question detail models.
//!
//! The API spells numeric ids as strings in some listings and as
//! numbers in others, and hides two fields (`companyTagStats`,
//! `similarQuestions`) behind a second layer of JSON encoding; the
//! deserializers here absorb both quirks.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::naming;

/// Problem difficulty. Listings spell it `Easy`, favorites `EASY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn name(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(serde::de::Error::custom(format!(
                "unknown difficulty '{other}'"
            ))),
        }
    }
}

/// One catalog entry. Built from `question-list` records and reused for
/// company favorite lists, which rename half the fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    #[serde(
        rename = "frontendQuestionId",
        alias = "questionFrontendId",
        deserialize_with = "id_from_string_or_number"
    )]
    pub id: u32,
    pub title: String,
    #[serde(rename = "titleSlug")]
    pub slug: String,
    pub difficulty: Difficulty,
    #[serde(rename = "freqBar", alias = "frequency", default)]
    pub frequency: Option<f64>,
    #[serde(rename = "paidOnly", default)]
    pub paid_only: bool,
    #[serde(default)]
    pub status: Option<String>,
}

impl Problem {
    /// Stable on-disk base name, e.g. `0001-Two-Sum`.
    pub fn basename(&self) -> String {
        naming::basename(self.id, &self.title)
    }

    /// File name of the assembled document.
    pub fn file_name(&self) -> String {
        naming::question_file_name(self.id, &self.title)
    }

    /// Canonical problem URL on the site.
    pub fn url(&self) -> String {
        format!("https://leetcode.com/problems/{}/", self.slug)
    }

    /// Frequency with the missing case flattened to zero, for sorting.
    pub fn frequency_or_zero(&self) -> f64 {
        self.frequency.unwrap_or(0.0)
    }

    pub fn is_solved(&self) -> bool {
        self.status.as_deref() == Some("ac")
    }
}

/// Full question record backing one assembled document.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionDetail {
    #[serde(
        rename = "questionFrontendId",
        deserialize_with = "id_from_string_or_number"
    )]
    pub id: u32,
    pub title: String,
    #[serde(rename = "titleSlug")]
    pub slug: String,
    pub difficulty: Difficulty,
    /// Statement HTML; null for premium problems without access.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "companyTagStats", default)]
    company_tag_stats: Option<String>,
    #[serde(rename = "similarQuestions", default)]
    similar_questions: Option<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(rename = "codeSnippets", default)]
    pub code_snippets: Vec<CodeSnippet>,
    /// Present when an official solution exists; its body is fetched
    /// through a separate operation.
    #[serde(default)]
    pub solution: Option<SolutionRef>,
}

impl QuestionDetail {
    /// Decode the doubly-encoded company stats: window → tagged
    /// companies with encounter counts. Malformed blobs degrade to an
    /// empty map, the section is optional.
    pub fn company_stats(&self) -> BTreeMap<u32, Vec<CompanyCount>> {
        let Some(raw) = self.company_tag_stats.as_deref() else {
            return BTreeMap::new();
        };
        let parsed: BTreeMap<String, Vec<CompanyCount>> = match serde_json::from_str(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("unreadable companyTagStats for '{}': {e}", self.slug);
                return BTreeMap::new();
            }
        };
        parsed
            .into_iter()
            .filter_map(|(window, companies)| window.parse().ok().map(|w| (w, companies)))
            .collect()
    }

    /// Decode the doubly-encoded similar-questions list.
    pub fn similar_questions(&self) -> Vec<SimilarQuestion> {
        let Some(raw) = self.similar_questions.as_deref() else {
            return Vec::new();
        };
        match serde_json::from_str(raw) {
            Ok(similar) => similar,
            Err(e) => {
                log::warn!("unreadable similarQuestions for '{}': {e}", self.slug);
                Vec::new()
            }
        }
    }

    pub fn url(&self) -> String {
        format!("https://leetcode.com/problems/{}/", self.slug)
    }
}

/// Marker that an official solution exists for a question.
#[derive(Debug, Clone, Deserialize)]
pub struct SolutionRef {
    #[serde(default)]
    pub id: Option<String>,
}

/// Default code stub for one language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSnippet {
    pub lang: String,
    #[serde(rename = "langSlug")]
    pub lang_slug: String,
    pub code: String,
}

/// One company row inside a tag-stats window.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyCount {
    pub name: String,
    #[serde(rename = "timesEncountered", default)]
    pub count: u32,
}

/// Similar-question reference; linked by slug only.
#[derive(Debug, Clone, Deserialize)]
pub struct SimilarQuestion {
    pub title: String,
    #[serde(rename = "titleSlug")]
    pub slug: String,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

impl SimilarQuestion {
    pub fn url(&self) -> String {
        format!("https://leetcode.com/problems/{}/", self.slug)
    }
}

/// Editorial article attached to a card item.
#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Pre-rendered HTML article attached to a card item.
#[derive(Debug, Clone, Deserialize)]
pub struct HtmlArticle {
    #[serde(default)]
    pub html: Option<String>,
}

/// Interactive playground snippet for one language.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaygroundCode {
    #[serde(rename = "langSlug")]
    pub lang_slug: String,
    pub code: String,
}

/// Community solution reference from the listing; the body is fetched
/// per topic id.
#[derive(Debug, Clone, Deserialize)]
pub struct CommunitySolution {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: u32,
    pub title: String,
}

/// Slideshow timeline fetched from the static asset host.
#[derive(Debug, Clone, Deserialize)]
pub struct SlideTimeline {
    #[serde(default)]
    pub timeline: Vec<SlideFrame>,
}

/// One frame of an embedded slideshow.
#[derive(Debug, Clone, Deserialize)]
pub struct SlideFrame {
    pub image: String,
}

pub(crate) fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|e| D::Error::custom(format!("bad id '{s}': {e}"))),
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| D::Error::custom(format!("id {n} out of range"))),
        other => Err(D::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
