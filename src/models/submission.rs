// src/models/submission.rs

//! Submission listing and detail models.

use serde::{Deserialize, Deserializer};

/// One page of the submission listing for a question.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionList {
    #[serde(default)]
    pub submissions: Vec<Submission>,
}

/// One submission row. The code body lives in a separate detail record.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    #[serde(deserialize_with = "super::problem::id_from_string_or_number")]
    pub id: u32,
    #[serde(rename = "statusDisplay", default)]
    pub status_display: String,
    pub lang: String,
    #[serde(deserialize_with = "timestamp_from_string_or_number")]
    pub timestamp: u64,
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        self.status_display == "Accepted"
    }

    /// File extension for the submission's language.
    pub fn extension(&self) -> &'static str {
        language_extension(&self.lang)
    }
}

/// Submission body.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionDetail {
    pub code: String,
}

/// One page of the user progress listing.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProgressPage {
    #[serde(rename = "totalNum", default)]
    pub total: u32,
    #[serde(default)]
    pub questions: Vec<ProgressEntry>,
}

/// One attempted question in the user progress listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressEntry {
    #[serde(
        rename = "frontendId",
        alias = "questionFrontendId",
        deserialize_with = "super::problem::id_from_string_or_number"
    )]
    pub id: u32,
    pub title: String,
    #[serde(rename = "titleSlug")]
    pub slug: String,
}

/// Map a language slug to the extension its exports are written with.
/// Unknown languages fall back to plain text.
pub fn language_extension(lang: &str) -> &'static str {
    match lang {
        "python" | "python3" | "pythonml" => "py",
        "pythondata" => "pd.py",
        "c" => "c",
        "cpp" => "cpp",
        "csharp" => "cs",
        "java" => "java",
        "kotlin" => "kt",
        "mysql" | "mssql" | "oraclesql" => "sql",
        "javascript" => "js",
        "html" => "html",
        "php" => "php",
        "golang" => "go",
        "scala" => "scala",
        "rust" => "rs",
        "ruby" => "rb",
        "bash" => "sh",
        "swift" => "swift",
        _ => "txt",
    }
}

fn timestamp_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|e| D::Error::custom(format!("bad timestamp '{s}': {e}"))),
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom(format!("timestamp {n} out of range"))),
        other => Err(D::Error::custom(format!(
            "expected string or number timestamp, got {other}"
        ))),
    }
}
