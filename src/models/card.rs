// src/models/card.rs

//! Explore-card catalog models: categories, cards, chapters, items.

use serde::Deserialize;

/// One category of explore cards on the top-level catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub title: String,
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// One explore card.
#[derive(Debug, Clone, Deserialize)]
pub struct Card {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Card {
    /// Canonical card URL on the site.
    pub fn url(&self) -> String {
        format!("https://leetcode.com/explore/featured/card/{}/", self.slug)
    }
}

/// Card chapter with its ordered item listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Chapter {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemSummary>,
}

/// Item reference inside a chapter listing. Only the id and title are
/// known until the item body is fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemSummary {
    #[serde(deserialize_with = "super::problem::id_from_string_or_number")]
    pub id: u32,
    pub title: String,
}

/// Full item record. An item may bundle a question with one or both
/// article references; the bodies live behind separate operations.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub question: Option<ItemQuestion>,
    #[serde(default)]
    pub article: Option<ArticleRef>,
    #[serde(rename = "htmlArticle", default)]
    pub html_article: Option<ArticleRef>,
}

/// Reference to an article body.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleRef {
    pub id: String,
}

/// Question reference attached to a card item.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemQuestion {
    #[serde(
        rename = "questionFrontendId",
        deserialize_with = "super::problem::id_from_string_or_number"
    )]
    pub id: u32,
    pub title: String,
    #[serde(rename = "titleSlug")]
    pub slug: String,
}
