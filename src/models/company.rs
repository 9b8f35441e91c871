// src/models/company.rs

//! Company tag and favorite-list models.
//!
//! Company question sets are exposed as generated favorite lists, one
//! per encounter window ("Thirty Days", "Three Months", …), reachable
//! through the company's favorite detail record.

use serde::Deserialize;

use super::problem::Problem;

/// One company on the company catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyTag {
    pub name: String,
    pub slug: String,
    #[serde(rename = "questionCount", default)]
    pub question_count: u32,
}

impl CompanyTag {
    /// Canonical company URL on the site.
    pub fn url(&self) -> String {
        format!("https://leetcode.com/company/{}/", self.slug)
    }
}

/// Favorite detail for a company slug; wraps the generated buckets.
#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteDetails {
    #[serde(rename = "generatedFavoritesInfo")]
    pub generated: GeneratedFavoritesInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedFavoritesInfo {
    #[serde(rename = "defaultFavoriteSlug", default)]
    pub default_favorite_slug: Option<String>,
    #[serde(rename = "categoriesToSlugs", default)]
    pub buckets: Vec<FavoriteBucket>,
}

/// One encounter-window bucket of a company's generated favorites.
#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteBucket {
    #[serde(rename = "categoryName")]
    pub name: String,
    #[serde(rename = "favoriteSlug")]
    pub favorite_slug: String,
}

/// One page of a favorite question listing.
#[derive(Debug, Clone, Deserialize)]
pub struct FavoritePage {
    #[serde(default)]
    pub questions: Vec<Problem>,
    #[serde(rename = "hasMore", default)]
    pub has_more: bool,
}
