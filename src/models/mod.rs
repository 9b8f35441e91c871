// src/models/mod.rs

//! Domain models for the archiver.
//!
//! This module contains all data structures exchanged with the API and
//! the configuration record, organized by their primary purpose.

mod card;
mod company;
mod config;
mod problem;
mod submission;

// Re-export all public types
pub use card::{ArticleRef, Card, Category, Chapter, Item, ItemQuestion, ItemSummary};
pub use company::{CompanyTag, FavoriteBucket, FavoriteDetails, FavoritePage};
pub use config::{AiBackend, Config, DownloadImages, DownloadQuestions, RecompressFormat};
pub use problem::{
    Article, CodeSnippet, CommunitySolution, CompanyCount, Difficulty, HtmlArticle,
    PlaygroundCode, Problem, QuestionDetail, SimilarQuestion, SlideFrame, SlideTimeline,
};
pub use submission::{
    ProgressEntry, Submission, SubmissionDetail, SubmissionList, UserProgressPage,
    language_extension,
};
