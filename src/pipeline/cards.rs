// src/pipeline/cards.rs
//! Assembles explore cards into linked offline documents.
//!
//! Three layers: an archive index over every category, one index per
//! card linking its chapters, and one document per chapter item. Items
//! that wrap a question inline the full problem body and take the
//! question's file name; text items carry their article with embeds
//! replaced.

use std::path::Path;

use log::{error, info, warn};

use crate::error::Result;
use crate::models::{Card, Category, Chapter, Config, Item, ItemSummary};
use crate::pipeline::artifacts::ArtifactPipeline;
use crate::pipeline::images::localize_images;
use crate::pipeline::page;
use crate::pipeline::problem::{ProblemAssembler, RunSummary};
use crate::services::{Api, MediaDownloader, SolutionGenerator};
use crate::utils::markdown;
use crate::utils::naming::question_file_name;

pub struct CardAssembler<'a> {
    api: &'a Api,
    config: &'a Config,
    media: &'a dyn MediaDownloader,
    generator: Option<&'a dyn SolutionGenerator>,
}

impl<'a> CardAssembler<'a> {
    pub fn new(
        api: &'a Api,
        config: &'a Config,
        media: &'a dyn MediaDownloader,
        generator: Option<&'a dyn SolutionGenerator>,
    ) -> Self {
        Self {
            api,
            config,
            media,
            generator,
        }
    }

    fn problems(&self) -> ProblemAssembler<'a> {
        ProblemAssembler::new(self.api, self.config, self.media, self.generator)
    }

    /// Assemble cards into `cards_dir`. With `only` set just that card
    /// is built; a full run also writes the archive index.
    pub async fn run(
        &self,
        only: Option<&str>,
        cards_dir: &Path,
        non_stop: bool,
    ) -> Result<RunSummary> {
        let Some(categories) = self.api.categories().await? else {
            warn!("card catalog unavailable");
            return Ok(RunSummary::default());
        };

        if only.is_none() {
            let index = page::document("Explore Cards", &render_top_index(&categories));
            page::write_page(&cards_dir.join("index.html"), &index).await?;
            info!("wrote card index");
        }

        let mut summary = RunSummary::default();
        for category in &categories {
            for card in &category.cards {
                if only.is_some_and(|slug| slug != card.slug) {
                    continue;
                }
                match self.write_card(card, cards_dir, non_stop).await {
                    Ok(card_summary) => {
                        summary.written += card_summary.written;
                        summary.skipped += card_summary.skipped;
                        summary.failed += card_summary.failed;
                    }
                    Err(e) if non_stop || !e.is_data_error() => {
                        error!("card {} failed: {e}", card.slug);
                        summary.failed += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(summary)
    }

    async fn write_card(
        &self,
        card: &Card,
        cards_dir: &Path,
        non_stop: bool,
    ) -> Result<RunSummary> {
        let Some(chapters) = self.api.chapters_with_items(&card.slug).await? else {
            warn!("card {} unavailable", card.slug);
            return Ok(RunSummary::default());
        };
        // the detail record carries the richer description when it loads
        let detail = self.api.card_detail(&card.slug).await?;
        let described = detail.as_ref().unwrap_or(card);
        let card_dir = cards_dir.join(&card.slug);

        let mut summary = RunSummary::default();
        let mut listing = Vec::new();
        for chapter in &chapters {
            let mut entries = Vec::new();
            for item in &chapter.items {
                match self.write_item(card, item, &card_dir).await {
                    Ok((file_name, wrote)) => {
                        if wrote {
                            summary.written += 1;
                        } else {
                            summary.skipped += 1;
                        }
                        entries.push((file_name, item.title.as_str()));
                    }
                    Err(e) if non_stop || !e.is_data_error() => {
                        error!("item {} of card {} failed: {e}", item.id, card.slug);
                        summary.failed += 1;
                        entries.push((
                            question_file_name(item.id, &item.title),
                            item.title.as_str(),
                        ));
                    }
                    Err(e) => return Err(e),
                }
            }
            listing.push((chapter, entries));
        }

        let index = page::document(&described.title, &render_card_index(described, &listing));
        page::write_page(&card_dir.join("index.html"), &index).await?;
        info!("wrote index for card {}", card.slug);
        Ok(summary)
    }

    /// One item document. Returns the resolved file name and whether a
    /// new page was written; existing pages are left alone unless
    /// overwrite is on.
    async fn write_item(
        &self,
        card: &Card,
        item: &ItemSummary,
        card_dir: &Path,
    ) -> Result<(String, bool)> {
        let Some(full) = self.api.chapter_item(&card.slug, item.id).await? else {
            warn!("item {} of card {} unavailable", item.id, card.slug);
            return Ok((question_file_name(item.id, &item.title), false));
        };

        let file_name = item_file_name(item, &full);
        let path = card_dir.join(&file_name);
        if !self.config.overwrite && tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok((file_name, false));
        }

        let (doc_id, body) = self.item_body(card, item, &full, card_dir).await?;
        let html = page::document(&item.title, &body);
        let html = localize_images(
            self.api.http(),
            self.config,
            &html,
            doc_id,
            &card_dir.join("images"),
        )
        .await?;
        page::write_page(&path, &html).await?;
        info!("wrote {}", path.display());
        Ok((file_name, true))
    }

    /// Body of an item document plus the id that keys its image files:
    /// the wrapped question's when there is one, the item's otherwise.
    async fn item_body(
        &self,
        card: &Card,
        item: &ItemSummary,
        full: &Item,
        card_dir: &Path,
    ) -> Result<(u32, String)> {
        let mut body = format!(
            "<p>{}</p>\n<h1>{}</h1>\n",
            page::anchor("index.html", &card.title),
            page::escape(&item.title),
        );
        let mut doc_id = item.id;

        if let Some(question) = &full.question {
            doc_id = question.id;
            match self.api.question(&question.slug).await? {
                Some(detail) if detail.content.is_some() => {
                    body.push_str(&self.problems().body(&detail, card_dir).await?);
                }
                Some(_) => warn!(
                    "question {} in card {} has no readable statement",
                    question.slug, card.slug
                ),
                None => warn!("question {} in card {} unavailable", question.slug, card.slug),
            }
        }

        let mut article_html = String::new();
        if let Some(reference) = &full.article {
            match self.api.article(&reference.id).await?.and_then(|a| a.body) {
                Some(text) => article_html.push_str(&markdown::render(&text)),
                None => warn!("article {} of item {} unavailable", reference.id, item.id),
            }
        }
        if let Some(reference) = &full.html_article {
            match self.api.html_article(&reference.id).await?.and_then(|a| a.html) {
                Some(html) => article_html.push_str(&markdown::render(&html)),
                None => warn!("html article {} of item {} unavailable", reference.id, item.id),
            }
        }
        body.push_str(&page::section("Article", &article_html));

        // slide indices number through the combined document
        let artifacts = ArtifactPipeline::new(self.api, self.config, self.media);
        let body = artifacts.replace_slides(&body, doc_id).await?;
        Ok((doc_id, body))
    }
}

/// Question items reuse the basename of the question's own page, text
/// items are named after the item itself.
fn item_file_name(item: &ItemSummary, full: &Item) -> String {
    match &full.question {
        Some(question) => question_file_name(question.id, &question.title),
        None => question_file_name(item.id, &item.title),
    }
}

fn render_top_index(categories: &[Category]) -> String {
    let mut body = String::from("<h1>Explore Cards</h1>\n");
    for category in categories {
        if category.cards.is_empty() {
            continue;
        }
        let mut table = page::TableBuilder::new().header(&["Card", "Description"]);
        for card in &category.cards {
            table.row(vec![
                page::anchor(&format!("{}/index.html", card.slug), &card.title),
                page::escape(card.description.as_deref().unwrap_or("")),
            ]);
        }
        body.push_str(&page::section(&category.title, &table.build()));
    }
    body
}

fn render_card_index(card: &Card, chapters: &[(&Chapter, Vec<(String, &str)>)]) -> String {
    let mut body = format!(
        "<p>{}</p>\n<h1>{}</h1>\n",
        page::anchor("../index.html", "All cards"),
        page::escape(&card.title)
    );
    if let Some(description) = &card.description {
        body.push_str(&format!("<p>{}</p>\n", page::escape(description)));
    }
    for (chapter, entries) in chapters {
        let mut inner = String::new();
        if let Some(description) = &chapter.description {
            inner.push_str(&format!("<p>{}</p>\n", page::escape(description)));
        }
        let items: String = entries
            .iter()
            .map(|(file_name, title)| format!("<li>{}</li>\n", page::anchor(file_name, title)))
            .collect();
        inner.push_str(&format!("<ol>\n{items}</ol>\n"));
        body.push_str(&page::section(&chapter.title, &inner));
    }
    body
}

/// Write the `<slug>,<url>` listing of every card.
pub async fn write_url_list(categories: &[Category], path: &Path) -> Result<()> {
    let mut out = String::new();
    for category in categories {
        for card in &category.cards {
            out.push_str(&format!("{},{}\n", card.slug, card.url()));
        }
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, out).await?;
    Ok(())
}
