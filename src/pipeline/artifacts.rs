// src/pipeline/artifacts.rs
//! Replaces interactive solution embeds with offline equivalents.
//!
//! Editorial content leans on three kinds of embeds that die without a
//! network: playground iframes, vimeo players and slideshow tokens.
//! Playgrounds become static code listings, videos are downloaded
//! through the external media tool, and slideshows turn into bootstrap
//! carousels fed from the asset host.

use std::path::Path;

use log::warn;
use regex::Regex;

use crate::error::Result;
use crate::models::{Config, PlaygroundCode, SlideFrame};
use crate::pipeline::page;
use crate::services::{Api, MediaDownloader};
use crate::utils::naming::pad_id;

/// Player dimensions when the embed does not carry its own.
const DEFAULT_VIDEO_WIDTH: u32 = 640;
const DEFAULT_VIDEO_HEIGHT: u32 = 360;

/// Rewrites embeds inside one solution or article body.
pub struct ArtifactPipeline<'a> {
    api: &'a Api,
    config: &'a Config,
    media: &'a dyn MediaDownloader,
}

impl<'a> ArtifactPipeline<'a> {
    pub fn new(api: &'a Api, config: &'a Config, media: &'a dyn MediaDownloader) -> Self {
        Self { api, config, media }
    }

    /// Apply every replacement in embed order: videos and playgrounds
    /// first, slideshows last.
    pub async fn replace_all(
        &self,
        content: &str,
        question_id: u32,
        videos_dir: &Path,
    ) -> Result<String> {
        let content = self.replace_videos(content, question_id, videos_dir).await?;
        let content = self.replace_playgrounds(&content).await?;
        self.replace_slides(&content, question_id).await
    }

    /// Turn playground iframes into static listings of their code, one
    /// block per selected language.
    pub async fn replace_playgrounds(&self, content: &str) -> Result<String> {
        let Ok(pattern) =
            Regex::new(r#"<iframe[^>]*src="[^"]*/playground/([^/"]+)[^"]*"[^>]*>\s*</iframe>"#)
        else {
            return Ok(content.to_string());
        };

        let mut out = String::with_capacity(content.len());
        let mut last = 0;
        for caps in pattern.captures_iter(content) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&content[last..whole.start()]);
            last = whole.end();

            let uuid = &caps[1];
            match self.api.playground_codes(uuid).await? {
                Some(codes) if !codes.is_empty() => {
                    out.push_str(&render_playground(
                        &codes,
                        &self.config.preferred_language_order,
                    ));
                }
                _ => {
                    warn!("playground {uuid} has no code; keeping the embed");
                    out.push_str(whole.as_str());
                }
            }
        }
        out.push_str(&content[last..]);
        Ok(out)
    }

    /// Download vimeo embeds and swap them for local `<video>` players.
    /// With video downloads disabled the embeds stay untouched.
    pub async fn replace_videos(
        &self,
        content: &str,
        question_id: u32,
        videos_dir: &Path,
    ) -> Result<String> {
        if !self.config.download_videos {
            return Ok(content.to_string());
        }
        let Ok(pattern) =
            Regex::new(r#"<iframe[^>]*src="([^"]*vimeo\.com/(?:video/)?(\d+)[^"]*)"[^>]*>\s*</iframe>"#)
        else {
            return Ok(content.to_string());
        };

        let mut out = String::with_capacity(content.len());
        let mut last = 0;
        for caps in pattern.captures_iter(content) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&content[last..whole.start()]);
            last = whole.end();

            let src = &caps[1];
            let video_id = &caps[2];
            let stem = format!("{}-{video_id}", pad_id(question_id));
            match self.media.download(src, videos_dir, &stem).await {
                Ok(path) => {
                    let (width, height) = embed_dimensions(whole.as_str());
                    out.push_str(&render_video(&path, width, height));
                }
                Err(e) => {
                    warn!("video {video_id} for question {question_id} not downloaded: {e}");
                    out.push_str(whole.as_str());
                }
            }
        }
        out.push_str(&content[last..]);
        Ok(out)
    }

    /// Replace slideshow tokens with carousels. Every token produces a
    /// carousel with a document-unique id, even when no frames resolve,
    /// so navigation anchors stay stable.
    pub async fn replace_slides(&self, content: &str, question_id: u32) -> Result<String> {
        let Ok(pattern) = Regex::new(r"!\?!([^!]*?\.json)[^!]*!\?!") else {
            return Ok(content.to_string());
        };

        let mut out = String::with_capacity(content.len());
        let mut last = 0;
        let mut index = 0usize;
        for caps in pattern.captures_iter(content) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&content[last..whole.start()]);
            last = whole.end();
            index += 1;

            let token_path = &caps[1];
            let frames = self
                .api
                .slide_content(question_id, token_path)
                .await?
                .unwrap_or_default();
            if frames.is_empty() {
                warn!("slideshow {token_path} for question {question_id} has no frames");
            }
            out.push_str(&render_carousel(index, &frames));
        }
        out.push_str(&content[last..]);
        Ok(out)
    }
}

/// Pick which languages survive. `all` keeps everything in source
/// order; otherwise the first preferred language that is present wins,
/// and no match at all falls back to everything. Shared with the
/// default-code section of assembled problems.
pub fn select_languages<'x, T>(
    items: &'x [T],
    slug_of: impl Fn(&T) -> &str,
    preferred: &[String],
) -> Vec<&'x T> {
    if preferred.iter().any(|p| p.eq_ignore_ascii_case("all")) {
        return items.iter().collect();
    }
    for want in preferred {
        let picked: Vec<&T> = items
            .iter()
            .filter(|item| slug_of(item).eq_ignore_ascii_case(want))
            .collect();
        if !picked.is_empty() {
            return picked;
        }
    }
    items.iter().collect()
}

fn render_playground(codes: &[PlaygroundCode], preferred: &[String]) -> String {
    let blocks: String = select_languages(codes, |c| &c.lang_slug, preferred)
        .iter()
        .map(|c| page::code_block(&c.lang_slug, &c.code))
        .collect();
    format!("<div class=\"playground\">\n{blocks}</div>\n")
}

/// Width and height attributes of an embed tag, with player defaults.
fn embed_dimensions(tag: &str) -> (u32, u32) {
    let read = |name: &str| {
        Regex::new(&format!(r#"{name}="(\d+)""#))
            .ok()
            .and_then(|re| re.captures(tag))
            .and_then(|caps| caps[1].parse().ok())
    };
    (
        read("width").unwrap_or(DEFAULT_VIDEO_WIDTH),
        read("height").unwrap_or(DEFAULT_VIDEO_HEIGHT),
    )
}

fn render_video(path: &Path, width: u32, height: u32) -> String {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("video");
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_else(|| "mp4".to_string());
    format!(
        "<video width=\"{width}\" height=\"{height}\" controls>\
         <source src=\"videos/{}\" type=\"video/{ext}\">\
         </video>",
        page::escape_attr(name)
    )
}

fn render_carousel(index: usize, frames: &[SlideFrame]) -> String {
    let id = format!("slideshow-{index}");
    let mut items = String::new();
    for (i, frame) in frames.iter().enumerate() {
        let class = if i == 0 {
            "carousel-item active"
        } else {
            "carousel-item"
        };
        items.push_str(&format!(
            "<div class=\"{class}\"><img src=\"{}\"></div>\n",
            page::escape_attr(&frame.image)
        ));
    }
    format!(
        "<div id=\"{id}\" class=\"carousel slide\" data-bs-ride=\"carousel\">\n\
         <div class=\"carousel-inner\">\n{items}</div>\n\
         <button class=\"carousel-control-prev\" type=\"button\" data-bs-target=\"#{id}\" data-bs-slide=\"prev\">\n\
         <span class=\"carousel-control-prev-icon\"></span>\n\
         </button>\n\
         <button class=\"carousel-control-next\" type=\"button\" data-bs-target=\"#{id}\" data-bs-slide=\"next\">\n\
         <span class=\"carousel-control-next-icon\"></span>\n\
         </button>\n\
         </div>\n"
    )
}
