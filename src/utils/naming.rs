// src/utils/naming.rs

//! Deterministic file naming shared by every assembler.
//!
//! One problem maps to exactly one base name, so re-runs and the
//! company copy step always agree on where a document lives.

use std::path::Path;

use crate::error::Result;

/// Characters that are unsafe in file names; each becomes a space.
const UNSAFE: [char; 7] = [':', '?', '|', '>', '<', '/', '\\'];

/// Zero-padded four digit problem id.
pub fn pad_id(id: u32) -> String {
    format!("{id:04}")
}

/// Replace filesystem-unsafe characters in a title with spaces.
pub fn sanitize_title(title: &str) -> String {
    title.replace(UNSAFE, " ")
}

/// Base file name for a problem: padded id plus hyphen-joined title words.
///
/// # Examples
/// ```
/// use leetcode_scraper::utils::naming::basename;
///
/// assert_eq!(basename(1, "Two Sum"), "0001-Two-Sum");
/// ```
pub fn basename(id: u32, title: &str) -> String {
    let sanitized = sanitize_title(title);
    let words: Vec<&str> = sanitized.split_whitespace().collect();
    format!("{}-{}", pad_id(id), words.join("-"))
}

/// File name of an assembled problem document.
pub fn question_file_name(id: u32, title: &str) -> String {
    format!("{}.html", basename(id, title))
}

/// Copy an assembled question document and the `images/` files it
/// references from `src_dir` into `dst_dir`, creating directories as
/// needed. Inlined (`data:`) and remote images need no copying.
pub fn copy_question(src_dir: &Path, dst_dir: &Path, file_name: &str) -> Result<()> {
    let src_file = src_dir.join(file_name);
    std::fs::create_dir_all(dst_dir)?;
    std::fs::copy(&src_file, dst_dir.join(file_name))?;

    let html = std::fs::read_to_string(&src_file)?;
    for image in referenced_images(&html) {
        let src_image = src_dir.join("images").join(&image);
        if !src_image.is_file() {
            continue;
        }
        let image_dir = dst_dir.join("images");
        std::fs::create_dir_all(&image_dir)?;
        std::fs::copy(&src_image, image_dir.join(&image))?;
    }
    Ok(())
}

/// Image file names referenced relatively from a document.
fn referenced_images(html: &str) -> Vec<String> {
    let document = scraper::Html::parse_document(html);
    let Ok(selector) = scraper::Selector::parse("img[src]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .filter_map(|src| src.strip_prefix("images/"))
        .map(str::to_string)
        .collect()
}
