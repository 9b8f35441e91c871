// src/pipeline/page.rs
//! Shared HTML scaffolding for generated pages.
//!
//! Every page the archiver emits starts from the same header template
//! (MathJax + bootstrap + local styles) and is assembled from the small
//! builders in this module. Writers go through [`write_page`] so a crash
//! mid-write never leaves a truncated document behind.

use std::path::Path;

use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::Difficulty;

/// Page head shared by every generated document.
const HEADER_TEMPLATE: &str = include_str!("../../assets/header.html");

/// Wrap a body fragment into a complete standalone HTML document.
pub fn document(title: &str, body: &str) -> String {
    let head = HEADER_TEMPLATE.replace("{title}", &escape(title));
    format!("{head}\n<body>\n{body}\n</body>\n</html>\n")
}

/// A titled block. An empty inner fragment collapses to nothing so
/// callers can pass optional content through unconditionally.
pub fn section(heading: &str, inner: &str) -> String {
    if inner.trim().is_empty() {
        return String::new();
    }
    format!(
        "<div class=\"section\">\n<h2>{}</h2>\n{inner}\n</div>\n",
        escape(heading)
    )
}

/// Escape text for element content.
pub fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Escape text for a double-quoted attribute value.
pub fn escape_attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// An `<a>` element with escaped href and text.
pub fn anchor(href: &str, text: &str) -> String {
    format!(
        "<a href=\"{}\">{}</a>",
        escape_attr(href),
        escape(text)
    )
}

/// Difficulty badge, colored by the stylesheet in the shared header.
pub fn difficulty_span(difficulty: Difficulty) -> String {
    let class = match difficulty {
        Difficulty::Easy => "difficulty-easy",
        Difficulty::Medium => "difficulty-medium",
        Difficulty::Hard => "difficulty-hard",
    };
    format!("<span class=\"{class}\">{}</span>", difficulty.name())
}

/// A fenced code listing with the language recorded on the class.
pub fn code_block(lang_slug: &str, code: &str) -> String {
    format!(
        "<code class=\"language-{}\"><pre>\n{}\n</pre></code>\n",
        escape_attr(lang_slug),
        escape(code)
    )
}

/// Builder for the index tables (cards, companies, question lists).
///
/// Cells are HTML fragments, not text. Callers escape plain text with
/// [`escape`] or build cells through [`anchor`] and friends.
#[derive(Debug, Default)]
pub struct TableBuilder {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the header row from plain text labels.
    pub fn header(mut self, labels: &[&str]) -> Self {
        self.header = labels.iter().map(|l| escape(l)).collect();
        self
    }

    /// Append one row of pre-rendered cell fragments.
    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn build(self) -> String {
        let mut out = String::from("<table>\n");
        if !self.header.is_empty() {
            out.push_str("<thead><tr>");
            for label in &self.header {
                out.push_str(&format!("<th>{label}</th>"));
            }
            out.push_str("</tr></thead>\n");
        }
        out.push_str("<tbody>\n");
        for row in &self.rows {
            out.push_str("<tr>");
            for cell in row {
                out.push_str(&format!("<td>{cell}</td>"));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n</table>\n");
        out
    }
}

/// Write a page atomically: temp file in the target directory, then rename.
pub async fn write_page(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("html.tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(html.as_bytes()).await?;
    file.flush().await?;
    drop(file);
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
