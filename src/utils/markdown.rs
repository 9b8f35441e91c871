// src/utils/markdown.rs

//! Markdown to HTML conversion for solution and article bodies.
//!
//! Upstream editorial content mixes markdown, raw HTML and TeX. The
//! TeX survives as single-dollar runs for MathJax to render in the
//! browser, so the converter must not treat `$` specially.

use pulldown_cmark::{Event, Options, Parser, html};

/// Render markdown to an HTML fragment.
///
/// Display math `$$…$$` is collapsed to inline `$…$` and the TeX
/// `\space` token becomes a plain space before parsing. Soft line
/// breaks are promoted to hard breaks because the source material was
/// written for break-preserving renderers.
pub fn render(markdown: &str) -> String {
    let prepared = prepare_math(markdown);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(&prepared, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut out = String::with_capacity(prepared.len() * 2);
    html::push_html(&mut out, parser);
    out
}

fn prepare_math(markdown: &str) -> String {
    markdown.replace("$$", "$").replace("\\space", " ")
}
