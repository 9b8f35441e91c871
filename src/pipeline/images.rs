// src/pipeline/images.rs
//! Localizes the images referenced by an assembled document.
//!
//! Remote `img` sources are downloaded next to the page, validated by a
//! full decode, optionally recompressed, and rewritten to relative (or
//! inline base64) sources. Anything that cannot be turned into a usable
//! local file is removed so offline pages never show broken images.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::codecs::gif::GifDecoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{AnimationDecoder, DynamicImage};
use lol_html::html_content::ContentType;
use lol_html::{HtmlRewriter, Settings, element};
use log::warn;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, DownloadImages, RecompressFormat};
use crate::services::RequestClient;
use crate::utils::md5_hex;
use crate::utils::naming::pad_id;

/// Base for page-relative sources.
const PAGE_BASE: &str = "https://leetcode.com/";

/// Explore cards reference their figures with `../..` chains that are
/// only meaningful relative to this prefix.
const EXPLORE_BASE: &str = "https://leetcode.com/explore/";

/// Quality for recompressed JPEG output.
const JPEG_QUALITY: u8 = 85;

/// Downloads and rewrites images for one document at a time.
pub struct ImagePipeline<'a> {
    client: &'a RequestClient,
    config: &'a Config,
}

/// What happens to one `img` element.
enum Action {
    /// Leave the element untouched.
    Keep,
    /// Drop the element entirely.
    Remove,
    /// Point the element at a new source.
    Replace(String),
    /// Replace the element with one image per extracted frame.
    Expand(Vec<String>),
}

impl<'a> ImagePipeline<'a> {
    pub fn new(client: &'a RequestClient, config: &'a Config) -> Self {
        Self { client, config }
    }

    /// Localize every image in `html`, storing files under `images_dir`
    /// and returning the rewritten document.
    ///
    /// Pages are written next to their `images/` directory, so rewritten
    /// sources always use the `images/<file>` form.
    pub async fn localize(
        &self,
        html: &str,
        question_id: u32,
        images_dir: &Path,
    ) -> Result<String> {
        let sources = collect_sources(html);
        if sources.is_empty() {
            return Ok(html.to_string());
        }

        let mut actions = HashMap::new();
        for src in sources {
            let action = self.action_for(&src, question_id, images_dir).await?;
            actions.insert(src, action);
        }
        rewrite(html, &actions)
    }

    async fn action_for(&self, src: &str, question_id: u32, images_dir: &Path) -> Result<Action> {
        if src.starts_with("data:") {
            return Ok(Action::Keep);
        }
        let Some(url) = resolve_source(src) else {
            warn!("dropping unresolvable image source {src}");
            return Ok(Action::Remove);
        };
        match self.config.download_images {
            DownloadImages::None => {
                if url.as_str() == src {
                    Ok(Action::Keep)
                } else {
                    Ok(Action::Replace(url.into()))
                }
            }
            DownloadImages::New => self.localize_one(&url, question_id, images_dir, false).await,
            DownloadImages::Always => self.localize_one(&url, question_id, images_dir, true).await,
        }
    }

    /// Fetch one image and decide what its element becomes.
    async fn localize_one(
        &self,
        url: &Url,
        question_id: u32,
        images_dir: &Path,
        overwrite: bool,
    ) -> Result<Action> {
        let stem = format!("{}-{}", pad_id(question_id), md5_hex(url.as_str()));

        if !overwrite {
            if let Some(existing) = find_by_stem(images_dir, &stem).await? {
                return self.reuse_existing(&existing, &stem, images_dir).await;
            }
        }

        let (bytes, final_url) = match self.client.fetch_bytes(url.as_str()).await {
            Ok(fetched) => fetched,
            Err(e) if e.is_unavailable() => return Err(e),
            Err(e) => {
                warn!("dropping image {url}: {e}");
                return Ok(Action::Remove);
            }
        };

        let Some(ext) = extension_of(&final_url, &bytes) else {
            warn!("dropping image {url}: no usable file extension");
            return Ok(Action::Remove);
        };

        // SVG is text; a bitmap decode check does not apply.
        if ext == "svg" {
            let path = write_file(images_dir, &format!("{stem}.svg"), &bytes).await?;
            return Ok(Action::Replace(self.final_source(&path).await?));
        }

        let Ok(decoded) = image::load_from_memory(&bytes) else {
            warn!("dropping image {url}: not a decodable image");
            return Ok(Action::Remove);
        };

        if ext == "gif" && self.config.extract_gif_frames {
            write_file(images_dir, &format!("{stem}.gif"), &bytes).await?;
            let frames = write_gif_frames(&bytes, images_dir, &stem).await?;
            if !frames.is_empty() {
                return self.frame_action(images_dir, frames).await;
            }
        }

        let (final_ext, final_bytes) = self.recompressed(&ext, bytes, &decoded)?;
        let name = format!("{stem}.{final_ext}");
        let path = write_file(images_dir, &name, &final_bytes).await?;
        remove_stale_variants(images_dir, &stem, &name).await?;
        Ok(Action::Replace(self.final_source(&path).await?))
    }

    /// A file for this source is already on disk; use it without fetching.
    async fn reuse_existing(
        &self,
        existing: &Path,
        stem: &str,
        images_dir: &Path,
    ) -> Result<Action> {
        let ext = existing
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if ext == "gif" && self.config.extract_gif_frames {
            let mut frames = existing_frames(images_dir, stem).await?;
            if frames.is_empty() {
                let bytes = tokio::fs::read(existing).await?;
                frames = write_gif_frames(&bytes, images_dir, stem).await?;
            }
            if frames.is_empty() {
                warn!("dropping image: cached {stem}.gif has no decodable frames");
                return Ok(Action::Remove);
            }
            return self.frame_action(images_dir, frames).await;
        }

        Ok(Action::Replace(self.final_source(existing).await?))
    }

    async fn frame_action(&self, images_dir: &Path, frames: Vec<String>) -> Result<Action> {
        let mut sources = Vec::with_capacity(frames.len());
        for name in frames {
            sources.push(self.final_source(&images_dir.join(name)).await?);
        }
        Ok(Action::Expand(sources))
    }

    /// Recompress per configuration. WEBP always becomes PNG because we
    /// only decode that format; the extension changes with it.
    fn recompressed(
        &self,
        ext: &str,
        bytes: Vec<u8>,
        decoded: &DynamicImage,
    ) -> Result<(String, Vec<u8>)> {
        match ext {
            "webp" if self.config.recompress(RecompressFormat::Webp) => {
                Ok(("png".to_string(), encode_png(decoded)?))
            }
            "png" if self.config.recompress(RecompressFormat::Png) => {
                Ok((ext.to_string(), encode_png(decoded)?))
            }
            "jpg" | "jpeg" if self.config.recompress(RecompressFormat::Jpg) => {
                Ok((ext.to_string(), encode_jpeg(decoded)?))
            }
            _ => Ok((ext.to_string(), bytes)),
        }
    }

    /// The src value a localized file ends up with.
    async fn final_source(&self, path: &Path) -> Result<String> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::decode("image file has no name"))?;
        if !self.config.base64_encode_image {
            return Ok(format!("images/{name}"));
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let bytes = tokio::fs::read(path).await?;
        Ok(format!(
            "data:{};base64,{}",
            mime_for_extension(&ext),
            STANDARD.encode(&bytes)
        ))
    }
}

/// Convenience wrapper around [`ImagePipeline::localize`].
pub async fn localize_images(
    client: &RequestClient,
    config: &Config,
    html: &str,
    question_id: u32,
    images_dir: &Path,
) -> Result<String> {
    ImagePipeline::new(client, config)
        .localize(html, question_id, images_dir)
        .await
}

/// Distinct image sources in document order.
fn collect_sources(html: &str) -> Vec<String> {
    let document = scraper::Html::parse_document(html);
    let Ok(selector) = scraper::Selector::parse("img[src]") else {
        return Vec::new();
    };
    let mut seen = std::collections::HashSet::new();
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .filter(|src| seen.insert(src.to_string()))
        .map(str::to_string)
        .collect()
}

/// Turn a raw src into the URL to fetch, or `None` for sources that can
/// never resolve (localhost captures, non-HTTP schemes).
fn resolve_source(src: &str) -> Option<Url> {
    let trimmed = src.trim();
    if trimmed.starts_with("..") {
        let tail: Vec<&str> = trimmed
            .split('/')
            .skip_while(|token| *token == "..")
            .collect();
        return check_host(Url::parse(&format!("{EXPLORE_BASE}{}", tail.join("/"))).ok()?);
    }
    match Url::parse(trimmed) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => check_host(url),
        Ok(_) => None,
        Err(_) => {
            let base = Url::parse(PAGE_BASE).ok()?;
            check_host(base.join(trimmed).ok()?)
        }
    }
}

fn check_host(url: Url) -> Option<Url> {
    match url.host_str() {
        Some("localhost") | Some("127.0.0.1") | None => None,
        Some(_) => Some(url),
    }
}

/// Extension from the final URL after redirects, falling back to the
/// sniffed format when the path carries none.
fn extension_of(final_url: &Url, bytes: &[u8]) -> Option<String> {
    let from_path = Path::new(final_url.path())
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .filter(|e| !e.is_empty());
    from_path.or_else(|| {
        image::guess_format(bytes)
            .ok()
            .and_then(|format| format.extensions_str().first())
            .map(|ext| ext.to_string())
    })
}

fn mime_for_extension(ext: &str) -> String {
    match ext {
        "svg" => "image/svg+xml".to_string(),
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        other => format!("image/{other}"),
    }
}

fn encode_png(decoded: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
    decoded
        .write_with_encoder(encoder)
        .map_err(|e| AppError::decode(e.to_string()))?;
    Ok(buf)
}

/// JPEG cannot carry alpha, so translucent pixels are composited over
/// white before encoding.
fn encode_jpeg(decoded: &DynamicImage) -> Result<Vec<u8>> {
    let flat = if decoded.color().has_alpha() {
        flatten_over_white(decoded)
    } else {
        decoded.to_rgb8()
    };
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    DynamicImage::ImageRgb8(flat)
        .write_with_encoder(encoder)
        .map_err(|e| AppError::decode(e.to_string()))?;
    Ok(buf)
}

fn flatten_over_white(decoded: &DynamicImage) -> image::RgbImage {
    let rgba = decoded.to_rgba8();
    let mut out = image::RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let a = u32::from(px[3]);
        let blend = |c: u8| ((u32::from(c) * a + 255 * (255 - a)) / 255) as u8;
        out.put_pixel(x, y, image::Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    out
}

/// Decode an animated GIF and write each frame as
/// `<stem>_<three digit index>.png`, returning the file names in order.
/// An undecodable animation yields an empty list.
async fn write_gif_frames(bytes: &[u8], dir: &Path, stem: &str) -> Result<Vec<String>> {
    let buffers = match decode_gif_frames(bytes) {
        Ok(buffers) => buffers,
        Err(e) => {
            warn!("gif frame extraction failed for {stem}: {e}");
            return Ok(Vec::new());
        }
    };
    let mut names = Vec::with_capacity(buffers.len());
    for (index, buffer) in buffers.into_iter().enumerate() {
        let name = format!("{stem}_{index:03}.png");
        let png = encode_png(&DynamicImage::ImageRgba8(buffer))?;
        write_file(dir, &name, &png).await?;
        names.push(name);
    }
    Ok(names)
}

fn decode_gif_frames(bytes: &[u8]) -> Result<Vec<image::RgbaImage>> {
    let decoder = GifDecoder::new(Cursor::new(bytes)).map_err(|e| AppError::decode(e.to_string()))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| AppError::decode(e.to_string()))?;
    Ok(frames.into_iter().map(|f| f.into_buffer()).collect())
}

/// Frame files already extracted for this stem, in index order.
async fn existing_frames(dir: &Path, stem: &str) -> Result<Vec<String>> {
    let prefix = format!("{stem}_");
    let mut names = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
        Err(e) => return Err(AppError::Io(e)),
    };
    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with(&prefix) && name.ends_with(".png") {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Any file named `<stem>.<ext>` in `dir`, whatever the extension.
async fn find_by_stem(dir: &Path, stem: &str) -> Result<Option<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AppError::Io(e)),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name
            .strip_prefix(stem)
            .is_some_and(|rest| rest.len() > 1 && rest.starts_with('.'))
        {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

/// Recompression can change the extension; drop leftovers from earlier
/// runs that kept the old one.
async fn remove_stale_variants(dir: &Path, stem: &str, keep: &str) -> Result<()> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(AppError::Io(e)),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name != keep
            && name
                .strip_prefix(stem)
                .is_some_and(|rest| rest.starts_with('.'))
        {
            tokio::fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}

async fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(name);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Apply the per-source decisions in a single streaming pass.
fn rewrite(html: &str, actions: &HashMap<String, Action>) -> Result<String> {
    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("img[src]", |el| {
                let Some(src) = el.get_attribute("src") else {
                    return Ok(());
                };
                match actions.get(&src) {
                    None | Some(Action::Keep) => {}
                    Some(Action::Remove) => el.remove(),
                    Some(Action::Replace(new_src)) => {
                        el.set_attribute("src", new_src)?;
                    }
                    Some(Action::Expand(sources)) => {
                        let frames: String = sources
                            .iter()
                            .map(|s| {
                                format!(
                                    "<img src=\"{}\">",
                                    html_escape::encode_double_quoted_attribute(s)
                                )
                            })
                            .collect();
                        el.replace(&frames, ContentType::Html);
                    }
                }
                Ok(())
            })],
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );
    rewriter
        .write(html.as_bytes())
        .map_err(|e| AppError::decode(e.to_string()))?;
    rewriter
        .end()
        .map_err(|e| AppError::decode(e.to_string()))?;
    String::from_utf8(output).map_err(|e| AppError::decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            2,
            2,
            image::Rgba([120, 40, 200, 255]),
        ));
        let mut buf = Vec::new();
        img.write_with_encoder(PngEncoder::new(&mut buf)).unwrap();
        buf
    }

    fn gif_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut encoder = image::codecs::gif::GifEncoder::new(&mut buf);
            for shade in [0u8, 255u8] {
                let frame = image::RgbaImage::from_pixel(2, 2, image::Rgba([shade, 10, 10, 255]));
                encoder.encode_frame(image::Frame::new(frame)).unwrap();
            }
        }
        buf
    }

    fn test_client() -> Arc<RequestClient> {
        Arc::new(RequestClient::new("", 3, None).unwrap())
    }

    #[test]
    fn test_resolve_source_variants() {
        assert_eq!(
            resolve_source("../../Figures/485/one.png").unwrap().as_str(),
            "https://leetcode.com/explore/Figures/485/one.png"
        );
        assert_eq!(
            resolve_source("/uploads/a.png").unwrap().as_str(),
            "https://leetcode.com/uploads/a.png"
        );
        assert_eq!(
            resolve_source("https://assets.leetcode.com/x.png")
                .unwrap()
                .as_str(),
            "https://assets.leetcode.com/x.png"
        );
        assert!(resolve_source("http://localhost:8000/capture.png").is_none());
        assert!(resolve_source("http://127.0.0.1/x.png").is_none());
    }

    #[tokio::test]
    async fn test_localize_downloads_and_rewrites() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/img/a.png")
            .with_status(200)
            .with_body(png_bytes())
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let images_dir = dir.path().join("images");
        let config = Config::default();
        let client = test_client();
        let url = format!("{}/img/a.png", server.url());
        let html = format!("<html><body><img src=\"{url}\" alt=\"x\"></body></html>");

        let out = localize_images(&client, &config, &html, 1, &images_dir)
            .await
            .unwrap();

        mock.assert_async().await;
        let expected = format!("0001-{}.png", md5_hex(&url));
        assert!(images_dir.join(&expected).is_file());
        assert!(out.contains(&format!("src=\"images/{expected}\"")));
        assert!(out.contains("alt=\"x\""));
    }

    #[tokio::test]
    async fn test_data_uri_kept_and_localhost_removed() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let client = test_client();
        let html = "<p><img src=\"data:image/png;base64,AAAA\"><img src=\"http://localhost/cap.png\"></p>";

        let out = localize_images(&client, &config, html, 7, &dir.path().join("images"))
            .await
            .unwrap();

        assert!(out.contains("data:image/png;base64,AAAA"));
        assert!(!out.contains("localhost"));
    }

    #[tokio::test]
    async fn test_mode_none_absolutizes_without_downloading() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            download_images: DownloadImages::None,
            ..Config::default()
        };
        let client = test_client();
        let html = "<img src=\"../../Figures/1/a.png\">";

        let out = localize_images(&client, &config, html, 1, &dir.path().join("images"))
            .await
            .unwrap();

        assert!(out.contains("src=\"https://leetcode.com/explore/Figures/1/a.png\""));
        assert!(!dir.path().join("images").exists());
    }

    #[tokio::test]
    async fn test_existing_file_reused_without_fetch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/img/b.png")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let images_dir = dir.path().join("images");
        std::fs::create_dir_all(&images_dir).unwrap();
        let url = format!("{}/img/b.png", server.url());
        let name = format!("0002-{}.png", md5_hex(&url));
        std::fs::write(images_dir.join(&name), png_bytes()).unwrap();

        let config = Config::default();
        let client = test_client();
        let html = format!("<img src=\"{url}\">");
        let out = localize_images(&client, &config, &html, 2, &images_dir)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(out.contains(&format!("src=\"images/{name}\"")));
    }

    #[tokio::test]
    async fn test_webp_recompressed_to_png() {
        let mut server = mockito::Server::new_async().await;
        // Content sniffing decodes the body; only the URL extension says webp.
        let _mock = server
            .mock("GET", "/img/pic.webp")
            .with_status(200)
            .with_body(png_bytes())
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let images_dir = dir.path().join("images");
        let config = Config {
            recompress_image_formats: vec![RecompressFormat::Webp],
            ..Config::default()
        };
        let client = test_client();
        let url = format!("{}/img/pic.webp", server.url());
        let html = format!("<img src=\"{url}\">");

        let out = localize_images(&client, &config, &html, 3, &images_dir)
            .await
            .unwrap();

        let expected = format!("0003-{}.png", md5_hex(&url));
        assert!(images_dir.join(&expected).is_file());
        assert!(out.contains(&format!("images/{expected}")));
    }

    #[tokio::test]
    async fn test_gif_frames_replace_single_img() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/anim.gif")
            .with_status(200)
            .with_body(gif_bytes())
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let images_dir = dir.path().join("images");
        let config = Config {
            extract_gif_frames: true,
            ..Config::default()
        };
        let client = test_client();
        let url = format!("{}/anim.gif", server.url());
        let html = format!("<div><img src=\"{url}\"></div>");

        let out = localize_images(&client, &config, &html, 4, &images_dir)
            .await
            .unwrap();

        let stem = format!("0004-{}", md5_hex(&url));
        assert!(images_dir.join(format!("{stem}.gif")).is_file());
        assert!(images_dir.join(format!("{stem}_000.png")).is_file());
        assert!(images_dir.join(format!("{stem}_001.png")).is_file());
        assert!(out.contains(&format!("images/{stem}_000.png")));
        assert!(out.contains(&format!("images/{stem}_001.png")));
        assert!(!out.contains(".gif"));
    }

    #[tokio::test]
    async fn test_undecodable_image_removed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/broken.png")
            .with_status(200)
            .with_body("this is not a png")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let images_dir = dir.path().join("images");
        let config = Config::default();
        let client = test_client();
        let url = format!("{}/broken.png", server.url());
        let html = format!("<p>text<img src=\"{url}\">more</p>");

        let out = localize_images(&client, &config, &html, 5, &images_dir)
            .await
            .unwrap();

        assert!(!out.contains("<img"));
        assert!(out.contains("text"));
        assert!(out.contains("more"));
        assert!(find_by_stem(&images_dir, &format!("0005-{}", md5_hex(&url)))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_base64_inlines_saved_file() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/inline.png")
            .with_status(200)
            .with_body(png_bytes())
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let images_dir = dir.path().join("images");
        let config = Config {
            base64_encode_image: true,
            ..Config::default()
        };
        let client = test_client();
        let url = format!("{}/inline.png", server.url());
        let html = format!("<img src=\"{url}\">");

        let out = localize_images(&client, &config, &html, 6, &images_dir)
            .await
            .unwrap();

        assert!(out.contains("src=\"data:image/png;base64,"));
        // The file is still saved so later runs can reuse it.
        assert!(find_by_stem(&images_dir, &format!("0006-{}", md5_hex(&url)))
            .await
            .unwrap()
            .is_some());
    }
}
