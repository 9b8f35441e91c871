// src/services/media.rs

//! External media downloader port.
//!
//! Embedded videos are fetched by shelling out to a yt-dlp style tool;
//! the tool picks the container format, so the produced file is located
//! by its stem afterwards.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{AppError, Result};

/// A tool that can fetch a streaming video to disk.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Download `url` into `dest_dir` under the given file stem and
    /// return the path of the produced file.
    async fn download(&self, url: &str, dest_dir: &Path, stem: &str) -> Result<PathBuf>;
}

/// Downloader backed by the `yt-dlp` executable.
pub struct YtDlpDownloader {
    program: String,
}

impl YtDlpDownloader {
    pub fn new() -> Self {
        Self::with_program("yt-dlp")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for YtDlpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaDownloader for YtDlpDownloader {
    async fn download(&self, url: &str, dest_dir: &Path, stem: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dest_dir).await?;

        // %(ext)s lets the tool pick the container
        let template = dest_dir.join(format!("{stem}.%(ext)s"));
        let output = Command::new(&self.program)
            .arg("--no-playlist")
            .arg("--output")
            .arg(&template)
            .arg(url)
            .output()
            .await
            .map_err(|e| AppError::external_tool(&self.program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::external_tool(
                &self.program,
                format!(
                    "exit code {:?}: {}",
                    output.status.code(),
                    stderr.trim().lines().last().unwrap_or("")
                ),
            ));
        }

        find_by_stem(dest_dir, stem).await?.ok_or_else(|| {
            AppError::external_tool(&self.program, format!("produced no file for {url}"))
        })
    }
}

/// First file in `dir` named `<stem>.<anything>`.
async fn find_by_stem(dir: &Path, stem: &str) -> Result<Option<PathBuf>> {
    let prefix = format!("{stem}.");
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(&prefix) {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}
