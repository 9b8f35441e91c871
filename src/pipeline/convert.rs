// src/pipeline/convert.rs
//! Print conversion of assembled problem documents.
//!
//! Shells out to a wkhtmltopdf style tool, one `<input> <output>` pair
//! per document, with a bounded number of conversions in flight.

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use log::{error, info, warn};
use tokio::process::Command;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::pipeline::problem::RunSummary;

pub struct PdfConverter {
    program: String,
    workers: usize,
}

impl PdfConverter {
    pub fn new(config: &Config) -> Self {
        Self::with_program("wkhtmltopdf", config.threads_count_for_pdf_conversion)
    }

    pub fn with_program(program: impl Into<String>, workers: usize) -> Self {
        Self {
            program: program.into(),
            workers: workers.max(1),
        }
    }

    /// Convert every document under `questions_dir` into `pdf_dir`.
    /// Existing targets are left alone; failed conversions are counted
    /// and do not stop the rest of the batch.
    pub async fn convert_all(&self, questions_dir: &Path, pdf_dir: &Path) -> Result<RunSummary> {
        let documents = html_documents(questions_dir).await?;
        if documents.is_empty() {
            warn!("nothing to convert under {}", questions_dir.display());
            return Ok(RunSummary::default());
        }
        tokio::fs::create_dir_all(pdf_dir).await?;

        let mut jobs = stream::iter(documents.into_iter().map(|doc| {
            let target = pdf_dir.join(pdf_name(&doc));
            async move { (doc.clone(), self.convert_one(&doc, &target).await) }
        }))
        .buffer_unordered(self.workers);

        let mut summary = RunSummary::default();
        while let Some((doc, outcome)) = jobs.next().await {
            match outcome {
                Ok(true) => summary.written += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    error!("conversion of {} failed: {e}", doc.display());
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }

    /// `Ok(false)` when the target already existed.
    async fn convert_one(&self, source: &Path, target: &Path) -> Result<bool> {
        if tokio::fs::try_exists(target).await.unwrap_or(false) {
            return Ok(false);
        }

        let output = Command::new(&self.program)
            .arg(source)
            .arg(target)
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
        if !tokio::fs::try_exists(target).await.unwrap_or(false) {
            return Err(AppError::external_tool(
                &self.program,
                format!("produced no output for {}", source.display()),
            ));
        }
        info!("converted {}", target.display());
        Ok(true)
    }
}

fn pdf_name(document: &Path) -> String {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}.pdf")
}

/// Problem documents in `dir`, sorted so batches are deterministic.
async fn html_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(Vec::new());
    }
    let mut documents = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "html") {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_questions(dir: &Path) -> PathBuf {
        let questions = dir.join("questions");
        std::fs::create_dir_all(&questions).unwrap();
        std::fs::write(questions.join("0001-Two-Sum.html"), "<html>1</html>").unwrap();
        std::fs::write(questions.join("0002-Add-Two-Numbers.html"), "<html>2</html>").unwrap();
        std::fs::write(questions.join("notes.txt"), "not a document").unwrap();
        questions
    }

    #[tokio::test]
    async fn test_converts_each_document_once() {
        let dir = tempfile::tempdir().unwrap();
        let questions = seeded_questions(dir.path());
        let pdf = dir.path().join("pdf");

        // cp stands in for the converter: <input> <output>
        let converter = PdfConverter::with_program("cp", 4);
        let summary = converter.convert_all(&questions, &pdf).await.unwrap();
        assert_eq!(summary.written, 2);
        assert_eq!(summary.failed, 0);
        assert!(pdf.join("0001-Two-Sum.pdf").is_file());
        assert!(pdf.join("0002-Add-Two-Numbers.pdf").is_file());
        assert!(!pdf.join("notes.pdf").exists());

        // second run finds every target in place
        let again = converter.convert_all(&questions, &pdf).await.unwrap();
        assert_eq!(again.written, 0);
        assert_eq!(again.skipped, 2);
    }

    #[tokio::test]
    async fn test_missing_converter_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let questions = seeded_questions(dir.path());
        let pdf = dir.path().join("pdf");

        let converter = PdfConverter::with_program("no-such-converter-binary", 2);
        let summary = converter.convert_all(&questions, &pdf).await.unwrap();
        assert_eq!(summary.written, 0);
        assert_eq!(summary.failed, 2);
    }

    #[tokio::test]
    async fn test_silent_converter_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let questions = seeded_questions(dir.path());
        let pdf = dir.path().join("pdf");

        // exits cleanly but writes nothing
        let converter = PdfConverter::with_program("true", 2);
        let summary = converter.convert_all(&questions, &pdf).await.unwrap();
        assert_eq!(summary.failed, 2);
    }

    #[tokio::test]
    async fn test_missing_questions_dir_is_empty_run() {
        let dir = tempfile::tempdir().unwrap();
        let converter = PdfConverter::with_program("cp", 2);
        let summary = converter
            .convert_all(&dir.path().join("questions"), &dir.path().join("pdf"))
            .await
            .unwrap();
        assert_eq!(summary, RunSummary::default());
    }
}
