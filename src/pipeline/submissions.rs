// src/pipeline/submissions.rs
//! Exports the signed-in user's submissions as source files.
//!
//! One directory per question, newest submission first. The same
//! fetch feeds the submissions section of assembled problem pages, so
//! the listing logic returns the codes as well as writing them out.

use std::collections::BTreeMap;
use std::path::Path;

use log::{info, warn};

use crate::error::Result;
use crate::models::{Config, Submission};
use crate::services::Api;
use crate::utils::naming::pad_id;

/// Progress pages fetched per batch while walking every attempted
/// question.
const PROGRESS_BATCH: u32 = 50;

pub struct SubmissionExporter<'a> {
    api: &'a Api,
    config: &'a Config,
}

impl<'a> SubmissionExporter<'a> {
    pub fn new(api: &'a Api, config: &'a Config) -> Self {
        Self { api, config }
    }

    /// Submissions for one question, newest first, keyed by timestamp.
    ///
    /// `limit` caps how many are kept after filtering and sorting. With
    /// `save_as_file` each body is written to
    /// `<submissions>/<padded id>/<index>-<submission id>.<ext>`;
    /// files that already exist are left alone.
    pub async fn question_submissions(
        &self,
        question_id: u32,
        slug: &str,
        save_as_file: bool,
        limit: Option<usize>,
        accepted_only: bool,
    ) -> Result<BTreeMap<u64, String>> {
        let mut codes = BTreeMap::new();
        let Some(list) = self.api.submission_list(slug).await? else {
            return Ok(codes);
        };

        let mut rows: Vec<Submission> = list
            .submissions
            .into_iter()
            .filter(|s| !accepted_only || s.is_accepted())
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = limit {
            rows.truncate(limit);
        }

        let dir = self.config.submissions_dir().join(pad_id(question_id));
        for (index, row) in rows.iter().enumerate() {
            let Some(detail) = self.api.submission_detail(row.id).await? else {
                warn!("submission {} for {slug} unavailable; skipping", row.id);
                continue;
            };
            if save_as_file {
                let name = format!("{:02}-{}.{}", index + 1, row.id, row.extension());
                write_if_missing(&dir, &name, &detail.code).await?;
            }
            codes.insert(row.timestamp, detail.code);
        }
        Ok(codes)
    }

    /// Export every attempted question's accepted submissions, paging
    /// through the progress listing until the reported total is covered.
    pub async fn export_all(&self) -> Result<u32> {
        let mut skip = 0;
        let mut exported = 0;
        loop {
            let Some(page) = self.api.user_progress(skip, PROGRESS_BATCH).await? else {
                break;
            };
            if page.questions.is_empty() {
                break;
            }
            for entry in &page.questions {
                info!(
                    "exporting submissions for {} {}",
                    pad_id(entry.id),
                    entry.title
                );
                self.question_submissions(entry.id, &entry.slug, true, None, true)
                    .await?;
                exported += 1;
            }
            skip += PROGRESS_BATCH;
            if skip >= page.total {
                break;
            }
        }
        Ok(exported)
    }
}

async fn write_if_missing(dir: &Path, name: &str, code: &str) -> Result<()> {
    let path = dir.join(name);
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Ok(());
    }
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(&path, code).await?;
    Ok(())
}
