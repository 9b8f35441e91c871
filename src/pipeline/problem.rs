// src/pipeline/problem.rs
//! Assembles problems into standalone offline pages.
//!
//! One page per problem: statement, hints, default code, the solution
//! (official, or generated when a backend is configured), company tag
//! stats, similar questions and the user's accepted submissions. The
//! section builders return empty strings for absent material so the
//! page never carries empty headings.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::error::Result;
use crate::models::{CodeSnippet, Config, DownloadQuestions, Problem, QuestionDetail};
use crate::pipeline::artifacts::{ArtifactPipeline, select_languages};
use crate::pipeline::images::localize_images;
use crate::pipeline::page;
use crate::pipeline::submissions::SubmissionExporter;
use crate::services::{Api, MediaDownloader, SolutionGenerator, SolutionPrompt};
use crate::utils::markdown;
use crate::utils::naming::pad_id;

/// Ordering of community solutions fed to the generator.
const COMMUNITY_ORDER: &str = "most_votes";

/// Builds and writes problem pages.
pub struct ProblemAssembler<'a> {
    api: &'a Api,
    config: &'a Config,
    media: &'a dyn MediaDownloader,
    generator: Option<&'a dyn SolutionGenerator>,
}

/// Outcome counters for a bulk run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub written: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl<'a> ProblemAssembler<'a> {
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

    /// Assemble and write one problem page into `questions_dir`.
    ///
    /// `Ok(None)` means the question is unavailable right now or has no
    /// readable statement (premium without access).
    pub async fn write(&self, slug: &str, questions_dir: &Path) -> Result<Option<PathBuf>> {
        let Some(detail) = self.api.question(slug).await? else {
            warn!("question {slug} unavailable; skipping");
            return Ok(None);
        };
        if detail.content.is_none() {
            warn!("question {slug} has no readable statement; skipping");
            return Ok(None);
        }

        let body = self.body(&detail, questions_dir).await?;
        let html = page::document(&detail.title, &body);
        let html = localize_images(
            self.api.http(),
            self.config,
            &html,
            detail.id,
            &questions_dir.join("images"),
        )
        .await?;

        let path = questions_dir.join(crate::utils::naming::question_file_name(
            detail.id,
            &detail.title,
        ));
        page::write_page(&path, &html).await?;
        info!("wrote {}", path.display());
        Ok(Some(path))
    }

    /// The body of a problem page, sections in their fixed order. Card
    /// items reuse this to inline problems into their documents.
    pub async fn body(&self, detail: &QuestionDetail, base_dir: &Path) -> Result<String> {
        let mut body = String::new();
        body.push_str(&header_section(detail));
        body.push_str(&format!(
            "<p>Difficulty: {}</p>\n",
            page::difficulty_span(detail.difficulty)
        ));
        if let Some(content) = &detail.content {
            body.push_str(&page::section("Problem", &markdown::render(content)));
        }
        body.push_str(&hints_section(detail));
        if self.config.include_default_code {
            body.push_str(&default_code_section(
                &detail.code_snippets,
                &self.config.preferred_language_order,
            ));
        }
        body.push_str(&self.solution_section(detail, base_dir).await?);
        body.push_str(&company_stats_section(detail));
        body.push_str(&similar_section(detail));
        if self.config.include_submissions_count > 0 {
            body.push_str(&self.submissions_section(detail).await?);
        }
        Ok(body)
    }

    /// Official solution when one exists, otherwise a generated one when
    /// a backend is configured, otherwise nothing.
    async fn solution_section(&self, detail: &QuestionDetail, base_dir: &Path) -> Result<String> {
        if let Some(solution) = self.api.official_solution(&detail.slug).await? {
            let artifacts = ArtifactPipeline::new(self.api, self.config, self.media);
            let replaced = artifacts
                .replace_all(&solution, detail.id, &base_dir.join("videos"))
                .await?;
            return Ok(page::section("Solution", &markdown::render(&replaced)));
        }

        if let Some(generator) = self.generator {
            if let Some(text) = self.generate_solution(detail, generator).await? {
                let labelled = format!(
                    "<p><em>AI generated</em></p>\n{}",
                    markdown::render(&text)
                );
                return Ok(page::section("Solution (AI generated)", &labelled));
            }
        }
        Ok(String::new())
    }

    async fn generate_solution(
        &self,
        detail: &QuestionDetail,
        generator: &dyn SolutionGenerator,
    ) -> Result<Option<String>> {
        let mut references = Vec::new();
        let want = self.config.include_community_solution_count;
        if want > 0 {
            if let Some(listing) = self
                .api
                .community_solutions(&detail.slug, want, 0, COMMUNITY_ORDER)
                .await?
            {
                for entry in listing {
                    if let Some(content) = self.api.community_solution_content(entry.id).await? {
                        references.push(content);
                    }
                }
            }
        }

        let prompt = SolutionPrompt {
            title: detail.title.clone(),
            difficulty: detail.difficulty.name().to_string(),
            statement: detail.content.clone().unwrap_or_default(),
            community_solutions: references,
        };
        match generator.generate(&prompt).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("solution generation for {} failed: {e}", detail.slug);
                Ok(None)
            }
        }
    }

    async fn submissions_section(&self, detail: &QuestionDetail) -> Result<String> {
        let exporter = SubmissionExporter::new(self.api, self.config);
        let codes = exporter
            .question_submissions(
                detail.id,
                &detail.slug,
                true,
                Some(self.config.include_submissions_count as usize),
                true,
            )
            .await?;
        if codes.is_empty() {
            return Ok(String::new());
        }
        let mut inner = String::new();
        for (timestamp, code) in codes.iter().rev() {
            inner.push_str(&format!(
                "<p class=\"submission-stamp\">{}</p>\n",
                format_timestamp(*timestamp)
            ));
            inner.push_str(&page::code_block("submission", code));
        }
        Ok(page::section("Accepted Submissions", &inner))
    }

    /// Assemble every problem in the list. Existing pages are skipped
    /// unless regeneration is forced through the configuration.
    ///
    /// Malformed responses abort the run so a catalog drift does not
    /// burn through the whole list; `non_stop` downgrades even those to
    /// logged failures.
    pub async fn run_all(
        &self,
        problems: &[Problem],
        questions_dir: &Path,
        non_stop: bool,
    ) -> Result<RunSummary> {
        let regenerate = self.config.overwrite
            || matches!(self.config.download_questions, DownloadQuestions::Always);
        let mut summary = RunSummary::default();

        for problem in problems {
            let target = questions_dir.join(problem.file_name());
            if !regenerate && tokio::fs::try_exists(&target).await.unwrap_or(false) {
                summary.skipped += 1;
                continue;
            }
            if problem.paid_only && self.config.cookie().is_none() {
                info!(
                    "skipping paid-only {} {} (no session cookie)",
                    pad_id(problem.id),
                    problem.title
                );
                summary.skipped += 1;
                continue;
            }
            match self.write(&problem.slug, questions_dir).await {
                Ok(Some(_)) => summary.written += 1,
                Ok(None) => summary.skipped += 1,
                Err(e) if non_stop || !e.is_data_error() => {
                    error!("{} {} failed: {e}", pad_id(problem.id), problem.title);
                    summary.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }

    /// Assemble a single problem by its frontend id, regardless of what
    /// is already on disk.
    pub async fn run_one(&self, question_id: u32, questions_dir: &Path) -> Result<Option<PathBuf>> {
        let Some(problems) = self.api.get_all_questions().await? else {
            return Ok(None);
        };
        let Some(problem) = problems.iter().find(|p| p.id == question_id) else {
            warn!("no question with id {question_id}");
            return Ok(None);
        };
        self.write(&problem.slug, questions_dir).await
    }
}

fn header_section(detail: &QuestionDetail) -> String {
    let url = detail.url();
    format!(
        "<h1>{}. {}</h1>\n<p>{}</p>\n",
        detail.id,
        page::escape(&detail.title),
        page::anchor(&url, &url)
    )
}

fn hints_section(detail: &QuestionDetail) -> String {
    if detail.hints.is_empty() {
        return String::new();
    }
    let items: String = detail
        .hints
        .iter()
        .map(|hint| format!("<li>{}</li>\n", markdown::render(hint)))
        .collect();
    page::section("Hints", &format!("<ol>\n{items}</ol>\n"))
}

fn default_code_section(snippets: &[CodeSnippet], preferred: &[String]) -> String {
    if snippets.is_empty() {
        return String::new();
    }
    let blocks: String = select_languages(snippets, |s| &s.lang_slug, preferred)
        .iter()
        .map(|s| page::code_block(&s.lang_slug, &s.code))
        .collect();
    page::section("Default Code", &blocks)
}

fn company_stats_section(detail: &QuestionDetail) -> String {
    let stats = detail.company_stats();
    if stats.values().all(Vec::is_empty) {
        return String::new();
    }
    let mut inner = String::new();
    for (window, companies) in &stats {
        if companies.is_empty() {
            continue;
        }
        let mut table = page::TableBuilder::new().header(&["Company", "Encounters"]);
        for company in companies {
            table.row(vec![page::escape(&company.name), company.count.to_string()]);
        }
        inner.push_str(&format!("<h3>{}</h3>\n", window_label(*window)));
        inner.push_str(&table.build());
    }
    page::section("Company Tags", &inner)
}

fn window_label(window: u32) -> String {
    match window {
        1 => "Within six months".to_string(),
        2 => "Six months to one year".to_string(),
        3 => "More than one year ago".to_string(),
        other => format!("Window {other}"),
    }
}

fn similar_section(detail: &QuestionDetail) -> String {
    let similar = detail.similar_questions();
    if similar.is_empty() {
        return String::new();
    }
    let items: String = similar
        .iter()
        .map(|q| {
            let badge = q
                .difficulty
                .map(|d| format!(" ({})", page::difficulty_span(d)))
                .unwrap_or_default();
            format!("<li>{}{badge}</li>\n", page::anchor(&q.url(), &q.title))
        })
        .collect();
    page::section("Similar Questions", &format!("<ul>\n{items}</ul>\n"))
}

fn format_timestamp(timestamp: u64) -> String {
    chrono::DateTime::from_timestamp(timestamp as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Write the `<id>,<url>` listing of every known problem.
pub async fn write_url_list(problems: &[Problem], path: &Path) -> Result<()> {
    let mut out = String::new();
    for problem in problems {
        out.push_str(&format!("{},{}\n", problem.id, problem.url()));
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, out).await?;
    Ok(())
}

/// Archive coverage for a contiguous id range.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RangeReport {
    pub downloaded: Vec<u32>,
    pub missing: Vec<u32>,
    pub unknown: Vec<u32>,
}

/// Classify every id in `from..=to` against the catalog and the files
/// already assembled under `questions_dir`.
pub async fn report_range(
    api: &Api,
    questions_dir: &Path,
    from: u32,
    to: u32,
) -> Result<RangeReport> {
    let known: BTreeSet<u32> = api
        .get_all_questions()
        .await?
        .unwrap_or_default()
        .iter()
        .map(|p| p.id)
        .collect();
    let on_disk = downloaded_ids(questions_dir).await?;

    let mut report = RangeReport::default();
    for id in from..=to {
        if on_disk.contains(&id) {
            report.downloaded.push(id);
        } else if known.contains(&id) {
            report.missing.push(id);
        } else {
            report.unknown.push(id);
        }
    }
    Ok(report)
}

/// Ids of the pages already assembled, read back from their file names.
async fn downloaded_ids(dir: &Path) -> Result<BTreeSet<u32>> {
    let mut ids = BTreeSet::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.ends_with(".html") {
            continue;
        }
        if let Some(id) = name.split('-').next().and_then(|p| p.parse().ok()) {
            ids.insert(id);
        }
    }
    Ok(ids)
}

/// Condense sorted ids into a `1-3, 7, 9-12` style listing.
pub fn condense(ids: &[u32]) -> String {
    let mut iter = ids.iter().copied();
    let Some(mut start) = iter.next() else {
        return String::new();
    };
    let mut end = start;
    let mut parts = Vec::new();
    for id in iter {
        if id == end + 1 {
            end = id;
            continue;
        }
        parts.push(span(start, end));
        start = id;
        end = id;
    }
    parts.push(span(start, end));
    parts.join(", ")
}

fn span(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use mockito::Matcher;

    use super::*;
    use crate::services::YtDlpDownloader;
    use crate::services::breaker::CircuitBreaker;
    use crate::services::cached::CachedClient;
    use crate::services::http::{RequestClient, RetryPolicy};

    fn api_for(server: &mockito::Server) -> Api {
        let client = RequestClient::with_policy(
            "",
            CircuitBreaker::new(10),
            RetryPolicy {
                retries: 1,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
            },
            None,
        )
        .unwrap();
        Api::with_endpoints(
            CachedClient::new(Arc::new(client), None, 7),
            server.url(),
            server.url(),
        )
    }

    fn detail_fixture() -> QuestionDetail {
        serde_json::from_str(
            r#"{
                "questionFrontendId": "1",
                "title": "Two Sum",
                "titleSlug": "two-sum",
                "difficulty": "Easy",
                "content": "<p>Given an array...</p>",
                "hints": ["Think hash map"],
                "codeSnippets": [
                    {"lang": "C++", "langSlug": "cpp", "code": "int x;"},
                    {"lang": "Rust", "langSlug": "rust", "code": "fn two_sum() {}"}
                ],
                "companyTagStats": "{\"1\":[{\"name\":\"Acme\",\"timesEncountered\":4}],\"2\":[],\"3\":[]}",
                "similarQuestions": "[{\"title\":\"3Sum\",\"titleSlug\":\"3sum\",\"difficulty\":\"Medium\"}]"
            }"#,
        )
        .unwrap()
    }

    fn question_mock(server: &mut mockito::Server) -> mockito::Mock {
        server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(
                serde_json::json!({ "operationName": "questionDetail" }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":{"question":{
                    "questionFrontendId":"1","title":"Two Sum","titleSlug":"two-sum",
                    "difficulty":"Easy","content":"<p>Given an array...</p>",
                    "hints":["Think hash map"],
                    "codeSnippets":[{"lang":"Rust","langSlug":"rust","code":"fn two_sum() {}"}]
                }}}"#,
            )
    }

    fn solution_mock(server: &mut mockito::Server, content: &str) -> mockito::Mock {
        server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(
                serde_json::json!({ "operationName": "officialSolution" }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"data":{{"question":{{"solution":{{"content":"{content}"}}}}}}}}"#
            ))
    }

    fn offline_config(dir: &Path) -> Config {
        Config {
            save_directory: dir.to_path_buf(),
            download_images: crate::models::DownloadImages::None,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_write_assembles_sections_in_order() {
        let mut server = mockito::Server::new_async().await;
        let question = question_mock(&mut server).create_async().await;
        let solution = solution_mock(&mut server, "## Approach\\nUse a map.")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        let api = api_for(&server);
        let media = YtDlpDownloader::new();
        let assembler = ProblemAssembler::new(&api, &config, &media, None);

        let path = assembler
            .write("two-sum", &dir.path().join("questions"))
            .await
            .unwrap()
            .unwrap();

        question.assert_async().await;
        solution.assert_async().await;
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("0001-Two-Sum.html")
        );

        let html = std::fs::read_to_string(&path).unwrap();
        let order = [
            "<h1>1. Two Sum</h1>",
            "Difficulty:",
            "<h2>Problem</h2>",
            "<h2>Hints</h2>",
            "<h2>Default Code</h2>",
            "<h2>Solution</h2>",
        ];
        let mut cursor = 0;
        for marker in order {
            let at = html[cursor..]
                .find(marker)
                .unwrap_or_else(|| panic!("{marker} missing or out of order"));
            cursor += at;
        }
        assert!(html.contains("Use a map."));
    }

    #[tokio::test]
    async fn test_locked_question_is_skipped() {
        let mut server = mockito::Server::new_async().await;
        let _question = server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(
                serde_json::json!({ "operationName": "questionDetail" }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":{"question":{
                    "questionFrontendId":"5","title":"Locked","titleSlug":"locked",
                    "difficulty":"Hard","content":null,"hints":[],"codeSnippets":[]
                }}}"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        let api = api_for(&server);
        let media = YtDlpDownloader::new();
        let assembler = ProblemAssembler::new(&api, &config, &media, None);

        let written = assembler
            .write("locked", &dir.path().join("questions"))
            .await
            .unwrap();
        assert!(written.is_none());
        assert!(!dir.path().join("questions").join("0005-Locked.html").exists());
    }

    #[tokio::test]
    async fn test_run_all_skips_existing_pages() {
        let mut server = mockito::Server::new_async().await;
        let question = question_mock(&mut server).expect(0).create_async().await;

        let dir = tempfile::tempdir().unwrap();
        let questions_dir = dir.path().join("questions");
        std::fs::create_dir_all(&questions_dir).unwrap();
        std::fs::write(questions_dir.join("0001-Two-Sum.html"), "cached").unwrap();

        let config = offline_config(dir.path());
        let api = api_for(&server);
        let media = YtDlpDownloader::new();
        let assembler = ProblemAssembler::new(&api, &config, &media, None);

        let problem: Problem = serde_json::from_str(
            r#"{"frontendQuestionId":"1","title":"Two Sum","titleSlug":"two-sum","difficulty":"Easy"}"#,
        )
        .unwrap();
        let summary = assembler
            .run_all(&[problem], &questions_dir, false)
            .await
            .unwrap();

        question.assert_async().await;
        assert_eq!(
            summary,
            RunSummary {
                written: 0,
                skipped: 1,
                failed: 0
            }
        );
    }

    #[test]
    fn test_default_code_section_prefers_configured_language() {
        let detail = detail_fixture();
        let section =
            default_code_section(&detail.code_snippets, &["rust".to_string()]);
        assert!(section.contains("fn two_sum() {}"));
        assert!(!section.contains("int x;"));

        let all = default_code_section(&detail.code_snippets, &["all".to_string()]);
        assert!(all.contains("int x;"));
        assert!(all.contains("fn two_sum() {}"));
    }

    #[test]
    fn test_company_and_similar_sections() {
        let detail = detail_fixture();
        let companies = company_stats_section(&detail);
        assert!(companies.contains("Acme"));
        assert!(companies.contains("Within six months"));
        // empty windows carry no heading
        assert!(!companies.contains("Window"));
        assert!(!companies.contains("one year</h3>"));

        let similar = similar_section(&detail);
        assert!(similar.contains("3Sum"));
        assert!(similar.contains("difficulty-medium"));
    }

    #[test]
    fn test_condense_ranges() {
        assert_eq!(condense(&[]), "");
        assert_eq!(condense(&[4]), "4");
        assert_eq!(condense(&[1, 2, 3, 7, 9, 10]), "1-3, 7, 9-10");
    }

    #[tokio::test]
    async fn test_report_range_classifies_ids() {
        let mut server = mockito::Server::new_async().await;
        let _count = server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(
                serde_json::json!({ "operationName": "allQuestionsCount" }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"allQuestionsCount":[{"difficulty":"All","count":2}]}}"#)
            .create_async()
            .await;
        let _list = server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(
                serde_json::json!({ "operationName": "problemsetQuestionList" }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":{"problemsetQuestionList":{"questions":[
                    {"frontendQuestionId":"1","title":"Two Sum","titleSlug":"two-sum","difficulty":"Easy"},
                    {"frontendQuestionId":"2","title":"Add Two Numbers","titleSlug":"add-two-numbers","difficulty":"Medium"}
                ]}}}"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let questions_dir = dir.path().join("questions");
        std::fs::create_dir_all(&questions_dir).unwrap();
        std::fs::write(questions_dir.join("0001-Two-Sum.html"), "x").unwrap();

        let api = api_for(&server);
        let report = report_range(&api, &questions_dir, 1, 3).await.unwrap();

        assert_eq!(report.downloaded, vec![1]);
        assert_eq!(report.missing, vec![2]);
        assert_eq!(report.unknown, vec![3]);
    }
}
