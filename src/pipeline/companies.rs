// src/pipeline/companies.rs
//! Assembles company question sets from generated favorite lists.
//!
//! Each company resolves to one favorite bucket per encounter window.
//! Buckets get their own directory under the company; a problem listed
//! in several buckets is materialized once, in the first bucket that
//! names it, and every table links to that copy.

use std::collections::HashMap;
use std::path::Path;

use log::{error, info, warn};

use crate::error::{AppError, Result};
use crate::models::{CompanyTag, Config, DownloadQuestions, FavoriteBucket, Problem};
use crate::pipeline::page;
use crate::pipeline::problem::{ProblemAssembler, RunSummary};
use crate::services::{Api, MediaDownloader, SolutionGenerator};
use crate::utils::naming;

/// Page size for favorite question listings.
const FAVORITE_PAGE: u32 = 100;
/// Columns in the top company index grid.
const INDEX_COLUMNS: usize = 10;

pub struct CompanyAssembler<'a> {
    api: &'a Api,
    config: &'a Config,
    media: &'a dyn MediaDownloader,
    generator: Option<&'a dyn SolutionGenerator>,
}

impl<'a> CompanyAssembler<'a> {
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

    /// The company catalog. Nothing under `companies/` can be built
    /// without it, so a missing catalog is an error here.
    pub async fn catalog(&self) -> Result<Vec<CompanyTag>> {
        self.api
            .company_tags()
            .await?
            .ok_or_else(|| AppError::decode("company catalog returned no data"))
    }

    /// Write `companies/index.html`, a ten column grid of company links.
    pub async fn write_index(&self, tags: &[CompanyTag], companies_dir: &Path) -> Result<()> {
        let index = page::document("Companies", &render_top_index(tags));
        page::write_page(&companies_dir.join("index.html"), &index).await?;
        info!("wrote company index, {} companies", tags.len());
        Ok(())
    }

    /// Download every company's question sets, or one company when
    /// `only` is set.
    pub async fn run(
        &self,
        only: Option<&str>,
        companies_dir: &Path,
        non_stop: bool,
    ) -> Result<RunSummary> {
        let tags = self.catalog().await?;
        if let Some(slug) = only {
            if !tags.iter().any(|tag| tag.slug == slug) {
                warn!("company {slug} not in catalog");
            }
        }

        let mut summary = RunSummary::default();
        for tag in &tags {
            if only.is_some_and(|slug| slug != tag.slug) {
                continue;
            }
            match self.write_company(tag, companies_dir, non_stop).await {
                Ok(company_summary) => {
                    summary.written += company_summary.written;
                    summary.skipped += company_summary.skipped;
                    summary.failed += company_summary.failed;
                }
                Err(e) if non_stop || !e.is_data_error() => {
                    error!("company {} failed: {e}", tag.slug);
                    summary.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }

    /// One company: fetch every bucket, write the combined index, then
    /// materialize each problem in the bucket that owns it.
    pub async fn write_company(
        &self,
        tag: &CompanyTag,
        companies_dir: &Path,
        non_stop: bool,
    ) -> Result<RunSummary> {
        let Some(details) = self.api.favorite_details(&tag.slug).await? else {
            warn!("company {} has no favorite details", tag.slug);
            return Ok(RunSummary::default());
        };

        let mut buckets: Vec<(&FavoriteBucket, Vec<Problem>)> = Vec::new();
        for bucket in &details.generated.buckets {
            let questions = self.bucket_questions(&bucket.favorite_slug).await?;
            buckets.push((bucket, questions));
        }

        // the first bucket listing a problem owns its file
        let mut owner: HashMap<u32, &str> = HashMap::new();
        for (bucket, questions) in &buckets {
            for question in questions {
                owner
                    .entry(question.id)
                    .or_insert(bucket.favorite_slug.as_str());
            }
        }

        let company_dir = companies_dir.join(&tag.slug);
        let index = page::document(&tag.name, &render_company_index(tag, &buckets, &owner));
        page::write_page(&company_dir.join("index.html"), &index).await?;
        info!("wrote index for company {}", tag.slug);

        let mut summary = RunSummary::default();
        for (bucket, questions) in &buckets {
            let bucket_dir = company_dir.join(&bucket.favorite_slug);
            for question in questions {
                if owner.get(&question.id).copied() != Some(bucket.favorite_slug.as_str()) {
                    continue;
                }
                match self.write_problem(question, &bucket_dir).await {
                    Ok(true) => summary.written += 1,
                    Ok(false) => summary.skipped += 1,
                    Err(e) if non_stop || !e.is_data_error() => {
                        error!(
                            "problem {} for company {} failed: {e}",
                            question.slug, tag.slug
                        );
                        summary.failed += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(summary)
    }

    /// Every problem in one favorite bucket, highest frequency first.
    async fn bucket_questions(&self, favorite_slug: &str) -> Result<Vec<Problem>> {
        let mut questions: Vec<Problem> = Vec::new();
        let mut skip = 0;
        loop {
            let Some(page) = self
                .api
                .favorite_question_list(favorite_slug, FAVORITE_PAGE, skip)
                .await?
            else {
                break;
            };
            let page_size = page.questions.len();
            let has_more = page.has_more;
            questions.extend(page.questions);
            if !has_more || page_size == 0 {
                break;
            }
            skip += FAVORITE_PAGE;
        }
        questions.sort_by(|a, b| {
            b.frequency_or_zero()
                .partial_cmp(&a.frequency_or_zero())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(questions)
    }

    /// Materialize one problem in a bucket directory. An already
    /// assembled document under `questions/` is copied instead of
    /// regenerated unless `download_questions` is `always`. `Ok(false)`
    /// when an existing file was left alone.
    async fn write_problem(&self, question: &Problem, bucket_dir: &Path) -> Result<bool> {
        let file_name = question.file_name();
        let target = bucket_dir.join(&file_name);
        let regenerate = matches!(self.config.download_questions, DownloadQuestions::Always);
        if !regenerate && tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Ok(false);
        }

        if !regenerate {
            let questions_dir = self.config.questions_dir();
            let assembled = questions_dir.join(&file_name);
            if tokio::fs::try_exists(&assembled).await.unwrap_or(false) {
                naming::copy_question(&questions_dir, bucket_dir, &file_name)?;
                info!("copied {file_name} into {}", bucket_dir.display());
                return Ok(true);
            }
        }

        Ok(self
            .problems()
            .write(&question.slug, bucket_dir)
            .await?
            .is_some())
    }
}

fn render_top_index(tags: &[CompanyTag]) -> String {
    let mut table = page::TableBuilder::new();
    for chunk in tags.chunks(INDEX_COLUMNS) {
        let mut row: Vec<String> = chunk
            .iter()
            .map(|tag| {
                page::anchor(
                    &format!("{}/index.html", tag.slug),
                    &format!("{} ({})", tag.name, tag.question_count),
                )
            })
            .collect();
        row.resize(INDEX_COLUMNS, String::new());
        table.row(row);
    }
    format!("<h1>Companies</h1>\n{}", table.build())
}

fn render_company_index(
    tag: &CompanyTag,
    buckets: &[(&FavoriteBucket, Vec<Problem>)],
    owner: &HashMap<u32, &str>,
) -> String {
    let mut body = format!(
        "<p>{}</p>\n<h1>{}</h1>\n<p>{}</p>\n",
        page::anchor("../index.html", "All companies"),
        page::escape(&tag.name),
        page::anchor(&tag.url(), &tag.url()),
    );
    for (bucket, questions) in buckets {
        let mut table = page::TableBuilder::new().header(&["Problem", "Difficulty", "Frequency"]);
        for question in questions {
            let dir = owner
                .get(&question.id)
                .copied()
                .unwrap_or(bucket.favorite_slug.as_str());
            table.row(vec![
                page::anchor(
                    &format!("{dir}/{}", question.file_name()),
                    &format!("{}. {}", question.id, question.title),
                ),
                page::difficulty_span(question.difficulty),
                format!("{:.1}", question.frequency_or_zero()),
            ]);
        }
        if table.is_empty() {
            continue;
        }
        body.push_str(&page::section(&bucket.name, &table.build()));
    }
    body
}

/// Write the `<slug>,<url>` listing of every company.
pub async fn write_url_list(tags: &[CompanyTag], path: &Path) -> Result<()> {
    let mut out = String::new();
    for tag in tags {
        out.push_str(&format!("{},{}\n", tag.slug, tag.url()));
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, out).await?;
    Ok(())
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

    fn offline_config(dir: &Path) -> Config {
        Config {
            save_directory: dir.to_path_buf(),
            download_images: crate::models::DownloadImages::None,
            ..Config::default()
        }
    }

    fn graphql_mock(
        server: &mut mockito::Server,
        partial: serde_json::Value,
        body: &str,
    ) -> mockito::Mock {
        server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(partial))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    fn google_tag() -> CompanyTag {
        CompanyTag {
            name: "Google".to_string(),
            slug: "google".to_string(),
            question_count: 2,
        }
    }

    fn details_mock(server: &mut mockito::Server, buckets: &str) -> mockito::Mock {
        graphql_mock(
            server,
            serde_json::json!({ "operationName": "favoriteDetailV2" }),
            &format!(
                r#"{{"data":{{"favoriteDetailV2":{{"generatedFavoritesInfo":{{
                    "defaultFavoriteSlug":"google-thirty-days",
                    "categoriesToSlugs":[{buckets}]
                }}}}}}}}"#
            ),
        )
    }

    const THIRTY_DAYS: &str =
        r#"{"categoryName":"Thirty Days","favoriteSlug":"google-thirty-days"}"#;
    const THREE_MONTHS: &str =
        r#"{"categoryName":"Three Months","favoriteSlug":"google-three-months"}"#;
    const TWO_SUM: &str = r#"{"questionFrontendId":1,"title":"Two Sum","titleSlug":"two-sum",
        "difficulty":"EASY","frequency":98.2,"paidOnly":false}"#;

    fn list_mock(
        server: &mut mockito::Server,
        favorite_slug: &str,
        skip: u32,
        questions: &str,
        has_more: bool,
    ) -> mockito::Mock {
        graphql_mock(
            server,
            serde_json::json!({
                "operationName": "favoriteQuestionList",
                "variables": { "favoriteSlug": favorite_slug, "skip": skip }
            }),
            &format!(
                r#"{{"data":{{"favoriteQuestionList":{{"questions":[{questions}],"hasMore":{has_more}}}}}}}"#
            ),
        )
    }

    #[test]
    fn test_top_index_rows_of_ten() {
        let tags: Vec<CompanyTag> = (0..12)
            .map(|n| CompanyTag {
                name: format!("Company {n}"),
                slug: format!("company-{n}"),
                question_count: n,
            })
            .collect();
        let html = render_top_index(&tags);
        assert_eq!(html.matches("<tr>").count(), 2);
        assert!(html.contains("company-0/index.html"));
        assert!(html.contains("Company 11 (11)"));
        // second row padded out to ten cells
        assert_eq!(html.matches("<td></td>").count(), 8);
    }

    #[tokio::test]
    async fn test_assembled_question_is_copied_not_regenerated() {
        let mut server = mockito::Server::new_async().await;
        let _details = details_mock(&mut server, THIRTY_DAYS).create_async().await;
        let _list = list_mock(&mut server, "google-thirty-days", 0, TWO_SUM, false)
            .create_async()
            .await;
        let question = graphql_mock(
            &mut server,
            serde_json::json!({ "operationName": "questionDetail" }),
            "{}",
        )
        .expect(0)
        .create_async()
        .await;

        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        std::fs::create_dir_all(config.questions_dir()).unwrap();
        std::fs::write(
            config.questions_dir().join("0001-Two-Sum.html"),
            "<html><body>assembled earlier</body></html>",
        )
        .unwrap();

        let api = api_for(&server);
        let media = YtDlpDownloader::new();
        let assembler = CompanyAssembler::new(&api, &config, &media, None);

        let companies_dir = dir.path().join("companies");
        let summary = assembler
            .write_company(&google_tag(), &companies_dir, false)
            .await
            .unwrap();

        question.assert_async().await;
        assert_eq!(summary.written, 1);
        let copied = std::fs::read_to_string(
            companies_dir.join("google/google-thirty-days/0001-Two-Sum.html"),
        )
        .unwrap();
        assert!(copied.contains("assembled earlier"));
    }

    #[tokio::test]
    async fn test_always_mode_regenerates_in_place() {
        let mut server = mockito::Server::new_async().await;
        let _details = details_mock(&mut server, THIRTY_DAYS).create_async().await;
        let _list = list_mock(&mut server, "google-thirty-days", 0, TWO_SUM, false)
            .create_async()
            .await;
        let _question = graphql_mock(
            &mut server,
            serde_json::json!({ "operationName": "questionDetail" }),
            r#"{"data":{"question":{
                "questionFrontendId":"1","title":"Two Sum","titleSlug":"two-sum",
                "difficulty":"Easy","content":"<p>Given an array of integers...</p>",
                "hints":[],"codeSnippets":[]
            }}}"#,
        )
        .create_async()
        .await;
        let _solution = graphql_mock(
            &mut server,
            serde_json::json!({ "operationName": "officialSolution" }),
            r#"{"data":{"question":{"solution":null}}}"#,
        )
        .create_async()
        .await;

        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            download_questions: DownloadQuestions::Always,
            ..offline_config(dir.path())
        };
        std::fs::create_dir_all(config.questions_dir()).unwrap();
        std::fs::write(
            config.questions_dir().join("0001-Two-Sum.html"),
            "<html><body>assembled earlier</body></html>",
        )
        .unwrap();
        let companies_dir = dir.path().join("companies");
        let bucket_dir = companies_dir.join("google/google-thirty-days");
        std::fs::create_dir_all(&bucket_dir).unwrap();
        std::fs::write(bucket_dir.join("0001-Two-Sum.html"), "stale").unwrap();

        let api = api_for(&server);
        let media = YtDlpDownloader::new();
        let assembler = CompanyAssembler::new(&api, &config, &media, None);

        let summary = assembler
            .write_company(&google_tag(), &companies_dir, false)
            .await
            .unwrap();

        assert_eq!(summary.written, 1);
        let fresh = std::fs::read_to_string(bucket_dir.join("0001-Two-Sum.html")).unwrap();
        assert!(fresh.contains("Given an array of integers"));
        assert!(!fresh.contains("stale"));
        assert!(!fresh.contains("assembled earlier"));
    }

    #[tokio::test]
    async fn test_problem_in_two_buckets_lands_once() {
        let mut server = mockito::Server::new_async().await;
        let _details = details_mock(&mut server, &format!("{THIRTY_DAYS},{THREE_MONTHS}"))
            .create_async()
            .await;
        let _first = list_mock(&mut server, "google-thirty-days", 0, TWO_SUM, false)
            .create_async()
            .await;
        let _second = list_mock(&mut server, "google-three-months", 0, TWO_SUM, false)
            .create_async()
            .await;
        let question = graphql_mock(
            &mut server,
            serde_json::json!({ "operationName": "questionDetail" }),
            r#"{"data":{"question":{
                "questionFrontendId":"1","title":"Two Sum","titleSlug":"two-sum",
                "difficulty":"Easy","content":"<p>Given an array of integers...</p>",
                "hints":[],"codeSnippets":[]
            }}}"#,
        )
        .expect(1)
        .create_async()
        .await;
        let _solution = graphql_mock(
            &mut server,
            serde_json::json!({ "operationName": "officialSolution" }),
            r#"{"data":{"question":{"solution":null}}}"#,
        )
        .create_async()
        .await;

        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        let api = api_for(&server);
        let media = YtDlpDownloader::new();
        let assembler = CompanyAssembler::new(&api, &config, &media, None);

        let companies_dir = dir.path().join("companies");
        let summary = assembler
            .write_company(&google_tag(), &companies_dir, false)
            .await
            .unwrap();

        question.assert_async().await;
        assert_eq!(summary.written, 1);
        assert!(
            companies_dir
                .join("google/google-thirty-days/0001-Two-Sum.html")
                .exists()
        );
        assert!(
            !companies_dir
                .join("google/google-three-months/0001-Two-Sum.html")
                .exists()
        );

        // both bucket tables link into the owning bucket
        let index = std::fs::read_to_string(companies_dir.join("google/index.html")).unwrap();
        assert_eq!(
            index
                .matches("google-thirty-days/0001-Two-Sum.html")
                .count(),
            2
        );
        assert!(!index.contains("google-three-months/0001-Two-Sum.html"));
    }

    #[tokio::test]
    async fn test_bucket_pages_merged_and_sorted_by_frequency() {
        let mut server = mockito::Server::new_async().await;
        let _details = details_mock(&mut server, THIRTY_DAYS).create_async().await;
        let rare = r#"{"questionFrontendId":2,"title":"Add Two Numbers","titleSlug":"add-two-numbers",
            "difficulty":"MEDIUM","frequency":10.0,"paidOnly":false}"#;
        let first = list_mock(&mut server, "google-thirty-days", 0, rare, true)
            .create_async()
            .await;
        let second = list_mock(&mut server, "google-thirty-days", 100, TWO_SUM, false)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        let companies_dir = dir.path().join("companies");
        let bucket_dir = companies_dir.join("google/google-thirty-days");
        std::fs::create_dir_all(&bucket_dir).unwrap();
        std::fs::write(bucket_dir.join("0001-Two-Sum.html"), "cached").unwrap();
        std::fs::write(bucket_dir.join("0002-Add-Two-Numbers.html"), "cached").unwrap();

        let api = api_for(&server);
        let media = YtDlpDownloader::new();
        let assembler = CompanyAssembler::new(&api, &config, &media, None);

        let summary = assembler
            .write_company(&google_tag(), &companies_dir, false)
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(summary.skipped, 2);

        let index = std::fs::read_to_string(companies_dir.join("google/index.html")).unwrap();
        let two_sum = index.find("0001-Two-Sum.html").unwrap();
        let add_two = index.find("0002-Add-Two-Numbers.html").unwrap();
        // 98.2 sorts ahead of 10.0 even though it arrived on page two
        assert!(two_sum < add_two);
    }

    #[tokio::test]
    async fn test_missing_catalog_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _tags = graphql_mock(
            &mut server,
            serde_json::json!({ "operationName": "questionCompanyTags" }),
            r#"{"data":{"companyTags":null}}"#,
        )
        .create_async()
        .await;

        let api = api_for(&server);
        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        let media = YtDlpDownloader::new();
        let assembler = CompanyAssembler::new(&api, &config, &media, None);

        let err = assembler.catalog().await.unwrap_err();
        assert!(err.is_data_error());
    }

    #[tokio::test]
    async fn test_write_url_list() {
        let tags = vec![
            google_tag(),
            CompanyTag {
                name: "Amazon".to_string(),
                slug: "amazon".to_string(),
                question_count: 5,
            },
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("company.csv");
        write_url_list(&tags, &path).await.unwrap();

        let listing = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            listing,
            "google,https://leetcode.com/company/google/\n\
             amazon,https://leetcode.com/company/amazon/\n"
        );
    }
}
