// src/services/api.rs

//! Named API operations.
//!
//! Every network interaction of the archiver goes through one of the
//! methods here; each pairs a cache key with a query document and a
//! selector that projects the interesting subtree out of the response
//! envelope. Endpoints are injectable so tests can point the catalog at
//! a local server.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, REFERER};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{
    Article, Card, Category, Chapter, CommunitySolution, CompanyTag, FavoriteDetails,
    FavoritePage, HtmlArticle, Item, PlaygroundCode, Problem, QuestionDetail, SlideFrame,
    SlideTimeline, SubmissionDetail, SubmissionList, UserProgressPage,
};
use crate::services::cached::{CachedClient, cache_key};
use crate::services::http::{Payload, RequestClient, Selector, Token};
use crate::utils::md5_hex;

const DEFAULT_BASE: &str = "https://leetcode.com";
const DEFAULT_ASSETS: &str = "https://assets.leetcode.com";

/// Submissions fetched per question; the listing is not paged.
const SUBMISSION_LIST_LIMIT: u32 = 500;

/// The API operation catalog.
pub struct Api {
    client: CachedClient,
    base: String,
    assets: String,
}

impl Api {
    pub fn new(client: CachedClient) -> Self {
        Self::with_endpoints(client, DEFAULT_BASE, DEFAULT_ASSETS)
    }

    /// Catalog against explicit endpoints. Tests point both at a mock
    /// server.
    pub fn with_endpoints(
        client: CachedClient,
        base: impl Into<String>,
        assets: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base: base.into(),
            assets: assets.into(),
        }
    }

    /// The raw HTTP client, for downloads that bypass the cache.
    pub fn http(&self) -> &Arc<RequestClient> {
        self.client.client()
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    // ---- catalog ----------------------------------------------------

    /// Explore-card categories with their cards.
    pub async fn categories(&self) -> Result<Option<Vec<Category>>> {
        const QUERY: &str = r#"
            query GetCategories($num: Int) {
              categories(slug: "") {
                title
                cards(num: $num) {
                  slug
                  title
                  description
                }
              }
            }"#;
        const SELECTOR: Selector = Selector::Path(&[Token::Key("data"), Token::Key("categories")]);

        self.graphql(
            "categories",
            self.front_referer(),
            "GetCategories",
            serde_json::json!({ "num": 1000 }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    pub async fn card_detail(&self, slug: &str) -> Result<Option<Card>> {
        const QUERY: &str = r#"
            query GetExtendedCardDetail($cardSlug: String!) {
              card(cardSlug: $cardSlug) {
                slug
                title
                description
              }
            }"#;
        const SELECTOR: Selector = Selector::Path(&[Token::Key("data"), Token::Key("card")]);

        self.graphql(
            &cache_key(&["card-detail", slug]),
            self.front_referer(),
            "GetExtendedCardDetail",
            serde_json::json!({ "cardSlug": slug }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    pub async fn chapters_with_items(&self, slug: &str) -> Result<Option<Vec<Chapter>>> {
        const QUERY: &str = r#"
            query GetChaptersWithItems($cardSlug: String!) {
              chapters(cardSlug: $cardSlug) {
                title
                description
                items {
                  id
                  title
                }
              }
            }"#;
        const SELECTOR: Selector = Selector::Path(&[Token::Key("data"), Token::Key("chapters")]);

        self.graphql(
            &cache_key(&["chapters", slug]),
            self.front_referer(),
            "GetChaptersWithItems",
            serde_json::json!({ "cardSlug": slug }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    pub async fn chapter_item(&self, card_slug: &str, item_id: u32) -> Result<Option<Item>> {
        const QUERY: &str = r#"
            query GetItem($itemId: String!) {
              item(id: $itemId) {
                question {
                  questionFrontendId
                  title
                  titleSlug
                }
                article {
                  id
                }
                htmlArticle {
                  id
                }
              }
            }"#;
        const SELECTOR: Selector = Selector::Path(&[Token::Key("data"), Token::Key("item")]);

        self.graphql(
            &cache_key(&["item", card_slug, &item_id.to_string()]),
            self.front_referer(),
            "GetItem",
            serde_json::json!({ "itemId": item_id.to_string() }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    /// Total number of questions in the catalog.
    pub async fn question_count(&self) -> Result<Option<u32>> {
        const QUERY: &str = r#"
            query allQuestionsCount {
              allQuestionsCount {
                difficulty
                count
              }
            }"#;
        // the first entry aggregates all difficulties
        const SELECTOR: Selector = Selector::Path(&[
            Token::Key("data"),
            Token::Key("allQuestionsCount"),
            Token::Index(0),
            Token::Key("count"),
        ]);

        self.graphql(
            "question-count",
            self.front_referer(),
            "allQuestionsCount",
            serde_json::json!({}),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    pub async fn question_list(&self, skip: u32, limit: u32) -> Result<Option<Vec<Problem>>> {
        const QUERY: &str = r#"
            query problemsetQuestionList($categorySlug: String, $skip: Int, $limit: Int, $filters: QuestionListFilterInput) {
              problemsetQuestionList: questionList(
                categorySlug: $categorySlug
                skip: $skip
                limit: $limit
                filters: $filters
              ) {
                questions: data {
                  frontendQuestionId: questionFrontendId
                  title
                  titleSlug
                  difficulty
                  freqBar
                  paidOnly: isPaidOnly
                  status
                }
              }
            }"#;
        const SELECTOR: Selector = Selector::Path(&[
            Token::Key("data"),
            Token::Key("problemsetQuestionList"),
            Token::Key("questions"),
        ]);

        self.graphql(
            &cache_key(&["question-list", &skip.to_string(), &limit.to_string()]),
            self.front_referer(),
            "problemsetQuestionList",
            serde_json::json!({ "categorySlug": "", "skip": skip, "limit": limit, "filters": {} }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    /// Count then list: the whole catalog in one call.
    pub async fn get_all_questions(&self) -> Result<Option<Vec<Problem>>> {
        let Some(count) = self.question_count().await? else {
            return Ok(None);
        };
        self.question_list(0, count).await
    }

    pub async fn question(&self, slug: &str) -> Result<Option<QuestionDetail>> {
        const QUERY: &str = r#"
            query questionDetail($titleSlug: String!) {
              question(titleSlug: $titleSlug) {
                questionFrontendId
                title
                titleSlug
                difficulty
                content
                companyTagStats
                similarQuestions
                hints
                codeSnippets {
                  lang
                  langSlug
                  code
                }
                solution {
                  id
                }
              }
            }"#;
        const SELECTOR: Selector = Selector::Path(&[Token::Key("data"), Token::Key("question")]);

        self.graphql(
            &cache_key(&["question", slug]),
            self.problem_referer(slug),
            "questionDetail",
            serde_json::json!({ "titleSlug": slug }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    // ---- assets and embeds ------------------------------------------

    pub async fn playground_codes(&self, uuid: &str) -> Result<Option<Vec<PlaygroundCode>>> {
        const QUERY: &str = r#"
            query fetchPlayground($uuid: String!) {
              allPlaygroundCodes(uuid: $uuid) {
                langSlug
                code
              }
            }"#;
        const SELECTOR: Selector =
            Selector::Path(&[Token::Key("data"), Token::Key("allPlaygroundCodes")]);

        self.graphql(
            &cache_key(&["playground", uuid]),
            self.front_referer(),
            "fetchPlayground",
            serde_json::json!({ "uuid": uuid }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    /// Slideshow timeline for one embedded token path.
    ///
    /// The asset host spells most documents lowercase; two filename
    /// variants are attempted in order and the cache entry is shared
    /// between them, keyed by the hash of the first variant.
    pub async fn slide_content(
        &self,
        question_id: u32,
        token_path: &str,
    ) -> Result<Option<Vec<SlideFrame>>> {
        let trimmed = token_path.trim_start_matches("../").trim_start_matches('/');
        let variant_a = trimmed.replace("Documents/", "documents/");
        let variant_b = trimmed.to_lowercase();

        let key = cache_key(&[
            &question_id.to_string(),
            "slide",
            &md5_hex(variant_a.as_bytes()),
        ]);
        let mut candidates = vec![format!("{}/static_assets/media/{variant_a}", self.assets)];
        if variant_b != variant_a {
            candidates.push(format!("{}/static_assets/media/{variant_b}", self.assets));
        }

        let Some(payload) = self.client.request_first(&key, &candidates, None).await? else {
            return Ok(None);
        };
        let timeline: SlideTimeline = serde_json::from_value(payload.into_json()?)?;
        Ok(Some(timeline.timeline))
    }

    pub async fn article(&self, article_id: &str) -> Result<Option<Article>> {
        const QUERY: &str = r#"
            query GetArticle($articleId: String!) {
              article(id: $articleId) {
                title
                body
              }
            }"#;
        const SELECTOR: Selector = Selector::Path(&[Token::Key("data"), Token::Key("article")]);

        self.graphql(
            &cache_key(&["article", article_id]),
            self.front_referer(),
            "GetArticle",
            serde_json::json!({ "articleId": article_id }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    pub async fn html_article(&self, article_id: &str) -> Result<Option<HtmlArticle>> {
        const QUERY: &str = r#"
            query GetHtmlArticle($htmlArticleId: String!) {
              htmlArticle(id: $htmlArticleId) {
                html
              }
            }"#;
        const SELECTOR: Selector = Selector::Path(&[Token::Key("data"), Token::Key("htmlArticle")]);

        self.graphql(
            &cache_key(&["html-article", article_id]),
            self.front_referer(),
            "GetHtmlArticle",
            serde_json::json!({ "htmlArticleId": article_id }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    // ---- submissions and progress -----------------------------------

    pub async fn submission_list(&self, slug: &str) -> Result<Option<SubmissionList>> {
        const QUERY: &str = r#"
            query submissionList($offset: Int!, $limit: Int!, $questionSlug: String!) {
              questionSubmissionList(offset: $offset, limit: $limit, questionSlug: $questionSlug) {
                submissions {
                  id
                  statusDisplay
                  lang
                  timestamp
                }
              }
            }"#;
        const SELECTOR: Selector =
            Selector::Path(&[Token::Key("data"), Token::Key("questionSubmissionList")]);

        self.graphql(
            &cache_key(&["submission-list", slug]),
            self.problem_referer(slug),
            "submissionList",
            serde_json::json!({ "offset": 0, "limit": SUBMISSION_LIST_LIMIT, "questionSlug": slug }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    pub async fn submission_detail(&self, submission_id: u32) -> Result<Option<SubmissionDetail>> {
        const QUERY: &str = r#"
            query submissionDetails($submissionId: Int!) {
              submissionDetails(submissionId: $submissionId) {
                code
              }
            }"#;
        const SELECTOR: Selector =
            Selector::Path(&[Token::Key("data"), Token::Key("submissionDetails")]);

        self.graphql(
            &cache_key(&["submission-detail", &submission_id.to_string()]),
            self.front_referer(),
            "submissionDetails",
            serde_json::json!({ "submissionId": submission_id }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    pub async fn user_progress(&self, skip: u32, limit: u32) -> Result<Option<UserProgressPage>> {
        const QUERY: &str = r#"
            query userProgressQuestionList($filters: UserProgressQuestionListInput) {
              userProgressQuestionList(filters: $filters) {
                totalNum
                questions {
                  frontendId
                  title
                  titleSlug
                }
              }
            }"#;
        const SELECTOR: Selector =
            Selector::Path(&[Token::Key("data"), Token::Key("userProgressQuestionList")]);

        self.graphql(
            &cache_key(&["user-progress", &skip.to_string(), &limit.to_string()]),
            self.front_referer(),
            "userProgressQuestionList",
            serde_json::json!({ "filters": { "skip": skip, "limit": limit } }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    // ---- solutions ---------------------------------------------------

    /// Official editorial markdown, when one exists. Absence is cached
    /// like any other response so locked questions are not re-fetched.
    pub async fn official_solution(&self, slug: &str) -> Result<Option<String>> {
        const QUERY: &str = r#"
            query officialSolution($titleSlug: String!) {
              question(titleSlug: $titleSlug) {
                solution {
                  id
                  content
                }
              }
            }"#;
        const SELECTOR: Selector = Selector::Path(&[Token::Key("data"), Token::Key("question")]);

        let Some(value) = self
            .graphql_value(
                &cache_key(&["official-solution", slug]),
                self.problem_referer(slug),
                "officialSolution",
                serde_json::json!({ "titleSlug": slug }),
                QUERY,
                &SELECTOR,
            )
            .await?
        else {
            return Ok(None);
        };
        Ok(value
            .pointer("/solution/content")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    pub async fn community_solutions(
        &self,
        slug: &str,
        limit: u32,
        skip: u32,
        order: &str,
    ) -> Result<Option<Vec<CommunitySolution>>> {
        const QUERY: &str = r#"
            query communitySolutions($questionSlug: String!, $skip: Int!, $first: Int!, $orderBy: TopicSortingOption) {
              questionSolutions(
                filters: {questionSlug: $questionSlug, skip: $skip, first: $first, orderBy: $orderBy}
              ) {
                solutions {
                  id
                  title
                }
              }
            }"#;
        const SELECTOR: Selector = Selector::Path(&[
            Token::Key("data"),
            Token::Key("questionSolutions"),
            Token::Key("solutions"),
        ]);

        self.graphql(
            &cache_key(&[
                "community-solutions",
                slug,
                &limit.to_string(),
                &skip.to_string(),
                order,
            ]),
            self.problem_referer(slug),
            "communitySolutions",
            serde_json::json!({
                "questionSlug": slug,
                "skip": skip,
                "first": limit,
                "orderBy": order,
            }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    /// Markdown body of one community solution topic.
    pub async fn community_solution_content(&self, topic_id: u32) -> Result<Option<String>> {
        const QUERY: &str = r#"
            query communitySolution($topicId: Int!) {
              topic(id: $topicId) {
                post {
                  content
                }
              }
            }"#;
        const SELECTOR: Selector = Selector::Path(&[Token::Key("data"), Token::Key("topic")]);

        let Some(value) = self
            .graphql_value(
                &cache_key(&["community-solution", &topic_id.to_string()]),
                self.front_referer(),
                "communitySolution",
                serde_json::json!({ "topicId": topic_id }),
                QUERY,
                &SELECTOR,
            )
            .await?
        else {
            return Ok(None);
        };
        Ok(value
            .pointer("/post/content")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    // ---- companies ---------------------------------------------------

    pub async fn company_tags(&self) -> Result<Option<Vec<CompanyTag>>> {
        const QUERY: &str = r#"
            query questionCompanyTags {
              companyTags {
                name
                slug
                questionCount
              }
            }"#;
        const SELECTOR: Selector = Selector::Path(&[Token::Key("data"), Token::Key("companyTags")]);

        self.graphql(
            "company-tags",
            self.front_referer(),
            "questionCompanyTags",
            serde_json::json!({}),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    pub async fn favorite_details(&self, company_slug: &str) -> Result<Option<FavoriteDetails>> {
        const QUERY: &str = r#"
            query favoriteDetailV2($favoriteSlug: String!) {
              favoriteDetailV2(favoriteSlug: $favoriteSlug) {
                generatedFavoritesInfo {
                  defaultFavoriteSlug
                  categoriesToSlugs {
                    categoryName
                    favoriteSlug
                  }
                }
              }
            }"#;
        const SELECTOR: Selector =
            Selector::Path(&[Token::Key("data"), Token::Key("favoriteDetailV2")]);

        self.graphql(
            &cache_key(&["favorite-details", company_slug]),
            self.front_referer(),
            "favoriteDetailV2",
            serde_json::json!({ "favoriteSlug": company_slug }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    pub async fn favorite_question_list(
        &self,
        favorite_slug: &str,
        limit: u32,
        skip: u32,
    ) -> Result<Option<FavoritePage>> {
        const QUERY: &str = r#"
            query favoriteQuestionList($favoriteSlug: String!, $limit: Int, $skip: Int) {
              favoriteQuestionList(favoriteSlug: $favoriteSlug, limit: $limit, skip: $skip) {
                questions {
                  questionFrontendId
                  title
                  titleSlug
                  difficulty
                  frequency
                  paidOnly
                  status
                }
                hasMore
              }
            }"#;
        const SELECTOR: Selector =
            Selector::Path(&[Token::Key("data"), Token::Key("favoriteQuestionList")]);

        self.graphql(
            &cache_key(&[
                "favorite-questions",
                favorite_slug,
                &limit.to_string(),
                &skip.to_string(),
            ]),
            self.front_referer(),
            "favoriteQuestionList",
            serde_json::json!({ "favoriteSlug": favorite_slug, "limit": limit, "skip": skip }),
            QUERY,
            &SELECTOR,
        )
        .await
    }

    // ---- scraped values ----------------------------------------------

    /// Build id embedded in the problem-set page, scraped from the
    /// `__NEXT_DATA__` script blob.
    pub async fn build_id(&self) -> Result<Option<String>> {
        let selector = Selector::Map(extract_build_id);
        let Some(payload) = self
            .client
            .request(
                "build-id",
                Method::GET,
                &format!("{}/problemset/", self.base),
                self.headers(&self.front_referer(), "text/html"),
                None,
                Some(&selector),
            )
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(payload.into_json()?)?))
    }

    // ---- plumbing ----------------------------------------------------

    async fn graphql<T: DeserializeOwned>(
        &self,
        key: &str,
        referer: String,
        operation: &'static str,
        variables: Value,
        query: &'static str,
        selector: &Selector,
    ) -> Result<Option<T>> {
        match self
            .graphql_value(key, referer, operation, variables, query, selector)
            .await?
        {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn graphql_value(
        &self,
        key: &str,
        referer: String,
        operation: &'static str,
        variables: Value,
        query: &'static str,
        selector: &Selector,
    ) -> Result<Option<Value>> {
        let body = serde_json::json!({
            "operationName": operation,
            "variables": variables,
            "query": query,
        });
        let payload = self
            .client
            .request(
                key,
                Method::POST,
                &format!("{}/graphql", self.base),
                self.headers(&referer, "application/json"),
                Some(&body),
                Some(selector),
            )
            .await?;
        match payload {
            Some(payload) => Ok(Some(payload.into_json()?)),
            None => Ok(None),
        }
    }

    fn headers(&self, referer: &str, accept: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        if let Ok(value) = HeaderValue::from_str(referer) {
            headers.insert(REFERER, value);
        }
        headers
    }

    fn front_referer(&self) -> String {
        format!("{}/", self.base)
    }

    fn problem_referer(&self, slug: &str) -> String {
        format!("{}/problems/{}/", self.base, slug)
    }
}

fn extract_build_id(payload: &Payload) -> Result<Value> {
    let Payload::Text(html) = payload else {
        return Err(AppError::selector_type("$"));
    };
    let document = scraper::Html::parse_document(html);
    let Ok(selector) = scraper::Selector::parse("script#__NEXT_DATA__") else {
        return Err(AppError::selector_miss("script#__NEXT_DATA__"));
    };
    let script = document
        .select(&selector)
        .next()
        .ok_or_else(|| AppError::selector_miss("script#__NEXT_DATA__"))?;
    let blob: Value = serde_json::from_str(&script.text().collect::<String>())?;
    blob.pointer("/props/buildId")
        .cloned()
        .ok_or_else(|| AppError::selector_miss("$.props.buildId"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::Matcher;

    use super::*;
    use crate::services::breaker::CircuitBreaker;
    use crate::services::http::RetryPolicy;
    use crate::storage::DiskCache;

    fn api_for(server: &mockito::Server, cache: Option<DiskCache>) -> Api {
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
            CachedClient::new(Arc::new(client), cache, 7),
            server.url(),
            server.url(),
        )
    }

    #[tokio::test]
    async fn test_question_detail_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(
                serde_json::json!({ "operationName": "questionDetail" }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":{"question":{
                    "questionFrontendId":"1","title":"Two Sum","titleSlug":"two-sum",
                    "difficulty":"Easy","content":"<p>x</p>","hints":[],
                    "codeSnippets":[{"lang":"Rust","langSlug":"rust","code":"fn x() {}"}]
                }}}"#,
            )
            .create_async()
            .await;

        let api = api_for(&server, None);
        let detail = api.question("two-sum").await.unwrap().unwrap();
        assert_eq!(detail.id, 1);
        assert_eq!(detail.code_snippets[0].lang_slug, "rust");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_all_questions_composite() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(
                serde_json::json!({ "operationName": "allQuestionsCount" }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"allQuestionsCount":[{"difficulty":"All","count":2}]}}"#)
            .create_async()
            .await;
        let list = server
            .mock("POST", "/graphql")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(
                    serde_json::json!({ "operationName": "problemsetQuestionList" }),
                ),
                Matcher::PartialJson(serde_json::json!({ "variables": { "limit": 2 } })),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":{"problemsetQuestionList":{"questions":[
                    {"frontendQuestionId":"1","title":"Two Sum","titleSlug":"two-sum","difficulty":"Easy","paidOnly":false},
                    {"frontendQuestionId":"2","title":"Add Two Numbers","titleSlug":"add-two-numbers","difficulty":"Medium","paidOnly":false}
                ]}}}"#,
            )
            .create_async()
            .await;

        let api = api_for(&server, None);
        let problems = api.get_all_questions().await.unwrap().unwrap();
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[1].basename(), "0002-Add-Two-Numbers");
        list.assert_async().await;
    }

    #[tokio::test]
    async fn test_official_solution_absent_returns_none_and_caches() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(
                serde_json::json!({ "operationName": "officialSolution" }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"question":{"solution":null}}}"#)
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let api = api_for(&server, Some(DiskCache::new(dir.path())));

        assert!(api.official_solution("two-sum").await.unwrap().is_none());
        // absence was a successful response, so it comes from cache now
        assert!(api.official_solution("two-sum").await.unwrap().is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_slide_content_falls_back_to_lowercase_variant() {
        let mut server = mockito::Server::new_async().await;
        let preserved = server
            .mock("GET", "/static_assets/media/documents/01_Queens.json")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;
        let lowered = server
            .mock("GET", "/static_assets/media/documents/01_queens.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"timeline":[{"image":"https://assets.leetcode.com/a.png"},{"image":"https://assets.leetcode.com/b.png"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let api = api_for(&server, None);
        let frames = api
            .slide_content(51, "../Documents/01_Queens.json")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].image, "https://assets.leetcode.com/b.png");
        preserved.assert_async().await;
        lowered.assert_async().await;
    }

    #[tokio::test]
    async fn test_build_id_from_embedded_script() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/problemset/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(
                r#"<html><body>
                <script id="__NEXT_DATA__" type="application/json">{"props":{"buildId":"xK9_build"}}</script>
                </body></html>"#,
            )
            .create_async()
            .await;

        let api = api_for(&server, None);
        assert_eq!(api.build_id().await.unwrap().as_deref(), Some("xK9_build"));
    }

    #[tokio::test]
    async fn test_favorite_question_list_page() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(
                serde_json::json!({ "operationName": "favoriteQuestionList" }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":{"favoriteQuestionList":{
                    "questions":[{"questionFrontendId":146,"title":"LRU Cache","titleSlug":"lru-cache","difficulty":"MEDIUM","frequency":77.0,"paidOnly":false}],
                    "hasMore":false
                }}}"#,
            )
            .create_async()
            .await;

        let api = api_for(&server, None);
        let page = api
            .favorite_question_list("google-thirty-days", 100, 0)
            .await
            .unwrap()
            .unwrap();
        assert!(!page.has_more);
        assert_eq!(page.questions[0].id, 146);
    }
}
