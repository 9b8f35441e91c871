// src/services/ai.rs

//! AI solution generation port.
//!
//! When a question has no official editorial, a configured backend can
//! draft one from the statement and a handful of community solutions.
//! Both backends speak plain JSON over their own HTTP client; the
//! archiver's circuit breaker does not apply to them.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{AiBackend, Config};

/// Generation can be slow on local models.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(300);

const SYSTEM_PROMPT: &str = "You are an expert competitive programmer. \
    Write a clear editorial-style solution in markdown: restate the key idea, \
    walk through the approach, give commented reference code and close with \
    complexity analysis.";

/// Material the prompt is built from.
#[derive(Debug, Clone, Default)]
pub struct SolutionPrompt {
    pub title: String,
    pub difficulty: String,
    /// Statement HTML as served by the API.
    pub statement: String,
    /// Community solution bodies, best-voted first.
    pub community_solutions: Vec<String>,
}

impl SolutionPrompt {
    fn render(&self) -> String {
        let mut prompt = format!(
            "## Problem: {} ({})\n\n{}\n",
            self.title, self.difficulty, self.statement
        );
        if !self.community_solutions.is_empty() {
            prompt.push_str("\n## Community solutions for reference:\n");
            for (index, solution) in self.community_solutions.iter().enumerate() {
                prompt.push_str(&format!("\n### Reference {}\n{}\n", index + 1, solution));
            }
        }
        prompt.push_str("\nWrite the full solution now.");
        prompt
    }
}

/// A backend that can draft a solution write-up.
#[async_trait]
pub trait SolutionGenerator: Send + Sync {
    /// Generate solution markdown; `None` when the backend produced
    /// nothing usable.
    async fn generate(&self, prompt: &SolutionPrompt) -> Result<Option<String>>;
}

/// Build the generator selected in the configuration, if any.
pub fn from_config(config: &Config) -> Option<Box<dyn SolutionGenerator>> {
    match config.ai_solution_generator {
        AiBackend::None => None,
        AiBackend::OpenAi => Some(Box::new(OpenAiGenerator::new(
            &config.open_ai_api_key,
            &config.open_ai_model,
        ))),
        AiBackend::Ollama => Some(Box::new(OllamaGenerator::new(
            &config.ollama_url,
            &config.ollama_model,
        ))),
    }
}

// ---- OpenAI ---------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Chat-completions backend.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_endpoint("https://api.openai.com", api_key, model)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, api_key: &str, model: &str) -> Self {
        Self {
            client: generation_client(),
            endpoint: endpoint.into(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl SolutionGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &SolutionPrompt) -> Result<Option<String>> {
        let user_prompt = prompt.render();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
        };

        let url = format!("{}/v1/chat/completions", self.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AppError::status(
                response.status().as_u16(),
                response.url().clone(),
            ));
        }

        let body: ChatResponse = response.json().await?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty()))
    }
}

// ---- Ollama ---------------------------------------------------------

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    system: &'static str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: Option<String>,
}

/// Local-model backend speaking the `api/generate` protocol.
pub struct OllamaGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(url: &str, model: &str) -> Self {
        Self {
            client: generation_client(),
            url: url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl SolutionGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &SolutionPrompt) -> Result<Option<String>> {
        let user_prompt = prompt.render();
        let request = OllamaRequest {
            model: &self.model,
            system: SYSTEM_PROMPT,
            prompt: &user_prompt,
            stream: false,
        };

        let url = format!("{}/api/generate", self.url);
        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(AppError::status(
                response.status().as_u16(),
                response.url().clone(),
            ));
        }

        let body: OllamaResponse = response.json().await?;
        Ok(body
            .response
            .filter(|content| !content.trim().is_empty()))
    }
}

fn generation_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(GENERATION_TIMEOUT)
        .build()
        .unwrap_or_default()
}
