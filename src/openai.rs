//! Minimal OpenAI client for our use-case: generating short reading
//! paragraphs via chat.completions.
//!
//! Calls are instrumented and log model names, latencies, and response sizes
//! (not full contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{instrument, info, warn};

use crate::config::Prompts;
use crate::util::{fill_template, trunc_for_log};

/// A generated text must have at least this many words to host a meaningful
/// blank selection; shorter completions are retried.
const MIN_GENERATED_WORDS: usize = 15;

/// How many completions we request before giving up and letting the caller
/// fall back to the local bank.
const MAX_GENERATION_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub text_model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let text_model =
      std::env::var("OPENAI_TEXT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, text_model })
  }

  /// Plain-text chat completion.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.text_model))]
  async fn chat_plain(
    &self,
    system: &str,
    user: &str,
    temperature: f32,
    max_tokens: Option<u32>,
  ) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.text_model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      max_tokens,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "cloze-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();

    Ok(text)
  }

  /// Generate a reading paragraph of roughly `text_length` tokens at the
  /// given difficulty band. Tries a few times: completions that are too
  /// short for meaningful blank selection are discarded, and accepted ones
  /// are cut at the last sentence boundary so we never serve a dangling
  /// half-sentence.
  #[instrument(level = "info", skip(self, prompts), fields(%difficulty, text_length, model = %self.text_model))]
  pub async fn generate_reading_text(
    &self,
    prompts: &Prompts,
    difficulty: &str,
    text_length: u32,
  ) -> Result<String, String> {
    let word_target = text_length.to_string();
    let system = &prompts.text_system;
    let user = fill_template(
      &prompts.text_user_template,
      &[("difficulty", difficulty), ("word_target", &word_target)],
    );

    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
      let start = std::time::Instant::now();
      let raw = match self.chat_plain(system, &user, 0.8, Some(text_length * 2)).await {
        Ok(t) => t,
        Err(e) => {
          warn!(target: "cloze_backend", attempt, error = %e, "Text generation call failed");
          continue;
        }
      };
      let elapsed = start.elapsed();

      let text = raw.trim();
      let word_count = text.split_whitespace().count();
      if word_count < MIN_GENERATED_WORDS {
        warn!(
          target: "cloze_backend",
          attempt, word_count, ?elapsed,
          preview = %trunc_for_log(text, 80),
          "Generated text too short; retrying"
        );
        continue;
      }

      // Cut at the last period so the paragraph ends on a complete sentence.
      let text = match text.rfind('.') {
        Some(idx) => &text[..=idx],
        None => text,
      };

      info!(
        target: "cloze_backend",
        attempt, ?elapsed,
        words = text.split_whitespace().count(),
        "Reading text generated"
      );
      return Ok(text.to_string());
    }

    Err(format!(
      "no suitable text after {} generation attempts",
      MAX_GENERATION_ATTEMPTS
    ))
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
