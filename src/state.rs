//! Application state: in-memory stores, prompts, OpenAI client, and text
//! selection logic.
//!
//! This module owns:
//!   - the exercise store (by id), which plays the role of the server-side
//!     session between generation and grading
//!   - the source-text bank (from TOML config plus built-in seeds)
//!   - the prompts struct (from TOML or defaults)
//!   - optional OpenAI client
//!
//! The selection policy generates a fresh paragraph via OpenAI by default.
//! If OpenAI is unavailable, we fall back to banked texts or a hard fallback.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::config::{load_app_config_from_env, Prompts};
use crate::domain::{Exercise, SourceText, TextSource};
use crate::openai::OpenAI;
use crate::seeds::{hard_fallback_text, seed_texts};

#[derive(Clone)]
pub struct AppState {
    pub exercises: Arc<RwLock<HashMap<String, Exercise>>>,
    pub texts_by_diff: HashMap<String, Vec<SourceText>>,
    pub last_text_by_diff: Arc<RwLock<HashMap<String, usize>>>,
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from env: load config, seed the text bank, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        // Load TOML config if provided (prompts + optional local text bank).
        let cfg_opt = load_app_config_from_env();
        let prompts = cfg_opt
            .as_ref()
            .map(|c| c.prompts.clone())
            .unwrap_or_default();

        let mut texts_by_diff = HashMap::<String, Vec<SourceText>>::new();

        // Insert config-based texts (if any).
        if let Some(cfg) = &cfg_opt {
            for tc in &cfg.texts {
                if tc.body.trim().is_empty() {
                    error!(target: "exercise", difficulty = %tc.difficulty, "Skipping bank text: empty body.");
                    continue;
                }
                let title = match &tc.title {
                    Some(t) if !t.trim().is_empty() => t.clone(),
                    _ => tc.id.clone().unwrap_or_else(|| "Untitled".into()),
                };
                texts_by_diff
                    .entry(tc.difficulty.clone())
                    .or_default()
                    .push(SourceText {
                        title,
                        difficulty: tc.difficulty.clone(),
                        body: tc.body.clone(),
                        source: TextSource::LocalBank,
                    });
            }
        }

        // Always add built-in seeds so every band has a last resort.
        for t in seed_texts() {
            texts_by_diff.entry(t.difficulty.clone()).or_default().push(t);
        }

        // Inventory summary by difficulty band.
        for (diff, texts) in &texts_by_diff {
            let bank = texts.iter().filter(|t| t.source == TextSource::LocalBank).count();
            let seed = texts.len() - bank;
            info!(target: "exercise", %diff, local_bank = bank, seed = seed, "Startup text inventory");
        }

        // Build optional OpenAI client (if API key present).
        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "cloze_backend", base_url = %oa.base_url, text_model = %oa.text_model, "OpenAI enabled.");
        } else {
            info!(target: "cloze_backend", "OpenAI disabled (no OPENAI_API_KEY). Using banked texts.");
        }

        Self {
            exercises: Arc::new(RwLock::new(HashMap::new())),
            texts_by_diff,
            last_text_by_diff: Arc::new(RwLock::new(HashMap::new())),
            openai,
            prompts,
        }
    }

    /// Insert an exercise into the store, replacing any previous version
    /// under the same id (reblank does exactly that).
    #[instrument(level = "debug", skip(self, ex), fields(id = %ex.id))]
    pub async fn insert_exercise(&self, ex: Exercise) {
        let mut exercises = self.exercises.write().await;
        exercises.insert(ex.id.clone(), ex);
    }

    /// Read-only access to an exercise by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_exercise(&self, id: &str) -> Option<Exercise> {
        let exercises = self.exercises.read().await;
        exercises.get(id).cloned()
    }

    /// Selection policy:
    /// Generate a fresh paragraph via OpenAI when available.
    /// Otherwise serve a banked text (avoiding an immediate repeat),
    /// and as an absolute last resort the hard fallback.
    #[instrument(level = "info", skip(self), fields(%difficulty, text_length))]
    pub async fn choose_text(&self, difficulty: &str, text_length: u32) -> (SourceText, &'static str) {
        if let Some(oa) = &self.openai {
            match oa
                .generate_reading_text(&self.prompts, difficulty, text_length)
                .await
            {
                Ok(body) => {
                    let text = SourceText {
                        title: "Generated Reading".into(),
                        difficulty: difficulty.to_string(),
                        body,
                        source: TextSource::Generated,
                    };
                    info!(target: "exercise", %difficulty, source = "openai_generated_new", "Generated fresh text");
                    return (text, "openai_generated_new");
                }
                Err(e) => {
                    error!(target: "exercise", %difficulty, error = %e, "OpenAI generation failed; using banked texts");
                }
            }
        }

        // 2) Serve from the bank (config texts or built-in seeds) for this
        // band, avoiding the text we served last time.
        if let Some(texts) = self.texts_by_diff.get(difficulty) {
            if !texts.is_empty() {
                let last = { self.last_text_by_diff.read().await.get(difficulty).copied() };
                let chosen = if texts.len() == 1 {
                    0
                } else {
                    match last {
                        Some(last_idx) => (0..texts.len()).find(|i| *i != last_idx).unwrap_or(0),
                        None => 0,
                    }
                };
                self.last_text_by_diff
                    .write()
                    .await
                    .insert(difficulty.to_string(), chosen);
                warn!(target: "exercise", %difficulty, title = %texts[chosen].title, source = "text_bank", "Serving banked text");
                return (texts[chosen].clone(), "text_bank");
            }
        }

        // 3) Absolute last resort: hard fallback.
        warn!(target: "exercise", %difficulty, source = "hard_fallback", "Serving hard fallback text");
        (hard_fallback_text(difficulty.to_string()), "hard_fallback")
    }
}
