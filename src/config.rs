//! Loading application configuration (prompts + optional text bank) from TOML.
//!
//! See `AppConfig` and `Prompts` for expected schema.

use serde::Deserialize;
use tracing::{info, error};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub texts: Vec<TextCfg>,
}

/// Source-text entry accepted in TOML configuration. These feed the local
/// bank used when OpenAI generation is unavailable or fails.
#[derive(Clone, Debug, Deserialize)]
pub struct TextCfg {
  #[serde(default)] pub id: Option<String>,
  #[serde(default)] pub title: Option<String>,
  pub difficulty: String,
  pub body: String,
}

/// Prompts used by the OpenAI client. Defaults target beginner reading
/// material; override them in TOML to tune topic or register.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub text_system: String,
  pub text_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      text_system: "You are an English teacher creating simple reading material for \
                    beginner students. Output ONLY the paragraph text."
        .into(),
      text_user_template: "Write a short, engaging paragraph at difficulty '{difficulty}' \
                           about your morning routine, or a visit to a park, or cooking a \
                           simple meal. Ensure the language is simple, uses common \
                           vocabulary, and has clear, short sentences suitable for an \
                           English learner. Aim for roughly {word_target} words. Avoid \
                           complex grammar or obscure words."
        .into(),
    }
  }
}

/// Attempt to load `AppConfig` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "cloze_backend", %path, texts = cfg.texts.len(), "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "cloze_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "cloze_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
