//! Domain models used by the backend: text sources, source texts, and the
//! server-side exercise record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where did the source text come from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
  LocalBank,   // from user-provided TOML bank
  Generated,   // generated via OpenAI
  Seed,  // built-in seeds (last resort)
}

/// A paragraph usable as exercise material, before any blanks are cut.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceText {
  pub title: String,
  pub difficulty: String,   // free-form band (e.g., "a2", "b1")
  pub body: String,
  pub source: TextSource,
}

/// Full exercise record kept server-side between generation and grading.
/// The correct answers in `blanks` never leave the server; clients only ever
/// see the display parts and the shuffled word bank.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exercise {
  pub id: String,
  pub title: String,
  pub difficulty: String,
  pub source: TextSource,

  pub original_text: String,
  pub display_parts: Vec<String>,
  pub blanks: BTreeMap<usize, String>,
  pub word_bank: Vec<String>,

  // Parameters the exercise was generated with, kept so a reblank request
  // can default to them.
  pub difficulty_level: u8,
  pub include_decoys: bool,
}
