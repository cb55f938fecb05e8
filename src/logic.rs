//! Core behaviors shared by the HTTP handlers.
//!
//! This includes:
//!   - Creating a new exercise (text acquisition + blank selection)
//!   - Re-blanking an existing exercise's text with new parameters
//!   - Grading a submission against the stored exercise
//!
//! The exercise core itself is pure and synchronous; this module wires it to
//! the state store, the process RNG, and the text source.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::Exercise;
use crate::exercise::{self, GradingResult};
use crate::state::AppState;

/// Band used when the client does not name one.
pub const DEFAULT_DIFFICULTY_BAND: &str = "b1";

/// Acquire a text (OpenAI, bank, or fallback), cut blanks into it, store the
/// result, and return the full record. Never fails: every tier of text
/// acquisition and the generator itself degrade to fallbacks.
#[instrument(level = "info", skip(state), fields(%difficulty, slider_value, include_decoys, text_length))]
pub async fn new_exercise(
  state: &AppState,
  difficulty: &str,
  slider_value: u8,
  include_decoys: bool,
  text_length: u32,
) -> Exercise {
  let (text, origin) = state.choose_text(difficulty, text_length).await;

  let generated = {
    let mut rng = rand::thread_rng();
    exercise::generate_exercise_by_difficulty(&mut rng, &text.body, slider_value, include_decoys)
  };

  let ex = Exercise {
    id: Uuid::new_v4().to_string(),
    title: text.title,
    difficulty: text.difficulty,
    source: text.source,
    original_text: text.body,
    display_parts: generated.display_parts,
    blanks: generated.blanks,
    word_bank: generated.word_bank,
    difficulty_level: slider_value,
    include_decoys,
  };
  state.insert_exercise(ex.clone()).await;
  info!(target: "exercise", id = %ex.id, %origin, blanks = ex.blanks.len(), "New exercise created");
  ex
}

/// Re-run blank selection over the stored original text of an existing
/// exercise, replacing its blanks, display parts and word bank in place.
/// Returns None for an unknown id.
#[instrument(level = "info", skip(state), fields(%exercise_id))]
pub async fn reblank_exercise(
  state: &AppState,
  exercise_id: &str,
  slider_value: Option<u8>,
  include_decoys: Option<bool>,
) -> Option<Exercise> {
  let mut ex = state.get_exercise(exercise_id).await?;
  let slider_value = slider_value.unwrap_or(ex.difficulty_level);
  let include_decoys = include_decoys.unwrap_or(ex.include_decoys);

  let generated = {
    let mut rng = rand::thread_rng();
    exercise::generate_exercise_by_difficulty(
      &mut rng,
      &ex.original_text,
      slider_value,
      include_decoys,
    )
  };

  ex.display_parts = generated.display_parts;
  ex.blanks = generated.blanks;
  ex.word_bank = generated.word_bank;
  ex.difficulty_level = slider_value;
  ex.include_decoys = include_decoys;

  state.insert_exercise(ex.clone()).await;
  info!(target: "exercise", id = %ex.id, blanks = ex.blanks.len(), "Exercise re-blanked");
  Some(ex)
}

/// Grade submitted answers against the stored exercise. Returns the grading
/// result plus the original text (revealed to the learner after grading), or
/// None for an unknown id.
#[instrument(level = "info", skip(state, answers), fields(%exercise_id, answers = answers.len()))]
pub async fn grade_exercise(
  state: &AppState,
  exercise_id: &str,
  answers: &std::collections::HashMap<usize, String>,
) -> Option<(GradingResult, String)> {
  let ex = state.get_exercise(exercise_id).await?;
  let graded = exercise::grade_submission(answers, &ex.blanks, &ex.display_parts);
  info!(
    target: "exercise",
    id = %ex.id,
    score = graded.score,
    total = graded.total,
    "Submission graded"
  );
  Some((graded, ex.original_text))
}
