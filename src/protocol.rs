//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! Boundary validation lives here too: sliders are clamped to their scale and
//! text lengths are capped, so core logic only ever sees sane values.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Exercise, TextSource};
use crate::exercise::{decode_blank_position, BlankVerdict};

pub const DEFAULT_SLIDER: u8 = 5;
pub const DEFAULT_TEXT_LENGTH: u32 = 80;
pub const MAX_TEXT_LENGTH: u32 = 500;

/// Clamp a difficulty slider to its 1..=10 scale.
pub fn clamp_slider(value: Option<u8>) -> u8 {
    match value {
        Some(v) if (1..=10).contains(&v) => v,
        Some(v) => {
            warn!(target: "cloze_backend", value = v, "Slider value out of range, clamping");
            v.clamp(1, 10)
        }
        None => DEFAULT_SLIDER,
    }
}

/// Clamp a requested text length to 1..=MAX_TEXT_LENGTH.
pub fn clamp_text_length(value: Option<u32>) -> u32 {
    match value {
        Some(0) => {
            warn!(target: "cloze_backend", "Invalid text length 0, using default");
            DEFAULT_TEXT_LENGTH
        }
        Some(v) if v > MAX_TEXT_LENGTH => {
            warn!(target: "cloze_backend", value = v, "Text length too large, capping");
            MAX_TEXT_LENGTH
        }
        Some(v) => v,
        None => DEFAULT_TEXT_LENGTH,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct NewExerciseIn {
    /// Free-form difficulty band of the source text (e.g. "a2", "b1").
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Blank-density slider, 1..=10.
    #[serde(default, rename = "sliderValue")]
    pub slider_value: Option<u8>,
    #[serde(default, rename = "includeDecoys")]
    pub include_decoys: Option<bool>,
    #[serde(default, rename = "textLength")]
    pub text_length: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ReblankIn {
    #[serde(rename = "exerciseId")]
    pub exercise_id: String,
    #[serde(default, rename = "sliderValue")]
    pub slider_value: Option<u8>,
    #[serde(default, rename = "includeDecoys")]
    pub include_decoys: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct GradeIn {
    #[serde(rename = "exerciseId")]
    pub exercise_id: String,
    /// Position -> submitted answer. JSON object keys arrive as strings and
    /// serde parses them into positions.
    pub answers: HashMap<usize, String>,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseQuery {
    #[serde(rename = "exerciseId")]
    pub exercise_id: String,
}

/// Answer-free view of a stored exercise. This is the only shape that ever
/// crosses the wire; the blank map stays server-side.
#[derive(Debug, Serialize)]
pub struct ExerciseOut {
    pub id: String,
    pub title: String,
    pub difficulty: String,
    pub source: TextSource,
    pub display_parts: Vec<String>,
    pub word_bank: Vec<String>,
    pub total_blanks: usize,
    pub slider_value: u8,
    pub include_decoys: bool,
}

/// Convert the full `Exercise` (internal) to the public DTO.
pub fn to_out(ex: &Exercise) -> ExerciseOut {
    let total_blanks = ex
        .display_parts
        .iter()
        .filter(|p| decode_blank_position(p).is_some())
        .count();
    ExerciseOut {
        id: ex.id.clone(),
        title: ex.title.clone(),
        difficulty: ex.difficulty.clone(),
        source: ex.source.clone(),
        display_parts: ex.display_parts.clone(),
        word_bank: ex.word_bank.clone(),
        total_blanks,
        slider_value: ex.difficulty_level,
        include_decoys: ex.include_decoys,
    }
}

#[derive(Debug, Serialize)]
pub struct GradeOut {
    pub results: BTreeMap<usize, BlankVerdict>,
    pub score: usize,
    pub total: usize,
    /// Revealed after grading so the learner can re-read the full paragraph.
    pub original_text: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
