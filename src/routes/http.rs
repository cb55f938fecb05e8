//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs include parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{State, Query}, http::StatusCode, Json, response::IntoResponse};
use tracing::{info, instrument, warn};

use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, body), fields(difficulty = %body.difficulty.clone().unwrap_or_else(|| DEFAULT_DIFFICULTY_BAND.into())))]
pub async fn http_new_exercise(
  State(state): State<Arc<AppState>>,
  Json(body): Json<NewExerciseIn>,
) -> impl IntoResponse {
  let difficulty = match body.difficulty.as_deref().map(str::trim) {
    Some(d) if !d.is_empty() => d.to_string(),
    _ => DEFAULT_DIFFICULTY_BAND.to_string(),
  };
  let slider_value = clamp_slider(body.slider_value);
  let include_decoys = body.include_decoys.unwrap_or(false);
  let text_length = clamp_text_length(body.text_length);

  let ex = new_exercise(&state, &difficulty, slider_value, include_decoys, text_length).await;
  info!(target: "exercise", id = %ex.id, blanks = ex.blanks.len(), "HTTP new exercise served");
  Json(to_out(&ex))
}

#[instrument(level = "info", skip(state), fields(%q.exercise_id))]
pub async fn http_get_exercise(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ExerciseQuery>,
) -> Result<Json<ExerciseOut>, (StatusCode, Json<ErrorOut>)> {
  match state.get_exercise(&q.exercise_id).await {
    Some(ex) => {
      info!(target: "exercise", id = %ex.id, "HTTP exercise re-served");
      Ok(Json(to_out(&ex)))
    }
    None => {
      warn!(target: "exercise", id = %q.exercise_id, "HTTP exercise lookup missed");
      Err(not_found("No exercise found. Please generate a new exercise."))
    }
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.exercise_id))]
pub async fn http_reblank(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ReblankIn>,
) -> Result<Json<ExerciseOut>, (StatusCode, Json<ErrorOut>)> {
  let slider_value = body.slider_value.map(|v| clamp_slider(Some(v)));
  match reblank_exercise(&state, &body.exercise_id, slider_value, body.include_decoys).await {
    Some(ex) => {
      info!(target: "exercise", id = %ex.id, blanks = ex.blanks.len(), "HTTP reblank served");
      Ok(Json(to_out(&ex)))
    }
    None => {
      warn!(target: "exercise", id = %body.exercise_id, "HTTP reblank for unknown exercise");
      Err(not_found("No exercise found. Please generate a new exercise."))
    }
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.exercise_id, answers = body.answers.len()))]
pub async fn http_grade(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GradeIn>,
) -> Result<Json<GradeOut>, (StatusCode, Json<ErrorOut>)> {
  match grade_exercise(&state, &body.exercise_id, &body.answers).await {
    Some((graded, original_text)) => {
      info!(
        target: "exercise",
        id = %body.exercise_id,
        score = graded.score,
        total = graded.total,
        "HTTP submission graded"
      );
      Ok(Json(GradeOut {
        results: graded.results,
        score: graded.score,
        total: graded.total,
        original_text,
      }))
    }
    None => {
      warn!(target: "exercise", id = %body.exercise_id, "HTTP grade for unknown exercise");
      Err(not_found("No exercise found. Please generate a new exercise."))
    }
  }
}

fn not_found(msg: &str) -> (StatusCode, Json<ErrorOut>) {
  (StatusCode::NOT_FOUND, Json(ErrorOut { error: msg.to_string() }))
}
