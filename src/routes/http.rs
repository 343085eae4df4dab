//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, Json};
use tracing::{info, instrument};

use crate::protocol::*;
use crate::state::AppState;
use crate::logic::{self, ApiResult};

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> Json<HealthOut> {
  Json(HealthOut { ok: true, ocr: state.ocr.is_some(), live_sessions: state.live_sessions().await })
}

#[instrument(level = "info", skip(body), fields(text_len = body.text.len()))]
pub async fn http_post_extract(Json(body): Json<ExtractIn>) -> Json<ExtractOut> {
  let out = logic::do_extract(&body.text);
  info!(target: "extract", pairs = out.pairs.len(), "HTTP extract served");
  Json(out)
}

#[instrument(level = "info", skip(state, body), fields(mime = %body.mime))]
pub async fn http_post_ocr(
  State(state): State<Arc<AppState>>,
  Json(body): Json<OcrIn>,
) -> ApiResult<Json<OcrOut>> {
  logic::do_ocr(&state, &body.image_base64, &body.mime).await.map(Json)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_words(
  State(state): State<Arc<AppState>>,
  Query(q): Query<WordsQuery>,
) -> ApiResult<Json<Vec<WordOut>>> {
  logic::list_words(&state, &q).await.map(Json)
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_word(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AddWordIn>,
) -> ApiResult<Json<WordOut>> {
  logic::add_word(&state, body).await.map(Json)
}

#[instrument(level = "info", skip(state, body), fields(count = body.pairs.len()))]
pub async fn http_post_import(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ImportIn>,
) -> ApiResult<Json<Vec<WordOut>>> {
  logic::import_pairs(&state, body.pairs).await.map(Json)
}

#[instrument(level = "info", skip(state, body), fields(%id))]
pub async fn http_patch_word(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<EditWordIn>,
) -> ApiResult<Json<WordOut>> {
  logic::edit_word(&state, &id, body).await.map(Json)
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_delete_word(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<Json<OkOut>> {
  logic::delete_word(&state, &id).await.map(Json)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_sessions(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SessionsQuery>,
) -> ApiResult<Json<Vec<SessionOut>>> {
  logic::recent_sessions(&state, q.limit).await.map(Json)
}

#[instrument(level = "info", skip(state, body), fields(mode = body.mode.as_str()))]
pub async fn http_post_study_start(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartIn>,
) -> ApiResult<Json<StartOut>> {
  let out = logic::study_start(&state, body.mode).await?;
  info!(target: "study", session_key = %out.session_key, word_id = %out.quiz.word_id, "HTTP study started");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(session_key = %body.session_key))]
pub async fn http_post_study_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> ApiResult<Json<AnswerOut>> {
  let out = logic::study_answer(&state, &body.session_key, &body.choice).await?;
  info!(target: "study", correct = out.outcome.correct, total = out.outcome.score.total, "HTTP answer evaluated");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(session_key = %body.session_key))]
pub async fn http_post_study_next(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionKeyIn>,
) -> ApiResult<Json<NextOut>> {
  logic::study_next(&state, &body.session_key).await.map(Json)
}

#[instrument(level = "info", skip(state, body), fields(session_key = %body.session_key))]
pub async fn http_post_study_restart(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionKeyIn>,
) -> ApiResult<Json<OkOut>> {
  logic::study_restart(&state, &body.session_key).await.map(Json)
}
