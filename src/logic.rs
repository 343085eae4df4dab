//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Extracting candidate pairs from raw text or from an uploaded image (OCR)
//!   - Word management (list/filter, add, import, edit, delete)
//!   - Study flow over live sessions (start, answer, next, restart)
//!   - Session history

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::{error, info, instrument};

use crate::domain::{CandidatePair, Difficulty, NewWord, StudyMode, WordPatch, WordSource};
use crate::error::{OcrError, StoreError, StudyError};
use crate::extract::extract_pairs;
use crate::protocol::*;
use crate::session::{Advance, StudySession, ROUND_CAP};
use crate::state::AppState;
use crate::store::RECENT_SESSIONS_DEFAULT;

/// Error returned to API clients: status + message.
#[derive(Debug)]
pub struct ApiError {
  pub status: StatusCode,
  pub message: String,
}

impl ApiError {
  pub fn bad_request(message: impl Into<String>) -> Self {
    Self { status: StatusCode::BAD_REQUEST, message: message.into() }
  }
  pub fn not_found(message: impl Into<String>) -> Self {
    Self { status: StatusCode::NOT_FOUND, message: message.into() }
  }
}

impl From<StoreError> for ApiError {
  fn from(e: StoreError) -> Self {
    let status = match e {
      StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
      StoreError::Io(_) | StoreError::Serde(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Self { status, message: e.to_string() }
  }
}

impl From<StudyError> for ApiError {
  fn from(e: StudyError) -> Self {
    match e {
      StudyError::EmptyPool => Self { status: StatusCode::CONFLICT, message: e.to_string() },
      StudyError::InvalidTransition { .. } => Self::bad_request(e.to_string()),
      StudyError::Persistence(inner) => inner.into(),
    }
  }
}

impl From<OcrError> for ApiError {
  fn from(e: OcrError) -> Self {
    let status = match e {
      OcrError::Disabled => StatusCode::SERVICE_UNAVAILABLE,
      OcrError::InvalidImage(_) => StatusCode::BAD_REQUEST,
      OcrError::Upstream(_) => StatusCode::BAD_GATEWAY,
    };
    Self { status, message: e.to_string() }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> axum::response::Response {
    (self.status, Json(json!({ "error": self.message }))).into_response()
  }
}

pub type ApiResult<T> = Result<T, ApiError>;

// -------- Extraction --------

pub fn do_extract(text: &str) -> ExtractOut {
  ExtractOut { pairs: extract_pairs(text) }
}

#[instrument(level = "info", skip(state, image_base64), fields(b64_len = image_base64.len(), %mime))]
pub async fn do_ocr(state: &AppState, image_base64: &str, mime: &str) -> ApiResult<OcrOut> {
  let engine = state.ocr.as_ref().ok_or(OcrError::Disabled)?;
  let text = engine.recognize(image_base64, mime).await.map_err(|e| {
    error!(target: "extract", error = %e, "OCR failed");
    e
  })?;
  let pairs = extract_pairs(&text);
  info!(target: "extract", text_len = text.len(), pairs = pairs.len(), "OCR text extracted");
  Ok(OcrOut { text, pairs })
}

// -------- Words --------

fn parse_level(raw: Option<u8>, name: &str) -> ApiResult<Option<Difficulty>> {
  raw.map(|n| Difficulty::new(n).ok_or_else(|| ApiError::bad_request(format!("{name} must be within 1..=4"))))
    .transpose()
}

#[instrument(level = "info", skip(state))]
pub async fn list_words(state: &AppState, q: &WordsQuery) -> ApiResult<Vec<WordOut>> {
  let exact = parse_level(q.difficulty, "difficulty")?;
  let min = parse_level(q.min_difficulty, "minDifficulty")?;
  let words = state.store.list_words().await?;
  Ok(words
    .iter()
    .filter(|w| exact.map_or(true, |d| w.difficulty == d))
    .filter(|w| min.map_or(true, |d| w.difficulty >= d))
    .map(word_out)
    .collect())
}

#[instrument(level = "info", skip(state, body), fields(headword = %body.headword))]
pub async fn add_word(state: &AppState, body: AddWordIn) -> ApiResult<WordOut> {
  let nw = NewWord::validated(&body.headword, &body.translation, body.difficulty.unwrap_or_default(), WordSource::Manual)
    .map_err(ApiError::bad_request)?;
  let w = state.store.add_word(nw).await?;
  info!(target: "tango_backend", id = %w.id, headword = %w.headword, "Word added");
  Ok(word_out(&w))
}

/// Save learner-curated candidate pairs. Imported words always start at the default difficulty.
#[instrument(level = "info", skip(state, pairs), fields(count = pairs.len()))]
pub async fn import_pairs(state: &AppState, pairs: Vec<CandidatePair>) -> ApiResult<Vec<WordOut>> {
  if pairs.is_empty() {
    return Err(ApiError::bad_request("select at least one pair to import"));
  }
  let new_words = pairs
    .iter()
    .map(|p| NewWord::validated(&p.headword, &p.translation, Difficulty::DEFAULT, WordSource::Ocr))
    .collect::<Result<Vec<_>, _>>()
    .map_err(ApiError::bad_request)?;
  let created = state.store.add_words(new_words).await?;
  info!(target: "tango_backend", count = created.len(), "Imported words");
  Ok(created.iter().map(word_out).collect())
}

#[instrument(level = "info", skip(state, body), fields(%id))]
pub async fn edit_word(state: &AppState, id: &str, body: EditWordIn) -> ApiResult<WordOut> {
  let trimmed = |s: Option<String>, name: &str| -> ApiResult<Option<String>> {
    match s.map(|v| v.trim().to_string()) {
      Some(v) if v.is_empty() => Err(ApiError::bad_request(format!("{name} must not be empty"))),
      other => Ok(other),
    }
  };
  let patch = WordPatch {
    headword: trimmed(body.headword, "headword")?,
    translation: trimmed(body.translation, "translation")?,
    difficulty: body.difficulty,
    ..Default::default()
  };
  state.store.update_word(id, patch).await?;
  let words = state.store.list_words().await?;
  let w = words.iter().find(|w| w.id == id).ok_or_else(|| ApiError::not_found(format!("word not found: {id}")))?;
  Ok(word_out(w))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn delete_word(state: &AppState, id: &str) -> ApiResult<OkOut> {
  state.store.delete_word(id).await?;
  info!(target: "tango_backend", %id, "Word deleted");
  Ok(OkOut { ok: true })
}

#[instrument(level = "info", skip(state))]
pub async fn recent_sessions(state: &AppState, limit: Option<usize>) -> ApiResult<Vec<SessionOut>> {
  let limit = limit.unwrap_or(RECENT_SESSIONS_DEFAULT).max(1);
  let recs = state.store.recent_sessions(limit).await?;
  Ok(recs.iter().map(session_out).collect())
}

// -------- Study flow --------

/// Start a session on a session object (used by WS, which owns one per connection).
pub async fn start_on(session: &mut StudySession, mode: StudyMode) -> ApiResult<QuizOut> {
  let quiz = session.start(mode).await?;
  Ok(quiz_out(&quiz, session.score().total, ROUND_CAP))
}

pub async fn answer_on(session: &mut StudySession, choice: &str) -> ApiResult<AnswerOut> {
  let outcome = session.submit_answer(choice).await?;
  Ok(AnswerOut { outcome, phase: session.phase() })
}

pub async fn next_on(session: &mut StudySession) -> ApiResult<NextOut> {
  match session.advance().await? {
    Advance::Next(quiz) => Ok(NextOut::Next { quiz: quiz_out(&quiz, session.score().total, ROUND_CAP) }),
    Advance::Completed(summary) => Ok(NextOut::Completed { summary }),
  }
}

#[instrument(level = "info", skip(state), fields(mode = mode.as_str()))]
pub async fn study_start(state: &AppState, mode: StudyMode) -> ApiResult<StartOut> {
  let (session_key, handle) = state.open_session().await;
  let started = {
    let mut s = handle.lock().await;
    start_on(&mut s, mode).await.map(|quiz| (quiz, s.record_id().map(str::to_string)))
  };
  match started {
    Ok((quiz, record_id)) => {
      info!(target: "study", %session_key, ?record_id, "Live session opened");
      Ok(StartOut { session_key, record_id, quiz })
    }
    Err(e) => {
      state.drop_session(&session_key).await;
      Err(e)
    }
  }
}

async fn handle_for(state: &AppState, key: &str) -> ApiResult<crate::state::SessionHandle> {
  state.session(key).await.ok_or_else(|| ApiError::not_found(format!("unknown session: {key}")))
}

#[instrument(level = "info", skip(state, choice), fields(%session_key))]
pub async fn study_answer(state: &AppState, session_key: &str, choice: &str) -> ApiResult<AnswerOut> {
  let handle = handle_for(state, session_key).await?;
  let mut s = handle.lock().await;
  answer_on(&mut s, choice).await
}

/// Next round; a completed session is dropped from the live map.
#[instrument(level = "info", skip(state), fields(%session_key))]
pub async fn study_next(state: &AppState, session_key: &str) -> ApiResult<NextOut> {
  let handle = handle_for(state, session_key).await?;
  let out = {
    let mut s = handle.lock().await;
    next_on(&mut s).await?
  };
  if matches!(out, NextOut::Completed { .. }) {
    state.drop_session(session_key).await;
  }
  Ok(out)
}

/// Abandon a live session. The persisted record keeps no end time.
#[instrument(level = "info", skip(state), fields(%session_key))]
pub async fn study_restart(state: &AppState, session_key: &str) -> ApiResult<OkOut> {
  let handle = handle_for(state, session_key).await?;
  handle.lock().await.restart();
  state.drop_session(session_key).await;
  Ok(OkOut { ok: true })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::StudyCfg;
  use crate::seeds::sample_words;
  use crate::store::MemoryStore;
  use std::sync::Arc;

  fn state() -> AppState {
    AppState::with_parts(Arc::new(MemoryStore::default()), sample_words(), StudyCfg::default(), None)
  }

  #[tokio::test]
  async fn word_management_roundtrip() {
    let st = state();
    let w = add_word(&st, AddWordIn { headword: " river ".into(), translation: "かわ".into(), difficulty: None })
      .await
      .unwrap();
    assert_eq!(w.headword, "river");
    assert_eq!(w.difficulty, Difficulty::DEFAULT);
    assert_eq!(w.difficulty_label, "普通");

    let pairs = do_extract("apple りんご\nnoise\ncat: ねこ").pairs;
    let imported = import_pairs(&st, pairs).await.unwrap();
    assert_eq!(imported.len(), 2);
    assert!(imported.iter().all(|w| w.source == WordSource::Ocr && w.difficulty == Difficulty::DEFAULT));

    let edited = edit_word(&st, &w.id, EditWordIn { difficulty: Difficulty::new(4), ..Default::default() })
      .await
      .unwrap();
    assert_eq!(edited.difficulty, Difficulty::MAX);

    let hard = list_words(&st, &WordsQuery { min_difficulty: Some(3), ..Default::default() }).await.unwrap();
    assert_eq!(hard.len(), 1);
    let exact = list_words(&st, &WordsQuery { difficulty: Some(2), ..Default::default() }).await.unwrap();
    assert_eq!(exact.len(), 2);
    assert_eq!(
      list_words(&st, &WordsQuery { difficulty: Some(9), ..Default::default() }).await.unwrap_err().status,
      StatusCode::BAD_REQUEST
    );

    delete_word(&st, &w.id).await.unwrap();
    assert_eq!(delete_word(&st, &w.id).await.unwrap_err().status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn invalid_input_is_rejected() {
    let st = state();
    let err = add_word(&st, AddWordIn { headword: "".into(), translation: "x".into(), difficulty: None }).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert!(import_pairs(&st, vec![]).await.is_err());
    let err = edit_word(&st, "nope", EditWordIn { headword: Some("  ".into()), ..Default::default() }).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    let err = do_ocr(&st, "AA==", "image/png").await.unwrap_err();
    assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
  }

  #[tokio::test]
  async fn live_session_flow_over_keys() {
    let st = state();
    let started = study_start(&st, StudyMode::Normal).await.unwrap();
    assert_eq!(started.quiz.round, 1);
    assert_eq!(started.quiz.options.len(), 4);
    let key = started.session_key;

    assert_eq!(study_next(&st, &key).await.unwrap_err().status, StatusCode::BAD_REQUEST);

    let mut completed = None;
    for _ in 0..10 {
      let ans = study_answer(&st, &key, "whatever").await.unwrap();
      assert!(ans.outcome.score.correct <= ans.outcome.score.total);
      if let NextOut::Completed { summary } = study_next(&st, &key).await.unwrap() {
        completed = Some(summary);
      }
    }
    let summary = completed.expect("session should complete after ten rounds");
    assert_eq!(summary.total_questions, 10);
    assert_eq!(st.live_sessions().await, 0);
    assert_eq!(study_answer(&st, &key, "x").await.unwrap_err().status, StatusCode::NOT_FOUND);

    let history = recent_sessions(&st, None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].completed);
  }

  #[tokio::test]
  async fn restart_drops_live_session_but_keeps_record() {
    let st = state();
    let key = study_start(&st, StudyMode::DifficultyFocus).await.unwrap().session_key;
    study_restart(&st, &key).await.unwrap();
    assert_eq!(st.live_sessions().await, 0);
    let history = recent_sessions(&st, Some(5)).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(!history[0].completed);
  }

  #[tokio::test]
  async fn edits_cannot_touch_study_counters() {
    let st = state();
    let w = add_word(&st, AddWordIn { headword: "river".into(), translation: "かわ".into(), difficulty: None })
      .await
      .unwrap();
    let body: EditWordIn =
      serde_json::from_str(r#"{"difficulty": 3, "correctCount": 99, "lastStudied": "2024-01-01T00:00:00Z"}"#).unwrap();
    let edited = edit_word(&st, &w.id, body).await.unwrap();
    assert_eq!(edited.difficulty.get(), 3);
    assert_eq!(edited.correct_count, 0);
    assert!(edited.last_studied.is_none());
  }

  #[tokio::test]
  async fn abandoned_starts_do_not_pile_up() {
    let st = state().with_session_ttl(std::time::Duration::ZERO);
    for _ in 0..50 {
      study_start(&st, StudyMode::Normal).await.unwrap();
    }
    assert_eq!(st.live_sessions().await, 1);
    assert_eq!(recent_sessions(&st, Some(100)).await.unwrap().len(), 50);
  }

  #[tokio::test]
  async fn empty_pool_is_a_conflict() {
    let st = AppState::with_parts(Arc::new(MemoryStore::default()), vec![], StudyCfg::default(), None);
    let err = study_start(&st, StudyMode::Normal).await.unwrap_err();
    assert_eq!(err.status, StatusCode::CONFLICT);
    assert_eq!(st.live_sessions().await, 0);
  }
}
