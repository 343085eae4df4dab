//! Domain models: words, difficulty, candidate pairs, quizzes and session records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Difficulty level of a word: 1 = easiest, 4 = hardest.
/// Always inside `[MIN, MAX]`; deserialization rejects anything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
  pub const MIN: Difficulty = Difficulty(1);
  pub const MAX: Difficulty = Difficulty(4);
  /// Manually added and OCR-imported words start here.
  pub const DEFAULT: Difficulty = Difficulty(2);

  pub fn new(level: u8) -> Option<Self> {
    (Self::MIN.0..=Self::MAX.0).contains(&level).then_some(Difficulty(level))
  }

  pub fn get(self) -> u8 { self.0 }

  /// One step easier, never below 1.
  pub fn easier(self) -> Self { Difficulty(self.0.saturating_sub(1).max(Self::MIN.0)) }

  /// One step harder, never above 4.
  pub fn harder(self) -> Self { Difficulty((self.0 + 1).min(Self::MAX.0)) }

  pub fn label_ja(self) -> &'static str {
    match self.0 {
      1 => "簡単",
      2 => "普通",
      3 => "難しい",
      _ => "とても難しい",
    }
  }
}

impl Default for Difficulty {
  fn default() -> Self { Self::DEFAULT }
}

impl TryFrom<u8> for Difficulty {
  type Error = String;
  fn try_from(v: u8) -> Result<Self, Self::Error> {
    Difficulty::new(v).ok_or_else(|| format!("difficulty must be within 1..=4, got {v}"))
  }
}

impl From<Difficulty> for u8 {
  fn from(d: Difficulty) -> u8 { d.0 }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Where did a word come from?
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordSource {
  #[default]
  Manual,  // typed in by the learner
  Ocr,     // imported from a photographed page
  Sample,  // bundled fallback set, never persisted
}

/// A vocabulary entry owned by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
  pub id: String,
  /// English prompt shown to the learner.
  pub headword: String,
  /// Japanese meaning, the expected answer.
  pub translation: String,
  #[serde(default)]
  pub difficulty: Difficulty,
  #[serde(default)]
  pub correct_count: u32,
  #[serde(default)]
  pub incorrect_count: u32,
  #[serde(default)]
  pub last_studied: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub source: WordSource,
}

impl Word {
  pub fn is_sample(&self) -> bool { self.source == WordSource::Sample }
}

/// Fields needed to create a word; the store assigns id and timestamps.
#[derive(Clone, Debug)]
pub struct NewWord {
  pub headword: String,
  pub translation: String,
  pub difficulty: Difficulty,
  pub source: WordSource,
}

impl NewWord {
  /// Trim both sides and reject empty fields.
  pub fn validated(headword: &str, translation: &str, difficulty: Difficulty, source: WordSource) -> Result<Self, String> {
    let headword = headword.trim();
    let translation = translation.trim();
    if headword.is_empty() { return Err("headword must not be empty".into()); }
    if translation.is_empty() { return Err("translation must not be empty".into()); }
    Ok(Self { headword: headword.to_string(), translation: translation.to_string(), difficulty, source })
  }
}

/// Partial update applied to a stored word. `None` leaves the field alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WordPatch {
  pub headword: Option<String>,
  pub translation: Option<String>,
  pub difficulty: Option<Difficulty>,
  pub correct_count: Option<u32>,
  pub incorrect_count: Option<u32>,
  pub last_studied: Option<DateTime<Utc>>,
}

impl WordPatch {
  pub fn apply_to(&self, w: &mut Word) {
    if let Some(h) = &self.headword { w.headword = h.clone(); }
    if let Some(t) = &self.translation { w.translation = t.clone(); }
    if let Some(d) = self.difficulty { w.difficulty = d; }
    if let Some(c) = self.correct_count { w.correct_count = c; }
    if let Some(c) = self.incorrect_count { w.incorrect_count = c; }
    if let Some(t) = self.last_studied { w.last_studied = Some(t); }
  }
}

/// Transient output of extraction. Accept/reject state lives in the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePair {
  pub headword: String,
  pub translation: String,
}

/// One drill round. Not persisted.
#[derive(Clone, Debug)]
pub struct Quiz {
  pub target: Word,
  pub options: Vec<String>,
  pub correct_answer: String,
}

/// Which words a session may draw targets from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyMode {
  /// Whole pool.
  Normal,
  /// Only words at or above the hard threshold.
  #[serde(rename = "difficulty", alias = "difficulty_focus")]
  DifficultyFocus,
}

impl StudyMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Normal => "normal",
      Self::DifficultyFocus => "difficulty",
    }
  }
}

/// Persisted audit trail of one drill session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySessionRecord {
  pub id: String,
  pub mode: StudyMode,
  pub start_time: DateTime<Utc>,
  #[serde(default)]
  pub end_time: Option<DateTime<Utc>>,
  pub total_questions: u32,
  pub correct_answers: u32,
  #[serde(default)]
  pub words_studied: Vec<String>,
}

impl StudySessionRecord {
  /// Percentage of correct answers, 0 when nothing was answered.
  pub fn accuracy(&self) -> f32 {
    if self.total_questions == 0 { 0.0 } else { self.correct_answers as f32 * 100.0 / self.total_questions as f32 }
  }
}

/// Session record before the store assigns an id.
#[derive(Clone, Debug)]
pub struct NewSessionRecord {
  pub mode: StudyMode,
  pub start_time: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionPatch {
  pub end_time: Option<DateTime<Utc>>,
  pub total_questions: Option<u32>,
  pub correct_answers: Option<u32>,
  pub words_studied: Option<Vec<String>>,
}

impl SessionPatch {
  pub fn apply_to(&self, s: &mut StudySessionRecord) {
    if let Some(t) = self.end_time { s.end_time = Some(t); }
    if let Some(n) = self.total_questions { s.total_questions = n; }
    if let Some(n) = self.correct_answers { s.correct_answers = n; }
    if let Some(ids) = &self.words_studied { s.words_studied = ids.clone(); }
  }
}
