//! Persistence collaborator: the single source of truth for words and session records.
//!
//! The backend is picked once at startup (`[store] backend` in the TOML config)
//! and handed to the rest of the app as `Arc<dyn VocabStore>`; nothing else
//! branches on which backend is active.
//!
//! Both backends share `StoreDoc`, the in-memory document; `JsonFileStore`
//! additionally writes it to disk after every mutation (tmp file + rename).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::{StoreBackend, StoreCfg};
use crate::domain::{NewSessionRecord, NewWord, SessionPatch, StudySessionRecord, Word, WordPatch};
use crate::error::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Default page size for `recent_sessions`.
pub const RECENT_SESSIONS_DEFAULT: usize = 10;

#[async_trait]
pub trait VocabStore: Send + Sync {
  /// All words, newest first.
  async fn list_words(&self) -> StoreResult<Vec<Word>>;
  async fn add_word(&self, w: NewWord) -> StoreResult<Word>;
  async fn add_words(&self, ws: Vec<NewWord>) -> StoreResult<Vec<Word>>;
  async fn update_word(&self, id: &str, patch: WordPatch) -> StoreResult<()>;
  async fn delete_word(&self, id: &str) -> StoreResult<()>;

  /// Returns the generated session id.
  async fn create_session(&self, rec: NewSessionRecord) -> StoreResult<String>;
  async fn update_session(&self, id: &str, patch: SessionPatch) -> StoreResult<()>;
  /// Newest first.
  async fn recent_sessions(&self, limit: usize) -> StoreResult<Vec<StudySessionRecord>>;
}

/// Build the configured backend.
pub fn from_config(cfg: &StoreCfg) -> Arc<dyn VocabStore> {
  match cfg.backend {
    StoreBackend::Memory => {
      info!(target: "tango_backend", "Using in-memory store (data is lost on exit)");
      Arc::new(MemoryStore::default())
    }
    StoreBackend::JsonFile => {
      info!(target: "tango_backend", path = %cfg.path.display(), "Using JSON file store");
      Arc::new(JsonFileStore::new(cfg.path.clone()))
    }
  }
}

// ---------- shared document ----------

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StoreDoc {
  #[serde(default)] words: Vec<Word>,
  #[serde(default)] sessions: Vec<StudySessionRecord>,
}

fn new_id() -> String { Uuid::new_v4().to_string() }

fn not_found(kind: &'static str, id: &str) -> StoreError {
  StoreError::NotFound { kind, id: id.to_string() }
}

impl StoreDoc {
  fn materialize(w: NewWord) -> Word {
    Word {
      id: new_id(),
      headword: w.headword,
      translation: w.translation,
      difficulty: w.difficulty,
      correct_count: 0,
      incorrect_count: 0,
      last_studied: None,
      created_at: Utc::now(),
      source: w.source,
    }
  }

  fn add_words(&mut self, ws: Vec<NewWord>) -> Vec<Word> {
    let created: Vec<Word> = ws.into_iter().map(Self::materialize).collect();
    // newest first
    self.words.splice(0..0, created.iter().cloned());
    created
  }

  fn update_word(&mut self, id: &str, patch: &WordPatch) -> StoreResult<()> {
    let w = self.words.iter_mut().find(|w| w.id == id).ok_or_else(|| not_found("word", id))?;
    patch.apply_to(w);
    Ok(())
  }

  fn delete_word(&mut self, id: &str) -> StoreResult<()> {
    let before = self.words.len();
    self.words.retain(|w| w.id != id);
    if self.words.len() == before { Err(not_found("word", id)) } else { Ok(()) }
  }

  fn create_session(&mut self, rec: NewSessionRecord) -> String {
    let id = new_id();
    self.sessions.insert(0, StudySessionRecord {
      id: id.clone(),
      mode: rec.mode,
      start_time: rec.start_time,
      end_time: None,
      total_questions: 0,
      correct_answers: 0,
      words_studied: Vec::new(),
    });
    id
  }

  fn update_session(&mut self, id: &str, patch: &SessionPatch) -> StoreResult<()> {
    let s = self.sessions.iter_mut().find(|s| s.id == id).ok_or_else(|| not_found("session", id))?;
    patch.apply_to(s);
    Ok(())
  }

  fn recent_sessions(&self, limit: usize) -> Vec<StudySessionRecord> {
    self.sessions.iter().take(limit).cloned().collect()
  }
}

// ---------- in-memory backend ----------

#[derive(Default)]
pub struct MemoryStore {
  doc: RwLock<StoreDoc>,
}

#[async_trait]
impl VocabStore for MemoryStore {
  async fn list_words(&self) -> StoreResult<Vec<Word>> {
    Ok(self.doc.read().await.words.clone())
  }

  async fn add_word(&self, w: NewWord) -> StoreResult<Word> {
    let mut created = self.doc.write().await.add_words(vec![w]);
    created.pop().ok_or_else(|| not_found("word", "<new>"))
  }

  async fn add_words(&self, ws: Vec<NewWord>) -> StoreResult<Vec<Word>> {
    Ok(self.doc.write().await.add_words(ws))
  }

  async fn update_word(&self, id: &str, patch: WordPatch) -> StoreResult<()> {
    self.doc.write().await.update_word(id, &patch)
  }

  async fn delete_word(&self, id: &str) -> StoreResult<()> {
    self.doc.write().await.delete_word(id)
  }

  async fn create_session(&self, rec: NewSessionRecord) -> StoreResult<String> {
    Ok(self.doc.write().await.create_session(rec))
  }

  async fn update_session(&self, id: &str, patch: SessionPatch) -> StoreResult<()> {
    self.doc.write().await.update_session(id, &patch)
  }

  async fn recent_sessions(&self, limit: usize) -> StoreResult<Vec<StudySessionRecord>> {
    Ok(self.doc.read().await.recent_sessions(limit))
  }
}

// ---------- JSON file backend ----------

/// Single JSON document on disk: `{ "words": [...], "sessions": [...] }`.
/// Loaded on first access; a missing file is an empty store.
pub struct JsonFileStore {
  path: PathBuf,
  doc: Mutex<Option<StoreDoc>>,
}

impl JsonFileStore {
  pub fn new(path: PathBuf) -> Self {
    Self { path, doc: Mutex::new(None) }
  }

  async fn load(path: &Path) -> StoreResult<StoreDoc> {
    match tokio::fs::read(path).await {
      Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreDoc::default()),
      Err(e) => Err(e.into()),
    }
  }

  #[instrument(level = "debug", target = "tango_backend", skip(self, doc), fields(path = %self.path.display()))]
  async fn save(&self, doc: &StoreDoc) -> StoreResult<()> {
    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(dir).await?;
    }
    let tmp = self.path.with_extension("json.tmp");
    tokio::fs::write(&tmp, serde_json::to_vec_pretty(doc)?).await?;
    tokio::fs::rename(&tmp, &self.path).await?;
    debug!(target: "tango_backend", words = doc.words.len(), sessions = doc.sessions.len(), "Store saved");
    Ok(())
  }

  /// Run `f` against the loaded document, loading it first if needed.
  async fn read<T>(&self, f: impl FnOnce(&StoreDoc) -> T) -> StoreResult<T> {
    let mut guard = self.doc.lock().await;
    if guard.is_none() {
      *guard = Some(Self::load(&self.path).await?);
    }
    let doc = guard.get_or_insert_with(StoreDoc::default);
    Ok(f(doc))
  }

  /// Mutate a copy, persist it, then swap it in. A failed write leaves memory untouched.
  async fn write<T>(&self, f: impl FnOnce(&mut StoreDoc) -> StoreResult<T>) -> StoreResult<T> {
    let mut guard = self.doc.lock().await;
    if guard.is_none() {
      *guard = Some(Self::load(&self.path).await?);
    }
    let mut next = guard.clone().unwrap_or_default();
    let out = f(&mut next)?;
    self.save(&next).await?;
    *guard = Some(next);
    Ok(out)
  }
}

#[async_trait]
impl VocabStore for JsonFileStore {
  async fn list_words(&self) -> StoreResult<Vec<Word>> {
    self.read(|d| d.words.clone()).await
  }

  async fn add_word(&self, w: NewWord) -> StoreResult<Word> {
    let mut created = self.write(|d| Ok(d.add_words(vec![w]))).await?;
    created.pop().ok_or_else(|| not_found("word", "<new>"))
  }

  async fn add_words(&self, ws: Vec<NewWord>) -> StoreResult<Vec<Word>> {
    self.write(|d| Ok(d.add_words(ws))).await
  }

  async fn update_word(&self, id: &str, patch: WordPatch) -> StoreResult<()> {
    self.write(|d| d.update_word(id, &patch)).await
  }

  async fn delete_word(&self, id: &str) -> StoreResult<()> {
    self.write(|d| d.delete_word(id)).await
  }

  async fn create_session(&self, rec: NewSessionRecord) -> StoreResult<String> {
    self.write(|d| Ok(d.create_session(rec))).await
  }

  async fn update_session(&self, id: &str, patch: SessionPatch) -> StoreResult<()> {
    self.write(|d| d.update_session(id, &patch)).await
  }

  async fn recent_sessions(&self, limit: usize) -> StoreResult<Vec<StudySessionRecord>> {
    self.read(|d| d.recent_sessions(limit)).await
  }
}
