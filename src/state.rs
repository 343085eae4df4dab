//! Application state: the injected store, OCR engine, study constants and live sessions.
//!
//! This module owns:
//!   - the persistence backend (chosen once from config, used as `dyn VocabStore`)
//!   - the sample word set used as fallback pool
//!   - the optional OCR engine
//!   - live study sessions keyed by a random session key
//!
//! One session has exactly one writer: each live session sits behind its own
//! mutex, so a round is fully resolved before the next request touches it.
//! Sessions nobody touched for `SESSION_IDLE_TTL` count as abandoned and are
//! evicted when the next session opens.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::{load_config_from_env, StudyCfg};
use crate::domain::Word;
use crate::ocr::{OcrEngine, VisionOcr};
use crate::seeds::samples_from_config;
use crate::session::{StudySession, MIN_POOL, ROUND_CAP};
use crate::store::{self, VocabStore};

pub type SessionHandle = Arc<Mutex<StudySession>>;

/// How long an HTTP study session may sit untouched before it is evicted.
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

struct LiveSession {
    handle: SessionHandle,
    last_touched: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VocabStore>,
    pub samples: Arc<Vec<Word>>,
    pub study: StudyCfg,
    pub ocr: Option<Arc<dyn OcrEngine>>,
    session_ttl: Duration,
    sessions: Arc<RwLock<HashMap<String, LiveSession>>>,
}

impl AppState {
    /// Build state from env: load config, pick the store backend, init OCR.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_config_from_env();
        let store = store::from_config(&cfg.store);
        let samples = samples_from_config(&cfg.samples);

        let ocr: Option<Arc<dyn OcrEngine>> = match VisionOcr::from_env() {
            Some(v) => {
                info!(target: "tango_backend", base_url = %v.base_url, model = %v.model, "OCR enabled.");
                Some(Arc::new(v))
            }
            None => {
                info!(target: "tango_backend", "OCR disabled (no OPENAI_API_KEY). Text extraction still available.");
                None
            }
        };

        info!(
            target: "tango_backend",
            samples = samples.len(),
            round_cap = ROUND_CAP,
            min_pool = MIN_POOL,
            hard_threshold = %cfg.study.hard_threshold,
            "Study configuration"
        );

        let ttl = std::env::var("TANGO_SESSION_IDLE_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(SESSION_IDLE_TTL);
        info!(target: "tango_backend", idle_secs = ttl.as_secs(), "Live session idle timeout");

        Self::with_parts(store, samples, cfg.study, ocr).with_session_ttl(ttl)
    }

    pub fn with_parts(
        store: Arc<dyn VocabStore>,
        samples: Vec<Word>,
        study: StudyCfg,
        ocr: Option<Arc<dyn OcrEngine>>,
    ) -> Self {
        Self {
            store,
            samples: Arc::new(samples),
            study,
            ocr,
            session_ttl: SESSION_IDLE_TTL,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Override the idle timeout for live sessions.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Fresh session in `SelectingMode`, registered under a new key.
    /// Idle sessions are evicted first.
    #[instrument(level = "debug", skip(self))]
    pub async fn open_session(&self) -> (String, SessionHandle) {
        let session = StudySession::new(self.store.clone(), self.samples.as_ref().clone(), self.study);
        let key = Uuid::new_v4().to_string();
        let handle = Arc::new(Mutex::new(session));

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let ttl = self.session_ttl;
        sessions.retain(|_, live| live.last_touched.elapsed() < ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(target: "study", evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        sessions.insert(key.clone(), LiveSession { handle: handle.clone(), last_touched: Instant::now() });
        (key, handle)
    }

    /// Look up a live session and mark it as touched.
    #[instrument(level = "debug", skip(self), fields(%key))]
    pub async fn session(&self, key: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let live = sessions.get_mut(key)?;
        live.last_touched = Instant::now();
        Some(live.handle.clone())
    }

    /// Forget a live session. Its persisted record is untouched.
    #[instrument(level = "debug", skip(self), fields(%key))]
    pub async fn drop_session(&self, key: &str) -> bool {
        self.sessions.write().await.remove(key).is_some()
    }

    pub async fn live_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeds::sample_words;
    use crate::store::MemoryStore;

    fn state(ttl: Duration) -> AppState {
        AppState::with_parts(Arc::new(MemoryStore::default()), sample_words(), StudyCfg::default(), None)
            .with_session_ttl(ttl)
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_on_open() {
        let st = state(Duration::ZERO);
        let (first, _) = st.open_session().await;
        st.open_session().await;
        st.open_session().await;
        assert_eq!(st.live_sessions().await, 1);
        assert!(st.session(&first).await.is_none());
    }

    #[tokio::test]
    async fn active_sessions_survive_new_opens() {
        let st = state(SESSION_IDLE_TTL);
        let (key, _) = st.open_session().await;
        for _ in 0..20 {
            st.open_session().await;
        }
        assert_eq!(st.live_sessions().await, 21);
        assert!(st.session(&key).await.is_some());
        assert!(st.drop_session(&key).await);
        assert_eq!(st.live_sessions().await, 20);
    }
}
