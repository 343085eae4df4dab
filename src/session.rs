//! Study session: a bounded sequence of quiz rounds over an eligible word pool.
//!
//! States:
//!   SelectingMode --start--> AwaitingAnswer --submit_answer--> Answered
//!   Answered --advance--> AwaitingAnswer   (rounds left)
//!   Answered --advance--> Completed        (round cap reached)
//!   any --restart--> SelectingMode
//!
//! The store is the source of truth for words. Every round re-reads the word
//! list, so difficulty mode always reflects the scores written by the previous
//! round. Persistence is best effort: a failed write is logged and reported in
//! the round outcome, but the in-memory score still advances and the session
//! still completes at the round cap.

use std::sync::Arc;

use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::config::StudyCfg;
use crate::difficulty::answer_patch;
use crate::domain::{Difficulty, NewSessionRecord, Quiz, SessionPatch, StudyMode, Word};
use crate::error::StudyError;
use crate::quiz::generate_quiz;
use crate::store::VocabStore;

/// Answered rounds per session.
pub const ROUND_CAP: u32 = 10;
/// Smallest difficulty-mode pool; below it the pool is padded from the fallback set.
pub const MIN_POOL: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SelectingMode,
    AwaitingAnswer,
    Answered,
    Completed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::SelectingMode => "selecting_mode",
            Phase::AwaitingAnswer => "awaiting_answer",
            Phase::Answered => "answered",
            Phase::Completed => "completed",
        }
    }
}

/// Running score of the current session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
}

/// Result of one answered round.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub correct: bool,
    pub expected: String,
    pub score: Score,
    /// Difficulty written for the word, `None` if nothing was written
    /// (sample word, word deleted meanwhile, or write failure).
    pub new_difficulty: Option<Difficulty>,
    pub rounds_left: u32,
    /// Persistence failures of this round; the round itself still counts.
    pub persistence_warnings: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub record_id: Option<String>,
    pub mode: StudyMode,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub accuracy: f32,
    pub words_studied: Vec<String>,
}

#[derive(Clone, Debug)]
pub enum Advance {
    Next(Quiz),
    Completed(SessionSummary),
}

/// Eligible words for a mode.
///
/// - `Normal`: the whole pool, or the fallback set if the pool is empty.
/// - `DifficultyFocus`: words at or above `cfg.hard_threshold`. Below
///   `MIN_POOL` words, hard fallback words are appended, then any other
///   fallback words until the minimum is reached. Padding skips words whose
///   id or translation is already present.
pub fn select_pool(mode: StudyMode, all_words: &[Word], fallback: &[Word], cfg: &StudyCfg) -> Vec<Word> {
    match mode {
        StudyMode::Normal => {
            if all_words.is_empty() {
                fallback.to_vec()
            } else {
                all_words.to_vec()
            }
        }
        StudyMode::DifficultyFocus => {
            let is_hard = |w: &&Word| w.difficulty >= cfg.hard_threshold;
            let mut pool: Vec<Word> = all_words.iter().filter(is_hard).cloned().collect();
            if pool.len() >= MIN_POOL {
                return pool;
            }

            for w in fallback.iter().filter(is_hard) {
                if fits(&pool, w) {
                    pool.push(w.clone());
                }
            }
            for w in fallback.iter().filter(|w| w.difficulty < cfg.hard_threshold) {
                if pool.len() >= MIN_POOL {
                    break;
                }
                if fits(&pool, w) {
                    pool.push(w.clone());
                }
            }
            pool
        }
    }
}

fn fits(pool: &[Word], w: &Word) -> bool {
    pool.iter().all(|p| p.id != w.id && p.translation != w.translation)
}

pub struct StudySession {
    store: Arc<dyn VocabStore>,
    fallback: Vec<Word>,
    cfg: StudyCfg,
    rng: StdRng,

    phase: Phase,
    mode: Option<StudyMode>,
    record_id: Option<String>,
    score: Score,
    studied: Vec<String>,
    quiz: Option<Quiz>,
}

impl StudySession {
    pub fn new(store: Arc<dyn VocabStore>, fallback: Vec<Word>, cfg: StudyCfg) -> Self {
        Self::with_rng(store, fallback, cfg, StdRng::from_entropy())
    }

    /// Same as `new` but with a caller-provided RNG (deterministic tests).
    pub fn with_rng(store: Arc<dyn VocabStore>, fallback: Vec<Word>, cfg: StudyCfg, rng: StdRng) -> Self {
        Self {
            store,
            fallback,
            cfg,
            rng,
            phase: Phase::SelectingMode,
            mode: None,
            record_id: None,
            score: Score::default(),
            studied: Vec::new(),
            quiz: None,
        }
    }

    pub fn phase(&self) -> Phase { self.phase }
    pub fn score(&self) -> Score { self.score }
    pub fn record_id(&self) -> Option<&str> { self.record_id.as_deref() }
    pub fn words_studied(&self) -> &[String] { &self.studied }
    pub fn current_quiz(&self) -> Option<&Quiz> { self.quiz.as_ref() }

    fn expect_phase(&self, want: Phase, op: &'static str) -> Result<(), StudyError> {
        if self.phase == want {
            Ok(())
        } else {
            warn!(target: "study", op, state = self.phase.as_str(), "Rejected invalid transition");
            Err(StudyError::InvalidTransition { op, state: self.phase.as_str() })
        }
    }

    /// Current words from the store; a read failure degrades to an empty list
    /// so the fallback set takes over.
    async fn load_words(&self) -> Vec<Word> {
        match self.store.list_words().await {
            Ok(ws) => ws,
            Err(e) => {
                error!(target: "study", error = %e, "Failed to load words; using sample set");
                Vec::new()
            }
        }
    }

    async fn next_quiz(&mut self, mode: StudyMode) -> Result<Quiz, StudyError> {
        let words = self.load_words().await;
        let pool = select_pool(mode, &words, &self.fallback, &self.cfg);
        generate_quiz(&pool, &mut self.rng)
    }

    /// Begin a session. The pool is checked before the record is created, so an
    /// empty pool blocks the start without leaving an orphan record behind.
    #[instrument(level = "info", target = "study", skip(self), fields(mode = mode.as_str()))]
    pub async fn start(&mut self, mode: StudyMode) -> Result<Quiz, StudyError> {
        self.expect_phase(Phase::SelectingMode, "start")?;

        let quiz = self.next_quiz(mode).await?;

        let rec = NewSessionRecord { mode, start_time: Utc::now() };
        self.record_id = match self.store.create_session(rec).await {
            Ok(id) => Some(id),
            Err(e) => {
                error!(target: "study", error = %e, "Failed to create session record; studying without one");
                None
            }
        };

        self.mode = Some(mode);
        self.score = Score::default();
        self.studied.clear();
        self.phase = Phase::AwaitingAnswer;
        self.quiz = Some(quiz.clone());
        info!(target: "study", record_id = ?self.record_id, word_id = %quiz.target.id, "Session started");
        Ok(quiz)
    }

    /// Score the pending quiz and write the round result.
    #[instrument(level = "info", target = "study", skip(self, choice), fields(record_id = ?self.record_id))]
    pub async fn submit_answer(&mut self, choice: &str) -> Result<AnswerOutcome, StudyError> {
        self.expect_phase(Phase::AwaitingAnswer, "submit_answer")?;
        let Some(quiz) = self.quiz.clone() else {
            return Err(StudyError::InvalidTransition { op: "submit_answer", state: self.phase.as_str() });
        };

        let correct = choice.trim() == quiz.correct_answer;
        self.score.total += 1;
        if correct {
            self.score.correct += 1;
        }
        if !self.studied.contains(&quiz.target.id) {
            self.studied.push(quiz.target.id.clone());
        }

        let mut warnings = Vec::new();
        let new_difficulty = self.record_word_result(&quiz.target, correct, &mut warnings).await;

        if let Some(id) = self.record_id.clone() {
            let patch = SessionPatch {
                total_questions: Some(self.score.total),
                correct_answers: Some(self.score.correct),
                words_studied: Some(self.studied.clone()),
                ..Default::default()
            };
            if let Err(e) = self.store.update_session(&id, patch).await {
                error!(target: "study", record_id = %id, error = %e, "Failed to update session counters");
                warnings.push(StudyError::from(e).to_string());
            }
        }

        self.phase = Phase::Answered;
        info!(
            target: "study",
            word_id = %quiz.target.id,
            difficulty = quiz.target.difficulty.get(),
            %correct,
            correct_total = self.score.correct,
            total = self.score.total,
            "Answer recorded"
        );

        Ok(AnswerOutcome {
            correct,
            expected: quiz.correct_answer,
            score: self.score,
            new_difficulty,
            rounds_left: ROUND_CAP.saturating_sub(self.score.total),
            persistence_warnings: warnings,
        })
    }

    /// Re-read the word and write difficulty, counter and timestamp in one patch.
    async fn record_word_result(&self, target: &Word, correct: bool, warnings: &mut Vec<String>) -> Option<Difficulty> {
        if target.is_sample() {
            return None;
        }

        let current = match self.store.list_words().await {
            Ok(ws) => match ws.into_iter().find(|w| w.id == target.id) {
                Some(w) => w,
                None => {
                    warn!(target: "study", word_id = %target.id, "Word vanished from store; skipping difficulty update");
                    return None;
                }
            },
            Err(e) => {
                error!(target: "study", word_id = %target.id, error = %e, "Failed to re-read word; scoring from quiz copy");
                warnings.push(StudyError::from(e).to_string());
                target.clone()
            }
        };

        let patch = answer_patch(&current, correct, Utc::now());
        let next = patch.difficulty;
        match self.store.update_word(&target.id, patch).await {
            Ok(()) => next,
            Err(e) => {
                error!(target: "study", word_id = %target.id, error = %e, "Failed to update word difficulty");
                warnings.push(StudyError::from(e).to_string());
                None
            }
        }
    }

    /// Move past an answered round: next quiz, or close the session at the cap.
    #[instrument(level = "info", target = "study", skip(self), fields(record_id = ?self.record_id))]
    pub async fn advance(&mut self) -> Result<Advance, StudyError> {
        self.expect_phase(Phase::Answered, "advance")?;
        let mode = self.mode.unwrap_or(StudyMode::Normal);

        if self.score.total >= ROUND_CAP {
            if let Some(id) = self.record_id.clone() {
                let patch = SessionPatch {
                    end_time: Some(Utc::now()),
                    total_questions: Some(self.score.total),
                    correct_answers: Some(self.score.correct),
                    words_studied: Some(self.studied.clone()),
                };
                if let Err(e) = self.store.update_session(&id, patch).await {
                    error!(target: "study", record_id = %id, error = %e, "Failed to close session record");
                }
            }
            self.phase = Phase::Completed;
            self.quiz = None;
            let summary = self.summary(mode);
            info!(target: "study", total = summary.total_questions, correct = summary.correct_answers, "Session completed");
            return Ok(Advance::Completed(summary));
        }

        let quiz = self.next_quiz(mode).await?;
        self.quiz = Some(quiz.clone());
        self.phase = Phase::AwaitingAnswer;
        Ok(Advance::Next(quiz))
    }

    /// Drop in-memory state and go back to mode selection. The persisted record
    /// is left as is; without an end time it reads as an incomplete session.
    #[instrument(level = "info", target = "study", skip(self), fields(record_id = ?self.record_id, phase = self.phase.as_str()))]
    pub fn restart(&mut self) {
        self.phase = Phase::SelectingMode;
        self.mode = None;
        self.record_id = None;
        self.score = Score::default();
        self.studied.clear();
        self.quiz = None;
    }

    fn summary(&self, mode: StudyMode) -> SessionSummary {
        let accuracy = if self.score.total == 0 {
            0.0
        } else {
            self.score.correct as f32 * 100.0 / self.score.total as f32
        };
        SessionSummary {
            record_id: self.record_id.clone(),
            mode,
            total_questions: self.score.total,
            correct_answers: self.score.correct,
            accuracy,
            words_studied: self.studied.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewSessionRecord, NewWord, StudySessionRecord, WordPatch, WordSource};
    use crate::error::StoreError;
    use crate::seeds::sample_words;
    use crate::store::{MemoryStore, StoreResult};
    use async_trait::async_trait;

    fn d(n: u8) -> Difficulty { Difficulty::new(n).unwrap() }

    async fn seeded_store(words: &[(&str, &str, u8)]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        let new: Vec<NewWord> = words
            .iter()
            .map(|(h, t, lvl)| NewWord::validated(h, t, d(*lvl), WordSource::Manual).unwrap())
            .collect();
        store.add_words(new).await.unwrap();
        store
    }

    fn session(store: Arc<dyn VocabStore>, seed: u64) -> StudySession {
        StudySession::with_rng(store, sample_words(), StudyCfg::default(), StdRng::seed_from_u64(seed))
    }

    const SIX: &[(&str, &str, u8)] = &[
        ("dog", "いぬ", 2),
        ("cat", "ねこ", 2),
        ("bird", "とり", 3),
        ("fish", "さかな", 1),
        ("horse", "うま", 4),
        ("cow", "うし", 2),
    ];

    #[test]
    fn difficulty_mode_pads_small_hard_pool() {
        let words: Vec<Word> = sample_words()
            .into_iter()
            .enumerate()
            .map(|(i, mut w)| {
                w.id = format!("own-{i}");
                w.translation = format!("自分{i}");
                w.source = WordSource::Manual;
                w.difficulty = if i < 2 { d(3) } else { d(1) };
                w
            })
            .collect();
        let pool = select_pool(StudyMode::DifficultyFocus, &words, &sample_words(), &StudyCfg::default());
        assert!(pool.len() >= 4, "pool too small: {}", pool.len());
        assert_eq!(pool.iter().filter(|w| !w.is_sample()).count(), 2);
    }

    #[test]
    fn difficulty_mode_reaches_minimum_even_without_hard_words() {
        let fallback: Vec<Word> = sample_words().into_iter().filter(|w| w.difficulty < d(3)).collect();
        let pool = select_pool(StudyMode::DifficultyFocus, &[], &fallback, &StudyCfg::default());
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn difficulty_mode_does_not_pad_when_enough() {
        let mut words = sample_words();
        for w in &mut words {
            w.difficulty = d(4);
        }
        let pool = select_pool(StudyMode::DifficultyFocus, &words, &[], &StudyCfg::default());
        assert_eq!(pool.len(), words.len());
    }

    #[test]
    fn normal_mode_uses_everything_or_fallback() {
        let fallback = sample_words();
        let cfg = StudyCfg::default();
        assert_eq!(select_pool(StudyMode::Normal, &[], &fallback, &cfg).len(), fallback.len());
        let own = &fallback[..2];
        assert_eq!(select_pool(StudyMode::Normal, own, &[], &cfg).len(), 2);
    }

    #[tokio::test]
    async fn ten_rounds_complete_the_session() {
        let store = seeded_store(SIX).await;
        let mut s = session(store.clone(), 1);
        s.start(StudyMode::Normal).await.unwrap();

        for round in 0..10u32 {
            assert_eq!(s.phase(), Phase::AwaitingAnswer);
            let quiz = s.current_quiz().unwrap().clone();
            assert_eq!(quiz.options.len(), 4);
            // alternate right / wrong answers
            let choice = if round % 2 == 0 {
                quiz.correct_answer.clone()
            } else {
                quiz.options.iter().find(|o| **o != quiz.correct_answer).unwrap().clone()
            };
            let out = s.submit_answer(&choice).await.unwrap();
            assert_eq!(out.correct, round % 2 == 0);
            assert!(out.score.correct <= out.score.total);
            assert_eq!(out.score.total, round + 1);
            assert!(out.persistence_warnings.is_empty());

            match s.advance().await.unwrap() {
                Advance::Next(_) => assert!(round < 9),
                Advance::Completed(summary) => {
                    assert_eq!(round, 9);
                    assert_eq!(summary.total_questions, 10);
                    assert_eq!(summary.correct_answers, 5);
                }
            }
        }
        assert_eq!(s.phase(), Phase::Completed);

        let rec: StudySessionRecord = store.recent_sessions(1).await.unwrap().remove(0);
        assert_eq!(rec.total_questions, 10);
        assert_eq!(rec.correct_answers, 5);
        assert!(rec.end_time.is_some());
        assert!(!rec.words_studied.is_empty());
        let mut ids = rec.words_studied.clone();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), rec.words_studied.len());
    }

    #[tokio::test]
    async fn answers_update_difficulty_and_counts_in_store() {
        let store = seeded_store(SIX).await;
        let mut s = session(store.clone(), 5);
        s.start(StudyMode::Normal).await.unwrap();

        let quiz = s.current_quiz().unwrap().clone();
        let before = quiz.target.difficulty;
        let out = s.submit_answer(&quiz.correct_answer).await.unwrap();
        assert!(out.correct);
        assert_eq!(out.new_difficulty, Some(before.easier()));

        let w = store.list_words().await.unwrap().into_iter().find(|w| w.id == quiz.target.id).unwrap();
        assert_eq!(w.difficulty, before.easier());
        assert_eq!(w.correct_count, 1);
        assert_eq!(w.incorrect_count, 0);
        assert!(w.last_studied.is_some());

        s.advance().await.unwrap();
        let quiz = s.current_quiz().unwrap().clone();
        let stored = store.list_words().await.unwrap().into_iter().find(|w| w.id == quiz.target.id).unwrap();
        let out = s.submit_answer("not an option").await.unwrap();
        assert!(!out.correct);
        assert_eq!(out.new_difficulty, Some(stored.difficulty.harder()));
        let w = store.list_words().await.unwrap().into_iter().find(|w| w.id == quiz.target.id).unwrap();
        assert_eq!(w.incorrect_count, stored.incorrect_count + 1);
    }

    #[tokio::test]
    async fn scoring_reads_current_store_state() {
        let store = seeded_store(&[("horse", "うま", 2)]).await;
        let mut s = session(store.clone(), 9);
        s.start(StudyMode::Normal).await.unwrap();
        let id = s.current_quiz().unwrap().target.id.clone();

        // someone edits the word between quiz generation and answer
        store.update_word(&id, WordPatch { difficulty: Some(d(4)), ..Default::default() }).await.unwrap();
        let out = s.submit_answer("うま").await.unwrap();
        assert_eq!(out.new_difficulty, Some(d(3)));
    }

    #[tokio::test]
    async fn invalid_transitions_are_rejected_without_state_change() {
        let store = seeded_store(SIX).await;
        let mut s = session(store, 2);

        assert!(matches!(s.submit_answer("x").await, Err(StudyError::InvalidTransition { op: "submit_answer", .. })));
        assert!(matches!(s.advance().await, Err(StudyError::InvalidTransition { op: "advance", .. })));
        assert_eq!(s.phase(), Phase::SelectingMode);

        s.start(StudyMode::Normal).await.unwrap();
        assert!(matches!(s.start(StudyMode::Normal).await, Err(StudyError::InvalidTransition { .. })));
        assert!(s.advance().await.is_err());
        assert_eq!(s.phase(), Phase::AwaitingAnswer);

        s.submit_answer("x").await.unwrap();
        assert!(s.submit_answer("x").await.is_err());
        assert_eq!(s.score().total, 1);
        assert_eq!(s.phase(), Phase::Answered);
    }

    #[tokio::test]
    async fn restart_leaves_incomplete_record() {
        let store = seeded_store(SIX).await;
        let mut s = session(store.clone(), 3);
        s.start(StudyMode::DifficultyFocus).await.unwrap();
        let quiz = s.current_quiz().unwrap().clone();
        s.submit_answer(&quiz.correct_answer).await.unwrap();

        s.restart();
        assert_eq!(s.phase(), Phase::SelectingMode);
        assert!(s.current_quiz().is_none());
        assert_eq!(s.score(), Score::default());

        let recs = store.recent_sessions(10).await.unwrap();
        assert_eq!(recs.len(), 1);
        assert!(recs[0].end_time.is_none());
        assert_eq!(recs[0].total_questions, 1);

        // can start again after restart
        s.start(StudyMode::Normal).await.unwrap();
        assert_eq!(store.recent_sessions(10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_store_studies_sample_words_without_writing_them() {
        let store = Arc::new(MemoryStore::default());
        let mut s = session(store.clone(), 4);
        s.start(StudyMode::Normal).await.unwrap();
        let quiz = s.current_quiz().unwrap().clone();
        assert!(quiz.target.is_sample());
        let out = s.submit_answer(&quiz.correct_answer).await.unwrap();
        assert!(out.correct);
        assert_eq!(out.new_difficulty, None);
        assert!(out.persistence_warnings.is_empty());
        assert!(store.list_words().await.unwrap().is_empty());
        assert_eq!(s.words_studied(), &[quiz.target.id.clone()]);
    }

    #[tokio::test]
    async fn empty_pool_blocks_start() {
        let store = Arc::new(MemoryStore::default());
        let mut s = StudySession::with_rng(store.clone(), Vec::new(), StudyCfg::default(), StdRng::seed_from_u64(0));
        assert!(matches!(s.start(StudyMode::Normal).await, Err(StudyError::EmptyPool)));
        assert_eq!(s.phase(), Phase::SelectingMode);
        assert!(store.recent_sessions(10).await.unwrap().is_empty());
    }

    /// Store whose every call fails.
    struct FailingStore;

    fn boom() -> StoreError {
        StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"))
    }

    #[async_trait]
    impl VocabStore for FailingStore {
        async fn list_words(&self) -> StoreResult<Vec<Word>> { Err(boom()) }
        async fn add_word(&self, _w: NewWord) -> StoreResult<Word> { Err(boom()) }
        async fn add_words(&self, _ws: Vec<NewWord>) -> StoreResult<Vec<Word>> { Err(boom()) }
        async fn update_word(&self, _id: &str, _p: WordPatch) -> StoreResult<()> { Err(boom()) }
        async fn delete_word(&self, _id: &str) -> StoreResult<()> { Err(boom()) }
        async fn create_session(&self, _r: NewSessionRecord) -> StoreResult<String> { Err(boom()) }
        async fn update_session(&self, _id: &str, _p: SessionPatch) -> StoreResult<()> { Err(boom()) }
        async fn recent_sessions(&self, _limit: usize) -> StoreResult<Vec<StudySessionRecord>> { Err(boom()) }
    }

    #[tokio::test]
    async fn failing_store_degrades_to_best_effort() {
        let mut s = session(Arc::new(FailingStore), 8);
        s.start(StudyMode::DifficultyFocus).await.unwrap();
        assert!(s.record_id().is_none());

        let mut last = None;
        for _ in 0..10 {
            let quiz = s.current_quiz().unwrap().clone();
            let out = s.submit_answer(&quiz.correct_answer).await.unwrap();
            assert!(out.correct);
            last = Some(s.advance().await.unwrap());
        }
        assert_eq!(s.phase(), Phase::Completed);
        match last {
            Some(Advance::Completed(summary)) => {
                assert_eq!(summary.total_questions, 10);
                assert_eq!(summary.correct_answers, 10);
                assert!((summary.accuracy - 100.0).abs() < f32::EPSILON);
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn write_failures_are_reported_per_round() {
        // reads succeed, writes fail
        struct ReadOnly(MemoryStore);
        #[async_trait]
        impl VocabStore for ReadOnly {
            async fn list_words(&self) -> StoreResult<Vec<Word>> { self.0.list_words().await }
            async fn add_word(&self, w: NewWord) -> StoreResult<Word> { self.0.add_word(w).await }
            async fn add_words(&self, ws: Vec<NewWord>) -> StoreResult<Vec<Word>> { self.0.add_words(ws).await }
            async fn update_word(&self, _id: &str, _p: WordPatch) -> StoreResult<()> { Err(boom()) }
            async fn delete_word(&self, id: &str) -> StoreResult<()> { self.0.delete_word(id).await }
            async fn create_session(&self, r: NewSessionRecord) -> StoreResult<String> { self.0.create_session(r).await }
            async fn update_session(&self, _id: &str, _p: SessionPatch) -> StoreResult<()> { Err(boom()) }
            async fn recent_sessions(&self, limit: usize) -> StoreResult<Vec<StudySessionRecord>> { self.0.recent_sessions(limit).await }
        }

        let inner = MemoryStore::default();
        inner
            .add_words(SIX.iter().map(|(h, t, l)| NewWord::validated(h, t, d(*l), WordSource::Manual).unwrap()).collect())
            .await
            .unwrap();
        let mut s = session(Arc::new(ReadOnly(inner)), 6);
        s.start(StudyMode::Normal).await.unwrap();
        let quiz = s.current_quiz().unwrap().clone();
        let out = s.submit_answer(&quiz.correct_answer).await.unwrap();
        assert!(out.correct);
        assert_eq!(out.score.total, 1);
        assert_eq!(out.new_difficulty, None);
        assert_eq!(out.persistence_warnings.len(), 2);
        assert_eq!(s.phase(), Phase::Answered);
    }
}
