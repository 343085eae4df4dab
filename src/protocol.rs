//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//! Quiz DTOs never carry the correct answer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CandidatePair, Difficulty, Quiz, StudyMode, StudySessionRecord, Word, WordSource};
use crate::session::{AnswerOutcome, Phase, SessionSummary};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Extract {
        text: String,
    },
    Ocr {
        #[serde(rename = "imageBase64")]
        image_base64: String,
        mime: String,
    },
    StartStudy {
        mode: StudyMode,
    },
    SubmitAnswer {
        choice: String,
    },
    Next,
    Restart,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Pairs {
        pairs: Vec<CandidatePair>,
    },
    OcrResult {
        text: String,
        pairs: Vec<CandidatePair>,
    },
    Quiz {
        quiz: QuizOut,
    },
    AnswerResult {
        result: AnswerOut,
    },
    Completed {
        summary: SessionSummary,
    },
    Restarted,
    Error {
        message: String,
    },
}

/// Word as exposed to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordOut {
    pub id: String,
    pub headword: String,
    pub translation: String,
    pub difficulty: Difficulty,
    pub difficulty_label: &'static str,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub last_studied: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub source: WordSource,
}

pub fn word_out(w: &Word) -> WordOut {
    WordOut {
        id: w.id.clone(),
        headword: w.headword.clone(),
        translation: w.translation.clone(),
        difficulty: w.difficulty,
        difficulty_label: w.difficulty.label_ja(),
        correct_count: w.correct_count,
        incorrect_count: w.incorrect_count,
        last_studied: w.last_studied,
        created_at: w.created_at,
        source: w.source,
    }
}

/// One quiz round for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOut {
    pub word_id: String,
    pub headword: String,
    pub difficulty: Difficulty,
    pub options: Vec<String>,
    /// 1-based number of this round.
    pub round: u32,
    pub round_cap: u32,
}

pub fn quiz_out(q: &Quiz, answered: u32, round_cap: u32) -> QuizOut {
    QuizOut {
        word_id: q.target.id.clone(),
        headword: q.target.headword.clone(),
        difficulty: q.target.difficulty,
        options: q.options.clone(),
        round: answered + 1,
        round_cap,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
    pub id: String,
    pub mode: StudyMode,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub accuracy: f32,
    pub words_studied: Vec<String>,
    pub completed: bool,
}

pub fn session_out(s: &StudySessionRecord) -> SessionOut {
    SessionOut {
        id: s.id.clone(),
        mode: s.mode,
        start_time: s.start_time,
        end_time: s.end_time,
        total_questions: s.total_questions,
        correct_answers: s.correct_answers,
        accuracy: s.accuracy(),
        words_studied: s.words_studied.clone(),
        completed: s.end_time.is_some(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Deserialize)]
pub struct ExtractIn {
    pub text: String,
}
#[derive(Debug, Serialize)]
pub struct ExtractOut {
    pub pairs: Vec<CandidatePair>,
}

#[derive(Deserialize)]
pub struct OcrIn {
    #[serde(rename = "imageBase64")]
    pub image_base64: String,
    pub mime: String,
}
#[derive(Debug, Serialize)]
pub struct OcrOut {
    pub text: String,
    pub pairs: Vec<CandidatePair>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordsQuery {
    /// Exact level.
    pub difficulty: Option<u8>,
    /// Level at or above.
    pub min_difficulty: Option<u8>,
}

#[derive(Deserialize)]
pub struct AddWordIn {
    pub headword: String,
    pub translation: String,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

#[derive(Deserialize)]
pub struct ImportIn {
    pub pairs: Vec<CandidatePair>,
}

#[derive(Default, Deserialize)]
pub struct EditWordIn {
    #[serde(default)]
    pub headword: Option<String>,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct StartIn {
    pub mode: StudyMode,
}
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOut {
    pub session_key: String,
    /// Persisted record id; absent when the store could not create one.
    pub record_id: Option<String>,
    pub quiz: QuizOut,
}

#[derive(Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "sessionKey")]
    pub session_key: String,
    pub choice: String,
}
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOut {
    #[serde(flatten)]
    pub outcome: AnswerOutcome,
    pub phase: Phase,
}

#[derive(Deserialize)]
pub struct SessionKeyIn {
    #[serde(rename = "sessionKey")]
    pub session_key: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextOut {
    Next { quiz: QuizOut },
    Completed { summary: SessionSummary },
}

#[derive(Debug, Serialize)]
pub struct OkOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub ocr: bool,
    #[serde(rename = "liveSessions")]
    pub live_sessions: usize,
}
