//! Bundled sample words: the fallback pool when the store is empty, unreadable,
//! or too small for the requested study mode.

use chrono::Utc;

use crate::config::SampleCfg;
use crate::domain::{Difficulty, Word, WordSource};

const SAMPLE_WORDS: &[(&str, &str, u8)] = &[
  ("apple", "りんご", 1),
  ("beautiful", "美しい", 2),
  ("challenge", "挑戦", 3),
  ("extraordinary", "並外れた", 4),
  ("library", "図書館", 1),
  ("borrow", "借りる", 2),
  ("consequence", "結果", 3),
  ("ambiguous", "曖昧な", 4),
];

fn sample_word(i: usize, headword: &str, translation: &str, difficulty: Difficulty) -> Word {
  Word {
    id: format!("sample-{}", i + 1),
    headword: headword.to_string(),
    translation: translation.to_string(),
    difficulty,
    correct_count: 0,
    incorrect_count: 0,
    last_studied: None,
    created_at: Utc::now(),
    source: WordSource::Sample,
  }
}

/// Minimal set of built-in words that keeps study mode usable with an empty store.
pub fn sample_words() -> Vec<Word> {
  SAMPLE_WORDS
    .iter()
    .enumerate()
    .map(|(i, (h, t, d))| sample_word(i, h, t, Difficulty::new(*d).unwrap_or_default()))
    .collect()
}

/// Sample set from config, or the bundled one when config provides none.
pub fn samples_from_config(cfg: &[SampleCfg]) -> Vec<Word> {
  let from_cfg: Vec<Word> = cfg
    .iter()
    .filter(|s| !s.headword.trim().is_empty() && !s.translation.trim().is_empty())
    .enumerate()
    .map(|(i, s)| sample_word(i, s.headword.trim(), s.translation.trim(), s.difficulty))
    .collect();
  if from_cfg.is_empty() { sample_words() } else { from_cfg }
}
