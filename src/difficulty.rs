//! Answer outcome → updated difficulty and counters.
//!
//! Stateless: a correct answer makes a word one step easier, a
//! wrong one makes it one step harder, clamped to 1..=4. There is no interval
//! scheduling here.

use chrono::{DateTime, Utc};

use crate::domain::{Difficulty, Word, WordPatch};

/// Symmetric ±1 step, clamped to the valid range.
pub fn next_difficulty(current: Difficulty, was_correct: bool) -> Difficulty {
  if was_correct { current.easier() } else { current.harder() }
}

/// Full per-round update for one word: difficulty, the matching counter and
/// the study timestamp. Applied as a single patch so they never drift apart.
pub fn answer_patch(word: &Word, was_correct: bool, at: DateTime<Utc>) -> WordPatch {
  let mut patch = WordPatch {
    difficulty: Some(next_difficulty(word.difficulty, was_correct)),
    last_studied: Some(at),
    ..Default::default()
  };
  if was_correct {
    patch.correct_count = Some(word.correct_count.saturating_add(1));
  } else {
    patch.incorrect_count = Some(word.incorrect_count.saturating_add(1));
  }
  patch
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::WordSource;

  fn d(n: u8) -> Difficulty { Difficulty::new(n).unwrap() }

  #[test]
  fn one_step_with_clamping() {
    for n in 1..=4u8 {
      assert_eq!(next_difficulty(d(n), true).get(), n.saturating_sub(1).max(1));
      assert_eq!(next_difficulty(d(n), false).get(), (n + 1).min(4));
    }
    assert_eq!(next_difficulty(d(1), true), d(1));
    assert_eq!(next_difficulty(d(4), false), d(4));
  }

  #[test]
  fn patch_touches_only_the_right_counter() {
    let now = Utc::now();
    let w = Word {
      id: "w1".into(),
      headword: "apple".into(),
      translation: "りんご".into(),
      difficulty: d(2),
      correct_count: 3,
      incorrect_count: 1,
      last_studied: None,
      created_at: now,
      source: WordSource::Manual,
    };

    let ok = answer_patch(&w, true, now);
    assert_eq!(ok.difficulty, Some(d(1)));
    assert_eq!(ok.correct_count, Some(4));
    assert_eq!(ok.incorrect_count, None);
    assert_eq!(ok.last_studied, Some(now));

    let bad = answer_patch(&w, false, now);
    assert_eq!(bad.difficulty, Some(d(3)));
    assert_eq!(bad.correct_count, None);
    assert_eq!(bad.incorrect_count, Some(2));
  }
}
