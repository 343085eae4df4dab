//! Multiple-choice quiz generation.
//!
//! Target is drawn uniformly from the pool; up to three distractors come from
//! the other words, shuffled. Options never contain the correct answer twice
//! and never repeat a distractor, so a small pool simply yields fewer options.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, instrument};

use crate::domain::{Quiz, Word};
use crate::error::StudyError;

/// Number of wrong options offered alongside the answer.
pub const DISTRACTOR_COUNT: usize = 3;

/// Build a quiz from `pool`, drawing target and option order from `rng`.
#[instrument(level = "debug", target = "study", skip(pool, rng), fields(pool_len = pool.len()))]
pub fn generate_quiz<R: Rng + ?Sized>(pool: &[Word], rng: &mut R) -> Result<Quiz, StudyError> {
  let target = pool.choose(rng).ok_or(StudyError::EmptyPool)?.clone();

  let mut others: Vec<&Word> = pool
    .iter()
    .filter(|w| w.id != target.id && w.translation != target.translation)
    .collect();
  others.shuffle(rng);

  let mut options = vec![target.translation.clone()];
  for w in others {
    if options.len() > DISTRACTOR_COUNT { break; }
    if !options.contains(&w.translation) {
      options.push(w.translation.clone());
    }
  }
  options.shuffle(rng);

  debug!(target: "study", word_id = %target.id, headword = %target.headword, options = options.len(), "Quiz generated");
  Ok(Quiz { correct_answer: target.translation.clone(), target, options })
}
