//! Raw OCR text → candidate English/Japanese vocabulary pairs.
//!
//! Each non-empty line is tried against a cascade of patterns, most specific
//! first; the first rule that yields a long-enough headword and a non-empty
//! translation wins and the rest are skipped. Lines matching nothing are noise
//! (headers, page numbers, stray punctuation) and are dropped silently.
//!
//! Example:
//!   input : "apple: りんご\nxyz\nbeautiful  美しい"
//!   output: [apple/りんご, beautiful/美しい]

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, instrument};

use crate::domain::CandidatePair;

/// Characters accepted inside a translation run: hiragana, katakana, the
/// prolonged-sound mark, kanji (incl. 々 and 〆) and common Japanese punctuation.
const TRANSLATION_CLASS: &str = "[ぁ-ゖゝゞァ-ヺーヽヾ・一-鿿々〆、。！？「」〜]";

/// Headwords shorter than this are treated as OCR noise.
const MIN_HEADWORD_CHARS: usize = 2;
const MIN_TRANSLATION_CHARS: usize = 1;

struct Rule {
  name: &'static str,
  re: Regex,
}

fn rules() -> &'static [Rule] {
  static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
  RULES.get_or_init(|| {
    let specs = [
      // "apple : りんご", "apple - りんご", "apple：りんご"
      ("separator", format!(r"([A-Za-z]+)\s*[:：\-–\s]+\s*({TRANSLATION_CLASS}+)")),
      // "apple   りんご"
      ("whitespace", format!(r"([A-Za-z]+)\s+({TRANSLATION_CLASS}+)")),
      // "appleりんご"
      ("adjacent", format!(r"([A-Za-z]+)\s*({TRANSLATION_CLASS}+)")),
    ];
    specs
      .into_iter()
      .filter_map(|(name, pattern)| match Regex::new(&pattern) {
        Ok(re) => Some(Rule { name, re }),
        Err(e) => {
          tracing::error!(target: "extract", rule = name, error = %e, "Invalid extraction pattern; rule disabled");
          None
        }
      })
      .collect()
  })
}

/// Try the rule cascade on a single (already trimmed) line.
fn match_line(line: &str) -> Option<(&'static str, CandidatePair)> {
  for rule in rules() {
    let Some(caps) = rule.re.captures(line) else { continue };
    let (Some(h), Some(t)) = (caps.get(1), caps.get(2)) else { continue };
    let headword = h.as_str().trim();
    let translation = t.as_str().trim();
    if headword.chars().count() >= MIN_HEADWORD_CHARS && translation.chars().count() >= MIN_TRANSLATION_CHARS {
      return Some((
        rule.name,
        CandidatePair { headword: headword.to_string(), translation: translation.to_string() },
      ));
    }
  }
  None
}

/// Extract candidate pairs from raw OCR output.
///
/// Pure and total: malformed input yields fewer pairs, never an error.
/// Output follows input line order; duplicates are kept.
#[instrument(level = "debug", target = "extract", skip(raw_text), fields(text_len = raw_text.len()))]
pub fn extract_pairs(raw_text: &str) -> Vec<CandidatePair> {
  let mut out = Vec::new();
  let mut skipped = 0usize;

  for line in raw_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
    match match_line(line) {
      Some((rule, pair)) => {
        debug!(target: "extract", rule, headword = %pair.headword, translation = %pair.translation, "Line matched");
        out.push(pair);
      }
      None => skipped += 1,
    }
  }

  debug!(target: "extract", pairs = out.len(), skipped, "Extraction finished");
  out
}
