//! Cloze exercise core: blank selection, display assembly, word bank, grading.
//!
//! Flow:
//! 1) Split the source text on whitespace and classify eligible word tokens.
//! 2) Pick a blank count from the requested range (or a difficulty level).
//! 3) Select non-adjacent blank positions, falling back to plain random
//!    sampling when the pool runs dry.
//! 4) Rebuild the text with `BLANK_<position>` markers and shuffle a word bank
//!    (optionally padded with decoys drawn from the same text).
//! 5) Later, grade a submission against the recorded answers.
//!
//! Everything here is synchronous and pure: no I/O, no shared state, and the
//! random source is passed in so tests can pin a seed.

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::warn;

/// Punctuation characters considered when cleaning words and splitting
/// trailing punctuation off blanked tokens.
pub const PUNCTUATION: &str = ".!,?;:'\"()[]{}<>";

/// Prefix of positional placeholders in a display sequence. The suffix is the
/// zero-based token index of the hidden word. Source tokens are never allowed
/// to literally match this pattern (documented limitation).
pub const BLANK_PREFIX: &str = "BLANK_";

/// Recorded "correct" answer when a display marker has no entry in the blank
/// map. Such markers still count toward the total and always grade incorrect.
pub const MISSING_ANSWER: &str = "[MISSING]";

/// Difficulty level 1 maps to this percentage of words blanked.
pub const MIN_BLANK_PERCENTAGE: f64 = 5.0;
/// Difficulty level 10 maps to this percentage of words blanked.
pub const MAX_BLANK_PERCENTAGE: f64 = 25.0;

fn is_punctuation(ch: char) -> bool {
  PUNCTUATION.contains(ch)
}

/// Strip the punctuation set from both ends of a word. Internal punctuation
/// (hyphens, apostrophes) is left alone.
pub fn strip_punctuation(word: &str) -> &str {
  word.trim_matches(is_punctuation)
}

/// Split a token into its word part and the maximal trailing punctuation run.
/// `"dog,"` becomes `("dog", ",")`; `"dog"` becomes `("dog", "")`.
pub fn split_trailing_punctuation(word: &str) -> (&str, &str) {
  let mut cut = word.len();
  for (i, ch) in word.char_indices().rev() {
    if is_punctuation(ch) {
      cut = i;
    } else {
      break;
    }
  }
  word.split_at(cut)
}

/// Word classifier: the ordered subsequence of `(position, token)` pairs whose
/// token, after stripping edge punctuation and ignoring internal `-`/`'`,
/// consists entirely of letters. Numbers, symbols and bare punctuation are
/// never eligible. An empty result means "cannot build an exercise from this
/// text" and callers degrade to the canned fallback.
pub fn eligible_words<'a>(tokens: &[&'a str]) -> Vec<(usize, &'a str)> {
  let mut population = Vec::new();
  for (idx, token) in tokens.iter().enumerate() {
    let cleaned = strip_punctuation(token);
    let mut has_letter = false;
    let mut alphabetic = true;
    for ch in cleaned.chars() {
      if ch == '-' || ch == '\'' {
        continue;
      }
      if ch.is_alphabetic() {
        has_letter = true;
      } else {
        alphabetic = false;
        break;
      }
    }
    if alphabetic && has_letter {
      // Keep the raw token; values are stripped at selection time.
      population.push((idx, *token));
    }
  }
  population
}

/// Blank count policy: draw a count from `[min_blanks, max_blanks]`, both
/// capped at half the eligible population (but never below 1). If the capped
/// minimum exceeds the capped maximum, the minimum wins. A draw of zero is
/// bumped to 1 whenever blanking is possible at all.
pub fn determine_blank_count<R: Rng + ?Sized>(
  rng: &mut R,
  eligible_count: usize,
  min_blanks: usize,
  max_blanks: usize,
) -> usize {
  if eligible_count == 0 {
    return 0;
  }
  let max_possible = std::cmp::max(1, eligible_count / 2);
  let lo = min_blanks.min(max_possible);
  let hi = max_blanks.min(max_possible);
  let count = if lo > hi { lo } else { rng.gen_range(lo..=hi) };
  if count == 0 {
    1
  } else {
    count
  }
}

/// Map a difficulty level (1..=10, clamped) onto a `(min, max)` blank range
/// for a text of `word_count` words. The level interpolates linearly between
/// [`MIN_BLANK_PERCENTAGE`] and [`MAX_BLANK_PERCENTAGE`]; the resulting
/// percentage is applied with a ±20% spread.
pub fn blank_range_for_difficulty(level: u8, word_count: usize) -> (usize, usize) {
  let step = f64::from(level.clamp(1, 10) - 1) / 9.0;
  let pct =
    (MIN_BLANK_PERCENTAGE + step * (MAX_BLANK_PERCENTAGE - MIN_BLANK_PERCENTAGE)) / 100.0;
  let words = word_count as f64;
  let min_blanks = std::cmp::max(1, (words * pct * 0.8) as usize);
  let max_blanks = std::cmp::max(min_blanks + 1, (words * pct * 1.2) as usize);
  (min_blanks, max_blanks)
}

/// Primary strategy: pick words one at a time, removing each pick and its
/// immediate neighbors from the pool so no two blanks touch. May under-fill
/// when the pool empties early.
fn select_non_adjacent<R: Rng + ?Sized>(
  rng: &mut R,
  population: &[(usize, &str)],
  count: usize,
) -> BTreeMap<usize, String> {
  let mut blanks = BTreeMap::new();
  let mut available: Vec<(usize, &str)> = population.to_vec();

  for _ in 0..count {
    let (pos, word) = match available.choose(rng) {
      Some(&item) => item,
      None => break,
    };
    blanks.insert(pos, strip_punctuation(word).to_string());
    available.retain(|&(idx, _)| idx + 1 != pos && idx != pos && idx != pos + 1);
  }
  blanks
}

/// Fallback strategy: a plain distinct random sample from the full pool,
/// with no adjacency constraint.
fn select_random<R: Rng + ?Sized>(
  rng: &mut R,
  population: &[(usize, &str)],
  count: usize,
) -> BTreeMap<usize, String> {
  population
    .choose_multiple(rng, count)
    .map(|&(pos, word)| (pos, strip_punctuation(word).to_string()))
    .collect()
}

/// Blank selector: non-adjacent first, random fallback when the primary
/// strategy cannot reach `count`. Values are edge-punctuation-stripped copies
/// of the chosen tokens, keyed by original token position.
pub fn select_blanks<R: Rng + ?Sized>(
  rng: &mut R,
  population: &[(usize, &str)],
  count: usize,
) -> BTreeMap<usize, String> {
  if count == 0 || population.is_empty() {
    return BTreeMap::new();
  }
  let blanks = select_non_adjacent(rng, population, count);
  if blanks.len() < count {
    warn!(
      target: "exercise",
      wanted = count,
      got = blanks.len(),
      "non-adjacent selection under-filled; falling back to random sampling"
    );
    return select_random(rng, population, count);
  }
  blanks
}

/// Display assembler: one entry per source token, with blanked positions
/// replaced by a `BLANK_<position>` marker. Trailing punctuation of a blanked
/// token survives as a separate entry right after its marker.
pub fn assemble_display(tokens: &[&str], blanks: &BTreeMap<usize, String>) -> Vec<String> {
  let mut parts = Vec::with_capacity(tokens.len());
  for (idx, token) in tokens.iter().enumerate() {
    if blanks.contains_key(&idx) {
      let (_, punctuation) = split_trailing_punctuation(token);
      parts.push(format!("{}{}", BLANK_PREFIX, idx));
      if !punctuation.is_empty() {
        parts.push(punctuation.to_string());
      }
    } else {
      parts.push((*token).to_string());
    }
  }
  parts
}

/// Decode the position of a placeholder entry, or `None` for ordinary tokens
/// and malformed markers.
pub fn decode_blank_position(part: &str) -> Option<usize> {
  part.strip_prefix(BLANK_PREFIX)?.parse().ok()
}

/// Eligible words of the text that are usable as decoys: not an answer
/// (case-insensitive), longer than 2 characters once stripped, deduplicated
/// case-insensitively keeping the first spelling seen.
fn decoy_candidates(blanks: &BTreeMap<usize, String>, tokens: &[&str]) -> Vec<String> {
  let answers: HashSet<String> = blanks.values().map(|w| w.to_lowercase()).collect();
  let mut seen = HashSet::new();
  let mut candidates = Vec::new();
  for (_, word) in eligible_words(tokens) {
    let cleaned = strip_punctuation(word);
    if cleaned.chars().count() <= 2 {
      continue;
    }
    let lower = cleaned.to_lowercase();
    if answers.contains(&lower) || !seen.insert(lower) {
      continue;
    }
    candidates.push(cleaned.to_string());
  }
  candidates
}

/// Word bank builder: the blank answers, optionally padded with 50–75% extra
/// decoys drawn from the same text, shuffled for presentation. The bank
/// carries no positional information and the grader never consults it.
pub fn build_word_bank<R: Rng + ?Sized>(
  rng: &mut R,
  blanks: &BTreeMap<usize, String>,
  include_decoys: bool,
  tokens: &[&str],
) -> Vec<String> {
  let mut bank: Vec<String> = blanks.values().cloned().collect();

  if include_decoys && !bank.is_empty() {
    let candidates = decoy_candidates(blanks, tokens);
    if !candidates.is_empty() {
      let lo = std::cmp::max(1, bank.len() / 2);
      let hi = std::cmp::max(lo, bank.len() * 3 / 4);
      let wanted = rng.gen_range(lo..=hi).min(candidates.len());
      bank.extend(candidates.choose_multiple(rng, wanted).cloned());
    }
  }

  bank.shuffle(rng);
  bank
}

/// Everything the caller must persist between generation and grading.
#[derive(Clone, Debug, Serialize)]
pub struct GeneratedExercise {
  pub display_parts: Vec<String>,
  pub blanks: BTreeMap<usize, String>,
  pub word_bank: Vec<String>,
}

/// Canned exercise served when the input text yields nothing to blank.
/// Always valid and internally consistent, so the caller can render it
/// without special-casing.
pub fn fallback_exercise() -> GeneratedExercise {
  let mut blanks = BTreeMap::new();
  blanks.insert(4, "fallback".to_string());
  GeneratedExercise {
    display_parts: vec![
      "This".into(),
      "is".into(),
      "a".into(),
      "simple".into(),
      format!("{}4", BLANK_PREFIX),
      "text.".into(),
    ],
    blanks,
    word_bank: vec!["fallback".into()],
  }
}

/// Generate a complete exercise from raw text and a fixed blank range.
/// Never fails: unusable input degrades to [`fallback_exercise`].
pub fn generate_exercise<R: Rng + ?Sized>(
  rng: &mut R,
  text: &str,
  min_blanks: usize,
  max_blanks: usize,
  include_decoys: bool,
) -> GeneratedExercise {
  let tokens: Vec<&str> = text.split_whitespace().collect();
  let population = eligible_words(&tokens);
  let count = determine_blank_count(rng, population.len(), min_blanks, max_blanks);
  let blanks = select_blanks(rng, &population, count);

  if blanks.is_empty() {
    warn!(
      target: "exercise",
      tokens = tokens.len(),
      eligible = population.len(),
      "no blanks could be selected; serving canned fallback exercise"
    );
    return fallback_exercise();
  }

  let display_parts = assemble_display(&tokens, &blanks);
  let word_bank = build_word_bank(rng, &blanks, include_decoys, &tokens);
  GeneratedExercise { display_parts, blanks, word_bank }
}

/// Difficulty-driven variant: map the 1..=10 level onto a percentage of the
/// text's word count, then run the range-based generator.
pub fn generate_exercise_by_difficulty<R: Rng + ?Sized>(
  rng: &mut R,
  text: &str,
  level: u8,
  include_decoys: bool,
) -> GeneratedExercise {
  let word_count = text.split_whitespace().count();
  let (min_blanks, max_blanks) = blank_range_for_difficulty(level, word_count);
  generate_exercise(rng, text, min_blanks, max_blanks, include_decoys)
}

/// Per-blank grading verdict.
#[derive(Clone, Debug, Serialize)]
pub struct BlankVerdict {
  pub user: String,
  pub correct: String,
  pub is_correct: bool,
}

/// Aggregate grading outcome. `total` counts the markers actually present in
/// the display sequence, so a display/blank-map mismatch shows up as graded
/// `[MISSING]` entries instead of silently shrinking the denominator.
#[derive(Clone, Debug, Serialize)]
pub struct GradingResult {
  pub results: BTreeMap<usize, BlankVerdict>,
  pub score: usize,
  pub total: usize,
}

/// Grader: walk the display sequence, decode every marker, and compare the
/// submitted answer (missing means empty) against the recorded one. The
/// comparison trims whitespace and ignores case.
pub fn grade_submission(
  submitted: &HashMap<usize, String>,
  blanks: &BTreeMap<usize, String>,
  display_parts: &[String],
) -> GradingResult {
  let mut results = BTreeMap::new();
  let mut score = 0;
  let mut total = 0;

  for part in display_parts {
    let pos = match decode_blank_position(part) {
      Some(pos) => pos,
      None => {
        if part.starts_with(BLANK_PREFIX) {
          warn!(target: "exercise", %part, "unparseable blank marker in display sequence; skipping");
        }
        continue;
      }
    };
    total += 1;

    let user = submitted.get(&pos).map(String::as_str).unwrap_or("");
    match blanks.get(&pos) {
      Some(correct) => {
        let is_correct = user.trim().to_lowercase() == correct.trim().to_lowercase();
        if is_correct {
          score += 1;
        }
        results.insert(
          pos,
          BlankVerdict { user: user.to_string(), correct: correct.clone(), is_correct },
        );
      }
      None => {
        warn!(target: "exercise", position = pos, "blank marker without a recorded answer");
        results.insert(
          pos,
          BlankVerdict {
            user: user.to_string(),
            correct: MISSING_ANSWER.to_string(),
            is_correct: false,
          },
        );
      }
    }
  }

  GradingResult { results, score, total }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  const SCENARIO_TEXT: &str = "The quick brown fox jumps over the lazy dog and runs \
                               fast every single morning without stopping at all";

  fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
  }

  fn tokens(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
  }

  #[test]
  fn classifier_keeps_only_alphabetic_words() {
    let toks = tokens("Hello, world! 42 well-being don't --- (quote) a1b");
    let population = eligible_words(&toks);
    let words: Vec<&str> = population.iter().map(|&(_, w)| w).collect();
    assert_eq!(words, vec!["Hello,", "world!", "well-being", "don't", "(quote)"]);
    // Positions refer back into the original token sequence.
    assert_eq!(population[0].0, 0);
    assert_eq!(population[4].0, 6);
  }

  #[test]
  fn classifier_returns_empty_for_unusable_text() {
    assert!(eligible_words(&tokens("123 456 !!! ...")).is_empty());
    assert!(eligible_words(&tokens("")).is_empty());
  }

  #[test]
  fn punctuation_split_consumes_maximal_trailing_run() {
    assert_eq!(split_trailing_punctuation("dog,"), ("dog", ","));
    assert_eq!(split_trailing_punctuation("end.\")"), ("end", ".\")"));
    assert_eq!(split_trailing_punctuation("plain"), ("plain", ""));
    assert_eq!(split_trailing_punctuation("..."), ("", "..."));
  }

  #[test]
  fn blank_count_respects_half_population_cap() {
    let mut r = rng(1);
    for _ in 0..50 {
      let n = determine_blank_count(&mut r, 20, 3, 15);
      assert!((3..=10).contains(&n), "count {n} outside [3, 10]");
    }
  }

  #[test]
  fn blank_count_of_tiny_population_is_one() {
    // population 1 => max_possible = max(1, 0) = 1, so the range [3,5]
    // collapses to exactly 1.
    let mut r = rng(2);
    assert_eq!(determine_blank_count(&mut r, 1, 3, 5), 1);
  }

  #[test]
  fn blank_count_never_zero_when_blanking_possible() {
    let mut r = rng(3);
    for _ in 0..50 {
      assert_eq!(determine_blank_count(&mut r, 8, 0, 0), 1);
    }
  }

  #[test]
  fn blank_count_zero_population_yields_zero() {
    let mut r = rng(4);
    assert_eq!(determine_blank_count(&mut r, 0, 3, 5), 0);
  }

  #[test]
  fn blank_count_min_wins_when_range_inverts() {
    let mut r = rng(5);
    for _ in 0..50 {
      assert_eq!(determine_blank_count(&mut r, 100, 7, 3), 7);
    }
  }

  #[test]
  fn difficulty_range_grows_with_level() {
    let (lo1, hi1) = blank_range_for_difficulty(1, 100);
    let (lo10, hi10) = blank_range_for_difficulty(10, 100);
    assert!(lo1 >= 1);
    assert!(hi1 > lo1);
    assert!(lo10 > lo1);
    assert!(hi10 > hi1);
    // 5% of 100 words: 4..=6. 25% of 100 words: 20..=30.
    assert_eq!((lo1, hi1), (4, 6));
    assert_eq!((lo10, hi10), (20, 30));
  }

  #[test]
  fn difficulty_range_clamps_out_of_scale_levels() {
    assert_eq!(blank_range_for_difficulty(0, 100), blank_range_for_difficulty(1, 100));
    assert_eq!(blank_range_for_difficulty(99, 100), blank_range_for_difficulty(10, 100));
  }

  #[test]
  fn difficulty_range_floors_at_one_and_min_plus_one() {
    let (lo, hi) = blank_range_for_difficulty(1, 4);
    assert_eq!((lo, hi), (1, 2));
  }

  #[test]
  fn non_adjacent_selection_never_picks_neighbors() {
    let toks = tokens(SCENARIO_TEXT);
    let population = eligible_words(&toks);
    for seed in 0..40 {
      let mut r = rng(seed);
      let blanks = select_non_adjacent(&mut r, &population, 5);
      let positions: Vec<usize> = blanks.keys().copied().collect();
      for pair in positions.windows(2) {
        assert!(pair[1] - pair[0] >= 2, "adjacent blanks at {:?} (seed {seed})", pair);
      }
    }
  }

  #[test]
  fn selection_falls_back_when_pool_too_tight() {
    // Three consecutive eligible words cannot host three non-adjacent blanks;
    // the random fallback must still deliver exactly three.
    let population = vec![(0, "one"), (1, "two"), (2, "three")];
    for seed in 0..20 {
      let mut r = rng(seed);
      let blanks = select_blanks(&mut r, &population, 3);
      assert_eq!(blanks.len(), 3);
    }
  }

  #[test]
  fn selection_strips_edge_punctuation_from_answers() {
    let population = vec![(0, "\"Quoted,\""), (2, "(parens)")];
    let mut r = rng(6);
    let blanks = select_blanks(&mut r, &population, 2);
    assert_eq!(blanks[&0], "Quoted");
    assert_eq!(blanks[&2], "parens");
  }

  #[test]
  fn selection_handles_degenerate_requests() {
    let population = vec![(0, "word")];
    let mut r = rng(7);
    assert!(select_blanks(&mut r, &population, 0).is_empty());
    assert!(select_blanks(&mut r, &[], 3).is_empty());
    // Asking for more than the pool holds still returns the whole pool.
    assert_eq!(select_blanks(&mut r, &population, 5).len(), 1);
  }

  #[test]
  fn display_markers_reproduce_blank_keys_exactly() {
    let toks = tokens("She walked home, fed the cat, and slept.");
    let mut blanks = BTreeMap::new();
    blanks.insert(2, "home".to_string());
    blanks.insert(5, "cat".to_string());
    let parts = assemble_display(&toks, &blanks);

    let decoded: Vec<usize> =
      parts.iter().filter_map(|p| decode_blank_position(p)).collect();
    assert_eq!(decoded, vec![2, 5]);
    // Trailing commas survive as their own entries after the markers.
    assert_eq!(parts[2], "BLANK_2");
    assert_eq!(parts[3], ",");
    assert_eq!(parts[6], "BLANK_5");
    assert_eq!(parts[7], ",");
    assert_eq!(parts.len(), toks.len() + 2);
  }

  #[test]
  fn marker_decoding_rejects_lookalikes() {
    assert_eq!(decode_blank_position("BLANK_12"), Some(12));
    assert_eq!(decode_blank_position("BLANK_"), None);
    assert_eq!(decode_blank_position("BLANK_x"), None);
    assert_eq!(decode_blank_position("blank_3"), None);
    assert_eq!(decode_blank_position("word"), None);
  }

  #[test]
  fn word_bank_without_decoys_is_a_permutation_of_answers() {
    let toks = tokens(SCENARIO_TEXT);
    let mut r = rng(8);
    let population = eligible_words(&toks);
    let blanks = select_blanks(&mut r, &population, 4);
    let bank = build_word_bank(&mut r, &blanks, false, &toks);

    let mut expected: Vec<String> = blanks.values().cloned().collect();
    let mut got = bank.clone();
    expected.sort();
    got.sort();
    assert_eq!(got, expected);
  }

  #[test]
  fn word_bank_decoys_exclude_answers_and_short_words() {
    let toks = tokens(SCENARIO_TEXT);
    for seed in 0..30 {
      let mut r = rng(seed);
      let population = eligible_words(&toks);
      let blanks = select_blanks(&mut r, &population, 4);
      let bank = build_word_bank(&mut r, &blanks, true, &toks);
      assert!(bank.len() >= blanks.len());

      // Remove each answer exactly once; the remainder are decoys.
      let mut rest = bank.clone();
      for answer in blanks.values() {
        let at = rest.iter().position(|w| w == answer);
        assert!(at.is_some(), "answer {answer} missing from bank (seed {seed})");
        rest.remove(at.unwrap());
      }
      for decoy in &rest {
        assert!(decoy.chars().count() > 2, "short decoy {decoy}");
        assert!(
          !blanks.values().any(|a| a.eq_ignore_ascii_case(decoy)),
          "decoy {decoy} duplicates an answer (seed {seed})"
        );
      }
    }
  }

  #[test]
  fn generated_exercise_is_internally_consistent() {
    for seed in 0..30 {
      let mut r = rng(seed);
      let ex = generate_exercise(&mut r, SCENARIO_TEXT, 3, 5, false);

      assert!((3..=5).contains(&ex.blanks.len()), "seed {seed}");
      assert!(ex.display_parts.len() >= 15);

      let decoded: HashSet<usize> =
        ex.display_parts.iter().filter_map(|p| decode_blank_position(p)).collect();
      let keys: HashSet<usize> = ex.blanks.keys().copied().collect();
      assert_eq!(decoded, keys, "seed {seed}");

      for answer in ex.blanks.values() {
        assert!(!answer.is_empty());
        assert!(!answer.starts_with(is_punctuation));
        assert!(!answer.ends_with(is_punctuation));
      }
    }
  }

  #[test]
  fn generated_blank_count_stays_within_half_of_eligible() {
    let text = "one two three four five six seven eight";
    for seed in 0..30 {
      let mut r = rng(seed);
      let ex = generate_exercise(&mut r, text, 1, 100, false);
      assert!(!ex.blanks.is_empty());
      assert!(ex.blanks.len() <= 4, "seed {seed}: {} blanks", ex.blanks.len());
    }
  }

  #[test]
  fn empty_text_degrades_to_canned_fallback() {
    let mut r = rng(9);
    let ex = generate_exercise(&mut r, "", 3, 5, true);
    assert_eq!(ex.blanks.len(), 1);
    assert_eq!(ex.word_bank, vec!["fallback".to_string()]);

    let decoded: Vec<usize> =
      ex.display_parts.iter().filter_map(|p| decode_blank_position(p)).collect();
    assert_eq!(decoded, ex.blanks.keys().copied().collect::<Vec<_>>());
  }

  #[test]
  fn punctuation_only_text_degrades_to_canned_fallback() {
    let mut r = rng(10);
    let ex = generate_exercise(&mut r, "123 ... 456 !!!", 3, 5, false);
    assert_eq!(ex.blanks.len(), 1);
    assert_eq!(ex.blanks[&4], "fallback");
  }

  #[test]
  fn same_seed_reproduces_the_same_selection() {
    let a = generate_exercise(&mut rng(42), SCENARIO_TEXT, 3, 5, true);
    let b = generate_exercise(&mut rng(42), SCENARIO_TEXT, 3, 5, true);
    assert_eq!(a.blanks, b.blanks);
    assert_eq!(a.display_parts, b.display_parts);
    assert_eq!(a.word_bank, b.word_bank);
  }

  #[test]
  fn difficulty_variant_blanks_more_at_higher_levels() {
    let text = SCENARIO_TEXT.repeat(8);
    let low = generate_exercise_by_difficulty(&mut rng(11), &text, 1, false);
    let high = generate_exercise_by_difficulty(&mut rng(11), &text, 10, false);
    assert!(high.blanks.len() > low.blanks.len());
  }

  #[test]
  fn grading_all_correct_answers_scores_full() {
    let mut r = rng(12);
    let ex = generate_exercise(&mut r, SCENARIO_TEXT, 3, 5, false);
    let submitted: HashMap<usize, String> =
      ex.blanks.iter().map(|(&p, w)| (p, w.clone())).collect();

    let graded = grade_submission(&submitted, &ex.blanks, &ex.display_parts);
    assert_eq!(graded.score, graded.total);
    assert_eq!(graded.total, ex.blanks.len());
    assert!(graded.results.values().all(|v| v.is_correct));
  }

  #[test]
  fn grading_ignores_case_and_surrounding_whitespace() {
    let mut blanks = BTreeMap::new();
    blanks.insert(0, "cat".to_string());
    let display = vec!["BLANK_0".to_string()];
    let submitted = HashMap::from([(0, " Cat ".to_string())]);

    let graded = grade_submission(&submitted, &blanks, &display);
    assert_eq!(graded.score, 1);
    assert_eq!(graded.total, 1);
    assert!(graded.results[&0].is_correct);
  }

  #[test]
  fn grading_treats_missing_submissions_as_wrong() {
    let mut blanks = BTreeMap::new();
    blanks.insert(0, "cat".to_string());
    blanks.insert(2, "dog".to_string());
    let display = vec!["BLANK_0".to_string(), "and".to_string(), "BLANK_2".to_string()];
    let submitted = HashMap::from([(0, "cat".to_string())]);

    let graded = grade_submission(&submitted, &blanks, &display);
    assert_eq!(graded.score, 1);
    assert_eq!(graded.total, 2);
    assert!(!graded.results[&2].is_correct);
    assert_eq!(graded.results[&2].user, "");
  }

  #[test]
  fn grading_surfaces_display_blank_mismatches() {
    // A marker with no recorded answer still counts toward the total and is
    // graded with the missing sentinel.
    let blanks = BTreeMap::new();
    let display = vec!["BLANK_7".to_string()];
    let submitted = HashMap::from([(7, "anything".to_string())]);

    let graded = grade_submission(&submitted, &blanks, &display);
    assert_eq!(graded.score, 0);
    assert_eq!(graded.total, 1);
    assert_eq!(graded.results[&7].correct, MISSING_ANSWER);
    assert!(!graded.results[&7].is_correct);
  }

  #[test]
  fn grading_skips_malformed_markers() {
    let mut blanks = BTreeMap::new();
    blanks.insert(0, "cat".to_string());
    let display =
      vec!["BLANK_0".to_string(), "BLANK_oops".to_string(), "word".to_string()];
    let submitted = HashMap::from([(0, "cat".to_string())]);

    let graded = grade_submission(&submitted, &blanks, &display);
    assert_eq!(graded.total, 1);
    assert_eq!(graded.score, 1);
  }

  #[test]
  fn fallback_exercise_grades_cleanly() {
    let ex = fallback_exercise();
    let submitted: HashMap<usize, String> =
      ex.blanks.iter().map(|(&p, w)| (p, w.clone())).collect();
    let graded = grade_submission(&submitted, &ex.blanks, &ex.display_parts);
    assert_eq!(graded.score, 1);
    assert_eq!(graded.total, 1);
  }
}
