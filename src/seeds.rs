//! Seed data and small utilities related to default content.

use crate::domain::{SourceText, TextSource};

/// Minimal set of built-in paragraphs that guarantee the app can serve an
/// exercise even without external config or OpenAI.
pub fn seed_texts() -> Vec<SourceText> {
  vec![
    SourceText {
      title: "A Morning Routine".into(),
      difficulty: "a2".into(),
      source: TextSource::Seed,
      body: "Every morning I wake up at seven o'clock and open the window to let in \
             some fresh air. I make a cup of coffee and eat a small breakfast, usually \
             bread with cheese or an egg. After breakfast I take a short walk around \
             the block before I start my work for the day."
        .into(),
    },
    SourceText {
      title: "A Visit to the Park".into(),
      difficulty: "b1".into(),
      source: TextSource::Seed,
      body: "Last Sunday my sister and I visited the park near our house. The weather \
             was warm, so many families were sitting on the grass with picnic baskets. \
             We rented two bicycles and rode along the river for almost an hour. On the \
             way home we bought ice cream and talked about doing it again next weekend."
        .into(),
    },
  ]
}

/// Absolute last-resort fallback: if generation fails and all banks are
/// empty, we build the exercise from this text.
pub fn hard_fallback_text(difficulty: String) -> SourceText {
  SourceText {
    title: "Fallback Text".into(),
    difficulty,
    source: TextSource::Seed,
    body: "This is a standard text for debugging purposes. Basically, it provides a \
           consistent base for testing, the blanks generation, and checking logic. \
           You can modify this text in the configuration."
      .into(),
  }
}
