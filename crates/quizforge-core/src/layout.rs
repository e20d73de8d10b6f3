//! Per-question display layouts derived once per session.
//!
//! Matching questions get a shuffled order for their right-hand values and
//! fill-in-the-blank questions get their text split around the blank
//! markers. Both are computed at session start and never recomputed on read.

use rand::Rng;
use serde::Serialize;

use crate::error::QuizError;
use crate::model::{Question, QuestionKind};

/// Minimum run of underscores that counts as a blank marker.
pub const MIN_MARKER_LEN: usize = 3;

/// Uniform in-place Fisher–Yates shuffle. O(n), every permutation equally likely.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Fill-in-the-blank text split on its markers.
///
/// Holds `blank_count() + 1` literal segments; blank `i` sits between
/// segment `i` and segment `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlankTemplate {
    segments: Vec<String>,
}

impl BlankTemplate {
    /// Split `text` on every run of three or more underscores.
    pub fn scan(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut segments = Vec::new();
        let mut segment_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'_' {
                i += 1;
                continue;
            }
            let run_start = i;
            while i < bytes.len() && bytes[i] == b'_' {
                i += 1;
            }
            if i - run_start >= MIN_MARKER_LEN {
                segments.push(text[segment_start..run_start].to_string());
                segment_start = i;
            }
        }
        segments.push(text[segment_start..].to_string());

        Self { segments }
    }

    /// Split `text` and require exactly `expected` blanks.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Validation` on field `blanks` if the marker count differs.
    pub fn parse(text: &str, expected: usize) -> Result<Self, QuizError> {
        let template = Self::scan(text);
        if template.blank_count() != expected {
            return Err(QuizError::validation(
                "blanks",
                format!(
                    "text has {} blank marker(s) but {expected} accepted answer(s)",
                    template.blank_count()
                ),
            ));
        }
        Ok(template)
    }

    pub fn blank_count(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Rebuild the text, replacing blank `i` with `fill(i)`.
    pub fn render_with(&self, mut fill: impl FnMut(usize) -> String) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push_str(&fill(i - 1));
            }
            out.push_str(segment);
        }
        out
    }
}

/// Display structure derived for one question at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionLayout {
    /// Nothing to derive; render the question as authored.
    Standard,
    /// Right-hand values in the order they are shown for this session.
    Matching { right_order: Vec<String> },
    FillInBlank { template: BlankTemplate },
}

impl QuestionLayout {
    /// Derive the layout for `question`. Matching right values are shuffled
    /// with `rng` when `shuffle` is set.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Validation` if a blank template does not line up
    /// with the accepted answers.
    pub fn derive<R: Rng + ?Sized>(
        question: &Question,
        rng: &mut R,
        shuffle: bool,
    ) -> Result<Self, QuizError> {
        match &question.kind {
            QuestionKind::Matching { pairs } => {
                let mut right_order: Vec<String> = pairs.iter().map(|p| p.right.clone()).collect();
                if shuffle {
                    fisher_yates(&mut right_order, rng);
                }
                Ok(QuestionLayout::Matching { right_order })
            }
            QuestionKind::FillInBlank { blanks } => Ok(QuestionLayout::FillInBlank {
                template: BlankTemplate::parse(&question.text, blanks.len())?,
            }),
            QuestionKind::MultipleChoice { .. }
            | QuestionKind::TrueFalse { .. }
            | QuestionKind::ShortAnswer { .. } => Ok(QuestionLayout::Standard),
        }
    }

    pub fn right_order(&self) -> Option<&[String]> {
        match self {
            QuestionLayout::Matching { right_order } => Some(right_order),
            _ => None,
        }
    }

    pub fn blank_template(&self) -> Option<&BlankTemplate> {
        match self {
            QuestionLayout::FillInBlank { template } => Some(template),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::model::MatchPair;

    #[test]
    fn scan_splits_on_long_underscore_runs() {
        let t = BlankTemplate::scan("The ___ sat on the _____.");
        assert_eq!(t.blank_count(), 2);
        assert_eq!(t.segments(), ["The ", " sat on the ", "."]);
    }

    #[test]
    fn short_underscore_runs_are_literal() {
        let t = BlankTemplate::scan("snake_case and __init__ stay, ___ does not");
        assert_eq!(t.blank_count(), 1);
        assert_eq!(t.segments()[0], "snake_case and __init__ stay, ");
    }

    #[test]
    fn markers_at_edges_produce_empty_segments() {
        let t = BlankTemplate::scan("___ is ___");
        assert_eq!(t.segments(), ["", " is ", ""]);
    }

    #[test]
    fn text_without_markers_has_no_blanks() {
        let t = BlankTemplate::scan("");
        assert_eq!(t.blank_count(), 0);
        assert_eq!(t.render_with(|_| unreachable!()), "");

        let json = serde_json::to_value(QuestionLayout::FillInBlank { template: t }).unwrap();
        assert_eq!(json["kind"], "fill_in_blank");
        assert_eq!(json["template"]["segments"], serde_json::json!([""]));
    }

    #[test]
    fn parse_rejects_count_mismatch() {
        let err = BlankTemplate::parse("only ___ here", 2).unwrap_err();
        assert_eq!(err.field(), Some("blanks"));
        assert!(BlankTemplate::parse("only ___ here", 1).is_ok());
    }

    #[test]
    fn render_with_fills_blanks_in_order() {
        let t = BlankTemplate::scan("Über ___ und ___!");
        let out = t.render_with(|i| format!("[{}]", i + 1));
        assert_eq!(out, "Über [1] und [2]!");
    }

    #[test]
    fn fisher_yates_keeps_elements() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut items: Vec<u32> = (0..50).collect();
        fisher_yates(&mut items, &mut rng);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn fisher_yates_handles_tiny_slices() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<u8> = vec![];
        fisher_yates(&mut empty, &mut rng);
        let mut one = vec![9];
        fisher_yates(&mut one, &mut rng);
        assert_eq!(one, vec![9]);
    }

    #[test]
    fn fisher_yates_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(2024);
        let trials = 60_000;
        let mut counts: HashMap<Vec<u8>, u32> = HashMap::new();
        for _ in 0..trials {
            let mut items = vec![0u8, 1, 2];
            fisher_yates(&mut items, &mut rng);
            *counts.entry(items).or_default() += 1;
        }
        assert_eq!(counts.len(), 6);
        let expected = trials as f64 / 6.0;
        for (perm, count) in counts {
            let ratio = count as f64 / expected;
            assert!(
                (0.9..1.1).contains(&ratio),
                "permutation {perm:?} seen {count} times"
            );
        }
    }

    #[test]
    fn matching_layout_is_a_permutation_of_rights() {
        let question = Question::new(
            "m1",
            "Match capitals",
            QuestionKind::Matching {
                pairs: vec![
                    MatchPair::new("France", "Paris"),
                    MatchPair::new("Italy", "Rome"),
                    MatchPair::new("Spain", "Madrid"),
                ],
            },
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let layout = QuestionLayout::derive(&question, &mut rng, true).unwrap();
        let mut order = layout.right_order().unwrap().to_vec();
        order.sort();
        assert_eq!(order, ["Madrid", "Paris", "Rome"]);

        let fixed = QuestionLayout::derive(&question, &mut rng, false).unwrap();
        assert_eq!(fixed.right_order().unwrap(), ["Paris", "Rome", "Madrid"]);
    }
}
