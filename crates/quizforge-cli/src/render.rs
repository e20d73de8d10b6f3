//! Terminal rendering of questions and feedback, and parsing of typed answers.

use std::io::{self, Write};

use quizforge_core::evaluator::{Correctness, EvaluationDetail};
use quizforge_core::layout::QuestionLayout;
use quizforge_core::model::{AnswerOption, Citation};
use quizforge_core::{Answer, Question, QuestionKind, UserAnswer};

/// Separator between blank answers on one input line.
pub const BLANK_SEPARATOR: char = ';';

/// `a`, `b`, ... for the first 26 options, then the 1-based number.
fn option_label(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'a' + i).to_string(),
        _ => (index + 1).to_string(),
    }
}

fn left_label(index: usize) -> String {
    option_label(index).to_uppercase()
}

pub fn render_question(
    out: &mut impl Write,
    question: &Question,
    layout: &QuestionLayout,
    index: usize,
    total: usize,
    answered: bool,
) -> io::Result<()> {
    let marker = if answered { " (answered)" } else { "" };
    writeln!(
        out,
        "\nQuestion {}/{} [{}, {}]{marker}",
        index + 1,
        total,
        question.kind,
        question.difficulty
    )?;

    match (&question.kind, layout) {
        (QuestionKind::FillInBlank { .. }, QuestionLayout::FillInBlank { template }) => {
            writeln!(out, "{}", template.render_with(|i| format!("[{}]", i + 1)))?;
            writeln!(
                out,
                "  (separate the {} blank answers with '{BLANK_SEPARATOR}')",
                template.blank_count()
            )?;
        }
        (QuestionKind::Matching { pairs }, QuestionLayout::Matching { right_order }) => {
            writeln!(out, "{}", question.text)?;
            for (i, pair) in pairs.iter().enumerate() {
                writeln!(out, "  {}. {}", left_label(i), pair.left)?;
            }
            writeln!(out, "  Choices:")?;
            for (i, right) in right_order.iter().enumerate() {
                writeln!(out, "    {}) {right}", i + 1)?;
            }
            writeln!(
                out,
                "  (enter one choice number per item, in order, e.g. \"2 1 3\")"
            )?;
        }
        (QuestionKind::MultipleChoice { options }, _) | (QuestionKind::TrueFalse { options }, _) => {
            writeln!(out, "{}", question.text)?;
            for (i, option) in options.iter().enumerate() {
                writeln!(out, "  {}) {}", option_label(i), option.text)?;
            }
        }
        _ => {
            writeln!(out, "{}", question.text)?;
            if !question.kind.is_gradable() {
                writeln!(out, "  (free text; you grade this one yourself)")?;
            }
        }
    }
    Ok(())
}

/// Turn one line of input into an `Answer` for `question`.
///
/// Returns a message for the user when the input cannot be read.
pub fn parse_answer(
    question: &Question,
    layout: &QuestionLayout,
    input: &str,
) -> Result<Answer, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty answer".to_string());
    }

    match &question.kind {
        QuestionKind::MultipleChoice { options } | QuestionKind::TrueFalse { options } => {
            resolve_choice(options, input).map(Answer::text)
        }
        QuestionKind::ShortAnswer { .. } => Ok(Answer::text(input)),
        QuestionKind::FillInBlank { blanks } => {
            let parts: Vec<&str> = input.split(BLANK_SEPARATOR).map(str::trim).collect();
            if parts.len() != blanks.len() {
                return Err(format!(
                    "expected {} answers separated by '{BLANK_SEPARATOR}', got {}",
                    blanks.len(),
                    parts.len()
                ));
            }
            Ok(Answer::list(parts))
        }
        QuestionKind::Matching { pairs } => {
            let right_order = layout
                .right_order()
                .ok_or_else(|| "no choices are laid out for this question".to_string())?;
            let choices: Vec<&str> = input.split_whitespace().collect();
            if choices.len() != pairs.len() {
                return Err(format!(
                    "expected {} choice numbers, got {}",
                    pairs.len(),
                    choices.len()
                ));
            }
            let mut mapping = Vec::with_capacity(pairs.len());
            for (pair, choice) in pairs.iter().zip(choices) {
                let n: usize = choice
                    .parse()
                    .map_err(|_| format!("'{choice}' is not a choice number"))?;
                let right = n
                    .checked_sub(1)
                    .and_then(|i| right_order.get(i))
                    .ok_or_else(|| format!("choice {n} is out of range 1-{}", right_order.len()))?;
                mapping.push((pair.left.as_str(), right.as_str()));
            }
            Ok(Answer::mapping(mapping))
        }
    }
}

/// Accept an option id, an option letter, or the option text, in that order.
fn resolve_choice(options: &[AnswerOption], input: &str) -> Result<String, String> {
    if let Some(option) = options.iter().find(|o| o.id == input) {
        return Ok(option.id.clone());
    }
    let lowered = input.to_lowercase();
    options
        .iter()
        .enumerate()
        .find(|(i, _)| option_label(*i) == lowered)
        .map(|(_, o)| o)
        .or_else(|| options.iter().find(|o| o.text.to_lowercase() == lowered))
        .map(|o| o.id.clone())
        .ok_or_else(|| {
            let labels: Vec<String> = (0..options.len()).map(option_label).collect();
            format!("unknown choice '{input}', pick one of {}", labels.join(", "))
        })
}

pub fn render_feedback(
    out: &mut impl Write,
    question: &Question,
    answer: &UserAnswer,
    citations: &[&Citation],
    show_explanations: bool,
) -> io::Result<()> {
    match answer.correctness {
        Correctness::Correct => writeln!(out, "Correct!")?,
        Correctness::Incorrect => writeln!(out, "Incorrect.")?,
        Correctness::NotApplicable => writeln!(out, "Answer recorded.")?,
    }

    match (&question.kind, &answer.detail) {
        (QuestionKind::MultipleChoice { .. } | QuestionKind::TrueFalse { .. }, _) => {
            if answer.correctness == Correctness::Incorrect {
                if let Some(correct) = question.correct_option() {
                    writeln!(out, "  Correct answer: {}", correct.text)?;
                }
            }
        }
        (QuestionKind::ShortAnswer { sample_answer }, _) => {
            if !sample_answer.is_empty() {
                writeln!(out, "  Sample answer: {sample_answer}")?;
            }
        }
        (QuestionKind::FillInBlank { blanks }, EvaluationDetail::Blanks { results }) => {
            for (i, (accepted, ok)) in blanks.iter().zip(results).enumerate() {
                if *ok {
                    writeln!(out, "  [{}] ok", i + 1)?;
                } else {
                    writeln!(out, "  [{}] expected: {}", i + 1, accepted.replace('|', " or "))?;
                }
            }
        }
        (QuestionKind::Matching { .. }, EvaluationDetail::Matches { results }) => {
            for result in results {
                let chosen = result.chosen.as_deref().unwrap_or("-");
                if result.correct {
                    writeln!(out, "  {} -> {chosen} ok", result.left)?;
                } else {
                    writeln!(
                        out,
                        "  {} -> {chosen} (expected: {})",
                        result.left, result.expected
                    )?;
                }
            }
        }
        _ => {}
    }

    if show_explanations {
        if !question.explanation.is_empty() {
            writeln!(out, "  Explanation: {}", question.explanation)?;
        }
        for citation in citations {
            match &citation.url {
                Some(url) => writeln!(out, "  [{}] {} <{url}>", citation.number, citation.title)?,
                None => writeln!(out, "  [{}] {}", citation.number, citation.title)?,
            }
        }
    }
    Ok(())
}
