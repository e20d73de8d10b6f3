//! The `quizforge run` command.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use quizforge_core::loader::QuestionSetLoader;
use quizforge_core::report::SessionSummary;
use quizforge_core::{EngineOptions, QuestionSet, SessionEngine, SessionPhase};

use crate::config::{load_config_from, QuizforgeConfig};
use crate::loader::{load_file, FileLoader};
use crate::render::{parse_answer, render_feedback, render_question};

const HELP: &str = "\
Commands:
  :next      go to the next question
  :prev      go to the previous question
  :jump N    go to question N
  :finish    end the session and show results
  :quit      leave without saving a report
  :help      show this help
Anything else is taken as your answer.";

/// How the interactive loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Every question was answered.
    Completed,
    /// `:finish` or end of input.
    Finished,
    /// `:quit`.
    Quit,
}

pub async fn execute(
    question_set: PathBuf,
    config_path: Option<PathBuf>,
    report: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let set = resolve_question_set(&question_set, &config).await?;
    let set_id = set.id.clone();

    let mut engine = SessionEngine::with_options(EngineOptions {
        shuffle_matching: config.shuffle_matching,
    });
    if let Some(seed) = seed {
        engine = engine.with_seed(seed);
    }
    engine.register_question_set(set)?;
    let total = engine.start_session(&set_id)?.stats.total_questions;

    eprintln!("quizforge: {set_id} ({total} questions), type :help for commands");

    let exit = {
        let stdin = io::stdin();
        let stdout = io::stdout();
        run_session(&mut engine, &config, stdin.lock(), stdout.lock())?
    };

    if exit == LoopExit::Quit {
        engine.reset_session();
        eprintln!("Session abandoned.");
        return Ok(());
    }

    engine.finish_session()?;
    let summary = engine
        .summary()
        .context("session ended without a summary")?;
    print_summary(&summary);

    let report_path = report.or_else(|| {
        config
            .report_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}-{}.json", summary.question_set_id, summary.session_id)))
    });
    if let Some(path) = report_path {
        summary.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

/// A path to a `.toml`/`.json` file, or a bare id looked up in `question_dir`.
async fn resolve_question_set(arg: &Path, config: &QuizforgeConfig) -> Result<QuestionSet> {
    if arg.is_file() {
        return load_file(arg).await;
    }
    match arg.to_str() {
        Some(id) if arg.extension().is_none() && arg.components().count() == 1 => {
            FileLoader::new(&config.question_dir)
                .load_question_set(id)
                .await
                .with_context(|| {
                    format!("looked in question directory {}", config.question_dir.display())
                })
        }
        _ => anyhow::bail!("question set file not found: {}", arg.display()),
    }
}

/// Drive the engine from line-based input until the session completes or the
/// user leaves.
pub fn run_session<R: BufRead, W: Write>(
    engine: &mut SessionEngine,
    config: &QuizforgeConfig,
    mut input: R,
    mut out: W,
) -> Result<LoopExit> {
    let mut line = String::new();

    loop {
        if engine.phase() != SessionPhase::Active {
            return Ok(LoopExit::Completed);
        }

        let (question, layout) = match (engine.current_question(), engine.current_layout()) {
            (Some(q), Some(l)) => (q.clone(), l.clone()),
            _ => anyhow::bail!("active session has no current question"),
        };
        let index = engine.current_index().unwrap_or_default();
        let total = engine.stats().map(|s| s.total_questions).unwrap_or_default();
        let answered = engine.is_answered(&question.id);

        render_question(&mut out, &question, &layout, index, total, answered)?;
        write!(out, "> ")?;
        out.flush()?;

        let started = Instant::now();
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(LoopExit::Finished);
        }
        let entry = line.trim();

        if let Some(command) = entry.strip_prefix(':') {
            let mut parts = command.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("next"), None) => {
                    engine.next_question()?;
                }
                (Some("prev"), None) => {
                    engine.previous_question()?;
                }
                (Some("jump"), Some(n)) => match n.parse::<usize>() {
                    Ok(n) if n >= 1 => {
                        engine.jump_to_question(n - 1)?;
                    }
                    _ => writeln!(out, "'{n}' is not a question number")?,
                },
                (Some("finish"), None) => return Ok(LoopExit::Finished),
                (Some("quit"), None) => return Ok(LoopExit::Quit),
                (Some("help"), None) => writeln!(out, "{HELP}")?,
                _ => writeln!(out, "unknown command ':{command}', try :help")?,
            }
            continue;
        }

        if answered {
            writeln!(out, "Already answered; your first submission stands.")?;
        }
        let answer = match parse_answer(&question, &layout, entry) {
            Ok(answer) => answer,
            Err(message) => {
                writeln!(out, "{message}")?;
                continue;
            }
        };

        let time_spent = started.elapsed().as_secs_f64();
        let recorded = engine.submit_answer(&question.id, answer, Some(time_spent))?.clone();
        let citations = engine.citations_for(&question);
        render_feedback(
            &mut out,
            &question,
            &recorded,
            &citations,
            config.show_explanations,
        )?;

        if engine.phase() == SessionPhase::Active {
            if let Some(next) = next_unanswered(engine) {
                engine.jump_to_question(next)?;
            }
        }
    }
}

/// First unanswered question after the current one, wrapping around.
fn next_unanswered(engine: &SessionEngine) -> Option<usize> {
    let set = engine.active_question_set()?;
    let current = engine.current_index()?;
    let n = set.len();
    (1..=n)
        .map(|step| (current + step) % n)
        .find(|&i| !engine.is_answered(&set.questions[i].id))
}

fn print_summary(summary: &SessionSummary) {
    use comfy_table::{Cell, Table};

    let stats = &summary.stats;
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        Cell::new("Answered"),
        Cell::new(format!(
            "{}/{} ({:.0}%)",
            stats.answered_questions, stats.total_questions, stats.completion_percentage
        )),
    ]);
    table.add_row(vec![
        Cell::new("Correct"),
        Cell::new(stats.correct_answers),
    ]);
    table.add_row(vec![
        Cell::new("Incorrect"),
        Cell::new(stats.incorrect_answers),
    ]);
    table.add_row(vec![
        Cell::new("Ungraded"),
        Cell::new(stats.ungraded_answers()),
    ]);
    table.add_row(vec![
        Cell::new("Accuracy"),
        Cell::new(format!("{:.1}%", stats.accuracy_percentage)),
    ]);
    table.add_row(vec![
        Cell::new("Avg time"),
        Cell::new(format!("{:.1}s", stats.average_time_per_question)),
    ]);

    eprintln!("\n{table}");

    let missed: Vec<&str> = summary.missed().map(|o| o.question_id.as_str()).collect();
    if !missed.is_empty() {
        eprintln!("Review: {}", missed.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use quizforge_core::model::{AnswerOption, MatchPair};
    use quizforge_core::{Question, QuestionKind};

    use super::*;

    fn engine() -> SessionEngine {
        let set = QuestionSet::new(
            "demo",
            vec![
                Question::new(
                    "q1",
                    "2 + 2?",
                    QuestionKind::MultipleChoice {
                        options: vec![
                            AnswerOption::new("three", "3", false),
                            AnswerOption::new("four", "4", true),
                        ],
                    },
                )
                .unwrap(),
                Question::new(
                    "q2",
                    "Match.",
                    QuestionKind::Matching {
                        pairs: vec![MatchPair::new("one", "1"), MatchPair::new("two", "2")],
                    },
                )
                .unwrap(),
                Question::new(
                    "q3",
                    "Describe ownership.",
                    QuestionKind::ShortAnswer {
                        sample_answer: "Each value has one owner.".into(),
                    },
                )
                .unwrap(),
            ],
        )
        .unwrap();

        let mut engine = SessionEngine::with_options(EngineOptions {
            shuffle_matching: false,
        });
        engine.register_question_set(set).unwrap();
        engine.start_session("demo").unwrap();
        engine
    }

    fn drive(engine: &mut SessionEngine, script: &str) -> (LoopExit, String) {
        let mut out = Vec::new();
        let exit = run_session(
            engine,
            &QuizforgeConfig::default(),
            script.as_bytes(),
            &mut out,
        )
        .unwrap();
        (exit, String::from_utf8(out).unwrap())
    }

    #[test]
    fn answering_everything_completes() {
        let mut engine = engine();
        let (exit, out) = drive(&mut engine, "b\n1 2\nOne owner per value.\n");
        assert_eq!(exit, LoopExit::Completed);
        assert!(out.contains("Correct!"));
        assert!(out.contains("Sample answer: Each value has one owner."));
        let stats = engine.stats().unwrap();
        assert_eq!(stats.correct_answers, 2);
        assert_eq!(stats.ungraded_answers(), 1);
        assert_eq!(engine.phase(), SessionPhase::Completed);
    }

    #[test]
    fn end_of_input_finishes_early() {
        let mut engine = engine();
        let (exit, _) = drive(&mut engine, "a\n");
        assert_eq!(exit, LoopExit::Finished);
        assert_eq!(engine.stats().unwrap().incorrect_answers, 1);
        assert_eq!(engine.phase(), SessionPhase::Active);
    }

    #[test]
    fn navigation_commands_move_the_cursor() {
        let mut engine = engine();
        let (exit, _) = drive(&mut engine, ":jump 3\n:prev\n:finish\n");
        assert_eq!(exit, LoopExit::Finished);
        assert_eq!(engine.current_index(), Some(1));
    }

    #[test]
    fn bad_input_reprompts_without_recording() {
        let mut engine = engine();
        let (exit, out) = drive(&mut engine, "z\n:jump 0\n:bogus\n:quit\n");
        assert_eq!(exit, LoopExit::Quit);
        assert!(out.contains("unknown choice 'z'"));
        assert!(out.contains("'0' is not a question number"));
        assert!(out.contains("unknown command ':bogus'"));
        assert_eq!(engine.stats().unwrap().answered_questions, 0);
    }

    #[test]
    fn resubmission_keeps_first_answer() {
        let mut engine = engine();
        let (_, out) = drive(&mut engine, "a\n:prev\nb\n:finish\n");
        assert!(out.contains("Already answered"));
        let answer = engine.user_answer("q1").unwrap();
        assert_eq!(answer.is_correct(), Some(false));
    }

    #[test]
    fn answering_skips_to_next_unanswered() {
        let mut engine = engine();
        drive(&mut engine, ":jump 2\n2 1\n:finish\n");
        // q2 answered, cursor moves on to q3
        assert_eq!(engine.current_index(), Some(2));
        drive(&mut engine, "x\n:finish\n");
        assert_eq!(engine.current_index(), Some(0));
    }
}
