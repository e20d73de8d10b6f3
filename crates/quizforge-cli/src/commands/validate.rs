//! The `quizforge validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizforge_core::loader::lint_question_set;

use crate::loader::{load_directory, load_file};

pub async fn execute(question_set_path: PathBuf) -> Result<()> {
    let loaded = if question_set_path.is_dir() {
        load_directory(&question_set_path).await?
    } else {
        let set = load_file(&question_set_path).await?;
        vec![(question_set_path.clone(), Ok(set))]
    };

    let mut total_warnings = 0;
    let mut invalid = 0;

    for (path, result) in loaded {
        let set = match result {
            Ok(set) => set,
            Err(e) => {
                println!("{}: ERROR: {e:#}", path.display());
                invalid += 1;
                continue;
            }
        };

        println!("Question set: {} ({} questions)", set.id, set.len());

        if let Err(e) = set.validate() {
            println!("  ERROR: {e}");
            invalid += 1;
            continue;
        }

        let warnings = lint_question_set(&set);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if invalid > 0 {
        anyhow::bail!("{invalid} invalid question set(s)");
    }

    if total_warnings == 0 {
        println!("All question sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
