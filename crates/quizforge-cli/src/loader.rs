//! File-backed question set loading.
//!
//! A question set file is the serde form of `QuestionSet`, written as TOML
//! or JSON. The extension picks the format.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};

use quizforge_core::loader::QuestionSetLoader;
use quizforge_core::{EntityKind, QuestionSet, QuizError};

const EXTENSIONS: [&str; 2] = ["toml", "json"];

/// Loads `<dir>/<id>.toml` or `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FileLoader {
    dir: PathBuf,
}

impl FileLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn candidates(&self, id: &str) -> impl Iterator<Item = PathBuf> + '_ {
        let id = id.to_string();
        EXTENSIONS
            .iter()
            .map(move |ext| self.dir.join(format!("{id}.{ext}")))
    }
}

#[async_trait]
impl QuestionSetLoader for FileLoader {
    async fn load_question_set(&self, id: &str) -> Result<QuestionSet> {
        for path in self.candidates(id) {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                let set = load_file(&path).await?;
                if set.id != id {
                    tracing::warn!(
                        path = %path.display(),
                        file_id = %set.id,
                        "question set id differs from its file name"
                    );
                }
                return Ok(set);
            }
        }
        Err(QuizError::NotFound {
            kind: EntityKind::QuestionSet,
            id: id.to_string(),
        }
        .into())
    }

    async fn available_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("failed to read directory: {}", self.dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if has_known_extension(&path) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

fn has_known_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.contains(&e))
}

/// Read and parse a single question set file. Shape rules are not checked
/// here; the engine does that on registration.
pub async fn load_file(path: &Path) -> Result<QuestionSet> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read question set file: {}", path.display()))?;
    parse_question_set_str(&content, path)
}

/// Parse question set text, picking the format from `source_path`'s extension.
pub fn parse_question_set_str(content: &str, source_path: &Path) -> Result<QuestionSet> {
    let is_json = source_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))
    } else {
        toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))
    }
}

/// Load every question set file under `dir`, recursively and concurrently.
/// Each file's result is reported separately so one bad file does not hide
/// the others.
pub async fn load_directory(dir: &Path) -> Result<Vec<(PathBuf, Result<QuestionSet>)>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut files = Vec::new();
    let mut dirs = vec![dir.to_path_buf()];
    while let Some(current) = dirs.pop() {
        let mut entries = tokio::fs::read_dir(&current)
            .await
            .with_context(|| format!("failed to read directory: {}", current.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            } else if has_known_extension(&path) {
                files.push(path);
            }
        }
    }

    let mut pending: FuturesUnordered<_> = files
        .into_iter()
        .map(|path| async move {
            let result = load_file(&path).await;
            (path, result)
        })
        .collect();

    let mut loaded = Vec::new();
    while let Some(entry) = pending.next().await {
        loaded.push(entry);
    }
    loaded.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(loaded)
}
