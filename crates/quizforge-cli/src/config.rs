//! CLI configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level quizforge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizforgeConfig {
    /// Directory searched for question sets by id.
    #[serde(default = "default_question_dir")]
    pub question_dir: PathBuf,
    /// Show the explanation and citations after each submission.
    #[serde(default = "default_true")]
    pub show_explanations: bool,
    /// Shuffle matching options at session start.
    #[serde(default = "default_true")]
    pub shuffle_matching: bool,
    /// Where session summaries are written, if anywhere.
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
}

fn default_question_dir() -> PathBuf {
    PathBuf::from("./question-sets")
}

fn default_true() -> bool {
    true
}

impl Default for QuizforgeConfig {
    fn default() -> Self {
        Self {
            question_dir: default_question_dir(),
            show_explanations: true,
            shuffle_matching: true,
            report_dir: None,
        }
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `quizforge.toml` in the current directory
/// 2. `~/.config/quizforge/config.toml`
///
/// `QUIZFORGE_QUESTION_DIR` overrides `question_dir`.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizforgeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizforge.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<QuizforgeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => QuizforgeConfig::default(),
    };

    if let Ok(dir) = std::env::var("QUIZFORGE_QUESTION_DIR") {
        config.question_dir = PathBuf::from(dir);
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizforge"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = QuizforgeConfig::default();
        assert!(config.show_explanations);
        assert!(config.shuffle_matching);
        assert_eq!(config.question_dir, PathBuf::from("./question-sets"));
        assert!(config.report_dir.is_none());
    }

    #[test]
    fn parse_partial_config() {
        let config: QuizforgeConfig = toml::from_str(
            r#"
shuffle_matching = false
report_dir = "reports"
"#,
        )
        .unwrap();
        assert!(!config.shuffle_matching);
        assert!(config.show_explanations);
        assert_eq!(config.report_dir, Some(PathBuf::from("reports")));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizforge.toml");
        std::fs::write(&path, "show_explanations = false\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert!(!config.show_explanations);
    }
}
