//! Logs command for reading the dashboard log file

use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tokio::fs;

/// View or clear the dashboard log
#[derive(Debug, Args)]
pub struct LogsCommand {
    /// Number of lines to show from the end of the log
    #[arg(short, long, default_value = "100")]
    pub tail: usize,

    /// Filter logs by level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub level: Option<String>,

    /// Empty the log file instead of printing it
    #[arg(long)]
    pub clear: bool,
}

/// Where the dashboard writes its log
pub fn log_file_path(config: &Config) -> PathBuf {
    config.data_dir.join("logs").join("modalflow.log")
}

impl LogsCommand {
    /// Execute the logs command
    pub async fn execute(&self, config: &Config) -> Result<()> {
        let log_file = log_file_path(config);

        if !log_file.exists() {
            eprintln!("No log file found at: {}", log_file.display());
            eprintln!("Start the dashboard at least once to generate logs.");
            return Ok(());
        }

        if self.clear {
            fs::write(&log_file, "")
                .await
                .with_context(|| format!("Failed to clear log file: {}", log_file.display()))?;
            println!("Log file cleared: {}", log_file.display());
            return Ok(());
        }

        self.show_logs(&log_file).await
    }

    async fn show_logs(&self, log_file: &Path) -> Result<()> {
        let content = fs::read_to_string(log_file)
            .await
            .with_context(|| format!("Failed to read log file: {}", log_file.display()))?;

        let lines = self.select_lines(&content);
        for line in &lines {
            println!("{}", line);
        }

        if lines.len() == self.tail {
            eprintln!("\nShowing last {} lines. Use --tail to show more.", self.tail);
        }
        Ok(())
    }

    /// Last `tail` lines, after the level filter
    fn select_lines<'a>(&self, content: &'a str) -> Vec<&'a str> {
        let level = self.level.as_ref().map(|level| format!(" {} ", level.to_uppercase()));

        let matching: Vec<&str> = content
            .lines()
            .filter(|line| match &level {
                Some(level) => line.contains(level.as_str()),
                None => true,
            })
            .collect();

        let skip = matching.len().saturating_sub(self.tail);
        matching.into_iter().skip(skip).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
2026-01-01T10:00:00Z  INFO modalflow::tui: page changed page=/reports
2026-01-01T10:00:01Z  WARN modalflow::tui: leave confirmation stays open
2026-01-01T10:00:02Z DEBUG modalflow::modal::registry: modal opened id=info
2026-01-01T10:00:03Z  INFO modalflow::guard: changes saved, leaving";

    fn command(tail: usize, level: Option<&str>) -> LogsCommand {
        LogsCommand {
            tail,
            level: level.map(str::to_string),
            clear: false,
        }
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        let lines = command(2, None).select_lines(LOG);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("changes saved"));
    }

    #[test]
    fn test_level_filter() {
        let lines = command(100, Some("info")).select_lines(LOG);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.contains(" INFO ")));
    }

    #[tokio::test]
    async fn test_clear_empties_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let path = log_file_path(&config);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, LOG).unwrap();

        let command = LogsCommand {
            tail: 10,
            level: None,
            clear: true,
        };
        command.execute(&config).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
