use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

use super::{ConfigCommand, LogsCommand};
use crate::config::Config;
use crate::tui;

/// modalflow - stacked modals, modal chains and an unsaved-changes guard in your terminal
#[derive(Parser)]
#[command(
    name = "modalflow",
    version,
    about = "Stacked modals, modal chains and an unsaved-changes guard in your terminal",
    long_about = r#"modalflow is a terminal dashboard that exercises a modal registry, a chain
controller for multi-step modal flows and a navigation guard for unsaved work.

Examples:
  modalflow                       # Start the dashboard
  modalflow config --pretty       # Print the effective configuration
  modalflow logs --tail 50        # Show the end of the dashboard log"#
)]
pub struct Cli {
    /// Path to a JSON config file
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the effective configuration
    Config(ConfigCommand),
    /// View or clear the dashboard log
    Logs(LogsCommand),
}

impl Cli {
    /// Whether the run takes over the terminal
    pub fn is_interactive(&self) -> bool {
        self.command.is_none()
    }

    pub async fn execute(self, config: Config) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        match self.command {
            Some(Commands::Config(cmd)) => cmd.execute(&config),
            Some(Commands::Logs(cmd)) => cmd.execute(&config).await,
            None => start_interactive_mode(config).await,
        }
    }
}

async fn start_interactive_mode(config: Config) -> Result<()> {
    info!(
        scroll_lock = ?config.modal.scroll_lock,
        exit_ticks = config.modal.exit_transition_ticks,
        base_path = %config.guard.base_path,
        "Starting dashboard"
    );
    tui::run(config).await?;
    info!("Application finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["modalflow", "--debug", "config", "--pretty"]).unwrap();
        assert!(cli.debug);
        assert!(!cli.is_interactive());
        assert!(matches!(cli.command, Some(Commands::Config(ConfigCommand { pretty: true }))));

        let cli = Cli::try_parse_from(["modalflow", "logs", "--tail", "5", "--config", "/tmp/c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        match cli.command {
            Some(Commands::Logs(logs)) => assert_eq!(logs.tail, 5),
            _ => panic!("expected logs command"),
        }
    }

    #[test]
    fn test_no_subcommand_is_interactive() {
        let cli = Cli::try_parse_from(["modalflow"]).unwrap();
        assert!(cli.is_interactive());
    }
}
