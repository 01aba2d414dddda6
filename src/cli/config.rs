//! Config command for printing the effective configuration

use crate::config::Config;
use anyhow::Result;
use clap::Args;

/// Print the configuration after file and environment overrides
#[derive(Debug, Args)]
pub struct ConfigCommand {
    /// Pretty-print the JSON
    #[arg(short, long)]
    pub pretty: bool,
}

impl ConfigCommand {
    pub fn execute(&self, config: &Config) -> Result<()> {
        println!("{}", self.render(config)?);
        Ok(())
    }

    fn render(&self, config: &Config) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(config)?
        } else {
            serde_json::to_string(config)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_output_is_valid_config() {
        let config = Config::default();
        let json = ConfigCommand { pretty: true }.render(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.guard.base_path, config.guard.base_path);
        assert!(json.contains('\n'));
    }
}
