mod config;
mod logs;
mod root;

pub use config::ConfigCommand;
pub use logs::{log_file_path, LogsCommand};
pub use root::{Cli, Commands};
