use anyhow::Result;
use clap::Parser;
use modalflow::cli::{log_file_path, Cli};
use modalflow::config::Config;
use modalflow::logging::init_logging;
use tracing::error;

#[tokio::main]
async fn main() {
    // Give the terminal back before reporting a panic
    std::panic::set_hook(Box::new(|panic_info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableMouseCapture
        );
        error!("Application panicked: {}", panic_info);
        eprintln!("Application panicked: {}", panic_info);
        std::process::exit(1);
    }));

    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        // A missing .env file is normal
        tracing::debug!("No .env file found or error loading it: {}", e);
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::init(cli.config.as_deref()).await?;

    // Log to a file while the dashboard owns the terminal
    let log_file = cli.is_interactive().then(|| log_file_path(&config));
    let _log_guard = init_logging(cli.debug, log_file.as_deref())?;

    cli.execute(config).await
}
