use anyhow::Result;
use clap::Parser;

use rw_release_report::cli::commands::{ChangelogCommand, Command, ShowConfigCommand, TimelineCommand};
use rw_release_report::cli::{Cli, Commands};
use rw_release_report::config::ReportConfig;
use rw_release_report::{init_telemetry, shutdown_telemetry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_file_loaded = ReportConfig::load_env_file()?;
    let config = ReportConfig::load()?;
    init_telemetry(&config.observability.log_level, config.observability.json_logs)?;
    if env_file_loaded {
        tracing::info!("Loaded environment variables from .env file");
    }

    let result = match cli.command {
        Commands::Timeline { out, mirror, workers } => {
            tokio::runtime::Runtime::new()?.block_on(async {
                TimelineCommand { out, mirror, workers }.execute(&config).await
            })
        }
        Commands::Changelog { earliest, out } => {
            tokio::runtime::Runtime::new()?.block_on(async {
                ChangelogCommand { earliest, out }.execute(&config).await
            })
        }
        Commands::ShowConfig => {
            tokio::runtime::Runtime::new()?.block_on(async {
                ShowConfigCommand.execute(&config).await
            })
        }
    };

    shutdown_telemetry();
    result
}
