use anyhow::Result;

use super::Command;
use crate::config::ReportConfig;

pub struct ShowConfigCommand;

impl Command for ShowConfigCommand {
    async fn execute(&self, config: &ReportConfig) -> Result<()> {
        print!("{}", config.to_redacted_toml()?);
        Ok(())
    }
}
