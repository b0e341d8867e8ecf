use anyhow::Result;

use crate::config::ReportConfig;

pub mod changelog;
pub mod show_config;
pub mod timeline;

pub use changelog::ChangelogCommand;
pub use show_config::ShowConfigCommand;
pub use timeline::TimelineCommand;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self, config: &ReportConfig) -> Result<()>;
}
