use tracing::{debug, info};

use crate::buildkite::{Build, BuildSource, BuildkiteError};

const NIGHTLY_PREFIX: &str = "nightly-";
/// `nightly-YYYYMMDD`; longer tags such as `nightly-20230913-fix` are one-offs
const NIGHTLY_TAG_LEN: usize = NIGHTLY_PREFIX.len() + 8;

/// A published nightly image and the trunk commit it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightlyBuild {
    /// `YYYYMMDD`
    pub date: String,
    pub commit: String,
}

/// Decides which pipeline builds published a nightly image
#[derive(Debug, Clone)]
pub struct NightlyFilter {
    image_job: String,
}

impl NightlyFilter {
    pub fn new(image_job: impl Into<String>) -> Self {
        Self {
            image_job: image_job.into(),
        }
    }

    /// A scheduled build, or a manual one tagged exactly `nightly-YYYYMMDD`,
    /// whose image job passed
    pub fn classify(&self, build: &Build) -> Option<NightlyBuild> {
        let image_tag = build.env_str("IMAGE_TAG").unwrap_or_default();
        let scheduled = build.source == "schedule";
        let manual = image_tag.starts_with(NIGHTLY_PREFIX) && image_tag.len() == NIGHTLY_TAG_LEN;

        if !(scheduled || manual) || !build.job_passed(&self.image_job) {
            return None;
        }

        let date = if manual {
            image_tag[NIGHTLY_PREFIX.len()..].to_string()
        } else {
            build.created_at.format("%Y%m%d").to_string()
        };
        Some(NightlyBuild {
            date,
            commit: build.commit.clone(),
        })
    }
}

/// Collect nightlies newest first, paging back until one older than
/// `earliest` (YYYYMMDD) has been seen or the pipeline runs out of pages.
///
/// Consecutive builds of the same commit collapse into the newest one.
pub async fn collect_nightlies(
    source: &dyn BuildSource,
    filter: &NightlyFilter,
    earliest: &str,
) -> Result<Vec<NightlyBuild>, BuildkiteError> {
    let mut nightlies: Vec<NightlyBuild> = Vec::new();
    let mut page = 1;

    loop {
        let batch = source.builds_page(page).await?;
        debug!(page, builds = batch.builds.len(), "Fetched build page");

        for nightly in batch.builds.iter().filter_map(|build| filter.classify(build)) {
            if nightlies.last().is_some_and(|prev| prev.commit == nightly.commit) {
                continue;
            }
            nightlies.push(nightly);
        }

        let reached_earliest = nightlies.last().is_some_and(|n| n.date.as_str() < earliest);
        match batch.next_page {
            Some(next) if !reached_earliest => page = next,
            _ => break,
        }
    }

    info!(count = nightlies.len(), "Collected nightly builds");
    Ok(nightlies)
}
