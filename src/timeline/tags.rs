use chrono::{DateTime, Utc};
use serde::Serialize;

use super::version::ReleaseVersion;

/// A published release as listed by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseTag {
    pub tag_name: String,
    pub created_at: DateTime<Utc>,
}

impl ReleaseTag {
    pub fn new(tag_name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            tag_name: tag_name.into(),
            created_at,
        }
    }

    /// Patch component for `vX.Y.Z` tags; `None` for `.0` and anything non-numeric
    pub fn patch_label(&self) -> Option<&str> {
        let (_, patch) = self.tag_name.rsplit_once('.')?;
        if patch == "0" || patch.is_empty() || !patch.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(patch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Formal,
    ReleaseCandidate,
    Variant,
    Unrelated,
}

/// Marker-based tag classification.
///
/// Tags carry no formal grammar upstream. Variant markers win over
/// release-candidate markers; everything else under the version prefix is a
/// formal release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    rc_markers: Vec<String>,
    variant_markers: Vec<String>,
}

impl Default for TagFilter {
    fn default() -> Self {
        Self::new(vec!["rc".to_string()], vec!["single-node".to_string()])
    }
}

impl TagFilter {
    pub fn new(rc_markers: Vec<String>, variant_markers: Vec<String>) -> Self {
        Self {
            rc_markers,
            variant_markers,
        }
    }

    pub fn classify(&self, version: ReleaseVersion, tag: &str) -> TagKind {
        if !tag.starts_with(&version.tag_prefix()) {
            return TagKind::Unrelated;
        }
        if self.variant_markers.iter().any(|m| tag.contains(m.as_str())) {
            return TagKind::Variant;
        }
        if self.rc_markers.iter().any(|m| tag.contains(m.as_str())) {
            return TagKind::ReleaseCandidate;
        }
        TagKind::Formal
    }

    pub fn is_formal(&self, version: ReleaseVersion, tag: &str) -> bool {
        self.classify(version, tag) == TagKind::Formal
    }

    /// Split the registry's releases into (formal, release-candidate) for one
    /// version, each sorted by creation time.
    pub fn partition(
        &self,
        version: ReleaseVersion,
        releases: &[ReleaseTag],
    ) -> (Vec<ReleaseTag>, Vec<ReleaseTag>) {
        let mut formal = Vec::new();
        let mut candidates = Vec::new();
        for release in releases {
            match self.classify(version, &release.tag_name) {
                TagKind::Formal => formal.push(release.clone()),
                TagKind::ReleaseCandidate => candidates.push(release.clone()),
                TagKind::Variant | TagKind::Unrelated => {}
            }
        }
        // Stable sort keeps registry order for identical timestamps
        formal.sort_by_key(|r| r.created_at);
        candidates.sort_by_key(|r| r.created_at);
        (formal, candidates)
    }
}
