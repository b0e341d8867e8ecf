use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static RELEASE_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^release-(\d+)\.(\d+)$").expect("static pattern compiles"));

/// `major.minor` of a release line. Ordering is numeric, so 2.10 sorts after 2.9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ReleaseVersion {
    pub major: u32,
    pub minor: u32,
}

impl ReleaseVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Prefix shared by every tag cut from this release line, e.g. `v2.1.`
    pub fn tag_prefix(&self) -> String {
        format!("v{}.{}.", self.major, self.minor)
    }

    pub fn branch_name(&self) -> String {
        format!("release-{self}")
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A release branch on the upstream repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchId {
    pub name: String,
    pub version: ReleaseVersion,
}

impl BranchId {
    /// Parse `release-<major>.<minor>`; anything else (`release-docs`,
    /// `release-2.1-hotfix`) is not a release line.
    pub fn parse(name: &str) -> Option<Self> {
        let captures = RELEASE_BRANCH.captures(name)?;
        let major = captures.get(1)?.as_str().parse().ok()?;
        let minor = captures.get(2)?.as_str().parse().ok()?;
        Some(Self {
            name: name.to_string(),
            version: ReleaseVersion::new(major, minor),
        })
    }
}

impl From<ReleaseVersion> for BranchId {
    fn from(version: ReleaseVersion) -> Self {
        Self {
            name: version.branch_name(),
            version,
        }
    }
}

/// Keep release-line branches only, ordered by version
pub fn release_branches<I, S>(names: I) -> Vec<BranchId>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut branches: Vec<BranchId> = names
        .into_iter()
        .filter_map(|name| BranchId::parse(name.as_ref()))
        .collect();
    branches.sort_by_key(|branch| branch.version);
    branches
}
