//! Release timeline data: which release lines exist, when each was cut,
//! released, and last touched.

pub mod aggregator;
pub mod record;
pub mod sources;
pub mod tags;
pub mod version;

pub use aggregator::{AggregatorOptions, BranchAggregator, QueryFailure};
pub use record::{days_between, Anomaly, BranchRecord, DateField, EstimateBasis};
pub use sources::{HistoryProvider, ReleaseRegistry};
pub use tags::{ReleaseTag, TagFilter, TagKind};
pub use version::{release_branches, BranchId, ReleaseVersion};
