//! Chart repository index generation and subscription filtering.
//!
//! This crate discovers charts on disk, builds a chart repository index
//! from their manifests, and narrows that index to the versions a
//! subscription accepts.

pub mod discovery;
pub mod error;
pub mod filter;
pub mod index;
pub mod location;
pub mod manifest;
pub mod policy;
pub mod selector;
pub mod version;

pub use discovery::discover_chart_dirs;
pub use error::{Error, Result};
pub use filter::{filter_charts, generate_index, version_matches};
pub use index::{ChartIndex, ChartVersion, Entries, GENERATED_BY, IndexBuilder, IndexFile};
pub use location::ChartLocation;
pub use manifest::{CHARTFILE_NAME, ChartMetadata, ChartfileLoader, ManifestLoader};
pub use policy::{PackageFilter, PackageOverride, Subscription, SubscriptionFilterPolicy};
pub use selector::{LabelSelector, LabelSelectorRequirement, SelectorOperator, keywords_match};
pub use version::VersionRange;
