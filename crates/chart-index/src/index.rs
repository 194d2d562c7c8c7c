//! Chart repository index construction.
//!
//! An index maps each chart name to its known versions, newest first.
//! Filtering code works against the [`ChartIndex`] capability trait
//! rather than the concrete [`IndexFile`].

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::location::ChartLocation;
use crate::manifest::{ChartMetadata, ManifestLoader};
use crate::version;

/// Provenance marker recorded as the digest of every generated entry.
pub const GENERATED_BY: &str = "generated-by-chart-index";

/// Index format version written to `apiVersion`.
pub const INDEX_API_VERSION: &str = "v1";

/// One indexed version of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartVersion {
    #[serde(flatten)]
    pub metadata: ChartMetadata,
    #[serde(default)]
    pub urls: Vec<String>,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub digest: String,
}

impl ChartVersion {
    pub fn new(metadata: ChartMetadata, url: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            metadata,
            urls: vec![url.into()],
            created: Utc::now(),
            digest: digest.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    /// The Tiller version this chart declares, if any. Blank counts as absent.
    pub fn secondary_tool_version(&self) -> Option<&str> {
        self.metadata
            .tiller_version
            .as_deref()
            .filter(|v| !v.trim().is_empty())
    }

    pub fn keywords(&self) -> &[String] {
        &self.metadata.keywords
    }
}

/// Map from chart name to its versions.
pub type Entries = BTreeMap<String, Vec<ChartVersion>>;

/// Minimal capabilities of a versioned chart index.
pub trait ChartIndex {
    /// Append `version` to the bucket for `name`, creating it if needed.
    fn add_entry(&mut self, name: &str, version: ChartVersion);

    /// Order every bucket newest first.
    fn sort_entries(&mut self);

    fn entries(&self) -> &Entries;

    fn entries_mut(&mut self) -> &mut Entries;
}

/// A chart repository index in the standard `index.yaml` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    pub api_version: String,
    #[serde(default)]
    pub entries: Entries,
    pub generated: DateTime<Utc>,
}

impl IndexFile {
    pub fn new() -> Self {
        Self {
            api_version: INDEX_API_VERSION.to_string(),
            entries: BTreeMap::new(),
            generated: Utc::now(),
        }
    }

    /// Number of chart versions across all buckets.
    pub fn version_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `name` has a bucket holding `version`.
    pub fn has(&self, name: &str, version: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|versions| versions.iter().any(|v| v.version() == version))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Serialize(e.to_string()))
    }
}

impl Default for IndexFile {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartIndex for IndexFile {
    fn add_entry(&mut self, name: &str, version: ChartVersion) {
        self.entries.entry(name.to_string()).or_default().push(version);
    }

    fn sort_entries(&mut self) {
        for versions in self.entries.values_mut() {
            sort_versions(versions);
        }
    }

    fn entries(&self) -> &Entries {
        &self.entries
    }

    fn entries_mut(&mut self) -> &mut Entries {
        &mut self.entries
    }
}

/// Sort newest first by precedence. Versions that do not parse go last,
/// and ties keep their original relative order.
fn sort_versions(versions: &mut [ChartVersion]) {
    let parse = |v: &ChartVersion| semver::Version::parse(v.version().trim()).ok();
    versions.sort_by(|a, b| match (parse(a), parse(b)) {
        (Some(a), Some(b)) => version::cmp_precedence(&b, &a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Builds an [`IndexFile`] from chart directories.
pub struct IndexBuilder<L> {
    loader: L,
}

impl<L: ManifestLoader> IndexBuilder<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Load every chart location and assemble a sorted index.
    ///
    /// # Arguments
    ///
    /// * `locations` - Chart directories
    /// * `root_prefix` - Repository root; stripped to form each entry's base directory
    ///
    /// # Errors
    ///
    /// Returns [`Error::ManifestLoad`] for the first manifest that cannot be loaded.
    pub fn build<I, P>(&self, locations: I, root_prefix: impl AsRef<Path>) -> Result<IndexFile>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let root = root_prefix.as_ref().to_string_lossy();
        let mut index = IndexFile::new();

        for location in locations {
            let location = location.as_ref();
            let chart = ChartLocation::derive(&location.to_string_lossy(), &root);

            let metadata = self.loader.load(location).map_err(|e| {
                tracing::error!(
                    "There was a problem in generating the chart index for {}: {}",
                    location.display(),
                    e
                );
                Error::manifest_load(location, e)
            })?;

            tracing::debug!(
                "Indexed {} {} from {}",
                chart.name(),
                metadata.version,
                chart.url()
            );
            index.add_entry(
                chart.name(),
                ChartVersion::new(metadata, chart.url(), GENERATED_BY),
            );
        }

        index.sort_entries();

        Ok(index)
    }
}
