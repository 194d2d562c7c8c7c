//! Chart manifest (`Chart.yaml`) parsing.
//!
//! # Example YAML
//!
//! ```yaml
//! apiVersion: v1
//! name: nginx-ingress
//! version: 1.26.1
//! appVersion: 0.26.1
//! description: An nginx Ingress controller
//! keywords:
//!   - ingress
//!   - stable
//! tillerVersion: 2.14.0
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The canonical manifest filename inside a chart directory.
pub const CHARTFILE_NAME: &str = "Chart.yaml";

/// Metadata declared by a chart manifest.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    /// Chart name.
    pub name: String,
    /// Semver version string. Not validated at load time.
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<Maintainer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Tiller version the chart is compatible with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiller_version: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ChartMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Parse manifest YAML.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// A chart maintainer entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Maintainer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Loads chart metadata for a chart location.
pub trait ManifestLoader {
    fn load(&self, location: &Path) -> Result<ChartMetadata>;
}

impl<F> ManifestLoader for F
where
    F: Fn(&Path) -> Result<ChartMetadata>,
{
    fn load(&self, location: &Path) -> Result<ChartMetadata> {
        self(location)
    }
}

/// Reads `<location>/Chart.yaml` from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartfileLoader;

impl ChartfileLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestLoader for ChartfileLoader {
    fn load(&self, location: &Path) -> Result<ChartMetadata> {
        let path = location.join(CHARTFILE_NAME);
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        ChartMetadata::from_yaml(&content)
    }
}
