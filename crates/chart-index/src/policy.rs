//! Subscription documents and the filter policy extracted from them.
//!
//! A subscription names the chart it wants and optionally narrows the
//! versions it accepts. It can be written as TOML, JSON, or YAML:
//!
//! ```yaml
//! name: nginx-sub
//! namespace: default
//! spec:
//!   package: nginx-ingress
//!   packageFilter:
//!     version: ">=1.20.0 <2.0.0"
//!     annotations:
//!       tillerVersion: ">=2.10.0"
//!     labelSelector:
//!       matchLabels:
//!         stable: stable
//!   packageOverrides:
//!     - packageName: nginx-ingress
//!       packageAlias: ingress
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::selector::LabelSelector;

/// Package filter annotation carrying the Tiller version range.
pub const SECONDARY_TOOL_VERSION_ANNOTATION: &str = "tillerVersion";

/// A chart subscription document.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Subscription {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub spec: SubscriptionSpec,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSpec {
    /// Name of the subscribed chart.
    #[serde(default)]
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_filter: Option<PackageFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub package_overrides: Vec<PackageOverride>,
}

/// Optional narrowing of the subscribed chart's versions.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageFilter {
    /// Version range, e.g. `">=1.2.3 <2.0.0"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<LabelSelector>,
}

/// Per-package customization declared by a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageOverride {
    pub package_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_alias: Option<String>,
}

impl Subscription {
    /// Load a subscription from a file.
    ///
    /// Format is detected from file extension:
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.yaml`, `.yml` -> YAML
    pub fn load(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let format = match extension.as_str() {
            "toml" => "TOML",
            "json" => "JSON",
            "yaml" | "yml" => "YAML",
            _ => return Err(Error::UnsupportedFormat { extension }),
        };

        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        let parsed: std::result::Result<Self, String> = match format {
            "TOML" => toml::from_str(&content).map_err(|e| e.to_string()),
            "JSON" => serde_json::from_str(&content).map_err(|e| e.to_string()),
            _ => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| Error::ConfigParse {
            path: path.to_path_buf(),
            format: format.into(),
            message,
        })
    }

    /// `namespace/name`, or just the name when no namespace is set.
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.namespace, self.name)
        }
    }
}

/// Constraints one filtering pass applies to an index.
///
/// Unset optional fields accept everything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubscriptionFilterPolicy {
    /// Exact chart name. Required.
    pub package_name: String,
    pub version_range: Option<String>,
    /// Range the chart's Tiller version must satisfy.
    pub secondary_tool_version_range: Option<String>,
    pub keyword_selector: Option<LabelSelector>,
    pub package_overrides: Vec<PackageOverride>,
    /// Owning subscription, for error messages.
    pub subscription: String,
}

impl SubscriptionFilterPolicy {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            ..Self::default()
        }
    }

    pub fn with_version_range(mut self, range: impl Into<String>) -> Self {
        self.version_range = Some(range.into());
        self
    }

    pub fn with_secondary_tool_version_range(mut self, range: impl Into<String>) -> Self {
        self.secondary_tool_version_range = Some(range.into());
        self
    }

    pub fn with_keyword_selector(mut self, selector: LabelSelector) -> Self {
        self.keyword_selector = Some(selector);
        self
    }

    /// Alias declared for `package_name` by the first override that sets one.
    pub fn package_alias(&self, package_name: &str) -> Option<&str> {
        self.package_overrides
            .iter()
            .filter(|o| o.package_name == package_name)
            .find_map(|o| o.package_alias.as_deref().filter(|a| !a.is_empty()))
            .inspect(|_| tracing::info!("Overrides for package {} found", package_name))
    }
}

impl From<&Subscription> for SubscriptionFilterPolicy {
    fn from(sub: &Subscription) -> Self {
        let filter = sub.spec.package_filter.as_ref();

        Self {
            package_name: sub.spec.package.clone(),
            version_range: filter.and_then(|f| f.version.clone()),
            secondary_tool_version_range: filter
                .and_then(|f| f.annotations.get(SECONDARY_TOOL_VERSION_ANNOTATION).cloned()),
            keyword_selector: filter.and_then(|f| f.label_selector.clone()),
            package_overrides: sub.spec.package_overrides.clone(),
            subscription: sub.qualified_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const YAML: &str = r#"
name: nginx-sub
namespace: default
spec:
  package: nginx-ingress
  packageFilter:
    version: ">=1.20.0 <2.0.0"
    annotations:
      tillerVersion: ">=2.10.0"
    labelSelector:
      matchLabels:
        stable: stable
  packageOverrides:
    - packageName: nginx-ingress
      packageAlias: ingress
"#;

    #[test]
    fn test_policy_from_subscription() {
        let sub: Subscription = serde_yaml::from_str(YAML).unwrap();
        let policy = SubscriptionFilterPolicy::from(&sub);

        assert_eq!(policy.package_name, "nginx-ingress");
        assert_eq!(policy.version_range.as_deref(), Some(">=1.20.0 <2.0.0"));
        assert_eq!(policy.secondary_tool_version_range.as_deref(), Some(">=2.10.0"));
        assert_eq!(
            policy.keyword_selector,
            Some(LabelSelector::new().with_label("stable", "stable"))
        );
        assert_eq!(policy.subscription, "default/nginx-sub");
    }

    #[test]
    fn test_policy_without_filter_is_unconstrained() {
        let sub: Subscription = serde_yaml::from_str("name: s\nspec:\n  package: app\n").unwrap();
        let policy = SubscriptionFilterPolicy::from(&sub);

        assert_eq!(policy, SubscriptionFilterPolicy {
            subscription: "s".to_string(),
            ..SubscriptionFilterPolicy::new("app")
        });
    }

    #[test]
    fn test_unrelated_annotations_ignored() {
        let sub: Subscription = serde_yaml::from_str(
            "spec:\n  package: app\n  packageFilter:\n    annotations:\n      owner: team\n",
        )
        .unwrap();
        let policy = SubscriptionFilterPolicy::from(&sub);
        assert_eq!(policy.secondary_tool_version_range, None);
    }

    #[test]
    fn test_package_alias() {
        let sub: Subscription = serde_yaml::from_str(YAML).unwrap();
        let policy = SubscriptionFilterPolicy::from(&sub);

        assert_eq!(policy.package_alias("nginx-ingress"), Some("ingress"));
        assert_eq!(policy.package_alias("redis"), None);
    }

    #[test]
    fn test_package_alias_skips_empty_overrides() {
        let mut policy = SubscriptionFilterPolicy::new("app");
        policy.package_overrides = vec![
            PackageOverride {
                package_name: "app".to_string(),
                package_alias: Some(String::new()),
            },
            PackageOverride {
                package_name: "app".to_string(),
                package_alias: Some("my-app".to_string()),
            },
        ];
        assert_eq!(policy.package_alias("app"), Some("my-app"));
    }

    #[test]
    fn test_load_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sub.yaml");
        std::fs::write(&path, YAML).unwrap();

        let sub = Subscription::load(&path).unwrap();
        assert_eq!(sub.spec.package, "nginx-ingress");
    }

    #[test]
    fn test_load_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sub.toml");
        std::fs::write(
            &path,
            r#"
name = "sub"

[spec]
package = "app"

[spec.packageFilter]
version = ">=1.5.0"

[spec.packageFilter.annotations]
tillerVersion = ">=2.0.0"
"#,
        )
        .unwrap();

        let policy = SubscriptionFilterPolicy::from(&Subscription::load(&path).unwrap());
        assert_eq!(policy.package_name, "app");
        assert_eq!(policy.version_range.as_deref(), Some(">=1.5.0"));
        assert_eq!(policy.secondary_tool_version_range.as_deref(), Some(">=2.0.0"));
    }

    #[test]
    fn test_load_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sub.json");
        std::fs::write(&path, r#"{"spec": {"package": "app"}}"#).unwrap();

        assert_eq!(Subscription::load(&path).unwrap().spec.package, "app");
    }

    #[test]
    fn test_load_unsupported_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sub.ini");
        std::fs::write(&path, "").unwrap();

        assert!(matches!(
            Subscription::load(&path),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_load_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sub.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Subscription::load(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { ref format, .. } if format == "JSON"));
    }
}
