//! Subscription filtering of a chart index.
//!
//! Filters run in a fixed order:
//!
//! 1. Drop every bucket not named by the subscription.
//! 2. Within the remaining buckets, keep a version only if its keywords,
//!    Tiller version, and version all pass the policy.
//! 3. Drop buckets left without versions.
//!
//! Keys are snapshotted before each mutating pass. A version that fails
//! to parse is excluded, never fatal.

use std::path::Path;

use crate::error::{Error, Result};
use crate::index::{ChartIndex, ChartVersion, IndexBuilder, IndexFile};
use crate::manifest::ManifestLoader;
use crate::policy::SubscriptionFilterPolicy;
use crate::selector::keywords_match;
use crate::version::VersionRange;

/// Narrow `index` in place to the versions `policy` subscribes to.
///
/// An index left with no entries is a successful result.
///
/// # Errors
///
/// Returns [`Error::MissingPackageName`] when the policy names no package.
/// The index is not modified in that case.
pub fn filter_charts<I: ChartIndex + ?Sized>(
    index: &mut I,
    policy: &SubscriptionFilterPolicy,
) -> Result<()> {
    remove_non_matching_name(index, policy)?;
    filter_on_version(index, policy);
    Ok(())
}

/// Build an index from `locations` and filter it with `policy`.
pub fn generate_index<L, It, P>(
    builder: &IndexBuilder<L>,
    locations: It,
    root_prefix: impl AsRef<Path>,
    policy: &SubscriptionFilterPolicy,
) -> Result<IndexFile>
where
    L: ManifestLoader,
    It: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut index = builder.build(locations, root_prefix)?;
    filter_charts(&mut index, policy)?;
    Ok(index)
}

/// Whether a single chart version passes every check in `policy`.
pub fn version_matches(policy: &SubscriptionFilterPolicy, chart: &ChartVersion) -> bool {
    keywords_match(policy.keyword_selector.as_ref(), chart.keywords())
        && check_secondary_tool_version(policy, chart)
        && check_version(policy, chart)
}

fn remove_non_matching_name<I: ChartIndex + ?Sized>(
    index: &mut I,
    policy: &SubscriptionFilterPolicy,
) -> Result<()> {
    let package = policy.package_name.as_str();
    if package.trim().is_empty() {
        tracing::error!(
            "subscription.spec.package is missing for subscription: {}",
            policy.subscription
        );
        return Err(Error::MissingPackageName {
            subscription: policy.subscription.clone(),
        });
    }

    let keys: Vec<String> = index.entries().keys().cloned().collect();
    let entries = index.entries_mut();
    for key in keys {
        if key != package {
            entries.remove(&key);
        }
    }

    tracing::debug!(
        "After name matching: {:?}",
        index.entries().keys().collect::<Vec<_>>()
    );

    Ok(())
}

fn filter_on_version<I: ChartIndex + ?Sized>(index: &mut I, policy: &SubscriptionFilterPolicy) {
    let keys: Vec<String> = index.entries().keys().cloned().collect();
    let entries = index.entries_mut();

    for key in keys {
        let Some(versions) = entries.get_mut(&key) else {
            continue;
        };
        versions.retain(|chart| version_matches(policy, chart));

        if versions.is_empty() {
            entries.remove(&key);
        }
    }

    tracing::debug!(
        "After version matching: {} chart(s), {} version(s)",
        index.entries().len(),
        index.entries().values().map(Vec::len).sum::<usize>()
    );
}

/// Set range + present version: must match. Set range + no version: fails.
/// No range: passes.
fn check_secondary_tool_version(policy: &SubscriptionFilterPolicy, chart: &ChartVersion) -> bool {
    let Some(range) = policy.secondary_tool_version_range.as_deref() else {
        return true;
    };

    let Some(tiller_version) = chart.secondary_tool_version() else {
        tracing::debug!(
            "{} {} declares no tillerVersion",
            chart.name(),
            chart.version()
        );
        return false;
    };

    range_accepts(range, tiller_version, "tillerVersion", chart)
}

fn check_version(policy: &SubscriptionFilterPolicy, chart: &ChartVersion) -> bool {
    let Some(range) = policy.version_range.as_deref() else {
        tracing::trace!("Version check passed for {} {}", chart.name(), chart.version());
        return true;
    };

    range_accepts(range, chart.version(), "version", chart)
}

/// Check `candidate` against `range`. Parse failures on either side exclude
/// the chart with a warning.
fn range_accepts(range: &str, candidate: &str, field: &str, chart: &ChartVersion) -> bool {
    let checked = VersionRange::parse(range).and_then(|range| {
        let matched = range.satisfies_str(candidate)?;
        if !matched {
            tracing::trace!(
                "{} {} {} is outside {}",
                chart.name(),
                field,
                candidate,
                range.as_str()
            );
        }
        Ok(matched)
    });

    match checked {
        Ok(matched) => matched,
        Err(e) => {
            tracing::warn!(
                "Error while checking {} {} of {}: {}",
                field,
                candidate,
                chart.name(),
                e
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::GENERATED_BY;
    use crate::manifest::ChartMetadata;
    use crate::selector::{LabelSelector, LabelSelectorRequirement, SelectorOperator};

    fn chart(name: &str, version: &str) -> ChartVersion {
        ChartVersion::new(ChartMetadata::new(name, version), name, GENERATED_BY)
    }

    fn with_tiller(mut chart: ChartVersion, tiller: &str) -> ChartVersion {
        chart.metadata.tiller_version = Some(tiller.to_string());
        chart
    }

    #[test]
    fn test_check_version_unset_passes_anything() {
        let policy = SubscriptionFilterPolicy::new("app");
        assert!(check_version(&policy, &chart("app", "not-a-version")));
    }

    #[test]
    fn test_check_version_malformed_candidate_fails() {
        let policy = SubscriptionFilterPolicy::new("app").with_version_range(">=1.0.0");
        assert!(!check_version(&policy, &chart("app", "not-a-version")));
    }

    #[test]
    fn test_check_version_malformed_range_fails() {
        let policy = SubscriptionFilterPolicy::new("app").with_version_range(">=one");
        assert!(!check_version(&policy, &chart("app", "1.0.0")));
    }

    #[test]
    fn test_check_version_empty_range_is_configured() {
        let policy = SubscriptionFilterPolicy::new("app").with_version_range("");
        assert!(!check_version(&policy, &chart("app", "1.0.0")));
    }

    #[test]
    fn test_secondary_unset_passes() {
        let policy = SubscriptionFilterPolicy::new("app");
        assert!(check_secondary_tool_version(&policy, &chart("app", "1.0.0")));
    }

    #[test]
    fn test_secondary_set_without_chart_value_fails() {
        let policy = SubscriptionFilterPolicy::new("app").with_secondary_tool_version_range(">=2.0.0");
        assert!(!check_secondary_tool_version(&policy, &chart("app", "1.0.0")));
    }

    #[test]
    fn test_secondary_range_checked() {
        let policy = SubscriptionFilterPolicy::new("app").with_secondary_tool_version_range(">=2.10.0");
        assert!(check_secondary_tool_version(
            &policy,
            &with_tiller(chart("app", "1.0.0"), "2.14.0")
        ));
        assert!(!check_secondary_tool_version(
            &policy,
            &with_tiller(chart("app", "1.0.0"), "2.9.0")
        ));
        assert!(!check_secondary_tool_version(
            &policy,
            &with_tiller(chart("app", "1.0.0"), "latest")
        ));
    }

    #[test]
    fn test_range_accepts_tiller_build_metadata() {
        let app = chart("app", "1.0.0");
        assert!(range_accepts("<=2.14.0", "2.14.0+ee", "tillerVersion", &app));
        assert!(!range_accepts(">2.14.0", "2.14.0+ee", "tillerVersion", &app));
        assert!(!range_accepts(">=2.0.0 <", "2.14.0", "tillerVersion", &app));
    }

    #[test]
    fn test_version_matches_requires_all_checks() {
        let policy = SubscriptionFilterPolicy::new("app")
            .with_version_range(">=1.0.0")
            .with_keyword_selector(LabelSelector::new().with_expression(
                LabelSelectorRequirement::new("stable", SelectorOperator::Exists, &[]),
            ));

        let mut keyworded = chart("app", "1.0.0");
        keyworded.metadata.keywords = vec!["stable".to_string()];
        assert!(version_matches(&policy, &keyworded));

        assert!(!version_matches(&policy, &chart("app", "1.0.0")));

        let mut old = chart("app", "0.9.0");
        old.metadata.keywords = vec!["stable".to_string()];
        assert!(!version_matches(&policy, &old));
    }

    #[test]
    fn test_missing_name_leaves_index_untouched() {
        let mut index = IndexFile::new();
        index.add_entry("app", chart("app", "1.0.0"));
        index.add_entry("db", chart("db", "1.0.0"));
        let before = index.clone();

        let err = filter_charts(&mut index, &SubscriptionFilterPolicy::new("  ")).unwrap_err();
        assert!(matches!(err, Error::MissingPackageName { .. }));
        assert_eq!(index, before);
    }
}
