//! Chart location naming relative to a repository root

/// A chart directory split into its display name and its base directory
/// relative to the repository root.
///
/// Paths are normalized to forward slashes, so `C:\repo\stable\nginx`
/// and `C:/repo/stable/nginx/` derive the same location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChartLocation {
    name: String,
    base_dir: String,
}

impl ChartLocation {
    /// Derive the chart name and base directory of `location` under `root_prefix`.
    ///
    /// A location outside `root_prefix` keeps its full parent path as base directory.
    pub fn derive(location: &str, root_prefix: &str) -> Self {
        let location = normalize(location);
        let root = normalize(root_prefix);

        let (parent, name) = match location.rfind('/') {
            Some(idx) => (&location[..idx], &location[idx + 1..]),
            None => ("", location.as_str()),
        };

        let base_dir = if parent == root {
            ""
        } else if let Some(rest) = parent
            .strip_prefix(root.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
        {
            rest
        } else if root.is_empty() || root == "/" {
            parent.trim_start_matches('/')
        } else {
            parent
        };

        Self {
            name: name.to_string(),
            base_dir: base_dir.to_string(),
        }
    }

    /// The final path segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent directory relative to the root, without slashes at either end.
    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// `<base_dir>/<name>`, or just the name when the chart sits at the root.
    pub fn url(&self) -> String {
        if self.base_dir.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.base_dir, self.name)
        }
    }
}

impl std::fmt::Display for ChartLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url())
    }
}

fn normalize(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let trimmed = normalized.trim_end_matches('/');
    if trimmed.is_empty() && normalized.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
