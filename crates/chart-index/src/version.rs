//! Semantic-version range parsing and containment checks.
//!
//! Range expressions are comparator lists:
//!
//! - Comparators `>`, `>=`, `<`, `<=`, `=`, `==`, `!`, `!=`, or a bare
//!   version (equality)
//! - Whitespace or commas join comparators that must all hold
//! - `||` joins alternatives, any of which may hold
//!
//! Every version must be a full `major.minor.patch` semantic version.
//!
//! # Examples
//!
//! ```
//! use chart_index::version::{VersionRange, matches};
//!
//! let range = VersionRange::parse(">=1.2.3 <2.0.0").unwrap();
//! assert!(range.satisfies_str("1.5.0").unwrap());
//! assert!(!range.satisfies_str("2.0.0").unwrap());
//!
//! assert!(matches("<1.0.0 || >=3.0.0", "3.1.0").unwrap());
//! assert!(matches(">=1.0.0", "not-a-version").is_err());
//! ```

use std::cmp::Ordering;

use semver::Version;

use crate::error::{Error, Result};

/// A single version comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    /// `>=`
    Gte,
    /// `>`
    Gt,
    /// `<=`
    Lte,
    /// `<`
    Lt,
    /// `=`, `==`, or a bare version
    Eq,
    /// `!`, `!=`
    Ne,
}

/// Operator prefixes, longest first so `>=` wins over `>`.
const OPERATORS: [(&str, CompareOp); 8] = [
    (">=", CompareOp::Gte),
    ("<=", CompareOp::Lte),
    ("!=", CompareOp::Ne),
    ("==", CompareOp::Eq),
    (">", CompareOp::Gt),
    ("<", CompareOp::Lt),
    ("=", CompareOp::Eq),
    ("!", CompareOp::Ne),
];

/// An operator paired with a version.
#[derive(Debug, Clone)]
struct Comparator {
    op: CompareOp,
    version: Version,
}

impl Comparator {
    fn matches(&self, candidate: &Version) -> bool {
        let ord = cmp_precedence(candidate, &self.version);
        match self.op {
            CompareOp::Gte => ord != Ordering::Less,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Lte => ord != Ordering::Greater,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
        }
    }
}

/// A parsed version range that can be checked against concrete versions.
#[derive(Debug, Clone)]
pub struct VersionRange {
    /// OR of ANDs.
    alternatives: Vec<Vec<Comparator>>,
    /// The original expression for display.
    raw: String,
}

impl VersionRange {
    /// Parse a range expression such as `>=1.2.3 <2.0.0`.
    pub fn parse(expr: &str) -> Result<Self> {
        let raw = expr.to_string();
        let mut alternatives = Vec::new();

        for part in expr.split("||") {
            let comparators = parse_conjunction(part).map_err(|reason| Error::InvalidRange {
                range: raw.clone(),
                reason,
            })?;
            alternatives.push(comparators);
        }

        Ok(Self { alternatives, raw })
    }

    /// Check whether `candidate` lies in this range.
    pub fn satisfies(&self, candidate: &Version) -> bool {
        self.alternatives
            .iter()
            .any(|all| all.iter().all(|c| c.matches(candidate)))
    }

    /// Parse `candidate` as an exact version and check it against this range.
    pub fn satisfies_str(&self, candidate: &str) -> Result<bool> {
        let version = parse_version(candidate)?;
        Ok(self.satisfies(&version))
    }

    /// Return the original range expression.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for VersionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Check whether `candidate` satisfies `range_expr`.
///
/// Fails if either side is not valid semantic-version syntax.
pub fn matches(range_expr: &str, candidate: &str) -> Result<bool> {
    VersionRange::parse(range_expr)?.satisfies_str(candidate)
}

/// Parse an exact semantic version, ignoring surrounding whitespace.
pub fn parse_version(s: &str) -> Result<Version> {
    let trimmed = s.trim();
    Version::parse(trimmed).map_err(|source| Error::InvalidVersion {
        version: s.to_string(),
        source,
    })
}

/// Compare two versions by semantic-version precedence.
///
/// Build metadata is ignored, so `1.2.3+build.1` and `1.2.3` are equal.
/// `semver`'s own `Ord` breaks ties on build metadata.
pub fn cmp_precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch)
        .cmp(&(b.major, b.minor, b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

/// Parse the comparators of one `||` alternative.
fn parse_conjunction(part: &str) -> std::result::Result<Vec<Comparator>, String> {
    let normalized = part.replace(',', " ");
    let mut tokens = normalized.split_whitespace();
    let mut comparators = Vec::new();

    while let Some(token) = tokens.next() {
        // Operator written apart from its version (`>= 1.2.3`)
        let joined;
        let token = if is_bare_operator(token) {
            let Some(next) = tokens.next() else {
                return Err(format!("operator '{token}' has no version"));
            };
            joined = format!("{token}{next}");
            joined.as_str()
        } else {
            token
        };
        comparators.push(parse_comparator(token)?);
    }

    if comparators.is_empty() {
        return Err("empty range".to_string());
    }

    Ok(comparators)
}

fn is_bare_operator(token: &str) -> bool {
    OPERATORS.iter().any(|(prefix, _)| *prefix == token)
}

/// Parse a single comparator like `>=1.2.3` or `<2.0.0-rc.1`.
fn parse_comparator(s: &str) -> std::result::Result<Comparator, String> {
    let (op, version_str) = OPERATORS
        .iter()
        .find_map(|(prefix, op)| s.strip_prefix(prefix).map(|rest| (*op, rest)))
        .unwrap_or((CompareOp::Eq, s));

    let version = Version::parse(version_str)
        .map_err(|e| format!("invalid version '{version_str}': {e}"))?;

    Ok(Comparator { op, version })
}
