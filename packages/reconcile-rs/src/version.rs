//! Semantic-version negotiation.
//!
//! Version strings on portal objects follow semver. New versions are
//! numbered either by bumping the existing latest (minor or patch) or by
//! using a caller-supplied exact string, which is only accepted when it
//! sorts strictly above the existing latest.

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version assigned to the first version of an owner object unless the
/// caller overrides it.
pub const INITIAL_VERSION: &str = "1.0.0";

/// A version string that does not parse as semver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid semantic version `{version}`")]
pub struct VersionError {
    pub version: String,
}

/// How the next version string is derived from the existing latest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionStrategy {
    BumpMinor,
    BumpPatch,
    /// Use the supplied string verbatim. Rejected unless strictly greater
    /// than the existing latest version.
    Exact { version: String },
}

/// The two components a bump strategy may increment. `Exact` has no bump,
/// so passing it where a bump is required is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Minor,
    Patch,
}

impl VersionStrategy {
    pub fn bump(&self) -> Option<VersionBump> {
        match self {
            VersionStrategy::BumpMinor => Some(VersionBump::Minor),
            VersionStrategy::BumpPatch => Some(VersionBump::Patch),
            VersionStrategy::Exact { .. } => None,
        }
    }
}

pub(crate) fn parse(s: &str) -> Result<Version, VersionError> {
    Version::parse(s).map_err(|_| VersionError {
        version: s.to_string(),
    })
}

/// True iff `s` parses as a semantic version. Never panics.
pub fn is_valid_version(s: &str) -> bool {
    Version::parse(s).is_ok()
}

/// Increment the minor or patch component, resetting lower components to
/// zero and clearing pre-release/build metadata, per semver rules.
pub fn next_version(from: &str, bump: VersionBump) -> Result<String, VersionError> {
    let current = parse(from)?;
    let next = match bump {
        VersionBump::Minor => Version::new(current.major, current.minor + 1, 0),
        VersionBump::Patch => Version::new(current.major, current.minor, current.patch + 1),
    };
    Ok(next.to_string())
}

/// Strict semver ordering: true iff `candidate > baseline`.
pub fn is_greater(candidate: &str, baseline: &str) -> Result<bool, VersionError> {
    Ok(parse(candidate)? > parse(baseline)?)
}

/// Pick the reference to the highest semver string in `versions`.
/// Entries that fail to parse are skipped.
pub fn latest<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .filter_map(|s| parse(s).ok().map(|v| (v, s)))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, s)| s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_version() {
        assert!(is_valid_version("1.0.0"));
        assert!(is_valid_version("1.2.3-rc.1"));
        assert!(is_valid_version("1.2.3+build.5"));
        assert!(!is_valid_version("1.0"));
        assert!(!is_valid_version("v1.0.0"));
        assert!(!is_valid_version("latest"));
        assert!(!is_valid_version(""));
    }

    #[test]
    fn test_bump_patch() {
        assert_eq!(next_version("1.2.0", VersionBump::Patch).unwrap(), "1.2.1");
        assert_eq!(next_version("0.0.9", VersionBump::Patch).unwrap(), "0.0.10");
    }

    #[test]
    fn test_bump_minor_resets_patch() {
        assert_eq!(next_version("1.2.0", VersionBump::Minor).unwrap(), "1.3.0");
        assert_eq!(next_version("1.2.7", VersionBump::Minor).unwrap(), "1.3.0");
    }

    #[test]
    fn test_bump_clears_prerelease() {
        assert_eq!(
            next_version("1.2.3-rc.1", VersionBump::Patch).unwrap(),
            "1.2.4"
        );
    }

    #[test]
    fn test_next_version_rejects_malformed_input() {
        let err = next_version("not-a-version", VersionBump::Patch).unwrap_err();
        assert_eq!(err.version, "not-a-version");
    }

    #[test]
    fn test_is_greater_is_strict() {
        assert!(is_greater("1.2.1", "1.2.0").unwrap());
        assert!(!is_greater("1.2.0", "1.2.0").unwrap());
        assert!(!is_greater("1.1.9", "1.2.0").unwrap());
        // Numeric ordering, not lexicographic.
        assert!(is_greater("1.10.0", "1.9.0").unwrap());
    }

    #[test]
    fn test_latest_picks_semver_maximum() {
        let versions = ["1.2.0", "1.10.0", "1.9.3"];
        assert_eq!(latest(versions.iter().copied()), Some("1.10.0"));
        assert_eq!(latest(std::iter::empty()), None);
    }

    #[test]
    fn test_strategy_bump_mapping() {
        assert_eq!(VersionStrategy::BumpMinor.bump(), Some(VersionBump::Minor));
        assert_eq!(VersionStrategy::BumpPatch.bump(), Some(VersionBump::Patch));
        assert_eq!(
            VersionStrategy::Exact {
                version: "2.0.0".into()
            }
            .bump(),
            None
        );
    }
}
