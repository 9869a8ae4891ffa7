//! Version resolution for the `cmd-harness` binary.

use semver::{BuildMetadata, Prerelease, Version};
use tracing::debug;

/// Version string stamped in at compile time.
///
/// Release builds set `COMMAND_HARNESS_VERSION` (for example to the Git tag,
/// `v1.2.3`). When it is absent the string is empty and
/// [`current_version`] reports [`fallback_version`].
pub const BUILD_VERSION: &str = match option_env!("COMMAND_HARNESS_VERSION") {
    Some(version) => version,
    None => "",
};

const FALLBACK_MAJOR: u64 = 1;
const FALLBACK_MINOR: u64 = 14;
const FALLBACK_PATCH: u64 = 0;
const FALLBACK_PRE: &str = "git";
const FALLBACK_BUILD: &str = "HEAD";

/// The version reported when no valid version was stamped in: `1.14.0-git+HEAD`.
pub fn fallback_version() -> Version {
    Version {
        major: FALLBACK_MAJOR,
        minor: FALLBACK_MINOR,
        patch: FALLBACK_PATCH,
        pre: Prerelease::new(FALLBACK_PRE).unwrap_or(Prerelease::EMPTY),
        build: BuildMetadata::new(FALLBACK_BUILD).unwrap_or(BuildMetadata::EMPTY),
    }
}

/// Parses `raw` as a semantic version, ignoring one leading `v`.
///
/// Anything that is not a valid `MAJOR.MINOR.PATCH[-PRE][+BUILD]` string
/// resolves to [`fallback_version`]; this never fails.
pub fn resolve_version(raw: &str) -> Version {
    let trimmed = raw.strip_prefix('v').unwrap_or(raw);
    match Version::parse(trimmed) {
        Ok(version) => version,
        Err(err) => {
            debug!(raw, error = %err, "invalid version string, using fallback");
            fallback_version()
        }
    }
}

/// The resolved version of this build.
pub fn current_version() -> Version {
    resolve_version(BUILD_VERSION)
}

/// Dot-separated identifiers of the pre-release part (empty when absent).
pub fn prerelease_identifiers(version: &Version) -> Vec<&str> {
    identifiers(version.pre.as_str())
}

/// Dot-separated identifiers of the build metadata (empty when absent).
pub fn build_identifiers(version: &Version) -> Vec<&str> {
    identifiers(version.build.as_str())
}

fn identifiers(part: &str) -> Vec<&str> {
    if part.is_empty() {
        Vec::new()
    } else {
        part.split('.').collect()
    }
}
