use std::cmp::Ordering;

use semver::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDirection {
    Upgrade,
    Downgrade,
    Same,
}

/// A version without a prerelease component. Strings that are not semver are
/// not considered stable.
#[must_use]
pub fn is_stable(version: &str) -> bool {
    Version::parse(version).is_ok_and(|parsed| parsed.pre.is_empty())
}

#[must_use]
pub fn is_valid_version(version: &str) -> bool {
    parse_version(version).is_some()
}

/// Compare `target` against `current`. `None` when either side is not semver,
/// since there is no direction to report.
#[must_use]
pub fn update_direction(target: &str, current: &str) -> Option<UpdateDirection> {
    let target = parse_version(target)?;
    let current = parse_version(current)?;
    Some(match target.cmp_precedence(&current) {
        Ordering::Greater => UpdateDirection::Upgrade,
        Ordering::Less => UpdateDirection::Downgrade,
        Ordering::Equal => UpdateDirection::Same,
    })
}

fn parse_version(version: &str) -> Option<Version> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    Version::parse(version).ok()
}
