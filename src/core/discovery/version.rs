//! Server version wrapper.
//!
//! ownCloud-family servers report four-part versions ("10.9.0.4") that are not
//! valid semver. The raw string is always kept; a lenient semver view is built
//! from the first three numeric components when possible, and the fourth is
//! kept alongside it as the build number.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct ServerVersion {
    raw: String,
    parsed: Option<semver::Version>,
    /// Fourth numeric component, absent for three-part versions
    build: Option<u64>,
}

impl ServerVersion {
    /// Parse a reported version. Never fails; check `is_valid()` if it matters.
    pub fn parse(raw: &str) -> Self {
        let (parsed, build) = match lenient_semver(raw) {
            Some((version, build)) => (Some(version), build),
            None => (None, None),
        };
        Self {
            raw: raw.to_string(),
            parsed,
            build,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn semver(&self) -> Option<&semver::Version> {
        self.parsed.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.parsed.is_some()
    }

    pub fn major(&self) -> Option<u64> {
        self.parsed.as_ref().map(|v| v.major)
    }

    pub fn minor(&self) -> Option<u64> {
        self.parsed.as_ref().map(|v| v.minor)
    }

    pub fn patch(&self) -> Option<u64> {
        self.parsed.as_ref().map(|v| v.patch)
    }

    pub fn build(&self) -> Option<u64> {
        self.build
    }

    fn numeric_key(&self) -> Option<(&semver::Version, u64)> {
        self.parsed
            .as_ref()
            .map(|version| (version, self.build.unwrap_or(0)))
    }
}

fn lenient_semver(raw: &str) -> Option<(semver::Version, Option<u64>)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Exact semver first so pre-release tags survive
    if let Ok(version) = semver::Version::parse(trimmed) {
        return Some((version, None));
    }

    let mut parts = [0u64; 4];
    let mut seen = 0;
    for component in trimmed.split('.').take(4) {
        let digits: String = component.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            break;
        }
        parts[seen] = digits.parse().ok()?;
        seen += 1;
        if digits.len() != component.len() {
            // Suffix like "0beta": keep what was read so far
            break;
        }
    }

    if seen == 0 {
        return None;
    }
    let build = (seen == 4).then_some(parts[3]);
    Some((semver::Version::new(parts[0], parts[1], parts[2]), build))
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl PartialEq for ServerVersion {
    fn eq(&self, other: &Self) -> bool {
        match (self.numeric_key(), other.numeric_key()) {
            (Some(a), Some(b)) => a == b,
            _ => self.raw == other.raw,
        }
    }
}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.numeric_key(), other.numeric_key()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ if self.raw == other.raw => Some(Ordering::Equal),
            _ => None,
        }
    }
}
