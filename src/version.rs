//! Dotted version parsing and ordering used to pick update targets.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub raw: String,
}

impl ParsedVersion {
    fn key(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

/// Parses up to three dot-separated numeric segments.
///
/// Never fails: missing or non-numeric segments become zero. The catalog's
/// `go` tag (`go1.22.1`) is stripped before splitting.
pub fn parse(s: &str) -> ParsedVersion {
    let numeric = s.strip_prefix("go").unwrap_or(s);
    let mut segments = numeric
        .split('.')
        .map(|segment| segment.parse::<u64>().unwrap_or(0));

    ParsedVersion {
        major: segments.next().unwrap_or(0),
        minor: segments.next().unwrap_or(0),
        patch: segments.next().unwrap_or(0),
        raw: s.to_string(),
    }
}

/// True when `a` sorts before `b` in descending order.
pub fn compare_desc(a: &ParsedVersion, b: &ParsedVersion) -> bool {
    ordering(a, b) == Ordering::Greater
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestVersions {
    pub patch: Option<ParsedVersion>,
    pub minor: Option<ParsedVersion>,
    pub major: Option<ParsedVersion>,
}

/// Finds the newest candidate sharing `current`'s major.minor (patch), the
/// newest sharing its major (minor) and the newest overall (major).
pub fn find_latest<S: AsRef<str>>(current: &str, candidates: &[S]) -> LatestVersions {
    let current = parse(current);

    let mut sorted: Vec<ParsedVersion> = candidates.iter().map(|c| parse(c.as_ref())).collect();
    // Stable sort keeps catalog order among equal keys.
    sorted.sort_by(|a, b| ordering(b, a));

    let mut latest = LatestVersions::default();
    for version in sorted {
        if latest.patch.is_none() && version.major == current.major && version.minor == current.minor {
            latest.patch = Some(version.clone());
        }
        if latest.minor.is_none() && version.major == current.major {
            latest.minor = Some(version.clone());
        }
        if latest.major.is_none() {
            latest.major = Some(version);
        }
        if latest.patch.is_some() && latest.minor.is_some() && latest.major.is_some() {
            break;
        }
    }
    latest
}

pub fn ordering(a: &ParsedVersion, b: &ParsedVersion) -> Ordering {
    a.key().cmp(&b.key())
}
