use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

fn digits() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"[0-9]+").unwrap())
}

fn segments() -> &'static Regex {
    static SEGMENTS: OnceLock<Regex> = OnceLock::new();
    SEGMENTS.get_or_init(|| Regex::new(r"[0-9]+|[^0-9]+").unwrap())
}

/// Generation number of a model identifier, i.e. the first run of digits.
///
/// `iPhone14,5` -> 14, `Mac15,3` -> 15. Identifiers without digits (or with a
/// run too large for a u32) rank as 0.
pub fn generation(identifier: &str) -> u32 {
    digits()
        .find(identifier)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Compare two version strings the way a person would sort them in a file
/// browser: runs of digits compare by numeric value, everything else
/// compares case-insensitively.
///
/// So `17.2 > 17.1.2`, `17.10 > 17.2` and `17.2 < 17.2.1`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = segments().find_iter(a).map(|m| m.as_str());
    let mut right = segments().find_iter(b).map(|m| m.as_str());

    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => compare_segment(l, r),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

fn is_numeric(segment: &str) -> bool {
    segment.bytes().all(|b| b.is_ascii_digit())
}

fn compare_segment(l: &str, r: &str) -> Ordering {
    match (is_numeric(l), is_numeric(r)) {
        (true, true) => {
            // compare by magnitude without parsing, so arbitrarily long runs work
            let l = l.trim_start_matches('0');
            let r = r.trim_start_matches('0');
            l.len().cmp(&r.len()).then_with(|| l.cmp(r))
        }
        // digits sort before text, e.g. "17.0.1" < "17.0 beta"
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => l.to_lowercase().cmp(&r.to_lowercase()),
    }
}

/// Largest version according to [`compare_versions`]. Of equal versions the
/// last one wins.
pub fn max_version<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions.into_iter().max_by(|a, b| compare_versions(a, b))
}
