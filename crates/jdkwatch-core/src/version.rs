use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Segment<'a> {
    Num(u64),
    Text(&'a str),
}

/// Ordinary lexical-numeric segment comparison over version strings such as
/// `11.0.9`, `1.8.0_292` or `17.0.1+12`. Digit runs compare numerically,
/// letter runs lexically, a number outranks a word, and on a common prefix
/// the longer string wins. No semantic-versioning pre-release precedence.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = segments(a);
    let right = segments(b);
    let mut left = left.iter();
    let mut right = right.iter();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => match compare_segment(*l, *r) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

pub fn is_strictly_newer(candidate: &str, installed: &str) -> bool {
    compare_versions(candidate, installed) == Ordering::Greater
}

fn compare_segment(l: Segment<'_>, r: Segment<'_>) -> Ordering {
    match (l, r) {
        (Segment::Num(l), Segment::Num(r)) => l.cmp(&r),
        (Segment::Text(l), Segment::Text(r)) => l.cmp(r),
        (Segment::Num(_), Segment::Text(_)) => Ordering::Greater,
        (Segment::Text(_), Segment::Num(_)) => Ordering::Less,
    }
}

fn segments(raw: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = raw;
    while let Some(start) = rest.find(|c: char| c.is_alphanumeric()) {
        rest = &rest[start..];
        let numeric = rest.starts_with(|c: char| c.is_ascii_digit());
        let end = rest
            .find(|c: char| {
                if numeric {
                    !c.is_ascii_digit()
                } else {
                    !c.is_alphanumeric() || c.is_ascii_digit()
                }
            })
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        // Absurdly long digit runs fall back to text comparison.
        out.push(match run.parse::<u64>() {
            Ok(value) if numeric => Segment::Num(value),
            _ => Segment::Text(run),
        });
        rest = tail;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_segments_compare_numerically() {
        assert_eq!(compare_versions("11.0.2", "11.0.9"), Ordering::Less);
        assert_eq!(compare_versions("17", "11"), Ordering::Greater);
        assert_eq!(compare_versions("11.0.10", "11.0.9"), Ordering::Greater);
    }

    #[test]
    fn identical_strings_compare_equal() {
        assert_eq!(compare_versions("1.8.0_292", "1.8.0_292"), Ordering::Equal);
        assert_eq!(compare_versions("17.0.1+12", "17.0.1+12"), Ordering::Equal);
    }

    #[test]
    fn underscore_and_plus_separate_segments() {
        assert_eq!(compare_versions("1.8.0_292", "1.8.0_302"), Ordering::Less);
        assert_eq!(compare_versions("17.0.1+12", "17.0.1+9"), Ordering::Greater);
    }

    #[test]
    fn longer_wins_on_common_prefix() {
        assert_eq!(compare_versions("11.0.2", "11.0.2.1"), Ordering::Less);
        assert_eq!(compare_versions("17.0.1+12", "17.0.1"), Ordering::Greater);
    }

    #[test]
    fn words_rank_below_numbers() {
        assert_eq!(compare_versions("11.0.ea", "11.0.1"), Ordering::Less);
        assert_eq!(compare_versions("11.ga", "11.beta"), Ordering::Greater);
    }

    #[test]
    fn strictly_newer_rejects_equal_and_older() {
        assert!(is_strictly_newer("11.0.9", "11.0.2"));
        assert!(!is_strictly_newer("11.0.9", "11.0.9"));
        assert!(!is_strictly_newer("11.0.2", "11.0.9"));
    }
}
