//! Package version ordering.
//!
//! Versions are never compared as plain strings: `1.10` is newer than `1.9`
//! in every package system. Each backend exposes its own ordering through
//! [`Backend::compare_versions`](crate::backend::Backend::compare_versions).

use std::cmp::Ordering;

/// Compare two pacman versions (`[epoch:]version[-release]`).
///
/// Follows libalpm's `vercmp`: epochs first, then versions, then releases
/// when both sides have one.
pub fn pacman_vercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let (epoch_a, version_a, release_a) = parse_evr(a);
    let (epoch_b, version_b, release_b) = parse_evr(b);

    rpmvercmp(epoch_a, epoch_b)
        .then_with(|| rpmvercmp(version_a, version_b))
        .then_with(|| match (release_a, release_b) {
            (Some(ra), Some(rb)) => rpmvercmp(ra, rb),
            _ => Ordering::Equal,
        })
}

/// Split `[epoch:]version[-release]`. A missing epoch is `"0"`.
fn parse_evr(evr: &str) -> (&str, &str, Option<&str>) {
    let digits = evr.bytes().take_while(u8::is_ascii_digit).count();

    let (epoch, rest) = match evr[digits..].strip_prefix(':') {
        Some(rest) if digits > 0 => (&evr[..digits], rest),
        Some(rest) => ("0", rest),
        None => ("0", evr),
    };

    match rest.rfind('-') {
        Some(pos) => (epoch, &rest[..pos], Some(&rest[pos + 1..])),
        None => (epoch, rest, None),
    }
}

/// Segment-wise comparison used by RPM and pacman.
///
/// Strings are split into runs of digits and runs of letters; everything
/// else separates segments. Numeric runs compare by value and beat
/// alphabetic runs. A trailing alphabetic run makes a version older
/// (`1.0a < 1.0`), any other trailing run makes it newer (`1.0.1 > 1.0`).
fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        let (sep_a, sep_b) = (i, j);
        while i < a.len() && !a[i].is_ascii_alphanumeric() {
            i += 1;
        }
        while j < b.len() && !b[j].is_ascii_alphanumeric() {
            j += 1;
        }
        if i >= a.len() || j >= b.len() {
            break;
        }

        // Differing separator lengths decide
        if i - sep_a != j - sep_b {
            return (i - sep_a).cmp(&(j - sep_b));
        }

        let numeric = a[i].is_ascii_digit();
        let class: fn(&u8) -> bool = if numeric {
            u8::is_ascii_digit
        } else {
            u8::is_ascii_alphabetic
        };
        let end_a = i + a[i..].iter().take_while(|&c| class(c)).count();
        let end_b = j + b[j..].iter().take_while(|&c| class(c)).count();
        let (seg_a, seg_b) = (&a[i..end_a], &b[j..end_b]);

        // Segments of different types: numeric is newer
        if seg_b.is_empty() {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ordering = if numeric {
            let (na, nb) = (trim_zeros(seg_a), trim_zeros(seg_b));
            na.len().cmp(&nb.len()).then_with(|| na.cmp(nb))
        } else {
            seg_a.cmp(seg_b)
        };
        if ordering != Ordering::Equal {
            return ordering;
        }

        i = end_a;
        j = end_b;
    }

    let (rest_a, rest_b) = (&a[i..], &b[j..]);
    if rest_a.is_empty() && rest_b.is_empty() {
        return Ordering::Equal;
    }

    let alpha = |s: &[u8]| s.first().is_some_and(u8::is_ascii_alphabetic);
    if (rest_a.is_empty() && !alpha(rest_b)) || alpha(rest_a) {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

fn trim_zeros(digits: &[u8]) -> &[u8] {
    let zeros = digits.iter().take_while(|&&c| c == b'0').count();
    &digits[zeros..]
}

/// Compare two SVR4 package versions (`version[,REV=revision]`).
///
/// Dotted numeric segments compare numerically, missing segments count as
/// zero; the `REV` stamp breaks ties.
pub fn solaris_vercmp(a: &str, b: &str) -> Ordering {
    let (version_a, rev_a) = split_rev(a);
    let (version_b, rev_b) = split_rev(b);
    compare_dotted(version_a, version_b).then_with(|| compare_dotted(rev_a, rev_b))
}

fn split_rev(version: &str) -> (&str, &str) {
    match version.split_once(",REV=") {
        Some((version, rev)) => (version.trim(), rev.trim()),
        None => (version.trim(), ""),
    }
}

fn compare_dotted(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.').filter(|s| !s.is_empty());
    let mut right = b.split('.').filter(|s| !s.is_empty());
    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(x), None) => compare_segment(x, "0"),
            (None, Some(y)) => compare_segment("0", y),
            (Some(x), Some(y)) => compare_segment(x, y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Ordering::{Equal, Greater, Less};

    #[test]
    fn test_pacman_numeric_segments() {
        assert_eq!(pacman_vercmp("1.10", "1.9"), Greater);
        assert_eq!(pacman_vercmp("1.9", "1.10"), Less);
        assert_eq!(pacman_vercmp("1.0", "1.0"), Equal);
        assert_eq!(pacman_vercmp("1.001", "1.1"), Equal);
    }

    #[test]
    fn test_pacman_trailing_segments() {
        assert_eq!(pacman_vercmp("1.0", "1.0.1"), Less);
        assert_eq!(pacman_vercmp("1.0a", "1.0"), Less);
        assert_eq!(pacman_vercmp("1.0", "1.0rc1"), Greater);
        assert_eq!(pacman_vercmp("1.0rc1", "1.0"), Less);
        assert_eq!(pacman_vercmp("1.0alpha", "1.0beta"), Less);
    }

    #[test]
    fn test_pacman_numeric_beats_alpha() {
        assert_eq!(pacman_vercmp("1.1", "1.a"), Greater);
        assert_eq!(pacman_vercmp("1.a", "1.1"), Less);
    }

    #[test]
    fn test_pacman_epoch_and_release() {
        assert_eq!(pacman_vercmp("1:1.0-1", "2.0-1"), Greater);
        assert_eq!(pacman_vercmp("2.0-1", "1:1.0-1"), Less);
        assert_eq!(pacman_vercmp("0:1.0-1", "1.0-1"), Equal);
        assert_eq!(pacman_vercmp("1.0-2", "1.0-10"), Less);
        // Release is ignored when only one side has one
        assert_eq!(pacman_vercmp("1.0", "1.0-5"), Equal);
        assert_eq!(pacman_vercmp("9.1.0016-1", "9.1.0016-1"), Equal);
    }

    #[test]
    fn test_parse_evr() {
        assert_eq!(parse_evr("2:1.2.3-4"), ("2", "1.2.3", Some("4")));
        assert_eq!(parse_evr("1.2.3"), ("0", "1.2.3", None));
        assert_eq!(parse_evr(":1.0-1"), ("0", "1.0", Some("1")));
        assert_eq!(parse_evr("1.0-rc-2"), ("0", "1.0-rc", Some("2")));
    }

    #[test]
    fn test_solaris_versions() {
        assert_eq!(solaris_vercmp("1.10", "1.9"), Greater);
        assert_eq!(solaris_vercmp("11.10.0", "11.10"), Equal);
        assert_eq!(solaris_vercmp("11.10.0", "11.10.1"), Less);
    }

    #[test]
    fn test_solaris_revision_stamp() {
        assert_eq!(
            solaris_vercmp("11.10.0,REV=2005.01.21.15.53", "11.10.0,REV=2005.01.08.05.16"),
            Greater
        );
        assert_eq!(solaris_vercmp("11.10.0,REV=2005.01.21", "11.10.0"), Greater);
        assert_eq!(solaris_vercmp("11.10.0", "11.11.0,REV=2001.01.01"), Less);
    }
}
