//! Byte ranges and range set arithmetic.
//!
//! Everything handed to the commitment layer is expressed as half-open byte
//! ranges into one direction of a transcript. This module turns literal text
//! into such ranges ([`locate_all`]) and inverts a set of ranges within a
//! bounding range ([`complement`]), which together express "reveal everything
//! except these secrets".

use std::ops::Range;

use rangeset::{Difference, RangeSet};
use tracing::trace;

use crate::Error;

/// A half-open `[start, end)` interval over a byte buffer.
pub type ByteRange = Range<usize>;

/// Locates the first occurrence of each needle in `buffer`.
///
/// Needles are matched byte-exactly, so a needle for an HTTP header line must
/// include its separator and, if the range should cover it, the trailing
/// CRLF. Each needle is located independently of the others, in the order
/// given.
///
/// # Errors
///
/// Returns a [`NotFound`](crate::ErrorKind::NotFound) error if any needle is
/// empty or does not occur in `buffer`.
///
/// # Arguments
///
/// * `buffer` - The data to search.
/// * `needles` - The literal byte strings to locate.
pub fn locate_all<I>(buffer: &[u8], needles: I) -> Result<Vec<ByteRange>, Error>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    needles
        .into_iter()
        .map(|needle| {
            let needle = needle.as_ref();
            let start = find(buffer, needle).ok_or_else(|| {
                Error::not_found(format!(
                    "needle {:?} does not occur in the buffer",
                    String::from_utf8_lossy(needle)
                ))
            })?;

            trace!(start, len = needle.len(), "located needle");

            Ok(start..start + needle.len())
        })
        .collect()
}

/// Returns the maximal ranges covering `bounds` minus the union of `holes`.
///
/// Holes may be given in any order and may overlap or touch each other.
/// A hole which extends past `bounds` is clamped to it and empty holes are
/// ignored. The returned ranges are sorted, disjoint and non-adjacent.
///
/// # Errors
///
/// Returns an [`InvalidRange`](crate::ErrorKind::InvalidRange) error if
/// `bounds` or a hole is inverted, or if a non-empty hole lies entirely
/// outside of `bounds`.
///
/// # Arguments
///
/// * `bounds` - The bounding range.
/// * `holes` - The ranges to remove from `bounds`.
pub fn complement(bounds: &ByteRange, holes: &[ByteRange]) -> Result<Vec<ByteRange>, Error> {
    if bounds.start > bounds.end {
        return Err(Error::invalid_range(format!(
            "bounds are inverted: {:?}",
            bounds
        )));
    }

    let mut clamped = Vec::with_capacity(holes.len());
    for hole in holes {
        if hole.start > hole.end {
            return Err(Error::invalid_range(format!(
                "hole is inverted: {:?}",
                hole
            )));
        }

        if hole.is_empty() {
            continue;
        }

        if hole.end <= bounds.start || hole.start >= bounds.end {
            return Err(Error::invalid_range(format!(
                "hole {:?} is outside of the bounds {:?}",
                hole, bounds
            )));
        }

        clamped.push(hole.start.max(bounds.start)..hole.end.min(bounds.end));
    }

    if clamped.is_empty() {
        return Ok(vec![bounds.clone()]);
    }

    let holes = RangeSet::new(&clamped);

    Ok(bounds.difference(&holes).iter_ranges().collect())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }

    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::ErrorKind;

    #[rstest]
    #[case::no_holes(0..20, vec![], vec![0..20])]
    #[case::whole(0..20, vec![0..20], vec![])]
    #[case::middle(0..20, vec![5..10], vec![0..5, 10..20])]
    #[case::prefix(0..20, vec![0..5], vec![5..20])]
    #[case::suffix(0..20, vec![15..20], vec![0..15])]
    #[case::unsorted(0..20, vec![12..14, 2..4], vec![0..2, 4..12, 14..20])]
    #[case::overlapping(0..20, vec![2..8, 5..10], vec![0..2, 10..20])]
    #[case::adjacent(0..20, vec![2..5, 5..8], vec![0..2, 8..20])]
    #[case::duplicate(0..20, vec![3..6, 3..6], vec![0..3, 6..20])]
    #[case::nested(0..20, vec![2..12, 4..6], vec![0..2, 12..20])]
    #[case::clamped(10..20, vec![5..12, 18..25], vec![12..18])]
    #[case::empty_hole(0..20, vec![7..7], vec![0..20])]
    #[case::offset_bounds(10..30, vec![15..16], vec![10..15, 16..30])]
    fn test_complement(
        #[case] bounds: ByteRange,
        #[case] holes: Vec<ByteRange>,
        #[case] expected: Vec<ByteRange>,
    ) {
        let ranges = complement(&bounds, &holes).unwrap();

        assert_eq!(ranges, expected);

        let holes = RangeSet::new(
            &holes
                .iter()
                .filter(|hole| !hole.is_empty())
                .map(|hole| hole.start.max(bounds.start)..hole.end.min(bounds.end))
                .collect::<Vec<_>>(),
        );
        let covered: usize = ranges.iter().map(|range| range.len()).sum();
        assert_eq!(covered + holes.len(), bounds.len());
    }

    #[rstest]
    #[case::before(10..20, vec![0..5])]
    #[case::after(10..20, vec![20..25])]
    #[case::inverted_hole(0..20, vec![ByteRange { start: 8, end: 4 }])]
    #[case::inverted_bounds(ByteRange { start: 20, end: 0 }, vec![])]
    fn test_complement_invalid(#[case] bounds: ByteRange, #[case] holes: Vec<ByteRange>) {
        let err = complement(&bounds, &holes).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidRange);
    }

    #[test]
    fn test_locate_all() {
        let buffer = b"GET / HTTP/1.1\r\nsecret: test_secret\r\nhost: example.com\r\n\r\n";

        let ranges = locate_all(buffer, ["secret: test_secret\r\n", "host"]).unwrap();

        assert_eq!(ranges, vec![16..37, 37..41]);
        assert_eq!(&buffer[ranges[0].clone()], b"secret: test_secret\r\n");
    }

    #[test]
    fn test_locate_all_substring_needles() {
        let buffer = b"token: abc\r\ntoken: abcdef\r\n";

        let ranges = locate_all(buffer, ["token: abcdef", "abc", "token: abc\r\n"]).unwrap();

        assert_eq!(ranges, vec![12..25, 7..10, 0..12]);
        assert_eq!(&buffer[ranges[0].clone()], b"token: abcdef");
    }

    #[test]
    fn test_locate_all_first_occurrence() {
        let buffer = "dup dup";

        let ranges = locate_all(buffer.as_bytes(), ["dup"]).unwrap();

        assert_eq!(ranges, vec![0..3]);
    }

    #[test]
    fn test_locate_all_multibyte() {
        let buffer = "city: Zürich, zip: 8001";

        let ranges = locate_all(buffer.as_bytes(), ["zip"]).unwrap();

        assert_eq!(ranges, vec![15..18]);
    }

    #[rstest]
    #[case::missing("password")]
    #[case::empty("")]
    #[case::longer_than_buffer("host: example.com and more")]
    fn test_locate_all_not_found(#[case] needle: &str) {
        let err = locate_all(b"host: example.com", [needle]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_reveal_all_except_secret() {
        let buffer = b"GET / HTTP/1.1\r\nauthorization: Bearer t0ken\r\n\r\n";

        let secrets = locate_all(buffer, ["Bearer t0ken"]).unwrap();
        let reveal = complement(&(0..buffer.len()), &secrets).unwrap();

        assert_eq!(reveal, vec![0..31, 43..buffer.len()]);
        let revealed: Vec<u8> = reveal
            .into_iter()
            .flat_map(|range| buffer[range].to_vec())
            .collect();
        assert!(!revealed.windows(5).any(|w| w == b"t0ken"));
    }
}
