use std::fmt::{Display, Formatter};
use std::str::FromStr;

use super::segment::Segment;
use crate::num::Position;
#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use derive_getters::Dissolve;
use eyre::{ensure, eyre, Report, Result};
use itertools::Itertools;

/// SequenceRange is an ordered set of disjoint closed segments over 1-based residue positions.
/// Segments are always sorted, non-overlapping, and non-touching: touching or overlapping input
/// is coalesced on construction, so each set of residues has exactly one representation.
/// Empty ranges are allowed and appear naturally as results of `intersect` and `subtract`.
#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Dissolve)]
pub struct SequenceRange<Idx: Position> {
    segments: Vec<Segment<Idx>>,
}

impl<Idx: Position> SequenceRange<Idx> {
    pub fn empty() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn new(segments: impl IntoIterator<Item = Segment<Idx>>) -> Self {
        let mut segments: Vec<_> = segments.into_iter().collect();
        segments.sort();

        let mut merged: Vec<Segment<Idx>> = Vec::with_capacity(segments.len());
        for segment in segments {
            match merged.last_mut() {
                Some(last) if segment.start() <= last.end() + Idx::one() => {
                    *last = last.hull(&segment);
                }
                _ => merged.push(segment),
            }
        }
        Self { segments: merged }
    }

    pub fn try_from_iter(bounds: impl IntoIterator<Item = (Idx, Idx)>) -> Result<Self> {
        let segments: Vec<_> = bounds
            .into_iter()
            .map(|(start, end)| Segment::new(start, end))
            .try_collect()?;
        Ok(Self::new(segments))
    }

    /// Group positions into maximal runs of consecutive residues.
    pub fn from_positions(positions: impl IntoIterator<Item = Idx>) -> Result<Self> {
        let segments: Vec<_> = positions
            .into_iter()
            .map(Segment::single)
            .try_collect()?;
        Ok(Self::new(segments))
    }

    /// Parse "a-b" or "a-b,c-d,..." (single positions "a" are accepted as well).
    pub fn parse(text: &str) -> Result<Self> {
        ensure!(!text.trim().is_empty(), "Malformed range: empty string");

        let segments: Vec<_> = text
            .split(',')
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .map(Segment::parse)
            .try_collect()?;
        ensure!(
            !segments.is_empty(),
            "Malformed range '{text}': no segments found"
        );
        Ok(Self::new(segments))
    }

    pub fn segments(&self) -> &[Segment<Idx>] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_discontinuous(&self) -> bool {
        self.segments.len() > 1
    }

    /// Total number of residues across all segments.
    pub fn total_length(&self) -> Idx {
        self.segments
            .iter()
            .fold(Idx::zero(), |sum, segment| sum + segment.len())
    }

    pub fn start(&self) -> Option<Idx> {
        self.segments.first().map(Segment::start)
    }

    pub fn end(&self) -> Option<Idx> {
        self.segments.last().map(Segment::end)
    }

    /// First and last residue, ignoring internal gaps.
    pub fn span(&self) -> Option<Segment<Idx>> {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => Some(first.hull(last)),
            _ => None,
        }
    }

    pub fn contains(&self, pos: Idx) -> bool {
        let ind = self.segments.partition_point(|x| x.end() < pos);
        self.segments
            .get(ind)
            .is_some_and(|segment| segment.contains(pos))
    }

    /// Segment that holds the given position.
    pub fn segment_at(&self, pos: Idx) -> Option<&Segment<Idx>> {
        let ind = self.segments.partition_point(|x| x.end() < pos);
        self.segments.get(ind).filter(|segment| segment.contains(pos))
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.overlap_length(other) > Idx::zero()
    }

    /// Number of residues shared by both ranges.
    pub fn overlap_length(&self, other: &Self) -> Idx {
        let (mut i, mut j) = (0, 0);
        let mut total = Idx::zero();
        while i < self.segments.len() && j < other.segments.len() {
            let (left, right) = (&self.segments[i], &other.segments[j]);
            if let Some(shared) = left.intersection(right) {
                total = total + shared.len();
            }
            if left.end() < right.end() {
                i += 1;
            } else {
                j += 1;
            }
        }
        total
    }

    pub fn intersect(&self, other: &Self) -> Self {
        let (mut i, mut j) = (0, 0);
        let mut shared = Vec::new();
        while i < self.segments.len() && j < other.segments.len() {
            let (left, right) = (&self.segments[i], &other.segments[j]);
            if let Some(segment) = left.intersection(right) {
                shared.push(segment);
            }
            if left.end() < right.end() {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self::new(shared)
    }

    /// Residues of `self` that are not part of `other`.
    pub fn subtract(&self, other: &Self) -> Self {
        let mut result = Vec::with_capacity(self.segments.len());
        let mut first = 0;
        for segment in &self.segments {
            while first < other.segments.len() && other.segments[first].end() < segment.start() {
                first += 1;
            }

            let mut cursor = Some(segment.start());
            for cut in other.segments[first..]
                .iter()
                .take_while(|cut| cut.start() <= segment.end())
            {
                let Some(start) = cursor else { break };
                if cut.start() > start {
                    result.push(Segment::from_bounds(start, cut.start() - Idx::one()));
                }
                cursor = match cut.end() >= segment.end() {
                    true => None,
                    false => Some(start.max(cut.end() + Idx::one())),
                };
            }
            if let Some(start) = cursor {
                result.push(Segment::from_bounds(start, segment.end()));
            }
        }
        Self { segments: result }
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.segments.iter().chain(other.segments.iter()).copied())
    }

    /// Merge neighbouring segments separated by at most `gap_tolerance` residues.
    /// Residues inside merged gaps become part of the range.
    pub fn merge_adjacent(&self, gap_tolerance: Idx) -> Result<Self> {
        ensure!(
            gap_tolerance >= Idx::zero(),
            "Gap tolerance must be non-negative, got {gap_tolerance}"
        );

        let mut merged: Vec<Segment<Idx>> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match merged.last_mut() {
                Some(last)
                    if last
                        .gap_to(segment)
                        .is_some_and(|gap| gap <= gap_tolerance) =>
                {
                    *last = last.hull(segment);
                }
                _ => merged.push(*segment),
            }
        }
        Ok(Self { segments: merged })
    }

    /// Residues of `within` that are not part of `self`.
    pub fn complement(&self, within: Segment<Idx>) -> Self {
        Self::from(within).subtract(self)
    }

    pub fn positions(&self) -> impl Iterator<Item = Idx> + '_ {
        self.segments
            .iter()
            .flat_map(|segment| ::num::range_inclusive(segment.start(), segment.end()))
    }
}

impl<Idx: Position> Display for SequenceRange<Idx> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.iter().join(","))
    }
}

impl<Idx: Position> FromStr for SequenceRange<Idx> {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<Idx: Position> TryFrom<&str> for SequenceRange<Idx> {
    type Error = Report;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl<Idx: Position> From<Segment<Idx>> for SequenceRange<Idx> {
    fn from(segment: Segment<Idx>) -> Self {
        Self {
            segments: vec![segment],
        }
    }
}

impl<Idx: Position> TryFrom<(Idx, Idx)> for SequenceRange<Idx> {
    type Error = Report;

    fn try_from(value: (Idx, Idx)) -> Result<Self, Self::Error> {
        Segment::new(value.0, value.1)
            .map(Self::from)
            .map_err(|err| eyre!("Invalid range: {err}"))
    }
}

impl<Idx: Position> From<SequenceRange<Idx>> for Vec<Segment<Idx>> {
    fn from(range: SequenceRange<Idx>) -> Self {
        range.segments
    }
}

impl<Idx: Position> PartialEq<[(Idx, Idx)]> for SequenceRange<Idx> {
    fn eq(&self, other: &[(Idx, Idx)]) -> bool {
        self.segments.len() == other.len()
            && self
                .segments
                .iter()
                .zip(other.iter())
                .all(|(segment, bounds)| segment == bounds)
    }
}

impl<Idx: Position, const N: usize> PartialEq<[(Idx, Idx); N]> for SequenceRange<Idx> {
    fn eq(&self, other: &[(Idx, Idx); N]) -> bool {
        *self == other[..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(text: &str) -> SequenceRange<i64> {
        SequenceRange::parse(text).unwrap()
    }

    #[test]
    fn test_parse() -> Result<()> {
        let parsed = SequenceRange::<i64>::parse("10-30,50-70")?;
        assert_eq!(parsed, [(10, 30), (50, 70)]);
        assert_eq!(parsed.total_length(), 42);
        assert!(parsed.is_discontinuous());

        let single = SequenceRange::<i64>::parse("2-248")?;
        assert!(!single.is_discontinuous());
        assert_eq!(single.total_length(), 247);

        // Unordered, overlapping and touching segments are normalized
        assert_eq!(range("50-70, 10-30"), [(10, 30), (50, 70)]);
        assert_eq!(range("1-10,5-20"), [(1, 20)]);
        assert_eq!(range("1-10,11-20"), [(1, 20)]);
        assert_eq!(range("5,7,6"), [(5, 7)]);

        for malformed in ["", "   ", ",", "1-10,x", "30-10", "1-10,20-", "0-4"] {
            assert!(SequenceRange::<i64>::parse(malformed).is_err(), "{malformed}");
        }
        Ok(())
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        for text in ["1-1", "10-30,50-70", "2-248,500-517", "1-5,7-7,9-100"] {
            let parsed = range(text);
            assert_eq!(parsed.to_string(), text);
            assert_eq!(SequenceRange::parse(&parsed.to_string())?, parsed);
        }
        assert_eq!(SequenceRange::<i64>::empty().to_string(), "");
        Ok(())
    }

    #[test]
    fn test_contains() {
        let parsed = range("10-30,50-70");
        let cases = [
            (9, false),
            (10, true),
            (30, true),
            (31, false),
            (49, false),
            (50, true),
            (70, true),
            (71, false),
        ];
        for (pos, expected) in cases {
            assert_eq!(parsed.contains(pos), expected, "{pos}");
        }
        assert_eq!(parsed.segment_at(55), Some(&Segment::new(50, 70).unwrap()));
        assert_eq!(parsed.segment_at(40), None);
        assert!(!SequenceRange::<i64>::empty().contains(1));
    }

    #[test]
    fn test_overlaps() {
        let parsed = range("10-30,50-70");
        assert!(parsed.overlaps(&range("30-35")));
        assert!(!parsed.overlaps(&range("31-49")));
        assert_eq!(parsed.overlap_length(&range("25-55")), 12);
        assert_eq!(parsed.overlap_length(&range("1-100")), 42);
        assert_eq!(parsed.overlap_length(&SequenceRange::empty()), 0);
    }

    #[test]
    fn test_intersect() {
        let parsed = range("10-30,50-70");
        assert_eq!(parsed.intersect(&range("25-55")), [(25, 30), (50, 55)]);
        assert_eq!(parsed.intersect(&range("1-5,80-90")), SequenceRange::empty());
        assert_eq!(parsed.intersect(&range("1-100")), parsed);
        assert_eq!(
            range("1-100").intersect(&range("5-10,20-30,40-50")),
            [(5, 10), (20, 30), (40, 50)]
        );
    }

    #[test]
    fn test_subtract() {
        assert_eq!(range("1-100").subtract(&range("20-30")), [(1, 19), (31, 100)]);
        assert_eq!(range("1-100").subtract(&range("1-10,90-100")), [(11, 89)]);
        assert_eq!(range("1-100").subtract(&range("1-100")), SequenceRange::empty());
        assert_eq!(range("10-30,50-70").subtract(&range("25-55")), [(10, 24), (56, 70)]);
        assert_eq!(
            range("10-30,50-70").subtract(&range("1-5,12-13,15-16,60-100")),
            [(10, 11), (14, 14), (17, 30), (50, 59)]
        );
        assert_eq!(range("10-30").subtract(&SequenceRange::empty()), range("10-30"));
    }

    #[test]
    fn test_union_and_complement() -> Result<()> {
        assert_eq!(range("1-10").union(&range("11-20,30-40")), [(1, 20), (30, 40)]);
        assert_eq!(
            range("5-10,20-30").complement(Segment::new(1, 40)?),
            [(1, 4), (11, 19), (31, 40)]
        );
        Ok(())
    }

    #[test]
    fn test_merge_adjacent() -> Result<()> {
        let parsed = range("1-10,14-20,30-40");
        assert_eq!(parsed.merge_adjacent(0)?, parsed);
        assert_eq!(parsed.merge_adjacent(3)?, [(1, 20), (30, 40)]);
        assert_eq!(parsed.merge_adjacent(9)?, [(1, 40)]);
        assert!(parsed.merge_adjacent(-1).is_err());
        Ok(())
    }

    #[test]
    fn test_positions() -> Result<()> {
        let parsed = range("3-5,8-9");
        assert_eq!(parsed.positions().collect::<Vec<_>>(), vec![3, 4, 5, 8, 9]);
        assert_eq!(SequenceRange::from_positions(parsed.positions())?, parsed);
        assert!(SequenceRange::from_positions([0, 1, 2]).is_err());
        Ok(())
    }
}
