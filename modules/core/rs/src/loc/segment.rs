use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::num::Position;
#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use derive_getters::Dissolve;
use eyre::{eyre, Report, Result};

/// Segment is a closed residue span [start, end] in 1-based coordinates.
/// It's not represented as a Rust-native RangeInclusive for a couple of reasons:
/// - Prohibit empty segments (end < start) and positions below 1
/// - Keep the residue-level arithmetic (length, gaps, touching) in one place
#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Dissolve)]
pub struct Segment<Idx: Position> {
    start: Idx,
    end: Idx,
}

#[allow(clippy::len_without_is_empty)]
impl<Idx: Position> Segment<Idx> {
    pub fn new(start: Idx, end: Idx) -> Result<Self> {
        if start < Idx::one() {
            Err(eyre!("Invalid segment {start}-{end}: positions are 1-based"))
        } else if end < start {
            Err(eyre!("Invalid segment {start}-{end}: end < start"))
        } else {
            Ok(Self { start, end })
        }
    }

    pub fn single(pos: Idx) -> Result<Self> {
        Self::new(pos, pos)
    }

    /// Callers must guarantee 1 <= start <= end.
    pub(crate) fn from_bounds(start: Idx, end: Idx) -> Self {
        debug_assert!(start >= Idx::one() && start <= end, "{start}-{end}");
        Self { start, end }
    }

    /// Parse "a-b" or a single position "a".
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let number = |x: &str| {
            Idx::from_str_radix(x.trim(), 10)
                .map_err(|_| eyre!("'{}' is not a position", x.trim()))
        };

        let segment = || match text.split_once('-') {
            Some((start, end)) => Self::new(number(start)?, number(end)?),
            None => Self::single(number(text)?),
        };
        segment().map_err(|err| eyre!("Malformed range segment '{text}': {err}"))
    }

    #[inline(always)]
    pub fn start(&self) -> Idx {
        self.start
    }

    #[inline(always)]
    pub fn end(&self) -> Idx {
        self.end
    }

    /// Number of residues in the segment.
    pub fn len(&self) -> Idx {
        self.end - self.start + Idx::one()
    }

    pub fn contains(&self, pos: Idx) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Segments share at least one residue.
    pub fn intersects(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Segments are directly adjacent without sharing residues.
    pub fn touches(&self, other: &Self) -> bool {
        self.end + Idx::one() == other.start || other.end + Idx::one() == self.start
    }

    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn union(&self, other: &Self) -> Option<Self> {
        match self.intersects(other) || self.touches(other) {
            true => Some(self.hull(other)),
            false => None,
        }
    }

    /// Smallest segment covering both segments, including the residues between them.
    pub fn hull(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Number of residues strictly between two disjoint segments (0 for touching ones).
    /// None if the segments intersect.
    pub fn gap_to(&self, other: &Self) -> Option<Idx> {
        if self.intersects(other) {
            None
        } else if self.end < other.start {
            Some(other.start - self.end - Idx::one())
        } else {
            Some(self.start - other.end - Idx::one())
        }
    }
}

impl<Idx: Position> Display for Segment<Idx> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl<Idx: Position> FromStr for Segment<Idx> {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<Idx: Position> TryFrom<(Idx, Idx)> for Segment<Idx> {
    type Error = Report;

    fn try_from(value: (Idx, Idx)) -> Result<Self, Self::Error> {
        Self::new(value.0, value.1)
    }
}

impl<Idx: Position> From<Segment<Idx>> for (Idx, Idx) {
    fn from(segment: Segment<Idx>) -> Self {
        (segment.start, segment.end)
    }
}

impl<Idx: Position> PartialEq<(Idx, Idx)> for Segment<Idx> {
    fn eq(&self, other: &(Idx, Idx)) -> bool {
        self.start == other.0 && self.end == other.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct() {
        assert_eq!(Segment::new(1, 10).unwrap(), (1, 10));
        assert_eq!(Segment::new(5, 5).unwrap().len(), 1);
        assert!(Segment::new(10, 9).is_err());
        assert!(Segment::new(0, 9).is_err());
        assert!(Segment::new(-3, 9).is_err());
    }

    #[test]
    fn test_parse() -> Result<()> {
        assert_eq!(Segment::<i64>::parse("2-248")?, (2, 248));
        assert_eq!(Segment::<i64>::parse(" 7 ")?, (7, 7));
        assert_eq!(" 3 - 9".parse::<Segment<u32>>()?, (3, 9));

        for malformed in ["", "-", "a-10", "10-b", "1-2-3", "20-10", "0-5"] {
            assert!(Segment::<i64>::parse(malformed).is_err(), "{malformed}");
        }
        Ok(())
    }

    #[test]
    fn test_intersects_touches() -> Result<()> {
        let segment = Segment::new(10, 20)?;
        assert!(segment.intersects(&Segment::new(20, 30)?));
        assert!(!segment.intersects(&Segment::new(21, 30)?));
        assert!(segment.touches(&Segment::new(21, 30)?));
        assert!(segment.touches(&Segment::new(1, 9)?));
        assert!(!segment.touches(&Segment::new(22, 30)?));
        assert!(!segment.touches(&Segment::new(15, 30)?));
        Ok(())
    }

    #[test]
    fn test_set_operations() -> Result<()> {
        let segment = Segment::new(10, 20)?;
        assert_eq!(segment.intersection(&Segment::new(15, 30)?), Some(Segment::new(15, 20)?));
        assert_eq!(segment.intersection(&Segment::new(21, 30)?), None);
        assert_eq!(segment.union(&Segment::new(21, 30)?), Some(Segment::new(10, 30)?));
        assert_eq!(segment.union(&Segment::new(22, 30)?), None);
        assert_eq!(segment.hull(&Segment::new(40, 50)?), (10, 50));
        Ok(())
    }

    #[test]
    fn test_gap_to() -> Result<()> {
        let segment = Segment::new(10, 20)?;
        assert_eq!(segment.gap_to(&Segment::new(21, 30)?), Some(0));
        assert_eq!(segment.gap_to(&Segment::new(26, 30)?), Some(5));
        assert_eq!(segment.gap_to(&Segment::new(1, 4)?), Some(5));
        assert_eq!(segment.gap_to(&Segment::new(20, 30)?), None);
        Ok(())
    }
}
