use core::fmt;

use crate::{Error, Result};

/// A half-open interval of sequence numbers, `[start, end)`.
///
/// Every range in the system is consumed front to back: `start` only ever
/// moves forward and consumed territory is never handed out again. A range
/// is *sane* while `start <= end`; anything else is corruption.
///
/// # Example
/// ```
/// use seqmgr::Range;
///
/// let mut window = Range::new(0x400, 0x500);
/// let grant = window.carve(0x40);
///
/// assert_eq!(grant, Range::new(0x400, 0x440));
/// assert_eq!(window.start, 0x440);
/// assert!(!grant.overlaps(&window));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    /// First sequence in the range (inclusive).
    pub start: u64,
    /// One past the last sequence in the range (exclusive).
    pub end: u64,
}

impl Range {
    /// The empty range at zero. Windows start out like this before their
    /// first refill.
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    /// Creates a range without checking the invariant.
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Creates a range, failing with [`Error::InvalidRange`] if
    /// `start > end`.
    pub fn try_new(start: u64, end: u64) -> Result<Self> {
        let range = Self { start, end };
        if range.is_sane() {
            Ok(range)
        } else {
            Err(Error::InvalidRange { start, end })
        }
    }

    /// Returns `true` if `start <= end`.
    pub const fn is_sane(&self) -> bool {
        self.start <= self.end
    }

    /// Returns `Err(InvalidRange)` unless the range is sane.
    pub fn check(&self) -> Result<()> {
        if self.is_sane() {
            Ok(())
        } else {
            Err(Error::InvalidRange {
                start: self.start,
                end: self.end,
            })
        }
    }

    /// Number of sequences left in the range.
    pub const fn width(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` once every sequence has been consumed.
    pub const fn is_exhausted(&self) -> bool {
        self.start >= self.end
    }

    /// Returns `true` if `seq` lies in `[start, end)`.
    pub const fn contains(&self, seq: u64) -> bool {
        self.start <= seq && seq < self.end
    }

    /// Returns `true` if both ranges share at least one sequence.
    pub const fn overlaps(&self, other: &Self) -> bool {
        !self.is_exhausted()
            && !other.is_exhausted()
            && self.start < other.end
            && other.start < self.end
    }

    /// Pops the first sequence off the front, or `None` if exhausted.
    pub const fn pop(&mut self) -> Option<u64> {
        if self.is_exhausted() {
            None
        } else {
            let seq = self.start;
            self.start += 1;
            Some(seq)
        }
    }

    /// Carves up to `chunk` sequences off the front.
    ///
    /// The returned range is exactly `chunk` wide unless fewer remain, in
    /// which case it holds the whole remainder and `self` is left exhausted.
    pub const fn carve(&mut self, chunk: u64) -> Self {
        let n = if chunk < self.width() {
            chunk
        } else {
            self.width()
        };
        let grant = Self {
            start: self.start,
            end: self.start + n,
        };
        self.start = grant.end;
        grant
    }

    /// Takes the whole remainder, leaving `start == end`.
    pub const fn take(&mut self) -> Self {
        let grant = *self;
        self.start = self.end;
        grant
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}-{:#x})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carve_takes_chunk_from_front() {
        let mut window = Range::new(10, 100);
        assert_eq!(window.carve(30), Range::new(10, 40));
        assert_eq!(window.carve(30), Range::new(40, 70));
        assert_eq!(window, Range::new(70, 100));
    }

    #[test]
    fn carve_returns_remainder_when_short() {
        let mut window = Range::new(10, 25);
        assert_eq!(window.carve(30), Range::new(10, 25));
        assert!(window.is_exhausted());
        assert_eq!(window.start, window.end);
        assert_eq!(window.carve(30).width(), 0);
    }

    #[test]
    fn carve_at_top_of_space_does_not_overflow() {
        let mut window = Range::new(u64::MAX - 5, u64::MAX);
        assert_eq!(window.carve(u64::MAX), Range::new(u64::MAX - 5, u64::MAX));
        assert!(window.is_exhausted());
    }

    #[test]
    fn pop_drains_then_stops() {
        let mut range = Range::new(5, 7);
        assert_eq!(range.pop(), Some(5));
        assert_eq!(range.pop(), Some(6));
        assert_eq!(range.pop(), None);
        assert!(range.is_sane());
    }

    #[test]
    fn insane_range_is_rejected() {
        assert_eq!(
            Range::try_new(9, 3),
            Err(Error::InvalidRange { start: 9, end: 3 })
        );
        let bad = Range::new(9, 3);
        assert!(!bad.is_sane());
        assert_eq!(bad.width(), 0);
        assert!(bad.check().is_err());
    }

    #[test]
    fn overlap_ignores_empty_ranges() {
        let a = Range::new(0, 10);
        assert!(a.overlaps(&Range::new(9, 20)));
        assert!(!a.overlaps(&Range::new(10, 20)));
        assert!(!a.overlaps(&Range::new(5, 5)));
    }

    #[test]
    fn take_empties_the_source() {
        let mut window = Range::new(3, 8);
        assert_eq!(window.take(), Range::new(3, 8));
        assert_eq!(window, Range::new(8, 8));
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(Range::new(0x400, 0x800).to_string(), "[0x400-0x800)");
    }
}
