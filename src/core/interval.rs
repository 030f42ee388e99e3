//! A 0-based, half-open interval upon a contig.
//!
//! ```text
//! ================ seq0 ===============
//!
//! | 0 | 1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 |
//! -------------------------------------
//! |   |   | X | X | X | X | O |   |   |  <= 2-6
//! ```
//!
//! The interval above (`2-6`) covers positions 2 up until (but not including)
//! 6. Intervals carry no strand: exons and alignment segments are always
//! expressed in ascending genome coordinates, and the strand lives on the
//! record that owns them.

use std::num::ParseIntError;
use std::str::FromStr;

/// A 0-based position upon a contig.
pub type Position = usize;

/// The delimiter between the start and the end of a textual interval.
const DELIMITER: char = '-';

/// An error related to an interval.
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// The start position equals the end position, which would result in a
    /// zero-sized interval.
    ZeroSizedInterval(Position),

    /// The start position is greater than the end position.
    StartGreaterThanEnd(Position, Position),

    /// Could not parse an interval from the given value.
    ParseError(String),

    /// Could not parse one of the positions within an interval.
    InvalidPosition(ParseIntError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ZeroSizedInterval(pos) => write!(
                f,
                "start position equals end position ({pos}), which is a zero-sized interval"
            ),
            Error::StartGreaterThanEnd(start, end) => write!(
                f,
                "start position ({start}) cannot be greater than the end position ({end})"
            ),
            Error::ParseError(val) => write!(f, "could not parse interval from the value: {val}"),
            Error::InvalidPosition(err) => write!(f, "invalid position: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A 0-based, half-open interval.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Interval {
    /// The start position (inclusive).
    start: Position,

    /// The end position (exclusive).
    end: Position,
}

impl Interval {
    /// Attempts to create a new [`Interval`].
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::core::Interval;
    ///
    /// let interval = Interval::try_new(100, 200)?;
    /// assert_eq!(interval.start(), 100);
    /// assert_eq!(interval.end(), 200);
    ///
    /// assert!(Interval::try_new(200, 200).is_err());
    /// assert!(Interval::try_new(200, 100).is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(start: Position, end: Position) -> Result<Self, Error> {
        if start == end {
            return Err(Error::ZeroSizedInterval(start));
        }

        if start > end {
            return Err(Error::StartGreaterThanEnd(start, end));
        }

        Ok(Self { start, end })
    }

    /// Gets the start position of the interval.
    pub fn start(&self) -> Position {
        self.start
    }

    /// Gets the end position of the interval.
    pub fn end(&self) -> Position {
        self.end
    }

    /// Gets the number of positions covered by the interval.
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::core::Interval;
    ///
    /// assert_eq!(Interval::try_new(100, 200)?.len(), 100);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns whether the two intervals share at least one position.
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::core::Interval;
    ///
    /// let a = Interval::try_new(100, 200)?;
    /// assert!(a.overlaps(&Interval::try_new(199, 300)?));
    /// assert!(!a.overlaps(&Interval::try_new(200, 300)?));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }

    /// Returns whether `other` starts exactly where this interval ends.
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::core::Interval;
    ///
    /// let a = Interval::try_new(100, 200)?;
    /// assert!(a.abuts(&Interval::try_new(200, 300)?));
    /// assert!(!a.abuts(&Interval::try_new(201, 300)?));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn abuts(&self, other: &Interval) -> bool {
        self.end == other.start
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once(DELIMITER)
            .ok_or_else(|| Error::ParseError(s.to_string()))?;

        let start = start.parse().map_err(Error::InvalidPosition)?;
        let end = end.parse().map_err(Error::InvalidPosition)?;

        Interval::try_new(start, end)
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.start, DELIMITER, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_a_valid_interval() -> Result<(), Box<dyn std::error::Error>> {
        let interval = "300-400".parse::<Interval>()?;
        assert_eq!(interval, Interval::try_new(300, 400)?);
        assert_eq!(interval.to_string(), "300-400");
        Ok(())
    }

    #[test]
    fn it_fails_to_parse_invalid_intervals() {
        let err = "300".parse::<Interval>().unwrap_err();
        assert_eq!(err.to_string(), "could not parse interval from the value: 300");

        let err = "400-300".parse::<Interval>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "start position (400) cannot be greater than the end position (300)"
        );

        let err = "300-300".parse::<Interval>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "start position equals end position (300), which is a zero-sized interval"
        );

        assert!(matches!(
            "a-300".parse::<Interval>().unwrap_err(),
            Error::InvalidPosition(_)
        ));
    }

    #[test]
    fn test_overlaps_is_symmetric() -> Result<(), Box<dyn std::error::Error>> {
        let a = Interval::try_new(100, 200)?;
        let b = Interval::try_new(150, 250)?;
        let c = Interval::try_new(200, 250)?;

        assert!(a.overlaps(&b) && b.overlaps(&a));
        assert!(!a.overlaps(&c) && !c.overlaps(&a));
        assert!(a.abuts(&c));
        assert!(!c.abuts(&a));

        Ok(())
    }
}
