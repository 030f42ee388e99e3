//! Spliced alignments of long transcript reads.
//!
//! An [`Alignment`] is what an external aligner reports for a single read:
//! the read identifier, the contig and strand it mapped to, and the ordered
//! list of exonic blocks (segments) it covers. Alignments are parsed from
//! [BED12](https://genome.ucsc.edu/FAQ/FAQformat.html#format1) lines, where
//! each block of the record is one segment.

use std::num::ParseIntError;
use std::str::FromStr;

use nonempty::NonEmpty;

use crate::core;
use crate::core::Contig;
use crate::core::Interval;
use crate::core::Position;
use crate::core::Strand;

pub mod locus;

pub use locus::Locus;

/// The delimiter for a BED12 line.
const DELIMITER: char = '\t';

/// The delimiter for the block sizes and block starts lists.
const LIST_DELIMITER: char = ',';

/// The number of expected fields in a BED12 line.
pub const NUM_BED12_FIELDS: usize = 12;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to the construction of an [`Alignment`].
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// No segments were provided.
    NoSegments,

    /// A segment starts before the previous segment ends.
    UnorderedSegments(Interval, Interval),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NoSegments => write!(f, "an alignment must have at least one segment"),
            Error::UnorderedSegments(a, b) => write!(
                f,
                "segments must be ascending and non-overlapping: {a} is followed by {b}"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// An error associated with parsing a BED12 line into an [`Alignment`].
#[derive(Debug)]
pub enum ParseError {
    /// An incorrect number of fields in the line.
    IncorrectNumberOfFields(usize),

    /// An invalid position.
    InvalidPosition(&'static str, ParseIntError),

    /// An invalid strand.
    InvalidStrand(core::strand::ParseError),

    /// An invalid block count.
    InvalidBlockCount(ParseIntError),

    /// The block count does not match the number of block sizes or starts.
    MismatchedBlockCount(usize, usize, usize),

    /// The blocks do not span the alignment from start to end.
    BlocksDoNotSpanAlignment,

    /// A block whose position does not fit in a [`Position`].
    BlockOutOfRange(Position, Position),

    /// An invalid block.
    InvalidBlock(core::interval::Error),

    /// The alignment could not be created from the parsed values.
    InvalidAlignment(Error),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncorrectNumberOfFields(fields) => write!(
                f,
                "invalid number of fields in BED12 line: expected {} fields, found {} fields",
                NUM_BED12_FIELDS, fields
            ),
            ParseError::InvalidPosition(field, err) => write!(f, "invalid {field}: {err}"),
            ParseError::InvalidStrand(err) => write!(f, "invalid strand: {err}"),
            ParseError::InvalidBlockCount(err) => write!(f, "invalid block count: {err}"),
            ParseError::MismatchedBlockCount(count, sizes, starts) => write!(
                f,
                "block count ({count}) does not match the number of block sizes ({sizes}) and \
                 block starts ({starts})"
            ),
            ParseError::BlocksDoNotSpanAlignment => write!(
                f,
                "blocks must start at the alignment start and end at the alignment end"
            ),
            ParseError::BlockOutOfRange(block_start, size) => write!(
                f,
                "block with start {block_start} and size {size} is out of range"
            ),
            ParseError::InvalidBlock(err) => write!(f, "invalid block: {err}"),
            ParseError::InvalidAlignment(err) => write!(f, "invalid alignment: {err}"),
        }
    }
}

impl std::error::Error for ParseError {}

////////////////////////////////////////////////////////////////////////////////////////
// Alignment
////////////////////////////////////////////////////////////////////////////////////////

/// A spliced alignment of a single read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Alignment {
    /// The read identifier.
    read_id: String,

    /// The contig the read aligned to.
    contig: Contig,

    /// The strand the read aligned to.
    strand: Strand,

    /// The exonic blocks of the alignment, in ascending genome order.
    segments: NonEmpty<Interval>,
}

impl Alignment {
    /// Attempts to create a new [`Alignment`].
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::alignment::Alignment;
    /// use isocollapse::core::Interval;
    /// use isocollapse::core::Strand;
    ///
    /// let alignment = Alignment::try_new(
    ///     "c1/f1p0/300",
    ///     "chr1",
    ///     Strand::Positive,
    ///     vec![Interval::try_new(100, 200)?, Interval::try_new(300, 400)?],
    /// )?;
    ///
    /// assert_eq!(alignment.start(), 100);
    /// assert_eq!(alignment.end(), 400);
    /// assert_eq!(alignment.segments().len(), 2);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(
        read_id: impl Into<String>,
        contig: impl Into<Contig>,
        strand: Strand,
        segments: Vec<Interval>,
    ) -> Result<Self, Error> {
        let segments = NonEmpty::from_vec(segments).ok_or(Error::NoSegments)?;

        for (a, b) in segments.iter().zip(segments.iter().skip(1)) {
            if b.start() < a.end() {
                return Err(Error::UnorderedSegments(*a, *b));
            }
        }

        Ok(Self {
            read_id: read_id.into(),
            contig: contig.into(),
            strand,
            segments,
        })
    }

    /// Gets the read identifier.
    pub fn read_id(&self) -> &str {
        &self.read_id
    }

    /// Gets the contig.
    pub fn contig(&self) -> &Contig {
        &self.contig
    }

    /// Gets the strand.
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Gets the segments.
    pub fn segments(&self) -> &NonEmpty<Interval> {
        &self.segments
    }

    /// Gets the start of the first segment.
    pub fn start(&self) -> Position {
        self.segments.first().start()
    }

    /// Gets the end of the last segment.
    pub fn end(&self) -> Position {
        self.segments.last().end()
    }
}

/// Parses a comma-delimited list of positions (BED allows a trailing comma).
fn parse_list(value: &str, field: &'static str) -> Result<Vec<Position>, ParseError> {
    value
        .split(LIST_DELIMITER)
        .filter(|v| !v.is_empty())
        .map(|v| v.parse().map_err(|e| ParseError::InvalidPosition(field, e)))
        .collect()
}

impl FromStr for Alignment {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.split(DELIMITER).collect::<Vec<_>>();

        if parts.len() != NUM_BED12_FIELDS {
            return Err(ParseError::IncorrectNumberOfFields(parts.len()));
        }

        let start: Position = parts[1]
            .parse()
            .map_err(|e| ParseError::InvalidPosition("start", e))?;
        let end: Position = parts[2]
            .parse()
            .map_err(|e| ParseError::InvalidPosition("end", e))?;
        let strand = parts[5].parse().map_err(ParseError::InvalidStrand)?;

        let count: usize = parts[9].parse().map_err(ParseError::InvalidBlockCount)?;
        let sizes = parse_list(parts[10], "block size")?;
        let starts = parse_list(parts[11], "block start")?;

        if sizes.len() != count || starts.len() != count {
            return Err(ParseError::MismatchedBlockCount(
                count,
                sizes.len(),
                starts.len(),
            ));
        }

        let segments = starts
            .iter()
            .zip(sizes.iter())
            .map(|(block_start, size)| {
                let from = start.checked_add(*block_start);

                match (from, from.and_then(|from| from.checked_add(*size))) {
                    (Some(from), Some(to)) => {
                        Interval::try_new(from, to).map_err(ParseError::InvalidBlock)
                    }
                    _ => Err(ParseError::BlockOutOfRange(*block_start, *size)),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        match (segments.first(), segments.last()) {
            (Some(first), Some(last)) if first.start() == start && last.end() == end => {}
            _ => return Err(ParseError::BlocksDoNotSpanAlignment),
        }

        Alignment::try_new(parts[3], parts[0], strand, segments)
            .map_err(ParseError::InvalidAlignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_a_valid_bed12_line() -> Result<(), Box<dyn std::error::Error>> {
        let alignment = "chr1\t100\t400\tc1/f1p0/200\t0\t-\t100\t400\t0\t2\t100,100,\t0,200,"
            .parse::<Alignment>()?;

        assert_eq!(alignment.read_id(), "c1/f1p0/200");
        assert_eq!(alignment.contig(), "chr1");
        assert_eq!(alignment.strand(), Strand::Negative);
        assert_eq!(
            alignment.segments().iter().copied().collect::<Vec<_>>(),
            vec![Interval::try_new(100, 200)?, Interval::try_new(300, 400)?]
        );

        Ok(())
    }

    #[test]
    fn it_fails_to_parse_a_line_with_the_wrong_number_of_fields() {
        let err = "chr1\t100\t400".parse::<Alignment>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid number of fields in BED12 line: expected 12 fields, found 3 fields"
        );
    }

    #[test]
    fn it_fails_to_parse_a_line_with_mismatched_blocks() {
        let err = "chr1\t100\t400\tr\t0\t+\t100\t400\t0\t3\t100,100\t0,200"
            .parse::<Alignment>()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "block count (3) does not match the number of block sizes (2) and block starts (2)"
        );
    }

    #[test]
    fn it_fails_to_parse_blocks_that_do_not_reach_the_end() {
        let err = "chr1\t100\t400\tr\t0\t+\t100\t400\t0\t2\t100,50\t0,200"
            .parse::<Alignment>()
            .unwrap_err();
        assert!(matches!(err, ParseError::BlocksDoNotSpanAlignment));
    }

    #[test]
    fn it_fails_to_parse_blocks_past_the_end_of_the_address_space() {
        let line = format!(
            "chr1\t100\t400\tr\t0\t+\t100\t400\t0\t2\t100,{}\t0,200",
            usize::MAX
        );
        let err = line.parse::<Alignment>().unwrap_err();
        assert!(matches!(err, ParseError::BlockOutOfRange(200, usize::MAX)));
    }

    #[test]
    fn it_fails_to_create_an_alignment_with_overlapping_segments(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let err = Alignment::try_new(
            "r",
            "chr1",
            Strand::Positive,
            vec![Interval::try_new(100, 200)?, Interval::try_new(150, 300)?],
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "segments must be ascending and non-overlapping: 100-200 is followed by 150-300"
        );

        let err = Alignment::try_new("r", "chr1", Strand::Positive, Vec::new()).unwrap_err();
        assert_eq!(err, Error::NoSegments);

        Ok(())
    }
}
