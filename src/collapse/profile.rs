//! Per-base coverage and junction evidence over a locus.
//!
//! A [`CoverageProfile`] is a window of the genome starting at the earliest
//! alignment of a locus (the offset) and ending at the furthest alignment end.
//! Three arrays of equal length are filled in:
//!
//! - the base coverage, i.e., how many segments cover each position,
//! - the negative junction evidence, where segment starts are recorded, and
//! - the positive junction evidence, where segment ends are recorded.
//!
//! Each hard boundary records [`HARD_JUNCTION_EVIDENCE`], which dwarfs any
//! split threshold and so always forces an exon boundary at that position.

use crate::alignment::Alignment;
use crate::core::Contig;
use crate::core::Position;
use crate::core::Strand;

/// The magnitude of the evidence a hard boundary records.
pub const HARD_JUNCTION_EVIDENCE: i64 = 999_999;

/// An error related to building a [`CoverageProfile`].
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// No alignments were provided.
    Empty,

    /// The alignments were not all on the same contig.
    MixedContigs(Contig, Contig),

    /// The alignments were not all on the same strand.
    MixedStrands,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Empty => write!(f, "cannot build a coverage profile from zero alignments"),
            Error::MixedContigs(a, b) => {
                write!(f, "alignments span multiple contigs: {a} and {b}")
            }
            Error::MixedStrands => write!(f, "alignments span both strands"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// Coverage and junction evidence for a single locus.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CoverageProfile {
    /// The contig of the locus.
    contig: Contig,

    /// The strand of the locus.
    strand: Strand,

    /// The genome position of index `0` in every array.
    offset: Position,

    /// The number of segments covering each position.
    base_coverage: Vec<u32>,

    /// Evidence for a segment starting at each position.
    alt_evidence_neg: Vec<i64>,

    /// Evidence for a segment ending at each position.
    alt_evidence_pos: Vec<i64>,
}

impl CoverageProfile {
    /// Attempts to build a [`CoverageProfile`] from a set of alignments that
    /// share a contig and a strand.
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::alignment::Alignment;
    /// use isocollapse::collapse::profile::CoverageProfile;
    /// use isocollapse::core::Interval;
    /// use isocollapse::core::Strand;
    ///
    /// let alignment = Alignment::try_new(
    ///     "r1/f1p0/200",
    ///     "chr1",
    ///     Strand::Positive,
    ///     vec![Interval::try_new(100, 200)?, Interval::try_new(300, 400)?],
    /// )?;
    ///
    /// let profile = CoverageProfile::try_build([&alignment], true)?;
    /// assert_eq!(profile.offset(), 100);
    /// assert_eq!(profile.len(), 300);
    /// assert_eq!(profile.base_coverage()[0], 1);
    /// assert_eq!(profile.base_coverage()[150], 0);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_build<'a>(
        alignments: impl IntoIterator<Item = &'a Alignment>,
        skip_5_exon_alt: bool,
    ) -> Result<Self> {
        let alignments = alignments.into_iter().collect::<Vec<_>>();

        let first = alignments.first().ok_or(Error::Empty)?;
        let contig = first.contig().clone();
        let strand = first.strand();

        for alignment in &alignments {
            if alignment.contig() != &contig {
                return Err(Error::MixedContigs(contig, alignment.contig().clone()));
            }

            if alignment.strand() != strand {
                return Err(Error::MixedStrands);
            }
        }

        let offset = alignments.iter().map(|a| a.start()).min().unwrap_or_default();
        let size = alignments.iter().map(|a| a.end()).max().unwrap_or_default() - offset;

        let mut base_coverage = vec![0u32; size];
        let mut alt_evidence_neg = vec![0i64; size];
        let mut alt_evidence_pos = vec![0i64; size];

        for alignment in alignments {
            let count = alignment.segments().len();

            for (i, segment) in alignment.segments().iter().enumerate() {
                let start = segment.start() - offset;
                let end = segment.end() - offset;

                for coverage in &mut base_coverage[start..end] {
                    *coverage += 1;
                }

                if is_hard_start(i, count, strand, skip_5_exon_alt) {
                    alt_evidence_neg[start] -= HARD_JUNCTION_EVIDENCE;
                }

                if is_hard_end(i, count, strand, skip_5_exon_alt) {
                    alt_evidence_pos[end - 1] += HARD_JUNCTION_EVIDENCE;
                }
            }
        }

        Ok(Self {
            contig,
            strand,
            offset,
            base_coverage,
            alt_evidence_neg,
            alt_evidence_pos,
        })
    }

    /// Gets the contig.
    pub fn contig(&self) -> &Contig {
        &self.contig
    }

    /// Gets the strand.
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Gets the genome position of the first array index.
    pub fn offset(&self) -> Position {
        self.offset
    }

    /// Gets the length of the profile window.
    pub fn len(&self) -> usize {
        self.base_coverage.len()
    }

    /// Returns whether the profile window is empty.
    pub fn is_empty(&self) -> bool {
        self.base_coverage.is_empty()
    }

    /// Gets the base coverage.
    pub fn base_coverage(&self) -> &[u32] {
        &self.base_coverage
    }

    /// Gets the evidence for segments starting at each position.
    pub fn alt_evidence_neg(&self) -> &[i64] {
        &self.alt_evidence_neg
    }

    /// Gets the evidence for segments ending at each position.
    pub fn alt_evidence_pos(&self) -> &[i64] {
        &self.alt_evidence_pos
    }
}

/// Returns whether the start of segment `i` (out of `count`) is a hard
/// boundary.
///
/// The clauses are kept exactly as existing outputs were produced with them.
/// The first clause alone holds for any multi-segment alignment and the
/// remaining clauses cover the single-segment case, so every boundary ends up
/// hard regardless of `skip_5_exon_alt`.
#[allow(clippy::nonminimal_bool)]
fn is_hard_start(i: usize, count: usize, strand: Strand, skip_5_exon_alt: bool) -> bool {
    let last = count - 1;

    (i != 0 || i != last)
        || (i == 0 && (strand == Strand::Negative || !skip_5_exon_alt))
        || (i == last && (strand == Strand::Positive || !skip_5_exon_alt))
}

/// Returns whether the end of segment `i` (out of `count`) is a hard
/// boundary. See [`is_hard_start`].
#[allow(clippy::nonminimal_bool)]
fn is_hard_end(i: usize, count: usize, strand: Strand, skip_5_exon_alt: bool) -> bool {
    let last = count - 1;

    (i != 0 || i != last)
        || (i == last && (strand == Strand::Negative || !skip_5_exon_alt))
        || (i == 0 && (strand == Strand::Positive || !skip_5_exon_alt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Interval;

    fn alignment(
        contig: &str,
        strand: Strand,
        blocks: &[(usize, usize)],
    ) -> std::result::Result<Alignment, Box<dyn std::error::Error>> {
        let segments = blocks
            .iter()
            .map(|(s, e)| Interval::try_new(*s, *e))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Alignment::try_new("r/f1p0/1", contig, strand, segments)?)
    }

    #[test]
    fn it_records_coverage_and_hard_boundaries() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let a = alignment("chr1", Strand::Positive, &[(10, 20), (30, 40)])?;
        let b = alignment("chr1", Strand::Positive, &[(15, 20), (30, 35)])?;

        let profile = CoverageProfile::try_build([&a, &b], true)?;
        assert_eq!(profile.offset(), 10);
        assert_eq!(profile.len(), 30);
        assert_eq!(profile.base_coverage()[4], 1);
        assert_eq!(profile.base_coverage()[5], 2);
        assert_eq!(profile.base_coverage()[15], 0);
        assert_eq!(profile.base_coverage()[24], 2);
        assert_eq!(profile.base_coverage()[25], 1);

        assert_eq!(profile.alt_evidence_neg()[0], -HARD_JUNCTION_EVIDENCE);
        assert_eq!(profile.alt_evidence_neg()[5], -HARD_JUNCTION_EVIDENCE);
        assert_eq!(profile.alt_evidence_neg()[20], -2 * HARD_JUNCTION_EVIDENCE);
        assert_eq!(profile.alt_evidence_pos()[9], 2 * HARD_JUNCTION_EVIDENCE);
        assert_eq!(profile.alt_evidence_pos()[24], HARD_JUNCTION_EVIDENCE);
        assert_eq!(profile.alt_evidence_pos()[29], HARD_JUNCTION_EVIDENCE);

        Ok(())
    }

    #[test]
    fn it_treats_every_boundary_as_hard() {
        for strand in [Strand::Positive, Strand::Negative] {
            for skip in [true, false] {
                assert!(is_hard_start(0, 1, strand, skip));
                assert!(is_hard_end(0, 1, strand, skip));

                for i in 0..3 {
                    assert!(is_hard_start(i, 3, strand, skip));
                    assert!(is_hard_end(i, 3, strand, skip));
                }
            }
        }
    }

    #[test]
    fn it_rejects_mixed_inputs() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let a = alignment("chr1", Strand::Positive, &[(10, 20)])?;
        let b = alignment("chr2", Strand::Positive, &[(10, 20)])?;
        let c = alignment("chr1", Strand::Negative, &[(10, 20)])?;

        assert_eq!(
            CoverageProfile::try_build([&a, &b], true).unwrap_err(),
            Error::MixedContigs(String::from("chr1"), String::from("chr2"))
        );
        assert_eq!(
            CoverageProfile::try_build([&a, &c], true).unwrap_err(),
            Error::MixedStrands
        );
        assert_eq!(
            CoverageProfile::try_build(Vec::<&Alignment>::new(), true).unwrap_err(),
            Error::Empty
        );

        Ok(())
    }
}
