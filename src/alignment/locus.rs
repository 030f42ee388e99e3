//! Grouping alignments into independent loci.
//!
//! A locus is a maximal run of overlapping alignments on the same contig and
//! strand. Loci share no state with each other, so each can be collapsed
//! independently (and in parallel).

use std::collections::BTreeMap;

use nonempty::NonEmpty;

use crate::alignment::Alignment;
use crate::core::Contig;
use crate::core::Position;
use crate::core::Strand;

/// A set of overlapping, same-strand alignments on one contig.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Locus {
    /// The 1-based locus index, used as the gene number of emitted models.
    index: usize,

    /// The contig.
    contig: Contig,

    /// The strand.
    strand: Strand,

    /// The alignments, sorted by start.
    alignments: NonEmpty<Alignment>,
}

impl Locus {
    /// Gets the locus index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Gets the contig.
    pub fn contig(&self) -> &Contig {
        &self.contig
    }

    /// Gets the strand.
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Gets the alignments.
    pub fn alignments(&self) -> &NonEmpty<Alignment> {
        &self.alignments
    }

    /// Gets the start of the earliest alignment.
    pub fn start(&self) -> Position {
        self.alignments.first().start()
    }

    /// Gets the end of the furthest-reaching alignment.
    pub fn end(&self) -> Position {
        self.alignments
            .iter()
            .map(|alignment| alignment.end())
            .max()
            .unwrap_or_else(|| unreachable!("a locus always has at least one alignment"))
    }
}

/// Groups alignments into loci.
///
/// Loci are numbered from `1` in (contig, start, strand) order so that the
/// numbering does not depend on the order of the input.
///
/// # Examples
///
/// ```
/// use isocollapse::alignment::Alignment;
/// use isocollapse::alignment::locus;
/// use isocollapse::core::Interval;
/// use isocollapse::core::Strand;
///
/// let a = Alignment::try_new("a", "chr1", Strand::Positive, vec![Interval::try_new(100, 200)?])?;
/// let b = Alignment::try_new("b", "chr1", Strand::Positive, vec![Interval::try_new(150, 300)?])?;
/// let c = Alignment::try_new("c", "chr1", Strand::Positive, vec![Interval::try_new(500, 600)?])?;
///
/// let loci = locus::group(vec![c, a, b]);
/// assert_eq!(loci.len(), 2);
/// assert_eq!(loci[0].index(), 1);
/// assert_eq!(loci[0].alignments().len(), 2);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn group(alignments: impl IntoIterator<Item = Alignment>) -> Vec<Locus> {
    let mut partitions = BTreeMap::<(Contig, Strand), Vec<Alignment>>::new();

    for alignment in alignments {
        partitions
            .entry((alignment.contig().clone(), alignment.strand()))
            .or_default()
            .push(alignment);
    }

    let mut runs = Vec::new();

    for ((contig, strand), mut alignments) in partitions {
        alignments.sort_by_key(|a| (a.start(), a.end()));

        let mut current: Option<(NonEmpty<Alignment>, Position)> = None;

        for alignment in alignments {
            current = match current {
                Some((mut run, end)) if alignment.start() < end => {
                    let end = end.max(alignment.end());
                    run.push(alignment);
                    Some((run, end))
                }
                Some((run, _)) => {
                    runs.push((contig.clone(), strand, run));
                    let end = alignment.end();
                    Some((NonEmpty::new(alignment), end))
                }
                None => {
                    let end = alignment.end();
                    Some((NonEmpty::new(alignment), end))
                }
            };
        }

        if let Some((run, _)) = current {
            runs.push((contig.clone(), strand, run));
        }
    }

    runs.sort_by(|(a_contig, a_strand, a), (b_contig, b_strand, b)| {
        (a_contig, a.first().start(), a_strand).cmp(&(b_contig, b.first().start(), b_strand))
    });

    runs.into_iter()
        .enumerate()
        .map(|(i, (contig, strand, alignments))| Locus {
            index: i + 1,
            contig,
            strand,
            alignments,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Interval;

    fn alignment(
        id: &str,
        contig: &str,
        strand: Strand,
        blocks: &[(usize, usize)],
    ) -> Result<Alignment, Box<dyn std::error::Error>> {
        let segments = blocks
            .iter()
            .map(|(s, e)| Interval::try_new(*s, *e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Alignment::try_new(id, contig, strand, segments)?)
    }

    #[test]
    fn it_separates_strands_and_contigs() -> Result<(), Box<dyn std::error::Error>> {
        let loci = group(vec![
            alignment("a", "chr2", Strand::Positive, &[(100, 200)])?,
            alignment("b", "chr1", Strand::Negative, &[(100, 200)])?,
            alignment("c", "chr1", Strand::Positive, &[(150, 250)])?,
            alignment("d", "chr1", Strand::Positive, &[(100, 120), (180, 200)])?,
        ]);

        let summary = loci
            .iter()
            .map(|l| (l.index(), l.contig().as_str(), l.strand(), l.alignments().len()))
            .collect::<Vec<_>>();

        assert_eq!(
            summary,
            vec![
                (1, "chr1", Strand::Positive, 2),
                (2, "chr1", Strand::Negative, 1),
                (3, "chr2", Strand::Positive, 1),
            ]
        );

        Ok(())
    }

    #[test]
    fn it_chains_transitively_overlapping_alignments() -> Result<(), Box<dyn std::error::Error>> {
        let loci = group(vec![
            alignment("a", "chr1", Strand::Positive, &[(100, 200), (800, 900)])?,
            alignment("b", "chr1", Strand::Positive, &[(300, 400)])?,
            alignment("c", "chr1", Strand::Positive, &[(850, 1000)])?,
            alignment("d", "chr1", Strand::Positive, &[(1000, 1100)])?,
        ]);

        assert_eq!(loci.len(), 2);
        assert_eq!(loci[0].alignments().len(), 3);
        assert_eq!(loci[0].start(), 100);
        assert_eq!(loci[0].end(), 1000);
        assert_eq!(loci[1].start(), 1000);

        Ok(())
    }
}
