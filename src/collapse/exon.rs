//! Consensus exons inferred from a [`CoverageProfile`].
//!
//! Exons are the maximal covered stretches of a locus, further split wherever
//! the junction evidence says a segment starts or ends. Each exon is given an
//! [`ExonId`] in ascending order of genome start, so that comparing ids is the
//! same as comparing positions.

use crate::collapse::profile::CoverageProfile;
use crate::core::Contig;
use crate::core::Interval;
use crate::core::Position;
use crate::core::Strand;
use crate::index::IntervalIndex;

/// The coverage a position must exceed to be part of an exon.
const BASE_THRESHOLD: u32 = 0;

/// The junction evidence that must be exceeded to split an exon.
const SPLIT_THRESHOLD: i64 = 2;

/// The identifier of an exon within a locus.
pub type ExonId = usize;

/// A single consensus exon.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExonNode {
    /// The identifier.
    id: ExonId,

    /// The genome interval.
    interval: Interval,

    /// The strand.
    strand: Strand,
}

impl ExonNode {
    /// Gets the identifier.
    pub fn id(&self) -> ExonId {
        self.id
    }

    /// Gets the genome interval.
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Gets the strand.
    pub fn strand(&self) -> Strand {
        self.strand
    }
}

/// The ordered consensus exons of a locus.
#[derive(Debug)]
pub struct ExonSet {
    /// The contig.
    contig: Contig,

    /// The strand.
    strand: Strand,

    /// The exons, where the exon at index `i` has id `i`.
    nodes: Vec<ExonNode>,

    /// A lookup of exon ids by genome interval.
    index: IntervalIndex<ExonId>,
}

impl ExonSet {
    /// Infers the exons of a locus from its coverage profile.
    ///
    /// A position belongs to an exon when its coverage exceeds zero. An exon
    /// is split before a position when either a segment starts there or a
    /// segment ends right before it, with more than two reads of evidence.
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::alignment::Alignment;
    /// use isocollapse::collapse::exon::ExonSet;
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
    /// let exons = ExonSet::infer(&profile);
    ///
    /// assert_eq!(exons.len(), 2);
    /// assert_eq!(exons.get(1).map(|e| *e.interval()), Some(Interval::try_new(300, 400)?));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn infer(profile: &CoverageProfile) -> Self {
        let coverage = profile.base_coverage();
        let neg = profile.alt_evidence_neg();
        let pos = profile.alt_evidence_pos();

        let mut bounds = Vec::<(Position, Position)>::new();
        let mut current: Option<Position> = None;

        for i in 0..profile.len() {
            if coverage[i] > BASE_THRESHOLD {
                match current {
                    None => current = Some(i),
                    Some(start) => {
                        if neg[i] < -SPLIT_THRESHOLD || pos[i - 1] > SPLIT_THRESHOLD {
                            bounds.push((start, i));
                            current = Some(i);
                        }
                    }
                }
            } else if let Some(start) = current.take() {
                bounds.push((start, i));
            }
        }

        if let Some(start) = current {
            bounds.push((start, profile.len()));
        }

        let offset = profile.offset();
        let strand = profile.strand();

        let nodes = bounds
            .into_iter()
            .enumerate()
            .map(|(id, (start, end))| ExonNode {
                id,
                interval: Interval::try_new(start + offset, end + offset).unwrap_or_else(|_| {
                    unreachable!("an exon always covers at least one position")
                }),
                strand,
            })
            .collect::<Vec<_>>();

        Self::from_nodes(profile.contig().clone(), strand, nodes)
    }

    /// Creates an exon set from a list of exon intervals in ascending order.
    ///
    /// This is mostly useful when the exons are already known (for example,
    /// when re-reading them from emitted models).
    pub fn from_intervals(
        contig: impl Into<Contig>,
        strand: Strand,
        intervals: impl IntoIterator<Item = Interval>,
    ) -> Self {
        let nodes = intervals
            .into_iter()
            .enumerate()
            .map(|(id, interval)| ExonNode {
                id,
                interval,
                strand,
            })
            .collect::<Vec<_>>();

        Self::from_nodes(contig.into(), strand, nodes)
    }

    /// Creates the exon set and its lookup from a list of nodes.
    fn from_nodes(contig: Contig, strand: Strand, nodes: Vec<ExonNode>) -> Self {
        let index = IntervalIndex::from_entries(nodes.iter().map(|node| (node.interval, node.id)));

        Self {
            contig,
            strand,
            nodes,
            index,
        }
    }

    /// Gets the contig.
    pub fn contig(&self) -> &Contig {
        &self.contig
    }

    /// Gets the strand.
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Gets the number of exons.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether there are no exons.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Gets an exon by id.
    pub fn get(&self, id: ExonId) -> Option<&ExonNode> {
        self.nodes.get(id)
    }

    /// Gets an iterator over the exons in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ExonNode> {
        self.nodes.iter()
    }

    /// Finds the chain of exons that a segment corresponds to.
    ///
    /// The chain starts at the first overlapping exon whose start is within
    /// `tolerate_left` of the segment start and ends at the last overlapping
    /// exon whose end is within `tolerate_right` of the segment end. Every
    /// exon in the chain must abut the next one. If no such chain exists,
    /// [`None`] is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::collapse::exon::ExonSet;
    /// use isocollapse::core::Interval;
    /// use isocollapse::core::Strand;
    ///
    /// let exons = ExonSet::from_intervals(
    ///     "chr1",
    ///     Strand::Positive,
    ///     vec![
    ///         Interval::try_new(100, 200)?,
    ///         Interval::try_new(300, 390)?,
    ///         Interval::try_new(390, 400)?,
    ///     ],
    /// );
    ///
    /// let segment = Interval::try_new(300, 400)?;
    /// assert_eq!(exons.match_segment(&segment, 0, 0), Some(vec![1, 2]));
    ///
    /// let segment = Interval::try_new(290, 400)?;
    /// assert_eq!(exons.match_segment(&segment, 0, 0), None);
    /// assert_eq!(exons.match_segment(&segment, 10, 0), Some(vec![1, 2]));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn match_segment(
        &self,
        segment: &Interval,
        tolerate_left: usize,
        tolerate_right: usize,
    ) -> Option<Vec<ExonId>> {
        let candidates = self
            .index
            .find(segment)
            .filter_map(|id| self.nodes.get(*id))
            .collect::<Vec<_>>();

        let first = candidates
            .iter()
            .position(|e| e.interval.start().abs_diff(segment.start()) <= tolerate_left)?;

        let last = candidates
            .iter()
            .rposition(|e| e.interval.end().abs_diff(segment.end()) <= tolerate_right)?;

        if last < first {
            return None;
        }

        let chain = &candidates[first..=last];

        if chain
            .windows(2)
            .any(|pair| !pair[0].interval.abuts(&pair[1].interval))
        {
            return None;
        }

        Some(chain.iter().map(|e| e.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::Alignment;

    fn alignment(
        blocks: &[(usize, usize)],
    ) -> Result<Alignment, Box<dyn std::error::Error>> {
        let segments = blocks
            .iter()
            .map(|(s, e)| Interval::try_new(*s, *e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Alignment::try_new("r/f1p0/1", "chr1", Strand::Positive, segments)?)
    }

    fn intervals(exons: &ExonSet) -> Vec<(usize, usize)> {
        exons
            .iter()
            .map(|e| (e.interval().start(), e.interval().end()))
            .collect()
    }

    #[test]
    fn it_splits_exons_at_truncated_ends() -> Result<(), Box<dyn std::error::Error>> {
        let a = alignment(&[(100, 200), (300, 400)])?;
        let b = alignment(&[(100, 200), (300, 390)])?;

        let profile = CoverageProfile::try_build([&a, &b], true)?;
        let exons = ExonSet::infer(&profile);

        assert_eq!(intervals(&exons), vec![(100, 200), (300, 390), (390, 400)]);
        assert_eq!(exons.iter().map(|e| e.id()).collect::<Vec<_>>(), vec![0, 1, 2]);

        Ok(())
    }

    #[test]
    fn it_splits_exons_at_alternative_starts() -> Result<(), Box<dyn std::error::Error>> {
        let a = alignment(&[(100, 200)])?;
        let b = alignment(&[(150, 200)])?;

        let profile = CoverageProfile::try_build([&a, &b], true)?;
        let exons = ExonSet::infer(&profile);

        assert_eq!(intervals(&exons), vec![(100, 150), (150, 200)]);
        assert!(exons.get(1).is_some_and(|e| e.strand() == Strand::Positive));

        Ok(())
    }

    #[test]
    fn it_requires_a_chain_of_abutting_exons() -> Result<(), Box<dyn std::error::Error>> {
        let exons = ExonSet::from_intervals(
            "chr1",
            Strand::Positive,
            vec![
                Interval::try_new(100, 200)?,
                Interval::try_new(200, 250)?,
                Interval::try_new(260, 300)?,
            ],
        );

        let segment = Interval::try_new(100, 250)?;
        assert_eq!(exons.match_segment(&segment, 0, 0), Some(vec![0, 1]));

        let segment = Interval::try_new(100, 300)?;
        assert_eq!(exons.match_segment(&segment, 0, 0), None);

        let segment = Interval::try_new(500, 600)?;
        assert_eq!(exons.match_segment(&segment, 100, 100), None);

        Ok(())
    }
}
