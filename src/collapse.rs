//! Collapsing the alignments of a locus into transcript models.
//!
//! Collapsing a [`Locus`] runs through the following steps:
//!
//! 1. A [`CoverageProfile`](profile::CoverageProfile) records per-base coverage
//!    and the junction evidence of every segment boundary.
//! 2. An [`ExonSet`](exon::ExonSet) is inferred from the profile.
//! 3. Every alignment is [encoded](encode::encode_alignment) as the set of
//!    exons it uses. Alignments that cannot be encoded are dropped.
//! 4. Compatible exon sets are [merged](merge::merge_candidates).
//! 5. Each merged group is [emitted](emit::emit) as a numbered transcript
//!    model with its support group.
//!
//! Loci share no state, so [`collapse_loci`] processes them in parallel.

use rayon::prelude::*;
use tracing::debug;
use tracing::info;

use crate::alignment::Locus;

pub mod config;
pub mod emit;
pub mod encode;
pub mod exon;
pub mod merge;
pub mod profile;

pub use config::Builder;
pub use emit::Emission;

/// An error related to collapsing a locus.
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// The coverage profile could not be built.
    Profile(profile::Error),

    /// The candidates could not be merged.
    Merge(merge::Error),

    /// The merged candidates could not be emitted.
    Emit(emit::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Profile(err) => write!(f, "coverage profile error: {err}"),
            Error::Merge(err) => write!(f, "merge error: {err}"),
            Error::Emit(err) => write!(f, "emit error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// The knobs that control collapsing.
///
/// Generally, you will want to use a [`config::Builder`] to construct one of
/// these.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// The tolerance for segment boundaries at splice junctions.
    tolerate_middle: usize,

    /// The tolerance for the outermost segment boundaries.
    tolerate_end: usize,

    /// Whether segments that match no exon are skipped.
    ok_to_miss_matches: bool,

    /// Whether extra 5' exons are allowed when merging.
    allow_extra_5exon: bool,

    /// Whether the outermost 5' boundary is soft junction evidence.
    skip_5_exon_alt: bool,

    /// The maximum junction difference for fuzzy collapsing.
    max_fuzzy_junction: usize,

    /// The minimum number of supporting reads for the primary stream.
    min_support: usize,

    /// The gene id prefix.
    gene_prefix: String,

    /// The isoform index each locus starts counting from.
    starting_isoform_index: usize,
}

impl Config {
    /// Gets the tolerance for segment boundaries at splice junctions.
    pub fn tolerate_middle(&self) -> usize {
        self.tolerate_middle
    }

    /// Gets the tolerance for the outermost segment boundaries.
    pub fn tolerate_end(&self) -> usize {
        self.tolerate_end
    }

    /// Gets whether segments that match no exon are skipped.
    pub fn ok_to_miss_matches(&self) -> bool {
        self.ok_to_miss_matches
    }

    /// Gets whether extra 5' exons are allowed when merging.
    pub fn allow_extra_5exon(&self) -> bool {
        self.allow_extra_5exon
    }

    /// Gets whether the outermost 5' boundary is soft junction evidence.
    pub fn skip_5_exon_alt(&self) -> bool {
        self.skip_5_exon_alt
    }

    /// Gets the maximum junction difference for fuzzy collapsing.
    pub fn max_fuzzy_junction(&self) -> usize {
        self.max_fuzzy_junction
    }

    /// Gets the minimum number of supporting reads for the primary stream.
    pub fn min_support(&self) -> usize {
        self.min_support
    }

    /// Gets the gene id prefix.
    pub fn gene_prefix(&self) -> &str {
        &self.gene_prefix
    }

    /// Gets the isoform index each locus starts counting from.
    pub fn starting_isoform_index(&self) -> usize {
        self.starting_isoform_index
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tolerate_middle: 0,
            tolerate_end: 100,
            ok_to_miss_matches: false,
            allow_extra_5exon: true,
            skip_5_exon_alt: true,
            max_fuzzy_junction: 5,
            min_support: 1,
            gene_prefix: String::from("PB"),
            starting_isoform_index: 0,
        }
    }
}

/// Collapses the alignments of a single locus.
///
/// # Examples
///
/// ```
/// use isocollapse::alignment::Alignment;
/// use isocollapse::alignment::locus;
/// use isocollapse::collapse;
/// use isocollapse::core::Interval;
/// use isocollapse::core::Strand;
///
/// let a = Alignment::try_new(
///     "a/f1p0/200",
///     "chr1",
///     Strand::Positive,
///     vec![Interval::try_new(100, 200)?, Interval::try_new(300, 400)?],
/// )?;
/// let b = Alignment::try_new(
///     "b/f1p0/190",
///     "chr1",
///     Strand::Positive,
///     vec![Interval::try_new(100, 200)?, Interval::try_new(300, 390)?],
/// )?;
///
/// let loci = locus::group(vec![a, b]);
/// let emission = collapse::collapse_locus(&loci[0], &collapse::Config::default())?;
///
/// assert_eq!(emission.primary().len(), 1);
/// assert_eq!(emission.primary()[0].group().len(), 2);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn collapse_locus(locus: &Locus, config: &Config) -> Result<Emission> {
    let profile = profile::CoverageProfile::try_build(
        locus.alignments().iter(),
        config.skip_5_exon_alt(),
    )
    .map_err(Error::Profile)?;
    let exons = exon::ExonSet::infer(&profile);

    let mut candidates = Vec::with_capacity(locus.alignments().len());

    for alignment in locus.alignments().iter() {
        match encode::encode_alignment(alignment, &exons, config) {
            Ok(bits) => candidates.push(
                merge::Candidate::try_new(alignment.read_id(), alignment.strand(), bits)
                    .map_err(Error::Merge)?,
            ),
            Err(rejection) => info!(
                locus = locus.index(),
                "dropping alignment {}: {rejection}",
                alignment.read_id()
            ),
        }
    }

    let total = candidates.len();
    let merged = merge::merge_candidates(candidates, &exons, config.allow_extra_5exon())
        .map_err(Error::Merge)?;

    debug!(
        locus = locus.index(),
        exons = exons.len(),
        "merged {total} alignments down to {} transcripts",
        merged.len()
    );

    emit::emit(
        merged,
        &exons,
        locus.index(),
        config.starting_isoform_index(),
        config,
    )
    .map_err(Error::Emit)
}

/// Collapses every locus in parallel, returning the emissions in the same
/// order as `loci`.
pub fn collapse_loci(loci: &[Locus], config: &Config) -> Result<Vec<Emission>> {
    loci.par_iter()
        .map(|locus| collapse_locus(locus, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::locus;
    use crate::alignment::Alignment;
    use crate::core::Interval;
    use crate::core::Strand;

    fn alignment(
        id: &str,
        strand: Strand,
        blocks: &[(usize, usize)],
    ) -> std::result::Result<Alignment, Box<dyn std::error::Error>> {
        let segments = blocks
            .iter()
            .map(|(s, e)| Interval::try_new(*s, *e))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Alignment::try_new(id, "chr1", strand, segments)?)
    }

    fn exons(isoform: &crate::model::Isoform) -> Vec<(usize, usize)> {
        isoform
            .model()
            .exons()
            .iter()
            .map(|e| (e.start(), e.end()))
            .collect()
    }

    #[test]
    fn it_collapses_identical_alignments_into_one_group(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let loci = locus::group(vec![
            alignment("a/f1p0/1", Strand::Positive, &[(100, 200), (300, 400), (500, 600)])?,
            alignment("b/f1p0/1", Strand::Positive, &[(100, 200), (300, 400), (500, 600)])?,
            alignment("c/f1p0/1", Strand::Positive, &[(100, 200), (300, 400), (500, 600)])?,
        ]);

        let emission = collapse_locus(&loci[0], &Config::default())?;
        assert_eq!(emission.primary().len(), 1);
        assert_eq!(emission.primary()[0].group().len(), 3);
        assert_eq!(
            exons(&emission.primary()[0]),
            vec![(100, 200), (300, 400), (500, 600)]
        );

        Ok(())
    }

    #[test]
    fn it_merges_a_3_prime_truncated_read() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let loci = locus::group(vec![
            alignment("a/f1p0/1", Strand::Positive, &[(100, 200), (300, 400)])?,
            alignment("b/f1p0/1", Strand::Positive, &[(100, 200), (300, 390)])?,
        ]);

        let emission = collapse_locus(&loci[0], &Config::default())?;
        assert_eq!(emission.primary().len(), 1);

        let isoform = &emission.primary()[0];
        assert_eq!(isoform.group().to_string(), "PB.1.1\ta/f1p0/1,b/f1p0/1");
        assert_eq!(exons(isoform), vec![(100, 200), (300, 400)]);

        Ok(())
    }

    #[test]
    fn it_emits_exons_that_rematch_the_merged_exon_set(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let loci = locus::group(vec![
            alignment("a/f1p0/1", Strand::Positive, &[(100, 200), (300, 400)])?,
            alignment("b/f1p0/1", Strand::Positive, &[(100, 200), (300, 390)])?,
        ]);

        let config = Config::default();
        let profile = profile::CoverageProfile::try_build(loci[0].alignments().iter(), true)?;
        let exons = exon::ExonSet::infer(&profile);
        assert_eq!(exons.len(), 3);

        let emission = collapse_locus(&loci[0], &config)?;
        let model = emission.primary()[0].model();

        let mut ids = Vec::new();

        for exon in model.exons().iter() {
            ids.extend(exons.match_segment(exon, 0, 0).ok_or("exon did not rematch")?);
        }

        assert_eq!(ids, vec![0, 1, 2]);

        Ok(())
    }

    #[test]
    fn it_keeps_skipped_exons_apart()-> std::result::Result<(), Box<dyn std::error::Error>> {
        let loci = locus::group(vec![
            alignment("a/f1p0/1", Strand::Negative, &[(100, 200), (300, 400), (500, 600)])?,
            alignment("b/f1p0/1", Strand::Negative, &[(100, 200), (500, 600)])?,
        ]);

        let emission = collapse_locus(&loci[0], &Config::default())?;
        let ids = emission
            .primary()
            .iter()
            .map(|i| i.model().transcript_id())
            .collect::<Vec<_>>();

        assert_eq!(ids, vec!["PB.1.1", "PB.1.2"]);
        assert_eq!(emission.isoform_index(), 2);

        Ok(())
    }

    #[test]
    fn it_keeps_alternative_donor_sites_apart(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        // The second read splices out at 205, which splits the first exon in
        // two. The reads then disagree on the exons they share.
        let loci = locus::group(vec![
            alignment("a/f1p0/1", Strand::Positive, &[(100, 200), (300, 400)])?,
            alignment("b/f1p0/1", Strand::Positive, &[(100, 205), (300, 400)])?,
        ]);

        let config = Builder::default().tolerate_middle(0).try_build()?;
        let emission = collapse_locus(&loci[0], &config)?;

        let total = emission
            .primary()
            .iter()
            .map(|i| i.group().len())
            .sum::<usize>();
        assert_eq!(total, 2);
        assert_eq!(emission.primary().len(), 2);

        Ok(())
    }

    #[test]
    fn it_collapses_loci_in_parallel() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let loci = locus::group(vec![
            alignment("a/f1p0/1", Strand::Positive, &[(100, 200)])?,
            alignment("b/f1p0/1", Strand::Positive, &[(1000, 1200)])?,
            alignment("c/f1p0/1", Strand::Negative, &[(100, 200)])?,
        ]);

        let emissions = collapse_loci(&loci, &Config::default())?;
        let ids = emissions
            .iter()
            .flat_map(|e| e.primary().iter().map(|i| i.model().transcript_id()))
            .collect::<Vec<_>>();

        assert_eq!(ids, vec!["PB.1.1", "PB.2.1", "PB.3.1"]);

        Ok(())
    }
}
