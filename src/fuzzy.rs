//! Collapsing transcript models whose junctions differ by a few bases.
//!
//! Models that come out of collapsing can still be near-duplicates: reads
//! with slightly wobbly splice sites end up in separate loci or separate
//! isoforms. Here, every model is compared against the models already kept
//! for its contig and strand. A model that [can be merged](relation::can_merge)
//! into a kept model joins that model's group. Each group then reports its
//! best member as the representative along with the reads of every member.

use std::collections::HashMap;

use nonempty::NonEmpty;
use tracing::debug;

use crate::index::PartitionedIndex;
use crate::model::Isoform;
use crate::model::SupportGroup;
use crate::model::TranscriptModel;
use crate::read_id;

pub mod relation;

pub use relation::Relation;

/// An error related to fuzzy junction collapsing.
#[derive(Debug)]
pub enum Error {
    /// Two models could not be compared.
    Relation(relation::Error),

    /// A model had no support group.
    MissingGroup(String),

    /// The full-length count of a group could not be determined.
    ReadId(read_id::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Relation(err) => write!(f, "relation error: {err}"),
            Error::MissingGroup(id) => write!(f, "no support group for transcript {id}"),
            Error::ReadId(err) => write!(f, "read id error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// Collapses models with fuzzy junctions, returning one isoform per group.
///
/// Models are visited in transcript id order. Within a group, the
/// representative is the member with the most exons, with ties going to the
/// member with the most full-length reads and then to the earliest member.
/// The representative's support group is renamed to carry the members of
/// every model in the group.
///
/// # Examples
///
/// ```
/// use isocollapse::core::Interval;
/// use isocollapse::core::Strand;
/// use isocollapse::fuzzy::collapse_fuzzy_junctions;
/// use isocollapse::model::SupportGroup;
/// use isocollapse::model::TranscriptId;
/// use isocollapse::model::TranscriptModel;
///
/// let a = TranscriptModel::try_new(
///     TranscriptId::new("PB", 1, 1),
///     "chr1",
///     Strand::Positive,
///     vec![Interval::try_new(100, 200)?, Interval::try_new(300, 400)?],
/// )?;
/// let b = TranscriptModel::try_new(
///     TranscriptId::new("PB", 1, 2),
///     "chr1",
///     Strand::Positive,
///     vec![Interval::try_new(100, 203)?, Interval::try_new(300, 400)?],
/// )?;
///
/// let groups = vec![
///     "PB.1.1\tr1/f1p0/100".parse::<SupportGroup>()?,
///     "PB.1.2\tr2/f1p0/100".parse::<SupportGroup>()?,
/// ];
///
/// let isoforms = collapse_fuzzy_junctions(vec![a, b], groups, true, 5)?;
/// assert_eq!(isoforms.len(), 1);
/// assert_eq!(isoforms[0].group().to_string(), "PB.1.1\tr1/f1p0/100,r2/f1p0/100");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn collapse_fuzzy_junctions(
    mut models: Vec<TranscriptModel>,
    groups: Vec<SupportGroup>,
    allow_extra_5exon: bool,
    max_fuzzy_junction: usize,
) -> Result<Vec<Isoform>> {
    models.sort_by(|a, b| a.id().cmp(b.id()));

    let mut index = PartitionedIndex::<usize>::new();
    let mut clusters = Vec::<Vec<usize>>::new();

    for (i, model) in models.iter().enumerate() {
        let mut target = None;
        let exons = model.exons().iter().copied().collect::<Vec<_>>();

        for &cluster in index.find(model.contig(), model.strand(), &model.span()) {
            let node = &models[clusters[cluster][0]];

            let relation = relation::compare_fuzzy_junctions(
                &exons,
                &node.exons().iter().copied().collect::<Vec<_>>(),
                max_fuzzy_junction,
            )
            .map_err(Error::Relation)?;

            if relation::can_merge(relation, model, node, allow_extra_5exon, max_fuzzy_junction) {
                debug!("merging {} into {} ({relation})", model.id(), node.id());
                target = Some(cluster);
                break;
            }
        }

        match target {
            Some(cluster) => clusters[cluster].push(i),
            None => {
                index.insert(model.contig(), model.strand(), model.span(), clusters.len());
                clusters.push(vec![i]);
            }
        }
    }

    let mut groups = groups
        .into_iter()
        .map(|group| (group.transcript_id().to_string(), group))
        .collect::<HashMap<_, _>>();

    let mut isoforms = Vec::with_capacity(clusters.len());

    for cluster in clusters {
        let mut best: Option<(usize, usize, usize)> = None;
        let mut members = Vec::new();

        for i in cluster {
            let model = &models[i];
            let id = model.transcript_id();
            let group = groups
                .remove(&id)
                .ok_or_else(|| Error::MissingGroup(id.clone()))?;

            let exons = model.exons().len();
            let full_length = group.full_length_count().map_err(Error::ReadId)?;

            let better = match best {
                None => true,
                Some((_, best_exons, best_full_length)) => {
                    exons > best_exons || (exons == best_exons && full_length > best_full_length)
                }
            };

            if better {
                best = Some((i, exons, full_length));
            }

            members.extend(group.members().iter().cloned());
        }

        let (best, _, _) =
            best.unwrap_or_else(|| unreachable!("every cluster has at least one model"));
        let members = NonEmpty::from_vec(members)
            .unwrap_or_else(|| unreachable!("every support group has at least one member"));

        let model = models[best].clone();
        let group = SupportGroup::new(model.transcript_id(), members);

        isoforms.push(Isoform::new(model, group));
    }

    Ok(isoforms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Interval;
    use crate::core::Strand;
    use crate::model::TranscriptId;

    fn model(
        locus: usize,
        isoform: usize,
        strand: Strand,
        blocks: &[(usize, usize)],
    ) -> std::result::Result<TranscriptModel, Box<dyn std::error::Error>> {
        let exons = blocks
            .iter()
            .map(|(s, e)| Interval::try_new(*s, *e))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(TranscriptModel::try_new(
            TranscriptId::new("PB", locus, isoform),
            "chr1",
            strand,
            exons,
        )?)
    }

    fn fixture() -> std::result::Result<(Vec<TranscriptModel>, Vec<SupportGroup>), Box<dyn std::error::Error>>
    {
        let models = vec![
            model(1, 2, Strand::Positive, &[(102, 200), (298, 400), (500, 600)])?,
            model(1, 1, Strand::Positive, &[(100, 200), (300, 400), (500, 600)])?,
            model(1, 3, Strand::Positive, &[(350, 400), (500, 600)])?,
            model(2, 1, Strand::Negative, &[(100, 200), (300, 400)])?,
            model(3, 1, Strand::Positive, &[(100, 200), (320, 400), (500, 600)])?,
        ];

        let groups = vec![
            "PB.1.1\ta/f1p0/1".parse()?,
            "PB.1.2\tb/f2p0/1,c/f3p0/1".parse()?,
            "PB.1.3\td/f9p0/1".parse()?,
            "PB.2.1\te/f1p0/1".parse()?,
            "PB.3.1\tf/f1p0/1".parse()?,
        ];

        Ok((models, groups))
    }

    #[test]
    fn it_collapses_fuzzy_and_subset_models() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (models, groups) = fixture()?;
        let isoforms = collapse_fuzzy_junctions(models, groups, true, 5)?;

        let groups = isoforms
            .iter()
            .map(|i| i.group().to_string())
            .collect::<Vec<_>>();

        // PB.1.2 has the same number of exons as PB.1.1 but more full-length
        // reads, so it represents the group.
        assert_eq!(
            groups,
            vec![
                "PB.1.2\ta/f1p0/1,b/f2p0/1,c/f3p0/1,d/f9p0/1",
                "PB.2.1\te/f1p0/1",
                "PB.3.1\tf/f1p0/1",
            ]
        );
        assert_eq!(isoforms[0].model().start(), 102);

        Ok(())
    }

    #[test]
    fn it_keeps_subsets_apart_without_extra_5_prime_exons(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (models, groups) = fixture()?;
        let isoforms = collapse_fuzzy_junctions(models, groups, false, 5)?;

        let ids = isoforms
            .iter()
            .map(|i| i.model().transcript_id())
            .collect::<Vec<_>>();

        assert_eq!(ids, vec!["PB.1.2", "PB.1.3", "PB.2.1", "PB.3.1"]);

        Ok(())
    }

    #[test]
    fn it_is_idempotent() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (models, groups) = fixture()?;
        let once = collapse_fuzzy_junctions(models, groups, true, 5)?;

        let (models, groups): (Vec<_>, Vec<_>) =
            once.iter().cloned().map(Isoform::into_parts).unzip();
        let twice = collapse_fuzzy_junctions(models, groups, true, 5)?;

        assert_eq!(once, twice);

        Ok(())
    }

    #[test]
    fn it_fails_on_a_missing_group() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (models, mut groups) = fixture()?;
        groups.retain(|g| g.transcript_id() != "PB.2.1");

        let err = collapse_fuzzy_junctions(models, groups, true, 5).unwrap_err();
        assert!(matches!(err, Error::MissingGroup(id) if id == "PB.2.1"));

        Ok(())
    }
}
