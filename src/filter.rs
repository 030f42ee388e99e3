//! Filters over collapsed isoforms.

use std::collections::BTreeMap;

use tracing::debug;

use crate::fuzzy::relation;
use crate::fuzzy::Relation;
use crate::model::Isoform;
use crate::read_id;

/// An error related to filtering isoforms.
#[derive(Debug)]
pub enum Error {
    /// Two models could not be compared.
    Relation(relation::Error),

    /// The full-length count of a member could not be determined.
    ReadId(read_id::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Relation(err) => write!(f, "relation error: {err}"),
            Error::ReadId(err) => write!(f, "read id error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// Removes every isoform that is a 3'-anchored subset of another isoform of
/// the same gene.
///
/// Within each gene, isoforms are scanned in order of their start position.
/// The surviving isoforms are returned in their original order.
///
/// # Examples
///
/// ```
/// use isocollapse::core::Interval;
/// use isocollapse::core::Strand;
/// use isocollapse::filter::remove_subset_isoforms;
/// use isocollapse::model::Isoform;
/// use isocollapse::model::SupportGroup;
/// use isocollapse::model::TranscriptId;
/// use isocollapse::model::TranscriptModel;
///
/// let isoform = |isoform, exons: Vec<Interval>| -> Result<Isoform, Box<dyn std::error::Error>> {
///     let model =
///         TranscriptModel::try_new(TranscriptId::new("PB", 1, isoform), "chr1", Strand::Positive, exons)?;
///     let group = format!("{}\tr{isoform}/f1p0/1", model.transcript_id()).parse::<SupportGroup>()?;
///     Ok(Isoform::new(model, group))
/// };
///
/// let isoforms = vec![
///     isoform(1, vec![Interval::try_new(100, 200)?, Interval::try_new(300, 400)?])?,
///     isoform(2, vec![Interval::try_new(302, 400)?])?,
/// ];
///
/// let kept = remove_subset_isoforms(isoforms, 5)?;
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].model().transcript_id(), "PB.1.1");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn remove_subset_isoforms(
    isoforms: Vec<Isoform>,
    max_fuzzy_junction: usize,
) -> Result<Vec<Isoform>> {
    let mut genes = BTreeMap::<usize, Vec<usize>>::new();

    for (i, isoform) in isoforms.iter().enumerate() {
        genes.entry(isoform.model().id().locus()).or_default().push(i);
    }

    let mut removed = vec![false; isoforms.len()];

    for mut members in genes.into_values() {
        members.sort_by_key(|&i| isoforms[i].model().start());

        for (a, &i) in members.iter().enumerate() {
            if removed[i] {
                continue;
            }

            let outer = isoforms[i].model();
            let outer_exons = outer.exons().iter().copied().collect::<Vec<_>>();

            for &j in &members[a + 1..] {
                if removed[j] {
                    continue;
                }

                let inner = isoforms[j].model();

                if inner.start() > outer.end() {
                    break;
                }

                let relation = relation::compare_fuzzy_junctions(
                    &outer_exons,
                    &inner.exons().iter().copied().collect::<Vec<_>>(),
                    max_fuzzy_junction,
                )
                .map_err(Error::Relation)?;

                if !relation::can_merge(relation, outer, inner, true, max_fuzzy_junction) {
                    continue;
                }

                if relation == Relation::Super {
                    debug!("removing {} as a subset of {}", inner.id(), outer.id());
                    removed[j] = true;
                } else {
                    debug!("removing {} as a subset of {}", outer.id(), inner.id());
                    removed[i] = true;
                    break;
                }
            }
        }
    }

    Ok(isoforms
        .into_iter()
        .zip(removed)
        .filter_map(|(isoform, removed)| (!removed).then_some(isoform))
        .collect())
}

/// Keeps the isoforms supported by at least `min_count` full-length reads,
/// both in total and within a single member.
pub fn filter_by_count(isoforms: Vec<Isoform>, min_count: usize) -> Result<Vec<Isoform>> {
    let mut kept = Vec::with_capacity(isoforms.len());

    for isoform in isoforms {
        let counts = isoform
            .group()
            .members()
            .iter()
            .map(|member| read_id::full_length_count(member))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::ReadId)?;

        let total = counts.iter().sum::<usize>();
        let max = counts.iter().copied().max().unwrap_or_default();

        if total >= min_count && max >= min_count {
            kept.push(isoform);
        } else {
            debug!(
                "removing {} with {total} full-length reads (at most {max} in one member)",
                isoform.model().id()
            );
        }
    }

    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Interval;
    use crate::core::Strand;
    use crate::model::SupportGroup;
    use crate::model::TranscriptId;
    use crate::model::TranscriptModel;

    fn isoform(
        locus: usize,
        isoform: usize,
        strand: Strand,
        blocks: &[(usize, usize)],
        members: &str,
    ) -> std::result::Result<Isoform, Box<dyn std::error::Error>> {
        let exons = blocks
            .iter()
            .map(|(s, e)| Interval::try_new(*s, *e))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let model = TranscriptModel::try_new(
            TranscriptId::new("PB", locus, isoform),
            "chr1",
            strand,
            exons,
        )?;
        let group = format!("{}\t{members}", model.transcript_id()).parse::<SupportGroup>()?;

        Ok(Isoform::new(model, group))
    }

    fn ids(isoforms: &[Isoform]) -> Vec<String> {
        isoforms.iter().map(|i| i.model().transcript_id()).collect()
    }

    #[test]
    fn it_keeps_only_the_outermost_of_nested_isoforms(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let isoforms = vec![
            isoform(1, 1, Strand::Positive, &[(500, 600)], "c/f1p0/1")?,
            isoform(1, 2, Strand::Positive, &[(350, 400), (500, 600)], "b/f1p0/1")?,
            isoform(1, 3, Strand::Positive, &[(100, 200), (300, 400), (500, 600)], "a/f1p0/1")?,
        ];

        let kept = remove_subset_isoforms(isoforms, 5)?;
        assert_eq!(ids(&kept), vec!["PB.1.3"]);

        Ok(())
    }

    #[test]
    fn it_keeps_isoforms_of_other_genes_and_unanchored_subsets(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let isoforms = vec![
            isoform(1, 1, Strand::Positive, &[(100, 200), (300, 400), (500, 600)], "a/f1p0/1")?,
            // Missing the 3' exon, so it is not anchored.
            isoform(1, 2, Strand::Positive, &[(150, 200), (300, 400)], "b/f1p0/1")?,
            isoform(2, 1, Strand::Positive, &[(350, 400), (500, 600)], "c/f1p0/1")?,
        ];

        let kept = remove_subset_isoforms(isoforms, 5)?;
        assert_eq!(ids(&kept), vec!["PB.1.1", "PB.1.2", "PB.2.1"]);

        Ok(())
    }

    #[test]
    fn it_filters_by_full_length_count() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let isoforms = vec![
            isoform(1, 1, Strand::Negative, &[(100, 200)], "a/f1p0/1,b/f1p0/1")?,
            isoform(1, 2, Strand::Negative, &[(100, 250)], "c/f2p0/1")?,
            isoform(1, 3, Strand::Negative, &[(100, 300)], "d/f1p4/1")?,
        ];

        let kept = filter_by_count(isoforms.clone(), 2)?;
        assert_eq!(ids(&kept), vec!["PB.1.2"]);

        let kept = filter_by_count(isoforms, 1)?;
        assert_eq!(kept.len(), 3);

        Ok(())
    }

    #[test]
    fn it_fails_on_members_without_counts() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let isoforms = vec![isoform(1, 1, Strand::Negative, &[(100, 200)], "read")?];

        let err = filter_by_count(isoforms, 1).unwrap_err();
        assert!(matches!(err, Error::ReadId(_)));

        Ok(())
    }
}
