//! Relationships between the exon chains of two transcript models.

use crate::core::Interval;
use crate::core::Strand;
use crate::model::TranscriptModel;

/// An error related to classifying two exon chains.
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// The classification reached a state that should never happen.
    InvariantViolation(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// How the exon chain of one model relates to that of another.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Relation {
    /// Every junction agrees, from the first exon to the last.
    Exact,

    /// The first chain contains the second, which starts later.
    Super,

    /// The second chain contains the first, which starts later.
    Subset,

    /// Some, but not all, of the shared junctions agree.
    Partial,

    /// The chains agree where they overlap, but each extends past the other.
    Concordant,

    /// No exon of one chain overlaps the other chain.
    NoMatch,
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::Exact => write!(f, "exact"),
            Relation::Super => write!(f, "super"),
            Relation::Subset => write!(f, "subset"),
            Relation::Partial => write!(f, "partial"),
            Relation::Concordant => write!(f, "concordant"),
            Relation::NoMatch => write!(f, "nomatch"),
        }
    }
}

/// Classifies how exon chain `a` relates to exon chain `b`, allowing each
/// junction to differ by up to `max_fuzzy_junction` bases.
///
/// Swapping the arguments swaps [`Relation::Super`] and [`Relation::Subset`]
/// and leaves every other relation unchanged.
///
/// # Examples
///
/// ```
/// use isocollapse::core::Interval;
/// use isocollapse::fuzzy::relation::Relation;
/// use isocollapse::fuzzy::relation::compare_fuzzy_junctions;
///
/// let a = vec![Interval::try_new(100, 200)?, Interval::try_new(300, 400)?];
/// let b = vec![Interval::try_new(300, 400)?];
///
/// assert_eq!(compare_fuzzy_junctions(&a, &b, 0)?, Relation::Super);
/// assert_eq!(compare_fuzzy_junctions(&b, &a, 0)?, Relation::Subset);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn compare_fuzzy_junctions(
    a: &[Interval],
    b: &[Interval],
    max_fuzzy_junction: usize,
) -> Result<Relation> {
    let Some((i, j)) = first_overlap(a, b) else {
        return Ok(Relation::NoMatch);
    };

    let (n_a, n_b) = (a.len(), b.len());

    if n_a == 1 {
        if n_b == 1 {
            return Ok(Relation::Exact);
        }

        return match a[0].end() <= b[j].end() {
            true => Ok(Relation::Subset),
            false => Ok(Relation::Partial),
        };
    }

    if n_b == 1 {
        return match b[0].end() <= a[i].end() {
            true => Ok(Relation::Super),
            false => Ok(Relation::Partial),
        };
    }

    let junction_agrees = |k: usize| {
        a[i + k].end().abs_diff(b[j + k].end()) <= max_fuzzy_junction
            && a[i + k + 1].start().abs_diff(b[j + k + 1].start()) <= max_fuzzy_junction
    };

    let mut k = 0;

    while i + k + 1 < n_a && j + k + 1 < n_b {
        if !junction_agrees(k) {
            return Ok(Relation::Partial);
        }

        k += 1;
    }

    // When one chain runs out before the other, the chains are concordant
    // only if the last junction they share agrees.
    let concordant = || match k {
        0 => Relation::Partial,
        _ if junction_agrees(k - 1) => Relation::Concordant,
        _ => Relation::Partial,
    };

    match (i + k + 1 == n_a, j + k + 1 == n_b) {
        (true, true) => match (i, j) {
            (0, 0) => Ok(Relation::Exact),
            (0, _) => Ok(Relation::Subset),
            _ => Ok(Relation::Super),
        },
        (true, false) => match i {
            0 => Ok(Relation::Subset),
            _ => Ok(concordant()),
        },
        (false, true) => match j {
            0 => Ok(Relation::Super),
            _ => Ok(concordant()),
        },
        (false, false) => Err(Error::InvariantViolation(format!(
            "neither exon chain is exhausted after comparing {k} junctions"
        ))),
    }
}

/// Finds the first pair of overlapping exons, only ever pairing an exon
/// other than the first with the first exon of the other chain.
fn first_overlap(a: &[Interval], b: &[Interval]) -> Option<(usize, usize)> {
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            if i > 0 && j > 0 {
                break;
            }

            if x.overlaps(y) {
                return Some((i, j));
            }
        }
    }

    None
}

/// Returns whether a model related to another by `relation` may be merged
/// into it.
///
/// Exact matches can always be merged. Otherwise, only a chain that is a
/// subset of the other can be merged, and only when extra 5' exons are
/// allowed. The two models must then share a 3' exon start (within the
/// fuzzy tolerance), and the shorter model's 5' end must fall within the
/// exon of the longer model that it lines up with.
///
/// # Examples
///
/// ```
/// use isocollapse::core::Interval;
/// use isocollapse::core::Strand;
/// use isocollapse::fuzzy::relation::Relation;
/// use isocollapse::fuzzy::relation::can_merge;
/// use isocollapse::model::TranscriptId;
/// use isocollapse::model::TranscriptModel;
///
/// let long = TranscriptModel::try_new(
///     TranscriptId::new("PB", 1, 1),
///     "chr1",
///     Strand::Positive,
///     vec![Interval::try_new(100, 200)?, Interval::try_new(300, 400)?],
/// )?;
/// let short = TranscriptModel::try_new(
///     TranscriptId::new("PB", 1, 2),
///     "chr1",
///     Strand::Positive,
///     vec![Interval::try_new(302, 400)?],
/// )?;
///
/// assert!(can_merge(Relation::Super, &long, &short, true, 5));
/// assert!(can_merge(Relation::Subset, &short, &long, true, 5));
/// assert!(!can_merge(Relation::Super, &long, &short, false, 5));
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn can_merge(
    relation: Relation,
    a: &TranscriptModel,
    b: &TranscriptModel,
    allow_extra_5exon: bool,
    max_fuzzy_junction: usize,
) -> bool {
    let (long, short) = match relation {
        Relation::Exact => return true,
        _ if !allow_extra_5exon => return false,
        Relation::Super => (a, b),
        Relation::Subset => (b, a),
        _ => return false,
    };

    let long = long.exons().iter().copied().collect::<Vec<_>>();
    let short = short.exons().iter().copied().collect::<Vec<_>>();

    let n = short.len();

    if n == 0 || long.len() < n {
        return false;
    }

    let (long_first, long_last) = (long[0], long[long.len() - 1]);
    let (short_first, short_last) = (short[0], short[n - 1]);

    match a.strand() {
        Strand::Positive => {
            let anchor = long[long.len() - n];

            long_last.start().abs_diff(short_last.start()) <= max_fuzzy_junction
                && anchor.start() <= short_first.start()
                && short_first.start() < anchor.end()
        }
        Strand::Negative => {
            let anchor = long[n - 1];

            long_first.end().abs_diff(short_first.end()) <= max_fuzzy_junction
                && anchor.start() < short_last.end()
                && short_last.end() <= anchor.end()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TranscriptId;

    fn exons(blocks: &[(usize, usize)]) -> std::result::Result<Vec<Interval>, Box<dyn std::error::Error>> {
        Ok(blocks
            .iter()
            .map(|(s, e)| Interval::try_new(*s, *e))
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn model(
        strand: Strand,
        blocks: &[(usize, usize)],
    ) -> std::result::Result<TranscriptModel, Box<dyn std::error::Error>> {
        Ok(TranscriptModel::try_new(
            TranscriptId::new("PB", 1, 1),
            "chr1",
            strand,
            exons(blocks)?,
        )?)
    }

    #[test]
    fn it_classifies_single_exon_chains() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let single = exons(&[(100, 200)])?;
        let other = exons(&[(150, 250)])?;
        assert_eq!(compare_fuzzy_junctions(&single, &other, 0)?, Relation::Exact);

        let many = exons(&[(50, 180), (300, 400)])?;
        assert_eq!(compare_fuzzy_junctions(&single, &many, 0)?, Relation::Partial);
        assert_eq!(compare_fuzzy_junctions(&many, &single, 0)?, Relation::Partial);

        let many = exons(&[(50, 200), (300, 400)])?;
        assert_eq!(compare_fuzzy_junctions(&single, &many, 0)?, Relation::Subset);
        assert_eq!(compare_fuzzy_junctions(&many, &single, 0)?, Relation::Super);

        let far = exons(&[(1000, 1100)])?;
        assert_eq!(compare_fuzzy_junctions(&far, &many, 0)?, Relation::NoMatch);

        Ok(())
    }

    #[test]
    fn it_tolerates_fuzzy_junctions() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let a = exons(&[(100, 200), (300, 400), (500, 600)])?;
        let b = exons(&[(90, 203), (298, 400), (500, 610)])?;

        assert_eq!(compare_fuzzy_junctions(&a, &b, 5)?, Relation::Exact);
        assert_eq!(compare_fuzzy_junctions(&a, &b, 2)?, Relation::Partial);

        Ok(())
    }

    #[test]
    fn it_classifies_nested_and_staggered_chains(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let long = exons(&[(100, 200), (300, 400), (500, 600)])?;
        let tail = exons(&[(350, 400), (500, 600)])?;
        let head = exons(&[(100, 200), (300, 350)])?;
        let shifted = exons(&[(300, 400), (500, 600), (700, 800)])?;

        assert_eq!(compare_fuzzy_junctions(&long, &tail, 0)?, Relation::Super);
        assert_eq!(compare_fuzzy_junctions(&tail, &long, 0)?, Relation::Subset);

        assert_eq!(compare_fuzzy_junctions(&long, &head, 0)?, Relation::Super);
        assert_eq!(compare_fuzzy_junctions(&head, &long, 0)?, Relation::Subset);

        assert_eq!(compare_fuzzy_junctions(&long, &shifted, 0)?, Relation::Concordant);
        assert_eq!(compare_fuzzy_junctions(&shifted, &long, 0)?, Relation::Concordant);

        Ok(())
    }

    #[test]
    fn it_keeps_super_and_subset_antisymmetric() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let chains = vec![
            exons(&[(100, 200)])?,
            exons(&[(150, 400)])?,
            exons(&[(100, 200), (300, 400)])?,
            exons(&[(300, 400), (500, 600)])?,
            exons(&[(100, 200), (300, 400), (500, 600)])?,
            exons(&[(120, 200), (300, 400), (500, 650)])?,
            exons(&[(350, 400), (500, 600), (700, 800)])?,
        ];

        for a in &chains {
            for b in &chains {
                let forward = compare_fuzzy_junctions(a, b, 0)?;
                let backward = compare_fuzzy_junctions(b, a, 0)?;

                assert_eq!(
                    forward == Relation::Super,
                    backward == Relation::Subset,
                    "{a:?} vs {b:?}: {forward} and {backward}"
                );
            }
        }

        Ok(())
    }

    #[test]
    fn it_merges_3_prime_anchored_subsets_by_strand(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let long = model(Strand::Positive, &[(100, 200), (300, 400), (500, 600)])?;
        let short = model(Strand::Positive, &[(350, 400), (500, 600)])?;
        assert!(can_merge(Relation::Super, &long, &short, true, 0));

        // A positive strand subset missing the 3' exon is not anchored.
        let short = model(Strand::Positive, &[(100, 200), (300, 350)])?;
        assert!(!can_merge(Relation::Super, &long, &short, true, 0));

        // On the negative strand the 3' exon is the first one.
        let long = model(Strand::Negative, &[(100, 200), (300, 400), (500, 600)])?;
        let short = model(Strand::Negative, &[(100, 200), (300, 350)])?;
        assert!(can_merge(Relation::Super, &long, &short, true, 0));
        assert!(can_merge(Relation::Subset, &short, &long, true, 0));

        let short = model(Strand::Negative, &[(350, 400), (500, 600)])?;
        assert!(!can_merge(Relation::Super, &long, &short, true, 0));

        assert!(!can_merge(Relation::Partial, &long, &short, true, 0));
        assert!(!can_merge(Relation::Concordant, &long, &short, true, 0));
        assert!(can_merge(Relation::Exact, &long, &short, false, 0));

        Ok(())
    }
}
