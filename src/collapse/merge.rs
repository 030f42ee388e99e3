//! Merging alignments whose exon sets are compatible.
//!
//! Two exon sets are compatible when they agree exactly over the exons they
//! share and differ only by extra exons at either end. Extra exons at the 3'
//! end must continue the shared range without any gap (i.e., the read was
//! truncated within what is otherwise one continuous stretch of exons). Extra
//! exons at the 5' end are allowed freely when extra 5' exons are permitted
//! and are held to the same rule as the 3' end otherwise.

use nonempty::NonEmpty;

use crate::collapse::encode::ExonBitVector;
use crate::collapse::exon::ExonId;
use crate::collapse::exon::ExonSet;
use crate::core::Strand;

/// An error related to merging candidates.
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// A candidate was created without any exons.
    NoExons(String),

    /// An exon id was not present within the locus.
    UnknownExon(ExonId),

    /// The merge reached a state that should never happen.
    InvariantViolation(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NoExons(id) => write!(f, "candidate `{id}` does not use any exon"),
            Error::UnknownExon(id) => write!(f, "exon {id} does not exist in the locus"),
            Error::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A set of reads that share one exon structure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Candidate {
    /// The read identifiers, in the order they were merged.
    members: NonEmpty<String>,

    /// The strand.
    strand: Strand,

    /// The exons used.
    bits: ExonBitVector,
}

impl Candidate {
    /// Attempts to create a candidate for a single read.
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::collapse::encode::ExonBitVector;
    /// use isocollapse::collapse::merge::Candidate;
    /// use isocollapse::core::Strand;
    ///
    /// let bits = ExonBitVector::from_ids(4, [1, 2]);
    /// let candidate = Candidate::try_new("r1/f1p0/100", Strand::Positive, bits)?;
    /// assert_eq!(candidate.first(), 1);
    /// assert_eq!(candidate.last(), 2);
    ///
    /// let empty = ExonBitVector::new(4);
    /// assert!(Candidate::try_new("r2/f1p0/100", Strand::Positive, empty).is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(read_id: impl Into<String>, strand: Strand, bits: ExonBitVector) -> Result<Self> {
        let read_id = read_id.into();

        if bits.is_empty() {
            return Err(Error::NoExons(read_id));
        }

        Ok(Self {
            members: NonEmpty::new(read_id),
            strand,
            bits,
        })
    }

    /// Gets the read identifiers.
    pub fn members(&self) -> &NonEmpty<String> {
        &self.members
    }

    /// Gets the read identifiers joined by `,`.
    pub fn joined_members(&self) -> String {
        self.members.iter().cloned().collect::<Vec<_>>().join(",")
    }

    /// Gets the strand.
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Gets the exons used.
    pub fn bits(&self) -> &ExonBitVector {
        &self.bits
    }

    /// Gets the first exon used.
    pub fn first(&self) -> ExonId {
        self.bits
            .first()
            .unwrap_or_else(|| unreachable!("a candidate always uses at least one exon"))
    }

    /// Gets the last exon used.
    pub fn last(&self) -> ExonId {
        self.bits
            .last()
            .unwrap_or_else(|| unreachable!("a candidate always uses at least one exon"))
    }

    /// Folds `other` into `self`, taking on the merged exons.
    fn absorb(&mut self, other: Candidate, bits: ExonBitVector) {
        for member in other.members {
            self.members.push(member);
        }

        self.bits = bits;
    }
}

/// Merges every compatible pair of candidates into support groups.
///
/// Candidates are ordered by strand and first exon. Each candidate that has
/// not yet been absorbed then absorbs every later, compatible candidate up
/// until the first candidate that starts after it ends. The returned groups
/// are in that same order.
///
/// # Examples
///
/// ```
/// use isocollapse::collapse::encode::ExonBitVector;
/// use isocollapse::collapse::exon::ExonSet;
/// use isocollapse::collapse::merge::Candidate;
/// use isocollapse::collapse::merge::merge_candidates;
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
/// let candidates = vec![
///     Candidate::try_new("a/f1p0/200", Strand::Positive, ExonBitVector::from_ids(3, [0, 1, 2]))?,
///     Candidate::try_new("b/f1p0/190", Strand::Positive, ExonBitVector::from_ids(3, [0, 1]))?,
/// ];
///
/// let merged = merge_candidates(candidates, &exons, true)?;
/// assert_eq!(merged.len(), 1);
/// assert_eq!(merged[0].joined_members(), "a/f1p0/200,b/f1p0/190");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn merge_candidates(
    mut candidates: Vec<Candidate>,
    exons: &ExonSet,
    allow_extra_5exon: bool,
) -> Result<Vec<Candidate>> {
    candidates.sort_by_key(|c| (c.strand(), c.first()));

    let mut pool = candidates.into_iter().map(Some).collect::<Vec<_>>();
    let mut merged = Vec::new();

    for i in 0..pool.len() {
        let Some(mut current) = pool[i].take() else {
            continue;
        };

        for slot in pool.iter_mut().skip(i + 1) {
            let Some(other) = slot.as_ref() else {
                continue;
            };

            if other.strand() != current.strand() || current.last() < other.first() {
                break;
            }

            if let Some(bits) = merge_pair(
                current.bits(),
                other.bits(),
                exons,
                current.strand(),
                allow_extra_5exon,
            )? {
                if let Some(other) = slot.take() {
                    current.absorb(other, bits);
                }
            }
        }

        merged.push(current);
    }

    Ok(merged)
}

/// Attempts to merge two exon sets, returning the union if they are
/// compatible.
pub fn merge_pair(
    a: &ExonBitVector,
    b: &ExonBitVector,
    exons: &ExonSet,
    strand: Strand,
    allow_extra_5exon: bool,
) -> Result<Option<ExonBitVector>> {
    let a_ids = a.ids().collect::<Vec<_>>();
    let b_ids = b.ids().collect::<Vec<_>>();

    let (low, high) = match (a_ids.first().copied(), b_ids.first().copied()) {
        (Some(x), Some(y)) if y < x => (b_ids, a_ids),
        (Some(_), Some(_)) => (a_ids, b_ids),
        _ => return Ok(None),
    };

    let (n_low, n_high) = (low.len(), high.len());

    if low[n_low - 1] < high[0] {
        return Ok(None);
    }

    let Some(i) = low.iter().position(|id| *id == high[0]) else {
        return Ok(None);
    };

    // Extra leading exons of `low`: the 3' end of a negative strand model, or
    // the 5' end of a positive strand model.
    let leading_must_abut = strand.is_reverse() || !allow_extra_5exon;

    // `k == i` checks the junction into the shared range as well, so an
    // extra end exon only merges when it continues straight into the shared
    // exons. This is stricter than comparing the extra exons among themselves.
    for k in 1..=i {
        if leading_must_abut && !abuts(exons, low[k - 1], low[k])? {
            return Ok(None);
        }
    }

    let shared_end = n_low.min(n_high + i);

    if low[i..shared_end] != high[..shared_end - i] {
        return Ok(None);
    }

    let j = shared_end - 1;

    // Extra trailing exons: the 3' end of a positive strand model, or the 5'
    // end of a negative strand model.
    let trailing_must_abut = !strand.is_reverse() || !allow_extra_5exon;

    let trailing = if j == n_low - 1 {
        &high[j - i..]
    } else if j - i == n_high - 1 {
        &low[j..]
    } else {
        return Err(Error::InvariantViolation(format!(
            "neither exon set is exhausted after the shared range ending at exon {}",
            low[j]
        )));
    };

    if trailing_must_abut {
        for pair in trailing.windows(2) {
            if !abuts(exons, pair[0], pair[1])? {
                return Ok(None);
            }
        }
    }

    let mut union = a.clone();
    union.union_with(b);
    Ok(Some(union))
}

/// Returns whether exon `a` ends exactly where exon `b` starts.
fn abuts(exons: &ExonSet, a: ExonId, b: ExonId) -> Result<bool> {
    let a = exons.get(a).ok_or(Error::UnknownExon(a))?;
    let b = exons.get(b).ok_or(Error::UnknownExon(b))?;
    Ok(a.interval().abuts(b.interval()))
}
