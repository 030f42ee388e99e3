//! Encoding alignments as sets of consensus exons.

use crate::alignment::Alignment;
use crate::collapse::exon::ExonId;
use crate::collapse::exon::ExonSet;
use crate::collapse::Config;
use crate::core::Interval;

/// The number of bits held by each word of an [`ExonBitVector`].
const WORD_BITS: usize = u64::BITS as usize;

////////////////////////////////////////////////////////////////////////////////////////
// Bit vector
////////////////////////////////////////////////////////////////////////////////////////

/// A fixed-width set of exon ids within a locus.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ExonBitVector {
    /// The number of exons the vector can hold.
    width: usize,

    /// The words holding the bits.
    words: Vec<u64>,
}

impl ExonBitVector {
    /// Creates an empty bit vector able to hold `width` exon ids.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            words: vec![0; width.div_ceil(WORD_BITS)],
        }
    }

    /// Creates a bit vector from a set of exon ids.
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::collapse::encode::ExonBitVector;
    ///
    /// let bits = ExonBitVector::from_ids(100, [3, 70, 5]);
    /// assert_eq!(bits.ids().collect::<Vec<_>>(), vec![3, 5, 70]);
    /// assert_eq!(bits.first(), Some(3));
    /// assert_eq!(bits.last(), Some(70));
    /// ```
    pub fn from_ids(width: usize, ids: impl IntoIterator<Item = ExonId>) -> Self {
        let mut bits = Self::new(width);

        for id in ids {
            bits.insert(id);
        }

        bits
    }

    /// Gets the number of exons the vector can hold.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Sets the bit for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not less than the width of the vector.
    pub fn insert(&mut self, id: ExonId) {
        assert!(
            id < self.width,
            "exon id {id} is out of range for width {}",
            self.width
        );
        self.words[id / WORD_BITS] |= 1u64 << (id % WORD_BITS);
    }

    /// Returns whether the bit for `id` is set.
    pub fn contains(&self, id: ExonId) -> bool {
        self.words
            .get(id / WORD_BITS)
            .is_some_and(|word| *word & (1u64 << (id % WORD_BITS)) != 0)
    }

    /// Gets the number of set bits.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns whether no bits are set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Gets the smallest set exon id.
    pub fn first(&self) -> Option<ExonId> {
        self.words
            .iter()
            .enumerate()
            .find(|(_, w)| **w != 0)
            .map(|(i, w)| i * WORD_BITS + w.trailing_zeros() as usize)
    }

    /// Gets the largest set exon id.
    pub fn last(&self) -> Option<ExonId> {
        self.words
            .iter()
            .enumerate()
            .rev()
            .find(|(_, w)| **w != 0)
            .map(|(i, w)| i * WORD_BITS + (WORD_BITS - 1 - w.leading_zeros() as usize))
    }

    /// Gets an iterator over the set exon ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ExonId> + '_ {
        self.words.iter().enumerate().flat_map(|(i, word)| {
            let mut word = *word;

            std::iter::from_fn(move || {
                if word == 0 {
                    return None;
                }

                let bit = word.trailing_zeros() as usize;
                word &= word - 1;
                Some(i * WORD_BITS + bit)
            })
        })
    }

    /// Sets every bit that is set in `other`.
    ///
    /// # Panics
    ///
    /// Panics if the two vectors have different widths.
    pub fn union_with(&mut self, other: &ExonBitVector) {
        assert_eq!(
            self.width, other.width,
            "cannot union bit vectors of different widths"
        );

        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a |= *b;
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Encoding
////////////////////////////////////////////////////////////////////////////////////////

/// The reason an alignment could not be encoded.
///
/// A rejection is not an error: the alignment is simply left out of the
/// merge pool for its locus.
#[derive(Debug, Eq, PartialEq)]
pub enum Rejection {
    /// A segment matched no chain of exons.
    NoMatch(Interval),

    /// A segment matched exons at or before those matched by an earlier
    /// segment.
    OutOfOrder(Interval),

    /// No segment matched any exon.
    NoExons,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NoMatch(segment) => write!(f, "segment {segment} matches no exon"),
            Rejection::OutOfOrder(segment) => {
                write!(f, "segment {segment} matches exons out of order")
            }
            Rejection::NoExons => write!(f, "no segment matches any exon"),
        }
    }
}

impl std::error::Error for Rejection {}

/// Encodes an alignment as the set of exons its segments correspond to.
///
/// Outermost segment boundaries are matched with the end tolerance, while
/// boundaries at splice junctions are matched with the middle tolerance.
///
/// # Examples
///
/// ```
/// use isocollapse::alignment::Alignment;
/// use isocollapse::collapse::Config;
/// use isocollapse::collapse::encode::encode_alignment;
/// use isocollapse::collapse::exon::ExonSet;
/// use isocollapse::core::Interval;
/// use isocollapse::core::Strand;
///
/// let exons = ExonSet::from_intervals(
///     "chr1",
///     Strand::Positive,
///     vec![Interval::try_new(100, 200)?, Interval::try_new(300, 400)?],
/// );
///
/// let alignment = Alignment::try_new(
///     "r1/f1p0/150",
///     "chr1",
///     Strand::Positive,
///     vec![Interval::try_new(120, 200)?, Interval::try_new(300, 350)?],
/// )?;
///
/// let bits = encode_alignment(&alignment, &exons, &Config::default())?;
/// assert_eq!(bits.ids().collect::<Vec<_>>(), vec![0, 1]);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn encode_alignment(
    alignment: &Alignment,
    exons: &ExonSet,
    config: &Config,
) -> Result<ExonBitVector, Rejection> {
    let count = alignment.segments().len();
    let mut bits = ExonBitVector::new(exons.len());
    let mut last_matched: Option<ExonId> = None;

    for (i, segment) in alignment.segments().iter().enumerate() {
        let (left, right) = match (i == 0, i + 1 == count) {
            (true, true) => (config.tolerate_end(), config.tolerate_end()),
            (true, false) => (config.tolerate_end(), config.tolerate_middle()),
            (false, true) => (config.tolerate_middle(), config.tolerate_end()),
            (false, false) => (config.tolerate_middle(), config.tolerate_middle()),
        };

        let matches = match exons.match_segment(segment, left, right) {
            Some(matches) => matches,
            None if config.ok_to_miss_matches() => continue,
            None => return Err(Rejection::NoMatch(*segment)),
        };

        if let (Some(previous), Some(first)) = (last_matched, matches.first()) {
            if *first <= previous && !config.ok_to_miss_matches() {
                return Err(Rejection::OutOfOrder(*segment));
            }
        }

        for id in &matches {
            bits.insert(*id);
        }

        last_matched = matches.last().copied().or(last_matched);
    }

    if bits.is_empty() {
        return Err(Rejection::NoExons);
    }

    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collapse::config::Builder;
    use crate::core::Strand;

    fn exons() -> Result<ExonSet, Box<dyn std::error::Error>> {
        Ok(ExonSet::from_intervals(
            "chr1",
            Strand::Positive,
            vec![
                Interval::try_new(100, 200)?,
                Interval::try_new(300, 390)?,
                Interval::try_new(390, 400)?,
                Interval::try_new(500, 600)?,
            ],
        ))
    }

    fn alignment(blocks: &[(usize, usize)]) -> Result<Alignment, Box<dyn std::error::Error>> {
        let segments = blocks
            .iter()
            .map(|(s, e)| Interval::try_new(*s, *e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Alignment::try_new("r/f1p0/1", "chr1", Strand::Positive, segments)?)
    }

    #[test]
    fn it_handles_bits_across_words() {
        let mut bits = ExonBitVector::new(130);
        assert!(bits.is_empty());
        assert_eq!(bits.first(), None);
        assert_eq!(bits.last(), None);

        bits.insert(0);
        bits.insert(64);
        bits.insert(129);

        assert_eq!(bits.count(), 3);
        assert!(bits.contains(64));
        assert!(!bits.contains(63));
        assert!(!bits.contains(1000));
        assert_eq!(bits.last(), Some(129));

        let other = ExonBitVector::from_ids(130, [1, 128]);
        bits.union_with(&other);
        assert_eq!(bits.ids().collect::<Vec<_>>(), vec![0, 1, 64, 128, 129]);
    }

    #[test]
    fn it_encodes_identical_alignments_identically() -> Result<(), Box<dyn std::error::Error>> {
        let exons = exons()?;
        let config = Config::default();

        let a = encode_alignment(&alignment(&[(100, 200), (300, 400)])?, &exons, &config)?;
        let b = encode_alignment(&alignment(&[(100, 200), (300, 400)])?, &exons, &config)?;

        assert_eq!(a, b);
        assert_eq!(a.ids().collect::<Vec<_>>(), vec![0, 1, 2]);

        Ok(())
    }

    #[test]
    fn it_rejects_unmatched_segments() -> Result<(), Box<dyn std::error::Error>> {
        let exons = exons()?;
        let config = Config::default();

        // The interior boundary at 210 is outside the middle tolerance.
        let rejection = encode_alignment(&alignment(&[(100, 210), (300, 400)])?, &exons, &config)
            .unwrap_err();
        assert_eq!(rejection, Rejection::NoMatch(Interval::try_new(100, 210)?));

        let config = Builder::default().ok_to_miss_matches(true).try_build()?;
        let bits = encode_alignment(&alignment(&[(100, 210), (300, 400)])?, &exons, &config)?;
        assert_eq!(bits.ids().collect::<Vec<_>>(), vec![1, 2]);

        Ok(())
    }

    #[test]
    fn it_rejects_segments_that_fall_back_onto_a_matched_exon(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let exons = exons()?;
        let blocks = [(100, 150), (160, 200)];

        // Both segments land in the exon at 100-200.
        let config = Builder::default().tolerate_middle(60).try_build()?;
        let rejection = encode_alignment(&alignment(&blocks)?, &exons, &config).unwrap_err();
        assert_eq!(rejection, Rejection::OutOfOrder(Interval::try_new(160, 200)?));

        let config = Builder::default()
            .tolerate_middle(60)
            .ok_to_miss_matches(true)
            .try_build()?;
        let bits = encode_alignment(&alignment(&blocks)?, &exons, &config)?;
        assert_eq!(bits.ids().collect::<Vec<_>>(), vec![0]);

        Ok(())
    }

    #[test]
    fn it_uses_the_end_tolerance_for_outermost_boundaries(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let exons = exons()?;

        let config = Builder::default().tolerate_end(10).try_build()?;
        let rejection =
            encode_alignment(&alignment(&[(100, 200), (500, 550)])?, &exons, &config).unwrap_err();
        assert_eq!(rejection, Rejection::NoMatch(Interval::try_new(500, 550)?));

        let config = Config::default();
        let bits = encode_alignment(&alignment(&[(100, 200), (500, 550)])?, &exons, &config)?;
        assert_eq!(bits.ids().collect::<Vec<_>>(), vec![0, 3]);

        Ok(())
    }
}
