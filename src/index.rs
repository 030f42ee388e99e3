//! Interval indices over genome coordinates.
//!
//! Both the exon lookup within a locus and the genome-wide fuzzy junction
//! collapsing need the same two operations: insert an interval with a payload
//! and find every payload whose interval overlaps a query range. Both are
//! backed by a [`rust_lapper::Lapper`].

use std::collections::HashMap;

use rust_lapper as lapper;

use crate::core::Contig;
use crate::core::Interval;
use crate::core::Strand;

/// The inner value of the lookup data structure.
type Iv<T> = lapper::Interval<usize, T>;

/// An index of payloads by the genome interval they occupy.
#[derive(Debug)]
pub struct IntervalIndex<T>
where
    T: Eq + Clone + Send + Sync,
{
    /// The inner lookup table.
    inner: lapper::Lapper<usize, T>,
}

impl<T> IntervalIndex<T>
where
    T: Eq + Clone + Send + Sync,
{
    /// Creates an empty index.
    pub fn new() -> Self {
        Self {
            inner: lapper::Lapper::new(Vec::new()),
        }
    }

    /// Creates an index from a set of entries in one pass.
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::core::Interval;
    /// use isocollapse::index::IntervalIndex;
    ///
    /// let index = IntervalIndex::from_entries(vec![
    ///     (Interval::try_new(100, 200)?, "a"),
    ///     (Interval::try_new(300, 400)?, "b"),
    /// ]);
    ///
    /// let hits = index.find(&Interval::try_new(150, 350)?).collect::<Vec<_>>();
    /// assert_eq!(hits, vec![&"a", &"b"]);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_entries(entries: impl IntoIterator<Item = (Interval, T)>) -> Self {
        let intervals = entries
            .into_iter()
            .map(|(interval, val)| Iv {
                start: interval.start(),
                stop: interval.end(),
                val,
            })
            .collect::<Vec<_>>();

        Self {
            inner: lapper::Lapper::new(intervals),
        }
    }

    /// Inserts a payload occupying `interval`.
    pub fn insert(&mut self, interval: Interval, val: T) {
        self.inner.insert(Iv {
            start: interval.start(),
            stop: interval.end(),
            val,
        });
    }

    /// Finds every payload whose interval overlaps `interval`, in ascending
    /// order of start position.
    pub fn find<'a>(&'a self, interval: &Interval) -> impl Iterator<Item = &'a T> + 'a {
        self.inner
            .find(interval.start(), interval.end())
            .map(|iv| &iv.val)
    }

    /// Gets the number of entries in the index.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T> Default for IntervalIndex<T>
where
    T: Eq + Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

/// A set of [`IntervalIndex`]es, one per contig and strand.
///
/// Each partition is only ever written by one caller at a time; partitions
/// are entirely independent of each other.
#[derive(Debug)]
pub struct PartitionedIndex<T>
where
    T: Eq + Clone + Send + Sync,
{
    /// The inner lookup table for each (contig, strand) pair.
    inner: HashMap<(Contig, Strand), IntervalIndex<T>>,
}

impl<T> PartitionedIndex<T>
where
    T: Eq + Clone + Send + Sync,
{
    /// Creates an empty partitioned index.
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// Inserts a payload into the partition for `contig` and `strand`.
    pub fn insert(&mut self, contig: &Contig, strand: Strand, interval: Interval, val: T) {
        self.inner
            .entry((contig.clone(), strand))
            .or_default()
            .insert(interval, val);
    }

    /// Finds every payload in the partition for `contig` and `strand` whose
    /// interval overlaps `interval`.
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::core::Interval;
    /// use isocollapse::core::Strand;
    /// use isocollapse::index::PartitionedIndex;
    ///
    /// let mut index = PartitionedIndex::new();
    /// let chr1 = String::from("chr1");
    /// index.insert(&chr1, Strand::Positive, Interval::try_new(100, 200)?, 0usize);
    ///
    /// let query = Interval::try_new(150, 160)?;
    /// assert_eq!(index.find(&chr1, Strand::Positive, &query).count(), 1);
    /// assert_eq!(index.find(&chr1, Strand::Negative, &query).count(), 0);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn find<'a>(
        &'a self,
        contig: &Contig,
        strand: Strand,
        interval: &Interval,
    ) -> impl Iterator<Item = &'a T> + 'a {
        let interval = *interval;

        self.inner
            .get(&(contig.clone(), strand))
            .into_iter()
            .flat_map(move |index| index.find(&interval))
    }
}

impl<T> Default for PartitionedIndex<T>
where
    T: Eq + Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}
