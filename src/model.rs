//! Transcript models and the reads that support them.
//!
//! A [`TranscriptModel`] is the outcome of collapsing: one isoform on a
//! contig and strand, described by its ordered list of exons. Every model is
//! identified by a [`TranscriptId`] of the form `<prefix>.<locus>.<isoform>`
//! (e.g., `PB.12.3`), where `<prefix>.<locus>` is the gene id. The reads that
//! were collapsed into a model are tracked separately in a
//! [`SupportGroup`](group::SupportGroup).

use std::num::ParseIntError;
use std::str::FromStr;

use nonempty::NonEmpty;

use crate::core::Contig;
use crate::core::Interval;
use crate::core::Position;
use crate::core::Strand;

pub mod gff;
pub mod group;

pub use group::SupportGroup;

/// The delimiter between the parts of a transcript id.
const ID_DELIMITER: char = '.';

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to parsing a [`TranscriptId`].
#[derive(Debug, Eq, PartialEq)]
pub enum ParseIdError {
    /// The id did not have a prefix, locus, and isoform part.
    MissingParts(String),

    /// The locus or isoform part was not a number.
    InvalidNumber(String, ParseIntError),
}

impl std::fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseIdError::MissingParts(id) => write!(
                f,
                "transcript id `{id}` is not of the form `<prefix>.<locus>.<isoform>`"
            ),
            ParseIdError::InvalidNumber(id, err) => {
                write!(f, "invalid number in transcript id `{id}`: {err}")
            }
        }
    }
}

impl std::error::Error for ParseIdError {}

/// An error related to the construction of a [`TranscriptModel`].
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// No exons were provided.
    NoExons(TranscriptId),

    /// An exon starts before the previous exon ends.
    UnorderedExons(TranscriptId, Interval, Interval),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NoExons(id) => write!(f, "transcript {id} has no exons"),
            Error::UnorderedExons(id, a, b) => write!(
                f,
                "exons of transcript {id} must be ascending and non-overlapping: {a} is \
                 followed by {b}"
            ),
        }
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////////////////////
// Transcript identifiers
////////////////////////////////////////////////////////////////////////////////////////

/// The identifier of a transcript model.
///
/// Identifiers sort by locus and then by isoform (numerically), which is the
/// order models are emitted in.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TranscriptId {
    /// The locus number.
    locus: usize,

    /// The isoform number within the locus.
    isoform: usize,

    /// The gene prefix.
    prefix: String,
}

impl TranscriptId {
    /// Creates a new [`TranscriptId`].
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::model::TranscriptId;
    ///
    /// let id = TranscriptId::new("PB", 12, 3);
    /// assert_eq!(id.gene_id(), "PB.12");
    /// assert_eq!(id.to_string(), "PB.12.3");
    /// ```
    pub fn new(prefix: impl Into<String>, locus: usize, isoform: usize) -> Self {
        Self {
            locus,
            isoform,
            prefix: prefix.into(),
        }
    }

    /// Gets the gene prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Gets the locus number.
    pub fn locus(&self) -> usize {
        self.locus
    }

    /// Gets the isoform number.
    pub fn isoform(&self) -> usize {
        self.isoform
    }

    /// Gets the gene id (`<prefix>.<locus>`).
    pub fn gene_id(&self) -> String {
        format!("{}{}{}", self.prefix, ID_DELIMITER, self.locus)
    }
}

impl FromStr for TranscriptId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ID_DELIMITER);

        let (Some(isoform), Some(locus), Some(prefix)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseIdError::MissingParts(s.to_string()));
        };

        if prefix.is_empty() {
            return Err(ParseIdError::MissingParts(s.to_string()));
        }

        let parse = |value: &str| {
            value
                .parse::<usize>()
                .map_err(|err| ParseIdError::InvalidNumber(s.to_string(), err))
        };

        Ok(Self::new(prefix, parse(locus)?, parse(isoform)?))
    }
}

impl std::fmt::Display for TranscriptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.gene_id(), ID_DELIMITER, self.isoform)
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Transcript models
////////////////////////////////////////////////////////////////////////////////////////

/// A collapsed transcript model.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TranscriptModel {
    /// The identifier.
    id: TranscriptId,

    /// The contig.
    contig: Contig,

    /// The strand.
    strand: Strand,

    /// The exons, in ascending genome order.
    exons: NonEmpty<Interval>,
}

impl TranscriptModel {
    /// Attempts to create a new [`TranscriptModel`].
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::core::Interval;
    /// use isocollapse::core::Strand;
    /// use isocollapse::model::TranscriptId;
    /// use isocollapse::model::TranscriptModel;
    ///
    /// let model = TranscriptModel::try_new(
    ///     TranscriptId::new("PB", 1, 1),
    ///     "chr1",
    ///     Strand::Negative,
    ///     vec![Interval::try_new(100, 200)?, Interval::try_new(300, 400)?],
    /// )?;
    ///
    /// assert_eq!(model.transcript_id(), "PB.1.1");
    /// assert_eq!(model.gene_id(), "PB.1");
    /// assert_eq!(model.start(), 100);
    /// assert_eq!(model.end(), 400);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(
        id: TranscriptId,
        contig: impl Into<Contig>,
        strand: Strand,
        exons: Vec<Interval>,
    ) -> Result<Self, Error> {
        let Some(exons) = NonEmpty::from_vec(exons) else {
            return Err(Error::NoExons(id));
        };

        for (a, b) in exons.iter().zip(exons.iter().skip(1)) {
            if b.start() < a.end() {
                return Err(Error::UnorderedExons(id, *a, *b));
            }
        }

        Ok(Self {
            id,
            contig: contig.into(),
            strand,
            exons,
        })
    }

    /// Gets the identifier.
    pub fn id(&self) -> &TranscriptId {
        &self.id
    }

    /// Gets the transcript id as a string.
    pub fn transcript_id(&self) -> String {
        self.id.to_string()
    }

    /// Gets the gene id.
    pub fn gene_id(&self) -> String {
        self.id.gene_id()
    }

    /// Gets the contig.
    pub fn contig(&self) -> &Contig {
        &self.contig
    }

    /// Gets the strand.
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Gets the exons.
    pub fn exons(&self) -> &NonEmpty<Interval> {
        &self.exons
    }

    /// Gets the start of the first exon.
    pub fn start(&self) -> Position {
        self.exons.first().start()
    }

    /// Gets the end of the last exon.
    pub fn end(&self) -> Position {
        self.exons.last().end()
    }

    /// Gets the span of the model from its first exon to its last exon.
    pub fn span(&self) -> Interval {
        Interval::try_new(self.start(), self.end())
            .unwrap_or_else(|_| unreachable!("a model always spans at least one exon"))
    }

    /// Gets the GFF records (the transcript followed by its exons).
    pub fn records(&self) -> Vec<gff::Record> {
        let transcript = gff::Record::new(
            self.contig.clone(),
            gff::Kind::Transcript,
            self.span(),
            self.strand,
            self.id.clone(),
        );

        std::iter::once(transcript)
            .chain(self.exons.iter().map(|exon| {
                gff::Record::new(
                    self.contig.clone(),
                    gff::Kind::Exon,
                    *exon,
                    self.strand,
                    self.id.clone(),
                )
            }))
            .collect()
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Isoforms
////////////////////////////////////////////////////////////////////////////////////////

/// A transcript model together with the group of reads supporting it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Isoform {
    /// The model.
    model: TranscriptModel,

    /// The supporting reads.
    group: SupportGroup,
}

impl Isoform {
    /// Creates a new [`Isoform`].
    pub fn new(model: TranscriptModel, group: SupportGroup) -> Self {
        Self { model, group }
    }

    /// Gets the model.
    pub fn model(&self) -> &TranscriptModel {
        &self.model
    }

    /// Gets the support group.
    pub fn group(&self) -> &SupportGroup {
        &self.group
    }

    /// Consumes `self` and returns the model and the support group.
    pub fn into_parts(self) -> (TranscriptModel, SupportGroup) {
        (self.model, self.group)
    }
}
