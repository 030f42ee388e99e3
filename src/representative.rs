//! Picking one read sequence to stand for each collapsed isoform.
//!
//! A representative is always a literal read from the isoform's support
//! group, never a consensus. Its header records where the isoform lies:
//!
//! ```text
//! PB.1.1|chr1:100-400(+)|c1/f1p0/200
//! ```

use std::collections::HashMap;

use crate::model::Isoform;

/// The offset of Phred quality scores encoded as ASCII characters.
const PHRED_OFFSET: u8 = 33;

/// An error related to picking a representative.
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// A member of the support group has no read sequence.
    MissingRead(String),

    /// Quality scores were needed but the read has none.
    MissingQuality(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingRead(name) => write!(f, "no sequence for read `{name}`"),
            Error::MissingQuality(name) => write!(f, "no quality scores for read `{name}`"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A read sequence, with quality scores when it came from a FASTQ file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Read {
    /// The bases.
    sequence: Vec<u8>,

    /// The Phred+33 encoded quality scores.
    quality: Option<Vec<u8>>,
}

impl Read {
    /// Creates a new [`Read`].
    pub fn new(sequence: impl Into<Vec<u8>>, quality: Option<Vec<u8>>) -> Self {
        Self {
            sequence: sequence.into(),
            quality,
        }
    }

    /// Gets the bases.
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Gets the Phred+33 encoded quality scores, if any.
    pub fn quality(&self) -> Option<&[u8]> {
        self.quality.as_deref()
    }
}

/// How a representative is chosen among the reads of a group.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Strategy {
    /// The longest read. Ties go to the later member.
    #[default]
    Longest,

    /// The read with the fewest expected base errors. Ties go to the earlier
    /// member.
    LeastExpectedErrors,
}

/// The read chosen to stand for an isoform.
#[derive(Clone, Debug, PartialEq)]
pub struct Representative {
    /// The header.
    header: String,

    /// The chosen read.
    read: Read,
}

impl Representative {
    /// Gets the header.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Gets the chosen read.
    pub fn read(&self) -> &Read {
        &self.read
    }
}

impl std::fmt::Display for Representative {
    /// Formats the representative as a FASTQ record when it carries quality
    /// scores and as a FASTA record otherwise.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sequence = String::from_utf8_lossy(&self.read.sequence);

        match &self.read.quality {
            Some(quality) => write!(
                f,
                "@{}\n{sequence}\n+\n{}",
                self.header,
                String::from_utf8_lossy(quality)
            ),
            None => write!(f, ">{}\n{sequence}", self.header),
        }
    }
}

/// Computes the expected number of base errors from Phred+33 encoded quality
/// scores.
///
/// # Examples
///
/// ```
/// use isocollapse::representative::expected_errors;
///
/// // Q10 and Q20.
/// let errors = expected_errors(b"+5");
/// assert!((errors - 0.11).abs() < 1e-9);
/// ```
pub fn expected_errors(quality: &[u8]) -> f64 {
    quality
        .iter()
        .map(|q| 10f64.powf(-f64::from(q.saturating_sub(PHRED_OFFSET)) / 10.0))
        .sum()
}

/// Picks the representative read for an isoform from `reads`, which are
/// keyed by read name.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// use isocollapse::core::Interval;
/// use isocollapse::core::Strand;
/// use isocollapse::model::Isoform;
/// use isocollapse::model::SupportGroup;
/// use isocollapse::model::TranscriptId;
/// use isocollapse::model::TranscriptModel;
/// use isocollapse::representative::pick;
/// use isocollapse::representative::Read;
/// use isocollapse::representative::Strategy;
///
/// let model = TranscriptModel::try_new(
///     TranscriptId::new("PB", 1, 1),
///     "chr1",
///     Strand::Positive,
///     vec![Interval::try_new(100, 200)?, Interval::try_new(300, 400)?],
/// )?;
/// let group = "PB.1.1\tr1/f1p0/3,r2/f1p0/5".parse::<SupportGroup>()?;
/// let isoform = Isoform::new(model, group);
///
/// let reads = HashMap::from([
///     (String::from("r1/f1p0/3"), Read::new("ACG", None)),
///     (String::from("r2/f1p0/5"), Read::new("ACGTA", None)),
/// ]);
///
/// let representative = pick(&isoform, &reads, Strategy::Longest)?;
/// assert_eq!(representative.header(), "PB.1.1|chr1:100-400(+)|r2/f1p0/5");
/// assert_eq!(representative.to_string(), ">PB.1.1|chr1:100-400(+)|r2/f1p0/5\nACGTA");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn pick(
    isoform: &Isoform,
    reads: &HashMap<String, Read>,
    strategy: Strategy,
) -> Result<Representative> {
    let mut best: Option<(&String, &Read, f64)> = None;

    for member in isoform.group().members().iter() {
        let read = reads
            .get(member)
            .ok_or_else(|| Error::MissingRead(member.clone()))?;

        let (score, better) = match strategy {
            Strategy::Longest => {
                let score = read.sequence.len() as f64;
                (score, best.map_or(true, |(_, _, best)| score >= best))
            }
            Strategy::LeastExpectedErrors => {
                let quality = read
                    .quality()
                    .ok_or_else(|| Error::MissingQuality(member.clone()))?;
                let score = expected_errors(quality);
                (score, best.map_or(true, |(_, _, best)| score < best))
            }
        };

        if better {
            best = Some((member, read, score));
        }
    }

    let (name, read, _) =
        best.unwrap_or_else(|| unreachable!("every support group has at least one member"));
    let model = isoform.model();

    Ok(Representative {
        header: format!(
            "{}|{}:{}-{}({})|{name}",
            model.transcript_id(),
            model.contig(),
            model.start(),
            model.end(),
            model.strand()
        ),
        read: read.clone(),
    })
}
