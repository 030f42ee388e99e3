//! GFF-like records for transcript models.
//!
//! Each model is written as one `transcript` line followed by one `exon` line
//! per exon, with 1-based, fully-closed coordinates:
//!
//! ```text
//! chr1	PacBio	transcript	101	400	.	+	.	gene_id "PB.1"; transcript_id "PB.1.1";
//! chr1	PacBio	exon	101	200	.	+	.	gene_id "PB.1"; transcript_id "PB.1.1";
//! chr1	PacBio	exon	301	400	.	+	.	gene_id "PB.1"; transcript_id "PB.1.1";
//! ```

use std::io;
use std::io::BufRead;
use std::io::Write;
use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::core;
use crate::core::Contig;
use crate::core::Interval;
use crate::core::Strand;
use crate::model;
use crate::model::TranscriptId;
use crate::model::TranscriptModel;

/// The delimiter for a GFF line.
const DELIMITER: char = '\t';

/// The number of expected fields in a GFF line.
pub const NUM_GFF_FIELDS: usize = 9;

/// The source written to every record.
const SOURCE: &str = "PacBio";

/// The placeholder for an empty field.
const EMPTY: &str = ".";

/// Matches a single `key "value"` attribute.
static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z_]+)\s+"([^"]*)""#).unwrap());

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with parsing a GFF line.
#[derive(Debug)]
pub enum ParseError {
    /// An incorrect number of fields in the line.
    IncorrectNumberOfFields(usize),

    /// An unknown feature kind.
    InvalidKind(String),

    /// An invalid position.
    InvalidPosition(ParseIntError),

    /// A start position of zero, which does not exist in 1-based coordinates.
    ZeroStart,

    /// An invalid interval.
    InvalidInterval(core::interval::Error),

    /// An invalid strand.
    InvalidStrand(core::strand::ParseError),

    /// The `transcript_id` attribute was missing.
    MissingTranscriptId,

    /// The `transcript_id` attribute could not be parsed.
    InvalidTranscriptId(model::ParseIdError),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncorrectNumberOfFields(fields) => write!(
                f,
                "invalid number of fields in GFF line: expected {} fields, found {} fields",
                NUM_GFF_FIELDS, fields
            ),
            ParseError::InvalidKind(kind) => write!(f, "invalid feature kind: {kind}"),
            ParseError::InvalidPosition(err) => write!(f, "invalid position: {err}"),
            ParseError::ZeroStart => write!(f, "start position must be at least 1"),
            ParseError::InvalidInterval(err) => write!(f, "invalid interval: {err}"),
            ParseError::InvalidStrand(err) => write!(f, "invalid strand: {err}"),
            ParseError::MissingTranscriptId => write!(f, "missing transcript_id attribute"),
            ParseError::InvalidTranscriptId(err) => write!(f, "invalid transcript_id: {err}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to reading transcript models.
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(io::Error),

    /// A line could not be parsed.
    Parse(usize, ParseError),

    /// An exon was found before any transcript or for a different transcript
    /// than the one being read.
    OrphanExon(usize, TranscriptId),

    /// A transcript had an invalid set of exons.
    InvalidModel(model::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::Parse(line_no, err) => write!(f, "parse error at line {line_no}: {err}"),
            Error::OrphanExon(line_no, id) => write!(
                f,
                "exon at line {line_no} does not follow a transcript record for {id}"
            ),
            Error::InvalidModel(err) => write!(f, "invalid model: {err}"),
        }
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////////////////////
// Records
////////////////////////////////////////////////////////////////////////////////////////

/// The kind of feature a record describes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// A whole transcript.
    Transcript,

    /// A single exon.
    Exon,
}

impl FromStr for Kind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transcript" => Ok(Kind::Transcript),
            "exon" => Ok(Kind::Exon),
            _ => Err(ParseError::InvalidKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Transcript => write!(f, "transcript"),
            Kind::Exon => write!(f, "exon"),
        }
    }
}

/// A single GFF line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The contig.
    contig: Contig,

    /// The feature kind.
    kind: Kind,

    /// The 0-based, half-open interval.
    interval: Interval,

    /// The strand.
    strand: Strand,

    /// The transcript the record belongs to.
    transcript_id: TranscriptId,
}

impl Record {
    /// Creates a new [`Record`].
    pub fn new(
        contig: Contig,
        kind: Kind,
        interval: Interval,
        strand: Strand,
        transcript_id: TranscriptId,
    ) -> Self {
        Self {
            contig,
            kind,
            interval,
            strand,
            transcript_id,
        }
    }

    /// Gets the contig.
    pub fn contig(&self) -> &Contig {
        &self.contig
    }

    /// Gets the feature kind.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Gets the 0-based, half-open interval.
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Gets the strand.
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Gets the transcript id.
    pub fn transcript_id(&self) -> &TranscriptId {
        &self.transcript_id
    }
}

impl FromStr for Record {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.split(DELIMITER).collect::<Vec<_>>();

        if parts.len() != NUM_GFF_FIELDS {
            return Err(ParseError::IncorrectNumberOfFields(parts.len()));
        }

        let kind = parts[2].parse()?;

        // Positions are 1-based and fully-closed on the wire.
        let start: usize = parts[3].parse().map_err(ParseError::InvalidPosition)?;
        let end: usize = parts[4].parse().map_err(ParseError::InvalidPosition)?;
        let start = start.checked_sub(1).ok_or(ParseError::ZeroStart)?;
        let interval = Interval::try_new(start, end).map_err(ParseError::InvalidInterval)?;

        let strand = parts[6].parse().map_err(ParseError::InvalidStrand)?;

        let transcript_id = ATTRIBUTE
            .captures_iter(parts[8])
            .find(|captures| &captures[1] == "transcript_id")
            .ok_or(ParseError::MissingTranscriptId)?[2]
            .parse()
            .map_err(ParseError::InvalidTranscriptId)?;

        Ok(Self::new(
            parts[0].to_string(),
            kind,
            interval,
            strand,
            transcript_id,
        ))
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{contig}\t{SOURCE}\t{kind}\t{start}\t{end}\t{EMPTY}\t{strand}\t{EMPTY}\tgene_id \
             \"{gene}\"; transcript_id \"{transcript}\";",
            contig = self.contig,
            kind = self.kind,
            start = self.interval.start() + 1,
            end = self.interval.end(),
            strand = self.strand,
            gene = self.transcript_id.gene_id(),
            transcript = self.transcript_id,
        )
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Reading and writing
////////////////////////////////////////////////////////////////////////////////////////

/// Writes every record of a model, one per line.
pub fn write_model<W: Write>(writer: &mut W, model: &TranscriptModel) -> io::Result<()> {
    for record in model.records() {
        writeln!(writer, "{record}")?;
    }

    Ok(())
}

/// Reads transcript models back from GFF lines.
///
/// Every transcript record must be directly followed by its exon records.
/// Blank lines and `#` comments are skipped.
///
/// # Examples
///
/// ```
/// use isocollapse::model::gff;
///
/// let data = "chr1\tPacBio\ttranscript\t101\t400\t.\t+\t.\tgene_id \"PB.1\"; transcript_id \"PB.1.1\";\n\
///             chr1\tPacBio\texon\t101\t200\t.\t+\t.\tgene_id \"PB.1\"; transcript_id \"PB.1.1\";\n\
///             chr1\tPacBio\texon\t301\t400\t.\t+\t.\tgene_id \"PB.1\"; transcript_id \"PB.1.1\";\n";
///
/// let models = gff::read_models(data.as_bytes())?;
/// assert_eq!(models.len(), 1);
/// assert_eq!(models[0].exons().len(), 2);
/// assert_eq!(models[0].start(), 100);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn read_models<R: BufRead>(reader: R) -> Result<Vec<TranscriptModel>, Error> {
    let mut models = Vec::new();
    let mut current: Option<(Record, Vec<Interval>)> = None;

    let finish = |(transcript, exons): (Record, Vec<Interval>)| {
        TranscriptModel::try_new(
            transcript.transcript_id,
            transcript.contig,
            transcript.strand,
            exons,
        )
        .map_err(Error::InvalidModel)
    };

    for (i, result) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = result.map_err(Error::Io)?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let record = line
            .parse::<Record>()
            .map_err(|err| Error::Parse(line_no, err))?;

        match record.kind {
            Kind::Transcript => {
                if let Some(previous) = current.take() {
                    models.push(finish(previous)?);
                }

                current = Some((record, Vec::new()));
            }
            Kind::Exon => match current.as_mut() {
                Some((transcript, exons)) if transcript.transcript_id == record.transcript_id => {
                    exons.push(record.interval)
                }
                _ => return Err(Error::OrphanExon(line_no, record.transcript_id)),
            },
        }
    }

    if let Some(last) = current {
        models.push(finish(last)?);
    }

    Ok(models)
}
