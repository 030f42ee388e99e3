//! Running the whole collapsing pipeline over a stream of alignments.
//!
//! ```text
//! BED12 ─▶ loci ─▶ collapse (per locus) ─▶ fuzzy collapse ─▶ filters ─▶ outputs
//! ```

use std::io;
use std::io::BufRead;
use std::io::Write;

use tracing::info;

use crate::alignment::locus;
use crate::collapse;
use crate::filter;
use crate::fuzzy;
use crate::model::gff;
use crate::model::Isoform;
use crate::reader;
use crate::Reader;

/// An error related to running the pipeline.
#[derive(Debug)]
pub enum Error {
    /// The alignments could not be read.
    Read(reader::Error),

    /// A locus could not be collapsed.
    Collapse(collapse::Error),

    /// Models could not be collapsed across fuzzy junctions.
    Fuzzy(fuzzy::Error),

    /// Isoforms could not be filtered.
    Filter(filter::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Read(err) => write!(f, "read error: {err}"),
            Error::Collapse(err) => write!(f, "collapse error: {err}"),
            Error::Fuzzy(err) => write!(f, "fuzzy collapse error: {err}"),
            Error::Filter(err) => write!(f, "filter error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// Which stages run after collapsing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Stages {
    /// Whether models are collapsed across fuzzy junctions.
    fuzzy: bool,

    /// Whether isoforms that are subsets of others are removed.
    remove_subsets: bool,

    /// The minimum full-length count an isoform needs to be kept.
    min_count: Option<usize>,
}

impl Stages {
    /// Sets whether models are collapsed across fuzzy junctions.
    pub fn fuzzy(mut self, value: bool) -> Self {
        self.fuzzy = value;
        self
    }

    /// Sets whether isoforms that are subsets of others are removed.
    pub fn remove_subsets(mut self, value: bool) -> Self {
        self.remove_subsets = value;
        self
    }

    /// Sets the minimum full-length count an isoform needs to be kept.
    pub fn min_count(mut self, value: usize) -> Self {
        self.min_count = Some(value);
        self
    }
}

/// The isoforms a pipeline run produced.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Output {
    /// The isoforms that passed every stage.
    isoforms: Vec<Isoform>,

    /// The isoforms with less than the minimum support.
    low_confidence: Vec<Isoform>,
}

impl Output {
    /// Gets the isoforms that passed every stage.
    pub fn isoforms(&self) -> &[Isoform] {
        &self.isoforms
    }

    /// Gets the isoforms with less than the minimum support.
    pub fn low_confidence(&self) -> &[Isoform] {
        &self.low_confidence
    }

    /// Writes the models of the passing isoforms.
    pub fn write_models<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_models(writer, &self.isoforms)
    }

    /// Writes the support groups of the passing isoforms.
    pub fn write_groups<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_groups(writer, &self.isoforms)
    }

    /// Writes the models of the low-confidence isoforms.
    pub fn write_low_confidence_models<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_models(writer, &self.low_confidence)
    }

    /// Writes the support groups of the low-confidence isoforms.
    pub fn write_low_confidence_groups<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_groups(writer, &self.low_confidence)
    }
}

/// Writes the GFF records of every model in `isoforms`.
fn write_models<W: Write>(writer: &mut W, isoforms: &[Isoform]) -> io::Result<()> {
    for isoform in isoforms {
        gff::write_model(writer, isoform.model())?;
    }

    Ok(())
}

/// Writes the support group of every isoform, one per line.
fn write_groups<W: Write>(writer: &mut W, isoforms: &[Isoform]) -> io::Result<()> {
    for isoform in isoforms {
        writeln!(writer, "{}", isoform.group())?;
    }

    Ok(())
}

/// Runs the pipeline over every alignment in `reader`.
///
/// # Examples
///
/// ```
/// use isocollapse::collapse::Config;
/// use isocollapse::pipeline;
/// use isocollapse::pipeline::Stages;
///
/// let data = b"chr1\t100\t400\tc1/f1p0/200\t0\t+\t100\t400\t0\t2\t100,100\t0,200\n\
///              chr1\t100\t390\tc2/f1p0/190\t0\t+\t100\t390\t0\t2\t100,90\t0,200\n";
/// let reader = isocollapse::Reader::new(&data[..]);
///
/// let output = pipeline::run(reader, &Config::default(), &Stages::default().fuzzy(true))?;
/// assert_eq!(output.isoforms().len(), 1);
///
/// let mut groups = Vec::new();
/// output.write_groups(&mut groups)?;
/// assert_eq!(String::from_utf8(groups)?, "PB.1.1\tc1/f1p0/200,c2/f1p0/190\n");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn run<T: BufRead>(
    mut reader: Reader<T>,
    config: &collapse::Config,
    stages: &Stages,
) -> Result<Output> {
    let alignments = reader
        .alignments()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::Read)?;

    let total = alignments.len();
    let loci = locus::group(alignments);
    info!("grouped {total} alignments into {} loci", loci.len());

    let emissions = collapse::collapse_loci(&loci, config).map_err(Error::Collapse)?;

    let mut output = Output::default();

    for emission in emissions {
        let (primary, low_confidence) = emission.into_parts();
        output.isoforms.extend(primary);
        output.low_confidence.extend(low_confidence);
    }

    info!(
        "collapsed into {} isoforms ({} with low support)",
        output.isoforms.len(),
        output.low_confidence.len()
    );

    if stages.fuzzy {
        let (models, groups) = output
            .isoforms
            .into_iter()
            .map(Isoform::into_parts)
            .unzip();

        output.isoforms = fuzzy::collapse_fuzzy_junctions(
            models,
            groups,
            config.allow_extra_5exon(),
            config.max_fuzzy_junction(),
        )
        .map_err(Error::Fuzzy)?;

        info!("{} isoforms remain after fuzzy collapsing", output.isoforms.len());
    }

    // Counts are filtered before subsets are removed: a subset is only ever
    // dropped in favor of an isoform that is itself kept.
    if let Some(min_count) = stages.min_count {
        output.isoforms =
            filter::filter_by_count(output.isoforms, min_count).map_err(Error::Filter)?;

        info!(
            "{} isoforms remain with at least {min_count} full-length reads",
            output.isoforms.len()
        );
    }

    if stages.remove_subsets {
        output.isoforms =
            filter::remove_subset_isoforms(output.isoforms, config.max_fuzzy_junction())
                .map_err(Error::Filter)?;

        info!("{} isoforms remain after removing subsets", output.isoforms.len());
    }

    Ok(output)
}
