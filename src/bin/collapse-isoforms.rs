//! A binary that collapses long-read transcript alignments into isoforms.
//!
//! ```shell
//! cargo run --release --bin=collapse-isoforms --features=binaries -- \
//!     reads.bed.gz -o sample --reads reads.fastq.gz --remove-subsets
//! ```
//!
//! The following files are written next to the output prefix:
//!
//! * `<prefix>.collapsed.gff`: the transcript models.
//! * `<prefix>.collapsed.group.txt`: the reads behind each model.
//! * `<prefix>.low_confidence.gff` and `<prefix>.low_confidence.group.txt`:
//!   models with less than the minimum support.
//! * `<prefix>.collapsed.rep.fa` (or `.fq`): one representative read per
//!   model, when `--reads` is provided.

use std::collections::HashMap;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use flate2::read::MultiGzDecoder;
use isocollapse::collapse;
use isocollapse::pipeline;
use isocollapse::pipeline::Output;
use isocollapse::representative;
use isocollapse::representative::Read;
use isocollapse::representative::Strategy;
use noodles::fasta;
use noodles::fastq;
use tracing::info;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

////////////////////////////////////////////////////////////////////////////////////////
// Inputs
////////////////////////////////////////////////////////////////////////////////////////

/// The format of a file of read sequences.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Format {
    /// FASTA.
    Fasta,

    /// FASTQ.
    Fastq,
}

impl Format {
    /// Guesses the format from the file name, looking past a `.gz` suffix.
    fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name().and_then(OsStr::to_str)?;
        let name = name.strip_suffix(".gz").unwrap_or(name);

        match name.rsplit_once('.')?.1 {
            "fa" | "fasta" => Some(Self::Fasta),
            "fq" | "fastq" => Some(Self::Fastq),
            _ => None,
        }
    }

    /// The extension of representative files in this format.
    fn extension(&self) -> &'static str {
        match self {
            Format::Fasta => "fa",
            Format::Fastq => "fq",
        }
    }
}

/// Opens a file for buffered reading, decompressing it if it ends in `.gz`.
fn open(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    match path.extension().and_then(OsStr::to_str) {
        Some("gz") => Ok(Box::new(BufReader::new(MultiGzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

/// Creates a file for buffered writing.
fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .with_context(|| format!("creating {}", path.display()))
}

/// Reads the sequences of every read in `wanted`.
fn read_sequences(
    path: &Path,
    format: Format,
    wanted: &HashSet<&str>,
) -> Result<HashMap<String, Read>> {
    let mut reads = HashMap::new();

    match format {
        Format::Fasta => {
            let mut reader = fasta::io::Reader::new(open(path)?);

            for result in reader.records() {
                let record = result.with_context(|| format!("reading {}", path.display()))?;
                let name = String::from_utf8_lossy(record.name()).to_string();

                if wanted.contains(name.as_str()) {
                    let sequence = record.sequence().as_ref().to_vec();
                    reads.insert(name, Read::new(sequence, None));
                }
            }
        }
        Format::Fastq => {
            let mut reader = fastq::io::Reader::new(open(path)?);

            for result in reader.records() {
                let record = result.with_context(|| format!("reading {}", path.display()))?;
                let name = String::from_utf8_lossy(record.name()).to_string();

                if wanted.contains(name.as_str()) {
                    let read = Read::new(
                        record.sequence().to_vec(),
                        Some(record.quality_scores().to_vec()),
                    );
                    reads.insert(name, read);
                }
            }
        }
    }

    Ok(reads)
}

////////////////////////////////////////////////////////////////////////////////////////
// Outputs
////////////////////////////////////////////////////////////////////////////////////////

/// Appends `suffix` to the output prefix.
fn output_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = prefix.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

/// Writes the models and groups of a pipeline run.
fn write_output(output: &Output, prefix: &Path) -> Result<()> {
    let path = output_path(prefix, ".collapsed.gff");
    let mut writer = create(&path)?;
    output
        .write_models(&mut writer)
        .and_then(|_| writer.flush())
        .with_context(|| format!("writing {}", path.display()))?;

    let path = output_path(prefix, ".collapsed.group.txt");
    let mut writer = create(&path)?;
    output
        .write_groups(&mut writer)
        .and_then(|_| writer.flush())
        .with_context(|| format!("writing {}", path.display()))?;

    let path = output_path(prefix, ".low_confidence.gff");
    let mut writer = create(&path)?;
    output
        .write_low_confidence_models(&mut writer)
        .and_then(|_| writer.flush())
        .with_context(|| format!("writing {}", path.display()))?;

    let path = output_path(prefix, ".low_confidence.group.txt");
    let mut writer = create(&path)?;
    output
        .write_low_confidence_groups(&mut writer)
        .and_then(|_| writer.flush())
        .with_context(|| format!("writing {}", path.display()))?;

    Ok(())
}

/// Picks and writes one representative read per passing isoform.
fn write_representatives(
    output: &Output,
    reads_path: &Path,
    least_error: bool,
    prefix: &Path,
) -> Result<()> {
    let Some(format) = Format::from_path(reads_path) else {
        bail!(
            "cannot tell whether {} is FASTA or FASTQ from its name",
            reads_path.display()
        );
    };

    let strategy = match (format, least_error) {
        (Format::Fastq, true) => Strategy::LeastExpectedErrors,
        (Format::Fasta, true) => bail!("--least-error requires FASTQ reads"),
        (_, false) => Strategy::Longest,
    };

    let wanted = output
        .isoforms()
        .iter()
        .flat_map(|isoform| isoform.group().members().iter().map(String::as_str))
        .collect::<HashSet<_>>();

    let reads = read_sequences(reads_path, format, &wanted)?;
    info!("loaded {} of {} member reads", reads.len(), wanted.len());

    let path = output_path(prefix, &format!(".collapsed.rep.{}", format.extension()));
    let mut writer = create(&path)?;

    for isoform in output.isoforms() {
        let representative = representative::pick(isoform, &reads, strategy).with_context(|| {
            format!(
                "picking a representative for {}",
                isoform.model().transcript_id()
            )
        })?;

        writeln!(writer, "{representative}")
            .with_context(|| format!("writing {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("writing {}", path.display()))?;

    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////
// Main
////////////////////////////////////////////////////////////////////////////////////////

/// Collapses redundant long-read transcript alignments into isoforms.
#[derive(Parser)]
struct Args {
    /// The spliced alignments in BED12 format (optionally gzipped).
    alignments: PathBuf,

    /// The prefix of every output file.
    #[arg(short, long)]
    output_prefix: PathBuf,

    /// The read sequences (FASTA or FASTQ, optionally gzipped) to pick
    /// representatives from.
    #[arg(short, long)]
    reads: Option<PathBuf>,

    /// Picks the representative with the fewest expected errors instead of
    /// the longest one (FASTQ only).
    #[arg(long, default_value_t = false)]
    least_error: bool,

    /// The tolerance for segment boundaries at splice junctions.
    #[arg(long, default_value_t = 0)]
    tolerate_middle: usize,

    /// The tolerance for the outermost segment boundaries.
    #[arg(long, default_value_t = 100)]
    tolerate_end: usize,

    /// Skips segments that match no exon instead of dropping the alignment.
    #[arg(long, default_value_t = false)]
    ok_to_miss_matches: bool,

    /// Refuses to merge models that differ only by extra 5' exons.
    #[arg(long, default_value_t = false)]
    no_extra_5exon: bool,

    /// Treats the outermost 5' boundary as hard junction evidence.
    #[arg(long, default_value_t = false)]
    hard_5_exon_alt: bool,

    /// The maximum junction difference for fuzzy collapsing.
    #[arg(long, default_value_t = 5)]
    max_fuzzy_junction: usize,

    /// Skips collapsing models with fuzzy junctions.
    #[arg(long, default_value_t = false)]
    no_fuzzy: bool,

    /// The minimum number of reads for a model to be reported with confidence.
    #[arg(long, default_value_t = 1)]
    min_support: usize,

    /// Removes isoforms that are a 3'-anchored subset of another isoform.
    #[arg(long, default_value_t = false)]
    remove_subsets: bool,

    /// Removes isoforms with fewer full-length reads than this.
    #[arg(long)]
    min_count: Option<usize>,

    /// The gene id prefix.
    #[arg(long, default_value = "PB")]
    gene_prefix: String,

    /// The isoform number each locus starts counting from.
    #[arg(long, default_value_t = 0)]
    starting_isoform_index: usize,

    #[command(flatten)]
    verbose: Verbosity,
}

fn run(args: &Args) -> Result<()> {
    let config = collapse::Builder::default()
        .tolerate_middle(args.tolerate_middle)
        .tolerate_end(args.tolerate_end)
        .ok_to_miss_matches(args.ok_to_miss_matches)
        .allow_extra_5exon(!args.no_extra_5exon)
        .skip_5_exon_alt(!args.hard_5_exon_alt)
        .max_fuzzy_junction(args.max_fuzzy_junction)
        .min_support(args.min_support)
        .gene_prefix(args.gene_prefix.clone())
        .starting_isoform_index(args.starting_isoform_index)
        .try_build()
        .context("building the collapse configuration")?;

    let mut stages = pipeline::Stages::default()
        .fuzzy(!args.no_fuzzy)
        .remove_subsets(args.remove_subsets);

    if let Some(min_count) = args.min_count {
        stages = stages.min_count(min_count);
    }

    let reader = isocollapse::Reader::new(open(&args.alignments)?);
    let output = pipeline::run(reader, &config, &stages)
        .with_context(|| format!("collapsing {}", args.alignments.display()))?;

    write_output(&output, &args.output_prefix)?;

    if let Some(reads) = &args.reads {
        write_representatives(&output, reads, args.least_error, &args.output_prefix)?;
    }

    info!(
        "wrote {} isoforms ({} with low support)",
        output.isoforms().len(),
        output.low_confidence().len()
    );

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .init(),
    };

    run(&args)
}
