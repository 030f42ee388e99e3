//! `isocollapse` is a crate for collapsing redundant long-read transcript
//! alignments into non-redundant isoform models.
//!
//! Long reads that come from the same transcript rarely align identically:
//! they are truncated at either end and their splice sites wobble by a few
//! bases. This crate reduces a set of spliced alignments to one model per
//! distinct exon chain, along with the reads that support each model.
//!
//! The crate provides the following points of entry:
//!
//! - Reading spliced alignments in BED12 format via the [`Reader`] facility
//!   and grouping them into [loci](crate::alignment::locus).
//! - [Collapsing](crate::collapse) the alignments of a locus into numbered
//!   transcript models and [support groups](crate::model::SupportGroup).
//! - [Fuzzy collapsing](crate::fuzzy) of models whose junctions differ by a
//!   few bases, and [filtering](crate::filter) the results.
//! - Picking a [representative](crate::representative) read per model.
//!
//! Most users will want the [`pipeline`], which strings these steps together
//! and writes the models as GFF and the support groups as text.
//!
//! ```
//! use isocollapse::collapse;
//! use isocollapse::pipeline;
//!
//! let data = b"chr1\t100\t600\tc1/f1p0/500\t0\t+\t100\t600\t0\t3\t100,100,100\t0,200,400\n\
//!              chr1\t100\t600\tc2/f2p0/490\t0\t+\t100\t600\t0\t3\t100,100,90\t0,200,400\n\
//!              chr1\t100\t600\tc3/f1p0/300\t0\t+\t100\t600\t0\t2\t100,100\t0,400\n";
//! let reader = isocollapse::Reader::new(&data[..]);
//!
//! let config = collapse::Builder::default().gene_prefix("PB").try_build()?;
//! let output = pipeline::run(reader, &config, &pipeline::Stages::default().fuzzy(true))?;
//!
//! for isoform in output.isoforms() {
//!     println!("{}", isoform.group());
//! }
//!
//! assert_eq!(output.isoforms().len(), 2);
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod alignment;
pub mod collapse;
pub mod core;
pub mod filter;
pub mod fuzzy;
pub mod index;
pub mod model;
pub mod pipeline;
pub mod read_id;
pub mod reader;
pub mod representative;

pub use self::reader::Reader;
