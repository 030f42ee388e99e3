//! Core functionality used across the crate.

pub mod interval;
pub mod strand;

pub use interval::Interval;
pub use interval::Position;
pub use strand::Strand;

/// A contiguous molecule (chromosome, scaffold, etc.) upon which alignments
/// and transcript models are located.
pub type Contig = String;
