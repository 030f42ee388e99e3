//! Turning merged candidates into numbered transcript models.

use crate::collapse::exon::ExonId;
use crate::collapse::exon::ExonSet;
use crate::collapse::merge::Candidate;
use crate::collapse::Config;
use crate::core::Interval;
use crate::model;
use crate::model::Isoform;
use crate::model::SupportGroup;
use crate::model::TranscriptId;
use crate::model::TranscriptModel;

/// An error related to emitting transcript models.
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// A candidate referenced an exon that does not exist in the locus.
    UnknownExon(ExonId),

    /// A model could not be created.
    InvalidModel(model::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnknownExon(id) => write!(f, "exon {id} does not exist in the locus"),
            Error::InvalidModel(err) => write!(f, "invalid model: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// The isoforms emitted for a single locus.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Emission {
    /// Isoforms with at least the minimum support.
    primary: Vec<Isoform>,

    /// Isoforms with less than the minimum support.
    low_confidence: Vec<Isoform>,

    /// The last isoform number handed out.
    isoform_index: usize,
}

impl Emission {
    /// Gets the isoforms with at least the minimum support.
    pub fn primary(&self) -> &[Isoform] {
        &self.primary
    }

    /// Gets the isoforms with less than the minimum support.
    pub fn low_confidence(&self) -> &[Isoform] {
        &self.low_confidence
    }

    /// Gets the last isoform number handed out.
    pub fn isoform_index(&self) -> usize {
        self.isoform_index
    }

    /// Consumes `self` and returns the primary and low-confidence isoforms.
    pub fn into_parts(self) -> (Vec<Isoform>, Vec<Isoform>) {
        (self.primary, self.low_confidence)
    }
}

/// Emits one transcript model and support group per merged candidate.
///
/// Isoforms are numbered from `isoform_index + 1` upwards in the order of
/// `candidates`. Adjacent exons that abut are reported as one exon. Groups
/// with fewer members than the minimum support are routed to the
/// low-confidence isoforms.
///
/// # Examples
///
/// ```
/// use isocollapse::collapse::Config;
/// use isocollapse::collapse::emit::emit;
/// use isocollapse::collapse::encode::ExonBitVector;
/// use isocollapse::collapse::exon::ExonSet;
/// use isocollapse::collapse::merge::Candidate;
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
/// let bits = ExonBitVector::from_ids(3, [0, 1, 2]);
/// let candidate = Candidate::try_new("a/f1p0/200", Strand::Positive, bits)?;
///
/// let emission = emit(vec![candidate], &exons, 7, 0, &Config::default())?;
/// assert_eq!(emission.isoform_index(), 1);
///
/// let model = emission.primary()[0].model();
/// assert_eq!(model.transcript_id(), "PB.7.1");
/// assert_eq!(
///     model.exons().iter().copied().collect::<Vec<_>>(),
///     vec![Interval::try_new(100, 200)?, Interval::try_new(300, 400)?]
/// );
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn emit(
    candidates: Vec<Candidate>,
    exons: &ExonSet,
    locus: usize,
    isoform_index: usize,
    config: &Config,
) -> Result<Emission> {
    let mut emission = Emission {
        isoform_index,
        ..Default::default()
    };

    for candidate in candidates {
        emission.isoform_index += 1;
        let id = TranscriptId::new(config.gene_prefix(), locus, emission.isoform_index);

        let mut runs = Vec::<Interval>::new();

        for exon_id in candidate.bits().ids() {
            let exon = *exons
                .get(exon_id)
                .ok_or(Error::UnknownExon(exon_id))?
                .interval();

            match runs.last_mut() {
                Some(run) if run.abuts(&exon) => {
                    *run = Interval::try_new(run.start(), exon.end()).unwrap_or_else(|_| {
                        unreachable!("joining two abutting exons cannot shrink the run")
                    });
                }
                _ => runs.push(exon),
            }
        }

        let model = TranscriptModel::try_new(id, exons.contig().clone(), candidate.strand(), runs)
            .map_err(Error::InvalidModel)?;
        let group = SupportGroup::new(model.transcript_id(), candidate.members().clone());

        let isoform = Isoform::new(model, group);

        if isoform.group().len() < config.min_support() {
            emission.low_confidence.push(isoform);
        } else {
            emission.primary.push(isoform);
        }
    }

    Ok(emission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collapse::config::Builder;
    use crate::collapse::encode::ExonBitVector;
    use crate::core::Strand;

    #[test]
    fn it_numbers_isoforms_and_routes_low_support() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let exons = ExonSet::from_intervals(
            "chr2",
            Strand::Negative,
            vec![Interval::try_new(100, 200)?, Interval::try_new(300, 400)?],
        );

        let mut a = Candidate::try_new("a/f1p0/1", Strand::Negative, ExonBitVector::from_ids(2, [0, 1]))?;
        let b = Candidate::try_new("b/f1p0/1", Strand::Negative, ExonBitVector::from_ids(2, [0, 1]))?;
        a = crate::collapse::merge::merge_candidates(vec![a, b], &exons, true)?
            .pop()
            .ok_or("expected one merged candidate")?;
        let c = Candidate::try_new("c/f1p0/1", Strand::Negative, ExonBitVector::from_ids(2, [1]))?;

        let config = Builder::default().min_support(2).gene_prefix("PBX").try_build()?;
        let emission = emit(vec![a, c], &exons, 3, 10, &config)?;

        assert_eq!(emission.isoform_index(), 12);
        assert_eq!(emission.primary().len(), 1);
        assert_eq!(emission.low_confidence().len(), 1);

        let primary = &emission.primary()[0];
        assert_eq!(primary.model().transcript_id(), "PBX.3.11");
        assert_eq!(primary.group().to_string(), "PBX.3.11\ta/f1p0/1,b/f1p0/1");

        let low = &emission.low_confidence()[0];
        assert_eq!(low.model().transcript_id(), "PBX.3.12");
        assert_eq!(low.model().start(), 300);
        assert_eq!(low.model().strand(), Strand::Negative);

        Ok(())
    }
}
