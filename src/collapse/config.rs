//! A builder for a collapsing [`Config`].

use crate::collapse::Config;

/// The delimiter between the prefix, locus, and isoform of a transcript id.
const ID_DELIMITER: char = '.';

/// An error that occurs when a knob provided to the [`Builder`] is not valid.
#[derive(Debug, Eq, PartialEq)]
pub enum InvalidError {
    /// The gene prefix was empty.
    EmptyGenePrefix,

    /// The gene prefix contained the id delimiter.
    GenePrefixContainsDelimiter(String),

    /// The minimum support was zero.
    ZeroMinSupport,
}

impl std::fmt::Display for InvalidError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidError::EmptyGenePrefix => write!(f, "gene prefix cannot be empty"),
            InvalidError::GenePrefixContainsDelimiter(prefix) => write!(
                f,
                "gene prefix `{prefix}` cannot contain `{ID_DELIMITER}`"
            ),
            InvalidError::ZeroMinSupport => write!(f, "minimum support must be at least 1"),
        }
    }
}

impl std::error::Error for InvalidError {}

/// An error related to a [`Builder`].
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// A knob was set to an invalid value.
    Invalid(InvalidError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Invalid(err) => write!(f, "invalid configuration: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A builder for a [`Config`].
///
/// Every knob that is never set falls back to its default (see [`Config`]).
#[derive(Debug, Default)]
pub struct Builder {
    /// The tolerance for interior segment boundaries.
    tolerate_middle: Option<usize>,

    /// The tolerance for outermost segment boundaries.
    tolerate_end: Option<usize>,

    /// Whether segments that match no exon are skipped.
    ok_to_miss_matches: Option<bool>,

    /// Whether extra 5' exons are allowed when merging.
    allow_extra_5exon: Option<bool>,

    /// Whether the outermost 5' boundary is soft junction evidence.
    skip_5_exon_alt: Option<bool>,

    /// The maximum junction difference for fuzzy collapsing.
    max_fuzzy_junction: Option<usize>,

    /// The minimum number of supporting reads for the primary stream.
    min_support: Option<usize>,

    /// The gene id prefix.
    gene_prefix: Option<String>,

    /// The isoform index each locus starts counting from.
    starting_isoform_index: Option<usize>,
}

impl Builder {
    /// Sets the tolerance for interior segment boundaries.
    pub fn tolerate_middle(mut self, value: usize) -> Self {
        self.tolerate_middle = Some(value);
        self
    }

    /// Sets the tolerance for outermost segment boundaries.
    pub fn tolerate_end(mut self, value: usize) -> Self {
        self.tolerate_end = Some(value);
        self
    }

    /// Sets whether segments that match no exon are skipped rather than
    /// rejecting the whole alignment.
    pub fn ok_to_miss_matches(mut self, value: bool) -> Self {
        self.ok_to_miss_matches = Some(value);
        self
    }

    /// Sets whether extra 5' exons are allowed when merging.
    pub fn allow_extra_5exon(mut self, value: bool) -> Self {
        self.allow_extra_5exon = Some(value);
        self
    }

    /// Sets whether the outermost 5' boundary is treated as soft evidence.
    pub fn skip_5_exon_alt(mut self, value: bool) -> Self {
        self.skip_5_exon_alt = Some(value);
        self
    }

    /// Sets the maximum junction difference for fuzzy collapsing.
    pub fn max_fuzzy_junction(mut self, value: usize) -> Self {
        self.max_fuzzy_junction = Some(value);
        self
    }

    /// Sets the minimum number of supporting reads a model needs to be
    /// reported in the primary stream.
    pub fn min_support(mut self, value: usize) -> Self {
        self.min_support = Some(value);
        self
    }

    /// Sets the gene id prefix.
    pub fn gene_prefix(mut self, value: impl Into<String>) -> Self {
        self.gene_prefix = Some(value.into());
        self
    }

    /// Sets the isoform index each locus starts counting from.
    pub fn starting_isoform_index(mut self, value: usize) -> Self {
        self.starting_isoform_index = Some(value);
        self
    }

    /// Consumes `self` to attempt to build a [`Config`].
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::collapse::config::Builder;
    ///
    /// let config = Builder::default()
    ///     .tolerate_end(50)
    ///     .gene_prefix("PBX")
    ///     .try_build()?;
    ///
    /// assert_eq!(config.tolerate_end(), 50);
    /// assert_eq!(config.tolerate_middle(), 0);
    /// assert_eq!(config.gene_prefix(), "PBX");
    ///
    /// assert!(Builder::default().gene_prefix("PB.1").try_build().is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_build(self) -> Result<Config> {
        let defaults = Config::default();

        let gene_prefix = self.gene_prefix.unwrap_or(defaults.gene_prefix);

        if gene_prefix.is_empty() {
            return Err(Error::Invalid(InvalidError::EmptyGenePrefix));
        }

        if gene_prefix.contains(ID_DELIMITER) {
            return Err(Error::Invalid(InvalidError::GenePrefixContainsDelimiter(
                gene_prefix,
            )));
        }

        let min_support = self.min_support.unwrap_or(defaults.min_support);

        if min_support == 0 {
            return Err(Error::Invalid(InvalidError::ZeroMinSupport));
        }

        Ok(Config {
            tolerate_middle: self.tolerate_middle.unwrap_or(defaults.tolerate_middle),
            tolerate_end: self.tolerate_end.unwrap_or(defaults.tolerate_end),
            ok_to_miss_matches: self
                .ok_to_miss_matches
                .unwrap_or(defaults.ok_to_miss_matches),
            allow_extra_5exon: self
                .allow_extra_5exon
                .unwrap_or(defaults.allow_extra_5exon),
            skip_5_exon_alt: self.skip_5_exon_alt.unwrap_or(defaults.skip_5_exon_alt),
            max_fuzzy_junction: self
                .max_fuzzy_junction
                .unwrap_or(defaults.max_fuzzy_junction),
            min_support,
            gene_prefix,
            starting_isoform_index: self
                .starting_isoform_index
                .unwrap_or(defaults.starting_isoform_index),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_falls_back_to_defaults() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let config = Builder::default().try_build()?;
        assert_eq!(config, Config::default());
        assert_eq!(config.tolerate_end(), 100);
        assert_eq!(config.max_fuzzy_junction(), 5);
        assert!(config.allow_extra_5exon());
        assert!(config.skip_5_exon_alt());
        Ok(())
    }

    #[test]
    fn it_rejects_invalid_knobs() {
        let err = Builder::default().gene_prefix("").try_build().unwrap_err();
        assert_eq!(err, Error::Invalid(InvalidError::EmptyGenePrefix));

        let err = Builder::default().min_support(0).try_build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: minimum support must be at least 1"
        );

        let err = Builder::default().gene_prefix("PB.2").try_build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: gene prefix `PB.2` cannot contain `.`"
        );
    }
}
