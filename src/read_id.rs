//! Read counts embedded within read identifiers.
//!
//! Every read identifier that reaches a support group is expected to carry a
//! `/`-delimited field of the form `f<N>p<M>`, where `N` is the number of
//! full-length reads and `M` the number of non-full-length reads the
//! identifier stands for (e.g., `i0_HQ_sample|c139597/f1p0/178`).
//!
//! Downstream abundance filtering relies on these counts, so a missing or
//! malformed field is always an error and never treated as zero.

use std::num::ParseIntError;
use std::sync::LazyLock;

use regex::Regex;

/// The delimiter between fields of a read identifier.
const FIELD_DELIMITER: char = '/';

/// Matches the count field of a read identifier.
static COUNT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^f([0-9]+)p([0-9]+)$").unwrap());

/// An error related to parsing the counts from a read identifier.
#[derive(Debug)]
pub enum Error {
    /// No `f<N>p<M>` field was present in the read identifier.
    MissingCountField(String),

    /// The count field was present but a count could not be parsed.
    InvalidCount(String, ParseIntError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingCountField(id) => write!(
                f,
                "could not find a full-length count field (`f<N>p<M>`) in read id `{id}`"
            ),
            Error::InvalidCount(id, err) => {
                write!(f, "invalid read count in read id `{id}`: {err}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// The read counts a single read identifier represents.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Counts {
    /// The number of full-length reads.
    full_length: usize,

    /// The number of non-full-length reads.
    non_full_length: usize,
}

impl Counts {
    /// Attempts to parse the counts embedded in a read identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::read_id::Counts;
    ///
    /// let counts = Counts::try_from_id("i0_HQ_sample|c139597/f3p2/178")?;
    /// assert_eq!(counts.full_length(), 3);
    /// assert_eq!(counts.non_full_length(), 2);
    ///
    /// assert!(Counts::try_from_id("m/1/0_100").is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_from_id(id: &str) -> Result<Self> {
        let captures = id
            .split(FIELD_DELIMITER)
            .find_map(|field| COUNT_FIELD.captures(field))
            .ok_or_else(|| Error::MissingCountField(id.to_string()))?;

        let parse = |i: usize| -> Result<usize> {
            captures[i]
                .parse()
                .map_err(|err| Error::InvalidCount(id.to_string(), err))
        };

        Ok(Self {
            full_length: parse(1)?,
            non_full_length: parse(2)?,
        })
    }

    /// Gets the number of full-length reads.
    pub fn full_length(&self) -> usize {
        self.full_length
    }

    /// Gets the number of non-full-length reads.
    pub fn non_full_length(&self) -> usize {
        self.non_full_length
    }
}

/// Gets the number of full-length reads a single read identifier represents.
pub fn full_length_count(id: &str) -> Result<usize> {
    Counts::try_from_id(id).map(|counts| counts.full_length())
}

/// Sums the full-length read counts over a set of read identifiers.
///
/// # Examples
///
/// ```
/// use isocollapse::read_id::sum_full_length;
///
/// let members = ["c1/f1p0/100", "c2/f1p0/50"];
/// assert_eq!(sum_full_length(members)?, 2);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn sum_full_length<I, S>(ids: I) -> Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter()
        .map(|id| full_length_count(id.as_ref()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_sums_full_length_counts_across_members() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let members = vec![
            String::from("m/1/0_100|c1/f1p0/100"),
            String::from("m/2/0_50|c2/f1p0/50"),
        ];

        assert_eq!(sum_full_length(&members)?, 2);
        Ok(())
    }

    #[test]
    fn it_parses_multi_digit_counts() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let counts = Counts::try_from_id("13cycle_1Mag1Diff|i0HQ_SIRV_1d1m|c139597/f12p105/178")?;
        assert_eq!(counts.full_length(), 12);
        assert_eq!(counts.non_full_length(), 105);
        Ok(())
    }

    #[test]
    fn it_fails_when_the_count_field_is_missing() {
        let err = full_length_count("m/1/0_100").unwrap_err();
        assert_eq!(
            err.to_string(),
            "could not find a full-length count field (`f<N>p<M>`) in read id `m/1/0_100`"
        );

        let err = sum_full_length(["c1/f1p0/100", "c2/fxp0/50"]).unwrap_err();
        assert!(matches!(err, Error::MissingCountField(id) if id == "c2/fxp0/50"));
    }

    #[test]
    fn it_fails_when_a_count_overflows() {
        let err = full_length_count("c1/f99999999999999999999999p0/10").unwrap_err();
        assert!(matches!(err, Error::InvalidCount(_, _)));
    }
}
