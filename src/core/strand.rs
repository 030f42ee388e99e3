//! Strands.

use std::str::FromStr;

/// An error related to parsing a [`Strand`].
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The field was empty.
    Empty,

    /// The field held something other than `+` or `-`.
    Invalid(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty strand"),
            ParseError::Invalid(value) => write!(f, "expected `+` or `-`, found `{value}`"),
        }
    }
}

impl std::error::Error for ParseError {}

/// The strand of a spliced alignment or transcript model.
///
/// `Positive` sorts before `Negative`, so loci and models on the same contig
/// and start are numbered forward strand first.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Strand {
    /// `+`
    Positive,

    /// `-`
    Negative,
}

impl Strand {
    /// Whether transcription runs toward lower coordinates.
    ///
    /// ```
    /// use isocollapse::core::Strand;
    ///
    /// assert!(Strand::Negative.is_reverse());
    /// assert!(!Strand::Positive.is_reverse());
    /// ```
    pub fn is_reverse(&self) -> bool {
        matches!(self, Strand::Negative)
    }
}

impl FromStr for Strand {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(ParseError::Empty),
            "+" => Ok(Strand::Positive),
            "-" => Ok(Strand::Negative),
            other => Err(ParseError::Invalid(other.to_string())),
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Strand::Positive => "+",
            Strand::Negative => "-",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_and_prints_both_strands() -> Result<(), Box<dyn std::error::Error>> {
        for text in ["+", "-"] {
            assert_eq!(text.parse::<Strand>()?.to_string(), text);
        }

        Ok(())
    }

    #[test]
    fn it_rejects_unknown_strands() {
        assert_eq!("".parse::<Strand>(), Err(ParseError::Empty));

        let err = ".".parse::<Strand>().unwrap_err();
        assert_eq!(err, ParseError::Invalid(String::from(".")));
        assert_eq!(err.to_string(), "expected `+` or `-`, found `.`");
    }

    #[test]
    fn it_orders_the_forward_strand_first() {
        assert!(Strand::Positive < Strand::Negative);
        assert!(Strand::Negative.is_reverse());
    }
}
