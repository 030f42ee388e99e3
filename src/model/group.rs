//! Support groups: the reads behind each transcript model.
//!
//! Groups are written one per line as the transcript id and a `,`-delimited
//! list of read identifiers, separated by a tab:
//!
//! ```text
//! PB.1.1	c1/f1p0/200,c2/f1p0/190
//! ```

use std::io;
use std::io::BufRead;
use std::str::FromStr;

use nonempty::NonEmpty;

use crate::read_id;

/// The delimiter between the transcript id and the members.
const DELIMITER: char = '\t';

/// The delimiter between members.
const MEMBER_DELIMITER: char = ',';

/// An error associated with parsing a support group line.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The line did not contain a transcript id and members.
    MissingMembers(String),

    /// A member was empty.
    EmptyMember(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingMembers(line) => {
                write!(f, "support group line has no members: {line}")
            }
            ParseError::EmptyMember(id) => write!(f, "support group {id} has an empty member"),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to reading support groups.
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(io::Error),

    /// A line could not be parsed.
    Parse(usize, ParseError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::Parse(line_no, err) => write!(f, "parse error at line {line_no}: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// The read identifiers that were collapsed into one transcript model.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SupportGroup {
    /// The transcript id.
    transcript_id: String,

    /// The read identifiers.
    members: NonEmpty<String>,
}

impl SupportGroup {
    /// Creates a new [`SupportGroup`].
    pub fn new(transcript_id: impl Into<String>, members: NonEmpty<String>) -> Self {
        Self {
            transcript_id: transcript_id.into(),
            members,
        }
    }

    /// Gets the transcript id.
    pub fn transcript_id(&self) -> &str {
        &self.transcript_id
    }

    /// Gets the read identifiers.
    pub fn members(&self) -> &NonEmpty<String> {
        &self.members
    }

    /// Gets the number of read identifiers.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always returns `false`, as a group has at least one member.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Sums the full-length read counts embedded in the members.
    ///
    /// # Examples
    ///
    /// ```
    /// use isocollapse::model::SupportGroup;
    ///
    /// let group = "PB.1.1\tm/1/0_100|c1/f1p0/100,m/2/0_50|c2/f1p0/50".parse::<SupportGroup>()?;
    /// assert_eq!(group.full_length_count()?, 2);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn full_length_count(&self) -> Result<usize, read_id::Error> {
        read_id::sum_full_length(self.members.iter())
    }
}

impl FromStr for SupportGroup {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (transcript_id, members) = s
            .split_once(DELIMITER)
            .ok_or_else(|| ParseError::MissingMembers(s.to_string()))?;

        let members = members
            .trim()
            .split(MEMBER_DELIMITER)
            .map(|member| match member.is_empty() {
                true => Err(ParseError::EmptyMember(transcript_id.to_string())),
                false => Ok(member.to_string()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let members = NonEmpty::from_vec(members)
            .ok_or_else(|| ParseError::MissingMembers(s.to_string()))?;

        Ok(Self::new(transcript_id, members))
    }
}

impl std::fmt::Display for SupportGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.transcript_id, DELIMITER)?;

        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, "{MEMBER_DELIMITER}")?;
            }

            write!(f, "{member}")?;
        }

        Ok(())
    }
}

/// Reads support groups, one per line. Blank lines are skipped.
pub fn read_groups<R: BufRead>(reader: R) -> Result<Vec<SupportGroup>, Error> {
    let mut groups = Vec::new();

    for (i, result) in reader.lines().enumerate() {
        let line = result.map_err(Error::Io)?;
        let line = line.trim_end();

        if line.is_empty() {
            continue;
        }

        groups.push(line.parse().map_err(|err| Error::Parse(i + 1, err))?);
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_and_displays_a_group() -> Result<(), Box<dyn std::error::Error>> {
        let group = "PB.3.2\tc1/f2p0/100,c2/f1p3/50".parse::<SupportGroup>()?;
        assert_eq!(group.transcript_id(), "PB.3.2");
        assert_eq!(group.len(), 2);
        assert_eq!(group.full_length_count()?, 3);
        assert_eq!(group.to_string(), "PB.3.2\tc1/f2p0/100,c2/f1p3/50");
        Ok(())
    }

    #[test]
    fn it_fails_on_malformed_lines() {
        let err = "PB.3.2".parse::<SupportGroup>().unwrap_err();
        assert_eq!(err, ParseError::MissingMembers(String::from("PB.3.2")));

        let err = "PB.3.2\tc1/f1p0/1,,c2/f1p0/1"
            .parse::<SupportGroup>()
            .unwrap_err();
        assert_eq!(err, ParseError::EmptyMember(String::from("PB.3.2")));
    }

    #[test]
    fn it_reads_groups_from_lines() -> Result<(), Box<dyn std::error::Error>> {
        let data = "PB.1.1\ta/f1p0/1\n\nPB.1.2\tb/f1p0/1,c/f1p0/1\n";
        let groups = read_groups(data.as_bytes())?;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].members().len(), 2);

        let err = read_groups("PB.1.1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse(1, _)));

        Ok(())
    }
}
