//! A reader of spliced alignments in BED12 format.

use std::io::BufRead;
use std::io::{self};
use std::iter;

use crate::alignment;
use crate::alignment::Alignment;

/// The new line character.
const NEW_LINE: char = '\n';

/// The carriage return character.
const CARRIAGE_RETURN: char = '\r';

/// Line prefixes that carry no alignment.
const IGNORED_PREFIXES: &[&str] = &["#", "track", "browser"];

/// An error related to a [`Reader`].
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(io::Error),

    /// A line could not be parsed as an alignment.
    Parse(usize, alignment::ParseError),
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

/// A BED12 alignment reader.
#[derive(Clone, Debug)]
pub struct Reader<T>(T)
where
    T: BufRead;

impl<T> Reader<T>
where
    T: BufRead,
{
    /// Creates an alignment reader.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"chr1\t100\t400\tc1/f1p0/200\t0\t+\t100\t400\t0\t2\t100,100\t0,200";
    /// let reader = isocollapse::Reader::new(&data[..]);
    /// ```
    pub fn new(inner: T) -> Self {
        Self::from(inner)
    }

    /// Gets a reference to the inner reader.
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Gets a mutable reference to the inner reader.
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.0
    }

    /// Consumes self and returns the inner reader.
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Reads a raw, textual line from the underlying reader.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io;
    ///
    /// let data = b"track name=reads\nchr1\t100\t200\tr\t0\t+\t100\t200\t0\t1\t100\t0";
    /// let mut reader = isocollapse::Reader::new(&data[..]);
    ///
    /// let mut buffer = String::new();
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 17);
    /// assert_eq!(buffer, "track name=reads");
    ///
    /// # Ok::<(), io::Error>(())
    /// ```
    pub fn read_line_raw(&mut self, buffer: &mut String) -> io::Result<usize> {
        read_line(self.inner_mut(), buffer)
    }

    /// Returns an iterator over the [`Alignment`]s in the underlying reader.
    ///
    /// Blank lines, comments, and `track`/`browser` lines are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"# reads\nchr1\t100\t400\tc1/f1p0/200\t0\t+\t100\t400\t0\t2\t100,100\t0,200\n\n\
    ///              chr1\t100\t390\tc2/f1p0/190\t0\t+\t100\t390\t0\t2\t100,90\t0,200\n";
    /// let mut reader = isocollapse::Reader::new(&data[..]);
    ///
    /// let alignments = reader.alignments().collect::<Result<Vec<_>, _>>()?;
    /// assert_eq!(alignments.len(), 2);
    /// assert_eq!(alignments[1].end(), 390);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn alignments(&mut self) -> impl Iterator<Item = Result<Alignment, Error>> + '_ {
        let mut buffer = String::new();
        let mut line_no = 0usize;

        iter::from_fn(move || loop {
            match self.read_line_raw(&mut buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    line_no += 1;

                    let line = buffer.trim();
                    if line.is_empty()
                        || IGNORED_PREFIXES
                            .iter()
                            .any(|prefix| line.starts_with(prefix))
                    {
                        continue;
                    }

                    return Some(
                        line.parse::<Alignment>()
                            .map_err(|err| Error::Parse(line_no, err)),
                    );
                }
                Err(err) => return Some(Err(Error::Io(err))),
            }
        })
    }
}

impl<T> From<T> for Reader<T>
where
    T: BufRead,
{
    fn from(inner: T) -> Self {
        Self(inner)
    }
}

/// Reads a line into `buffer`, stripping a trailing `\n` or `\r\n`.
///
/// Returns the number of bytes read, including the line ending.
fn read_line<T>(reader: &mut T, buffer: &mut String) -> io::Result<usize>
where
    T: BufRead,
{
    buffer.clear();

    match reader.read_line(buffer) {
        Ok(0) => Ok(0),
        Ok(n) => {
            if buffer.ends_with(NEW_LINE) {
                buffer.pop();

                if buffer.ends_with(CARRIAGE_RETURN) {
                    buffer.pop();
                }
            }

            Ok(n)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn it_strips_line_endings() {
        let data = b"chr1\t100\r\nchr2\t200";
        let mut cursor = io::Cursor::new(data);

        let mut buffer = String::new();
        let len = read_line(&mut cursor, &mut buffer).unwrap();
        assert_eq!(buffer, "chr1\t100");
        assert_eq!(len, 10);

        let len = read_line(&mut cursor, &mut buffer).unwrap();
        assert_eq!(buffer, "chr2\t200");
        assert_eq!(len, 8);
    }

    #[test]
    fn it_reports_the_line_number_of_a_bad_record() {
        let data = b"browser position chr1\nchr1\t100\t200\tr\t0\t+\t100\t200\t0\t1\t100\t0\nchr1\t1\n";
        let mut reader = Reader::new(&data[..]);

        let results = reader.alignments().collect::<Vec<_>>();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());

        let err = results[1].as_ref().unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse error at line 3: invalid number of fields in BED12 line: expected 12 \
             fields, found 2 fields"
        );
    }
}
