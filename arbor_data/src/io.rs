//! Reading and writing the whitespace-delimited dataset text format
//!
//! ```text
//! dataset: 1.0
//! category_counts: 0 3 2
//! features: height color sex
//! 1.73 2 0
//! 1.62 0 1
//! ```
//!
//! Only `category_counts:` is required when reading. The `dataset:` and
//! `features:` headers are optional, and the version in `dataset:` is not
//! checked. Writing always emits `dataset:`, followed by `features:` when the
//! schema has names. Values are written in the shortest decimal form that
//! parses back to the identical `f64`.
use std::fmt;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use crate::{DataMatrix, FormatError, Schema};

/// The version written to the `dataset:` header
pub const DATASET_VERSION: &str = "1.0";

const DATASET_HEADER: &str = "dataset:";
const CATEGORY_COUNTS_HEADER: &str = "category_counts:";
const FEATURES_HEADER: &str = "features:";

#[derive(Default)]
struct DatasetParser {
    version: Option<String>,
    category_counts: Option<Vec<usize>>,
    features: Option<Vec<String>>,
    rows: Vec<Vec<f64>>,
}

fn duplicate(header: &str, line_ix: usize) -> FormatError {
    FormatError::DuplicateHeader {
        header: header.trim_end_matches(':').to_owned(),
        line_ix,
    }
}

impl DatasetParser {
    fn parse_line(&mut self, line_ix: usize, line: &str) -> Result<(), FormatError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        if let Some(rest) = line.strip_prefix(DATASET_HEADER) {
            if self.version.is_some() {
                return Err(duplicate(DATASET_HEADER, line_ix));
            }
            self.version = Some(rest.trim().to_owned());
        } else if let Some(rest) = line.strip_prefix(CATEGORY_COUNTS_HEADER) {
            if self.category_counts.is_some() {
                return Err(duplicate(CATEGORY_COUNTS_HEADER, line_ix));
            }
            let counts = rest
                .split_whitespace()
                .map(|token| {
                    token.parse::<usize>().map_err(|_| {
                        FormatError::InvalidHeader {
                            line_ix,
                            token: token.to_owned(),
                        }
                    })
                })
                .collect::<Result<Vec<usize>, _>>()?;
            self.category_counts = Some(counts);
        } else if let Some(rest) = line.strip_prefix(FEATURES_HEADER) {
            if self.features.is_some() {
                return Err(duplicate(FEATURES_HEADER, line_ix));
            }
            self.features =
                Some(rest.split_whitespace().map(String::from).collect());
        } else {
            let row_ix = self.rows.len();
            let row = line
                .split_whitespace()
                .enumerate()
                .map(|(col_ix, token)| {
                    token.parse::<f64>().map_err(|_| FormatError::NonNumeric {
                        row_ix,
                        col_ix,
                        token: token.to_owned(),
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;
            self.rows.push(row);
        }
        Ok(())
    }

    fn finish(self) -> Result<DataMatrix, FormatError> {
        let counts = self
            .category_counts
            .ok_or(FormatError::MissingCategoryCounts)?;
        let schema = Schema::from_category_counts(&counts)?;
        let schema = match self.features {
            Some(names) => schema.with_names(names)?,
            None => schema,
        };
        DataMatrix::new(schema, self.rows)
    }
}

impl DataMatrix {
    /// Parse a dataset from a reader
    pub fn read<R: BufRead>(reader: R) -> Result<Self, FormatError> {
        let mut parser = DatasetParser::default();
        for (line_ix, line) in reader.lines().enumerate() {
            parser.parse_line(line_ix, &line?)?;
        }
        parser.finish()
    }

    /// Load a dataset from a text file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FormatError> {
        let file = fs::File::open(path)?;
        Self::read(io::BufReader::new(file))
    }

    /// Write the dataset in the text format
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write!(writer, "{self}")
    }

    /// Save the dataset to a text file, overwriting any existing file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut writer = io::BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush()
    }
}

impl FromStr for DataMatrix {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = DatasetParser::default();
        for (line_ix, line) in s.lines().enumerate() {
            parser.parse_line(line_ix, line)?;
        }
        parser.finish()
    }
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    xs: impl Iterator<Item = T>,
) -> fmt::Result {
    for (ix, x) in xs.enumerate() {
        if ix > 0 {
            write!(f, " ")?;
        }
        write!(f, "{x}")?;
    }
    writeln!(f)
}

// f64's Display is the shortest representation that parses back to the same
// value, so no precision is lost on a round trip.
impl fmt::Display for DataMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{DATASET_HEADER} {DATASET_VERSION}")?;
        write!(f, "{CATEGORY_COUNTS_HEADER} ")?;
        write_joined(f, self.schema().category_counts().iter())?;
        if let Some(names) = self.schema().names() {
            write!(f, "{FEATURES_HEADER} ")?;
            write_joined(f, names.iter())?;
        }
        for row in self.rows() {
            write_joined(f, row.iter())?;
        }
        Ok(())
    }
}
