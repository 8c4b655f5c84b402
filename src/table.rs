//! Comma-separated table ingestion.
//!
//! The first line is a header, every following line holds one observation.
//! Fields are split on plain commas; there is no quoting or escaping.
//! A trailing `\r` is dropped from every line and completely empty lines are
//! ignored. Selected fields are trimmed before they are parsed as `f64`.

use std::io::BufRead;
use std::io::BufReader;
use std::io::ErrorKind;
use std::path::Path;

use derive_getters::Getters;
use fs_err::File;
use itertools::Itertools;
use log::debug;
use log::trace;
use log::warn;
use serde::Deserialize;

use crate::error::RegressionError;
use crate::observation::Observation;

pub const DELIMITER: char = ',';

/// Which two columns of a table hold x and y.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ColumnSelector {
    /// Zero-based column indices.
    ByIndex(usize, usize),
    /// Exact, case-sensitive header names.
    ByName(String, String),
}

impl Default for ColumnSelector {
    fn default() -> Self {
        ColumnSelector::ByIndex(0, 1)
    }
}

impl ColumnSelector {
    pub fn by_name(x: impl Into<String>, y: impl Into<String>) -> Self {
        ColumnSelector::ByName(x.into(), y.into())
    }

    /// Checks everything that can be checked without the header.
    fn precheck(&self) -> Result<(), RegressionError> {
        match self {
            ColumnSelector::ByIndex(x, y) if x == y => Err(RegressionError::SameColumn(*x)),
            ColumnSelector::ByIndex(..) => Ok(()),
            ColumnSelector::ByName(x, y) => {
                if x.trim().is_empty() || y.trim().is_empty() {
                    Err(RegressionError::BlankColumnName)
                } else if x == y {
                    Err(RegressionError::SameColumnName(x.clone()))
                } else {
                    Ok(())
                }
            }
        }
    }

    fn resolve(&self, header: &[String]) -> Result<(usize, usize), RegressionError> {
        let (x, y) = match self {
            ColumnSelector::ByIndex(x, y) => {
                for &index in &[*x, *y] {
                    if index >= header.len() {
                        return Err(RegressionError::ColumnOutOfRange {
                            index,
                            columns: header.len(),
                        });
                    }
                }
                (*x, *y)
            }
            ColumnSelector::ByName(x, y) => {
                let find = |name: &String| {
                    header
                        .iter()
                        .position(|h| h == name)
                        .ok_or_else(|| RegressionError::ColumnNotFound(name.clone()))
                };
                (find(x)?, find(y)?)
            }
        };
        if x == y {
            return Err(match self {
                ColumnSelector::ByIndex(..) => RegressionError::SameColumn(x),
                ColumnSelector::ByName(..) => {
                    RegressionError::Internal("distinct column names resolved to the same index")
                }
            });
        }
        Ok((x, y))
    }
}

/// What to do with a data row whose selected fields are missing or not numeric.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowPolicy {
    /// Fail the whole ingestion.
    Strict,
    /// Log a warning and skip the row.
    SkipMalformed,
}

impl Default for RowPolicy {
    fn default() -> Self {
        RowPolicy::Strict
    }
}

/// The outcome of reading one table.
#[derive(Clone, Debug, Getters)]
pub struct Table {
    column_names: Vec<String>,
    x_index: usize,
    y_index: usize,
    observations: Vec<Observation>,
}

impl Table {
    pub fn x_name(&self) -> &str {
        &self.column_names[self.x_index]
    }

    pub fn y_name(&self) -> &str {
        &self.column_names[self.y_index]
    }

    pub fn into_parts(self) -> (Vec<String>, usize, usize, Vec<Observation>) {
        (
            self.column_names,
            self.x_index,
            self.y_index,
            self.observations,
        )
    }
}

pub fn read_table_file(
    path: impl AsRef<Path>,
    selector: &ColumnSelector,
    policy: RowPolicy,
) -> Result<Table, RegressionError> {
    let path = path.as_ref();
    selector.precheck()?;
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => RegressionError::SourceNotFound(path.to_owned()),
        _ => RegressionError::from(e),
    })?;
    let table = read_checked(BufReader::new(file), selector, policy)?;
    debug!(
        "read {} observations from {}",
        table.observations.len(),
        path.display()
    );
    Ok(table)
}

pub fn read_table<R: BufRead>(
    reader: R,
    selector: &ColumnSelector,
    policy: RowPolicy,
) -> Result<Table, RegressionError> {
    selector.precheck()?;
    read_checked(reader, selector, policy)
}

/// [`read_table`] for a selector that already passed `precheck`.
fn read_checked<R: BufRead>(
    reader: R,
    selector: &ColumnSelector,
    policy: RowPolicy,
) -> Result<Table, RegressionError> {
    let mut lines = reader
        .lines()
        .enumerate()
        .map(|(i, line)| line.map(|l| (i + 1, strip_cr(l))));

    let header = match lines.next() {
        Some(line) => line?.1,
        None => return Err(RegressionError::MissingHeader),
    };
    let column_names = header.split(DELIMITER).map(str::to_owned).collect_vec();
    if column_names.len() < 2 {
        return Err(RegressionError::TooFewColumns(column_names.len()));
    }
    let (x_index, y_index) = selector.resolve(&column_names)?;

    let mut observations = Vec::new();
    for line in lines {
        let (line_no, line) = line?;
        if line.is_empty() {
            continue;
        }
        match parse_row(&line, line_no, &column_names, x_index, y_index) {
            Ok(o) => {
                trace!("line {}: {}", line_no, o);
                observations.push(o);
            }
            Err(e) if policy == RowPolicy::SkipMalformed => {
                warn!("skipping malformed row: {}", e);
            }
            Err(e) => return Err(e),
        }
    }
    debug!(
        "table with columns {:?}: x = {:?}, y = {:?}, {} rows",
        column_names,
        column_names[x_index],
        column_names[y_index],
        observations.len()
    );

    Ok(Table {
        column_names,
        x_index,
        y_index,
        observations,
    })
}

fn strip_cr(mut line: String) -> String {
    if line.ends_with('\r') {
        line.pop();
    }
    line
}

fn parse_row(
    line: &str,
    line_no: usize,
    column_names: &[String],
    x_index: usize,
    y_index: usize,
) -> Result<Observation, RegressionError> {
    let fields = line.split(DELIMITER).collect_vec();
    let parse = |index: usize| {
        let column = &column_names[index];
        let value = fields
            .get(index)
            .ok_or_else(|| RegressionError::MissingField {
                line: line_no,
                column: column.clone(),
            })?;
        value
            .trim()
            .parse::<f64>()
            .map_err(|source| RegressionError::ParseField {
                line: line_no,
                column: column.clone(),
                value: (*value).to_owned(),
                source,
            })
    };
    Ok(Observation::new(parse(x_index)?, parse(y_index)?))
}
