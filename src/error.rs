use std::num::ParseFloatError;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegressionError {
    #[error("Not enough observations for a linear regression: at least {required} are needed, got {found}")]
    TooFewObservations { required: usize, found: usize },
    #[error("All {0} observations share the same x value; the fit is undefined")]
    ConstantX(usize),
    #[error("An empty sequence of numbers was passed")]
    EmptyFlatSequence,
    #[error("An odd number of numbers was passed ({0}); expected alternating x and y values")]
    OddFlatSequence(usize),

    #[error("Specified path does not exist: {0}")]
    SourceNotFound(PathBuf),
    #[error("The table has no header row")]
    MissingHeader,
    #[error("The table header has {0} column(s); at least 2 are needed")]
    TooFewColumns(usize),
    #[error("Both columns refer to the same index {0}")]
    SameColumn(usize),
    #[error("Column index {index} is out of range for a header of {columns} column(s)")]
    ColumnOutOfRange { index: usize, columns: usize },
    #[error("Column names must not be blank")]
    BlankColumnName,
    #[error("Both columns refer to the same name {0:?}")]
    SameColumnName(String),
    #[error("Column {0:?} not found in header")]
    ColumnNotFound(String),

    #[error("Line {line}: field {column:?} is missing")]
    MissingField { line: usize, column: String },
    #[error("Line {line}: field {column:?} is not a number: {value:?}")]
    ParseField {
        line: usize,
        column: String,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("{0}")]
    IOError(#[from] std::io::Error),

    #[error("Internal invariant violated: {0}")]
    Internal(&'static str),
}

/// Coarse classification of [`RegressionError`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    InvalidArgument,
    Parse,
    Io,
    Internal,
}

impl RegressionError {
    pub fn kind(&self) -> ErrorKind {
        use RegressionError::*;
        match self {
            TooFewObservations { .. }
            | ConstantX(_)
            | EmptyFlatSequence
            | OddFlatSequence(_)
            | SourceNotFound(_)
            | MissingHeader
            | TooFewColumns(_)
            | SameColumn(_)
            | ColumnOutOfRange { .. }
            | BlankColumnName
            | SameColumnName(_)
            | ColumnNotFound(_) => ErrorKind::InvalidArgument,
            MissingField { .. } | ParseField { .. } => ErrorKind::Parse,
            IOError(_) => ErrorKind::Io,
            Internal(_) => ErrorKind::Internal,
        }
    }
}
