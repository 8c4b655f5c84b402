//! Simple linear regression over `(x, y)` observations gathered from point
//! lists, flat number sequences and comma-separated tables.

pub mod config;
pub mod error;
pub mod linest;
pub mod observation;
pub mod regression;
pub mod table;

pub use config::RegressionConfig;
pub use error::ErrorKind;
pub use error::RegressionError;
pub use observation::Observation;
pub use regression::Regression;
pub use regression::RegressionBuilder;
pub use table::ColumnSelector;
pub use table::RowPolicy;
