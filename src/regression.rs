use std::fmt;
use std::io::BufRead;
use std::path::Path;

use derive_getters::Getters;
use itertools::Itertools;
use log::debug;
use serde::Serialize;

use crate::config::LEAST_OBSERVATIONS;
use crate::config::RegressionConfig;
use crate::error::RegressionError;
use crate::linest::Linest;
use crate::observation::Observation;
use crate::table::read_table;
use crate::table::read_table_file;
use crate::table::ColumnSelector;
use crate::table::Table;

/// A fitted line `y = slope * x + intercept`, together with the data it was
/// fitted on.
///
/// Only [`RegressionBuilder::build`] creates one, and nothing mutates it
/// afterwards.
#[derive(Clone, Debug, Getters, Serialize)]
pub struct Regression {
    #[getter(skip)]
    slope: f64,
    #[getter(skip)]
    intercept: f64,
    #[getter(skip)]
    correlation: f64,
    observations: Vec<Observation>,
    xs: Vec<f64>,
    ys: Vec<f64>,
    x_name: String,
    y_name: String,
    /// Header of the last table ingested; empty if no table was used.
    column_names: Vec<String>,
}

impl Regression {
    pub fn builder() -> RegressionBuilder {
        RegressionBuilder::default()
    }

    pub fn of_observations(
        observations: impl IntoIterator<Item = Observation>,
    ) -> Result<Self, RegressionError> {
        Self::builder().add_many(observations).build()
    }

    /// `values` alternates x and y.
    pub fn of_flat(values: &[f64]) -> Result<Self, RegressionError> {
        Self::builder().add_flat(values)?.build()
    }

    pub fn of_table_file(
        path: impl AsRef<Path>,
        selector: &ColumnSelector,
    ) -> Result<Self, RegressionError> {
        Self::builder().add_table_file(path, selector)?.build()
    }

    pub fn of_table_reader(
        reader: impl BufRead,
        selector: &ColumnSelector,
    ) -> Result<Self, RegressionError> {
        Self::builder().add_table_reader(reader, selector)?.build()
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Pearson's r.
    pub fn correlation(&self) -> f64 {
        self.correlation
    }

    pub fn r_squared(&self) -> f64 {
        self.correlation * self.correlation
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl fmt::Display for Regression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Regression [k = {}, d = {}, r = {}]",
            self.slope, self.intercept, self.correlation
        )
    }
}

/// Collects observations from any mix of sources. [`build`](Self::build)
/// consumes the builder and runs the fit.
///
/// ```
/// use regression::Observation;
/// use regression::Regression;
///
/// let regression = Regression::builder()
///     .add(Observation::new(0.0, 1.0))
///     .add_xy(1.0, 3.0)
///     .add_flat(&[2.0, 5.0, 3.0, 7.0])?
///     .build()?;
/// assert!((regression.slope() - 2.0).abs() < 1e-12);
/// assert!((regression.intercept() - 1.0).abs() < 1e-12);
/// # Ok::<(), regression::RegressionError>(())
/// ```
#[derive(Clone, Debug)]
pub struct RegressionBuilder {
    observations: Vec<Observation>,
    x_name: String,
    y_name: String,
    column_names: Vec<String>,
    config: RegressionConfig,
}

impl Default for RegressionBuilder {
    fn default() -> Self {
        RegressionBuilder {
            observations: Vec::new(),
            x_name: "x".to_owned(),
            y_name: "y".to_owned(),
            column_names: Vec::new(),
            config: RegressionConfig::default(),
        }
    }
}

impl RegressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration. The row policy only affects tables ingested
    /// after this call.
    pub fn config(mut self, config: RegressionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn add(mut self, observation: Observation) -> Self {
        self.observations.push(observation);
        self
    }

    pub fn add_xy(self, x: f64, y: f64) -> Self {
        self.add(Observation::new(x, y))
    }

    pub fn add_many(mut self, observations: impl IntoIterator<Item = Observation>) -> Self {
        self.observations.extend(observations);
        self
    }

    /// Adds `values` read as `x0, y0, x1, y1, ...`.
    pub fn add_flat(mut self, values: &[f64]) -> Result<Self, RegressionError> {
        if values.is_empty() {
            return Err(RegressionError::EmptyFlatSequence);
        }
        if values.len() % 2 != 0 {
            return Err(RegressionError::OddFlatSequence(values.len()));
        }
        self.observations.extend(
            values
                .iter()
                .copied()
                .tuples()
                .map(|(x, y)| Observation::new(x, y)),
        );
        Ok(self)
    }

    pub fn add_table_file(
        self,
        path: impl AsRef<Path>,
        selector: &ColumnSelector,
    ) -> Result<Self, RegressionError> {
        let table = read_table_file(path, selector, self.config.row_policy)?;
        Ok(self.add_table(table))
    }

    pub fn add_table_reader(
        self,
        reader: impl BufRead,
        selector: &ColumnSelector,
    ) -> Result<Self, RegressionError> {
        let table = read_table(reader, selector, self.config.row_policy)?;
        Ok(self.add_table(table))
    }

    fn add_table(mut self, table: Table) -> Self {
        let (column_names, x_index, y_index, observations) = table.into_parts();
        self.x_name = column_names[x_index].clone();
        self.y_name = column_names[y_index].clone();
        self.column_names = column_names;
        self.observations.extend(observations);
        self
    }

    /// Validates the collected observations and fits the line.
    pub fn build(self) -> Result<Regression, RegressionError> {
        let RegressionBuilder {
            observations,
            x_name,
            y_name,
            column_names,
            config,
        } = self;

        let required = config.min_observations.max(LEAST_OBSERVATIONS);
        if observations.len() < required {
            return Err(RegressionError::TooFewObservations {
                required,
                found: observations.len(),
            });
        }
        if config.reject_constant_x && observations.iter().map(Observation::x).all_equal() {
            return Err(RegressionError::ConstantX(observations.len()));
        }

        let linest = Linest::from_observations(&observations);
        let res = linest.estimate();
        debug!(
            "fitted {} observations ({} vs {}): {:?}",
            observations.len(),
            y_name,
            x_name,
            res
        );

        let (xs, ys) = observations.iter().map(|o| (o.x(), o.y())).unzip();
        Ok(Regression {
            slope: res.slope,
            intercept: res.intercept,
            correlation: res.correlation,
            observations,
            xs,
            ys,
            x_name,
            y_name,
            column_names,
        })
    }
}

#[cfg(test)]
mod test {
    use itertools::Itertools;

    use super::Regression;
    use super::RegressionBuilder;
    use crate::config::RegressionConfig;
    use crate::error::ErrorKind;
    use crate::error::RegressionError;
    use crate::observation::Observation;
    use crate::table::ColumnSelector;
    use crate::table::RowPolicy;

    fn assert_close(got: f64, expected: f64) {
        let tol = 1e-9 * expected.abs().max(1.0);
        assert!(
            (got - expected).abs() <= tol,
            "got {}, expected {}",
            got,
            expected
        );
    }

    #[test]
    fn test_recovers_line() {
        for &(k0, d0) in &[(2.0, 1.0), (-0.5, 10.0), (1e3, -4.0), (0.0, 3.0)] {
            let reg = Regression::of_observations(
                (0..6).map(|i| i as f64 * 0.7 - 1.0).map(|x| Observation::new(x, k0 * x + d0)),
            )
            .unwrap();
            assert_close(reg.slope(), k0);
            assert_close(reg.intercept(), d0);
            assert_close(reg.predict(2.0), k0 * 2.0 + d0);
        }
    }

    #[test]
    fn test_intercept_passes_through_means() {
        let reg = Regression::of_flat(&[0.3, 9.1, 1.7, 4.4, 2.2, 8.0, 5.9, 1.3, 4.0, 4.0]).unwrap();
        let mean_x = reg.xs().iter().sum::<f64>() / reg.len() as f64;
        let mean_y = reg.ys().iter().sum::<f64>() / reg.len() as f64;
        assert_close(reg.intercept(), mean_y - reg.slope() * mean_x);
        assert!(reg.correlation() < 0.0 && reg.correlation() >= -1.0);
        assert_close(reg.r_squared(), reg.correlation() * reg.correlation());
    }

    #[test]
    fn test_mixed_sources_keep_order() {
        let reg = Regression::builder()
            .add(Observation::new(5.0, 5.0))
            .add_xy(1.0, 2.0)
            .add_many(vec![Observation::new(3.0, 3.0), Observation::new(0.0, 1.0)])
            .add_flat(&[9.0, 8.0])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            reg.observations().iter().map(|o| (o.x(), o.y())).collect_vec(),
            vec![(5.0, 5.0), (1.0, 2.0), (3.0, 3.0), (0.0, 1.0), (9.0, 8.0)]
        );
        assert_eq!(reg.xs(), &vec![5.0, 1.0, 3.0, 0.0, 9.0]);
        assert_eq!(reg.ys(), &vec![5.0, 2.0, 3.0, 1.0, 8.0]);
        assert_eq!((reg.x_name().as_str(), reg.y_name().as_str()), ("x", "y"));
        assert!(reg.column_names().is_empty());
        assert_eq!(reg.len(), 5);
    }

    #[test]
    fn test_flat_length_errors() {
        let err = Regression::builder().add_flat(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, RegressionError::OddFlatSequence(3)));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = Regression::builder().add_flat(&[]).unwrap_err();
        assert!(matches!(err, RegressionError::EmptyFlatSequence));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_minimum_count() {
        let err = Regression::of_flat(&[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert!(matches!(
            err,
            RegressionError::TooFewObservations {
                required: 3,
                found: 2
            }
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let reg = Regression::builder()
            .config(RegressionConfig::permissive())
            .add_flat(&[1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .build()
            .unwrap();
        assert_close(reg.slope(), 1.0);
        assert_close(reg.intercept(), 1.0);

        let err = Regression::builder()
            .config(RegressionConfig::permissive())
            .add_xy(1.0, 1.0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            RegressionError::TooFewObservations { required: 2, .. }
        ));
    }

    #[test]
    fn test_minimum_never_below_two() {
        let config = RegressionConfig {
            min_observations: 0,
            ..RegressionConfig::permissive()
        };
        let err = RegressionBuilder::new()
            .config(config.clone())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            RegressionError::TooFewObservations {
                required: 2,
                found: 0
            }
        ));

        let builder = RegressionBuilder::new().config(config).add_xy(1.0, 2.0);
        assert_eq!(builder.observations(), &[Observation::new(1.0, 2.0)]);
        let err = builder.build().unwrap_err();
        assert!(matches!(
            err,
            RegressionError::TooFewObservations {
                required: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_constant_y() {
        let reg = Regression::of_flat(&[1.0, 4.0, 2.0, 4.0, 3.0, 4.0]).unwrap();
        assert_eq!(reg.slope(), 0.0);
        assert_eq!(reg.correlation(), 0.0);
        assert_eq!(reg.intercept(), 4.0);
    }

    #[test]
    fn test_constant_x() {
        let flat = [2.0, 1.0, 2.0, 5.0, 2.0, 9.0];
        let err = Regression::of_flat(&flat).unwrap_err();
        assert!(matches!(err, RegressionError::ConstantX(3)));

        // Checked after the count.
        let err = Regression::of_flat(&flat[..4]).unwrap_err();
        assert!(matches!(err, RegressionError::TooFewObservations { .. }));

        let reg = Regression::builder()
            .config(RegressionConfig::permissive())
            .add_flat(&flat)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(reg.slope(), 0.0);
        assert_eq!(reg.correlation(), 0.0);
        assert_eq!(reg.intercept(), 0.0);
        assert!(reg.slope().is_finite() && reg.intercept().is_finite());
    }

    #[test]
    fn test_table_columns_recorded() {
        let input = "a,b,c\n1,2,3\n4,5,6\n7,8,10\n";
        let reg = Regression::builder()
            .add_xy(10.0, 13.0)
            .add_table_reader(input.as_bytes(), &ColumnSelector::by_name("a", "c"))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(reg.column_names(), &vec!["a", "b", "c"]);
        assert_eq!(reg.x_name(), "a");
        assert_eq!(reg.y_name(), "c");
        assert_eq!(reg.observations()[0], Observation::new(10.0, 13.0));
        assert_eq!(reg.observations()[1], Observation::new(1.0, 3.0));
        assert_eq!(reg.len(), 4);
    }

    #[test]
    fn test_row_policy_from_config() {
        let input = "a,b\n1,2\nnope,3\n2,4\n3,6\n";
        let err = Regression::of_table_reader(input.as_bytes(), &Default::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let config = RegressionConfig {
            row_policy: RowPolicy::SkipMalformed,
            ..RegressionConfig::strict()
        };
        let reg = Regression::builder()
            .config(config)
            .add_table_reader(input.as_bytes(), &Default::default())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(reg.len(), 3);
        assert_close(reg.slope(), 2.0);
    }

    #[test]
    fn test_builder_snapshot_is_independent() {
        let builder = Regression::builder().add_flat(&[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]).unwrap();
        let first = builder.clone().build().unwrap();
        let second = builder.add_xy(4.0, 0.0).build().unwrap();
        assert_eq!(first.len(), 3);
        assert_close(first.slope(), 1.0);
        assert_eq!(second.len(), 4);
        assert!(second.slope() < 1.0);
    }

    #[test]
    fn test_display_and_serialize() {
        let reg = Regression::of_flat(&[0.0, 1.0, 1.0, 3.0, 2.0, 5.0]).unwrap();
        assert_eq!(reg.to_string(), "Regression [k = 2, d = 1, r = 1]");
        let json: serde_json::Value = serde_json::to_value(&reg).unwrap();
        assert_eq!(json["slope"], 2.0);
        assert_eq!(json["observations"][1]["y"], 3.0);
        assert_eq!(json["x_name"], "x");
    }
}
