use std::io::BufReader;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use fs_err::File;
use serde::Deserialize;
use thiserror::Error;

use crate::table::RowPolicy;

/// The smallest `min_observations` that still leaves a degree of freedom.
pub const LEAST_OBSERVATIONS: usize = 2;

/// Knobs for validation and ingestion.
///
/// Can be read from TOML:
///
/// ```toml
/// min_observations = 3
/// reject_constant_x = true
/// row_policy = "skip-malformed"
/// ```
#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegressionConfig {
    pub min_observations: usize,
    pub reject_constant_x: bool,
    pub row_policy: RowPolicy,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self::strict()
    }
}

impl RegressionConfig {
    /// At least three observations, and the x values must not all coincide.
    pub fn strict() -> Self {
        RegressionConfig {
            min_observations: 3,
            reject_constant_x: true,
            row_policy: RowPolicy::Strict,
        }
    }

    /// At least two observations; degenerate fits are reported as zeros.
    pub fn permissive() -> Self {
        RegressionConfig {
            min_observations: LEAST_OBSERVATIONS,
            reject_constant_x: false,
            row_policy: RowPolicy::Strict,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<RegressionConfig, ConfigLoadError> {
        let mut s = String::new();
        BufReader::new(File::open(path.as_ref())?).read_to_string(&mut s)?;
        s.parse()
    }

    fn validate(self) -> Result<Self, ConfigLoadError> {
        if self.min_observations < LEAST_OBSERVATIONS {
            return Err(ConfigLoadError::MinObservationsTooSmall(
                self.min_observations,
            ));
        }
        Ok(self)
    }
}

impl FromStr for RegressionConfig {
    type Err = ConfigLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str::<RegressionConfig>(s)?.validate()
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("{0}")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    IllegalConfigEntry(#[from] toml::de::Error),
    #[error("min_observations must be at least 2, got {0}")]
    MinObservationsTooSmall(usize),
}

#[cfg(test)]
mod test {
    use super::ConfigLoadError;
    use super::RegressionConfig;
    use crate::table::RowPolicy;

    #[test]
    fn test_parse_full() {
        let config: RegressionConfig = r#"
            min_observations = 2
            reject_constant_x = false
            row_policy = "skip-malformed"
        "#
        .parse()
        .unwrap();
        assert_eq!(
            config,
            RegressionConfig {
                min_observations: 2,
                reject_constant_x: false,
                row_policy: RowPolicy::SkipMalformed,
            }
        );
    }

    #[test]
    fn test_missing_keys_default_to_strict() {
        let config: RegressionConfig = "".parse().unwrap();
        assert_eq!(config, RegressionConfig::strict());
        let config: RegressionConfig = "min_observations = 5".parse().unwrap();
        assert_eq!(config.min_observations, 5);
        assert!(config.reject_constant_x);
    }

    #[test]
    fn test_rejects_bad_entries() {
        let err = "min_observations = 1".parse::<RegressionConfig>().unwrap_err();
        assert!(matches!(err, ConfigLoadError::MinObservationsTooSmall(1)));
        let err = "row_policy = \"lenient\"".parse::<RegressionConfig>().unwrap_err();
        assert!(matches!(err, ConfigLoadError::IllegalConfigEntry(_)));
        let err = "colour = 1".parse::<RegressionConfig>().unwrap_err();
        assert!(matches!(err, ConfigLoadError::IllegalConfigEntry(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RegressionConfig::load("/nonexistent/regression.toml").unwrap_err();
        assert!(matches!(err, ConfigLoadError::IOError(_)));
    }
}
