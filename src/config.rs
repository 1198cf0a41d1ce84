use std::path::Path;
use config_file::FromConfigFile;
use serde::Deserialize;
use crate::error::{AppError, TrainError};
use crate::grid::DEFAULT_MAX_STEPS;
use crate::solver::TrainConfig;

/// Hold information read from the TOML configuration file.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Whether a North action may slip East or West
    #[serde(default = "default_stochastic")]
    pub stochastic: bool,
    /// Random seed. Omit for a different run every time.
    pub seed: Option<u64>,
    /// Truncate episodes after this many transitions
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default)]
    pub train: TrainConfig,
}

fn default_stochastic() -> bool {
    true
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            stochastic: default_stochastic(),
            seed: None,
            max_steps: default_max_steps(),
            train: TrainConfig::default(),
        }
    }
}

impl GridConfig {
    pub fn load(path: &Path) -> Result<GridConfig, AppError> {
        let config = GridConfig::from_config_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TrainError> {
        if self.max_steps == 0 {
            return Err(TrainError::InvalidParameter {
                name: "max_steps",
                reason: "must be positive".into(),
            });
        }
        self.train.validate()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir()
            .join(format!("gridmc-{}-{}.toml", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn read_full_config() {
        // Arrange
        let path = write_config("full", r#"
            stochastic = false
            seed = 7
            max_steps = 500

            [train]
            n_samp = 2000
            gamma = 0.8
            eps = 0.2
            eps_decay = false
            eps_decay_rate = 0.95
            tol = 0.01
            max_iter = 20
        "#);
        // Act
        let config = GridConfig::load(&path).unwrap();
        // Assert
        assert!(!config.stochastic);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_steps, 500);
        assert_eq!(config.train, TrainConfig {
            n_samp: 2000, gamma: 0.8, eps: 0.2, eps_decay: false,
            eps_decay_rate: 0.95, tol: 0.01, max_iter: 20,
        });
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_fields_use_defaults() {
        let path = write_config("partial", "[train]\nn_samp = 100\n");
        let config = GridConfig::load(&path).unwrap();
        assert_eq!(config, GridConfig {
            train: TrainConfig { n_samp: 100, ..TrainConfig::default() },
            ..GridConfig::default()
        });
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let path = write_config("invalid", "[train]\ngamma = 1.5\n");
        let result = GridConfig::load(&path);
        assert!(matches!(result, Err(AppError::Train(_))));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn step_limit_defaults_to_finite() {
        let path = write_config("no-limit", "stochastic = false\n");
        let config = GridConfig::load(&path).unwrap();
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn zero_step_limit_is_rejected() {
        let path = write_config("zero-limit", "max_steps = 0\n");
        assert!(matches!(GridConfig::load(&path), Err(AppError::Train(_))));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("gridmc-does-not-exist.toml");
        assert!(matches!(GridConfig::load(&path), Err(AppError::Config(_))));
    }
}
