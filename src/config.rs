//! Configuration file loading.
//!
//! Lookup order: an explicit path, then `RCGAME_CONFIG`, then `rcgame.toml`
//! in the working directory, then built-in defaults. Sections missing from
//! the file keep their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::simulation::SimulationParams;
use crate::strategies::{AlphaBetaParams, MctsParams, SafeChoiceParams};

pub const CONFIG_ENV: &str = "RCGAME_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "rcgame.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub alphabeta: AlphaBetaParams,
    pub mcts: MctsParams,
    pub safe_choice: SafeChoiceParams,
    pub simulation: SimulationParams,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "info".to_string(),
            alphabeta: AlphaBetaParams::default(),
            mcts: MctsParams::default(),
            safe_choice: SafeChoiceParams::default(),
            simulation: SimulationParams::default(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.alphabeta.node_budget == 0 {
            return Err(Error::config("alphabeta.node_budget must be greater than 0"));
        }
        if self.alphabeta.depth_cap == 0 {
            return Err(Error::config("alphabeta.depth_cap must be greater than 0"));
        }
        if self.mcts.max_iterations == 0 {
            return Err(Error::config("mcts.max_iterations must be greater than 0"));
        }
        if !(self.mcts.max_seconds > 0.0) || !self.mcts.max_seconds.is_finite() {
            return Err(Error::config("mcts.max_seconds must be a finite number greater than 0"));
        }
        if Duration::try_from_secs_f64(self.mcts.max_seconds).is_err() {
            return Err(Error::config("mcts.max_seconds is too large"));
        }
        if !self.mcts.exploration.is_finite() || self.mcts.exploration < 0.0 {
            return Err(Error::config("mcts.exploration must be a finite non-negative number"));
        }
        if !(0.0..=1.0).contains(&self.mcts.epsilon) {
            return Err(Error::config("mcts.epsilon must be between 0 and 1"));
        }
        if self.simulation.sizes.iter().any(|&n| n == 0) {
            return Err(Error::config("simulation.sizes must all be greater than 0"));
        }
        Ok(())
    }
}

/// Reads and validates a config file.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Config::from_toml(&text)
}

/// Resolves the config file to use and loads it.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        info!("Loading config from {}", path.display());
        return load_from_path(path);
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Loading config from {}: {}", CONFIG_ENV, path.display());
            return load_from_path(&path);
        }
        warn!("{}={} not found, searching defaults", CONFIG_ENV, path.display());
    }

    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        info!("Loading config from {}", path.display());
        return load_from_path(path);
    }

    debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.alphabeta.node_budget, 60_000);
        assert_eq!(config.mcts.max_iterations, 100_000);
        assert_eq!(config.simulation.sizes, vec![3, 5, 6, 8, 9]);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
log_level = "debug"

[mcts]
max_iterations = 500
seed = 7
"#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.mcts.max_iterations, 500);
        assert_eq!(config.mcts.seed, Some(7));
        assert_eq!(config.mcts.epsilon, 0.5);
        assert_eq!(config.alphabeta, AlphaBetaParams::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Config::from_toml("[mcts]\nepsilon = 1.5\n"),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(matches!(
            Config::from_toml("[alphabeta]\nnode_budget = 0\n"),
            Err(Error::InvalidConfig { .. })
        ));
        for max_seconds in ["inf", "nan", "1e20", "0.0"] {
            let text = format!("[mcts]\nmax_seconds = {}\n", max_seconds);
            assert!(
                matches!(Config::from_toml(&text), Err(Error::InvalidConfig { .. })),
                "max_seconds = {} was accepted",
                max_seconds
            );
        }
        assert!(matches!(Config::from_toml("[mcts]\nmax_iterations = \"many\"\n"), Err(Error::Toml(_))));
    }

    #[test]
    fn explicit_path_wins() {
        let dir = std::env::temp_dir().join(format!("rcgame-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("custom.toml");
        std::fs::write(&path, "[alphabeta]\ndepth_cap = 4\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.alphabeta.depth_cap, 4);

        let missing = dir.join("missing.toml");
        assert!(matches!(load_config(Some(&missing)), Err(Error::Io { .. })));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
