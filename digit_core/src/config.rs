//! Engine configuration management via TOML files.
//!
//! Every section is optional; missing keys fall back to the defaults below.
//!
//! ```toml
//! [data]
//! num_classes = 10
//! validation_per_class = 1000
//! std_threshold = 0.001
//! intensity_scale = 255.0
//!
//! [training]
//! modes = ["one_vs_rest", "multinomial"]
//! parallel = false
//!
//! [optimizer]
//! method = "conjugate_gradient"
//! max_iters = 100
//!
//! [output]
//! log_dir = "logs"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::PrepareConfig;
use crate::learner::{TrainingConfig, TrainingMode};
use crate::optim::{ConjugateGradient, MomentumDescent, OptimizerConfig};

/// Engine configuration loaded from a TOML file.
///
/// # Examples
///
/// ```
/// use digit_recognition_core::EngineConfig;
///
/// let config = EngineConfig::load_from_file("config/engine.toml")
///     .unwrap_or_else(|_| EngineConfig::default());
///
/// println!("Training {} modes over {} digits", config.modes.len(), config.data.num_classes);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineConfig {
    /// Preparation parameters (`[data]`)
    pub data: PrepareConfig,
    /// Heads to train, in order
    pub modes: Vec<TrainingMode>,
    /// Fit one-vs-rest classes on the rayon pool
    pub parallel: bool,
    pub optimizer: OptimizerConfig,
    pub output: OutputConfig,
}

/// Where run artifacts are written; `None` disables the artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputConfig {
    /// Directory for `training.jsonl` and `evaluation.jsonl`
    pub log_dir: Option<PathBuf>,
    /// Directory for classifier checkpoints
    pub checkpoint_dir: Option<PathBuf>,
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path)?;
        Self::from_str(&contents)
    }

    pub fn from_str(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: RawEngineConfig =
            toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;
        Self::try_from(raw)
    }

    /// Trainer settings derived from this configuration
    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            num_classes: self.data.num_classes,
            parallel: self.parallel,
            optimizer: self.optimizer.clone(),
        }
    }

    fn try_from(raw: RawEngineConfig) -> Result<Self, ConfigError> {
        let data = prepare_config(&raw.data)?;
        let optimizer = optimizer_config(&raw.optimizer)?;

        if raw.training.modes.is_empty() {
            return Err(ConfigError::Parse(
                "training.modes must list at least one mode".into(),
            ));
        }
        let mut modes = Vec::with_capacity(raw.training.modes.len());
        for mode in raw.training.modes {
            if !modes.contains(&mode) {
                modes.push(mode);
            }
        }

        Ok(Self {
            data,
            modes,
            parallel: raw.training.parallel,
            optimizer,
            output: OutputConfig {
                log_dir: raw.output.log_dir,
                checkpoint_dir: raw.output.checkpoint_dir,
            },
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data: PrepareConfig::default(),
            modes: TrainingMode::all().to_vec(),
            parallel: false,
            optimizer: OptimizerConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

fn prepare_config(raw: &RawData) -> Result<PrepareConfig, ConfigError> {
    if raw.num_classes < 2 {
        return Err(ConfigError::Parse("data.num_classes must be >= 2".into()));
    }
    if !raw.std_threshold.is_finite() || raw.std_threshold <= 0.0 {
        return Err(ConfigError::Parse(
            "data.std_threshold must be positive".into(),
        ));
    }
    if !raw.intensity_scale.is_finite() || raw.intensity_scale <= 0.0 {
        return Err(ConfigError::Parse(
            "data.intensity_scale must be positive".into(),
        ));
    }

    Ok(PrepareConfig {
        num_classes: raw.num_classes,
        validation_per_class: raw.validation_per_class,
        std_threshold: raw.std_threshold,
        intensity_scale: raw.intensity_scale,
    })
}

fn optimizer_config(raw: &RawOptimizer) -> Result<OptimizerConfig, ConfigError> {
    let config = match raw.method.as_str() {
        "conjugate_gradient" => {
            let defaults = ConjugateGradient::default();
            OptimizerConfig::ConjugateGradient(ConjugateGradient {
                max_iters: raw.max_iters,
                restart_iters: raw.restart_iters,
                c1: raw.c1.unwrap_or(defaults.c1),
                c2: raw.c2.unwrap_or(defaults.c2),
            })
        }
        "momentum" => OptimizerConfig::Momentum(MomentumDescent {
            learning_rate: raw.learning_rate,
            momentum: raw.momentum,
            max_iters: raw.max_iters,
            gradient_tolerance: raw.gradient_tolerance,
        }),
        other => {
            return Err(ConfigError::Parse(format!(
                "optimizer.method must be \"conjugate_gradient\" or \"momentum\", got \"{other}\""
            )))
        }
    };

    config
        .validate()
        .map_err(|err| ConfigError::Parse(format!("optimizer: {err}")))?;
    Ok(config)
}

#[derive(Debug, Default, Deserialize)]
struct RawEngineConfig {
    #[serde(default)]
    data: RawData,
    #[serde(default)]
    training: RawTraining,
    #[serde(default)]
    optimizer: RawOptimizer,
    #[serde(default)]
    output: RawOutput,
}

#[derive(Debug, Deserialize)]
struct RawData {
    #[serde(default = "default_num_classes")]
    num_classes: usize,
    #[serde(default = "default_validation_per_class")]
    validation_per_class: usize,
    #[serde(default = "default_std_threshold")]
    std_threshold: f64,
    #[serde(default = "default_intensity_scale")]
    intensity_scale: f64,
}

impl Default for RawData {
    fn default() -> Self {
        Self {
            num_classes: default_num_classes(),
            validation_per_class: default_validation_per_class(),
            std_threshold: default_std_threshold(),
            intensity_scale: default_intensity_scale(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTraining {
    #[serde(default = "default_modes")]
    modes: Vec<TrainingMode>,
    #[serde(default)]
    parallel: bool,
}

impl Default for RawTraining {
    fn default() -> Self {
        Self {
            modes: default_modes(),
            parallel: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawOptimizer {
    #[serde(default = "default_method")]
    method: String,
    #[serde(default = "default_max_iters")]
    max_iters: u64,
    #[serde(default = "default_restart_iters")]
    restart_iters: u64,
    #[serde(default)]
    c1: Option<f64>,
    #[serde(default)]
    c2: Option<f64>,
    #[serde(default = "default_learning_rate")]
    learning_rate: f64,
    #[serde(default = "default_momentum")]
    momentum: f64,
    #[serde(default = "default_gradient_tolerance")]
    gradient_tolerance: f64,
}

impl Default for RawOptimizer {
    fn default() -> Self {
        Self {
            method: default_method(),
            max_iters: default_max_iters(),
            restart_iters: default_restart_iters(),
            c1: None,
            c2: None,
            learning_rate: default_learning_rate(),
            momentum: default_momentum(),
            gradient_tolerance: default_gradient_tolerance(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawOutput {
    #[serde(default)]
    log_dir: Option<PathBuf>,
    #[serde(default)]
    checkpoint_dir: Option<PathBuf>,
}

fn default_num_classes() -> usize {
    10
}

fn default_validation_per_class() -> usize {
    1000
}

fn default_std_threshold() -> f64 {
    0.001
}

fn default_intensity_scale() -> f64 {
    255.0
}

fn default_modes() -> Vec<TrainingMode> {
    TrainingMode::all().to_vec()
}

fn default_method() -> String {
    "conjugate_gradient".to_string()
}

fn default_max_iters() -> u64 {
    100
}

fn default_restart_iters() -> u64 {
    10
}

fn default_learning_rate() -> f64 {
    0.05
}

fn default_momentum() -> f64 {
    0.9
}

fn default_gradient_tolerance() -> f64 {
    1e-6
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {}", err),
            ConfigError::Parse(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}
