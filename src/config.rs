// SPDX-License-Identifier: AGPL-3.0-only

//! Simulation and comparison configuration.
//!
//! A validated, immutable value object deserialized once from a JSON file.
//! Every knob carries an explicit default so a minimal config only needs
//! `experimental_data_path`. Enumerated fields reject unknown values at
//! load time, never at point of use.

use crate::error::ValidationError;
use crate::schema::ColumnOverrides;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Execution backend handed through to the simulation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Compiled kernel backend (default).
    #[default]
    Cython,
    /// Pure interpreter backend.
    Python,
    /// JIT backend.
    Numba,
    /// GPU backend.
    Cupy,
    /// Multi-process backend.
    Parallel,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cython => "cython",
            Self::Python => "python",
            Self::Numba => "numba",
            Self::Cupy => "cupy",
            Self::Parallel => "parallel",
        };
        write!(f, "{s}")
    }
}

/// Radial dose distribution model for the track structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RddModel {
    /// Gaussian track profile (default).
    #[default]
    Gauss,
    /// Geiss track profile.
    Geiss,
}

impl fmt::Display for RddModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gauss => write!(f, "Gauss"),
            Self::Geiss => write!(f, "Geiss"),
        }
    }
}

fn default_voltage_v() -> f64 {
    200.0
}
fn default_electrode_gap_cm() -> f64 {
    0.2
}
fn default_particle() -> String {
    "proton".to_string()
}
fn default_grid_size_um() -> f64 {
    5.0
}
fn default_a0_nm() -> f64 {
    8.0
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}
fn default_true() -> bool {
    true
}

/// Parameters passed uniformly into both comparison protocols.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Execution backend.
    #[serde(default)]
    pub backend: Backend,

    /// Chamber polarization voltage (V).
    #[serde(rename = "voltage_V", default = "default_voltage_v")]
    pub voltage_v: f64,

    /// Electrode gap (cm).
    #[serde(default = "default_electrode_gap_cm")]
    pub electrode_gap_cm: f64,

    /// Beam particle identifier.
    #[serde(default = "default_particle")]
    pub particle: String,

    /// Radial dose distribution model.
    #[serde(rename = "RDD_model", default)]
    pub rdd_model: RddModel,

    /// Spatial grid resolution (µm).
    #[serde(default = "default_grid_size_um")]
    pub grid_size_um: f64,

    /// Track-structure core radius (nm).
    #[serde(default = "default_a0_nm")]
    pub a0_nm: f64,

    /// Apply the beta correction.
    #[serde(default)]
    pub use_beta: bool,

    /// Base seed for the continuous-beam protocol; drawn fresh when unset.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Show plots in the collaborator (passed through).
    #[serde(rename = "SHOW_PLOT", default)]
    pub show_plot: bool,

    /// Print collaborator parameters (passed through).
    #[serde(rename = "PRINT_parameters", default)]
    pub print_parameters: bool,

    /// Collaborator debug output.
    #[serde(default)]
    pub debug: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            voltage_v: default_voltage_v(),
            electrode_gap_cm: default_electrode_gap_cm(),
            particle: default_particle(),
            rdd_model: RddModel::default(),
            grid_size_um: default_grid_size_um(),
            a0_nm: default_a0_nm(),
            use_beta: false,
            seed: None,
            show_plot: false,
            print_parameters: false,
            debug: false,
        }
    }
}

/// Top-level comparison configuration, immutable for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// CSV file with the experimental measurements.
    pub experimental_data_path: PathBuf,

    /// Directory for output tables.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Simulation parameters shared by both protocols.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Run the initial-recombination protocol.
    #[serde(default = "default_true")]
    pub compare_initial_recombination: bool,

    /// Run the continuous-beam protocol.
    #[serde(default = "default_true")]
    pub compare_continuous_beam: bool,

    /// Explicit energy column name (auto-detect when unset).
    #[serde(default)]
    pub energy_column: Option<String>,

    /// Explicit recombination-factor column name (auto-detect when unset).
    #[serde(default)]
    pub ks_column: Option<String>,

    /// Explicit dose-rate column name (auto-detect when unset).
    #[serde(default)]
    pub dose_rate_column: Option<String>,
}

impl ComparisonConfig {
    /// Column overrides for schema resolution.
    #[must_use]
    pub fn column_overrides(&self) -> ColumnOverrides {
        ColumnOverrides {
            energy: self.energy_column.clone(),
            ks: self.ks_column.clone(),
            dose_rate: self.dose_rate_column.clone(),
        }
    }
}

/// Load a comparison configuration from a JSON file.
///
/// # Errors
///
/// Returns [`ValidationError::Config`] if the file is missing or malformed
/// (including unknown enum values).
pub fn load_config(path: &Path) -> Result<ComparisonConfig, ValidationError> {
    if !path.exists() {
        return Err(ValidationError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }
    let reader = std::io::BufReader::new(std::fs::File::open(path).map_err(|e| {
        ValidationError::Config(format!("open {}: {e}", path.display()))
    })?);
    serde_json::from_reader(reader)
        .map_err(|e| ValidationError::Config(format!("parse {}: {e}", path.display())))
}

/// Write a template configuration with documented defaults.
///
/// Touches no dataset; the template is ready to edit and run.
///
/// # Errors
///
/// Returns [`ValidationError::Config`] on serialization or IO failure.
pub fn save_config_template(path: &Path) -> Result<(), ValidationError> {
    let template = serde_json::json!({
        "experimental_data_path": "path/to/experimental_data.csv",
        "output_dir": "results",
        "simulation": {
            "backend": "cython",
            "voltage_V": default_voltage_v(),
            "electrode_gap_cm": default_electrode_gap_cm(),
            "particle": default_particle(),
            "RDD_model": "Gauss",
            "grid_size_um": default_grid_size_um(),
            "a0_nm": default_a0_nm(),
            "use_beta": false,
            "seed": null,
            "SHOW_PLOT": false,
            "PRINT_parameters": false,
            "debug": false,
        },
        "compare_initial_recombination": true,
        "compare_continuous_beam": true,
        "energy_column": null,
        "ks_column": null,
        "dose_rate_column": null,
    });
    let json = serde_json::to_string_pretty(&template)
        .map_err(|e| ValidationError::Config(format!("serialize template: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| ValidationError::Config(format!("write {}: {e}", path.display())))
}
