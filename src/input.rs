//! # Input Configuration Module
//!
//! This module provides configuration parsing and validation for nc2drift jobs.
//! A job names the input wind dataset, the output forcing file, the region of
//! interest and, optionally, the drift simulations to run on the result.
//!
//! ## Configuration Structure
//!
//! - **input_path**: Path to the source NetCDF file (speed + direction)
//! - **output_path**: Path of the CF-compliant u/v NetCDF file to write
//! - **bounding_box**: Region to keep, in degrees
//! - **variables**: Input variable names (defaults match CERRA single-level wind)
//! - **expected_speed_units**: Optional check against the speed `units` attribute
//! - **compression_level**: Deflate level used for `u10`/`v10` (0-9)
//! - **simulation**: Optional batch of drift simulations
//!
//! ## Example Usage
//!
//! ```rust
//! use nc2drift::input::JobConfig;
//!
//! let json = r#"
//! {
//!   "input_path": "wind.nc",
//!   "output_path": "baltic_wind.nc",
//!   "bounding_box": { "lon_min": 9.5, "lon_max": 30.5, "lat_min": 53.5, "lat_max": 61.0 }
//! }"#;
//! let config = JobConfig::from_json(json)?;
//! assert_eq!(config.variables.speed, "si10");
//! assert_eq!(config.compression_level, 4);
//! # Ok::<(), nc2drift::error::TranscodeError>(())
//! ```

use crate::error::{TranscodeError, TranscodeResult};
use crate::grid::BoundingBox;
use crate::reader::VariableNames;
use crate::simulation::SimulationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure for nc2drift jobs.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct JobConfig {
    /// Path to the input NetCDF file
    pub input_path: String,
    /// Path for the output NetCDF file
    pub output_path: String,
    /// Region of interest
    pub bounding_box: BoundingBox,
    /// Names of the input variables
    #[serde(default)]
    pub variables: VariableNames,
    /// Units the speed variable must declare, if set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_speed_units: Option<String>,
    /// Deflate level for the wind component variables
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
    /// Drift simulations to run on the transcoded output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationConfig>,
}

fn default_compression_level() -> i32 {
    4
}

impl JobConfig {
    /// Creates a configuration with default variable names and compression.
    pub fn new(input_path: &str, output_path: &str, bounding_box: BoundingBox) -> Self {
        JobConfig {
            input_path: input_path.to_string(),
            output_path: output_path.to_string(),
            bounding_box,
            variables: VariableNames::default(),
            expected_speed_units: None,
            compression_level: default_compression_level(),
            simulation: None,
        }
    }

    /// Loads a job configuration from a JSON or YAML file.
    ///
    /// The format is chosen from the extension (`.json`, `.yaml`, `.yml`);
    /// other extensions are tried as JSON first, then YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> TranscodeResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => Self::from_json(&content),
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content).or_else(|json_err| {
                Self::from_yaml(&content).map_err(|yaml_err| {
                    TranscodeError::InvalidConfig(format!(
                        "{} is neither valid JSON ({}) nor valid YAML ({})",
                        path.display(),
                        json_err,
                        yaml_err
                    ))
                })
            }),
        }
    }

    /// Loads a job configuration from a JSON string.
    pub fn from_json(json_str: &str) -> TranscodeResult<Self> {
        serde_json::from_str(json_str).map_err(|e| TranscodeError::InvalidConfig(e.to_string()))
    }

    /// Loads a job configuration from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> TranscodeResult<Self> {
        serde_yaml::from_str(yaml_str).map_err(|e| TranscodeError::InvalidConfig(e.to_string()))
    }

    pub fn to_json(&self) -> TranscodeResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TranscodeError::InvalidConfig(e.to_string()))
    }

    pub fn to_yaml(&self) -> TranscodeResult<String> {
        serde_yaml::to_string(self).map_err(|e| TranscodeError::InvalidConfig(e.to_string()))
    }

    /// Checks the configuration for values the pipeline would reject.
    pub fn validate(&self) -> TranscodeResult<()> {
        if self.input_path.trim().is_empty() {
            return Err(TranscodeError::InvalidConfig("input_path is empty".to_string()));
        }
        if self.output_path.trim().is_empty() {
            return Err(TranscodeError::InvalidConfig("output_path is empty".to_string()));
        }
        if self.input_path == self.output_path {
            return Err(TranscodeError::InvalidConfig(
                "input_path and output_path must differ".to_string(),
            ));
        }
        self.bounding_box.validate()?;
        if !(0..=9).contains(&self.compression_level) {
            return Err(TranscodeError::InvalidConfig(format!(
                "compression_level must be between 0 and 9, got {}",
                self.compression_level
            )));
        }

        let names = &self.variables;
        for (role, name) in [
            ("latitude", &names.latitude),
            ("longitude", &names.longitude),
            ("speed", &names.speed),
            ("direction", &names.direction),
            ("time", &names.time),
        ] {
            if name.trim().is_empty() {
                return Err(TranscodeError::InvalidConfig(format!(
                    "variable name for {} is empty",
                    role
                )));
            }
        }

        if let Some(simulation) = &self.simulation {
            simulation
                .validate()
                .map_err(|e| TranscodeError::InvalidConfig(e.to_string()))?;
        }
        Ok(())
    }
}
