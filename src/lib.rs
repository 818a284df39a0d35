//! # nc2drift
//!
//! A Rust library for preparing gridded wind data as forcing for particle-drift
//! simulations, and for running those simulations over a set of seed locations.
//!
//! ## Features
//!
//! - **Geographic subsetting**: minimal index rectangle over curvilinear lat/lon grids
//! - **Wind conversion**: speed + meteorological direction to eastward/northward components
//! - **CF output**: `u10`/`v10` with `x_wind`/`y_wind` standard names, written atomically
//! - **Batch simulations**: per-location drift runs with failure isolation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nc2drift::{process_transcode_job, input::JobConfig};
//!
//! // Load configuration from a JSON or YAML file
//! let config = JobConfig::from_file("baltic.yaml").expect("Failed to load config");
//!
//! // Subset, convert and write the wind dataset
//! let summary = process_transcode_job(&config).expect("Failed to transcode");
//! println!("Wrote {:?} cells to {}", summary.shape, summary.output_path);
//! ```
//!
//! ## Configuration Example
//!
//! ```json
//! {
//!   "input_path": "2021_Baltic_wind.nc",
//!   "output_path": "2021_Baltic_wind_uv.nc",
//!   "bounding_box": { "lon_min": 9.5, "lon_max": 30.5, "lat_min": 53.5, "lat_max": 61.0 },
//!   "variables": { "speed": "si10", "direction": "wdir10", "time": "valid_time" }
//! }
//! ```

pub mod error;
pub mod grid;
pub mod info;
pub mod input;
pub mod log;
pub mod pipeline;
pub mod reader;
pub mod simulation;
pub mod subset;
pub mod wind;
pub mod writer;
pub mod cli;


#[cfg(test)]
mod cli_tests;

use crate::error::TranscodeResult;
use crate::grid::IndexRectangle;
use crate::input::JobConfig;
use crate::log::show_netcdf_file_info;
use crate::pipeline::{ensure_units, transcode};
use crate::reader::read_source;
use crate::simulation::{BatchReport, BatchRunner, DriftEngine, SimulationError};
use crate::writer::{WriterOptions, write_dataset_with};
use chrono::{DateTime, Utc};
use std::path::Path;

/// What a transcoding run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeSummary {
    pub output_path: String,
    pub rectangle: IndexRectangle,
    /// `(time, y, x)` of `u10`/`v10`
    pub shape: [usize; 3],
    pub time_units: Option<String>,
}

/// Processes a wind NetCDF file according to the provided job configuration.
///
/// This function orchestrates the entire transcoding pipeline:
/// 1. Validates the configuration
/// 2. Opens the input file and reads coordinates, speed, direction and time
/// 3. Computes the index rectangle covering the bounding box
/// 4. Slices the grid and fields and converts them to u/v components
/// 5. Writes the CF output dataset
///
/// # Errors
///
/// This function will return an error if:
/// - The configuration is invalid
/// - The input file cannot be opened or lacks a required variable
/// - The bounding box selects no grid cells
/// - Field shapes disagree, or the output cannot be written
///
/// Nothing is written to `output_path` unless every step succeeds.
pub fn process_transcode_job(config: &JobConfig) -> TranscodeResult<TranscodeSummary> {
    config.validate()?;

    let file = netcdf::open(&config.input_path)?;
    show_netcdf_file_info(&file);
    let source = read_source(&file, &config.variables)?;
    file.close()?;

    if let Some(expected) = &config.expected_speed_units {
        ensure_units(&config.variables.speed, &source.speed, expected)?;
    }

    let transcoded = transcode(&source, &config.bounding_box)?;
    let options = WriterOptions {
        deflate_level: Some(config.compression_level),
        ..WriterOptions::default()
    };
    write_dataset_with(
        Path::new(&config.output_path),
        &transcoded.time,
        &transcoded.grid,
        &transcoded.eastward,
        &transcoded.northward,
        &options,
    )?;

    Ok(TranscodeSummary {
        output_path: config.output_path.clone(),
        rectangle: transcoded.rectangle,
        shape: transcoded.shape(),
        time_units: transcoded.time.units,
    })
}

/// Runs the configured drift simulations, one job per location.
///
/// The transcoded wind file (`config.output_path`) is added to the readers
/// unless the simulation section opts out. Failures of individual locations
/// are collected in the returned report; only setup errors abort.
pub fn run_simulations<E: DriftEngine + ?Sized>(
    config: &JobConfig,
    start: DateTime<Utc>,
    engine: &mut E,
    show_progress: bool,
) -> Result<BatchReport, SimulationError> {
    let simulation = config.simulation.as_ref().ok_or_else(|| {
        SimulationError::InvalidJob("configuration has no 'simulation' section".to_string())
    })?;
    let jobs = simulation.to_jobs(start, Some(Path::new(&config.output_path)))?;
    Ok(BatchRunner::new(show_progress).run(engine, jobs))
}
