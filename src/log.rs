use crate::TranscodeSummary;
use crate::input::JobConfig;
use crate::simulation::BatchReport;
use log::debug;
use std::time::Duration;

pub fn show_greeting(config_source: &str) {
    println!("=== NetCDF Wind to Drift Forcing Converter ===");
    println!("Loading configuration from: {}", config_source);
}

pub fn config_echo(config: &JobConfig) {
    println!("\nConfiguration:");
    println!("  Input NetCDF: {}", config.input_path);
    println!("  Output NetCDF: {}", config.output_path);
    println!("  Bounding box: {}", config.bounding_box);
    println!(
        "  Variables: speed={} direction={} time={} lat={} lon={}",
        config.variables.speed,
        config.variables.direction,
        config.variables.time,
        config.variables.latitude,
        config.variables.longitude
    );
    if let Some(units) = &config.expected_speed_units {
        println!("  Expected speed units: {}", units);
    }
    println!("  Compression level: {}", config.compression_level);
    if let Some(simulation) = &config.simulation {
        println!("  Simulation locations: {}", simulation.locations.len());
    }
}

/// Logs the structure of an opened file at debug level.
pub fn show_netcdf_file_info(file: &netcdf::File) {
    debug!("NetCDF file dimensions:");
    for dim in file.dimensions() {
        debug!("  {}: {}", dim.name(), dim.len());
    }
    debug!("NetCDF file variables:");
    for var in file.variables() {
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name().to_string()).collect();
        debug!("  {}: {:?}", var.name(), dims);
    }
}

pub fn show_transcode_summary(summary: &TranscodeSummary) {
    println!("\nSubset: {}", summary.rectangle);
    println!(
        "Output shape (time, y, x): ({}, {}, {})",
        summary.shape[0], summary.shape[1], summary.shape[2]
    );
    match &summary.time_units {
        Some(units) => println!("Time units: {}", units),
        None => println!("Time units: <none in source>"),
    }
    println!("Subset and converted data saved to {}", summary.output_path);
}

pub fn show_batch_report(report: &BatchReport) {
    println!("\nSimulation results:");
    for (name, outfile) in report.succeeded() {
        println!("  ✅ Finished {} → {}", name, outfile.display());
    }
    for (name, error) in report.failed() {
        println!("  ❌ Error during run for {}: {}", name, error);
    }
}

pub fn show_farewell_with_timing(elapsed: Duration) {
    println!("\n=== Completed in {:.2?} ===", elapsed);
}
