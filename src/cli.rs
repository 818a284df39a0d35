//! # CLI Module
//!
//! This module provides the command-line interface for nc2drift, including:
//! - Argument parsing with clap
//! - Configuration file loading (JSON/YAML)
//! - Environment variable support with the NC2DRIFT_ prefix
//! - Merging of command line, environment and configuration file values
//! - Configuration templates

use crate::grid::BoundingBox;
use crate::input::JobConfig;
use crate::simulation::{EngineCommand, Location, RunConfig, SimulationConfig};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prepare gridded wind data for particle-drift simulations
#[derive(Parser, Debug)]
#[command(name = "nc2drift")]
#[command(about = "Subset wind NetCDF files, convert them to CF u/v components and run drift simulations")]
#[command(version)]
#[command(long_about = "
nc2drift turns a wind dataset given as speed and meteorological direction on a
curvilinear lat/lon grid into a CF-compliant NetCDF file with eastward (u10)
and northward (v10) components, restricted to a region of interest. The result
can be fed to a particle-drift engine for a batch of seed locations.

EXAMPLES:
  # Subset the Baltic Sea and convert to u/v
  nc2drift transcode 2021_wind.nc baltic_wind.nc --bbox 9.5:30.5:53.5:61.0

  # Using a config file
  nc2drift --config baltic.yaml transcode

  # Inspect variables and their CF attributes
  nc2drift info 2021_wind.nc

  # Run drift simulations for every configured location
  nc2drift --config baltic.yaml simulate --start 2021-01-01 --engine ./run_drift.py

  # Generate a configuration template
  nc2drift template baltic --format yaml > baltic.yaml
")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path (JSON or YAML)
    #[arg(short, long, global = true, env = "NC2DRIFT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Subset a wind dataset and convert it to u/v components
    #[command(long_about = "
Subset a wind dataset to a bounding box and convert speed/direction to
eastward and northward components.

Values are taken from command-line arguments first, then NC2DRIFT_INPUT,
NC2DRIFT_OUTPUT and NC2DRIFT_BBOX, then the configuration file.

EXAMPLES:
  nc2drift transcode wind.nc baltic.nc --bbox 9.5:30.5:53.5:61.0
  nc2drift transcode era5.nc out.nc --bbox 0,5,40,45 --speed-var ws --time-var time
  nc2drift --config baltic.yaml transcode --dry-run
")]
    Transcode(TranscodeArgs),

    /// Show information about a NetCDF file
    #[command(long_about = "
Inspect a NetCDF file: dimensions, variables and their standard_name,
long_name and units attributes.

EXAMPLES:
  nc2drift info wind.nc
  nc2drift info baltic.nc --check
  nc2drift info wind.nc -n si10 --format json
")]
    Info {
        /// NetCDF file path
        file: PathBuf,

        /// Include global attributes
        #[arg(long)]
        detailed: bool,

        /// Show only specific variable info
        #[arg(short = 'n', long)]
        variable: Option<String>,

        /// Output format for file information
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,

        /// Fail if a variable lacks standard_name or units
        #[arg(long)]
        check: bool,
    },

    /// Run drift simulations for the configured locations
    #[command(long_about = "
Run one drift simulation per location in the configuration's 'simulation'
section. Each job is sent as JSON on the engine program's stdin. A failing
location is reported and the remaining locations still run; the command exits
with an error if any location failed.

EXAMPLES:
  nc2drift --config baltic.yaml simulate --start 2021-01-01T00:00:00Z --engine ./run_drift.py
")]
    Simulate {
        /// Simulation start, RFC 3339 or YYYY-MM-DD (midnight UTC)
        #[arg(long, value_parser = parse_start_time)]
        start: DateTime<Utc>,

        /// Engine program, overrides simulation.engine_command
        #[arg(long, env = "NC2DRIFT_ENGINE")]
        engine: Option<String>,

        /// Extra argument for the engine program (repeatable)
        #[arg(long = "engine-arg", allow_hyphen_values = true)]
        engine_args: Vec<String>,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file to validate
        config_file: Option<PathBuf>,

        /// Show detailed validation report
        #[arg(long)]
        detailed: bool,
    },

    /// Generate configuration templates
    Template {
        /// Template type to generate
        #[arg(value_enum)]
        template_type: TemplateType,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration format
        #[arg(long, value_enum, default_value_t = ConfigFormat::Json)]
        format: ConfigFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
pub struct TranscodeArgs {
    /// Input NetCDF file with wind speed and direction
    #[arg(value_name = "INPUT", env = "NC2DRIFT_INPUT")]
    pub input: Option<String>,

    /// Output NetCDF file with u10/v10
    #[arg(value_name = "OUTPUT", env = "NC2DRIFT_OUTPUT")]
    pub output: Option<String>,

    /// Bounding box: lon_min:lon_max:lat_min:lat_max (commas also accepted)
    #[arg(long, value_parser = parse_bbox, env = "NC2DRIFT_BBOX", allow_hyphen_values = true)]
    pub bbox: Option<BoundingBox>,

    /// Name of the wind speed variable
    #[arg(long)]
    pub speed_var: Option<String>,

    /// Name of the wind direction variable
    #[arg(long)]
    pub direction_var: Option<String>,

    /// Name of the time variable
    #[arg(long)]
    pub time_var: Option<String>,

    /// Name of the latitude variable
    #[arg(long)]
    pub lat_var: Option<String>,

    /// Name of the longitude variable
    #[arg(long)]
    pub lon_var: Option<String>,

    /// Require this units attribute on the speed variable
    #[arg(long)]
    pub expected_units: Option<String>,

    /// Deflate level for u10/v10
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..=9))]
    pub compression: Option<i32>,

    /// Overwrite an existing output file
    #[arg(long, env = "NC2DRIFT_FORCE")]
    pub force: bool,

    /// Validate configuration without processing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(ValueEnum, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON structured output
    Json,
    /// YAML structured output
    Yaml,
    /// CSV output (variables only)
    Csv,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum TemplateType {
    /// Minimal transcoding job
    Basic,
    /// Baltic Sea subset of CERRA wind
    Baltic,
    /// Baltic subset plus drift simulations
    Simulation,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// YAML configuration format
    Yaml,
}

/// Parse a bounding box from the command line
/// Format: lon_min:lon_max:lat_min:lat_max (or comma separated)
pub fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    let separator = if s.contains(':') { ':' } else { ',' };
    let parts: Vec<&str> = s.split(separator).map(str::trim).collect();
    if parts.len() != 4 {
        return Err("Bounding box must be in format 'lon_min:lon_max:lat_min:lat_max'".to_string());
    }

    let values: Vec<f64> = parts
        .iter()
        .map(|v| v.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| "Invalid numeric value in bounding box")?;

    BoundingBox::new(values[0], values[1], values[2], values[3]).map_err(|e| e.to_string())
}

/// Parse a simulation start time: RFC 3339, or a bare date at midnight UTC
pub fn parse_start_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(time) = DateTime::parse_from_rfc3339(s) {
        return Ok(time.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("Invalid start time '{}', expected RFC 3339 or YYYY-MM-DD", s))
}

/// Merge command-line (and environment) values over an optional config file.
/// Priority: CLI arguments > environment variables > configuration file
pub fn merge_job_config(base: Option<JobConfig>, args: &TranscodeArgs) -> Result<JobConfig> {
    let mut config = match base {
        Some(config) => config,
        None => {
            let (Some(input), Some(output), Some(bbox)) = (&args.input, &args.output, args.bbox)
            else {
                bail!(
                    "INPUT, OUTPUT and --bbox are required when no configuration file is given"
                );
            };
            JobConfig::new(input, output, bbox)
        }
    };

    if let Some(input) = &args.input {
        config.input_path = input.clone();
    }
    if let Some(output) = &args.output {
        config.output_path = output.clone();
    }
    if let Some(bbox) = args.bbox {
        config.bounding_box = bbox;
    }

    let names = &mut config.variables;
    for (target, value) in [
        (&mut names.speed, &args.speed_var),
        (&mut names.direction, &args.direction_var),
        (&mut names.time, &args.time_var),
        (&mut names.latitude, &args.lat_var),
        (&mut names.longitude, &args.lon_var),
    ] {
        if let Some(value) = value {
            *target = value.clone();
        }
    }

    if let Some(units) = &args.expected_units {
        config.expected_speed_units = Some(units.clone());
    }
    if let Some(level) = args.compression {
        config.compression_level = level;
    }
    Ok(config)
}

fn baltic_box() -> BoundingBox {
    BoundingBox {
        lon_min: 9.5,
        lon_max: 30.5,
        lat_min: 53.5,
        lat_max: 61.0,
    }
}

/// Build the job configuration behind a template
pub fn generate_template(template_type: &TemplateType) -> JobConfig {
    match template_type {
        TemplateType::Basic => JobConfig::new(
            "input.nc",
            "output.nc",
            BoundingBox {
                lon_min: 0.0,
                lon_max: 10.0,
                lat_min: 50.0,
                lat_max: 60.0,
            },
        ),
        TemplateType::Baltic => {
            let mut config = JobConfig::new("2021_Baltic_wind.nc", "2021_Baltic_wind_uv.nc", baltic_box());
            config.expected_speed_units = Some("m s-1".to_string());
            config
        }
        TemplateType::Simulation => {
            let mut config = generate_template(&TemplateType::Baltic);
            let locations = [
                ("Stockholm", 19.5, 59.154416),
                ("Oslo", 10.651439, 59.165165),
                ("Gothenburg", 11.70596, 57.657308),
                ("Copenhagen", 12.854807, 55.63584),
                ("Oder", 14.080797, 54.054322),
                ("Gdansk", 18.827874, 54.461684),
                ("Visby", 17.970688, 57.656943),
                ("Helsingfors", 24.985232, 60.099697),
                ("St_Petersburg", 29.527928, 60.045289),
                ("Riga", 24.000448, 57.076058),
            ];
            config.simulation = Some(SimulationConfig {
                readers: vec![
                    PathBuf::from("2021_Baltic_x_current.nc"),
                    PathBuf::from("2021_Baltic_y_current.nc"),
                ],
                use_transcoded_wind: true,
                locations: locations
                    .iter()
                    .map(|(name, lon, lat)| Location {
                        name: name.to_string(),
                        lon: *lon,
                        lat: *lat,
                    })
                    .collect(),
                engine: Default::default(),
                seed: Default::default(),
                run: RunConfig {
                    duration_hours: Some(24 * 365),
                    ..RunConfig::default()
                },
                engine_command: Some(EngineCommand {
                    program: "run_drift.py".to_string(),
                    args: Vec::new(),
                }),
            });
            config
        }
    }
}

/// Serialize a template in the requested format
pub fn render_template(template_type: &TemplateType, format: &ConfigFormat) -> Result<String> {
    let config = generate_template(template_type);
    let rendered = match format {
        ConfigFormat::Json => config.to_json(),
        ConfigFormat::Yaml => config.to_yaml(),
    };
    rendered.context("Failed to serialize template")
}
