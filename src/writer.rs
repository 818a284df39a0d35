//! # CF Grid Dataset Writer
//!
//! Emits the transcoded wind dataset as NetCDF-4 with the variable names,
//! standard names and units a generic CF grid reader expects.
//!
//! ## Output layout
//!
//! | variable    | standard_name | units           | type | dims           | compressed |
//! |-------------|---------------|-----------------|------|----------------|------------|
//! | `time`      | `time`        | copied, if any  | f64  | `time`         | no         |
//! | `latitude`  | `latitude`    | `degrees_north` | f32  | `y, x`         | no         |
//! | `longitude` | `longitude`   | `degrees_east`  | f32  | `y, x`         | no         |
//! | `u10`       | `x_wind`      | `m s-1`         | f32  | `time, y, x`   | deflate    |
//! | `v10`       | `y_wind`      | `m s-1`         | f32  | `time, y, x`   | deflate    |
//!
//! The layout is driven by [`OUTPUT_VARIABLES`]; adding an output variable
//! is a table change.
//!
//! ## Durability
//!
//! Shapes are validated before anything touches the filesystem. The dataset
//! is then written to a hidden temporary file next to the destination, with
//! every dimension and variable defined before any data is stored. It is
//! closed explicitly and only then renamed onto the destination path, so a
//! failure never leaves a readable half-written file behind.

use crate::error::{TranscodeError, TranscodeResult};
use crate::grid::{CoordinateGrid, GriddedField, TimeAxis};
use log::{debug, warn};
use std::path::Path;

/// Units attached to an output variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Fixed(&'static str),
    /// Copied from the source time variable when it has a `units` attribute.
    FromSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    F32,
    F64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compression {
    pub deflate_level: i32,
    pub shuffle: bool,
}

/// Which in-memory array feeds an output variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Time,
    Latitude,
    Longitude,
    Eastward,
    Northward,
}

/// Declarative description of one output variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableSpec {
    pub name: &'static str,
    pub standard_name: &'static str,
    pub units: Units,
    pub dtype: VarType,
    pub dims: &'static [&'static str],
    pub compression: Option<Compression>,
    pub source: DataSource,
}

pub const DEFAULT_COMPRESSION: Compression = Compression {
    deflate_level: 4,
    shuffle: true,
};

pub const OUTPUT_VARIABLES: &[VariableSpec] = &[
    VariableSpec {
        name: "time",
        standard_name: "time",
        units: Units::FromSource,
        dtype: VarType::F64,
        dims: &["time"],
        compression: None,
        source: DataSource::Time,
    },
    VariableSpec {
        name: "latitude",
        standard_name: "latitude",
        units: Units::Fixed("degrees_north"),
        dtype: VarType::F32,
        dims: &["y", "x"],
        compression: None,
        source: DataSource::Latitude,
    },
    VariableSpec {
        name: "longitude",
        standard_name: "longitude",
        units: Units::Fixed("degrees_east"),
        dtype: VarType::F32,
        dims: &["y", "x"],
        compression: None,
        source: DataSource::Longitude,
    },
    VariableSpec {
        name: "u10",
        standard_name: "x_wind",
        units: Units::Fixed("m s-1"),
        dtype: VarType::F32,
        dims: &["time", "y", "x"],
        compression: Some(DEFAULT_COMPRESSION),
        source: DataSource::Eastward,
    },
    VariableSpec {
        name: "v10",
        standard_name: "y_wind",
        units: Units::Fixed("m s-1"),
        dtype: VarType::F32,
        dims: &["time", "y", "x"],
        compression: Some(DEFAULT_COMPRESSION),
        source: DataSource::Northward,
    },
];

/// Tunables for [`write_dataset_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Overrides the deflate level of every compressed variable (0-9).
    pub deflate_level: Option<i32>,
    /// Value of the global `source` attribute.
    pub source: String,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            deflate_level: None,
            source: format!("nc2drift {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

enum Payload {
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Payload {
    fn len(&self) -> usize {
        match self {
            Payload::F32(v) => v.len(),
            Payload::F64(v) => v.len(),
        }
    }
}

/// Output inputs bundled for lookup by [`DataSource`].
struct Inputs<'a> {
    time: &'a TimeAxis,
    grid: &'a CoordinateGrid,
    eastward: &'a GriddedField,
    northward: &'a GriddedField,
}

impl Inputs<'_> {
    fn payload(&self, spec: &VariableSpec) -> Payload {
        let values: Payload = match spec.source {
            DataSource::Time => Payload::F64(self.time.values.clone()),
            DataSource::Latitude => Payload::F64(self.grid.latitude().iter().copied().collect()),
            DataSource::Longitude => Payload::F64(self.grid.longitude().iter().copied().collect()),
            DataSource::Eastward => Payload::F32(self.eastward.data.iter().copied().collect()),
            DataSource::Northward => Payload::F32(self.northward.data.iter().copied().collect()),
        };
        match (spec.dtype, values) {
            (VarType::F32, Payload::F64(v)) => Payload::F32(v.into_iter().map(|x| x as f32).collect()),
            (VarType::F64, Payload::F32(v)) => Payload::F64(v.into_iter().map(f64::from).collect()),
            (_, same) => same,
        }
    }

    fn units(&self, spec: &VariableSpec) -> Option<String> {
        match spec.units {
            Units::Fixed(units) => Some(units.to_string()),
            Units::FromSource => self.time.units.clone(),
        }
    }
}

/// Checks that both component fields are shaped `(len(time), y, x)` of the grid.
///
/// An empty time axis is rejected: netCDF defines a zero-length dimension
/// as unlimited.
pub fn validate_shapes(
    time: &TimeAxis,
    grid: &CoordinateGrid,
    eastward: &GriddedField,
    northward: &GriddedField,
) -> TranscodeResult<()> {
    if time.is_empty() {
        return Err(TranscodeError::dimension_mismatch("time", &[1], &[0]));
    }
    let (ny, nx) = grid.shape();
    let expected = [time.len(), ny, nx];
    for (name, field) in [("u10", eastward), ("v10", northward)] {
        if field.shape() != expected {
            return Err(TranscodeError::dimension_mismatch(name, &expected, &field.shape()));
        }
    }
    Ok(())
}

/// Writes the output dataset with default [`WriterOptions`].
pub fn write_dataset(
    output_path: &Path,
    time: &TimeAxis,
    grid: &CoordinateGrid,
    eastward: &GriddedField,
    northward: &GriddedField,
) -> TranscodeResult<()> {
    write_dataset_with(output_path, time, grid, eastward, northward, &WriterOptions::default())
}

/// Writes the output dataset, replacing any file at `output_path`.
///
/// # Errors
///
/// - [`TranscodeError::DimensionMismatch`] if the time axis is empty or the
///   component fields do not match it and the grid; no file is created then
/// - [`TranscodeError::InvalidConfig`] for a deflate level outside 0-9
/// - [`TranscodeError::NetCdf`] / [`TranscodeError::Io`] on write failures;
///   the destination is left as it was
pub fn write_dataset_with(
    output_path: &Path,
    time: &TimeAxis,
    grid: &CoordinateGrid,
    eastward: &GriddedField,
    northward: &GriddedField,
    options: &WriterOptions,
) -> TranscodeResult<()> {
    validate_shapes(time, grid, eastward, northward)?;
    if let Some(level) = options.deflate_level
        && !(0..=9).contains(&level)
    {
        return Err(TranscodeError::InvalidConfig(format!(
            "deflate level must be between 0 and 9, got {}",
            level
        )));
    }
    if time.units.is_none() {
        warn!("Source time variable has no units; output 'time' will carry no units attribute");
    }

    let inputs = Inputs {
        time,
        grid,
        eastward,
        northward,
    };

    let dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp_path = tempfile::Builder::new()
        .prefix(".nc2drift-")
        .suffix(".nc.partial")
        .tempfile_in(dir)?
        .into_temp_path();
    debug!("Writing dataset to temporary file {:?}", temp_path);

    let mut file = netcdf::create(&*temp_path)?;
    define_layout(&mut file, &inputs, options)?;
    put_data(&mut file, &inputs)?;
    file.close()?;

    temp_path
        .persist(output_path)
        .map_err(|e| TranscodeError::Io(e.error))?;
    debug!("Dataset written to {}", output_path.display());
    Ok(())
}

/// Defines dimensions, variables and attributes. No data is written here.
fn define_layout(
    file: &mut netcdf::FileMut,
    inputs: &Inputs,
    options: &WriterOptions,
) -> TranscodeResult<()> {
    let (ny, nx) = inputs.grid.shape();
    file.add_dimension("time", inputs.time.len())?;
    file.add_dimension("y", ny)?;
    file.add_dimension("x", nx)?;

    for spec in OUTPUT_VARIABLES {
        let mut var = match spec.dtype {
            VarType::F32 => file.add_variable::<f32>(spec.name, spec.dims)?,
            VarType::F64 => file.add_variable::<f64>(spec.name, spec.dims)?,
        };
        if let Some(compression) = spec.compression {
            let level = options.deflate_level.unwrap_or(compression.deflate_level);
            var.set_compression(level, compression.shuffle)?;
        }
        var.put_attribute("standard_name", spec.standard_name)?;
        if let Some(units) = inputs.units(spec) {
            var.put_attribute("units", units.as_str())?;
        }
    }

    file.add_attribute("Conventions", "CF-1.6")?;
    file.add_attribute("source", options.source.as_str())?;
    Ok(())
}

fn put_data(file: &mut netcdf::FileMut, inputs: &Inputs) -> TranscodeResult<()> {
    for spec in OUTPUT_VARIABLES {
        let payload = inputs.payload(spec);
        if payload.len() == 0 {
            continue;
        }
        let mut var = file
            .variable_mut(spec.name)
            .ok_or_else(|| TranscodeError::MissingVariable(spec.name.to_string()))?;
        match payload {
            Payload::F32(values) => var.put_values(&values, ..)?,
            Payload::F64(values) => var.put_values(&values, ..)?,
        }
    }
    Ok(())
}
