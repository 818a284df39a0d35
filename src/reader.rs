//! # Source Dataset Reader
//!
//! Loads the coordinate grid, wind speed, wind direction and time axis from
//! an input NetCDF file into a [`SourceDataset`].
//!
//! Variable names default to those of the CERRA single-level wind product
//! (`si10`, `wdir10`, `valid_time`) and can be overridden through
//! [`VariableNames`]. Packed variables (`scale_factor` / `add_offset`) are
//! unpacked and `_FillValue` cells become `NaN`.

use crate::error::{TranscodeError, TranscodeResult};
use crate::grid::{CoordinateGrid, FieldKind, GriddedField, TimeAxis};
use log::debug;
use ndarray::{Array2, Array3};
use netcdf::AttributeValue;
use serde::{Deserialize, Serialize};

/// Names of the input variables read by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableNames {
    pub latitude: String,
    pub longitude: String,
    pub speed: String,
    pub direction: String,
    pub time: String,
}

impl Default for VariableNames {
    fn default() -> Self {
        VariableNames {
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            speed: "si10".to_string(),
            direction: "wdir10".to_string(),
            time: "valid_time".to_string(),
        }
    }
}

/// Everything the pipeline needs from the input file, held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDataset {
    pub grid: CoordinateGrid,
    pub speed: GriddedField,
    pub direction: GriddedField,
    pub time: TimeAxis,
}

/// Reads all required variables from an open NetCDF file.
///
/// # Errors
///
/// - [`TranscodeError::MissingVariable`] if any of the five variables is absent
/// - [`TranscodeError::DimensionMismatch`] if ranks or extents disagree
pub fn read_source(file: &netcdf::File, names: &VariableNames) -> TranscodeResult<SourceDataset> {
    let grid = read_grid(file, names)?;
    let time = read_time_axis(file, &names.time)?;
    let speed = read_field(file, &names.speed, FieldKind::WindSpeed)?;
    let direction = read_field(file, &names.direction, FieldKind::WindDirection)?;

    let (ny, nx) = grid.shape();
    for field in [&speed, &direction] {
        let expected = [time.len(), ny, nx];
        if field.shape() != expected {
            let name = match field.kind {
                FieldKind::WindSpeed => &names.speed,
                _ => &names.direction,
            };
            return Err(TranscodeError::dimension_mismatch(
                name,
                &expected,
                &field.shape(),
            ));
        }
    }

    debug!(
        "Read source dataset: grid {}x{}, {} time steps, time units {:?}",
        ny,
        nx,
        time.len(),
        time.units
    );

    Ok(SourceDataset {
        grid,
        speed,
        direction,
        time,
    })
}

fn variable<'f>(file: &'f netcdf::File, name: &str) -> TranscodeResult<netcdf::Variable<'f>> {
    file.variable(name)
        .ok_or_else(|| TranscodeError::MissingVariable(name.to_string()))
}

fn shape_of(var: &netcdf::Variable) -> Vec<usize> {
    var.dimensions().iter().map(|d| d.len()).collect()
}

fn read_grid(file: &netcdf::File, names: &VariableNames) -> TranscodeResult<CoordinateGrid> {
    let lat_var = variable(file, &names.latitude)?;
    let lon_var = variable(file, &names.longitude)?;
    let lat_shape = shape_of(&lat_var);
    let lon_shape = shape_of(&lon_var);
    let lat_values = read_unpacked(&lat_var)?;
    let lon_values = read_unpacked(&lon_var)?;

    match (lat_shape.as_slice(), lon_shape.as_slice()) {
        (&[ny, nx], &[ny2, nx2]) if ny == ny2 && nx == nx2 => {
            let latitude = Array2::from_shape_vec((ny, nx), lat_values).map_err(|_| {
                TranscodeError::dimension_mismatch(&names.latitude, &lat_shape, &[ny * nx])
            })?;
            let longitude = Array2::from_shape_vec((ny, nx), lon_values).map_err(|_| {
                TranscodeError::dimension_mismatch(&names.longitude, &lon_shape, &[ny * nx])
            })?;
            CoordinateGrid::new(latitude, longitude)
        }
        (&[_], &[_]) => {
            debug!("Expanding 1-D latitude/longitude axes into a 2-D grid");
            Ok(CoordinateGrid::from_axes(&lat_values, &lon_values))
        }
        _ => Err(TranscodeError::shape_mismatch(
            &names.latitude,
            &lat_shape,
            &names.longitude,
            &lon_shape,
        )),
    }
}

fn read_time_axis(file: &netcdf::File, name: &str) -> TranscodeResult<TimeAxis> {
    let var = variable(file, name)?;
    let shape = shape_of(&var);
    if shape.len() != 1 {
        return Err(TranscodeError::dimension_mismatch(name, &[0], &shape));
    }
    let values: Vec<f64> = var.get_values::<f64, _>(..)?;
    let units = string_attribute(&var, "units")?;
    Ok(TimeAxis::new(values, units))
}

fn read_field(file: &netcdf::File, name: &str, kind: FieldKind) -> TranscodeResult<GriddedField> {
    let var = variable(file, name)?;
    let shape = shape_of(&var);
    let dims = match shape.as_slice() {
        &[t, y, x] => (t, y, x),
        &[y, x] => (1, y, x),
        _ => {
            return Err(TranscodeError::dimension_mismatch(name, &[0, 0, 0], &shape));
        }
    };
    let values: Vec<f32> = read_unpacked(&var)?.into_iter().map(|v| v as f32).collect();
    let data = Array3::from_shape_vec(dims, values)
        .map_err(|_| TranscodeError::dimension_mismatch(name, &[dims.0, dims.1, dims.2], &shape))?;
    let units = string_attribute(&var, "units")?;
    Ok(GriddedField::new(kind, units, data))
}

/// Reads a variable as `f64`, applying `_FillValue`, `scale_factor` and `add_offset`.
fn read_unpacked(var: &netcdf::Variable) -> TranscodeResult<Vec<f64>> {
    let mut values: Vec<f64> = var.get_values::<f64, _>(..)?;
    let fill = numeric_attribute(var, "_FillValue")?;
    let scale = numeric_attribute(var, "scale_factor")?.unwrap_or(1.0);
    let offset = numeric_attribute(var, "add_offset")?.unwrap_or(0.0);

    for value in values.iter_mut() {
        if fill.is_some_and(|f| *value == f) {
            *value = f64::NAN;
        } else {
            *value = *value * scale + offset;
        }
    }
    Ok(values)
}

/// Returns the value of a text attribute, or `None` when it is absent or not text.
pub fn string_attribute(var: &netcdf::Variable, name: &str) -> TranscodeResult<Option<String>> {
    match var.attribute(name) {
        Some(attr) => match attr.value()? {
            AttributeValue::Str(s) => Ok(Some(s)),
            other => {
                debug!("Ignoring non-text '{}' attribute on '{}': {:?}", name, var.name(), other);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

fn numeric_attribute(var: &netcdf::Variable, name: &str) -> TranscodeResult<Option<f64>> {
    let Some(attr) = var.attribute(name) else {
        return Ok(None);
    };
    let value = match attr.value()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Short(v) => Some(f64::from(v)),
        AttributeValue::Schar(v) => Some(f64::from(v)),
        AttributeValue::Uchar(v) => Some(f64::from(v)),
        AttributeValue::Ushort(v) => Some(f64::from(v)),
        AttributeValue::Uint(v) => Some(f64::from(v)),
        AttributeValue::Longlong(v) => Some(v as f64),
        AttributeValue::Ulonglong(v) => Some(v as f64),
        _ => None,
    };
    Ok(value)
}
