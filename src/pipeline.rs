//! # Transcoding Pipeline
//!
//! In-memory composition of subsetting and vector conversion. Works on a
//! [`SourceDataset`] so it can be exercised without touching the filesystem;
//! [`crate::process_transcode_job`] wraps it with file I/O.

use crate::error::{TranscodeError, TranscodeResult};
use crate::grid::{BoundingBox, CoordinateGrid, GriddedField, IndexRectangle, TimeAxis};
use crate::reader::SourceDataset;
use crate::subset::{compute_index_rectangle, slice_field, slice_grid};
use crate::wind::to_components;
use log::debug;

/// Subsetted, converted data ready for the writer.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodedDataset {
    pub rectangle: IndexRectangle,
    pub grid: CoordinateGrid,
    pub eastward: GriddedField,
    pub northward: GriddedField,
    pub time: TimeAxis,
}

impl TranscodedDataset {
    /// `(time, y, x)` shape of the component fields.
    pub fn shape(&self) -> [usize; 3] {
        self.eastward.shape()
    }
}

/// Subsets `source` to `bbox` and converts speed/direction to u/v.
///
/// # Errors
///
/// Propagates [`TranscodeError::EmptyRegion`], [`TranscodeError::ShapeMismatch`]
/// and [`TranscodeError::DimensionMismatch`] from the individual stages.
pub fn transcode(source: &SourceDataset, bbox: &BoundingBox) -> TranscodeResult<TranscodedDataset> {
    bbox.validate()?;
    let rectangle = compute_index_rectangle(&source.grid, bbox)?;

    let grid = slice_grid(&source.grid, &rectangle)?;
    let speed = slice_field(&source.speed, &rectangle)?;
    let direction = slice_field(&source.direction, &rectangle)?;
    let (eastward, northward) = to_components(&speed, &direction)?;

    debug!(
        "Transcoded {} time steps on a {}x{} subgrid",
        source.time.len(),
        rectangle.height(),
        rectangle.width()
    );

    Ok(TranscodedDataset {
        rectangle,
        grid,
        eastward,
        northward,
        time: source.time.clone(),
    })
}

/// Checks the unit string of `field` against an expected value.
///
/// # Errors
///
/// - [`TranscodeError::MissingAttribute`] if the field has no units
/// - [`TranscodeError::UnitMismatch`] if the units differ
pub fn ensure_units(variable: &str, field: &GriddedField, expected: &str) -> TranscodeResult<()> {
    match field.units.as_deref() {
        None => Err(TranscodeError::MissingAttribute {
            variable: variable.to_string(),
            attribute: "units".to_string(),
        }),
        Some(found) if normalize_units(found) == normalize_units(expected) => Ok(()),
        Some(found) => Err(TranscodeError::UnitMismatch {
            variable: variable.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }),
    }
}

// "m/s", "m s-1" and "m s**-1" all spell the same unit.
fn normalize_units(units: &str) -> String {
    units
        .trim()
        .replace("**", "")
        .replace('/', " ")
        .split_whitespace()
        .map(|part| {
            if units.contains('/') && part == "s" {
                "s-1".to_string()
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
