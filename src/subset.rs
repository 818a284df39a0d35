//! # Grid Subsetting
//!
//! Reduces a (possibly curvilinear) coordinate grid to the smallest index
//! rectangle covering every cell inside a [`BoundingBox`], and slices
//! co-located grids and fields by that rectangle.
//!
//! The membership test is evaluated per cell, so grids whose lines do not
//! follow meridians and parallels are handled the same way as regular ones.

use crate::error::{TranscodeError, TranscodeResult};
use crate::grid::{BoundingBox, CoordinateGrid, GriddedField, IndexRectangle};
use log::debug;
use ndarray::{Array1, Array2, Axis, Zip, s};

/// Per-cell membership mask: `true` where the cell lies inside `bbox`.
pub fn membership_mask(grid: &CoordinateGrid, bbox: &BoundingBox) -> Array2<bool> {
    Zip::from(grid.latitude())
        .and(grid.longitude())
        .map_collect(|&lat, &lon| bbox.contains(lon, lat))
}

/// Computes the minimal index rectangle containing every member cell.
///
/// The mask is OR-reduced along each axis; the rectangle spans from the
/// first to the last `true` entry of each reduced vector, end-exclusive.
///
/// # Errors
///
/// Returns [`TranscodeError::EmptyRegion`] when no cell lies inside the box.
///
/// # Examples
///
/// ```rust
/// use nc2drift::grid::{BoundingBox, CoordinateGrid};
/// use nc2drift::subset::compute_index_rectangle;
///
/// let grid = CoordinateGrid::from_axes(&[50.0, 55.0, 60.0], &[10.0, 20.0, 30.0]);
/// let bbox = BoundingBox::new(15.0, 25.0, 52.0, 58.0)?;
/// let rect = compute_index_rectangle(&grid, &bbox)?;
/// assert_eq!((rect.height(), rect.width()), (1, 1));
/// # Ok::<(), nc2drift::error::TranscodeError>(())
/// ```
pub fn compute_index_rectangle(
    grid: &CoordinateGrid,
    bbox: &BoundingBox,
) -> TranscodeResult<IndexRectangle> {
    let mask = membership_mask(grid, bbox);

    let rows: Array1<bool> = mask.map_axis(Axis(1), |row| row.iter().any(|&m| m));
    let cols: Array1<bool> = mask.map_axis(Axis(0), |col| col.iter().any(|&m| m));

    let (y_start, y_last) = first_and_last(&rows).ok_or_else(|| {
        TranscodeError::EmptyRegion(format!(
            "{} does not intersect a grid of {}x{} cells",
            bbox,
            grid.shape().0,
            grid.shape().1
        ))
    })?;
    // Non-empty rows imply non-empty columns.
    let (x_start, x_last) = first_and_last(&cols)
        .ok_or_else(|| TranscodeError::EmptyRegion(bbox.to_string()))?;

    let rect = IndexRectangle {
        y_start,
        y_end: y_last + 1,
        x_start,
        x_end: x_last + 1,
    };
    debug!(
        "Bounding box {} -> index rectangle {} ({} member cells)",
        bbox,
        rect,
        mask.iter().filter(|&&m| m).count()
    );
    Ok(rect)
}

fn first_and_last(flags: &Array1<bool>) -> Option<(usize, usize)> {
    let first = flags.iter().position(|&f| f)?;
    let last = flags.iter().rposition(|&f| f)?;
    Some((first, last))
}

fn check_fits(variable: &str, rect: &IndexRectangle, shape: (usize, usize)) -> TranscodeResult<()> {
    if rect.y_start >= rect.y_end
        || rect.x_start >= rect.x_end
        || rect.y_end > shape.0
        || rect.x_end > shape.1
    {
        return Err(TranscodeError::dimension_mismatch(
            variable,
            &[shape.0, shape.1],
            &[rect.y_end, rect.x_end],
        ));
    }
    Ok(())
}

/// Slices both coordinate arrays by `rect`.
pub fn slice_grid(grid: &CoordinateGrid, rect: &IndexRectangle) -> TranscodeResult<CoordinateGrid> {
    check_fits("latitude/longitude", rect, grid.shape())?;
    let window = s![rect.y_start..rect.y_end, rect.x_start..rect.x_end];
    CoordinateGrid::new(
        grid.latitude().slice(&window).to_owned(),
        grid.longitude().slice(&window).to_owned(),
    )
}

/// Slices the spatial axes of `field` by `rect`; the time axis is kept whole.
pub fn slice_field(field: &GriddedField, rect: &IndexRectangle) -> TranscodeResult<GriddedField> {
    check_fits(&field.kind.to_string(), rect, field.spatial_shape())?;
    let data = field
        .data
        .slice(s![.., rect.y_start..rect.y_end, rect.x_start..rect.x_end])
        .to_owned();
    Ok(GriddedField {
        kind: field.kind,
        units: field.units.clone(),
        standard_name: field.standard_name.clone(),
        data,
    })
}
