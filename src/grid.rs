//! # Grid Data Model
//!
//! In-memory representation of the gridded data flowing through the
//! transcoding pipeline:
//!
//! - [`CoordinateGrid`]: co-located 2-D latitude/longitude arrays (curvilinear grids allowed)
//! - [`GriddedField`]: a `(time, y, x)` array tagged with its physical meaning
//! - [`TimeAxis`]: timestamps plus their (optional) units string, passed through untouched
//! - [`BoundingBox`]: geographic region of interest
//! - [`IndexRectangle`]: half-open rectangle in grid-index space

use crate::error::{TranscodeError, TranscodeResult};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical meaning of a gridded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    WindSpeed,
    WindDirection,
    EastwardWind,
    NorthwardWind,
}

impl FieldKind {
    /// CF standard name for this kind of field.
    pub fn standard_name(&self) -> &'static str {
        match self {
            FieldKind::WindSpeed => "wind_speed",
            FieldKind::WindDirection => "wind_from_direction",
            FieldKind::EastwardWind => "x_wind",
            FieldKind::NorthwardWind => "y_wind",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FieldKind::WindSpeed => "wind speed",
            FieldKind::WindDirection => "wind direction",
            FieldKind::EastwardWind => "eastward wind",
            FieldKind::NorthwardWind => "northward wind",
        };
        f.write_str(label)
    }
}

/// A `(time, y, x)` field of single precision values.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedField {
    pub kind: FieldKind,
    pub units: Option<String>,
    pub standard_name: String,
    pub data: Array3<f32>,
}

impl GriddedField {
    pub fn new(kind: FieldKind, units: Option<String>, data: Array3<f32>) -> Self {
        GriddedField {
            kind,
            units,
            standard_name: kind.standard_name().to_string(),
            data,
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        let (t, y, x) = self.data.dim();
        [t, y, x]
    }

    pub fn time_len(&self) -> usize {
        self.data.dim().0
    }

    /// The `(y, x)` extent shared with the coordinate grid.
    pub fn spatial_shape(&self) -> (usize, usize) {
        let (_, y, x) = self.data.dim();
        (y, x)
    }
}

/// Co-located 2-D latitude and longitude arrays, in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateGrid {
    latitude: Array2<f64>,
    longitude: Array2<f64>,
}

impl CoordinateGrid {
    pub fn new(latitude: Array2<f64>, longitude: Array2<f64>) -> TranscodeResult<Self> {
        if latitude.dim() != longitude.dim() {
            return Err(TranscodeError::shape_mismatch(
                "latitude",
                latitude.shape(),
                "longitude",
                longitude.shape(),
            ));
        }
        Ok(CoordinateGrid {
            latitude,
            longitude,
        })
    }

    /// Builds a 2-D mesh from the 1-D axes of a regular lat/lon grid.
    pub fn from_axes(latitudes: &[f64], longitudes: &[f64]) -> Self {
        let shape = (latitudes.len(), longitudes.len());
        let latitude = Array2::from_shape_fn(shape, |(y, _)| latitudes[y]);
        let longitude = Array2::from_shape_fn(shape, |(_, x)| longitudes[x]);
        CoordinateGrid {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> &Array2<f64> {
        &self.latitude
    }

    pub fn longitude(&self) -> &Array2<f64> {
        &self.longitude
    }

    /// `(y, x)` extent of the grid.
    pub fn shape(&self) -> (usize, usize) {
        self.latitude.dim()
    }
}

/// Ordered timestamps and the units describing their epoch/calendar.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeAxis {
    pub values: Vec<f64>,
    pub units: Option<String>,
}

impl TimeAxis {
    pub fn new(values: Vec<f64>, units: Option<String>) -> Self {
        TimeAxis { values, units }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Geographic region of interest. Membership is inclusive on all edges.
///
/// # Examples
///
/// ```rust
/// use nc2drift::grid::BoundingBox;
///
/// let baltic = BoundingBox::new(9.5, 30.5, 53.5, 61.0)?;
/// assert!(baltic.contains(20.0, 55.0));
/// assert!(!baltic.contains(5.0, 55.0));
/// # Ok::<(), nc2drift::error::TranscodeError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> TranscodeResult<Self> {
        let bbox = BoundingBox {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    pub fn validate(&self) -> TranscodeResult<()> {
        let values = [self.lon_min, self.lon_max, self.lat_min, self.lat_max];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(TranscodeError::InvalidBoundingBox(format!(
                "{} contains non-finite values",
                self
            )));
        }
        if self.lon_min > self.lon_max {
            return Err(TranscodeError::InvalidBoundingBox(format!(
                "lon_min {} is greater than lon_max {}",
                self.lon_min, self.lon_max
            )));
        }
        if self.lat_min > self.lat_max {
            return Err(TranscodeError::InvalidBoundingBox(format!(
                "lat_min {} is greater than lat_max {}",
                self.lat_min, self.lat_max
            )));
        }
        Ok(())
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lon [{}, {}] lat [{}, {}]",
            self.lon_min, self.lon_max, self.lat_min, self.lat_max
        )
    }
}

/// Half-open rectangle `[y_start, y_end) x [x_start, x_end)` in grid indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRectangle {
    pub y_start: usize,
    pub y_end: usize,
    pub x_start: usize,
    pub x_end: usize,
}

impl IndexRectangle {
    pub fn height(&self) -> usize {
        self.y_end - self.y_start
    }

    pub fn width(&self) -> usize {
        self.x_end - self.x_start
    }

    pub fn contains(&self, y: usize, x: usize) -> bool {
        (self.y_start..self.y_end).contains(&y) && (self.x_start..self.x_end).contains(&x)
    }
}

impl fmt::Display for IndexRectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "y {}..{}, x {}..{}",
            self.y_start, self.y_end, self.x_start, self.x_end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_bounding_box_rejects_inverted_axes() {
        assert!(BoundingBox::new(10.0, 5.0, 50.0, 60.0).is_err());
        assert!(BoundingBox::new(5.0, 10.0, 60.0, 50.0).is_err());
        assert!(BoundingBox::new(5.0, 10.0, f64::NAN, 50.0).is_err());
        assert!(BoundingBox::new(5.0, 5.0, 50.0, 50.0).is_ok());
    }

    #[test]
    fn test_bounding_box_edges_are_inclusive() {
        let bbox = BoundingBox::new(10.0, 20.0, 50.0, 60.0).unwrap();
        assert!(bbox.contains(10.0, 50.0));
        assert!(bbox.contains(20.0, 60.0));
        assert!(!bbox.contains(20.0001, 60.0));
        assert!(!bbox.contains(f64::NAN, 55.0));
    }

    #[test]
    fn test_coordinate_grid_shape_mismatch() {
        let lat = array![[50.0, 50.0], [55.0, 55.0]];
        let lon = array![[10.0, 20.0, 30.0]];
        let err = CoordinateGrid::new(lat, lon).unwrap_err();
        assert!(matches!(err, TranscodeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_coordinate_grid_from_axes() {
        let grid = CoordinateGrid::from_axes(&[50.0, 55.0], &[10.0, 20.0, 30.0]);
        assert_eq!(grid.shape(), (2, 3));
        assert_eq!(grid.latitude()[[1, 2]], 55.0);
        assert_eq!(grid.longitude()[[1, 2]], 30.0);
    }

    #[test]
    fn test_index_rectangle_extent() {
        let rect = IndexRectangle {
            y_start: 1,
            y_end: 3,
            x_start: 0,
            x_end: 4,
        };
        assert_eq!(rect.height(), 2);
        assert_eq!(rect.width(), 4);
        assert!(rect.contains(2, 3));
        assert!(!rect.contains(3, 3));
    }

    #[test]
    fn test_field_kind_standard_names() {
        let field = GriddedField::new(
            FieldKind::EastwardWind,
            Some("m s-1".to_string()),
            Array3::zeros((1, 1, 1)),
        );
        assert_eq!(field.standard_name, "x_wind");
        assert_eq!(FieldKind::WindDirection.standard_name(), "wind_from_direction");
    }
}
