//! # Wind Vector Conversion
//!
//! Converts wind speed and meteorological direction (the compass bearing
//! the wind blows *from*, 0° = north, clockwise) into eastward/northward
//! velocity components.
//!
//! The direction is rotated by 180° before resolving, so a northerly wind
//! (`direction = 0°`) yields a southward vector:
//!
//! ```text
//! θ = deg2rad(direction + 180)
//! u = speed · sin θ
//! v = speed · cos θ
//! ```

use crate::error::{TranscodeError, TranscodeResult};
use crate::grid::{FieldKind, GriddedField};
use log::warn;
use ndarray::{Array3, Zip};

/// Resolves a single speed/direction pair into `(eastward, northward)`.
///
/// # Examples
///
/// ```rust
/// use nc2drift::wind::components;
///
/// let (u, v) = components(10.0, 270.0); // westerly wind blows east
/// assert!((u - 10.0).abs() < 1e-9);
/// assert!(v.abs() < 1e-9);
/// ```
pub fn components(speed: f64, direction_deg: f64) -> (f64, f64) {
    let theta = (direction_deg + 180.0).to_radians();
    (speed * theta.sin(), speed * theta.cos())
}

/// Magnitude of a `(u, v)` vector.
pub fn speed(u: f64, v: f64) -> f64 {
    u.hypot(v)
}

/// Meteorological bearing the wind blows from, in `[0, 360)`.
pub fn direction_from(u: f64, v: f64) -> f64 {
    let bearing = (-u).atan2(-v).to_degrees();
    bearing.rem_euclid(360.0)
}

/// Converts co-located speed and direction fields into `x_wind`/`y_wind` fields.
///
/// Output fields inherit the unit of `speed`; no unit conversion is done.
/// Negative speeds are accepted and produce a direction-flipped vector.
///
/// # Errors
///
/// Returns [`TranscodeError::ShapeMismatch`] when the two fields differ in shape.
pub fn to_components(
    speed: &GriddedField,
    direction: &GriddedField,
) -> TranscodeResult<(GriddedField, GriddedField)> {
    if speed.shape() != direction.shape() {
        return Err(TranscodeError::shape_mismatch(
            &speed.kind.to_string(),
            &speed.shape(),
            &direction.kind.to_string(),
            &direction.shape(),
        ));
    }

    let negative = speed.data.iter().filter(|&&s| s < 0.0).count();
    if negative > 0 {
        warn!(
            "{} cells have negative wind speed; their vectors will point against the stated direction",
            negative
        );
    }

    let mut eastward = Array3::<f32>::zeros(speed.data.raw_dim());
    let mut northward = Array3::<f32>::zeros(speed.data.raw_dim());
    Zip::from(&mut eastward)
        .and(&mut northward)
        .and(&speed.data)
        .and(&direction.data)
        .for_each(|u, v, &s, &d| {
            let (east, north) = components(f64::from(s), f64::from(d));
            *u = east as f32;
            *v = north as f32;
        });

    Ok((
        GriddedField::new(FieldKind::EastwardWind, speed.units.clone(), eastward),
        GriddedField::new(FieldKind::NorthwardWind, speed.units.clone(), northward),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn field(kind: FieldKind, values: Vec<f32>, shape: (usize, usize, usize)) -> GriddedField {
        GriddedField::new(
            kind,
            Some("m s-1".to_string()),
            Array3::from_shape_vec(shape, values).unwrap(),
        )
    }

    #[test]
    fn test_known_vectors() {
        let (u, v) = components(10.0, 0.0);
        assert!(u.abs() < EPS && (v + 10.0).abs() < EPS);

        let (u, v) = components(10.0, 90.0);
        assert!((u + 10.0).abs() < EPS && v.abs() < EPS);

        let (u, v) = components(10.0, 180.0);
        assert!(u.abs() < EPS && (v - 10.0).abs() < EPS);

        let (u, v) = components(10.0, 270.0);
        assert!((u - 10.0).abs() < EPS && v.abs() < EPS);
    }

    #[test]
    fn test_magnitude_is_preserved() {
        for direction in (0..360).step_by(7) {
            for &s in &[0.0, 0.5, 3.25, 17.0, 42.0] {
                let (u, v) = components(s, direction as f64);
                assert!((speed(u, v) - s).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_direction_round_trip() {
        for direction in [0.0, 45.0, 90.0, 133.0, 270.0, 359.0] {
            let (u, v) = components(8.0, direction);
            let recovered = direction_from(u, v);
            let diff = (recovered - direction).abs();
            assert!(diff < 1e-6 || (360.0 - diff) < 1e-6, "{} vs {}", recovered, direction);
        }
    }

    #[test]
    fn test_field_conversion() {
        let speed = field(FieldKind::WindSpeed, vec![10.0, 10.0, 10.0, 5.0], (2, 1, 2));
        let direction = field(
            FieldKind::WindDirection,
            vec![0.0, 90.0, 270.0, 180.0],
            (2, 1, 2),
        );
        let (u, v) = to_components(&speed, &direction).unwrap();

        assert_eq!(u.kind, FieldKind::EastwardWind);
        assert_eq!(v.standard_name, "y_wind");
        assert_eq!(u.units.as_deref(), Some("m s-1"));
        assert_eq!(u.shape(), [2, 1, 2]);

        assert!((v.data[[0, 0, 0]] + 10.0).abs() < 1e-5);
        assert!((u.data[[0, 0, 1]] + 10.0).abs() < 1e-5);
        assert!((u.data[[1, 0, 0]] - 10.0).abs() < 1e-5);
        assert!((v.data[[1, 0, 1]] - 5.0).abs() < 1e-5);

        for ((&s, &east), &north) in speed.data.iter().zip(u.data.iter()).zip(v.data.iter()) {
            let magnitude = (east * east + north * north).sqrt();
            assert!((magnitude - s).abs() < 1e-4);
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let speed = field(FieldKind::WindSpeed, vec![1.0; 4], (1, 2, 2));
        let direction = field(FieldKind::WindDirection, vec![0.0; 6], (1, 2, 3));
        let err = to_components(&speed, &direction).unwrap_err();
        assert!(matches!(err, TranscodeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_negative_speed_flips_vector() {
        let speed = field(FieldKind::WindSpeed, vec![-10.0], (1, 1, 1));
        let direction = field(FieldKind::WindDirection, vec![0.0], (1, 1, 1));
        let (u, v) = to_components(&speed, &direction).unwrap();
        assert!(u.data[[0, 0, 0]].abs() < 1e-5);
        assert!((v.data[[0, 0, 0]] - 10.0).abs() < 1e-5);
    }
}
