//! Geographic projection seam.
//!
//! The production map uses an external composite projection; core only needs
//! "lon/lat -> planar point, or nothing when off-map". Two simple projectors
//! are provided for pre-projected data and for hosts without their own.

use crate::model::school::PlanarPoint;

/// Maps longitude/latitude (degrees) to planar plot coordinates.
///
/// Returns `None` when the position lies outside the projectable region.
pub trait GeoProjector {
    fn project(&self, longitude: f64, latitude: f64) -> Option<PlanarPoint>;
}

impl<F> GeoProjector for F
where
    F: Fn(f64, f64) -> Option<PlanarPoint>,
{
    fn project(&self, longitude: f64, latitude: f64) -> Option<PlanarPoint> {
        self(longitude, latitude)
    }
}

/// Treats longitude/latitude as already-projected `x`/`y`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProjector;

impl GeoProjector for IdentityProjector {
    fn project(&self, longitude: f64, latitude: f64) -> Option<PlanarPoint> {
        Some(PlanarPoint::new(longitude, latitude))
    }
}

/// Longitude/latitude bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBounds {
    /// Contiguous United States (lower 48).
    pub const CONTIGUOUS_US: GeoBounds = GeoBounds {
        west: -125.0,
        south: 24.0,
        east: -66.5,
        north: 49.5,
    };

    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        (self.west..=self.east).contains(&longitude)
            && (self.south..=self.north).contains(&latitude)
    }
}

/// Plate carrée projection of `bounds` onto a `width` x `height` plot, north up.
///
/// Positions outside `bounds` are unprojectable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquirectangularProjector {
    bounds: GeoBounds,
    width: f64,
    height: f64,
}

impl EquirectangularProjector {
    pub fn new(bounds: GeoBounds, width: f64, height: f64) -> Self {
        Self {
            bounds,
            width,
            height,
        }
    }

    pub fn contiguous_us(width: f64, height: f64) -> Self {
        Self::new(GeoBounds::CONTIGUOUS_US, width, height)
    }
}

impl GeoProjector for EquirectangularProjector {
    fn project(&self, longitude: f64, latitude: f64) -> Option<PlanarPoint> {
        if !self.bounds.contains(longitude, latitude) {
            return None;
        }
        let span_x = self.bounds.east - self.bounds.west;
        let span_y = self.bounds.north - self.bounds.south;
        if span_x <= 0.0 || span_y <= 0.0 {
            return None;
        }

        let x = (longitude - self.bounds.west) / span_x * self.width;
        let y = (self.bounds.north - latitude) / span_y * self.height;
        Some(PlanarPoint::new(x, y))
    }
}
