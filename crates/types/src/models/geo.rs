//! Geographic primitives shared by adapters and cache keys

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Mean earth radius used for great-circle distances
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Largest supported rounding precision (decimal places)
pub const MAX_COORDINATE_PRECISION: u32 = 6;

/// Validation errors for incoming coordinates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
	#[error("Coordinates are not finite numbers: ({lat}, {lng})")]
	NotFinite { lat: f64, lng: f64 },

	#[error("Coordinates ({lat}, {lng}) fall outside the {area} service area")]
	OutOfBounds { lat: f64, lng: f64, area: String },
}

/// A WGS84 latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
	pub lat: f64,
	pub lng: f64,
}

impl Coordinates {
	pub fn new(lat: f64, lng: f64) -> Self {
		Self { lat, lng }
	}

	pub fn is_finite(&self) -> bool {
		self.lat.is_finite() && self.lng.is_finite()
	}

	/// Great-circle distance to `other` using the haversine formula
	pub fn distance_km(&self, other: &Coordinates) -> f64 {
		let d_lat = (other.lat - self.lat).to_radians();
		let d_lng = (other.lng - self.lng).to_radians();
		let a = (d_lat / 2.0).sin().powi(2)
			+ self.lat.to_radians().cos()
				* other.lat.to_radians().cos()
				* (d_lng / 2.0).sin().powi(2);
		let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
		EARTH_RADIUS_KM * c
	}

	/// Snap to `precision` decimal places for cache keying
	pub fn round(&self, precision: u32) -> RoundedCoordinate {
		RoundedCoordinate::new(*self, precision)
	}
}

impl fmt::Display for Coordinates {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "({:.6}, {:.6})", self.lat, self.lng)
	}
}

/// Rectangular service area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
	pub name: String,
	pub north: f64,
	pub south: f64,
	pub east: f64,
	pub west: f64,
}

impl GeoBounds {
	/// Republic of South Africa, all nine provinces
	pub fn south_africa() -> Self {
		Self {
			name: "South Africa".to_string(),
			north: -22.0,
			south: -35.0,
			east: 33.0,
			west: 16.0,
		}
	}

	/// Bounds are usable when north lies above south and east lies right of west
	pub fn is_well_formed(&self) -> bool {
		self.north.is_finite()
			&& self.south.is_finite()
			&& self.east.is_finite()
			&& self.west.is_finite()
			&& self.north > self.south
			&& self.east > self.west
	}

	pub fn contains(&self, point: &Coordinates) -> bool {
		point.lat <= self.north
			&& point.lat >= self.south
			&& point.lng <= self.east
			&& point.lng >= self.west
	}

	/// Reject non-finite or out-of-area coordinates
	pub fn validate(&self, point: &Coordinates) -> Result<(), GeoError> {
		if !point.is_finite() {
			return Err(GeoError::NotFinite {
				lat: point.lat,
				lng: point.lng,
			});
		}
		if !self.contains(point) {
			return Err(GeoError::OutOfBounds {
				lat: point.lat,
				lng: point.lng,
				area: self.name.clone(),
			});
		}
		Ok(())
	}
}

impl Default for GeoBounds {
	fn default() -> Self {
		Self::south_africa()
	}
}

/// Coordinate snapped to a fixed number of decimal places.
///
/// Stored as scaled integers so that near-identical queries hash and compare
/// equal. Precision 3 groups points within roughly 110 m of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoundedCoordinate {
	lat_scaled: i64,
	lng_scaled: i64,
	precision: u32,
}

impl RoundedCoordinate {
	pub fn new(coordinates: Coordinates, precision: u32) -> Self {
		let precision = precision.min(MAX_COORDINATE_PRECISION);
		let scale = 10f64.powi(precision as i32);
		Self {
			lat_scaled: (coordinates.lat * scale).round() as i64,
			lng_scaled: (coordinates.lng * scale).round() as i64,
			precision,
		}
	}

	pub fn precision(&self) -> u32 {
		self.precision
	}

	pub fn lat(&self) -> f64 {
		self.lat_scaled as f64 / 10f64.powi(self.precision as i32)
	}

	pub fn lng(&self) -> f64 {
		self.lng_scaled as f64 / 10f64.powi(self.precision as i32)
	}
}

impl fmt::Display for RoundedCoordinate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let p = self.precision as usize;
		write!(f, "{:.p$},{:.p$}", self.lat(), self.lng(), p = p)
	}
}

/// Simple polygon (implicitly closed) used for infrastructure footprints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
	pub vertices: Vec<Coordinates>,
}

impl Polygon {
	pub fn new(vertices: Vec<Coordinates>) -> Self {
		Self { vertices }
	}

	/// Axis-aligned rectangle, handy for fixtures and coarse footprints
	pub fn rectangle(south: f64, west: f64, north: f64, east: f64) -> Self {
		Self::new(vec![
			Coordinates::new(south, west),
			Coordinates::new(north, west),
			Coordinates::new(north, east),
			Coordinates::new(south, east),
		])
	}

	/// Even-odd ray casting with longitude as x and latitude as y
	pub fn contains(&self, point: &Coordinates) -> bool {
		let n = self.vertices.len();
		if n < 3 {
			return false;
		}

		let mut inside = false;
		let mut j = n - 1;
		for i in 0..n {
			let vi = &self.vertices[i];
			let vj = &self.vertices[j];
			if (vi.lat > point.lat) != (vj.lat > point.lat) {
				let crossing = (vj.lng - vi.lng) * (point.lat - vi.lat) / (vj.lat - vi.lat) + vi.lng;
				if point.lng < crossing {
					inside = !inside;
				}
			}
			j = i;
		}
		inside
	}
}
