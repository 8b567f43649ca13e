use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{Distance, InvalidGeometry};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// longitude is x, latitude is y
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct LonLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat {
            longitude: lon,
            latitude: lat,
        }
    }

    /// Like `new`, but rejects coordinates that aren't finite numbers.
    pub fn checked(lon: f64, lat: f64) -> Result<LonLat> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(InvalidGeometry::new(format!("bad coordinate ({}, {})", lon, lat)).into());
        }
        Ok(LonLat::new(lon, lat))
    }

    /// Parses a GeoJSON-style position, `[lon, lat]` with an optional ignored altitude.
    pub fn from_position(pos: &[f64]) -> Result<LonLat> {
        if pos.len() < 2 {
            return Err(InvalidGeometry::new(format!(
                "position {:?} needs a longitude and latitude",
                pos
            ))
            .into());
        }
        LonLat::checked(pos[0], pos[1])
    }

    pub fn x(&self) -> f64 {
        self.longitude
    }

    pub fn y(&self) -> f64 {
        self.latitude
    }

    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }

    /// Great-circle distance, using the haversine formula.
    pub fn gps_dist(self, other: LonLat) -> Distance {
        let lon1 = self.longitude.to_radians();
        let lon2 = other.longitude.to_radians();
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();

        let delta_lat = lat2 - lat1;
        let delta_lon = lon2 - lon1;

        // Rounding can push this a hair over 1 for antipodal points
        let a = ((delta_lat / 2.0).sin().powi(2)
            + (delta_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos())
        .min(1.0);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        Distance::meters(EARTH_RADIUS_METERS * c)
    }

    /// Linear interpolation in raw degrees. Fine at city scale, not across the antimeridian.
    pub fn lerp(self, other: LonLat, pct: f64) -> LonLat {
        LonLat::new(
            self.longitude + pct * (other.longitude - self.longitude),
            self.latitude + pct * (other.latitude - self.latitude),
        )
    }

    pub fn to_position(self) -> Vec<f64> {
        vec![self.longitude, self.latitude]
    }

    pub fn to_geojson(self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::Point(self.to_position()))
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LonLat({0}, {1})", self.longitude, self.latitude)
    }
}
