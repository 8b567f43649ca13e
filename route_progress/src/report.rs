use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use geom::{InvalidGeometry, LonLat, PolyLine, Time};

use crate::DurationHint;

/// One update about a unit, as delivered by the initial poll or the live stream. Every field is
/// optional; a report might only change a unit's status.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    /// The road route the unit is following, usually straight from a directions service
    pub route: Option<RouteGeometry>,
    /// When the unit is expected to arrive. Timestamps without a timezone are taken as UTC, which
    /// is how the backend stores them.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub eta: Option<DateTime<Utc>>,
    /// Time remaining until arrival. Wins over `eta` when both are present.
    pub eta_ms: Option<f64>,
    pub speed_kmh: Option<f64>,
    /// Free text, like "enroute", "arrived", or "idle"
    pub status: Option<String>,
    pub unit_name: Option<String>,
    pub incident_id: Option<String>,
    pub target_lon: Option<f64>,
    pub target_lat: Option<f64>,
}

/// Route geometry, either as bare `[[lon, lat], ...]` pairs or a GeoJSON LineString. The backend
/// keeps routes in a text column, so either form might also show up encoded as a JSON string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteGeometry {
    Coordinates(Vec<Vec<f64>>),
    GeoJson(geojson::Geometry),
    Encoded(String),
}

impl RouteGeometry {
    pub fn from_polyline(pl: &PolyLine) -> RouteGeometry {
        RouteGeometry::Coordinates(pl.points().iter().map(|pt| pt.to_position()).collect())
    }

    pub fn to_polyline(&self) -> Result<PolyLine> {
        match self {
            RouteGeometry::Coordinates(positions) => PolyLine::from_positions(positions),
            RouteGeometry::GeoJson(geometry) => PolyLine::from_geojson(geometry),
            RouteGeometry::Encoded(raw) => match serde_json::from_str(raw) {
                Ok(RouteGeometry::Encoded(_)) => {
                    Err(InvalidGeometry::new(format!("route is JSON encoded twice: {}", raw)).into())
                }
                Ok(decoded) => decoded.to_polyline(),
                Err(err) => {
                    Err(InvalidGeometry::new(format!("can't parse route {}: {}", raw, err)).into())
                }
            },
        }
    }
}

impl PositionReport {
    /// Where the unit is, if the report says so with usable numbers.
    pub fn position(&self) -> Option<LonLat> {
        LonLat::checked(self.lon?, self.lat?).ok()
    }

    /// Where the unit is headed, if the report says so with usable numbers.
    pub fn target(&self) -> Option<LonLat> {
        LonLat::checked(self.target_lon?, self.target_lat?).ok()
    }

    /// How long until arrival, according to the server, as of `now`.
    pub fn duration_hint(&self, now: Time) -> Option<DurationHint> {
        if let Some(ms) = self.eta_ms {
            return Some(DurationHint::milliseconds(ms));
        }
        let eta = self.eta?;
        Some(DurationHint::milliseconds(
            eta.timestamp_millis() as f64 - now.inner_milliseconds(),
        ))
    }
}

/// Converts a chrono timestamp into the engine's clock.
pub fn to_time(dt: DateTime<Utc>) -> Time {
    Time::milliseconds_since_epoch(dt.timestamp_millis() as f64)
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = <Option<String>>::deserialize(d)?;
    match raw {
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|err| anyhow!("bad timestamp {}: {}", raw, err))?;
    Ok(Utc.from_utc_datetime(&naive))
}
