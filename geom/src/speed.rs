use std::{cmp, fmt, ops};

use serde::{Deserialize, Serialize};

use crate::{trim_f64, Distance, Duration};

/// In meters per second. Can be negative.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Speed(f64);

// By construction, Speed is a finite f64 with trimmed precision.
impl Eq for Speed {}

#[allow(clippy::derive_ord_xor_partial_ord)] // false positive
impl Ord for Speed {
    fn cmp(&self, other: &Speed) -> cmp::Ordering {
        self.partial_cmp(other).unwrap()
    }
}

impl Speed {
    pub const ZERO: Speed = Speed::const_meters_per_second(0.0);

    pub fn meters_per_second(value: f64) -> Speed {
        if !value.is_finite() {
            panic!("Bad Speed {}", value);
        }

        Speed(trim_f64(value))
    }

    pub const fn const_meters_per_second(value: f64) -> Speed {
        Speed(value)
    }

    pub fn km_per_hour(value: f64) -> Speed {
        Speed::meters_per_second(value * 1000.0 / 3600.0)
    }

    /// Interprets a raw km/h figure from a position report. Only positive, finite values make
    /// sense as a travel speed. Anything that rounds down to standing still is rejected too.
    pub fn parse_km_per_hour(value: f64) -> Option<Speed> {
        if !(value * 1000.0).is_finite() || value <= 0.0 {
            return None;
        }
        let speed = Speed::km_per_hour(value);
        if speed > Speed::ZERO {
            Some(speed)
        } else {
            None
        }
    }

    pub fn inner_meters_per_second(self) -> f64 {
        self.0
    }

    pub fn to_km_per_hour(self) -> f64 {
        self.0 * 3.6
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} km/h", self.to_km_per_hour().round())
    }
}

impl ops::Mul<f64> for Speed {
    type Output = Speed;

    fn mul(self, scalar: f64) -> Speed {
        Speed::meters_per_second(self.0 * scalar)
    }
}

impl ops::Mul<Duration> for Speed {
    type Output = Distance;

    fn mul(self, other: Duration) -> Distance {
        Distance::meters(self.0 * other.inner_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn km_per_hour() {
        assert_eq!(Speed::km_per_hour(36.0), Speed::meters_per_second(10.0));
        assert_eq!(Speed::km_per_hour(72.0).to_string(), "72 km/h");
        assert!(Speed::parse_km_per_hour(0.0).is_none());
        assert!(Speed::parse_km_per_hour(-40.0).is_none());
        assert!(Speed::parse_km_per_hour(f64::NAN).is_none());
    }

    #[test]
    fn travel_time() {
        let speed = Speed::km_per_hour(36.0);
        assert_eq!(Distance::meters(1000.0) / speed, Duration::seconds(100.0));
        assert_eq!(speed * Duration::seconds(30.0), Distance::meters(300.0));
    }
}
