use std::{cmp, fmt, ops};

use serde::{Deserialize, Serialize};

use crate::{trim_f64, Distance, Speed};

/// A duration, in seconds. Can be negative.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Duration(f64);

// By construction, Duration is a finite f64 with trimmed precision.
impl Eq for Duration {}

#[allow(clippy::derive_ord_xor_partial_ord)] // false positive
impl Ord for Duration {
    fn cmp(&self, other: &Duration) -> cmp::Ordering {
        self.partial_cmp(other).unwrap()
    }
}

impl Duration {
    pub const ZERO: Duration = Duration::const_seconds(0.0);
    pub const EPSILON: Duration = Duration::const_seconds(0.0001);

    /// Creates a duration in seconds.
    pub fn seconds(value: f64) -> Duration {
        if !value.is_finite() {
            panic!("Bad Duration {}", value);
        }

        Duration(trim_f64(value))
    }

    /// Creates a duration in milliseconds. Live feeds and animation clocks mostly speak in these.
    pub fn milliseconds(value: f64) -> Duration {
        Duration::seconds(value / 1000.0)
    }

    pub const fn const_seconds(value: f64) -> Duration {
        Duration(value)
    }

    /// Interprets a raw number of milliseconds from some external source. Returns `None` if the
    /// value can't possibly represent a duration, including values so large that trimming them
    /// overflows.
    pub fn parse_milliseconds(value: f64) -> Option<Duration> {
        if (value / 1000.0 * 10_000.0).is_finite() {
            Some(Duration::milliseconds(value))
        } else {
            None
        }
    }

    /// Returns the duration in seconds. Prefer working in typesafe `Duration`s.
    pub fn inner_seconds(self) -> f64 {
        self.0
    }

    pub fn inner_milliseconds(self) -> f64 {
        self.0 * 1000.0
    }

    /// Splits the duration into (hours, minutes, seconds).
    fn get_parts(self) -> (usize, usize, usize) {
        // Force positive
        let mut remainder = self.inner_seconds().abs();
        let hours = (remainder / 3600.0).floor();
        remainder -= hours * 3600.0;
        let minutes = (remainder / 60.0).floor();
        remainder -= minutes * 60.0;
        let seconds = remainder.floor();

        (hours as usize, minutes as usize, seconds as usize)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (hours, minutes, seconds) = self.get_parts();
        if self.0 < 0.0 {
            write!(f, "-")?;
        }
        if hours != 0 {
            write!(f, "{}hr ", hours)?;
        }
        if hours != 0 || minutes != 0 {
            write!(f, "{}min ", minutes)?;
        }
        write!(f, "{}s", seconds)
    }
}

impl ops::Add for Duration {
    type Output = Duration;

    fn add(self, other: Duration) -> Duration {
        Duration::seconds(self.0 + other.0)
    }
}

impl ops::AddAssign for Duration {
    fn add_assign(&mut self, other: Duration) {
        *self = *self + other;
    }
}

impl ops::Sub for Duration {
    type Output = Duration;

    fn sub(self, other: Duration) -> Duration {
        Duration::seconds(self.0 - other.0)
    }
}

impl ops::Mul<f64> for Duration {
    type Output = Duration;

    fn mul(self, other: f64) -> Duration {
        Duration::seconds(self.0 * other)
    }
}

impl ops::Mul<Duration> for f64 {
    type Output = Duration;

    fn mul(self, other: Duration) -> Duration {
        Duration::seconds(self * other.0)
    }
}

impl ops::Mul<Speed> for Duration {
    type Output = Distance;

    fn mul(self, other: Speed) -> Distance {
        Distance::meters(self.0 * other.inner_meters_per_second())
    }
}

impl ops::Div<Duration> for Duration {
    type Output = f64;

    fn div(self, other: Duration) -> f64 {
        if other.0 == 0.0 {
            panic!("Can't divide {} / {}", self, other);
        }
        self.0 / other.0
    }
}

impl ops::Div<f64> for Duration {
    type Output = Duration;

    fn div(self, other: f64) -> Duration {
        if other == 0.0 {
            panic!("Can't divide {} / {}", self, other);
        }
        Duration::seconds(self.0 / other)
    }
}

impl Default for Duration {
    fn default() -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milliseconds() {
        assert_eq!(Duration::milliseconds(1500.0), Duration::seconds(1.5));
        assert_eq!(Duration::seconds(60.0).inner_milliseconds(), 60_000.0);
        assert!(Duration::parse_milliseconds(f64::NAN).is_none());
        assert!(Duration::parse_milliseconds(f64::INFINITY).is_none());
        assert!(Duration::parse_milliseconds(1e308).is_none());
        assert!(Duration::parse_milliseconds(1e306).is_some());
        assert_eq!(
            Duration::parse_milliseconds(-20.0),
            Some(Duration::seconds(-0.02))
        );
    }

    #[test]
    fn display() {
        assert_eq!(Duration::seconds(12.3).to_string(), "12s");
        assert_eq!(Duration::seconds(75.0).to_string(), "1min 15s");
        assert_eq!(Duration::seconds(3723.0).to_string(), "1hr 2min 3s");
        assert_eq!(Duration::seconds(-5.0).to_string(), "-5s");
    }
}
