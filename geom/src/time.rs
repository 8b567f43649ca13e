use std::{cmp, fmt, ops};

use serde::{Deserialize, Serialize};

use crate::Duration;

/// A moment in wall-clock time, in milliseconds since some epoch chosen by the caller (usually the
/// Unix epoch). Unlike the other units, this isn't trimmed; realistic timestamps need all of f64's
/// precision.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Time(f64);

// By construction, Time is a finite f64.
impl Eq for Time {}

#[allow(clippy::derive_ord_xor_partial_ord)] // false positive
impl Ord for Time {
    fn cmp(&self, other: &Time) -> cmp::Ordering {
        self.partial_cmp(other).unwrap()
    }
}

impl Time {
    pub const EPOCH: Time = Time(0.0);

    pub fn milliseconds_since_epoch(value: f64) -> Time {
        if !value.is_finite() {
            panic!("Bad Time {}", value);
        }
        Time(value)
    }

    pub fn inner_milliseconds(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "t={}ms", self.0)
    }
}

impl ops::Add<Duration> for Time {
    type Output = Time;

    fn add(self, other: Duration) -> Time {
        Time::milliseconds_since_epoch(self.0 + other.inner_milliseconds())
    }
}

impl ops::AddAssign<Duration> for Time {
    fn add_assign(&mut self, other: Duration) {
        *self = *self + other;
    }
}

impl ops::Sub<Duration> for Time {
    type Output = Time;

    fn sub(self, other: Duration) -> Time {
        Time::milliseconds_since_epoch(self.0 - other.inner_milliseconds())
    }
}

impl ops::Sub for Time {
    type Output = Duration;

    fn sub(self, other: Time) -> Duration {
        Duration::milliseconds(self.0 - other.0)
    }
}
