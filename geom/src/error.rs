use std::{error, fmt};

/// Route geometry that can't be animated along: too few points, coordinates that aren't finite
/// numbers, or a polyline with no length at all. Usually travels inside an `anyhow::Error`; use
/// `downcast_ref::<InvalidGeometry>()` to tell it apart from other failures.
#[derive(Clone, Debug, PartialEq)]
pub struct InvalidGeometry {
    message: String,
}

impl InvalidGeometry {
    pub fn new<S: Into<String>>(message: S) -> InvalidGeometry {
        InvalidGeometry {
            message: message.into(),
        }
    }
}

impl fmt::Display for InvalidGeometry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid geometry: {}", self.message)
    }
}

impl error::Error for InvalidGeometry {}
