//! Geometry and unit types for tracking vehicles along road routes. Everything here works directly
//! on WGS-84 longitude/latitude; there's no projection into a local world-space.

mod distance;
mod duration;
mod error;
mod gps;
mod line;
mod polyline;
mod speed;
mod time;

pub use crate::distance::Distance;
pub use crate::duration::Duration;
pub use crate::error::InvalidGeometry;
pub use crate::gps::LonLat;
pub use crate::line::Line;
pub use crate::polyline::{PolyLine, Projection, SegmentTable};
pub use crate::speed::Speed;
pub use crate::time::Time;

/// Reduce the precision of an f64. This helps ensure serialization is idempotent (everything is
/// exactly the same before and after saving/loading). Ideally we'd use some kind of proper
/// fixed-precision type instead of f64.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
