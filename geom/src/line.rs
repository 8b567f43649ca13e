use serde::{Deserialize, Serialize};

use crate::{Distance, LonLat};

/// A line segment between two GPS points. Unlike `PolyLine`, the endpoints may be equal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(LonLat, LonLat);

impl Line {
    pub fn new(pt1: LonLat, pt2: LonLat) -> Line {
        Line(pt1, pt2)
    }

    pub fn pt1(&self) -> LonLat {
        self.0
    }

    pub fn pt2(&self) -> LonLat {
        self.1
    }

    /// Great-circle length.
    pub fn length(&self) -> Distance {
        self.0.gps_dist(self.1)
    }

    /// Interpolates along the segment in raw lon/lat, with `percent` clamped to [0, 1]. The ends
    /// are returned exactly.
    pub fn percent_along(&self, percent: f64) -> LonLat {
        if percent <= 0.0 {
            self.0
        } else if percent >= 1.0 {
            self.1
        } else {
            self.0.lerp(self.1, percent)
        }
    }

    /// Where along this segment is the point closest to `pt`, as a percent in [0, 1]? Treats
    /// lon/lat as a flat plane, which is fine at city scale. A segment with equal endpoints
    /// always returns 0.
    pub fn project_percent(&self, pt: LonLat) -> f64 {
        let dx = self.1.x() - self.0.x();
        let dy = self.1.y() - self.0.y();
        let len_squared = dx * dx + dy * dy;
        if len_squared == 0.0 {
            return 0.0;
        }
        let pct = ((pt.x() - self.0.x()) * dx + (pt.y() - self.0.y()) * dy) / len_squared;
        pct.clamp(0.0, 1.0)
    }

    /// The point on this segment closest to `pt`.
    pub fn project_pt(&self, pt: LonLat) -> LonLat {
        self.percent_along(self.project_percent(pt))
    }
}
