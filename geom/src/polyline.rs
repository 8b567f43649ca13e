use anyhow::Result;

use crate::{Distance, InvalidGeometry, Line, LonLat};

/// Per-segment great-circle lengths of a polyline, and the cumulative distance reached at each
/// vertex. This is what lets us go back and forth between "distance along the route" and an
/// actual position.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentTable {
    // lengths[i] is the segment from pts[i] to pts[i + 1]
    lengths: Vec<Distance>,
    // cumulative[i] is the distance from the start to pts[i]. Starts at 0, one entry per point.
    cumulative: Vec<Distance>,
}

impl SegmentTable {
    pub fn new(pts: &[LonLat]) -> Result<SegmentTable> {
        if pts.len() < 2 {
            return Err(InvalidGeometry::new(format!(
                "a route needs at least 2 points, but got {}",
                pts.len()
            ))
            .into());
        }
        if let Some(pt) = pts.iter().find(|pt| !pt.is_finite()) {
            return Err(InvalidGeometry::new(format!("route has a bad point {}", pt)).into());
        }

        let mut lengths = Vec::with_capacity(pts.len() - 1);
        let mut cumulative = Vec::with_capacity(pts.len());
        let mut so_far = Distance::ZERO;
        cumulative.push(so_far);
        for pair in pts.windows(2) {
            let len = pair[0].gps_dist(pair[1]);
            lengths.push(len);
            so_far += len;
            cumulative.push(so_far);
        }
        Ok(SegmentTable {
            lengths,
            cumulative,
        })
    }

    pub fn total(&self) -> Distance {
        // There's always at least one segment
        self.cumulative[self.cumulative.len() - 1]
    }

    pub fn num_segments(&self) -> usize {
        self.lengths.len()
    }

    pub fn segment_lengths(&self) -> &[Distance] {
        &self.lengths
    }

    pub fn cumulative(&self) -> &[Distance] {
        &self.cumulative
    }

    /// Which segment is `dist` on? The caller clamps `dist` to [0, total] first. On a vertex, the
    /// later segment wins.
    fn segment_containing(&self, dist: Distance) -> usize {
        let starts = &self.cumulative[0..self.lengths.len()];
        // cumulative[0] is 0 and dist >= 0, so this is at least 1
        let count = starts.partition_point(|start| *start <= dist);
        count.max(1) - 1
    }
}

/// Where a point lands when it's snapped to a polyline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Distance from the start of the polyline to the snapped point, walking along it
    pub dist_along: Distance,
    /// Great-circle distance between the original point and the snapped point
    pub perpendicular: Distance,
}

/// An ordered route of at least 2 GPS points, along with its `SegmentTable`. Immutable once
/// built, so the table can never go stale.
#[derive(Clone, Debug, PartialEq)]
pub struct PolyLine {
    pts: Vec<LonLat>,
    table: SegmentTable,
}

impl PolyLine {
    pub fn new(pts: Vec<LonLat>) -> Result<PolyLine> {
        let table = SegmentTable::new(&pts)?;
        Ok(PolyLine { pts, table })
    }

    /// Accepts a GeoJSON LineString, the geometry format directions services return.
    pub fn from_geojson(geometry: &geojson::Geometry) -> Result<PolyLine> {
        match geometry.value {
            geojson::Value::LineString(ref positions) => PolyLine::from_positions(positions),
            ref other => Err(InvalidGeometry::new(format!(
                "route must be a LineString, not a {}",
                geometry_type(other)
            ))
            .into()),
        }
    }

    /// Accepts raw `[lon, lat]` pairs.
    pub fn from_positions(positions: &[Vec<f64>]) -> Result<PolyLine> {
        let pts = positions
            .iter()
            .map(|pos| LonLat::from_position(pos))
            .collect::<Result<Vec<_>>>()?;
        PolyLine::new(pts)
    }

    pub fn to_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::LineString(
            self.pts.iter().map(|pt| pt.to_position()).collect(),
        ))
    }

    pub fn points(&self) -> &Vec<LonLat> {
        &self.pts
    }

    pub fn segment_table(&self) -> &SegmentTable {
        &self.table
    }

    pub fn length(&self) -> Distance {
        self.table.total()
    }

    pub fn first_pt(&self) -> LonLat {
        self.pts[0]
    }

    pub fn last_pt(&self) -> LonLat {
        self.pts[self.pts.len() - 1]
    }

    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        self.pts.windows(2).map(|pair| Line::new(pair[0], pair[1]))
    }

    /// Is this polyline made of exactly these points?
    pub fn same_points(&self, pts: &[LonLat]) -> bool {
        self.pts == pts
    }

    /// Snaps `pt` to the closest place on this polyline. Segments are projected onto in raw
    /// lon/lat space, but the distances are great-circle. Fails if the polyline has no length,
    /// since then there's no meaningful distance along it.
    pub fn project_pt(&self, pt: LonLat) -> Result<Projection> {
        if self.length() == Distance::ZERO {
            return Err(InvalidGeometry::new("can't project onto a zero-length route").into());
        }

        let mut best: Option<Projection> = None;
        for (idx, line) in self.lines().enumerate() {
            let snapped = line.project_pt(pt);
            let perpendicular = pt.gps_dist(snapped);
            if best
                .map(|b| perpendicular < b.perpendicular)
                .unwrap_or(true)
            {
                best = Some(Projection {
                    dist_along: self.table.cumulative[idx] + line.pt1().gps_dist(snapped),
                    perpendicular,
                });
            }
        }

        let mut result = best.ok_or_else(|| InvalidGeometry::new("route has no segments"))?;
        // Rounding can push us a hair past the end
        result.dist_along = result.dist_along.clamp_to(Distance::ZERO, self.length());
        Ok(result)
    }

    /// The inverse of `project_pt`: the point `dist` along the polyline. `dist` is clamped to the
    /// polyline's length, and the endpoints are returned exactly.
    pub fn dist_along(&self, dist: Distance) -> LonLat {
        if dist <= Distance::ZERO {
            return self.first_pt();
        }
        if dist >= self.length() {
            return self.last_pt();
        }

        let idx = self.table.segment_containing(dist);
        let len = self.table.lengths[idx];
        if len == Distance::ZERO {
            return self.pts[idx];
        }
        let pct = (dist.inner_meters() - self.table.cumulative[idx].inner_meters())
            / len.inner_meters();
        Line::new(self.pts[idx], self.pts[idx + 1]).percent_along(pct)
    }

    /// The point halfway along the polyline, by distance.
    pub fn middle(&self) -> LonLat {
        self.dist_along(self.length() / 2.0)
    }
}

fn geometry_type(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    use super::*;

    fn cluj_route() -> PolyLine {
        PolyLine::new(vec![
            LonLat::new(23.60, 46.77),
            LonLat::new(23.61, 46.78),
            LonLat::new(23.62, 46.79),
        ])
        .unwrap()
    }

    fn close(d1: Distance, d2: Distance, epsilon_meters: f64) -> bool {
        (d1.inner_meters() - d2.inner_meters()).abs() < epsilon_meters
    }

    #[test]
    fn total_is_sum_of_segments() {
        let pl = cluj_route();
        let pts = pl.points();
        let sum: Distance = pts.windows(2).map(|pair| pair[0].gps_dist(pair[1])).sum();
        assert_eq!(pl.length(), sum);
        assert_eq!(pl.segment_table().num_segments(), 2);
        assert_eq!(pl.segment_table().cumulative()[0], Distance::ZERO);
        assert_eq!(pl.segment_table().cumulative()[2], pl.length());
    }

    #[test]
    fn too_few_points() {
        for pts in [vec![], vec![LonLat::new(23.6, 46.77)]] {
            let err = PolyLine::new(pts).unwrap_err();
            assert!(err.downcast_ref::<InvalidGeometry>().is_some());
        }
        let err = PolyLine::new(vec![LonLat::new(23.6, 46.77), LonLat::new(f64::NAN, 46.78)])
            .unwrap_err();
        assert!(err.downcast_ref::<InvalidGeometry>().is_some());
    }

    #[test]
    fn endpoints_are_exact() {
        let pl = cluj_route();
        assert_eq!(pl.dist_along(Distance::ZERO), pl.first_pt());
        assert_eq!(pl.dist_along(pl.length()), pl.last_pt());
        // Out-of-range distances are clamped
        assert_eq!(pl.dist_along(Distance::meters(-50.0)), pl.first_pt());
        assert_eq!(pl.dist_along(pl.length() * 2.0), pl.last_pt());
        // Landing exactly on the interior vertex
        let vertex = pl.segment_table().cumulative()[1];
        assert_eq!(pl.dist_along(vertex), pl.points()[1]);
    }

    #[test]
    fn round_trip() {
        let pl = cluj_route();
        let mut rng = XorShiftRng::seed_from_u64(42);
        let mut dists = vec![Distance::ZERO, pl.length(), pl.segment_table().cumulative()[1]];
        for _ in 0..100 {
            dists.push(rng.gen_range(0.0..=1.0) * pl.length());
        }

        for dist in dists {
            let pt = pl.dist_along(dist);
            let projection = pl.project_pt(pt).unwrap();
            assert!(
                close(projection.dist_along, dist, 0.1),
                "{} projected back to {}",
                dist,
                projection.dist_along
            );
            assert!(projection.perpendicular < Distance::meters(0.1));
        }
    }

    #[test]
    fn round_trip_random_routes() {
        let mut rng = XorShiftRng::seed_from_u64(42);
        for _ in 0..20 {
            let num_pts = rng.gen_range(3..=8);
            let pts: Vec<LonLat> = (0..num_pts)
                .map(|_| {
                    LonLat::new(
                        23.6 + rng.gen_range(-0.03..0.03),
                        46.7667 + rng.gen_range(-0.02..0.02),
                    )
                })
                .collect();
            let pl = PolyLine::new(pts).unwrap();
            if pl.length() == Distance::ZERO {
                continue;
            }

            for _ in 0..50 {
                let dist = rng.gen_range(0.0..=1.0) * pl.length();
                let pt = pl.dist_along(dist);
                let projection = pl.project_pt(pt).unwrap();
                assert!(projection.perpendicular < Distance::meters(0.1));
                // Routes may cross themselves, so only the spot has to match, not the distance
                let back = pl.dist_along(projection.dist_along);
                assert!(
                    back.gps_dist(pt) < Distance::meters(0.1),
                    "{} projected back to {}, {} away",
                    dist,
                    projection.dist_along,
                    back.gps_dist(pt)
                );
            }
        }
    }

    #[test]
    fn project_off_route_point() {
        let pl = PolyLine::new(vec![LonLat::new(23.60, 46.77), LonLat::new(23.62, 46.77)]).unwrap();
        // North of the middle of an east-west road
        let projection = pl.project_pt(LonLat::new(23.61, 46.771)).unwrap();
        assert!(close(projection.dist_along, pl.length() / 2.0, 0.5));
        assert!(close(projection.perpendicular, Distance::meters(111.2), 0.5));

        // Past the end
        let projection = pl.project_pt(LonLat::new(23.65, 46.77)).unwrap();
        assert_eq!(projection.dist_along, pl.length());
    }

    #[test]
    fn picks_the_closest_segment() {
        // An L-shaped route: east, then north
        let pl = PolyLine::new(vec![
            LonLat::new(23.60, 46.77),
            LonLat::new(23.61, 46.77),
            LonLat::new(23.61, 46.78),
        ])
        .unwrap();
        let first_leg = pl.segment_table().segment_lengths()[0];
        let projection = pl.project_pt(LonLat::new(23.6105, 46.775)).unwrap();
        assert!(projection.dist_along > first_leg);
        let projection = pl.project_pt(LonLat::new(23.605, 46.7702)).unwrap();
        assert!(projection.dist_along < first_leg);
    }

    #[test]
    fn repeated_points() {
        let a = LonLat::new(23.60, 46.77);
        let b = LonLat::new(23.61, 46.77);
        let pl = PolyLine::new(vec![a, a, b, b]).unwrap();
        assert_eq!(pl.length(), a.gps_dist(b));
        assert_eq!(pl.dist_along(Distance::ZERO), a);
        assert!(close(
            pl.project_pt(pl.middle()).unwrap().dist_along,
            pl.length() / 2.0,
            0.1
        ));

        let stuck = PolyLine::new(vec![a, a]).unwrap();
        assert_eq!(stuck.length(), Distance::ZERO);
        assert_eq!(stuck.dist_along(Distance::meters(10.0)), a);
        let err = stuck.project_pt(b).unwrap_err();
        assert!(err.downcast_ref::<InvalidGeometry>().is_some());
    }

    #[test]
    fn geojson() {
        let input: geojson::Geometry = serde_json::from_str(
            r#"{"type": "LineString", "coordinates": [[23.60, 46.77], [23.61, 46.78]]}"#,
        )
        .unwrap();
        let pl = PolyLine::from_geojson(&input).unwrap();
        assert_eq!(pl.first_pt(), LonLat::new(23.60, 46.77));
        assert_eq!(pl.to_geojson(), input);

        let point = LonLat::new(23.6, 46.77).to_geojson();
        let err = PolyLine::from_geojson(&point).unwrap_err();
        assert!(err.downcast_ref::<InvalidGeometry>().is_some());
    }
}
