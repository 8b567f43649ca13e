use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use geom::{Distance, Duration, LonLat, PolyLine, Speed};
use route_progress::{PositionReport, RouteGeometry, UnitID};

use crate::feed::TimedReport;

// Central Cluj-Napoca
const CENTER: LonLat = LonLat {
    longitude: 23.6,
    latitude: 46.7667,
};
const START: &str = "2026-01-07T13:00:00Z";

/// Writes a feed of units sitting idle, getting dispatched to random incidents nearby, and driving
/// there. Their actual pace wobbles around what they claim, and the backend occasionally sends an
/// ETA that's already passed, so replaying this exercises resyncing.
pub fn run(rng_seed: u64, units: usize, interval_s: f64, output: String) -> Result<()> {
    if units == 0 {
        bail!("--units must be at least 1");
    }
    let interval = Duration::parse_milliseconds(interval_s * 1000.0)
        .filter(|interval| *interval > Duration::ZERO)
        .ok_or_else(|| anyhow!("--interval-s must be positive, not {}", interval_s))?;

    let mut rng = XorShiftRng::seed_from_u64(rng_seed);
    let start: DateTime<Utc> = START.parse()?;
    let mut feed = Vec::new();
    for idx in 0..units {
        let id = if idx % 3 == 2 {
            UnitID(format!("fire_{}", idx + 1))
        } else {
            UnitID(format!("amb_{}", idx + 1))
        };
        let home = random_pt(&mut rng);
        feed.push(TimedReport {
            at: start,
            id: id.clone(),
            report: PositionReport {
                lon: Some(home.x()),
                lat: Some(home.y()),
                status: Some("idle".to_string()),
                unit_name: Some(format!("Unit {}", idx + 1)),
                ..Default::default()
            },
        });

        let dispatched = start + chrono::Duration::seconds(rng.gen_range(5..60));
        let incident = random_pt(&mut rng);
        let incident_id = format!("inc_{}_{}", dispatched.timestamp(), idx);
        let route = city_block_route(home, incident)?;
        let speed = Speed::km_per_hour(rng.gen_range(30.0..60.0));
        drive(
            &mut rng,
            &mut feed,
            Trip {
                id,
                incident_id,
                route,
                speed,
                dispatched,
                interval,
            },
        );
    }

    feed.sort_by_key(|msg| msg.at);
    info!("Generated {} reports about {} units", feed.len(), units);
    dernutil::write_json(&output, &feed)
}

struct Trip {
    id: UnitID,
    incident_id: String,
    route: PolyLine,
    speed: Speed,
    dispatched: DateTime<Utc>,
    interval: Duration,
}

fn drive(rng: &mut XorShiftRng, feed: &mut Vec<TimedReport>, trip: Trip) {
    let target = trip.route.last_pt();
    let mut elapsed = Duration::ZERO;
    let mut dist = Distance::ZERO;
    while dist < trip.route.length() {
        let at = trip.dispatched + to_chrono(elapsed);
        let remaining = (trip.route.length() - dist) / trip.speed;
        let eta = if rng.gen_bool(0.1) {
            at
        } else {
            at + to_chrono(remaining)
        };
        let pos = trip.route.dist_along(dist);
        feed.push(TimedReport {
            at,
            id: trip.id.clone(),
            report: PositionReport {
                lon: Some(pos.x()),
                lat: Some(pos.y()),
                route: Some(RouteGeometry::from_polyline(&trip.route)),
                eta: Some(eta),
                speed_kmh: Some(trip.speed.to_km_per_hour()),
                status: Some("enroute".to_string()),
                incident_id: Some(trip.incident_id.clone()),
                target_lon: Some(target.x()),
                target_lat: Some(target.y()),
                ..Default::default()
            },
        });

        elapsed += trip.interval;
        dist += rng.gen_range(0.8..1.2) * (trip.interval * trip.speed);
    }

    let arrival = trip.dispatched + to_chrono(elapsed);
    feed.push(TimedReport {
        at: arrival,
        id: trip.id,
        report: PositionReport {
            lon: Some(target.x()),
            lat: Some(target.y()),
            status: Some("arrived".to_string()),
            incident_id: Some(String::new()),
            ..Default::default()
        },
    });
}

fn random_pt(rng: &mut XorShiftRng) -> LonLat {
    LonLat::new(
        CENTER.x() + rng.gen_range(-0.03..0.03),
        CENTER.y() + rng.gen_range(-0.02..0.02),
    )
}

// There's no router here, so go east/west first, then north/south
fn city_block_route(from: LonLat, to: LonLat) -> Result<PolyLine> {
    PolyLine::new(vec![from, LonLat::new(to.x(), from.y()), to])
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(d.inner_milliseconds().round() as i64)
}
