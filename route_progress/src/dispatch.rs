//! Helpers for a dispatcher picking which unit to send to a new incident.

use geom::{Distance, Duration, LonLat, Speed, Time};

use crate::{Engine, TrackedEntity, UnitID};

// Statuses of units that aren't busy with anything
const FREE_STATUSES: [&str; 2] = ["idle", "arrived"];

// Straight-line estimates never assume a unit crawls slower than this
const MIN_SPEED: Speed = Speed::const_meters_per_second(0.1);

/// Does this status say the unit has reached its destination? Backends aren't consistent about
/// case or whitespace.
pub fn is_arrived(status: &str) -> bool {
    status.trim().eq_ignore_ascii_case("arrived")
}

/// Could this unit be sent somewhere new right now? It has to be in a free status (or have never
/// reported one) and not be attached to an incident.
pub fn is_available(entity: &TrackedEntity) -> bool {
    let free = match entity.status {
        Some(ref status) => {
            let status = status.trim();
            status.is_empty()
                || FREE_STATUSES
                    .iter()
                    .any(|free| status.eq_ignore_ascii_case(free))
        }
        None => true,
    };
    let unassigned = entity
        .incident_id
        .as_ref()
        .map(|incident| incident.trim().is_empty())
        .unwrap_or(true);
    free && unassigned
}

/// A rough estimate of how long it'd take to drive from one point to another, ignoring roads.
pub fn straight_line_eta(from: LonLat, to: LonLat, speed: Speed) -> Duration {
    from.gps_dist(to) / speed.max(MIN_SPEED)
}

/// One unit that could be sent to some point.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub id: UnitID,
    /// As the crow flies, from where the unit is right now
    pub distance: Distance,
    pub eta: Duration,
    pub available: bool,
}

impl Engine {
    /// Every unit with a known position, closest to `pt` first. Busy units are included, but
    /// marked as unavailable.
    pub fn candidates(&self, pt: LonLat, now: Time) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = self
            .entities()
            .filter_map(|entity| {
                let sample = entity.sample(now)?;
                let distance = sample.position.gps_dist(pt);
                Some(Candidate {
                    id: entity.id.clone(),
                    distance,
                    eta: straight_line_eta(sample.position, pt, entity.speed(self.config())),
                    available: is_available(entity),
                })
            })
            .collect();
        // Ties are broken by ID, since entities() is already sorted that way
        candidates.sort_by_key(|c| c.distance);
        candidates
    }

    /// The closest unit that's free to go to `pt`, and how far away it is.
    pub fn nearest_available(&self, pt: LonLat, now: Time) -> Option<(UnitID, Distance)> {
        self.candidates(pt, now)
            .into_iter()
            .find(|c| c.available)
            .map(|c| (c.id, c.distance))
    }
}
