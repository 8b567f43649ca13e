use anyhow::Result;

use geom::{Distance, Duration, InvalidGeometry, LonLat, PolyLine, Speed, Time};

use crate::{EngineConfig, PositionReport, UnitID};

// Closer than this to the destination, there's no sensible way to stretch a reported ETA over the
// remaining distance.
const MIN_DIST_TO_STRETCH_ETA: Distance = Distance::const_meters(1.0);

/// A server's claim about how long until a unit arrives, in milliseconds. It might be garbage --
/// negative, NaN, or so short that animating over it would look like teleporting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DurationHint(f64);

impl DurationHint {
    pub fn milliseconds(ms: f64) -> DurationHint {
        DurationHint(ms)
    }

    pub fn inner_milliseconds(self) -> f64 {
        self.0
    }

    /// The hint as a real duration, only if it's longer than `min` and no longer than `max`.
    pub fn reliable(self, min: Duration, max: Duration) -> Option<Duration> {
        let duration = Duration::parse_milliseconds(self.0)?;
        if duration > min && duration <= max {
            Some(duration)
        } else {
            None
        }
    }
}

/// Playback of one unit driving along one route. The unit is at the start of the route at
/// `reference` and reaches the end `total` later; positions in between are interpolated by
/// distance.
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    route: PolyLine,
    reference: Time,
    total: Duration,
}

impl Animation {
    pub fn route(&self) -> &PolyLine {
        &self.route
    }

    /// When the unit would have been at the start of the route. This moves with every resync.
    pub fn reference_time(&self) -> Time {
        self.reference
    }

    /// How long the whole route takes, start to end.
    pub fn total_duration(&self) -> Duration {
        self.total
    }

    /// Fraction of the route completed at `now`, in [0, 1].
    pub fn fraction(&self, now: Time) -> f64 {
        let elapsed = now.inner_milliseconds() - self.reference.inner_milliseconds();
        (elapsed / self.total.inner_milliseconds()).clamp(0.0, 1.0)
    }

    fn sample(&self, now: Time) -> Sample {
        let fraction = self.fraction(now);
        Sample {
            position: self.route.dist_along(fraction * self.route.length()),
            remaining: (1.0 - fraction) * self.total,
            fraction,
        }
    }

    /// Moves the reference time so that at `now`, the unit is exactly `dist` along the route.
    fn pin(&mut self, dist: Distance, now: Time) {
        self.reference = now - self.total * (dist / self.route.length());
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AnimationState {
    /// No route; the unit sits at its last known position, if it has one.
    Idle,
    Animating(Animation),
}

/// What a unit looks like at some moment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub position: LonLat,
    /// Until the end of the route. Zero for idle units.
    pub remaining: Duration,
    /// How much of the route's duration has elapsed, in [0, 1]. Zero for idle units.
    pub fraction: f64,
}

/// Everything known about one ambulance or fire unit.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedEntity {
    pub id: UnitID,
    state: AnimationState,
    last_position: Option<LonLat>,
    // The unit's own nominal speed, if it's ever reported one
    speed: Option<Speed>,

    pub status: Option<String>,
    pub unit_name: Option<String>,
    pub incident_id: Option<String>,
    pub target: Option<LonLat>,
}

impl TrackedEntity {
    pub fn new(id: UnitID) -> TrackedEntity {
        TrackedEntity {
            id,
            state: AnimationState::Idle,
            last_position: None,
            speed: None,
            status: None,
            unit_name: None,
            incident_id: None,
            target: None,
        }
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn animation(&self) -> Option<&Animation> {
        match self.state {
            AnimationState::Animating(ref animation) => Some(animation),
            AnimationState::Idle => None,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.animation().is_some()
    }

    pub fn route(&self) -> Option<&PolyLine> {
        self.animation().map(|a| a.route())
    }

    /// Is the unit currently animating along exactly this route?
    pub fn has_route(&self, route: &PolyLine) -> bool {
        self.route()
            .map(|current| current.same_points(route.points()))
            .unwrap_or(false)
    }

    /// The last position a report placed this unit at.
    pub fn last_position(&self) -> Option<LonLat> {
        self.last_position
    }

    pub fn set_position(&mut self, pt: LonLat) {
        self.last_position = Some(pt);
    }

    pub fn speed(&self, cfg: &EngineConfig) -> Speed {
        self.speed.unwrap_or_else(|| cfg.default_speed())
    }

    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = Some(speed);
    }

    /// Copies over every non-positional field the report carries. Missing fields leave the
    /// current value alone.
    pub fn apply_metadata(&mut self, report: &PositionReport) {
        if let Some(speed) = report.speed_kmh.and_then(Speed::parse_km_per_hour) {
            self.speed = Some(speed);
        }
        if let Some(ref status) = report.status {
            self.status = Some(status.clone());
        }
        if let Some(ref name) = report.unit_name {
            self.unit_name = Some(name.clone());
        }
        if let Some(ref incident) = report.incident_id {
            self.incident_id = Some(incident.clone());
        }
        if let Some(target) = report.target() {
            self.target = Some(target);
        }
    }

    /// Starts animating along a new route, replacing whatever was happening before. If
    /// `known_position` is given, playback resumes from where that position lands on the route,
    /// instead of from the very start. On failure, nothing about the unit changes.
    pub fn assign_route(
        &mut self,
        route: PolyLine,
        hint: Option<DurationHint>,
        known_position: Option<LonLat>,
        now: Time,
        cfg: &EngineConfig,
    ) -> Result<()> {
        check_routable(&route)?;
        let start = match known_position {
            Some(pt) => route.project_pt(pt)?.dist_along,
            None => Distance::ZERO,
        };

        let total = self.total_duration(&route, start, hint, cfg);
        let mut animation = Animation {
            route,
            reference: now,
            total,
        };
        animation.pin(start, now);
        debug!(
            "{} starts a {} route at {}, taking {} in total",
            self.id,
            animation.route.length(),
            start,
            total
        );

        self.state = AnimationState::Animating(animation);
        if let Some(pt) = known_position {
            self.last_position = Some(pt);
        }
        Ok(())
    }

    /// Folds in a fresh report for a unit already animating along its route. The route stays the
    /// same; only the clock moves, so that right now, the unit is exactly where the report says.
    /// With a trustworthy hint, the rest of the route takes that long; with an untrustworthy one,
    /// the rest of the route is timed by speed; with none, the pace doesn't change.
    pub fn resync(
        &mut self,
        known_position: LonLat,
        hint: Option<DurationHint>,
        now: Time,
        cfg: &EngineConfig,
    ) -> Result<()> {
        let speed = self.speed(cfg);
        let animation = match self.state {
            AnimationState::Animating(ref mut animation) => animation,
            AnimationState::Idle => bail!("{} has no route to resync against", self.id),
        };

        let dist = animation.route.project_pt(known_position)?.dist_along;
        if let Some(hint) = hint {
            animation.total = duration_for(&animation.route, dist, hint, speed, cfg);
        }
        animation.pin(dist, now);

        self.last_position = Some(known_position);
        Ok(())
    }

    /// Stops animating. The unit goes back to sitting at its last known position.
    pub fn clear_route(&mut self) {
        if self.is_animating() {
            debug!("{} no longer has a route", self.id);
        }
        self.state = AnimationState::Idle;
    }

    /// Where is the unit at `now`? This doesn't change anything, so calling it twice with the
    /// same time gives the same answer. Reaching the end of the route doesn't make the unit idle;
    /// that's up to the caller. Idle units that have never reported a position have no sample.
    pub fn sample(&self, now: Time) -> Option<Sample> {
        match self.state {
            AnimationState::Animating(ref animation) => Some(animation.sample(now)),
            AnimationState::Idle => self.last_position.map(|position| Sample {
                position,
                remaining: Duration::ZERO,
                fraction: 0.0,
            }),
        }
    }

    fn total_duration(
        &self,
        route: &PolyLine,
        start: Distance,
        hint: Option<DurationHint>,
        cfg: &EngineConfig,
    ) -> Duration {
        match hint {
            Some(hint) => duration_for(route, start, hint, self.speed(cfg), cfg),
            None => by_speed(route, self.speed(cfg)),
        }
    }
}

/// Routes with no length can't be animated along.
pub(crate) fn check_routable(route: &PolyLine) -> Result<()> {
    if route.length() == Distance::ZERO {
        return Err(InvalidGeometry::new(format!(
            "route from {} to {} has no length",
            route.first_pt(),
            route.last_pt()
        ))
        .into());
    }
    Ok(())
}

// The total duration of the route, such that the part after `dist` takes as long as the hint
// says. Bad hints fall back to timing by speed.
fn duration_for(
    route: &PolyLine,
    dist: Distance,
    hint: DurationHint,
    speed: Speed,
    cfg: &EngineConfig,
) -> Duration {
    let remaining_dist = route.length() - dist;
    match hint.reliable(cfg.min_reliable_eta(), cfg.max_reliable_eta()) {
        Some(remaining) if remaining_dist > MIN_DIST_TO_STRETCH_ETA => {
            let remaining_fraction = remaining_dist / route.length();
            let total_ms = remaining.inner_milliseconds() / remaining_fraction;
            match Duration::parse_milliseconds(total_ms) {
                Some(total) => total.max(Duration::EPSILON),
                None => by_speed(route, speed),
            }
        }
        Some(_) => by_speed(route, speed),
        None => {
            debug!(
                "Ignoring unreliable ETA of {}ms, timing the rest of the route at {}",
                hint.inner_milliseconds(),
                speed
            );
            by_speed(route, speed)
        }
    }
}

fn by_speed(route: &PolyLine, speed: Speed) -> Duration {
    (route.length() / speed).max(Duration::EPSILON)
}
