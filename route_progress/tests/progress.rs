use geom::{Distance, Duration, InvalidGeometry, LonLat, PolyLine, Speed, Time};
use route_progress::{AnimationState, DurationHint, EngineConfig, TrackedEntity, UnitID};

// One degree of longitude along the equator, using the same earth radius as gps_dist
const METERS_PER_DEGREE: f64 = 111_194.926_644_558_73;

fn cluj_route() -> PolyLine {
    PolyLine::new(vec![
        LonLat::new(23.60, 46.77),
        LonLat::new(23.61, 46.78),
        LonLat::new(23.62, 46.79),
    ])
    .unwrap()
}

// Exactly 10km along the equator
fn equator_route() -> PolyLine {
    PolyLine::new(vec![
        LonLat::new(0.0, 0.0),
        LonLat::new(10_000.0 / METERS_PER_DEGREE, 0.0),
    ])
    .unwrap()
}

fn t(seconds: f64) -> Time {
    Time::milliseconds_since_epoch(1_767_790_800_000.0) + Duration::seconds(seconds)
}

fn unit() -> TrackedEntity {
    TrackedEntity::new(UnitID::from("amb_1"))
}

fn assert_close(pt1: LonLat, pt2: LonLat, tolerance: Distance) {
    let dist = pt1.gps_dist(pt2);
    if dist > tolerance {
        panic!("{} and {} are {} apart", pt1, pt2, dist);
    }
}

#[test]
fn cluj_route_at_default_speed() {
    let cfg = EngineConfig::default();
    let route = cluj_route();
    let total_m = route.length().inner_meters();

    let mut entity = unit();
    entity
        .assign_route(route.clone(), None, None, t(0.0), &cfg)
        .unwrap();

    let total = entity.animation().unwrap().total_duration();
    let expected = total_m / (40_000.0 / 3600.0);
    assert!(
        (total.inner_seconds() - expected).abs() < 0.01,
        "total {} isn't {}s",
        total,
        expected
    );

    let start = entity.sample(t(0.0)).unwrap();
    assert_eq!(start.position, route.first_pt());
    assert_eq!(start.fraction, 0.0);

    let halfway = entity.sample(t(total.inner_seconds() / 2.0)).unwrap();
    assert!((halfway.fraction - 0.5).abs() < 1e-6);
    assert_close(halfway.position, route.middle(), Distance::meters(0.5));
    assert!((halfway.remaining.inner_seconds() - expected / 2.0).abs() < 0.01);

    // Running past the end just parks the unit there
    let end = entity.sample(t(total.inner_seconds() * 3.0)).unwrap();
    assert_eq!(end.position, route.last_pt());
    assert_eq!(end.fraction, 1.0);
    assert_eq!(end.remaining, Duration::ZERO);
    assert!(entity.is_animating());
}

#[test]
fn resuming_from_known_position() {
    let cfg = EngineConfig::default();
    let route = cluj_route();
    // The middle vertex is a bit off from halfway by distance, so use its projection
    let known = route.points()[1];
    let offset = route.project_pt(known).unwrap().dist_along;

    let mut entity = unit();
    entity
        .assign_route(route.clone(), None, Some(known), t(0.0), &cfg)
        .unwrap();

    let sample = entity.sample(t(0.0)).unwrap();
    assert_close(sample.position, known, Distance::meters(0.5));
    assert!((sample.fraction - offset / route.length()).abs() < 1e-6);
    assert_eq!(entity.last_position(), Some(known));
}

#[test]
fn resync_with_reliable_eta() {
    let cfg = EngineConfig::default();
    let route = equator_route();
    assert!((route.length().inner_meters() - 10_000.0).abs() < 0.01);

    let mut entity = unit();
    entity
        .assign_route(route.clone(), None, None, t(0.0), &cfg)
        .unwrap();
    // 10km at 40km/h
    let total = entity.animation().unwrap().total_duration();
    assert!((total.inner_seconds() - 900.0).abs() < 0.01);

    let now = t(0.4 * total.inner_seconds());
    assert!((entity.sample(now).unwrap().fraction - 0.4).abs() < 1e-6);

    // The unit is actually further along, and the server says it's a minute away
    let known = route.dist_along(Distance::meters(6000.0));
    entity
        .resync(known, Some(DurationHint::milliseconds(60_000.0)), now, &cfg)
        .unwrap();

    let sample = entity.sample(now).unwrap();
    assert_close(sample.position, known, Distance::meters(1.0));
    assert!(
        (sample.remaining.inner_milliseconds() - 60_000.0).abs() < 10.0,
        "remaining is {}",
        sample.remaining
    );
    // The whole route is stretched so that the last 4km take a minute
    let total = entity.animation().unwrap().total_duration();
    assert!((total.inner_seconds() - 150.0).abs() < 0.1);

    // And it finishes a minute later
    let done = entity.sample(now + Duration::seconds(60.0)).unwrap();
    assert_close(done.position, route.last_pt(), Distance::meters(1.0));
}

#[test]
fn unreliable_eta_falls_back_to_speed() {
    let cfg = EngineConfig::default();
    let route = equator_route();

    let mut entity = unit();
    entity
        .assign_route(route.clone(), None, None, t(0.0), &cfg)
        .unwrap();

    let now = t(360.0);
    let known = route.dist_along(Distance::meters(6000.0));
    entity
        .resync(known, Some(DurationHint::milliseconds(1500.0)), now, &cfg)
        .unwrap();

    // The remaining 4km at 40km/h, not 1.5s
    let sample = entity.sample(now).unwrap();
    assert!(
        (sample.remaining.inner_seconds() - 360.0).abs() < 0.5,
        "remaining is {}",
        sample.remaining
    );
    assert_close(sample.position, known, Distance::meters(1.0));

    // Negative and nonsense hints are just as unreliable
    for ms in vec![-5000.0, f64::NAN, f64::INFINITY, 3000.0] {
        entity
            .resync(known, Some(DurationHint::milliseconds(ms)), now, &cfg)
            .unwrap();
        let total = entity.animation().unwrap().total_duration();
        assert!((total.inner_seconds() - 900.0).abs() < 0.01);
    }
}

#[test]
fn resync_without_eta_keeps_pace() {
    let cfg = EngineConfig::default();
    let route = equator_route();

    let mut entity = unit();
    entity
        .assign_route(
            route.clone(),
            Some(DurationHint::milliseconds(100_000.0)),
            None,
            t(0.0),
            &cfg,
        )
        .unwrap();
    let total = entity.animation().unwrap().total_duration();
    assert_eq!(total, Duration::seconds(100.0));

    // The unit fell behind; it's only 2km along after 50s
    let known = route.dist_along(Distance::meters(2000.0));
    entity.resync(known, None, t(50.0), &cfg).unwrap();
    assert_eq!(entity.animation().unwrap().total_duration(), total);

    let sample = entity.sample(t(50.0)).unwrap();
    assert!((sample.fraction - 0.2).abs() < 1e-6);
    assert!((sample.remaining.inner_seconds() - 80.0).abs() < 0.01);
}

#[test]
fn reported_speed_beats_default() {
    let cfg = EngineConfig::default();
    let mut entity = unit();
    entity.set_speed(Speed::km_per_hour(72.0));
    entity
        .assign_route(equator_route(), None, None, t(0.0), &cfg)
        .unwrap();
    let total = entity.animation().unwrap().total_duration();
    assert!((total.inner_seconds() - 500.0).abs() < 0.01);
}

#[test]
fn eta_near_destination_uses_speed() {
    let cfg = EngineConfig::default();
    let route = equator_route();
    let mut entity = unit();
    entity
        .assign_route(
            route.clone(),
            Some(DurationHint::milliseconds(20_000.0)),
            Some(route.last_pt()),
            t(0.0),
            &cfg,
        )
        .unwrap();
    // No way to stretch 20s over nothing
    let total = entity.animation().unwrap().total_duration();
    assert!((total.inner_seconds() - 900.0).abs() < 0.01);
    assert_eq!(entity.sample(t(0.0)).unwrap().position, route.last_pt());
}

#[test]
fn bad_routes_change_nothing() {
    let cfg = EngineConfig::default();
    let pt = LonLat::new(23.6, 46.77);

    let err = PolyLine::new(vec![pt]).unwrap_err();
    assert!(err.downcast_ref::<InvalidGeometry>().is_some());

    let mut entity = unit();
    entity
        .assign_route(cluj_route(), None, None, t(0.0), &cfg)
        .unwrap();
    let before = entity.clone();

    // Technically 2 points, but they're the same
    let stuck = PolyLine::new(vec![pt, pt]).unwrap();
    let err = entity
        .assign_route(stuck, None, Some(pt), t(10.0), &cfg)
        .unwrap_err();
    assert!(err.downcast_ref::<InvalidGeometry>().is_some());
    assert_eq!(entity, before);
}

#[test]
fn sampling_is_idempotent() {
    let cfg = EngineConfig::default();
    let mut entity = unit();
    entity
        .assign_route(cluj_route(), None, None, t(0.0), &cfg)
        .unwrap();
    let now = t(42.5);
    assert_eq!(entity.sample(now), entity.sample(now));
    let before = entity.clone();
    entity.sample(now);
    assert_eq!(entity, before);
}

#[test]
fn idle_units() {
    let cfg = EngineConfig::default();
    let mut entity = unit();
    assert_eq!(entity.sample(t(0.0)), None);
    assert!(entity
        .resync(LonLat::new(23.6, 46.77), None, t(0.0), &cfg)
        .is_err());

    let pt = LonLat::new(23.6, 46.77);
    entity.set_position(pt);
    let sample = entity.sample(t(0.0)).unwrap();
    assert_eq!(sample.position, pt);
    assert_eq!(sample.remaining, Duration::ZERO);
    assert_eq!(sample.fraction, 0.0);

    entity
        .assign_route(cluj_route(), None, None, t(0.0), &cfg)
        .unwrap();
    entity.clear_route();
    assert_eq!(entity.state(), &AnimationState::Idle);
    assert_eq!(entity.sample(t(100.0)).unwrap().position, pt);
}
