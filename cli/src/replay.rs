use anyhow::Result;
use chrono::{TimeZone, Utc};
use geojson::{Feature, FeatureCollection, GeoJson};

use geom::{Duration, Time};
use route_progress::{to_time, Engine, EngineConfig, Sample, TrackedEntity};

use crate::feed;

// Once the feed runs out, keep sampling until every unit finishes its route, but only this long
const MAX_TAIL: Duration = Duration::const_seconds(3600.0);

pub fn run(input: String, config: EngineConfig, step_ms: f64, output: String) -> Result<()> {
    let step = Duration::parse_milliseconds(step_ms)
        .filter(|step| *step > Duration::ZERO)
        .ok_or_else(|| anyhow!("--step-ms must be positive, not {}", step_ms))?;
    let feed = feed::load(&input)?;
    let last_report = to_time(feed[feed.len() - 1].at);
    let give_up = last_report + MAX_TAIL;

    let mut engine = Engine::new(config);
    let mut features = Vec::new();
    let mut next = 0;
    let mut now = to_time(feed[0].at);
    let mut ticks = 0;
    loop {
        while next < feed.len() && to_time(feed[next].at) <= now {
            feed::apply(&mut engine, &feed[next]);
            next += 1;
        }

        let samples = engine.sample_all(now);
        let still_moving = samples
            .values()
            .any(|sample| sample.remaining > Duration::ZERO);
        for (id, sample) in samples {
            // sample_all only returns known units
            if let Some(entity) = engine.get(&id) {
                features.push(to_feature(entity, &sample, now));
            }
        }
        ticks += 1;

        if now >= give_up || (next == feed.len() && !still_moving) {
            break;
        }
        now += step;
    }

    info!(
        "Replayed {} reports about {} units over {} ticks",
        feed.len(),
        engine.len(),
        ticks
    );
    let gj = GeoJson::FeatureCollection(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    });
    dernutil::write_json(&output, &gj)
}

fn to_feature(entity: &TrackedEntity, sample: &Sample, now: Time) -> Feature {
    let mut feature = Feature {
        bbox: None,
        geometry: Some(sample.position.to_geojson()),
        id: None,
        properties: None,
        foreign_members: None,
    };
    feature.set_property("unit", entity.id.0.clone());
    if let Some(time) = Utc
        .timestamp_millis_opt(now.inner_milliseconds() as i64)
        .single()
    {
        feature.set_property("time", time.to_rfc3339());
    }
    feature.set_property("fraction", sample.fraction);
    feature.set_property("remaining_s", sample.remaining.inner_seconds());
    feature.set_property("animating", entity.is_animating());
    if let Some(ref status) = entity.status {
        feature.set_property("status", status.clone());
    }
    if let Some(ref name) = entity.unit_name {
        feature.set_property("unit_name", name.clone());
    }
    feature
}
