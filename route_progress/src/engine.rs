use std::collections::BTreeMap;

use anyhow::Result;

use geom::Time;

use crate::entity::check_routable;
use crate::{EngineConfig, PositionReport, Sample, TrackedEntity, UnitID};

/// Owns the animation state of every tracked unit. Renderers only ever read from this through
/// `sample_all`; the live stream writes through `upsert`.
///
/// There's no internal locking. If multiple threads need to share one, wrap it in a `Mutex`.
pub struct Engine {
    config: EngineConfig,
    entities: BTreeMap<UnitID, TrackedEntity>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Engine {
        Engine {
            config,
            entities: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Applies one report, received at `now`, to a unit. The first report about a unit starts
    /// tracking it.
    ///
    /// - A route that differs from the current one starts a new animation, resuming from the
    ///   reported position if there is one.
    /// - Otherwise, a position for a unit that's animating resyncs its clock.
    /// - Otherwise, a position just moves an idle unit.
    ///
    /// Status and the other metadata fields are overwritten by whatever the report carries. If the
    /// route is bad, the report is rejected as a whole and nothing changes.
    pub fn upsert(&mut self, id: UnitID, report: &PositionReport, now: Time) -> Result<()> {
        // Validate everything that could fail before touching any state
        let route = match report.route {
            Some(ref geometry) => {
                let route = geometry.to_polyline()?;
                check_routable(&route)?;
                Some(route)
            }
            None => None,
        };
        let position = report.position();
        let hint = report.duration_hint(now);

        let entity = self.entities.entry(id).or_insert_with_key(|id| {
            debug!("Started tracking {}", id);
            TrackedEntity::new(id.clone())
        });
        entity.apply_metadata(report);

        match route {
            Some(route) if !entity.has_route(&route) => {
                entity.assign_route(route, hint, position, now, &self.config)?;
            }
            _ => {
                if let Some(pt) = position {
                    if entity.is_animating() {
                        entity.resync(pt, hint, now, &self.config)?;
                    } else {
                        entity.set_position(pt);
                    }
                } else if hint.is_some() && entity.is_animating() {
                    debug!(
                        "Ignoring ETA for {}, since there's no position to resync to",
                        entity.id
                    );
                }
            }
        }
        Ok(())
    }

    /// Stops tracking a unit entirely.
    pub fn remove(&mut self, id: &UnitID) -> Option<TrackedEntity> {
        self.entities.remove(id)
    }

    /// Stops animating a unit, typically once it's arrived. Returns false for unknown units.
    pub fn clear_route(&mut self, id: &UnitID) -> bool {
        match self.entities.get_mut(id) {
            Some(entity) => {
                entity.clear_route();
                true
            }
            None => false,
        }
    }

    /// Where every unit is at `now`. Units that have never reported a position are left out.
    pub fn sample_all(&self, now: Time) -> BTreeMap<UnitID, Sample> {
        self.entities
            .iter()
            .filter_map(|(id, entity)| entity.sample(now).map(|sample| (id.clone(), sample)))
            .collect()
    }

    pub fn get(&self, id: &UnitID) -> Option<&TrackedEntity> {
        self.entities.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &TrackedEntity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
