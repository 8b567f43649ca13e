use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::{Duration, Speed};

const DEFAULT_SPEED_KMH: f64 = 40.0;
const DEFAULT_MIN_RELIABLE_ETA_MS: f64 = 3000.0;
// A day
const DEFAULT_MAX_RELIABLE_ETA_MS: f64 = 86_400_000.0;

/// Tunables for the engine. Everything has a default matching how the dispatch dashboard
/// behaves, so a config file only needs to mention what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How fast a unit is assumed to drive when it hasn't reported its own speed.
    pub default_speed_kmh: f64,
    /// A reported time-to-arrival at or under this many milliseconds isn't trusted. Animating
    /// over such a short time makes the unit teleport to its destination.
    pub min_reliable_eta_ms: f64,
    /// A reported time-to-arrival over this many milliseconds isn't trusted either. Nobody drives
    /// across a city for that long.
    pub max_reliable_eta_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            default_speed_kmh: DEFAULT_SPEED_KMH,
            min_reliable_eta_ms: DEFAULT_MIN_RELIABLE_ETA_MS,
            max_reliable_eta_ms: DEFAULT_MAX_RELIABLE_ETA_MS,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if Speed::parse_km_per_hour(self.default_speed_kmh).is_none() {
            bail!(
                "default_speed_kmh must be a positive number, not {}",
                self.default_speed_kmh
            );
        }
        if !self.min_reliable_eta_ms.is_finite() || self.min_reliable_eta_ms < 0.0 {
            bail!(
                "min_reliable_eta_ms must be a non-negative number, not {}",
                self.min_reliable_eta_ms
            );
        }
        if Duration::parse_milliseconds(self.max_reliable_eta_ms).is_none()
            || self.max_reliable_eta_ms <= self.min_reliable_eta_ms
        {
            bail!(
                "max_reliable_eta_ms must be a number over min_reliable_eta_ms, not {}",
                self.max_reliable_eta_ms
            );
        }
        Ok(())
    }

    pub fn default_speed(&self) -> Speed {
        Speed::parse_km_per_hour(self.default_speed_kmh)
            .unwrap_or_else(|| Speed::km_per_hour(DEFAULT_SPEED_KMH))
    }

    pub fn min_reliable_eta(&self) -> Duration {
        Duration::parse_milliseconds(self.min_reliable_eta_ms)
            .map(|d| d.max(Duration::ZERO))
            .unwrap_or_else(|| Duration::milliseconds(DEFAULT_MIN_RELIABLE_ETA_MS))
    }

    pub fn max_reliable_eta(&self) -> Duration {
        Duration::parse_milliseconds(self.max_reliable_eta_ms)
            .filter(|max| *max > self.min_reliable_eta())
            .unwrap_or_else(|| Duration::milliseconds(DEFAULT_MAX_RELIABLE_ETA_MS))
    }
}
