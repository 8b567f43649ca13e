//! Animates emergency units along their road routes. Live reports from the dispatch backend say
//! where a unit is and roughly when it'll arrive; in between reports, this produces smooth
//! positions and countdowns for every unit, and folds each new report in without making the unit
//! jump back to the start of its route.
//!
//! Everything here is synchronous and owned by one `Engine`. Fetching routes and listening to the
//! live stream happen elsewhere; the results are fed in through `Engine::upsert`.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;
mod dispatch;
mod engine;
mod entity;
mod report;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use crate::config::EngineConfig;
pub use crate::dispatch::{is_arrived, is_available, straight_line_eta, Candidate};
pub use crate::engine::Engine;
pub use crate::entity::{Animation, AnimationState, DurationHint, Sample, TrackedEntity};
pub use crate::report::{to_time, PositionReport, RouteGeometry};

/// The backend's identifier for an ambulance or fire unit.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitID(pub String);

impl From<&str> for UnitID {
    fn from(x: &str) -> UnitID {
        UnitID(x.to_string())
    }
}

impl fmt::Display for UnitID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unit {}", self.0)
    }
}
