use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use route_progress::{is_arrived, to_time, Engine, PositionReport, UnitID};

/// One message off the live stream, stamped with when it arrived.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimedReport {
    pub at: DateTime<Utc>,
    pub id: UnitID,
    pub report: PositionReport,
}

/// Reads a feed from a JSON file, in the order the messages arrived.
pub fn load(path: &str) -> Result<Vec<TimedReport>> {
    let mut feed: Vec<TimedReport> = dernutil::read_json(path)?;
    if feed.is_empty() {
        bail!("{} has no reports", path);
    }
    // Stable, so reports with the same timestamp keep their order
    feed.sort_by_key(|r| r.at);
    Ok(feed)
}

/// Feeds one message into the engine, the way the dashboard handles the live stream. Units that
/// report they've arrived stop animating. Bad reports are logged and skipped.
pub fn apply(engine: &mut Engine, msg: &TimedReport) {
    if let Err(err) = engine.upsert(msg.id.clone(), &msg.report, to_time(msg.at)) {
        warn!("Skipping report about {} at {}: {}", msg.id, msg.at, err);
        return;
    }
    if msg.report.status.as_deref().map(is_arrived).unwrap_or(false) {
        engine.clear_route(&msg.id);
    }
}
