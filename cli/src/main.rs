//! Tools for working with feeds of ambulance and fire unit reports without the dashboard. These
//! are bundled as a single executable.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod feed;
mod replay;
mod synthetic;

use anyhow::Result;
use chrono::{DateTime, Utc};
use structopt::StructOpt;

use geom::LonLat;
use route_progress::{to_time, Engine, EngineConfig};

#[derive(StructOpt)]
#[structopt(name = "dern", about = "Emergency unit tracking tools")]
enum Command {
    /// Generates a random feed of units driving to incidents around Cluj-Napoca
    SyntheticFeed {
        /// A seed for generating random numbers
        #[structopt(long, default_value = "42")]
        rng_seed: u64,
        /// How many units to simulate
        #[structopt(long, default_value = "5")]
        units: usize,
        /// How often each unit reports, in seconds
        #[structopt(long, default_value = "3")]
        interval_s: f64,
        /// The JSON file to write
        #[structopt(long)]
        output: String,
    },
    /// Plays a feed through the engine and writes where every unit is over time as GeoJSON
    Replay {
        /// The path to a JSON feed, like what synthetic-feed produces
        #[structopt(long)]
        input: String,
        #[structopt(flatten)]
        engine: EngineArgs,
        /// How often to sample unit positions, in milliseconds
        #[structopt(long, default_value = "1000")]
        step_ms: f64,
        /// The GeoJSON file to write
        #[structopt(long)]
        output: String,
    },
    /// Plays a feed through the engine, then lists the units closest to some point
    Nearest {
        /// The path to a JSON feed
        #[structopt(long)]
        input: String,
        #[structopt(flatten)]
        engine: EngineArgs,
        #[structopt(long)]
        lon: f64,
        #[structopt(long)]
        lat: f64,
        /// Stop playing the feed at this RFC 3339 timestamp. Defaults to the last report.
        #[structopt(long)]
        at: Option<DateTime<Utc>>,
    },
}

#[derive(StructOpt)]
struct EngineArgs {
    /// A JSON file with engine settings. Defaults are used for anything missing.
    #[structopt(long)]
    config: Option<String>,
    /// Overrides the speed assumed for units that don't report their own
    #[structopt(long)]
    default_speed_kmh: Option<f64>,
}

impl EngineArgs {
    fn load(&self) -> Result<EngineConfig> {
        let mut config = match self.config {
            Some(ref path) => dernutil::read_json(path)?,
            None => EngineConfig::default(),
        };
        if let Some(speed) = self.default_speed_kmh {
            config.default_speed_kmh = speed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    dernutil::logger::setup();

    match Command::from_args() {
        Command::SyntheticFeed {
            rng_seed,
            units,
            interval_s,
            output,
        } => synthetic::run(rng_seed, units, interval_s, output)?,
        Command::Replay {
            input,
            engine,
            step_ms,
            output,
        } => replay::run(input, engine.load()?, step_ms, output)?,
        Command::Nearest {
            input,
            engine,
            lon,
            lat,
            at,
        } => nearest(input, engine.load()?, LonLat::checked(lon, lat)?, at)?,
    }
    Ok(())
}

fn nearest(
    input: String,
    config: EngineConfig,
    pt: LonLat,
    at: Option<DateTime<Utc>>,
) -> Result<()> {
    let feed = feed::load(&input)?;
    let at = match at {
        Some(at) => at,
        None => feed[feed.len() - 1].at,
    };

    let mut engine = Engine::new(config);
    for msg in feed.iter().take_while(|msg| msg.at <= at) {
        feed::apply(&mut engine, msg);
    }

    let now = to_time(at);
    let candidates = engine.candidates(pt, now);
    if candidates.is_empty() {
        println!("Nobody has reported a position by {}", at);
        return Ok(());
    }
    for c in &candidates {
        println!(
            "{}: {} away, about {}{}",
            c.id,
            c.distance.describe(),
            c.eta,
            if c.available { "" } else { " (busy)" }
        );
    }
    match engine.nearest_available(pt, now) {
        Some((id, dist)) => println!("Send {}, {} away", id, dist.describe()),
        None => println!("Every unit is busy"),
    }
    Ok(())
}
