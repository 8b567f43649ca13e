//! Small helpers shared by the dispatch tools: logging setup and reading/writing JSON files.

mod io;
pub mod logger;

pub use crate::io::{read_json, to_json, write_json};
