use std::io::Write;

use anyhow::{Context, Result};
use fs_err::File;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn to_json<T: Serialize>(obj: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(obj)?)
}

/// Writes pretty JSON to a file, creating the parent directory if needed.
pub fn write_json<T: Serialize>(path: &str, obj: &T) -> Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs_err::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(path)?;
    file.write_all(to_json(obj)?.as_bytes())?;
    log::info!("Wrote {}", path);
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let contents = fs_err::read_to_string(path)?;
    let obj = serde_json::from_str(&contents).with_context(|| format!("parsing {}", path))?;
    Ok(obj)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn json_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("dernutil_test_{}", std::process::id()))
            .join("speeds.json");
        let path = path.to_str().unwrap();

        let mut speeds = BTreeMap::new();
        speeds.insert("AMB-1".to_string(), 40.0);
        speeds.insert("FIRE-7".to_string(), 60.0);
        write_json(path, &speeds).unwrap();
        let loaded: BTreeMap<String, f64> = read_json(path).unwrap();
        assert_eq!(loaded, speeds);

        assert!(read_json::<BTreeMap<String, f64>>("/definitely/not/here.json").is_err());
    }
}
