use std::fmt;
use std::fs;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_STORE_FILE: &str = "dnslist.jsonl";
pub const DEFAULT_PROBE_ADDRESS: &str = "4.2.2.4";
pub const DEFAULT_PROBE_COUNT: u32 = 4;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub store_file: String,
    pub probe_address: String,
    pub probe_count: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store_file: DEFAULT_STORE_FILE.to_string(),
            probe_address: DEFAULT_PROBE_ADDRESS.to_string(),
            probe_count: DEFAULT_PROBE_COUNT,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match serde_json::to_string_pretty(self) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl Config {
    pub fn from_file(file: &str) -> Result<Config> {
        let conf_str = fs::read_to_string(file)
            .with_context(|| format!("failed to read config file {}", file))?;
        let conf: Config = serde_json::from_str(&conf_str)
            .with_context(|| format!("failed to parse config file {}", file))?;
        if conf.probe_count == 0 {
            anyhow::bail!("probe_count in {} must be at least 1", file);
        }
        Ok(conf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_conf(content: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, content).expect("write");
        let path = path.to_string_lossy().into_owned();
        (dir, path)
    }

    #[test]
    fn missing_fields_use_defaults() {
        let (_dir, path) = write_conf(r#"{"store_file": "C:\\dns\\list.jsonl"}"#);
        let conf = Config::from_file(&path).expect("config");
        assert_eq!(conf.store_file, "C:\\dns\\list.jsonl");
        assert_eq!(conf.probe_address, DEFAULT_PROBE_ADDRESS);
        assert_eq!(conf.probe_count, DEFAULT_PROBE_COUNT);
    }

    #[test]
    fn full_config() {
        let (_dir, path) =
            write_conf(r#"{"store_file": "a.jsonl", "probe_address": "1.1.1.1", "probe_count": 2}"#);
        let conf = Config::from_file(&path).expect("config");
        assert_eq!(
            conf,
            Config {
                store_file: "a.jsonl".to_string(),
                probe_address: "1.1.1.1".to_string(),
                probe_count: 2,
            }
        );
    }

    #[test]
    fn rejects_bad_config() {
        let (_dir, path) = write_conf("{ not json");
        let err = Config::from_file(&path).expect_err("should fail");
        assert!(format!("{:#}", err).contains("failed to parse config file"));

        let (_dir, path) = write_conf(r#"{"probe_count": 0}"#);
        assert!(Config::from_file(&path).is_err());

        assert!(Config::from_file("/nonexistent/dnsswitch/config.json").is_err());
    }
}
