use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One line of the store file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    #[serde(rename = "ip1")]
    pub primary: String,
    #[serde(rename = "ip2")]
    pub secondary: String,
}

impl Record {
    pub fn new(name: &str, primary: &str, secondary: &str) -> Record {
        Record {
            name: name.to_string(),
            primary: primary.to_string(),
            secondary: secondary.to_string(),
        }
    }

    pub fn addresses(&self) -> AddressPair {
        AddressPair {
            primary: self.primary.clone(),
            secondary: self.secondary.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressPair {
    pub primary: String,
    pub secondary: String,
}

pub type Catalog = BTreeMap<String, AddressPair>;

// written on first run, when the store is absent or holds no valid record
const SEED: [(&str, &str, &str); 10] = [
    ("Electero", "78.157.42.101", "78.157.42.100"),
    ("Shecan", "185.51.200.2", "178.22.122.100"),
    ("Radar", "10.202.10.10", "10.202.10.11"),
    ("403", "10.202.10.202", "10.202.10.102"),
    ("Begzar", "185.55.226.26", "185.55.225.25"),
    ("Shelter", "94.103.125.157", "94.103.125.158"),
    ("Beshkan", "181.41.194.177", "181.41.194.186"),
    ("Pishgaman", "5.202.100.100", "5.202.100.101"),
    ("Level3", "209.244.0.3", "209.244.0.4"),
    ("Google", "8.8.8.8", "8.8.4.4"),
];

pub fn seed_records() -> Vec<Record> {
    SEED.iter()
        .map(|(name, primary, secondary)| Record::new(name, primary, secondary))
        .collect()
}

fn parse_line(raw: &[u8]) -> Option<Record> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line,
        Err(e) => {
            log::debug!("skip store line that is not utf-8: {}", e);
            return None;
        }
    };
    match serde_json::from_str::<Record>(line) {
        Ok(record) if !record.name.is_empty() => Some(record),
        Ok(_) => {
            log::debug!("skip store line with empty name: {}", line);
            None
        }
        Err(e) => {
            log::debug!("skip malformed store line {:?}: {}", line, e);
            None
        }
    }
}

fn write_record(w: &mut impl Write, record: &Record) -> Result<()> {
    let line = serde_json::to_string(record)
        .with_context(|| format!("failed to serialize dns entry {}", record.name))?;
    w.write_all(line.as_bytes())
        .and_then(|_| w.write_all(b"\n"))
        .with_context(|| format!("failed to write dns entry {}", record.name))
}

/// Line-delimited JSON file backing the provider catalog. The file is
/// opened and closed again for every operation.
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl AsRef<Path>) -> Store {
        Store {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Catalog, Error> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                log::info!(
                    "cannot open {}: {}, writing default dns list",
                    self.path.display(),
                    e
                );
                return self.initialize_default();
            }
        };

        let mut catalog = Catalog::new();
        // split on raw bytes so one bad line does not end the scan
        for line in io::BufReader::new(file).split(b'\n') {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("failed to read {}: {}", self.path.display(), e);
                    break;
                }
            };
            if let Some(record) = parse_line(&line) {
                catalog.insert(record.name.clone(), record.addresses());
            }
        }

        if catalog.is_empty() {
            log::info!(
                "no dns entry found in {}, writing default dns list",
                self.path.display()
            );
            return self.initialize_default();
        }
        log::debug!("loaded {} dns entries from {}", catalog.len(), self.path.display());
        Ok(catalog)
    }

    /// Recreates the store with the seed list. Failing to create the file is
    /// the only fatal outcome; a seed entry that cannot be written is logged
    /// and the rest still go out.
    pub fn initialize_default(&self) -> Result<Catalog, Error> {
        let mut file = fs::File::create(&self.path).map_err(|e| {
            Error::Fatal(format!(
                "could not create new file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let mut catalog = Catalog::new();
        for record in seed_records() {
            catalog.insert(record.name.clone(), record.addresses());
            if let Err(e) = write_record(&mut file, &record) {
                log::warn!("{:#}", e);
            }
        }
        Ok(catalog)
    }

    pub fn append(&self, record: &Record) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        write_record(&mut file, record)
    }
}
