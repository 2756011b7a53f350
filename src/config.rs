use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use log::{info, warn};

use crate::error::{Error, Result};

pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_DATA_PATH: &str = "database/size_records.bin.gz";
pub const DEFAULT_ORIGINS: &str = "http://localhost:5173,http://localhost:8080";

/// Server settings read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    /// Snapshot file for the record store; `None` keeps records in memory.
    pub data_path: Option<PathBuf>,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load from `SIZE_SORTER_ADDR`, `SIZE_SORTER_DATA` and `SIZE_SORTER_ORIGINS`.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let addr = try_load(&lookup, "SIZE_SORTER_ADDR", DEFAULT_ADDR)?;

        let data: String = try_load(&lookup, "SIZE_SORTER_DATA", DEFAULT_DATA_PATH)?;
        let data_path = if data.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(data.trim()))
        };

        let origins: String = try_load(&lookup, "SIZE_SORTER_ORIGINS", DEFAULT_ORIGINS)?;
        let allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Config {
            addr,
            data_path,
            allowed_origins,
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T>
where
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        Error::Config {
            key: key.to_string(),
            reason: e.to_string(),
        }
    })
}
