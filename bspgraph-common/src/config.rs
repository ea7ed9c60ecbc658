use crate::error::{BspError, BspResult};
use std::collections::HashMap;
use std::str::FromStr;

pub const START_VERTEX: &str = "sssp.start.vertex";
pub const PARTITIONS: &str = "bsp.partitions";
pub const PARALLELISM: &str = "bsp.parallelism";
pub const MAX_SUPERSTEPS: &str = "bsp.max.supersteps";
pub const INPUT_PATHS: &str = "bsp.input.paths";
pub const OUTPUT_DIR: &str = "bsp.output.dir";
pub const JOB_NAME: &str = "bsp.job.name";
/// Keep the state reached at `bsp.max.supersteps` instead of failing.
pub const ALLOW_PARTIAL: &str = "bsp.allow.partial";
pub const COMBINE_MESSAGES: &str = "bsp.combine.messages";

#[derive(Debug, Clone, Default)]
pub struct Configuration {
    config: HashMap<String, String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self {
            config: HashMap::new(),
        }
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.config.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.config.get(key)
    }

    pub fn get_string(&self, key: &str, default_value: &str) -> String {
        self.config
            .get(key)
            .cloned()
            .unwrap_or_else(|| default_value.to_string())
    }

    /// Parses `key` as `T`, `None` when the key is absent.
    pub fn get_parsed<T>(&self, key: &str) -> BspResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.config
            .get(key)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| {
                    BspError::InvalidArgument(format!("config {key}={raw:?}: {e}"))
                })
            })
            .transpose()
    }

    pub fn get_u64(&self, key: &str, default_value: u64) -> BspResult<u64> {
        Ok(self.get_parsed(key)?.unwrap_or(default_value))
    }

    pub fn get_usize(&self, key: &str, default_value: usize) -> BspResult<usize> {
        Ok(self.get_parsed(key)?.unwrap_or(default_value))
    }

    pub fn get_bool(&self, key: &str, default_value: bool) -> BspResult<bool> {
        Ok(self.get_parsed(key)?.unwrap_or(default_value))
    }

    /// Comma separated list, empty entries dropped.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.config
            .get(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
