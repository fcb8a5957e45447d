// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ML_URL: &str = "http://localhost:8000";
pub const DEFAULT_ML_TIMEOUT_SECS: u64 = 5;

/// Process-wide settings, resolved once from the global CLI flags (which fall
/// back to `FINTRACK_*` environment variables) and handed to the components
/// that need them.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: Option<PathBuf>,
    pub user_id: i64,
    pub ml_url: String,
    pub ml_timeout: Duration,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: None,
            user_id: 1,
            ml_url: DEFAULT_ML_URL.to_string(),
            ml_timeout: Duration::from_secs(DEFAULT_ML_TIMEOUT_SECS),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_matches(m: &clap::ArgMatches) -> Result<Self> {
        let defaults = Config::default();
        let ml_url = m
            .get_one::<String>("ml_url")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.ml_url);
        let timeout_secs = m
            .get_one::<u64>("ml_timeout")
            .copied()
            .unwrap_or(DEFAULT_ML_TIMEOUT_SECS);
        if timeout_secs == 0 {
            anyhow::bail!("--ml-timeout must be at least 1 second");
        }
        Ok(Config {
            db_path: m.get_one::<PathBuf>("db").cloned(),
            user_id: m.get_one::<i64>("user").copied().unwrap_or(defaults.user_id),
            ml_url,
            ml_timeout: Duration::from_secs(timeout_secs),
            log_level: m
                .get_one::<String>("log_level")
                .cloned()
                .unwrap_or(defaults.log_level),
        })
    }

    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        match self.db_path {
            Some(ref p) => Ok(p.clone()),
            None => crate::db::default_db_path().context("Resolve default ledger location"),
        }
    }
}
