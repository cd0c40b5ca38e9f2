// Runtime configuration.
// Resolves the API token, endpoint, and cache location from the environment.

use std::path::PathBuf;

use crate::cache::DEFAULT_CACHE_DIR;
use crate::error::{Result, SlackstatError};
use crate::slack::SLACK_API_BASE;

pub const TOKEN_VAR: &str = "SLACK_API_TOKEN";
pub const API_BASE_VAR: &str = "SLACK_API_BASE";
pub const CACHE_DIR_VAR: &str = "SLACKSTAT_CACHE_DIR";

#[derive(Clone, Debug)]
pub struct Config {
    /// Bot or user token sent as a bearer credential.
    pub token: String,
    /// Base URL of the Web API, without a trailing slash.
    pub api_base: String,
    /// Directory holding one file per cached dataset.
    pub cache_dir: PathBuf,
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup(TOKEN_VAR)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(SlackstatError::MissingToken)?;

        let api_base = lookup(API_BASE_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| SLACK_API_BASE.to_string());

        let cache_dir = lookup(CACHE_DIR_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));

        Ok(Self {
            token,
            api_base,
            cache_dir,
        })
    }
}
