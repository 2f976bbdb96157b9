use std::path::PathBuf;

use anyhow::{Context, Result};
use url::Url;

const DEFAULT_API_URL: &str = "https://app.pipedeck.io/pipeline/api/";
const DEFAULT_LOG_URL: &str = "https://app.pipedeck.io/log-service/";

/// Application configuration, read once from the environment at startup and
/// passed to constructors from there.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub account: String,
    pub org: String,
    pub project: String,
    pub api_url: Url,
    pub log_url: Url,
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: require("PIPEDECK_API_KEY")?,
            account: require("PIPEDECK_ACCOUNT")?,
            org: require("PIPEDECK_ORG")?,
            project: require("PIPEDECK_PROJECT")?,
            api_url: base_url("PIPEDECK_API_URL", DEFAULT_API_URL)?,
            log_url: base_url("PIPEDECK_LOG_URL", DEFAULT_LOG_URL)?,
            data_dir: utils::assets::data_dir(),
        })
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

/// Base URLs must end with a slash so endpoint joins keep the full path.
fn base_url(name: &str, default: &str) -> Result<Url> {
    let mut raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).with_context(|| format!("{name} is not a valid url: {raw}"))
}
