use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use doping_chart::{parse_records, Record};
use tracing::debug;

/// Where the dataset comes from: the published URL or a local copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl DataSource {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            DataSource::Url(trimmed.to_string())
        } else {
            DataSource::File(PathBuf::from(trimmed))
        }
    }

    pub fn load(&self, timeout: Duration) -> Result<Vec<Record>> {
        let bytes = match self {
            DataSource::Url(url) => fetch_url(url, timeout)?,
            DataSource::File(path) => {
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?
            }
        };
        debug!("read {} bytes from {}", bytes.len(), self);
        parse_records(&bytes).with_context(|| format!("failed to parse {}", self))
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(url) => f.write_str(url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn fetch_url(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")?;
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("request to {} failed", url))?
        .error_for_status()
        .with_context(|| format!("{} returned an error status", url))?;
    let body = response
        .bytes()
        .with_context(|| format!("failed to read body from {}", url))?;
    Ok(body.to_vec())
}
