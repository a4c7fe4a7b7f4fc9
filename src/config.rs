use std::time::Duration;

use anyhow::{bail, Context};
use reqwest::Url;

pub const DEFAULT_BASE_URL: &str = "https://urbanwatch.tech";

const BASE_URL_VAR: &str = "URBANWATCH_API_URL";
const TIMEOUT_VAR: &str = "URBANWATCH_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    /// `None` leaves requests without a client-side timeout.
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let raw_url = lookup(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&raw_url)
            .with_context(|| format!("{BASE_URL_VAR} is not a usable base URL"))?;

        let timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{TIMEOUT_VAR} must be a whole number of seconds"))?;
                if secs == 0 {
                    bail!("{TIMEOUT_VAR} must be at least 1 second; unset it for no timeout");
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self { base_url, timeout })
    }

    pub fn with_base_url(mut self, raw: &str) -> anyhow::Result<Self> {
        self.base_url = parse_base_url(raw).context("--base-url is not a usable base URL")?;
        Ok(self)
    }
}

pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim().trim_end_matches('/'))
        .with_context(|| format!("invalid URL: {raw}"))?;
    if url.cannot_be_a_base() {
        bail!("URL cannot carry a path: {raw}");
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.base_url.as_str(), "https://urbanwatch.tech/");
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn reads_url_and_timeout() {
        let config = Config::from_lookup(lookup_from(&[
            ("URBANWATCH_API_URL", "http://localhost:8080/"),
            ("URBANWATCH_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn rejects_bad_timeout() {
        let result = Config::from_lookup(lookup_from(&[("URBANWATCH_TIMEOUT_SECS", "soon")]));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let result = Config::from_lookup(lookup_from(&[("URBANWATCH_TIMEOUT_SECS", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(parse_base_url("mailto:ops@urbanwatch.tech").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn override_replaces_base_url() {
        let config = Config::from_lookup(lookup_from(&[]))
            .unwrap()
            .with_base_url("https://staging.urbanwatch.tech/admin/")
            .unwrap();
        assert_eq!(config.base_url.path(), "/admin");
    }
}
