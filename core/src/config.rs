use crate::{
    customer::{CustomerSchema, CustomerStatus, RiskLevel},
    error::{DashError, DashResult},
    types::Label,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const ENV_API_URL: &str = "BANKDASH_API_URL";
pub const ENV_TIMEOUT_MS: &str = "BANKDASH_TIMEOUT_MS";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// What `ensure_populated` does when the backend legitimately returns
/// zero customers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyResultPolicy {
    /// Treat an empty result as "not populated"; the next call fetches again.
    Refetch,
    /// Store the empty result; only `clear_cache`/`refresh` fetch again.
    #[default]
    Keep,
}

/// Half-open score interval `[min, max)`. A missing bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl ScoreRange {
    pub const fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, score: f64) -> bool {
        self.min.map_or(true, |min| score >= min) && self.max.map_or(true, |max| score < max)
    }
}

/// Maps a qualitative risk level onto a score sub-range.
/// Lower scores mean higher risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBands {
    pub low: ScoreRange,
    pub medium: ScoreRange,
    pub high: ScoreRange,
}

impl RiskBands {
    /// Bands for a 0–10 score: low ≥ 8, medium 5–8, high < 5.
    pub const fn ten_point() -> Self {
        Self {
            low: ScoreRange::new(Some(8.0), None),
            medium: ScoreRange::new(Some(5.0), Some(8.0)),
            high: ScoreRange::new(None, Some(5.0)),
        }
    }

    /// Bands for a 0–1 probability score: low ≥ 0.8, medium 0.5–0.8, high < 0.5.
    pub const fn probability() -> Self {
        Self {
            low: ScoreRange::new(Some(0.8), None),
            medium: ScoreRange::new(Some(0.5), Some(0.8)),
            high: ScoreRange::new(None, Some(0.5)),
        }
    }

    pub fn for_level(&self, level: RiskLevel) -> &ScoreRange {
        match level {
            RiskLevel::Low => &self.low,
            RiskLevel::Medium => &self.medium,
            RiskLevel::High => &self.high,
        }
    }
}

impl Default for RiskBands {
    fn default() -> Self {
        Self::ten_point()
    }
}

/// Status → segment label table used by the scored schema, which has no
/// status field of its own.
pub fn default_status_map() -> HashMap<CustomerStatus, Label> {
    HashMap::from([
        (CustomerStatus::Inactive, 0),
        (CustomerStatus::Active, 1),
        (CustomerStatus::Suspended, 2),
    ])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub schema: CustomerSchema,
    pub empty_result_policy: EmptyResultPolicy,
    pub status_map: HashMap<CustomerStatus, Label>,
    pub risk_bands: RiskBands,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            schema: CustomerSchema::Scored,
            empty_result_policy: EmptyResultPolicy::Keep,
            status_map: default_status_map(),
            risk_bands: RiskBands::ten_point(),
        }
    }
}

impl DashConfig {
    /// Load configuration from a JSON file, then apply environment overrides.
    pub fn load(path: &str) -> DashResult<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// As [`load`](Self::load), reading overrides through `lookup`.
    pub fn load_with<F>(path: &str, lookup: F) -> DashResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = std::fs::read_to_string(path).map_err(|source| DashError::ConfigRead {
            path: path.to_string(),
            source,
        })?;
        let mut config: DashConfig = serde_json::from_str(&content)?;
        config.apply_overrides(lookup)?;
        config.validate()?;
        log::info!("config: loaded {path} (schema={:?})", config.schema);
        Ok(config)
    }

    /// Defaults plus environment overrides; used when no file is given.
    pub fn from_env() -> DashResult<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Minimal config for tests: short timeout, ten-point scored schema.
    pub fn default_test() -> Self {
        Self {
            request_timeout_ms: 2_000,
            ..Self::default()
        }
    }

    /// Apply `BANKDASH_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> DashResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            log::debug!("config: {ENV_API_URL} overrides base_url");
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            self.request_timeout_ms = raw.trim().parse().map_err(|_| {
                DashError::InvalidConfig(format!("{ENV_TIMEOUT_MS} must be an integer, got '{raw}'"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> DashResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(DashError::InvalidConfig("base_url is empty".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(DashError::InvalidConfig("request_timeout_ms must be > 0".into()));
        }
        for (name, range) in [
            ("low", &self.risk_bands.low),
            ("medium", &self.risk_bands.medium),
            ("high", &self.risk_bands.high),
        ] {
            if let (Some(min), Some(max)) = (range.min, range.max) {
                if min >= max {
                    return Err(DashError::InvalidConfig(format!(
                        "risk band '{name}' is empty: min {min} >= max {max}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_point_bands_match_integer_scores() {
        let bands = RiskBands::ten_point();
        assert!(bands.low.contains(10.0));
        assert!(bands.low.contains(8.0));
        assert!(bands.medium.contains(7.0));
        assert!(bands.medium.contains(7.5));
        assert!(bands.high.contains(4.0));
        assert!(bands.high.contains(4.5));
        assert!(!bands.high.contains(5.0));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: DashConfig =
            serde_json::from_str(r#"{ "schema": "account", "risk_bands": {
                "low":    { "min": 0.8 },
                "medium": { "min": 0.5, "max": 0.8 },
                "high":   { "max": 0.5 } } }"#)
                .unwrap();
        assert_eq!(config.schema, CustomerSchema::Account);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.risk_bands, RiskBands::probability());
        assert_eq!(config.status_map.get(&CustomerStatus::Active), Some(&1));
    }

    #[test]
    fn overrides_replace_url_and_timeout() {
        let mut config = DashConfig::default();
        config
            .apply_overrides(|key| match key {
                ENV_API_URL => Some("http://backend:9000".into()),
                ENV_TIMEOUT_MS => Some("250".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.base_url, "http://backend:9000");
        assert_eq!(config.request_timeout_ms, 250);
    }

    #[test]
    fn bad_timeout_override_is_rejected() {
        let mut config = DashConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_TIMEOUT_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, DashError::InvalidConfig(_)));
    }

    fn write_temp_config(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir()
            .join(format!("bankdash-{name}-{}.json", std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = DashConfig::load_with("/nonexistent/bankdash/dash.json", |_| None).unwrap_err();
        assert!(
            matches!(err, DashError::ConfigRead { ref path, .. } if path.ends_with("dash.json")),
            "{err}"
        );
    }

    #[test]
    fn environment_wins_over_file_values() {
        let path = write_temp_config(
            "env-wins",
            r#"{ "base_url": "http://from-file:8000", "request_timeout_ms": 5000, "schema": "account" }"#,
        );
        let config = DashConfig::load_with(path.to_str().unwrap(), |key| match key {
            ENV_API_URL => Some("http://from-env:9000".into()),
            _ => None,
        })
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.base_url, "http://from-env:9000");
        assert_eq!(config.request_timeout_ms, 5000);
        assert_eq!(config.schema, CustomerSchema::Account);
    }

    #[test]
    fn malformed_file_is_a_serialization_error() {
        let path = write_temp_config("malformed", "{ not json");
        let err = DashConfig::load_with(path.to_str().unwrap(), |_| None).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, DashError::Serialization(_)), "{err}");
    }

    #[test]
    fn inverted_band_fails_validation() {
        let mut config = DashConfig::default();
        config.risk_bands.medium = ScoreRange::new(Some(8.0), Some(5.0));
        assert!(config.validate().is_err());
    }
}
