use crate::error::{Result, ValproError};
use crate::paths;
use crate::types::CarType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// BackendConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// YAML files on local disk; `data_dir` is relative to the project root.
    File {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data_dir: Option<PathBuf>,
    },
    Http {
        base_url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::File { data_dir: None }
    }
}

impl BackendConfig {
    pub fn resolved_data_dir(&self, root: &Path) -> Option<PathBuf> {
        match self {
            BackendConfig::File { data_dir: Some(dir) } => Some(root.join(dir)),
            BackendConfig::File { data_dir: None } => Some(paths::data_dir(root)),
            BackendConfig::Http { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// PricingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_small_fee")]
    pub small: u64,
    #[serde(default = "default_big_fee")]
    pub big: u64,
}

fn default_small_fee() -> u64 {
    4000
}

fn default_big_fee() -> u64 {
    6000
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            small: default_small_fee(),
            big: default_big_fee(),
        }
    }
}

impl PricingConfig {
    /// Valuation fee for a vehicle class; unclassified vehicles pay the small fee.
    pub fn price_for(&self, car_type: Option<CarType>) -> u64 {
        match car_type {
            Some(CarType::Big) => self.big,
            Some(CarType::Small) | None => self.small,
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Share of the client's payment passed on to the valuer.
    #[serde(default = "default_payout_share")]
    pub payout_share_percent: u8,
    #[serde(default)]
    pub default_open_bidding: bool,
}

fn default_version() -> u32 {
    1
}

fn default_payout_share() -> u8 {
    80
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            backend: BackendConfig::default(),
            pricing: PricingConfig::default(),
            payout_share_percent: default_payout_share(),
            default_open_bidding: false,
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        crate::io::read_yaml(&paths::config_path(root))?.ok_or(ValproError::NotInitialized)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        crate::io::write_yaml(&paths::config_path(root), self)
    }

    /// Valuer payout for a job paid `payment`, rounded down.
    pub fn payout_for(&self, payment: u64) -> u64 {
        payment * u64::from(self.payout_share_percent.min(100)) / 100
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.payout_share_percent > 100 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "payout_share_percent={} exceeds 100; payouts are capped at the payment",
                    self.payout_share_percent
                ),
            });
        }

        if self.pricing.small == 0 || self.pricing.big == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "pricing fees must be positive".to_string(),
            });
        } else if self.pricing.big < self.pricing.small {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "big vehicle fee ({}) is lower than small vehicle fee ({})",
                    self.pricing.big, self.pricing.small
                ),
            });
        }

        if let BackendConfig::Http {
            base_url,
            timeout_secs,
        } = &self.backend
        {
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("backend.base_url '{base_url}' is not an http(s) URL"),
                });
            }
            if *timeout_secs == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "backend.timeout_secs=0 disables the request timeout".to_string(),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
