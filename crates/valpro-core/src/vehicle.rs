use crate::error::{Result, ValproError};
use crate::types::CarType;
use chrono::{Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Year of the first production automobile; nothing older is valued.
const EARLIEST_MODEL_YEAR: i32 = 1886;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_type: Option<CarType>,
    pub location: Location,
}

static VIN_RE: OnceLock<Regex> = OnceLock::new();

fn vin_re() -> &'static Regex {
    VIN_RE.get_or_init(|| Regex::new(r"^[A-Z0-9]{5,17}$").unwrap())
}

impl Vehicle {
    pub fn validate(&self) -> Result<()> {
        if self.make.trim().is_empty() {
            return Err(ValproError::Validation("vehicle make is required".into()));
        }
        if self.model.trim().is_empty() {
            return Err(ValproError::Validation("vehicle model is required".into()));
        }
        let latest = Utc::now().year() + 1;
        if self.year < EARLIEST_MODEL_YEAR || self.year > latest {
            return Err(ValproError::Validation(format!(
                "vehicle year {} outside {EARLIEST_MODEL_YEAR}..={latest}",
                self.year
            )));
        }
        if !vin_re().is_match(&self.vin) {
            return Err(ValproError::Validation(format!(
                "VIN '{}' must be 5-17 uppercase letters or digits",
                self.vin
            )));
        }
        if !(-90.0..=90.0).contains(&self.location.lat)
            || !(-180.0..=180.0).contains(&self.location.lng)
        {
            return Err(ValproError::Validation(format!(
                "coordinates ({}, {}) out of range",
                self.location.lat, self.location.lng
            )));
        }
        if self.location.address.trim().is_empty() {
            return Err(ValproError::Validation("vehicle address is required".into()));
        }
        Ok(())
    }

    /// `2021 Toyota Camry`
    pub fn title(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }
}
