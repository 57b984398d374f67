//! # Settings Module
//!
//! ## Purpose
//! Parameters of a smoke-check run of the pair Green's function: physical constants of the
//! pair, the outer radii, the query point and how many repetitions/samples each check makes.
//! Settings are kept in a JSON file; a missing or broken file falls back to the defaults.
//!
//! ## Configuration Format
//! ```json
//! {
//!   "D": 1e-12,
//!   "kf": 1e-18,
//!   "sigma": 1e-8,
//!   "a_roots": 2e-6,
//!   "a": 6e-8,
//!   "r0": 5e-8,
//!   "t": 1e-7,
//!   "root_count": 100,
//!   "root_tolerance": 1e-8,
//!   "survival_repeats": 1000,
//!   "time_samples": 100000,
//!   "seed": null
//! }
//! ```
//!
//! ## Usage Pattern
//! ```rust
//! use PairGreens::settings::GFSettings;
//!
//! let settings = GFSettings::with_settings_file("gf_settings.json");
//! assert!(settings.validate().is_ok());
//! ```
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid setting {name}: {value}")]
    Invalid { name: &'static str, value: f64 },
}

/// Parameters of the smoke checks.
///
/// # Fields
/// * `D` - relative diffusion coefficient
/// * `kf` - intrinsic reaction rate
/// * `sigma` - contact radius
/// * `a_roots` - outer radius used by the root residual check
/// * `a` - outer radius used by the survival and time checks
/// * `r0` - initial separation
/// * `t` - time of the survival check
/// * `root_count`, `root_tolerance` - how many roots to verify and the allowed residual
/// * `survival_repeats` - repeated survival evaluations
/// * `time_samples` - number of drawn first-passage times
/// * `seed` - seed of the random source, entropy if absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
#[serde(default)]
pub struct GFSettings {
    pub D: f64,
    pub kf: f64,
    pub sigma: f64,
    pub a_roots: f64,
    pub a: f64,
    pub r0: f64,
    pub t: f64,
    pub root_count: usize,
    pub root_tolerance: f64,
    pub survival_repeats: usize,
    pub time_samples: usize,
    pub seed: Option<u64>,
}

impl Default for GFSettings {
    fn default() -> Self {
        Self {
            D: 1e-12,
            kf: 1e-18,
            sigma: 1e-8,
            a_roots: 2e-6,
            a: 6e-8,
            r0: 5e-8,
            t: 1e-7,
            root_count: 100,
            root_tolerance: 1e-8,
            survival_repeats: 1000,
            time_samples: 100_000,
            seed: None,
        }
    }
}

impl GFSettings {
    /// Loads settings from a JSON file
    pub fn load(path: &str) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        let settings: GFSettings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from `path`, falling back to the defaults if the file is missing or invalid
    pub fn with_settings_file(path: &str) -> Self {
        if !Path::new(path).exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Could not use settings file '{}': {}. Using defaults", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &str) -> Result<(), SettingsError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Checks the physical ranges: positive D and sigma, non-negative kf,
    /// outer radii above sigma, sigma <= r0 <= a, non-negative t
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [("D", self.D), ("sigma", self.sigma)];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SettingsError::Invalid { name, value });
            }
        }
        if !self.kf.is_finite() || self.kf < 0.0 {
            return Err(SettingsError::Invalid {
                name: "kf",
                value: self.kf,
            });
        }
        for (name, value) in [("a_roots", self.a_roots), ("a", self.a)] {
            if !value.is_finite() || value <= self.sigma {
                return Err(SettingsError::Invalid { name, value });
            }
        }
        if !self.r0.is_finite() || self.r0 < self.sigma || self.r0 > self.a {
            return Err(SettingsError::Invalid {
                name: "r0",
                value: self.r0,
            });
        }
        if !self.t.is_finite() || self.t < 0.0 {
            return Err(SettingsError::Invalid {
                name: "t",
                value: self.t,
            });
        }
        if !(self.root_tolerance >= 0.0) {
            return Err(SettingsError::Invalid {
                name: "root_tolerance",
                value: self.root_tolerance,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = GFSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.root_count, 100);
        assert_eq!(settings.a, 6e-8);
    }

    #[test]
    fn test_save_and_load() {
        let temp = NamedTempFile::new().unwrap();
        let path = temp.path().to_str().unwrap();
        let settings = GFSettings {
            time_samples: 10,
            seed: Some(12),
            ..GFSettings::default()
        };
        settings.save(path).unwrap();
        let loaded = GFSettings::load(path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(br#"{ "a": 8e-8, "seed": 3 }"#).unwrap();
        let loaded = GFSettings::load(temp.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded.a, 8e-8);
        assert_eq!(loaded.seed, Some(3));
        assert_eq!(loaded.D, 1e-12);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"not json").unwrap();
        let path = temp.path().to_str().unwrap();
        assert!(matches!(GFSettings::load(path), Err(SettingsError::Serde(_))));
        assert_eq!(GFSettings::with_settings_file(path), GFSettings::default());
        assert_eq!(
            GFSettings::with_settings_file("no_such_settings_file.json"),
            GFSettings::default()
        );
    }

    #[test]
    fn test_validate_rejects_outer_radius_below_sigma() {
        let settings = GFSettings {
            a: 5e-9,
            ..GFSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid { name: "a", .. })
        ));
        let settings = GFSettings {
            r0: 7e-8,
            ..GFSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid { name: "r0", .. })
        ));
    }
}
