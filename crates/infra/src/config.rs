//! Configuration loading.
//!
//! Inspection names and sequence codes come from the environment; anything
//! unset keeps the built-in default.

use std::env;

use thiserror::Error;
use tracing::warn;

use batchline_inventory::InspectionSettings;

pub const QC_LOCATION_VAR: &str = "BATCHLINE_QC_LOCATION";
pub const RETENTION_LOCATION_VAR: &str = "BATCHLINE_RETENTION_LOCATION";
pub const REPORT_SEQUENCE_VAR: &str = "BATCHLINE_REPORT_SEQUENCE";
pub const LINE_SEQUENCE_VAR: &str = "BATCHLINE_LINE_SEQUENCE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is not valid unicode")]
    NotUnicode(&'static str),

    /// Samples would be moved into the location they are retained in.
    #[error("quality check and retention locations must differ, both are '{0}'")]
    SameLocation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectionConfig {
    pub settings: InspectionSettings,
}

impl InspectionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => Err(()),
        })
    }

    /// Build from an arbitrary variable source. `Err(())` marks a value that
    /// exists but cannot be read.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Result<Option<String>, ()>,
    {
        let defaults = InspectionSettings::default();
        let read = |key: &'static str, default: String| -> Result<String, ConfigError> {
            match lookup(key).map_err(|()| ConfigError::NotUnicode(key))? {
                None => Ok(default),
                Some(value) if value.trim().is_empty() => {
                    warn!(variable = key, default = %default, "empty configuration value, using default");
                    Ok(default)
                }
                Some(value) => Ok(value.trim().to_string()),
            }
        };

        let settings = InspectionSettings {
            quality_check_location: read(QC_LOCATION_VAR, defaults.quality_check_location)?,
            retention_location: read(RETENTION_LOCATION_VAR, defaults.retention_location)?,
            report_sequence_code: read(REPORT_SEQUENCE_VAR, defaults.report_sequence_code)?,
            line_sequence_code: read(LINE_SEQUENCE_VAR, defaults.line_sequence_code)?,
        };
        if settings.quality_check_location == settings.retention_location {
            return Err(ConfigError::SameLocation(settings.retention_location));
        }
        Ok(Self { settings })
    }

    pub fn into_settings(self) -> InspectionSettings {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&'static str, &str)]) -> Result<InspectionConfig, ConfigError> {
        let vars: HashMap<&str, String> = vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        InspectionConfig::from_lookup(|key| Ok(vars.get(key).cloned()))
    }

    #[test]
    fn unset_variables_keep_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.settings, InspectionSettings::default());
    }

    #[test]
    fn set_variables_override_defaults() {
        let config = load(&[
            (QC_LOCATION_VAR, "QC Bay"),
            (REPORT_SEQUENCE_VAR, " qc.report "),
        ])
        .unwrap();
        assert_eq!(config.settings.quality_check_location, "QC Bay");
        assert_eq!(config.settings.report_sequence_code, "qc.report");
        assert_eq!(config.settings.retention_location, "Retain Sample");
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config = load(&[(LINE_SEQUENCE_VAR, "  ")]).unwrap();
        assert_eq!(config.settings.line_sequence_code, "inspection.report.line");
    }

    #[test]
    fn same_qc_and_retention_location_is_rejected() {
        let err = load(&[(QC_LOCATION_VAR, "Shelf"), (RETENTION_LOCATION_VAR, "Shelf")]).unwrap_err();
        assert_eq!(err, ConfigError::SameLocation("Shelf".to_string()));
    }

    #[test]
    fn unreadable_value_is_reported() {
        let err = InspectionConfig::from_lookup(|key| {
            if key == RETENTION_LOCATION_VAR { Err(()) } else { Ok(None) }
        })
        .unwrap_err();
        assert_eq!(err, ConfigError::NotUnicode(RETENTION_LOCATION_VAR));
    }
}
