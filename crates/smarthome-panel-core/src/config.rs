use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::request::API_BASE_PATH;
use crate::trace::OUTPUT_ELEMENT_ID;

pub const ACTIVE_DEVICES_ELEMENT_ID: &str = "activeDevices";
pub const HOME_MODE_ELEMENT_ID: &str = "homeMode";

/// Page wiring for a [`crate::panel::ControlPanel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelConfig {
    pub api_base_path: String,
    pub output_element_id: String,
    pub active_devices_element_id: String,
    pub home_mode_element_id: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            api_base_path: API_BASE_PATH.to_string(),
            output_element_id: OUTPUT_ELEMENT_ID.to_string(),
            active_devices_element_id: ACTIVE_DEVICES_ELEMENT_ID.to_string(),
            home_mode_element_id: HOME_MODE_ELEMENT_ID.to_string(),
        }
    }
}

impl PanelConfig {
    /// Overrides the api base path. Blank values keep the current one.
    pub fn with_api_base_path(mut self, base_path: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(base_path) = base_path.map(str::trim).filter(|value| !value.is_empty()) {
            self.api_base_path = normalize_base_path(base_path)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_base_path(&self.api_base_path).map(|_| ())
    }
}

/// `/api/` → `/api`. Must be absolute; `/` collapses to the empty string so
/// requests go to the site root.
pub fn normalize_base_path(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('/') {
        return Err(ConfigError::InvalidBasePath);
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_page_markup() {
        let config = PanelConfig::default();
        assert_eq!(config.api_base_path, "/api");
        assert_eq!(config.output_element_id, "output");
        assert_eq!(config.active_devices_element_id, "activeDevices");
        assert_eq!(config.home_mode_element_id, "homeMode");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config: PanelConfig =
            serde_json::from_str(r#"{"apiBasePath": "/backend", "outputElementId": "log"}"#)
                .expect("config parses");
        assert_eq!(config.api_base_path, "/backend");
        assert_eq!(config.output_element_id, "log");
        assert_eq!(config.home_mode_element_id, "homeMode");
    }

    #[test]
    fn base_path_override_is_normalized() {
        let config = PanelConfig::default()
            .with_api_base_path(Some(" /smarthome/api/ "))
            .expect("valid path");
        assert_eq!(config.api_base_path, "/smarthome/api");

        let unchanged = PanelConfig::default()
            .with_api_base_path(Some("   "))
            .expect("blank is ignored");
        assert_eq!(unchanged.api_base_path, "/api");

        assert_eq!(
            PanelConfig::default().with_api_base_path(Some("api")),
            Err(ConfigError::InvalidBasePath)
        );
        assert_eq!(normalize_base_path("/"), Ok(String::new()));
    }
}
