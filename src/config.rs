//! Runtime configuration
use super::error::ConfigError;
use super::registry::FieldMapRegistry;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const APP_ID_VAR: &str = "EDI_ORACLE_APP_ID";
pub const FIELD_MAPS_VAR: &str = "EDI_ORACLE_FIELD_MAPS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OracleConfig {
    /// Application id of the deployed oracle contract.
    pub app_id: u64,
    /// Mapping file to load instead of the builtin one.
    #[serde(default)]
    pub field_maps: Option<PathBuf>,
}

impl OracleConfig {
    pub fn new(app_id: u64) -> Self {
        Self {
            app_id,
            field_maps: None,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw = lookup(APP_ID_VAR).ok_or(ConfigError::InvalidEnv {
            name: APP_ID_VAR,
            reason: "not set".into(),
        })?;
        let app_id = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            name: APP_ID_VAR,
            reason: format!("'{raw}' is not an application id"),
        })?;
        let field_maps = lookup(FIELD_MAPS_VAR)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self { app_id, field_maps })
    }

    pub fn registry(&self) -> Result<FieldMapRegistry, ConfigError> {
        match &self.field_maps {
            Some(path) => FieldMapRegistry::from_path(path),
            None => FieldMapRegistry::builtin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn reads_app_id_and_optional_mapping() {
        let config =
            OracleConfig::from_lookup(lookup(&[(APP_ID_VAR, "1001"), (FIELD_MAPS_VAR, "")]))
                .unwrap();
        assert_eq!(config, OracleConfig::new(1001));

        let config = OracleConfig::from_lookup(lookup(&[
            (APP_ID_VAR, " 7 "),
            (FIELD_MAPS_VAR, "/etc/edi/maps.json"),
        ]))
        .unwrap();
        assert_eq!(config.app_id, 7);
        assert_eq!(config.field_maps, Some(PathBuf::from("/etc/edi/maps.json")));
    }

    #[test]
    fn app_id_is_required_and_numeric() {
        assert!(matches!(
            OracleConfig::from_lookup(lookup(&[])),
            Err(ConfigError::InvalidEnv { name: APP_ID_VAR, .. })
        ));
        assert!(matches!(
            OracleConfig::from_lookup(lookup(&[(APP_ID_VAR, "oracle")])),
            Err(ConfigError::InvalidEnv { .. })
        ));
    }

    #[test]
    fn json_config_loads_a_custom_registry() {
        let dir = tempfile::tempdir().unwrap();
        let maps = dir.path().join("maps.json");
        std::fs::write(
            &maps,
            r#"{ "940": { "fields": [ { "code": "poNumber", "segment": "W0502" } ] } }"#,
        )
        .unwrap();

        let raw = serde_json::json!({ "app_id": 5, "field_maps": maps }).to_string();
        let config = OracleConfig::from_json(&raw).unwrap();
        let registry = config.registry().unwrap();

        assert_eq!(registry.doc_types(), vec!["940"]);
    }

    #[test]
    fn missing_mapping_file_is_an_io_error() {
        let mut config = OracleConfig::new(1);
        config.field_maps = Some(PathBuf::from("/nonexistent/edi/maps.json"));
        assert!(matches!(config.registry(), Err(ConfigError::Io(_))));
    }
}
