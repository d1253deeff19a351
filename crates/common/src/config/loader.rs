use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::components::{BridgeSettings, ConnInfo};
use crate::config::error::ConfigError;

/// On-disk registry file: global settings plus named connectors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub settings: BridgeSettings,
    #[serde(default)]
    pub connectors: HashMap<String, ConnInfo>,
}

/// Load the connector registry from a YAML file. Each entry's map key must
/// agree with the embedded connector name; mismatches are rejected early so
/// that file names, rule tables and lifecycle slots never drift apart.
pub fn load_registry(path: &Path) -> Result<RegistryFile, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::incorrect_path(path));
    }
    let file = fs::File::open(path)?;
    let registry: RegistryFile = serde_yaml::from_reader(file)?;

    for (key, info) in &registry.connectors {
        if key != &info.name {
            return Err(ConfigError::parse_error(format!(
                "connector entry '{}' declares mismatching name '{}'",
                key, info.name
            )));
        }
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
settings:
  naptime_ms: 25
  dml_mode: textsql
connectors:
  mysqlconn:
    name: mysqlconn
    kind: Mysql
    hostname: 127.0.0.1
    port: 3306
    user: root
    pwd: secret
    srcdb: inventory
    dstdb: postgres
"#;

    #[test]
    fn loads_settings_and_connectors() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        let reg = load_registry(f.path()).unwrap();
        assert_eq!(reg.settings.naptime_ms, 25);
        assert_eq!(reg.connectors.len(), 1);
        assert_eq!(reg.connectors["mysqlconn"].srcdb, "inventory");
    }

    #[test]
    fn rejects_mismatched_names() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.replace("name: mysqlconn", "name: other").as_bytes())
            .unwrap();
        assert!(load_registry(f.path()).is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            load_registry(Path::new("/nonexistent/registry.yml")),
            Err(ConfigError::IncorrectPath { .. })
        ));
    }
}
