use serde::{Deserialize, Serialize};

use crate::types::ConnectorKind;

/// Extra SSL parameters handed through to the Debezium runner, all
/// optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtraConnInfo {
    #[serde(default)]
    pub ssl_mode: Option<String>,
    #[serde(default)]
    pub ssl_keystore: Option<String>,
    #[serde(default)]
    pub ssl_keystore_pass: Option<String>,
    #[serde(default)]
    pub ssl_truststore: Option<String>,
    #[serde(default)]
    pub ssl_truststore_pass: Option<String>,
}

impl ExtraConnInfo {
    pub fn is_empty(&self) -> bool {
        self == &ExtraConnInfo::default()
    }
}

/// OpenLogReplicator server coordinates for the `olr` connector kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OlrConnInfo {
    pub host: String,
    pub port: u16,
    /// the `database_name` handed to the replicator in each request
    pub source: String,
}

/// Connection parameters of one connector. The name is the stable key used
/// in rule tables, offset files, the attribute catalog and the lifecycle
/// slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnInfo {
    pub name: String,
    pub kind: ConnectorKind,
    pub hostname: String,
    pub port: u16,
    pub user: String,
    pub pwd: String,
    #[serde(default)]
    pub srcdb: String,
    pub dstdb: String,
    /// comma-separated list of tables to capture; empty means all
    #[serde(default)]
    pub tables: String,
    #[serde(default)]
    pub snapshot_tables: String,
    /// marked true while a worker runs, used for auto-resume at startup
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub extra: ExtraConnInfo,
    #[serde(default)]
    pub olr: Option<OlrConnInfo>,
}

impl ConnInfo {
    /// Base name of this connector's persisted state files:
    /// `<kind>_<name>_<dstdb>`.
    pub fn file_stem(&self) -> String {
        format!("{}_{}_{}", self.kind.as_str(), self.name, self.dstdb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_uses_kind_name_dstdb() {
        let info = ConnInfo {
            name: "mysqlconn".into(),
            kind: ConnectorKind::Mysql,
            hostname: "127.0.0.1".into(),
            port: 3306,
            user: "root".into(),
            pwd: "secret".into(),
            srcdb: "inventory".into(),
            dstdb: "postgres".into(),
            tables: String::new(),
            snapshot_tables: String::new(),
            active: false,
            extra: ExtraConnInfo::default(),
            olr: None,
        };
        assert_eq!(info.file_stem(), "mysql_mysqlconn_postgres");
    }
}
