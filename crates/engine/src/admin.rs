use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use common::config::{BridgeSettings, ConnInfo};
use common::types::ConnectorKind;
use rules::ObjmapEntry;

use crate::error::EngineError;
use crate::offsets::remove_metadata_files;
use crate::registry::{SharedRegistry, SlotSnapshot};
use crate::state::{ConnectorState, Request};

/// Serialised connector registrations, kept next to the offset files.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConninfoFile {
    connectors: Vec<ConnInfo>,
}

/// Object-map rows for one connector, edited by `add_objmap`/`del_objmap`
/// and re-read by a running worker on `reload_objmap`.
pub fn objmap_path(metadata_dir: &Path, name: &str) -> PathBuf {
    metadata_dir.join(format!("{name}_objmap.json"))
}

pub fn load_objmap(path: &Path) -> Result<Vec<ObjmapEntry>, EngineError> {
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text)
            .map_err(|e| EngineError::Transport(format!("malformed objmap file: {e}"))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn store_objmap(path: &Path, entries: &[ObjmapEntry]) -> Result<(), EngineError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let text = serde_json::to_string_pretty(entries)
        .map_err(|e| EngineError::Transport(e.to_string()))?;
    fs::write(path, text)?;
    Ok(())
}

/// The administrative surface: connector registration, lifecycle requests
/// and reporting. Workers are driven through the shared registry's
/// request mailboxes; this type never touches a worker's internals.
pub struct Admin {
    registry: SharedRegistry,
    settings: BridgeSettings,
}

impl Admin {
    pub fn new(registry: SharedRegistry, settings: BridgeSettings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    fn conninfo_path(&self) -> PathBuf {
        self.settings.metadata_dir.join("conninfo.json")
    }

    fn load_conninfo(&self) -> Result<ConninfoFile, EngineError> {
        match fs::read_to_string(self.conninfo_path()) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| EngineError::Transport(format!("malformed conninfo file: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConninfoFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn store_conninfo(&self, file: &ConninfoFile) -> Result<(), EngineError> {
        fs::create_dir_all(&self.settings.metadata_dir)?;
        let text = serde_json::to_string_pretty(file)
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        fs::write(self.conninfo_path(), text)?;
        Ok(())
    }

    /// Register (or replace) a connector's connection parameters.
    #[allow(clippy::too_many_arguments)]
    pub fn add_conninfo(
        &self,
        name: &str,
        hostname: &str,
        port: u16,
        user: &str,
        pwd: &str,
        srcdb: &str,
        dstdb: &str,
        tables: &str,
        kind: ConnectorKind,
    ) -> Result<(), EngineError> {
        let mut file = self.load_conninfo()?;
        file.connectors.retain(|c| c.name != name);
        file.connectors.push(ConnInfo {
            name: name.to_string(),
            kind,
            hostname: hostname.to_string(),
            port,
            user: user.to_string(),
            pwd: pwd.to_string(),
            srcdb: srcdb.to_string(),
            dstdb: dstdb.to_string(),
            tables: tables.to_string(),
            snapshot_tables: String::new(),
            active: false,
            extra: Default::default(),
            olr: None,
        });
        self.store_conninfo(&file)?;
        info!("registered connector '{name}'");
        Ok(())
    }

    /// Drop a connector registration along with its metadata files.
    pub fn del_conninfo(&self, name: &str) -> Result<(), EngineError> {
        let mut file = self.load_conninfo()?;
        let Some(conn) = file.connectors.iter().find(|c| c.name == name).cloned() else {
            return Err(EngineError::UnknownConnector(name.to_string()));
        };
        if let Some(id) = self.registry.id_by_name(name) {
            if self.registry.state(id) != ConnectorState::Stopped {
                return Err(EngineError::InvalidTransition(format!(
                    "connector '{name}' is still running"
                )));
            }
            self.registry.release(id);
        }
        file.connectors.retain(|c| c.name != name);
        self.store_conninfo(&file)?;
        remove_metadata_files(&self.settings.metadata_dir, &conn)?;
        let _ = fs::remove_file(objmap_path(&self.settings.metadata_dir, name));
        Ok(())
    }

    pub fn get_conninfo(&self, name: &str) -> Result<ConnInfo, EngineError> {
        self.load_conninfo()?
            .connectors
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| EngineError::UnknownConnector(name.to_string()))
    }

    /// Connectors flagged active, for auto-resume at process start.
    pub fn active_connectors(&self) -> Result<Vec<ConnInfo>, EngineError> {
        Ok(self
            .load_conninfo()?
            .connectors
            .into_iter()
            .filter(|c| c.active)
            .collect())
    }

    pub fn set_active(&self, name: &str, active: bool) -> Result<(), EngineError> {
        let mut file = self.load_conninfo()?;
        let Some(conn) = file.connectors.iter_mut().find(|c| c.name == name) else {
            return Err(EngineError::UnknownConnector(name.to_string()));
        };
        conn.active = active;
        self.store_conninfo(&file)
    }

    /// Claim a slot for a named connector and hand back what the caller
    /// needs to build its worker. `schemasync` forces `no_data` plus the
    /// schema-sync flag.
    pub fn prepare_start(
        &self,
        name: &str,
        snapshot_mode: Option<&str>,
    ) -> Result<StartPlan, EngineError> {
        let conn = self.get_conninfo(name)?;
        let requested = snapshot_mode.unwrap_or("initial");
        let (mode, schema_sync) = if requested.eq_ignore_ascii_case("schemasync") {
            ("no_data".to_string(), true)
        } else {
            (requested.to_string(), false)
        };
        let id = self.registry.assign(&conn, &mode)?;
        if self.registry.state(id) != ConnectorState::Stopped {
            return Err(EngineError::InvalidTransition(format!(
                "connector '{name}' is already running"
            )));
        }
        self.set_active(name, true)?;
        Ok(StartPlan {
            id,
            conn,
            snapshot_mode: mode,
            schema_sync,
            objmap_path: objmap_path(&self.settings.metadata_dir, name),
        })
    }

    fn request(&self, name: &str, request: Request) -> Result<(), EngineError> {
        let id = self
            .registry
            .id_by_name(name)
            .ok_or_else(|| EngineError::UnknownConnector(name.to_string()))?;
        self.registry.submit_request(id, request)
    }

    pub fn stop(&self, name: &str) -> Result<(), EngineError> {
        self.request(name, Request::Stop)?;
        self.set_active(name, false)
    }

    pub fn pause(&self, name: &str) -> Result<(), EngineError> {
        self.request(name, Request::Pause)
    }

    pub fn resume(&self, name: &str) -> Result<(), EngineError> {
        self.request(name, Request::Resume)
    }

    /// Only valid while paused; the worker writes the offset through its
    /// source channel.
    pub fn set_offset(&self, name: &str, offset: &str) -> Result<(), EngineError> {
        self.request(name, Request::SetOffset(offset.to_string()))
    }

    /// Atomically stop and re-start with new parameters.
    pub fn restart(&self, name: &str, snapshot_mode: &str) -> Result<(), EngineError> {
        let conn = self.get_conninfo(name)?;
        self.request(
            name,
            Request::Restart {
                snapshot_mode: snapshot_mode.to_string(),
                conninfo: Box::new(conn),
            },
        )
    }

    pub fn log_jvm_meminfo(&self, name: &str) -> Result<(), EngineError> {
        self.request(name, Request::MemDump)
    }

    pub fn reload_objmap(&self, name: &str) -> Result<(), EngineError> {
        self.request(name, Request::ReloadObjmap)
    }

    /// Add or replace one object-map rule for a connector.
    pub fn add_objmap(
        &self,
        name: &str,
        objtype: &str,
        srcobj: &str,
        dstobj: &str,
    ) -> Result<(), EngineError> {
        let path = objmap_path(&self.settings.metadata_dir, name);
        let mut entries = load_objmap(&path)?;
        entries.retain(|e| !(e.objtype == objtype && e.srcobj == srcobj));
        entries.push(ObjmapEntry {
            objtype: objtype.to_string(),
            enabled: true,
            srcobj: srcobj.to_string(),
            dstobj: dstobj.to_string(),
            curr_dest_table: None,
            curr_dest_column: None,
            curr_dest_type: None,
        });
        store_objmap(&path, &entries)
    }

    /// Disable one object-map rule; a running worker drops it on reload.
    pub fn del_objmap(&self, name: &str, objtype: &str, srcobj: &str) -> Result<(), EngineError> {
        let path = objmap_path(&self.settings.metadata_dir, name);
        let mut entries = load_objmap(&path)?;
        let mut found = false;
        for entry in entries.iter_mut() {
            if entry.objtype == objtype && entry.srcobj == srcobj {
                entry.enabled = false;
                found = true;
            }
        }
        if !found {
            return Err(EngineError::UnknownConnector(format!(
                "no objmap rule {objtype}/{srcobj} for '{name}'"
            )));
        }
        store_objmap(&path, &entries)
    }

    pub fn get_state(&self) -> Vec<SlotSnapshot> {
        self.registry.snapshots()
    }

    pub fn get_stats(&self, name: &str) -> Result<SlotSnapshot, EngineError> {
        let id = self
            .registry
            .id_by_name(name)
            .ok_or_else(|| EngineError::UnknownConnector(name.to_string()))?;
        Ok(self.registry.snapshot(id))
    }

    pub fn reset_stats(&self, name: &str) -> Result<(), EngineError> {
        let id = self
            .registry
            .id_by_name(name)
            .ok_or_else(|| EngineError::UnknownConnector(name.to_string()))?;
        self.registry.reset_stats(id);
        Ok(())
    }
}

/// Everything needed to construct and spawn a worker after `start`.
pub struct StartPlan {
    pub id: usize,
    pub conn: ConnInfo,
    pub snapshot_mode: String,
    pub schema_sync: bool,
    pub objmap_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin(dir: &Path) -> Admin {
        let settings = BridgeSettings {
            metadata_dir: dir.to_path_buf(),
            max_connectors: 4,
            ..Default::default()
        };
        Admin::new(SharedRegistry::new(settings.max_connectors), settings)
    }

    #[test]
    fn conninfo_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let admin = admin(dir.path());
        admin
            .add_conninfo(
                "mysqlconn",
                "127.0.0.1",
                3306,
                "root",
                "secret",
                "inventory",
                "postgres",
                "",
                ConnectorKind::Mysql,
            )
            .unwrap();
        let conn = admin.get_conninfo("mysqlconn").unwrap();
        assert_eq!(conn.srcdb, "inventory");
        assert!(!conn.active);

        admin.del_conninfo("mysqlconn").unwrap();
        assert!(admin.get_conninfo("mysqlconn").is_err());
    }

    #[test]
    fn prepare_start_handles_schemasync() {
        let dir = tempfile::tempdir().unwrap();
        let admin = admin(dir.path());
        admin
            .add_conninfo(
                "c1",
                "h",
                1433,
                "sa",
                "pw",
                "db",
                "postgres",
                "dbo.t",
                ConnectorKind::SqlServer,
            )
            .unwrap();
        let plan = admin.prepare_start("c1", Some("schemasync")).unwrap();
        assert_eq!(plan.snapshot_mode, "no_data");
        assert!(plan.schema_sync);
        // the registration is now flagged for auto-resume
        assert_eq!(admin.active_connectors().unwrap().len(), 1);
    }

    #[test]
    fn objmap_rules_accumulate_and_disable() {
        let dir = tempfile::tempdir().unwrap();
        let admin = admin(dir.path());
        admin
            .add_objmap("c1", "table", "inventory.orders", "sales.orders")
            .unwrap();
        admin
            .add_objmap("c1", "transform", "inventory.geom.g", "st_geomfromwkb(?,?)")
            .unwrap();
        let path = objmap_path(dir.path(), "c1");
        let entries = load_objmap(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.enabled));

        admin.del_objmap("c1", "table", "inventory.orders").unwrap();
        let entries = load_objmap(&path).unwrap();
        let table_rule = entries.iter().find(|e| e.objtype == "table").unwrap();
        assert!(!table_rule.enabled);
    }

    #[test]
    fn unknown_connector_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let admin = admin(dir.path());
        assert!(matches!(
            admin.pause("ghost"),
            Err(EngineError::UnknownConnector(_))
        ));
        assert!(matches!(
            admin.get_conninfo("ghost"),
            Err(EngineError::UnknownConnector(_))
        ));
    }
}
