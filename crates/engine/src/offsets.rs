use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, info};

use common::config::ConnInfo;

use crate::error::EngineError;

/// Persisted replication position for the OpenLogReplicator path: a fixed
/// 24-byte record of `{scn, c_scn, c_idx}` (little-endian), plus a 1-byte
/// flag file recording whether the initial snapshot finished.
///
/// Flush policy: write when a new position was committed and the flush
/// interval has elapsed, or when forced. A batch either persists a
/// strictly newer pair or nothing.
pub struct OlrOffsetStore {
    offset_path: PathBuf,
    snapshot_path: PathBuf,
    flush_interval_ms: u64,
    last_flush: Option<Instant>,
    scn: u64,
    c_scn: u64,
    c_idx: u64,
    dirty: bool,
}

impl OlrOffsetStore {
    /// Files live under the metadata directory as
    /// `<kind>_<name>_<dstdb>_offsets.dat` and
    /// `<kind>_<name>_<dstdb>_schemahistory.dat`.
    pub fn new(metadata_dir: &Path, conn: &ConnInfo, flush_interval_ms: u64) -> Self {
        let stem = conn.file_stem();
        Self {
            offset_path: metadata_dir.join(format!("{stem}_offsets.dat")),
            snapshot_path: metadata_dir.join(format!("{stem}_schemahistory.dat")),
            flush_interval_ms,
            last_flush: None,
            scn: 0,
            c_scn: 0,
            c_idx: 0,
            dirty: false,
        }
    }

    pub fn scn(&self) -> u64 {
        self.scn
    }

    pub fn c_scn(&self) -> u64 {
        self.c_scn
    }

    pub fn c_idx(&self) -> u64 {
        self.c_idx
    }

    /// Read back the persisted triple; absence of the file means "from
    /// zero".
    pub fn load(&mut self) -> Result<bool, EngineError> {
        let mut file = match fs::File::open(&self.offset_path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let mut buf = [0u8; 24];
        file.read_exact(&mut buf)?;
        self.scn = LittleEndian::read_u64(&buf[0..8]);
        self.c_scn = LittleEndian::read_u64(&buf[8..16]);
        self.c_idx = LittleEndian::read_u64(&buf[16..24]);
        info!(
            "initialize scn = {}, c_scn = {}, c_idx = {}",
            self.scn, self.c_scn, self.c_idx
        );
        Ok(true)
    }

    /// Record a newly committed position. Positions never move backwards.
    pub fn advance(&mut self, scn: u64, c_scn: u64, c_idx: u64) {
        if scn > self.scn {
            self.scn = scn;
            self.dirty = true;
        }
        if c_scn > self.c_scn {
            self.c_scn = c_scn;
            self.dirty = true;
        }
        if c_idx > self.c_idx {
            self.c_idx = c_idx;
            self.dirty = true;
        }
    }

    /// Flush the triple if warranted. Returns whether a write happened.
    pub fn flush(&mut self, force: bool) -> Result<bool, EngineError> {
        if !force {
            if !self.dirty {
                return Ok(false);
            }
            if let Some(last) = self.last_flush {
                if (last.elapsed().as_millis() as u64) < self.flush_interval_ms {
                    return Ok(false);
                }
            }
        }
        if let Some(dir) = self.offset_path.parent() {
            fs::create_dir_all(dir)?;
        }
        debug!("flushing scn file {:?}", self.offset_path);
        let mut buf = [0u8; 24];
        LittleEndian::write_u64(&mut buf[0..8], self.scn);
        LittleEndian::write_u64(&mut buf[8..16], self.c_scn);
        LittleEndian::write_u64(&mut buf[16..24], self.c_idx);
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.offset_path)?;
        file.write_all(&buf)?;
        self.last_flush = Some(Instant::now());
        self.dirty = false;
        Ok(true)
    }

    pub fn write_snapshot_done(&self, done: bool) -> Result<(), EngineError> {
        if let Some(dir) = self.snapshot_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.snapshot_path)?;
        file.write_all(if done { b"t" } else { b"f" })?;
        Ok(())
    }

    pub fn snapshot_done(&self) -> Result<bool, EngineError> {
        match fs::read(&self.snapshot_path) {
            Ok(bytes) => Ok(bytes.first() == Some(&b't')),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop this connector's metadata files, e.g. when its registration is
    /// deleted.
    pub fn remove_files(&self) -> Result<(), EngineError> {
        for path in [&self.offset_path, &self.snapshot_path] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Remove the metadata files of a connector that is being unregistered.
pub fn remove_metadata_files(metadata_dir: &Path, conn: &ConnInfo) -> Result<(), EngineError> {
    OlrOffsetStore::new(metadata_dir, conn, 0).remove_files()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::ConnectorKind;

    fn conn() -> ConnInfo {
        ConnInfo {
            name: "oraconn".into(),
            kind: ConnectorKind::Olr,
            hostname: "h".into(),
            port: 1521,
            user: "u".into(),
            pwd: "p".into(),
            srcdb: "ORCLCDB".into(),
            dstdb: "postgres".into(),
            tables: String::new(),
            snapshot_tables: String::new(),
            active: false,
            extra: Default::default(),
            olr: None,
        }
    }

    #[test]
    fn round_trip_triple() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = OlrOffsetStore::new(dir.path(), &conn(), 0);
        store.advance(1000, 990, 5);
        assert!(store.flush(true).unwrap());

        let mut reread = OlrOffsetStore::new(dir.path(), &conn(), 0);
        assert!(reread.load().unwrap());
        assert_eq!(reread.scn(), 1000);
        assert_eq!(reread.c_scn(), 990);
        assert_eq!(reread.c_idx(), 5);

        let bytes = std::fs::read(dir.path().join("olr_oraconn_postgres_offsets.dat")).unwrap();
        assert_eq!(bytes.len(), 24);
    }

    #[test]
    fn missing_file_means_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = OlrOffsetStore::new(dir.path(), &conn(), 0);
        assert!(!store.load().unwrap());
        assert_eq!(store.scn(), 0);
    }

    #[test]
    fn positions_are_monotone() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = OlrOffsetStore::new(dir.path(), &conn(), 0);
        store.advance(1000, 990, 5);
        store.advance(900, 880, 2);
        assert_eq!(store.scn(), 1000);
        assert_eq!(store.c_scn(), 990);
        assert_eq!(store.c_idx(), 5);
    }

    #[test]
    fn clean_flush_is_skipped_without_new_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = OlrOffsetStore::new(dir.path(), &conn(), 60_000);
        assert!(!store.flush(false).unwrap());
        store.advance(10, 9, 1);
        // interval has not elapsed, only force writes
        assert!(store.flush(true).unwrap());
        assert!(!store.flush(false).unwrap());
    }

    #[test]
    fn snapshot_flag_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = OlrOffsetStore::new(dir.path(), &conn(), 0);
        assert!(!store.snapshot_done().unwrap());
        store.write_snapshot_done(true).unwrap();
        assert!(store.snapshot_done().unwrap());
        let bytes = std::fs::read(dir.path().join("olr_oraconn_postgres_schemahistory.dat")).unwrap();
        assert_eq!(bytes, b"t");
    }

    #[test]
    fn remove_files_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = OlrOffsetStore::new(dir.path(), &conn(), 0);
        store.advance(1, 1, 1);
        store.flush(true).unwrap();
        store.write_snapshot_done(false).unwrap();
        store.remove_files().unwrap();
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
