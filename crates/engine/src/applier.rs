use tracing::{debug, warn};

use common::types::{AlterSubkind, ConnectorKind, DdlEvent, DdlKind, Op};
use converter::{PgDdl, PgDml, PgDmlBody};
use destination::{DestinationSession, TableDef, TupleValue};

use crate::error::EngineError;

/// Attribute-mapping catalog on the destination, recording which remote
/// column each destination attribute came from.
pub const ATTRIBUTE_TABLE: &str = "driftbridge_attribute";

/// Marker written into `ext_attname` when the remote column was dropped.
fn dropped_marker(position: i32) -> String {
    format!("........driftbridge.dropped.{position}........")
}

/// Executes converted records against the destination and keeps the
/// attribute catalog in step with applied DDL.
pub struct Applier {
    connector_name: String,
    kind: ConnectorKind,
}

impl Applier {
    pub fn new(connector_name: &str, kind: ConnectorKind) -> Self {
        Self {
            connector_name: connector_name.to_string(),
            kind,
        }
    }

    /// Run a DDL statement and update the attribute catalog.
    pub async fn apply_ddl(
        &self,
        session: &mut dyn DestinationSession,
        ddl: &DdlEvent,
        pgddl: &PgDdl,
    ) -> Result<(), EngineError> {
        session
            .exec_utility(&pgddl.sql)
            .await
            .map_err(|source| EngineError::Apply {
                sql: pgddl.sql.clone(),
                source,
            })?;
        self.update_attribute_catalog(session, ddl, pgddl).await
    }

    /// Run one converted DML record. In tuple mode `table` must be the
    /// descriptor the record was converted against.
    pub async fn apply_dml(
        &self,
        session: &mut dyn DestinationSession,
        pgdml: &PgDml,
        table: Option<&TableDef>,
    ) -> Result<u64, EngineError> {
        match &pgdml.body {
            PgDmlBody::Sql(sql) => {
                session
                    .exec_dml(sql)
                    .await
                    .map_err(|source| EngineError::Apply {
                        sql: sql.clone(),
                        source,
                    })
            }
            PgDmlBody::Tuples { before, after } => {
                let Some(table) = table else {
                    return Err(EngineError::Transport(
                        "tuple mode requires a table descriptor".to_string(),
                    ));
                };
                let wrap = |source| EngineError::Apply {
                    sql: format!("<tuple {} on {}>", pgdml.op.as_char(), table.qualified_name()),
                    source,
                };
                match pgdml.op {
                    Op::Read | Op::Create => {
                        session.tuple_insert(table, after).await.map_err(wrap)
                    }
                    Op::Update => {
                        let key = key_values(table, before);
                        session.tuple_update(table, &key, after).await.map_err(wrap)
                    }
                    Op::Delete => {
                        let key = key_values(table, before);
                        session.tuple_delete(table, &key).await.map_err(wrap)
                    }
                }
            }
        }
    }

    /// Upsert `(connector, kind, attnum) ↔ (remote id, remote column,
    /// remote type)` rows after a DDL was applied, delete them on DROP and
    /// mark columns removed by an ALTER.
    async fn update_attribute_catalog(
        &self,
        session: &mut dyn DestinationSession,
        ddl: &DdlEvent,
        pgddl: &PgDdl,
    ) -> Result<(), EngineError> {
        let sql = match (pgddl.kind, pgddl.subkind) {
            (DdlKind::Create, _)
            | (DdlKind::Alter, Some(AlterSubkind::AddColumn))
            | (DdlKind::Alter, None)
            | (DdlKind::Alter, Some(AlterSubkind::AlterColumn)) => {
                let table = session
                    .lookup_table(&pgddl.schema, &pgddl.table)
                    .await?;
                let mut rows = Vec::new();
                for (src, pg) in ddl.columns.iter().zip(pgddl.columns.iter()) {
                    let (Some(_name), Some(_ty)) = (&pg.name, &pg.type_name) else {
                        continue;
                    };
                    rows.push(format!(
                        "(lower('{}'),lower('{}'),{},{},'{}','{}','{}')",
                        self.connector_name,
                        self.kind.as_str(),
                        table.oid,
                        pg.position,
                        ddl.id,
                        src.name,
                        src.type_name
                    ));
                }
                if rows.is_empty() {
                    warn!("no attribute rows to record, skipping attribute update");
                    return Ok(());
                }
                format!(
                    "INSERT INTO {} (name, type, attrelid, attnum, \
                     ext_tbname, ext_attname, ext_atttypename) VALUES {} \
                     ON CONFLICT(name, type, attrelid, attnum) DO UPDATE SET \
                     ext_tbname = EXCLUDED.ext_tbname,\
                     ext_attname = EXCLUDED.ext_attname,\
                     ext_atttypename = EXCLUDED.ext_atttypename;",
                    ATTRIBUTE_TABLE,
                    rows.join(",")
                )
            }
            (DdlKind::Drop, _) => format!(
                "DELETE FROM {} WHERE lower(ext_tbname) = lower('{}') AND \
                 lower(name) = lower('{}') AND lower(type) = lower('{}');",
                ATTRIBUTE_TABLE,
                ddl.id,
                self.connector_name,
                self.kind.as_str()
            ),
            (DdlKind::Alter, Some(AlterSubkind::DropColumn)) => {
                let mut stmts = String::new();
                for pg in pgddl.columns.iter().filter(|c| c.name.is_some()) {
                    stmts.push_str(&format!(
                        "UPDATE {} SET ext_attname = '{}', ext_atttypename = null \
                         WHERE lower(ext_attname) = lower('{}') AND \
                         lower(name) = lower('{}') AND lower(type) = lower('{}');",
                        ATTRIBUTE_TABLE,
                        dropped_marker(pg.position),
                        pg.name.as_deref().unwrap_or_default(),
                        self.connector_name,
                        self.kind.as_str()
                    ));
                }
                if stmts.is_empty() {
                    warn!("cannot update attribute catalog: no column dropped by ALTER");
                    return Ok(());
                }
                stmts
            }
            (DdlKind::Alter, Some(_)) => {
                // constraint-only changes do not move attributes
                return Ok(());
            }
        };
        debug!("attribute catalog update: {sql}");
        session
            .exec_utility(&sql)
            .await
            .map_err(|source| EngineError::Apply { sql, source })?;
        Ok(())
    }
}

/// Key columns used to identify the row in tuple mode: the primary-key
/// values from the before image, or every before value when the table has
/// no key.
fn key_values(table: &TableDef, before: &[TupleValue]) -> Vec<TupleValue> {
    let pk: Vec<TupleValue> = before
        .iter()
        .filter(|v| {
            table
                .attrs
                .iter()
                .any(|a| a.position == v.position && a.is_pk)
        })
        .cloned()
        .collect();
    if pk.is_empty() {
        before.to_vec()
    } else {
        pk
    }
}
