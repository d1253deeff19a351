use std::collections::HashMap;

use serde_json::Value as Json;
use tracing::{debug, warn};

use common::types::{
    AlterSubkind, ColumnValue, DbzType, DdlColumn, DdlEvent, DdlKind, DmlEvent, Op, TimeRep,
};
use common::utils::fold_ident;
use converter::{resolve_dml_target, JsonPosEntry, SchemaCache};
use destination::DestinationSession;
use rules::{ObjectType, RuleStore};

use crate::ast::{OraAlterCmd, OraColumnDef, OraStatement, OracleDdlParser};
use crate::error::OlrError;
use crate::sql_filter::normalize_ddl;

/// Event classification on the replicator stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OlrEventClass {
    Begin,
    Commit,
    Ddl,
    Dml(Op),
}

/// One decoded replicator payload: `{scn, c_scn, tm?, db, payload: [{op, …}]}`.
pub struct OlrEnvelope {
    json: Json,
}

impl OlrEnvelope {
    pub fn parse(raw: &str) -> Result<Self, OlrError> {
        Ok(Self {
            json: serde_json::from_str(raw)?,
        })
    }

    fn payload(&self) -> &Json {
        &self.json["payload"][0]
    }

    pub fn classify(&self) -> Result<OlrEventClass, OlrError> {
        let op = self.payload()["op"]
            .as_str()
            .ok_or_else(|| OlrError::MalformedEvent("no payload.0.op value".to_string()))?;
        match op {
            "begin" => Ok(OlrEventClass::Begin),
            "commit" => Ok(OlrEventClass::Commit),
            "ddl" => Ok(OlrEventClass::Ddl),
            "c" => Ok(OlrEventClass::Dml(Op::Create)),
            "u" => Ok(OlrEventClass::Dml(Op::Update)),
            "d" => Ok(OlrEventClass::Dml(Op::Delete)),
            other => Err(OlrError::MalformedEvent(format!("unsupported op {other}"))),
        }
    }

    /// Redo coordinates of this event, required on every payload.
    pub fn scns(&self) -> Result<(u64, u64), OlrError> {
        let scn = self.json["scn"]
            .as_u64()
            .ok_or_else(|| OlrError::MalformedEvent("no scn value".to_string()))?;
        let c_scn = self.json["c_scn"]
            .as_u64()
            .ok_or_else(|| OlrError::MalformedEvent("no c_scn value".to_string()))?;
        Ok((scn, c_scn))
    }

    pub fn c_idx(&self) -> u64 {
        self.json["c_idx"].as_u64().unwrap_or(0)
    }

    /// Source commit time in ms, when present (`tm` is nanoseconds).
    pub fn tm_ms(&self) -> Option<u64> {
        self.json["tm"].as_u64().map(|ns| ns / 1_000 / 1_000)
    }

    fn db(&self) -> Result<&str, OlrError> {
        self.json["db"]
            .as_str()
            .ok_or_else(|| OlrError::MalformedEvent("no db value".to_string()))
    }

    /// Parse a DDL payload through the injected Oracle parser. `Ok(None)`
    /// means the statement is to be skipped while still advancing the
    /// stream position (internal Oracle DDL noise, non-whitelisted or
    /// unparseable statements).
    pub fn parse_ddl(&self, parser: &dyn OracleDdlParser) -> Result<Option<DdlEvent>, OlrError> {
        let db = self.db()?;
        let schema_block = &self.payload()["schema"];
        if schema_block.is_null() {
            return Err(OlrError::MalformedEvent(
                "no payload.0.schema struct".to_string(),
            ));
        }
        // DDLs without an owner are system-internal maintenance
        let Some(owner) = schema_block["owner"].as_str() else {
            debug!("skip ddl with no schema owner");
            return Ok(None);
        };
        let table = schema_block["table"]
            .as_str()
            .ok_or_else(|| OlrError::MalformedEvent("no payload.0.schema.table".to_string()))?;
        let sql = self.payload()["sql"]
            .as_str()
            .ok_or_else(|| OlrError::MalformedEvent("no payload.0.sql value".to_string()))?;

        let Some(normalized) = normalize_ddl(sql) else {
            debug!("unsupported DDL -----> {sql}");
            return Ok(None);
        };

        let statements = match parser.parse(&normalized) {
            Ok(s) => s,
            Err(e) => {
                warn!("skipping bad DDL statement: '{normalized}': {e}");
                return Ok(None);
            }
        };

        let src_ts_ms = self.tm_ms().unwrap_or(0);
        let mut event = DdlEvent {
            id: String::new(),
            kind: DdlKind::Create,
            subkind: None,
            primary_key_column_names: None,
            columns: Vec::new(),
            constraint_name: None,
            src_ts_ms,
            ts_ms: 0,
        };
        let mut table = table.to_string();

        for stmt in statements {
            match stmt {
                OraStatement::CreateTable {
                    columns,
                    primary_key,
                    ..
                } => {
                    event.kind = DdlKind::Create;
                    event.columns = columns.iter().map(neutral_column).collect();
                    event.primary_key_column_names = pk_json(&primary_key);
                }
                OraStatement::AlterTable { cmds, .. } => {
                    event.kind = DdlKind::Alter;
                    for cmd in cmds {
                        match cmd {
                            OraAlterCmd::AddColumn(col) => {
                                event.subkind = Some(AlterSubkind::AddColumn);
                                if col.primary_key {
                                    event.primary_key_column_names =
                                        pk_json(&[col.name.clone()]);
                                }
                                event.columns.push(neutral_column(&col));
                            }
                            OraAlterCmd::DropColumn(name) => {
                                event.subkind = Some(AlterSubkind::DropColumn);
                                event.columns.push(DdlColumn {
                                    name: fold_ident(&name),
                                    ..Default::default()
                                });
                            }
                            OraAlterCmd::ModifyColumn(col) => {
                                event.subkind = Some(AlterSubkind::AlterColumn);
                                if col.primary_key {
                                    event.primary_key_column_names =
                                        pk_json(&[col.name.clone()]);
                                }
                                event.columns.push(neutral_column(&col));
                            }
                            OraAlterCmd::AddPrimaryKey {
                                constraint,
                                columns,
                            } => {
                                event.subkind = Some(AlterSubkind::AddConstraint);
                                event.constraint_name = constraint.map(|c| fold_ident(&c));
                                event.primary_key_column_names = pk_json(&columns);
                            }
                            OraAlterCmd::DropConstraint(name) => {
                                event.subkind = Some(AlterSubkind::DropConstraint);
                                event.constraint_name = Some(fold_ident(&name));
                            }
                        }
                    }
                }
                OraStatement::DropTable { table: parsed, .. } => {
                    event.kind = DdlKind::Drop;
                    table = parsed;
                }
            }
        }

        event.id = fold_ident(&format!("{db}.{owner}.{table}"));
        Ok(Some(event))
    }

    /// Parse a DML payload into a neutral record; the position map comes
    /// from `payload.0.schema.columns` and carries no time representation.
    pub async fn parse_dml(
        &self,
        op: Op,
        store: &RuleStore,
        cache: &mut SchemaCache,
        session: &mut dyn DestinationSession,
    ) -> Result<DmlEvent, OlrError> {
        let db = self.db()?;
        let schema_block = &self.payload()["schema"];
        if schema_block.is_null() {
            return Err(OlrError::MalformedEvent(
                "no payload.0.schema struct".to_string(),
            ));
        }
        let owner = schema_block["owner"].as_str();
        let table = schema_block["table"]
            .as_str()
            .ok_or_else(|| OlrError::MalformedEvent("no payload.0.schema.table".to_string()))?;

        let remote_object_id = fold_ident(&match owner {
            Some(o) => format!("{db}.{o}.{table}"),
            None => format!("{db}.{table}"),
        });
        let (dest_schema, dest_table, mapped_object_id) =
            resolve_dml_target(&remote_object_id, store)?;

        let jsonpos = self.schema_jsonpos()?;
        let entry = cache
            .get_or_load(session, &dest_schema, &dest_table, jsonpos)
            .await?;

        let mut dml = DmlEvent {
            op,
            remote_object_id: remote_object_id.clone(),
            mapped_object_id,
            schema: dest_schema,
            table: dest_table,
            table_oid: entry.table.oid,
            natts: entry.table.attrs.len() as i32,
            before: Vec::new(),
            after: Vec::new(),
            src_ts_ms: self.tm_ms().unwrap_or(0),
            ts_ms: 0,
        };

        match op {
            Op::Create | Op::Read => {
                dml.after = parse_row(&self.payload()["after"], &remote_object_id, store, entry)?;
            }
            Op::Delete => {
                dml.before = parse_row(&self.payload()["before"], &remote_object_id, store, entry)?;
            }
            Op::Update => {
                dml.before = parse_row(&self.payload()["before"], &remote_object_id, store, entry)?;
                dml.after = parse_row(&self.payload()["after"], &remote_object_id, store, entry)?;
            }
        }
        dml.sort_columns();
        Ok(dml)
    }

    /// Position map from `payload.0.schema.columns`: name, wire class and
    /// declared scale. The time representation is left undefined; the
    /// codec infers it from the destination type.
    pub fn schema_jsonpos(&self) -> Result<HashMap<String, JsonPosEntry>, OlrError> {
        let Some(columns) = self.payload()["schema"]["columns"].as_array() else {
            return Err(OlrError::MalformedEvent(
                "cannot parse columns section of change event".to_string(),
            ));
        };
        let mut map = HashMap::with_capacity(columns.len());
        let mut pos = 0;
        for col in columns {
            let Some(name) = col["name"].as_str() else {
                warn!("name is missing from column array");
                continue;
            };
            let Some(ty) = col["type"].as_str() else {
                warn!("type is missing from column array");
                continue;
            };
            let scale = col["scale"].as_i64().unwrap_or(0) as i32;
            let entry = JsonPosEntry {
                pos,
                wire_type: wire_class(ty),
                time_rep: TimeRep::Undef,
                scale,
            };
            map.entry(fold_ident(name)).or_insert(entry);
            pos += 1;
        }
        Ok(map)
    }
}

/// Rough wire classification of the replicator's Oracle type names:
/// numeric-ish values arrive as JSON numbers, the rest as strings.
fn wire_class(type_name: &str) -> DbzType {
    match type_name {
        "number" | "binary_float" | "binary_double" | "date" | "timestamp"
        | "timestamp with local time zone" => DbzType::Int64,
        "char" | "varchar" | "varchar2" | "nvarchar" | "nvarchar2" | "raw" | "blob" | "clob"
        | "nclob" | "long" | "urowid" | "rowid" | "unknown" | "interval day to second"
        | "interval year to month" | "timestamp with time zone" => DbzType::String,
        other => {
            debug!("unexpected column type {other} - defaulting to numeric representation");
            DbzType::Undef
        }
    }
}

fn neutral_column(col: &OraColumnDef) -> DdlColumn {
    DdlColumn {
        name: fold_ident(&col.name),
        type_name: col.type_name.to_lowercase(),
        length: col.length,
        scale: col.scale,
        optional: !col.not_null,
        auto_incremented: false,
        position: 0,
        default_value_expression: col.has_default.then(|| "default".to_string()),
        enum_values: None,
        charset_name: None,
    }
}

fn pk_json(names: &[String]) -> Option<String> {
    if names.is_empty() {
        return None;
    }
    let folded: Vec<String> = names.iter().map(|n| fold_ident(n)).collect();
    serde_json::to_string(&folded).ok()
}

fn row_value(value: &Json) -> Option<Option<String>> {
    match value {
        Json::Null => Some(None),
        Json::String(s) => Some(Some(s.clone())),
        Json::Number(n) => Some(Some(n.to_string())),
        Json::Bool(b) => Some(Some(b.to_string())),
        Json::Object(_) => Some(Some(value.to_string())),
        Json::Array(_) => None,
    }
}

fn parse_row(
    row: &Json,
    remote_object_id: &str,
    store: &RuleStore,
    entry: &converter::CacheEntry,
) -> Result<Vec<ColumnValue>, OlrError> {
    let Some(object) = row.as_object() else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(object.len());
    for (key, value) in object {
        let Some(value) = row_value(value) else {
            continue;
        };
        let remote_name = fold_ident(key);
        let col_id = format!("{remote_object_id}.{remote_name}");
        let name = store
            .resolve_name(&col_id, ObjectType::Column)
            .map(str::to_string)
            .unwrap_or_else(|| remote_name.clone());

        let attr = entry
            .table
            .attr_by_name(&name)
            .ok_or_else(|| converter::ConvertError::UnknownColumn(name.clone()))?;
        let meta = entry.jsonpos.get(&remote_name).ok_or_else(|| {
            OlrError::MalformedEvent(format!(
                "no column schema metadata for {name}({remote_name})"
            ))
        })?;

        out.push(ColumnValue {
            name,
            remote_name,
            value,
            type_oid: attr.type_oid,
            category: attr.category,
            type_name: attr.type_name.clone(),
            typmod: attr.typmod,
            wire_type: meta.wire_type,
            time_rep: meta.time_rep,
            scale: meta.scale,
            is_pk: attr.is_pk,
            position: attr.position,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_parser::BasicOracleParser;
    use common::types::TypeCategory;
    use destination::{AttrDef, MemorySession};

    const DDL_DROP: &str = r#"{
      "scn": 3000, "c_scn": 2990, "tm": 1700000000000000000, "db": "ORCLCDB",
      "payload": [{
        "op": "ddl",
        "schema": {"owner": "HR", "table": "EMP"},
        "sql": "DROP TABLE HR.EMP AS \"BIN$xyz\""
      }]
    }"#;

    #[test]
    fn classify_and_scns() {
        let env = OlrEnvelope::parse(DDL_DROP).unwrap();
        assert_eq!(env.classify().unwrap(), OlrEventClass::Ddl);
        assert_eq!(env.scns().unwrap(), (3000, 2990));
        assert_eq!(env.tm_ms(), Some(1_700_000_000_000));
    }

    #[test]
    fn recycle_bin_drop_becomes_neutral_drop() {
        let env = OlrEnvelope::parse(DDL_DROP).unwrap();
        let ddl = env.parse_ddl(&BasicOracleParser).unwrap().unwrap();
        assert_eq!(ddl.kind, DdlKind::Drop);
        assert_eq!(ddl.id, "orclcdb.hr.emp");
    }

    #[test]
    fn ddl_without_owner_is_skipped() {
        let raw = DDL_DROP.replace("\"owner\": \"HR\", ", "");
        let env = OlrEnvelope::parse(&raw).unwrap();
        assert!(env.parse_ddl(&BasicOracleParser).unwrap().is_none());
    }

    #[test]
    fn non_whitelisted_ddl_is_skipped() {
        let raw = DDL_DROP.replace(
            "DROP TABLE HR.EMP AS \\\"BIN$xyz\\\"",
            "CREATE INDEX IDX ON HR.EMP (ID)",
        );
        let env = OlrEnvelope::parse(&raw).unwrap();
        assert!(env.parse_ddl(&BasicOracleParser).unwrap().is_none());
    }

    #[test]
    fn create_ddl_collects_columns_and_pk() {
        let raw = DDL_DROP.replace(
            "DROP TABLE HR.EMP AS \\\"BIN$xyz\\\"",
            "CREATE TABLE HR.EMP (ID NUMBER(10,0) PRIMARY KEY, NAME VARCHAR2(40))",
        );
        let env = OlrEnvelope::parse(&raw).unwrap();
        let ddl = env.parse_ddl(&BasicOracleParser).unwrap().unwrap();
        assert_eq!(ddl.kind, DdlKind::Create);
        assert_eq!(ddl.columns.len(), 2);
        assert_eq!(ddl.columns[0].name, "id");
        assert_eq!(ddl.columns[0].type_name, "number");
        assert_eq!(ddl.primary_key_column_names.as_deref(), Some(r#"["id"]"#));
    }

    const DML_INSERT: &str = r#"{
      "scn": 4000, "c_scn": 3990, "db": "ORCLCDB",
      "payload": [{
        "op": "c",
        "schema": {
          "owner": "HR", "table": "EMP",
          "columns": [
            {"name": "ID", "type": "number", "scale": 0},
            {"name": "NAME", "type": "varchar2"}
          ]
        },
        "after": {"ID": 7, "NAME": "jane"}
      }]
    }"#;

    fn emp_session() -> MemorySession {
        let session = MemorySession::new();
        session.define_table(
            "hr",
            "emp",
            vec![
                AttrDef {
                    name: "id".into(),
                    type_oid: 23,
                    position: 1,
                    typmod: -1,
                    is_pk: true,
                    category: TypeCategory::Numeric,
                    type_name: "integer".into(),
                    is_dropped: false,
                },
                AttrDef {
                    name: "name".into(),
                    type_oid: 25,
                    position: 2,
                    typmod: -1,
                    is_pk: false,
                    category: TypeCategory::String,
                    type_name: "text".into(),
                    is_dropped: false,
                },
            ],
        );
        session
    }

    #[tokio::test]
    async fn dml_parse_with_mapped_table() {
        let mut store = RuleStore::new(common::types::ConnectorKind::Olr);
        store.insert_name_rule("orclcdb.hr.emp", ObjectType::Table, "hr.emp");
        let mut cache = SchemaCache::new();
        let mut session = emp_session();

        let env = OlrEnvelope::parse(DML_INSERT).unwrap();
        assert_eq!(env.classify().unwrap(), OlrEventClass::Dml(Op::Create));
        let dml = env
            .parse_dml(Op::Create, &store, &mut cache, &mut session)
            .await
            .unwrap();
        assert_eq!(dml.mapped_object_id, "hr.emp");
        assert_eq!(dml.after.len(), 2);
        assert_eq!(dml.after[0].name, "id");
        assert_eq!(dml.after[0].wire_type, DbzType::Int64);
        assert_eq!(dml.after[0].time_rep, TimeRep::Undef);
        assert!(dml.after[0].is_pk);
        assert_eq!(dml.after[1].value.as_deref(), Some("jane"));
    }
}
