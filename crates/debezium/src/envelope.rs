use std::collections::HashMap;

use serde_json::Value as Json;
use tracing::{debug, warn};

use common::types::{
    ColumnValue, ConnectorKind, ConnectorStage, DbzType, DdlColumn, DdlEvent, DdlKind, DmlEvent,
    Op, TimeRep,
};
use common::utils::fold_ident;
use converter::{resolve_dml_target, JsonPosEntry, SchemaCache};
use destination::DestinationSession;
use rules::{ObjectType, RuleStore};

use crate::error::DbzError;

/// How one event is to be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// transaction-boundary notification (`payload.status` present)
    TxBoundary,
    /// schema change (`payload.op` absent)
    Ddl,
    /// row change
    Dml(Op),
}

/// One decoded Debezium change event with the standard envelope.
pub struct Envelope {
    json: Json,
}

impl Envelope {
    pub fn parse(raw: &str) -> Result<Self, DbzError> {
        Ok(Self {
            json: serde_json::from_str(raw)?,
        })
    }

    fn payload(&self) -> &Json {
        &self.json["payload"]
    }

    fn source(&self) -> Option<&Json> {
        match &self.payload()["source"] {
            Json::Null => None,
            v => Some(v),
        }
    }

    /// Classify the event; errors if neither a source element nor a
    /// transaction status is present.
    pub fn classify(&self) -> Result<EventClass, DbzError> {
        if self.source().is_none() {
            if self.payload()["status"].is_string() {
                return Ok(EventClass::TxBoundary);
            }
            return Err(DbzError::MalformedEvent(
                "no source element in change event".to_string(),
            ));
        }
        match &self.payload()["op"] {
            Json::Null => Ok(EventClass::Ddl),
            Json::String(op) => {
                let c = op.chars().next().unwrap_or('?');
                Op::from_char(c)
                    .map(EventClass::Dml)
                    .ok_or_else(|| DbzError::MalformedEvent(format!("op {op} not supported")))
            }
            other => Err(DbzError::MalformedEvent(format!(
                "unexpected op element: {other}"
            ))),
        }
    }

    /// Source connector kind from `payload.source.connector`.
    pub fn connector_kind(&self) -> Option<ConnectorKind> {
        self.source()
            .and_then(|s| s["connector"].as_str())
            .and_then(ConnectorKind::parse)
    }

    /// Connector stage from the snapshot marker: `true` and `last` mean
    /// the snapshot is still running; `last` additionally flags the final
    /// snapshot event. Workers in schema-sync mode report that stage
    /// instead.
    pub fn stage(&self, schema_sync: bool) -> Result<(ConnectorStage, bool), DbzError> {
        let marker = match self.source() {
            Some(source) => match &source["snapshot"] {
                Json::String(s) => s.clone(),
                Json::Bool(b) => b.to_string(),
                _ => {
                    return Err(DbzError::MalformedEvent(
                        "no snapshot attribute specified".to_string(),
                    ))
                }
            },
            None => {
                return Err(DbzError::MalformedEvent(
                    "no source element in change event".to_string(),
                ))
            }
        };
        let in_snapshot = marker == "true" || marker == "last";
        let stage = if in_snapshot {
            if schema_sync {
                ConnectorStage::SchemaSync
            } else {
                ConnectorStage::InitialSnapshot
            }
        } else {
            ConnectorStage::Cdc
        };
        Ok((stage, marker == "last"))
    }

    /// Batch timestamps for statistics: `(payload.source.ts_ms,
    /// payload.ts_ms)`.
    pub fn timestamps(&self) -> (u64, u64) {
        let src = self
            .source()
            .and_then(|s| s["ts_ms"].as_u64())
            .unwrap_or(0);
        let dbz = self.payload()["ts_ms"].as_u64().unwrap_or(0);
        (src, dbz)
    }

    /// Parse a schema-change event from `payload.tableChanges.0`. Returns
    /// `None` when the event carries no table change data.
    pub fn parse_ddl(&self) -> Result<Option<DdlEvent>, DbzError> {
        let change = &self.payload()["tableChanges"][0];
        let id = change["id"].as_str().map(strip_quoting);
        let kind_str = change["type"].as_str();
        let (Some(id), Some(kind_str)) = (id, kind_str) else {
            debug!("no table change data. Stop parsing...");
            return Ok(None);
        };
        let id = fold_ident(&id);

        let kind = match kind_str {
            "CREATE" => DdlKind::Create,
            "ALTER" => DdlKind::Alter,
            "DROP" => DdlKind::Drop,
            other => {
                warn!("unknown ddl type {other}");
                return Ok(None);
            }
        };

        let primary_key_column_names = match &change["table"]["primaryKeyColumnNames"] {
            Json::Null => None,
            v => Some(v.to_string()),
        };

        let mut columns = Vec::new();
        if kind != DdlKind::Drop {
            let Some(raw_cols) = change["table"]["columns"].as_array() else {
                warn!("failed to get table.columns from change event");
                return Ok(None);
            };
            for raw in raw_cols {
                columns.push(parse_ddl_column(raw));
            }
        }

        let (src_ts_ms, ts_ms) = self.timestamps();
        Ok(Some(DdlEvent {
            id,
            kind,
            subkind: None,
            primary_key_column_names,
            columns,
            constraint_name: None,
            src_ts_ms,
            ts_ms,
        }))
    }

    /// Build the schema-section position map: one entry per field of the
    /// event's row block, keyed by lowercased field name.
    pub fn schema_jsonpos(&self) -> Result<HashMap<String, JsonPosEntry>, DbzError> {
        let Some(fields) = self.json["schema"]["fields"][0]["fields"].as_array() else {
            return Err(DbzError::MalformedEventSchema(
                "schema.fields.0.fields is missing".to_string(),
            ));
        };
        let mut map = HashMap::with_capacity(fields.len());
        let mut pos = 0;
        for field in fields {
            let Some(name) = field["field"].as_str() else {
                warn!("field is missing from change event schema");
                continue;
            };
            let Some(wire) = field["type"].as_str() else {
                warn!("type is missing from change event schema");
                continue;
            };
            let time_rep = field["name"]
                .as_str()
                .map(TimeRep::from_semantic_name)
                .unwrap_or_default();
            let scale = match &field["parameters"]["scale"] {
                Json::String(s) => s.parse().unwrap_or(0),
                Json::Number(n) => n.as_i64().unwrap_or(0) as i32,
                _ => 0,
            };
            let entry = JsonPosEntry {
                pos,
                wire_type: DbzType::from_wire(wire),
                time_rep,
                scale,
            };
            debug!(
                "new jsonpos entry name={} pos={} wire={:?} timerep={:?} scale={}",
                name, entry.pos, entry.wire_type, entry.time_rep, entry.scale
            );
            map.entry(fold_ident(name)).or_insert(entry);
            pos += 1;
        }
        Ok(map)
    }

    /// Parse a row-change event into a neutral DML record, resolving
    /// destination metadata through the schema cache.
    pub async fn parse_dml(
        &self,
        op: Op,
        store: &RuleStore,
        cache: &mut SchemaCache,
        session: &mut dyn DestinationSession,
    ) -> Result<DmlEvent, DbzError> {
        let source = self
            .source()
            .ok_or_else(|| DbzError::MalformedEvent("no source element".to_string()))?;
        let db = source["db"]
            .as_str()
            .ok_or_else(|| DbzError::MalformedEvent("no database attribute".to_string()))?;
        let table = source["table"]
            .as_str()
            .ok_or_else(|| DbzError::MalformedEvent("no table attribute".to_string()))?;
        let schema = source["schema"].as_str();

        let remote_object_id = fold_ident(&match schema {
            Some(s) => format!("{db}.{s}.{table}"),
            None => format!("{db}.{table}"),
        });

        let (dest_schema, dest_table, mapped_object_id) =
            resolve_dml_target(&remote_object_id, store)?;

        let jsonpos = self.schema_jsonpos()?;
        let entry = cache
            .get_or_load(session, &dest_schema, &dest_table, jsonpos)
            .await?;

        let (src_ts_ms, ts_ms) = self.timestamps();
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
            src_ts_ms,
            ts_ms,
        };

        match op {
            Op::Create | Op::Read => {
                dml.after =
                    parse_row(&self.payload()["after"], &remote_object_id, store, entry)?;
            }
            Op::Delete => {
                dml.before =
                    parse_row(&self.payload()["before"], &remote_object_id, store, entry)?;
            }
            Op::Update => {
                dml.before =
                    parse_row(&self.payload()["before"], &remote_object_id, store, entry)?;
                dml.after =
                    parse_row(&self.payload()["after"], &remote_object_id, store, entry)?;
            }
        }
        dml.sort_columns();
        Ok(dml)
    }
}

/// One column of a row image. Scalars become strings; sub-objects are
/// re-serialised to JSON text for the codec's struct branch; sub-arrays
/// are skipped entirely.
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
) -> Result<Vec<ColumnValue>, DbzError> {
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
            DbzError::MalformedEventSchema(format!(
                "no schema metadata for column {name}({remote_name})"
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

fn parse_ddl_column(raw: &Json) -> DdlColumn {
    let as_i32 = |v: &Json| v.as_i64().unwrap_or(0) as i32;
    DdlColumn {
        name: raw["name"].as_str().map(fold_ident).unwrap_or_default(),
        type_name: raw["typeName"].as_str().map(fold_ident).unwrap_or_default(),
        length: as_i32(&raw["length"]),
        scale: as_i32(&raw["scale"]),
        optional: raw["optional"].as_bool().unwrap_or(true),
        auto_incremented: raw["autoIncremented"].as_bool().unwrap_or(false),
        position: as_i32(&raw["position"]),
        default_value_expression: raw["defaultValueExpression"].as_str().map(str::to_string),
        // the enumValues sub-array is skipped; enums map to text anyway
        enum_values: raw["enumValues"].as_str().map(str::to_string),
        charset_name: raw["charsetName"].as_str().map(str::to_string),
    }
}

/// Table ids arrive quoted, e.g. `"shop"."orders"`; strip the quoting.
fn strip_quoting(id: &str) -> String {
    id.chars().filter(|c| *c != '"' && *c != '\\').collect()
}
