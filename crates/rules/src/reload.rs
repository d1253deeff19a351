use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use common::utils::split_id;

use crate::error::RuleError;
use crate::store::{ObjectType, RuleStore};

/// One row of the object-mapping table, as stored on the destination and
/// handed back on reload. `curr_*` fields record what the connector has
/// already created so a changed rule can be migrated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjmapEntry {
    /// `table`, `column`, `transform` or `datatype`
    pub objtype: String,
    pub enabled: bool,
    pub srcobj: String,
    pub dstobj: String,
    #[serde(default)]
    pub curr_dest_table: Option<String>,
    #[serde(default)]
    pub curr_dest_column: Option<String>,
    #[serde(default)]
    pub curr_dest_type: Option<String>,
}

/// Destination statement produced by a reload when a rule change requires
/// migrating an already-created object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSql(pub String);

/// Rebuild the store's rule maps from the given object-map rows. Rows that
/// rename an object the connector already created, or change the type of
/// an existing column, additionally yield the migration SQL the applier
/// must run.
pub fn reload_from_objmap(
    store: &mut RuleStore,
    entries: &[ObjmapEntry],
) -> Result<Vec<MigrationSql>, RuleError> {
    let mut migrations = Vec::new();

    for entry in entries {
        debug!(
            "objmap: type {}, src {} dst {} enabled {}",
            entry.objtype, entry.srcobj, entry.dstobj, entry.enabled
        );
        match entry.objtype.to_ascii_lowercase().as_str() {
            "table" | "column" => {
                let objtype = ObjectType::parse(&entry.objtype).expect("matched above");
                if !entry.enabled {
                    if store.remove_name_rule(&entry.srcobj, objtype).is_some() {
                        warn!(
                            "deleted object mapping '{}' <-> '{}'",
                            entry.srcobj, entry.dstobj
                        );
                    }
                    continue;
                }
                store.insert_name_rule(&entry.srcobj, objtype, &entry.dstobj);

                if objtype == ObjectType::Table {
                    if let Some(curr) = entry.curr_dest_table.as_deref() {
                        // a bare target table name defaults to public
                        let target = if entry.dstobj.contains('.') {
                            entry.dstobj.clone()
                        } else {
                            format!("public.{}", entry.dstobj)
                        };
                        if !target.eq_ignore_ascii_case(curr) {
                            migrations.push(rename_table(curr, &target)?);
                        }
                    }
                } else if let (Some(tbname), Some(attname)) = (
                    entry.curr_dest_table.as_deref(),
                    entry.curr_dest_column.as_deref(),
                ) {
                    if !entry.dstobj.eq_ignore_ascii_case(attname) {
                        migrations.push(MigrationSql(format!(
                            "ALTER TABLE {} RENAME COLUMN {} TO {};",
                            tbname, attname, entry.dstobj
                        )));
                    }
                }
            }
            "transform" => {
                if entry.enabled {
                    store.insert_transform_rule(&entry.srcobj, &entry.dstobj);
                } else if store.remove_transform_rule(&entry.srcobj).is_some() {
                    warn!(
                        "deleted transform expression mapping '{}' <-> '{}'",
                        entry.srcobj, entry.dstobj
                    );
                }
            }
            "datatype" => {
                if !entry.enabled {
                    // disabled type rules are ignored rather than removed;
                    // the map may hold overwritten defaults we must keep
                    warn!(
                        "ignored disabled data type mapping '{}' <-> '{}'",
                        entry.srcobj, entry.dstobj
                    );
                    continue;
                }
                let (token, auto) = parse_datatype_src(&entry.srcobj);
                let (dest_type, size) = parse_datatype_dst(&entry.dstobj);
                store.insert_type_rule(&token, auto, &dest_type, size);

                if let (Some(tbname), Some(attname), Some(atttype)) = (
                    entry.curr_dest_table.as_deref(),
                    entry.curr_dest_column.as_deref(),
                    entry.curr_dest_type.as_deref(),
                ) {
                    if !atttype.eq_ignore_ascii_case(&dest_type) {
                        migrations.push(alter_column_type(tbname, attname, &dest_type, size));
                    }
                }
            }
            other => {
                return Err(RuleError::objmap(format!("unknown objtype '{other}'")));
            }
        }
    }
    Ok(migrations)
}

/// `token|autoinc` with the flag optional.
fn parse_datatype_src(src: &str) -> (String, bool) {
    match src.split_once('|') {
        Some((token, flag)) => (token.to_string(), flag.eq_ignore_ascii_case("true")),
        None => (src.to_string(), false),
    }
}

/// `type|size` with the size optional, defaulting to "keep declared".
fn parse_datatype_dst(dst: &str) -> (String, i32) {
    match dst.split_once('|') {
        Some((ty, size)) => (ty.to_string(), size.parse().unwrap_or(-1)),
        None => (dst.to_string(), -1),
    }
}

/// Rename `from` to `to`, moving schemas where needed. Both sides are
/// `schema.table` or bare `table`.
fn rename_table(from: &str, to: &str) -> Result<MigrationSql, RuleError> {
    let from_parts = split_id(from, false)
        .map_err(|e| RuleError::objmap(format!("bad current table name: {e}")))?;
    let to_parts =
        split_id(to, false).map_err(|e| RuleError::objmap(format!("bad target table name: {e}")))?;

    let sql = match (&from_parts.schema, &to_parts.schema) {
        (Some(from_schema), Some(to_schema)) => format!(
            "CREATE SCHEMA IF NOT EXISTS {to_schema}; \
             ALTER TABLE {from} RENAME TO {new}; \
             ALTER TABLE {from_schema}.{new} SET SCHEMA {to_schema};",
            new = to_parts.table,
        ),
        (Some(from_schema), None) => format!(
            "ALTER TABLE {from} RENAME TO {new}; \
             ALTER TABLE {from_schema}.{new} SET SCHEMA public;",
            new = to_parts.table,
        ),
        (None, Some(to_schema)) => format!(
            "CREATE SCHEMA IF NOT EXISTS {to_schema}; \
             ALTER TABLE {from} RENAME TO {new}; \
             ALTER TABLE {new} SET SCHEMA {to_schema};",
            new = to_parts.table,
        ),
        (None, None) => format!("ALTER TABLE {from} RENAME TO {};", to_parts.table),
    };
    Ok(MigrationSql(sql))
}

fn alter_column_type(tbname: &str, attname: &str, dest_type: &str, size: i32) -> MigrationSql {
    let mut sql = format!("ALTER TABLE {tbname} ALTER COLUMN {attname} SET DATA TYPE {dest_type}");
    if size > 0 {
        sql.push_str(&format!("({size})"));
    }
    sql.push(';');
    MigrationSql(sql)
}
