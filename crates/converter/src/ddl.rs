use tracing::{debug, warn};

use common::types::{word_match, AlterSubkind, ConnectorKind, DdlColumn, DdlEvent, DdlKind};
use common::utils::{remove_precision, split_id};
use destination::{DestinationSession, TableDef};
use rules::{ObjectType, RuleStore};

use crate::cache::SchemaCache;
use crate::error::ConvertError;

/// Destination cap for declared lengths.
const MAX_ATTR_SIZE: i32 = 10 * 1024 * 1024;

/// Column bookkeeping for the attribute catalog: which destination name,
/// type and position each source column ended up with. Placeholders (all
/// `None`) keep the list aligned with the source column list.
#[derive(Debug, Clone, Default)]
pub struct PgDdlColumn {
    pub name: Option<String>,
    pub type_name: Option<String>,
    pub position: i32,
}

/// A converted DDL statement ready for the applier.
#[derive(Debug, Clone)]
pub struct PgDdl {
    pub kind: DdlKind,
    /// `Some` for ALTERs that add or drop columns, so the catalog-sync
    /// layer can update its attribute table accordingly
    pub subkind: Option<AlterSubkind>,
    pub schema: String,
    pub table: String,
    pub sql: String,
    pub columns: Vec<PgDdlColumn>,
}

struct TargetName {
    schema: String,
    table: String,
    /// name as used in the emitted SQL (schema-qualified or bare)
    sql_name: String,
    /// schema to create first, when the statement is a CREATE
    create_schema: Option<String>,
}

/// Resolve the destination identity of `id` through the object map, or by
/// the default db-becomes-schema convention.
fn resolve_target(id: &str, store: &RuleStore) -> Result<TargetName, ConvertError> {
    if let Some(mapped) = store.resolve_name(id, ObjectType::Table) {
        let parts = split_id(mapped, false)
            .map_err(|_| ConvertError::MalformedIdentifier(mapped.to_string()))?;
        if parts.db.is_some() {
            // three-part mapped names are not valid on the destination
            return Err(ConvertError::MalformedIdentifier(mapped.to_string()));
        }
        return Ok(match parts.schema {
            Some(schema) => TargetName {
                sql_name: format!("{}.{}", schema, parts.table),
                create_schema: Some(schema.clone()),
                schema,
                table: parts.table,
            },
            None => TargetName {
                schema: "public".to_string(),
                sql_name: parts.table.clone(),
                create_schema: None,
                table: parts.table,
            },
        });
    }

    // default transform: database becomes the destination schema, any
    // remote schema level is ignored, the table name stays
    let parts = split_id(id, true).map_err(|_| ConvertError::MalformedIdentifier(id.to_string()))?;
    let Some(db) = parts.db else {
        return Err(ConvertError::MalformedIdentifier(id.to_string()));
    };
    Ok(TargetName {
        sql_name: format!("{}.{}", db, parts.table),
        create_schema: Some(db.clone()),
        schema: db,
        table: parts.table,
    })
}

/// Resolve where a DML event lands on the destination: `(schema, table,
/// mapped id)`. A configured table rule is used verbatim as the mapped id;
/// without one the remote database becomes the schema.
pub fn resolve_dml_target(
    remote_object_id: &str,
    store: &RuleStore,
) -> Result<(String, String, String), ConvertError> {
    if let Some(mapped) = store.resolve_name(remote_object_id, ObjectType::Table) {
        let parts = split_id(mapped, false)
            .map_err(|_| ConvertError::MalformedIdentifier(mapped.to_string()))?;
        if parts.db.is_some() {
            return Err(ConvertError::MalformedIdentifier(mapped.to_string()));
        }
        let schema = parts
            .schema
            .unwrap_or_else(|| "public".to_string())
            .to_ascii_lowercase();
        return Ok((schema, parts.table.to_ascii_lowercase(), mapped.to_string()));
    }
    let parts = split_id(remote_object_id, true)
        .map_err(|_| ConvertError::MalformedIdentifier(remote_object_id.to_string()))?;
    let Some(db) = parts.db else {
        return Err(ConvertError::MalformedIdentifier(remote_object_id.to_string()));
    };
    let schema = db.to_ascii_lowercase();
    let table = parts.table.to_ascii_lowercase();
    let mapped = format!("{schema}.{table}");
    Ok((schema, table, mapped))
}

struct ResolvedColumn {
    attname: String,
    atttype: String,
    length: i32,
    scale: i32,
    /// extra `(n)` suffix for sqlserver time types whose precision rides
    /// in the scale field
    precision_suffix: Option<i32>,
}

fn resolve_column(id: &str, col: &DdlColumn, store: &RuleStore) -> ResolvedColumn {
    let col_id = format!("{}.{}", id, col.name);
    let attname = store
        .resolve_name(&col_id, ObjectType::Column)
        .map(str::to_string)
        .unwrap_or_else(|| col.name.clone());

    let mut length = col.length;
    let mut scale = col.scale;
    let token = match store.kind() {
        ConnectorKind::Oracle | ConnectorKind::Olr => {
            // the type token may embed precision, e.g.
            // INTERVAL DAY(3) TO SECOND(6); strip it and fold the scale
            // into the length for destination compatibility
            let (clean, removed) = remove_precision(&col.type_name);
            let clean = clean.trim().to_string();
            if (clean.eq_ignore_ascii_case("interval day to second") && scale > 0) || removed {
                length = scale;
                scale = 0;
            }
            clean
        }
        _ => col.type_name.clone(),
    };

    let (atttype, length) = match store.resolve_type(&col_id, &token, length, scale, col.auto_incremented)
    {
        Some(rule) => {
            debug!(
                "transform {} (autoincrement {}) to {} with length {}",
                token, col.auto_incremented, rule.dest_type, rule.length_override
            );
            let length = if rule.length_override != -1 {
                rule.length_override
            } else {
                length
            };
            (rule.dest_type.clone(), length)
        }
        None => {
            debug!(
                "no transformation done for {} (autoincrement {})",
                token, col.auto_incremented
            );
            (token, length)
        }
    };

    // sqlserver sends time precision as scale, not length
    let precision_suffix = if store.kind() == ConnectorKind::SqlServer
        && col.scale > 0
        && (word_match(&atttype, "timestamp")
            || word_match(&atttype, "time")
            || word_match(&atttype, "timestamptz"))
    {
        Some(col.scale.min(6))
    } else {
        None
    };

    ResolvedColumn {
        attname,
        atttype,
        length,
        scale,
        precision_suffix,
    }
}

/// Render `name type[(len[, scale])] [CHECK …] [NOT NULL] [DEFAULT NULL]`.
fn column_clause(rc: &ResolvedColumn, col: &DdlColumn, with_name: bool) -> String {
    let mut out = String::new();
    if with_name {
        out.push_str(&rc.attname);
        out.push(' ');
    }
    out.push_str(&rc.atttype);
    if let Some(precision) = rc.precision_suffix {
        out.push_str(&format!("({precision})"));
    } else if rc.length > 0 && rc.scale > 0 {
        out.push_str(&format!("({}, {})", rc.length.min(MAX_ATTR_SIZE), rc.scale));
    } else if rc.length > 0 {
        out.push_str(&format!("({})", rc.length.min(MAX_ATTR_SIZE)));
    }
    if col.type_name.contains("unsigned") {
        out.push_str(&format!(" CHECK ({} >= 0)", rc.attname));
    }
    if !col.optional {
        out.push_str(" NOT NULL");
    }
    if !col.auto_incremented
        && col
            .default_value_expression
            .as_deref()
            .is_some_and(|d| !d.is_empty())
    {
        // source defaults are not trusted to parse on the destination
        out.push_str(" DEFAULT NULL");
    }
    out
}

/// Map primary-key column names (kept as the raw JSON array literal)
/// through the column rules and render a `PRIMARY KEY (…)` clause.
fn primary_key_clause(ddl: &DdlEvent, store: &RuleStore, alter: bool) -> Option<String> {
    let names = primary_key_columns(ddl, store)?;
    let keyword = if alter { "ADD PRIMARY KEY" } else { "PRIMARY KEY" };
    Some(format!(", {} ({})", keyword, names.join(", ")))
}

fn primary_key_columns(ddl: &DdlEvent, store: &RuleStore) -> Option<Vec<String>> {
    let raw = ddl.primary_key_column_names.as_deref()?;
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return None;
    }
    let names: Vec<String> = serde_json::from_str(raw).ok()?;
    if names.is_empty() {
        return None;
    }
    Some(
        names
            .into_iter()
            .map(|n| {
                let col_id = format!("{}.{}", ddl.id, n);
                store
                    .resolve_name(&col_id, ObjectType::Column)
                    .map(str::to_string)
                    .unwrap_or(n)
            })
            .collect(),
    )
}

/// Convert a neutral DDL record into destination SQL. Returns `None` when
/// the event amounts to nothing to apply (e.g. an ALTER that matched the
/// live schema). Evicts the schema cache entry for the affected table.
pub async fn convert_ddl(
    ddl: &DdlEvent,
    store: &RuleStore,
    session: &mut dyn DestinationSession,
    cache: &mut SchemaCache,
) -> Result<Option<PgDdl>, ConvertError> {
    let target = resolve_target(&ddl.id, store)?;
    cache.evict(&target.schema, &target.table);

    match ddl.kind {
        DdlKind::Create => Ok(Some(convert_create(ddl, store, &target))),
        DdlKind::Drop => Ok(Some(PgDdl {
            kind: DdlKind::Drop,
            subkind: None,
            sql: format!("DROP TABLE IF EXISTS {};", target.sql_name),
            schema: target.schema,
            table: target.table,
            columns: Vec::new(),
        })),
        DdlKind::Alter => {
            let def = session
                .lookup_table(&target.schema, &target.table)
                .await?;
            if let Some(subkind) = ddl.subkind {
                convert_alter_tagged(ddl, store, &target, &def, subkind)
            } else {
                convert_alter_diff(ddl, store, &target, &def)
            }
        }
    }
}

fn convert_create(ddl: &DdlEvent, store: &RuleStore, target: &TargetName) -> PgDdl {
    let mut sql = String::new();
    if let Some(schema) = &target.create_schema {
        sql.push_str(&format!("CREATE SCHEMA IF NOT EXISTS {}; ", schema));
    }
    sql.push_str(&format!("CREATE TABLE IF NOT EXISTS {} (", target.sql_name));

    let mut columns = Vec::with_capacity(ddl.columns.len());
    let mut clauses = Vec::with_capacity(ddl.columns.len());
    for (i, col) in ddl.columns.iter().enumerate() {
        let rc = resolve_column(&ddl.id, col, store);
        clauses.push(column_clause(&rc, col, true));
        columns.push(PgDdlColumn {
            name: Some(rc.attname),
            type_name: Some(rc.atttype),
            position: i as i32 + 1,
        });
    }
    sql.push_str(&clauses.join(", "));
    if let Some(pk) = primary_key_clause(ddl, store, false) {
        sql.push_str(&pk);
    }
    sql.push_str(");");

    PgDdl {
        kind: DdlKind::Create,
        subkind: None,
        schema: target.schema.clone(),
        table: target.table.clone(),
        sql,
        columns,
    }
}

/// Debezium ALTERs carry the full post-statement column list; derive what
/// changed by diffing against the live destination schema.
fn convert_alter_diff(
    ddl: &DdlEvent,
    store: &RuleStore,
    target: &TargetName,
    def: &TableDef,
) -> Result<Option<PgDdl>, ConvertError> {
    let active = def.active_attr_count();
    let natts = def.attrs.len() as i32;
    let mut sql = format!("ALTER TABLE {} ", target.sql_name);
    let mut columns = Vec::new();
    let mut clauses: Vec<String> = Vec::new();
    let subkind;

    if ddl.columns.len() > active {
        // more source columns than live ones: ADD COLUMN
        let mut added = 0;
        for col in &ddl.columns {
            let rc = resolve_column(&ddl.id, col, store);
            if def.attr_by_name(&rc.attname).is_some() {
                columns.push(PgDdlColumn::default());
                continue;
            }
            debug!("adding new column {}", rc.attname);
            added += 1;
            clauses.push(format!("ADD COLUMN {}", column_clause(&rc, col, true)));
            columns.push(PgDdlColumn {
                name: Some(rc.attname),
                type_name: Some(rc.atttype),
                position: natts + added,
            });
        }
        if clauses.is_empty() {
            debug!("no column altered");
            return Ok(None);
        }
        subkind = Some(AlterSubkind::AddColumn);
        sql.push_str(&clauses.join(", "));
        // a new primary key cannot ride along with ADD COLUMN: some source
        // connectors cannot emit both in one statement
    } else if ddl.columns.len() < active {
        // fewer source columns: DROP COLUMN for everything missing
        let mapped: Vec<String> = ddl
            .columns
            .iter()
            .map(|c| resolve_column(&ddl.id, c, store).attname)
            .collect();
        for attr in def.attrs.iter().filter(|a| !a.is_dropped) {
            if mapped.iter().any(|m| m.eq_ignore_ascii_case(&attr.name)) {
                continue;
            }
            debug!("dropping old column {}", attr.name);
            clauses.push(format!("DROP COLUMN {}", attr.name));
            columns.push(PgDdlColumn {
                name: Some(attr.name.clone()),
                type_name: None,
                position: attr.position,
            });
        }
        if clauses.is_empty() {
            debug!("no column altered");
            return Ok(None);
        }
        subkind = Some(AlterSubkind::DropColumn);
        sql.push_str(&clauses.join(", "));
    } else {
        // same column count: per-column ALTER
        for col in &ddl.columns {
            let rc = resolve_column(&ddl.id, col, store);
            match def.attr_by_name(&rc.attname) {
                Some(attr) => {
                    if attr.is_pk {
                        // type changes on key columns are skipped
                        columns.push(PgDdlColumn::default());
                        continue;
                    }
                    clauses.push(alter_column_clauses(&rc, col));
                    columns.push(PgDdlColumn {
                        name: Some(rc.attname),
                        type_name: Some(rc.atttype),
                        position: attr.position,
                    });
                }
                None => {
                    warn!(
                        "column {} missing in destination, indicating a renamed column?! - \
                         not supported now",
                        rc.attname
                    );
                    columns.push(PgDdlColumn::default());
                }
            }
        }
        if clauses.is_empty() {
            debug!("no column altered");
            return Ok(None);
        }
        subkind = None;
        sql.push_str(&clauses.join(", "));
        if !def.has_primary_key() {
            if let Some(pk) = primary_key_clause(ddl, store, true) {
                sql.push_str(&pk);
            }
        }
    }
    sql.push(';');

    Ok(Some(PgDdl {
        kind: DdlKind::Alter,
        subkind,
        schema: target.schema.clone(),
        table: target.table.clone(),
        sql,
        columns,
    }))
}

fn alter_column_clauses(rc: &ResolvedColumn, col: &DdlColumn) -> String {
    let mut ty = rc.atttype.clone();
    if let Some(precision) = rc.precision_suffix {
        ty.push_str(&format!("({precision})"));
    } else if rc.length > 0 && rc.scale > 0 {
        ty.push_str(&format!("({}, {})", rc.length.min(MAX_ATTR_SIZE), rc.scale));
    } else if rc.length > 0 {
        ty.push_str(&format!("({})", rc.length.min(MAX_ATTR_SIZE)));
    }
    let default_clause = if col
        .default_value_expression
        .as_deref()
        .is_some_and(|d| !d.is_empty())
    {
        format!("ALTER COLUMN {} SET DEFAULT NULL", rc.attname)
    } else {
        format!("ALTER COLUMN {} DROP DEFAULT", rc.attname)
    };
    let null_clause = if col.optional {
        format!("ALTER COLUMN {} DROP NOT NULL", rc.attname)
    } else {
        format!("ALTER COLUMN {} SET NOT NULL", rc.attname)
    };
    format!(
        "ALTER COLUMN {} SET DATA TYPE {}, {}, {}",
        rc.attname, ty, default_clause, null_clause
    )
}

/// OLR ALTERs are parsed from the statement itself and arrive pre-tagged
/// with the sub-operation and only the affected columns.
fn convert_alter_tagged(
    ddl: &DdlEvent,
    store: &RuleStore,
    target: &TargetName,
    def: &TableDef,
    subkind: AlterSubkind,
) -> Result<Option<PgDdl>, ConvertError> {
    let natts = def.attrs.len() as i32;
    let mut sql = format!("ALTER TABLE {} ", target.sql_name);
    let mut columns = Vec::new();
    let mut clauses: Vec<String> = Vec::new();

    match subkind {
        AlterSubkind::AddColumn => {
            let mut added = 0;
            for col in &ddl.columns {
                let rc = resolve_column(&ddl.id, col, store);
                if def.attr_by_name(&rc.attname).is_some() {
                    columns.push(PgDdlColumn::default());
                    continue;
                }
                added += 1;
                clauses.push(format!("ADD COLUMN {}", column_clause(&rc, col, true)));
                columns.push(PgDdlColumn {
                    name: Some(rc.attname),
                    type_name: Some(rc.atttype),
                    position: natts + added,
                });
            }
        }
        AlterSubkind::DropColumn => {
            for col in &ddl.columns {
                let rc = resolve_column(&ddl.id, col, store);
                let position = def.attr_by_name(&rc.attname).map_or(0, |a| a.position);
                clauses.push(format!("DROP COLUMN {}", rc.attname));
                columns.push(PgDdlColumn {
                    name: Some(rc.attname),
                    type_name: None,
                    position,
                });
            }
        }
        AlterSubkind::AlterColumn => {
            for col in &ddl.columns {
                let rc = resolve_column(&ddl.id, col, store);
                match def.attr_by_name(&rc.attname) {
                    Some(attr) if !attr.is_pk => {
                        clauses.push(alter_column_clauses(&rc, col));
                        columns.push(PgDdlColumn {
                            name: Some(rc.attname),
                            type_name: Some(rc.atttype),
                            position: attr.position,
                        });
                    }
                    _ => columns.push(PgDdlColumn::default()),
                }
            }
        }
        AlterSubkind::AddConstraint => {
            let Some(names) = primary_key_columns(ddl, store) else {
                return Err(ConvertError::UnsupportedDdl(
                    "ADD CONSTRAINT without a primary key column list".to_string(),
                ));
            };
            match &ddl.constraint_name {
                Some(name) => clauses.push(format!(
                    "ADD CONSTRAINT {} PRIMARY KEY ({})",
                    name,
                    names.join(", ")
                )),
                None => clauses.push(format!("ADD PRIMARY KEY ({})", names.join(", "))),
            }
        }
        AlterSubkind::DropConstraint => {
            let Some(name) = &ddl.constraint_name else {
                return Err(ConvertError::UnsupportedDdl(
                    "DROP CONSTRAINT without a constraint name".to_string(),
                ));
            };
            clauses.push(format!("DROP CONSTRAINT {}", name));
        }
    }

    if clauses.is_empty() {
        debug!("no column altered");
        return Ok(None);
    }
    sql.push_str(&clauses.join(", "));
    sql.push(';');

    Ok(Some(PgDdl {
        kind: DdlKind::Alter,
        subkind: Some(subkind),
        schema: target.schema.clone(),
        table: target.table.clone(),
        sql,
        columns,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::{ConnectorKind, TypeCategory};
    use destination::{AttrDef, MemorySession};

    fn ddl_col(name: &str, ty: &str, length: i32, scale: i32, optional: bool) -> DdlColumn {
        DdlColumn {
            name: name.into(),
            type_name: ty.into(),
            length,
            scale,
            optional,
            auto_incremented: false,
            position: 0,
            default_value_expression: None,
            enum_values: None,
            charset_name: None,
        }
    }

    fn ddl(id: &str, kind: DdlKind, pks: Option<&str>, columns: Vec<DdlColumn>) -> DdlEvent {
        DdlEvent {
            id: id.into(),
            kind,
            subkind: None,
            primary_key_column_names: pks.map(str::to_string),
            columns,
            constraint_name: None,
            src_ts_ms: 0,
            ts_ms: 0,
        }
    }

    fn attr(name: &str, pos: i32, pk: bool) -> AttrDef {
        AttrDef {
            name: name.into(),
            type_oid: 23,
            position: pos,
            typmod: -1,
            is_pk: pk,
            category: TypeCategory::Numeric,
            type_name: "integer".into(),
            is_dropped: false,
        }
    }

    async fn run(
        ddl: &DdlEvent,
        store: &RuleStore,
        session: &MemorySession,
        cache: &mut SchemaCache,
    ) -> Option<PgDdl> {
        let mut s = session.clone();
        convert_ddl(ddl, store, &mut s, cache).await.unwrap()
    }

    #[tokio::test]
    async fn create_table_with_primary_key() {
        let store = RuleStore::new(ConnectorKind::Mysql);
        let session = MemorySession::new();
        let mut cache = SchemaCache::new();
        let event = ddl(
            "shop.orders",
            DdlKind::Create,
            Some(r#"["order_id"]"#),
            vec![
                ddl_col("order_id", "int", 0, 0, false),
                ddl_col("order_date", "date", 0, 0, true),
                ddl_col("total", "decimal", 10, 2, true),
            ],
        );
        let pg = run(&event, &store, &session, &mut cache).await.unwrap();
        assert_eq!(
            pg.sql,
            "CREATE SCHEMA IF NOT EXISTS shop; \
             CREATE TABLE IF NOT EXISTS shop.orders (\
             order_id int NOT NULL, order_date date, total decimal(10, 2), \
             PRIMARY KEY (order_id));"
        );
        assert_eq!(pg.schema, "shop");
        assert_eq!(pg.table, "orders");
        assert_eq!(pg.columns.len(), 3);
        assert_eq!(pg.columns[2].position, 3);
    }

    #[tokio::test]
    async fn create_unsigned_gets_check_and_default_null() {
        let store = RuleStore::new(ConnectorKind::Mysql);
        let session = MemorySession::new();
        let mut cache = SchemaCache::new();
        let mut col = ddl_col("qty", "int unsigned", 0, 0, true);
        col.default_value_expression = Some("0".into());
        let event = ddl("shop.t", DdlKind::Create, None, vec![col]);
        let pg = run(&event, &store, &session, &mut cache).await.unwrap();
        assert!(pg.sql.contains("qty bigint CHECK (qty >= 0) DEFAULT NULL"));
    }

    #[tokio::test]
    async fn mapped_table_name_is_used() {
        let mut store = RuleStore::new(ConnectorKind::Mysql);
        store.insert_name_rule("inventory.products", ObjectType::Table, "stock.items");
        let session = MemorySession::new();
        let mut cache = SchemaCache::new();
        let event = ddl(
            "inventory.products",
            DdlKind::Create,
            None,
            vec![ddl_col("id", "int", 0, 0, false)],
        );
        let pg = run(&event, &store, &session, &mut cache).await.unwrap();
        assert!(pg.sql.starts_with(
            "CREATE SCHEMA IF NOT EXISTS stock; CREATE TABLE IF NOT EXISTS stock.items"
        ));
    }

    #[tokio::test]
    async fn drop_emits_if_exists_and_evicts_cache() {
        let store = RuleStore::new(ConnectorKind::Olr);
        let session = MemorySession::new();
        // the unmapped default folds the remote db into the schema, so the
        // table lives under its destination identity orclcdb.emp
        session.define_table("orclcdb", "emp", vec![attr("id", 1, true)]);
        let mut s = session.clone();
        let mut cache = SchemaCache::new();
        cache
            .get_or_load(&mut s, "orclcdb", "emp", Default::default())
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);

        let event = ddl("orclcdb.hr.emp", DdlKind::Drop, None, vec![]);
        let pg = run(&event, &store, &session, &mut cache).await.unwrap();
        assert_eq!(pg.sql, "DROP TABLE IF EXISTS orclcdb.emp;");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn alter_with_extra_columns_adds() {
        let store = RuleStore::new(ConnectorKind::Mysql);
        let session = MemorySession::new();
        session.define_table("shop", "orders", vec![attr("id", 1, true)]);
        let mut cache = SchemaCache::new();
        let event = ddl(
            "shop.orders",
            DdlKind::Alter,
            Some(r#"["id"]"#),
            vec![
                ddl_col("id", "int", 0, 0, false),
                ddl_col("note", "varchar", 30, 0, true),
            ],
        );
        let pg = run(&event, &store, &session, &mut cache).await.unwrap();
        assert_eq!(
            pg.sql,
            "ALTER TABLE shop.orders ADD COLUMN note varchar(30);"
        );
        assert_eq!(pg.subkind, Some(AlterSubkind::AddColumn));
        assert_eq!(pg.columns[1].position, 2);
        // no ADD PRIMARY KEY in the add-column branch
        assert!(!pg.sql.contains("PRIMARY KEY"));
    }

    #[tokio::test]
    async fn alter_with_missing_columns_drops() {
        let store = RuleStore::new(ConnectorKind::Mysql);
        let session = MemorySession::new();
        session.define_table(
            "shop",
            "orders",
            vec![attr("id", 1, true), attr("legacy", 2, false)],
        );
        let mut cache = SchemaCache::new();
        let event = ddl(
            "shop.orders",
            DdlKind::Alter,
            None,
            vec![ddl_col("id", "int", 0, 0, false)],
        );
        let pg = run(&event, &store, &session, &mut cache).await.unwrap();
        assert_eq!(pg.sql, "ALTER TABLE shop.orders DROP COLUMN legacy;");
        assert_eq!(pg.subkind, Some(AlterSubkind::DropColumn));
    }

    #[tokio::test]
    async fn alter_same_count_rewrites_columns_and_skips_pk() {
        let store = RuleStore::new(ConnectorKind::Mysql);
        let session = MemorySession::new();
        session.define_table(
            "shop",
            "orders",
            vec![attr("id", 1, true), attr("note", 2, false)],
        );
        let mut cache = SchemaCache::new();
        let event = ddl(
            "shop.orders",
            DdlKind::Alter,
            None,
            vec![
                ddl_col("id", "int", 0, 0, false),
                ddl_col("note", "varchar", 60, 0, true),
            ],
        );
        let pg = run(&event, &store, &session, &mut cache).await.unwrap();
        assert_eq!(
            pg.sql,
            "ALTER TABLE shop.orders \
             ALTER COLUMN note SET DATA TYPE varchar(60), \
             ALTER COLUMN note DROP DEFAULT, \
             ALTER COLUMN note DROP NOT NULL;"
        );
        assert_eq!(pg.subkind, None);
    }

    #[tokio::test]
    async fn alter_adds_primary_key_when_table_has_none() {
        let store = RuleStore::new(ConnectorKind::Mysql);
        let session = MemorySession::new();
        session.define_table("shop", "orders", vec![attr("id", 1, false)]);
        let mut cache = SchemaCache::new();
        let event = ddl(
            "shop.orders",
            DdlKind::Alter,
            Some(r#"["id"]"#),
            vec![ddl_col("id", "int", 0, 0, false)],
        );
        let pg = run(&event, &store, &session, &mut cache).await.unwrap();
        assert!(pg.sql.ends_with(", ADD PRIMARY KEY (id);"));
    }

    #[tokio::test]
    async fn alter_matching_schema_is_a_noop() {
        let store = RuleStore::new(ConnectorKind::Mysql);
        let session = MemorySession::new();
        session.define_table("shop", "orders", vec![attr("id", 1, true)]);
        let mut cache = SchemaCache::new();
        let event = ddl(
            "shop.orders",
            DdlKind::Alter,
            None,
            vec![ddl_col("id", "int", 0, 0, false)],
        );
        assert!(run(&event, &store, &session, &mut cache).await.is_none());
    }

    #[tokio::test]
    async fn olr_add_constraint_uses_constraint_name() {
        let store = RuleStore::new(ConnectorKind::Olr);
        let session = MemorySession::new();
        session.define_table("hr", "emp", vec![attr("id", 1, false)]);
        let mut store_with_map = store;
        store_with_map.insert_name_rule("orclcdb.hr.emp", ObjectType::Table, "hr.emp");
        let mut cache = SchemaCache::new();
        let mut event = ddl(
            "orclcdb.hr.emp",
            DdlKind::Alter,
            Some(r#"["id"]"#),
            vec![],
        );
        event.subkind = Some(AlterSubkind::AddConstraint);
        event.constraint_name = Some("emp_pk".into());
        let pg = run(&event, &store_with_map, &session, &mut cache)
            .await
            .unwrap();
        assert_eq!(
            pg.sql,
            "ALTER TABLE hr.emp ADD CONSTRAINT emp_pk PRIMARY KEY (id);"
        );
    }

    #[tokio::test]
    async fn sqlserver_time_precision_rides_in_scale() {
        let store = RuleStore::new(ConnectorKind::SqlServer);
        let session = MemorySession::new();
        let mut cache = SchemaCache::new();
        let event = ddl(
            "db.dbo.t",
            DdlKind::Create,
            None,
            vec![ddl_col("ts", "datetime2", 0, 7, true)],
        );
        let pg = run(&event, &store, &session, &mut cache).await.unwrap();
        // capped at 6, the destination maximum
        assert!(pg.sql.contains("ts timestamp(6)"));
    }

    #[tokio::test]
    async fn oracle_interval_precision_folds_into_length() {
        let store = RuleStore::new(ConnectorKind::Oracle);
        let session = MemorySession::new();
        let mut cache = SchemaCache::new();
        let event = ddl(
            "orcl.hr.t",
            DdlKind::Create,
            None,
            vec![ddl_col("span", "interval day(3) to second(6)", 3, 6, true)],
        );
        let pg = run(&event, &store, &session, &mut cache).await.unwrap();
        assert!(pg.sql.contains("span interval day to second(6)"));
    }
}
