use tracing::warn;

use common::config::DmlMode;
use common::types::{DmlEvent, Op};
use destination::TupleValue;
use rules::RuleStore;

use crate::codec::{process_value, TransformEvaluator};
use crate::error::ConvertError;

/// The applier-facing form of one DML event.
#[derive(Debug, Clone)]
pub enum PgDmlBody {
    /// text-SQL mode: a complete statement
    Sql(String),
    /// tuple mode: before/after value lists ordered by attribute position
    Tuples {
        before: Vec<TupleValue>,
        after: Vec<TupleValue>,
    },
}

#[derive(Debug, Clone)]
pub struct PgDml {
    pub op: Op,
    pub table_oid: u32,
    pub natts: i32,
    pub mapped_object_id: String,
    pub body: PgDmlBody,
}

/// Convert a neutral DML record into destination form. In text-SQL mode
/// UPDATE/DELETE require at least one primary-key column in the before
/// image; violating records fail with [`ConvertError::NoPrimaryKey`].
pub fn convert_dml(
    dml: &DmlEvent,
    mode: DmlMode,
    store: &RuleStore,
    evaluator: Option<&dyn TransformEvaluator>,
) -> Result<PgDml, ConvertError> {
    let body = match mode {
        DmlMode::TextSql => PgDmlBody::Sql(build_sql(dml, store, evaluator)?),
        DmlMode::Tuple => PgDmlBody::Tuples {
            before: build_tuples(dml, &dml.before, store, evaluator)?,
            after: build_tuples(dml, &dml.after, store, evaluator)?,
        },
    };
    Ok(PgDml {
        op: dml.op,
        table_oid: dml.table_oid,
        natts: dml.natts,
        mapped_object_id: dml.mapped_object_id.clone(),
        body,
    })
}

fn build_sql(
    dml: &DmlEvent,
    store: &RuleStore,
    evaluator: Option<&dyn TransformEvaluator>,
) -> Result<String, ConvertError> {
    match dml.op {
        Op::Read | Op::Create => {
            let mut cols = Vec::with_capacity(dml.after.len());
            let mut vals = Vec::with_capacity(dml.after.len());
            for colval in &dml.after {
                cols.push(colval.name.clone());
                vals.push(sql_value(dml, colval, store, evaluator)?);
            }
            Ok(format!(
                "INSERT INTO {} ({}) VALUES ({});",
                dml.mapped_object_id,
                cols.join(", "),
                vals.join(", ")
            ))
        }
        Op::Delete => {
            let preds = key_predicates(dml, store, evaluator)?;
            if preds.is_empty() {
                warn!(
                    "no primary key available to build DELETE query for table {}. \
                     Operation skipped. Use tuple mode to support DELETE without primary key",
                    dml.mapped_object_id
                );
                return Err(ConvertError::NoPrimaryKey(
                    "DELETE",
                    dml.mapped_object_id.clone(),
                ));
            }
            Ok(format!(
                "DELETE FROM {} WHERE {};",
                dml.mapped_object_id,
                preds.join(" AND ")
            ))
        }
        Op::Update => {
            let mut sets = Vec::with_capacity(dml.after.len());
            for colval in &dml.after {
                sets.push(format!(
                    "{} = {}",
                    colval.name,
                    sql_value(dml, colval, store, evaluator)?
                ));
            }
            let preds = key_predicates(dml, store, evaluator)?;
            if preds.is_empty() {
                warn!(
                    "no primary key available to build UPDATE query for table {}. \
                     Operation skipped. Use tuple mode to support UPDATE without primary key",
                    dml.mapped_object_id
                );
                return Err(ConvertError::NoPrimaryKey(
                    "UPDATE",
                    dml.mapped_object_id.clone(),
                ));
            }
            Ok(format!(
                "UPDATE {} SET {} WHERE {};",
                dml.mapped_object_id,
                sets.join(", "),
                preds.join(" AND ")
            ))
        }
    }
}

fn key_predicates(
    dml: &DmlEvent,
    store: &RuleStore,
    evaluator: Option<&dyn TransformEvaluator>,
) -> Result<Vec<String>, ConvertError> {
    let mut preds = Vec::new();
    for colval in dml.before.iter().filter(|c| c.is_pk) {
        preds.push(format!(
            "{} = {}",
            colval.name,
            sql_value(dml, colval, store, evaluator)?
        ));
    }
    Ok(preds)
}

fn sql_value(
    dml: &DmlEvent,
    colval: &common::types::ColumnValue,
    store: &RuleStore,
    evaluator: Option<&dyn TransformEvaluator>,
) -> Result<String, ConvertError> {
    Ok(
        process_value(colval, true, &dml.remote_object_id, store, evaluator)?
            .unwrap_or_else(|| "null".to_string()),
    )
}

fn build_tuples(
    dml: &DmlEvent,
    columns: &[common::types::ColumnValue],
    store: &RuleStore,
    evaluator: Option<&dyn TransformEvaluator>,
) -> Result<Vec<TupleValue>, ConvertError> {
    let mut out = Vec::with_capacity(columns.len());
    for colval in columns {
        let value = process_value(colval, false, &dml.remote_object_id, store, evaluator)?;
        out.push(TupleValue {
            value,
            type_oid: colval.type_oid,
            position: colval.position,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD as B64;
    use base64::Engine;
    use common::types::{ColumnValue, ConnectorKind, DbzType, TimeRep, TypeCategory};

    fn col(
        name: &str,
        value: Option<&str>,
        category: TypeCategory,
        type_name: &str,
        position: i32,
        is_pk: bool,
    ) -> ColumnValue {
        ColumnValue {
            name: name.into(),
            remote_name: name.into(),
            value: value.map(str::to_string),
            type_oid: 0,
            category,
            type_name: type_name.into(),
            typmod: -1,
            wire_type: DbzType::Int32,
            time_rep: TimeRep::Undef,
            scale: 0,
            is_pk,
            position,
        }
    }

    fn dml(op: Op, before: Vec<ColumnValue>, after: Vec<ColumnValue>) -> DmlEvent {
        DmlEvent {
            op,
            remote_object_id: "shop.orders".into(),
            mapped_object_id: "shop.orders".into(),
            schema: "shop".into(),
            table: "orders".into(),
            table_oid: 16385,
            natts: 3,
            before,
            after,
            src_ts_ms: 0,
            ts_ms: 0,
        }
    }

    #[test]
    fn insert_with_numeric_and_date() {
        // mirrors a mysql snapshot insert: integer id, epoch-days date,
        // base64 decimal with scale 2
        let store = RuleStore::new(ConnectorKind::Mysql);
        let mut order_date = col(
            "order_date",
            Some(&B64.encode([0x4A, 0x38])),
            TypeCategory::DateTime,
            "date",
            2,
            false,
        );
        order_date.wire_type = DbzType::Bytes;
        order_date.time_rep = TimeRep::Date;
        let mut total = col(
            "total",
            Some(&B64.encode([0x01, 0xE2, 0x40])),
            TypeCategory::Numeric,
            "numeric(10,2)",
            3,
            false,
        );
        total.wire_type = DbzType::Bytes;
        total.scale = 2;

        let event = dml(
            Op::Create,
            vec![],
            vec![
                col(
                    "order_id",
                    Some("10001"),
                    TypeCategory::Numeric,
                    "integer",
                    1,
                    true,
                ),
                order_date,
                total,
            ],
        );
        let pg = convert_dml(&event, DmlMode::TextSql, &store, None).unwrap();
        let PgDmlBody::Sql(sql) = pg.body else {
            panic!("expected sql body");
        };
        assert_eq!(
            sql,
            "INSERT INTO shop.orders (order_id, order_date, total) \
             VALUES (10001, '2022-01-08', 1234.56);"
        );
    }

    #[test]
    fn update_keeps_pk_predicate() {
        let store = RuleStore::new(ConnectorKind::SqlServer);
        let before = vec![
            col("id", Some("7"), TypeCategory::Numeric, "integer", 1, true),
            col("name", Some("old"), TypeCategory::String, "text", 2, false),
        ];
        let mut after = vec![
            col("id", Some("7"), TypeCategory::Numeric, "integer", 1, true),
            col("name", Some("new"), TypeCategory::String, "text", 2, false),
        ];
        after[1].wire_type = DbzType::String;
        let mut event = dml(Op::Update, before, after);
        event.mapped_object_id = "dbo.t".into();
        let pg = convert_dml(&event, DmlMode::TextSql, &store, None).unwrap();
        let PgDmlBody::Sql(sql) = pg.body else {
            panic!("expected sql body");
        };
        assert_eq!(sql, "UPDATE dbo.t SET id = 7, name = 'new' WHERE id = 7;");
    }

    #[test]
    fn update_without_pk_fails_in_text_mode() {
        let store = RuleStore::new(ConnectorKind::Mysql);
        let before = vec![col(
            "name",
            Some("old"),
            TypeCategory::String,
            "text",
            1,
            false,
        )];
        let after = vec![col(
            "name",
            Some("new"),
            TypeCategory::String,
            "text",
            1,
            false,
        )];
        let event = dml(Op::Update, before, after);
        let err = convert_dml(&event, DmlMode::TextSql, &store, None).unwrap_err();
        assert!(matches!(err, ConvertError::NoPrimaryKey("UPDATE", _)));
    }

    #[test]
    fn delete_without_pk_fails_in_text_mode() {
        let store = RuleStore::new(ConnectorKind::Mysql);
        let before = vec![col(
            "name",
            Some("x"),
            TypeCategory::String,
            "text",
            1,
            false,
        )];
        let event = dml(Op::Delete, before, vec![]);
        let err = convert_dml(&event, DmlMode::TextSql, &store, None).unwrap_err();
        assert!(matches!(err, ConvertError::NoPrimaryKey("DELETE", _)));
    }

    #[test]
    fn tuple_mode_preserves_nulls_and_positions() {
        let store = RuleStore::new(ConnectorKind::Mysql);
        let event = dml(
            Op::Create,
            vec![],
            vec![
                col("id", Some("1"), TypeCategory::Numeric, "integer", 1, true),
                col("note", None, TypeCategory::String, "text", 2, false),
            ],
        );
        let pg = convert_dml(&event, DmlMode::Tuple, &store, None).unwrap();
        let PgDmlBody::Tuples { before, after } = pg.body else {
            panic!("expected tuples");
        };
        assert!(before.is_empty());
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].value.as_deref(), Some("1"));
        assert_eq!(after[0].position, 1);
        assert_eq!(after[1].value, None);
        assert_eq!(after[1].position, 2);
    }

    #[test]
    fn tuple_mode_update_without_pk_is_allowed() {
        let store = RuleStore::new(ConnectorKind::Mysql);
        let before = vec![col(
            "name",
            Some("old"),
            TypeCategory::String,
            "text",
            1,
            false,
        )];
        let after = vec![col(
            "name",
            Some("new"),
            TypeCategory::String,
            "text",
            1,
            false,
        )];
        let event = dml(Op::Update, before, after);
        assert!(convert_dml(&event, DmlMode::Tuple, &store, None).is_ok());
    }
}
