//! Canned change-event payloads shared by integration tests.

use serde_json::json;

/// Debezium envelope for a row insert carrying an int id, an epoch-days
/// date and a base64 decimal with scale 2.
pub fn dbz_insert_orders(order_id: i64, date_b64: &str, total_b64: &str) -> String {
    json!({
        "schema": {
            "fields": [
                {"field": "before", "fields": [
                    {"field": "order_id", "type": "int32"},
                    {"field": "order_date", "type": "bytes",
                     "name": "io.debezium.time.Date"},
                    {"field": "total", "type": "bytes",
                     "parameters": {"scale": "2"}}
                ]},
                {"field": "after", "fields": []}
            ]
        },
        "payload": {
            "source": {"connector": "mysql", "db": "shop", "table": "orders",
                       "snapshot": "false", "ts_ms": 1_700_000_000_000u64},
            "op": "c",
            "ts_ms": 1_700_000_000_500u64,
            "after": {"order_id": order_id, "order_date": date_b64, "total": total_b64}
        }
    })
    .to_string()
}

/// Debezium envelope for an update on `dbo.t` keyed by `id`.
pub fn dbz_update_dbo_t(id: i64, old_name: &str, new_name: &str) -> String {
    json!({
        "schema": {
            "fields": [
                {"field": "before", "fields": [
                    {"field": "id", "type": "int32"},
                    {"field": "name", "type": "string"}
                ]},
                {"field": "after", "fields": []}
            ]
        },
        "payload": {
            "source": {"connector": "sqlserver", "db": "db", "schema": "dbo",
                       "table": "t", "snapshot": "false",
                       "ts_ms": 1_700_000_000_000u64},
            "op": "u",
            "ts_ms": 1_700_000_000_500u64,
            "before": {"id": id, "name": old_name},
            "after": {"id": id, "name": new_name}
        }
    })
    .to_string()
}

/// Debezium CREATE TABLE event for `shop.orders`.
pub fn dbz_create_orders() -> String {
    json!({
        "payload": {
            "source": {"connector": "mysql", "db": "shop", "table": "orders",
                       "snapshot": "true", "ts_ms": 1_700_000_000_000u64},
            "ts_ms": 1_700_000_000_500u64,
            "tableChanges": [{
                "id": "\"shop\".\"orders\"",
                "type": "CREATE",
                "table": {
                    "primaryKeyColumnNames": ["order_id"],
                    "columns": [
                        {"name": "order_id", "typeName": "INT", "length": null,
                         "optional": false, "position": 1,
                         "autoIncremented": false, "scale": null},
                        {"name": "order_date", "typeName": "DATE", "length": null,
                         "optional": true, "position": 2,
                         "autoIncremented": false, "scale": null},
                        {"name": "total", "typeName": "DECIMAL", "length": 10,
                         "optional": true, "position": 3,
                         "autoIncremented": false, "scale": 2}
                    ]
                }
            }]
        }
    })
    .to_string()
}

/// OpenLogReplicator DDL payload.
pub fn olr_ddl(scn: u64, c_scn: u64, owner: &str, table: &str, sql: &str) -> String {
    json!({
        "scn": scn, "c_scn": c_scn, "tm": 1_700_000_000_000_000_000u64,
        "db": "ORCLCDB",
        "payload": [{
            "op": "ddl",
            "schema": {"owner": owner, "table": table},
            "sql": sql
        }]
    })
    .to_string()
}

/// OpenLogReplicator transaction boundary.
pub fn olr_boundary(op: &str, scn: u64, c_scn: u64) -> String {
    json!({
        "scn": scn, "c_scn": c_scn, "tm": 1_700_000_000_000_000_000u64,
        "db": "ORCLCDB",
        "payload": [{"op": op}]
    })
    .to_string()
}

/// OpenLogReplicator row insert into `HR.EMP`.
pub fn olr_insert_emp(scn: u64, c_scn: u64, id: i64, name: &str) -> String {
    json!({
        "scn": scn, "c_scn": c_scn, "db": "ORCLCDB",
        "payload": [{
            "op": "c",
            "schema": {
                "owner": "HR", "table": "EMP",
                "columns": [
                    {"name": "ID", "type": "number", "scale": 0},
                    {"name": "NAME", "type": "varchar2"}
                ]
            },
            "after": {"ID": id, "NAME": name}
        }]
    })
    .to_string()
}
