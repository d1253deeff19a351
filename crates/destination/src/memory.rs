use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::model::{AttrDef, TableDef, TupleValue};
use crate::{DestinationError, DestinationSession};

type Row = HashMap<i32, Option<String>>;

#[derive(Default)]
struct State {
    schemas: HashSet<String>,
    tables: HashMap<(String, String), TableDef>,
    rows: HashMap<u32, Vec<Row>>,
    executed: Vec<String>,
    in_tx: bool,
    next_oid: u32,
}

/// In-memory destination used by tests: it records every statement it is
/// handed and applies tuple operations against a simple row store.
#[derive(Clone, Default)]
pub struct MemorySession {
    inner: Arc<RwLock<State>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table with the given attributes and return its oid.
    pub fn define_table(&self, schema: &str, table: &str, attrs: Vec<AttrDef>) -> u32 {
        let mut g = self.inner.write();
        g.next_oid += 1;
        let oid = 16384 + g.next_oid;
        g.schemas.insert(schema.to_string());
        g.tables.insert(
            (schema.to_string(), table.to_string()),
            TableDef {
                oid,
                schema: schema.to_string(),
                name: table.to_string(),
                attrs,
            },
        );
        g.rows.insert(oid, Vec::new());
        oid
    }

    pub fn drop_table(&self, schema: &str, table: &str) {
        let mut g = self.inner.write();
        if let Some(def) = g.tables.remove(&(schema.to_string(), table.to_string())) {
            g.rows.remove(&def.oid);
        }
    }

    /// Every statement executed through the session, in order.
    pub fn executed(&self) -> Vec<String> {
        self.inner.read().executed.clone()
    }

    pub fn row_count(&self, oid: u32) -> usize {
        self.inner.read().rows.get(&oid).map_or(0, Vec::len)
    }

    pub fn rows(&self, oid: u32) -> Vec<HashMap<i32, Option<String>>> {
        self.inner.read().rows.get(&oid).cloned().unwrap_or_default()
    }
}

fn matches(row: &Row, key: &[TupleValue]) -> bool {
    key.iter()
        .all(|k| row.get(&k.position).map(|v| v == &k.value).unwrap_or(false))
}

#[async_trait]
impl DestinationSession for MemorySession {
    async fn exec_utility(&mut self, sql: &str) -> Result<(), DestinationError> {
        self.inner.write().executed.push(sql.to_string());
        Ok(())
    }

    async fn exec_dml(&mut self, sql: &str) -> Result<u64, DestinationError> {
        self.inner.write().executed.push(sql.to_string());
        Ok(1)
    }

    async fn lookup_table(
        &mut self,
        schema: &str,
        table: &str,
    ) -> Result<TableDef, DestinationError> {
        let g = self.inner.read();
        if !g.schemas.contains(schema) {
            return Err(DestinationError::SchemaNotFound(schema.to_string()));
        }
        g.tables
            .get(&(schema.to_string(), table.to_string()))
            .cloned()
            .ok_or_else(|| DestinationError::TableNotFound(format!("{schema}.{table}")))
    }

    async fn tuple_insert(
        &mut self,
        table: &TableDef,
        row: &[TupleValue],
    ) -> Result<u64, DestinationError> {
        let mut g = self.inner.write();
        let rows = g
            .rows
            .get_mut(&table.oid)
            .ok_or_else(|| DestinationError::TableNotFound(table.qualified_name()))?;
        rows.push(row.iter().map(|v| (v.position, v.value.clone())).collect());
        Ok(1)
    }

    async fn tuple_update(
        &mut self,
        table: &TableDef,
        old: &[TupleValue],
        new: &[TupleValue],
    ) -> Result<u64, DestinationError> {
        let mut g = self.inner.write();
        let rows = g
            .rows
            .get_mut(&table.oid)
            .ok_or_else(|| DestinationError::TableNotFound(table.qualified_name()))?;
        let mut updated = 0;
        for row in rows.iter_mut().filter(|r| matches(r, old)) {
            for v in new {
                row.insert(v.position, v.value.clone());
            }
            updated += 1;
        }
        Ok(updated)
    }

    async fn tuple_delete(
        &mut self,
        table: &TableDef,
        old: &[TupleValue],
    ) -> Result<u64, DestinationError> {
        let mut g = self.inner.write();
        let rows = g
            .rows
            .get_mut(&table.oid)
            .ok_or_else(|| DestinationError::TableNotFound(table.qualified_name()))?;
        let before = rows.len();
        rows.retain(|r| !matches(r, old));
        Ok((before - rows.len()) as u64)
    }

    async fn begin(&mut self) -> Result<(), DestinationError> {
        self.inner.write().in_tx = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DestinationError> {
        self.inner.write().in_tx = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DestinationError> {
        self.inner.write().in_tx = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::TypeCategory;

    fn int_attr(name: &str, pos: i32, pk: bool) -> AttrDef {
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

    fn val(pos: i32, v: &str) -> TupleValue {
        TupleValue {
            value: Some(v.into()),
            type_oid: 23,
            position: pos,
        }
    }

    #[tokio::test]
    async fn tuple_ops_round_trip() {
        let session = MemorySession::new();
        let oid = session.define_table(
            "shop",
            "orders",
            vec![int_attr("id", 1, true), int_attr("qty", 2, false)],
        );
        let mut s = session.clone();
        let table = s.lookup_table("shop", "orders").await.unwrap();

        s.tuple_insert(&table, &[val(1, "7"), val(2, "3")])
            .await
            .unwrap();
        assert_eq!(session.row_count(oid), 1);

        let n = s
            .tuple_update(&table, &[val(1, "7")], &[val(2, "5")])
            .await
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(session.rows(oid)[0][&2], Some("5".into()));

        let n = s.tuple_delete(&table, &[val(1, "7")]).await.unwrap();
        assert_eq!(n, 1);
        assert_eq!(session.row_count(oid), 0);
    }

    #[tokio::test]
    async fn missing_schema_vs_missing_table() {
        let session = MemorySession::new();
        session.define_table("shop", "orders", vec![int_attr("id", 1, true)]);
        let mut s = session.clone();
        assert!(matches!(
            s.lookup_table("nowhere", "orders").await,
            Err(DestinationError::SchemaNotFound(_))
        ));
        assert!(matches!(
            s.lookup_table("shop", "missing").await,
            Err(DestinationError::TableNotFound(_))
        ));
    }
}
