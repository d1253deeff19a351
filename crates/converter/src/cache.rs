use std::collections::HashMap;

use common::types::{DbzType, TimeRep};
use destination::{DestinationSession, TableDef};

use crate::error::ConvertError;

/// Where a column sits inside the change event's schema block, plus the
/// wire metadata found there.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPosEntry {
    pub pos: i32,
    pub wire_type: DbzType,
    pub time_rep: TimeRep,
    pub scale: i32,
}

/// Cached per-table state: the copied tuple descriptor and the
/// remote-name → wire-metadata map built from the first event seen for
/// the table.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub table: TableDef,
    /// remote column name (lowercased) → schema-block metadata
    pub jsonpos: HashMap<String, JsonPosEntry>,
}

/// Lazy per-connector cache of destination table descriptors. Entries are
/// valid only between DDL events affecting their table; the converter
/// evicts on CREATE/ALTER/DROP.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: HashMap<(String, String), CacheEntry>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, schema: &str, table: &str) -> Option<&CacheEntry> {
        self.entries.get(&(schema.to_string(), table.to_string()))
    }

    /// Fetch the cached entry, populating it from the destination catalog
    /// on a miss. `jsonpos` is the schema-block position map parsed out of
    /// the triggering event; it is only consumed when the entry is
    /// populated.
    pub async fn get_or_load(
        &mut self,
        session: &mut dyn DestinationSession,
        schema: &str,
        table: &str,
        jsonpos: HashMap<String, JsonPosEntry>,
    ) -> Result<&CacheEntry, ConvertError> {
        let key = (schema.to_string(), table.to_string());
        if !self.entries.contains_key(&key) {
            let def = session.lookup_table(schema, table).await?;
            self.entries.insert(
                key.clone(),
                CacheEntry {
                    table: def,
                    jsonpos,
                },
            );
        }
        Ok(self.entries.get(&key).expect("just inserted"))
    }

    /// Drop the entry for one table, typically on CREATE/ALTER/DROP.
    pub fn evict(&mut self, schema: &str, table: &str) {
        self.entries
            .remove(&(schema.to_string(), table.to_string()));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::TypeCategory;
    use destination::{AttrDef, MemorySession};

    fn attrs() -> Vec<AttrDef> {
        vec![AttrDef {
            name: "id".into(),
            type_oid: 23,
            position: 1,
            typmod: -1,
            is_pk: true,
            category: TypeCategory::Numeric,
            type_name: "integer".into(),
            is_dropped: false,
        }]
    }

    #[tokio::test]
    async fn populate_then_evict() {
        let session = MemorySession::new();
        session.define_table("shop", "orders", attrs());
        let mut s = session.clone();

        let mut cache = SchemaCache::new();
        let entry = cache
            .get_or_load(&mut s, "shop", "orders", HashMap::new())
            .await
            .unwrap();
        assert_eq!(entry.table.attrs.len(), 1);
        assert_eq!(cache.len(), 1);

        cache.evict("shop", "orders");
        assert!(cache.get("shop", "orders").is_none());
    }

    #[tokio::test]
    async fn miss_on_unknown_table_is_table_not_found() {
        let session = MemorySession::new();
        session.define_table("shop", "orders", attrs());
        let mut s = session.clone();

        let mut cache = SchemaCache::new();
        let err = cache
            .get_or_load(&mut s, "shop", "missing", HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::TableNotFound(_)));
    }
}
