use async_trait::async_trait;
use std::io::ErrorKind;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Error, NoTls};
use tracing::debug;

use common::types::TypeCategory;

use crate::model::{AttrDef, TableDef, TupleValue};
use crate::{DestinationError, DestinationSession};

impl From<Error> for DestinationError {
    fn from(err: Error) -> Self {
        if let Some(e) = err.as_db_error() {
            let code = e.code();
            if code == &SqlState::CONNECTION_DOES_NOT_EXIST {
                DestinationError::InvalidConnection(e.to_string())
            } else if code == &SqlState::SYNTAX_ERROR {
                DestinationError::SyntaxError(e.to_string())
            } else if code == &SqlState::UNDEFINED_TABLE {
                DestinationError::TableNotFound(e.to_string())
            } else if code == &SqlState::INVALID_SCHEMA_NAME {
                DestinationError::SchemaNotFound(e.to_string())
            } else if code == &SqlState::IO_ERROR {
                DestinationError::IoError(std::io::Error::new(ErrorKind::Other, e.to_string()))
            } else {
                DestinationError::ExecError(e.to_string())
            }
        } else {
            DestinationError::ExecError(err.to_string())
        }
    }
}

/// Destination session over a live PostgreSQL connection. The connection
/// driver runs in a background task for the lifetime of the session.
pub struct PostgresSession {
    client: Client,
    _driver: tokio::task::JoinHandle<()>,
}

impl PostgresSession {
    /// Connect and spawn the connection driver.
    pub async fn connect(
        host: &str,
        port: u16,
        db: &str,
        user: &str,
        password: &str,
    ) -> Result<Self, DestinationError> {
        let conn_str = format!(
            "host={} port={} user={} password={} dbname={}",
            host, port, user, password, db
        );
        let (client, connection) = tokio_postgres::connect(&conn_str, NoTls).await?;
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("postgres driver task exited: {e}");
            }
        });

        Ok(Self {
            client,
            _driver: driver,
        })
    }

    async fn primary_key_attnums(&self, table_oid: u32) -> Result<Vec<i32>, DestinationError> {
        let rows = self
            .client
            .query(
                "SELECT unnest(indkey)::int4 FROM pg_catalog.pg_index \
                 WHERE indrelid = $1 AND indisprimary",
                &[&table_oid],
            )
            .await?;
        Ok(rows.iter().map(|r| r.get::<_, i32>(0)).collect())
    }
}

#[async_trait]
impl DestinationSession for PostgresSession {
    async fn exec_utility(&mut self, sql: &str) -> Result<(), DestinationError> {
        debug!("utility: {sql}");
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    async fn exec_dml(&mut self, sql: &str) -> Result<u64, DestinationError> {
        debug!("dml: {sql}");
        Ok(self.client.execute(sql, &[]).await?)
    }

    async fn lookup_table(
        &mut self,
        schema: &str,
        table: &str,
    ) -> Result<TableDef, DestinationError> {
        let ns = self
            .client
            .query_opt(
                "SELECT oid FROM pg_catalog.pg_namespace WHERE nspname = $1",
                &[&schema],
            )
            .await?;
        let Some(ns) = ns else {
            return Err(DestinationError::SchemaNotFound(schema.to_string()));
        };
        let ns_oid: u32 = ns.get(0);

        let rel = self
            .client
            .query_opt(
                "SELECT oid FROM pg_catalog.pg_class \
                 WHERE relname = $1 AND relnamespace = $2",
                &[&table, &ns_oid],
            )
            .await?;
        let Some(rel) = rel else {
            return Err(DestinationError::TableNotFound(format!("{schema}.{table}")));
        };
        let table_oid: u32 = rel.get(0);

        let pk_attnums = self.primary_key_attnums(table_oid).await?;

        let rows = self
            .client
            .query(
                "SELECT a.attname::text, a.atttypid, a.attnum::int4, a.atttypmod, \
                        a.attisdropped, t.typcategory::text, \
                        format_type(a.atttypid, a.atttypmod)::text \
                 FROM pg_catalog.pg_attribute a \
                 JOIN pg_catalog.pg_type t ON t.oid = a.atttypid \
                 WHERE a.attrelid = $1 AND a.attnum > 0 \
                 ORDER BY a.attnum",
                &[&table_oid],
            )
            .await?;

        let attrs = rows
            .iter()
            .map(|r| {
                let position: i32 = r.get(2);
                let category: String = r.get(5);
                AttrDef {
                    name: r.get(0),
                    type_oid: r.get(1),
                    position,
                    typmod: r.get(3),
                    is_pk: pk_attnums.contains(&position),
                    category: TypeCategory::from_code(category.chars().next().unwrap_or('X')),
                    type_name: r.get(6),
                    is_dropped: r.get(4),
                }
            })
            .collect();

        Ok(TableDef {
            oid: table_oid,
            schema: schema.to_string(),
            name: table.to_string(),
            attrs,
        })
    }

    async fn tuple_insert(
        &mut self,
        table: &TableDef,
        row: &[TupleValue],
    ) -> Result<u64, DestinationError> {
        let mut cols = Vec::with_capacity(row.len());
        let mut placeholders = Vec::with_capacity(row.len());
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(row.len());
        for (i, v) in row.iter().enumerate() {
            let attr = attr_at(table, v.position)?;
            cols.push(attr.name.clone());
            placeholders.push(format!("(${}::text)::{}", i + 1, attr.type_name));
            params.push(&v.value);
        }
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.qualified_name(),
            cols.join(","),
            placeholders.join(",")
        );
        Ok(self.client.execute(&sql, &params).await?)
    }

    async fn tuple_update(
        &mut self,
        table: &TableDef,
        old: &[TupleValue],
        new: &[TupleValue],
    ) -> Result<u64, DestinationError> {
        let mut sets = Vec::with_capacity(new.len());
        let mut preds = Vec::with_capacity(old.len());
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(old.len() + new.len());
        let mut n = 0usize;
        for v in new {
            let attr = attr_at(table, v.position)?;
            n += 1;
            sets.push(format!("{} = (${}::text)::{}", attr.name, n, attr.type_name));
            params.push(&v.value);
        }
        for v in old {
            let attr = attr_at(table, v.position)?;
            n += 1;
            preds.push(format!(
                "{} IS NOT DISTINCT FROM (${}::text)::{}",
                attr.name, n, attr.type_name
            ));
            params.push(&v.value);
        }
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            table.qualified_name(),
            sets.join(", "),
            preds.join(" AND ")
        );
        Ok(self.client.execute(&sql, &params).await?)
    }

    async fn tuple_delete(
        &mut self,
        table: &TableDef,
        old: &[TupleValue],
    ) -> Result<u64, DestinationError> {
        let mut preds = Vec::with_capacity(old.len());
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(old.len());
        for (i, v) in old.iter().enumerate() {
            let attr = attr_at(table, v.position)?;
            preds.push(format!(
                "{} IS NOT DISTINCT FROM (${}::text)::{}",
                attr.name,
                i + 1,
                attr.type_name
            ));
            params.push(&v.value);
        }
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            table.qualified_name(),
            preds.join(" AND ")
        );
        Ok(self.client.execute(&sql, &params).await?)
    }

    async fn begin(&mut self) -> Result<(), DestinationError> {
        self.client.batch_execute("BEGIN").await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DestinationError> {
        self.client.batch_execute("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DestinationError> {
        self.client.batch_execute("ROLLBACK").await?;
        Ok(())
    }
}

fn attr_at(table: &TableDef, position: i32) -> Result<&AttrDef, DestinationError> {
    table
        .attrs
        .iter()
        .find(|a| a.position == position && !a.is_dropped)
        .ok_or_else(|| {
            DestinationError::ExecError(format!(
                "no attribute at position {position} in {}",
                table.qualified_name()
            ))
        })
}
