use serde::{Deserialize, Serialize};

use super::wire::{DbzType, TimeRep, TypeCategory};

/// Source system behind a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectorKind {
    Mysql,
    SqlServer,
    /// Oracle through the Debezium runner
    Oracle,
    /// Oracle through OpenLogReplicator
    Olr,
}

impl ConnectorKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Some(ConnectorKind::Mysql),
            "sqlserver" => Some(ConnectorKind::SqlServer),
            "oracle" | "oracle-debezium" => Some(ConnectorKind::Oracle),
            "olr" | "oracle-olr" => Some(ConnectorKind::Olr),
            _ => None,
        }
    }

    /// Stable name used in file names and catalog rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorKind::Mysql => "mysql",
            ConnectorKind::SqlServer => "sqlserver",
            ConnectorKind::Oracle => "oracle",
            ConnectorKind::Olr => "olr",
        }
    }
}

/// Row-level operation carried by a DML event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// snapshot read
    Read,
    /// insert
    Create,
    Update,
    Delete,
}

impl Op {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'r' => Some(Op::Read),
            'c' => Some(Op::Create),
            'u' => Some(Op::Update),
            'd' => Some(Op::Delete),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Op::Read => 'r',
            Op::Create => 'c',
            Op::Update => 'u',
            Op::Delete => 'd',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DdlKind {
    Create,
    Alter,
    Drop,
}

/// ALTER sub-operation, only known up front on the OLR path where the
/// statement itself is parsed. On the Debezium path the converter derives
/// it by diffing against the live destination schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlterSubkind {
    AddColumn,
    DropColumn,
    AlterColumn,
    AddConstraint,
    DropConstraint,
}

/// One column of a neutral DDL record. All identifiers are stored
/// lowercase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DdlColumn {
    pub name: String,
    pub type_name: String,
    pub length: i32,
    pub scale: i32,
    pub optional: bool,
    pub auto_incremented: bool,
    pub position: i32,
    /// Opaque default-value expression from the source. Never trusted to
    /// parse on the destination; its presence downgrades to DEFAULT NULL.
    pub default_value_expression: Option<String>,
    pub enum_values: Option<String>,
    pub charset_name: Option<String>,
}

/// Neutral DDL record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdlEvent {
    /// `database[.schema].table`, lowercased
    pub id: String,
    pub kind: DdlKind,
    pub subkind: Option<AlterSubkind>,
    /// primary-key column names kept verbatim as the encoded JSON array
    /// literal, e.g. `["col1","col2"]`
    pub primary_key_column_names: Option<String>,
    pub columns: Vec<DdlColumn>,
    pub constraint_name: Option<String>,
    /// event generation time at the source, ms
    pub src_ts_ms: u64,
    /// time the runner emitted the event, ms
    pub ts_ms: u64,
}

/// One column value inside a neutral DML record, annotated with everything
/// the codec needs: destination metadata from the schema cache and wire
/// metadata from the event's schema section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnValue {
    /// mapped (destination) column name, lowercased
    pub name: String,
    /// original remote column name, kept for transform-rule lookup
    pub remote_name: String,
    /// value as taken from the event; `None` is SQL NULL
    pub value: Option<String>,
    /// destination type oid
    pub type_oid: u32,
    pub category: TypeCategory,
    /// destination type name as reported by the catalog
    pub type_name: String,
    pub typmod: i32,
    pub wire_type: DbzType,
    pub time_rep: TimeRep,
    pub scale: i32,
    pub is_pk: bool,
    /// 1-based ordinal aligned with the destination attribute number
    pub position: i32,
}

/// Neutral DML record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DmlEvent {
    pub op: Op,
    /// `database[.schema].table` on the remote side, lowercased
    pub remote_object_id: String,
    /// `schema.table` on the destination side
    pub mapped_object_id: String,
    pub schema: String,
    pub table: String,
    pub table_oid: u32,
    pub natts: i32,
    /// sorted by destination ordinal position
    pub before: Vec<ColumnValue>,
    /// sorted by destination ordinal position
    pub after: Vec<ColumnValue>,
    pub src_ts_ms: u64,
    pub ts_ms: u64,
}

impl DmlEvent {
    /// Restore the positional ordering invariant after parsing.
    pub fn sort_columns(&mut self) {
        self.before.sort_by_key(|c| c.position);
        self.after.sort_by_key(|c| c.position);
    }
}

/// Connector stage as observed from the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectorStage {
    #[default]
    Undef,
    InitialSnapshot,
    Cdc,
    SchemaSync,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_round_trip() {
        for c in ['r', 'c', 'u', 'd'] {
            assert_eq!(Op::from_char(c).unwrap().as_char(), c);
        }
        assert!(Op::from_char('x').is_none());
    }

    #[test]
    fn sort_restores_positional_order() {
        let mut dml = DmlEvent {
            op: Op::Create,
            remote_object_id: "db.t".into(),
            mapped_object_id: "db.t".into(),
            schema: "db".into(),
            table: "t".into(),
            table_oid: 1,
            natts: 2,
            before: vec![],
            after: vec![
                ColumnValue {
                    name: "b".into(),
                    position: 2,
                    ..Default::default()
                },
                ColumnValue {
                    name: "a".into(),
                    position: 1,
                    ..Default::default()
                },
            ],
            src_ts_ms: 0,
            ts_ms: 0,
        };
        dml.sort_columns();
        assert_eq!(dml.after[0].name, "a");
        assert_eq!(dml.after[1].name, "b");
    }
}
