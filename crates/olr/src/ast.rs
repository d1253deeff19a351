use crate::error::OlrError;

/// Column definition as produced by the Oracle DDL parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OraColumnDef {
    pub name: String,
    pub type_name: String,
    pub length: i32,
    pub scale: i32,
    pub not_null: bool,
    pub primary_key: bool,
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OraAlterCmd {
    AddColumn(OraColumnDef),
    DropColumn(String),
    ModifyColumn(OraColumnDef),
    AddPrimaryKey {
        constraint: Option<String>,
        columns: Vec<String>,
    },
    DropConstraint(String),
}

/// Parsed statement shapes the bridge consumes. Only the table lifecycle
/// subset is modelled.
#[derive(Debug, Clone, PartialEq)]
pub enum OraStatement {
    CreateTable {
        schema: Option<String>,
        table: String,
        columns: Vec<OraColumnDef>,
        primary_key: Vec<String>,
    },
    AlterTable {
        schema: Option<String>,
        table: String,
        cmds: Vec<OraAlterCmd>,
    },
    DropTable {
        schema: Option<String>,
        table: String,
    },
}

/// The Oracle SQL parser is an injected capability: production wires in a
/// real parser, tests substitute canned statements.
pub trait OracleDdlParser: Send + Sync {
    fn parse(&self, sql: &str) -> Result<Vec<OraStatement>, OlrError>;
}
