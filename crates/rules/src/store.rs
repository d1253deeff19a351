use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use common::types::ConnectorKind;
use common::utils::fold_ident;

use crate::defaults;
use crate::error::RuleError;

/// Object classes that can be renamed through the object map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Table,
    Column,
}

impl ObjectType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Some(ObjectType::Table),
            "column" => Some(ObjectType::Column),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TypeRuleKey {
    token: String,
    auto_incremented: bool,
}

/// Destination side of a type rule. `length_override` follows the
/// convention of the built-in tables: `-1` keeps the declared length, any
/// other value replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRule {
    pub dest_type: String,
    pub length_override: i32,
}

/// Per-connector rule tables: type rules (seeded from the built-in
/// defaults), object-name rules and transform-expression rules. Lookups
/// are insensitive to identifier case; every key is folded to lowercase
/// on the way in and out.
#[derive(Debug)]
pub struct RuleStore {
    kind: ConnectorKind,
    type_rules: HashMap<TypeRuleKey, TypeRule>,
    name_rules: HashMap<(String, ObjectType), String>,
    transform_rules: HashMap<String, String>,
}

impl RuleStore {
    /// Create a store for one connector, seeded with the defaults for its
    /// source kind.
    pub fn new(kind: ConnectorKind) -> Self {
        let table = match kind {
            ConnectorKind::Mysql => defaults::MYSQL,
            ConnectorKind::SqlServer => defaults::SQLSERVER,
            ConnectorKind::Oracle | ConnectorKind::Olr => defaults::ORACLE,
        };
        let mut type_rules = HashMap::with_capacity(table.len());
        for (token, auto, dest, len) in table {
            // first entry wins, as in the seeded tables
            type_rules
                .entry(TypeRuleKey {
                    token: (*token).to_string(),
                    auto_incremented: *auto,
                })
                .or_insert_with(|| TypeRule {
                    dest_type: (*dest).to_string(),
                    length_override: *len,
                });
        }
        Self {
            kind,
            type_rules,
            name_rules: HashMap::new(),
            transform_rules: HashMap::new(),
        }
    }

    pub fn kind(&self) -> ConnectorKind {
        self.kind
    }

    /// Resolve the destination type for one source column.
    ///
    /// Lookup order: a per-column rule keyed by the fully-qualified column
    /// id, then a rule on the normalised type token. Normalisation gives
    /// `bit` of length 1 the key `bit(1)` (mysql/sqlserver) and an
    /// integer-scaled `number` the key `number(length,0)` (oracle), so the
    /// integer widths can map to distinct destination int types. `None`
    /// means "pass the source type through unchanged".
    pub fn resolve_type(
        &self,
        column_id: &str,
        type_name: &str,
        length: i32,
        scale: i32,
        auto_incremented: bool,
    ) -> Option<&TypeRule> {
        let percol = TypeRuleKey {
            token: fold_ident(column_id),
            auto_incremented,
        };
        if let Some(rule) = self.type_rules.get(&percol) {
            return Some(rule);
        }

        let token = match self.kind {
            ConnectorKind::Mysql | ConnectorKind::SqlServer
                if type_name.eq_ignore_ascii_case("bit") && length == 1 =>
            {
                format!("{}({})", fold_ident(type_name), length)
            }
            ConnectorKind::Oracle | ConnectorKind::Olr
                if type_name.eq_ignore_ascii_case("number") && scale == 0 =>
            {
                format!("{}({},{})", fold_ident(type_name), length, scale)
            }
            _ => fold_ident(type_name),
        };
        self.type_rules.get(&TypeRuleKey {
            token,
            auto_incremented,
        })
    }

    /// Insert or replace a type rule. User rules override the defaults.
    pub fn insert_type_rule(
        &mut self,
        token: &str,
        auto_incremented: bool,
        dest_type: &str,
        length_override: i32,
    ) {
        self.type_rules.insert(
            TypeRuleKey {
                token: fold_ident(token),
                auto_incremented,
            },
            TypeRule {
                dest_type: dest_type.to_string(),
                length_override,
            },
        );
    }

    /// Straight map lookup keyed by `(id, object type)`. `None` signals
    /// "no rename".
    pub fn resolve_name(&self, id: &str, objtype: ObjectType) -> Option<&str> {
        self.name_rules
            .get(&(fold_ident(id), objtype))
            .map(String::as_str)
    }

    pub fn insert_name_rule(&mut self, id: &str, objtype: ObjectType, dest: &str) {
        self.name_rules
            .insert((fold_ident(id), objtype), dest.to_string());
    }

    pub fn remove_name_rule(&mut self, id: &str, objtype: ObjectType) -> Option<String> {
        self.name_rules.remove(&(fold_ident(id), objtype))
    }

    /// Expression attached to `remote_object_id.column`, if any.
    pub fn transform_expression(&self, remote_object_id: &str, column: &str) -> Option<&str> {
        let key = fold_ident(&format!("{remote_object_id}.{column}"));
        self.transform_rules.get(&key).map(String::as_str)
    }

    pub fn insert_transform_rule(&mut self, column_id: &str, expression: &str) {
        self.transform_rules
            .insert(fold_ident(column_id), expression.to_string());
    }

    pub fn remove_transform_rule(&mut self, column_id: &str) -> Option<String> {
        self.transform_rules.remove(&fold_ident(column_id))
    }

    /// Load a JSON rule file and merge it over the current rules.
    pub fn load_rule_file(&mut self, path: &Path) -> Result<(), RuleError> {
        let text = fs::read_to_string(path)?;
        let file: RuleFile = serde_json::from_str(&text)?;

        for rule in file.transform_datatype_rules {
            debug!(
                "data type mapping: from {}({}) to {}({})",
                rule.translate_from,
                rule.translate_from_autoinc,
                rule.translate_to,
                rule.translate_to_size
            );
            self.insert_type_rule(
                &rule.translate_from,
                rule.translate_from_autoinc,
                &rule.translate_to,
                rule.translate_to_size,
            );
        }
        for rule in file.transform_objectname_rules {
            let Some(objtype) = ObjectType::parse(&rule.object_type) else {
                debug!("skipped object mapping with type {}", rule.object_type);
                continue;
            };
            self.insert_name_rule(&rule.source_object, objtype, &rule.destination_object);
        }
        for rule in file.transform_expression_rules {
            self.insert_transform_rule(&rule.transform_from, &rule.transform_expression);
        }
        Ok(())
    }
}

fn default_size() -> i32 {
    -1
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    transform_datatype_rules: Vec<DatatypeRule>,
    #[serde(default)]
    transform_objectname_rules: Vec<ObjnameRule>,
    #[serde(default)]
    transform_expression_rules: Vec<ExpressionRule>,
}

#[derive(Debug, Deserialize)]
struct DatatypeRule {
    translate_from: String,
    #[serde(default)]
    translate_from_autoinc: bool,
    translate_to: String,
    #[serde(default = "default_size")]
    translate_to_size: i32,
}

#[derive(Debug, Deserialize)]
struct ObjnameRule {
    object_type: String,
    source_object: String,
    destination_object: String,
}

#[derive(Debug, Deserialize)]
struct ExpressionRule {
    transform_from: String,
    transform_expression: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bit1_maps_to_boolean_for_mysql() {
        let store = RuleStore::new(ConnectorKind::Mysql);
        let rule = store.resolve_type("db.t.flag", "bit", 1, 0, false).unwrap();
        assert_eq!(rule.dest_type, "boolean");

        // bit of any other width keeps the declared length
        let rule = store.resolve_type("db.t.mask", "bit", 8, 0, false).unwrap();
        assert_eq!(rule.dest_type, "bit");
        assert_eq!(rule.length_override, -1);
    }

    #[test]
    fn oracle_integer_widths_map_by_precision() {
        let store = RuleStore::new(ConnectorKind::Oracle);
        assert_eq!(
            store
                .resolve_type("db.s.t.a", "number", 4, 0, false)
                .unwrap()
                .dest_type,
            "smallint"
        );
        assert_eq!(
            store
                .resolve_type("db.s.t.b", "number", 9, 0, false)
                .unwrap()
                .dest_type,
            "int"
        );
        assert_eq!(
            store
                .resolve_type("db.s.t.c", "number", 18, 0, false)
                .unwrap()
                .dest_type,
            "bigint"
        );
        // scaled NUMBER does not hit the precision ladder
        assert_eq!(
            store
                .resolve_type("db.s.t.d", "number", 10, 2, false)
                .unwrap()
                .dest_type,
            "numeric"
        );
    }

    #[test]
    fn auto_increment_flag_selects_serial() {
        let store = RuleStore::new(ConnectorKind::Mysql);
        assert_eq!(
            store
                .resolve_type("db.t.id", "int", 0, 0, true)
                .unwrap()
                .dest_type,
            "serial"
        );
    }

    #[test]
    fn per_column_rule_wins_over_token_rule() {
        let mut store = RuleStore::new(ConnectorKind::Mysql);
        store.insert_type_rule("inventory.geom.g.geometry", false, "varchar", 300000);
        let rule = store
            .resolve_type("inventory.geom.g.geometry", "geometry", 0, 0, false)
            .unwrap();
        assert_eq!(rule.dest_type, "varchar");
        assert_eq!(rule.length_override, 300000);
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let mut store = RuleStore::new(ConnectorKind::Mysql);
        store.insert_name_rule("Inventory.Orders", ObjectType::Table, "sales.orders");
        assert_eq!(
            store.resolve_name("inventory.orders", ObjectType::Table),
            Some("sales.orders")
        );
        assert_eq!(
            store.resolve_name("INVENTORY.ORDERS", ObjectType::Table),
            Some("sales.orders")
        );
    }

    #[test]
    fn unknown_types_pass_through() {
        let store = RuleStore::new(ConnectorKind::SqlServer);
        assert!(store
            .resolve_type("db.dbo.t.x", "hierarchyid", 0, 0, false)
            .is_none());
    }

    #[test]
    fn rule_file_merges_over_defaults() {
        let json = r#"{
            "transform_datatype_rules": [
                {
                    "translate_from": "geometry",
                    "translate_from_autoinc": false,
                    "translate_to": "varchar",
                    "translate_to_size": 300000
                }
            ],
            "transform_objectname_rules": [
                {
                    "object_type": "table",
                    "source_object": "inventory.products",
                    "destination_object": "products"
                },
                {
                    "object_type": "column",
                    "source_object": "inventory.orders.order_number",
                    "destination_object": "ididid"
                }
            ],
            "transform_expression_rules": [
                {
                    "transform_from": "inventory.geom.g",
                    "transform_expression": "st_geomfromwkb(?,?)"
                }
            ]
        }"#;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();

        let mut store = RuleStore::new(ConnectorKind::Mysql);
        store.load_rule_file(f.path()).unwrap();

        assert_eq!(
            store
                .resolve_type("db.t.g", "geometry", 0, 0, false)
                .unwrap()
                .dest_type,
            "varchar"
        );
        assert_eq!(
            store.resolve_name("inventory.products", ObjectType::Table),
            Some("products")
        );
        assert_eq!(
            store.resolve_name("inventory.orders.order_number", ObjectType::Column),
            Some("ididid")
        );
        assert_eq!(
            store.transform_expression("inventory.geom", "g"),
            Some("st_geomfromwkb(?,?)")
        );
    }
}
