use common::types::TypeCategory;

/// One attribute of a destination table, copied out of the catalog.
#[derive(Debug, Clone)]
pub struct AttrDef {
    /// attribute name as stored by the destination (already lowercase
    /// unless quoted at creation)
    pub name: String,
    pub type_oid: u32,
    /// 1-based attribute number
    pub position: i32,
    pub typmod: i32,
    pub is_pk: bool,
    pub category: TypeCategory,
    pub type_name: String,
    pub is_dropped: bool,
}

/// Copied tuple descriptor of a destination table.
#[derive(Debug, Clone)]
pub struct TableDef {
    pub oid: u32,
    pub schema: String,
    pub name: String,
    pub attrs: Vec<AttrDef>,
}

impl TableDef {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Number of live (not dropped) attributes.
    pub fn active_attr_count(&self) -> usize {
        self.attrs.iter().filter(|a| !a.is_dropped).count()
    }

    pub fn attr_by_name(&self, name: &str) -> Option<&AttrDef> {
        self.attrs
            .iter()
            .find(|a| !a.is_dropped && a.name.eq_ignore_ascii_case(name))
    }

    pub fn has_primary_key(&self) -> bool {
        self.attrs.iter().any(|a| a.is_pk)
    }
}

/// One value handed to the tuple-level write path. `None` is SQL NULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleValue {
    pub value: Option<String>,
    pub type_oid: u32,
    /// 1-based attribute position this value belongs to
    pub position: i32,
}
