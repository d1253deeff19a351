pub mod defaults;
pub mod error;
pub mod reload;
pub mod store;

pub use error::RuleError;
pub use reload::{reload_from_objmap, MigrationSql, ObjmapEntry};
pub use store::{ObjectType, RuleStore, TypeRule};
