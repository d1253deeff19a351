pub mod cache;
pub mod codec;
pub mod ddl;
pub mod dml;
pub mod error;

pub use cache::{CacheEntry, JsonPosEntry, SchemaCache};
pub use codec::{process_value, ExpressionSubstituter, TransformEvaluator};
pub use ddl::{convert_ddl, resolve_dml_target, PgDdl, PgDdlColumn};
pub use dml::{convert_dml, PgDml, PgDmlBody};
pub use error::ConvertError;
