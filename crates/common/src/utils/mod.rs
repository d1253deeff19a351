pub mod bytes;
pub mod ids;

pub use bytes::*;
pub use ids::*;
