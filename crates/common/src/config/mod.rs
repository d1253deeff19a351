pub mod components;
pub mod error;
pub mod loader;

pub use components::*;
pub use error::ConfigError;
pub use loader::load_registry;
