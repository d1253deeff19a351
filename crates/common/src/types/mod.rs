pub mod events;
pub mod wire;

pub use events::*;
pub use wire::*;
