// HTTP routes
pub mod commands;
pub mod events;
pub mod health;

pub use commands::*;
pub use events::*;
pub use health::*;
