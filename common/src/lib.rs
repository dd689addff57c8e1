pub mod aggregate;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod plot;
pub mod stage;
pub mod util;

pub use error::BreakdownError;
