pub mod config;
pub mod dialect;
pub mod locality;
pub mod model;

pub use config::*;
pub use dialect::*;
pub use locality::*;
pub use model::*;
