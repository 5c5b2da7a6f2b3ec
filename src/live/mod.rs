pub mod decorations;
pub mod edit;

pub use decorations::*;
pub use edit::*;
