pub mod activate;
pub mod matcher;
pub mod segment;
pub mod template;

pub use activate::*;
pub use matcher::*;
pub use segment::*;
pub use template::*;
