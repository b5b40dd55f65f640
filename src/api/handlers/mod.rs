pub mod query;
pub mod system;

pub use query::*;
pub use system::*;
