pub mod query;
pub mod question;
pub mod result;
pub mod state;

pub use query::*;
pub use question::*;
pub use result::*;
pub use state::*;
