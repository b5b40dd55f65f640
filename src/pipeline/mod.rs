//! Natural-language query pipeline.
//!
//! Question → generated SQL → sanitizer → read-only execution → answer.

pub mod executor;
pub mod generator;
pub mod interpreter;
pub mod orchestrator;
pub mod prompt;
pub mod sanitizer;
pub mod template;

pub use executor::{run_checked, QueryStore};
pub use generator::QueryGenerator;
pub use interpreter::ResponseInterpreter;
pub use orchestrator::QueryPipeline;
pub use prompt::SeasonContext;
pub use sanitizer::{QuerySanitizer, Rejection, DENIED_KEYWORDS};
