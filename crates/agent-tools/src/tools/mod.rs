//! Built-in tool implementations.

mod calculator;
mod current_time;
mod knowledge_search;
mod web_fetch;

pub use calculator::Calculator;
pub use current_time::CurrentTime;
pub use knowledge_search::KnowledgeSearch;
pub use web_fetch::WebFetch;
