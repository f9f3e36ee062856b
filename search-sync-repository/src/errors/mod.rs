//! Error types for the search sync repository.

mod index_name_error;
mod search_error;

pub use index_name_error::IndexNameError;
pub use search_error::SearchError;
