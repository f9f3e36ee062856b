//! Configuration module for the search sync binary.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::Settings;
