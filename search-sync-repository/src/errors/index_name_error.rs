//! Index name validation error.

use thiserror::Error;

use crate::index_name::IndexNameViolation;

/// An index name was rejected. Carries every rule it broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid index name {name:?}: {}", describe(.violations))]
pub struct IndexNameError {
    pub name: String,
    pub violations: Vec<IndexNameViolation>,
}

fn describe(violations: &[IndexNameViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
