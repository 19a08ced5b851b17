//! Error types raised by value graph operations.
//!
//! Most fallible actions (duplicate attach, absent detach, duplicate
//! dependency) report through a `bool` return. Only structural violations of
//! the dependency graph are errors.

use thiserror::Error;

use crate::value::NodeId;

/// Errors surfaced by modified values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("dependency {dependency:?} of {node:?} would close a cycle")]
    DependencyCycle { node: NodeId, dependency: NodeId },
}

pub type Result<T> = std::result::Result<T, Error>;
