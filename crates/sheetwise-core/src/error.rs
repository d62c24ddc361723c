//! Error types for project lookups and graph queries

use thiserror::Error;

use crate::model::UnitId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The unit is not present in the project.
    #[error("{0} not found in project")]
    NotFound(UnitId),

    #[error("invalid unit identifier `{0}` (expected `scene:<name>` or `sheet:<name>`)")]
    InvalidUnitId(String),

    /// A unit with this identifier already exists.
    #[error("{0} already exists in project")]
    Duplicate(UnitId),
}

pub type Result<T> = std::result::Result<T, GraphError>;
