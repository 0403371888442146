use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    BaseDesign,
    SubDesign,
    Project,
    Order,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::BaseDesign => "Base design",
            EntityKind::SubDesign => "Sub design",
            EntityKind::Project => "Design project",
            EntityKind::Order => "Manufacturing order",
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} with id {id} not found")]
    NotFound { kind: EntityKind, id: u64 },

    #[error("image {0} not found")]
    ImageNotFound(String),

    #[error("invalid image name: {0}")]
    InvalidImageName(String),

    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. } | StoreError::ImageNotFound(_))
    }
}
