use thiserror::Error;

use crate::ZoneId;

/// Why a zone was excluded from a graph build.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("zone {zone} has {count} vertices; at least 3 are required")]
    TooFewVertices { zone: ZoneId, count: usize },
    #[error("zone {zone} has zero area")]
    ZeroArea { zone: ZoneId },
    #[error("zone {zone} has a non-finite vertex")]
    NonFinite { zone: ZoneId },
    #[error("zone {zone} appears more than once in the build input")]
    DuplicateId { zone: ZoneId },
}

impl GeometryError {
    pub fn zone(&self) -> ZoneId {
        match self {
            Self::TooFewVertices { zone, .. }
            | Self::ZeroArea { zone }
            | Self::NonFinite { zone }
            | Self::DuplicateId { zone } => *zone,
        }
    }
}

/// An adjacency entry that had no reciprocal after a build pass.
///
/// The builder repairs these by inserting the missing entry; they are reported, not returned.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("zone {from} lists {to} as a neighbor but {to} had no reciprocal border")]
pub struct GraphInconsistency {
    pub from: ZoneId,
    pub to: ZoneId,
}

#[derive(Debug, Error)]
pub enum NavError {
    #[error("zone {0} is already in the store")]
    DuplicateZone(ZoneId),
    #[error("zone id {0} was retired earlier in this level and cannot be reused")]
    RetiredZone(ZoneId),
    #[error("zone id space exhausted")]
    IdsExhausted,
    #[error("level line {line}: {reason}")]
    LevelParse { line: usize, reason: String },
    #[error("level document error: {0}")]
    LevelDocument(#[from] serde_yaml::Error),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
