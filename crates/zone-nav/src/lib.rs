//! Navigation zones: adjacency discovery, zone graph snapshots and path queries.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod graph;
pub mod level;
pub mod math;
pub mod navigator;
pub mod path;
pub mod session;
pub mod store;
pub mod zone;

pub use config::{GeometryConfig, NavConfig, WireConfig};
pub use error::{GeometryError, GraphInconsistency, NavError};
pub use graph::{BuildReport, NeighboringZone, ZoneGraph, ZoneGraphBuilder, ZoneNode};
pub use level::{load_level, parse_level_document, parse_level_lines, Level, LevelDocument};
pub use math::Vec2;
pub use navigator::{NavPath, Navigator};
pub use path::{PathFinder, PathQuery, ZoneRoute};
pub use session::{NavSession, SharedGraph, ZoneEdit};
pub use store::ZoneStore;
pub use zone::{Extent, Zone, ZoneHandle, ZoneId, ZoneShape};
