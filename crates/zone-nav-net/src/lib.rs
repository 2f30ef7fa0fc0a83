//! Host-to-peer replication of navigation zone geometry.
//!
//! Only zone ids and vertex loops travel; every peer runs the same
//! [`zone_nav::ZoneGraphBuilder`] locally with the host's geometry settings.

#![forbid(unsafe_code)]

pub mod bits;
pub mod error;
pub mod link;
pub mod receiver;
pub mod replicator;
pub mod wire;

pub use bits::{BitRead, BitReader, BitWrite, BitWriter};
pub use error::{SerializationError, WireError};
pub use link::{LoopbackLink, PeerId, PeerLink};
pub use receiver::{PollReport, ZoneReceiver};
pub use replicator::ZoneReplicator;
pub use wire::{
    peek_zone_id, LevelBegin, LevelEnd, MessageKind, ZoneCodec, ZoneDefinition, ZoneMessage,
};
