use thiserror::Error;
use zone_nav::ZoneId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WireError {
    #[error("unexpected end of payload: needed {needed} bits, {remaining} left")]
    UnexpectedEnd { needed: usize, remaining: usize },
    #[error("value {value} outside {min}..={max}")]
    OutOfRange { value: i64, min: i64, max: i64 },
    #[error("non-finite value on the wire")]
    NonFinite,
    #[error("unknown message kind {0}")]
    UnknownKind(u32),
    #[error("{0} unread bytes after message")]
    TrailingBytes(usize),
    #[error("zone {0} already received for this level")]
    DuplicateZone(ZoneId),
}

/// A zone record that could not be written or read. The record is skipped, the batch continues.
///
/// `zone` is `None` when an inbound record was too damaged to carry a readable id.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("zone record {} rejected: {source}", display_zone(.zone))]
pub struct SerializationError {
    pub zone: Option<ZoneId>,
    #[source]
    pub source: WireError,
}

fn display_zone(zone: &Option<ZoneId>) -> String {
    zone.map_or_else(|| "(unknown id)".to_owned(), |id| id.to_string())
}
