//! Zone replication messages.
//!
//! Every payload carries exactly one message, MSB-first:
//!
//! | message          | fields                                                                    |
//! |------------------|---------------------------------------------------------------------------|
//! | `LevelBegin`     | kind(2) level_seq(16) zone_count(16) border_eps collinear_eps area_eps scale (f32 bits) |
//! | `ZoneDefinition` | kind(2) level_seq(16) id(16) vertex_count(3..=max_vertices) x,y (signed fixed point) |
//! | `LevelEnd`       | kind(2) level_seq(16) zone_count(16)                                      |
//!
//! Coordinates are `round(v * scale)` in `coordinate_bits` signed bits. Adjacency is never sent;
//! peers rebuild it from the geometry.

use zone_nav::{GeometryConfig, Vec2, WireConfig, Zone, ZoneId};

use crate::bits::{BitRead, BitReader, BitWrite, BitWriter};
use crate::{SerializationError, WireError};

const KIND_BITS: u8 = 2;
const MIN_VERTICES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    LevelBegin = 0,
    ZoneDefinition = 1,
    LevelEnd = 2,
}

impl TryFrom<u32> for MessageKind {
    type Error = WireError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::LevelBegin),
            1 => Ok(Self::ZoneDefinition),
            2 => Ok(Self::LevelEnd),
            other => Err(WireError::UnknownKind(other)),
        }
    }
}

/// Opens a level transfer and carries the host's build settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelBegin {
    pub level_seq: u16,
    pub zone_count: u16,
    pub geometry: GeometryConfig,
    pub coordinate_scale: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneDefinition {
    pub level_seq: u16,
    pub zone: Zone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelEnd {
    pub level_seq: u16,
    pub zone_count: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ZoneMessage {
    LevelBegin(LevelBegin),
    ZoneDefinition(ZoneDefinition),
    LevelEnd(LevelEnd),
}

impl ZoneMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::LevelBegin(_) => MessageKind::LevelBegin,
            Self::ZoneDefinition(_) => MessageKind::ZoneDefinition,
            Self::LevelEnd(_) => MessageKind::LevelEnd,
        }
    }

    pub fn level_seq(&self) -> u16 {
        match self {
            Self::LevelBegin(m) => m.level_seq,
            Self::ZoneDefinition(m) => m.level_seq,
            Self::LevelEnd(m) => m.level_seq,
        }
    }
}

/// Encodes and decodes [`ZoneMessage`]s for one [`WireConfig`].
///
/// Peers update the coordinate scale from each `LevelBegin` via [`ZoneCodec::set_scale`];
/// `coordinate_bits` and `max_vertices` must match on both sides.
#[derive(Debug, Clone, Copy)]
pub struct ZoneCodec {
    wire: WireConfig,
}

impl ZoneCodec {
    pub fn new(wire: WireConfig) -> Self {
        Self { wire }
    }

    pub fn wire(&self) -> WireConfig {
        self.wire
    }

    pub fn set_scale(&mut self, coordinate_scale: f32) {
        self.wire.coordinate_scale = coordinate_scale;
    }

    pub fn encode(&self, message: &ZoneMessage) -> Result<Vec<u8>, WireError> {
        match message {
            ZoneMessage::LevelBegin(begin) => Ok(encode_level_begin(begin)),
            ZoneMessage::ZoneDefinition(def) => {
                let mut w = header(MessageKind::ZoneDefinition, def.level_seq);
                self.write_zone(&mut w, &def.zone)?;
                Ok(w.into_bytes())
            }
            ZoneMessage::LevelEnd(end) => Ok(encode_level_end(end)),
        }
    }

    /// Encode a zone definition, tagging failures with the zone id.
    pub fn encode_zone(&self, level_seq: u16, zone: &Zone) -> Result<Vec<u8>, SerializationError> {
        let message = ZoneMessage::ZoneDefinition(ZoneDefinition {
            level_seq,
            zone: zone.clone(),
        });
        self.encode(&message).map_err(|source| SerializationError {
            zone: Some(zone.id()),
            source,
        })
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<ZoneMessage, WireError> {
        let mut r = BitReader::new(bytes);
        let kind = MessageKind::try_from(r.read_bits(KIND_BITS)?)?;
        let level_seq = r.read_u16()?;
        let message = match kind {
            MessageKind::LevelBegin => {
                let zone_count = r.read_u16()?;
                let geometry = GeometryConfig {
                    border_epsilon: read_finite(&mut r)?,
                    collinear_epsilon: read_finite(&mut r)?,
                    area_epsilon: read_finite(&mut r)?,
                };
                let coordinate_scale = read_finite(&mut r)?;
                if coordinate_scale <= 0.0 {
                    return Err(WireError::NonFinite);
                }
                ZoneMessage::LevelBegin(LevelBegin {
                    level_seq,
                    zone_count,
                    geometry,
                    coordinate_scale,
                })
            }
            MessageKind::ZoneDefinition => ZoneMessage::ZoneDefinition(ZoneDefinition {
                level_seq,
                zone: self.read_zone(&mut r)?,
            }),
            MessageKind::LevelEnd => ZoneMessage::LevelEnd(LevelEnd {
                level_seq,
                zone_count: r.read_u16()?,
            }),
        };
        if r.unread_bytes() > 0 {
            return Err(WireError::TrailingBytes(r.unread_bytes()));
        }
        Ok(message)
    }

    fn write_zone(&self, w: &mut impl BitWrite, zone: &Zone) -> Result<(), WireError> {
        let vertices = zone.vertices();
        let count = u32::try_from(vertices.len()).unwrap_or(u32::MAX);
        w.write_u16(zone.id().0);
        w.write_ranged(count, MIN_VERTICES, u32::from(self.wire.max_vertices))?;
        for v in vertices {
            w.write_signed(self.quantize(v.x)?, self.wire.coordinate_bits)?;
            w.write_signed(self.quantize(v.y)?, self.wire.coordinate_bits)?;
        }
        Ok(())
    }

    fn read_zone(&self, r: &mut impl BitRead) -> Result<Zone, WireError> {
        let id = ZoneId(r.read_u16()?);
        let count = r.read_ranged(MIN_VERTICES, u32::from(self.wire.max_vertices))?;
        let mut vertices = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let x = r.read_signed(self.wire.coordinate_bits)?;
            let y = r.read_signed(self.wire.coordinate_bits)?;
            vertices.push(Vec2::new(self.dequantize(x), self.dequantize(y)));
        }
        Ok(Zone::new(id, vertices))
    }

    fn quantize(&self, value: f32) -> Result<i32, WireError> {
        if !value.is_finite() {
            return Err(WireError::NonFinite);
        }
        let fixed = (f64::from(value) * f64::from(self.wire.coordinate_scale)).round();
        if fixed < f64::from(i32::MIN) || fixed > f64::from(i32::MAX) {
            return Err(WireError::OutOfRange {
                value: fixed as i64,
                min: i64::from(i32::MIN),
                max: i64::from(i32::MAX),
            });
        }
        Ok(fixed as i32)
    }

    fn dequantize(&self, fixed: i32) -> f32 {
        fixed as f32 / self.wire.coordinate_scale
    }
}

/// Zone id of a `ZoneDefinition` payload, read without validating the rest.
///
/// Lets a receiver name the zone behind a record that fails to decode.
pub fn peek_zone_id(bytes: &[u8]) -> Option<ZoneId> {
    let mut r = BitReader::new(bytes);
    let kind = MessageKind::try_from(r.read_bits(KIND_BITS).ok()?).ok()?;
    if kind != MessageKind::ZoneDefinition {
        return None;
    }
    r.read_u16().ok()?;
    r.read_u16().ok().map(ZoneId)
}

fn header(kind: MessageKind, level_seq: u16) -> BitWriter {
    let mut w = BitWriter::new();
    w.write_bits(kind as u32, KIND_BITS);
    w.write_u16(level_seq);
    w
}

pub fn encode_level_begin(begin: &LevelBegin) -> Vec<u8> {
    let mut w = header(MessageKind::LevelBegin, begin.level_seq);
    w.write_u16(begin.zone_count);
    w.write_f32(begin.geometry.border_epsilon);
    w.write_f32(begin.geometry.collinear_epsilon);
    w.write_f32(begin.geometry.area_epsilon);
    w.write_f32(begin.coordinate_scale);
    w.into_bytes()
}

pub fn encode_level_end(end: &LevelEnd) -> Vec<u8> {
    let mut w = header(MessageKind::LevelEnd, end.level_seq);
    w.write_u16(end.zone_count);
    w.into_bytes()
}

fn read_finite(r: &mut impl BitRead) -> Result<f32, WireError> {
    let value = r.read_f32()?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(WireError::NonFinite)
    }
}
