use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::math::{closest_point_on_polygon, point_in_polygon};
use crate::{GeometryConfig, GeometryError, Vec2, ZoneStore};

/// Stable zone identifier.
///
/// Unique within a level session and never reused while the level is loaded. Sixteen bits is
/// what the replication protocol carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub u16);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u16> for ZoneId {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: Vec2,
    pub max: Vec2,
}

impl Extent {
    pub fn from_points(points: &[Vec2]) -> Self {
        let mut iter = points.iter().copied();
        let Some(first) = iter.next() else {
            return Self {
                min: Vec2::ZERO,
                max: Vec2::ZERO,
            };
        };
        iter.fold(
            Self {
                min: first,
                max: first,
            },
            |acc, p| Self {
                min: Vec2::new(acc.min.x.min(p.x), acc.min.y.min(p.y)),
                max: Vec2::new(acc.max.x.max(p.x), acc.max.y.max(p.y)),
            },
        )
    }

    /// True when the boxes intersect after growing both by `margin`.
    pub fn overlaps(&self, other: &Extent, margin: f32) -> bool {
        self.min.x - margin <= other.max.x + margin
            && other.min.x - margin <= self.max.x + margin
            && self.min.y - margin <= other.max.y + margin
            && other.min.y - margin <= self.max.y + margin
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn center(&self) -> Vec2 {
        self.min.midpoint(self.max)
    }
}

/// Read access to zone geometry for debug drawing and other collaborators.
pub trait ZoneShape {
    fn zone_id(&self) -> ZoneId;
    fn vertices(&self) -> &[Vec2];
    fn extent(&self) -> Extent;
    fn center(&self) -> Vec2;
}

/// One traversable polygonal cell of the navigation mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    id: ZoneId,
    vertices: Vec<Vec2>,
    extent: Extent,
    center: Vec2,
    area: f32,
}

impl Zone {
    pub fn new(id: impl Into<ZoneId>, vertices: Vec<Vec2>) -> Self {
        let extent = Extent::from_points(&vertices);
        let (area, center) = polygon_area_and_centroid(&vertices);
        Self {
            id: id.into(),
            vertices,
            extent,
            center,
            area,
        }
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Area-weighted centroid of the vertex loop.
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Signed area; positive for counter-clockwise loops.
    pub fn area(&self) -> f32 {
        self.area
    }

    /// Edges of the closed loop, in vertex order.
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    pub fn validate(&self, config: &GeometryConfig) -> Result<(), GeometryError> {
        if self.vertices.len() < 3 {
            return Err(GeometryError::TooFewVertices {
                zone: self.id,
                count: self.vertices.len(),
            });
        }
        if self.vertices.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite { zone: self.id });
        }
        if self.area.abs() <= config.area_epsilon {
            return Err(GeometryError::ZeroArea { zone: self.id });
        }
        Ok(())
    }

    /// Point-in-polygon test. Points on the boundary count as inside.
    pub fn contains(&self, p: Vec2) -> bool {
        self.extent.contains(p) && point_in_polygon(&self.vertices, p)
    }

    pub fn is_convex(&self) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        let mut sign = 0.0f32;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let c = self.vertices[(i + 2) % n];
            let turn = (b - a).cross(c - b);
            if turn.abs() <= 1e-6 {
                continue;
            }
            if sign == 0.0 {
                sign = turn.signum();
            } else if turn.signum() != sign {
                return false;
            }
        }
        true
    }

    /// Closest point inside or on the zone to `p`.
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        closest_point_on_polygon(&self.vertices, p)
    }

    pub(crate) fn snap_to(&mut self, snap: impl Fn(f32) -> f32) {
        for v in self.vertices.iter_mut() {
            *v = Vec2::new(snap(v.x), snap(v.y));
        }
        *self = Zone::new(self.id, core::mem::take(&mut self.vertices));
    }
}

impl ZoneShape for Zone {
    fn zone_id(&self) -> ZoneId {
        self.id
    }

    fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    fn extent(&self) -> Extent {
        self.extent
    }

    fn center(&self) -> Vec2 {
        self.center
    }
}

/// A zone reference that must be checked against the store before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZoneHandle(pub ZoneId);

impl ZoneHandle {
    pub fn id(self) -> ZoneId {
        self.0
    }

    pub fn resolve(self, store: &ZoneStore) -> Option<&Zone> {
        store.get(self.0)
    }

    pub fn is_alive(self, store: &ZoneStore) -> bool {
        store.contains(self.0)
    }
}

#[derive(Serialize, Deserialize)]
struct ZoneSerde {
    id: ZoneId,
    vertices: Vec<Vec2>,
}

impl Serialize for Zone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        ZoneSerde {
            id: self.id,
            vertices: self.vertices.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Zone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let data = ZoneSerde::deserialize(deserializer)?;
        Ok(Zone::new(data.id, data.vertices))
    }
}

fn polygon_area_and_centroid(vertices: &[Vec2]) -> (f32, Vec2) {
    let n = vertices.len();
    if n == 0 {
        return (0.0, Vec2::ZERO);
    }

    // Accumulate relative to the first vertex to keep precision for far-off levels.
    let origin = vertices[0];
    let mut twice_area = 0.0f64;
    let mut cx = 0.0f64;
    let mut cy = 0.0f64;
    for i in 0..n {
        let a = vertices[i] - origin;
        let b = vertices[(i + 1) % n] - origin;
        let cross = f64::from(a.cross(b));
        twice_area += cross;
        cx += f64::from(a.x + b.x) * cross;
        cy += f64::from(a.y + b.y) * cross;
    }

    let area = (twice_area * 0.5) as f32;
    if twice_area.abs() <= f64::EPSILON {
        let mut sum = Vec2::ZERO;
        for v in vertices {
            sum += *v;
        }
        return (area, sum / n as f32);
    }

    let scale = 1.0 / (3.0 * twice_area);
    let centroid = origin + Vec2::new((cx * scale) as f32, (cy * scale) as f32);
    (area, centroid)
}
