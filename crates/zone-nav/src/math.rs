use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product.
    pub fn cross(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    pub fn distance_squared(self, other: Self) -> f32 {
        (other - self).length_squared()
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    pub fn midpoint(self, other: Self) -> Self {
        self.lerp(other, 0.5)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Closest point to `p` on the segment `a..b`.
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let denom = ab.dot(ab);
    if denom <= f32::EPSILON {
        return a;
    }
    let t = (p - a).dot(ab) / denom;
    let t = t.clamp(0.0, 1.0);
    a + ab * t
}

/// Point on segment `a..b` closest to the infinite line through `p` and `q`.
///
/// If the segment crosses the line, the crossing point is returned. Otherwise the endpoint
/// nearest to the line wins (ties keep `a`). A degenerate line (`p == q`) falls back to the
/// segment point closest to `p`.
pub fn closest_point_on_segment_to_line(a: Vec2, b: Vec2, p: Vec2, q: Vec2) -> Vec2 {
    let dir = q - p;
    let len = dir.length();
    if len <= f32::EPSILON {
        return closest_point_on_segment(p, a, b);
    }

    // Signed distances of the segment endpoints from the line.
    let da = dir.cross(a - p) / len;
    let db = dir.cross(b - p) / len;

    if (da <= 0.0 && db >= 0.0) || (da >= 0.0 && db <= 0.0) {
        let denom = da - db;
        if denom.abs() <= f32::EPSILON {
            // Segment lies on the line; use the point closest to `q`.
            return closest_point_on_segment(q, a, b);
        }
        return a.lerp(b, da / denom);
    }

    if da.abs() <= db.abs() {
        a
    } else {
        b
    }
}

/// Crossing-number point-in-polygon test. Points on the boundary count as inside.
pub fn point_in_polygon(polygon: &[Vec2], p: Vec2) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if closest_point_on_segment(p, a, b).distance_squared(p) <= 1e-10 {
            return true;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Closest point inside or on `polygon` to `p`.
pub fn closest_point_on_polygon(polygon: &[Vec2], p: Vec2) -> Vec2 {
    if point_in_polygon(polygon, p) {
        return p;
    }
    let n = polygon.len();
    let mut best: Option<(f32, Vec2)> = None;
    for i in 0..n {
        let q = closest_point_on_segment(p, polygon[i], polygon[(i + 1) % n]);
        let d2 = q.distance_squared(p);
        match best {
            None => best = Some((d2, q)),
            Some((best_d2, _)) if d2 < best_d2 => best = Some((d2, q)),
            _ => {}
        }
    }
    best.map(|(_, q)| q).unwrap_or(p)
}
