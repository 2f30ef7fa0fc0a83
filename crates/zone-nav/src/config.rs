//! Navigation configuration loading.
//!
//! Host and peers must build with identical geometry settings or they can derive different
//! graphs from the same zones; the replication handshake carries [`GeometryConfig`] for that
//! reason.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level navigation configuration, usually loaded from `zonenav.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Adjacency discovery tolerances
    #[serde(default)]
    pub geometry: GeometryConfig,

    /// Replication encoding parameters
    #[serde(default)]
    pub wire: WireConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Shared borders at or below this length are not adjacencies
    #[serde(default = "default_border_epsilon")]
    pub border_epsilon: f32,

    /// Max perpendicular distance for two edges to count as collinear
    #[serde(default = "default_collinear_epsilon")]
    pub collinear_epsilon: f32,

    /// Zones with |area| at or below this are degenerate
    #[serde(default = "default_area_epsilon")]
    pub area_epsilon: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireConfig {
    /// Fixed-point steps per world unit
    #[serde(default = "default_coordinate_scale")]
    pub coordinate_scale: f32,

    /// Signed bits per encoded coordinate
    #[serde(default = "default_coordinate_bits")]
    pub coordinate_bits: u8,

    /// Largest vertex loop a zone definition may carry
    #[serde(default = "default_max_vertices")]
    pub max_vertices: u16,
}

fn default_border_epsilon() -> f32 {
    0.1
}
fn default_collinear_epsilon() -> f32 {
    0.01
}
fn default_area_epsilon() -> f32 {
    1e-4
}
fn default_coordinate_scale() -> f32 {
    16.0
}
fn default_coordinate_bits() -> u8 {
    24
}
fn default_max_vertices() -> u16 {
    255
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            border_epsilon: default_border_epsilon(),
            collinear_epsilon: default_collinear_epsilon(),
            area_epsilon: default_area_epsilon(),
        }
    }
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            coordinate_scale: default_coordinate_scale(),
            coordinate_bits: default_coordinate_bits(),
            max_vertices: default_max_vertices(),
        }
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            geometry: GeometryConfig::default(),
            wire: WireConfig::default(),
        }
    }
}

impl WireConfig {
    /// Snap a coordinate onto the fixed-point grid used on the wire.
    pub fn snap(&self, value: f32) -> f32 {
        (value * self.coordinate_scale).round() / self.coordinate_scale
    }

    /// Largest magnitude representable with `coordinate_bits` signed bits, in world units.
    pub fn coordinate_limit(&self) -> f32 {
        let max_fixed = (1i64 << (self.coordinate_bits.clamp(2, 32) - 1)) - 1;
        max_fixed as f32 / self.coordinate_scale
    }
}

impl NavConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let g = &self.geometry;
        anyhow::ensure!(
            g.border_epsilon >= 0.0 && g.collinear_epsilon >= 0.0 && g.area_epsilon >= 0.0,
            "geometry epsilons must be non-negative"
        );
        let w = &self.wire;
        anyhow::ensure!(
            w.coordinate_scale > 0.0,
            "wire.coordinate_scale must be > 0"
        );
        anyhow::ensure!(
            (2..=32).contains(&w.coordinate_bits),
            "wire.coordinate_bits must be within 2..=32"
        );
        anyhow::ensure!(w.max_vertices >= 3, "wire.max_vertices must be >= 3");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "geometry:\n  border_epsilon: 0.5\n";
        let config: NavConfig = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(config.geometry.border_epsilon, 0.5);
        assert_eq!(config.geometry.collinear_epsilon, 0.01);
        assert_eq!(config.wire, WireConfig::default());
        config.validate().expect("valid");
    }

    #[test]
    fn snap_rounds_to_fixed_point_grid() {
        let wire = WireConfig::default();
        assert_eq!(wire.snap(1.03), 1.0);
        assert_eq!(wire.snap(-2.97), -3.0);
        assert_eq!(wire.snap(0.0625), 0.0625);
    }

    #[test]
    fn rejects_zero_scale() {
        let mut config = NavConfig::default();
        config.wire.coordinate_scale = 0.0;
        assert!(config.validate().is_err());
    }
}
