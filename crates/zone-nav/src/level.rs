//! Zone geometry from level files.
//!
//! Two formats are understood:
//! - the line-oriented level format, where each `BotNavMeshZone x1 y1 x2 y2 ...` line is one
//!   zone in grid units and `GridSize <n>` sets the grid multiplier;
//! - a YAML (or JSON) document with explicit vertices, see [`LevelDocument`].

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{NavError, Vec2, Zone, ZoneId};

const ZONE_KEYWORD: &str = "BotNavMeshZone";
const GRID_KEYWORD: &str = "GridSize";
const DEFAULT_GRID_SIZE: f32 = 255.0;

/// Zones parsed from a level plus the lines that could not be used.
#[derive(Debug, Default)]
pub struct Level {
    pub grid_size: f32,
    pub zones: Vec<Zone>,
    pub errors: Vec<NavError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDocument {
    #[serde(default = "default_document_grid")]
    pub grid_size: f32,
    #[serde(default)]
    pub zones: Vec<ZoneRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRecord {
    #[serde(default)]
    pub id: Option<u16>,
    pub vertices: Vec<[f32; 2]>,
}

fn default_document_grid() -> f32 {
    1.0
}

/// Parse the line-oriented level format. Ids are assigned in file order starting at 1.
pub fn parse_level_lines(text: &str) -> Level {
    let mut level = Level {
        grid_size: DEFAULT_GRID_SIZE,
        ..Level::default()
    };
    let mut raw_zones: Vec<(usize, Vec<f32>)> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let mut words = line.split_whitespace();
        match words.next() {
            Some(GRID_KEYWORD) => match words.next().map(str::parse::<f32>) {
                Some(Ok(size)) if size > 0.0 => level.grid_size = size,
                _ => level.errors.push(NavError::LevelParse {
                    line: line_no,
                    reason: "GridSize needs a positive number".to_string(),
                }),
            },
            Some(ZONE_KEYWORD) => {
                let coords: Result<Vec<f32>, _> = words.map(str::parse::<f32>).collect();
                match coords {
                    Ok(coords) if coords.len() % 2 != 0 => level.errors.push(NavError::LevelParse {
                        line: line_no,
                        reason: "odd number of coordinates".to_string(),
                    }),
                    Ok(coords) if coords.len() < 6 => level.errors.push(NavError::LevelParse {
                        line: line_no,
                        reason: format!("zone needs at least 3 points, got {}", coords.len() / 2),
                    }),
                    Ok(coords) => raw_zones.push((line_no, coords)),
                    Err(err) => level.errors.push(NavError::LevelParse {
                        line: line_no,
                        reason: format!("bad coordinate: {err}"),
                    }),
                }
            }
            _ => {}
        }
    }

    // GridSize may appear after the zones that use it.
    for (next_id, (line_no, coords)) in (1u16..).zip(raw_zones) {
        let vertices = coords
            .chunks_exact(2)
            .map(|c| Vec2::new(c[0] * level.grid_size, c[1] * level.grid_size))
            .collect();
        tracing::trace!(zone = next_id, line = line_no, "zone parsed");
        level.zones.push(Zone::new(next_id, vertices));
    }

    level
}

/// Parse a YAML/JSON level document. Records without an id get the next unused one.
pub fn parse_level_document(text: &str) -> Result<Vec<Zone>, NavError> {
    let doc: LevelDocument = serde_yaml::from_str(text)?;
    Ok(doc.into_zones())
}

impl LevelDocument {
    pub fn into_zones(self) -> Vec<Zone> {
        let mut next = self
            .zones
            .iter()
            .filter_map(|z| z.id)
            .max()
            .map_or(1, |max| max.saturating_add(1));
        let grid = self.grid_size;
        self.zones
            .into_iter()
            .map(|record| {
                let id = record.id.unwrap_or_else(|| {
                    let id = next;
                    next = next.saturating_add(1);
                    id
                });
                let vertices = record
                    .vertices
                    .iter()
                    .map(|[x, y]| Vec2::new(x * grid, y * grid))
                    .collect();
                Zone::new(ZoneId(id), vertices)
            })
            .collect()
    }
}

/// Load a level from disk, picking the format from the extension.
pub fn load_level(path: &Path) -> Result<Level> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read level from {}", path.display()))?;
    let is_document = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    );
    if is_document {
        let zones = parse_level_document(&text)
            .with_context(|| format!("Failed to parse level from {}", path.display()))?;
        return Ok(Level {
            grid_size: 1.0,
            zones,
            errors: Vec::new(),
        });
    }
    Ok(parse_level_lines(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_format_scales_by_grid_and_skips_other_objects() {
        let text = "\
GridSize 10
Spawn 0 1 1
BotNavMeshZone 0 0 1 0 1 1 0 1
BotNavMeshZone 1 0 2 0 2 1
";
        let level = parse_level_lines(text);
        assert!(level.errors.is_empty(), "{:?}", level.errors);
        assert_eq!(level.zones.len(), 2);
        assert_eq!(level.zones[0].id(), ZoneId(1));
        assert_eq!(level.zones[1].id(), ZoneId(2));
        assert_eq!(level.zones[0].vertices()[2], Vec2::new(10.0, 10.0));
    }

    #[test]
    fn malformed_zone_lines_are_reported_with_line_numbers() {
        let text = "BotNavMeshZone 0 0 1\nBotNavMeshZone 0 0 1 1\nBotNavMeshZone a b c d e f\n";
        let level = parse_level_lines(text);
        assert!(level.zones.is_empty());
        let lines: Vec<usize> = level
            .errors
            .iter()
            .filter_map(|e| match e {
                NavError::LevelParse { line, .. } => Some(*line),
                _ => None,
            })
            .collect();
        assert_eq!(lines, vec![1, 2, 3]);
    }

    #[test]
    fn document_assigns_missing_ids_after_explicit_ones() {
        let yaml = "\
zones:
  - id: 7
    vertices: [[0, 0], [1, 0], [1, 1]]
  - vertices: [[1, 0], [2, 0], [2, 1]]
";
        let zones = parse_level_document(yaml).expect("parse");
        let ids: Vec<ZoneId> = zones.iter().map(Zone::id).collect();
        assert_eq!(ids, vec![ZoneId(7), ZoneId(8)]);
    }
}
