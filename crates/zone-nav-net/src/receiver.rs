//! Peer side: stages replicated zones and activates a locally built graph.

use std::collections::BTreeMap;
use std::sync::Arc;

use zone_nav::{
    BuildReport, GeometryConfig, NavConfig, NavPath, SharedGraph, Vec2, Zone, ZoneGraph,
    ZoneGraphBuilder, ZoneId, ZoneStore,
};

use crate::wire::{peek_zone_id, LevelBegin, LevelEnd, ZoneCodec, ZoneDefinition, ZoneMessage};
use crate::{PeerLink, SerializationError, WireError};

/// What one [`ZoneReceiver::poll`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollReport {
    pub received: usize,
    /// Payloads that failed to decode or repeated a zone id.
    pub dropped: usize,
    /// One entry per dropped payload, in arrival order.
    pub errors: Vec<SerializationError>,
    /// Messages for a level sequence other than the one being staged.
    pub stale: usize,
    /// Set when a level transfer completed and its graph became current.
    pub activated: Option<BuildReport>,
}

impl PollReport {
    fn drop_record(&mut self, err: SerializationError) {
        self.dropped += 1;
        self.errors.push(err);
    }
}

#[derive(Debug)]
struct Staging {
    level_seq: u16,
    expected: u16,
    geometry: GeometryConfig,
    zones: BTreeMap<ZoneId, Zone>,
}

#[derive(Debug)]
pub struct ZoneReceiver {
    codec: ZoneCodec,
    geometry: GeometryConfig,
    staging: Option<Staging>,
    active_seq: Option<u16>,
    store: ZoneStore,
    graph: SharedGraph,
    dropped_total: usize,
}

impl ZoneReceiver {
    pub fn new(config: &NavConfig) -> Self {
        Self {
            codec: ZoneCodec::new(config.wire),
            geometry: config.geometry,
            staging: None,
            active_seq: None,
            store: ZoneStore::new(),
            graph: SharedGraph::default(),
            dropped_total: 0,
        }
    }

    /// Geometry settings of the active level (the host's, once a level has arrived).
    pub fn geometry(&self) -> GeometryConfig {
        self.geometry
    }

    pub fn active_level(&self) -> Option<u16> {
        self.active_seq
    }

    pub fn is_staging(&self) -> bool {
        self.staging.is_some()
    }

    /// Records dropped since this receiver was created.
    pub fn dropped_total(&self) -> usize {
        self.dropped_total
    }

    /// Zones of the active level.
    pub fn zones(&self) -> &ZoneStore {
        &self.store
    }

    pub fn graph(&self) -> Arc<ZoneGraph> {
        self.graph.load()
    }

    pub fn shared_graph(&self) -> SharedGraph {
        self.graph.clone()
    }

    pub fn find_path(&self, start: ZoneId, target: ZoneId, target_point: Vec2) -> NavPath {
        self.graph.find_path(start, target, target_point)
    }

    /// Drain and process every inbound payload on `link`.
    pub fn poll(&mut self, link: &mut impl PeerLink) -> PollReport {
        let mut report = PollReport::default();
        while let Some(payload) = link.next_inbound() {
            report.received += 1;
            self.handle_payload(&payload, &mut report);
        }
        self.dropped_total += report.dropped;
        report
    }

    /// Process one payload. Exposed for transports that deliver outside a [`PeerLink`].
    pub fn handle_payload(&mut self, payload: &[u8], report: &mut PollReport) {
        let message = match self.codec.decode(payload) {
            Ok(message) => message,
            Err(source) => {
                let err = SerializationError {
                    zone: peek_zone_id(payload),
                    source,
                };
                tracing::warn!(error = %err, bytes = payload.len(), "zone record dropped");
                report.drop_record(err);
                return;
            }
        };

        match message {
            ZoneMessage::LevelBegin(begin) => self.begin_level(begin, report),
            ZoneMessage::ZoneDefinition(def) => self.stage_zone(def, report),
            ZoneMessage::LevelEnd(end) => {
                if let Some(built) = self.end_level(end, report) {
                    report.activated = Some(built);
                }
            }
        }
    }

    fn begin_level(&mut self, begin: LevelBegin, report: &mut PollReport) {
        // A repeated sequence restarts the transfer; only older ones are stale.
        let newest = self
            .staging
            .as_ref()
            .map(|s| s.level_seq)
            .or(self.active_seq);
        if let Some(newest) = newest.filter(|&seq| is_newer(seq, begin.level_seq)) {
            tracing::debug!(
                level_seq = begin.level_seq,
                newest,
                "stale level begin"
            );
            report.stale += 1;
            return;
        }
        tracing::debug!(
            level_seq = begin.level_seq,
            zones = begin.zone_count,
            "level transfer started"
        );
        self.codec.set_scale(begin.coordinate_scale);
        self.staging = Some(Staging {
            level_seq: begin.level_seq,
            expected: begin.zone_count,
            geometry: begin.geometry,
            zones: BTreeMap::new(),
        });
    }

    fn stage_zone(&mut self, def: ZoneDefinition, report: &mut PollReport) {
        let Some(staging) = self
            .staging
            .as_mut()
            .filter(|s| s.level_seq == def.level_seq)
        else {
            report.stale += 1;
            return;
        };
        let id = def.zone.id();
        if staging.zones.contains_key(&id) {
            let err = SerializationError {
                zone: Some(id),
                source: WireError::DuplicateZone(id),
            };
            tracing::warn!(error = %err, "duplicate zone record dropped");
            report.drop_record(err);
            return;
        }
        staging.zones.insert(id, def.zone);
    }

    fn end_level(&mut self, end: LevelEnd, report: &mut PollReport) -> Option<BuildReport> {
        let matches = self
            .staging
            .as_ref()
            .is_some_and(|s| s.level_seq == end.level_seq);
        if !matches {
            report.stale += 1;
            return None;
        }
        let staging = self.staging.take()?;

        if staging.zones.len() != usize::from(staging.expected) {
            tracing::warn!(
                level_seq = staging.level_seq,
                expected = staging.expected,
                received = staging.zones.len(),
                "level transfer incomplete; building from what arrived"
            );
        }

        let (graph, built) = ZoneGraphBuilder::new(staging.geometry).build(staging.zones.values());
        self.graph.swap(graph);

        self.store.clear();
        for zone in staging.zones.into_values() {
            if let Err(err) = self.store.add(zone) {
                tracing::warn!(error = %err, "replicated zone not stored");
            }
        }

        self.geometry = staging.geometry;
        self.active_seq = Some(staging.level_seq);
        tracing::info!(
            level_seq = staging.level_seq,
            zones = self.store.len(),
            rejected = built.rejected.len(),
            "replicated level activated"
        );
        Some(built)
    }
}

/// Wrapping sequence comparison: true when `a` is ahead of `b`.
fn is_newer(a: u16, b: u16) -> bool {
    let diff = a.wrapping_sub(b);
    diff != 0 && diff < 0x8000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_comparison_wraps() {
        assert!(is_newer(1, 0));
        assert!(is_newer(0, u16::MAX));
        assert!(!is_newer(5, 5));
        assert!(!is_newer(4, 5));
    }
}
