//! Host side: pushes zone geometry to peers so they can build their own graph.

use std::collections::{BTreeMap, VecDeque};

use zone_nav::{GeometryConfig, NavConfig, ZoneStore};

use crate::wire::{encode_level_begin, encode_level_end, LevelBegin, LevelEnd, ZoneCodec};
use crate::{PeerId, PeerLink, SerializationError};

/// Queues full level transfers per connected peer.
///
/// Nothing is sent directly; [`ZoneReplicator::flush`] hands queued payloads to a link during
/// the network phase of a tick.
#[derive(Debug)]
pub struct ZoneReplicator {
    codec: ZoneCodec,
    geometry: GeometryConfig,
    level_seq: u16,
    peers: BTreeMap<PeerId, VecDeque<Vec<u8>>>,
}

impl ZoneReplicator {
    pub fn new(config: &NavConfig) -> Self {
        Self {
            codec: ZoneCodec::new(config.wire),
            geometry: config.geometry,
            level_seq: 0,
            peers: BTreeMap::new(),
        }
    }

    pub fn level_seq(&self) -> u16 {
        self.level_seq
    }

    pub fn peers(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.peers.keys().copied()
    }

    /// Payloads waiting for `peer`, or `None` if it is not connected.
    pub fn pending(&self, peer: PeerId) -> Option<usize> {
        self.peers.get(&peer).map(VecDeque::len)
    }

    /// Queue the whole level for a newly connected peer.
    ///
    /// Zones that cannot be encoded are skipped and returned; the transfer still completes.
    pub fn on_peer_connected(
        &mut self,
        peer: PeerId,
        store: &ZoneStore,
    ) -> Vec<SerializationError> {
        let (transfer, skipped) = self.encode_level(store);
        tracing::info!(
            %peer,
            level_seq = self.level_seq,
            payloads = transfer.len(),
            "queued level transfer"
        );
        self.peers.insert(peer, transfer);
        skipped
    }

    pub fn on_peer_disconnected(&mut self, peer: PeerId) -> bool {
        let known = self.peers.remove(&peer).is_some();
        if known {
            tracing::info!(%peer, "peer disconnected; pending transfer dropped");
        }
        known
    }

    /// Start a new level sequence and queue a fresh transfer for every connected peer.
    ///
    /// Anything still pending from the previous sequence is discarded.
    pub fn resend_all(&mut self, store: &ZoneStore) -> Vec<SerializationError> {
        self.level_seq = self.level_seq.wrapping_add(1);
        let (transfer, skipped) = self.encode_level(store);
        for queue in self.peers.values_mut() {
            *queue = transfer.clone();
        }
        tracing::info!(
            level_seq = self.level_seq,
            peers = self.peers.len(),
            "level re-sent to all peers"
        );
        skipped
    }

    /// Move everything queued for the link's peer onto the link. Returns the number sent.
    pub fn flush(&mut self, link: &mut impl PeerLink) -> usize {
        let peer = link.peer_id();
        let Some(queue) = self.peers.get_mut(&peer) else {
            return 0;
        };
        let mut sent = 0;
        let mut closed = false;
        while let Some(payload) = queue.pop_front() {
            if !link.queue_outbound(payload) {
                closed = true;
                break;
            }
            sent += 1;
        }
        if closed {
            tracing::warn!(%peer, "link closed during flush");
            self.peers.remove(&peer);
        }
        sent
    }

    fn encode_level(&self, store: &ZoneStore) -> (VecDeque<Vec<u8>>, Vec<SerializationError>) {
        let mut zones = Vec::with_capacity(store.len());
        let mut skipped = Vec::new();
        for zone in store.all() {
            match self.codec.encode_zone(self.level_seq, zone) {
                Ok(bytes) => zones.push(bytes),
                Err(err) => {
                    tracing::warn!(error = %err, "zone skipped from replication");
                    skipped.push(err);
                }
            }
        }

        let zone_count = u16::try_from(zones.len()).unwrap_or(u16::MAX);
        let mut transfer = VecDeque::with_capacity(zones.len() + 2);
        transfer.push_back(encode_level_begin(&LevelBegin {
            level_seq: self.level_seq,
            zone_count,
            geometry: self.geometry,
            coordinate_scale: self.codec.wire().coordinate_scale,
        }));
        transfer.extend(zones);
        transfer.push_back(encode_level_end(&LevelEnd {
            level_seq: self.level_seq,
            zone_count,
        }));
        (transfer, skipped)
    }
}
