//! Peer links carrying replication payloads.
//!
//! [`PeerLink`] is the seam to whatever transport the game uses. [`LoopbackLink`] is an
//! in-process pair over `std::sync::mpsc` for local play and tests.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(pub u32);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer{}", self.0)
    }
}

/// One connection to a remote side. Payloads are whole messages; framing is the link's job.
pub trait PeerLink {
    fn peer_id(&self) -> PeerId;

    /// Queue a payload for sending. Returns false once the other side is gone.
    fn queue_outbound(&mut self, payload: Vec<u8>) -> bool;

    /// Next received payload, without blocking.
    fn next_inbound(&mut self) -> Option<Vec<u8>>;
}

/// One end of an in-process link.
#[derive(Debug)]
pub struct LoopbackLink {
    peer: PeerId,
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl LoopbackLink {
    /// Create a connected pair. Each end reports the id of the side it talks to.
    #[must_use]
    pub fn pair(host_side: PeerId, peer_side: PeerId) -> (Self, Self) {
        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        let to_peer = Self {
            peer: peer_side,
            tx: tx_a,
            rx: rx_b,
        };
        let to_host = Self {
            peer: host_side,
            tx: tx_b,
            rx: rx_a,
        };
        (to_peer, to_host)
    }

    /// Drain everything currently queued.
    #[must_use]
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(bytes) = self.next_inbound() {
            out.push(bytes);
        }
        out
    }
}

impl PeerLink for LoopbackLink {
    fn peer_id(&self) -> PeerId {
        self.peer
    }

    fn queue_outbound(&mut self, payload: Vec<u8>) -> bool {
        self.tx.send(payload).is_ok()
    }

    fn next_inbound(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }
}
