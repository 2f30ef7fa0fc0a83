use std::collections::{BTreeMap, BTreeSet};

use crate::{NavError, WireConfig, Zone, ZoneId};

/// Owns the zones of the loaded level.
///
/// Every mutation bumps [`ZoneStore::revision`]; whoever holds the current graph compares
/// revisions to know a rebuild is due. The store never rebuilds anything itself.
#[derive(Debug, Clone, Default)]
pub struct ZoneStore {
    zones: BTreeMap<ZoneId, Zone>,
    retired: BTreeSet<ZoneId>,
    /// One past the highest id seen; wider than `ZoneId` so `u16::MAX` stays allocatable.
    next_id: u32,
    revision: u64,
    grid: Option<WireConfig>,
}

impl ZoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that snaps every inserted vertex onto the replication grid.
    ///
    /// Host and peers then build from bit-identical coordinates.
    pub fn with_grid(wire: WireConfig) -> Self {
        Self {
            grid: Some(wire),
            ..Self::default()
        }
    }

    pub fn add(&mut self, mut zone: Zone) -> Result<ZoneId, NavError> {
        let id = zone.id();
        if self.zones.contains_key(&id) {
            return Err(NavError::DuplicateZone(id));
        }
        if self.retired.contains(&id) {
            return Err(NavError::RetiredZone(id));
        }
        if let Some(wire) = self.grid {
            zone.snap_to(|v| wire.snap(v));
        }

        self.next_id = self.next_id.max(u32::from(id.0) + 1);
        self.zones.insert(id, zone);
        self.revision += 1;
        tracing::debug!(zone = id.0, revision = self.revision, "zone added");
        Ok(id)
    }

    /// Swap in new geometry for an existing zone, keeping its id. Unknown ids are added.
    pub fn replace(&mut self, mut zone: Zone) -> Result<Option<Zone>, NavError> {
        let id = zone.id();
        if !self.zones.contains_key(&id) {
            return self.add(zone).map(|_| None);
        }
        if let Some(wire) = self.grid {
            zone.snap_to(|v| wire.snap(v));
        }
        let previous = self.zones.insert(id, zone);
        self.revision += 1;
        tracing::debug!(zone = id.0, revision = self.revision, "zone replaced");
        Ok(previous)
    }

    /// Remove a zone. Its id stays retired until [`ZoneStore::clear`].
    pub fn remove(&mut self, id: ZoneId) -> Option<Zone> {
        let zone = self.zones.remove(&id)?;
        self.retired.insert(id);
        self.revision += 1;
        tracing::debug!(zone = id.0, revision = self.revision, "zone removed");
        Some(zone)
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    pub fn contains(&self, id: ZoneId) -> bool {
        self.zones.contains_key(&id)
    }

    /// All zones in ascending id order.
    pub fn all(&self) -> impl Iterator<Item = &Zone> + '_ {
        self.zones.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.zones.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Next id that was never handed out in this level.
    pub fn allocate_id(&mut self) -> Result<ZoneId, NavError> {
        loop {
            let Ok(raw) = u16::try_from(self.next_id) else {
                return Err(NavError::IdsExhausted);
            };
            let id = ZoneId(raw);
            self.next_id += 1;
            if !self.zones.contains_key(&id) && !self.retired.contains(&id) {
                return Ok(id);
            }
        }
    }

    /// Drop every zone (level unload). Retired ids become available again.
    pub fn clear(&mut self) {
        self.zones.clear();
        self.retired.clear();
        self.next_id = 0;
        self.revision += 1;
    }
}
