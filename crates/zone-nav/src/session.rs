//! Level/session context: the zone store plus the current graph snapshot.

use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    BuildReport, NavConfig, NavError, NavPath, PathFinder, Vec2, Zone, ZoneGraph,
    ZoneGraphBuilder, ZoneId, ZoneStore,
};

/// Shared handle to "the current graph".
///
/// Readers take an `Arc` snapshot and search it without holding the lock; a rebuild swaps the
/// pointer. A query that started before a swap finishes against the graph it loaded.
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<Arc<ZoneGraph>>>,
}

impl SharedGraph {
    pub fn new(graph: ZoneGraph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(graph))),
        }
    }

    pub fn load(&self) -> Arc<ZoneGraph> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install `graph` as current and return the previous snapshot.
    pub fn swap(&self, graph: ZoneGraph) -> Arc<ZoneGraph> {
        let next = Arc::new(graph);
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        core::mem::replace(&mut *slot, next)
    }

    pub fn find_path(&self, start: ZoneId, target: ZoneId, target_point: Vec2) -> NavPath {
        let graph = self.load();
        PathFinder::find_path(&graph, start, target, target_point)
    }
}

/// Geometry change deferred to the start of the next tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneEdit {
    Add(Zone),
    Remove(ZoneId),
    /// New geometry for an existing id.
    Replace(Zone),
    UnloadLevel,
}

#[derive(Debug)]
pub struct NavSession {
    config: NavConfig,
    builder: ZoneGraphBuilder,
    store: ZoneStore,
    pending: Vec<ZoneEdit>,
    graph: SharedGraph,
    built_revision: Option<u64>,
}

impl NavSession {
    pub fn new(config: NavConfig) -> Self {
        Self {
            builder: ZoneGraphBuilder::new(config.geometry),
            store: ZoneStore::with_grid(config.wire),
            pending: Vec::new(),
            graph: SharedGraph::default(),
            built_revision: None,
            config,
        }
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn store(&self) -> &ZoneStore {
        &self.store
    }

    /// Direct store access; only valid between ticks.
    pub fn store_mut(&mut self) -> &mut ZoneStore {
        &mut self.store
    }

    /// Replace the level's zones. The graph is rebuilt on the next tick.
    pub fn load_level<I>(&mut self, zones: I) -> Vec<NavError>
    where
        I: IntoIterator<Item = Zone>,
    {
        self.store.clear();
        let mut errors = Vec::new();
        for zone in zones {
            if let Err(err) = self.store.add(zone) {
                tracing::warn!(error = %err, "level zone skipped");
                errors.push(err);
            }
        }
        tracing::info!(zones = self.store.len(), "level zones loaded");
        errors
    }

    pub fn queue_edit(&mut self, edit: ZoneEdit) {
        self.pending.push(edit);
    }

    /// True when the store changed after the current graph was built.
    pub fn is_stale(&self) -> bool {
        self.built_revision != Some(self.store.revision()) || !self.pending.is_empty()
    }

    /// Apply queued edits and, if geometry changed, rebuild and swap the graph.
    pub fn begin_tick(&mut self) -> Option<BuildReport> {
        for edit in core::mem::take(&mut self.pending) {
            self.apply(edit);
        }

        if self.built_revision == Some(self.store.revision()) {
            return None;
        }

        let (graph, report) = self.builder.build(self.store.all());
        self.graph.swap(graph);
        self.built_revision = Some(self.store.revision());
        Some(report)
    }

    fn apply(&mut self, edit: ZoneEdit) {
        let result = match edit {
            ZoneEdit::Add(zone) => self.store.add(zone).map(|_| ()),
            ZoneEdit::Remove(id) => {
                if self.store.remove(id).is_none() {
                    tracing::debug!(zone = id.0, "remove of unknown zone ignored");
                }
                Ok(())
            }
            ZoneEdit::Replace(zone) => self.store.replace(zone).map(|_| ()),
            ZoneEdit::UnloadLevel => {
                self.store.clear();
                Ok(())
            }
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "queued zone edit rejected");
        }
    }

    pub fn graph(&self) -> Arc<ZoneGraph> {
        self.graph.load()
    }

    /// Reader handle for other systems (bot AI, debug tooling).
    pub fn shared_graph(&self) -> SharedGraph {
        self.graph.clone()
    }

    pub fn find_path(&self, start: ZoneId, target: ZoneId, target_point: Vec2) -> NavPath {
        self.graph.find_path(start, target, target_point)
    }

    pub fn neighbor_index(&self, zone: ZoneId, candidate: ZoneId) -> Option<usize> {
        self.graph().neighbor_index(zone, candidate)
    }

    pub fn zone_at(&self, point: Vec2) -> Option<ZoneId> {
        self.graph().zone_at(point)
    }
}
