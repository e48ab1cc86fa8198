use crate::types::{Node, SortKey, LATENCY_FLOOR_MS};
use std::collections::HashMap;

/// Seam between the registry and whatever renders it. The GUI toolkit lives
/// behind this trait; tests record calls, the terminal client prints lines.
pub trait Presenter {
    /// Handle to one displayed row, kept by the registry for in-place updates.
    type Row;

    /// Drop all rows ahead of a rebuild.
    fn clear(&mut self);
    /// Append a row for `node` and return its handle.
    fn push_row(&mut self, node: &Node) -> Self::Row;
    /// Update a row's latency without disturbing anything else on screen.
    fn set_latency(&mut self, row: &Self::Row, latency_ms: u32);
    /// Toggle a row's visibility for search filtering.
    fn set_visible(&mut self, row: &Self::Row, visible: bool);
}

/// The authoritative in-process node list behind the selection screen.
///
/// Sequence order is user-controlled and significant. The id-to-row index
/// exists only so a refresh can push latency updates without rebuilding the
/// displayed list, which would lose scroll position and any active filter.
pub struct NodeRegistry<P: Presenter> {
    nodes: Vec<Node>,
    rows: HashMap<String, P::Row>,
    presenter: P,
}

impl<P: Presenter> NodeRegistry<P> {
    pub fn new(presenter: P) -> Self {
        Self {
            nodes: Vec::new(),
            rows: HashMap::new(),
            presenter,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Replace the whole registry from an initial load or explicit reload.
    /// Returns false (and changes nothing) when the fetch came back empty.
    pub fn load(&mut self, fresh: Vec<Node>) -> bool {
        if fresh.is_empty() {
            return false;
        }
        self.nodes = fresh;
        for node in &mut self.nodes {
            node.latency_ms = node.latency_ms.max(LATENCY_FLOOR_MS);
        }
        self.rebuild_rows();
        true
    }

    /// Merge a periodic fetch result into the registry, latency only.
    ///
    /// An empty `fresh` is indistinguishable from a failed fetch, so it is a
    /// strict no-op: a transient network hiccup must never blank the visible
    /// list. Known ids get their latency overwritten in place and pushed
    /// through the row handle; nothing is reordered or removed. Ids that are
    /// new to the registry are picked up by an explicit reload, not here.
    pub fn refresh(&mut self, fresh: Vec<Node>) {
        if fresh.is_empty() {
            return;
        }

        let latest: HashMap<&str, u32> = fresh
            .iter()
            .map(|n| (n.id.as_str(), n.latency_ms))
            .collect();

        for node in &mut self.nodes {
            if let Some(&latency_ms) = latest.get(node.id.as_str()) {
                node.latency_ms = latency_ms.max(LATENCY_FLOOR_MS);
                if let Some(row) = self.rows.get(&node.id) {
                    self.presenter.set_latency(row, node.latency_ms);
                }
            }
        }
    }

    /// Stable ascending sort, then a full rebuild of the presentation. Ties
    /// keep their previous relative order. Explicit user action; losing
    /// scroll position here is expected.
    pub fn sort_by(&mut self, key: SortKey) {
        match key {
            SortKey::Latency => self.nodes.sort_by_key(|n| n.latency_ms),
            SortKey::Country => self.nodes.sort_by(|a, b| a.country.cmp(&b.country)),
        }
        self.rebuild_rows();
    }

    /// Case-insensitive substring match on name or country; view-only. Rows
    /// are hidden, never removed, and an empty needle shows everything.
    pub fn apply_filter(&mut self, text: &str) {
        let needle = text.to_lowercase();
        for node in &self.nodes {
            let is_match = node.name.to_lowercase().contains(&needle)
                || node.country.to_lowercase().contains(&needle);
            if let Some(row) = self.rows.get(&node.id) {
                self.presenter.set_visible(row, is_match);
            }
        }
    }

    fn rebuild_rows(&mut self) {
        self.presenter.clear();
        self.rows.clear();
        for node in &self.nodes {
            let row = self.presenter.push_row(node);
            self.rows.insert(node.id.clone(), row);
        }
    }
}
