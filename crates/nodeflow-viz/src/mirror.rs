//! Reconciliation between the canonical [`EditorState`] and the canvas graph.
//!
//! The editor state owns the node and edge records; the `egui_graphs` graph
//! is a render mirror of it. [`GraphMirror`] keeps the id-to-index mappings
//! and pushes additions, removals, and label changes into the canvas graph.
//! Positions flow state-to-canvas only at node creation (and via
//! [`GraphMirror::sync_positions`]); during a drag the canvas is
//! authoritative until the app commits the snapped end position back.

use std::collections::{HashMap, HashSet};

use egui::Pos2;
use egui_graphs::Graph;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};

use nodeflow_core::{EdgeId, EditorState, NodeId};

/// The canvas-side graph. Node payloads carry the editor id so any canvas
/// index can be traced back to a state record.
pub type CanvasGraph = Graph<NodeId>;

/// Bidirectional id/index bookkeeping plus the reconcile pass.
#[derive(Debug, Default)]
pub struct GraphMirror {
    node_to_index: HashMap<NodeId, NodeIndex>,
    index_to_node: HashMap<NodeIndex, NodeId>,
    edge_to_index: HashMap<EdgeId, EdgeIndex>,
}

impl GraphMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canvas index of a state node, if it is currently mirrored.
    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_to_index.get(&id).copied()
    }

    /// State id behind a canvas index, if it is currently mirrored.
    pub fn node_id(&self, index: NodeIndex) -> Option<NodeId> {
        self.index_to_node.get(&index).copied()
    }

    /// Bring the canvas graph in line with the editor state: remove nodes
    /// and edges that no longer exist, add the ones that are missing, and
    /// refresh labels. Existing node positions are left untouched.
    pub fn reconcile(&mut self, g: &mut CanvasGraph, state: &EditorState) {
        self.remove_stale(g, state);
        self.add_missing_nodes(g, state);
        self.add_missing_edges(g, state);
        self.refresh_labels(g, state);
    }

    /// Push every state position into the canvas graph. Used after layout
    /// initialization so bootstrap documents keep their stored positions.
    pub fn sync_positions(&self, g: &mut CanvasGraph, state: &EditorState) {
        for record in state.nodes() {
            if let Some(index) = self.node_index(record.id) {
                if let Some(node) = g.node_mut(index) {
                    node.set_location(Pos2::new(record.position.x, record.position.y));
                }
            }
        }
    }

    fn remove_stale(&mut self, g: &mut CanvasGraph, state: &EditorState) {
        let live_edges: HashSet<EdgeId> = state.edges().iter().map(|e| e.id).collect();
        let stale_edges: Vec<(EdgeId, EdgeIndex)> = self
            .edge_to_index
            .iter()
            .filter(|(id, _)| !live_edges.contains(id))
            .map(|(&id, &index)| (id, index))
            .collect();
        for (id, index) in stale_edges {
            // Removing a node drops its incident canvas edges already;
            // only remove the ones still present.
            if g.edge(index).is_some() {
                g.remove_edge(index);
            }
            self.edge_to_index.remove(&id);
        }

        let stale_nodes: Vec<(NodeId, NodeIndex)> = self
            .node_to_index
            .iter()
            .filter(|(id, _)| state.node(**id).is_none())
            .map(|(&id, &index)| (id, index))
            .collect();
        for (id, index) in stale_nodes {
            g.remove_node(index);
            self.node_to_index.remove(&id);
            self.index_to_node.remove(&index);
        }
    }

    fn add_missing_nodes(&mut self, g: &mut CanvasGraph, state: &EditorState) {
        for record in state.nodes() {
            if self.node_to_index.contains_key(&record.id) {
                continue;
            }
            let index = g.add_node(record.id);
            if let Some(node) = g.node_mut(index) {
                node.set_label(record.label.clone());
                node.set_location(Pos2::new(record.position.x, record.position.y));
            }
            self.node_to_index.insert(record.id, index);
            self.index_to_node.insert(index, record.id);
        }
    }

    fn add_missing_edges(&mut self, g: &mut CanvasGraph, state: &EditorState) {
        for record in state.edges() {
            if self.edge_to_index.contains_key(&record.id) {
                continue;
            }
            let (Some(source), Some(target)) = (
                self.node_index(record.source),
                self.node_index(record.target),
            ) else {
                continue;
            };
            let index = g.add_edge(source, target, ());
            // Edge ids carry no information worth rendering.
            if let Some(edge) = g.edge_mut(index) {
                edge.set_label(String::new());
            }
            self.edge_to_index.insert(record.id, index);
        }
    }

    fn refresh_labels(&self, g: &mut CanvasGraph, state: &EditorState) {
        for record in state.nodes() {
            if let Some(index) = self.node_index(record.id) {
                if let Some(node) = g.node_mut(index) {
                    if node.label() != record.label {
                        node.set_label(record.label.clone());
                    }
                }
            }
        }
    }
}
