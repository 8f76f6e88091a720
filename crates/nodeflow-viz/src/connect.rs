//! Drag-to-connect gesture recognition.
//!
//! Press on a node, drag past a small threshold, release over a node:
//! that completes a connection. The caller paints the preview segment and
//! turns the completed pair of canvas indices into an editor event.

use egui::{Pos2, PointerState};
use petgraph::stable_graph::NodeIndex;

use crate::mirror::CanvasGraph;

/// Minimum pointer travel before a press counts as a drag.
const DRAG_THRESHOLD: f32 = 2.0;

/// What the gesture produced this frame.
#[derive(Debug, Default)]
pub struct ConnectOutcome {
    /// Endpoints of the preview line while a drag is in flight.
    pub preview: Option<(Pos2, Pos2)>,
    /// `(source, target)` canvas indices of a completed connection.
    pub completed: Option<(NodeIndex, NodeIndex)>,
}

/// Press/drag/release state for the connect gesture.
#[derive(Debug, Default)]
pub struct ConnectGesture {
    from: Option<(NodeIndex, Pos2)>,
    started: bool,
}

impl ConnectGesture {
    /// Advance the gesture with this frame's pointer state.
    pub fn update(&mut self, g: &CanvasGraph, pointer: &PointerState) -> ConnectOutcome {
        let mut outcome = ConnectOutcome::default();

        // Arm on a press over a node.
        if pointer.primary_pressed() {
            if let (Some(hovered), Some(press_pos)) = (g.hovered_node(), pointer.interact_pos()) {
                self.from = Some((hovered, press_pos));
                self.started = false;
            }
        }

        // Promote to a drag once the pointer has moved enough.
        if pointer.primary_down()
            && self.from.is_some()
            && pointer.delta().length() > DRAG_THRESHOLD
        {
            self.started = true;
        }

        if self.started {
            if let Some((_, from_pos)) = self.from {
                outcome.preview = pointer.hover_pos().map(|to_pos| (from_pos, to_pos));
            }
        }

        // A release over a node completes the connection. Releasing over
        // the source node yields a self-loop; the state model permits it.
        if pointer.primary_released() {
            if let Some((source, _)) = self.from {
                if self.started {
                    if let Some(target) = g.hovered_node() {
                        outcome.completed = Some((source, target));
                    }
                }
            }
            self.reset();
        }

        outcome
    }

    /// Abandon any in-flight gesture (e.g. when leaving connect mode).
    pub fn reset(&mut self) {
        self.from = None;
        self.started = false;
    }
}
