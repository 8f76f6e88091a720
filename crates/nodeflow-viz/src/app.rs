//! Main application state and event wiring.

use eframe::{App, CreationContext};
use egui::{CollapsingHeader, Context, ScrollArea};
use egui_graphs::GraphView;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};

use nodeflow_core::{EditorEvent, EditorState, NodeId, Position, GRID_CELL};

use crate::connect::ConnectGesture;
use crate::label_editor::{LabelEditor, LabelEditorAction};
use crate::mirror::{CanvasGraph, GraphMirror};
use crate::settings::{SettingsInteraction, SettingsNavigation, SettingsStyle};

/// The node-graph editor application.
///
/// Owns the canonical [`EditorState`] and a canvas mirror of it; every
/// pointer gesture is translated into an [`EditorEvent`] and applied to the
/// state, then the mirror reconciles the canvas graph.
pub struct NodeflowApp {
    /// Canonical node/edge records and transient UI state.
    state: EditorState,
    /// The egui_graphs render mirror.
    g: CanvasGraph,
    /// Id/index bookkeeping between state and canvas.
    mirror: GraphMirror,
    /// Interaction settings
    settings_interaction: SettingsInteraction,
    /// Navigation settings
    settings_navigation: SettingsNavigation,
    /// Style settings
    settings_style: SettingsStyle,
    /// Whether to show the sidebar
    show_sidebar: bool,
    /// Current dark mode state
    dark_mode: bool,
    /// The label popup overlay, when open.
    label_editor: Option<LabelEditor>,
    /// Drag-to-connect gesture state (Ctrl held).
    connect: ConnectGesture,
    /// Canvas node currently being dragged, if any.
    dragging: Option<NodeIndex>,
    /// One-shot position push after the first layout pass.
    restore_positions: bool,
}

impl NodeflowApp {
    /// Create a new app. In the browser an embedded bootstrap document is
    /// loaded when present; otherwise the session starts empty.
    pub fn new(cc: &CreationContext<'_>) -> Self {
        Self::from_state(cc, Self::load_or_default())
    }

    /// Create an app around an existing editor state.
    pub fn from_state(cc: &CreationContext<'_>, state: EditorState) -> Self {
        let mut g = CanvasGraph::from(&StableDiGraph::default());
        let mut mirror = GraphMirror::new();
        mirror.reconcile(&mut g, &state);

        let dark_mode = cc.egui_ctx.style().visuals.dark_mode;

        Self {
            state,
            g,
            mirror,
            settings_interaction: SettingsInteraction::default(),
            settings_navigation: SettingsNavigation::default(),
            settings_style: SettingsStyle::default(),
            show_sidebar: true,
            dark_mode,
            label_editor: None,
            connect: ConnectGesture::default(),
            dragging: None,
            restore_positions: true,
        }
    }

    fn load_or_default() -> EditorState {
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(doc) = Self::try_load_from_window() {
                return EditorState::from_document(&doc);
            }
        }
        EditorState::new()
    }

    #[cfg(target_arch = "wasm32")]
    fn try_load_from_window() -> Option<nodeflow_core::GraphDocument> {
        let window = web_sys::window()?;
        let data = js_sys::Reflect::get(&window, &"NODEFLOW_DOCUMENT".into()).ok()?;
        let json = data.as_string()?;
        serde_json::from_str(&json).ok()
    }
}

// =============================================================================
// Sidebar Panel UI
// =============================================================================

impl NodeflowApp {
    fn info_icon(ui: &mut egui::Ui, tip: &str) {
        ui.add_space(4.0);
        ui.small_button("ℹ").on_hover_text(tip);
    }

    fn ui_info(&self, ui: &mut egui::Ui) {
        CollapsingHeader::new("Graph Info")
            .default_open(true)
            .show(ui, |ui| {
                ui.label(format!("Nodes: {}", self.state.node_count()));
                ui.label(format!("Edges: {}", self.state.edge_count()));
            });
    }

    fn ui_nodes(&mut self, ui: &mut egui::Ui) {
        CollapsingHeader::new("Nodes")
            .default_open(true)
            .show(ui, |ui| {
                if ui.button("➕ Create node").clicked() {
                    self.state.apply(EditorEvent::CreateNode);
                }

                ui.separator();

                let nodes: Vec<(NodeId, String)> = self
                    .state
                    .nodes()
                    .iter()
                    .map(|n| (n.id, n.label.clone()))
                    .collect();

                ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                    for (id, label) in nodes {
                        ui.horizontal(|ui| {
                            let text = if label.is_empty() {
                                format!("({})", id)
                            } else {
                                label
                            };
                            ui.label(text);
                            if ui
                                .small_button("🗑")
                                .on_hover_text("Delete node")
                                .clicked()
                            {
                                self.state.apply(EditorEvent::DeleteNode(id));
                            }
                        });
                    }
                });
            });
    }

    fn ui_interaction(&mut self, ui: &mut egui::Ui) {
        CollapsingHeader::new("Interaction").show(ui, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .checkbox(
                        &mut self.settings_interaction.dragging_enabled,
                        "dragging_enabled",
                    )
                    .clicked()
                    && self.settings_interaction.dragging_enabled
                {
                    self.settings_interaction.hover_enabled = true;
                }
                Self::info_icon(ui, "Drag nodes to reposition (snaps to the grid)");
            });

            ui.horizontal(|ui| {
                ui.checkbox(
                    &mut self.settings_interaction.hover_enabled,
                    "hover_enabled",
                );
            });
        });
    }

    fn ui_navigation(&mut self, ui: &mut egui::Ui) {
        CollapsingHeader::new("Navigation").show(ui, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .checkbox(
                        &mut self.settings_navigation.fit_to_screen_enabled,
                        "fit_to_screen",
                    )
                    .clicked()
                {
                    self.settings_navigation.zoom_and_pan_enabled =
                        !self.settings_navigation.zoom_and_pan_enabled;
                }
                Self::info_icon(ui, "Auto-fit graph to viewport");
            });

            ui.horizontal(|ui| {
                if ui
                    .checkbox(
                        &mut self.settings_navigation.zoom_and_pan_enabled,
                        "zoom_and_pan",
                    )
                    .clicked()
                {
                    self.settings_navigation.fit_to_screen_enabled =
                        !self.settings_navigation.fit_to_screen_enabled;
                }
                Self::info_icon(ui, "Manual zoom and pan");
            });

            ui.add_enabled_ui(self.settings_navigation.zoom_and_pan_enabled, |ui| {
                ui.horizontal(|ui| {
                    ui.add(
                        egui::Slider::new(&mut self.settings_navigation.zoom_speed, 0.01..=2.0)
                            .text("zoom_speed"),
                    );
                });
            });
        });
    }

    fn ui_style(&mut self, ui: &mut egui::Ui) {
        CollapsingHeader::new("Style").show(ui, |ui| {
            ui.horizontal(|ui| {
                let mut dark = ui.ctx().style().visuals.dark_mode;
                if ui.checkbox(&mut dark, "dark mode").changed() {
                    if dark {
                        ui.ctx().set_visuals(egui::Visuals::dark());
                    } else {
                        ui.ctx().set_visuals(egui::Visuals::light());
                    }
                    self.dark_mode = dark;
                }
            });

            ui.horizontal(|ui| {
                ui.checkbox(&mut self.settings_style.labels_always, "Always show labels");
                Self::info_icon(ui, "Show node labels always vs on hover");
            });
        });
    }
}

// =============================================================================
// Canvas event wiring
// =============================================================================

impl NodeflowApp {
    /// Map hover changes reported by the canvas into state transitions.
    /// Transitions are also surfaced through tracing for diagnostics.
    fn sync_hover(&mut self) {
        let current = self.g.hovered_node().and_then(|idx| self.mirror.node_id(idx));
        if current == self.state.hovered() {
            return;
        }

        if let Some(left) = self.state.hovered() {
            tracing::debug!(node = %left, "hover leave");
            self.state.apply(EditorEvent::HoverLeft);
        }
        if let Some(entered) = current {
            tracing::debug!(node = %entered, "hover enter");
            self.state.apply(EditorEvent::HoverEntered(entered));
        }
    }

    /// Detect the end of a canvas drag and commit the snapped position.
    /// Returns true when a drag ended this frame.
    fn sync_drag(&mut self) -> bool {
        let current = self
            .g
            .nodes_iter()
            .find(|(_, node)| node.dragged())
            .map(|(idx, _)| idx);

        let ended = match (self.dragging, current) {
            (Some(prev), cur) if cur != Some(prev) => Some(prev),
            _ => None,
        };
        self.dragging = current;

        let Some(index) = ended else {
            return false;
        };
        let Some(id) = self.mirror.node_id(index) else {
            return true;
        };

        if let Some(node) = self.g.node(index) {
            let location = node.location();
            let snapped = Position::new(location.x, location.y).snapped(GRID_CELL);
            if let Some(node) = self.g.node_mut(index) {
                node.set_location(egui::Pos2::new(snapped.x, snapped.y));
            }
            tracing::debug!(node = %id, x = snapped.x, y = snapped.y, "drag stop");
            self.state.apply(EditorEvent::NodeDragStopped {
                id,
                position: snapped,
            });
        }
        true
    }

    /// Open (or retarget) the label popup for a clicked node.
    fn open_label_editor(&mut self, id: NodeId) {
        let Some(label) = self.state.node(id).map(|n| n.label.clone()) else {
            return;
        };
        self.state.apply(EditorEvent::NodeClicked(id));
        self.label_editor = Some(LabelEditor::open(id, &label));
    }

    /// Render the label popup and apply its outcome.
    fn show_label_editor(&mut self, ctx: &Context) {
        // Drop the overlay if its target vanished (e.g. sidebar delete).
        if let Some(editor) = &self.label_editor {
            if self.state.node(editor.node()).is_none() {
                self.label_editor = None;
                self.state.apply(EditorEvent::PopupClosed);
                return;
            }
        }

        let mut outcome = None;
        if let Some(editor) = self.label_editor.as_mut() {
            let action = editor.show(ctx);
            if action != LabelEditorAction::None {
                outcome = Some((action, editor.node(), editor.draft().to_owned()));
            }
        }

        match outcome {
            Some((LabelEditorAction::Save, id, draft)) => {
                self.state.apply(EditorEvent::LabelSaved { id, label: draft });
                self.label_editor = None;
            }
            Some((LabelEditorAction::Close, id, _)) => {
                tracing::debug!(node = %id, "label edit discarded");
                self.state.apply(EditorEvent::PopupClosed);
                self.label_editor = None;
            }
            _ => {}
        }
    }
}

// =============================================================================
// Main Update Loop
// =============================================================================

impl App for NodeflowApp {
    fn update(&mut self, ctx: &Context, _: &mut eframe::Frame) {
        ctx.input(|i| {
            if i.key_pressed(egui::Key::Tab) {
                self.show_sidebar = !self.show_sidebar;
            }
        });

        let connect_mode = ctx.input(|i| i.modifiers.ctrl);

        if self.show_sidebar {
            egui::SidePanel::right("right_panel")
                .default_width(260.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        ui.heading("Nodeflow");
                        ui.separator();

                        self.ui_info(ui);
                        ui.separator();

                        self.ui_nodes(ui);
                        ui.separator();

                        self.ui_interaction(ui);
                        ui.separator();

                        self.ui_navigation(ui);
                        ui.separator();

                        self.ui_style(ui);
                    });
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.mirror.reconcile(&mut self.g, &self.state);

            // Canvas dragging would fight the connect gesture.
            let effective_dragging =
                !connect_mode && self.settings_interaction.dragging_enabled;

            let settings_interaction = egui_graphs::SettingsInteraction::new()
                .with_dragging_enabled(effective_dragging)
                .with_hover_enabled(self.settings_interaction.hover_enabled)
                .with_node_clicking_enabled(self.settings_interaction.node_clicking_enabled);

            let settings_navigation = egui_graphs::SettingsNavigation::new()
                .with_fit_to_screen_enabled(self.settings_navigation.fit_to_screen_enabled)
                .with_zoom_and_pan_enabled(self.settings_navigation.zoom_and_pan_enabled)
                .with_zoom_speed(self.settings_navigation.zoom_speed)
                .with_fit_to_screen_padding(self.settings_navigation.fit_to_screen_padding);

            let settings_style = egui_graphs::SettingsStyle::new()
                .with_labels_always(self.settings_style.labels_always)
                .with_node_stroke_hook(move |_selected, dragged, _color, stroke, _style| {
                    if dragged {
                        egui::Stroke::new(2.0, egui::Color32::from_rgb(255, 200, 0))
                    } else {
                        stroke
                    }
                });

            ui.add(
                &mut GraphView::<_, _, _, _, _, _, egui_graphs::LayoutStateRandom, egui_graphs::LayoutRandom>::new(&mut self.g)
                    .with_interactions(&settings_interaction)
                    .with_navigations(&settings_navigation)
                    .with_styles(&settings_style),
            );

            // Bootstrap documents carry positions; push them once the first
            // layout pass has run.
            if self.restore_positions {
                self.mirror.sync_positions(&mut self.g, &self.state);
                self.restore_positions = false;
            }

            self.sync_hover();

            let pointer = ui.input(|i| i.pointer.clone());

            if connect_mode {
                self.dragging = None;
                ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);

                let outcome = self.connect.update(&self.g, &pointer);
                if let Some((from_pos, to_pos)) = outcome.preview {
                    ui.painter().line_segment(
                        [from_pos, to_pos],
                        egui::Stroke::new(2.0, egui::Color32::from_rgb(100, 100, 255)),
                    );
                }
                if let Some((source, target)) = outcome.completed {
                    if let (Some(source), Some(target)) = (
                        self.mirror.node_id(source),
                        self.mirror.node_id(target),
                    ) {
                        tracing::debug!(%source, %target, "connect");
                        self.state.apply(EditorEvent::Connect { source, target });
                    }
                }
            } else {
                self.connect.reset();

                let drag_ended = self.sync_drag();

                if !drag_ended && self.dragging.is_none() && pointer.primary_clicked() {
                    if let Some(id) =
                        self.g.hovered_node().and_then(|idx| self.mirror.node_id(idx))
                    {
                        self.open_label_editor(id);
                    }
                }
            }

            ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                let hint = if connect_mode {
                    "Connect mode: drag from one node to another"
                } else {
                    "Hold Ctrl to connect nodes · click a node to rename it"
                };
                ui.label(egui::RichText::new(hint).small().color(egui::Color32::GRAY));
            });
        });

        self.show_label_editor(ctx);
    }
}
