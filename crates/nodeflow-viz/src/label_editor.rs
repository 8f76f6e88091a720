//! Popup overlay for editing a single node's label.
//!
//! The overlay keeps a local draft, seeded from the node's current label
//! when it opens. The draft reaches the editor state only through the Save
//! action; Close (or clicking another node, which reseeds the overlay)
//! discards it.

use nodeflow_core::NodeId;

/// Outcome of showing the overlay for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelEditorAction {
    None,
    Save,
    Close,
}

/// The label popup with its node target and local draft.
#[derive(Debug, Clone)]
pub struct LabelEditor {
    node: NodeId,
    draft: String,
}

impl LabelEditor {
    /// Open the overlay for `node`, seeding the draft from its label.
    pub fn open(node: NodeId, current_label: &str) -> Self {
        Self {
            node,
            draft: current_label.to_owned(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Render the overlay and report which action, if any, was taken.
    pub fn show(&mut self, ctx: &egui::Context) -> LabelEditorAction {
        let mut action = LabelEditorAction::None;

        egui::Window::new(format!("Node {}", self.node))
            .id(egui::Id::new("label_editor"))
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.draft).hint_text("Enter node label"),
                );
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        action = LabelEditorAction::Save;
                    }
                    if ui.button("Close").clicked() {
                        action = LabelEditorAction::Close;
                    }
                });
            });

        action
    }
}
