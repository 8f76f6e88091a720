//! WASM-compatible egui node-graph editor.
//!
//! This crate provides the editor UI, which can run:
//! - Natively (via eframe)
//! - In the browser (via WASM)

mod app;
mod connect;
mod label_editor;
mod mirror;
mod settings;

pub use app::NodeflowApp;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Start the editor in a WASM context. Expects a canvas element with the id
/// `nodeflow-canvas`; a bootstrap document may be supplied by setting
/// `window.NODEFLOW_DOCUMENT` to a JSON string before loading the module.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    // Better panic messages in the browser console
    console_error_panic_hook::set_once();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let canvas = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("nodeflow-canvas"))
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
            .expect("no canvas element with id 'nodeflow-canvas'");

        eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(NodeflowApp::new(cc)))),
            )
            .await
            .expect("Failed to start eframe");
    });
}
