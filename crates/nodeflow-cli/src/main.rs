//! Nodeflow CLI - launch the node-graph editor.
//!
//! Run `nodeflow` to start an empty session, or `nodeflow edit graph.json`
//! to open a saved graph document.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use nodeflow_core::{EditorState, GraphDocument};
use nodeflow_viz::NodeflowApp;

/// Nodeflow - a minimal node-graph editor.
///
/// Run `nodeflow` or `nodeflow edit` to open the editor window.
#[derive(Parser, Debug)]
#[command(
    name = "nodeflow",
    author,
    version,
    about = "Nodeflow: create, connect, and rename graph nodes",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the editor (default command).
    Edit {
        /// Graph document to load (JSON). Starts empty when omitted.
        path: Option<PathBuf>,
    },

    /// Print a summary of a graph document without opening the editor.
    Inspect {
        /// Graph document to inspect (JSON).
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN // Default to less noise
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .init();

    // Default to edit if no command given
    let command = cli.command.unwrap_or(Commands::Edit { path: None });

    match command {
        Commands::Edit { path } => {
            let state = match path {
                Some(path) => EditorState::from_document(&load_document(&path)?),
                None => EditorState::new(),
            };
            run_editor(state)?;
        }

        Commands::Inspect { path } => {
            let document = load_document(&path)?;
            let state = EditorState::from_document(&document);

            println!("📄 {}", path.display());
            println!("{:─<50}", "");
            println!("Nodes: {}", state.node_count());
            println!("Edges: {}", state.edge_count());

            if state.node_count() > 0 {
                println!();
                for node in state.nodes() {
                    println!(
                        "   • {} \"{}\" at ({}, {})",
                        node.id, node.label, node.position.x, node.position.y
                    );
                }
            }
        }
    }

    Ok(())
}

/// Read and parse a graph document from disk.
fn load_document(path: &Path) -> Result<GraphDocument> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let document = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a valid graph document", path.display()))?;
    Ok(document)
}

/// Open the native editor window around an initial state.
fn run_editor(state: EditorState) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Nodeflow",
        options,
        Box::new(move |cc| Ok(Box::new(NodeflowApp::from_state(cc, state)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start editor: {e}"))
}
