//! # Voyager CLI
//!
//! Headless front end for Voyager documents.
//!
//! ## Usage
//!
//! ```bash
//! # Print the node tree, components and derivatives of a document
//! voyager inspect scene.svx.json
//!
//! # Show which derivative each model would display
//! voyager select scene.svx.json --quality Medium
//!
//! # Load every model, print scene events and the scene bounds
//! voyager load scene.svx.json --units cm
//!
//! # Load, resolve references and write the document back out
//! voyager save scene.svx.json -o out.svx.json
//!
//! # Write an example configuration file
//! voyager init-config voyager.toml
//! ```

mod fs_loader;
mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use voyager_core::config::EXAMPLE_CONFIG;
use voyager_core::{
    document_loader, events, DocumentLoader, Graph, Quality, StructuralValidator, UnitType,
    Usage, ViewerConfig,
};

use crate::fs_loader::FsAssetLoader;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "voyager")]
#[command(about = "Inspect, load and re-save Voyager 3D documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, env = "VOYAGER_CONFIG")]
    config: Option<PathBuf>,

    /// Target quality (Thumb, Low, Medium, High, Highest)
    #[arg(short, long, global = true)]
    quality: Option<Quality>,

    /// Usage bin (Web, Print, Editorial)
    #[arg(short, long, global = true)]
    usage: Option<Usage>,

    /// Display units (mm, cm, m, in, ft, yd)
    #[arg(long, global = true)]
    units: Option<UnitType>,

    /// Prefix for relative asset URIs
    #[arg(long, global = true)]
    asset_base: Option<String>,

    /// Skip document validation
    #[arg(long, global = true)]
    no_validate: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the node tree of a document without loading assets
    Inspect {
        /// Document path
        document: String,
    },

    /// Show the derivative selected for each model
    Select {
        /// Document path
        document: String,
    },

    /// Load every model and report scene events
    Load {
        /// Document path
        document: String,
    },

    /// Load a document and write it back out
    Save {
        /// Document path
        document: String,

        /// Output path, stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write an example configuration file
    InitConfig {
        /// Output path
        #[arg(default_value = "voyager.toml")]
        output: PathBuf,
    },
}

impl Cli {
    /// Config file values overridden by command line flags
    fn viewer_config(&self) -> ViewerConfig {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load_or_default(path),
            None => ViewerConfig::default(),
        };
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(usage) = self.usage {
            config.usage = usage;
        }
        if let Some(units) = self.units {
            config.global_units = units;
        }
        if let Some(base) = &self.asset_base {
            config.asset_base = Some(base.clone());
        }
        if self.no_validate {
            config.validate_documents = false;
        }
        config
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.viewer_config();
    info!(quality = %config.quality, usage = %config.usage, units = %config.global_units, "configuration");

    match &cli.command {
        Commands::Inspect { document } => {
            let graph = open(config, document).await?;
            report::print_tree(&graph);
        }
        Commands::Select { document } => {
            let quality = config.quality;
            let usage = config.usage;
            let graph = open(config, document).await?;
            select(&graph, usage, quality);
        }
        Commands::Load { document } => {
            load(config, document).await?;
        }
        Commands::Save { document, output } => {
            let graph = open(config, document).await?;
            let json = document_loader::save(&graph)?;
            let text = serde_json::to_string_pretty(&json)?;
            match output {
                Some(path) => {
                    std::fs::write(path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("{} {}", "Saved".green(), path.display());
                }
                None => println!("{}", text),
            }
        }
        Commands::InitConfig { output } => {
            if output.exists() {
                anyhow::bail!("{} already exists", output.display());
            }
            std::fs::write(output, EXAMPLE_CONFIG.trim_start())
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{} {}", "Created".green(), output.display());
        }
    }

    Ok(())
}

/// Fetch a document and resolve its references without loading models
async fn open(config: ViewerConfig, document: &str) -> Result<Graph> {
    let loader = FsAssetLoader::new();
    let documents = DocumentLoader::new(Arc::new(StructuralValidator), config);
    documents
        .load(&loader, document)
        .await
        .with_context(|| format!("Failed to load document {}", document))
}

fn select(graph: &Graph, usage: Usage, quality: Quality) {
    for id in graph.model_nodes() {
        let Some(model) = graph.model(id) else {
            continue;
        };
        let name = graph
            .node(id)
            .and_then(|n| n.name.as_deref())
            .unwrap_or("(unnamed)");
        match model.derivatives().select_key(usage, quality) {
            Some(key) => println!("{} {} -> {}", id, name.cyan(), key.to_string().green()),
            None => println!("{} {} -> {}", id, name.cyan(), "none".yellow()),
        }
    }
}

async fn load(config: ViewerConfig, document: &str) -> Result<()> {
    let loader = FsAssetLoader::new();
    let (tx, mut rx) = events::channel();
    let documents = DocumentLoader::new(Arc::new(StructuralValidator), config).with_events(tx);
    let mut graph = documents
        .load(&loader, document)
        .await
        .with_context(|| format!("Failed to load document {}", document))?;

    graph.activate_models(&loader).await;

    while let Ok(event) = rx.try_recv() {
        report::print_event(&event);
    }

    for id in graph.model_nodes() {
        if let Some(model) = graph.model(id) {
            if model.active_key().is_none() {
                warn!(node = %id, "model has no displayed derivative");
            }
        }
    }

    report::print_tree(&graph);
    match graph.scene_bounds() {
        Some(bounds) => println!("{} {}", "Scene bounds".bold(), report::format_bounds(&bounds)),
        None => println!("{}", "Scene is empty".yellow()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voyager.toml");
        std::fs::write(&path, "quality = \"Low\"\nusage = \"Print\"\n").unwrap();

        let cli = Cli::parse_from([
            "voyager",
            "select",
            "scene.json",
            "--config",
            path.to_str().unwrap(),
            "--quality",
            "highest",
            "--units",
            "cm",
            "--no-validate",
        ]);
        let config = cli.viewer_config();
        assert_eq!(config.quality, Quality::Highest);
        assert_eq!(config.usage, Usage::Print);
        assert_eq!(config.global_units, UnitType::Centimeters);
        assert!(!config.validate_documents);
    }

    #[test]
    fn test_init_config_parses() {
        let cli = Cli::parse_from(["voyager", "init-config"]);
        match cli.command {
            Commands::InitConfig { output } => assert_eq!(output, PathBuf::from("voyager.toml")),
            other => panic!("unexpected command {:?}", other),
        }
        let config: ViewerConfig = load_from_file(EXAMPLE_CONFIG);
        assert_eq!(config, ViewerConfig::default());
    }

    fn load_from_file(text: &str) -> ViewerConfig {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.toml");
        std::fs::write(&path, text).unwrap();
        ViewerConfig::load(&path).unwrap()
    }
}
