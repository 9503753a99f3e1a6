//! Terminal rendering of graphs, models and events

use colored::Colorize;
use voyager_core::graph::ComponentRef;
use voyager_core::{BoundingBox, Graph, ModelComponent, ModelState, NodeId, SceneEvent};

pub fn print_tree(graph: &Graph) {
    println!(
        "{} {} nodes, {} models, units {}",
        "Graph".bold(),
        graph.len(),
        graph.model_nodes().len(),
        graph.scene_units()
    );
    print_node(graph, graph.root(), 0);
}

fn print_node(graph: &Graph, id: NodeId, depth: usize) {
    let Some(node) = graph.node(id) else {
        return;
    };
    let indent = "  ".repeat(depth);
    let name = node.name.as_deref().unwrap_or("(unnamed)");
    let components: Vec<&str> = node.components.iter().map(|c| c.type_name()).collect();
    println!(
        "{}{} {} [{}]",
        indent,
        id.to_string().dimmed(),
        name.cyan(),
        components.join(", ")
    );

    for component in node.components.iter() {
        match component {
            ComponentRef::Model(model) => print_model(model, depth + 1),
            ComponentRef::Reference(reference) => {
                let status = if reference.resolved {
                    "resolved".green()
                } else {
                    "unresolved".yellow()
                };
                println!("{}  -> {} ({})", indent, reference.uri, status);
            }
            _ => {}
        }
    }

    for child in graph.children(id) {
        print_node(graph, *child, depth + 1);
    }
}

pub fn print_model(model: &ModelComponent, depth: usize) {
    let indent = "  ".repeat(depth);
    let state = match model.state() {
        ModelState::Displayed => "displayed".green(),
        ModelState::Loading => "loading".yellow(),
        ModelState::Empty => "empty".dimmed(),
    };
    println!(
        "{}model {} units {} -> {} (x{}) {}",
        indent,
        model.id().to_string().dimmed(),
        model.local_units(),
        model.global_units(),
        model.unit_scale(),
        state
    );
    for derivative in model.derivatives().iter() {
        let marker = if model.active_key() == Some(derivative.key()) { "*" } else { " " };
        let uris: Vec<&str> = derivative.assets().iter().map(|a| a.uri.as_str()).collect();
        println!("{}  {} {} {}", indent, marker.green(), derivative.key(), uris.join(" "));
    }
    if let Some(bounds) = model.world_bounding_box() {
        println!("{}  bounds {}", indent, format_bounds(&bounds));
    }
}

pub fn print_event(event: &SceneEvent) {
    match event {
        SceneEvent::DerivativeChanged { model, usage, quality } => {
            println!("{} {} {}/{}", "derivative".blue(), model, usage, quality);
        }
        SceneEvent::BoundingBoxChanged { model, bounds } => {
            println!("{} {} {}", "bounds".blue(), model, format_bounds(bounds));
        }
    }
}

pub fn format_bounds(bounds: &BoundingBox) -> String {
    let (min, max) = (bounds.min, bounds.max);
    format!(
        "[{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]",
        min.x, min.y, min.z, max.x, max.y, max.z
    )
}
