//! Generate schema graph visualization
//!
//! Renders the registered SBOL entity types and their ownership structure in
//! both Mermaid and GraphViz DOT formats.

use anyhow::{Context, Result};
use sbol_domain_graph::schema::graph::{SchemaGraph, SchemaNodeKind, SchemaRelationship};
use sbol_domain_graph::SchemaRegistry;
use std::fs;
use std::path::Path;

fn main() -> Result<()> {
    println!("Analyzing SBOL schema...");

    let graph = SchemaGraph::from_registry(&SchemaRegistry::sbol());

    let output_dir = Path::new("schema-graphs");
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let mermaid_path = output_dir.join("schema-model.mmd");
    fs::write(&mermaid_path, graph.to_mermaid())
        .with_context(|| format!("writing {}", mermaid_path.display()))?;
    println!("Generated Mermaid diagram: {}", mermaid_path.display());

    let dot_path = output_dir.join("schema-model.dot");
    fs::write(&dot_path, graph.to_dot()).with_context(|| format!("writing {}", dot_path.display()))?;
    println!("Generated DOT diagram: {}", dot_path.display());

    let unreachable = graph.find_unreachable_types();
    if !unreachable.is_empty() {
        println!("\nWarning: {} types cannot be owned by any container:", unreachable.len());
        for node in unreachable {
            println!("  - {} <{}>", node.id, node.uri);
        }
    }

    let unsatisfied = graph.find_unsatisfied_capabilities();
    if !unsatisfied.is_empty() {
        println!("\nWarning: {} accepted capabilities have no implementing type:", unsatisfied.len());
        for node in unsatisfied {
            println!("  - {} <{}>", node.id, node.uri);
        }
    }

    let report_path = output_dir.join("schema-analysis.md");
    fs::write(&report_path, analysis_report(&graph))
        .with_context(|| format!("writing {}", report_path.display()))?;
    println!("\nGenerated analysis report: {}", report_path.display());

    println!("\nTo view the Mermaid diagram, paste the contents of {} into:", mermaid_path.display());
    println!("  https://mermaid.live/");
    println!("\nTo generate a PNG from the DOT file, run:");
    println!("  dot -Tpng {} -o schema-model.png", dot_path.display());

    Ok(())
}

fn analysis_report(graph: &SchemaGraph) -> String {
    let mut report = String::new();

    report.push_str("# SBOL Schema Report\n\n");
    report.push_str("| Kind | Count |\n");
    report.push_str("|------|-------|\n");
    for (label, kind) in [
        ("Top-level types", SchemaNodeKind::TopLevel),
        ("Owned types", SchemaNodeKind::Owned),
        ("Capabilities", SchemaNodeKind::Capability),
    ] {
        let count = graph.nodes.values().filter(|n| n.kind == kind).count();
        report.push_str(&format!("| {label} | {count} |\n"));
    }

    for node in graph.nodes.values().filter(|n| n.kind != SchemaNodeKind::Capability) {
        report.push_str(&format!("\n## {}\n\n`{}`\n\n", node.id, node.uri));

        if !node.fields.is_empty() {
            report.push_str("**Properties:**\n");
            for field in &node.fields {
                report.push_str(&format!("- {}: {} [{}]\n", field.name, field.kind, field.cardinality));
            }
            report.push('\n');
        }

        let contains: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.from == node.id && e.relationship == SchemaRelationship::Contains)
            .collect();
        if !contains.is_empty() {
            report.push_str("**Containers:**\n");
            for edge in contains {
                report.push_str(&format!("- {} -> {}\n", edge.label.as_deref().unwrap_or(""), edge.to));
            }
            report.push('\n');
        }
    }

    report
}
