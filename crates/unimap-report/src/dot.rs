use std::collections::HashMap;

use unimap_core::graph::DirectoryGraph;
use unimap_core::types::ProjectModel;

/// Generate a GraphViz DOT diagram of directories and their dependencies.
///
/// Assembly-defined directories are drawn with a double border. Edges between
/// directories that sit in the same cycle are drawn red.
pub fn generate_directory_diagram(project: &ProjectModel) -> String {
    let graph = DirectoryGraph::from_project(project);

    let mut cycle_of = HashMap::new();
    for (i, cycle) in graph.find_cycles().into_iter().enumerate() {
        for path in cycle {
            cycle_of.insert(path, i);
        }
    }

    let mut out = String::new();
    out.push_str("digraph directories {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, style=filled, fillcolor=white];\n\n");

    for node in graph.nodes() {
        let id = sanitize_dot_id(&node.path);
        let mut label = escape_label(&node.path);
        if let Some(module) = &node.module_name {
            label.push_str(&format!("\\n[{}]", escape_label(module)));
        }
        label.push_str(&format!("\\n{} types", node.type_count));
        if node.module_name.is_some() {
            out.push_str(&format!("  {id} [label=\"{label}\", peripheries=2];\n"));
        } else {
            out.push_str(&format!("  {id} [label=\"{label}\"];\n"));
        }
    }
    out.push('\n');

    for (from, to) in graph.edges() {
        let in_cycle = matches!(
            (cycle_of.get(from), cycle_of.get(to)),
            (Some(a), Some(b)) if a == b
        );
        let (from, to) = (sanitize_dot_id(from), sanitize_dot_id(to));
        if in_cycle {
            out.push_str(&format!("  {from} -> {to} [color=red, style=bold];\n"));
        } else {
            out.push_str(&format!("  {from} -> {to};\n"));
        }
    }

    out.push_str("}\n");
    out
}

fn escape_label(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Sanitize a string to be a valid DOT node ID.
fn sanitize_dot_id(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    // DOT IDs must start with a letter or underscore
    if cleaned.is_empty() || cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        format!("n_{cleaned}")
    } else {
        cleaned
    }
}
