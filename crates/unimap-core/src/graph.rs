use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::types::{DirectoryRecord, ProjectModel};

/// Node in the directory graph
#[derive(Debug, Clone)]
pub struct DirectoryNode {
    pub path: String,
    pub module_name: Option<String>,
    pub type_count: usize,
}

/// Directed graph of resolved directory dependencies.
///
/// An edge `a -> b` means `a` imports a namespace owned by `b`.
pub struct DirectoryGraph {
    graph: DiGraph<DirectoryNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DirectoryGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Build from a project whose dependencies have been resolved.
    pub fn from_project(project: &ProjectModel) -> Self {
        let mut graph = Self::new();
        for dir in &project.directories {
            graph.add_directory(dir);
        }
        for dir in &project.directories {
            for target in &dir.dependencies.referenced_directories {
                graph.add_dependency(&dir.path, target);
            }
        }
        graph
    }

    /// Add a directory as a node. Returns the node index.
    pub fn add_directory(&mut self, dir: &DirectoryRecord) -> NodeIndex {
        if let Some(&idx) = self.index.get(&dir.path) {
            return idx;
        }
        let node = DirectoryNode {
            path: dir.path.clone(),
            module_name: dir.module_name.clone(),
            type_count: dir.stats.type_count(),
        };
        let idx = self.graph.add_node(node);
        self.index.insert(dir.path.clone(), idx);
        idx
    }

    /// Ensure a path exists as a node (create a minimal node if needed).
    fn ensure_node(&mut self, path: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(path) {
            return idx;
        }
        let idx = self.graph.add_node(DirectoryNode {
            path: path.to_string(),
            module_name: None,
            type_count: 0,
        });
        self.index.insert(path.to_string(), idx);
        idx
    }

    /// Add a dependency edge, ignoring duplicates.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        if self.graph.find_edge(from_idx, to_idx).is_none() {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// All edges as `(from, to)` path pairs.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].path.as_str(),
                    self.graph[e.target()].path.as_str(),
                )
            })
            .collect()
    }

    /// Directories that depend on `path`, sorted.
    pub fn dependents_of(&self, path: &str) -> Vec<&str> {
        let Some(&idx) = self.index.get(path) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| self.graph[n].path.as_str())
            .collect();
        out.sort();
        out
    }

    /// Groups of directories that depend on each other in a cycle.
    /// Each group is sorted, and groups are ordered by their first path.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let sccs = petgraph::algo::kosaraju_scc(&self.graph);
        let mut cycles: Vec<Vec<String>> = sccs
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut paths: Vec<String> =
                    scc.iter().map(|&idx| self.graph[idx].path.clone()).collect();
                paths.sort();
                paths
            })
            .collect();
        cycles.sort();
        cycles
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Get all nodes
    pub fn nodes(&self) -> Vec<&DirectoryNode> {
        self.graph.node_weights().collect()
    }
}

impl Default for DirectoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DirectoryDependencies, DirectoryStats};

    fn make_dir(path: &str, refs: &[&str]) -> DirectoryRecord {
        DirectoryRecord {
            path: path.to_string(),
            module_name: None,
            files: vec![],
            stats: DirectoryStats::default(),
            dependencies: DirectoryDependencies {
                uses_namespaces: vec![],
                referenced_directories: refs.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    fn make_project(dirs: Vec<DirectoryRecord>) -> ProjectModel {
        let mut project = ProjectModel::new("Assets", "2026-01-01T00:00:00Z");
        project.directories = dirs;
        project
    }

    #[test]
    fn test_from_project() {
        let project = make_project(vec![
            make_dir("Core", &[]),
            make_dir("Gameplay", &["Core"]),
            make_dir("UI", &["Core", "Gameplay"]),
        ]);
        let graph = DirectoryGraph::from_project(&project);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.edges().contains(&("UI", "Gameplay")));
        assert_eq!(graph.dependents_of("Core"), vec!["Gameplay", "UI"]);
        assert!(graph.dependents_of("UI").is_empty());
        assert!(graph.dependents_of("Missing").is_empty());
    }

    #[test]
    fn test_find_cycles() {
        let project = make_project(vec![
            make_dir("A", &["B"]),
            make_dir("B", &["C"]),
            make_dir("C", &["A"]),
            make_dir("D", &["A"]),
        ]);
        let graph = DirectoryGraph::from_project(&project);
        let cycles = graph.find_cycles();
        assert_eq!(cycles, vec![vec!["A", "B", "C"]]);
    }

    #[test]
    fn test_acyclic_has_no_cycles() {
        let project = make_project(vec![make_dir("A", &["B"]), make_dir("B", &[])]);
        assert!(DirectoryGraph::from_project(&project).find_cycles().is_empty());
    }

    #[test]
    fn test_no_duplicate_nodes_or_edges() {
        let mut graph = DirectoryGraph::new();
        let dir = make_dir("A", &[]);
        graph.add_directory(&dir);
        graph.add_directory(&dir);
        graph.add_dependency("A", "B");
        graph.add_dependency("A", "B");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }
}
