use crate::{EquipmentId, EquipmentNode, EquipmentType};
use anyhow::{anyhow, Result};
use petgraph::algo::is_cyclic_directed;
use petgraph::prelude::*;
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};

/// Vertex payload for the hierarchy view.
#[derive(Debug, Clone)]
pub struct HierarchyVertex {
    pub id: EquipmentId,
    pub equipment_type: EquipmentType,
    pub label: String,
}

/// Directed parent → child view of a survey, for rendering and topology queries.
#[derive(Debug, Clone, Default)]
pub struct HierarchyGraph {
    pub graph: DiGraph<HierarchyVertex, ()>,
    index: HashMap<EquipmentId, NodeIndex>,
    /// (child, missing parent) links that could not become edges
    pub dangling: Vec<(EquipmentId, EquipmentId)>,
}

/// Summary numbers printed by `hierarchy validate`.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub root_count: usize,
    pub max_depth: u32,
    pub dangling_links: usize,
    pub has_cycle: bool,
}

/// Build the graph in input order; duplicate ids keep the first node.
pub fn build_hierarchy_graph(nodes: &[EquipmentNode]) -> HierarchyGraph {
    let mut hierarchy = HierarchyGraph::default();
    for node in nodes {
        if hierarchy.index.contains_key(&node.id) {
            continue;
        }
        let idx = hierarchy.graph.add_node(HierarchyVertex {
            id: node.id.clone(),
            equipment_type: node.equipment_type,
            label: node.label().to_string(),
        });
        hierarchy.index.insert(node.id.clone(), idx);
    }
    for node in nodes {
        let Some(parent_id) = &node.parent_id else {
            continue;
        };
        let child = hierarchy.index[&node.id];
        match hierarchy.index.get(parent_id) {
            Some(&parent) => {
                if hierarchy.graph.find_edge(parent, child).is_none() {
                    hierarchy.graph.add_edge(parent, child, ());
                }
            }
            None => hierarchy
                .dangling
                .push((node.id.clone(), parent_id.clone())),
        }
    }
    hierarchy
}

impl HierarchyGraph {
    pub fn node_index(&self, id: &EquipmentId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Vertices with no incoming edge, in insertion order.
    pub fn roots(&self) -> Vec<&HierarchyVertex> {
        self.graph
            .node_indices()
            .filter(|idx| {
                self.graph
                    .neighbors_directed(*idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| &self.graph[idx])
            .collect()
    }

    /// Direct children of `id`, in insertion order.
    pub fn children(&self, id: &EquipmentId) -> Vec<&HierarchyVertex> {
        let Some(idx) = self.node_index(id) else {
            return Vec::new();
        };
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort();
        children.into_iter().map(|c| &self.graph[c]).collect()
    }

    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    pub fn stats(&self) -> HierarchyStats {
        let depths = self.depths();
        HierarchyStats {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            root_count: self.roots().len(),
            max_depth: depths.values().copied().max().unwrap_or(0),
            dangling_links: self.dangling.len(),
            has_cycle: self.has_cycle(),
        }
    }

    /// Depth of every vertex reachable from a root. Vertices only reachable
    /// through a cycle are absent.
    pub fn depths(&self) -> HashMap<EquipmentId, u32> {
        let mut depths = HashMap::new();
        let mut queue: std::collections::VecDeque<(NodeIndex, u32)> = self
            .graph
            .node_indices()
            .filter(|idx| {
                self.graph
                    .neighbors_directed(*idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| (idx, 0))
            .collect();
        let mut seen = HashSet::new();
        while let Some((idx, depth)) = queue.pop_front() {
            if !seen.insert(idx) {
                continue;
            }
            depths.insert(self.graph[idx].id.clone(), depth);
            for child in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                queue.push_back((child, depth + 1));
            }
        }
        depths
    }

    /// Indented text tree, roots first, children in survey order.
    pub fn render_tree(&self) -> String {
        let mut buffer = String::new();
        let mut seen = HashSet::new();
        let roots: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|idx| {
                self.graph
                    .neighbors_directed(*idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();
        for root in roots {
            self.render_branch(root, 0, &mut seen, &mut buffer);
        }
        for idx in self.graph.node_indices() {
            if !seen.contains(&idx) {
                let vertex = &self.graph[idx];
                buffer.push_str(&format!(
                    "{} [{}] (cycle)\n",
                    vertex.label, vertex.equipment_type
                ));
            }
        }
        buffer
    }

    fn render_branch(
        &self,
        idx: NodeIndex,
        depth: usize,
        seen: &mut HashSet<NodeIndex>,
        buffer: &mut String,
    ) {
        if !seen.insert(idx) {
            return;
        }
        let vertex = &self.graph[idx];
        buffer.push_str(&format!(
            "{}{} [{}]\n",
            "  ".repeat(depth),
            vertex.label,
            vertex.equipment_type
        ));
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort();
        for child in children {
            self.render_branch(child, depth + 1, seen, buffer);
        }
    }
}

/// Recompute `hierarchy_level` by counting parent hops.
///
/// A dangling parent counts as one hop; a cycle stops the count at the
/// first repeated node.
pub fn assign_levels(nodes: &[EquipmentNode]) -> Vec<EquipmentNode> {
    let parents: HashMap<&EquipmentId, Option<&EquipmentId>> = nodes
        .iter()
        .map(|node| (&node.id, node.parent_id.as_ref()))
        .collect();
    nodes
        .iter()
        .map(|node| {
            let mut level = 0;
            let mut visited = HashSet::new();
            visited.insert(&node.id);
            let mut cursor = node.parent_id.as_ref();
            while let Some(parent) = cursor {
                level += 1;
                if !visited.insert(parent) {
                    break;
                }
                cursor = parents.get(parent).copied().flatten();
            }
            let mut node = node.clone();
            node.hierarchy_level = level;
            node
        })
        .collect()
}

/// Export the hierarchy to a DOT string (Graphviz).
pub fn export_graph(nodes: &[EquipmentNode], format: &str) -> Result<String> {
    match format.to_ascii_lowercase().as_str() {
        "graphviz" | "dot" => Ok(render_dot(&build_hierarchy_graph(nodes))),
        other => Err(anyhow!("unsupported graph export format '{other}'")),
    }
}

fn render_dot(hierarchy: &HierarchyGraph) -> String {
    let mut buffer = String::new();
    buffer.push_str("digraph mep_hierarchy {\n");
    for idx in hierarchy.graph.node_indices() {
        let vertex = &hierarchy.graph[idx];
        buffer.push_str(&format!(
            "  n{} [label=\"{}\\n{}\"];\n",
            idx.index(),
            sanitize_label(&vertex.label),
            vertex.equipment_type
        ));
    }
    for edge in hierarchy.graph.edge_references() {
        let source = edge.source().index();
        let target = edge.target().index();
        buffer.push_str(&format!("  n{source} -> n{target};\n"));
    }
    buffer.push('}');
    buffer
}

fn sanitize_label(label: &str) -> String {
    label.replace('"', "\\\"")
}
