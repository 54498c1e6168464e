// Copyright 2026 The Nodegraph Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Structural mutations on a [`Graph`].  All index remapping invariants
//! live here: any operation that compacts the node arena fixes up links
//! and group membership before returning.

use rand::Rng;
use rand::rngs::StdRng;

use crate::datamodel::{Graph, Link, Node};

/// Attributes for a node being created; anything left `None` gets the
/// documented default.
#[derive(Clone, Default, Debug)]
pub struct NodeAttrs {
    pub label: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

/// Smallest free id of the form `n<k>` with `k >= nodes.len()`.  Starting
/// the scan at the arena length makes the common append case O(1) while
/// still never colliding with ids freed by deletion.
pub fn gen_node_id(graph: &Graph) -> String {
    let mut k = graph.nodes.len();
    loop {
        let id = format!("n{k}");
        if graph.node_index(&id).is_none() {
            return id;
        }
        k += 1;
    }
}

/// Add a node to the graph, returning its id.  If `link_to_id` resolves,
/// the new node is placed near that node with a random offset and a link
/// from it to the new node is created; an unresolvable `link_to_id` still
/// creates the node, just unplaced and unlinked.
pub fn add_node(
    graph: &mut Graph,
    link_to_id: Option<&str>,
    attrs: NodeAttrs,
    rng: &mut StdRng,
) -> String {
    let id = gen_node_id(graph);
    let label = attrs.label.unwrap_or_else(|| id.clone());
    let mut node = Node::new(id.clone(), label);
    node.x = attrs.x;
    node.y = attrs.y;

    let source = link_to_id.and_then(|lid| graph.node_index(lid));
    if let Some(source) = source {
        // random placement only when the caller supplied neither
        // coordinate; a partial position is left as-is for the solver
        if node.x.is_none() && node.y.is_none() {
            let anchor = &graph.nodes[source];
            if let (Some(ax), Some(ay)) = (anchor.x, anchor.y) {
                node.x = Some(ax + rng.random_range(-50.0..50.0));
                node.y = Some(ay + rng.random_range(-50.0..50.0));
            }
        }
    }

    graph.nodes.push(node);
    if let Some(source) = source {
        graph.links.push(Link {
            source,
            target: graph.nodes.len() - 1,
        });
    }

    id
}

/// Delete a node and everything referencing it.  Links touching the node
/// go first, then the arena is compacted and every surviving link and
/// group membership is remapped to the shifted indices.  Returns false if
/// the id does not resolve.
pub fn delete_node(graph: &mut Graph, id: &str) -> bool {
    let Some(idx) = graph.node_index(id) else {
        return false;
    };

    graph.links.retain(|l| l.source != idx && l.target != idx);
    graph.nodes.remove(idx);

    let remap = |i: usize| if i > idx { i - 1 } else { i };
    for link in graph.links.iter_mut() {
        link.source = remap(link.source);
        link.target = remap(link.target);
    }
    for group in graph.groups.iter_mut() {
        group.leaves.retain(|&leaf| leaf != idx);
        for leaf in group.leaves.iter_mut() {
            *leaf = remap(*leaf);
        }
    }
    graph.groups.retain(|g| !g.leaves.is_empty());

    if graph.selected_node_id.as_deref() == Some(id) {
        graph.selected_node_id = None;
    }

    true
}

/// Add a directed link between two existing nodes.  Returns false without
/// modifying the graph when either id is unresolvable or an identical link
/// already exists.  The reverse link is a distinct edge and does not count
/// as a duplicate; self-links are allowed, the solver treats them as
/// inert.
pub fn add_link(graph: &mut Graph, source_id: &str, target_id: &str) -> bool {
    let (Some(source), Some(target)) = (graph.node_index(source_id), graph.node_index(target_id))
    else {
        return false;
    };
    if graph
        .links
        .iter()
        .any(|l| l.source == source && l.target == target)
    {
        return false;
    }
    graph.links.push(Link { source, target });
    true
}

/// Remove every link from `source_id` to `target_id`.  Returns the number
/// of links removed.
pub fn delete_link(graph: &mut Graph, source_id: &str, target_id: &str) -> usize {
    let (Some(source), Some(target)) = (graph.node_index(source_id), graph.node_index(target_id))
    else {
        return 0;
    };
    let before = graph.links.len();
    graph
        .links
        .retain(|l| !(l.source == source && l.target == target));
    before - graph.links.len()
}

/// Reverse a link's direction in place, keeping its position in the link
/// list stable so z-order and iteration order are untouched.
pub fn revert_link(graph: &mut Graph, index: usize) -> bool {
    let Some(link) = graph.links.get_mut(index) else {
        return false;
    };
    std::mem::swap(&mut link.source, &mut link.target);
    true
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::datamodel::Group;

    fn test_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn graph_with_nodes(n: usize) -> Graph {
        let mut graph = Graph::new();
        for i in 0..n {
            let mut node = Node::new(format!("n{i}"), format!("n{i}"));
            node.x = Some(i as f64 * 100.0);
            node.y = Some(0.0);
            graph.nodes.push(node);
        }
        graph
    }

    #[test]
    fn test_gen_node_id_skips_taken() {
        let mut graph = graph_with_nodes(2);
        assert_eq!(gen_node_id(&graph), "n2");

        // delete n0; arena has 1 node but "n1" is still taken
        assert!(delete_node(&mut graph, "n0"));
        assert_eq!(gen_node_id(&graph), "n2");
    }

    #[test]
    fn test_add_node_near_anchor() {
        let mut graph = graph_with_nodes(1);
        let mut rng = test_rng();

        let id = add_node(&mut graph, Some("n0"), NodeAttrs::default(), &mut rng);
        assert_eq!(id, "n1");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.links[0], Link { source: 0, target: 1 });

        let node = graph.get_node("n1").unwrap();
        let dx = node.x.unwrap() - 0.0;
        let dy = node.y.unwrap() - 0.0;
        assert!(dx.abs() < 50.0, "x offset within ±50: {dx}");
        assert!(dy.abs() < 50.0, "y offset within ±50: {dy}");
    }

    #[test]
    fn test_add_node_unresolvable_anchor() {
        let mut graph = graph_with_nodes(1);
        let mut rng = test_rng();

        let id = add_node(&mut graph, Some("nope"), NodeAttrs::default(), &mut rng);
        assert_eq!(id, "n1");
        assert!(graph.links.is_empty());
        assert!(graph.get_node("n1").unwrap().x.is_none());
    }

    #[test]
    fn test_add_node_explicit_position_wins() {
        let mut graph = graph_with_nodes(1);
        let mut rng = test_rng();

        let attrs = NodeAttrs {
            label: Some("hub".to_string()),
            x: Some(7.0),
            y: Some(9.0),
        };
        let id = add_node(&mut graph, Some("n0"), attrs, &mut rng);
        let node = graph.get_node(&id).unwrap();
        assert_eq!(node.label, "hub");
        assert_eq!(node.x, Some(7.0));
        assert_eq!(node.y, Some(9.0));
        // still links to the anchor
        assert_eq!(graph.links.len(), 1);
    }

    #[test]
    fn test_add_node_partial_position_is_kept() {
        let mut graph = graph_with_nodes(1);
        let mut rng = test_rng();

        let attrs = NodeAttrs {
            label: None,
            x: Some(7.0),
            y: None,
        };
        let id = add_node(&mut graph, Some("n0"), attrs, &mut rng);
        let node = graph.get_node(&id).unwrap();
        assert_eq!(node.x, Some(7.0), "supplied coordinate must survive");
        assert_eq!(node.y, None);
    }

    #[test]
    fn test_delete_node_remaps_links_and_groups() {
        let mut graph = graph_with_nodes(4);
        graph.links.push(Link { source: 0, target: 1 });
        graph.links.push(Link { source: 1, target: 2 });
        graph.links.push(Link { source: 2, target: 3 });
        graph.groups.push(Group {
            leaves: vec![1, 3],
            style: String::new(),
            padding: 10.0,
        });
        graph.groups.push(Group {
            leaves: vec![1],
            style: String::new(),
            padding: 10.0,
        });
        graph.selected_node_id = Some("n1".to_string());

        assert!(delete_node(&mut graph, "n1"));
        assert_eq!(graph.nodes.len(), 3);
        // both links touching n1 are gone; the survivor is remapped
        assert_eq!(graph.links, vec![Link { source: 1, target: 2 }]);
        assert_eq!(
            graph.link_endpoint_ids(&graph.links[0]),
            Some(("n2", "n3"))
        );
        // group membership compacted; emptied group dropped
        assert_eq!(graph.groups.len(), 1);
        assert_eq!(graph.groups[0].leaves, vec![2]);
        assert_eq!(graph.selected_node_id, None);

        assert!(!delete_node(&mut graph, "n1"));
    }

    #[test]
    fn test_add_link_rules() {
        let mut graph = graph_with_nodes(2);

        assert!(add_link(&mut graph, "n0", "n1"));
        // duplicate
        assert!(!add_link(&mut graph, "n0", "n1"));
        // reverse is a distinct edge
        assert!(add_link(&mut graph, "n1", "n0"));
        // self link is legal, once
        assert!(add_link(&mut graph, "n0", "n0"));
        assert!(!add_link(&mut graph, "n0", "n0"));
        // unresolvable
        assert!(!add_link(&mut graph, "n0", "n7"));
        assert_eq!(graph.links.len(), 3);
        assert_eq!(graph.links[2], Link { source: 0, target: 0 });
    }

    #[test]
    fn test_delete_link_removes_all_matching() {
        let mut graph = graph_with_nodes(2);
        graph.links.push(Link { source: 0, target: 1 });
        graph.links.push(Link { source: 0, target: 1 });
        graph.links.push(Link { source: 1, target: 0 });

        assert_eq!(delete_link(&mut graph, "n0", "n1"), 2);
        // the reverse link survives
        assert_eq!(graph.links, vec![Link { source: 1, target: 0 }]);
        assert_eq!(delete_link(&mut graph, "n0", "n9"), 0);
    }

    #[test]
    fn test_revert_link_in_place() {
        let mut graph = graph_with_nodes(3);
        graph.links.push(Link { source: 0, target: 1 });
        graph.links.push(Link { source: 1, target: 2 });

        assert!(revert_link(&mut graph, 1));
        assert_eq!(graph.links[0], Link { source: 0, target: 1 });
        assert_eq!(graph.links[1], Link { source: 2, target: 1 });
        assert!(!revert_link(&mut graph, 5));
    }
}
