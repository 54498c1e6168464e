// Copyright 2026 The Nodegraph Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! End-to-end behavior of graph mutation, layout convergence and the
//! editor host, driven through the public API only.

use rand::SeedableRng;
use rand::rngs::StdRng;

use nodegraph_engine::datamodel::{Graph, LayoutOptions, LayoutType, Node};
use nodegraph_engine::editor::GraphEditor;
use nodegraph_engine::layout::LayoutEngine;
use nodegraph_engine::ops::{self, NodeAttrs};
use nodegraph_engine::scheduler::TICK_INTERVAL_MS;

fn run_frames(editor: &mut GraphEditor, limit: usize) {
    for i in 0..limit {
        editor.frame(i as f64 * TICK_INTERVAL_MS);
        if editor.is_settled() {
            return;
        }
    }
    panic!("layout did not settle within {limit} frames");
}

fn chain_graph(n: usize) -> Graph {
    let mut graph = Graph::new();
    let mut rng = StdRng::seed_from_u64(1);
    let mut prev: Option<String> = None;
    for _ in 0..n {
        let id = ops::add_node(&mut graph, prev.as_deref(), NodeAttrs::default(), &mut rng);
        prev = Some(id);
    }
    graph
}

#[test]
fn delete_of_missing_node_is_a_noop() {
    let mut graph = chain_graph(3);
    let before = graph.clone();

    assert!(!ops::delete_node(&mut graph, "n9"));
    assert_eq!(
        graph, before,
        "deleting an unknown id must leave the graph untouched"
    );
}

#[test]
fn add_link_rejects_exact_repeats() {
    let mut graph = chain_graph(2);
    graph.links.clear();

    assert!(ops::add_link(&mut graph, "n0", "n1"));
    assert!(
        !ops::add_link(&mut graph, "n0", "n1"),
        "second identical addLink must report failure"
    );
    assert_eq!(graph.links.len(), 1);
}

#[test]
fn reverse_links_are_distinct() {
    let mut graph = chain_graph(2);
    graph.links.clear();

    assert!(ops::add_link(&mut graph, "n0", "n1"));
    assert!(ops::add_link(&mut graph, "n1", "n0"));
    assert_eq!(graph.links.len(), 2, "a->b and b->a are different edges");
}

#[test]
fn deletion_preserves_referential_integrity() {
    let mut graph = chain_graph(6);
    ops::add_link(&mut graph, "n0", "n3");
    ops::add_link(&mut graph, "n5", "n2");

    for id in ["n2", "n0", "n4"] {
        assert!(ops::delete_node(&mut graph, id));
        for link in &graph.links {
            let (source, target) = graph
                .link_endpoint_ids(link)
                .expect("every link endpoint must resolve");
            assert_ne!(source, id, "dangling source after deleting {id}");
            assert_ne!(target, id, "dangling target after deleting {id}");
            assert!(graph.get_node(source).is_some());
            assert!(graph.get_node(target).is_some());
        }
    }
}

#[test]
fn generated_ids_never_collide() {
    let mut graph = Graph::new();
    let mut rng = StdRng::seed_from_u64(3);

    // interleave adds and deletes, checking uniqueness at every step
    for round in 0..20 {
        let id = ops::add_node(&mut graph, None, NodeAttrs::default(), &mut rng);
        assert!(id.starts_with('n'), "id form: {id}");
        let k: usize = id[1..].parse().unwrap_or_else(|_| panic!("id form: {id}"));
        // smallest free k is never below the arena length minus one slot
        assert!(k + 1 >= graph.nodes.len());

        if round % 3 == 0 && graph.nodes.len() > 1 {
            let victim = graph.nodes[graph.nodes.len() / 2].id.clone();
            assert!(ops::delete_node(&mut graph, &victim));
        }

        let mut seen = std::collections::HashSet::new();
        for node in &graph.nodes {
            assert!(seen.insert(node.id.clone()), "duplicate id {}", node.id);
        }
    }
}

#[test]
fn add_node_with_anchor_places_nearby() {
    let mut graph = Graph::new();
    let mut rng = StdRng::seed_from_u64(5);

    let first = ops::add_node(&mut graph, None, NodeAttrs::default(), &mut rng);
    // anchor has no coordinates yet, so the second node may be unplaced
    let second = ops::add_node(&mut graph, Some(&first), NodeAttrs::default(), &mut rng);
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.links.len(), 1);
    assert!(graph.get_node(&second).unwrap().x.is_none());

    // with a placed anchor, the new node lands within 50 units on each axis
    graph.get_node_mut(&first).unwrap().x = Some(1000.0);
    graph.get_node_mut(&first).unwrap().y = Some(-400.0);
    let third = ops::add_node(&mut graph, Some(&first), NodeAttrs::default(), &mut rng);
    let node = graph.get_node(&third).unwrap();
    assert!((node.x.unwrap() - 1000.0).abs() < 50.0);
    assert!((node.y.unwrap() - -400.0).abs() < 50.0);
}

#[test]
fn layout_converges_to_target_spacing() {
    let mut graph = Graph::new();
    graph.nodes.push(Node::new("a".to_string(), "a".to_string()));
    graph.nodes.push(Node::new("b".to_string(), "b".to_string()));
    graph.links.push(nodegraph_engine::datamodel::Link {
        source: 0,
        target: 1,
    });

    let mut engine = LayoutEngine::new(17);
    engine.start(&mut graph, 0);
    let mut settled = false;
    for _ in 0..2_000 {
        if engine.tick(&mut graph) {
            settled = true;
            break;
        }
    }
    assert!(settled, "two linked nodes must converge");

    let (a, b) = (&graph.nodes[0], &graph.nodes[1]);
    for v in [a.x, a.y, b.x, b.y] {
        let v = v.expect("settled nodes have coordinates");
        assert!(v.is_finite(), "coordinates must be finite");
    }

    // target spacing folds each endpoint's extent into the base distance
    let ideal = graph.options.link_distance
        + (a.width + a.height) / 4.1
        + (b.width + b.height) / 4.1;
    let dx = b.x.unwrap() - a.x.unwrap();
    let dy = b.y.unwrap() - a.y.unwrap();
    let dist = (dx * dx + dy * dy).sqrt();
    assert!(
        (dist - ideal).abs() < 2.0,
        "settled distance {dist} should approach {ideal}"
    );
}

#[test]
fn relabel_resizes_and_respaces_without_animation() {
    let mut editor = GraphEditor::new();
    let a = editor.add_node(None, NodeAttrs::default());
    let b = editor.add_node(Some(&a), NodeAttrs::default());
    run_frames(&mut editor, 5_000);

    let dist = |editor: &GraphEditor| {
        let na = editor.graph().get_node(&a).unwrap();
        let nb = editor.graph().get_node(&b).unwrap();
        let dx = nb.x.unwrap() - na.x.unwrap();
        let dy = nb.y.unwrap() - na.y.unwrap();
        (dx * dx + dy * dy).sqrt()
    };
    let height_before = editor.graph().get_node(&a).unwrap().height;
    let dist_before = dist(&editor);

    editor.set_label(&a, "first line\nsecond line\nthird line");
    // a single frame: autosize picks up the new bounds and resettles
    // immediately, no animated restart
    editor.frame(1e9);
    assert!(editor.is_settled(), "resettle must complete within the frame");

    let node = editor.graph().get_node(&a).unwrap();
    assert!(
        node.height > height_before + 20.0,
        "three lines need more height: {} -> {}",
        height_before,
        node.height
    );
    assert!(
        dist(&editor) > dist_before + 1.0,
        "larger node must push its neighbor further away"
    );
}

#[test]
fn self_link_under_flow_layout_still_settles() {
    let doc = r#"{
        "nodes": [{"id": "a", "x": 0, "y": 0}, {"id": "b", "x": 50, "y": 0}],
        "links": [{"source": "a", "target": "a"}, {"source": "a", "target": "b"}],
        "options": {"layoutType": "flow-x", "minSeparation": 100}
    }"#;
    let mut editor = GraphEditor::open(doc).expect("doc with a self link must import");

    // a self link has no flow ordering to satisfy; it must not keep the
    // engine reporting movement forever
    run_frames(&mut editor, 5_000);
    assert!(editor.is_settled());

    let ax = editor.graph().get_node("a").unwrap().x.unwrap();
    let bx = editor.graph().get_node("b").unwrap().x.unwrap();
    assert!(bx - ax >= 100.0 - 1e-6, "real link still ordered: {ax} -> {bx}");
}

#[test]
fn flow_x_enforces_min_separation_after_restart() {
    let mut editor = GraphEditor::new();
    let a = editor.add_node(None, NodeAttrs::default());
    let b = editor.add_node(Some(&a), NodeAttrs::default());
    run_frames(&mut editor, 5_000);

    editor.set_options(LayoutOptions {
        layout_type: LayoutType::FlowX,
        min_separation: 100.0,
        ..LayoutOptions::default()
    });
    assert!(!editor.is_settled(), "option change must restart layout");
    run_frames(&mut editor, 5_000);

    let ax = editor.graph().get_node(&a).unwrap().x.unwrap();
    let bx = editor.graph().get_node(&b).unwrap().x.unwrap();
    assert!(
        bx - ax >= 100.0 - 1e-6,
        "flow-x separation violated: {ax} -> {bx}"
    );
}
