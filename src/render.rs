// Copyright 2026 The Nodegraph Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Render synchronization.  Builds a retained [`Scene`] from the graph
//! each frame, computes label/image-driven node sizes and writes them
//! back into the model, and trims link segments to node borders.  Layer
//! order inside a scene is fixed: groups draw behind nodes, links on top.

use float_cmp::approx_eq;

use crate::datamodel::{Graph, Rect, Transform};
use crate::layout::geom::{Position, clip_to_bounds};
use crate::layout::text;

const HORIZONTAL_PADDING: f64 = 10.0;
const VERTICAL_PADDING: f64 = 5.0;

/// Link endpoints are pulled this far past the node border so strokes
/// visually join the border instead of stopping short of it.
const EDGE_GAP: f64 = 2.0;

#[derive(Clone, PartialEq, Debug)]
pub struct ImageVisual {
    pub url: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, PartialEq, Debug)]
pub struct NodeVisual {
    pub id: String,
    pub bounds: Rect,
    pub label: String,
    pub image: Option<ImageVisual>,
    pub pinned: bool,
    pub selected: bool,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct LinkVisual {
    pub source: usize,
    pub target: usize,
    pub from: Position,
    pub to: Position,
}

#[derive(Clone, PartialEq, Debug)]
pub struct GroupVisual {
    pub bounds: Rect,
    pub style: String,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct Scene {
    pub groups: Vec<GroupVisual>,
    pub nodes: Vec<NodeVisual>,
    pub links: Vec<LinkVisual>,
}

/// Convert a screen-space point into layout space under the current
/// pan/zoom transform.
pub fn screen_to_graph(t: &Transform, sx: f64, sy: f64) -> Position {
    Position::new((sx - t.x) / t.k, (sy - t.y) / t.k)
}

/// Size a node to its content: the wider of label and image plus side
/// padding, label height plus vertical padding, image stacked under the
/// label.
pub fn content_size(label: &str, image_w: f64, image_h: f64) -> (f64, f64) {
    let (text_w, text_h) = text::measure_label(label);
    let width = text_w.max(image_w) + 2.0 * HORIZONTAL_PADDING;
    let height = text_h + 2.0 * VERTICAL_PADDING + image_h;
    (width, height)
}

/// Recompute every node's width/height from its label and image, writing
/// changes back into the graph.  Returns true if any node's size changed,
/// the caller's cue to re-run layout with the new extents.
pub fn autosize(graph: &mut Graph) -> bool {
    let mut changed = false;
    for node in graph.nodes.iter_mut() {
        let (image_w, image_h) = match &node.image {
            Some(image) => (image.scaled_width(), image.scaled_height()),
            None => (0.0, 0.0),
        };
        let (width, height) = content_size(&node.label, image_w, image_h);
        if !approx_eq!(f64, width, node.width, epsilon = 0.5)
            || !approx_eq!(f64, height, node.height, epsilon = 0.5)
        {
            node.width = width;
            node.height = height;
            changed = true;
        }
    }
    changed
}

/// Build the retained scene for the graph's current positions.  Nodes
/// without a position yet are skipped, as are links whose endpoints are
/// unplaced.
pub fn build_scene(graph: &Graph) -> Scene {
    let mut scene = Scene::default();

    for group in &graph.groups {
        let mut bounds: Option<Rect> = None;
        for &leaf in &group.leaves {
            if let Some(node_bounds) = graph.nodes.get(leaf).and_then(|n| n.bounds()) {
                bounds = Some(match bounds {
                    Some(b) => b.union(&node_bounds),
                    None => node_bounds,
                });
            }
        }
        if let Some(bounds) = bounds {
            scene.groups.push(GroupVisual {
                bounds: bounds.inflate(group.padding),
                style: group.style.clone(),
            });
        }
    }

    for node in &graph.nodes {
        let Some(bounds) = node.bounds() else {
            continue;
        };
        let image = node.image.as_ref().map(|image| ImageVisual {
            url: image.url.clone(),
            width: image.scaled_width(),
            height: image.scaled_height(),
        });
        scene.nodes.push(NodeVisual {
            id: node.id.clone(),
            bounds,
            label: node.label.clone(),
            image,
            pinned: node.user_pinned,
            selected: graph.selected_node_id.as_deref() == Some(node.id.as_str()),
        });
    }

    for link in &graph.links {
        let (Some(source), Some(target)) = (
            graph.nodes.get(link.source).and_then(|n| n.bounds()),
            graph.nodes.get(link.target).and_then(|n| n.bounds()),
        ) else {
            continue;
        };
        let source_center = Position::new(source.center_x(), source.center_y());
        let target_center = Position::new(target.center_x(), target.center_y());

        // trim each end to the border, overshooting by the gap so the
        // stroke meets the border
        let from = clip_to_bounds(
            source_center,
            target_center,
            &source.inflate(-EDGE_GAP),
        );
        let to_trimmed = clip_to_bounds(
            target_center,
            source_center,
            &target.inflate(-EDGE_GAP),
        );
        scene.links.push(LinkVisual {
            source: link.source,
            target: link.target,
            from,
            to: to_trimmed,
        });
    }

    scene
}

/// Render the scene as a standalone SVG document.
pub fn to_svg(graph: &Graph) -> String {
    let scene = build_scene(graph);

    let mut extent: Option<Rect> = None;
    for node in &scene.nodes {
        extent = Some(match extent {
            Some(b) => b.union(&node.bounds),
            None => node.bounds,
        });
    }
    for group in &scene.groups {
        extent = Some(match extent {
            Some(b) => b.union(&group.bounds),
            None => group.bounds,
        });
    }
    let extent = extent
        .map(|b| b.inflate(20.0))
        .unwrap_or_else(|| Rect::new(0.0, 0.0, 100.0, 100.0));

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{:.1} {:.1} {:.1} {:.1}\">\n",
        extent.x, extent.y, extent.width, extent.height
    ));
    svg.push_str(
        "  <defs><marker id=\"arrow\" markerWidth=\"10\" markerHeight=\"7\" \
         refX=\"10\" refY=\"3.5\" orient=\"auto\"><polygon points=\"0 0, 10 3.5, 0 7\"/>\
         </marker></defs>\n",
    );

    for group in &scene.groups {
        svg.push_str(&format!(
            "  <rect class=\"group\" x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" \
             rx=\"8\" fill=\"#eef\" stroke=\"#99c\"/>\n",
            group.bounds.x, group.bounds.y, group.bounds.width, group.bounds.height
        ));
    }

    for node in &scene.nodes {
        let b = &node.bounds;
        svg.push_str(&format!(
            "  <rect class=\"node\" x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" \
             rx=\"4\" fill=\"#fff\" stroke=\"#333\"/>\n",
            b.x, b.y, b.width, b.height
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"14\" text-anchor=\"middle\">{}</text>\n",
            b.center_x(),
            b.y + VERTICAL_PADDING + 11.0,
            escape_xml(&node.label)
        ));
        if let Some(image) = &node.image {
            svg.push_str(&format!(
                "  <image href=\"{}\" x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\"/>\n",
                escape_xml(&image.url),
                b.center_x() - image.width / 2.0,
                b.y + b.height - VERTICAL_PADDING - image.height,
                image.width,
                image.height
            ));
        }
    }

    for link in &scene.links {
        svg.push_str(&format!(
            "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" \
             stroke=\"#333\" marker-end=\"url(#arrow)\"/>\n",
            link.from.x, link.from.y, link.to.x, link.to.y
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
