// Copyright 2026 The Nodegraph Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! JSON document round-trip for graph documents.
//!
//! The on-disk format references nodes by their string ids (never arena
//! indices) and uses camelCase keys.  Importing resolves every reference
//! eagerly: an unresolvable link or group member is an import error, not a
//! silently dropped element.  Solver-internal state and arena indices are
//! never persisted; image pixel dimensions are re-reported by the host
//! after load, so only the url and zoom travel with the document.
//!
//! # Example
//! ```no_run
//! let graph = nodegraph_engine::json::deserialize(r#"{"nodes": [], "links": []}"#)?;
//! let _round_tripped = nodegraph_engine::json::serialize(&graph)?;
//! # Ok::<(), nodegraph_engine::common::Error>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::datamodel::{
    DEFAULT_NODE_SIZE, Graph, Group, LayoutOptions, LayoutType, Link, Node, NodeImage, Transform,
};

// Helper functions for serde skip_serializing_if

fn is_empty_string(val: &str) -> bool {
    val.is_empty()
}

fn is_empty_vec<T>(val: &[T]) -> bool {
    val.is_empty()
}

fn is_identity_transform(t: &TransformDoc) -> bool {
    t.x == 0.0 && t.y == 0.0 && t.k == 1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDoc {
    pub id: String,
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<String>,
    #[serde(
        rename = "imageZoom",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub image_zoom: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDoc {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDoc {
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub style: String,
    #[serde(default = "default_group_padding")]
    pub padding: f64,
}

fn default_group_padding() -> f64 {
    10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformDoc {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for TransformDoc {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            k: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsDoc {
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub title: String,
    #[serde(rename = "layoutType", default = "default_layout_type")]
    pub layout_type: String,
    #[serde(rename = "linkDistance", default = "default_link_distance")]
    pub link_distance: f64,
    #[serde(rename = "minSeparation", default = "default_min_separation")]
    pub min_separation: f64,
}

impl Default for OptionsDoc {
    fn default() -> Self {
        Self {
            title: String::new(),
            layout_type: default_layout_type(),
            link_distance: default_link_distance(),
            min_separation: default_min_separation(),
        }
    }
}

fn default_layout_type() -> String {
    "auto".to_string()
}

fn default_link_distance() -> f64 {
    80.0
}

fn default_min_separation() -> f64 {
    160.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDoc {
    #[serde(default)]
    pub nodes: Vec<NodeDoc>,
    #[serde(default)]
    pub links: Vec<LinkDoc>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub groups: Vec<GroupDoc>,
    #[serde(skip_serializing_if = "is_identity_transform", default)]
    pub transform: TransformDoc,
    #[serde(default)]
    pub options: OptionsDoc,
}

// Conversions between document form and datamodel form

impl From<NodeDoc> for Node {
    fn from(doc: NodeDoc) -> Self {
        let label = if doc.label.is_empty() {
            doc.id.clone()
        } else {
            doc.label
        };
        // pixel dimensions are only known once the host decodes the image
        let image = doc.image.map(|url| NodeImage {
            url,
            original_width: 0.0,
            original_height: 0.0,
            zoom: doc.image_zoom.unwrap_or(100.0),
        });
        Node {
            id: doc.id,
            label,
            x: doc.x,
            y: doc.y,
            width: doc.width.unwrap_or(DEFAULT_NODE_SIZE),
            height: doc.height.unwrap_or(DEFAULT_NODE_SIZE),
            user_pinned: false,
            image,
        }
    }
}

impl From<Node> for NodeDoc {
    fn from(node: Node) -> Self {
        NodeDoc {
            label: if node.label == node.id {
                String::new()
            } else {
                node.label
            },
            id: node.id,
            x: node.x,
            y: node.y,
            width: Some(node.width),
            height: Some(node.height),
            image_zoom: node.image.as_ref().map(|image| image.zoom),
            image: node.image.map(|image| image.url),
        }
    }
}

impl From<Transform> for TransformDoc {
    fn from(t: Transform) -> Self {
        TransformDoc {
            x: t.x,
            y: t.y,
            k: t.k,
        }
    }
}

impl From<TransformDoc> for Transform {
    fn from(t: TransformDoc) -> Self {
        Transform {
            x: t.x,
            y: t.y,
            k: t.k,
        }
    }
}

impl From<LayoutOptions> for OptionsDoc {
    fn from(options: LayoutOptions) -> Self {
        OptionsDoc {
            title: options.title,
            layout_type: options.layout_type.as_str().to_string(),
            link_distance: options.link_distance,
            min_separation: options.min_separation,
        }
    }
}

/// Build a document from a graph.  Always succeeds: the graph's index
/// references are valid by construction and converted back to ids.
pub fn document_from_graph(graph: &Graph) -> GraphDoc {
    GraphDoc {
        nodes: graph.nodes.iter().cloned().map(NodeDoc::from).collect(),
        links: graph
            .links
            .iter()
            .map(|l| LinkDoc {
                source: graph.nodes[l.source].id.clone(),
                target: graph.nodes[l.target].id.clone(),
            })
            .collect(),
        groups: graph
            .groups
            .iter()
            .map(|g| GroupDoc {
                members: g
                    .leaves
                    .iter()
                    .map(|&i| graph.nodes[i].id.clone())
                    .collect(),
                style: g.style.clone(),
                padding: g.padding,
            })
            .collect(),
        transform: graph.transform.into(),
        options: graph.options.clone().into(),
    }
}

/// Resolve a document into a graph, checking id uniqueness and resolving
/// every link and group reference to an arena index.
pub fn graph_from_document(doc: GraphDoc) -> Result<Graph> {
    let layout_type = LayoutType::parse(&doc.options.layout_type)?;

    let nodes: Vec<Node> = doc.nodes.into_iter().map(Node::from).collect();
    for (i, node) in nodes.iter().enumerate() {
        if nodes[..i].iter().any(|other| other.id == node.id) {
            return Err(Error::new(
                ErrorKind::Import,
                ErrorCode::DuplicateNodeId,
                Some(node.id.clone()),
            ));
        }
    }

    let resolve = |id: &str| -> Result<usize> {
        nodes.iter().position(|n| n.id == id).ok_or_else(|| {
            Error::new(
                ErrorKind::Import,
                ErrorCode::DoesNotExist,
                Some(id.to_string()),
            )
        })
    };

    let mut links = Vec::with_capacity(doc.links.len());
    for link in &doc.links {
        links.push(Link {
            source: resolve(&link.source)?,
            target: resolve(&link.target)?,
        });
    }

    let mut groups = Vec::with_capacity(doc.groups.len());
    for group in doc.groups {
        let mut leaves = Vec::with_capacity(group.members.len());
        for id in &group.members {
            leaves.push(resolve(id)?);
        }
        groups.push(Group {
            leaves,
            style: group.style,
            padding: group.padding,
        });
    }

    Ok(Graph {
        nodes,
        links,
        groups,
        transform: doc.transform.into(),
        options: LayoutOptions {
            title: doc.options.title,
            layout_type,
            link_distance: doc.options.link_distance,
            min_separation: doc.options.min_separation,
        },
        selected_node_id: None,
    })
}

/// Serialize a graph to a pretty-printed JSON document.
pub fn serialize(graph: &Graph) -> Result<String> {
    serde_json::to_string_pretty(&document_from_graph(graph)).map_err(|err| {
        Error::new(
            ErrorKind::Export,
            ErrorCode::Generic,
            Some(err.to_string()),
        )
    })
}

/// Parse a JSON document into a graph.
pub fn deserialize(json: &str) -> Result<Graph> {
    let doc: GraphDoc = serde_json::from_str(json).map_err(|err| {
        Error::new(
            ErrorKind::Import,
            ErrorCode::JsonDeserialization,
            Some(err.to_string()),
        )
    })?;
    graph_from_document(doc)
}
