// Copyright 2026 The Nodegraph Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;

use crate::common::{Error, ErrorCode, ErrorKind, Result};

/// Default width and height for a node that has not yet been autosized by
/// the renderer.
pub const DEFAULT_NODE_SIZE: f64 = 50.0;

/// Axis-aligned rectangle, used for node bounds, group bounds and routing.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of `width`×`height` centered on (`cx`, `cy`).
    pub fn centered(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Grow (or shrink, for negative `amount`) the rect on all sides.
    pub fn inflate(&self, amount: f64) -> Rect {
        Rect {
            x: self.x - amount,
            y: self.y - amount,
            width: (self.width + 2.0 * amount).max(0.0),
            height: (self.height + 2.0 * amount).max(0.0),
        }
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        Rect {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Image attached to a node.  Original dimensions come from the host once
/// the image bytes have been decoded; until then they are zero and the
/// image contributes nothing to the node's bounding box.
#[derive(Clone, PartialEq, Debug)]
pub struct NodeImage {
    pub url: String,
    pub original_width: f64,
    pub original_height: f64,
    /// Zoom percentage (100 = natural size).
    pub zoom: f64,
}

impl NodeImage {
    pub fn scaled_width(&self) -> f64 {
        (self.original_width * self.zoom / 100.0).round()
    }

    pub fn scaled_height(&self) -> f64 {
        (self.original_height * self.zoom / 100.0).round()
    }
}

/// A diagram vertex.  `x`/`y` are the layout-space center, `None` until the
/// node has been placed by the solver or the user.  `width`/`height` are
/// owned by the renderer: they track the rendered bounding box and feed
/// back into the layout engine's spacing inputs.
#[derive(Clone, PartialEq, Debug)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: f64,
    pub height: f64,
    /// Pinned by the user: the solver never moves this node, only a direct
    /// drag does.  The engine's transient hold state is tracked separately
    /// in the layout engine's side table, never here.
    pub user_pinned: bool,
    pub image: Option<NodeImage>,
}

impl Node {
    pub fn new(id: String, label: String) -> Self {
        Self {
            id,
            label,
            x: None,
            y: None,
            width: DEFAULT_NODE_SIZE,
            height: DEFAULT_NODE_SIZE,
            user_pinned: false,
            image: None,
        }
    }

    /// Current bounds, if the node has been placed.
    pub fn bounds(&self) -> Option<Rect> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Rect::centered(x, y, self.width, self.height)),
            _ => None,
        }
    }
}

/// A directed edge.  Endpoints are indices into the owning graph's node
/// arena; every mutation that can invalidate indices remaps them (see
/// `ops::delete_node`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Link {
    pub source: usize,
    pub target: usize,
}

/// A visual cluster of nodes.  Membership is by node index and must be
/// remapped or dropped whenever node deletion compacts the arena; bounds
/// are derived per-frame by the renderer, never stored.
#[derive(Clone, PartialEq, Debug)]
pub struct Group {
    pub leaves: Vec<usize>,
    pub style: String,
    pub padding: f64,
}

/// Pan/zoom transform applied to the whole rendered scene.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            k: 1.0,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum LayoutType {
    #[default]
    Auto,
    Disabled,
    FlowX,
    FlowY,
}

impl LayoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutType::Auto => "auto",
            LayoutType::Disabled => "disabled",
            LayoutType::FlowX => "flow-x",
            LayoutType::FlowY => "flow-y",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(LayoutType::Auto),
            "disabled" => Ok(LayoutType::Disabled),
            "flow-x" => Ok(LayoutType::FlowX),
            "flow-y" => Ok(LayoutType::FlowY),
            _ => Err(Error::new(
                ErrorKind::Import,
                ErrorCode::BadLayoutType,
                Some(s.to_string()),
            )),
        }
    }
}

impl fmt::Display for LayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Layout configuration carried on the graph document.
#[derive(Clone, PartialEq, Debug)]
pub struct LayoutOptions {
    pub title: String,
    pub layout_type: LayoutType,
    /// Base inter-node distance along links; the engine adds a size-aware
    /// term per endpoint on top of this.
    pub link_distance: f64,
    /// Minimum ordered separation for flow layouts.
    pub min_separation: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            title: "untitled".to_string(),
            layout_type: LayoutType::Auto,
            link_distance: 80.0,
            min_separation: 160.0,
        }
    }
}

/// The graph owns every node, link and group.  Links and groups reference
/// nodes by arena index; the layout engine and renderer hold only
/// re-creatable views over the same arena.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub groups: Vec<Group>,
    pub transform: Transform,
    pub options: LayoutOptions,
    pub selected_node_id: Option<String>,
}

impl Graph {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Endpoint ids for a link, for callers that deal in public ids.
    pub fn link_endpoint_ids(&self, link: &Link) -> Option<(&str, &str)> {
        let source = self.nodes.get(link.source)?;
        let target = self.nodes.get(link.target)?;
        Some((source.id.as_str(), target.id.as_str()))
    }
}
