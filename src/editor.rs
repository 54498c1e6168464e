// Copyright 2026 The Nodegraph Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Interactive editor host.  [`GraphEditor`] wires the pieces together:
//! the document model, the incremental layout engine, the frame loop and
//! the retained scene.  Hosts feed it pointer events and timestamps and
//! read the scene back out; everything else is internal.

use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::common::Result;
use crate::datamodel::{Graph, LayoutOptions, NodeImage, Transform};
use crate::export_err;
use crate::json;
use crate::layout::{DEFAULT_START_ITERATIONS, LayoutEngine};
use crate::ops::{self, NodeAttrs};
use crate::render::{self, Scene, screen_to_graph};
use crate::scheduler::FrameLoop;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ExportFormat {
    Json,
    Svg,
    /// Raster export needs a real canvas; hosts that have one rasterize
    /// the SVG themselves.
    Png,
}

/// Token returned by [`GraphEditor::set_node_image`]; the host hands it
/// back when the image bytes finish decoding.  Stale tokens (the user
/// picked a different image while the old one was loading) are ignored.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ImageToken(u64);

pub struct GraphEditor {
    graph: Graph,
    engine: LayoutEngine,
    scene: Scene,
    frame_loop: FrameLoop,
    rng: StdRng,
    image_generation: HashMap<String, u64>,
    next_generation: u64,
}

impl GraphEditor {
    pub fn new() -> Self {
        Self::with_seed(Graph::new(), 0)
    }

    pub fn with_seed(graph: Graph, seed: u64) -> Self {
        let mut editor = Self {
            graph,
            engine: LayoutEngine::new(seed),
            scene: Scene::default(),
            frame_loop: FrameLoop::new(),
            rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
            image_generation: HashMap::new(),
            next_generation: 0,
        };
        render::autosize(&mut editor.graph);
        // a document that already carries positions animates from them; a
        // fresh one gets a synchronous warm-up so it does not unfold from
        // a random scatter on screen
        let laid_out = !editor.graph.nodes.is_empty()
            && editor
                .graph
                .nodes
                .iter()
                .all(|n| n.x.is_some() && n.y.is_some());
        let warmup = if laid_out { 0 } else { DEFAULT_START_ITERATIONS };
        editor.engine.start(&mut editor.graph, warmup);
        editor.frame_loop.request_update();
        editor.scene = render::build_scene(&editor.graph);
        editor
    }

    pub fn open(json_doc: &str) -> Result<Self> {
        let graph = json::deserialize(json_doc)?;
        Ok(Self::with_seed(graph, 0))
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn is_settled(&self) -> bool {
        self.engine.is_settled()
    }

    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => json::serialize(&self.graph),
            ExportFormat::Svg => Ok(render::to_svg(&self.graph)),
            ExportFormat::Png => export_err!(UnsupportedOperation, "png".to_string()),
        }
    }

    /// Advance the editor to `now_ms`.  Runs any due simulation ticks,
    /// re-autosizes, and rebuilds the scene.  Returns true when the scene
    /// changed and the host should repaint.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        let ticks = self.frame_loop.ticks_due(now_ms);
        if ticks == 0 {
            return false;
        }

        let mut settled = false;
        for _ in 0..ticks {
            settled = self.engine.tick(&mut self.graph);
            if settled {
                break;
            }
        }

        // rendered sizes feed back into spacing; a size change mid-flight
        // means the arrangement was computed with stale extents, so settle
        // again without animating
        if render::autosize(&mut self.graph) {
            self.engine.settle(&mut self.graph);
            settled = true;
        }

        if settled {
            self.frame_loop.clear();
        }

        let scene = render::build_scene(&self.graph);
        let changed = scene != self.scene;
        self.scene = scene;
        changed
    }

    /// Restart layout after a structural edit, animating from the current
    /// arrangement rather than warm-starting.
    fn relayout(&mut self) {
        self.engine.restart(&mut self.graph);
        self.frame_loop.request_update();
    }

    pub fn add_node(&mut self, link_to: Option<&str>, attrs: NodeAttrs) -> String {
        let id = ops::add_node(&mut self.graph, link_to, attrs, &mut self.rng);
        render::autosize(&mut self.graph);
        self.relayout();
        id
    }

    pub fn delete_node(&mut self, id: &str) -> bool {
        let deleted = ops::delete_node(&mut self.graph, id);
        if deleted {
            self.image_generation.remove(id);
            self.relayout();
        }
        deleted
    }

    pub fn add_link(&mut self, source_id: &str, target_id: &str) -> bool {
        let added = ops::add_link(&mut self.graph, source_id, target_id);
        if added {
            self.relayout();
        }
        added
    }

    pub fn delete_link(&mut self, source_id: &str, target_id: &str) -> usize {
        let removed = ops::delete_link(&mut self.graph, source_id, target_id);
        if removed > 0 {
            self.relayout();
        }
        removed
    }

    pub fn revert_link(&mut self, index: usize) -> bool {
        let reverted = ops::revert_link(&mut self.graph, index);
        if reverted {
            self.relayout();
        }
        reverted
    }

    pub fn set_label(&mut self, id: &str, label: &str) -> bool {
        let Some(node) = self.graph.get_node_mut(id) else {
            return false;
        };
        node.label = label.to_string();
        // size change is picked up by the next frame's autosize pass
        self.frame_loop.request_update();
        true
    }

    pub fn toggle_pin(&mut self, id: &str) -> bool {
        let Some(node) = self.graph.get_node_mut(id) else {
            return false;
        };
        node.user_pinned = !node.user_pinned;
        let pinned = node.user_pinned;
        self.engine.update_pin(&self.graph, id);
        if !pinned {
            self.engine.resume();
            self.frame_loop.request_update();
        }
        true
    }

    pub fn set_options(&mut self, options: LayoutOptions) {
        self.graph.options = options;
        self.relayout();
    }

    pub fn set_transform(&mut self, x: f64, y: f64, k: f64) {
        self.graph.transform = Transform { x, y, k };
        // pan/zoom is a view-space change; positions are untouched but the
        // host still needs a repaint
        self.frame_loop.request_update();
    }

    /// Primary-click on a node.  A plain click selects; a shift-click
    /// creates a link from the current selection to the clicked node (and
    /// moves the selection along, so repeated shift-clicks chain).
    pub fn click_node(&mut self, id: &str, shift: bool) {
        if self.graph.node_index(id).is_none() {
            return;
        }
        if shift && let Some(selected) = self.graph.selected_node_id.clone() {
            self.add_link(&selected, id);
        }
        self.graph.selected_node_id = Some(id.to_string());
    }

    /// Primary-click on empty canvas, in screen coordinates.  A plain
    /// click clears the selection; a shift-click creates a node under the
    /// pointer.
    pub fn click_background(&mut self, sx: f64, sy: f64, shift: bool) -> Option<String> {
        if !shift {
            self.graph.selected_node_id = None;
            return None;
        }
        let p = screen_to_graph(&self.graph.transform, sx, sy);
        let attrs = NodeAttrs {
            label: None,
            x: Some(p.x),
            y: Some(p.y),
        };
        let id = self.add_node(None, attrs);
        self.graph.selected_node_id = Some(id.clone());
        Some(id)
    }

    pub fn drag_start(&mut self, id: &str) {
        self.engine.drag_start(&self.graph, id);
    }

    /// Pointer position in screen coordinates; the dragged node tracks it
    /// in layout space.
    pub fn drag(&mut self, id: &str, sx: f64, sy: f64) {
        let p = screen_to_graph(&self.graph.transform, sx, sy);
        self.engine.drag(&mut self.graph, id, p.x, p.y);
        self.frame_loop.request_update();
    }

    pub fn drag_end(&mut self, id: &str) {
        self.engine.drag_end(&self.graph, id);
        self.frame_loop.request_update();
    }

    /// Attach an image to a node.  Actual pixel dimensions arrive later,
    /// via [`GraphEditor::finish_image_load`] with the returned token;
    /// until then the image occupies no space.
    pub fn set_node_image(&mut self, id: &str, url: &str) -> Option<ImageToken> {
        let node = self.graph.get_node_mut(id)?;
        node.image = Some(NodeImage {
            url: url.to_string(),
            original_width: 0.0,
            original_height: 0.0,
            zoom: 100.0,
        });
        self.next_generation += 1;
        self.image_generation
            .insert(id.to_string(), self.next_generation);
        Some(ImageToken(self.next_generation))
    }

    pub fn clear_node_image(&mut self, id: &str) -> bool {
        let Some(node) = self.graph.get_node_mut(id) else {
            return false;
        };
        node.image = None;
        self.image_generation.remove(id);
        self.frame_loop.request_update();
        true
    }

    /// Deliver decoded image dimensions.  Returns false (and changes
    /// nothing) when the token is stale: a later `set_node_image` call for
    /// the same node wins regardless of which load finishes first.
    pub fn finish_image_load(
        &mut self,
        id: &str,
        token: ImageToken,
        width: f64,
        height: f64,
    ) -> bool {
        if self.image_generation.get(id) != Some(&token.0) {
            return false;
        }
        let Some(image) = self.graph.get_node_mut(id).and_then(|n| n.image.as_mut()) else {
            return false;
        };
        image.original_width = width;
        image.original_height = height;
        self.frame_loop.request_update();
        true
    }

    pub fn set_image_zoom(&mut self, id: &str, zoom: f64) -> bool {
        let Some(image) = self.graph.get_node_mut(id).and_then(|n| n.image.as_mut()) else {
            return false;
        };
        image.zoom = zoom.max(1.0);
        self.frame_loop.request_update();
        true
    }
}

impl Default for GraphEditor {
    fn default() -> Self {
        Self::new()
    }
}
