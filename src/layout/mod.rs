// Copyright 2026 The Nodegraph Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Incremental layout engine.  The engine owns a [`Solver`] plus a side
//! table of per-node transient state (re-init hold, active drag) that is
//! deliberately kept out of the document model: only `user_pinned` is a
//! document fact, everything else is engine-private.

pub mod geom;
pub mod solver;
pub mod text;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::datamodel::{Graph, LayoutType};
use geom::Position;
use solver::{FlowAxis, Solver, SolverConfig, SolverLink, SolverNode};

/// Average per-node displacement below which a tick counts as settled.
pub const CONVERGENCE_THRESHOLD: f64 = 0.05;

/// Synchronous warm-up ticks for a cold start; structural restarts that
/// only tweak an existing arrangement skip the warm-up.
pub const DEFAULT_START_ITERATIONS: usize = 30;

/// Hard cap on the synchronous ticks an instant (non-animated) settle may
/// run before giving up and reporting the layout as settled anyway.
const MAX_SETTLE_ITERATIONS: usize = 2_000;

/// Divisor applied to each endpoint's width+height when folding rendered
/// size into a link's ideal length.
const SIZE_TERM_DIVISOR: f64 = 4.1;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum LayoutPhase {
    #[default]
    Idle,
    Converging,
    Settled,
}

/// Engine-private per-node state.  `held` freezes a previously placed node
/// across a re-init so the incoming solver does not scramble an
/// arrangement the user already had; it is released on the first tick.
#[derive(Clone, Copy, Default)]
struct NodeState {
    held: bool,
    dragging: bool,
}

pub struct LayoutEngine {
    solver: Option<Solver>,
    states: Vec<NodeState>,
    phase: LayoutPhase,
    rng: StdRng,
    release_pending: bool,
}

fn ideal_link_length(graph: &Graph, source: usize, target: usize) -> f64 {
    let s = &graph.nodes[source];
    let t = &graph.nodes[target];
    graph.options.link_distance
        + (s.width + s.height) / SIZE_TERM_DIVISOR
        + (t.width + t.height) / SIZE_TERM_DIVISOR
}

impl LayoutEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            solver: None,
            states: Vec::new(),
            phase: LayoutPhase::Idle,
            rng: StdRng::seed_from_u64(seed),
            release_pending: false,
        }
    }

    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    pub fn is_settled(&self) -> bool {
        self.phase == LayoutPhase::Settled
    }

    /// (Re)initialize the solver from the graph's current structure and run
    /// `initial_iterations` synchronous warm-up ticks.  Previously placed
    /// nodes are held in place until the first subsequent tick; unplaced
    /// nodes receive random seed positions and their coordinates are
    /// written back immediately.
    pub fn start(&mut self, graph: &mut Graph, initial_iterations: usize) {
        let n = graph.nodes.len();
        self.states = vec![NodeState::default(); n];

        // seed square scaled to the node count so dense graphs start spread
        let side = graph.options.link_distance * (n.max(1) as f64).sqrt();
        let mut solver_nodes = Vec::with_capacity(n);
        for (i, node) in graph.nodes.iter_mut().enumerate() {
            let placed = node.x.is_some() && node.y.is_some();
            let pos = match (node.x, node.y) {
                (Some(x), Some(y)) => Position::new(x, y),
                _ => {
                    let p = Position::new(
                        self.rng.random::<f64>() * side,
                        self.rng.random::<f64>() * side,
                    );
                    node.x = Some(p.x);
                    node.y = Some(p.y);
                    p
                }
            };
            self.states[i].held = placed;
            solver_nodes.push(SolverNode {
                pos,
                width: node.width,
                height: node.height,
                locked: node.user_pinned || placed,
            });
        }

        let links = graph
            .links
            .iter()
            .map(|l| SolverLink {
                source: l.source,
                target: l.target,
                ideal_length: ideal_link_length(graph, l.source, l.target),
            })
            .collect();
        let groups = graph.groups.iter().map(|g| g.leaves.clone()).collect();

        let config = SolverConfig {
            link_distance: graph.options.link_distance,
            min_separation: graph.options.min_separation,
            flow: match graph.options.layout_type {
                LayoutType::FlowX => Some(FlowAxis::X),
                LayoutType::FlowY => Some(FlowAxis::Y),
                LayoutType::Auto | LayoutType::Disabled => None,
            },
            ..Default::default()
        };

        let mut solver = Solver::new(config, solver_nodes, links, groups);

        if graph.options.layout_type == LayoutType::Disabled {
            self.solver = Some(solver);
            self.release_pending = false;
            self.phase = LayoutPhase::Settled;
            return;
        }

        self.release_pending = true;
        self.phase = LayoutPhase::Converging;

        if initial_iterations > 0 {
            self.release_holds(graph, &mut solver);
            let mut settled = false;
            for _ in 0..initial_iterations {
                if solver.tick() < CONVERGENCE_THRESHOLD {
                    settled = true;
                    break;
                }
            }
            if settled {
                self.phase = LayoutPhase::Settled;
            }
        }

        self.solver = Some(solver);
        self.write_back(graph);
    }

    /// Re-init without warm-up: the structure changed but the arrangement
    /// is mostly intact, so animate from where things are.
    pub fn restart(&mut self, graph: &mut Graph) {
        self.start(graph, 0);
    }

    /// Re-init and run to convergence synchronously, for callers that want
    /// the new arrangement without animation.
    pub fn settle(&mut self, graph: &mut Graph) {
        self.start(graph, MAX_SETTLE_ITERATIONS);
        self.phase = LayoutPhase::Settled;
        self.write_back(graph);
    }

    fn release_holds(&mut self, graph: &Graph, solver: &mut Solver) {
        if !self.release_pending {
            return;
        }
        self.release_pending = false;
        for i in 0..self.states.len() {
            if self.states[i].held {
                self.states[i].held = false;
                let state = self.states[i];
                solver.set_locked(i, graph.nodes[i].user_pinned || state.dragging);
            }
        }
    }

    /// Advance one animation tick, writing positions back into the graph.
    /// Returns true when the layout has settled.
    pub fn tick(&mut self, graph: &mut Graph) -> bool {
        if self.phase != LayoutPhase::Converging {
            return true;
        }
        let Some(mut solver) = self.solver.take() else {
            self.phase = LayoutPhase::Settled;
            return true;
        };

        self.release_holds(graph, &mut solver);
        let displacement = solver.tick();
        self.solver = Some(solver);
        self.write_back(graph);

        if displacement < CONVERGENCE_THRESHOLD {
            self.phase = LayoutPhase::Settled;
        }
        self.is_settled()
    }

    /// Wake a settled layout back up after a perturbation.
    pub fn resume(&mut self) {
        if let Some(solver) = self.solver.as_mut() {
            solver.reheat();
            self.phase = LayoutPhase::Converging;
        }
    }

    pub fn drag_start(&mut self, graph: &Graph, id: &str) {
        if let Some(i) = graph.node_index(id)
            && let Some(solver) = self.solver.as_mut()
        {
            self.states[i].dragging = true;
            solver.set_locked(i, true);
        }
    }

    /// Move a dragged node.  The node follows the pointer exactly; the rest
    /// of the graph keeps solving around it.
    pub fn drag(&mut self, graph: &mut Graph, id: &str, x: f64, y: f64) {
        if let Some(i) = graph.node_index(id)
            && let Some(solver) = self.solver.as_mut()
        {
            solver.set_position(i, Position::new(x, y));
            solver.reheat();
            graph.nodes[i].x = Some(x);
            graph.nodes[i].y = Some(y);
            self.phase = LayoutPhase::Converging;
        }
    }

    pub fn drag_end(&mut self, graph: &Graph, id: &str) {
        if let Some(i) = graph.node_index(id) {
            self.states[i].dragging = false;
            let user_pinned = graph.nodes[i].user_pinned;
            if let Some(solver) = self.solver.as_mut() {
                solver.set_locked(i, user_pinned || self.states[i].held);
            }
        }
    }

    /// Sync a node's pin flag into the solver after the user toggles it.
    pub fn update_pin(&mut self, graph: &Graph, id: &str) {
        if let Some(i) = graph.node_index(id)
            && let Some(solver) = self.solver.as_mut()
        {
            let state = self.states[i];
            solver.set_locked(
                i,
                graph.nodes[i].user_pinned || state.held || state.dragging,
            );
        }
    }

    /// Push a node's rendered size into the solver and refresh the ideal
    /// length of every link touching it.
    pub fn update_node_size(&mut self, graph: &Graph, index: usize) {
        let Some(solver) = self.solver.as_mut() else {
            return;
        };
        let node = &graph.nodes[index];
        solver.set_size(index, node.width, node.height);
        for (li, link) in graph.links.iter().enumerate() {
            if link.source == index || link.target == index {
                solver.set_ideal_length(li, ideal_link_length(graph, link.source, link.target));
            }
        }
    }

    fn write_back(&self, graph: &mut Graph) {
        let Some(solver) = self.solver.as_ref() else {
            return;
        };
        for (i, node) in graph.nodes.iter_mut().enumerate() {
            let pos = solver.position(i);
            node.x = Some(pos.x);
            node.y = Some(pos.y);
        }
    }
}
