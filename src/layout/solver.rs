// Copyright 2026 The Nodegraph Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Incremental constraint solver.  Unlike a batch layout pass, the solver
//! advances one tick at a time so the host can interleave ticks with
//! rendering; each tick relaxes springs along links, repels non-adjacent
//! neighbors, and then runs projection passes for flow ordering and
//! overlap removal.

use std::collections::HashSet;

use crate::datamodel::Rect;
use crate::layout::geom::Position;

/// Flow axis for layered layouts: every link's target is kept at least
/// `min_separation` past its source along this axis.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FlowAxis {
    X,
    Y,
}

#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Base ideal link length; callers fold per-endpoint size terms into
    /// each link's `ideal_length` on top of this.
    pub link_distance: f64,
    /// Minimum ordered separation for flow layouts.
    pub min_separation: f64,
    pub flow: Option<FlowAxis>,
    /// Fraction of the spring error corrected per tick.
    pub stiffness: f64,
    /// Repulsion gain for non-adjacent pairs inside the cutoff radius.
    pub repulsion: f64,
    /// Pull of group members toward their group centroid.
    pub group_pull: f64,
    /// Multiplicative cooling applied to the step scale when displacement
    /// rises between ticks.
    pub cooling_factor: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            link_distance: 80.0,
            min_separation: 160.0,
            flow: None,
            stiffness: 0.5,
            repulsion: 0.08,
            group_pull: 0.02,
            cooling_factor: 0.9,
        }
    }
}

/// A node as the solver sees it: a position, a rendered extent, and a
/// locked flag.  Locked covers user pins, the engine's re-init hold and
/// active drags alike; the solver does not care why a node is immovable.
#[derive(Clone, Copy, Debug)]
pub struct SolverNode {
    pub pos: Position,
    pub width: f64,
    pub height: f64,
    pub locked: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct SolverLink {
    pub source: usize,
    pub target: usize,
    /// Spring rest length, already including endpoint size terms.
    pub ideal_length: f64,
}

pub struct Solver {
    config: SolverConfig,
    nodes: Vec<SolverNode>,
    links: Vec<SolverLink>,
    groups: Vec<Vec<usize>>,
    adjacent: HashSet<(usize, usize)>,
    step: f64,
    prev_norm: f64,
}

impl Solver {
    pub fn new(
        config: SolverConfig,
        nodes: Vec<SolverNode>,
        links: Vec<SolverLink>,
        groups: Vec<Vec<usize>>,
    ) -> Self {
        let mut adjacent = HashSet::new();
        for link in &links {
            let (a, b) = (link.source.min(link.target), link.source.max(link.target));
            adjacent.insert((a, b));
        }
        Self {
            config,
            nodes,
            links,
            groups,
            adjacent,
            step: 1.0,
            prev_norm: f64::MAX,
        }
    }

    pub fn nodes(&self) -> &[SolverNode] {
        &self.nodes
    }

    pub fn position(&self, i: usize) -> Position {
        self.nodes[i].pos
    }

    pub fn set_position(&mut self, i: usize, pos: Position) {
        self.nodes[i].pos = pos;
    }

    pub fn set_locked(&mut self, i: usize, locked: bool) {
        self.nodes[i].locked = locked;
    }

    pub fn set_size(&mut self, i: usize, width: f64, height: f64) {
        self.nodes[i].width = width;
        self.nodes[i].height = height;
    }

    pub fn set_ideal_length(&mut self, link: usize, ideal_length: f64) {
        self.links[link].ideal_length = ideal_length;
    }

    /// Reset the adaptive step after an external perturbation (drag,
    /// structural change) so the solver moves freely again.
    pub fn reheat(&mut self) {
        self.step = 1.0;
        self.prev_norm = f64::MAX;
    }

    /// Direction from `a` to `b`, with a deterministic nudge when the two
    /// points coincide so coincident nodes separate instead of sticking.
    fn separation_axis(a: Position, b: Position, i: usize) -> (Position, f64) {
        let delta = b - a;
        let dist = delta.length();
        if dist < 1e-9 {
            let angle = (i as f64) * 0.7 + 0.3;
            (Position::new(angle.cos(), angle.sin()), 1e-9)
        } else {
            (delta * (1.0 / dist), dist)
        }
    }

    /// Advance the simulation one tick.  Returns the average displacement
    /// per free node, the caller's convergence signal.
    pub fn tick(&mut self) -> f64 {
        let n = self.nodes.len();
        if n == 0 {
            return 0.0;
        }

        let mut moves: Vec<Position> = vec![Position::default(); n];

        // spring relaxation along links; a locked endpoint pushes its whole
        // correction onto the free one
        for link in &self.links {
            let a = self.nodes[link.source];
            let b = self.nodes[link.target];
            if a.locked && b.locked {
                continue;
            }
            let (dir, dist) = Self::separation_axis(a.pos, b.pos, link.source);
            let correction = (dist - link.ideal_length) * self.config.stiffness;
            let (sa, sb) = match (a.locked, b.locked) {
                (false, false) => (0.5, 0.5),
                (false, true) => (1.0, 0.0),
                (true, false) => (0.0, 1.0),
                (true, true) => unreachable!(),
            };
            moves[link.source] += dir * (correction * sa);
            moves[link.target] += dir * (-correction * sb);
        }

        // short-range repulsion between non-adjacent pairs
        let cutoff = self.config.link_distance;
        for i in 0..n {
            for j in (i + 1)..n {
                if self.adjacent.contains(&(i, j)) {
                    continue;
                }
                let a = self.nodes[i];
                let b = self.nodes[j];
                if a.locked && b.locked {
                    continue;
                }
                let (dir, dist) = Self::separation_axis(a.pos, b.pos, i);
                if dist >= cutoff {
                    continue;
                }
                let push = self.config.repulsion * (cutoff - dist);
                let (sa, sb) = match (a.locked, b.locked) {
                    (false, false) => (0.5, 0.5),
                    (false, true) => (1.0, 0.0),
                    (true, false) => (0.0, 1.0),
                    (true, true) => unreachable!(),
                };
                moves[i] += dir * (-push * sa);
                moves[j] += dir * (push * sb);
            }
        }

        // weak centroid attraction keeps group members together
        for group in &self.groups {
            if group.len() < 2 {
                continue;
            }
            let mut centroid = Position::default();
            for &i in group {
                centroid += self.nodes[i].pos;
            }
            let centroid = centroid * (1.0 / group.len() as f64);
            for &i in group {
                if self.nodes[i].locked {
                    continue;
                }
                moves[i] += (centroid - self.nodes[i].pos) * self.config.group_pull;
            }
        }

        let mut norm = 0.0;
        let mut free = 0usize;
        for i in 0..n {
            if self.nodes[i].locked {
                continue;
            }
            let displacement = moves[i] * self.step;
            norm += displacement.length();
            free += 1;
            self.nodes[i].pos += displacement;
        }

        self.project_flow_separation(&mut norm);
        self.project_overlaps(&mut norm);

        // adaptive cooling: damp the step when displacement rises, recover
        // slowly when it falls
        if norm >= self.prev_norm {
            self.step *= self.config.cooling_factor;
        } else if norm <= 0.95 * self.prev_norm {
            self.step = (self.step * 0.99 / self.config.cooling_factor).min(1.0);
        }
        self.prev_norm = norm;

        if free == 0 { 0.0 } else { norm / free as f64 }
    }

    /// Projection pass that restores the flow ordering invariant: along the
    /// flow axis, every link's target sits at least `min_separation` past
    /// its source.  Violations are resolved exactly, split between free
    /// endpoints or pushed wholly onto the only free one.  Self-loops have
    /// no ordering to enforce and are skipped.
    fn project_flow_separation(&mut self, norm: &mut f64) {
        let Some(axis) = self.config.flow else {
            return;
        };
        let min_sep = self.config.min_separation;

        for link in &self.links {
            if link.source == link.target {
                continue;
            }
            let a = self.nodes[link.source];
            let b = self.nodes[link.target];
            if a.locked && b.locked {
                continue;
            }
            let (ca, cb) = match axis {
                FlowAxis::X => (a.pos.x, b.pos.x),
                FlowAxis::Y => (a.pos.y, b.pos.y),
            };
            let violation = (ca + min_sep) - cb;
            if violation <= 0.0 {
                continue;
            }
            let (da, db) = match (a.locked, b.locked) {
                (false, false) => (-violation / 2.0, violation / 2.0),
                (false, true) => (-violation, 0.0),
                (true, false) => (0.0, violation),
                (true, true) => unreachable!(),
            };
            match axis {
                FlowAxis::X => {
                    self.nodes[link.source].pos.x += da;
                    self.nodes[link.target].pos.x += db;
                }
                FlowAxis::Y => {
                    self.nodes[link.source].pos.y += da;
                    self.nodes[link.target].pos.y += db;
                }
            }
            *norm += da.abs() + db.abs();
        }
    }

    /// Projection pass that separates overlapping node boxes along the axis
    /// of least penetration.
    fn project_overlaps(&mut self, norm: &mut f64) {
        let n = self.nodes.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let a = self.nodes[i];
                let b = self.nodes[j];
                if a.locked && b.locked {
                    continue;
                }
                let ra = Rect::centered(a.pos.x, a.pos.y, a.width, a.height);
                let rb = Rect::centered(b.pos.x, b.pos.y, b.width, b.height);
                if !ra.overlaps(&rb) {
                    continue;
                }

                let pen_x = (a.width + b.width) / 2.0 - (b.pos.x - a.pos.x).abs();
                let pen_y = (a.height + b.height) / 2.0 - (b.pos.y - a.pos.y).abs();

                let (dx, dy) = if pen_x < pen_y {
                    let sign = if b.pos.x >= a.pos.x { 1.0 } else { -1.0 };
                    (sign * pen_x, 0.0)
                } else {
                    let sign = if b.pos.y >= a.pos.y { 1.0 } else { -1.0 };
                    (0.0, sign * pen_y)
                };

                let (sa, sb) = match (a.locked, b.locked) {
                    (false, false) => (0.5, 0.5),
                    (false, true) => (1.0, 0.0),
                    (true, false) => (0.0, 1.0),
                    (true, true) => unreachable!(),
                };
                self.nodes[i].pos.x -= dx * sa;
                self.nodes[i].pos.y -= dy * sa;
                self.nodes[j].pos.x += dx * sb;
                self.nodes[j].pos.y += dy * sb;
                *norm += (dx.abs() + dy.abs()) * (sa + sb) * 0.5;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_at(x: f64, y: f64) -> SolverNode {
        SolverNode {
            pos: Position::new(x, y),
            width: 50.0,
            height: 50.0,
            locked: false,
        }
    }

    fn link(source: usize, target: usize, ideal_length: f64) -> SolverLink {
        SolverLink {
            source,
            target,
            ideal_length,
        }
    }

    fn run_to_rest(solver: &mut Solver, max_ticks: usize) -> f64 {
        let mut last = f64::MAX;
        for _ in 0..max_ticks {
            last = solver.tick();
            if last < 0.05 {
                break;
            }
        }
        last
    }

    #[test]
    fn test_spring_converges_to_ideal_length() {
        let mut solver = Solver::new(
            SolverConfig::default(),
            vec![node_at(0.0, 0.0), node_at(400.0, 0.0)],
            vec![link(0, 1, 120.0)],
            vec![],
        );

        let residual = run_to_rest(&mut solver, 200);
        assert!(residual < 0.05, "did not converge: residual {residual}");

        let dist = (solver.position(1) - solver.position(0)).length();
        assert!(
            (dist - 120.0).abs() < 1.0,
            "link length should settle near ideal: got {dist}"
        );
    }

    #[test]
    fn test_locked_node_never_moves() {
        let mut nodes = vec![node_at(0.0, 0.0), node_at(300.0, 0.0)];
        nodes[0].locked = true;
        let mut solver = Solver::new(
            SolverConfig::default(),
            nodes,
            vec![link(0, 1, 100.0)],
            vec![],
        );

        run_to_rest(&mut solver, 200);

        let locked = solver.position(0);
        assert!(locked.x.abs() < 1e-12 && locked.y.abs() < 1e-12, "locked node moved: {locked:?}");
        // the free endpoint absorbed the whole correction
        let dist = (solver.position(1) - locked).length();
        assert!((dist - 100.0).abs() < 1.0, "length: {dist}");
    }

    #[test]
    fn test_repulsion_separates_unlinked_nodes() {
        let mut solver = Solver::new(
            SolverConfig::default(),
            vec![node_at(0.0, 0.0), node_at(5.0, 0.0)],
            vec![],
            vec![],
        );

        run_to_rest(&mut solver, 400);

        let dist = (solver.position(1) - solver.position(0)).length();
        assert!(dist > 40.0, "unlinked nodes should spread apart: {dist}");
    }

    #[test]
    fn test_coincident_nodes_separate() {
        let mut solver = Solver::new(
            SolverConfig::default(),
            vec![node_at(10.0, 10.0), node_at(10.0, 10.0)],
            vec![],
            vec![],
        );

        solver.tick();
        let dist = (solver.position(1) - solver.position(0)).length();
        assert!(dist > 0.0, "coincident nodes must not stick together");
    }

    #[test]
    fn test_flow_separation_enforced() {
        let config = SolverConfig {
            flow: Some(FlowAxis::X),
            ..Default::default()
        };
        let mut solver = Solver::new(
            config,
            vec![node_at(100.0, 0.0), node_at(0.0, 0.0)],
            vec![link(0, 1, 80.0)],
            vec![],
        );

        run_to_rest(&mut solver, 400);

        let gap = solver.position(1).x - solver.position(0).x;
        assert!(
            gap >= 160.0 - 1e-6,
            "flow target must trail source by min_separation: gap {gap}"
        );
    }

    #[test]
    fn test_flow_separation_respects_lock() {
        let config = SolverConfig {
            flow: Some(FlowAxis::Y),
            ..Default::default()
        };
        let mut nodes = vec![node_at(0.0, 50.0), node_at(0.0, 0.0)];
        nodes[0].locked = true;
        let mut solver = Solver::new(config, nodes, vec![link(0, 1, 80.0)], vec![]);

        run_to_rest(&mut solver, 400);

        assert!((solver.position(0).y - 50.0).abs() < 1e-12);
        assert!(solver.position(1).y >= 50.0 + 160.0 - 1e-6);
    }

    #[test]
    fn test_flow_ignores_self_loops() {
        let config = SolverConfig {
            flow: Some(FlowAxis::X),
            ..Default::default()
        };
        // a node linked to itself must not keep feeding separation error
        // into the displacement norm forever
        let mut solver = Solver::new(
            config,
            vec![node_at(0.0, 0.0), node_at(200.0, 0.0)],
            vec![link(0, 0, 80.0), link(0, 1, 80.0)],
            vec![],
        );

        let residual = run_to_rest(&mut solver, 400);
        assert!(residual < 0.05, "self-loop kept the solver hot: {residual}");
        assert!(solver.position(1).x - solver.position(0).x >= 160.0 - 1e-6);
    }

    #[test]
    fn test_overlap_projection_separates_boxes() {
        // linked so the repulsion cutoff does not apply; boxes still must
        // not overlap once settled
        let mut solver = Solver::new(
            SolverConfig::default(),
            vec![node_at(0.0, 0.0), node_at(10.0, 0.0)],
            vec![link(0, 1, 80.0)],
            vec![],
        );

        run_to_rest(&mut solver, 200);

        let a = solver.nodes()[0];
        let b = solver.nodes()[1];
        let ra = Rect::centered(a.pos.x, a.pos.y, a.width, a.height);
        let rb = Rect::centered(b.pos.x, b.pos.y, b.width, b.height);
        assert!(!ra.overlaps(&rb), "boxes still overlap: {ra:?} vs {rb:?}");
    }

    #[test]
    fn test_group_members_stay_close() {
        let mut solver = Solver::new(
            SolverConfig::default(),
            vec![
                node_at(0.0, 0.0),
                node_at(500.0, 0.0),
                node_at(250.0, 400.0),
            ],
            vec![],
            vec![vec![0, 1]],
        );

        let spread_before = (solver.position(1) - solver.position(0)).length();
        for _ in 0..50 {
            solver.tick();
        }
        let spread_after = (solver.position(1) - solver.position(0)).length();
        assert!(
            spread_after < spread_before,
            "grouped nodes should pull together: {spread_before} -> {spread_after}"
        );
    }

    #[test]
    fn test_deterministic() {
        let build = || {
            Solver::new(
                SolverConfig::default(),
                vec![node_at(0.0, 0.0), node_at(30.0, 20.0), node_at(7.0, 90.0)],
                vec![link(0, 1, 100.0), link(1, 2, 100.0)],
                vec![],
            )
        };
        let mut s1 = build();
        let mut s2 = build();
        for _ in 0..100 {
            s1.tick();
            s2.tick();
        }
        for i in 0..3 {
            let (p1, p2) = (s1.position(i), s2.position(i));
            assert!((p1.x - p2.x).abs() < 1e-15, "x mismatch for node {i}");
            assert!((p1.y - p2.y).abs() < 1e-15, "y mismatch for node {i}");
        }
    }

    #[test]
    fn test_empty_solver() {
        let mut solver = Solver::new(SolverConfig::default(), vec![], vec![], vec![]);
        assert!(solver.tick().abs() < f64::EPSILON);
    }
}
