// Copyright 2026 The Nodegraph Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

use crate::datamodel::Rect;

/// A point (or displacement) in layout space.
#[derive(Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(&self, other: Position) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Unit vector in this direction, or zero if the vector is degenerate.
    pub fn normalized(&self) -> Position {
        let len = self.length();
        if len < 1e-12 {
            Position::default()
        } else {
            Position::new(self.x / len, self.y / len)
        }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, rhs: Position) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Position {
    type Output = Position;

    fn mul(self, rhs: f64) -> Position {
        Position::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Where the segment from `from` toward `to` crosses the boundary of
/// `rect`, walking outward from the rect's center.  Used to trim edges to
/// node borders so arrowheads sit on the boundary rather than the center.
/// Falls back to `from` when the segment is degenerate.
pub fn clip_to_bounds(from: Position, to: Position, rect: &Rect) -> Position {
    let dir = to - from;
    let len = dir.length();
    if len < 1e-12 {
        return from;
    }
    let dir = dir.normalized();

    let half_w = rect.width / 2.0;
    let half_h = rect.height / 2.0;

    // distance along dir to the vertical and horizontal boundary lines
    let tx = if dir.x.abs() < 1e-12 {
        f64::INFINITY
    } else {
        half_w / dir.x.abs()
    };
    let ty = if dir.y.abs() < 1e-12 {
        f64::INFINITY
    } else {
        half_h / dir.y.abs()
    };

    let t = tx.min(ty).min(len);
    from + dir * t
}
