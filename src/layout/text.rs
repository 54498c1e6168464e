// Copyright 2026 The Nodegraph Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

const CHAR_WIDTH: f64 = 7.0;
const LINE_HEIGHT: f64 = 14.0;

/// Estimate text width based on character count.
///
/// Uses a simple heuristic: each character is approximately 7 pixels wide.
/// This is a rough approximation suitable for layout planning, not precise
/// text rendering.
pub fn estimate_text_width(text: &str) -> f64 {
    text.chars().count() as f64 * CHAR_WIDTH
}

/// Estimated `(width, height)` of a label.  Labels may contain explicit
/// newlines; width is the widest line and height is one line-height per
/// line.  The empty label still occupies one line so an unlabeled node
/// keeps a non-degenerate text slot.
pub fn measure_label(text: &str) -> (f64, f64) {
    let lines: Vec<&str> = text.split('\n').collect();
    let max_line_width = lines
        .iter()
        .map(|line| estimate_text_width(line))
        .fold(0.0_f64, f64::max);
    let total_height = lines.len() as f64 * LINE_HEIGHT;
    (max_line_width, total_height)
}
