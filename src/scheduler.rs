// Copyright 2026 The Nodegraph Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Animation scheduling.  The host drives [`FrameLoop`] with wall-clock
//! timestamps; the loop converts them into a fixed 60 Hz tick cadence and
//! gates the whole pipeline behind a dirty flag so a settled, untouched
//! diagram costs nothing per frame.

pub const TICK_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// After a long pause (background tab, debugger) we run at most this many
/// catch-up ticks rather than replaying the whole gap.
const MAX_TICKS_PER_FRAME: usize = 4;

#[derive(Clone, Debug)]
pub struct FrameLoop {
    interval_ms: f64,
    last_ms: Option<f64>,
    needs_update: bool,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::with_interval(TICK_INTERVAL_MS)
    }

    pub fn with_interval(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
            needs_update: false,
        }
    }

    /// Mark the simulation dirty: the next frame will tick.
    pub fn request_update(&mut self) {
        self.needs_update = true;
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Called once the layout settles; frames go back to being free.
    pub fn clear(&mut self) {
        self.needs_update = false;
        self.last_ms = None;
    }

    /// Number of simulation ticks due at `now_ms`.  Zero while idle; the
    /// first frame after wake-up always ticks once.
    pub fn ticks_due(&mut self, now_ms: f64) -> usize {
        if !self.needs_update {
            self.last_ms = None;
            return 0;
        }
        match self.last_ms {
            None => {
                self.last_ms = Some(now_ms);
                1
            }
            Some(last) => {
                let elapsed = now_ms - last;
                if elapsed < self.interval_ms {
                    return 0;
                }
                let due = (elapsed / self.interval_ms) as usize;
                let run = due.min(MAX_TICKS_PER_FRAME);
                // advance by whole intervals so cadence stays stable
                self.last_ms = Some(last + due as f64 * self.interval_ms);
                run
            }
        }
    }
}
