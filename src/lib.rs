// Copyright 2026 The Nodegraph Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

pub mod common;
pub mod datamodel;
pub mod editor;
pub mod json;
pub mod layout;
pub mod ops;
pub mod render;
pub mod scheduler;

pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::datamodel::{Graph, Group, LayoutOptions, LayoutType, Link, Node, Transform};
pub use self::editor::{ExportFormat, GraphEditor};
pub use self::layout::{CONVERGENCE_THRESHOLD, LayoutEngine, LayoutPhase};
pub use self::scheduler::{FrameLoop, TICK_INTERVAL_MS};
