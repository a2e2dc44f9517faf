// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Headless element tree used in place of the browser DOM.
//!
//! Nodes live in a generational arena. A [`NodeId`] whose node has been
//! destroyed never resolves again, so every accessor on a stale id returns
//! `None`/empty and every mutator is a no-op. Callers rely on that to express
//! "element absent, skip silently" without sprinkling error handling.

mod builder;
mod document;
mod geometry;

pub use builder::ElementBuilder;
pub use document::{Document, NodeId};
pub use geometry::Rect;
