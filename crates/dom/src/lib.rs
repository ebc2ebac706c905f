#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]
#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]

//! In-memory document used as the render target of cell trees.
//!
//! Nodes live in an [`indextree`] arena and are addressed by [`DomId`]. The
//! document models what the reconciler needs from a browser DOM: elements
//! with attributes, text nodes, ordered children, ids and a `<head>` that
//! collects stylesheets.

pub mod document;

pub use document::{Content, Dom, DomId, DomNode, NodeKind, Subtree};
