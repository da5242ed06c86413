//! Documentation node model and identifier engine for Bindery.
//!
//! This crate provides:
//! - [`DocNode`]: one documentable unit (module, task, or extra page)
//!   flowing through the build pipeline
//! - [`slugify`] / [`strip_tags`]: normalization of arbitrary titles into
//!   stable, URL- and filesystem-safe identifiers
//! - [`SlugCounter`]: collision disambiguation for derived identifiers
//!
//! Nodes are produced by an extraction stage outside this workspace and
//! handed over as JSON; everything here is `serde`-deserializable.

mod node;
mod slug;

pub use node::{DocNode, Header, NodeKind};
pub use slug::{SlugCounter, slugify, strip_tags};
