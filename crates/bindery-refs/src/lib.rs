//! Cross-reference resolution and diagnostics for Bindery.
//!
//! Rendered content mentions other parts of the corpus symbolically:
//! `<code>` spans holding module, `Module.function/arity`,
//! `t:Module.type/arity` or `c:Module.callback/arity` markers, and relative
//! links to sibling markdown sources. The [`Resolver`] rewrites every marker
//! it can into a concrete intra-corpus link and records a
//! [`ReferenceWarning`] for every one it cannot, carrying the referencing
//! node's source location. Warnings are collected, never raised; a build
//! reports them once on the diagnostic channel and proceeds.

mod resolver;
mod warning;

pub use resolver::{Resolved, Resolver};
pub use warning::{RefKind, ReferenceWarning, WarnReason};
