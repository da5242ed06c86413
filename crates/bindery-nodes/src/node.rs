//! Documentable units flowing through the build pipeline.

use serde::{Deserialize, Serialize};

/// Kind of a documentable unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// API module with functions, types and callbacks.
    Module,
    /// Runnable task (e.g. a build or maintenance command).
    Task,
    /// Free-form page (README, changelog, guides).
    Extra,
}

impl NodeKind {
    /// Human-readable label used in diagnostics.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Task => "task",
            Self::Extra => "page",
        }
    }
}

/// One heading extracted from a node's rendered content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Anchor id within the page. Empty when the heading text slugifies
    /// to nothing (symbol-only headings get no anchor).
    pub anchor: String,
    /// Heading text with markup stripped.
    pub text: String,
}

/// One documentable unit (module, task, or extra page).
///
/// Nodes are owned read-only by the pipeline for the duration of one build.
/// The `id` is unique within its kind across the whole build; collisions on
/// derived slugs are resolved by the caller with [`SlugCounter`](crate::SlugCounter)
/// before nodes enter the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocNode {
    /// Stable output identifier (also the output filename stem).
    pub id: String,
    /// Display title.
    pub title: String,
    /// Sidebar group name; empty means the default bucket.
    #[serde(default)]
    pub group: String,
    /// Parent grouping key assigned by prefix nesting, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_context: Option<String>,
    /// Title with the nesting prefix stripped, shown under the context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_title: Option<String>,
    /// Pre-rendered HTML body.
    #[serde(default)]
    pub content: String,
    /// Ordered headings extracted from the rendered content.
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Source file for "view source" links and warning locations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    /// Source line for warning locations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_line: Option<u32>,
    /// Kind of this unit.
    pub kind: NodeKind,
    /// Arity-qualified function identifiers (`name/arity`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<String>,
    /// Arity-qualified type identifiers (`name/arity`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    /// Arity-qualified callback identifiers (`name/arity`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callbacks: Vec<String>,
}

impl DocNode {
    /// Create a node with the given identity and no content.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            group: String::new(),
            nested_context: None,
            nested_title: None,
            content: String::new(),
            headers: Vec::new(),
            source_path: None,
            source_line: None,
            kind,
            functions: Vec::new(),
            types: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    /// Location string for diagnostics (`path:line`, `path`, or the id).
    #[must_use]
    pub fn location(&self) -> String {
        match (&self.source_path, self.source_line) {
            (Some(path), Some(line)) => format!("{path}:{line}"),
            (Some(path), None) => path.clone(),
            (None, _) => self.id.clone(),
        }
    }
}
