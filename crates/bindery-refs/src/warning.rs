//! Reference warning model and diagnostic formatting.

use std::fmt;

/// What kind of entity a reference marker pointed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefKind {
    /// Bare module reference.
    Module,
    /// `Module.function/arity` reference.
    Function,
    /// `t:Module.type/arity` reference.
    Type,
    /// `c:Module.callback/arity` reference.
    Callback,
}

impl RefKind {
    /// Label used in diagnostics.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Function => "function",
            Self::Type => "type",
            Self::Callback => "callback",
        }
    }
}

/// Why a reference could not be resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarnReason {
    /// The target does not exist in the corpus at all.
    Undefined,
    /// The target module exists but is excluded from the documentation.
    FilteredModule,
}

/// One unresolvable reference, with the location it was referenced from.
///
/// Emitted, never fatal: the content is still rendered with the marker left
/// as plain text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceWarning {
    /// The literal reference text as written.
    pub reference: String,
    /// Kind of entity referenced.
    pub kind: RefKind,
    /// Id of the node the reference appears in.
    pub node_id: String,
    /// Source file of the referencing node, if known.
    pub source_path: Option<String>,
    /// Source line of the referencing node, if known.
    pub source_line: Option<u32>,
    /// Why resolution failed.
    pub reason: WarnReason,
}

impl fmt::Display for ReferenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            WarnReason::Undefined => write!(
                f,
                "reference to {} {} is undefined",
                self.kind.label(),
                self.reference
            )?,
            WarnReason::FilteredModule => write!(
                f,
                "reference to {} {} points at a module excluded from the documentation",
                self.kind.label(),
                self.reference
            )?,
        }
        let location = match (&self.source_path, self.source_line) {
            (Some(path), Some(line)) => format!("{path}:{line}"),
            (Some(path), None) => path.clone(),
            (None, _) => "?".to_owned(),
        };
        write!(f, "\n  {location}: (in {})", self.node_id)
    }
}
