//! Polymorphic injection points for caller-supplied page markup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Callback resolving an injection for a format tag.
pub type InjectionFn = dyn Fn(&str) -> String + Send + Sync;

/// Callback resolving an injection for a format tag plus a caller argument.
pub type InjectionWithArgFn = dyn Fn(&str, &str) -> String + Send + Sync;

/// Markup source spliced into generated pages before the closing head/body
/// tags.
///
/// The data-bearing variants ([`Injection::Static`], [`Injection::ByFormat`])
/// can be expressed in the config file; the callback variants are
/// constructed through the API. Each source is resolved once per render call
/// with the output format tag.
#[derive(Clone, Default)]
pub enum Injection {
    /// Nothing to inject.
    #[default]
    None,
    /// Same markup for every format.
    Static(String),
    /// Markup keyed by format tag; missing keys resolve to empty.
    ByFormat(HashMap<String, String>),
    /// Callback receiving the format tag.
    Callback(Arc<InjectionFn>),
    /// Callback receiving the format tag and a caller-supplied argument.
    CallbackWithArg {
        /// The callback.
        fun: Arc<InjectionWithArgFn>,
        /// Argument passed through on every call.
        arg: String,
    },
}

impl Injection {
    /// Resolve this injection for the given format tag.
    #[must_use]
    pub fn resolve(&self, format: &str) -> String {
        match self {
            Self::None => String::new(),
            Self::Static(text) => text.clone(),
            Self::ByFormat(map) => map.get(format).cloned().unwrap_or_default(),
            Self::Callback(fun) => fun(format),
            Self::CallbackWithArg { fun, arg } => fun(format, arg),
        }
    }
}

impl fmt::Debug for Injection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("Injection::None"),
            Self::Static(text) => f.debug_tuple("Injection::Static").field(text).finish(),
            Self::ByFormat(map) => f.debug_tuple("Injection::ByFormat").field(map).finish(),
            Self::Callback(_) => f.write_str("Injection::Callback(..)"),
            Self::CallbackWithArg { arg, .. } => f
                .debug_struct("Injection::CallbackWithArg")
                .field("arg", arg)
                .finish_non_exhaustive(),
        }
    }
}
