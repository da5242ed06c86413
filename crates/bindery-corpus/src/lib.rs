//! Corpus assembly for Bindery.
//!
//! This crate turns the flat node list plus configuration into the single
//! [`NavigationModel`] shared by every output format:
//!
//! - modules and tasks are nested under configured prefixes and partitioned
//!   into ordered sidebar groups
//! - extra pages are loaded from their markdown sources, given
//!   collision-free ids, and sequenced into the flat page list
//! - every page gets its `previous`/`next` neighbors
//!
//! The model is purely structural (ids, titles, order, nesting,
//! pagination) and contains no rendered HTML, which is what lets the HTML
//! and EPUB backends share it unchanged.

mod assembler;
mod extras;
mod model;

pub use assembler::{Assembler, NodeComparator};
pub use extras::load_extras;
pub use model::{NavEntry, NavigationModel, NodeGroup, PageLink, PageRef};

/// Corpus assembly error.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("failed to read extra page {path}: {source}")]
    ExtraRead {
        path: String,
        source: std::io::Error,
    },
}
