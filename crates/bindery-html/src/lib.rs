//! Paged HTML site backend for Bindery.
//!
//! Consumes resolved nodes plus the shared [`NavigationModel`] and produces
//! one page per node and extra, the fixed redirect/not-found pages, the
//! versioned asset bundle and the navigation-index artifact. Page rendering
//! fans out over the rayon thread pool (sibling pages have no ordering
//! requirement); all filesystem writes go through the single-writer
//! [`Reconciler`](bindery_output::Reconciler) so repeated builds stay
//! idempotent and stale pages from earlier runs are pruned.

mod assets;
mod template;

use std::path::PathBuf;

use bindery_config::{API_REFERENCE_ID, BuildConfig, INDEX_ID};
use bindery_corpus::NavigationModel;
use bindery_nodes::DocNode;
use bindery_output::{OutputError, Reconciler};
use rayon::prelude::*;

pub use assets::AssetPaths;

use template::PageShell;

/// Subdirectory of the output root owned by this backend.
const FORMAT_DIR: &str = "html";

/// HTML backend error.
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("failed to read logo {path}: {source}")]
    Logo {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Build the paged HTML site into `<output_dir>/html`.
///
/// `nodes` and `extras` must already be reference-resolved for the `html`
/// format. Returns the path of the produced directory.
///
/// # Errors
///
/// Propagates I/O failures; a failure aborts this format's build without
/// touching any other format's output.
pub fn build(
    nodes: &[DocNode],
    extras: &[DocNode],
    model: &NavigationModel,
    config: &BuildConfig,
) -> Result<PathBuf, HtmlError> {
    let mut reconciler = Reconciler::setup(config.output_dir.join(FORMAT_DIR))?;

    let nav_script = format!("window.binderyNav = {};\n", model.to_index_json());
    let mut asset_paths = AssetPaths::new(&nav_script);

    let logo = read_logo(config)?;
    if let Some((rel, _)) = &logo {
        asset_paths = asset_paths.with_logo(rel.clone());
    }

    let shell = PageShell {
        config,
        model,
        assets: &asset_paths,
    };

    // Embarrassingly parallel: one document per node, no ordering among
    // siblings. The join collects into display order regardless.
    let mut documents: Vec<(String, String)> = nodes
        .par_iter()
        .chain(extras.par_iter())
        .map(|node| {
            let source_link = node
                .source_path
                .as_deref()
                .and_then(|path| config.source_link(path, node.source_line));
            let html =
                shell.render_page(&node.id, &node.title, &node.content, source_link.as_deref());
            (format!("{}.html", node.id), html)
        })
        .collect();

    if config.api_reference {
        let content = shell.render_api_reference_content();
        documents.push((
            format!("{API_REFERENCE_ID}.html"),
            shell.render_page(API_REFERENCE_ID, "API Reference", &content, None),
        ));
    }
    documents.push((format!("{INDEX_ID}.html"), shell.render_redirect()));
    documents.push(("404.html".to_owned(), shell.render_not_found()));

    for (rel, html) in &documents {
        reconciler.write(rel, html)?;
    }

    reconciler.write(&asset_paths.stylesheet, assets::STYLESHEET)?;
    reconciler.write(&asset_paths.script, assets::SCRIPT)?;
    reconciler.write(&asset_paths.nav_index, &nav_script)?;
    if let Some((rel, bytes)) = &logo {
        reconciler.write(rel, bytes)?;
    }

    let root = reconciler.finalize()?;
    tracing::info!(path = %root.display(), pages = documents.len(), "built HTML site");
    Ok(root)
}

/// Read the configured logo, returning its output path and contents.
fn read_logo(config: &BuildConfig) -> Result<Option<(String, Vec<u8>)>, HtmlError> {
    let Some(path) = &config.logo else {
        return Ok(None);
    };
    let bytes = std::fs::read(path).map_err(|source| HtmlError::Logo {
        path: path.clone(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("png")
        .to_ascii_lowercase();
    Ok(Some((format!("assets/logo.{ext}"), bytes)))
}
