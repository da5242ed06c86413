//! Packaged EPUB archive backend for Bindery.
//!
//! Builds the same node/navigation model as the HTML backend into an EPUB
//! publication: one XHTML document per node and extra, an OPF package
//! manifest enumerating every file with its media type, a navigation
//! document, and a title page. The whole tree is written through the
//! [`Reconciler`](bindery_output::Reconciler), zipped into a single archive
//! whose first entry is the uncompressed `mimetype` magic file, and the
//! intermediate tree is deleted so only the archive remains.

mod package;

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::PathBuf;

use bindery_config::{API_REFERENCE_ID, BuildConfig};
use bindery_corpus::NavigationModel;
use bindery_nodes::DocNode;
use bindery_output::{OutputError, Reconciler};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Subdirectory of the output root owned by this backend.
const FORMAT_DIR: &str = "epub";

/// EPUB magic file contents; always the first, uncompressed archive entry.
const MIMETYPE: &str = "application/epub+zip";

/// Stylesheet packaged with every publication.
const STYLESHEET: &str = include_str!("../assets/bindery-epub.css");

/// Format tag handed to injection points.
const FORMAT: &str = "epub";

/// EPUB backend error.
#[derive(Debug, thiserror::Error)]
pub enum EpubError {
    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to package archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Build the EPUB archive into `<output_dir>/epub`.
///
/// `nodes` and `extras` must already be reference-resolved for the `epub`
/// format. Returns the path of the produced archive file.
///
/// # Errors
///
/// Propagates I/O and packaging failures; a failure aborts this format's
/// build without touching any other format's output.
pub fn build(
    nodes: &[DocNode],
    extras: &[DocNode],
    model: &NavigationModel,
    config: &BuildConfig,
) -> Result<PathBuf, EpubError> {
    let mut reconciler = Reconciler::setup(config.output_dir.join(FORMAT_DIR))?;

    let tree = tree_name(config);
    let archive = format!("{tree}.epub");

    // Content documents in reading order: title, API reference and extras
    // (the page sequence), then modules and tasks in sidebar order.
    let mut documents: Vec<(String, String)> = Vec::new();
    documents.push(("title.xhtml".to_owned(), package::render_title_page(config)));

    for page in &model.pages {
        if page.id == API_REFERENCE_ID {
            if config.api_reference {
                let content = api_reference_content(model);
                documents.push((
                    format!("{API_REFERENCE_ID}.xhtml"),
                    render_document(config, "API Reference", &content),
                ));
            }
            continue;
        }
        if let Some(node) = extras.iter().find(|node| node.id == page.id) {
            documents.push((
                format!("{}.xhtml", node.id),
                render_document(config, &node.title, &node.content),
            ));
        }
    }
    for node in nodes {
        documents.push((
            format!("{}.xhtml", node.id),
            render_document(config, &node.title, &node.content),
        ));
    }

    let document_paths: Vec<String> = documents.iter().map(|(path, _)| path.clone()).collect();
    let asset_paths = vec!["assets/bindery-epub.css".to_owned()];

    // Write the publication tree through the reconciler.
    reconciler.write(&format!("{tree}/mimetype"), MIMETYPE)?;
    reconciler.write(
        &format!("{tree}/META-INF/container.xml"),
        package::CONTAINER_XML,
    )?;
    reconciler.write(
        &format!("{tree}/OEBPS/content.opf"),
        package::render_opf(config, &document_paths, &asset_paths),
    )?;
    reconciler.write(
        &format!("{tree}/OEBPS/nav.xhtml"),
        package::render_nav(config, model),
    )?;
    reconciler.write(&format!("{tree}/OEBPS/assets/bindery-epub.css"), STYLESHEET)?;
    for (path, contents) in &documents {
        reconciler.write(&format!("{tree}/OEBPS/{path}"), contents)?;
    }

    // Package the reconciled tree, mimetype first and uncompressed.
    let tree_dir = reconciler.root().join(&tree);
    let archive_path = reconciler.root().join(&archive);
    write_archive(&tree_dir, &archive_path)?;

    // The intermediate tree is gone; only the archive is owned output now.
    std::fs::remove_dir_all(&tree_dir).map_err(|source| EpubError::Io {
        action: "delete",
        path: tree_dir.clone(),
        source,
    })?;
    reconciler.forget_prefix(&format!("{tree}/"));
    reconciler.record(&archive);
    let root = reconciler.finalize()?;

    let artifact = root.join(&archive);
    tracing::info!(path = %artifact.display(), "built EPUB archive");
    Ok(artifact)
}

/// Archive tree and file stem: `name-version`, or just `name` when the
/// project has no version.
fn tree_name(config: &BuildConfig) -> String {
    if config.project.version.is_empty() {
        config.project.name.clone()
    } else {
        format!("{}-{}", config.project.name, config.project.version)
    }
}

/// Render one XHTML content document with the epub injection points.
fn render_document(config: &BuildConfig, title: &str, content: &str) -> String {
    let mut doc = String::with_capacity(content.len() + 1024);
    doc.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    doc.push('\n');
    doc.push_str(r#"<html xmlns="http://www.w3.org/1999/xhtml">"#);
    doc.push('\n');
    doc.push_str("<head>\n");
    let _ = write!(doc, "<title>{}</title>\n", escape(title));
    doc.push_str(
        "<link rel=\"stylesheet\" type=\"text/css\" href=\"assets/bindery-epub.css\"/>\n",
    );
    doc.push_str(&config.before_closing_head_tag.resolve(FORMAT));
    doc.push_str("</head>\n<body>\n");
    doc.push_str(content);
    doc.push('\n');
    doc.push_str(&config.before_closing_body_tag.resolve(FORMAT));
    doc.push_str("</body>\n</html>\n");
    doc
}

/// Linked listing for the API reference document.
fn api_reference_content(model: &NavigationModel) -> String {
    let mut content = String::with_capacity(2048);
    content.push_str("<h1>API Reference</h1>\n<ul>\n");
    for entry in model.all_entries() {
        let _ = write!(
            content,
            "<li><a href=\"{}.xhtml\">{}</a></li>\n",
            escape(&entry.id),
            escape(&entry.title)
        );
    }
    content.push_str("</ul>\n");
    content
}

/// Zip the publication tree: the `mimetype` entry goes first and stored,
/// everything else deflated in sorted order for reproducible archives.
fn write_archive(tree_dir: &std::path::Path, archive_path: &std::path::Path) -> Result<(), EpubError> {
    let file = std::fs::File::create(archive_path).map_err(|source| EpubError::Io {
        action: "create",
        path: archive_path.to_owned(),
        source,
    })?;
    let mut zip = ZipWriter::new(file);

    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    zip.start_file("mimetype", stored)?;
    zip.write_all(MIMETYPE.as_bytes())
        .map_err(|source| EpubError::Io {
            action: "write",
            path: archive_path.to_owned(),
            source,
        })?;

    let mut entries = Vec::new();
    collect_files(tree_dir, tree_dir, &mut entries)?;
    entries.sort();

    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for rel in entries {
        if rel == "mimetype" {
            continue;
        }
        let path = tree_dir.join(&rel);
        let contents = std::fs::read(&path).map_err(|source| EpubError::Io {
            action: "read",
            path: path.clone(),
            source,
        })?;
        zip.start_file(rel, deflated)?;
        zip.write_all(&contents).map_err(|source| EpubError::Io {
            action: "write",
            path: archive_path.to_owned(),
            source,
        })?;
    }

    zip.finish()?;
    Ok(())
}

/// Collect file paths under `dir` relative to `base`, forward-slashed.
fn collect_files(
    base: &std::path::Path,
    dir: &std::path::Path,
    out: &mut Vec<String>,
) -> Result<(), EpubError> {
    let entries = std::fs::read_dir(dir).map_err(|source| EpubError::Io {
        action: "read",
        path: dir.to_owned(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| EpubError::Io {
            action: "read",
            path: dir.to_owned(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(base, &path, out)?;
        } else if let Ok(rel) = path.strip_prefix(base) {
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

/// Escape XML special characters.
pub(crate) fn escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
