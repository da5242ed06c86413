//! EPUB package documents: container, OPF manifest, navigation, title page.

use std::fmt::Write;

use bindery_config::BuildConfig;
use bindery_corpus::{NavigationModel, NodeGroup};

use crate::escape;

/// Fixed OCF container document pointing at the package file.
pub(crate) const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// Media type for a packaged file, by extension.
pub(crate) fn media_type(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

/// Render the OPF package document.
///
/// `documents` are the XHTML content files in reading order; `assets` the
/// remaining packaged files. Both are relative to `OEBPS/` and every file
/// is listed in the manifest with its media type; the spine references the
/// documents in order.
pub(crate) fn render_opf(config: &BuildConfig, documents: &[String], assets: &[String]) -> String {
    let mut opf = String::with_capacity(4096);
    opf.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    opf.push('\n');
    opf.push_str(
        r#"<package version="3.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="pub-id">"#,
    );
    opf.push('\n');

    opf.push_str("<metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n");
    let _ = write!(
        opf,
        "<dc:identifier id=\"pub-id\">{}</dc:identifier>\n",
        escape(&identifier(config))
    );
    let _ = write!(
        opf,
        "<dc:title>{} v{}</dc:title>\n",
        escape(&config.project.name),
        escape(&config.project.version)
    );
    opf.push_str("<dc:language>en</dc:language>\n");
    for author in &config.authors {
        let _ = write!(opf, "<dc:creator>{}</dc:creator>\n", escape(author));
    }
    opf.push_str("</metadata>\n");

    opf.push_str("<manifest>\n");
    opf.push_str(
        r#"<item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>"#,
    );
    opf.push('\n');
    for (index, document) in documents.iter().enumerate() {
        let _ = write!(
            opf,
            "<item id=\"doc-{index}\" href=\"{}\" media-type=\"{}\"/>\n",
            escape(document),
            media_type(document)
        );
    }
    for (index, asset) in assets.iter().enumerate() {
        let _ = write!(
            opf,
            "<item id=\"asset-{index}\" href=\"{}\" media-type=\"{}\"/>\n",
            escape(asset),
            media_type(asset)
        );
    }
    opf.push_str("</manifest>\n");

    opf.push_str("<spine>\n");
    for index in 0..documents.len() {
        let _ = write!(opf, "<itemref idref=\"doc-{index}\"/>\n");
    }
    opf.push_str("</spine>\n");

    opf.push_str("</package>\n");
    opf
}

/// Render the EPUB navigation document from the shared model.
pub(crate) fn render_nav(config: &BuildConfig, model: &NavigationModel) -> String {
    let mut nav = String::with_capacity(4096);
    push_xhtml_head(&mut nav, "Table of contents");
    nav.push_str("<nav epub:type=\"toc\">\n<h1>Table of contents</h1>\n<ol>\n");

    let _ = write!(
        nav,
        "<li><a href=\"title.xhtml\">{}</a></li>\n",
        escape(&config.project.name)
    );
    for page in &model.pages {
        let _ = write!(
            nav,
            "<li><a href=\"{}.xhtml\">{}</a></li>\n",
            escape(&page.id),
            escape(&page.title)
        );
    }
    push_nav_groups(&mut nav, "Modules", &model.modules);
    push_nav_groups(&mut nav, "Tasks", &model.tasks);

    nav.push_str("</ol>\n</nav>\n</body>\n</html>\n");
    nav
}

/// Render the title page.
pub(crate) fn render_title_page(config: &BuildConfig) -> String {
    let mut page = String::with_capacity(1024);
    push_xhtml_head(&mut page, &config.project.name);
    let _ = write!(
        page,
        "<h1>{}</h1>\n<p class=\"version\">v{}</p>\n",
        escape(&config.project.name),
        escape(&config.project.version)
    );
    if !config.authors.is_empty() {
        let _ = write!(
            page,
            "<p class=\"authors\">{}</p>\n",
            escape(&config.authors.join(", "))
        );
    }
    page.push_str("</body>\n</html>\n");
    page
}

fn push_nav_groups(nav: &mut String, fallback_heading: &str, groups: &[NodeGroup]) {
    for group in groups {
        if group.nodes.is_empty() {
            continue;
        }
        let heading = if group.name.is_empty() {
            fallback_heading
        } else {
            &group.name
        };
        let _ = write!(nav, "<li><span>{}</span>\n<ol>\n", escape(heading));
        for entry in &group.nodes {
            let _ = write!(
                nav,
                "<li><a href=\"{}.xhtml\">{}</a></li>\n",
                escape(&entry.id),
                escape(&entry.title)
            );
        }
        nav.push_str("</ol>\n</li>\n");
    }
}

fn push_xhtml_head(out: &mut String, title: &str) {
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str(
        r#"<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">"#,
    );
    out.push('\n');
    out.push_str("<head>\n");
    let _ = write!(out, "<title>{}</title>\n", escape(title));
    out.push_str("<link rel=\"stylesheet\" type=\"text/css\" href=\"assets/bindery-epub.css\"/>\n");
    out.push_str("</head>\n<body>\n");
}

/// Publication identifier: the canonical URL when configured, a name/version
/// pair otherwise. Stable across builds so repeated packaging is
/// byte-identical.
fn identifier(config: &BuildConfig) -> String {
    config.canonical.clone().unwrap_or_else(|| {
        format!(
            "urn:bindery:{}:{}",
            config.project.name, config.project.version
        )
    })
}
