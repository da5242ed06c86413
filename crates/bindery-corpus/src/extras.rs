//! Loading extra pages from their markdown sources.

use std::path::Path;

use bindery_config::BuildConfig;
use bindery_markdown::render;
use bindery_nodes::{DocNode, NodeKind, SlugCounter, slugify};

use crate::CorpusError;

/// Load and render every configured extra page, in configuration order.
///
/// The output id derives from the source file stem unless the entry carries
/// a `filename` override; either way ids are disambiguated in first-seen
/// order (`readme`, `readme-2`, …). The title falls back from the
/// configured override to the page's first H1 to the file stem.
///
/// # Errors
///
/// Returns [`CorpusError::ExtraRead`] when a source file cannot be read.
pub fn load_extras(config: &BuildConfig) -> Result<Vec<DocNode>, CorpusError> {
    let mut counter = SlugCounter::new();
    let mut nodes = Vec::new();

    for entry in &config.extras {
        let path = entry.path();
        let text =
            std::fs::read_to_string(path).map_err(|source| CorpusError::ExtraRead {
                path: path.to_owned(),
                source,
            })?;
        let page = render(&text);

        let stem = Path::new(path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(path);

        let base_id = match entry.filename() {
            Some(filename) => filename.to_owned(),
            None => slugify(stem),
        };
        let id = counter.disambiguate(&base_id);

        let title = entry
            .title()
            .map(ToOwned::to_owned)
            .or(page.title)
            .unwrap_or_else(|| stem.to_owned());

        let mut node = DocNode::new(id, title, NodeKind::Extra);
        node.content = page.html;
        node.headers = page.headers;
        node.source_path = Some(path.to_owned());
        if let Some(group) = entry.group() {
            node.group = group.to_owned();
        }
        nodes.push(node);
    }

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn config_with_extras(dir: &Path, extras_toml: &str) -> BuildConfig {
        let path = dir.join("bindery.toml");
        std::fs::write(&path, extras_toml).unwrap();
        BuildConfig::load(Some(&path), None).unwrap()
    }

    #[test]
    fn test_load_extra_derives_id_and_title() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("README.md");
        std::fs::write(&file, "# Acme\n\nWelcome.").unwrap();

        let config = config_with_extras(
            dir.path(),
            &format!("extras = [{:?}]", file.to_str().unwrap()),
        );
        let nodes = load_extras(&config).unwrap();

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, "readme");
        assert_eq!(nodes[0].title, "Acme");
        assert!(nodes[0].content.contains("<p>Welcome.</p>"));
        assert_eq!(nodes[0].kind, NodeKind::Extra);
    }

    #[test]
    fn test_load_extra_title_falls_back_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("CHANGELOG.md");
        std::fs::write(&file, "no heading here").unwrap();

        let config = config_with_extras(
            dir.path(),
            &format!("extras = [{:?}]", file.to_str().unwrap()),
        );
        let nodes = load_extras(&config).unwrap();

        assert_eq!(nodes[0].title, "CHANGELOG");
    }

    #[test]
    fn test_load_extra_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("LICENSE.md");
        std::fs::write(&file, "MIT").unwrap();

        let config = config_with_extras(
            dir.path(),
            &format!(
                "[[extras]]\npath = {:?}\nfilename = \"license\"\ntitle = \"License\"\ngroup = \"Legal\"",
                file.to_str().unwrap()
            ),
        );
        let nodes = load_extras(&config).unwrap();

        assert_eq!(nodes[0].id, "license");
        assert_eq!(nodes[0].title, "License");
        assert_eq!(nodes[0].group, "Legal");
    }

    #[test]
    fn test_duplicate_stems_disambiguated_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let first = dir.path().join("README.md");
        let second = sub.join("README.md");
        std::fs::write(&first, "# First").unwrap();
        std::fs::write(&second, "# Second").unwrap();

        let config = config_with_extras(
            dir.path(),
            &format!(
                "extras = [{:?}, {:?}]",
                first.to_str().unwrap(),
                second.to_str().unwrap()
            ),
        );
        let nodes = load_extras(&config).unwrap();

        assert_eq!(nodes[0].id, "readme");
        assert_eq!(nodes[1].id, "readme-2");
    }

    #[test]
    fn test_missing_extra_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_extras(dir.path(), r#"extras = ["does-not-exist.md"]"#);

        let result = load_extras(&config);

        assert!(matches!(result, Err(CorpusError::ExtraRead { .. })));
    }
}
