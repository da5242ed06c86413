//! `bindery build` command implementation.

use std::collections::HashSet;
use std::path::PathBuf;

use bindery_config::{BuildConfig, CliSettings, Format};
use bindery_corpus::{Assembler, load_extras};
use bindery_nodes::{DocNode, NodeKind};
use bindery_refs::{ReferenceWarning, Resolver};
use clap::Args;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Extracted documentation nodes (JSON list).
    #[arg(short, long)]
    nodes: PathBuf,

    /// Path to configuration file (default: bindery.toml in the current
    /// directory, when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Project name (overrides config).
    #[arg(long)]
    project_name: Option<String>,

    /// Project version (overrides config).
    #[arg(long)]
    project_version: Option<String>,

    /// Comma-separated output formats to build.
    #[arg(long, value_delimiter = ',', default_value = "html,epub")]
    formats: Vec<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl BuildArgs {
    pub(crate) fn execute(self, version: &str, output: &Output) -> Result<(), CliError> {
        let formats = self
            .formats
            .iter()
            .map(|tag| {
                Format::parse(tag)
                    .ok_or_else(|| CliError::Validation(format!("unknown format: {tag}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cli_settings = CliSettings {
            output_dir: self.output_dir.clone(),
            project_name: self.project_name.clone(),
            project_version: self.project_version.clone(),
        };
        let config_path = self.config.clone().or_else(|| {
            let default = PathBuf::from("bindery.toml");
            default.is_file().then_some(default)
        });
        // Configuration validation happens here, before any output I/O.
        let config = BuildConfig::load(config_path.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "bindery {version} building {} v{}",
            config.project.name, config.project.version
        ));

        let text = std::fs::read_to_string(&self.nodes)?;
        let all_nodes: Vec<DocNode> = serde_json::from_str(&text)?;

        // Filtered modules leave the documentation set but stay known to the
        // resolver so cross-references to them are diagnosed, not broken.
        let (nodes, filtered): (Vec<DocNode>, Vec<DocNode>) = all_nodes
            .into_iter()
            .partition(|node| node.kind == NodeKind::Extra || !config.is_filtered(&node.title));
        let filtered_names: HashSet<String> =
            filtered.into_iter().map(|node| node.title).collect();

        let extras = load_extras(&config)?;

        let mut indexed = nodes.clone();
        indexed.extend(extras.iter().cloned());
        let resolver = Resolver::new(&indexed)
            .with_filtered(filtered_names)
            .with_skip_warnings(
                config
                    .skip_undefined_reference_warnings_on
                    .iter()
                    .cloned()
                    .collect(),
            );

        let model = Assembler::new(&config).assemble(&nodes, &extras);

        let main = config.main_page();
        if model.page(main).is_none() && !nodes.iter().any(|node| node.id == main) {
            output.warning(&format!(
                "main page \"{main}\" does not exist, the index redirect will be broken"
            ));
        }

        let mut warnings_reported = false;
        for format in formats {
            let ext = match format {
                Format::Html => "html",
                Format::Epub => "xhtml",
            };

            let mut warnings: Vec<ReferenceWarning> = Vec::new();
            let resolved_nodes = resolve_all(&resolver, &nodes, ext, &mut warnings);
            let resolved_extras = resolve_all(&resolver, &extras, ext, &mut warnings);

            // Warnings are identical across formats; report them once per
            // build, after resolution and before rendering.
            if !warnings_reported {
                for warning in &warnings {
                    output.warning(&warning.to_string());
                }
                if !warnings.is_empty() {
                    output.warning(&format!("{} reference warning(s)", warnings.len()));
                }
                warnings_reported = true;
            }

            let artifact = match format {
                Format::Html => {
                    bindery_html::build(&resolved_nodes, &resolved_extras, &model, &config)?
                }
                Format::Epub => {
                    bindery_epub::build(&resolved_nodes, &resolved_extras, &model, &config)?
                }
            };
            output.success(&format!("{}: {}", format.as_str(), artifact.display()));
        }

        Ok(())
    }
}

/// Resolve every node's content for one output format.
fn resolve_all(
    resolver: &Resolver,
    nodes: &[DocNode],
    ext: &str,
    warnings: &mut Vec<ReferenceWarning>,
) -> Vec<DocNode> {
    nodes
        .iter()
        .map(|node| {
            let resolved = resolver.resolve(node, ext);
            warnings.extend(resolved.warnings);
            let mut node = node.clone();
            node.content = resolved.content;
            node
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_nodes(dir: &std::path::Path, json: &str) -> PathBuf {
        let path = dir.join("nodes.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    fn args(nodes: PathBuf, config: Option<PathBuf>, formats: &str) -> BuildArgs {
        BuildArgs {
            nodes,
            config,
            output_dir: None,
            project_name: None,
            project_version: None,
            formats: formats.split(',').map(ToOwned::to_owned).collect(),
            verbose: false,
        }
    }

    #[test]
    fn test_build_from_nodes_json() {
        let dir = tempfile::tempdir().unwrap();
        let nodes = write_nodes(
            dir.path(),
            r#"[{"id": "Alpha", "title": "Alpha", "kind": "module",
                "content": "<p>docs</p>", "functions": ["run/0"]}]"#,
        );
        let config_path = dir.path().join("bindery.toml");
        std::fs::write(
            &config_path,
            format!(
                "output_dir = {:?}\n[project]\nname = \"acme\"",
                dir.path().join("doc").to_str().unwrap()
            ),
        )
        .unwrap();

        let result = args(nodes, Some(config_path), "html").execute("0.0.0", &Output::new());

        assert!(result.is_ok());
        assert!(dir.path().join("doc/html/Alpha.html").is_file());
        assert!(dir.path().join("doc/html/index.html").is_file());
    }

    #[test]
    fn test_unknown_format_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let nodes = write_nodes(dir.path(), "[]");

        let result = args(nodes, None, "pdf").execute("0.0.0", &Output::new());

        assert!(matches!(result, Err(CliError::Validation(_))));
    }

    #[test]
    fn test_reserved_main_page_fails_before_any_io() {
        let dir = tempfile::tempdir().unwrap();
        let nodes = write_nodes(dir.path(), "[]");
        let out_dir = dir.path().join("doc");
        let config_path = dir.path().join("bindery.toml");
        std::fs::write(
            &config_path,
            format!(
                "main = \"index\"\noutput_dir = {:?}",
                out_dir.to_str().unwrap()
            ),
        )
        .unwrap();

        let result =
            args(nodes, Some(config_path), "html").execute("0.0.0", &Output::new());

        assert!(matches!(
            result,
            Err(CliError::Config(
                bindery_config::ConfigError::ReservedMainPage
            ))
        ));
        // Nothing was written.
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_filtered_modules_excluded_from_output() {
        let dir = tempfile::tempdir().unwrap();
        let nodes = write_nodes(
            dir.path(),
            r#"[{"id": "Alpha", "title": "Alpha", "kind": "module"},
                {"id": "Alpha.Internal", "title": "Alpha.Internal", "kind": "module"}]"#,
        );
        let config_path = dir.path().join("bindery.toml");
        std::fs::write(
            &config_path,
            format!(
                "output_dir = {:?}\nfilter_modules = \"Internal\"",
                dir.path().join("doc").to_str().unwrap()
            ),
        )
        .unwrap();

        args(nodes, Some(config_path), "html")
            .execute("0.0.0", &Output::new())
            .unwrap();

        assert!(dir.path().join("doc/html/Alpha.html").is_file());
        assert!(!dir.path().join("doc/html/Alpha.Internal.html").exists());
    }
}
