//! Configuration management for Bindery.
//!
//! Parses `bindery.toml` configuration files with serde, applies CLI
//! overrides during load, and validates everything that must fail before any
//! output is written:
//!
//! - the main page aliasing the reserved `index` redirect id
//! - an unsupported logo image format
//! - an invalid `filter_modules` pattern
//!
//! The parsed [`BuildConfig`] is read-only input to every later pipeline
//! stage; nothing here touches the filesystem beyond reading the config file
//! and probing the logo extension.

mod injection;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

pub use injection::Injection;

/// The reserved id of the generated redirect page. A configured main page
/// must never alias it.
pub const INDEX_ID: &str = "index";

/// Default id of the generated API reference page.
pub const API_REFERENCE_ID: &str = "api-reference";

/// Configuration error, always fatal and raised before any output I/O.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },

    #[error("\"main\" must not be set to \"{INDEX_ID}\", it is reserved for the redirect page")]
    ReservedMainPage,

    #[error("unsupported logo image format: {0} (expected png, jpg or svg)")]
    UnsupportedLogo(String),

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: Box<regex::Error>,
    },
}

/// Output format tag, shared by backends and injection resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// Paged HTML site.
    Html,
    /// Packaged EPUB archive.
    Epub,
}

impl Format {
    /// Format tag used in per-format injection tables and CLI arguments.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Epub => "epub",
        }
    }

    /// Parse a format tag.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "html" => Some(Self::Html),
            "epub" => Some(Self::Epub),
            _ => None,
        }
    }
}

/// One extra page entry: a bare path or a path with overrides.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ExtraEntry {
    /// Bare source path; title and id derive from the file.
    Path(String),
    /// Source path with explicit overrides.
    Detailed {
        /// Source path of the page.
        path: String,
        /// Output filename/id override.
        #[serde(default)]
        filename: Option<String>,
        /// Title override.
        #[serde(default)]
        title: Option<String>,
        /// Sidebar group override.
        #[serde(default)]
        group: Option<String>,
    },
}

impl ExtraEntry {
    /// Source path of this entry.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Path(path) | Self::Detailed { path, .. } => path,
        }
    }

    /// Configured filename override, if any.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Detailed { filename, .. } => filename.as_deref(),
        }
    }

    /// Configured title override, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Detailed { title, .. } => title.as_deref(),
        }
    }

    /// Configured group override, if any.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Detailed { group, .. } => group.as_deref(),
        }
    }
}

/// One sidebar group rule: a name plus ordered membership patterns.
///
/// A pattern matches a node if it equals the node's name exactly, or if it
/// compiles as a regex that full-matches the name. Exact comparison is tried
/// first since module names legitimately contain regex metacharacters (`.`).
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct GroupRule {
    /// Group display name.
    pub name: String,
    /// Membership patterns, in priority order.
    pub matches: Vec<String>,
}

impl GroupRule {
    /// Whether `name` is a member of this group.
    #[must_use]
    pub fn is_member(&self, name: &str) -> bool {
        self.matches.iter().any(|pattern| {
            if pattern == name {
                return true;
            }
            Regex::new(&format!("^(?:{pattern})$"))
                .map(|re| re.is_match(name))
                .unwrap_or(false)
        })
    }
}

/// Group rules for modules and extras.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GroupsConfig {
    /// Rules applied to module and task nodes.
    pub modules: Vec<GroupRule>,
    /// Rules applied to extra pages.
    pub extras: Vec<GroupRule>,
}

/// Project identity section.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Project name, used in page titles and the archive filename.
    pub name: String,
    /// Project version.
    #[serde(default)]
    pub version: String,
}

/// Raw injection point as parsed from TOML: a static string or a
/// format-keyed table. Callback variants are API-only.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum InjectionRaw {
    Static(String),
    ByFormat(HashMap<String, String>),
}

impl InjectionRaw {
    fn resolve(raw: Option<Self>) -> Injection {
        match raw {
            None => Injection::default(),
            Some(Self::Static(text)) => Injection::Static(text),
            Some(Self::ByFormat(map)) => Injection::ByFormat(map),
        }
    }
}

/// Raw configuration as deserialized from `bindery.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigRaw {
    output_dir: Option<String>,
    project: Option<ProjectConfig>,
    canonical: Option<String>,
    source_url_pattern: Option<String>,
    logo: Option<String>,
    authors: Vec<String>,
    main: Option<String>,
    api_reference: Option<bool>,
    extras: Vec<ExtraEntry>,
    groups: GroupsConfig,
    nest_by_prefix: Vec<String>,
    before_closing_head_tag: Option<InjectionRaw>,
    before_closing_body_tag: Option<InjectionRaw>,
    skip_undefined_reference_warnings_on: Vec<String>,
    filter_modules: Option<String>,
}

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override project name.
    pub project_name: Option<String>,
    /// Override project version.
    pub project_version: Option<String>,
}

/// Resolved build configuration, validated and read-only for one build.
#[derive(Debug)]
pub struct BuildConfig {
    /// Output root; each format builds into a subdirectory of it.
    pub output_dir: PathBuf,
    /// Project identity.
    pub project: ProjectConfig,
    /// Canonical URL advertised in page heads, if any.
    pub canonical: Option<String>,
    /// "View source" URL template with `%{path}` / `%{line}` placeholders.
    pub source_url_pattern: Option<String>,
    /// Logo path, validated to a supported image format.
    pub logo: Option<PathBuf>,
    /// Authors listed on the title page.
    pub authors: Vec<String>,
    /// Id of the page the redirect index points at.
    pub main: String,
    /// Whether the generated API reference page is enabled.
    pub api_reference: bool,
    /// Extra pages in display order.
    pub extras: Vec<ExtraEntry>,
    /// Sidebar group rules.
    pub groups: GroupsConfig,
    /// Module-nesting prefixes.
    pub nest_by_prefix: Vec<String>,
    /// Markup spliced before `</head>` on every page.
    pub before_closing_head_tag: Injection,
    /// Markup spliced before `</body>` on every page.
    pub before_closing_body_tag: Injection,
    /// Node ids exempted from undefined-reference warnings (exact match).
    pub skip_undefined_reference_warnings_on: Vec<String>,
    /// Modules matching this pattern are excluded from the documentation.
    pub filter_modules: Option<Regex>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        ConfigRaw::default()
            .resolve(Path::new("."), None)
            .expect("default config is valid")
    }
}

impl BuildConfig {
    /// Load configuration from `path` (or defaults when `None`), applying
    /// CLI overrides, and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or if
    /// validation fails. Validation failures are raised here, before any
    /// output I/O happens.
    pub fn load(
        path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let (raw, base_dir) = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_owned(),
                    source,
                })?;
                let raw: ConfigRaw =
                    toml::from_str(&text).map_err(|source| ConfigError::Parse {
                        path: path.to_owned(),
                        source: Box::new(source),
                    })?;
                let base = path.parent().unwrap_or(Path::new(".")).to_owned();
                (raw, base)
            }
            None => (ConfigRaw::default(), PathBuf::from(".")),
        };

        raw.resolve(&base_dir, cli_settings)
    }

    /// Main page id, falling back to the API reference.
    #[must_use]
    pub fn main_page(&self) -> &str {
        &self.main
    }

    /// Whether `module_name` is excluded from the documentation set.
    #[must_use]
    pub fn is_filtered(&self, module_name: &str) -> bool {
        self.filter_modules
            .as_ref()
            .is_some_and(|re| re.is_match(module_name))
    }

    /// Expand the source URL pattern for a node location.
    #[must_use]
    pub fn source_link(&self, path: &str, line: Option<u32>) -> Option<String> {
        let pattern = self.source_url_pattern.as_ref()?;
        let expanded = pattern.replace("%{path}", path);
        Some(match line {
            Some(line) => expanded.replace("%{line}", &line.to_string()),
            None => expanded.replace("%{line}", ""),
        })
    }
}

impl ConfigRaw {
    fn resolve(
        self,
        base_dir: &Path,
        cli_settings: Option<&CliSettings>,
    ) -> Result<BuildConfig, ConfigError> {
        let cli = cli_settings;

        let mut project = self.project.unwrap_or(ProjectConfig {
            name: "docs".to_owned(),
            version: String::new(),
        });
        if let Some(name) = cli.and_then(|c| c.project_name.clone()) {
            project.name = name;
        }
        if let Some(version) = cli.and_then(|c| c.project_version.clone()) {
            project.version = version;
        }

        let output_dir = cli
            .and_then(|c| c.output_dir.clone())
            .or_else(|| self.output_dir.as_ref().map(|dir| base_dir.join(dir)))
            .unwrap_or_else(|| base_dir.join("doc"));

        let main = self
            .main
            .unwrap_or_else(|| API_REFERENCE_ID.to_owned());
        if main == INDEX_ID {
            return Err(ConfigError::ReservedMainPage);
        }

        let logo = self
            .logo
            .map(|logo| validate_logo(base_dir, &logo))
            .transpose()?;

        let filter_modules = self
            .filter_modules
            .map(|pattern| {
                Regex::new(&pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern,
                    source: Box::new(source),
                })
            })
            .transpose()?;

        Ok(BuildConfig {
            output_dir,
            project,
            canonical: self.canonical,
            source_url_pattern: self.source_url_pattern,
            logo,
            authors: self.authors,
            main,
            api_reference: self.api_reference.unwrap_or(true),
            extras: self.extras,
            groups: self.groups,
            nest_by_prefix: self.nest_by_prefix,
            before_closing_head_tag: InjectionRaw::resolve(self.before_closing_head_tag),
            before_closing_body_tag: InjectionRaw::resolve(self.before_closing_body_tag),
            skip_undefined_reference_warnings_on: self.skip_undefined_reference_warnings_on,
            filter_modules,
        })
    }
}

/// Supported logo extensions.
const LOGO_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "svg"];

fn validate_logo(base_dir: &Path, logo: &str) -> Result<PathBuf, ConfigError> {
    let path = base_dir.join(logo);
    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| LOGO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    if supported {
        Ok(path)
    } else {
        Err(ConfigError::UnsupportedLogo(logo.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn load_str(text: &str) -> Result<BuildConfig, ConfigError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindery.toml");
        std::fs::write(&path, text).unwrap();
        BuildConfig::load(Some(&path), None)
    }

    #[test]
    fn test_defaults() {
        let config = BuildConfig::default();

        assert_eq!(config.main, API_REFERENCE_ID);
        assert!(config.api_reference);
        assert!(config.extras.is_empty());
        assert!(config.filter_modules.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let config = load_str(
            r#"
            output_dir = "build/docs"
            canonical = "https://docs.example.com/acme"
            authors = ["Acme Team"]
            main = "readme"

            [project]
            name = "acme"
            version = "1.4.0"

            [[extras]]
            path = "README.md"

            [[extras]]
            path = "LICENSE.md"
            filename = "license"
            title = "License"
            group = "Legal"

            [[groups.modules]]
            name = "Core"
            matches = ["Alpha", "Alpha\\..*"]
            "#,
        )
        .unwrap();

        assert_eq!(config.project.name, "acme");
        assert_eq!(config.main, "readme");
        assert_eq!(config.extras.len(), 2);
        assert_eq!(config.extras[0].path(), "README.md");
        assert_eq!(config.extras[1].filename(), Some("license"));
        assert_eq!(config.extras[1].group(), Some("Legal"));
        assert_eq!(config.groups.modules.len(), 1);
    }

    #[test]
    fn test_main_index_is_fatal() {
        let result = load_str(r#"main = "index""#);

        assert!(matches!(result, Err(ConfigError::ReservedMainPage)));
    }

    #[test]
    fn test_unsupported_logo_is_fatal() {
        let result = load_str(r#"logo = "logo.gif""#);

        assert!(matches!(result, Err(ConfigError::UnsupportedLogo(_))));
    }

    #[test]
    fn test_supported_logo_extensions() {
        assert!(load_str(r#"logo = "logo.png""#).is_ok());
        assert!(load_str(r#"logo = "logo.SVG""#).is_ok());
    }

    #[test]
    fn test_invalid_filter_pattern_is_fatal() {
        let result = load_str(r#"filter_modules = "[""#);

        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_filter_modules_matching() {
        let config = load_str(r#"filter_modules = "Internal""#).unwrap();

        assert!(config.is_filtered("Alpha.Internal"));
        assert!(!config.is_filtered("Alpha.Public"));
    }

    #[test]
    fn test_group_rule_exact_match() {
        let rule = GroupRule {
            name: "Core".to_owned(),
            matches: vec!["Alpha.Beta".to_owned()],
        };

        assert!(rule.is_member("Alpha.Beta"));
        // `.` in the pattern must not make "AlphaXBeta" a member: the exact
        // comparison matched above, and the regex is anchored here.
        assert!(!rule.is_member("Alpha.Beta.Gamma"));
    }

    #[test]
    fn test_group_rule_regex_match() {
        let rule = GroupRule {
            name: "Core".to_owned(),
            matches: vec![r"Alpha\..*".to_owned()],
        };

        assert!(rule.is_member("Alpha.Beta"));
        assert!(rule.is_member("Alpha.Beta.Gamma"));
        assert!(!rule.is_member("Beta"));
    }

    #[test]
    fn test_injection_from_string() {
        let config = load_str(r#"before_closing_head_tag = "<style>a{}</style>""#).unwrap();

        assert_eq!(
            config.before_closing_head_tag.resolve("html"),
            "<style>a{}</style>"
        );
        assert_eq!(
            config.before_closing_head_tag.resolve("epub"),
            "<style>a{}</style>"
        );
    }

    #[test]
    fn test_injection_by_format() {
        let config = load_str(
            r#"
            [before_closing_body_tag]
            html = "<script></script>"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.before_closing_body_tag.resolve("html"),
            "<script></script>"
        );
        assert_eq!(config.before_closing_body_tag.resolve("epub"), "");
    }

    #[test]
    fn test_source_link_expansion() {
        let config = load_str(
            r#"source_url_pattern = "https://example.com/blob/main/%{path}#L%{line}""#,
        )
        .unwrap();

        assert_eq!(
            config.source_link("lib/alpha.ex", Some(14)).unwrap(),
            "https://example.com/blob/main/lib/alpha.ex#L14"
        );
        assert_eq!(
            config.source_link("lib/alpha.ex", None).unwrap(),
            "https://example.com/blob/main/lib/alpha.ex#L"
        );
    }

    #[test]
    fn test_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindery.toml");
        std::fs::write(&path, r#"output_dir = "doc""#).unwrap();

        let settings = CliSettings {
            output_dir: Some(PathBuf::from("/tmp/out")),
            project_name: Some("renamed".to_owned()),
            project_version: None,
        };
        let config = BuildConfig::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.project.name, "renamed");
    }

    #[test]
    fn test_format_round_trip() {
        assert_eq!(Format::parse("html"), Some(Format::Html));
        assert_eq!(Format::parse("epub"), Some(Format::Epub));
        assert_eq!(Format::parse("pdf"), None);
        assert_eq!(Format::Html.as_str(), "html");
    }
}
