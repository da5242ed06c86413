//! Marker scanning and link rewriting over rendered content.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use bindery_nodes::{DocNode, NodeKind};
use regex::{Captures, Regex};

use crate::warning::{RefKind, ReferenceWarning, WarnReason};

/// Code spans are the only place reference markers are recognized.
static CODE_SPAN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<code[^>]*>([^<]+)</code>").unwrap());

/// `Module.function/arity`, optionally prefixed `t:` (type) or `c:` (callback).
static QUALIFIED_REF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(t|c):)?((?:[A-Z][A-Za-z0-9_]*)(?:\.[A-Z][A-Za-z0-9_]*)*)\.([a-z_][A-Za-z0-9_]*[!?]?)/([0-9]{1,3})$",
    )
    .unwrap()
});

/// Bare qualified module name.
static MODULE_REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Za-z0-9_]*(?:\.[A-Z][A-Za-z0-9_]*)*$").unwrap());

/// Relative links to markdown sources of sibling extras.
static MD_LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([A-Za-z0-9._~/-]+\.md)(#[^"]*)?""#).unwrap());

/// Documented entities of one module, keyed for anchor lookups.
#[derive(Debug, Default)]
struct ModuleEntry {
    id: String,
    functions: HashSet<String>,
    types: HashSet<String>,
    callbacks: HashSet<String>,
}

/// Result of resolving one node's content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    /// Content with every resolvable marker rewritten into a link.
    pub content: String,
    /// Warnings for markers that could not be resolved, in content order.
    pub warnings: Vec<ReferenceWarning>,
}

enum Outcome {
    Link(String),
    Warn(RefKind, WarnReason),
    Ignore,
}

/// Rewrites symbolic references in rendered content into concrete links.
///
/// Built once per build from the full set of known nodes; resolution itself
/// is a pure function of the index, so resolving the same input twice yields
/// the same content and the same warning set.
pub struct Resolver {
    modules: HashMap<String, ModuleEntry>,
    filtered: HashSet<String>,
    extra_links: HashMap<String, String>,
    skip_warnings: HashSet<String>,
}

impl Resolver {
    /// Build the resolution index from all documented nodes.
    ///
    /// Module and task nodes are indexed by title (their qualified name);
    /// extra nodes contribute their source filename for relative-link
    /// rewriting.
    #[must_use]
    pub fn new(nodes: &[DocNode]) -> Self {
        let mut modules = HashMap::new();
        let mut extra_links = HashMap::new();

        for node in nodes {
            match node.kind {
                NodeKind::Module | NodeKind::Task => {
                    modules.insert(
                        node.title.clone(),
                        ModuleEntry {
                            id: node.id.clone(),
                            functions: node.functions.iter().cloned().collect(),
                            types: node.types.iter().cloned().collect(),
                            callbacks: node.callbacks.iter().cloned().collect(),
                        },
                    );
                }
                NodeKind::Extra => {
                    if let Some(source) = &node.source_path
                        && let Some(basename) = source.rsplit('/').next()
                    {
                        extra_links.insert(basename.to_ascii_lowercase(), node.id.clone());
                    }
                }
            }
        }

        Self {
            modules,
            filtered: HashSet::new(),
            extra_links,
            skip_warnings: HashSet::new(),
        }
    }

    /// Register module names that exist but are excluded from the
    /// documentation set.
    #[must_use]
    pub fn with_filtered(mut self, filtered: HashSet<String>) -> Self {
        self.filtered = filtered;
        self
    }

    /// Register node ids whose undefined-reference warnings are skipped
    /// entirely. Matching is exact by node id.
    #[must_use]
    pub fn with_skip_warnings(mut self, skip: HashSet<String>) -> Self {
        self.skip_warnings = skip;
        self
    }

    /// Resolve all markers in `node`'s content, producing links with the
    /// given output extension (`html` or `xhtml`).
    #[must_use]
    pub fn resolve(&self, node: &DocNode, ext: &str) -> Resolved {
        let mut warnings = Vec::new();
        let suppress_undefined = self.skip_warnings.contains(&node.id);

        let content = CODE_SPAN_PATTERN.replace_all(&node.content, |caps: &Captures<'_>| {
            let span = &caps[0];
            let text = &caps[1];
            match self.classify(text, ext) {
                Outcome::Link(href) => format!(r#"<a href="{href}">{span}</a>"#),
                Outcome::Warn(kind, reason) => {
                    let skip = suppress_undefined && reason == WarnReason::Undefined;
                    if !skip {
                        warnings.push(ReferenceWarning {
                            reference: text.to_owned(),
                            kind,
                            node_id: node.id.clone(),
                            source_path: node.source_path.clone(),
                            source_line: node.source_line,
                            reason,
                        });
                    }
                    span.to_owned()
                }
                Outcome::Ignore => span.to_owned(),
            }
        });

        let content = MD_LINK_PATTERN
            .replace_all(&content, |caps: &Captures<'_>| {
                let path = &caps[1];
                let fragment = caps.get(2).map_or("", |m| m.as_str());
                let basename = path.rsplit('/').next().unwrap_or(path);
                match self.extra_links.get(&basename.to_ascii_lowercase()) {
                    Some(id) => format!(r#"href="{id}.{ext}{fragment}""#),
                    None => caps[0].to_owned(),
                }
            })
            .into_owned();

        Resolved { content, warnings }
    }

    fn classify(&self, text: &str, ext: &str) -> Outcome {
        if let Some(caps) = QUALIFIED_REF_PATTERN.captures(text) {
            let kind = match caps.get(1).map(|m| m.as_str()) {
                Some("t") => RefKind::Type,
                Some("c") => RefKind::Callback,
                _ => RefKind::Function,
            };
            let module = &caps[2];
            let qualified = format!("{}/{}", &caps[3], &caps[4]);

            if let Some(entry) = self.modules.get(module) {
                let (set, anchor_prefix) = match kind {
                    RefKind::Type => (&entry.types, "t:"),
                    RefKind::Callback => (&entry.callbacks, "c:"),
                    _ => (&entry.functions, ""),
                };
                if set.contains(&qualified) {
                    return Outcome::Link(format!(
                        "{}.{ext}#{anchor_prefix}{qualified}",
                        entry.id
                    ));
                }
                return Outcome::Warn(kind, WarnReason::Undefined);
            }

            if self.filtered.contains(module) {
                // Typespec cross-references get the dedicated reason; plain
                // function markers fail as undefined.
                let reason = match kind {
                    RefKind::Type | RefKind::Callback => WarnReason::FilteredModule,
                    _ => WarnReason::Undefined,
                };
                return Outcome::Warn(kind, reason);
            }

            return Outcome::Warn(kind, WarnReason::Undefined);
        }

        if MODULE_REF_PATTERN.is_match(text) {
            if let Some(entry) = self.modules.get(text) {
                return Outcome::Link(format!("{}.{ext}", entry.id));
            }
            if self.filtered.contains(text) || text.contains('.') {
                return Outcome::Warn(RefKind::Module, WarnReason::Undefined);
            }
            // Single-segment unknown names (`String`, `GenServer`-lookalikes
            // from other ecosystems) are prose, not markers.
        }

        Outcome::Ignore
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn module_node(name: &str) -> DocNode {
        let mut node = DocNode::new(name, name, NodeKind::Module);
        node.functions = vec!["parse/2".to_owned(), "run/0".to_owned()];
        node.types = vec!["t/0".to_owned()];
        node.callbacks = vec!["init/1".to_owned()];
        node
    }

    fn referencing_node(content: &str) -> DocNode {
        let mut node = DocNode::new("guide", "Guide", NodeKind::Extra);
        node.content = content.to_owned();
        node.source_path = Some("pages/guide.md".to_owned());
        node.source_line = Some(3);
        node
    }

    #[test]
    fn test_resolves_module_reference() {
        let nodes = vec![module_node("Alpha.Parser")];
        let resolver = Resolver::new(&nodes);

        let result = resolver.resolve(&referencing_node("<code>Alpha.Parser</code>"), "html");

        assert_eq!(
            result.content,
            r#"<a href="Alpha.Parser.html"><code>Alpha.Parser</code></a>"#
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_resolves_function_reference_with_anchor() {
        let nodes = vec![module_node("Alpha.Parser")];
        let resolver = Resolver::new(&nodes);

        let result =
            resolver.resolve(&referencing_node("<code>Alpha.Parser.parse/2</code>"), "html");

        assert_eq!(
            result.content,
            r#"<a href="Alpha.Parser.html#parse/2"><code>Alpha.Parser.parse/2</code></a>"#
        );
    }

    #[test]
    fn test_resolves_type_and_callback_anchors() {
        let nodes = vec![module_node("Alpha.Parser")];
        let resolver = Resolver::new(&nodes);

        let types =
            resolver.resolve(&referencing_node("<code>t:Alpha.Parser.t/0</code>"), "xhtml");
        assert!(types.content.contains(r##"href="Alpha.Parser.xhtml#t:t/0""##));

        let callbacks =
            resolver.resolve(&referencing_node("<code>c:Alpha.Parser.init/1</code>"), "html");
        assert!(
            callbacks
                .content
                .contains(r##"href="Alpha.Parser.html#c:init/1""##)
        );
    }

    #[test]
    fn test_undefined_function_warns_with_location() {
        let nodes = vec![module_node("Alpha.Parser")];
        let resolver = Resolver::new(&nodes);

        let result =
            resolver.resolve(&referencing_node("<code>Alpha.Parser.missing/3</code>"), "html");

        // Content is left unlinked, not broken.
        assert_eq!(result.content, "<code>Alpha.Parser.missing/3</code>");
        assert_eq!(result.warnings.len(), 1);
        let warning = &result.warnings[0];
        assert_eq!(warning.reference, "Alpha.Parser.missing/3");
        assert_eq!(warning.kind, RefKind::Function);
        assert_eq!(warning.reason, WarnReason::Undefined);
        assert_eq!(warning.source_path.as_deref(), Some("pages/guide.md"));
        assert_eq!(warning.source_line, Some(3));
    }

    #[test]
    fn test_unknown_dotted_module_warns() {
        let resolver = Resolver::new(&[]);

        let result = resolver.resolve(&referencing_node("<code>No.Such.Module</code>"), "html");

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, RefKind::Module);
    }

    #[test]
    fn test_unknown_bare_name_is_ignored() {
        let resolver = Resolver::new(&[]);

        let result = resolver.resolve(&referencing_node("<code>String</code>"), "html");

        assert_eq!(result.content, "<code>String</code>");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_filtered_module_typespec_gets_filtered_reason() {
        let resolver = Resolver::new(&[])
            .with_filtered(HashSet::from(["Alpha.Hidden".to_owned()]));

        let result =
            resolver.resolve(&referencing_node("<code>t:Alpha.Hidden.t/0</code>"), "html");

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].reason, WarnReason::FilteredModule);
    }

    #[test]
    fn test_filtered_module_function_gets_undefined_reason() {
        let resolver = Resolver::new(&[])
            .with_filtered(HashSet::from(["Alpha.Hidden".to_owned()]));

        let result =
            resolver.resolve(&referencing_node("<code>Alpha.Hidden.run/0</code>"), "html");

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].reason, WarnReason::Undefined);
    }

    #[test]
    fn test_skip_warnings_is_exact_by_node_id() {
        let resolver = Resolver::new(&[])
            .with_skip_warnings(HashSet::from(["guide".to_owned()]));

        let suppressed =
            resolver.resolve(&referencing_node("<code>No.Such.Module</code>"), "html");
        assert!(suppressed.warnings.is_empty());

        // A different node id still warns.
        let mut other = referencing_node("<code>No.Such.Module</code>");
        other.id = "guide-2".to_owned();
        let reported = resolver.resolve(&other, "html");
        assert_eq!(reported.warnings.len(), 1);
    }

    #[test]
    fn test_markdown_link_rewritten_to_extra_id() {
        let mut readme = DocNode::new("readme", "README", NodeKind::Extra);
        readme.source_path = Some("README.md".to_owned());
        let resolver = Resolver::new(&[readme]);

        let result = resolver.resolve(
            &referencing_node(r#"<a href="README.md#install">install</a>"#),
            "html",
        );

        assert_eq!(
            result.content,
            r##"<a href="readme.html#install">install</a>"##
        );
    }

    #[test]
    fn test_markdown_link_to_unknown_file_unchanged() {
        let resolver = Resolver::new(&[]);
        let content = r#"<a href="missing.md">x</a>"#;

        let result = resolver.resolve(&referencing_node(content), "html");

        assert_eq!(result.content, content);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let nodes = vec![module_node("Alpha.Parser")];
        let resolver = Resolver::new(&nodes);
        let node = referencing_node(
            "<code>Alpha.Parser.parse/2</code> and <code>Gone.missing/1</code> \
             and <code>Gone.missing/1</code>",
        );

        let first = resolver.resolve(&node, "html");
        let second = resolver.resolve(&node, "html");

        assert_eq!(first, second);
        // One warning per marker occurrence, in content order.
        assert_eq!(first.warnings.len(), 2);
    }
}
