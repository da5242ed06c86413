//! HTML page shell shared by every generated page.
//!
//! Templates are plain string building: the page set is small and fixed, so
//! the layout lives next to the code that fills it.

use std::fmt::Write;

use bindery_config::{BuildConfig, INDEX_ID};
use bindery_corpus::{NavigationModel, NodeGroup};

use crate::assets::AssetPaths;

/// Format tag handed to injection points.
const FORMAT: &str = "html";

/// Shared context for rendering one page shell.
pub(crate) struct PageShell<'a> {
    pub config: &'a BuildConfig,
    pub model: &'a NavigationModel,
    pub assets: &'a AssetPaths,
}

impl PageShell<'_> {
    /// Render a complete page for a node or extra.
    pub(crate) fn render_page(
        &self,
        id: &str,
        title: &str,
        content: &str,
        source_link: Option<&str>,
    ) -> String {
        let mut html = String::with_capacity(content.len() + 8192);
        self.render_head(&mut html, id, title);

        html.push_str("<div class=\"layout\">\n");
        self.render_sidebar(&mut html);

        html.push_str("<main class=\"content\">\n");
        if let Some(link) = source_link {
            let _ = write!(
                html,
                "<a class=\"source-link\" href=\"{}\">view source</a>\n",
                escape(link)
            );
        }
        html.push_str(content);
        html.push('\n');
        self.render_pagination(&mut html, id);
        html.push_str("</main>\n</div>\n");

        self.render_tail(&mut html);
        html
    }

    /// Render the fixed-name redirect page pointing at the main page.
    pub(crate) fn render_redirect(&self) -> String {
        let main = self.config.main_page();
        let mut html = String::with_capacity(1024);
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("<meta charset=\"utf-8\">\n");
        let _ = write!(
            html,
            "<meta http-equiv=\"refresh\" content=\"0; url={}.html\">\n",
            escape(main)
        );
        let _ = write!(html, "<title>{}</title>\n", escape(&self.config.project.name));
        html.push_str(&self.config.before_closing_head_tag.resolve(FORMAT));
        html.push_str("</head>\n<body>\n");
        let _ = write!(
            html,
            "<p>Redirecting to <a href=\"{0}.html\">{0}.html</a>…</p>\n",
            escape(main)
        );
        html.push_str(&self.config.before_closing_body_tag.resolve(FORMAT));
        html.push_str("</body>\n</html>");
        html
    }

    /// Render the fixed "not found" page.
    pub(crate) fn render_not_found(&self) -> String {
        let content = format!(
            "<h1>Page not found</h1>\n<p>The page you were looking for does not exist. \
             Back to <a href=\"{INDEX_ID}.html\">the start page</a>.</p>"
        );
        self.render_page("404", "Not Found", &content, None)
    }

    /// Render the generated API reference listing.
    pub(crate) fn render_api_reference_content(&self) -> String {
        let mut html = String::with_capacity(4096);
        html.push_str("<h1>API Reference</h1>\n");
        render_reference_section(&mut html, "Modules", &self.model.modules);
        render_reference_section(&mut html, "Tasks", &self.model.tasks);
        html
    }

    fn render_head(&self, html: &mut String, id: &str, title: &str) {
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("<meta charset=\"utf-8\">\n");
        html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
        let _ = write!(
            html,
            "<title>{} — {} v{}</title>\n",
            escape(title),
            escape(&self.config.project.name),
            escape(&self.config.project.version)
        );
        if let Some(canonical) = &self.config.canonical {
            let _ = write!(
                html,
                "<link rel=\"canonical\" href=\"{}/{}.html\">\n",
                escape(canonical.trim_end_matches('/')),
                escape(id)
            );
        }
        let _ = write!(
            html,
            "<link rel=\"stylesheet\" href=\"{}\">\n",
            &self.assets.stylesheet
        );
        let _ = write!(html, "<script src=\"{}\" defer></script>\n", &self.assets.nav_index);
        let _ = write!(html, "<script src=\"{}\" defer></script>\n", &self.assets.script);
        html.push_str(&self.config.before_closing_head_tag.resolve(FORMAT));
        html.push_str("</head>\n<body>\n");
    }

    fn render_tail(&self, html: &mut String) {
        html.push_str(&self.config.before_closing_body_tag.resolve(FORMAT));
        html.push_str("</body>\n</html>");
    }

    fn render_sidebar(&self, html: &mut String) {
        html.push_str("<aside class=\"sidebar\">\n");

        if let Some(logo) = &self.assets.logo {
            let _ = write!(
                html,
                "<img class=\"sidebar-logo\" src=\"{}\" alt=\"\">\n",
                escape(logo)
            );
        }
        let _ = write!(
            html,
            "<p class=\"sidebar-project\"><a href=\"{INDEX_ID}.html\">{}</a></p>\n",
            escape(&self.config.project.name)
        );
        if !self.config.project.version.is_empty() {
            let _ = write!(
                html,
                "<p class=\"sidebar-version\">v{}</p>\n",
                escape(&self.config.project.version)
            );
        }

        render_sidebar_section(html, "Pages", &self.model.extras);
        render_sidebar_section(html, "Modules", &self.model.modules);
        render_sidebar_section(html, "Tasks", &self.model.tasks);

        html.push_str("</aside>\n");
    }

    fn render_pagination(&self, html: &mut String, id: &str) {
        let Some(page) = self.model.page(id) else {
            return;
        };
        if page.previous.is_none() && page.next.is_none() {
            return;
        }

        html.push_str("<nav class=\"pagination\">\n");
        match &page.previous {
            Some(previous) => {
                let _ = write!(
                    html,
                    "<a href=\"{}.html\"><span class=\"label\">Previous</span>{}</a>\n",
                    escape(&previous.id),
                    escape(&previous.title)
                );
            }
            None => html.push_str("<span></span>\n"),
        }
        match &page.next {
            Some(next) => {
                let _ = write!(
                    html,
                    "<a href=\"{}.html\"><span class=\"label\">Next</span>{}</a>\n",
                    escape(&next.id),
                    escape(&next.title)
                );
            }
            None => html.push_str("<span></span>\n"),
        }
        html.push_str("</nav>\n");
    }
}

/// Render one sidebar section with its groups, skipping empty sections.
fn render_sidebar_section(html: &mut String, fallback_heading: &str, groups: &[NodeGroup]) {
    if groups.iter().all(|group| group.nodes.is_empty()) {
        return;
    }

    for group in groups {
        if group.nodes.is_empty() {
            continue;
        }
        let heading = if group.name.is_empty() {
            fallback_heading
        } else {
            &group.name
        };
        let _ = write!(html, "<p class=\"sidebar-heading\">{}</p>\n", escape(heading));

        html.push_str("<ul>\n");
        let mut current_context: Option<&str> = None;
        for entry in &group.nodes {
            if entry.nested_context.as_deref() != current_context {
                current_context = entry.nested_context.as_deref();
                if let Some(context) = current_context {
                    let _ = write!(
                        html,
                        "<li class=\"nested-context\">{}</li>\n",
                        escape(context)
                    );
                }
            }
            let (class, label) = match &entry.nested_title {
                Some(nested) => (" class=\"nested\"", nested.as_str()),
                None => ("", entry.title.as_str()),
            };
            let _ = write!(
                html,
                "<li{class}><a href=\"{}.html\">{}</a></li>\n",
                escape(&entry.id),
                escape(label)
            );
        }
        html.push_str("</ul>\n");
    }
}

/// Render one API reference section as linked lists per group.
fn render_reference_section(html: &mut String, fallback_heading: &str, groups: &[NodeGroup]) {
    for group in groups {
        if group.nodes.is_empty() {
            continue;
        }
        let heading = if group.name.is_empty() {
            fallback_heading
        } else {
            &group.name
        };
        let _ = write!(html, "<h2>{}</h2>\n<ul>\n", escape(heading));
        for entry in &group.nodes {
            let _ = write!(
                html,
                "<li><a href=\"{}.html\">{}</a></li>\n",
                escape(&entry.id),
                escape(&entry.title)
            );
        }
        html.push_str("</ul>\n");
    }
}

/// Escape HTML special characters.
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

#[cfg(test)]
mod tests {
    use bindery_config::BuildConfig;
    use bindery_corpus::{NavEntry, NavigationModel, PageLink, PageRef};

    use super::*;

    fn entry(id: &str, title: &str) -> NavEntry {
        NavEntry {
            id: id.to_owned(),
            title: title.to_owned(),
            group: String::new(),
            nested_context: None,
            nested_title: None,
            headers: Vec::new(),
        }
    }

    fn model() -> NavigationModel {
        NavigationModel {
            modules: vec![NodeGroup {
                name: String::new(),
                nodes: vec![entry("Alpha", "Alpha")],
            }],
            extras: vec![NodeGroup {
                name: String::new(),
                nodes: vec![entry("readme", "README")],
            }],
            pages: vec![PageRef {
                id: "readme".to_owned(),
                title: "README".to_owned(),
                previous: Some(PageLink {
                    id: "api-reference".to_owned(),
                    title: "API Reference".to_owned(),
                }),
                next: None,
            }],
            ..NavigationModel::default()
        }
    }

    fn assets() -> AssetPaths {
        AssetPaths::new("{}")
    }

    fn shell<'a>(
        config: &'a BuildConfig,
        model: &'a NavigationModel,
        assets: &'a AssetPaths,
    ) -> PageShell<'a> {
        PageShell {
            config,
            model,
            assets,
        }
    }

    #[test]
    fn test_page_contains_content_and_sidebar() {
        let config = BuildConfig::default();
        let model = model();
        let assets = assets();

        let html = shell(&config, &model, &assets).render_page(
            "readme",
            "README",
            "<p>Welcome</p>",
            None,
        );

        assert!(html.contains("<p>Welcome</p>"));
        assert!(html.contains("href=\"Alpha.html\""));
        assert!(html.contains("href=\"readme.html\""));
        assert!(html.contains(&assets.stylesheet));
        assert!(html.contains(&assets.nav_index));
    }

    #[test]
    fn test_page_pagination_links() {
        let config = BuildConfig::default();
        let model = model();
        let assets = assets();

        let html = shell(&config, &model, &assets).render_page("readme", "README", "", None);

        assert!(html.contains("href=\"api-reference.html\""));
        assert!(html.contains("Previous"));
        // Last page: no next link.
        assert!(!html.contains("<span class=\"label\">Next</span>"));
    }

    #[test]
    fn test_module_page_has_no_pagination() {
        let config = BuildConfig::default();
        let model = model();
        let assets = assets();

        let html = shell(&config, &model, &assets).render_page("Alpha", "Alpha", "", None);

        assert!(!html.contains("class=\"pagination\""));
    }

    #[test]
    fn test_redirect_points_at_main_page() {
        let config = BuildConfig::default();
        let model = model();
        let assets = assets();

        let html = shell(&config, &model, &assets).render_redirect();

        assert!(html.contains("http-equiv=\"refresh\""));
        assert!(html.contains("url=api-reference.html"));
    }

    #[test]
    fn test_source_link_rendered() {
        let config = BuildConfig::default();
        let model = model();
        let assets = assets();

        let html = shell(&config, &model, &assets).render_page(
            "Alpha",
            "Alpha",
            "",
            Some("https://example.com/src/alpha.ex#L1"),
        );

        assert!(html.contains("class=\"source-link\""));
        assert!(html.contains("https://example.com/src/alpha.ex#L1"));
    }

    #[test]
    fn test_api_reference_lists_modules() {
        let config = BuildConfig::default();
        let model = model();
        let assets = assets();

        let content = shell(&config, &model, &assets).render_api_reference_content();

        assert!(content.contains("<h1>API Reference</h1>"));
        assert!(content.contains("href=\"Alpha.html\""));
    }

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape("<script>"), "&lt;script&gt;");
        assert_eq!(escape("a&b"), "a&amp;b");
        assert_eq!(escape("\"q\""), "&quot;q&quot;");
    }
}
