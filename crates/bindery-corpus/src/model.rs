//! The format-agnostic navigation model.

use bindery_nodes::{DocNode, Header};
use serde::Serialize;

/// One sidebar entry, structural data only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    /// Output id (filename stem and link target).
    pub id: String,
    /// Display title.
    pub title: String,
    /// Sidebar group; empty for the default bucket.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub group: String,
    /// Parent grouping key assigned by prefix nesting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_context: Option<String>,
    /// Title with the nesting prefix stripped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_title: Option<String>,
    /// Headings used for in-page navigation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
}

impl NavEntry {
    pub(crate) fn from_node(node: &DocNode) -> Self {
        Self {
            id: node.id.clone(),
            title: node.title.clone(),
            group: node.group.clone(),
            nested_context: node.nested_context.clone(),
            nested_title: node.nested_title.clone(),
            headers: node.headers.clone(),
        }
    }
}

/// An ordered group of sidebar entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeGroup {
    /// Group display name; empty for the default bucket.
    pub name: String,
    /// Entries in final display order.
    pub nodes: Vec<NavEntry>,
}

/// Neighbor pointer in the flat page sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageLink {
    /// Target page id.
    pub id: String,
    /// Target page title.
    pub title: String,
}

/// One entry of the flat page sequence (API reference + extras).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageRef {
    /// Page id.
    pub id: String,
    /// Page title.
    pub title: String,
    /// Preceding page; `None` for the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<PageLink>,
    /// Following page; `None` for the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
}

/// The assembled, format-agnostic navigation structure over all nodes.
///
/// Group order is: default group first, then groups in the order their
/// first matching rule appears in configuration, then unconfigured groups
/// in first-seen order. The flat [`pages`](Self::pages) sequence drives
/// previous/next pagination.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NavigationModel {
    /// Module groups.
    pub modules: Vec<NodeGroup>,
    /// Task groups.
    pub tasks: Vec<NodeGroup>,
    /// Extra page groups.
    pub extras: Vec<NodeGroup>,
    /// Flat page sequence with pagination pointers.
    pub pages: Vec<PageRef>,
}

impl NavigationModel {
    /// Pagination pointers for a page id, if it is part of the sequence.
    #[must_use]
    pub fn page(&self, id: &str) -> Option<&PageRef> {
        self.pages.iter().find(|page| page.id == id)
    }

    /// Serialize the whole model as the navigation-index JSON document
    /// consumed by client-side navigation.
    #[must_use]
    pub fn to_index_json(&self) -> String {
        serde_json::to_string(self).expect("navigation model serializes")
    }

    /// All sidebar entries across every kind, in display order.
    pub fn all_entries(&self) -> impl Iterator<Item = &NavEntry> {
        self.modules
            .iter()
            .chain(&self.tasks)
            .chain(&self.extras)
            .flat_map(|group| &group.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: &str) -> PageRef {
        PageRef {
            id: id.to_owned(),
            title: id.to_uppercase(),
            previous: None,
            next: None,
        }
    }

    #[test]
    fn test_page_lookup() {
        let model = NavigationModel {
            pages: vec![page("readme"), page("license")],
            ..NavigationModel::default()
        };

        assert_eq!(model.page("license").unwrap().title, "LICENSE");
        assert!(model.page("missing").is_none());
    }

    #[test]
    fn test_index_json_skips_empty_fields() {
        let model = NavigationModel {
            modules: vec![NodeGroup {
                name: String::new(),
                nodes: vec![NavEntry {
                    id: "alpha".to_owned(),
                    title: "Alpha".to_owned(),
                    group: String::new(),
                    nested_context: None,
                    nested_title: None,
                    headers: Vec::new(),
                }],
            }],
            ..NavigationModel::default()
        };

        let json = model.to_index_json();

        assert!(json.contains(r#""id":"alpha""#));
        assert!(!json.contains("nested_context"));
        assert!(!json.contains("headers"));
    }
}
