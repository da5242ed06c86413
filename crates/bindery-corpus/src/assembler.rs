//! Deterministic grouping, nesting, sorting and pagination.

use std::cmp::Ordering;
use std::collections::HashMap;

use bindery_config::{API_REFERENCE_ID, BuildConfig, GroupRule};
use bindery_nodes::{DocNode, NodeKind};

use crate::model::{NavEntry, NavigationModel, NodeGroup, PageLink, PageRef};

/// Comparator overriding the default case-sensitive name order.
pub type NodeComparator = dyn Fn(&DocNode, &DocNode) -> Ordering + Send + Sync;

/// Title of the generated API reference page.
const API_REFERENCE_TITLE: &str = "API Reference";

/// Builds the [`NavigationModel`] from the node list and configuration.
///
/// Assembly is synchronous and single-pass; the produced model is read-only
/// input to every renderer.
pub struct Assembler<'a> {
    config: &'a BuildConfig,
    comparator: Option<Box<NodeComparator>>,
}

impl<'a> Assembler<'a> {
    /// Create an assembler for the given configuration.
    #[must_use]
    pub fn new(config: &'a BuildConfig) -> Self {
        Self {
            config,
            comparator: None,
        }
    }

    /// Override the in-group node ordering for modules and tasks.
    #[must_use]
    pub fn with_comparator(mut self, comparator: Box<NodeComparator>) -> Self {
        self.comparator = Some(comparator);
        self
    }

    /// Assemble the navigation model.
    ///
    /// `nodes` are the documented modules and tasks; `extras` the loaded
    /// extra pages in display order. Neither input is mutated.
    #[must_use]
    pub fn assemble(&self, nodes: &[DocNode], extras: &[DocNode]) -> NavigationModel {
        let mut modules: Vec<DocNode> = Vec::new();
        let mut tasks: Vec<DocNode> = Vec::new();
        for node in nodes {
            let mut node = node.clone();
            self.assign_nesting(&mut node);
            match node.kind {
                NodeKind::Module => {
                    self.assign_group(&mut node, &self.config.groups.modules);
                    modules.push(node);
                }
                NodeKind::Task => tasks.push(node),
                // Extras are supplied separately, already loaded and ordered.
                NodeKind::Extra => {}
            }
        }

        let mut extra_nodes: Vec<DocNode> = Vec::new();
        for node in extras {
            let mut node = node.clone();
            if node.group.is_empty() {
                self.assign_group(&mut node, &self.config.groups.extras);
            }
            extra_nodes.push(node);
        }

        self.sort_nodes(&mut modules);
        self.sort_nodes(&mut tasks);

        let module_groups = group_nodes(&modules, &self.config.groups.modules);
        let task_groups = group_nodes(&tasks, &[]);
        let extra_groups = group_nodes(&extra_nodes, &self.config.groups.extras);

        let pages = self.build_pages(&extra_groups);

        NavigationModel {
            modules: module_groups,
            tasks: task_groups,
            extras: extra_groups,
            pages,
        }
    }

    /// Assign `nested_context`/`nested_title` from the longest matching
    /// configured prefix. A more specific prefix in the list overrides a
    /// shorter ancestor prefix; a node never nests under itself.
    fn assign_nesting(&self, node: &mut DocNode) {
        let best = self
            .config
            .nest_by_prefix
            .iter()
            .filter(|prefix| {
                node.title.len() > prefix.len() + 1
                    && node.title.starts_with(prefix.as_str())
                    && node.title.as_bytes()[prefix.len()] == b'.'
            })
            .max_by_key(|prefix| prefix.len());

        if let Some(prefix) = best {
            node.nested_context = Some(prefix.clone());
            node.nested_title = Some(node.title[prefix.len() + 1..].to_owned());
        }
    }

    /// Assign the first matching group rule, in configuration order.
    fn assign_group(&self, node: &mut DocNode, rules: &[GroupRule]) {
        if !node.group.is_empty() {
            return;
        }
        for rule in rules {
            if rule.is_member(&node.title) || rule.is_member(&node.id) {
                node.group = rule.name.clone();
                return;
            }
        }
    }

    /// Sort by the caller-supplied comparator, or case-sensitive name order.
    fn sort_nodes(&self, nodes: &mut [DocNode]) {
        match &self.comparator {
            Some(comparator) => nodes.sort_by(|a, b| comparator(a, b)),
            None => nodes.sort_by(|a, b| a.title.cmp(&b.title)),
        }
    }

    /// Flat page sequence: API reference first (when enabled), then extras
    /// in display order, with previous/next neighbors filled in.
    fn build_pages(&self, extra_groups: &[NodeGroup]) -> Vec<PageRef> {
        let mut pages: Vec<PageRef> = Vec::new();

        if self.config.api_reference {
            pages.push(PageRef {
                id: API_REFERENCE_ID.to_owned(),
                title: API_REFERENCE_TITLE.to_owned(),
                previous: None,
                next: None,
            });
        }
        for group in extra_groups {
            for entry in &group.nodes {
                pages.push(PageRef {
                    id: entry.id.clone(),
                    title: entry.title.clone(),
                    previous: None,
                    next: None,
                });
            }
        }

        link_neighbors(&mut pages);
        pages
    }
}

/// Fill previous/next pointers: the first page has no previous, the last no
/// next.
fn link_neighbors(pages: &mut [PageRef]) {
    let links: Vec<PageLink> = pages
        .iter()
        .map(|page| PageLink {
            id: page.id.clone(),
            title: page.title.clone(),
        })
        .collect();

    for (index, page) in pages.iter_mut().enumerate() {
        page.previous = index.checked_sub(1).map(|i| links[i].clone());
        page.next = links.get(index + 1).cloned();
    }
}

/// Partition nodes into ordered groups.
///
/// The default (empty) group comes first, configured groups follow in rule
/// order, and unconfigured groups trail in first-seen order. Node order
/// within a group is the input order.
fn group_nodes(nodes: &[DocNode], rules: &[GroupRule]) -> Vec<NodeGroup> {
    let configured: HashMap<&str, usize> = rules
        .iter()
        .enumerate()
        .map(|(index, rule)| (rule.name.as_str(), index))
        .collect();

    let mut groups: Vec<NodeGroup> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for node in nodes {
        let position = match positions.get(&node.group) {
            Some(&position) => position,
            None => {
                let position = groups.len();
                positions.insert(node.group.clone(), position);
                groups.push(NodeGroup {
                    name: node.group.clone(),
                    nodes: Vec::new(),
                });
                position
            }
        };
        groups[position].nodes.push(NavEntry::from_node(node));
    }

    // First-seen order is re-ranked: default first, then configured rule
    // order, then the remaining first-seen order.
    let mut indexed: Vec<(usize, NodeGroup)> = groups.into_iter().enumerate().collect();
    indexed.sort_by_key(|(first_seen, group)| {
        if group.name.is_empty() {
            (0, 0)
        } else if let Some(&rule_index) = configured.get(group.name.as_str()) {
            (1, rule_index)
        } else {
            (2, *first_seen)
        }
    });

    indexed.into_iter().map(|(_, group)| group).collect()
}
