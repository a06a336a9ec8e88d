//! Collapsible tree rendering
//!
//! `render_tree` turns the nested roots into an HTML list. Which nodes are
//! open is plain view state ([`TreeViewState`]) carried in the page URL, so
//! rendering never touches the store and toggling a node is just a link to
//! the same page with that node's state flipped.
//!
//! A node with children shows a `[+]` / `[-]` toggle and a bold name;
//! children are rendered only while their parent is open. With
//! `sort_by_name` each child list is ordered case-insensitively by name for
//! display; roots keep their store order.

use std::collections::{BTreeSet, HashSet};

use arbor_core::TreeNode;

use crate::constants::INDEX_PATH;

/// Per-page display state of the tree widget
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeViewState {
    /// Nodes opened individually
    pub expanded: HashSet<i64>,
    /// Open every node regardless of `expanded`
    pub expand_all: bool,
    /// Order siblings by name (display only)
    pub sort_by_name: bool,
}

impl TreeViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expand_all(mut self, expand_all: bool) -> Self {
        self.expand_all = expand_all;
        self
    }

    pub fn with_sort_by_name(mut self, sort_by_name: bool) -> Self {
        self.sort_by_name = sort_by_name;
        self
    }

    /// Parse the `open` query value: a comma-separated id list
    pub fn with_open_list(mut self, open: &str) -> Self {
        self.expanded.extend(
            open.split(',')
                .filter_map(|id| id.trim().parse::<i64>().ok()),
        );
        self
    }

    /// Flip the open state of `id`
    pub fn toggle(&mut self, id: i64) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    pub fn is_open(&self, id: i64) -> bool {
        self.expand_all || self.expanded.contains(&id)
    }

    /// Query string reproducing this state
    pub fn to_query(&self) -> String {
        let mut params = Vec::new();
        if self.sort_by_name {
            params.push("sortby=name".to_string());
        }
        if self.expand_all {
            params.push("expand=true".to_string());
        }
        if !self.expanded.is_empty() {
            let ids: BTreeSet<i64> = self.expanded.iter().copied().collect();
            let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            params.push(format!("open={}", ids.join(",")));
        }

        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }

    fn toggle_href(&self, id: i64) -> String {
        let mut next = self.clone();
        next.toggle(id);
        format!("{}{}", INDEX_PATH, next.to_query())
    }
}

/// Escape text for use in HTML content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn ordered<'a>(nodes: &'a [TreeNode], state: &TreeViewState) -> Vec<&'a TreeNode> {
    let mut ordered: Vec<&TreeNode> = nodes.iter().collect();
    if state.sort_by_name {
        ordered.sort_by_cached_key(|node| node.name().to_lowercase());
    }
    ordered
}

/// Render `roots` as nested `<ul>` lists
pub fn render_tree(roots: &[TreeNode], state: &TreeViewState) -> String {
    let mut out = String::new();
    out.push_str("<ul class=\"tree\">");
    for node in roots {
        render_item(node, state, &mut out);
    }
    out.push_str("</ul>");
    out
}

fn render_item(node: &TreeNode, state: &TreeViewState, out: &mut String) {
    let id = node.id();
    let name = escape_html(node.name());

    out.push_str("<li class=\"tree-item\">");
    if node.has_children() {
        let open = state.is_open(id);
        out.push_str(&format!(
            "<div class=\"bold\"><a href=\"/management/edit/{id}\">{name}</a> \
             <a class=\"toggle\" href=\"{href}\">[{sign}]</a></div>",
            id = id,
            name = name,
            href = escape_html(&state.toggle_href(id)),
            sign = if open { "-" } else { "+" },
        ));

        if open {
            out.push_str("<ul>");
            for child in ordered(&node.children, state) {
                render_item(child, state, out);
            }
            out.push_str("</ul>");
        }
    } else {
        out.push_str(&format!(
            "<div><a href=\"/management/edit/{}\">{}</a></div>",
            id, name
        ));
    }
    out.push_str("</li>");
}

/// Full management index page around the rendered tree
pub fn render_index_page(roots: &[TreeNode], state: &TreeViewState) -> String {
    let sort_toggle = if state.sort_by_name { "" } else { "name" };
    let tree = if roots.is_empty() {
        "<p>The tree is empty.</p>".to_string()
    } else {
        render_tree(roots, state)
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Tree management</title>\
         <style>.bold{{font-weight:bold}} .toggle{{text-decoration:none}}</style></head>\n\
         <body>\n<h1>Tree management</h1>\n\
         <nav><a href=\"/management/create\">Create new</a> | \
         <a href=\"/management?expand=true\">Expand all</a> | \
         <a href=\"/management/load\">Load demo data</a> | \
         <a href=\"/management/clear\">Clear</a></nav>\n\
         <form method=\"post\" action=\"/management\">\
         <input type=\"hidden\" name=\"sortby\" value=\"{sort}\">\
         <button type=\"submit\">Sort by name</button></form>\n\
         {tree}\n</body>\n</html>\n",
        sort = sort_toggle,
        tree = tree,
    )
}
