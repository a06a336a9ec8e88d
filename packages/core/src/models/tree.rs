//! In-memory tree assembly
//!
//! The store only knows flat rows with a `parent_id` column. `NodeArena`
//! indexes a snapshot of those rows by identifier and groups them by
//! `parent_id`; `TreeNode` is the nested shape handed to the
//! presentation layer.

use crate::models::Node;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A node with its children attached recursively.
///
/// Serializes as the node's own fields plus a `children` array, which is the
/// shape the tree widget consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: Node,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(node: Node) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> i64 {
        self.node.id
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of nodes below this one, at any depth
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Depth-first search for `id` in this subtree (including self)
    pub fn find(&self, id: i64) -> Option<&TreeNode> {
        if self.node.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Snapshot of nodes indexed by identifier.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: BTreeMap<i64, Node>,
}

impl NodeArena {
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|node| (node.id, node)).collect(),
        }
    }

    /// Identifiers of every node below `id`, breadth-first.
    ///
    /// A visited set keeps the walk finite if the table contains a cycle.
    pub fn descendant_ids(&self, id: i64) -> Vec<i64> {
        let index = self.child_index();
        let mut visited = HashSet::from([id]);
        let mut result = Vec::new();
        let mut frontier = vec![id];

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for parent in frontier {
                for child in index.get(&Some(parent)).into_iter().flatten() {
                    if visited.insert(child.id) {
                        result.push(child.id);
                        next.push(child.id);
                    }
                }
            }
            frontier = next;
        }

        result
    }

    /// Assemble the nested forest of every root.
    ///
    /// Nodes whose parent is missing from the snapshot are not reachable from
    /// a root and are left out.
    pub fn into_forest(self) -> Vec<TreeNode> {
        let index = self.child_index();
        index
            .get(&None)
            .into_iter()
            .flatten()
            .map(|root| Self::attach_children(root, &index))
            .collect()
    }

    // Built once per assembly so the recursion below is linear.
    fn child_index(&self) -> HashMap<Option<i64>, Vec<&Node>> {
        let mut index: HashMap<Option<i64>, Vec<&Node>> = HashMap::new();
        for node in self.nodes.values() {
            index.entry(node.parent_id).or_default().push(node);
        }
        index
    }

    fn attach_children(node: &Node, index: &HashMap<Option<i64>, Vec<&Node>>) -> TreeNode {
        let children = index
            .get(&Some(node.id))
            .into_iter()
            .flatten()
            .map(|child| Self::attach_children(child, index))
            .collect();

        TreeNode {
            node: node.clone(),
            children,
        }
    }
}
