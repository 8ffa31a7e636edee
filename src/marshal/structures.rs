//! Reference linked-list and binary-tree structures
//!
//! These mirror the construction and flattening rules every emitter writes
//! into its harness, so expected values can be normalised the same way a
//! submitted program's result is.

/// Maximum number of nodes visited while flattening a structure
pub const TRAVERSAL_LIMIT: usize = 10_000;

/// Arena-backed singly linked list.
///
/// `next` links are indices, so a cycle can be represented (and is cut off
/// by [`TRAVERSAL_LIMIT`] when flattening).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkedList {
    values: Vec<i64>,
    next: Vec<Option<usize>>,
    head: Option<usize>,
}

impl LinkedList {
    /// Build a node chain from ordered values; the head is the first value
    pub fn from_values(values: &[i64]) -> Self {
        let next = (0..values.len())
            .map(|i| if i + 1 < values.len() { Some(i + 1) } else { None })
            .collect();
        LinkedList {
            values: values.to_vec(),
            next,
            head: if values.is_empty() { None } else { Some(0) },
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Traverse from the head, stopping after [`TRAVERSAL_LIMIT`] nodes
    pub fn to_values(&self) -> Vec<i64> {
        let mut out = Vec::new();
        let mut cursor = self.head;
        while let Some(index) = cursor {
            if out.len() >= TRAVERSAL_LIMIT {
                break;
            }
            out.push(self.values[index]);
            cursor = self.next[index];
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TreeNode {
    val: i64,
    left: Option<usize>,
    right: Option<usize>,
}

/// Arena-backed binary tree built from a level-order encoding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinaryTree {
    nodes: Vec<TreeNode>,
    root: Option<usize>,
}

impl BinaryTree {
    /// Breadth-first insertion.
    ///
    /// The first entry is the root (an absent first entry is the empty tree);
    /// each later entry fills the left then right slot of the oldest node on
    /// the frontier. An absent entry consumes a slot without creating a child.
    pub fn from_level_order(values: &[Option<i64>]) -> Self {
        let mut tree = BinaryTree::default();
        let Some(Some(root_val)) = values.first() else {
            return tree;
        };
        tree.root = Some(tree.push(*root_val));

        let mut frontier = std::collections::VecDeque::from([0usize]);
        let mut rest = values[1..].iter();
        while let Some(parent) = frontier.pop_front() {
            for is_left in [true, false] {
                let Some(entry) = rest.next() else {
                    return tree;
                };
                if let Some(val) = entry {
                    let child = tree.push(*val);
                    if is_left {
                        tree.nodes[parent].left = Some(child);
                    } else {
                        tree.nodes[parent].right = Some(child);
                    }
                    frontier.push_back(child);
                }
            }
        }
        tree
    }

    fn push(&mut self, val: i64) -> usize {
        self.nodes.push(TreeNode {
            val,
            left: None,
            right: None,
        });
        self.nodes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Serialize back to level order with trailing absent entries trimmed
    pub fn to_level_order(&self) -> Vec<Option<i64>> {
        let mut out = Vec::new();
        let mut queue = std::collections::VecDeque::from([self.root]);
        let mut visited = 0;
        while let Some(slot) = queue.pop_front() {
            match slot {
                Some(index) if visited < TRAVERSAL_LIMIT => {
                    visited += 1;
                    let node = &self.nodes[index];
                    out.push(Some(node.val));
                    queue.push_back(node.left);
                    queue.push_back(node.right);
                }
                Some(_) => break,
                None => out.push(None),
            }
        }
        while matches!(out.last(), Some(None)) {
            out.pop();
        }
        out
    }
}
