//! Bottom-up processing order
//!
//! A directory's documentation summarizes its children, so every child must
//! be finalized first. The schedule is the post-order of qualifying nodes.

use super::{DirectoryNode, DirectoryTree};

/// Computes the bottom-up processing order over a scanned tree
pub struct TraversalScheduler;

impl TraversalScheduler {
    /// Qualifying directories, deepest first, root last iff it qualifies.
    ///
    /// Siblings keep scan order (sorted by name).
    pub fn schedule(tree: &DirectoryTree) -> Vec<&DirectoryNode> {
        let mut order = Vec::new();
        Self::visit(&tree.root, &mut order);
        order
    }

    fn visit<'a>(node: &'a DirectoryNode, order: &mut Vec<&'a DirectoryNode>) {
        if !node.is_source_folder {
            // No qualifying descendant either, by propagation.
            return;
        }
        for child in &node.children {
            Self::visit(child, order);
        }
        order.push(node);
    }
}
