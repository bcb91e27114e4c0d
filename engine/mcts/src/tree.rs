//! Search tree with arena allocation.
//!
//! Nodes live in a contiguous Vec and are referenced by [`NodeId`] indices.
//! Each node holds an ordered association list from move to child index, so
//! the tree never holds owning references into itself.

use std::collections::VecDeque;

use crate::node::{NodeId, SearchNode};

/// Switches for the backpropagation state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackpropOptions {
    /// Propagate proven wins and losses instead of averaging them.
    pub win_loss: bool,
    /// Propagate 0 through an ancestor holding exactly one visit worth 0.
    pub draw_choice_correction: bool,
}

/// One step of backpropagation. `level` is a length of the selection path:
/// the node being finished sits at `path[level]` (or is the leaf when
/// `level == path.len()`), and the step updates ancestors below that.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Propagation {
    /// Add `value` with alternating sign to every ancestor below `level`.
    Normal { level: usize, value: f64 },
    /// The node at `level` is a proven win for its mover.
    Win { level: usize },
    /// The node at `level` is a proven loss for its mover.
    Loss { level: usize },
}

/// Search tree with arena-based node storage.
#[derive(Debug, Clone)]
pub struct SearchTree<M> {
    nodes: Vec<SearchNode<M>>,
    root: NodeId,
}

impl<M: Clone + PartialEq> Default for SearchTree<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Clone + PartialEq> SearchTree<M> {
    /// Create a tree holding a single unvisited root.
    pub fn new() -> Self {
        Self {
            nodes: vec![SearchNode::new(0.0)],
            root: NodeId(0),
        }
    }

    /// Discard everything and start again from an unvisited root.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.push(SearchNode::new(0.0));
        self.root = NodeId(0);
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn root_node(&self) -> &SearchNode<M> {
        self.get(self.root)
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &SearchNode<M> {
        &self.nodes[id.index()]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode<M> {
        &mut self.nodes[id.index()]
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (never true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    pub fn allocate(&mut self, node: SearchNode<M>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Append a child to `parent`, marking the parent expanded.
    pub fn add_child(&mut self, parent: NodeId, mv: M, node: SearchNode<M>) -> NodeId {
        let child = self.allocate(node);
        self.get_mut(parent)
            .children
            .get_or_insert_with(Vec::new)
            .push((mv, child));
        child
    }

    /// Children of `id` in enumeration order, empty if unexpanded.
    #[inline]
    pub fn children(&self, id: NodeId) -> &[(M, NodeId)] {
        self.get(id).children.as_deref().unwrap_or(&[])
    }

    /// The child reached from `id` by `mv`, if it exists.
    pub fn child(&self, id: NodeId, mv: &M) -> Option<NodeId> {
        self.children(id)
            .iter()
            .find(|(m, _)| m == mv)
            .map(|(_, child)| *child)
    }

    /// Backpropagate the leaf's per-visit value `W/N` along `path`.
    ///
    /// `path` holds the ancestors of `leaf`, root first; the leaf itself has
    /// already been updated by expansion. Proof propagation alternates
    /// between win and loss steps in a loop, bounded by the path length.
    pub fn backpropagate(&mut self, path: &[NodeId], leaf: NodeId, options: BackpropOptions) {
        let value = self.get(leaf).mean_value();
        let level = path.len();

        let mut step = Some(if options.win_loss && value == 1.0 {
            Propagation::Win { level }
        } else if options.win_loss && value == -1.0 {
            Propagation::Loss { level }
        } else {
            Propagation::Normal { level, value }
        });

        while let Some(current) = step {
            step = match current {
                Propagation::Normal { level, value } => {
                    self.propagate_normal(path, level, value, options)
                }
                Propagation::Win { level } => self.propagate_win(path, level),
                Propagation::Loss { level } => self.propagate_loss(path, level),
            };
        }
    }

    fn propagate_normal(
        &mut self,
        path: &[NodeId],
        level: usize,
        value: f64,
        options: BackpropOptions,
    ) -> Option<Propagation> {
        let mut value = value;
        for j in (0..level).rev() {
            let node = self.get_mut(path[j]);
            if node.is_proven_win() {
                // a line explored below an already won node folds in as a loss
                return Some(Propagation::Loss { level: j + 1 });
            }
            if options.draw_choice_correction && node.visits == 1 && node.value_sum == 0.0 {
                value = 0.0;
            }
            let sign = if (level - j) % 2 == 0 { 1.0 } else { -1.0 };
            node.value_sum += value * sign;
            node.visits += 1;
        }
        None
    }

    fn propagate_loss(&mut self, path: &[NodeId], level: usize) -> Option<Propagation> {
        let parent = level.checked_sub(1)?;
        let node = self.get_mut(path[parent]);
        node.visits += 1;
        node.value_sum = node.visits as f64;
        (parent > 0).then_some(Propagation::Win { level: parent })
    }

    fn propagate_win(&mut self, path: &[NodeId], level: usize) -> Option<Propagation> {
        let parent = level.checked_sub(1)?;
        let id = path[parent];
        let all_won = self
            .children(id)
            .iter()
            .all(|(_, child)| self.get(*child).is_proven_win());

        let node = self.get_mut(id);
        node.visits += 1;
        if all_won {
            node.value_sum = -(node.visits as f64);
            (parent > 0).then_some(Propagation::Loss { level: parent })
        } else {
            node.value_sum -= 1.0;
            (parent > 0).then_some(Propagation::Normal {
                level: parent,
                value: -1.0,
            })
        }
    }

    /// Make the root's child for `mv` the new root, dropping its siblings.
    ///
    /// The arena is compacted to the kept subtree; statistics are preserved
    /// exactly. Returns `false` (and resets to an unvisited root) when the
    /// root has no child for `mv`.
    pub fn advance(&mut self, mv: &M) -> bool {
        let Some(new_root) = self.child(self.root, mv) else {
            self.reset();
            return false;
        };

        let mut old: Vec<Option<SearchNode<M>>> =
            std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        let mut kept = Vec::new();
        let mut queue = VecDeque::from([new_root]);
        // ids are handed out in enqueue order, which is also push order
        let mut next_id = 1u32;

        while let Some(old_id) = queue.pop_front() {
            let Some(mut node) = old[old_id.index()].take() else {
                continue;
            };
            if let Some(children) = node.children.as_mut() {
                for (_, child) in children.iter_mut() {
                    queue.push_back(*child);
                    *child = NodeId(next_id);
                    next_id += 1;
                }
            }
            kept.push(node);
        }

        self.nodes = kept;
        self.root = NodeId(0);
        true
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.root_node();
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visits,
            root_value: root.mean_value(),
            max_depth: self.max_depth(),
        }
    }

    fn max_depth(&self) -> u32 {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 0u32)];
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for (_, child) in self.children(id) {
                stack.push((*child, depth + 1));
            }
        }
        deepest
    }
}

/// Statistics about a search tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub root_value: f64,
    pub max_depth: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visited(visits: u32, value_sum: f64) -> SearchNode<u8> {
        SearchNode {
            visits,
            value_sum,
            prior: 0.0,
            children: None,
        }
    }

    /// root -> a -> leaf, with the ancestors unvisited so means are exact.
    fn chain(leaf_value: f64) -> (SearchTree<u8>, NodeId, NodeId) {
        let mut tree = SearchTree::new();
        let a = tree.add_child(tree.root(), 0, SearchNode::new(1.0));
        let leaf = tree.add_child(a, 1, visited(1, leaf_value));
        (tree, a, leaf)
    }

    #[test]
    fn test_new_tree() {
        let tree: SearchTree<u8> = SearchTree::new();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root(), NodeId(0));
        assert!(!tree.root_node().is_expanded());
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn test_add_child() {
        let mut tree = SearchTree::new();
        let child_id = tree.add_child(tree.root(), 7u8, SearchNode::new(0.5));

        assert_eq!(tree.len(), 2);
        assert_eq!(child_id, NodeId(1));
        assert_eq!(tree.children(tree.root()), &[(7, NodeId(1))]);
        assert_eq!(tree.child(tree.root(), &7), Some(child_id));
        assert_eq!(tree.child(tree.root(), &8), None);
        assert!((tree.get(child_id).prior - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_sum_alternation() {
        let (mut tree, a, leaf) = chain(0.3);
        let root = tree.root();

        tree.backpropagate(&[root, a], leaf, BackpropOptions::default());

        assert_eq!(tree.get(a).visits, 1);
        assert_eq!(tree.get(root).visits, 1);
        assert!((tree.get(a).mean_value() - (-0.3)).abs() < 1e-12);
        assert!((tree.get(root).mean_value() - 0.3).abs() < 1e-12);
        // the leaf is left as expansion set it
        assert_eq!(tree.get(leaf).visits, 1);
    }

    #[test]
    fn test_exact_win_averages_without_proofs() {
        let (mut tree, a, leaf) = chain(1.0);
        let root = tree.root();

        tree.backpropagate(&[root, a], leaf, BackpropOptions::default());

        assert!((tree.get(a).mean_value() + 1.0).abs() < 1e-12);
        assert!((tree.get(root).mean_value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_proven_win_closure() {
        let options = BackpropOptions {
            win_loss: true,
            ..Default::default()
        };
        let mut tree = SearchTree::new();
        let root = tree.root();
        tree.get_mut(root).visits = 4;
        tree.get_mut(root).value_sum = 0.5;

        let a = tree.add_child(root, 0u8, visited(3, -0.5));
        tree.add_child(a, 1, visited(2, 2.0)); // already proven
        let last = tree.add_child(a, 2, visited(1, 1.0)); // just proven by expansion

        tree.backpropagate(&[root, a], last, options);

        let a_node = tree.get(a);
        assert_eq!(a_node.visits, 4);
        assert!(a_node.is_proven_loss());

        let root_node = tree.get(root);
        assert_eq!(root_node.visits, 5);
        assert!(root_node.is_proven_win());
    }

    #[test]
    fn test_win_with_open_siblings_counts_as_loss() {
        let options = BackpropOptions {
            win_loss: true,
            ..Default::default()
        };
        let mut tree = SearchTree::new();
        let root = tree.root();
        tree.get_mut(root).visits = 2;

        let a = tree.add_child(root, 0u8, visited(2, 0.0));
        tree.add_child(a, 1, visited(1, 0.2));
        let won = tree.add_child(a, 2, visited(1, 1.0));

        tree.backpropagate(&[root, a], won, options);

        // a records a statistical loss, root the mirrored win
        assert_eq!(tree.get(a).visits, 3);
        assert!((tree.get(a).value_sum + 1.0).abs() < 1e-12);
        assert_eq!(tree.get(root).visits, 3);
        assert!((tree.get(root).value_sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_proven_loss_leaf_marks_parent_won() {
        let options = BackpropOptions {
            win_loss: true,
            ..Default::default()
        };
        let (mut tree, a, leaf) = chain(-1.0);
        let root = tree.root();
        tree.get_mut(root).visits = 1;
        tree.get_mut(a).visits = 1;
        tree.get_mut(a).value_sum = 0.25;

        tree.backpropagate(&[root, a], leaf, options);

        assert_eq!(tree.get(a).visits, 2);
        assert!(tree.get(a).is_proven_win());
        // root has only one child and it is now a proven win for the opponent
        assert!(tree.get(root).is_proven_loss());
    }

    #[test]
    fn test_normal_below_proven_win_folds_to_loss() {
        let mut tree = SearchTree::new();
        let root = tree.root();
        tree.get_mut(root).visits = 3;
        tree.get_mut(root).value_sum = -0.5;

        // a is already won for its mover
        let a = tree.add_child(root, 0u8, visited(2, 2.0));
        let b = tree.add_child(a, 1, visited(1, 0.0));
        let leaf = tree.add_child(b, 2, visited(1, 0.4));

        tree.backpropagate(&[root, a, b], leaf, BackpropOptions::default());

        // b got the ordinary update, then a stayed won and root is lost
        assert_eq!(tree.get(b).visits, 2);
        assert!((tree.get(b).value_sum + 0.4).abs() < 1e-12);
        assert_eq!(tree.get(a).visits, 3);
        assert!(tree.get(a).is_proven_win());
        assert_eq!(tree.get(root).visits, 4);
        assert!(tree.get(root).is_proven_loss());
    }

    #[test]
    fn test_draw_choice_correction() {
        let options = BackpropOptions {
            draw_choice_correction: true,
            ..Default::default()
        };
        let mut tree = SearchTree::new();
        let root = tree.root();
        tree.get_mut(root).visits = 5;
        tree.get_mut(root).value_sum = 1.0;
        let a = tree.add_child(root, 0u8, visited(1, 0.0));
        let leaf = tree.add_child(a, 1, visited(1, 0.6));

        tree.backpropagate(&[root, a], leaf, options);

        assert_eq!(tree.get(a).visits, 2);
        assert_eq!(tree.get(a).value_sum, 0.0);
        assert_eq!(tree.get(root).visits, 6);
        assert!((tree.get(root).value_sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_advance_keeps_subtree() {
        let mut tree = SearchTree::new();
        let root = tree.root();
        tree.get_mut(root).visits = 10;
        let e4 = tree.add_child(root, 1u8, visited(6, -1.5));
        let d4 = tree.add_child(root, 2u8, visited(3, 0.5));
        tree.add_child(d4, 9, visited(1, 0.1));
        let reply = tree.add_child(e4, 3, visited(4, 2.0));
        tree.add_child(reply, 4, visited(2, -0.5));

        assert!(tree.advance(&1));

        assert_eq!(tree.len(), 3);
        let new_root = tree.root_node();
        assert_eq!(new_root.visits, 6);
        assert!((new_root.value_sum + 1.5).abs() < 1e-12);

        let reply = tree.child(tree.root(), &3).unwrap();
        assert_eq!(tree.get(reply).visits, 4);
        let deeper = tree.child(reply, &4).unwrap();
        assert_eq!(tree.get(deeper).visits, 2);
        assert_eq!(tree.child(tree.root(), &9), None);
    }

    #[test]
    fn test_advance_unknown_move_resets() {
        let mut tree = SearchTree::new();
        tree.get_mut(tree.root()).visits = 3;
        tree.add_child(tree.root(), 1u8, visited(2, 0.0));

        assert!(!tree.advance(&5));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root_node().visits, 0);
        assert!(!tree.root_node().is_expanded());
    }

    #[test]
    fn test_tree_stats() {
        let mut tree = SearchTree::new();
        let c = tree.add_child(tree.root(), 0u8, SearchNode::new(0.5));
        tree.add_child(c, 1, SearchNode::new(0.5));
        tree.get_mut(tree.root()).visits = 2;
        tree.get_mut(tree.root()).value_sum = 1.0;

        let stats = tree.stats();
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(stats.root_visits, 2);
        assert!((stats.root_value - 0.5).abs() < 1e-12);
    }
}
