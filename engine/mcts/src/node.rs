//! Search tree node representation.
//!
//! Each node represents a game position reached from the root by a move
//! sequence. Nodes are plain records; all behaviour that mutates them lives
//! in the tree and the search controller.

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the search tree.
///
/// `value_sum / visits` is the expected outcome for the side to move at this
/// node. A parent therefore scores a child by the negated mean.
///
/// Invariants: `visits == 0` implies `children.is_none()` and
/// `value_sum == 0.0`. `value_sum == visits` (with visits > 0) marks a proven
/// win for the side to move; `value_sum == -visits` a proven loss.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchNode<M> {
    /// N: simulations that passed through or were attributed to this node.
    pub visits: u32,

    /// W: signed accumulator of simulation values.
    pub value_sum: f64,

    /// P: prior assigned by the evaluator when the node was created.
    pub prior: f64,

    /// Children in move enumeration order; `None` until expanded.
    pub children: Option<Vec<(M, NodeId)>>,
}

impl<M> SearchNode<M> {
    /// Unvisited node with the given prior.
    pub fn new(prior: f64) -> Self {
        Self {
            visits: 0,
            value_sum: 0.0,
            prior,
            children: None,
        }
    }

    /// Mean value W/N, or 0.0 if never visited.
    #[inline]
    pub fn mean_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / self.visits as f64
        }
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.children.is_some()
    }

    /// Number of children, 0 if unexpanded.
    #[inline]
    pub fn num_children(&self) -> usize {
        self.children.as_ref().map_or(0, Vec::len)
    }

    #[inline]
    pub fn is_proven_win(&self) -> bool {
        self.visits > 0 && self.value_sum == self.visits as f64
    }

    #[inline]
    pub fn is_proven_loss(&self) -> bool {
        self.visits > 0 && self.value_sum == -(self.visits as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node() {
        let node: SearchNode<u8> = SearchNode::new(0.25);
        assert_eq!(node.visits, 0);
        assert_eq!(node.value_sum, 0.0);
        assert!((node.prior - 0.25).abs() < 1e-12);
        assert!(!node.is_expanded());
        assert_eq!(node.num_children(), 0);
    }

    #[test]
    fn test_mean_value() {
        let mut node: SearchNode<u8> = SearchNode::new(0.0);

        // Unvisited
        assert_eq!(node.mean_value(), 0.0);

        node.visits = 4;
        node.value_sum = 2.0;
        assert!((node.mean_value() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_proven_flags() {
        let mut node: SearchNode<u8> = SearchNode::new(0.0);
        assert!(!node.is_proven_win());
        assert!(!node.is_proven_loss());

        node.visits = 3;
        node.value_sum = 3.0;
        assert!(node.is_proven_win());

        node.value_sum = -3.0;
        assert!(node.is_proven_loss());

        node.value_sum = 2.5;
        assert!(!node.is_proven_win());
        assert!(!node.is_proven_loss());
    }
}
