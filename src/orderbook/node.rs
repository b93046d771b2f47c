//! Tree node for slab-based storage.
//!
//! ## Design
//!
//! A `BuyNode` holds one or two orders inline, sorted ascending on price,
//! with the latest entries placed after any previous ones of the same price.
//! Node size 2/3 keeps the fully spelled-out case logic in the tree small,
//! and it leaves room for insertion on both sides of a node.
//!
//! ## Slab Integration
//!
//! Nodes live in a `Slab<BuyNode>` owned by the tree:
//! - Keys are `usize` values returned by `slab.insert()`
//! - Parent and child links are keys, never references
//! - A parent key is a navigation aid only; ownership stays with the arena
//!
//! ## Shape
//!
//! Only the first `size + 1` child keys are in use. The bottom row of nodes
//! has no child keys at all, and every other node has all `size + 1`.

use std::fmt;

use crate::types::Order;

/// Slab key of a [`BuyNode`]
pub type NodeKey = usize;

/// 2-3 tree node stored in the slab.
///
/// ## Memory Layout
///
/// ```text
/// BuyNode {
///     slots: [Order; 2]            (48 bytes, inline)
///     below: [Option<usize>; 3]    (48 bytes)
///     above: Option<usize>         (16 bytes)
///     size:  u8
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyNode {
    /// Orders sorted on price; only `slots[..size]` are live
    pub(crate) slots: [Order; 2],

    /// Child keys; all `None` on the bottom row
    pub(crate) below: [Option<NodeKey>; 3],

    /// Parent key; `None` for the root exclusively
    pub(crate) above: Option<NodeKey>,

    /// The number of orders, either 1 or 2
    pub(crate) size: u8,
}

impl BuyNode {
    /// Create a single-order leaf (not yet linked)
    ///
    /// # Example
    ///
    /// ```
    /// use clob_index::orderbook::BuyNode;
    /// use clob_index::types::Order;
    ///
    /// let node = BuyNode::leaf(Order::new(99, 1000, 42));
    ///
    /// assert_eq!(node.size(), 1);
    /// assert!(node.is_leaf());
    /// assert!(node.parent().is_none());
    /// ```
    #[inline]
    pub fn leaf(order: Order) -> Self {
        Self {
            slots: [order, Order::default()],
            below: [None; 3],
            above: None,
            size: 1,
        }
    }

    /// Number of orders held, 1 or 2
    #[inline]
    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// The live orders, ascending
    #[inline]
    pub fn orders(&self) -> &[Order] {
        &self.slots[..self.size()]
    }

    /// Child key at `index`, if present
    #[inline]
    pub fn child(&self, index: usize) -> Option<NodeKey> {
        self.below.get(index).copied().flatten()
    }

    /// The parent key; `None` for the root
    #[inline]
    pub fn parent(&self) -> Option<NodeKey> {
        self.above
    }

    /// Whether this node is on the bottom row
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.below[0].is_none()
    }
}

impl fmt::Display for BuyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size {
            1 => write!(f, "{}", self.slots[0]),
            2 => write!(f, "{}{}", self.slots[0], self.slots[1]),
            n => write!(f, "<size {n}>"),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
