//! Buy-side order tree.
//!
//! ## Architecture
//!
//! `BuyTree` is a 2-3 tree (a B-tree of order 3) over a slab arena:
//!
//! - **Slab**: every node lives in one `Slab<BuyNode>`, links are slab keys
//! - **Inline orders**: each node embeds 1 or 2 orders, no per-order objects
//! - **No index**: there is no identifier lookup, hence no cancelation yet
//!
//! B-tree nodes were chosen because they descend both on insert and delete,
//! without worst-case outliers. The case logic is fully spelled out per slot
//! and child position rather than looped over arrays, which keeps the hot
//! path friendly to branch prediction.
//!
//! ## Price-Time Priority
//!
//! Descent goes right whenever the new price is greater than or equal to a
//! key. A newer order therefore always lands after every resting order of the
//! same price, and an in-order walk yields FIFO within each price.
//!
//! ## Example
//!
//! ```
//! use clob_index::orderbook::BuyTree;
//! use clob_index::types::Order;
//!
//! let mut tree = BuyTree::new();
//! tree.place(Order::new(99, 1000, 42));
//! tree.place(Order::new(105, 999, 41));
//! let root = tree.place(Order::new(115, 99, 40));
//!
//! assert_eq!(tree.node(root).unwrap().orders(), &[Order::new(105, 999, 41)]);
//! assert_eq!(tree.height(), 2);
//! assert_eq!(tree.best_bid(), Some(&Order::new(115, 99, 40)));
//! ```

use std::fmt::Write as _;

use sha2::{Digest, Sha256};
use slab::Slab;
use tracing::debug;

use crate::orderbook::{BuyNode, NodeKey};
use crate::types::Order;

/// Separator between node groups in [`BuyTree::dump`]
const DUMP_RULE: &str =
    "=======================================================================";

/// Buy orders sorted ascending on price, then on arrival.
#[derive(Debug, Clone)]
pub struct BuyTree {
    /// Node arena
    nodes: Slab<BuyNode>,

    /// Top node; changes on every split that reaches it
    root: Option<NodeKey>,

    /// Number of orders held
    len: usize,
}

impl Default for BuyTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BuyTree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self {
            nodes: Slab::new(),
            root: None,
            len: 0,
        }
    }

    /// Create a tree with node storage for `order_capacity` orders
    ///
    /// A node holds at least one order, so this never under-allocates.
    pub fn with_capacity(order_capacity: usize) -> Self {
        Self {
            nodes: Slab::with_capacity(order_capacity),
            root: None,
            len: 0,
        }
    }

    // ========================================================================
    // Size and Access
    // ========================================================================

    /// Number of orders in the tree
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes allocated
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Preallocated node slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// The current root key
    #[inline]
    pub fn root(&self) -> Option<NodeKey> {
        self.root
    }

    /// Look up a node by key
    #[inline]
    pub fn node(&self, key: NodeKey) -> Option<&BuyNode> {
        self.nodes.get(key)
    }

    /// Number of node rows; 0 when empty
    pub fn height(&self) -> usize {
        let mut rows = 0;
        let mut next = self.root;
        while let Some(key) = next {
            rows += 1;
            next = self.nodes[key].below[0];
        }
        rows
    }

    /// Level of `key` counted up from the bottom row, paired with the level
    /// of the root.
    pub fn depth_of(&self, key: NodeKey) -> Option<(usize, usize)> {
        let node = self.nodes.get(key)?;

        let mut level = 0;
        let mut next = node.below[0];
        while let Some(child) = next {
            level += 1;
            next = self.nodes[child].below[0];
        }

        let mut level_max = level;
        let mut next = node.above;
        while let Some(parent) = next {
            level_max += 1;
            next = self.nodes[parent].above;
        }

        Some((level, level_max))
    }

    /// The order with the highest priority: the last one of the highest price.
    pub fn best_bid(&self) -> Option<&Order> {
        let mut node = &self.nodes[self.root?];
        while let Some(child) = node.below[node.size()] {
            node = &self.nodes[child];
        }
        node.orders().last()
    }

    /// In-order walk, ascending price then arrival
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            nodes: &self.nodes,
            stack: self.root.map(|root| (root, 0)).into_iter().collect(),
            remaining: self.len,
        }
    }

    // ========================================================================
    // Placement
    // ========================================================================

    /// Insert without presence or duplicate check.
    ///
    /// The order sorts ascending on price, and after any resting orders of
    /// the same price.
    ///
    /// # Returns
    ///
    /// The root key after the insertion
    ///
    /// # Example
    ///
    /// ```
    /// use clob_index::orderbook::BuyTree;
    /// use clob_index::types::Order;
    ///
    /// let mut tree = BuyTree::new();
    /// let first = tree.place(Order::new(99, 1000, 42));
    /// let second = tree.place(Order::new(98, 1001, 43));
    ///
    /// // no split yet
    /// assert_eq!(first, second);
    /// assert_eq!(tree.len(), 2);
    /// ```
    pub fn place(&mut self, order: Order) -> NodeKey {
        self.len += 1;

        let root = match self.root {
            Some(root) => root,
            None => {
                let key = self.nodes.insert(BuyNode::leaf(order));
                self.root = Some(key);
                return key;
            }
        };

        let mut n = root;
        let grown = loop {
            let node = &mut self.nodes[n];
            match node.size {
                1 => {
                    if order.price >= node.slots[0].price {
                        if let Some(next) = node.below[1] {
                            n = next;
                            continue;
                        }
                        // at bottom level
                        node.slots[1] = order;
                    } else {
                        if let Some(next) = node.below[0] {
                            n = next;
                            continue;
                        }
                        // at bottom level
                        node.slots[1] = node.slots[0];
                        node.slots[0] = order;
                    }
                    node.size = 2;
                    break None;
                }

                2 => {
                    if order.price >= node.slots[1].price {
                        if let Some(next) = node.below[2] {
                            n = next;
                            continue;
                        }
                        // overflow [ s0 s1 order ]
                        node.size = 1;
                        let promoted = node.slots[1];
                        break self.split_leaf(n, promoted, order);
                    } else if order.price >= node.slots[0].price {
                        if let Some(next) = node.below[1] {
                            n = next;
                            continue;
                        }
                        // overflow [ s0 order s1 ]
                        node.size = 1;
                        let high = node.slots[1];
                        break self.split_leaf(n, order, high);
                    } else {
                        if let Some(next) = node.below[0] {
                            n = next;
                            continue;
                        }
                        // overflow [ order s0 s1 ]
                        node.size = 1;
                        let promoted = node.slots[0];
                        let high = node.slots[1];
                        node.slots[0] = order;
                        break self.split_leaf(n, promoted, high);
                    }
                }

                size => unreachable!("buy node {n} holds {size} orders"),
            }
        };

        grown.unwrap_or(root)
    }

    /// Finish a bottom-row split: `high` moves into a new right sibling of
    /// `left`, and `promoted` goes up.
    fn split_leaf(&mut self, left: NodeKey, promoted: Order, high: Order) -> Option<NodeKey> {
        let right = self.nodes.insert(BuyNode::leaf(high));
        self.push_up(left, promoted, right)
    }

    /// Send `promoted` to the parent of `left`, together with the new node
    /// `right` to place next to `left`.
    ///
    /// # Returns
    ///
    /// The new root when the split reached the top
    fn push_up(&mut self, left: NodeKey, promoted: Order, right: NodeKey) -> Option<NodeKey> {
        let (mut left, mut promoted, mut right) = (left, promoted, right);
        loop {
            let Some(parent) = self.nodes[left].above else {
                return Some(self.mount(left, promoted, right));
            };
            match self.push(parent, promoted, left, right) {
                None => return None,
                Some((up, split)) => {
                    left = parent;
                    promoted = up;
                    right = split;
                }
            }
        }
    }

    /// Put a new root with a single order on top of `left` and `right`.
    fn mount(&mut self, left: NodeKey, promoted: Order, right: NodeKey) -> NodeKey {
        let top = self.adopt(promoted, left, right);
        self.root = Some(top);
        debug!(root = top, height = self.height(), orders = self.len, "buy tree grew a level");
        top
    }

    /// New single-order node with `left` and `right` below it.
    fn adopt(&mut self, order: Order, left: NodeKey, right: NodeKey) -> NodeKey {
        let mut node = BuyNode::leaf(order);
        node.below[0] = Some(left);
        node.below[1] = Some(right);
        let key = self.nodes.insert(node);
        self.nodes[left].above = Some(key);
        self.nodes[right].above = Some(key);
        key
    }

    /// Receive `order` from below at node `a`.
    ///
    /// `left` MUST be a child of `a`; `right` is its new sibling, to be
    /// placed directly right of `left`.
    ///
    /// # Returns
    ///
    /// The order to promote further and the new node split off `a`, if `a`
    /// was full.
    fn push(
        &mut self,
        a: NodeKey,
        order: Order,
        left: NodeKey,
        right: NodeKey,
    ) -> Option<(Order, NodeKey)> {
        debug_assert_eq!(self.nodes[left].above, Some(a));

        let node = &mut self.nodes[a];
        match node.size {
            1 => {
                if node.below[1] == Some(left) {
                    //   (A)          (A) (C)
                    //   / \    =>    / \ / \
                    // (B) (L)      (B) (L) (R)
                    node.below[2] = Some(right);
                    node.slots[1] = order;
                } else {
                    debug_assert_eq!(node.below[0], Some(left));
                    //   (A)          (C) (A)
                    //   / \    =>    / \ / \
                    // (L) (B)      (L) (R) (B)
                    node.below[2] = node.below[1];
                    node.below[1] = Some(right);
                    node.slots[1] = node.slots[0];
                    node.slots[0] = order;
                }
                node.size = 2;
                self.nodes[right].above = Some(a);
                None
            }

            2 => {
                if node.below[2] == Some(left) {
                    //                               (A2)
                    //    (A1)  (A2)           (A1)   ^^   (C)
                    //    /  \  /  \    =>     /  \        / \
                    // (B1)  (B2)  (L)      (B1)  (B2)   (L) (R)
                    let up = node.slots[1];
                    node.size = 1;
                    node.below[2] = None;
                    let split = self.adopt(order, left, right);
                    return Some((up, split));
                }

                let high = node.slots[1];
                let (Some(b1), Some(b2)) = (node.below[1], node.below[2].take()) else {
                    unreachable!("full buy node {a} lacks children");
                };
                node.size = 1;

                if b1 == left {
                    //                               (C)
                    //    (A1) (A2)            (A1)   ^^   (A2)
                    //    /  \ /  \     =>     /  \        /  \
                    // (B1)  (L)  (B2)      (B1)  (L)    (R)  (B2)
                    let split = self.adopt(high, right, b2);
                    Some((order, split))
                } else {
                    debug_assert_eq!(node.below[0], Some(left));
                    //                              (A1)
                    //   (A1)  (A2)            (C)   ^^   (A2)
                    //   /  \  /  \     =>     / \        /  \
                    // (L)  (B1)  (B2)      (L)  (R)   (B1)   (B2)
                    let up = node.slots[0];
                    node.slots[0] = order;
                    node.below[1] = Some(right);
                    self.nodes[right].above = Some(a);
                    let split = self.adopt(high, b1, b2);
                    Some((up, split))
                }
            }

            size => unreachable!("buy node {a} holds {size} orders"),
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// SHA-256 over the in-order sequence of orders.
    ///
    /// Two trees with the same orders in the same priority order have the
    /// same root, whatever their node layout.
    pub fn state_root(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for order in self.iter() {
            hasher.update(order.to_le_bytes());
        }
        let result = hasher.finalize();

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }

    /// Node rendering with its depth pair, e.g. `@0/1:[ 99 1000 42 ]`
    pub fn label(&self, key: NodeKey) -> Option<String> {
        let (level, level_max) = self.depth_of(key)?;
        Some(format!("@{level}/{level_max}:{}", self.nodes[key]))
    }

    /// Textual representation of the tree for debugging, one node per line,
    /// row by row.
    pub fn dump(&self) -> String {
        let Some(root) = self.root else {
            return "<empty>\n".to_string();
        };

        let mut out = String::new();
        self.dump_node(&mut out, root);

        let mut row = vec![root];
        while self.nodes[row[0]].below[0].is_some() {
            let mut next_row = Vec::with_capacity(row.len() * 3);
            for key in row {
                out.push_str(DUMP_RULE);
                out.push('\n');
                let node = &self.nodes[key];
                for child in node.below[..=node.size()].iter().flatten() {
                    next_row.push(*child);
                    self.dump_node(&mut out, *child);
                }
            }
            row = next_row;
        }
        out
    }

    fn dump_node(&self, out: &mut String, key: NodeKey) {
        if let Some(label) = self.label(key) {
            let _ = writeln!(out, "{label}");
        }
    }

    /// Verify the structure, panicking on the first violation.
    ///
    /// Checks slot counts, leaf/internal shape, parent links, a uniform
    /// bottom row, ascending in-order prices and the order count.
    pub fn assert_invariants(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.len, 0, "empty tree with orders counted");
            assert!(self.nodes.is_empty(), "empty tree with nodes allocated");
            return;
        };

        let mut bottom = None;
        let mut orders = 0;
        let mut nodes = 0;
        self.check_node(root, None, 0, &mut bottom, &mut orders, &mut nodes);
        assert_eq!(orders, self.len, "order count");
        assert_eq!(nodes, self.nodes.len(), "unreachable nodes in arena");

        let mut walked = 0;
        let mut last: Option<i64> = None;
        for order in self.iter() {
            if let Some(price) = last {
                assert!(price <= order.price, "price {} after {price}", order.price);
            }
            last = Some(order.price);
            walked += 1;
        }
        assert_eq!(walked, self.len, "in-order walk length");
    }

    fn check_node(
        &self,
        key: NodeKey,
        parent: Option<NodeKey>,
        depth: usize,
        bottom: &mut Option<usize>,
        orders: &mut usize,
        nodes: &mut usize,
    ) {
        let node = &self.nodes[key];
        assert!(matches!(node.size, 1 | 2), "node {key} holds {} orders", node.size);
        assert_eq!(node.above, parent, "parent link of node {key}");
        if node.size == 2 {
            assert!(node.slots[0].price <= node.slots[1].price, "node {key} unsorted");
        }
        *orders += node.size();
        *nodes += 1;

        if node.is_leaf() {
            assert!(node.below.iter().all(Option::is_none), "leaf {key} with children");
            match *bottom {
                Some(d) => assert_eq!(d, depth, "leaf {key} off the bottom row"),
                None => *bottom = Some(depth),
            }
            return;
        }

        for (i, child) in node.below.iter().enumerate() {
            assert_eq!(child.is_some(), i <= node.size(), "child {i} of node {key}");
        }
        for child in node.below[..=node.size()].iter().flatten() {
            self.check_node(*child, Some(key), depth + 1, bottom, orders, nodes);
        }
    }
}

impl<'a> IntoIterator for &'a BuyTree {
    type Item = &'a Order;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// In-order iterator over a [`BuyTree`]
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    nodes: &'a Slab<BuyNode>,
    /// (node, step) where even steps descend child step/2 and odd steps
    /// yield slot step/2
    stack: Vec<(NodeKey, usize)>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Order;

    fn next(&mut self) -> Option<&'a Order> {
        let nodes = self.nodes;
        loop {
            let top = self.stack.last_mut()?;
            let (key, step) = *top;
            let node = &nodes[key];
            if step > 2 * node.size() {
                self.stack.pop();
                continue;
            }
            top.1 += 1;

            if step % 2 == 0 {
                if let Some(child) = node.below[step / 2] {
                    self.stack.push((child, 0));
                }
            } else {
                self.remaining -= 1;
                return Some(&node.slots[step / 2]);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

// ============================================================================
// Unit Tests
// ============================================================================
