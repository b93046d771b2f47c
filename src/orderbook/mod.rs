//! Order book module: the buy-side resting order index.
//!
//! ## Architecture
//!
//! The buy side is a 2-3 tree with:
//!
//! - **Slab-based storage**: nodes in one arena, linked by `usize` keys
//! - **Inline payload**: 1 or 2 orders embedded in every node
//! - **Price-time priority**: ascending price, FIFO within a price
//!
//! ## Components
//!
//! - [`BuyNode`]: one tree node with its orders and links
//! - [`BuyTree`]: the tree itself, with placement and inspection
//!
//! ## Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | Place order | O(log n) |
//! | Best bid | O(log n) |
//! | In-order walk | O(n) |
//! | Cancel order | not supported |
//!
//! ## Example
//!
//! ```
//! use clob_index::orderbook::BuyTree;
//! use clob_index::types::Order;
//!
//! let mut tree = BuyTree::with_capacity(1_000);
//! tree.place(Order::new(99, 1000, 42));
//! tree.place(Order::new(99, 1000, 41));
//!
//! let idents: Vec<u64> = tree.iter().map(|o| o.ident).collect();
//! assert_eq!(idents, vec![42, 41]);
//! ```

pub mod node;
pub mod tree;

pub use node::{BuyNode, NodeKey};
pub use tree::{BuyTree, Iter};
