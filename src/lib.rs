//! # CLOB Index
//!
//! Resting-order index of a central limit order book, fed by a stream of
//! fixed-width binary order packets.
//!
//! ## Architecture
//!
//! The crate consists of:
//! - **Types**: Order, Side and the 32-byte packet codec
//! - **OrderBook**: the buy-side 2-3 tree with slab-based node storage
//! - **Engine**: the ingestion loop that decodes packets into the tree
//!
//! ## Design Principles
//!
//! 1. **Price-Time Priority**: ascending price, FIFO within a price
//! 2. **Inline Payload**: orders live by value inside tree nodes
//! 3. **Pre-allocated Memory**: slab arena with stable node keys
//! 4. **Synchronous Execution**: no threads, no locks, no async
//!
//! ## Example
//!
//! ```
//! use std::io::Cursor;
//!
//! use clob_index::{Action, Book, Order, Packet};
//!
//! let packets = [
//!     Packet::new(Action::PlaceBuy, Order::new(99, 1000, 42)),
//!     Packet::new(Action::PlaceBuy, Order::new(105, 999, 41)),
//!     Packet::new(Action::PlaceBuy, Order::new(115, 99, 40)),
//! ];
//! let bytes: Vec<u8> = packets.iter().flat_map(|p| p.encode()).collect();
//!
//! let mut book = Book::new(Cursor::new(bytes));
//! while book.load()? {}
//!
//! let prices: Vec<i64> = book.buy_tree().iter().map(|o| o.price).collect();
//! assert_eq!(prices, vec![99, 105, 115]);
//! # Ok::<(), std::io::Error>(())
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: Order, Side, Packet
pub mod types;

/// Order book: buy-side 2-3 tree
pub mod orderbook;

/// Engine: packet ingestion loop
pub mod engine;

/// Book settings
pub mod config;

/// Error types
pub mod error;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use config::BookConfig;
pub use engine::{Book, Counts};
pub use error::{Error, Result};
pub use orderbook::{BuyNode, BuyTree, NodeKey};
pub use types::{Action, Order, Packet, Side, PACKET_SIZE};
