//! Order types for the buy-side index.
//!
//! ## Inline Storage
//!
//! An `Order` is three 64-bit words and is `Copy`. Tree nodes embed their
//! orders by value, so there is no per-order heap object anywhere in the book.
//!
//! ## Priority
//!
//! Orders sort ascending on `price`. Equal prices keep their insertion order;
//! the order identifier takes no part in the comparison.

use std::fmt;

// ============================================================================
// Side enum
// ============================================================================

/// Order side: Buy or Sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    /// Buy order (bid)
    #[default]
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Returns the opposite side
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

// ============================================================================
// Order struct
// ============================================================================

/// A resting limit order.
///
/// ## Fields
///
/// - `price`: signed limit, the ascending sort key
/// - `quantity`: opaque volume, carried along untouched
/// - `ident`: opaque, caller-unique order reference
///
/// ## Example
///
/// ```
/// use clob_index::types::Order;
///
/// let order = Order::new(99, 1000, 42);
/// assert_eq!(order.price, 99);
/// assert_eq!(order.to_string(), "[ 99 1000 42 ]");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Order {
    /// Limit price
    pub price: i64,

    /// Order volume
    pub quantity: u64,

    /// Order reference, unique per book (not checked)
    pub ident: u64,
}

impl Order {
    /// Create a new order
    #[inline]
    pub const fn new(price: i64, quantity: u64, ident: u64) -> Self {
        Self {
            price,
            quantity,
            ident,
        }
    }

    /// Fixed little-endian encoding, as hashed into state roots.
    pub fn to_le_bytes(&self) -> [u8; 24] {
        let mut bytes = [0u8; 24];
        bytes[0..8].copy_from_slice(&self.price.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.quantity.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.ident.to_le_bytes());
        bytes
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {} {} {} ]", self.price, self.quantity, self.ident)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
