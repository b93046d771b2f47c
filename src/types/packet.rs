//! Binary order packet codec.
//!
//! ## Layout
//!
//! Every packet is 32 bytes: four consecutive 64-bit words in native byte
//! order.
//!
//! | Offset | Word     | Meaning                                          |
//! |--------|----------|--------------------------------------------------|
//! | 0      | header   | bit 61 buy(1)/sell(0), bit 60 place(1)/cancel(0) |
//! | 8      | ident    | order reference                                  |
//! | 16     | quantity | order volume                                     |
//! | 24     | price    | signed limit                                     |
//!
//! The remaining header bits are reserved and ignored. There are no illegal
//! values: every bit pattern decodes into one of the four [`Action`]s.

use crate::types::{Order, Side};

/// The number of bytes in an order packet.
pub const PACKET_SIZE: usize = 32;

/// Header bit for buy (set) versus sell (clear).
pub const BUY_NOT_SELL_FLAG: u64 = 1 << 61;

/// Header bit for placement (set) versus cancelation (clear).
pub const PLACE_NOT_CANCEL_FLAG: u64 = 1 << 60;

/// What a packet asks the book to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    PlaceBuy,
    PlaceSell,
    CancelBuy,
    CancelSell,
}

impl Action {
    /// The side the action applies to
    pub fn side(self) -> Side {
        match self {
            Action::PlaceBuy | Action::CancelBuy => Side::Buy,
            Action::PlaceSell | Action::CancelSell => Side::Sell,
        }
    }

    /// Whether the action places (rather than cancels) an order
    pub fn is_place(self) -> bool {
        matches!(self, Action::PlaceBuy | Action::PlaceSell)
    }

    /// Header word with exactly the flags of this action set
    pub fn header(self) -> u64 {
        match self {
            Action::PlaceBuy => BUY_NOT_SELL_FLAG | PLACE_NOT_CANCEL_FLAG,
            Action::PlaceSell => PLACE_NOT_CANCEL_FLAG,
            Action::CancelBuy => BUY_NOT_SELL_FLAG,
            Action::CancelSell => 0,
        }
    }
}

/// A decoded order packet.
///
/// ## Example
///
/// ```
/// use clob_index::types::{Action, Order, Packet};
///
/// let packet = Packet::new(Action::PlaceBuy, Order::new(99, 1000, 42));
/// let bytes = packet.encode();
///
/// let decoded = Packet::decode(&bytes);
/// assert_eq!(decoded.action(), Action::PlaceBuy);
/// assert_eq!(decoded.order(), Order::new(99, 1000, 42));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Packet {
    /// Flag word, see [`BUY_NOT_SELL_FLAG`] and [`PLACE_NOT_CANCEL_FLAG`]
    pub header: u64,
    pub ident: u64,
    pub quantity: u64,
    pub price: i64,
}

impl Packet {
    /// Create a packet with a clean header for `action`
    pub fn new(action: Action, order: Order) -> Self {
        Self {
            header: action.header(),
            ident: order.ident,
            quantity: order.quantity,
            price: order.price,
        }
    }

    /// Reinterpret one packet worth of bytes as its four words.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`PACKET_SIZE`]. Bytes beyond the
    /// first packet are ignored.
    #[inline]
    pub fn decode(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= PACKET_SIZE, "short packet: {} bytes", bytes.len());
        Self {
            header: word(bytes, 0),
            ident: word(bytes, 8),
            quantity: word(bytes, 16),
            price: word(bytes, 24) as i64,
        }
    }

    /// The native byte order representation, inverse of [`Packet::decode`]
    pub fn encode(&self) -> [u8; PACKET_SIZE] {
        let mut bytes = [0u8; PACKET_SIZE];
        bytes[0..8].copy_from_slice(&self.header.to_ne_bytes());
        bytes[8..16].copy_from_slice(&self.ident.to_ne_bytes());
        bytes[16..24].copy_from_slice(&self.quantity.to_ne_bytes());
        bytes[24..32].copy_from_slice(&self.price.to_ne_bytes());
        bytes
    }

    /// Route by the two header flags; reserved bits play no part.
    #[inline]
    pub fn action(&self) -> Action {
        let buy_not_sell = self.header & BUY_NOT_SELL_FLAG != 0;
        let place_not_cancel = self.header & PLACE_NOT_CANCEL_FLAG != 0;
        match (place_not_cancel, buy_not_sell) {
            (true, true) => Action::PlaceBuy,
            (true, false) => Action::PlaceSell,
            (false, true) => Action::CancelBuy,
            (false, false) => Action::CancelSell,
        }
    }

    /// The order carried by the packet
    #[inline]
    pub fn order(&self) -> Order {
        Order::new(self.price, self.quantity, self.ident)
    }
}

#[inline(always)]
fn word(bytes: &[u8], at: usize) -> u64 {
    let mut w = [0u8; 8];
    w.copy_from_slice(&bytes[at..at + 8]);
    u64::from_ne_bytes(w)
}

// ============================================================================
// Unit Tests
// ============================================================================
