//! Core data types for the order index
//!
//! ## Types
//!
//! - [`Order`]: price, quantity and identifier of a resting limit order
//! - [`Side`]: Buy or Sell
//! - [`Packet`]: one decoded 32-byte order packet
//! - [`Action`]: the four packet kinds (place/cancel × buy/sell)

mod order;
pub mod packet;

// Re-export all types at module level
pub use order::{Order, Side};
pub use packet::{Action, Packet, BUY_NOT_SELL_FLAG, PACKET_SIZE, PLACE_NOT_CANCEL_FLAG};
