//! Packet ingestion engine.
//!
//! ## Design Principles
//!
//! 1. **Synchronous Execution**: one thread, one stream, no locks
//! 2. **Chunk Independence**: results never depend on read boundaries
//! 3. **Total Decoding**: every bit pattern is a legal packet
//!
//! ## Dispatch
//!
//! | Header flags | Handler |
//! |--------------|---------|
//! | place + buy | insert into the buy tree |
//! | place + sell | ignored |
//! | cancel + buy | ignored |
//! | cancel + sell | ignored |
//!
//! Only buy placements are counted; the other counters stay at zero until
//! their handlers exist.

pub mod book;

pub use book::{Book, Counts};
