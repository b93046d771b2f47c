//! Packet ingestion loop.
//!
//! ## Buffering
//!
//! `Book` owns one buffer of `PACKET_SIZE - 1 + read_size` bytes. Every
//! `load()` reads after the bytes still pending from the previous call, applies
//! all whole packets, and moves the remainder (always less than one packet) to
//! the front. Read boundaries therefore never change what gets decoded.
//!
//! ```text
//! [ pending | new bytes from read ............ ]
//! [ packet | packet | packet | rest ]  ->  [ rest | ... ]
//! ```

use std::io::{self, Read};

use tracing::{debug, trace};

use crate::config::BookConfig;
use crate::error::Result;
use crate::orderbook::BuyTree;
use crate::types::{Action, Order, Packet, PACKET_SIZE};

/// Cumulative number of packets applied, per action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Counts {
    /// Buy placements applied to the tree
    pub buy_place: u64,

    /// Buy cancelations applied
    pub buy_cancel: u64,

    /// Sell placements applied
    pub sell_place: u64,

    /// Sell cancelations applied
    pub sell_cancel: u64,
}

impl Counts {
    /// All packets applied
    pub fn total(&self) -> u64 {
        self.buy_place + self.buy_cancel + self.sell_place + self.sell_cancel
    }
}

/// Book keeps an overview of limit orders, fed from one packet stream.
///
/// ## Example
///
/// ```
/// use std::io::Cursor;
///
/// use clob_index::engine::Book;
/// use clob_index::types::{Action, Order, Packet};
///
/// let mut bytes = Vec::new();
/// bytes.extend_from_slice(&Packet::new(Action::PlaceBuy, Order::new(99, 1000, 42)).encode());
/// bytes.extend_from_slice(&Packet::new(Action::PlaceSell, Order::new(98, 5, 43)).encode());
///
/// let mut book = Book::new(Cursor::new(bytes));
/// while book.load()? {}
///
/// assert_eq!(book.counts().buy_place, 1);
/// assert_eq!(book.buy_tree().len(), 1);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct Book<R> {
    /// Packet stream
    input: R,

    /// Read buffer; `buf[..pending]` holds an incomplete packet
    buf: Vec<u8>,

    /// Pending byte count
    pending: usize,

    /// Bytes requested per read
    read_size: usize,

    buy_tree: BuyTree,

    counts: Counts,
}

impl<R: Read> Book<R> {
    /// Link the order book to a packet stream, with default settings.
    pub fn new(input: R) -> Self {
        Self::build(input, BookConfig::default())
    }

    /// Link the order book to a packet stream.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidReadSize`](crate::Error::InvalidReadSize) for a zero
    /// read size.
    pub fn with_config(input: R, config: BookConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(input, config))
    }

    fn build(input: R, config: BookConfig) -> Self {
        Self {
            input,
            buf: vec![0u8; config.buffer_len()],
            pending: 0,
            read_size: config.read_size,
            buy_tree: BuyTree::with_capacity(config.order_capacity),
            counts: Counts::default(),
        }
    }

    /// Consume orders from the packet stream.
    ///
    /// Performs a single read. A zero-byte read leaves the book untouched;
    /// whether that means end of stream is up to the caller.
    ///
    /// # Returns
    ///
    /// Whether new data was available at all
    ///
    /// # Errors
    ///
    /// The packet stream's read error, exclusively.
    pub fn load(&mut self) -> io::Result<bool> {
        debug_assert!(self.pending < PACKET_SIZE);

        let end = self.pending + self.read_size;
        let done = self.input.read(&mut self.buf[self.pending..end])?;
        if done == 0 {
            debug!(pending = self.pending, "packet stream has no more data");
            return Ok(false);
        }
        let filled = self.pending + done;
        let whole = filled - filled % PACKET_SIZE;

        // read packets
        let buf = std::mem::take(&mut self.buf);
        for record in buf[..whole].chunks_exact(PACKET_SIZE) {
            self.apply(Packet::decode(record));
        }
        self.buf = buf;

        // keep remainder
        self.pending = filled - whole;
        if self.pending != 0 && whole != 0 {
            self.buf.copy_within(whole..filled, 0);
        }

        Ok(true)
    }

    /// Dispatch one packet to its handler.
    #[inline]
    pub fn apply(&mut self, packet: Packet) {
        let order = packet.order();
        match packet.action() {
            Action::PlaceBuy => self.place_buy(order),
            Action::PlaceSell => self.place_sell(order),
            Action::CancelBuy => self.cancel_buy(order),
            Action::CancelSell => self.cancel_sell(order),
        }
    }

    fn place_buy(&mut self, order: Order) {
        self.counts.buy_place += 1;
        self.buy_tree.place(order);
    }

    // TODO: the sell side needs its own tree, sorted with the best (lowest)
    // price first.
    fn place_sell(&mut self, order: Order) {
        trace!(ident = order.ident, price = order.price, "sell placement ignored");
    }

    fn cancel_buy(&mut self, order: Order) {
        trace!(ident = order.ident, price = order.price, "buy cancelation ignored");
    }

    fn cancel_sell(&mut self, order: Order) {
        trace!(ident = order.ident, price = order.price, "sell cancelation ignored");
    }
}

impl<R> Book<R> {
    /// The buy-side tree
    #[inline]
    pub fn buy_tree(&self) -> &BuyTree {
        &self.buy_tree
    }

    /// Packets applied so far
    #[inline]
    pub fn counts(&self) -> Counts {
        self.counts
    }

    /// Bytes of an incomplete packet held over for the next `load()`
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Textual representation of the buy tree for debugging
    pub fn buy_tree_dump(&self) -> String {
        self.buy_tree.dump()
    }

    /// Unlink the packet stream
    pub fn into_inner(self) -> R {
        self.input
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::io::Cursor;

    fn stream(packets: &[Packet]) -> Vec<u8> {
        packets.iter().flat_map(|p| p.encode()).collect()
    }

    fn place_buy(price: i64, quantity: u64, ident: u64) -> Packet {
        Packet::new(Action::PlaceBuy, Order::new(price, quantity, ident))
    }

    /// Hands out at most `chunk` bytes per read
    struct Chunked {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Read for Chunked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    /// Fails every read
    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "feed dropped"))
        }
    }

    #[test]
    fn test_load_places_buy_orders() {
        let bytes = stream(&[
            place_buy(99, 1000, 42),
            place_buy(105, 999, 41),
            place_buy(115, 99, 40),
        ]);
        let mut book = Book::new(Cursor::new(bytes));

        assert!(book.load().unwrap());
        assert!(!book.load().unwrap());

        assert_eq!(book.counts().buy_place, 3);
        let tree = book.buy_tree();
        let root = tree.root().unwrap();
        assert_eq!(tree.label(root).unwrap(), "@1/1:[ 105 999 41 ]");
        tree.assert_invariants();
    }

    #[test]
    fn test_unsupported_actions_are_inert() {
        let order = Order::new(10, 1, 1);
        let bytes = stream(&[
            Packet::new(Action::PlaceSell, order),
            Packet::new(Action::CancelBuy, order),
            Packet::new(Action::CancelSell, order),
            place_buy(20, 1, 2),
        ]);
        let mut book = Book::new(Cursor::new(bytes));
        while book.load().unwrap() {}

        assert_eq!(
            book.counts(),
            Counts {
                buy_place: 1,
                ..Counts::default()
            }
        );
        let orders: Vec<Order> = book.buy_tree().iter().copied().collect();
        assert_eq!(orders, vec![Order::new(20, 1, 2)]);
    }

    #[test]
    fn test_empty_stream() {
        let mut book = Book::new(Cursor::new(Vec::new()));

        assert!(!book.load().unwrap());
        assert!(book.buy_tree().is_empty());
        assert_eq!(book.counts().total(), 0);
        assert_eq!(book.buy_tree_dump(), "<empty>\n");
    }

    #[test]
    fn test_exhaustion_keeps_state() {
        let bytes = stream(&[place_buy(1, 1, 1), place_buy(2, 1, 2)]);
        let mut book = Book::new(Cursor::new(bytes));
        while book.load().unwrap() {}

        let counts = book.counts();
        let root = book.buy_tree().state_root();
        for _ in 0..3 {
            assert!(!book.load().unwrap());
        }
        assert_eq!(book.counts(), counts);
        assert_eq!(book.buy_tree().state_root(), root);
    }

    #[test]
    fn test_partial_packet_is_held_over() {
        let bytes = stream(&[place_buy(1, 1, 1), place_buy(2, 1, 2)]);
        let reader = Chunked {
            data: bytes,
            pos: 0,
            chunk: PACKET_SIZE + 8,
        };
        let mut book = Book::new(reader);

        assert!(book.load().unwrap());
        assert_eq!(book.counts().buy_place, 1);
        assert_eq!(book.pending(), 8);

        assert!(book.load().unwrap());
        assert_eq!(book.counts().buy_place, 2);
        assert_eq!(book.pending(), 0);

        assert!(!book.load().unwrap());
    }

    #[test]
    fn test_trailing_partial_packet_never_applied() {
        let mut bytes = stream(&[place_buy(1, 1, 1)]);
        bytes.extend_from_slice(&place_buy(2, 1, 2).encode()[..PACKET_SIZE - 1]);
        let mut book = Book::new(Cursor::new(bytes));
        while book.load().unwrap() {}

        assert_eq!(book.counts().buy_place, 1);
        assert_eq!(book.pending(), PACKET_SIZE - 1);
    }

    #[test]
    fn test_chunk_sizes_agree() {
        let packets: Vec<Packet> = (0..200u64)
            .map(|i| {
                let action = match i % 5 {
                    0 => Action::PlaceSell,
                    1 => Action::CancelBuy,
                    _ => Action::PlaceBuy,
                };
                Packet::new(action, Order::new((i * 37 % 23) as i64, i, i))
            })
            .collect();
        let bytes = stream(&packets);

        let mut results = Vec::new();
        for chunk in [1, 7, PACKET_SIZE, bytes.len()] {
            let reader = Chunked {
                data: bytes.clone(),
                pos: 0,
                chunk,
            };
            let mut book = Book::new(reader);
            while book.load().unwrap() {}
            book.buy_tree().assert_invariants();
            results.push((book.counts(), book.buy_tree().state_root()));
        }

        assert_eq!(results[0].0.buy_place, 120);
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_read_size_below_packet_size() {
        let bytes = stream(&[place_buy(5, 1, 1), place_buy(3, 1, 2), place_buy(4, 1, 3)]);
        let config = BookConfig::default().with_read_size(5);
        let mut book = Book::with_config(Cursor::new(bytes), config).unwrap();

        let mut loads = 0;
        while book.load().unwrap() {
            loads += 1;
        }
        assert_eq!(loads, (3 * PACKET_SIZE + 4) / 5);

        let prices: Vec<i64> = book.buy_tree().iter().map(|o| o.price).collect();
        assert_eq!(prices, vec![3, 4, 5]);
    }

    #[test]
    fn test_zero_read_size_rejected() {
        let config = BookConfig::default().with_read_size(0);
        let err = Book::with_config(Cursor::new(Vec::new()), config).unwrap_err();
        assert!(matches!(err, Error::InvalidReadSize { size: 0 }));
    }

    #[test]
    fn test_io_error_propagates() {
        let mut book = Book::new(Broken);

        let err = book.load().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        assert_eq!(err.to_string(), "feed dropped");
        assert_eq!(book.counts().total(), 0);
    }

    #[test]
    fn test_apply_direct() {
        let mut book = Book::new(io::empty());
        book.apply(place_buy(7, 70, 700));
        book.apply(Packet::new(Action::CancelSell, Order::new(7, 70, 700)));

        assert_eq!(book.counts().buy_place, 1);
        assert_eq!(book.buy_tree().best_bid(), Some(&Order::new(7, 70, 700)));
    }

    #[test]
    fn test_into_inner_returns_stream() {
        let bytes = stream(&[place_buy(1, 1, 1)]);
        let mut book = Book::new(Cursor::new(bytes));
        while book.load().unwrap() {}

        let cursor = book.into_inner();
        assert_eq!(cursor.position(), PACKET_SIZE as u64);
    }
}
