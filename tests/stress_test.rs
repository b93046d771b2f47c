//! Stress tests for the buy-side index.
//!
//! These tests verify:
//! 1. Large placement runs keep every tree invariant
//! 2. Random packet streams (every bit pattern is legal) load cleanly
//! 3. Determinism is preserved across runs and read sizes
//!
//! ## Running Stress Tests
//!
//! ```bash
//! # Run all stress tests (release mode recommended)
//! cargo test --release --test stress_test -- --nocapture
//! ```

use std::io::Cursor;
use std::time::Instant;

use clob_index::{Action, Book, BookConfig, BuyTree, Order, Packet, PACKET_SIZE};

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

/// Number of placements for the large tree test
const STRESS_ORDER_COUNT: usize = 1_000_000;

/// Number of packets in the random byte stream
const RANDOM_PACKET_COUNT: usize = 256 * 1024;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Buy placements with a logarithmic price distribution, as seen in
/// production books.
///
/// Uses a seeded RNG for reproducibility. Same seed = same packets.
fn generate_buy_packets(count: usize, seed: u64) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut bytes = Vec::with_capacity(count * PACKET_SIZE);

    for i in 0..count {
        let price = (99.0 * (4.0 * rng.gen::<f64>()).ln()) as i64;
        let order = Order::new(price, rng.gen(), i as u64);
        bytes.extend_from_slice(&Packet::new(Action::PlaceBuy, order).encode());
    }

    bytes
}

/// Load a whole stream and return the final counters and state root.
fn load_all(bytes: Vec<u8>, read_size: usize) -> (u64, [u8; 32]) {
    let config = BookConfig::default().with_read_size(read_size);
    let mut book = Book::with_config(Cursor::new(bytes), config).expect("valid config");
    while book.load().expect("in-memory stream") {}
    (book.counts().buy_place, book.buy_tree().state_root())
}

// ============================================================================
// STRESS TESTS
// ============================================================================

/// Place one million orders straight into the tree.
#[test]
fn stress_1m_placements() {
    println!("\n=== STRESS TEST: 1 Million Placements ===\n");

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut tree = BuyTree::with_capacity(STRESS_ORDER_COUNT);

    let start = Instant::now();
    for i in 0..STRESS_ORDER_COUNT {
        let price = rng.gen_range(0..10_000);
        tree.place(Order::new(price, 1, i as u64));
    }
    let elapsed = start.elapsed();

    println!("  Orders placed:     {:>12}", tree.len());
    println!("  Nodes:             {:>12}", tree.node_count());
    println!("  Height:            {:>12}", tree.height());
    println!("  Time:              {:>12.2?}", elapsed);
    println!(
        "  Avg latency:       {:>9.0} ns",
        elapsed.as_nanos() as f64 / STRESS_ORDER_COUNT as f64
    );

    tree.assert_invariants();
    assert_eq!(tree.len(), STRESS_ORDER_COUNT);

    // FIFO within each price, by identifier (= arrival)
    let mut last: Option<&Order> = None;
    for order in tree.iter() {
        if let Some(prev) = last {
            assert!(
                prev.price < order.price || (prev.price == order.price && prev.ident < order.ident),
                "{prev} before {order}"
            );
        }
        last = Some(order);
    }
}

/// Random packets are the worst case in terms of performance. Note that
/// there are no illegal values in the packet format.
#[test]
fn stress_random_packets() {
    let mut data = vec![0u8; RANDOM_PACKET_COUNT * PACKET_SIZE];
    ChaCha8Rng::seed_from_u64(123).fill_bytes(&mut data);

    let expected_buys = data
        .chunks_exact(PACKET_SIZE)
        .filter(|record| Packet::decode(record).action() == Action::PlaceBuy)
        .count() as u64;

    let mut book = Book::new(Cursor::new(data));
    let start = Instant::now();
    while book.load().expect("in-memory stream") {}
    let took = start.elapsed();

    let counts = book.counts();
    println!(
        "{} random buy placements in {} packets took {:.0} ns on average",
        counts.buy_place,
        RANDOM_PACKET_COUNT,
        took.as_nanos() as f64 / counts.buy_place.max(1) as f64
    );

    assert_eq!(counts.buy_place, expected_buys);
    assert_eq!(counts.buy_cancel, 0);
    assert_eq!(counts.sell_place, 0);
    assert_eq!(counts.sell_cancel, 0);
    assert_eq!(book.buy_tree().len() as u64, expected_buys);
    // roughly one in four packets is a buy placement
    assert!(expected_buys > RANDOM_PACKET_COUNT as u64 / 5);
    assert!(expected_buys < RANDOM_PACKET_COUNT as u64 / 3);
    book.buy_tree().assert_invariants();
}

/// Same packets through different read sizes give the same book.
#[test]
fn stress_read_size_independence() {
    let bytes = generate_buy_packets(50_000, 7);

    let reference = load_all(bytes.clone(), bytes.len());
    for read_size in [1, 7, PACKET_SIZE, 1000, 4096] {
        assert_eq!(load_all(bytes.clone(), read_size), reference, "read size {read_size}");
    }
    assert_eq!(reference.0, 50_000);
}

/// Same seed = same state root; different seed = different root.
#[test]
fn stress_determinism() {
    let root1 = load_all(generate_buy_packets(100_000, 42), 4096).1;
    let root2 = load_all(generate_buy_packets(100_000, 42), 4096).1;
    let root3 = load_all(generate_buy_packets(100_000, 43), 4096).1;

    println!("  Run 1 state root: {}", hex::encode(root1));
    println!("  Run 2 state root: {}", hex::encode(root2));
    println!("  Different seed:   {}", hex::encode(root3));

    assert_eq!(root1, root2, "same packets must give the same tree");
    assert_ne!(root1, root3);
}
