//! CLOB Index - Binary Entry Point
//!
//! Loads a packet file (or standard input) into a book and reports the
//! counters and the state root of the buy tree.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::exit;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};

use clob_index::config::DEFAULT_READ_SIZE;
use clob_index::{Book, BookConfig, Result};

/// Command line configuration.
#[derive(Debug, Parser)]
#[command(name = "clob-index", version, about = "Load order packets into a buy-side book")]
struct CliConfig {
    /// Packet file; standard input when absent
    input: Option<PathBuf>,

    /// Bytes requested from the stream per load
    #[arg(long, env = "CLOB_READ_SIZE", default_value_t = DEFAULT_READ_SIZE)]
    read_size: usize,

    /// Buy orders to preallocate tree storage for
    #[arg(long, env = "CLOB_ORDER_CAPACITY", default_value_t = 0)]
    order_capacity: usize,

    /// Print the buy tree after loading
    #[arg(long)]
    dump: bool,
}

impl CliConfig {
    fn to_book_config(&self) -> BookConfig {
        BookConfig::default()
            .with_read_size(self.read_size)
            .with_order_capacity(self.order_capacity)
    }
}

fn main() {
    let cli = CliConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let result = match &cli.input {
        Some(path) => File::open(path)
            .map_err(Into::into)
            .and_then(|file| run(file, &cli)),
        None => run(io::stdin().lock(), &cli),
    };

    if let Err(e) = result {
        error!(%e, "loading packets failed");
        exit(1);
    }
}

fn run<R: Read>(input: R, cli: &CliConfig) -> Result<()> {
    let mut book = Book::with_config(input, cli.to_book_config())?;

    let start = Instant::now();
    let mut loads = 0u64;
    while book.load()? {
        loads += 1;
    }
    let took = start.elapsed();

    let counts = book.counts();
    let tree = book.buy_tree();
    info!(
        loads,
        packets = counts.total(),
        buy_place = counts.buy_place,
        buy_cancel = counts.buy_cancel,
        sell_place = counts.sell_place,
        sell_cancel = counts.sell_cancel,
        resting = tree.len(),
        height = tree.height(),
        pending = book.pending(),
        ?took,
        "packet stream drained"
    );

    let mut out = BufWriter::new(io::stdout().lock());
    writeln!(out, "buy places:    {:>12}", counts.buy_place)?;
    writeln!(out, "buy cancels:   {:>12}", counts.buy_cancel)?;
    writeln!(out, "sell places:   {:>12}", counts.sell_place)?;
    writeln!(out, "sell cancels:  {:>12}", counts.sell_cancel)?;
    writeln!(out, "state root:    {}", hex::encode(tree.state_root()))?;
    if cli.dump {
        write!(out, "{}", book.buy_tree_dump())?;
    }
    out.flush()?;

    Ok(())
}
