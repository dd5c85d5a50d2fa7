use std::collections::hash_map::RandomState;

use chain_hash::HashMap;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    /// Number of entries to insert.
    #[arg(short = 'n', long = "entries", default_value_t = 1000)]
    entries: usize,

    /// Preallocate room for all entries instead of growing from 16 buckets.
    #[arg(short = 'p', long = "preallocate", default_value_t = false)]
    preallocate: bool,

    /// Store one entry under the absent key as well.
    #[arg(long = "with_null_key", default_value_t = false)]
    with_null_key: bool,
}

fn main() {
    let args = Args::parse();

    let mut map: HashMap<u64, u64, RandomState> = if args.preallocate {
        HashMap::with_capacity(args.entries)
    } else {
        HashMap::new()
    };

    println!(
        "Starting with {} buckets, resizing past {} entries",
        map.bucket_count(),
        map.capacity()
    );

    let mut resizes = 0;
    for i in 0..args.entries as u64 {
        let buckets = map.bucket_count();
        map.insert(i, i * 2);
        if map.bucket_count() != buckets {
            resizes += 1;
            println!(
                "  entry {:>8}: {} -> {} buckets",
                i + 1,
                buckets,
                map.bucket_count()
            );
        }
    }

    if args.with_null_key {
        map.insert(None, u64::MAX);
    }

    println!("Inserted {} entries ({} resizes)", map.len(), resizes);
    println!(
        "Final load factor: {:.2}%",
        (map.len() as f64 / map.bucket_count() as f64) * 100.0
    );

    map.print_chain_histogram();
    map.debug_stats().print();
}
