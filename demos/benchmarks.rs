//
// Copyright (c) 2025 Nathan Fiedler
//
use blockvec::{SegmentedFixedDirectoryArray, SegmentedGrowableArray};
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

//
// Pushes a sequential run of values into both segmented arrays and a Vec,
// timing each push loop, then reads every index back from the segmented
// arrays to verify the stored values. The element count can be given as the
// first argument (default is 2^24 - 1). Set RUST_LOG=blockvec=trace to see
// the block allocations.
//

fn create_growable(size: usize) -> bool {
    let start = Instant::now();
    let mut coll: SegmentedGrowableArray<usize> = SegmentedGrowableArray::new();
    for value in 0..size {
        coll.push(value);
    }
    let duration = start.elapsed();
    info!(?duration, "{coll}");
    verify(size, |index| coll.at(index).ok().copied())
}

fn create_fixed(size: usize) -> bool {
    let mut coll: SegmentedFixedDirectoryArray<usize> =
        match SegmentedFixedDirectoryArray::for_elements(size) {
            Ok(coll) => coll,
            Err(err) => {
                error!("cannot create array: {err}");
                return false;
            }
        };
    let start = Instant::now();
    for value in 0..size {
        if let Err(err) = coll.push(value) {
            error!("push failed at {value}: {err}");
            return false;
        }
    }
    let duration = start.elapsed();
    info!(?duration, "{coll}");
    verify(size, |index| coll.at(index).ok().copied())
}

fn create_vector(size: usize) {
    let start = Instant::now();
    let mut coll: Vec<usize> = Vec::new();
    for value in 0..size {
        coll.push(value);
    }
    let duration = start.elapsed();
    info!(?duration, len = coll.len(), "Vec");
}

fn verify(size: usize, read: impl Fn(usize) -> Option<usize>) -> bool {
    for index in 0..size {
        let actual = read(index);
        if actual != Some(index) {
            error!(index, ?actual, "verification failed");
            return false;
        }
    }
    info!(size, "verification passed");
    true
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let size = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<usize>().ok())
        .unwrap_or((1 << 24) - 1);
    println!("creating SegmentedGrowableArray...");
    let growable_ok = create_growable(size);
    println!("creating SegmentedFixedDirectoryArray...");
    let fixed_ok = create_fixed(size);
    println!("creating Vec...");
    create_vector(size);
    if !(growable_ok && fixed_ok) {
        std::process::exit(1);
    }
}
