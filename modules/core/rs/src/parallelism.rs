use std::cmp::Ordering;
use std::thread::available_parallelism;

use eyre::Result;

/// Positive requests are capped by the number of cores, zero means a single thread and
/// negative values count back from all cores (-1 = every core), keeping at least one.
fn normalize(requested: isize, cores: isize) -> usize {
    match requested.cmp(&0) {
        Ordering::Greater => requested.min(cores) as usize,
        Ordering::Equal => 1,
        Ordering::Less => (cores + requested + 1).max(1) as usize,
    }
}

/// Number of worker threads to use for the requested parallelism on this machine.
pub fn threads(requested: isize) -> Result<usize> {
    let cores = available_parallelism()?.get() as isize;
    Ok(normalize(requested, cores))
}
