//! Many independent key lookups against one region.
//!
//! Each key is searched on its own; results come back in key order. Small
//! batches run inline, larger ones are spread over the rayon global pool.
//! The region is only read, so workers share it without locking.

use rayon::prelude::*;

use crate::error::Result;
use crate::search::engine::{find_first, find_last, Lookup, Window};
use crate::search::field::Field;

/// Below this many keys the batch runs on the calling thread.
const PARALLEL_THRESHOLD: usize = 64;

fn run_all<K, S>(keys: &[K], search: S) -> Result<Vec<Lookup>>
where
    K: Copy + Send + Sync,
    S: Fn(K) -> Result<Lookup> + Sync + Send,
{
    if keys.len() < PARALLEL_THRESHOLD {
        return keys.iter().map(|&key| search(key)).collect();
    }
    keys.par_iter().map(|&key| search(key)).collect()
}

/// `find_first` for every key, in key order. Stops at the first error.
pub fn find_first_all<F>(region: &[u8], field: &F, window: Window, keys: &[F::Value]) -> Result<Vec<Lookup>>
where
    F: Field + Sync,
{
    run_all(keys, |key| find_first(region, field, window, key))
}

/// `find_last` for every key, in key order. Stops at the first error.
pub fn find_last_all<F>(region: &[u8], field: &F, window: Window, keys: &[F::Value]) -> Result<Vec<Lookup>>
where
    F: Field + Sync,
{
    run_all(keys, |key| find_last(region, field, window, key))
}
