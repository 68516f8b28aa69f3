//! Constrained binary search for the first and last occurrence of a key.
//!
//! Both searches are restricted to an inclusive index window and return
//! `last + 1` when no element in the window equals the key. Found results
//! carry the full equal-run inside the window, so a single call tells the
//! caller how many rows match.

use crate::error::{Result, SearchError};
use crate::search::field::Field;

// ── Window ─────────────────────────────────────────────────────────

/// Inclusive index range `[first, last]` a search is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    first: u64,
    last: u64,
}

impl Window {
    /// Fails with `InvalidArgument` if `first > last` or `last + 1` overflows.
    pub fn new(first: u64, last: u64) -> Result<Self> {
        if first > last {
            return Err(SearchError::InvalidArgument(format!(
                "window first {} is greater than last {}",
                first, last
            )));
        }
        if last == u64::MAX {
            return Err(SearchError::InvalidArgument(
                "window last must leave room for the not-found sentinel".into(),
            ));
        }
        Ok(Self { first, last })
    }

    /// Window covering `[0, count - 1]`.
    pub fn all(count: u64) -> Result<Self> {
        if count == 0 {
            return Err(SearchError::InvalidArgument(
                "cannot search an empty column".into(),
            ));
        }
        Self::new(0, count - 1)
    }

    #[inline]
    pub fn first(&self) -> u64 {
        self.first
    }

    #[inline]
    pub fn last(&self) -> u64 {
        self.last
    }

    /// The not-found sentinel for this window.
    #[inline]
    pub fn sentinel(&self) -> u64 {
        self.last + 1
    }

    #[inline]
    pub fn contains(&self, pos: u64) -> bool {
        self.first <= pos && pos <= self.last
    }
}

// ── Lookup ─────────────────────────────────────────────────────────

/// Contiguous index range holding the searched key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub first: u64,
    pub last: u64,
}

impl Run {
    /// Number of matching elements.
    pub fn count(&self) -> u64 {
        self.last - self.first + 1
    }
}

/// Result of a first/last occurrence search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    /// Matching index, or the window's `last + 1` when not found.
    pub pos: u64,
    /// The equal-run inside the window, when found.
    pub run: Option<Run>,
}

impl Lookup {
    fn not_found(window: Window) -> Self {
        Self {
            pos: window.sentinel(),
            run: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.run.is_some()
    }
}

// ── Search ─────────────────────────────────────────────────────────

/// Leftmost index in `window` whose value equals `key`.
fn lower_bound<F: Field>(region: &[u8], field: &F, window: Window, key: F::Value) -> Result<Option<u64>> {
    let (mut lo, mut hi) = (window.first, window.last);
    let mut found = None;
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        let value = field.value_at(region, mid)?;
        if value < key {
            lo = mid + 1;
            continue;
        }
        if value == key {
            found = Some(mid);
        }
        if mid == lo {
            break;
        }
        hi = mid - 1;
    }
    Ok(found)
}

/// Rightmost index in `window` whose value equals `key`.
fn upper_bound<F: Field>(region: &[u8], field: &F, window: Window, key: F::Value) -> Result<Option<u64>> {
    let (mut lo, mut hi) = (window.first, window.last);
    let mut found = None;
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        let value = field.value_at(region, mid)?;
        if value <= key {
            if value == key {
                found = Some(mid);
            }
            lo = mid + 1;
            continue;
        }
        if mid == lo {
            break;
        }
        hi = mid - 1;
    }
    Ok(found)
}

/// Search for the first occurrence of `key` in `window`.
///
/// Returns the leftmost matching index together with its equal-run, or
/// `window.last() + 1` with no run when nothing matches. Values in the
/// window must be sorted ascending.
pub fn find_first<F: Field>(region: &[u8], field: &F, window: Window, key: F::Value) -> Result<Lookup> {
    let Some(first) = lower_bound(region, field, window, key)? else {
        return Ok(Lookup::not_found(window));
    };
    let tail = Window::new(first, window.last)?;
    let last = upper_bound(region, field, tail, key)?.unwrap_or(first);
    Ok(Lookup {
        pos: first,
        run: Some(Run { first, last }),
    })
}

/// Search for the last occurrence of `key` in `window`.
///
/// Returns the rightmost matching index together with its equal-run, or
/// `window.last() + 1` with no run when nothing matches.
pub fn find_last<F: Field>(region: &[u8], field: &F, window: Window, key: F::Value) -> Result<Lookup> {
    let Some(last) = upper_bound(region, field, window, key)? else {
        return Ok(Lookup::not_found(window));
    };
    let head = Window::new(window.first, last)?;
    let first = lower_bound(region, field, head, key)?.unwrap_or(last);
    Ok(Lookup {
        pos: last,
        run: Some(Run { first, last }),
    })
}
