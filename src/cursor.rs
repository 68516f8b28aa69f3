//! Single-step iteration inside an equal-run.
//!
//! After a `find_first` (or `find_last`) has located a run, the remaining
//! matches are enumerated one neighbour at a time instead of repeating the
//! binary search. `has_next` / `has_prev` are the raw steps; `MatchCursor`
//! keeps the position and window for the caller, and `Matches` turns a run
//! into an iterator.

use crate::error::{Result, SearchError};
use crate::search::engine::{find_first, find_last, Window};
use crate::search::field::Field;

/// Outcome of a single cursor step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Whether the element at `pos` equals the key.
    pub matched: bool,
    /// Position after the step. Unchanged when the window boundary was hit.
    pub pos: u64,
}

/// Step forward from `pos`, bounded by `last`.
///
/// If `pos >= last` nothing is read and `pos` is returned unchanged with
/// `matched == false`. Otherwise moves to `pos + 1` and compares.
pub fn has_next<F: Field>(region: &[u8], field: &F, pos: u64, last: u64, key: F::Value) -> Result<Step> {
    if pos >= last {
        return Ok(Step { matched: false, pos });
    }
    let pos = pos + 1;
    let matched = field.value_at(region, pos)? == key;
    Ok(Step { matched, pos })
}

/// Step backward from `pos`, bounded by `first`.
pub fn has_prev<F: Field>(region: &[u8], field: &F, first: u64, pos: u64, key: F::Value) -> Result<Step> {
    if pos <= first {
        return Ok(Step { matched: false, pos });
    }
    let pos = pos - 1;
    let matched = field.value_at(region, pos)? == key;
    Ok(Step { matched, pos })
}

// ── Match Cursor ───────────────────────────────────────────────────

/// Position inside a run of `key`, movable one match at a time.
///
/// The cursor only moves onto matching elements; a failed step leaves the
/// position where it was.
#[derive(Debug, Clone)]
pub struct MatchCursor<'a, F: Field> {
    region: &'a [u8],
    field: F,
    window: Window,
    key: F::Value,
    pos: u64,
}

impl<'a, F: Field> MatchCursor<'a, F> {
    /// Cursor at an arbitrary position inside `window`.
    pub fn new(region: &'a [u8], field: F, window: Window, key: F::Value, pos: u64) -> Result<Self> {
        if !window.contains(pos) {
            return Err(SearchError::InvalidArgument(format!(
                "cursor position {} outside window [{}, {}]",
                pos,
                window.first(),
                window.last()
            )));
        }
        Ok(Self {
            region,
            field,
            window,
            key,
            pos,
        })
    }

    /// Cursor on the first match of `key`, or None if there is none.
    pub fn at_first(region: &'a [u8], field: F, window: Window, key: F::Value) -> Result<Option<Self>> {
        let lookup = find_first(region, &field, window, key)?;
        Ok(lookup.run.map(|run| Self {
            region,
            field,
            window,
            key,
            pos: run.first,
        }))
    }

    /// Cursor on the last match of `key`, or None if there is none.
    pub fn at_last(region: &'a [u8], field: F, window: Window, key: F::Value) -> Result<Option<Self>> {
        let lookup = find_last(region, &field, window, key)?;
        Ok(lookup.run.map(|run| Self {
            region,
            field,
            window,
            key,
            pos: run.last,
        }))
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn key(&self) -> F::Value {
        self.key
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Move to the next element if it matches. Returns the new position.
    pub fn next_match(&mut self) -> Result<Option<u64>> {
        let step = has_next(self.region, &self.field, self.pos, self.window.last(), self.key)?;
        Ok(self.accept(step))
    }

    /// Move to the previous element if it matches. Returns the new position.
    pub fn prev_match(&mut self) -> Result<Option<u64>> {
        let step = has_prev(self.region, &self.field, self.window.first(), self.pos, self.key)?;
        Ok(self.accept(step))
    }

    fn accept(&mut self, step: Step) -> Option<u64> {
        if !step.matched {
            return None;
        }
        self.pos = step.pos;
        Some(step.pos)
    }

    /// Iterate from the current position forward through the run.
    pub fn into_matches(self) -> Matches<'a, F> {
        Matches {
            cursor: Some(self),
            pending: true,
        }
    }
}

/// Ascending iterator over every index of a run.
///
/// Yields the starting position first. Stops after the first error.
#[derive(Debug)]
pub struct Matches<'a, F: Field> {
    cursor: Option<MatchCursor<'a, F>>,
    pending: bool,
}

impl<'a, F: Field> Iterator for Matches<'a, F> {
    type Item = Result<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        if self.pending {
            self.pending = false;
            return Some(Ok(cursor.position()));
        }
        match cursor.next_match() {
            Ok(Some(pos)) => Some(Ok(pos)),
            Ok(None) => {
                self.cursor = None;
                None
            }
            Err(e) => {
                self.cursor = None;
                Some(Err(e))
            }
        }
    }
}

/// Every index in `window` holding `key`, ascending.
///
/// One binary search locates the run; the rest is walked with `has_next`.
pub fn matches<'a, F: Field>(region: &'a [u8], field: F, window: Window, key: F::Value) -> Result<Matches<'a, F>> {
    Ok(match MatchCursor::at_first(region, field, window, key)? {
        Some(cursor) => cursor.into_matches(),
        None => Matches {
            cursor: None,
            pending: false,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::field::{ColumnField, RowField, SubField};
    use byteorder::{BigEndian, LittleEndian};

    /// 40 rows of 20-byte big-endian records; the u32 key at offset 4 takes
    /// each value in 13..=17 eight times.
    fn records() -> Vec<u8> {
        let mut region = Vec::new();
        for i in 0..40u32 {
            region.extend_from_slice(&i.to_be_bytes());
            region.extend_from_slice(&(13 + i / 8).to_be_bytes());
            region.extend_from_slice(&[0u8; 12]);
        }
        region
    }

    #[test]
    fn test_has_next_walks_run() {
        let region = records();
        let field = RowField::<u32, BigEndian>::new(20, 4).unwrap();
        let window = Window::new(0, 39).unwrap();
        let lookup = find_first(&region, &field, window, 15).unwrap();
        assert_eq!(lookup.pos, 16);

        let mut pos = lookup.pos;
        let mut calls = 0;
        loop {
            calls += 1;
            let step = has_next(&region, &field, pos, window.last(), 15).unwrap();
            pos = step.pos;
            if !step.matched {
                break;
            }
        }
        // Seven successes plus the failing step onto the next run.
        assert_eq!(calls, 8);
        assert_eq!(pos, 24);
    }

    #[test]
    fn test_has_prev_walks_run() {
        let region = records();
        let field = RowField::<u32, BigEndian>::new(20, 4).unwrap();
        let window = Window::new(0, 39).unwrap();
        let lookup = find_last(&region, &field, window, 14).unwrap();
        assert_eq!(lookup.pos, 15);

        let mut pos = lookup.pos;
        let mut matched = 0;
        loop {
            let step = has_prev(&region, &field, window.first(), pos, 14).unwrap();
            pos = step.pos;
            if !step.matched {
                break;
            }
            matched += 1;
        }
        assert_eq!(matched, 7);
        assert_eq!(pos, 7);
    }

    #[test]
    fn test_window_boundaries() {
        let region = [7u8, 7, 7];
        let field = ColumnField::<u8>::new(0);

        let step = has_next(&region, &field, 2, 2, 7).unwrap();
        assert_eq!(step, Step { matched: false, pos: 2 });
        let step = has_prev(&region, &field, 0, 0, 7).unwrap();
        assert_eq!(step, Step { matched: false, pos: 0 });

        // Boundary reached before the run ends.
        let step = has_next(&region, &field, 1, 1, 7).unwrap();
        assert!(!step.matched);
    }

    #[test]
    fn test_step_out_of_bounds() {
        let region = [1u8, 1];
        let field = ColumnField::<u8>::new(0);
        let err = has_next(&region, &field, 1, 5, 1).unwrap_err();
        assert!(matches!(err, SearchError::OutOfBounds { .. }));
    }

    #[test]
    fn test_match_cursor() {
        let region: Vec<u8> = [1u16, 3, 3, 3, 8]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let field = ColumnField::<u16, LittleEndian>::new(0);
        let window = Window::new(0, 4).unwrap();

        let mut cursor = MatchCursor::at_first(&region, field, window, 3).unwrap().unwrap();
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.prev_match().unwrap(), None);
        assert_eq!(cursor.next_match().unwrap(), Some(2));
        assert_eq!(cursor.next_match().unwrap(), Some(3));
        assert_eq!(cursor.next_match().unwrap(), None);
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.prev_match().unwrap(), Some(2));

        let cursor = MatchCursor::at_last(&region, field, window, 3).unwrap().unwrap();
        assert_eq!(cursor.position(), 3);

        assert!(MatchCursor::at_first(&region, field, window, 4).unwrap().is_none());
        assert!(MatchCursor::new(&region, field, Window::new(1, 2).unwrap(), 3, 0).is_err());
    }

    #[test]
    fn test_matches_iterator() {
        let region = records();
        let field = RowField::<u32, BigEndian>::new(20, 4).unwrap();
        let window = Window::new(0, 39).unwrap();

        let found: Vec<u64> = matches(&region, field, window, 17)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(found, (32..40).collect::<Vec<_>>());

        let clipped = Window::new(10, 12).unwrap();
        let found: Vec<u64> = matches(&region, field, clipped, 14)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(found, vec![10, 11, 12]);

        assert_eq!(matches(&region, field, window, 99).unwrap().count(), 0);
    }

    #[test]
    fn test_sub_field_cursor() {
        // Bits 8..=15 sorted, low byte varies.
        let region: Vec<u8> = [0x0105u16, 0x0201, 0x02FF, 0x0200, 0x0300]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let field = SubField::new(ColumnField::<u16, LittleEndian>::new(0), 8, 15).unwrap();
        let window = Window::new(0, 4).unwrap();
        let found: Vec<u64> = matches(&region, field, window, 0x02)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(found, vec![1, 2, 3]);
    }
}
