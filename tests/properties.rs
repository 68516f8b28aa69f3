//! Property tests for search, cursor and sub-field semantics over random
//! sorted arrays and windows.

use binsearch::{find_first, find_last, has_next, has_prev, ColumnField, RowField, SubField, Window};
use byteorder::{BigEndian, LittleEndian};
use proptest::prelude::*;

/// Sorted u16 values (few distinct, so runs are common) plus a window.
fn sorted_with_window() -> impl Strategy<Value = (Vec<u16>, u64, u64)> {
    prop::collection::vec(0u16..64, 1..200).prop_flat_map(|mut values| {
        values.sort_unstable();
        let n = values.len() as u64;
        (Just(values), 0..n).prop_flat_map(move |(values, first)| (Just(values), Just(first), first..n))
    })
}

fn le_bytes(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

proptest! {
    #[test]
    fn prop_first_last_correct((values, first, last) in sorted_with_window(), key in 0u16..70) {
        let region = le_bytes(&values);
        let field = ColumnField::<u16, LittleEndian>::new(0);
        let window = Window::new(first, last).unwrap();

        let f = find_first(&region, &field, window, key).unwrap();
        let l = find_last(&region, &field, window, key).unwrap();

        let slice = &values[first as usize..=last as usize];
        match slice.iter().position(|&v| v == key) {
            Some(i) => {
                let j = slice.iter().rposition(|&v| v == key).unwrap();
                prop_assert_eq!(f.pos, first + i as u64);
                prop_assert_eq!(l.pos, first + j as u64);
                prop_assert_eq!(f.run, l.run);
                let run = f.run.unwrap();
                prop_assert_eq!((run.first, run.last), (f.pos, l.pos));
            }
            None => {
                prop_assert_eq!(f.pos, last + 1);
                prop_assert_eq!(l.pos, last + 1);
                prop_assert!(f.run.is_none());
            }
        }
        prop_assert!(f.pos >= first && f.pos <= last + 1);

        // Pure: a second call gives the same answer.
        prop_assert_eq!(find_first(&region, &field, window, key).unwrap(), f);
    }
}

proptest! {
    // Most random keys miss the window and are rejected by `prop_assume!`,
    // so allow more global rejects than proptest's default of 1024.
    #![proptest_config(ProptestConfig { max_global_rejects: 16384, ..ProptestConfig::default() })]

    #[test]
    fn prop_cursor_agrees_with_search((values, first, last) in sorted_with_window(), key in 0u16..64) {
        let region = le_bytes(&values);
        let field = ColumnField::<u16, LittleEndian>::new(0);
        let window = Window::new(first, last).unwrap();

        let f = find_first(&region, &field, window, key).unwrap();
        let l = find_last(&region, &field, window, key).unwrap();
        prop_assume!(f.is_found());

        let mut pos = f.pos;
        let mut forward = 0;
        while has_next(&region, &field, pos, last, key).unwrap().matched {
            pos += 1;
            forward += 1;
        }
        prop_assert_eq!(forward, l.pos - f.pos);

        let mut pos = l.pos;
        let mut backward = 0;
        while has_prev(&region, &field, first, pos, key).unwrap().matched {
            pos -= 1;
            backward += 1;
        }
        prop_assert_eq!(backward, l.pos - f.pos);
    }
}

proptest! {
    #[test]
    fn prop_sub_field_matches_collapsed(
        mut buckets in prop::collection::vec(0u32..32, 1..150),
        noise in prop::collection::vec(any::<u16>(), 150),
        key in 0u32..34,
    ) {
        buckets.sort_unstable();
        // Bits 12..=19 hold the sorted bucket, everything else is noise.
        let words: Vec<u32> = buckets
            .iter()
            .zip(&noise)
            .map(|(&b, &n)| (b << 12) | (n as u32 & 0xFFF) | ((n as u32 >> 12) << 20))
            .collect();
        let region: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
        let collapsed: Vec<u8> = buckets.iter().flat_map(|b| b.to_be_bytes()).collect();

        let sub = SubField::new(RowField::<u32, BigEndian>::new(4, 0).unwrap(), 12, 19).unwrap();
        let full = RowField::<u32, BigEndian>::new(4, 0).unwrap();
        let window = Window::new(0, buckets.len() as u64 - 1).unwrap();

        prop_assert_eq!(
            find_first(&region, &sub, window, key).unwrap(),
            find_first(&collapsed, &full, window, key).unwrap()
        );
        prop_assert_eq!(
            find_last(&region, &sub, window, key).unwrap(),
            find_last(&collapsed, &full, window, key).unwrap()
        );
    }
}
