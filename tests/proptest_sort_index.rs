use cardwall::errors::SortIndexError;
use cardwall::sort_index::{allocate, between, SortKey};
use proptest::prelude::*;
use proptest::test_runner::Config;

#[derive(Debug)]
struct Item(f64);

impl SortKey for Item {
    fn sort_key(&self) -> f64 {
        self.0
    }

    fn set_sort_key(&mut self, key: f64) {
        self.0 = key;
    }
}

fn finite() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite", |x| x.is_finite())
}

/// Neighbours so close that no double fits between them.
fn adjacent(left: f64, right: f64) -> bool {
    let scale = left.abs().max(right.abs());
    right - left <= (scale * f64::EPSILON).max(f64::MIN_POSITIVE * f64::EPSILON)
}

proptest! {
    #![proptest_config(Config::with_cases(512))]

    #[test]
    fn between_is_strictly_inside_any_ordered_pair(a in finite(), b in finite()) {
        prop_assume!(a != b);
        let (left, right) = if a < b { (a, b) } else { (b, a) };
        match between(Some(left), Some(right)) {
            Ok(key) => prop_assert!(left < key && key < right, "{} < {} < {}", left, key, right),
            Err(err) => {
                prop_assert_eq!(err, SortIndexError::Exhausted { left, right });
                prop_assert!(adjacent(left, right));
            }
        }
    }

    #[test]
    fn end_and_start_keys_never_touch_the_bound(key in finite()) {
        match between(Some(key), None) {
            Ok(after) => prop_assert!(after > key),
            Err(err) => prop_assert!(matches!(err, SortIndexError::Exhausted { .. }), "expected SortIndexError::Exhausted, got {:?}", err),
        }
        match between(None, Some(key)) {
            Ok(before) => prop_assert!(before < key),
            Err(err) => prop_assert!(matches!(err, SortIndexError::Exhausted { .. }), "expected SortIndexError::Exhausted, got {:?}", err),
        }
    }

    #[test]
    fn allocate_appends_and_prepends_past_any_keys(keys in prop::collection::vec(finite(), 1..8)) {
        let mut items: Vec<Item> = keys.into_iter().map(Item).collect();

        let mut siblings: Vec<&mut Item> = items.iter_mut().collect();
        let end = siblings.len();
        let last = allocate(&mut siblings, end).unwrap();
        prop_assert!(items.iter().all(|i| i.0 < last));

        let mut siblings: Vec<&mut Item> = items.iter_mut().collect();
        let first = allocate(&mut siblings, 0).unwrap();
        prop_assert!(items.iter().all(|i| i.0 > first));
    }

    #[test]
    fn repeated_inserts_at_one_slot_stay_unique(
        a in finite(),
        b in finite(),
        count in 20usize..120,
        hug_right in any::<bool>(),
    ) {
        prop_assume!(a != b);
        let mut items = vec![Item(a.min(b)), Item(a.max(b))];
        for n in 0..count {
            let mut siblings: Vec<&mut Item> = items.iter_mut().collect();
            // Always insert next to one of the two original bounds.
            let index = if hug_right { n + 1 } else { 1 };
            let key = allocate(&mut siblings, index).unwrap();
            items.push(Item(key));

            let mut keys: Vec<f64> = items.iter().map(|i| i.0).collect();
            keys.sort_by(f64::total_cmp);
            prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
