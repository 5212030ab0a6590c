use bitclock_client::queue::{Pending, Stack};
use proptest::prelude::*;

proptest! {
    #[test]
    fn drain_passes_are_bounded_and_ordered(
        items in prop::collection::vec(prop::collection::vec(any::<u16>(), 0..8), 0..40),
        max in 1usize..20,
    ) {
        let mut stack = Stack::new();
        for (i, item) in items.iter().enumerate() {
            match i % 3 {
                0 => stack.put(Pending::Batch(item.clone())),
                1 => {
                    let item = item.clone();
                    stack.put(Pending::deferred(move || item));
                }
                _ => {
                    for v in item {
                        stack.put(Pending::Value(*v));
                    }
                }
            }
        }
        let expected: Vec<u16> = items.iter().flatten().copied().collect();

        let mut drained = Vec::new();
        let mut remaining = expected.len();
        loop {
            let pass = stack.drain(max);
            prop_assert_eq!(pass.len(), max.min(remaining));
            if pass.is_empty() {
                break;
            }
            remaining -= pass.len();
            drained.extend(pass);
        }
        prop_assert_eq!(drained, expected);
        prop_assert!(stack.is_empty());
    }
}
