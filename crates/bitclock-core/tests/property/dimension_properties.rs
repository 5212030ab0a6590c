use bitclock_core::models::Dimensions;
use bitclock_core::validation::{parse_dimensions, parse_valid_dimensions};
use proptest::prelude::*;
use serde_json::{Map, Value};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9 ]{0,12}".prop_map(Value::String),
    ]
}

fn flat_map(min: usize) -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,8}", scalar(), min..6)
        .prop_map(|m| m.into_iter().collect::<Map<String, Value>>())
}

proptest! {
    #[test]
    fn flat_nonempty_maps_are_valid(map in flat_map(1)) {
        let dims = parse_valid_dimensions(&Value::Object(map.clone())).unwrap();
        prop_assert_eq!(dims.to_value(), Value::Object(map));
    }

    #[test]
    fn any_nested_value_rejects_the_map(mut map in flat_map(0), key in "[a-z]{1,8}", nested in prop_oneof![
        Just(Value::Null),
        Just(Value::Array(vec![])),
        Just(serde_json::json!({"inner": 1})),
    ]) {
        map.insert(key, nested);
        prop_assert!(parse_dimensions(&Value::Object(map)).is_err());
    }

    #[test]
    fn merge_is_left_to_right(a in flat_map(0), b in flat_map(0)) {
        let da = parse_dimensions(&Value::Object(a.clone())).unwrap();
        let db = parse_dimensions(&Value::Object(b.clone())).unwrap();
        let merged: Dimensions = da.merged(&db);
        for (k, v) in &b {
            prop_assert_eq!(merged.get(k).map(|s| s.to_value()), Some(v.clone()));
        }
        for (k, v) in &a {
            if !b.contains_key(k) {
                prop_assert_eq!(merged.get(k).map(|s| s.to_value()), Some(v.clone()));
            }
        }
    }
}
