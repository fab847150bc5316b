//! Property tests: content hashes are stable and track hashable content.

use proptest::prelude::*;
use provenance_graph::{hash_value, Node, NodeBuilder};
use provenance_tests::new_graph;
use provenance_types::NodeType;
use serde_json::{json, Value};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e6f64..1.0e6).prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::btree_map("[a-z_]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn arb_attributes() -> impl Strategy<Value = BTreeMap<String, Value>> {
    prop::collection::btree_map("[a-z][a-z_]{0,7}", arb_value(), 1..6)
}

fn builder<'a>(entries: impl Iterator<Item = (&'a String, &'a Value)>) -> NodeBuilder {
    entries.fold(Node::builder(NodeType::Data), |b, (k, v)| {
        b.attribute(k.clone(), v.clone())
    })
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Hashing the same value twice gives the same digest.
    #[test]
    fn value_hash_is_idempotent(value in arb_value()) {
        prop_assert_eq!(hash_value(&value).unwrap(), hash_value(&value).unwrap());
    }

    /// Node hashes are idempotent and ignore attribute insertion order.
    #[test]
    fn node_hash_ignores_insertion_order(attributes in arb_attributes()) {
        let mut graph = new_graph();
        let forward = graph.add(builder(attributes.iter())).unwrap();
        let backward = graph.add(builder(attributes.iter().rev())).unwrap();

        let hash = graph.compute_hash(forward, false).unwrap();
        prop_assert!(hash.is_some());
        prop_assert_eq!(&hash, &graph.compute_hash(forward, false).unwrap());
        prop_assert_eq!(&hash, &graph.compute_hash(backward, false).unwrap());
    }

    /// Changing any hashed attribute value changes the node hash.
    #[test]
    fn node_hash_tracks_attribute_values(
        attributes in arb_attributes(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut graph = new_graph();
        let original = graph.add(builder(attributes.iter())).unwrap();

        let key = pick.get(&attributes.keys().collect::<Vec<_>>()).to_string();
        let changed_value = json!({ "wrapped": attributes[&key].clone() });
        let changed = graph.add(builder(attributes.iter())).unwrap();
        graph.set_attribute(changed, &key, changed_value).unwrap();

        prop_assert_ne!(
            graph.compute_hash(original, false).unwrap(),
            graph.compute_hash(changed, false).unwrap()
        );
    }

    /// Integers never hash like the float of the same magnitude.
    #[test]
    fn int_and_float_never_collide(n in -1_000_000i64..1_000_000) {
        prop_assert_ne!(
            hash_value(&json!(n)).unwrap(),
            hash_value(&json!(n as f64)).unwrap()
        );
    }
}
