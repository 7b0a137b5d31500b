//! Property tests for the connection registry against a simple model.

use std::collections::HashMap;

use proptest::prelude::*;

use tertulia_server::domain::{ConnectionId, ConnectionRegistry, Nickname};

const NAMES: [&str; 4] = ["ana", "beto", "caro", "dani"];
const SLOTS: usize = 6;

#[derive(Debug, Clone)]
enum Op {
    Admit { slot: usize, name: usize },
    Remove { slot: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..SLOTS, 0..NAMES.len()).prop_map(|(slot, name)| Op::Admit { slot, name }),
        (0..SLOTS).prop_map(|slot| Op::Remove { slot }),
    ]
}

proptest! {
    #[test]
    fn registry_matches_model(ops in prop::collection::vec(op(), 0..64)) {
        let ids: Vec<ConnectionId> = (0..SLOTS).map(|_| ConnectionId::generate()).collect();
        let mut registry = ConnectionRegistry::new();
        let mut model: HashMap<usize, &str> = HashMap::new();

        for op in ops {
            match op {
                Op::Admit { slot, name } => {
                    let accepted = registry
                        .admit(ids[slot], Nickname::new(NAMES[name]).unwrap())
                        .is_ok();
                    let expected = !model.contains_key(&slot)
                        && !model.values().any(|n| *n == NAMES[name]);
                    prop_assert_eq!(accepted, expected);
                    if expected {
                        model.insert(slot, NAMES[name]);
                    }
                }
                Op::Remove { slot } => {
                    let removed = registry.remove(&ids[slot]).map(|n| n.as_str().to_string());
                    let expected = model.remove(&slot).map(str::to_string);
                    prop_assert_eq!(removed, expected);
                }
            }

            let mut expected: Vec<&str> = model.values().copied().collect();
            expected.sort();
            let listed: Vec<String> = registry
                .list_nicknames()
                .iter()
                .map(|n| n.as_str().to_string())
                .collect();
            prop_assert_eq!(listed, expected);
            prop_assert_eq!(registry.len(), model.len());
        }
    }
}
