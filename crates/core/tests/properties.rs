//! Property test: store bookkeeping matches a reference set model.

use std::collections::HashSet;

use proptest::prelude::*;
use stowage_core::Repository;

#[derive(Debug, Clone)]
enum Op {
    Add(u8),
    RemoveByKey(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::Add),
        any::<u8>().prop_map(Op::RemoveByKey),
    ]
}

proptest! {
    #[test]
    fn len_tracks_the_surviving_key_set(ops in proptest::collection::vec(op_strategy(), 0..256)) {
        let repository: Repository<u8, u8> = Repository::new(|e: &u8| *e);
        let mut model: HashSet<u8> = HashSet::new();

        for op in ops {
            match op {
                Op::Add(key) => {
                    let inserted = repository.add(key);
                    prop_assert_eq!(inserted, model.insert(key));
                }
                Op::RemoveByKey(key) => {
                    let removed = repository.remove_by_key(&key);
                    prop_assert_eq!(removed, model.remove(&key));
                }
            }
            prop_assert_eq!(repository.len(), model.len());
        }

        let mut snapshot = repository.snapshot();
        snapshot.sort_unstable();
        let mut expected: Vec<u8> = model.into_iter().collect();
        expected.sort_unstable();
        prop_assert_eq!(snapshot, expected);
    }
}
