use ecs_core::config::SparseSetConfig;
use ecs_core::{EntityHandle, SparseSet};

fn config(pool_size: usize) -> SparseSetConfig {
    SparseSetConfig {
        handle: EntityHandle::medium(),
        page_size: 128,
        pool_size,
        typed: true,
    }
}

/// S4: capacity growth disabled.
#[test]
fn disabled_auto_resize_rejects_third_insert_past_pool_size() {
    let handle = EntityHandle::medium();
    let mut set = SparseSet::new(config(2)).unwrap();

    let a = handle.make(1, 0);
    let b = handle.make(2, 0);
    let c = handle.make(3, 0);

    assert!(set.add(a, false).is_ok());
    assert!(set.add(b, false).is_ok());
    assert!(set.add(c, false).is_err());

    assert_eq!(set.len(), 2);
    assert!(!set.contains(c));
}

#[test]
fn membership_is_false_past_current_length_even_with_a_stale_cell() {
    let handle = EntityHandle::medium();
    let mut set = SparseSet::new(config(4)).unwrap();
    let a = handle.make(1, 0);

    set.add(a, true).unwrap();
    set.remove(a).unwrap();

    assert!(!set.contains(a));
    assert_eq!(set.len(), 0);
}
