use ecs_core::component_store::ComponentKind;
use ecs_core::config::{ComponentConfig, EntityStoreConfig, SparseSetConfig};
use ecs_core::{EcsError, EntityHandle, Registry};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity {
    dx: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Mass {
    kg: i32,
}

fn entity_config() -> EntityStoreConfig {
    EntityStoreConfig {
        handle: EntityHandle::medium(),
        capacity: 16,
        resizable: true,
        typed: true,
    }
}

fn component_config() -> ComponentConfig {
    ComponentConfig {
        sparse: SparseSetConfig {
            handle: EntityHandle::medium(),
            page_size: 128,
            pool_size: 8,
            typed: true,
        },
        replace: true,
        resize: true,
    }
}

/// S6: destroy purges every store and frees the slot for recycling.
#[test]
fn destroy_purges_all_stores_and_recycles_the_slot_with_a_higher_version() {
    let mut registry = Registry::new(entity_config()).unwrap();
    let handle = EntityHandle::medium();

    let a = registry.create().unwrap();
    registry
        .add(a, ComponentKind::Standard, Velocity { dx: 1 }, component_config())
        .unwrap();
    registry
        .add(a, ComponentKind::Standard, Mass { kg: 10 }, component_config())
        .unwrap();

    registry.destroy(a);

    assert!(!registry.valid(a));
    assert!(matches!(
        registry.has::<Velocity>(a),
        Err(EcsError::InvalidHandle(_))
    ));
    assert!(matches!(
        registry.get::<Velocity>(a),
        Err(EcsError::InvalidHandle(_))
    ));

    let b = registry.create().unwrap();
    assert_eq!(handle.index(a), handle.index(b));
    assert_eq!(handle.version(b), handle.version(a) + 1);
}

#[test]
fn prepare_pins_kind_at_first_registration_and_ignores_later_requests() {
    let mut registry = Registry::new(entity_config()).unwrap();

    registry
        .prepare::<Velocity>(ComponentKind::Standard, component_config())
        .unwrap();
    let store = registry
        .prepare::<Velocity>(ComponentKind::Empty, component_config())
        .unwrap();

    assert_eq!(store.kind(), ComponentKind::Standard);
}

#[test]
fn add_rejects_a_dead_entity() {
    let mut registry = Registry::new(entity_config()).unwrap();
    let e = registry.create().unwrap();
    registry.destroy(e);

    let result = registry.add(e, ComponentKind::Standard, Velocity { dx: 1 }, component_config());
    assert!(matches!(result, Err(EcsError::InvalidHandle(_))));
}

#[test]
fn add_components_batch_applies_each_entry_independently() {
    let mut registry = Registry::new(entity_config()).unwrap();
    let e = registry.create().unwrap();

    registry
        .add_components(e)
        .add::<Velocity>(ComponentKind::Standard, Velocity { dx: 1 }, component_config())
        .add::<Mass>(ComponentKind::Standard, Mass { kg: 2 }, component_config())
        .finish()
        .unwrap();

    assert!(registry.has::<Velocity>(e).unwrap());
    assert!(registry.has::<Mass>(e).unwrap());
}

#[test]
fn add_components_batch_rejects_a_duplicate_type_in_the_same_batch() {
    let mut registry = Registry::new(entity_config()).unwrap();
    let e = registry.create().unwrap();

    let result = registry
        .add_components(e)
        .add::<Velocity>(ComponentKind::Standard, Velocity { dx: 1 }, component_config())
        .add::<Velocity>(ComponentKind::Standard, Velocity { dx: 2 }, component_config())
        .finish();

    assert!(matches!(result, Err(EcsError::MalformedAddComponents(1))));
    assert_eq!(*registry.get::<Velocity>(e).unwrap(), Velocity { dx: 1 });
}

#[test]
fn sort_delegates_to_the_registered_store_for_that_type() {
    let mut registry = Registry::new(entity_config()).unwrap();
    let a = registry.create().unwrap();
    let b = registry.create().unwrap();

    registry
        .add(a, ComponentKind::Standard, Mass { kg: 50 }, component_config())
        .unwrap();
    registry
        .add(b, ComponentKind::Standard, Mass { kg: 10 }, component_config())
        .unwrap();

    registry.sort::<Mass>(|x, y| x.kg.cmp(&y.kg)).unwrap();

    assert_eq!(*registry.get::<Mass>(b).unwrap(), Mass { kg: 10 });
}
