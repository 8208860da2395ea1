//! Entity/component façade (§4.5). Owns one [`EntityStore`] and a map from
//! component-type identity to the [`ComponentStore`] registered for it,
//! routing every call through the invariant checks the rest of the crate
//! only enforces locally.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use tracing::trace;

use crate::component_store::{ComponentKind, ComponentStore};
use crate::config::{ComponentConfig, EntityStoreConfig};
use crate::entity_handle::EntityId;
use crate::entity_store::EntityStore;
use crate::error::{EcsError, EcsResult, StatusErr, StatusResult};

/// Type-erased handle to a [`ComponentStore<T>`] for some `T` unknown to the
/// registry at the call site; downcast back to the concrete store via
/// [`Registry::store`]/[`Registry::store_mut`].
trait ErasedComponentStore: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn contains(&self, e: EntityId) -> bool;
    fn remove_if_exist(&mut self, e: EntityId) -> bool;
}

impl<T: Clone + 'static> ErasedComponentStore for ComponentStore<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn contains(&self, e: EntityId) -> bool {
        ComponentStore::contains(self, e)
    }

    fn remove_if_exist(&mut self, e: EntityId) -> bool {
        if ComponentStore::contains(self, e) {
            ComponentStore::remove(self, e).is_ok()
        } else {
            false
        }
    }
}

pub struct Registry {
    entities: EntityStore,
    stores: HashMap<TypeId, Box<dyn ErasedComponentStore>>,
}

impl Registry {
    pub fn new(entity_config: EntityStoreConfig) -> EcsResult<Self> {
        Ok(Self {
            entities: EntityStore::new(entity_config)?,
            stores: HashMap::new(),
        })
    }

    /// Idempotent: returns the store already registered for `T`, or creates
    /// one under `kind`/`config`. `kind` is fixed at first registration;
    /// later calls with a different `kind` for the same `T` are ignored.
    pub fn prepare<T: Clone + 'static>(
        &mut self,
        kind: ComponentKind,
        config: ComponentConfig,
    ) -> EcsResult<&mut ComponentStore<T>> {
        let type_id = TypeId::of::<T>();

        if !self.stores.contains_key(&type_id) {
            let store = ComponentStore::<T>::new(kind, config)?;
            self.stores.insert(type_id, Box::new(store));
            trace!(?type_id, "registered component store");
        }

        Ok(self.store_mut::<T>(type_id).expect("just inserted"))
    }

    fn store_mut<T: 'static>(&mut self, type_id: TypeId) -> Option<&mut ComponentStore<T>> {
        self.stores
            .get_mut(&type_id)?
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
    }

    fn store<T: 'static>(&self, type_id: TypeId) -> Option<&ComponentStore<T>> {
        self.stores
            .get(&type_id)?
            .as_any()
            .downcast_ref::<ComponentStore<T>>()
    }

    pub fn create(&mut self) -> EcsResult<EntityId> {
        self.entities.create()
    }

    #[inline]
    pub fn valid(&self, e: EntityId) -> bool {
        self.entities.is_alive(e)
    }

    /// Removes `e` from every registered store, then frees its slot. A
    /// non-live entity is a silent no-op — the one operation in this API
    /// that treats invalid input as success rather than failure.
    pub fn destroy(&mut self, e: EntityId) {
        if !self.valid(e) {
            return;
        }

        self.remove_all(e);
        let _ = self.entities.remove(e);
    }

    /// Requires `valid(e)`; routes to the `T` store's `add`, registering one
    /// first if needed.
    pub fn add<T: Clone + 'static>(
        &mut self,
        e: EntityId,
        kind: ComponentKind,
        payload: T,
        config: ComponentConfig,
    ) -> EcsResult<()> {
        if !self.valid(e) {
            return Err(EcsError::InvalidHandle(e));
        }

        let store = self.prepare::<T>(kind, config)?;
        store.add(e, payload, config.replace, config.resize)
    }

    /// Routes to a registered store's `replace` (equivalent to `add` with
    /// `replace = true`); requires `valid(e)` and the entity already present
    /// in that store.
    pub fn replace<T: Clone + 'static>(&mut self, e: EntityId, payload: T) -> EcsResult<()> {
        if !self.valid(e) {
            return Err(EcsError::InvalidHandle(e));
        }
        let type_id = TypeId::of::<T>();
        let store = self
            .store_mut::<T>(type_id)
            .ok_or(EcsError::MissingComponent(e))?;
        if !store.contains(e) {
            return Err(EcsError::MissingComponent(e));
        }
        store.add(e, payload, true, true)
    }

    /// Like [`Registry::replace`], but returns the previous live payload
    /// (a copy — the store's internal reference cannot be returned once the
    /// payload it points to is overwritten) before replacing it.
    pub fn fetch_replace<T: Clone + 'static>(
        &mut self,
        e: EntityId,
        payload: T,
    ) -> EcsResult<T> {
        if !self.valid(e) {
            return Err(EcsError::InvalidHandle(e));
        }
        let type_id = TypeId::of::<T>();
        let store = self
            .store_mut::<T>(type_id)
            .ok_or(EcsError::MissingComponent(e))?;
        let previous = store.get_const(e)?;
        store.add(e, payload, true, true)?;
        Ok(previous)
    }

    pub fn remove<T: Clone + 'static>(&mut self, e: EntityId) -> EcsResult<()> {
        let type_id = TypeId::of::<T>();
        let store = self
            .store_mut::<T>(type_id)
            .ok_or(EcsError::MissingComponent(e))?;
        store.remove(e).map_err(|_| EcsError::MissingComponent(e))
    }

    pub fn remove_if_exist<T: Clone + 'static>(&mut self, e: EntityId) {
        let type_id = TypeId::of::<T>();
        if let Some(store) = self.store_mut::<T>(type_id) {
            let _ = store.remove(e);
        }
    }

    /// Removes `e` from every registered store, in unspecified order. Each
    /// visit is independent of the others.
    pub fn remove_all(&mut self, e: EntityId) {
        for store in self.stores.values_mut() {
            store.remove_if_exist(e);
        }
    }

    /// Requires `valid(e)`: per S6, querying a dead entity raises
    /// `InvalidHandle` rather than reporting "component absent" — the two
    /// are distinguishable outcomes, not the same thing.
    pub fn has<T: 'static>(&self, e: EntityId) -> EcsResult<bool> {
        if !self.valid(e) {
            return Err(EcsError::InvalidHandle(e));
        }
        Ok(self
            .store::<T>(TypeId::of::<T>())
            .is_some_and(|s| s.contains(e)))
    }

    /// Requires `valid(e)`, for the same reason as [`Registry::has`].
    pub fn get<T: Clone + 'static>(&self, e: EntityId) -> EcsResult<&T> {
        if !self.valid(e) {
            return Err(EcsError::InvalidHandle(e));
        }
        self.store::<T>(TypeId::of::<T>())
            .ok_or(EcsError::MissingComponent(e))?
            .get(e)
    }

    pub fn get_const<T: Clone + 'static>(&self, e: EntityId) -> EcsResult<T> {
        self.store::<T>(TypeId::of::<T>())
            .ok_or(EcsError::MissingComponent(e))?
            .get_const(e)
    }

    pub fn try_get<T: Clone + 'static>(&self, e: EntityId) -> EcsResult<Option<&T>> {
        match self.store::<T>(TypeId::of::<T>()) {
            Some(store) => store.try_get(e),
            None => Ok(None),
        }
    }

    pub fn try_get_const<T: Clone + 'static>(&self, e: EntityId) -> EcsResult<Option<T>> {
        match self.store::<T>(TypeId::of::<T>()) {
            Some(store) => store.try_get_const(e),
            None => Ok(None),
        }
    }

    /// Delegates to `sort_based_component` on the store registered for `T`.
    pub fn sort<T: Clone + 'static>(
        &mut self,
        cmp: impl FnMut(&T, &T) -> std::cmp::Ordering,
    ) -> StatusResult<()> {
        let type_id = TypeId::of::<T>();
        let store = self
            .store_mut::<T>(type_id)
            .ok_or(StatusErr)?;
        store.sort_based_component(cmp)
    }

    /// Starts a batched `addComps`-style insertion for `e`: chain `.add::<T>()`
    /// once per component, then call `.finish()`.
    pub fn add_components(&mut self, e: EntityId) -> ComponentsBatch<'_> {
        ComponentsBatch {
            registry: self,
            entity: e,
            seen: Vec::new(),
            index: 0,
            error: None,
        }
    }
}

/// A single batched insertion started by [`Registry::add_components`].
///
/// Entries are applied as they're chained rather than buffered, so a later
/// failure does not roll back earlier successful entries — all-or-nothing is
/// not guaranteed, matching the spec's documented resolution. An entry whose
/// type was already queued earlier in the same batch is malformed (which of
/// the two configs should win is undefined) and is skipped without being
/// applied; [`ComponentsBatch::finish`] surfaces the first error encountered,
/// whether malformed-entry or a propagated `add` failure.
pub struct ComponentsBatch<'r> {
    registry: &'r mut Registry,
    entity: EntityId,
    seen: Vec<TypeId>,
    index: usize,
    error: Option<EcsError>,
}

impl<'r> ComponentsBatch<'r> {
    pub fn add<T: Clone + 'static>(
        mut self,
        kind: ComponentKind,
        payload: T,
        config: ComponentConfig,
    ) -> Self {
        let type_id = TypeId::of::<T>();

        if self.seen.contains(&type_id) {
            self.error
                .get_or_insert(EcsError::MalformedAddComponents(self.index));
        } else {
            self.seen.push(type_id);
            if let Err(err) = self.registry.add(self.entity, kind, payload, config) {
                self.error.get_or_insert(err);
            }
        }

        self.index += 1;
        self
    }

    pub fn finish(self) -> EcsResult<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
