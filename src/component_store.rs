//! Per-component storage (§4.4): a [`SparseSet`] paired with a parallel
//! payload array. Tag (empty) components carry no payload; the distinction
//! is a runtime [`ComponentKind`] flag rather than a separate type, so a
//! [`Registry`](crate::registry::Registry) can hold both behind one map.

use tracing::trace;

use crate::config::ComponentConfig;
use crate::entity_handle::EntityId;
use crate::error::{EcsError, EcsResult, StatusErr, StatusResult};
use crate::sparse_set::SparseSet;

/// Whether a component carries a payload or is a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Standard,
    Empty,
}

/// Storage for one component type. `T` is the payload type; for `Empty`-kind
/// stores `T` is conventionally `()` and the payload array, while present
/// for uniformity, is never read through the payload-accessor methods.
pub struct ComponentStore<T> {
    sparse: SparseSet,
    components: Vec<T>,
    kind: ComponentKind,
    replace_default: bool,
    resize_default: bool,
}

impl<T: Clone> ComponentStore<T> {
    pub fn new(kind: ComponentKind, config: ComponentConfig) -> EcsResult<Self> {
        config.validate()?;

        let components = if config.sparse.typed {
            Vec::with_capacity(config.sparse.pool_size)
        } else {
            Vec::new()
        };

        Ok(Self {
            sparse: SparseSet::new(config.sparse)?,
            components,
            kind,
            replace_default: config.replace,
            resize_default: config.resize,
        })
    }

    #[inline]
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sparse.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sparse.is_empty()
    }

    #[inline]
    pub fn contains(&self, e: EntityId) -> bool {
        self.sparse.contains(e)
    }

    /// The entities backing this store, in dense order.
    #[inline]
    pub fn data(&self) -> &[EntityId] {
        self.sparse.dense()
    }

    /// The payload array and its live length. Rejected for an `Empty`-kind
    /// store, which never holds payload data worth exposing.
    pub fn raw(&self) -> EcsResult<(&[T], usize)> {
        self.reject_empty()?;
        Ok((&self.components, self.sparse.len()))
    }

    /// Grows the sparse set's dense capacity and the payload capacity in
    /// lockstep. Fails if `new_cap` is not greater than the current one.
    pub fn reserve(&mut self, new_cap: usize) -> StatusResult<()> {
        self.sparse.resize(new_cap)?;
        if new_cap > self.components.capacity() {
            self.components.reserve(new_cap - self.components.len());
        }
        Ok(())
    }

    /// Inserts or, if already present and `replace` is set, overwrites the
    /// payload for `e`. `auto_resize` permits growing the payload array when
    /// the sparse set's returned position would otherwise overrun it; when
    /// not permitted, a would-be overrun rolls the sparse-set insertion back.
    pub fn add(&mut self, e: EntityId, payload: T, replace: bool, auto_resize: bool) -> EcsResult<()> {
        let already_present = self.sparse.contains(e);
        let position = self
            .sparse
            .add(e, auto_resize)
            .map_err(|_| EcsError::CapacityExceeded)?;

        if matches!(self.kind, ComponentKind::Empty) {
            return Ok(());
        }

        if already_present {
            if replace {
                self.components[position] = payload;
                trace!(position, "component store payload replaced");
            }
            return Ok(());
        }

        if position >= self.components.capacity() {
            if !auto_resize {
                let _ = self.sparse.remove(e);
                return Err(EcsError::CapacityExceeded);
            }
            let new_cap = (2 * self.components.capacity()).max(position + 1);
            self.components.reserve(new_cap - self.components.len());
        }

        debug_assert_eq!(position, self.components.len());
        self.components.push(payload);

        trace!(position, "component store insert");
        Ok(())
    }

    /// Mirrors the sparse set's swap-with-last on the payload array, then
    /// removes from the sparse set.
    pub fn remove(&mut self, e: EntityId) -> StatusResult<()> {
        if matches!(self.kind, ComponentKind::Empty) {
            return self.sparse.remove(e);
        }

        let i = self.sparse.index_of(e).ok_or(StatusErr)?;
        let last = self.components.len() - 1;
        if i != last {
            self.components.swap(i, last);
        }
        self.components.pop();

        self.sparse.remove(e)
    }

    /// Live payload reference for `e`. Rejected for an `Empty`-kind store.
    pub fn get(&self, e: EntityId) -> EcsResult<&T> {
        self.reject_empty()?;
        let i = self
            .sparse
            .index_of(e)
            .ok_or(EcsError::MissingComponent(e))?;
        Ok(&self.components[i])
    }

    pub fn get_mut(&mut self, e: EntityId) -> EcsResult<&mut T> {
        self.reject_empty()?;
        let i = self
            .sparse
            .index_of(e)
            .ok_or(EcsError::MissingComponent(e))?;
        Ok(&mut self.components[i])
    }

    pub fn try_get(&self, e: EntityId) -> EcsResult<Option<&T>> {
        self.reject_empty()?;
        Ok(self.sparse.index_of(e).map(|i| &self.components[i]))
    }

    /// A deep, independent copy of the payload — never shares mutable
    /// substructure with the store.
    pub fn get_const(&self, e: EntityId) -> EcsResult<T> {
        self.get(e).map(|v| v.clone())
    }

    pub fn try_get_const(&self, e: EntityId) -> EcsResult<Option<T>> {
        self.try_get(e).map(|opt| opt.cloned())
    }

    /// Exchanges payloads at `a` and `b`. If `instances_only` is false, also
    /// swaps the two entities' sparse-set positions so the (entity, payload)
    /// pairing is preserved; if true, only the payload slots move and the
    /// pairing intentionally changes. Fails if either is absent or `a == b`.
    pub fn swap(&mut self, a: EntityId, b: EntityId, instances_only: bool) -> StatusResult<()> {
        let (Some(ia), Some(ib)) = (self.sparse.index_of(a), self.sparse.index_of(b)) else {
            return Err(StatusErr);
        };
        if ia == ib {
            return Err(StatusErr);
        }

        if !matches!(self.kind, ComponentKind::Empty) {
            self.components.swap(ia, ib);
        }

        if !instances_only {
            self.sparse.swap(a, b)?;
        }

        Ok(())
    }

    /// Delegates to the sparse set's sort keyed on entity id. `Empty`-kind
    /// stores only.
    pub fn sort_empty(
        &mut self,
        cmp: impl FnMut(&EntityId, &EntityId) -> std::cmp::Ordering,
    ) -> StatusResult<()> {
        self.sparse.sort(cmp)
    }

    /// Stable insertion sort by payload for `Standard`-kind stores, swapping
    /// the sparse set's entities in lockstep so the (entity, payload)
    /// pairing holds at every step. Fails for length <= 1.
    pub fn sort_based_component(
        &mut self,
        mut cmp: impl FnMut(&T, &T) -> std::cmp::Ordering,
    ) -> StatusResult<()> {
        let len = self.components.len();
        if len <= 1 {
            return Err(StatusErr);
        }

        for i in 1..len {
            let mut j = i;
            while j > 0 && cmp(&self.components[j], &self.components[j - 1]) == std::cmp::Ordering::Less {
                self.components.swap(j, j - 1);
                let ea = self.sparse.dense()[j];
                let eb = self.sparse.dense()[j - 1];
                self.sparse.swap(ea, eb)?;
                j -= 1;
            }
        }

        Ok(())
    }

    fn reject_empty(&self) -> EcsResult<()> {
        if matches!(self.kind, ComponentKind::Empty) {
            return Err(EcsError::EmptyComponentPayloadAccess);
        }
        Ok(())
    }
}
