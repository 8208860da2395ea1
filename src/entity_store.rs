//! Generational slot allocator (§4.2). Owns a dense array of encoded entity
//! ids indexed by slot and an intrusive free list threaded through the
//! freed cells themselves — no auxiliary memory for recycling.

use tracing::{debug, trace};

use crate::config::EntityStoreConfig;
use crate::entity_handle::{EntityHandle, EntityId};
use crate::error::{EcsError, EcsResult};

pub struct EntityStore {
    handle: EntityHandle,
    entities: Vec<EntityId>,
    append_index: u32,
    free_slot: u32,
    cap: usize,
    resizable: bool,
}

impl EntityStore {
    pub fn new(config: EntityStoreConfig) -> EcsResult<Self> {
        config.validate()?;

        let entities = if config.typed {
            Vec::with_capacity(config.capacity)
        } else {
            Vec::new()
        };

        Ok(Self {
            handle: config.handle,
            entities,
            append_index: 0,
            free_slot: config.handle.invalid_index(),
            cap: config.capacity,
            resizable: config.resizable,
        })
    }

    #[inline]
    pub fn handle(&self) -> &EntityHandle {
        &self.handle
    }

    /// Number of slots ever appended, live or freed (not the live count).
    #[inline]
    pub fn len(&self) -> usize {
        self.append_index as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.append_index == 0
    }

    /// Pops the free list head if one exists, else appends a new slot,
    /// growing `cap` by doubling when the append index would exceed it.
    pub fn create(&mut self) -> EcsResult<EntityId> {
        let invalid = self.handle.invalid_index();

        if self.free_slot != invalid {
            let slot = self.free_slot;
            let cell = self.entities[slot as usize];
            let next = self.handle.index(cell);
            let version = self.handle.version(cell);

            let id = self.handle.make(slot, version);
            self.entities[slot as usize] = id;
            self.free_slot = next;

            trace!(slot, version, "recycled entity slot");
            return Ok(id);
        }

        if self.append_index == invalid {
            return Err(EcsError::OutOfHandles);
        }

        if self.append_index as usize >= self.cap {
            if !self.resizable {
                return Err(EcsError::CapacityExceeded);
            }
            self.cap = (self.cap * 2).max(1);
            debug!(new_cap = self.cap, "entity store grown");
        }

        let id = self.handle.make(self.append_index, 0);
        self.entities.push(id);
        self.append_index += 1;

        trace!(slot = self.handle.index(id), "appended entity slot");
        Ok(id)
    }

    /// `index(e) < append_index ∧ entities[index(e)] == e`.
    pub fn is_alive(&self, e: EntityId) -> bool {
        let i = self.handle.index(e) as usize;
        i < self.entities.len() && self.entities[i] == e
    }

    /// Frees `e`'s slot, threading it onto the free list with its version
    /// incremented so every outstanding handle to that slot is invalidated.
    ///
    /// If the increment would saturate the version field, the slot is
    /// retired permanently instead of being recycled: it is left out of the
    /// free list entirely, so `create` will never hand its index out again.
    pub fn remove(&mut self, e: EntityId) -> EcsResult<()> {
        if !self.is_alive(e) {
            return Err(EcsError::InvalidHandle(e));
        }

        let i = self.handle.index(e);
        let next_version = self.handle.version(e) + 1;

        if next_version > self.handle.max_version() {
            debug!(slot = i, "version saturated, retiring slot permanently");
            self.entities[i as usize] = self.handle.make(self.handle.invalid_index(), next_version);
            return Ok(());
        }

        self.entities[i as usize] = self.handle.make(self.free_slot, next_version);
        self.free_slot = i;

        trace!(slot = i, version = next_version, "freed entity slot");
        Ok(())
    }

    /// Live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .enumerate()
            .filter(move |&(i, &e)| self.handle.index(e) as usize == i)
            .map(|(_, &e)| e)
    }
}
