//! Configuration surface (§6): recognized options for the entity store,
//! the sparse set, and per-component stores, with validated defaults.

use crate::entity_handle::EntityHandle;
use crate::error::{EcsError, EcsResult};

/// Smallest sparse-set page size allowed; below this the paging overhead
/// dominates whatever locality it was meant to buy back.
pub const MIN_PAGE_SIZE: usize = 128;

/// Default initial dense/pool capacity used when a config doesn't override it.
pub const DEFAULT_POOL_SIZE: usize = 128;

/// Configuration for an [`crate::entity_store::EntityStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityStoreConfig {
    pub handle: EntityHandle,
    pub capacity: usize,
    pub resizable: bool,
    pub typed: bool,
}

impl EntityStoreConfig {
    pub fn validate(&self) -> EcsResult<()> {
        if self.capacity == 0 {
            return Err(EcsError::InvalidConfig("capacity must be positive"));
        }
        Ok(())
    }
}

impl Default for EntityStoreConfig {
    fn default() -> Self {
        Self {
            handle: EntityHandle::medium(),
            capacity: 1000,
            resizable: true,
            typed: true,
        }
    }
}

/// Configuration for a [`crate::sparse_set::SparseSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseSetConfig {
    pub handle: EntityHandle,
    pub page_size: usize,
    pub pool_size: usize,
    pub typed: bool,
}

impl SparseSetConfig {
    pub fn validate(&self) -> EcsResult<()> {
        if self.page_size < MIN_PAGE_SIZE || !self.page_size.is_power_of_two() {
            return Err(EcsError::InvalidConfig(
                "page_size must be a power of two >= 128",
            ));
        }
        Ok(())
    }
}

impl Default for SparseSetConfig {
    fn default() -> Self {
        Self {
            handle: EntityHandle::medium(),
            page_size: 4096,
            pool_size: DEFAULT_POOL_SIZE,
            typed: true,
        }
    }
}

/// Configuration for a [`crate::component_store::ComponentStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentConfig {
    pub sparse: SparseSetConfig,
    pub replace: bool,
    pub resize: bool,
}

impl ComponentConfig {
    pub fn validate(&self) -> EcsResult<()> {
        self.sparse.validate()
    }
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            sparse: SparseSetConfig::default(),
            replace: true,
            resize: true,
        }
    }
}
